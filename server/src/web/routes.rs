// src/web/routes.rs

use crate::web::handlers::{cart_handlers, order_handlers, payment_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/carts")
          .route("", web::post().to(cart_handlers::create_cart_handler))
          .route("/{cart_id}", web::get().to(cart_handlers::get_cart_handler))
          .route("/{cart_id}", web::delete().to(cart_handlers::delete_cart_handler))
          .route("/{cart_id}/items", web::post().to(cart_handlers::add_cart_item_handler))
          .route(
            "/{cart_id}/items/{item_id}",
            web::patch().to(cart_handlers::update_cart_item_handler),
          )
          .route(
            "/{cart_id}/items/{item_id}",
            web::delete().to(cart_handlers::remove_cart_item_handler),
          ),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::create_order_handler))
          // Registered before "/{order_id}" so the literal segment wins.
          .route(
            "/has-ordered/{product_id}",
            web::get().to(order_handlers::has_ordered_handler),
          )
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}", web::patch().to(order_handlers::update_order_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
      )
      .service(
        web::scope("/payment")
          .route("/initiate", web::post().to(payment_handlers::initiate_payment_handler))
          .route("/success/", web::post().to(payment_handlers::payment_success_handler))
          .route("/fail/", web::post().to(payment_handlers::payment_fail_handler))
          .route("/cancel/", web::post().to(payment_handlers::payment_cancel_handler)),
      ),
  );
}

// src/models/mod.rs

//! Entities persisted by the store plus the value objects passed between
//! pipelines and the store.

pub mod cart;
pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod principal;
pub mod product;
pub mod user;

pub use cart::{Cart, CartLine, CartLineView, CartSnapshot, CartView, SnapshotLine};
pub use cart_item::CartItem;
pub use order::{NewOrder, Order, OrderDetail, OrderStatus};
pub use order_item::OrderItem;
pub use payment::{CallbackKind, CustomerInfo, PaymentSessionRequest, TransactionId};
pub use principal::Principal;
pub use product::{Product, ProductSummary};
pub use user::User;

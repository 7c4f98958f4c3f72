// src/lib.rs

//! Order lifecycle service: carts become orders, orders are paid through a
//! hosted gateway session and move through `pending -> received -> delivered`
//! or get canceled along the way.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

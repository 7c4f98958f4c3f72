// src/services/mod.rs

//! Entry points used by the HTTP handlers. Multi-step flows run through the
//! registered pipelines; single reads go straight to the store.

pub mod cart_service;
pub mod order_service;
pub mod payment_gateway;
pub mod payment_mock;
pub mod payment_service;
pub mod seed;

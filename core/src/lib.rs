// src/lib.rs

//! bazaar-flow: a small asynchronous pipeline engine.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers which receive a shared
//! [`ContextData`] and answer with a [`PipelineControl`]. Steps may be
//! optional or skipped by a condition evaluated against the context.
//!
//! Pipelines are registered in a [`Registry`] keyed by the type of data they
//! operate on, so callers only need to build a context and hand it over:
//!
//! ```ignore
//! let registry = Registry::<MyError>::new();
//! registry.register(checkout_pipeline);
//! registry.run(ContextData::new(CheckoutData { .. })).await?;
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Registry;

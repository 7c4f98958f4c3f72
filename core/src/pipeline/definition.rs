// src/pipeline/definition.rs

use crate::core::context::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::error::FlowError;
use std::collections::HashMap;

/// Handler phases of a step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

/// An ordered set of named steps over `TData`, whose handlers fail with `Err`.
///
/// `Err` must be buildable from [`FlowError`] so that engine-level problems
/// (a mandatory step without handlers, for instance) come out of
/// [`Pipeline::run`] as the caller's own error type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<(String, Phase), Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from `(step name, optional, skip condition)` tuples.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let mut pipeline = Self {
      name: name.into(),
      steps: Vec::with_capacity(step_defs.len()),
      handlers: HashMap::new(),
    };
    for (step_name, optional, skip_if) in step_defs {
      pipeline.push_step(step_name, *optional, skip_if.clone());
    }
    pipeline
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Appends a step. Panics on a duplicate name, which is a wiring bug.
  pub fn push_step(&mut self, step_name: &str, optional: bool, skip_if: Option<SkipCondition<TData>>) {
    assert!(
      self.step(step_name).is_none(),
      "pipeline '{}': step '{}' declared twice",
      self.name,
      step_name
    );
    self.steps.push(StepDef {
      name: step_name.to_string(),
      optional,
      skip_if,
    });
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    self.step_mut(step_name).optional = optional;
  }

  pub fn skip_if(
    &mut self,
    step_name: &str,
    condition: impl Fn(&crate::ContextData<TData>) -> bool + Send + Sync + 'static,
  ) {
    self.step_mut(step_name).skip_if = Some(std::sync::Arc::new(condition));
  }

  pub(crate) fn step(&self, step_name: &str) -> Option<&StepDef<TData>> {
    self.steps.iter().find(|s| s.name == step_name)
  }

  /// Panics when the step is unknown; handlers can only be attached to declared steps.
  pub(crate) fn step_mut(&mut self, step_name: &str) -> &mut StepDef<TData> {
    let pipeline_name = self.name.clone();
    self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .unwrap_or_else(|| panic!("pipeline '{}': unknown step '{}'", pipeline_name, step_name))
  }

  pub(crate) fn handlers_for(&self, step_name: &str, phase: Phase) -> &[Handler<TData, Err>] {
    self
      .handlers
      .get(&(step_name.to_string(), phase))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub(crate) fn has_handlers(&self, step_name: &str) -> bool {
    Phase::ALL.iter().any(|phase| !self.handlers_for(step_name, *phase).is_empty())
  }
}

// src/pipeline/execution.rs

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::{Phase, Pipeline};
use tracing::{event, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler answers [`PipelineControl::Stop`]
  /// and the first handler error as-is.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = tracing::info_span!("step", step = %step_def.name, index = step_idx);

      if step_def.should_skip(&ctx_data) {
        event!(parent: &step_span, Level::DEBUG, "skip condition met");
        continue;
      }

      if !self.has_handlers(&step_def.name) {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "optional step without handlers");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "mandatory step without handlers");
        return Err(Err::from(FlowError::HandlerMissing {
          pipeline: self.name.clone(),
          step_name: step_def.name.clone(),
        }));
      }

      for phase in Phase::ALL {
        let handlers = self.handlers_for(&step_def.name, phase);
        if let PipelineControl::Stop = run_phase(handlers, phase, &ctx_data).instrument(step_span.clone()).await? {
          event!(parent: &step_span, Level::INFO, phase = phase.as_str(), "pipeline stopped by handler");
          return Ok(PipelineResult::Stopped);
        }
      }
    }

    event!(Level::DEBUG, "pipeline completed");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(
  handlers: &[Handler<TData, Err>],
  phase: Phase,
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for handler in handlers {
    match handler(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
      Err(e) => {
        event!(Level::WARN, phase = phase.as_str(), error = %e, "handler failed");
        return Err(e);
      }
    }
  }
  Ok(PipelineControl::Continue)
}

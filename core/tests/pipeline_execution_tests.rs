// tests/pipeline_execution_tests.rs
mod common;

use bazaar_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, SkipCondition};
use common::*;
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn steps_run_in_declaration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "ordered",
    &[("step1", false, None), ("step2", false, None), ("step3", false, None)],
  );
  pipeline.on_boxed("step1", recording_handler("step1", " S1"));
  pipeline.on_boxed("step2", recording_handler("step2", " S2"));
  pipeline.on_boxed("step3", recording_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "stopping",
    &[("first", false, None), ("gate", false, None), ("never", false, None)],
  );
  pipeline.on_boxed("first", recording_handler("first", "A"));
  pipeline.on("gate", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("gate".to_string());
      Ok::<_, TestError>(PipelineControl::Stop)
    })
  });
  pipeline.on_boxed("never", recording_handler("never", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["first", "gate"]);
}

#[tokio::test]
#[serial]
async fn handler_error_is_returned_unchanged() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "failing",
    &[("good", false, None), ("bad", false, None), ("after_bad", false, None)],
  );
  pipeline.on_boxed("good", recording_handler("good", "Good"));
  pipeline.on_boxed("bad", failing_handler("bad", "cart is empty"));
  pipeline.on_boxed("after_bad", recording_handler("after_bad", "Never"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("cart is empty".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good", "bad"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_is_evaluated_against_live_context() {
  setup_tracing();
  let after_first: SkipCondition<TestContext> = Arc::new(|ctx: &ContextData<TestContext>| ctx.read().counter > 0);
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "skipping",
    &[("step1", false, None), ("skipped", false, Some(after_first)), ("step3", false, None)],
  );
  pipeline.on_boxed("step1", recording_handler("step1", " S1"));
  pipeline.on_boxed("skipped", recording_handler("skipped", " X"));
  pipeline.on_boxed("step3", recording_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn skip_if_can_be_set_after_construction() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("late_skip", &[("only", false, None)]);
  pipeline.on_boxed("only", recording_handler("only", "!"));
  pipeline.skip_if("only", |ctx| ctx.read().message.is_empty());

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().counter, 0);
}

#[tokio::test]
#[serial]
async fn mandatory_step_without_handler_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new("incomplete", &[("unwired", false, None)]);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("unwired"));
      assert!(s.contains("incomplete"));
    }
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "optional",
    &[("notify", true, None), ("work", false, None)],
  );
  pipeline.on_boxed("work", recording_handler("work", "W"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["work"]);
}

#[tokio::test]
#[serial]
async fn set_optional_turns_a_missing_handler_into_a_skip() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("toggle", &[("maybe", false, None)]);
  pipeline.set_optional("maybe", true);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("phases", &[("main", false, None)]);
  pipeline.after("main", recording_handler("after", "After;"));
  pipeline.on("main", recording_handler("on", "On;"));
  pipeline.before("main", recording_handler("before", "Before;"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.message, "Before;On;After;");
  assert_eq!(guard.steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn stop_in_before_phase_skips_on_and_after() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("guarded", &[("main", false, None)]);
  pipeline.before("main", recording_handler("guard", "G"));
  pipeline.on("main", recording_handler("on", "O"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("guard".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["guard"]);
}

#[tokio::test]
#[serial]
async fn handlers_may_fail_with_a_convertible_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("convert", &[("task", false, None)]);
  pipeline.on("task", |_ctx: ContextData<TestContext>| {
    Box::pin(async move { Err::<PipelineControl, _>(FlowError::Internal("boom".to_string())) })
  });

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  match result {
    Err(TestError::Flow(s)) => assert!(s.contains("boom")),
    other => panic!("expected converted FlowError, got {:?}", other),
  }
}

#[test]
#[should_panic(expected = "unknown step")]
fn attaching_to_an_undeclared_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new("typo", &[("real", false, None)]);
  pipeline.on_boxed("reel", recording_handler("reel", ""));
}

#[test]
#[should_panic(expected = "declared twice")]
fn duplicate_step_names_panic() {
  let _ = Pipeline::<TestContext, TestError>::new("dupes", &[("same", false, None), ("same", true, None)]);
}

#[test]
fn step_names_reflect_declaration() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new("names", &[("a", false, None)]);
  pipeline.push_step("b", true, None);
  assert_eq!(pipeline.name(), "names");
  assert_eq!(pipeline.step_names(), vec!["a", "b"]);
}

// benches/flow_benchmarks.rs
use bazaar_flow::{ContextData, FlowError, Handler, Pipeline, PipelineControl, Registry, SkipCondition};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

const STEP_NAMES: [&str; 10] = [
  "step_0", "step_1", "step_2", "step_3", "step_4", "step_5", "step_6", "step_7", "step_8", "step_9",
];

fn increment_handler() -> Handler<BenchContext, FlowError> {
  Box::new(|ctx: ContextData<BenchContext>| {
    Box::pin(async move {
      ctx.write().counter += 1;
      Ok(PipelineControl::Continue)
    })
  })
}

fn build_pipeline(num_steps: usize, skip_every_other: bool) -> Pipeline<BenchContext, FlowError> {
  let never: SkipCondition<BenchContext> = Arc::new(|_ctx: &ContextData<BenchContext>| true);
  let step_defs: Vec<(&str, bool, Option<SkipCondition<BenchContext>>)> = STEP_NAMES[..num_steps]
    .iter()
    .enumerate()
    .map(|(i, name)| {
      let skip = (skip_every_other && i % 2 == 1).then(|| never.clone());
      (*name, false, skip)
    })
    .collect();
  let mut pipeline = Pipeline::new("bench", &step_defs);
  for name in &STEP_NAMES[..num_steps] {
    pipeline.on_boxed(name, increment_handler());
  }
  pipeline
}

fn bench_pipeline_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineRun");
  let rt = Runtime::new().expect("tokio runtime");

  for num_steps in [1usize, 5, 10] {
    let pipeline = build_pipeline(num_steps, false);
    group.bench_with_input(BenchmarkId::new("steps", num_steps), &num_steps, |b, _| {
      b.to_async(&rt).iter(|| async {
        pipeline.run(ContextData::new(BenchContext::default())).await.expect("run")
      });
    });

    let skipping = build_pipeline(num_steps, true);
    group.bench_with_input(BenchmarkId::new("half_skipped", num_steps), &num_steps, |b, _| {
      b.to_async(&rt).iter(|| async {
        skipping.run(ContextData::new(BenchContext::default())).await.expect("run")
      });
    });
  }
  group.finish();
}

fn bench_registry_dispatch(c: &mut Criterion) {
  let rt = Runtime::new().expect("tokio runtime");
  let registry = Registry::<FlowError>::new();
  registry.register(build_pipeline(5, false));

  c.bench_function("RegistryDispatch/5_steps", |b| {
    b.to_async(&rt).iter(|| async {
      registry.run(ContextData::new(BenchContext::default())).await.expect("run")
    });
  });
}

criterion_group!(benches, bench_pipeline_run, bench_registry_dispatch);
criterion_main!(benches);

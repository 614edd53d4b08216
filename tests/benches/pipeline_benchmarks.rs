//! # Stanza Relay Pipeline Benchmarks
//!
//! Interceptors run on the session's thread for every stanza, so the hot
//! paths are measured here:
//!
//! | Area | Operation |
//! |------|-----------|
//! | xs-02 Stanza id | stamp a message |
//! | xs-03 Sequencing | next sequence, local and block assigners |
//! | xs-04 Pipeline | dispatch with N registered interceptors |

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use shared_types::{
    Address, DeliveryError, Direction, InterceptResult, Phase, SessionInfo, Stanza,
    StanzaInterceptor, StreamKey,
};
use xs_02_stanza_id::{StampingConfig, StanzaIdInterceptor, StanzaIdStamper};
use xs_03_sequencing::{
    BlockSequenceAssigner, InMemoryBlockSource, LocalSequenceAssigner, SequenceAssigner,
};
use xs_04_interceptors::{
    InterceptorRegistry, PipelineDispatcher, StanzaPipeline, StanzaRouter, StanzaTransport,
};

struct Sink;

impl StanzaRouter for Sink {
    fn route(&self, _: &Stanza, _: &SessionInfo) -> Result<(), DeliveryError> {
        Ok(())
    }
}

impl StanzaTransport for Sink {
    fn send(&self, _: &Stanza, _: &SessionInfo) -> Result<(), DeliveryError> {
        Ok(())
    }
}

struct PassThrough;

impl StanzaInterceptor for PassThrough {
    fn intercept(&self, _: &mut Stanza, _: &SessionInfo, _: Direction, _: Phase) -> InterceptResult {
        InterceptResult::Accepted
    }
}

fn addr(s: &str) -> Address {
    Address::parse(s).expect("valid address")
}

fn message() -> Stanza {
    Stanza::message()
        .with_from(addr("juliet@example.com/balcony"))
        .with_to(addr("romeo@example.com/orchard"))
        .with_body("Wherefore art thou?")
}

// ============================================================================
// XS-02: Stanza id
// ============================================================================

fn bench_stamping(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-02-stanza-id");
    let stamper = StanzaIdStamper::with_address(
        addr("example.com"),
        Arc::new(StampingConfig::default().to_settings()),
    );

    group.bench_function("stamp_fresh_message", |b| {
        b.iter(|| {
            let mut stanza = message();
            black_box(stamper.stamp(&mut stanza))
        })
    });

    group.bench_function("restamp_message", |b| {
        let mut stanza = message();
        stamper.stamp(&mut stanza);
        b.iter(|| black_box(stamper.stamp(&mut stanza)))
    });

    group.finish();
}

// ============================================================================
// XS-03: Sequencing
// ============================================================================

fn bench_sequencing(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-03-sequencing");
    let stream = StreamKey::new("lobby@conference.example.com");

    let local = LocalSequenceAssigner::new();
    group.bench_function("local_next_sequence", |b| {
        b.iter(|| black_box(local.next_sequence(&stream)))
    });

    for block_size in [10u64, 100, 1_000] {
        let assigner =
            BlockSequenceAssigner::new(Arc::new(InMemoryBlockSource::new()), 1, block_size)
                .expect("non-zero block size");
        group.bench_with_input(
            BenchmarkId::new("block_next_sequence", block_size),
            &assigner,
            |b, assigner| b.iter(|| black_box(assigner.next_sequence(&stream))),
        );
    }

    group.finish();
}

// ============================================================================
// XS-04: Pipeline
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-04-pipeline");
    let session = SessionInfo::new(addr("juliet@example.com/balcony"), addr("example.com"));

    for interceptors in [0usize, 4, 16] {
        let registry = Arc::new(InterceptorRegistry::new());
        for _ in 0..interceptors {
            registry.add_global(Arc::new(PassThrough));
        }
        let stamper = Arc::new(StanzaIdStamper::with_address(
            addr("example.com"),
            Arc::new(StampingConfig::default().to_settings()),
        ));
        let dispatcher = PipelineDispatcher::new(registry, Arc::new(Sink), Arc::new(Sink))
            .with_builtin(Arc::new(StanzaIdInterceptor::new(stamper)));

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("dispatch_incoming", interceptors),
            &dispatcher,
            |b, dispatcher| {
                b.iter(|| {
                    let mut stanza = message();
                    black_box(dispatcher.dispatch(&mut stanza, &session, Direction::Incoming))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_stamping, bench_sequencing, bench_dispatch);
criterion_main!(benches);

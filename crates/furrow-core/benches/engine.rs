use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use furrow_core::{calculate_round, initial_field, roll_events, AiDecisionMaker};
use furrow_protocol::AiLevel;

fn bench_calculate_round(c: &mut Criterion) {
    let field = initial_field();
    let events = roll_events(7);

    let mut group = c.benchmark_group("furrow-core/calculate_round");
    for level in AiLevel::ALL {
        let decision = AiDecisionMaker::new(1).decide(level, Some(&field), None);
        group.bench_with_input(BenchmarkId::from_parameter(level), &decision, |b, decision| {
            b.iter(|| {
                let round =
                    calculate_round(1, Some(&field), decision, &events, 100_000.0, 10, None);
                black_box(round.is_ok());
            })
        });
    }
    group.finish();
}

fn bench_ai_decide(c: &mut Criterion) {
    let field = initial_field();
    let mut group = c.benchmark_group("furrow-core/decide");
    for level in AiLevel::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(level), &level, |b, &level| {
            b.iter(|| black_box(AiDecisionMaker::new(3).decide(level, Some(&field), None)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_calculate_round, bench_ai_decide);
criterion_main!(benches);

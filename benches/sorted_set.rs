use criterion::{Bencher, Criterion, black_box};
use rand::prelude::*;
use zset::SortedSet;

fn filled(size: u32, rng: &mut SmallRng) -> SortedSet<u32> {
    let mut set = SortedSet::with_capacity(usize::try_from(size).unwrap_or(0));
    for member in 0..size {
        let _ = set.add(f64::from(rng.random_range(0..size.max(1))), member);
    }
    set
}

fn bench_add(b: &mut Bencher, base: u32, adds: u32) {
    let mut rng = SmallRng::seed_from_u64(514);
    let mut set = filled(base, &mut rng);
    let mut member = base;

    b.iter(|| {
        for _ in 0..adds {
            member = member.wrapping_add(1);
            black_box(set.add(rng.random(), member)).ok();
        }
    });
}

fn bench_rank(b: &mut Bencher, size: u32) {
    let mut rng = SmallRng::seed_from_u64(514);
    let set = filled(size, &mut rng);
    let len = i64::from(size);

    b.iter(|| {
        for rank in 1..=len {
            black_box(set.rank(rank));
        }
    });
}

fn bench_range(b: &mut Bencher, size: u32, width: u32) {
    let mut rng = SmallRng::seed_from_u64(514);
    let set = filled(size, &mut rng);

    b.iter(|| {
        let lo = f64::from(rng.random_range(0..size));
        black_box(set.search_range_by_score(lo, lo + f64::from(width)));
    });
}

fn bench_churn(b: &mut Bencher, size: u32) {
    let mut rng = SmallRng::seed_from_u64(514);
    let mut set = filled(size, &mut rng);

    b.iter(|| {
        let member = rng.random_range(0..size);
        if let Some(score) = set.remove_by_member(member) {
            black_box(set.add(score + 1.0, member)).ok();
        }
    });
}

fn bench_iter(b: &mut Bencher, size: u32) {
    let mut rng = SmallRng::seed_from_u64(514);
    let set = filled(size, &mut rng);

    b.iter(|| {
        for entry in &set {
            black_box(entry);
        }
    });
}

pub fn benchmark(c: &mut Criterion) {
    c.bench_function("SortedSet add 1 (empty)", |b| {
        bench_add(b, 0, 1);
    });
    c.bench_function("SortedSet add 100 (empty)", |b| {
        bench_add(b, 0, 100);
    });
    c.bench_function("SortedSet add 10000 (empty)", |b| {
        bench_add(b, 0, 10_000);
    });
    c.bench_function("SortedSet add 1 (filled)", |b| {
        bench_add(b, 100_000, 1);
    });
    c.bench_function("SortedSet add 100 (filled)", |b| {
        bench_add(b, 100_000, 100);
    });

    c.bench_function("SortedSet rank 1000", |b| {
        bench_rank(b, 1_000);
    });
    c.bench_function("SortedSet rank 100000", |b| {
        bench_rank(b, 100_000);
    });

    c.bench_function("SortedSet range 10 of 100000", |b| {
        bench_range(b, 100_000, 10);
    });
    c.bench_function("SortedSet range 1000 of 100000", |b| {
        bench_range(b, 100_000, 1_000);
    });

    c.bench_function("SortedSet churn 100000", |b| {
        bench_churn(b, 100_000);
    });

    c.bench_function("SortedSet iter 100", |b| {
        bench_iter(b, 100);
    });
    c.bench_function("SortedSet iter 10000", |b| {
        bench_iter(b, 10_000);
    });
}

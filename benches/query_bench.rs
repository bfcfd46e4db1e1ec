//! Benchmarks for query building and encoding
//!
//! Run with: cargo bench

use aluminum::query::{parse_pipeline, select, Select};
use aluminum::transport::{to_lines, DataPoint};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

aluminum::record! {
    pub struct MockBucket {
        pub measurement: i64 as Measurement,
        pub tag: String as Tag,
        pub field: i64 as Field,
    }
}

fn select_with(predicates: usize) -> Select<MockBucket> {
    select::<MockBucket>().and_where_all((0..predicates).map(|i| {
        if i % 2 == 0 {
            MockBucket::field().gt(i as i64)
        } else {
            MockBucket::tag().not_equals(format!("tag-{}", i))
        }
    }))
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for size in [0, 1, 10, 100] {
        let stmt = select_with(size);
        group.throughput(Throughput::Elements(size.max(1) as u64));
        group.bench_function(format!("predicates_{}", size), |b| {
            b.iter(|| black_box(&stmt).compile())
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for size in [1, 10, 100] {
        let text = select_with(size).compile();
        group.bench_function(format!("predicates_{}", size), |b| {
            b.iter(|| parse_pipeline(black_box(&text)).unwrap())
        });
    }

    group.finish();
}

fn bench_line_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_protocol");

    for size in [100, 1000, 10000] {
        let points: Vec<DataPoint> = (0..size)
            .map(|i| {
                DataPoint::new("20")
                    .tag("tag", "bench tag")
                    .field("field", i as i64)
                    .at(i as i64 * 1000)
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("encode_{}", size), |b| {
            b.iter(|| to_lines(black_box(&points)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_parse, bench_line_protocol);
criterion_main!(benches);

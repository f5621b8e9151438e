//! 쿼리 컴파일러 벤치마크
//!
//! Run with: cargo bench --bench compile_bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dbal_core::sql::{MssqlDialect, MysqlDialect, QueryCompiler, TableMap};
use dbal_core::{named_params, params};

fn bench_compile(c: &mut Criterion) {
    let compiler = QueryCompiler::new().with_tables(TableMap::new().with("orders", "shop.orders"));
    let mut group = c.benchmark_group("compile");

    group.bench_function("positional", |b| {
        b.iter(|| {
            compiler
                .compile(
                    black_box("SELECT * FROM {orders} WHERE status = ? AND note <> 'x?y' AND id > ?"),
                    black_box(&params!["open", 10]),
                    &MysqlDialect,
                )
                .unwrap()
        })
    });

    group.bench_function("named_requote", |b| {
        b.iter(|| {
            compiler
                .compile(
                    black_box("SELECT `a`, IFNULL(`b`, ?fallback) FROM {orders} WHERE `c` = ?c"),
                    black_box(&named_params! { "c" => 3, "fallback" => "-" }),
                    &MssqlDialect,
                )
                .unwrap()
        })
    });

    for size in [2usize, 16, 256] {
        let values: Vec<i64> = (0..size as i64).collect();
        let p = params![values];
        group.bench_with_input(BenchmarkId::new("in_expansion", size), &p, |b, p| {
            b.iter(|| {
                compiler
                    .compile(black_box("SELECT * FROM t WHERE id IN ?"), p, &MysqlDialect)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);

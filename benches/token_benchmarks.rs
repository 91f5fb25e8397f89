use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pillow_tokens::flatten::{flatten_into, FlatTokens};
use pillow_tokens::loader::to_token_tree;
use pillow_tokens::merge::merge;
use pillow_tokens::resolver::{Resolver, Visited};
use pillow_tokens::tree::{TokenPath, TokenTree};

// ============================================================================
// Test Data: Varying Tree Shapes and Sizes
// ============================================================================

fn tree(value: serde_json::Value) -> TokenTree {
    to_token_tree(&value, "pillow")
}

const SMALL_TOKENS: &str = r#"{
    "core": {
        "unit": { "$type": "dimension", "$value": 4 },
        "color": {
            "blue": { "$type": "color", "$value": "#0050FFFF" }
        }
    }
}"#;

const MEDIUM_TOKENS: &str = r#"{
    "core": {
        "unit": { "$type": "dimension", "$value": 4 },
        "scale": { "$type": "number", "$value": 2 },
        "color": {
            "blue": { "$type": "color", "$value": "#0050FFFF" },
            "ink": { "$type": "color", "$value": "#1B1B1BFF" },
            "surface": { "$type": "color", "$value": "{pillow.core.color.ink}" }
        },
        "spacing": {
            "small": { "$type": "dimension", "$value": "{pillow.core.unit}" },
            "medium": { "$type": "dimension", "$value": "{pillow.core.unit} * 2" },
            "large": { "$type": "dimension", "$value": "{pillow.core.unit} * {pillow.core.scale} * 2" }
        }
    }
}"#;

/// Generates a flat group of `size` tokens, every other one an expression
/// over the shared unit.
fn generate_tokens(size: usize) -> TokenTree {
    let mut members = serde_json::Map::new();
    members.insert(
        "unit".to_string(),
        serde_json::json!({ "$type": "dimension", "$value": 4 }),
    );
    for i in 0..size {
        let value = if i % 2 == 0 {
            serde_json::json!({ "$type": "dimension", "$value": format!("{{pillow.unit}} * {i}") })
        } else {
            serde_json::json!({ "$type": "dimension", "$value": i })
        };
        members.insert(format!("token{i}"), value);
    }
    tree(serde_json::Value::Object(members))
}

/// Generates a chain of `references` sequential references ending in a
/// literal, for resolver scaling runs.
fn generate_chain(references: usize) -> TokenTree {
    let mut members = serde_json::Map::new();
    for i in 0..references {
        members.insert(
            format!("t{i}"),
            serde_json::json!({ "$value": format!("{{pillow.t{}}}", i + 1) }),
        );
    }
    members.insert(
        format!("t{references}"),
        serde_json::json!({ "$value": 5 }),
    );
    tree(serde_json::Value::Object(members))
}

fn parse(source: &str) -> TokenTree {
    tree(serde_json::from_str(source).unwrap())
}

// ============================================================================
// Merge Benchmarks
// ============================================================================

fn bench_merge_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_by_size");

    for size in [10, 100, 1000] {
        let base = generate_tokens(size);
        let overlay = generate_tokens(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut target = base.clone();
                merge(&mut target, black_box(overlay.clone()));
                target
            })
        });
    }

    group.finish();
}

// ============================================================================
// Resolver Benchmarks
// ============================================================================

fn bench_resolver_chain_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver_chain_scaling");

    for hops in [1, 5, 10, 20] {
        let chain = generate_chain(hops);
        group.throughput(Throughput::Elements(hops as u64));
        group.bench_with_input(BenchmarkId::from_parameter(hops), &chain, |b, chain| {
            let start = TokenPath::new(vec!["t0".to_string()]);
            b.iter(|| {
                let mut resolver = Resolver::new(black_box(chain), "pillow");
                let mut visited = Visited::new();
                resolver.resolve(&start, &mut visited)
            })
        });
    }

    group.finish();
}

fn bench_resolver_memoized_rerun(c: &mut Criterion) {
    let chain = generate_chain(20);
    let start = TokenPath::new(vec!["t0".to_string()]);
    c.bench_function("resolver_memoized_rerun", |b| {
        let mut resolver = Resolver::new(&chain, "pillow");
        let mut visited = Visited::new();
        let _ = resolver.resolve(&start, &mut visited);
        b.iter(|| {
            let mut visited = Visited::new();
            resolver.resolve(black_box(&start), &mut visited)
        })
    });
}

// ============================================================================
// Expression Benchmarks
// ============================================================================

fn bench_expression_evaluation(c: &mut Criterion) {
    let tokens = parse(MEDIUM_TOKENS);
    c.bench_function("expression_two_references", |b| {
        b.iter(|| {
            let mut resolver = Resolver::new(black_box(&tokens), "pillow");
            let mut visited = Visited::new();
            pillow_tokens::expr::evaluate(
                "{pillow.core.unit} * {pillow.core.scale} + 2",
                &mut resolver,
                &mut visited,
            )
        })
    });
}

// ============================================================================
// End-to-End Flattening Benchmarks
// ============================================================================

fn bench_flatten_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_by_size");

    for (name, source) in [("small", SMALL_TOKENS), ("medium", MEDIUM_TOKENS)] {
        let tokens = parse(source);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &tokens, |b, tokens| {
            b.iter(|| {
                let mut resolver = Resolver::new(black_box(tokens), "pillow");
                let mut out = FlatTokens::new();
                let mut skipped = Vec::new();
                flatten_into(tokens, &mut resolver, &mut out, &mut skipped);
                out
            })
        });
    }

    group.finish();
}

fn bench_flatten_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_scaling");

    for size in [10, 100, 1000] {
        let tokens = generate_tokens(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tokens, |b, tokens| {
            b.iter(|| {
                let mut resolver = Resolver::new(black_box(tokens), "pillow");
                let mut out = FlatTokens::new();
                let mut skipped = Vec::new();
                flatten_into(tokens, &mut resolver, &mut out, &mut skipped);
                out
            })
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(merge_benches, bench_merge_sizes);

criterion_group!(
    resolver_benches,
    bench_resolver_chain_scaling,
    bench_resolver_memoized_rerun
);

criterion_group!(expr_benches, bench_expression_evaluation);

criterion_group!(flatten_benches, bench_flatten_sizes, bench_flatten_scaling);

criterion_main!(merge_benches, resolver_benches, expr_benches, flatten_benches);

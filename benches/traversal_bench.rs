/// Benchmarks for the debugtwin traversal engine.
///
/// Run with: `cargo bench`
///
/// - One coordinated walk with 1, 4 and 16 inspectors vs. one walk per inspector
/// - The full production pipeline at various file sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use debugtwin::{from_fn, Coordinator, Inspector, SourceTree, Variant};

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A debug package file with `functions` logging functions that call each other.
fn synthetic_source(functions: usize) -> String {
    let mut source = String::from("use std::fmt;\nuse std::io::Write;\nuse std::collections::HashMap;\n\n");
    for index in 0..functions {
        let callee = (index + 1) % functions;
        source.push_str(&format!(
            "// Logs step {index}.\n\
             pub fn log_{index}(args: fmt::Arguments<'_>) {{\n\
             \x20   let _ = std::io::stderr().write_fmt(args);\n\
             \x20   helper_{callee}(args);\n\
             \x20   println!(\"{{}}\", {index});\n\
             }}\n\n\
             fn helper_{index}(args: fmt::Arguments<'_>) {{\n\
             \x20   let _ = args;\n\
             }}\n\n",
        ));
    }
    source
}

fn counting_inspectors(count: usize) -> Vec<impl Inspector> {
    (0..count)
        .map(|_| {
            let mut seen = 0usize;
            from_fn(move |_node| {
                seen += 1;
                black_box(seen);
                true
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_coordinated_walk(c: &mut Criterion) {
    let file: syn::File = syn::parse_file(&synthetic_source(200)).unwrap();
    let mut group = c.benchmark_group("coordinator");

    for inspectors in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("shared_walk", inspectors), &inspectors, |b, &count| {
            let mut tree = file.clone();
            b.iter(|| {
                let mut inspectors = counting_inspectors(count);
                let mut coordinator =
                    Coordinator::new(inspectors.iter_mut().map(|i| i as &mut dyn Inspector));
                coordinator.inspect(&mut tree);
                black_box(coordinator.visits())
            })
        });

        group.bench_with_input(BenchmarkId::new("walk_per_inspector", inspectors), &inspectors, |b, &count| {
            let mut tree = file.clone();
            b.iter(|| {
                let mut visits = 0;
                for mut inspector in counting_inspectors(count) {
                    let mut coordinator = Coordinator::new([&mut inspector as &mut dyn Inspector]);
                    coordinator.inspect(&mut tree);
                    visits += coordinator.visits();
                }
                black_box(visits)
            })
        });
    }
    group.finish();
}

fn bench_production_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("production_pipeline");

    for functions in [10usize, 100, 500] {
        let source = synthetic_source(functions);
        let tree = SourceTree::parse(&source).unwrap();
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(functions), &tree, |b, tree| {
            b.iter(|| {
                let mut tree = tree.clone();
                Variant::Production.pipeline(&[]).edit(&mut tree).unwrap();
                black_box(tree.file.items.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_coordinated_walk, bench_production_pipeline);
criterion_main!(benches);

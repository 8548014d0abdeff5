use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use outliner_engine::{BlockPath, BlockTree};
mod common;

fn bench_tree_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_building");
    group.sample_size(20);

    let blocks = common::generate_blocks(50);
    group.bench_function("new", |b| {
        b.iter_batched(
            || blocks.clone(),
            |blocks| std::hint::black_box(BlockTree::new(blocks)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_tree_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_edits");
    group.sample_size(20);

    let tree = BlockTree::new(common::generate_blocks(50));
    let middle = BlockPath::from(&[25, 10][..]);
    let top = BlockPath::from(&[25][..]);

    group.bench_function("split", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| std::hint::black_box(tree.split(&middle, 3)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("merge", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| std::hint::black_box(tree.merge(&middle)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("indent_with_children", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| std::hint::black_box(tree.indent(&top)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("update_content", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| std::hint::black_box(tree.update_content(&middle, "DONE [[Groceries]]")),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("locate", |b| {
        let id = tree.resolve(&middle).map(|block| block.id().clone());
        b.iter(|| {
            let path = id.as_ref().and_then(|id| tree.locate(id));
            std::hint::black_box(path);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tree_building, bench_tree_edits);
criterion_main!(benches);

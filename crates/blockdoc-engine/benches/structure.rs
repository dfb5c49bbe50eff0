use blockdoc_engine::{BlockRegistry, BlockType, Cmd, Document, EditorOptions};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
mod common;

fn document(size: usize) -> Document {
    Document::from_markup(
        &common::generate_markup(size),
        BlockRegistry::default(),
        EditorOptions::default(),
    )
}

fn bench_structural_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure");
    group.sample_size(10);

    group.bench_function("insert_after", |b| {
        b.iter_batched(
            || document(50),
            |mut doc| {
                let anchor = doc.blocks()[0].id().clone();
                let patch = doc.apply(Cmd::InsertAfter {
                    anchor,
                    kind: BlockType::Paragraph,
                    content: std::hint::black_box("new".to_string()),
                });
                std::hint::black_box(patch);
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("move_last_to_first", |b| {
        b.iter_batched(
            || document(50),
            |mut doc| {
                let id = doc.blocks()[doc.blocks().len() - 1].id().clone();
                std::hint::black_box(doc.move_block(&id, 0, None));
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("undo_redo", |b| {
        b.iter_batched(
            || {
                let mut doc = document(50);
                let id = doc.blocks()[1].id().clone();
                doc.set_content(&id, "changed");
                doc
            },
            |mut doc| {
                doc.undo();
                std::hint::black_box(doc.redo());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_structural_operations);
criterion_main!(benches);

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ebgraph::prelude::*;

fn cut_node() -> GraphNode<2> {
    let mut node = GraphNode::default();
    for ordinal in 0..3u32 {
        let mut rec = NodeRecord::new();
        for axis in 0..2 {
            for side in Side::BOTH {
                rec.push_arc(axis, side, ordinal);
            }
        }
        node.push_irregular_node(rec);
    }
    node
}

fn bench_faces(c: &mut Criterion) {
    let domain = IndexBox::new(IntVect([0, 0]), IntVect([63, 63]));
    let regular = GraphNode::<2>::Regular;
    let cut = cut_node();

    let mut group = c.benchmark_group("faces");
    group.bench_function("regular_fast_path", |b| {
        let vof = VolIndex::new(IntVect([17, 23]), 0);
        b.iter(|| black_box(regular.faces(black_box(&vof), 0, Side::Hi, &domain)))
    });
    group.bench_function("record_list", |b| {
        let vof = VolIndex::new(IntVect([17, 23]), 1);
        b.iter(|| black_box(cut.faces(black_box(&vof), 0, Side::Hi, &domain)))
    });
    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let cut = cut_node();
    let mut buf = Vec::with_capacity(cut.linear_size());
    cut.linear_out(&mut buf);

    let mut group = c.benchmark_group("wire");
    group.bench_function("linear_out", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(cut.linear_size());
            cut.linear_out(&mut out);
            black_box(out)
        })
    });
    group.bench_function("linear_in", |b| {
        b.iter(|| GraphNode::<2>::linear_in(&mut black_box(buf.as_slice())).unwrap())
    });
    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let cut = cut_node();
    c.bench_function("deep_clone_cut_cell", |b| b.iter(|| black_box(cut.clone())));
}

criterion_group!(benches, bench_faces, bench_wire, bench_clone);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use surge::prelude::*;
use surge::{aggregate, PowerModel};

fn build_model(components: usize, modes: usize) -> PowerModel {
    let mut model = PowerModel::new();
    for i in 0..components {
        model
            .add_component(Component::new(format!("C{}", i), 3.3 + i as f64, 0.1))
            .unwrap();
    }
    for m in 0..modes {
        model.add_mode(&format!("Mode {}", m), 1.0 + m as f64, None).unwrap();
        for i in (m % 3..components).step_by(3) {
            model.toggle_component(m, i).unwrap();
        }
    }
    model
}

fn bench_aggregate(c: &mut Criterion) {
    let model = build_model(200, 12);

    c.bench_function("aggregate_200x12", |b| {
        b.iter(|| aggregate(black_box(model.components()), black_box(model.modes())));
    });
}

fn bench_remove_component(c: &mut Criterion) {
    let model = build_model(200, 12);

    c.bench_function("remove_component_front", |b| {
        b.iter(|| {
            let mut m = model.clone();
            m.remove_component(black_box(0)).unwrap();
            m
        });
    });
}

fn bench_session_toggle(c: &mut Criterion) {
    let mut session = Session::new(MemoryStore::new());
    for i in 0..50 {
        session
            .add_component(Component::new(format!("C{}", i), 5.0, 0.2))
            .unwrap();
    }
    session.add_mode("Science", "2", None).unwrap();

    c.bench_function("session_toggle_50", |b| {
        b.iter(|| session.toggle_component(0, black_box(25)).unwrap());
    });
}

criterion_group!(benches, bench_aggregate, bench_remove_component, bench_session_toggle);
criterion_main!(benches);

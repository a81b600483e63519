use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dynamics::{rk4, Cart, Pole};

fn bench_rk4(c: &mut Criterion) {
    let start = Cart::new(
        1.0,
        0.0,
        0.0,
        0.0,
        vec![
            Pole::new(0.5, 0.1, 0.0, 0.05, 0.0),
            Pole::new(0.05, 0.01, 0.0, 0.0, 0.0),
        ],
    );

    c.bench_function("rk4_two_pole_step", |b| {
        b.iter(|| {
            let mut cart = start.clone();
            let first = cart.first_order();
            let second = cart.second_order(black_box(3.0), -9.8);
            rk4(3.0, &mut cart, &first, &second, -9.8, 0.01);
            black_box(cart.position);
        });
    });
}

criterion_group!(benches, bench_rk4);
criterion_main!(benches);

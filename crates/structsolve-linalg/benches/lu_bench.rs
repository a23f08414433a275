use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use structsolve_linalg::{cholesky, lu_in_place, Factorization, FactorizeOptions};
use structsolve_matrix::{Matrix, StructuredMatrix, SymmetricMatrix, Uplo};

/// Generate a random f64 matrix
fn random_matrix(n: usize, m: usize, seed: u64) -> Matrix<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Matrix::from_fn(n, m, |_, _| rng.random::<f64>())
}

/// Generate a random symmetric positive-definite matrix
fn random_spd(n: usize, seed: u64) -> SymmetricMatrix<f64> {
    let a = random_matrix(n, n, seed);
    let mut s = SymmetricMatrix::zeros(n);
    for i in 0..n {
        for j in 0..=i {
            let v = if i == j { a[[i, j]] + n as f64 } else { a[[i, j]] };
            s.set(i, j, v).unwrap();
        }
    }
    s
}

fn bench_factorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("factorize");

    for &size in &[10, 50, 100, 500] {
        group.bench_with_input(BenchmarkId::new("lu_in_place", size), &size, |b, &n| {
            b.iter_batched(
                || random_matrix(n, n, 42),
                |mut m| {
                    lu_in_place(&mut m).unwrap();
                },
                criterion::BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("cholesky", size), &size, |b, &n| {
            let s = random_spd(n, 42);
            b.iter(|| cholesky(&s).unwrap());
        });
    }

    group.finish();
}

fn bench_solve_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_matrix");

    for &(n, nrhs) in &[(100, 1), (100, 64), (400, 64)] {
        let a = StructuredMatrix::General(random_matrix(n, n, 7));
        let f = Factorization::new(&a, &FactorizeOptions::default()).unwrap();
        let rhs = random_matrix(n, nrhs, 8);
        group.bench_with_input(
            BenchmarkId::new("lu", format!("{n}x{nrhs}")),
            &rhs,
            |b, rhs| {
                b.iter(|| f.solve_matrix(rhs).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_factorize, bench_solve_many);
criterion_main!(benches);

use approx::assert_relative_eq;
use structsolve_linalg::{
    cholesky, det, inv, solve, Factorization, FactorizeOptions, SolveError, SymmetricPolicy,
};
use structsolve_matrix::{
    from_vec2d, Diag, Matrix, StructuredMatrix, SymmetricMatrix, TriangularMatrix, Uplo,
};

fn symmetric(rows: Vec<Vec<f64>>) -> anyhow::Result<SymmetricMatrix<f64>> {
    Ok(SymmetricMatrix::from_dense(&from_vec2d(rows)?, Uplo::Lower)?)
}

#[test]
fn spd_diagonal_uses_cholesky() -> anyhow::Result<()> {
    let s = symmetric(vec![vec![2.0, 0.0], vec![0.0, 2.0]])?;
    let g = cholesky(&s)?;
    let expected = from_vec2d(vec![
        vec![2.0_f64.sqrt(), 0.0],
        vec![0.0, 2.0_f64.sqrt()],
    ])?;
    assert!(g.l().approx_eq(&expected, 1e-15));

    let a: StructuredMatrix<f64> = s.into();
    let f = Factorization::new(&a, &FactorizeOptions::default())?;
    assert!(matches!(f, Factorization::Cholesky(_)));
    let x = f.solve(&[2.0, 2.0])?;
    assert_relative_eq!(x[0], 1.0, epsilon = 1e-14);
    assert_relative_eq!(x[1], 1.0, epsilon = 1e-14);
    Ok(())
}

#[test]
fn permutation_matrix_needs_pivoting() -> anyhow::Result<()> {
    let s = symmetric(vec![vec![0.0, 1.0], vec![1.0, 0.0]])?;
    assert_eq!(
        cholesky(&s).unwrap_err(),
        SolveError::NotPositiveDefinite { pivot: 0 }
    );

    let a: StructuredMatrix<f64> = s.into();
    let opts = FactorizeOptions::default().with_symmetric_policy(SymmetricPolicy::CholeskyOrLu);
    let f = Factorization::new(&a, &opts)?;
    let Factorization::Lu(lu) = &f else {
        panic!("expected LU fallback, got {f:?}");
    };
    assert_eq!(lu.perm(), &[1, 0]);
    assert_eq!(lu.u(), Matrix::eye(2));
    assert_eq!(f.determinant(), -1.0);
    assert_eq!(det(&a)?, -1.0);
    Ok(())
}

#[test]
fn upper_triangular_back_substitution() -> anyhow::Result<()> {
    let m = from_vec2d(vec![vec![2.0, 3.0], vec![0.0, 4.0]])?;
    let t = TriangularMatrix::from_dense(&m, Uplo::Upper, Diag::NonUnit)?;
    let a: StructuredMatrix<f64> = t.into();
    let x = solve(&a, &[8.0, 8.0])?;
    assert_relative_eq!(x[0], 1.0);
    assert_relative_eq!(x[1], 2.0);
    Ok(())
}

#[test]
fn singular_matrix_is_reported() -> anyhow::Result<()> {
    let a: StructuredMatrix<f64> = from_vec2d(vec![vec![1.0, 2.0], vec![2.0, 4.0]])?.into();
    let f = Factorization::new(&a, &FactorizeOptions::default())?;
    assert!(f.is_singular());
    assert_eq!(f.inverse().unwrap_err(), SolveError::SingularMatrix);
    assert_eq!(inv(&a).unwrap_err(), SolveError::SingularMatrix);
    Ok(())
}

#[test]
fn one_by_one_boundary() -> anyhow::Result<()> {
    for x in [3.5, -2.0, 0.0] {
        let a: StructuredMatrix<f64> = from_vec2d(vec![vec![x]])?.into();
        let f = Factorization::new(&a, &FactorizeOptions::default())?;
        assert_eq!(f.determinant(), x);
        assert_eq!(f.is_singular(), x == 0.0);
    }
    Ok(())
}

#[test]
fn mismatched_rhs_fails_before_solving() -> anyhow::Result<()> {
    let a: StructuredMatrix<f64> = Matrix::eye(3).into();
    assert!(matches!(
        solve(&a, &[1.0, 2.0]),
        Err(SolveError::ShapeMismatch { .. })
    ));
    let rect: StructuredMatrix<f64> = Matrix::zeros(3, 2).into();
    assert!(matches!(
        det(&rect),
        Err(SolveError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn overwrite_paths_consume_storage() -> anyhow::Result<()> {
    let m = from_vec2d(vec![vec![4.0, 1.0], vec![2.0, 3.0]])?;
    let f = Factorization::from_owned(
        StructuredMatrix::General(m.clone()),
        &FactorizeOptions::default(),
    )?;

    let mut b = vec![5.0, 5.0];
    f.solve_in_place(&mut b)?;
    assert_relative_eq!(b[0], 1.0, epsilon = 1e-14);
    assert_relative_eq!(b[1], 1.0, epsilon = 1e-14);

    let mut rhs = Matrix::from_fn(2, 2, |i, j| if j == 0 { 5.0 } else { m[[i, 0]] });
    f.solve_matrix_in_place(&mut rhs)?;
    assert_relative_eq!(rhs[[0, 1]], 1.0, epsilon = 1e-14);
    assert_relative_eq!(rhs[[1, 1]], 0.0, epsilon = 1e-14);
    Ok(())
}

use structsolve_matrix::{
    from_vec2d, Diag, Matrix, Order, SolveError, SparseMatrix, Structure, StructuredMatrix,
    SymmetricMatrix, TriangularMatrix, Uplo,
};

#[test]
fn views_write_through_to_the_matrix() -> anyhow::Result<()> {
    let mut m = Matrix::from_fn(3, 4, |i, j| (10 * i + j) as f64);

    m.row_mut(1).scale(-1.0);
    assert_eq!(m.row(1).to_vec(), vec![-10.0, -11.0, -12.0, -13.0]);

    {
        let mut col = m.col_mut(2);
        col[0] = 100.0;
        col.copy_from_slice(&[100.0, 200.0, 300.0]);
    }
    assert_eq!(m[[0, 2]], 100.0);
    assert_eq!(m[[2, 2]], 300.0);

    // an explicit copy no longer tracks the source
    let snapshot = m.col(2).to_vec();
    m[[1, 2]] = 0.0;
    assert_eq!(snapshot, vec![100.0, 200.0, 300.0]);
    assert_eq!(m.col(2).to_vec(), vec![100.0, 0.0, 300.0]);
    Ok(())
}

#[test]
fn element_order_round_trips() -> anyhow::Result<()> {
    let col_major = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
    let m = Matrix::from_slice(2, 3, &col_major, Order::ColMajor)?;
    assert_eq!(m, from_vec2d(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?);
    assert_eq!(m.to_vec(Order::ColMajor), col_major.to_vec());
    assert_eq!(m.to_vec(Order::RowMajor), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert!(matches!(
        Matrix::from_slice(2, 2, &col_major, Order::RowMajor),
        Err(SolveError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn symmetric_storage_mirrors_reads() -> anyhow::Result<()> {
    let mut s = SymmetricMatrix::<f64>::zeros(3);
    s.set(2, 0, 7.0)?;
    s.set(1, 1, 2.0)?;
    assert_eq!(s.get(0, 2)?, 7.0);
    assert_eq!(s.as_packed().len(), 6);
    assert!(s.to_dense().is_symmetric(0.0));
    assert!(matches!(
        s.get(3, 0),
        Err(SolveError::IndexOutOfBounds { row: 3, .. })
    ));
    Ok(())
}

#[test]
fn triangular_storage_synthesizes_zero_half() -> anyhow::Result<()> {
    let mut t = TriangularMatrix::<f64>::zeros(3, Uplo::Upper, Diag::Unit);
    t.set(0, 2, 5.0)?;
    assert_eq!(t.get(0, 2)?, 5.0);
    assert_eq!(t.get(2, 0)?, 0.0);
    assert_eq!(t.get(1, 1)?, 1.0);
    assert!(matches!(
        t.set(2, 0, 1.0),
        Err(SolveError::InvalidArgument { .. })
    ));
    assert!(matches!(
        t.set(1, 1, 3.0),
        Err(SolveError::InvalidArgument { .. })
    ));
    assert_eq!(t.as_packed().len(), 6);
    Ok(())
}

#[test]
fn sparse_keeps_one_entry_per_key() -> anyhow::Result<()> {
    let mut s = SparseMatrix::from_triplets(3, 3, &[(2, 1, 1.0), (0, 0, 2.0), (2, 0, 3.0)])?;
    assert_eq!(s.row_ptr(), &[0, 1, 1, 3]);
    assert_eq!(s.col_indices(), &[0, 0, 1]);

    s.set(2, 1, -1.0)?;
    s.set(1, 2, 4.0)?;
    assert_eq!(s.nnz(), 4);
    assert_eq!(s.get(2, 1)?, -1.0);
    for i in 0..3 {
        let (cols, _) = s.row(i);
        assert!(cols.windows(2).all(|w| w[0] < w[1]));
    }

    assert_eq!(
        SparseMatrix::from_triplets(2, 2, &[(1, 1, 1.0), (1, 1, 2.0)]).unwrap_err(),
        SolveError::DuplicateEntry { row: 1, col: 1 }
    );
    Ok(())
}

#[test]
fn structured_matrix_reports_its_kind() -> anyhow::Result<()> {
    let dense = from_vec2d(vec![vec![4.0, 0.0], vec![1.0, 3.0]])?;
    let kinds: Vec<StructuredMatrix<f64>> = vec![
        dense.clone().into(),
        SymmetricMatrix::from_dense(&dense, Uplo::Lower)?.into(),
        TriangularMatrix::from_dense(&dense, Uplo::Lower, Diag::NonUnit)?.into(),
        SparseMatrix::from_dense(&dense, 0.0).into(),
    ];
    let names: Vec<String> = kinds.iter().map(|a| a.structure().to_string()).collect();
    assert_eq!(names, ["general", "symmetric", "lower triangular", "sparse"]);

    // all four agree on the lower triangle they share
    for a in &kinds {
        assert_eq!(a.get(1, 0)?, 1.0);
        assert_eq!(a.matvec(&[1.0, 1.0])?[1], 4.0);
    }
    assert_eq!(kinds[1].get(0, 1)?, 1.0);
    assert_eq!(kinds[1].structure(), Structure::Symmetric);
    Ok(())
}

use matrixcompare::{assert_matrix_eq, prop_assert_matrix_eq};
use nalgebra::{dmatrix, point, DMatrix, Point3, Rotation3, Vector3};
use proptest::prelude::*;
use sysasm::assembly::local::{linear_basis_gradients, LaplaceForm, LocalFormEvaluator};
use sysasm::dofmap::TableDofMap;
use sysasm::error::AssemblyError;
use sysasm::geometry::CellType;
use sysasm::mesh::Cell;
use sysasm::nalgebra::DMatrixViewMut;

fn reference_triangle() -> [Point3<f64>; 3] {
    [point![0.0, 0.0, 0.0], point![1.0, 0.0, 0.0], point![0.0, 1.0, 0.0]]
}

fn reference_tetrahedron() -> [Point3<f64>; 4] {
    [
        point![0.0, 0.0, 0.0],
        point![1.0, 0.0, 0.0],
        point![0.0, 1.0, 0.0],
        point![0.0, 0.0, 1.0],
    ]
}

fn stiffness(cell: &Cell<f64>) -> DMatrix<f64> {
    let n = cell.vertices().len();
    let dof_map = TableDofMap::new(n, vec![(0..n).collect()]).unwrap();
    let form = LaplaceForm::<f64>::new(&dof_map);
    let mut output = DMatrix::zeros(n, n);
    form.compute_cell_tensor(cell, DMatrixViewMut::from(&mut output))
        .unwrap();
    output
}

#[test]
fn reference_triangle_gradients() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let gradients = linear_basis_gradients(&cell).unwrap();
    #[rustfmt::skip]
    let expected = dmatrix![-1.0, 1.0, 0.0;
                            -1.0, 0.0, 1.0;
                             0.0, 0.0, 0.0];
    assert_matrix_eq!(gradients, expected, comp = abs, tol = 1e-14);
}

#[test]
fn reference_triangle_stiffness() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    #[rustfmt::skip]
    let expected = dmatrix![ 1.0, -0.5, -0.5;
                            -0.5,  0.5,  0.0;
                            -0.5,  0.0,  0.5];
    assert_matrix_eq!(stiffness(&cell), expected, comp = abs, tol = 1e-14);
}

#[test]
fn reference_tetrahedron_stiffness() {
    let vertices = reference_tetrahedron();
    let cell = Cell::new(0, CellType::Tetrahedron, 3, &vertices);
    #[rustfmt::skip]
    let expected = dmatrix![ 3.0, -1.0, -1.0, -1.0;
                            -1.0,  1.0,  0.0,  0.0;
                            -1.0,  0.0,  1.0,  0.0;
                            -1.0,  0.0,  0.0,  1.0] / 6.0;
    assert_matrix_eq!(stiffness(&cell), expected, comp = abs, tol = 1e-14);
}

#[test]
fn stiffness_of_interval_embedded_in_3d() {
    // An interval of length 2 along the diagonal of the xy-plane
    let s = f64::sqrt(2.0);
    let vertices = [point![1.0, 1.0, 0.0], point![1.0 + s, 1.0 + s, 0.0]];
    let cell = Cell::new(0, CellType::Interval, 3, &vertices);
    assert_matrix_eq!(stiffness(&cell), dmatrix![0.5, -0.5; -0.5, 0.5], comp = abs, tol = 1e-14);
}

#[test]
fn stiffness_is_added_to_existing_values() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let dof_map = TableDofMap::new(3, vec![vec![0, 1, 2]]).unwrap();
    let form = LaplaceForm::<f64>::new(&dof_map).with_coefficient(2.0);
    let mut output = DMatrix::repeat(3, 3, 1.0);
    form.compute_cell_tensor(&cell, DMatrixViewMut::from(&mut output))
        .unwrap();
    assert_matrix_eq!(output, DMatrix::repeat(3, 3, 1.0) + 2.0 * stiffness(&cell), comp = abs, tol = 1e-14);
}

#[test]
fn gradients_require_simplices() {
    let vertices = [
        point![0.0, 0.0, 0.0],
        point![1.0, 0.0, 0.0],
        point![0.0, 1.0, 0.0],
        point![1.0, 1.0, 0.0],
    ];
    let cell = Cell::new(0, CellType::Quadrilateral, 2, &vertices);
    assert!(linear_basis_gradients(&cell).is_err());
}

#[test]
fn gradients_of_degenerate_cell_are_rejected() {
    let vertices = [point![0.0, 0.0, 0.0], point![1.0, 0.0, 0.0], point![2.0, 0.0, 0.0]];
    let cell = Cell::new(4, CellType::Triangle, 2, &vertices);
    let err = linear_basis_gradients(&cell).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::DegenerateGeometry { cell: 4, .. })
    ));
}

#[test]
fn stiffness_rejects_wrong_output_shape() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let dof_map = TableDofMap::new(2, vec![vec![0, 1]]).unwrap();
    let form = LaplaceForm::<f64>::new(&dof_map);
    let mut output = DMatrix::zeros(2, 2);
    assert!(form
        .compute_cell_tensor(&cell, DMatrixViewMut::from(&mut output))
        .is_err());
}

proptest! {
    #[test]
    fn stiffness_rows_sum_to_zero_and_are_rotation_invariant(
        angle in -3.0..3.0f64,
        axis in [-1.0..1.0f64, -1.0..1.0f64, 0.1..1.0f64],
        scale in 0.1..10.0f64,
    ) {
        let rotation = Rotation3::from_axis_angle(&nalgebra::Unit::new_normalize(Vector3::from(axis)), angle);
        let reference = reference_tetrahedron();
        let transformed = reference.map(|p| Point3::from(rotation * (p.coords * scale)));

        let reference_cell = Cell::new(0, CellType::Tetrahedron, 3, &reference);
        let transformed_cell = Cell::new(0, CellType::Tetrahedron, 3, &transformed);
        let k_reference = stiffness(&reference_cell);
        let k = stiffness(&transformed_cell);

        // The stiffness of a linear element scales with the length of the cell in 3D
        prop_assert_matrix_eq!(k, k_reference * scale, comp = abs, tol = 1e-9 * scale);
        for i in 0..4 {
            prop_assert!(k.row(i).sum().abs() <= 1e-10 * scale);
        }
    }
}

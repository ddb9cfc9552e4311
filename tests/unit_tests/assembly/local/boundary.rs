use matrixcompare::assert_matrix_eq;
use nalgebra::{dmatrix, point, DMatrix, Point3};
use sysasm::assembly::local::{BoundaryFluxForm, LocalFormEvaluator, RobinForm};
use sysasm::dofmap::TableDofMap;
use sysasm::geometry::CellType;
use sysasm::mesh::Cell;
use sysasm::nalgebra::DMatrixViewMut;

fn reference_triangle() -> [Point3<f64>; 3] {
    [point![0.0, 0.0, 0.0], point![1.0, 0.0, 0.0], point![0.0, 1.0, 0.0]]
}

#[test]
fn robin_mass_on_triangle_edge() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let dof_map = TableDofMap::new(3, vec![vec![0, 1, 2]]).unwrap();
    let form = RobinForm::<f64>::new(&dof_map, 6.0);

    // Facet 2 is the edge opposite to vertex 2, of length 1
    let mut output = DMatrix::zeros(3, 3);
    form.compute_exterior_facet_tensor(&cell, 2, DMatrixViewMut::from(&mut output))
        .unwrap();
    #[rustfmt::skip]
    let expected = dmatrix![2.0, 1.0, 0.0;
                            1.0, 2.0, 0.0;
                            0.0, 0.0, 0.0];
    assert_matrix_eq!(output, expected, comp = abs, tol = 1e-14);
}

#[test]
fn robin_mass_on_tetrahedron_face_integrates_area() {
    let vertices = [
        point![0.0, 0.0, 0.0],
        point![1.0, 0.0, 0.0],
        point![0.0, 1.0, 0.0],
        point![0.0, 0.0, 1.0],
    ];
    let cell = Cell::new(0, CellType::Tetrahedron, 3, &vertices);
    let dof_map = TableDofMap::new(4, vec![vec![0, 1, 2, 3]]).unwrap();
    let form = RobinForm::<f64>::new(&dof_map, 1.0);

    // Face 0 is opposite to the origin, an equilateral triangle of area sqrt(3) / 2
    let mut output = DMatrix::zeros(4, 4);
    form.compute_exterior_facet_tensor(&cell, 0, DMatrixViewMut::from(&mut output))
        .unwrap();
    assert_matrix_eq!(output.row(0), DMatrix::<f64>::zeros(1, 4), comp = abs, tol = 1e-14);
    assert!((output.sum() - 0.5 * f64::sqrt(3.0)).abs() < 1e-14);
    assert!((output[(1, 1)] - 2.0 * output[(1, 2)]).abs() < 1e-14);
}

#[test]
fn flux_is_lumped_onto_facet_vertices() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let dof_map = TableDofMap::new(3, vec![vec![0, 1, 2]]).unwrap();
    let form = BoundaryFluxForm::<f64>::new(&dof_map, 3.0);

    // Facet 0 is the hypotenuse between vertices 1 and 2
    let mut output = DMatrix::zeros(3, 1);
    form.compute_exterior_facet_tensor(&cell, 0, DMatrixViewMut::from(&mut output))
        .unwrap();
    let half = 1.5 * f64::sqrt(2.0);
    assert_matrix_eq!(output, DMatrix::from_column_slice(3, 1, &[0.0, half, half]), comp = abs, tol = 1e-14);
    assert_eq!(form.rank(), 1);
    assert!(!form.has_cell_integral());
}

#[test]
fn boundary_forms_require_one_dof_per_vertex() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let dof_map = TableDofMap::discontinuous(1, 1);
    let robin = RobinForm::<f64>::new(&dof_map, 1.0);
    let flux = BoundaryFluxForm::<f64>::new(&dof_map, 1.0);

    let mut output = DMatrix::zeros(1, 1);
    assert!(robin
        .compute_exterior_facet_tensor(&cell, 0, DMatrixViewMut::from(&mut output))
        .is_err());
    assert!(flux
        .compute_exterior_facet_tensor(&cell, 0, DMatrixViewMut::from(&mut output))
        .is_err());
}

#[test]
fn invalid_local_facet_is_an_error() {
    let vertices = reference_triangle();
    let cell = Cell::new(0, CellType::Triangle, 2, &vertices);
    let dof_map = TableDofMap::new(3, vec![vec![0, 1, 2]]).unwrap();
    let form = RobinForm::<f64>::new(&dof_map, 1.0);
    let mut output = DMatrix::zeros(3, 3);
    assert!(form
        .compute_exterior_facet_tensor(&cell, 3, DMatrixViewMut::from(&mut output))
        .is_err());
}

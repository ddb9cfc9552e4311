use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{point, vector, Point3};
use sysasm_geometry::{CellGeometry, CellTopology, GeometryError, TetrahedronCell};

fn reference_tetrahedron() -> [Point3<f64>; 4] {
    [
        point![0.0, 0.0, 0.0],
        point![1.0, 0.0, 0.0],
        point![0.0, 1.0, 0.0],
        point![0.0, 0.0, 1.0],
    ]
}

#[test]
fn tetrahedron_topology() {
    let faces = TetrahedronCell.create_entities(2, &[0, 1, 2, 3]).unwrap();
    assert_eq!(faces, vec![vec![1, 2, 3], vec![0, 2, 3], vec![0, 1, 3], vec![0, 1, 2]]);
    assert_eq!(TetrahedronCell.num_entities(1).unwrap(), 6);
    assert_eq!(TetrahedronCell.num_facets(), 4);
    assert_eq!(TetrahedronCell.description(true), "tetrahedra");
}

#[test]
fn reference_tetrahedron_measures() {
    let vertices = reference_tetrahedron();
    assert_scalar_eq!(TetrahedronCell.volume(&vertices).unwrap(), 1.0 / 6.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(
        TetrahedronCell.circumradius(&vertices).unwrap(),
        0.5 * f64::sqrt(3.0),
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(
        TetrahedronCell.inradius(&vertices).unwrap(),
        1.0 / (3.0 + f64::sqrt(3.0)),
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(
        TetrahedronCell.facet_area(&vertices, 0).unwrap(),
        0.5 * f64::sqrt(3.0),
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(TetrahedronCell.facet_area(&vertices, 3).unwrap(), 0.5, comp = abs, tol = 1e-15);
}

#[test]
fn reference_tetrahedron_normals() {
    let vertices = reference_tetrahedron();
    let s = 1.0 / f64::sqrt(3.0);
    let expected = [
        vector![s, s, s],
        vector![-1.0, 0.0, 0.0],
        vector![0.0, -1.0, 0.0],
        vector![0.0, 0.0, -1.0],
    ];
    for (facet, n_expected) in expected.iter().enumerate() {
        let n = TetrahedronCell.normal(&vertices, facet).unwrap();
        assert_matrix_eq!(n, *n_expected, comp = abs, tol = 1e-14);
    }

    assert!(matches!(
        TetrahedronCell.cell_normal(&vertices, 3),
        Err(GeometryError::UndefinedCellNormal { .. })
    ));
}

#[test]
fn tetrahedron_squared_distance() {
    let vertices = reference_tetrahedron();
    let d = |p: Point3<f64>| TetrahedronCell.squared_distance(&vertices, &p).unwrap();
    assert_scalar_eq!(d(point![0.1, 0.1, 0.1]), 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(d(point![0.0, 0.0, 0.0]), 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(d(point![0.2, 0.2, -2.0]), 4.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(d(point![1.0, 1.0, 1.0]), 4.0 / 3.0, comp = abs, tol = 1e-12);
}

#[test]
fn flat_tetrahedron_is_degenerate() {
    let mut vertices = reference_tetrahedron();
    vertices[3] = point![0.3, 0.3, 0.0];
    assert!(matches!(
        TetrahedronCell.volume(&vertices),
        Err(GeometryError::DegenerateCell { .. })
    ));

    // Distances fall back to the faces
    let d = TetrahedronCell.squared_distance(&vertices, &point![0.3, 0.3, 1.0]).unwrap();
    assert_scalar_eq!(d, 1.0, comp = abs, tol = 1e-12);
}

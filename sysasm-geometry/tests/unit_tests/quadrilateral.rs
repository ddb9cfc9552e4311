use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{point, vector, Point3};
use sysasm_geometry::{CellGeometry, CellTopology, GeometryError, QuadrilateralCell};

fn unit_square() -> [Point3<f64>; 4] {
    [
        point![0.0, 0.0, 0.0],
        point![1.0, 0.0, 0.0],
        point![0.0, 1.0, 0.0],
        point![1.0, 1.0, 0.0],
    ]
}

#[test]
fn quadrilateral_topology() {
    let edges = QuadrilateralCell.create_entities(1, &[4, 5, 6, 7]).unwrap();
    assert_eq!(edges, vec![vec![4, 5], vec![4, 6], vec![5, 7], vec![6, 7]]);
    assert_eq!(QuadrilateralCell.num_facets(), 4);
}

#[test]
fn quadrilateral_area() {
    assert_scalar_eq!(QuadrilateralCell.volume(&unit_square()).unwrap(), 1.0, comp = float);

    let parallelogram = [
        point![0.0, 0.0, 0.0],
        point![2.0, 0.0, 0.0],
        point![1.0, 1.0, 0.0],
        point![3.0, 1.0, 0.0],
    ];
    assert_scalar_eq!(QuadrilateralCell.volume(&parallelogram).unwrap(), 2.0, comp = float);
}

#[test]
fn non_planar_quadrilateral_is_rejected() {
    let mut vertices = unit_square();
    vertices[3].z = 1.0;
    assert_eq!(
        QuadrilateralCell.volume(&vertices),
        Err(GeometryError::NonPlanar {
            cell_type: sysasm_geometry::CellType::Quadrilateral
        })
    );
}

#[test]
fn quadrilateral_normals_and_facet_areas() {
    let vertices = unit_square();
    let expected = [
        vector![0.0, -1.0, 0.0],
        vector![-1.0, 0.0, 0.0],
        vector![1.0, 0.0, 0.0],
        vector![0.0, 1.0, 0.0],
    ];
    for (facet, n_expected) in expected.iter().enumerate() {
        let n = QuadrilateralCell.normal(&vertices, facet).unwrap();
        assert_matrix_eq!(n, *n_expected, comp = abs, tol = 1e-14);
        let area = QuadrilateralCell.facet_area(&vertices, facet).unwrap();
        assert_scalar_eq!(area, 1.0, comp = float);
    }

    let n = QuadrilateralCell.cell_normal(&vertices, 3).unwrap();
    assert_matrix_eq!(n, vector![0.0, 0.0, 1.0], comp = abs, tol = 1e-14);
}

#[test]
fn quadrilateral_squared_distance() {
    let vertices = unit_square();
    let d = |p: Point3<f64>| QuadrilateralCell.squared_distance(&vertices, &p).unwrap();
    assert_scalar_eq!(d(point![0.75, 0.25, 0.0]), 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(d(point![0.5, 0.5, 2.0]), 4.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(d(point![2.0, 0.5, 0.0]), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn quadrilateral_radii_are_unsupported() {
    let vertices = unit_square();
    assert!(matches!(
        QuadrilateralCell.circumradius(&vertices),
        Err(GeometryError::Unsupported { .. })
    ));
    assert!(matches!(
        QuadrilateralCell.inradius(&vertices),
        Err(GeometryError::Unsupported { .. })
    ));
    assert_scalar_eq!(
        QuadrilateralCell.diameter(&vertices).unwrap(),
        f64::sqrt(2.0),
        comp = float
    );
}

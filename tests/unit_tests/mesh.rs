use crate::unit_tests::two_cell_interval;
use matrixcompare::assert_scalar_eq;
use nalgebra::Point3;
use sysasm::error::AssemblyError;
use sysasm::geometry::CellType;
use sysasm::mesh::procedural::{
    create_unit_box_uniform_tet_mesh, create_unit_interval, create_unit_square_uniform_quad_mesh,
    create_unit_square_uniform_tri_mesh,
};
use sysasm::mesh::{AssemblyMesh, FacetAdjacency, Mesh};

mod procedural;

fn is_invalid_mesh(err: &eyre::Report) -> bool {
    matches!(err.downcast_ref::<AssemblyError>(), Some(AssemblyError::InvalidMesh(_)))
}

#[test]
fn facet_counts_of_procedural_meshes() {
    for n in 1..=4 {
        let mesh = create_unit_square_uniform_tri_mesh::<f64>(n).unwrap();
        assert_eq!(mesh.exterior_facets().len(), 4 * n);
        assert_eq!(mesh.interior_facets().len(), 3 * n * n - 2 * n);
    }

    let quads = create_unit_square_uniform_quad_mesh::<f64>(2).unwrap();
    assert_eq!(quads.num_facets(), 12);
    assert_eq!(quads.exterior_facets().len(), 8);

    let interval = create_unit_interval::<f64>(3).unwrap();
    assert_eq!(interval.num_facets(), 4);
    assert_eq!(interval.exterior_facets(), vec![0, 3]);

    let tets = create_unit_box_uniform_tet_mesh::<f64>(1).unwrap();
    assert_eq!(tets.num_facets(), 18);
    assert_eq!(tets.exterior_facets().len(), 12);
}

#[test]
fn facet_adjacency_refers_back_to_cell_facets() {
    let meshes = [
        create_unit_square_uniform_tri_mesh::<f64>(3).unwrap(),
        create_unit_square_uniform_quad_mesh::<f64>(3).unwrap(),
        create_unit_box_uniform_tet_mesh::<f64>(2).unwrap(),
    ];
    for mesh in &meshes {
        for facet in 0..mesh.num_facets() {
            match mesh.facet_adjacency(facet) {
                FacetAdjacency::Exterior { cell, local_facet } => {
                    assert_eq!(mesh.cell_facets(cell)[local_facet], facet);
                }
                FacetAdjacency::Interior { cells, local_facets } => {
                    assert!(cells[0] < cells[1]);
                    for (cell, local_facet) in cells.into_iter().zip(local_facets) {
                        assert_eq!(mesh.cell_facets(cell)[local_facet], facet);
                    }
                }
            }
        }
    }
}

#[test]
fn interval_facets_are_vertices() {
    let mesh = two_cell_interval();
    assert_eq!(mesh.facet_vertices(1), &[1]);
    assert_eq!(
        mesh.facet_adjacency(1),
        FacetAdjacency::Interior {
            cells: [0, 1],
            local_facets: [1, 0]
        }
    );
    assert_eq!(mesh.facet_adjacency(2), FacetAdjacency::Exterior { cell: 1, local_facet: 1 });
}

#[test]
fn find_boundary_vertices_and_cells() {
    let tris = create_unit_square_uniform_tri_mesh::<f64>(2).unwrap();
    assert_eq!(tris.find_boundary_vertices(), vec![0, 1, 2, 3, 5, 6, 7, 8]);
    // The upper triangle of the lower right square and the lower triangle of the upper left
    // square only touch the boundary in a vertex
    assert_eq!(tris.find_boundary_cells(), vec![0, 1, 2, 5, 6, 7]);

    let quads = create_unit_square_uniform_quad_mesh::<f64>(3).unwrap();
    assert_eq!(quads.find_boundary_cells(), vec![0, 1, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn cell_size_statistics() {
    let mesh = create_unit_square_uniform_tri_mesh::<f64>(2).unwrap();
    let h = 0.5 * f64::sqrt(2.0);
    let r = 0.5 / (2.0 + f64::sqrt(2.0));
    assert_scalar_eq!(mesh.hmin().unwrap(), h, comp = abs, tol = 1e-14);
    assert_scalar_eq!(mesh.hmax().unwrap(), h, comp = abs, tol = 1e-14);
    assert_scalar_eq!(mesh.rmin().unwrap(), r, comp = abs, tol = 1e-14);
    assert_scalar_eq!(mesh.rmax().unwrap(), r, comp = abs, tol = 1e-14);

    let interval = create_unit_interval::<f64>(4).unwrap();
    assert_scalar_eq!(interval.hmax().unwrap(), 0.25, comp = abs, tol = 1e-15);
    assert_scalar_eq!(interval.rmin().unwrap(), 0.125, comp = abs, tol = 1e-15);
}

#[test]
fn cell_size_statistics_of_empty_mesh_are_zero() {
    let mesh = create_unit_square_uniform_tri_mesh::<f64>(0).unwrap();
    assert_eq!(mesh.num_cells(), 0);
    assert_eq!(mesh.hmin().unwrap(), 0.0);
    assert_eq!(mesh.rmax().unwrap(), 0.0);
}

#[test]
fn inradius_of_quadrilateral_mesh_is_unsupported() {
    let mesh = create_unit_square_uniform_quad_mesh::<f64>(1).unwrap();
    assert_scalar_eq!(mesh.hmin().unwrap(), f64::sqrt(2.0), comp = abs, tol = 1e-14);
    let err = mesh.rmin().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::Geometry { cell: 0, .. })
    ));
}

#[test]
fn markers_are_computed_from_midpoints() {
    let mesh = create_unit_interval::<f64>(4).unwrap();
    assert_eq!(mesh.cell_midpoint(1), Point3::new(0.375, 0.0, 0.0));
    assert_eq!(mesh.cell_markers(|x| usize::from(x.x > 0.5)), vec![0, 0, 1, 1]);

    let facet_markers = mesh.facet_markers(|x| usize::from(x.x > 0.9));
    assert_eq!(facet_markers, vec![0, 0, 0, 0, 1]);
    assert_eq!(mesh.facet_vertices(4), &[4]);

    let tris = create_unit_square_uniform_tri_mesh::<f64>(1).unwrap();
    let diagonal = tris.interior_facets();
    assert_eq!(diagonal.len(), 1);
    assert_eq!(tris.facet_midpoint(diagonal[0]), Point3::new(0.5, 0.5, 0.0));
}

#[test]
fn cell_views_report_volume() {
    let mesh = create_unit_box_uniform_tet_mesh::<f64>(2).unwrap();
    let mut buffer = Vec::new();
    let total: f64 = (0..mesh.num_cells())
        .map(|cell| mesh.cell(cell, &mut buffer).volume().unwrap())
        .sum();
    assert_scalar_eq!(total, 1.0, comp = abs, tol = 1e-12);

    let cell = mesh.cell(5, &mut buffer);
    assert_eq!(cell.index(), 5);
    assert_eq!(cell.cell_type(), CellType::Tetrahedron);
    assert_eq!(cell.vertices().len(), 4);
}

#[test]
fn non_manifold_facet_is_rejected() {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    let cells = vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 1, 4]];
    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, 2, vertices, cells).unwrap_err();
    assert!(is_invalid_mesh(&err));
}

#[test]
fn invalid_connectivity_is_rejected() {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];

    let out_of_range = vec![vec![0, 1, 5]];
    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, 2, vertices.clone(), out_of_range)
        .unwrap_err();
    assert!(is_invalid_mesh(&err));

    let too_few_vertices = vec![vec![0, 1]];
    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, 2, vertices.clone(), too_few_vertices)
        .unwrap_err();
    assert!(is_invalid_mesh(&err));

    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, 1, vertices, vec![vec![0, 1, 2]])
        .unwrap_err();
    assert!(is_invalid_mesh(&err));
}

#[test]
fn embedded_interval_mesh() {
    // A polyline in the plane, which is a mesh of intervals with geometric dimension 2
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(3.0, 4.0, 0.0),
        Point3::new(3.0, 5.0, 0.0),
    ];
    let mesh = Mesh::from_vertices_and_connectivity(CellType::Interval, 2, vertices, vec![vec![0, 1], vec![1, 2]])
        .unwrap();
    assert_eq!(mesh.geometric_dim(), 2);
    assert_eq!(mesh.find_boundary_vertices(), vec![0, 2]);
    assert_scalar_eq!(mesh.hmax().unwrap(), 5.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(mesh.hmin().unwrap(), 1.0, comp = abs, tol = 1e-14);
}

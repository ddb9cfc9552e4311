use matrixcompare::{assert_scalar_eq, prop_assert_scalar_eq};
use nalgebra::Point3;
use proptest::prelude::*;
use sysasm::geometry::CellType;
use sysasm::mesh::procedural::{
    create_unit_box_uniform_tet_mesh, create_unit_interval, create_unit_square_uniform_quad_mesh,
    create_unit_square_uniform_tri_mesh,
};
use sysasm::mesh::{AssemblyMesh, Mesh};

fn total_volume(mesh: &Mesh<f64>) -> f64 {
    let mut buffer = Vec::new();
    (0..mesh.num_cells())
        .map(|cell| mesh.cell(cell, &mut buffer).volume().unwrap())
        .sum()
}

#[test]
fn unit_interval_basics() {
    let mesh = create_unit_interval::<f64>(4).unwrap();
    assert_eq!(mesh.cell_type(), CellType::Interval);
    assert_eq!(mesh.geometric_dim(), 1);
    assert_eq!(mesh.num_vertices(), 5);
    assert_eq!(mesh.cells(), &[vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 4]]);
    assert_eq!(mesh.vertices()[3], Point3::new(0.75, 0.0, 0.0));
}

#[test]
fn unit_square_quad_mesh_uses_tensor_product_ordering() {
    let mesh = create_unit_square_uniform_quad_mesh::<f64>(2).unwrap();
    assert_eq!(mesh.num_vertices(), 9);
    assert_eq!(mesh.num_cells(), 4);
    assert_eq!(mesh.cells()[3], vec![4, 5, 7, 8]);
    assert_eq!(mesh.vertices()[5], Point3::new(1.0, 0.5, 0.0));
    assert_scalar_eq!(total_volume(&mesh), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn unit_square_tri_mesh_splits_along_diagonal() {
    let mesh = create_unit_square_uniform_tri_mesh::<f64>(1).unwrap();
    assert_eq!(mesh.cells(), &[vec![0, 1, 3], vec![0, 3, 2]]);
    assert_eq!(mesh.interior_facets().len(), 1);
}

#[test]
fn empty_meshes() {
    assert_eq!(create_unit_interval::<f64>(0).unwrap().num_vertices(), 0);
    assert_eq!(create_unit_square_uniform_quad_mesh::<f64>(0).unwrap().num_cells(), 0);
    assert_eq!(create_unit_square_uniform_tri_mesh::<f64>(0).unwrap().num_facets(), 0);
    assert_eq!(create_unit_box_uniform_tet_mesh::<f64>(0).unwrap().num_vertices(), 0);
}

#[test]
fn unit_box_tet_mesh_shares_the_main_diagonal() {
    let mesh = create_unit_box_uniform_tet_mesh::<f64>(1).unwrap();
    assert_eq!(mesh.num_cells(), 6);
    for cell in mesh.cells() {
        assert_eq!(cell.first(), Some(&0));
        assert_eq!(cell.last(), Some(&7));
    }
}

proptest! {
    #[test]
    fn procedural_meshes_cover_the_unit_domain(n in 1usize..5) {
        let tris = create_unit_square_uniform_tri_mesh::<f64>(n).unwrap();
        prop_assert_eq!(tris.num_cells(), 2 * n * n);
        prop_assert_scalar_eq!(total_volume(&tris), 1.0, comp = abs, tol = 1e-12);

        let tets = create_unit_box_uniform_tet_mesh::<f64>(n).unwrap();
        prop_assert_eq!(tets.num_cells(), 6 * n * n * n);
        prop_assert_eq!(tets.num_vertices(), (n + 1) * (n + 1) * (n + 1));
        prop_assert_scalar_eq!(total_volume(&tets), 1.0, comp = abs, tol = 1e-12);

        // Every boundary face of the cube is split into two triangles per square
        prop_assert_eq!(tets.exterior_facets().len(), 6 * 2 * n * n);
    }
}

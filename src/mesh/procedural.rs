//! Basic procedural mesh generation routines.
//!
//! All meshes cover the unit interval, square or cube with `cells_per_dim` subdivisions along
//! each axis. Vertices are numbered lexicographically with the x index running fastest.
use crate::geometry::CellType;
use crate::mesh::Mesh;
use crate::Real;
use nalgebra::{convert, Point3};

fn coordinate<T: Real>(index: usize, cells_per_dim: usize) -> T {
    convert::<f64, T>(index as f64 / cells_per_dim as f64)
}

pub fn create_unit_interval<T: Real>(cells_per_dim: usize) -> eyre::Result<Mesh<T>> {
    let n = cells_per_dim;
    let vertices = if n == 0 {
        Vec::new()
    } else {
        (0..=n)
            .map(|i| Point3::new(coordinate(i, n), T::zero(), T::zero()))
            .collect()
    };
    let cells = (0..n).map(|i| vec![i, i + 1]).collect();
    Mesh::from_vertices_and_connectivity(CellType::Interval, 1, vertices, cells)
}

fn unit_square_vertices<T: Real>(n: usize) -> Vec<Point3<T>> {
    if n == 0 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(coordinate(i, n), coordinate(j, n), T::zero()));
        }
    }
    vertices
}

/// Creates a uniform quadrilateral mesh of the unit square.
///
/// Each quadrilateral uses the tensor-product vertex ordering
/// `(x0, y0), (x1, y0), (x0, y1), (x1, y1)`.
pub fn create_unit_square_uniform_quad_mesh<T: Real>(cells_per_dim: usize) -> eyre::Result<Mesh<T>> {
    let n = cells_per_dim;
    let vertex = |i: usize, j: usize| (n + 1) * j + i;
    let mut cells = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            cells.push(vec![vertex(i, j), vertex(i + 1, j), vertex(i, j + 1), vertex(i + 1, j + 1)]);
        }
    }
    Mesh::from_vertices_and_connectivity(CellType::Quadrilateral, 2, unit_square_vertices(n), cells)
}

/// Creates a uniform triangle mesh of the unit square.
///
/// Every square is split along its diagonal from `(x0, y0)` to `(x1, y1)`.
pub fn create_unit_square_uniform_tri_mesh<T: Real>(cells_per_dim: usize) -> eyre::Result<Mesh<T>> {
    let n = cells_per_dim;
    let vertex = |i: usize, j: usize| (n + 1) * j + i;
    let mut cells = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let (v00, v10, v01, v11) = (vertex(i, j), vertex(i + 1, j), vertex(i, j + 1), vertex(i + 1, j + 1));
            cells.push(vec![v00, v10, v11]);
            cells.push(vec![v00, v11, v01]);
        }
    }
    Mesh::from_vertices_and_connectivity(CellType::Triangle, 2, unit_square_vertices(n), cells)
}

/// Creates a uniform tetrahedral mesh of the unit cube.
///
/// Every cube is split into six tetrahedra sharing the diagonal from `(x0, y0, z0)` to
/// `(x1, y1, z1)`, which makes the subdivision conforming across neighboring cubes.
pub fn create_unit_box_uniform_tet_mesh<T: Real>(cells_per_dim: usize) -> eyre::Result<Mesh<T>> {
    let n = cells_per_dim;
    let vertex = |i: usize, j: usize, k: usize| (n + 1) * (n + 1) * k + (n + 1) * j + i;

    let mut vertices = Vec::new();
    if n > 0 {
        for k in 0..=n {
            for j in 0..=n {
                for i in 0..=n {
                    vertices.push(Point3::new(coordinate(i, n), coordinate(j, n), coordinate(k, n)));
                }
            }
        }
    }

    // Each tetrahedron follows a monotone path along the axes from the first to the last corner
    const AXIS_ORDERS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    let mut cells = Vec::with_capacity(6 * n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                for axes in &AXIS_ORDERS {
                    let mut offset = [0, 0, 0];
                    let mut cell = vec![vertex(i, j, k)];
                    for &axis in axes {
                        offset[axis] = 1;
                        cell.push(vertex(i + offset[0], j + offset[1], k + offset[2]));
                    }
                    cells.push(cell);
                }
            }
        }
    }
    Mesh::from_vertices_and_connectivity(CellType::Tetrahedron, 3, vertices, cells)
}

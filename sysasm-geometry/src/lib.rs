//! Geometric kernels for the cell shapes supported by `sysasm`.
//!
//! Every cell shape implements two capabilities: [`CellTopology`], which describes the local
//! numbering of sub-entities and is independent of coordinates, and [`CellGeometry`], which
//! computes measures, normals and distances from the cell's vertex coordinates.
//!
//! Vertex coordinates are always given as [`Point3`], with unused trailing components set to
//! zero. The geometric dimension is only needed where the result depends on the ambient space,
//! see [`CellGeometry::cell_normal`].
use nalgebra::{distance, Point3, Vector3};
use numeric_literals::replace_float_literals;
use sysasm_traits::Real;

mod cell_type;
mod primitives;

pub use cell_type::*;
pub use primitives::*;

pub use sysasm_traits;

/// Errors reported by the geometric kernels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("illegal entity dimension {dim} for {cell_type}")]
    InvalidDimension { cell_type: CellType, dim: usize },
    #[error("{cell_type} expects {expected} vertices, got {actual}")]
    InvalidVertexCount {
        cell_type: CellType,
        expected: usize,
        actual: usize,
    },
    #[error("local facet {facet} out of bounds for {cell_type} with {num_facets} facets")]
    InvalidFacet {
        cell_type: CellType,
        facet: usize,
        num_facets: usize,
    },
    #[error("degenerate {cell_type} (measure {measure:e})")]
    DegenerateCell { cell_type: CellType, measure: f64 },
    #[error("cell normal of {cell_type} is undefined in geometric dimension {geometric_dim}")]
    UndefinedCellNormal { cell_type: CellType, geometric_dim: usize },
    #[error("{cell_type} is not planar")]
    NonPlanar { cell_type: CellType },
    #[error("{operation} is not supported for {cell_type}")]
    Unsupported {
        cell_type: CellType,
        operation: &'static str,
    },
}

/// Coordinate-free description of a cell shape.
///
/// The local numbering of sub-entities is table driven. Facet `i` of a simplex is the facet
/// opposite to vertex `i`, which is the convention dof maps are expected to follow.
pub trait CellTopology {
    fn cell_type(&self) -> CellType;

    /// Topological dimension of the cell.
    fn dim(&self) -> usize;

    /// Local vertex indices of every sub-entity of dimension `dim`, in canonical order.
    fn local_entities(&self, dim: usize) -> Result<&'static [&'static [usize]], GeometryError>;

    fn description(&self, plural: bool) -> &'static str;

    fn num_entities(&self, dim: usize) -> Result<usize, GeometryError> {
        Ok(self.local_entities(dim)?.len())
    }

    /// Number of vertices of a single sub-entity of dimension `dim`.
    fn num_vertices(&self, dim: usize) -> Result<usize, GeometryError> {
        self.local_entities(dim)?
            .first()
            .map(|entity| entity.len())
            .ok_or(GeometryError::InvalidDimension {
                cell_type: self.cell_type(),
                dim,
            })
    }

    fn num_facets(&self) -> usize {
        match self.dim() {
            0 => 0,
            d => self.num_entities(d - 1).unwrap_or(0),
        }
    }

    /// Creates the sub-entities of dimension `dim` of a cell with the given vertices.
    ///
    /// The vertices may be arbitrary labels, typically global vertex indices.
    fn create_entities(&self, dim: usize, vertices: &[usize]) -> Result<Vec<Vec<usize>>, GeometryError> {
        let expected = self.num_vertices(self.dim())?;
        if vertices.len() != expected {
            return Err(GeometryError::InvalidVertexCount {
                cell_type: self.cell_type(),
                expected,
                actual: vertices.len(),
            });
        }
        Ok(self
            .local_entities(dim)?
            .iter()
            .map(|entity| entity.iter().map(|&v| vertices[v]).collect())
            .collect())
    }
}

/// Geometric primitives of a cell shape, computed from vertex coordinates.
pub trait CellGeometry<T: Real>: CellTopology {
    /// Generalized volume (length, area or volume) of the cell.
    fn volume(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError>;

    fn circumradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError>;

    fn inradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError>;

    /// Squared distance from `point` to the nearest point of the cell.
    ///
    /// Degenerate cells are not an error here: the distance is then computed from the
    /// lower-dimensional boundary entities alone.
    fn squared_distance(&self, vertices: &[Point3<T>], point: &Point3<T>) -> Result<T, GeometryError>;

    /// Outward unit normal of the given local facet.
    fn normal(&self, vertices: &[Point3<T>], facet: usize) -> Result<Vector3<T>, GeometryError>;

    /// Unit normal of a cell viewed as a manifold embedded in a space of one higher dimension.
    fn cell_normal(&self, vertices: &[Point3<T>], geometric_dim: usize) -> Result<Vector3<T>, GeometryError>;

    /// Measure of the given local facet.
    fn facet_area(&self, vertices: &[Point3<T>], facet: usize) -> Result<T, GeometryError>;

    /// Largest distance between two vertices of the cell.
    fn diameter(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        Ok(max_vertex_distance(vertices))
    }
}

pub(crate) fn check_vertex_count<C, T>(cell: &C, vertices: &[Point3<T>]) -> Result<(), GeometryError>
where
    C: ?Sized + CellTopology,
    T: Real,
{
    let expected = cell.num_vertices(cell.dim())?;
    if vertices.len() == expected {
        Ok(())
    } else {
        Err(GeometryError::InvalidVertexCount {
            cell_type: cell.cell_type(),
            expected,
            actual: vertices.len(),
        })
    }
}

pub(crate) fn check_facet_index<C>(cell: &C, facet: usize) -> Result<(), GeometryError>
where
    C: ?Sized + CellTopology,
{
    let num_facets = cell.num_facets();
    if facet < num_facets {
        Ok(())
    } else {
        Err(GeometryError::InvalidFacet {
            cell_type: cell.cell_type(),
            facet,
            num_facets,
        })
    }
}

/// Returns the coordinates of the vertices of a sub-entity.
pub(crate) fn entity_vertices<T: Real>(vertices: &[Point3<T>], local_indices: &[usize]) -> Vec<Point3<T>> {
    local_indices.iter().map(|&i| vertices[i]).collect()
}

pub(crate) fn max_vertex_distance<T: Real>(vertices: &[Point3<T>]) -> T {
    let mut max = T::zero();
    for (i, a) in vertices.iter().enumerate() {
        for b in &vertices[i + 1..] {
            max = max.max(distance(a, b));
        }
    }
    max
}

/// Reports a degenerate cell if `measure` is negligible relative to `scale^dim`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn ensure_positive_measure<T: Real>(
    cell_type: CellType,
    measure: T,
    scale: T,
    dim: usize,
) -> Result<T, GeometryError> {
    let tolerance = 16.0 * T::default_epsilon() * scale.powi(dim as i32);
    if measure > tolerance && scale > 0.0 {
        Ok(measure)
    } else {
        Err(GeometryError::DegenerateCell {
            cell_type,
            measure: measure.to_subset().unwrap_or(f64::NAN),
        })
    }
}

/// Normalizes `v`, reporting a degenerate cell if `v` is (numerically) zero relative to `scale`.
pub(crate) fn normalize_or_degenerate<T: Real>(
    cell_type: CellType,
    v: Vector3<T>,
    scale: T,
) -> Result<Vector3<T>, GeometryError> {
    let norm = ensure_positive_measure(cell_type, v.norm(), scale, 1)?;
    Ok(v / norm)
}

//! Error types reported by assembly.
use crate::geometry::GeometryError;

/// Errors that abort an assembly call.
///
/// Assembly routines return [`eyre::Result`], so these errors reach the caller wrapped in an
/// [`eyre::Report`]. Use [`eyre::Report::downcast_ref`] to inspect the kind of failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    /// The bilinear and linear form cannot be assembled together.
    #[error("incompatible forms: {0}")]
    IncompatibleForms(String),
    /// A cell or facet has (numerically) zero measure.
    #[error("degenerate geometry in cell {cell}")]
    DegenerateGeometry {
        cell: usize,
        #[source]
        source: GeometryError,
    },
    /// Any other failure of a geometric query.
    #[error("geometric query failed for cell {cell}")]
    Geometry {
        cell: usize,
        #[source]
        source: GeometryError,
    },
    #[error("boundary condition on dof {dof} is out of range for a space of dimension {dimension}")]
    InvalidBoundaryDof { dof: usize, dimension: usize },
    #[error("{what} has dimensions {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("entry ({row}, {col}) is not part of the sparsity pattern")]
    MissingEntry { row: usize, col: usize },
    #[error("index ({row}, {col}) is out of bounds for a {nrows}x{ncols} global tensor")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

impl AssemblyError {
    /// Attributes a geometric failure to the given cell.
    pub fn geometry(cell: usize, source: GeometryError) -> Self {
        match source {
            GeometryError::DegenerateCell { .. } | GeometryError::NonPlanar { .. } => {
                Self::DegenerateGeometry { cell, source }
            }
            _ => Self::Geometry { cell, source },
        }
    }
}

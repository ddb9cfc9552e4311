use crate::{
    CellGeometry, CellTopology, GeometryError, IntervalCell, QuadrilateralCell, TetrahedronCell, TriangleCell,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use sysasm_traits::Real;

/// The cell shapes supported by the geometric kernels.
///
/// `CellType` dispatches every [`CellTopology`] and [`CellGeometry`] query to the kernel of
/// the corresponding shape, so a mesh only needs to store its cell type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellType {
    Interval,
    Triangle,
    Quadrilateral,
    Tetrahedron,
}

impl CellType {
    pub fn is_simplex(&self) -> bool {
        !matches!(self, CellType::Quadrilateral)
    }

    /// The cell type of the facets of this cell type, if facets are cells themselves.
    pub fn facet_type(&self) -> Option<CellType> {
        match self {
            CellType::Interval => None,
            CellType::Triangle | CellType::Quadrilateral => Some(CellType::Interval),
            CellType::Tetrahedron => Some(CellType::Triangle),
        }
    }

    fn topology(&self) -> &'static dyn CellTopology {
        match self {
            CellType::Interval => &IntervalCell,
            CellType::Triangle => &TriangleCell,
            CellType::Quadrilateral => &QuadrilateralCell,
            CellType::Tetrahedron => &TetrahedronCell,
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(false))
    }
}

impl CellTopology for CellType {
    fn cell_type(&self) -> CellType {
        *self
    }

    fn dim(&self) -> usize {
        self.topology().dim()
    }

    fn local_entities(&self, dim: usize) -> Result<&'static [&'static [usize]], GeometryError> {
        self.topology().local_entities(dim)
    }

    fn description(&self, plural: bool) -> &'static str {
        self.topology().description(plural)
    }
}

macro_rules! dispatch_geometry {
    ($cell_type:expr, $method:ident ( $($arg:expr),* )) => {
        match $cell_type {
            CellType::Interval => IntervalCell.$method($($arg),*),
            CellType::Triangle => TriangleCell.$method($($arg),*),
            CellType::Quadrilateral => QuadrilateralCell.$method($($arg),*),
            CellType::Tetrahedron => TetrahedronCell.$method($($arg),*),
        }
    };
}

impl<T: Real> CellGeometry<T> for CellType {
    fn volume(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        dispatch_geometry!(self, volume(vertices))
    }

    fn circumradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        dispatch_geometry!(self, circumradius(vertices))
    }

    fn inradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        dispatch_geometry!(self, inradius(vertices))
    }

    fn squared_distance(&self, vertices: &[Point3<T>], point: &Point3<T>) -> Result<T, GeometryError> {
        dispatch_geometry!(self, squared_distance(vertices, point))
    }

    fn normal(&self, vertices: &[Point3<T>], facet: usize) -> Result<Vector3<T>, GeometryError> {
        dispatch_geometry!(self, normal(vertices, facet))
    }

    fn cell_normal(&self, vertices: &[Point3<T>], geometric_dim: usize) -> Result<Vector3<T>, GeometryError> {
        dispatch_geometry!(self, cell_normal(vertices, geometric_dim))
    }

    fn facet_area(&self, vertices: &[Point3<T>], facet: usize) -> Result<T, GeometryError> {
        dispatch_geometry!(self, facet_area(vertices, facet))
    }
}

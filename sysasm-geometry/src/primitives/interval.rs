use crate::{
    check_facet_index, check_vertex_count, ensure_positive_measure, normalize_or_degenerate, CellGeometry,
    CellTopology, CellType, GeometryError,
};
use nalgebra::{distance, Point3, Vector3};
use numeric_literals::replace_float_literals;
use sysasm_traits::Real;

/// Geometric kernel for line segments.
///
/// Facet `i` is the vertex `i`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct IntervalCell;

const VERTICES: &[&[usize]] = &[&[0], &[1]];
const CELL: &[&[usize]] = &[&[0, 1]];

impl IntervalCell {
    /// Squared distance from `point` to the segment `[a, b]`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn squared_distance_to_segment<T: Real>(point: &Point3<T>, a: &Point3<T>, b: &Point3<T>) -> T {
        let v0 = point - a;
        let v1 = point - b;
        let v01 = b - a;

        // Closest point is a
        let a0 = v0.dot(&v01);
        if a0 < 0.0 {
            return v0.norm_squared();
        }

        // Closest point is b
        let a1 = -v1.dot(&v01);
        if a1 < 0.0 {
            return v1.norm_squared();
        }

        // The closest point is interior, remove the projection onto the segment
        let length_squared = v01.norm_squared();
        if length_squared == 0.0 {
            return v0.norm_squared();
        }
        T::max(v0.norm_squared() - a0 * a0 / length_squared, 0.0)
    }
}

impl CellTopology for IntervalCell {
    fn cell_type(&self) -> CellType {
        CellType::Interval
    }

    fn dim(&self) -> usize {
        1
    }

    fn local_entities(&self, dim: usize) -> Result<&'static [&'static [usize]], GeometryError> {
        match dim {
            0 => Ok(VERTICES),
            1 => Ok(CELL),
            _ => Err(GeometryError::InvalidDimension {
                cell_type: self.cell_type(),
                dim,
            }),
        }
    }

    fn description(&self, plural: bool) -> &'static str {
        if plural {
            "intervals"
        } else {
            "interval"
        }
    }
}

impl<T: Real> CellGeometry<T> for IntervalCell {
    fn volume(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        let length = distance(&vertices[0], &vertices[1]);
        ensure_positive_measure(self.cell_type(), length, length, 1)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn circumradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        Ok(self.volume(vertices)? / 2.0)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn inradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        Ok(self.volume(vertices)? / 2.0)
    }

    fn squared_distance(&self, vertices: &[Point3<T>], point: &Point3<T>) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        Ok(Self::squared_distance_to_segment(point, &vertices[0], &vertices[1]))
    }

    fn normal(&self, vertices: &[Point3<T>], facet: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        let (p0, p1) = (&vertices[0], &vertices[1]);
        let n = if facet == 0 { p0 - p1 } else { p1 - p0 };
        normalize_or_degenerate(self.cell_type(), n, distance(p0, p1))
    }

    fn cell_normal(&self, vertices: &[Point3<T>], geometric_dim: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        if geometric_dim != 2 {
            return Err(GeometryError::UndefinedCellNormal {
                cell_type: self.cell_type(),
                geometric_dim,
            });
        }

        // Rotate the tangent counterclockwise
        let t = vertices[1] - vertices[0];
        let n = Vector3::new(-t.y, t.x, T::zero());
        normalize_or_degenerate(self.cell_type(), n, t.norm())
    }

    fn facet_area(&self, vertices: &[Point3<T>], facet: usize) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        // Facets are points, measured by counting
        Ok(T::one())
    }
}

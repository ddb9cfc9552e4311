use crate::{
    check_facet_index, check_vertex_count, ensure_positive_measure, max_vertex_distance, normalize_or_degenerate,
    CellGeometry, CellTopology, CellType, GeometryError, IntervalCell,
};
use nalgebra::{distance, Point3, Vector3};
use numeric_literals::replace_float_literals;
use sysasm_traits::Real;

/// Geometric kernel for triangles, either in the plane or embedded in 3D.
///
/// Edge `i` is the edge opposite to vertex `i`, i.e. the edges are `{1, 2}`, `{0, 2}` and `{0, 1}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TriangleCell;

const VERTICES: &[&[usize]] = &[&[0], &[1], &[2]];
const EDGES: &[&[usize]] = &[&[1, 2], &[0, 2], &[0, 1]];
const CELL: &[&[usize]] = &[&[0, 1, 2]];

impl TriangleCell {
    /// Area of the triangle `abc`, without any degeneracy check.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn unsigned_area<T: Real>(a: &Point3<T>, b: &Point3<T>, c: &Point3<T>) -> T {
        0.5 * (b - a).cross(&(c - a)).norm()
    }

    /// Squared distance from `point` to the triangle `abc`.
    ///
    /// The point is projected onto the plane of the triangle. If the projection lies inside the
    /// triangle, the distance is the distance to the plane. Otherwise the nearest point lies on
    /// the boundary, and the minimum over the three edges is taken. Degenerate triangles only
    /// consider the edges.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn squared_distance_to_triangle<T: Real>(point: &Point3<T>, a: &Point3<T>, b: &Point3<T>, c: &Point3<T>) -> T {
        let edge_distance = || {
            let d_bc = IntervalCell::squared_distance_to_segment(point, b, c);
            let d_ac = IntervalCell::squared_distance_to_segment(point, a, c);
            let d_ab = IntervalCell::squared_distance_to_segment(point, a, b);
            d_bc.min(d_ac).min(d_ab)
        };

        let ab = b - a;
        let ac = c - a;
        let n = ab.cross(&ac);
        let n_norm_squared = n.norm_squared();
        let scale = max_vertex_distance(&[*a, *b, *c]);
        if n_norm_squared.sqrt() <= 16.0 * T::default_epsilon() * scale * scale {
            return edge_distance();
        }

        let ap = point - a;
        let offset = n.dot(&ap);
        let projected = ap - n * (offset / n_norm_squared);

        // Barycentric coordinates of the projected point
        let lambda_1 = n.dot(&projected.cross(&ac)) / n_norm_squared;
        let lambda_2 = n.dot(&ab.cross(&projected)) / n_norm_squared;
        let lambda_0 = 1.0 - lambda_1 - lambda_2;

        let inside = [lambda_0, lambda_1, lambda_2]
            .iter()
            .all(|&lambda| lambda >= 0.0 && lambda <= 1.0);
        if inside {
            offset * offset / n_norm_squared
        } else {
            edge_distance()
        }
    }

    fn edge_lengths<T: Real>(vertices: &[Point3<T>]) -> [T; 3] {
        let length = |edge: &[usize]| distance(&vertices[edge[0]], &vertices[edge[1]]);
        [length(EDGES[0]), length(EDGES[1]), length(EDGES[2])]
    }
}

impl CellTopology for TriangleCell {
    fn cell_type(&self) -> CellType {
        CellType::Triangle
    }

    fn dim(&self) -> usize {
        2
    }

    fn local_entities(&self, dim: usize) -> Result<&'static [&'static [usize]], GeometryError> {
        match dim {
            0 => Ok(VERTICES),
            1 => Ok(EDGES),
            2 => Ok(CELL),
            _ => Err(GeometryError::InvalidDimension {
                cell_type: self.cell_type(),
                dim,
            }),
        }
    }

    fn description(&self, plural: bool) -> &'static str {
        if plural {
            "triangles"
        } else {
            "triangle"
        }
    }
}

impl<T: Real> CellGeometry<T> for TriangleCell {
    fn volume(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        let area = Self::unsigned_area(&vertices[0], &vertices[1], &vertices[2]);
        ensure_positive_measure(self.cell_type(), area, max_vertex_distance(vertices), 2)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn circumradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        let area = self.volume(vertices)?;
        let [a, b, c] = Self::edge_lengths(vertices);
        Ok(a * b * c / (4.0 * area))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn inradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        let area = self.volume(vertices)?;
        let [a, b, c] = Self::edge_lengths(vertices);
        Ok(2.0 * area / (a + b + c))
    }

    fn squared_distance(&self, vertices: &[Point3<T>], point: &Point3<T>) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        Ok(Self::squared_distance_to_triangle(
            point,
            &vertices[0],
            &vertices[1],
            &vertices[2],
        ))
    }

    fn normal(&self, vertices: &[Point3<T>], facet: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        let [i0, i1] = [EDGES[facet][0], EDGES[facet][1]];
        let (p0, p1, opposite) = (&vertices[i0], &vertices[i1], &vertices[facet]);

        let scale = max_vertex_distance(vertices);
        let t = normalize_or_degenerate(self.cell_type(), p1 - p0, scale)?;

        // Component of (p0 - opposite) orthogonal to the facet points away from the cell
        let w = p0 - opposite;
        let n = w - t * w.dot(&t);
        normalize_or_degenerate(self.cell_type(), n, scale)
    }

    fn cell_normal(&self, vertices: &[Point3<T>], geometric_dim: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        if geometric_dim != 3 {
            return Err(GeometryError::UndefinedCellNormal {
                cell_type: self.cell_type(),
                geometric_dim,
            });
        }
        let n = (vertices[1] - vertices[0]).cross(&(vertices[2] - vertices[0]));
        let scale = max_vertex_distance(vertices);
        let norm = ensure_positive_measure(self.cell_type(), n.norm(), scale, 2)?;
        Ok(n / norm)
    }

    fn facet_area(&self, vertices: &[Point3<T>], facet: usize) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        let edge = [vertices[EDGES[facet][0]], vertices[EDGES[facet][1]]];
        IntervalCell.volume(&edge)
    }
}

use crate::{
    check_facet_index, check_vertex_count, ensure_positive_measure, max_vertex_distance, normalize_or_degenerate,
    CellGeometry, CellTopology, CellType, GeometryError, IntervalCell, TriangleCell,
};
use nalgebra::{Point3, Vector3};
use numeric_literals::replace_float_literals;
use sysasm_traits::Real;

/// Geometric kernel for planar quadrilaterals.
///
/// Vertices follow the tensor-product ordering of the reference square:
///
/// ```text
/// 2_________3
/// |         |
/// |         |
/// |         |
/// 0_________1
/// ```
///
/// so the edges are `{0, 1}`, `{0, 2}`, `{1, 3}` and `{2, 3}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct QuadrilateralCell;

const VERTICES: &[&[usize]] = &[&[0], &[1], &[2], &[3]];
const EDGES: &[&[usize]] = &[&[0, 1], &[0, 2], &[1, 3], &[2, 3]];
const CELL: &[&[usize]] = &[&[0, 1, 2, 3]];

impl CellTopology for QuadrilateralCell {
    fn cell_type(&self) -> CellType {
        CellType::Quadrilateral
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
            "quadrilaterals"
        } else {
            "quadrilateral"
        }
    }
}

impl<T: Real> CellGeometry<T> for QuadrilateralCell {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn volume(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        let [v0, v1, v2, v3] = [vertices[0], vertices[1], vertices[2], vertices[3]];
        let scale = max_vertex_distance(vertices);

        let n = (v1 - v0).cross(&(v2 - v0));
        let out_of_plane = n.dot(&(v3 - v0)).abs();
        if out_of_plane > 16.0 * T::default_epsilon() * scale.powi(3) {
            return Err(GeometryError::NonPlanar {
                cell_type: self.cell_type(),
            });
        }

        // Half the magnitude of the cross product of the diagonals
        let area = 0.5 * (v3 - v0).cross(&(v2 - v1)).norm();
        ensure_positive_measure(self.cell_type(), area, scale, 2)
    }

    fn circumradius(&self, _vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        Err(GeometryError::Unsupported {
            cell_type: self.cell_type(),
            operation: "circumradius",
        })
    }

    fn inradius(&self, _vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        Err(GeometryError::Unsupported {
            cell_type: self.cell_type(),
            operation: "inradius",
        })
    }

    fn squared_distance(&self, vertices: &[Point3<T>], point: &Point3<T>) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        let v = vertices;
        let d0 = TriangleCell::squared_distance_to_triangle(point, &v[0], &v[1], &v[3]);
        let d1 = TriangleCell::squared_distance_to_triangle(point, &v[0], &v[3], &v[2]);
        Ok(d0.min(d1))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn normal(&self, vertices: &[Point3<T>], facet: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        let edge = EDGES[facet];
        let (p0, p1) = (&vertices[edge[0]], &vertices[edge[1]]);

        // Midpoint of the opposite edge plays the role of the opposite vertex
        let mut opposite = Vector3::zeros();
        for (i, v) in vertices.iter().enumerate() {
            if !edge.contains(&i) {
                opposite += v.coords * 0.5;
            }
        }

        let scale = max_vertex_distance(vertices);
        let t = normalize_or_degenerate(self.cell_type(), p1 - p0, scale)?;
        let w = p0.coords - opposite;
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

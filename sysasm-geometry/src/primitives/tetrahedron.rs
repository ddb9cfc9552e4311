use crate::{
    check_facet_index, check_vertex_count, entity_vertices, ensure_positive_measure, max_vertex_distance,
    normalize_or_degenerate, CellGeometry, CellTopology, CellType, GeometryError, TriangleCell,
};
use nalgebra::{distance, Point3, Vector3};
use numeric_literals::replace_float_literals;
use sysasm_traits::Real;

/// Geometric kernel for tetrahedra.
///
/// Face `i` is the face opposite to vertex `i`. Edges are ordered such that edge `i` and
/// edge `5 - i` are opposite to each other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TetrahedronCell;

const VERTICES: &[&[usize]] = &[&[0], &[1], &[2], &[3]];
const EDGES: &[&[usize]] = &[&[2, 3], &[1, 3], &[1, 2], &[0, 3], &[0, 2], &[0, 1]];
const FACES: &[&[usize]] = &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]];
const CELL: &[&[usize]] = &[&[0, 1, 2, 3]];

impl TetrahedronCell {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn signed_volume<T: Real>(vertices: &[Point3<T>]) -> T {
        let [v0, v1, v2, v3] = [vertices[0], vertices[1], vertices[2], vertices[3]];
        (v1 - v0).cross(&(v2 - v0)).dot(&(v3 - v0)) / 6.0
    }

    fn face_area<T: Real>(vertices: &[Point3<T>], face: usize) -> T {
        let [a, b, c] = [FACES[face][0], FACES[face][1], FACES[face][2]];
        TriangleCell::unsigned_area(&vertices[a], &vertices[b], &vertices[c])
    }
}

impl CellTopology for TetrahedronCell {
    fn cell_type(&self) -> CellType {
        CellType::Tetrahedron
    }

    fn dim(&self) -> usize {
        3
    }

    fn local_entities(&self, dim: usize) -> Result<&'static [&'static [usize]], GeometryError> {
        match dim {
            0 => Ok(VERTICES),
            1 => Ok(EDGES),
            2 => Ok(FACES),
            3 => Ok(CELL),
            _ => Err(GeometryError::InvalidDimension {
                cell_type: self.cell_type(),
                dim,
            }),
        }
    }

    fn description(&self, plural: bool) -> &'static str {
        if plural {
            "tetrahedra"
        } else {
            "tetrahedron"
        }
    }
}

impl<T: Real> CellGeometry<T> for TetrahedronCell {
    fn volume(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        let volume = Self::signed_volume(vertices).abs();
        ensure_positive_measure(self.cell_type(), volume, max_vertex_distance(vertices), 3)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn circumradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        let volume = self.volume(vertices)?;
        let length = |edge: usize| distance(&vertices[EDGES[edge][0]], &vertices[EDGES[edge][1]]);

        // Products of the lengths of opposite edges
        let aa = length(0) * length(5);
        let bb = length(1) * length(4);
        let cc = length(2) * length(3);

        let s = (aa + bb + cc) * (aa + bb - cc) * (aa - bb + cc) * (-aa + bb + cc);
        Ok(s.max(0.0).sqrt() / (24.0 * volume))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn inradius(&self, vertices: &[Point3<T>]) -> Result<T, GeometryError> {
        let volume = self.volume(vertices)?;
        let surface = (0..4)
            .map(|face| Self::face_area(vertices, face))
            .fold(T::zero(), |acc, area| acc + area);
        Ok(3.0 * volume / surface)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn squared_distance(&self, vertices: &[Point3<T>], point: &Point3<T>) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        let scale = max_vertex_distance(vertices);
        let degenerate = Self::signed_volume(vertices).abs() <= 16.0 * T::default_epsilon() * scale.powi(3);

        if !degenerate {
            // The point is inside if it lies on the same side of every face as the opposite vertex
            let inside = FACES.iter().enumerate().all(|(opposite, face)| {
                let [a, b, c] = [&vertices[face[0]], &vertices[face[1]], &vertices[face[2]]];
                let n = (b - a).cross(&(c - a));
                let reference = n.dot(&(vertices[opposite] - a));
                let query = n.dot(&(point - a));
                reference * query >= 0.0
            });
            if inside {
                return Ok(0.0);
            }
        }

        let face_distance = |face: &[usize]| {
            let face = entity_vertices(vertices, face);
            TriangleCell::squared_distance_to_triangle(point, &face[0], &face[1], &face[2])
        };
        let distance = FACES[1..]
            .iter()
            .fold(face_distance(FACES[0]), |acc, face| acc.min(face_distance(face)));
        Ok(distance)
    }

    fn normal(&self, vertices: &[Point3<T>], facet: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        let face = FACES[facet];
        let [a, b, c] = [&vertices[face[0]], &vertices[face[1]], &vertices[face[2]]];

        let scale = max_vertex_distance(vertices);
        let mut n = normalize_or_degenerate(self.cell_type(), (b - a).cross(&(c - a)), scale)?;

        // Flip so that the normal points away from the opposite vertex
        if n.dot(&(vertices[facet] - a)) > T::zero() {
            n = -n;
        }
        Ok(n)
    }

    fn cell_normal(&self, vertices: &[Point3<T>], geometric_dim: usize) -> Result<Vector3<T>, GeometryError> {
        check_vertex_count(self, vertices)?;
        Err(GeometryError::UndefinedCellNormal {
            cell_type: self.cell_type(),
            geometric_dim,
        })
    }

    fn facet_area(&self, vertices: &[Point3<T>], facet: usize) -> Result<T, GeometryError> {
        check_vertex_count(self, vertices)?;
        check_facet_index(self, facet)?;
        TriangleCell.volume(&entity_vertices(vertices, FACES[facet]))
    }
}

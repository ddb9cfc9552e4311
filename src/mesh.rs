//! The mesh abstraction consumed by the assembler, and a simple single-cell-type reference mesh.
use crate::error::AssemblyError;
use crate::geometry::{CellGeometry, CellTopology, CellType};
use crate::Real;
use itertools::Itertools;
use log::debug;
use nalgebra::{convert, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod procedural;

/// How a facet is connected to the cells of a mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetAdjacency {
    /// A facet on the boundary of the mesh, connected to a single cell.
    Exterior { cell: usize, local_facet: usize },
    /// A facet shared by two cells, ordered such that `cells[0] < cells[1]`.
    Interior { cells: [usize; 2], local_facets: [usize; 2] },
}

impl FacetAdjacency {
    pub fn is_exterior(&self) -> bool {
        matches!(self, FacetAdjacency::Exterior { .. })
    }

    pub fn is_interior(&self) -> bool {
        matches!(self, FacetAdjacency::Interior { .. })
    }
}

/// Cells, vertex coordinates and facet adjacency of a mesh with a single cell type.
///
/// Vertex coordinates are always reported as [`Point3`], with components beyond the geometric
/// dimension set to zero.
pub trait AssemblyMesh<T: Real>: Sync {
    fn cell_type(&self) -> CellType;

    fn geometric_dim(&self) -> usize;

    fn num_vertices(&self) -> usize;

    fn num_cells(&self) -> usize;

    /// Number of vertices of every cell.
    fn cell_vertex_count(&self) -> usize {
        let cell_type = self.cell_type();
        cell_type.num_vertices(cell_type.dim()).unwrap_or(0)
    }

    fn populate_cell_vertices(&self, output: &mut [Point3<T>], cell: usize);

    fn num_facets(&self) -> usize;

    /// Global indices of the facets of a cell, in local facet order.
    fn cell_facets(&self, cell: usize) -> &[usize];

    fn facet_adjacency(&self, facet: usize) -> FacetAdjacency;
}

/// A geometric view of a single cell, as seen by local form evaluators.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cell<'a, T: Real> {
    index: usize,
    cell_type: CellType,
    geometric_dim: usize,
    vertices: &'a [Point3<T>],
}

impl<'a, T: Real> Cell<'a, T> {
    pub fn new(index: usize, cell_type: CellType, geometric_dim: usize, vertices: &'a [Point3<T>]) -> Self {
        Self {
            index,
            cell_type,
            geometric_dim,
            vertices,
        }
    }

    /// Index of the cell in its mesh.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn geometric_dim(&self) -> usize {
        self.geometric_dim
    }

    pub fn vertices(&self) -> &'a [Point3<T>] {
        self.vertices
    }

    pub fn midpoint(&self) -> Point3<T> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        Point3::from(sum / convert::<f64, T>(self.vertices.len().max(1) as f64))
    }

    pub fn volume(&self) -> Result<T, AssemblyError> {
        self.cell_type
            .volume(self.vertices)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    pub fn circumradius(&self) -> Result<T, AssemblyError> {
        self.cell_type
            .circumradius(self.vertices)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    pub fn inradius(&self) -> Result<T, AssemblyError> {
        self.cell_type
            .inradius(self.vertices)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    pub fn diameter(&self) -> Result<T, AssemblyError> {
        self.cell_type
            .diameter(self.vertices)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    pub fn squared_distance(&self, point: &Point3<T>) -> Result<T, AssemblyError> {
        self.cell_type
            .squared_distance(self.vertices, point)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    /// Outward unit normal of a local facet.
    pub fn facet_normal(&self, local_facet: usize) -> Result<Vector3<T>, AssemblyError> {
        self.cell_type
            .normal(self.vertices, local_facet)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    pub fn facet_area(&self, local_facet: usize) -> Result<T, AssemblyError> {
        self.cell_type
            .facet_area(self.vertices, local_facet)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    /// Normal of the cell as a manifold embedded in its geometric dimension.
    pub fn cell_normal(&self) -> Result<Vector3<T>, AssemblyError> {
        self.cell_type
            .cell_normal(self.vertices, self.geometric_dim)
            .map_err(|err| AssemblyError::geometry(self.index, err))
    }

    /// Local vertex indices of a local facet.
    pub fn facet_vertices(&self, local_facet: usize) -> Result<&'static [usize], AssemblyError> {
        let cell_type = self.cell_type;
        let facets = cell_type
            .local_entities(cell_type.dim() - 1)
            .map_err(|err| AssemblyError::geometry(self.index, err))?;
        facets.get(local_facet).copied().ok_or_else(|| {
            AssemblyError::geometry(
                self.index,
                crate::geometry::GeometryError::InvalidFacet {
                    cell_type,
                    facet: local_facet,
                    num_facets: facets.len(),
                },
            )
        })
    }
}

/// A mesh consisting of cells of a single type, with precomputed facets.
///
/// Facets are discovered from the cell connectivity: two cells share a facet if the facet has the
/// same set of vertices in both cells. Facets are numbered in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<T: Real> {
    cell_type: CellType,
    geometric_dim: usize,
    vertices: Vec<Point3<T>>,
    cells: Vec<Vec<usize>>,
    // Flattened, facets_per_cell entries per cell
    cell_facets: Vec<usize>,
    facets_per_cell: usize,
    facet_vertices: Vec<Vec<usize>>,
    facet_adjacency: Vec<FacetAdjacency>,
}

impl<T: Real> Mesh<T> {
    pub fn from_vertices_and_connectivity(
        cell_type: CellType,
        geometric_dim: usize,
        vertices: Vec<Point3<T>>,
        cells: Vec<Vec<usize>>,
    ) -> eyre::Result<Self> {
        let tdim = cell_type.dim();
        if geometric_dim < tdim || geometric_dim > 3 {
            return Err(AssemblyError::InvalidMesh(format!(
                "geometric dimension {geometric_dim} is not valid for {}",
                cell_type.description(true)
            ))
            .into());
        }

        let vertices_per_cell = cell_type.num_vertices(tdim)?;
        for (cell_index, cell) in cells.iter().enumerate() {
            if cell.len() != vertices_per_cell {
                return Err(AssemblyError::InvalidMesh(format!(
                    "cell {cell_index} has {} vertices, but a {cell_type} has {vertices_per_cell}",
                    cell.len()
                ))
                .into());
            }
            if let Some(&v) = cell.iter().find(|&&v| v >= vertices.len()) {
                return Err(AssemblyError::InvalidMesh(format!(
                    "cell {cell_index} refers to vertex {v}, but the mesh only has {} vertices",
                    vertices.len()
                ))
                .into());
            }
        }

        // Use a BTreeMap keyed by sorted vertex indices, so that facet numbering is deterministic
        let facet_dim = tdim - 1;
        let facets_per_cell = cell_type.num_facets();
        let mut facet_numbers = BTreeMap::new();
        let mut facet_vertices = Vec::new();
        let mut incidence: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut cell_facets = Vec::with_capacity(facets_per_cell * cells.len());
        for (cell_index, cell) in cells.iter().enumerate() {
            for (local_facet, mut key) in cell_type
                .create_entities(facet_dim, cell)?
                .into_iter()
                .enumerate()
            {
                key.sort_unstable();
                let next_index = facet_vertices.len();
                let facet = *facet_numbers.entry(key.clone()).or_insert(next_index);
                if facet == next_index {
                    facet_vertices.push(key);
                    incidence.push(Vec::new());
                }
                incidence[facet].push((cell_index, local_facet));
                cell_facets.push(facet);
            }
        }

        let facet_adjacency = incidence
            .into_iter()
            .enumerate()
            .map(|(facet, cells)| match cells.as_slice() {
                &[(cell, local_facet)] => Ok(FacetAdjacency::Exterior { cell, local_facet }),
                &[(c0, f0), (c1, f1)] if c0 < c1 => Ok(FacetAdjacency::Interior {
                    cells: [c0, c1],
                    local_facets: [f0, f1],
                }),
                _ => Err(AssemblyError::InvalidMesh(format!(
                    "facet {facet} with vertices {:?} is connected to cells {:?}",
                    facet_vertices[facet],
                    cells.iter().map(|(cell, _)| *cell).collect::<Vec<_>>()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Created mesh with {} vertices, {} {} and {} facets",
            vertices.len(),
            cells.len(),
            cell_type.description(true),
            facet_adjacency.len()
        );

        Ok(Self {
            cell_type,
            geometric_dim,
            vertices,
            cells,
            cell_facets,
            facets_per_cell,
            facet_vertices,
            facet_adjacency,
        })
    }

    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    /// Vertex indices of every cell.
    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    /// Sorted vertex indices of a facet.
    pub fn facet_vertices(&self, facet: usize) -> &[usize] {
        &self.facet_vertices[facet]
    }

    /// Geometric view of a cell.
    ///
    /// The vertex coordinates are copied into `buffer`, which the returned cell borrows.
    pub fn cell<'b>(&self, cell: usize, buffer: &'b mut Vec<Point3<T>>) -> Cell<'b, T> {
        buffer.clear();
        buffer.extend(self.cells[cell].iter().map(|&v| self.vertices[v]));
        Cell::new(cell, self.cell_type, self.geometric_dim, buffer)
    }

    pub fn exterior_facets(&self) -> Vec<usize> {
        self.facets_where(FacetAdjacency::is_exterior)
    }

    pub fn interior_facets(&self) -> Vec<usize> {
        self.facets_where(FacetAdjacency::is_interior)
    }

    fn facets_where(&self, predicate: impl Fn(&FacetAdjacency) -> bool) -> Vec<usize> {
        self.facet_adjacency
            .iter()
            .enumerate()
            .filter(|(_, adjacency)| predicate(adjacency))
            .map(|(facet, _)| facet)
            .collect()
    }

    /// Finds cells that have at least one exterior facet.
    pub fn find_boundary_cells(&self) -> Vec<usize> {
        self.facet_adjacency
            .iter()
            .filter_map(|adjacency| match adjacency {
                FacetAdjacency::Exterior { cell, .. } => Some(*cell),
                FacetAdjacency::Interior { .. } => None,
            })
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Returns a sorted list of the vertices that belong to an exterior facet.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for facet in self.exterior_facets() {
            indices.extend_from_slice(&self.facet_vertices[facet]);
        }
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn cell_midpoint(&self, cell: usize) -> Point3<T> {
        midpoint(self.cells[cell].iter().map(|&v| &self.vertices[v]))
    }

    pub fn facet_midpoint(&self, facet: usize) -> Point3<T> {
        midpoint(self.facet_vertices[facet].iter().map(|&v| &self.vertices[v]))
    }

    /// Computes a marker for every cell from the position of its midpoint.
    pub fn cell_markers(&self, marker: impl Fn(&Point3<T>) -> usize) -> Vec<usize> {
        (0..self.cells.len())
            .map(|cell| marker(&self.cell_midpoint(cell)))
            .collect()
    }

    /// Computes a marker for every facet from the position of its midpoint.
    pub fn facet_markers(&self, marker: impl Fn(&Point3<T>) -> usize) -> Vec<usize> {
        (0..self.facet_vertices.len())
            .map(|facet| marker(&self.facet_midpoint(facet)))
            .collect()
    }

    /// Smallest cell diameter, or zero for an empty mesh.
    pub fn hmin(&self) -> eyre::Result<T> {
        self.fold_cells(|cell| cell.diameter(), |a, b| a.min(b))
    }

    /// Largest cell diameter, or zero for an empty mesh.
    pub fn hmax(&self) -> eyre::Result<T> {
        self.fold_cells(|cell| cell.diameter(), |a, b| a.max(b))
    }

    /// Smallest cell inradius, or zero for an empty mesh.
    pub fn rmin(&self) -> eyre::Result<T> {
        self.fold_cells(|cell| cell.inradius(), |a, b| a.min(b))
    }

    /// Largest cell inradius, or zero for an empty mesh.
    pub fn rmax(&self) -> eyre::Result<T> {
        self.fold_cells(|cell| cell.inradius(), |a, b| a.max(b))
    }

    fn fold_cells(
        &self,
        quantity: impl Fn(&Cell<T>) -> Result<T, AssemblyError>,
        combine: impl Fn(T, T) -> T,
    ) -> eyre::Result<T> {
        let mut buffer = Vec::new();
        let mut result = None;
        for cell in 0..self.cells.len() {
            let value = quantity(&self.cell(cell, &mut buffer))?;
            result = Some(match result {
                Some(current) => combine(current, value),
                None => value,
            });
        }
        Ok(result.unwrap_or_else(T::zero))
    }
}

fn midpoint<'a, T: Real>(points: impl ExactSizeIterator<Item = &'a Point3<T>>) -> Point3<T> {
    let n = points.len().max(1);
    let sum = points.fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / convert::<f64, T>(n as f64))
}

impl<T: Real> AssemblyMesh<T> for Mesh<T> {
    fn cell_type(&self) -> CellType {
        self.cell_type
    }

    fn geometric_dim(&self) -> usize {
        self.geometric_dim
    }

    fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn populate_cell_vertices(&self, output: &mut [Point3<T>], cell: usize) {
        for (out, &v) in output.iter_mut().zip(&self.cells[cell]) {
            *out = self.vertices[v];
        }
    }

    fn num_facets(&self) -> usize {
        self.facet_adjacency.len()
    }

    fn cell_facets(&self, cell: usize) -> &[usize] {
        let n = self.facets_per_cell;
        &self.cell_facets[n * cell..n * (cell + 1)]
    }

    fn facet_adjacency(&self, facet: usize) -> FacetAdjacency {
        self.facet_adjacency[facet]
    }
}

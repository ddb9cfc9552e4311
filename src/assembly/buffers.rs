//! Reusable per-unit buffers for assembly.
use crate::assembly::local::LocalFormEvaluator;
use crate::mesh::{AssemblyMesh, Cell};
use crate::Real;
use nalgebra::{DMatrix, Point3};

/// Buffers for the local tensors of the bilinear and linear form of one assembly unit.
///
/// An assembly unit is either a cell (including its exterior facets) or an interior facet with
/// its two adjacent cells. For interior facets, the local dofs of the two cells are concatenated,
/// first cell first. The buffers keep their allocations between units and are zeroed every time a
/// unit is initialized.
#[derive(Debug, Clone)]
pub struct Scratch<T: Real> {
    /// Local matrix of the bilinear form.
    matrix: DMatrix<T>,
    /// Local vector of the linear form, stored as a single column.
    vector: DMatrix<T>,
    test_dofs: Vec<usize>,
    trial_dofs: Vec<usize>,
    cell_dofs: Vec<usize>,
    vertices: [Vec<Point3<T>>; 2],
    cells: [usize; 2],
}

impl<T: Real> Default for Scratch<T> {
    fn default() -> Self {
        Self {
            matrix: DMatrix::zeros(0, 0),
            vector: DMatrix::zeros(0, 1),
            test_dofs: Vec::new(),
            trial_dofs: Vec::new(),
            cell_dofs: Vec::new(),
            vertices: [Vec::new(), Vec::new()],
            cells: [usize::MAX; 2],
        }
    }
}

impl<T: Real> Scratch<T> {
    /// Prepares the buffers for a single cell of the mesh.
    pub fn init_cell(&mut self, mesh: &dyn AssemblyMesh<T>, a: &dyn LocalFormEvaluator<T>, cell: usize) {
        let test = a.dof_map(0);
        let trial = a.dof_map(1);
        populate(&mut self.test_dofs, test.cell_dof_count(cell), |out| {
            test.populate_cell_dofs(out, cell)
        });
        populate(&mut self.trial_dofs, trial.cell_dof_count(cell), |out| {
            trial.populate_cell_dofs(out, cell)
        });
        self.load_vertices(mesh, 0, cell);
        self.cells = [cell, usize::MAX];
        self.zero();
    }

    /// Prepares the buffers for an interior facet shared by `cells[0]` and `cells[1]`.
    pub fn init_interior_facet(
        &mut self,
        mesh: &dyn AssemblyMesh<T>,
        a: &dyn LocalFormEvaluator<T>,
        cells: [usize; 2],
    ) {
        for (argument, dofs) in [(0, &mut self.test_dofs), (1, &mut self.trial_dofs)] {
            let dof_map = a.dof_map(argument);
            dofs.clear();
            for &cell in &cells {
                let cell_dofs = &mut self.cell_dofs;
                populate(cell_dofs, dof_map.cell_dof_count(cell), |out| {
                    dof_map.populate_cell_dofs(out, cell)
                });
                dofs.extend_from_slice(cell_dofs);
            }
        }
        self.load_vertices(mesh, 0, cells[0]);
        self.load_vertices(mesh, 1, cells[1]);
        self.cells = cells;
        self.zero();
    }

    fn load_vertices(&mut self, mesh: &dyn AssemblyMesh<T>, slot: usize, cell: usize) {
        let vertices = &mut self.vertices[slot];
        vertices.resize(mesh.cell_vertex_count(), Point3::origin());
        mesh.populate_cell_vertices(vertices, cell);
    }

    /// Resizes the local tensors to the current dofs and fills them with zeros.
    pub fn zero(&mut self) {
        let (m, n) = (self.test_dofs.len(), self.trial_dofs.len());
        self.matrix.resize_mut(m, n, T::zero());
        self.matrix.fill(T::zero());
        self.vector.resize_mut(m, 1, T::zero());
        self.vector.fill(T::zero());
    }

    pub fn test_dofs(&self) -> &[usize] {
        &self.test_dofs
    }

    pub fn trial_dofs(&self) -> &[usize] {
        &self.trial_dofs
    }

    /// Geometric view of the first (or second) cell of the current unit.
    pub fn cell(&self, mesh: &dyn AssemblyMesh<T>, slot: usize) -> Cell<'_, T> {
        Cell::new(self.cells[slot], mesh.cell_type(), mesh.geometric_dim(), &self.vertices[slot])
    }

    /// Splits the scratch into the geometric views of the current cells and the local tensors.
    pub fn split_mut(&mut self, mesh: &dyn AssemblyMesh<T>) -> ScratchParts<'_, T> {
        let [v0, v1] = &self.vertices;
        let cell_type = mesh.cell_type();
        let gdim = mesh.geometric_dim();
        ScratchParts {
            cells: [
                Cell::new(self.cells[0], cell_type, gdim, v0),
                Cell::new(self.cells[1], cell_type, gdim, v1),
            ],
            matrix: &mut self.matrix,
            vector: &mut self.vector,
            test_dofs: &self.test_dofs,
            trial_dofs: &self.trial_dofs,
        }
    }
}

/// Disjoint borrows of the parts of a [`Scratch`].
pub struct ScratchParts<'a, T: Real> {
    pub cells: [Cell<'a, T>; 2],
    pub matrix: &'a mut DMatrix<T>,
    pub vector: &'a mut DMatrix<T>,
    pub test_dofs: &'a [usize],
    pub trial_dofs: &'a [usize],
}

fn populate(buffer: &mut Vec<usize>, count: usize, fill: impl FnOnce(&mut [usize])) {
    buffer.clear();
    buffer.resize(count, usize::MAX);
    fill(buffer);
}

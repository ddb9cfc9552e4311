//! Local-to-global numbering of degrees of freedom.
use crate::error::AssemblyError;
use crate::mesh::Mesh;
use crate::Real;

/// Maps the local degrees of freedom of each cell to global indices.
pub trait DofMap: Sync {
    /// Total number of global degrees of freedom.
    fn global_dimension(&self) -> usize;

    fn num_cells(&self) -> usize;

    fn cell_dof_count(&self, cell: usize) -> usize;

    fn populate_cell_dofs(&self, output: &mut [usize], cell: usize);

    /// Convenience accessor allocating a new vector.
    fn cell_dofs(&self, cell: usize) -> Vec<usize> {
        let mut dofs = vec![0; self.cell_dof_count(cell)];
        self.populate_cell_dofs(&mut dofs, cell);
        dofs
    }
}

/// Continuous numbering with `solution_dim` degrees of freedom per mesh vertex.
///
/// The degree of freedom for component `i` at vertex `v` is `solution_dim * v + i`, and the local
/// degrees of freedom of a cell are ordered vertex by vertex.
#[derive(Debug, Copy, Clone)]
pub struct VertexDofMap<'a> {
    cells: &'a [Vec<usize>],
    num_vertices: usize,
    solution_dim: usize,
}

impl<'a> VertexDofMap<'a> {
    pub fn new<T: Real>(mesh: &'a Mesh<T>, solution_dim: usize) -> Self {
        Self {
            cells: mesh.cells(),
            num_vertices: mesh.vertices().len(),
            solution_dim,
        }
    }

    pub fn solution_dim(&self) -> usize {
        self.solution_dim
    }

    pub fn vertex_dof(&self, vertex: usize, component: usize) -> usize {
        debug_assert!(component < self.solution_dim);
        self.solution_dim * vertex + component
    }
}

impl<'a> DofMap for VertexDofMap<'a> {
    fn global_dimension(&self) -> usize {
        self.solution_dim * self.num_vertices
    }

    fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_dof_count(&self, cell: usize) -> usize {
        self.solution_dim * self.cells[cell].len()
    }

    fn populate_cell_dofs(&self, output: &mut [usize], cell: usize) {
        let sdim = self.solution_dim;
        for (local_vertex, &vertex) in self.cells[cell].iter().enumerate() {
            for i in 0..sdim {
                output[sdim * local_vertex + i] = sdim * vertex + i;
            }
        }
    }
}

/// A dof map given by an explicit table of global indices per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDofMap {
    global_dimension: usize,
    cell_dofs: Vec<Vec<usize>>,
}

impl TableDofMap {
    pub fn new(global_dimension: usize, cell_dofs: Vec<Vec<usize>>) -> eyre::Result<Self> {
        for (cell, dofs) in cell_dofs.iter().enumerate() {
            if let Some(&dof) = dofs.iter().find(|&&dof| dof >= global_dimension) {
                return Err(AssemblyError::InvalidMesh(format!(
                    "cell {cell} refers to dof {dof}, but the global dimension is {global_dimension}"
                ))
                .into());
            }
        }
        Ok(Self {
            global_dimension,
            cell_dofs,
        })
    }

    /// Discontinuous numbering where every cell owns `dofs_per_cell` consecutive dofs.
    pub fn discontinuous(num_cells: usize, dofs_per_cell: usize) -> Self {
        let cell_dofs = (0..num_cells)
            .map(|cell| (dofs_per_cell * cell..dofs_per_cell * (cell + 1)).collect())
            .collect();
        Self {
            global_dimension: num_cells * dofs_per_cell,
            cell_dofs,
        }
    }
}

impl DofMap for TableDofMap {
    fn global_dimension(&self) -> usize {
        self.global_dimension
    }

    fn num_cells(&self) -> usize {
        self.cell_dofs.len()
    }

    fn cell_dof_count(&self, cell: usize) -> usize {
        self.cell_dofs[cell].len()
    }

    fn populate_cell_dofs(&self, output: &mut [usize], cell: usize) {
        output.copy_from_slice(&self.cell_dofs[cell]);
    }
}

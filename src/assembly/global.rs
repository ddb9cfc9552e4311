//! Global tensors that local contributions are scattered into.
use crate::assembly::local::LocalFormEvaluator;
use crate::dofmap::DofMap;
use crate::error::AssemblyError;
use crate::mesh::{AssemblyMesh, FacetAdjacency};
use crate::Real;
use eyre::eyre;
use log::debug;
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::slice::ParallelSliceMut;

/// A global matrix supporting additive scatter.
///
/// Repeated additions to the same entry accumulate.
pub trait GlobalMatrix<T: Real> {
    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> eyre::Result<()>;

    /// Adds `local[(i, j)]` to the entry `(rows[i], cols[j])` for all `i` and `j`.
    fn add_local(&mut self, rows: &[usize], cols: &[usize], local: DMatrixView<T>) -> eyre::Result<()> {
        debug_assert_eq!(local.shape(), (rows.len(), cols.len()));
        for (i, &row) in rows.iter().enumerate() {
            for (j, &col) in cols.iter().enumerate() {
                self.add_entry(row, col, local[(i, j)])?;
            }
        }
        Ok(())
    }
}

/// A global vector supporting additive scatter.
pub trait GlobalVector<T: Real> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_entry(&mut self, index: usize, value: T) -> eyre::Result<()>;

    /// Adds `local[i]` to the entry `indices[i]` for all `i`.
    fn add_local(&mut self, indices: &[usize], local: DVectorView<T>) -> eyre::Result<()> {
        debug_assert_eq!(local.len(), indices.len());
        for (i, &index) in indices.iter().enumerate() {
            self.add_entry(index, local[i])?;
        }
        Ok(())
    }
}

fn check_bounds(row: usize, col: usize, nrows: usize, ncols: usize) -> Result<(), AssemblyError> {
    if row < nrows && col < ncols {
        Ok(())
    } else {
        Err(AssemblyError::IndexOutOfBounds { row, col, nrows, ncols })
    }
}

impl<T: Real> GlobalMatrix<T> for DMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }

    fn ncols(&self) -> usize {
        self.ncols()
    }

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> eyre::Result<()> {
        check_bounds(row, col, self.nrows(), self.ncols())?;
        self[(row, col)] += value;
        Ok(())
    }
}

impl<T: Real> GlobalMatrix<T> for CooMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }

    fn ncols(&self) -> usize {
        self.ncols()
    }

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> eyre::Result<()> {
        check_bounds(row, col, self.nrows(), self.ncols())?;
        self.push(row, col, value);
        Ok(())
    }
}

/// Scatter into a CSR matrix with a fixed sparsity pattern.
///
/// Adding to an entry outside of the pattern is an error. Use [`assemble_pattern`] to compute a
/// pattern that covers all contributions of a form.
impl<T: Real> GlobalMatrix<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }

    fn ncols(&self) -> usize {
        self.ncols()
    }

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> eyre::Result<()> {
        check_bounds(row, col, self.nrows(), self.ncols())?;
        let mut csr_row = self
            .get_row_mut(row)
            .ok_or(AssemblyError::MissingEntry { row, col })?;
        let (columns, values) = csr_row.cols_and_values_mut();
        let idx = columns
            .binary_search(&col)
            .map_err(|_| AssemblyError::MissingEntry { row, col })?;
        values[idx] += value;
        Ok(())
    }

    fn add_local(&mut self, rows: &[usize], cols: &[usize], local: DMatrixView<T>) -> eyre::Result<()> {
        // Visit the local columns in order of increasing global column, so that each row of the
        // CSR matrix only needs to be traversed once
        let mut permutation: Vec<usize> = (0..cols.len()).collect();
        permutation.sort_unstable_by_key(|&j| cols[j]);

        let (nrows, ncols) = (self.nrows(), self.ncols());
        for (i, &row) in rows.iter().enumerate() {
            let mut csr_row = self
                .get_row_mut(row)
                .ok_or(AssemblyError::IndexOutOfBounds { row, col: 0, nrows, ncols })?;
            let (columns, values) = csr_row.cols_and_values_mut();
            let mut position = 0;
            for &j in &permutation {
                let col = cols[j];
                while position < columns.len() && columns[position] < col {
                    position += 1;
                }
                if position == columns.len() || columns[position] != col {
                    return Err(AssemblyError::MissingEntry { row, col }.into());
                }
                values[position] += local[(i, j)];
            }
        }
        Ok(())
    }
}

impl<T: Real> GlobalVector<T> for DVector<T> {
    fn len(&self) -> usize {
        self.len()
    }

    fn add_entry(&mut self, index: usize, value: T) -> eyre::Result<()> {
        check_bounds(index, 0, self.len(), 1)?;
        self[index] += value;
        Ok(())
    }
}

/// Computes the sparsity pattern of the matrix of a bilinear form.
///
/// The pattern couples the test and trial dofs of every cell, the dofs of both cells adjacent to
/// an interior facet if the form has an interior facet integral, and contains the full diagonal
/// so that constrained dofs can always be given an identity row.
pub fn assemble_pattern<T: Real>(
    mesh: &dyn AssemblyMesh<T>,
    form: &dyn LocalFormEvaluator<T>,
) -> eyre::Result<SparsityPattern> {
    let test = form.dof_map(0);
    let trial = form.dof_map(1);
    let num_rows = test.global_dimension();
    let num_cols = trial.global_dimension();

    let mut coordinates = Vec::new();
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut push_block = |cells: &[usize]| {
        collect_dofs(test, cells, &mut rows);
        collect_dofs(trial, cells, &mut cols);
        for &i in &rows {
            for &j in &cols {
                coordinates.push((i, j));
            }
        }
    };

    for cell in 0..mesh.num_cells() {
        push_block(&[cell]);
    }
    if form.has_interior_facet_integral() {
        for facet in 0..mesh.num_facets() {
            if let FacetAdjacency::Interior { cells, .. } = mesh.facet_adjacency(facet) {
                push_block(&cells);
            }
        }
    }
    coordinates.extend((0..num_rows.min(num_cols)).map(|i| (i, i)));

    coordinates.par_sort_unstable();
    coordinates.dedup();

    let mut offsets = Vec::with_capacity(num_rows + 1);
    let mut column_indices = Vec::with_capacity(coordinates.len());
    offsets.push(0);
    for (i, j) in coordinates {
        if i >= num_rows || j >= num_cols {
            return Err(AssemblyError::IndexOutOfBounds {
                row: i,
                col: j,
                nrows: num_rows,
                ncols: num_cols,
            }
            .into());
        }
        // Run in a loop to correctly handle consecutive empty rows
        while i + 1 > offsets.len() {
            offsets.push(column_indices.len());
        }
        column_indices.push(j);
    }
    while offsets.len() < num_rows + 1 {
        offsets.push(column_indices.len());
    }

    debug!(
        "Assembled sparsity pattern of size {}x{} with {} entries",
        num_rows,
        num_cols,
        column_indices.len()
    );
    Ok(SparsityPattern::try_from_offsets_and_indices(
        num_rows,
        num_cols,
        offsets,
        column_indices,
    )?)
}

/// Creates a CSR matrix with the given pattern and all values set to zero.
pub fn csr_from_pattern<T: Real>(pattern: SparsityPattern) -> eyre::Result<CsrMatrix<T>> {
    let values = vec![T::zero(); pattern.nnz()];
    CsrMatrix::try_from_pattern_and_values(pattern, values)
        .map_err(|err| eyre!("failed to create CSR matrix from pattern: {err}"))
}

fn collect_dofs(dof_map: &dyn DofMap, cells: &[usize], output: &mut Vec<usize>) {
    output.clear();
    for &cell in cells {
        let start = output.len();
        output.resize(start + dof_map.cell_dof_count(cell), usize::MAX);
        dof_map.populate_cell_dofs(&mut output[start..], cell);
    }
}

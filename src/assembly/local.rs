//! Local element tensors: the evaluator interface, constraint elimination and reference forms.
use crate::bc::BoundaryValues;
use crate::dofmap::DofMap;
use crate::mesh::Cell;
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrixViewMut, DVectorViewMut};
use serde::{Deserialize, Serialize};

mod laplace;
mod penalty;
mod robin;
mod source;

pub use laplace::*;
pub use penalty::*;
pub use robin::*;
pub use source::*;

/// The kinds of integrals a form may consist of.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegralType {
    Cell,
    ExteriorFacet,
    InteriorFacet,
}

/// Computes the local element tensors of a bilinear (rank 2) or linear (rank 1) form.
///
/// All `compute_*` methods **add** their contribution to `output`, which the assembler zeroes
/// before the first contribution of every assembly unit. For a bilinear form, `output` has one
/// row per local test dof and one column per local trial dof. For a linear form it has one row
/// per local test dof and a single column.
///
/// Interior facet tensors are block structured: the local dofs of the first cell come before the
/// local dofs of the second cell, both for rows and columns.
pub trait LocalFormEvaluator<T: Real>: Sync {
    /// The number of arguments of the form, 2 for a bilinear and 1 for a linear form.
    fn rank(&self) -> usize;

    /// Dof map of the given argument (0 for the test space, 1 for the trial space).
    fn dof_map(&self, argument: usize) -> &dyn DofMap;

    fn has_cell_integral(&self) -> bool {
        false
    }

    fn has_exterior_facet_integral(&self) -> bool {
        false
    }

    fn has_interior_facet_integral(&self) -> bool {
        false
    }

    fn has_integral(&self, integral_type: IntegralType) -> bool {
        match integral_type {
            IntegralType::Cell => self.has_cell_integral(),
            IntegralType::ExteriorFacet => self.has_exterior_facet_integral(),
            IntegralType::InteriorFacet => self.has_interior_facet_integral(),
        }
    }

    /// The domain marker for which the given integral is evaluated.
    ///
    /// Only consulted when the assembler is given domain markers for this kind of entity.
    fn domain_id(&self, _integral_type: IntegralType) -> usize {
        0
    }

    fn compute_cell_tensor(&self, _cell: &Cell<T>, _output: DMatrixViewMut<T>) -> eyre::Result<()> {
        Err(eyre!("form does not define a cell integral"))
    }

    fn compute_exterior_facet_tensor(
        &self,
        _cell: &Cell<T>,
        _local_facet: usize,
        _output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        Err(eyre!("form does not define an exterior facet integral"))
    }

    fn compute_interior_facet_tensor(
        &self,
        _cells: [&Cell<T>; 2],
        _local_facets: [usize; 2],
        _output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        Err(eyre!("form does not define an interior facet integral"))
    }
}

/// Eliminates constrained degrees of freedom from a local matrix and vector.
///
/// `matrix` has one row per entry of `row_dofs` and one column per entry of `col_dofs`, and
/// `vector` has one entry per row. Let `v` be the target value of a constrained dof.
///
/// 1. Every constrained column, scaled by `v`, is subtracted from the vector entries of all
///    unconstrained rows. This requires the matrix, and is skipped if it is not given.
/// 2. Rows and columns of constrained dofs are zeroed, and diagonal entries of constrained dofs
///    are set to `diagonal`.
/// 3. Vector entries of constrained rows are set to `diagonal * v`.
///
/// With `diagonal = 1` this turns every constrained row into an identity row with `v` on the
/// right-hand side. The assembler instead uses `diagonal = 0` and adds the identity once per dof
/// after all local contributions have been scattered.
pub fn eliminate_constraints<T: Real>(
    mut matrix: Option<DMatrixViewMut<T>>,
    mut vector: Option<DVectorViewMut<T>>,
    row_dofs: &[usize],
    col_dofs: &[usize],
    targets: &BoundaryValues<T>,
    diagonal: T,
) {
    if targets.is_empty() {
        return;
    }

    if let (Some(matrix), Some(vector)) = (matrix.as_ref(), vector.as_mut()) {
        for (j, &col_dof) in col_dofs.iter().enumerate() {
            if let Some(v) = targets.get(col_dof) {
                for (i, &row_dof) in row_dofs.iter().enumerate() {
                    if !targets.contains(row_dof) {
                        vector[i] -= matrix[(i, j)] * v;
                    }
                }
            }
        }
    }

    if let Some(matrix) = matrix.as_mut() {
        for (j, &col_dof) in col_dofs.iter().enumerate() {
            if targets.contains(col_dof) {
                matrix.column_mut(j).fill(T::zero());
            }
        }
        for (i, &row_dof) in row_dofs.iter().enumerate() {
            if targets.contains(row_dof) {
                matrix.row_mut(i).fill(T::zero());
                if col_dofs.get(i) == Some(&row_dof) {
                    matrix[(i, i)] = diagonal;
                }
            }
        }
    }

    if let Some(vector) = vector.as_mut() {
        for (i, &row_dof) in row_dofs.iter().enumerate() {
            if let Some(v) = targets.get(row_dof) {
                vector[i] = diagonal * v;
            }
        }
    }
}

use crate::assembly::local::LocalFormEvaluator;
use crate::dofmap::DofMap;
use crate::mesh::Cell;
use crate::Real;
use eyre::eyre;
use nalgebra::DMatrixViewMut;

/// A reaction term with a jump penalty for piecewise constant (discontinuous) elements.
///
/// The form is `∫ c u v dx + Σ_F ∫_F γ [u] [v] ds`, where `[u]` is the jump of `u` across the
/// interior facet `F`. Every cell carries the same number of dofs, one per solution component.
#[derive(Clone, Copy)]
pub struct JumpPenaltyForm<'a, T> {
    dof_map: &'a dyn DofMap,
    reaction: T,
    penalty: T,
}

impl<'a, T: Real> JumpPenaltyForm<'a, T> {
    pub fn new(dof_map: &'a dyn DofMap, reaction: T, penalty: T) -> Self {
        Self {
            dof_map,
            reaction,
            penalty,
        }
    }
}

impl<'a, T: Real> LocalFormEvaluator<T> for JumpPenaltyForm<'a, T> {
    fn rank(&self) -> usize {
        2
    }

    fn dof_map(&self, _argument: usize) -> &dyn DofMap {
        self.dof_map
    }

    fn has_cell_integral(&self) -> bool {
        true
    }

    fn has_interior_facet_integral(&self) -> bool {
        true
    }

    fn compute_cell_tensor(&self, cell: &Cell<T>, mut output: DMatrixViewMut<T>) -> eyre::Result<()> {
        let value = self.reaction * cell.volume()?;
        for i in 0..output.nrows().min(output.ncols()) {
            output[(i, i)] += value;
        }
        Ok(())
    }

    fn compute_interior_facet_tensor(
        &self,
        cells: [&Cell<T>; 2],
        local_facets: [usize; 2],
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        let n = output.nrows();
        if n % 2 != 0 || output.ncols() != n {
            return Err(eyre!(
                "jump penalty requires the same number of dofs on both cells, got local tensor of shape {:?}",
                output.shape()
            ));
        }
        let k = n / 2;
        let value = self.penalty * cells[0].facet_area(local_facets[0])?;
        for i in 0..k {
            output[(i, i)] += value;
            output[(k + i, k + i)] += value;
            output[(i, k + i)] -= value;
            output[(k + i, i)] -= value;
        }
        Ok(())
    }
}

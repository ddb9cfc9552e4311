use crate::assembly::local::{IntegralType, LocalFormEvaluator};
use crate::dofmap::DofMap;
use crate::geometry::CellTopology;
use crate::mesh::Cell;
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DMatrixViewMut};

/// Gradients of the linear Lagrange basis functions of a simplex cell.
///
/// Returns a `3 x n` matrix whose column `i` is the gradient of the basis function associated with
/// vertex `i`. Cells embedded in a higher-dimensional space are supported, the gradients are then
/// tangential to the cell.
pub fn linear_basis_gradients<T: Real>(cell: &Cell<T>) -> eyre::Result<DMatrix<T>> {
    if !cell.cell_type().is_simplex() {
        return Err(eyre!(
            "linear basis gradients require simplex cells, got {}",
            cell.cell_type().description(true)
        ));
    }
    // Rejects degenerate cells before the metric is inverted
    cell.volume()?;

    let vertices = cell.vertices();
    let d = vertices.len() - 1;
    let x0 = vertices[0];
    let jacobian = DMatrix::from_fn(3, d, |r, c| vertices[c + 1][r] - x0[r]);
    let metric = jacobian.transpose() * &jacobian;
    let metric_inverse = metric
        .try_inverse()
        .ok_or_else(|| eyre!("singular metric for cell {}", cell.index()))?;

    let mut gradients = DMatrix::zeros(3, d + 1);
    gradients
        .columns_mut(1, d)
        .copy_from(&(metric_inverse * jacobian.transpose()).transpose());
    let g0 = -gradients.columns(1, d).column_sum();
    gradients.set_column(0, &g0);
    Ok(gradients)
}

/// The bilinear form `∫ k ∇u · ∇v dx` for linear Lagrange elements on simplices.
#[derive(Clone, Copy)]
pub struct LaplaceForm<'a, T> {
    dof_map: &'a dyn DofMap,
    coefficient: T,
    domain: usize,
}

impl<'a, T: Real> LaplaceForm<'a, T> {
    pub fn new(dof_map: &'a dyn DofMap) -> Self {
        Self {
            dof_map,
            coefficient: T::one(),
            domain: 0,
        }
    }

    pub fn with_coefficient(self, coefficient: T) -> Self {
        Self { coefficient, ..self }
    }

    /// Restricts the cell integral to cells with the given marker.
    pub fn with_domain(self, domain: usize) -> Self {
        Self { domain, ..self }
    }
}

impl<'a, T: Real> LocalFormEvaluator<T> for LaplaceForm<'a, T> {
    fn rank(&self) -> usize {
        2
    }

    fn dof_map(&self, _argument: usize) -> &dyn DofMap {
        self.dof_map
    }

    fn has_cell_integral(&self) -> bool {
        true
    }

    fn domain_id(&self, _integral_type: IntegralType) -> usize {
        self.domain
    }

    fn compute_cell_tensor(&self, cell: &Cell<T>, mut output: DMatrixViewMut<T>) -> eyre::Result<()> {
        let gradients = linear_basis_gradients(cell)?;
        let n = gradients.ncols();
        if output.shape() != (n, n) {
            return Err(eyre!(
                "linear Lagrange stiffness has shape {:?}, but the local tensor has shape {:?}",
                (n, n),
                output.shape()
            ));
        }
        let volume = cell.volume()?;
        output += (gradients.transpose() * &gradients) * (self.coefficient * volume);
        Ok(())
    }
}

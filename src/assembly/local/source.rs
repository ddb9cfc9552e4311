use crate::assembly::local::{IntegralType, LocalFormEvaluator};
use crate::dofmap::DofMap;
use crate::mesh::Cell;
use crate::Real;
use nalgebra::{convert, DMatrixViewMut, Point3};

/// The linear form `∫ f v dx`, integrated with the midpoint rule and lumped onto the local dofs.
///
/// For linear Lagrange elements every vertex receives `f(x_c) |K| / n`, for piecewise constants
/// the single dof of a cell receives `f(x_c) |K|`.
pub struct SourceForm<'a, F> {
    dof_map: &'a dyn DofMap,
    source: F,
    domain: usize,
}

impl<'a, F> SourceForm<'a, F> {
    pub fn new(dof_map: &'a dyn DofMap, source: F) -> Self {
        Self {
            dof_map,
            source,
            domain: 0,
        }
    }

    /// Restricts the cell integral to cells with the given marker.
    pub fn with_domain(self, domain: usize) -> Self {
        Self { domain, ..self }
    }
}

impl<'a, T, F> LocalFormEvaluator<T> for SourceForm<'a, F>
where
    T: Real,
    F: Sync + Fn(&Point3<T>) -> T,
{
    fn rank(&self) -> usize {
        1
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
        let n = output.nrows().max(1);
        let volume = cell.volume()?;
        let value = (self.source)(&cell.midpoint()) * volume / convert::<f64, T>(n as f64);
        output.add_scalar_mut(value);
        Ok(())
    }
}

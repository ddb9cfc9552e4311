use crate::assembly::local::{IntegralType, LocalFormEvaluator};
use crate::dofmap::DofMap;
use crate::mesh::Cell;
use crate::Real;
use eyre::eyre;
use nalgebra::{convert, DMatrixViewMut};
use numeric_literals::replace_float_literals;

/// The boundary mass form `∫ α u v ds` over exterior facets, for linear Lagrange elements.
///
/// On a facet with `m` vertices and measure `|F|` the local mass matrix is
/// `α |F| (1 + δ_ij) / (m (m + 1))`.
#[derive(Clone, Copy)]
pub struct RobinForm<'a, T> {
    dof_map: &'a dyn DofMap,
    alpha: T,
    domain: usize,
}

impl<'a, T: Real> RobinForm<'a, T> {
    pub fn new(dof_map: &'a dyn DofMap, alpha: T) -> Self {
        Self {
            dof_map,
            alpha,
            domain: 0,
        }
    }

    /// Restricts the facet integral to exterior facets with the given marker.
    pub fn with_domain(self, domain: usize) -> Self {
        Self { domain, ..self }
    }
}

impl<'a, T: Real> LocalFormEvaluator<T> for RobinForm<'a, T> {
    fn rank(&self) -> usize {
        2
    }

    fn dof_map(&self, _argument: usize) -> &dyn DofMap {
        self.dof_map
    }

    fn has_exterior_facet_integral(&self) -> bool {
        true
    }

    fn domain_id(&self, _integral_type: IntegralType) -> usize {
        self.domain
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn compute_exterior_facet_tensor(
        &self,
        cell: &Cell<T>,
        local_facet: usize,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        let n = cell.vertices().len();
        if output.shape() != (n, n) {
            return Err(eyre!("boundary mass requires one dof per vertex"));
        }
        let facet_vertices = cell.facet_vertices(local_facet)?;
        let area = cell.facet_area(local_facet)?;
        let m = facet_vertices.len();
        let scale = self.alpha * area / convert::<f64, T>((m * (m + 1)) as f64);
        for &a in facet_vertices {
            for &b in facet_vertices {
                let weight = if a == b { 2.0 } else { 1.0 };
                output[(a, b)] += scale * weight;
            }
        }
        Ok(())
    }
}

/// The boundary flux form `∫ g v ds` over exterior facets, lumped onto the facet vertices.
#[derive(Clone, Copy)]
pub struct BoundaryFluxForm<'a, T> {
    dof_map: &'a dyn DofMap,
    flux: T,
    domain: usize,
}

impl<'a, T: Real> BoundaryFluxForm<'a, T> {
    pub fn new(dof_map: &'a dyn DofMap, flux: T) -> Self {
        Self {
            dof_map,
            flux,
            domain: 0,
        }
    }

    pub fn with_domain(self, domain: usize) -> Self {
        Self { domain, ..self }
    }
}

impl<'a, T: Real> LocalFormEvaluator<T> for BoundaryFluxForm<'a, T> {
    fn rank(&self) -> usize {
        1
    }

    fn dof_map(&self, _argument: usize) -> &dyn DofMap {
        self.dof_map
    }

    fn has_exterior_facet_integral(&self) -> bool {
        true
    }

    fn domain_id(&self, _integral_type: IntegralType) -> usize {
        self.domain
    }

    fn compute_exterior_facet_tensor(
        &self,
        cell: &Cell<T>,
        local_facet: usize,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        if output.nrows() != cell.vertices().len() {
            return Err(eyre!("boundary flux requires one dof per vertex"));
        }
        let facet_vertices = cell.facet_vertices(local_facet)?;
        let area = cell.facet_area(local_facet)?;
        let value = self.flux * area / convert::<f64, T>(facet_vertices.len() as f64);
        for &a in facet_vertices {
            output[(a, 0)] += value;
        }
        Ok(())
    }
}

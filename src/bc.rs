//! Prescribed values for constrained degrees of freedom.
use crate::dofmap::VertexDofMap;
use crate::error::AssemblyError;
use crate::mesh::Mesh;
use crate::Real;
use itertools::{izip, Itertools};
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A map from global degree of freedom to prescribed value.
///
/// Inserting a value for a dof that is already constrained replaces the previous value, so when
/// several sources are merged into the same map, the last source wins.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryValues<T> {
    values: FxHashMap<usize, T>,
}

impl<T> Default for BoundaryValues<T> {
    fn default() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }
}

impl<T: Real> BoundaryValues<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prescribes `value` for `dof`, returning the previously prescribed value, if any.
    pub fn insert(&mut self, dof: usize, value: T) -> Option<T> {
        self.values.insert(dof, value)
    }

    pub fn get(&self, dof: usize) -> Option<T> {
        self.values.get(&dof).copied()
    }

    pub fn contains(&self, dof: usize) -> bool {
        self.values.contains_key(&dof)
    }

    /// Returns `true` if any of the given dofs is constrained.
    pub fn has_bc(&self, dofs: &[usize]) -> bool {
        !self.values.is_empty() && dofs.iter().any(|dof| self.values.contains_key(dof))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Constrained dofs and their values, sorted by dof.
    pub fn sorted_entries(&self) -> Vec<(usize, T)> {
        self.values
            .iter()
            .map(|(&dof, &value)| (dof, value))
            .sorted_unstable_by_key(|&(dof, _)| dof)
            .collect()
    }

    /// Returns an error if any constrained dof is not smaller than `dimension`.
    pub fn validate(&self, dimension: usize) -> Result<(), AssemblyError> {
        match self.values.keys().copied().filter(|&dof| dof >= dimension).min() {
            Some(dof) => Err(AssemblyError::InvalidBoundaryDof { dof, dimension }),
            None => Ok(()),
        }
    }

    /// Applies `f` to every prescribed value.
    pub fn map_values(&self, f: impl Fn(usize, T) -> T) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|(&dof, &value)| (dof, f(dof, value)))
                .collect(),
        }
    }
}

/// A source of prescribed values, such as a Dirichlet boundary condition.
pub trait ConstraintSource<T: Real>: Sync {
    /// Inserts the prescribed values of this source into `values`.
    fn populate_boundary_values(&self, values: &mut BoundaryValues<T>);
}

impl<T: Real> ConstraintSource<T> for BoundaryValues<T> {
    fn populate_boundary_values(&self, values: &mut BoundaryValues<T>) {
        for (&dof, &value) in &self.values {
            values.insert(dof, value);
        }
    }
}

/// Dirichlet condition given as a list of dofs and their prescribed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirichletBc<T> {
    dofs: Vec<usize>,
    values: Vec<T>,
}

impl<T: Real> DirichletBc<T> {
    pub fn new(dofs: Vec<usize>, values: Vec<T>) -> eyre::Result<Self> {
        if dofs.len() != values.len() {
            return Err(AssemblyError::DimensionMismatch {
                what: "Dirichlet values",
                expected: (dofs.len(), 1),
                actual: (values.len(), 1),
            }
            .into());
        }
        Ok(Self { dofs, values })
    }

    /// Constrains all the given dofs to zero.
    pub fn homogeneous(dofs: Vec<usize>) -> Self {
        let values = vec![T::zero(); dofs.len()];
        Self { dofs, values }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, T)>) -> Self {
        let (dofs, values) = pairs.into_iter().unzip();
        Self { dofs, values }
    }

    /// Prescribes `g(x, i)` for component `i` of every boundary vertex `x` of the mesh.
    pub fn on_boundary_vertices(
        mesh: &Mesh<T>,
        dof_map: &VertexDofMap,
        g: impl Fn(&Point3<T>, usize) -> T,
    ) -> Self {
        Self::on_vertices(mesh, dof_map, &mesh.find_boundary_vertices(), g)
    }

    /// Prescribes `g(x, i)` for component `i` of the given vertices.
    pub fn on_vertices(
        mesh: &Mesh<T>,
        dof_map: &VertexDofMap,
        vertices: &[usize],
        g: impl Fn(&Point3<T>, usize) -> T,
    ) -> Self {
        let sdim = dof_map.solution_dim();
        let mut dofs = Vec::with_capacity(sdim * vertices.len());
        let mut values = Vec::with_capacity(sdim * vertices.len());
        for &v in vertices {
            let x = &mesh.vertices()[v];
            for i in 0..sdim {
                dofs.push(dof_map.vertex_dof(v, i));
                values.push(g(x, i));
            }
        }
        Self { dofs, values }
    }

    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Real> ConstraintSource<T> for DirichletBc<T> {
    fn populate_boundary_values(&self, values: &mut BoundaryValues<T>) {
        for (&dof, &value) in izip!(&self.dofs, &self.values) {
            values.insert(dof, value);
        }
    }
}

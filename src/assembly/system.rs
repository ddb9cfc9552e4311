use crate::assembly::buffers::{Scratch, ScratchParts};
use crate::assembly::global::{GlobalMatrix, GlobalVector};
use crate::assembly::local::{eliminate_constraints, IntegralType, LocalFormEvaluator};
use crate::bc::{BoundaryValues, ConstraintSource};
use crate::error::AssemblyError;
use crate::geometry::CellTopology;
use crate::mesh::{AssemblyMesh, FacetAdjacency};
use crate::Real;
use eyre::WrapErr;
use log::{debug, info, log_enabled, warn, Level};
use nalgebra::{DMatrixView, DMatrixViewMut, DVector, DVectorView};
use nalgebra_sparse::CooMatrix;
use rayon::prelude::*;
use std::cell::RefCell;
use std::time::Instant;
use thread_local::ThreadLocal;

/// Subdomain markers for cells, exterior facets and interior facets.
///
/// When markers are given for a kind of entity, an integral of that kind is only evaluated on
/// entities whose marker equals the [`LocalFormEvaluator::domain_id`] of the integral. Without
/// markers, every entity is included. Facet markers are indexed by global facet index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainMarkers<'a> {
    pub cells: Option<&'a [usize]>,
    pub exterior_facets: Option<&'a [usize]>,
    pub interior_facets: Option<&'a [usize]>,
}

impl<'a> DomainMarkers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell_markers(self, markers: &'a [usize]) -> Self {
        Self {
            cells: Some(markers),
            ..self
        }
    }

    pub fn with_exterior_facet_markers(self, markers: &'a [usize]) -> Self {
        Self {
            exterior_facets: Some(markers),
            ..self
        }
    }

    pub fn with_interior_facet_markers(self, markers: &'a [usize]) -> Self {
        Self {
            interior_facets: Some(markers),
            ..self
        }
    }

    /// Uses the same facet markers for exterior and interior facets.
    pub fn with_facet_markers(self, markers: &'a [usize]) -> Self {
        self.with_exterior_facet_markers(markers)
            .with_interior_facet_markers(markers)
    }

    pub fn markers(&self, integral_type: IntegralType) -> Option<&'a [usize]> {
        match integral_type {
            IntegralType::Cell => self.cells,
            IntegralType::ExteriorFacet => self.exterior_facets,
            IntegralType::InteriorFacet => self.interior_facets,
        }
    }

    /// Whether an integral of the given type and domain is evaluated on `entity`.
    pub fn includes(&self, integral_type: IntegralType, entity: usize, domain: usize) -> bool {
        self.markers(integral_type)
            .map_or(true, |markers| markers.get(entity) == Some(&domain))
    }

    fn validate<T: Real>(&self, mesh: &dyn AssemblyMesh<T>) -> Result<(), AssemblyError> {
        let checks = [
            ("cell markers", self.cells, mesh.num_cells()),
            ("exterior facet markers", self.exterior_facets, mesh.num_facets()),
            ("interior facet markers", self.interior_facets, mesh.num_facets()),
        ];
        for (what, markers, expected) in checks {
            if let Some(markers) = markers {
                if markers.len() != expected {
                    return Err(AssemblyError::DimensionMismatch {
                        what,
                        expected: (expected, 1),
                        actual: (markers.len(), 1),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The global tensors requested from a single assembly call.
///
/// Either output may be omitted. If `x0` is given, the vector is assembled for a Newton
/// increment: constrained entries receive `g - x0` instead of the prescribed value `g`.
///
/// Global tensors are added to, so they should normally be zero before assembly.
pub struct AssemblyOutputs<'o, T: Real> {
    pub matrix: Option<&'o mut dyn GlobalMatrix<T>>,
    pub vector: Option<&'o mut dyn GlobalVector<T>>,
    pub x0: Option<DVectorView<'o, T>>,
}

impl<'o, T: Real> Default for AssemblyOutputs<'o, T> {
    fn default() -> Self {
        Self {
            matrix: None,
            vector: None,
            x0: None,
        }
    }
}

impl<'o, T: Real> AssemblyOutputs<'o, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matrix(self, matrix: &'o mut dyn GlobalMatrix<T>) -> Self {
        Self {
            matrix: Some(matrix),
            ..self
        }
    }

    pub fn with_vector(self, vector: &'o mut dyn GlobalVector<T>) -> Self {
        Self {
            vector: Some(vector),
            ..self
        }
    }

    pub fn with_x0(self, x0: impl Into<DVectorView<'o, T>>) -> Self {
        Self {
            x0: Some(x0.into()),
            ..self
        }
    }
}

/// Assembles a bilinear form `a` and a linear form `L` into a linear system `A x = b` with
/// symmetric elimination of Dirichlet conditions.
///
/// Local tensors of cells and facets are computed by the forms, constrained dofs are eliminated
/// on the local level, and the result is scattered into the global tensors. Contributions from
/// constrained columns are moved to the right-hand side, so the assembled matrix is symmetric
/// whenever `a` is. After all contributions, every constrained row of `A` is an identity row and
/// the corresponding entry of `b` holds the prescribed value.
///
/// Exterior facet integrals are evaluated together with the cell that owns the facet, and
/// interior facet integrals in a separate pass over interior facets, which is skipped entirely
/// if neither form has an interior facet integral.
pub struct SystemAssembler<'a, T: Real> {
    mesh: &'a dyn AssemblyMesh<T>,
    a: &'a dyn LocalFormEvaluator<T>,
    l: &'a dyn LocalFormEvaluator<T>,
    bcs: Vec<&'a dyn ConstraintSource<T>>,
    domains: DomainMarkers<'a>,
}

/// Per-call state shared by all assembly units.
struct Pass<'p, T: Real> {
    targets: &'p BoundaryValues<T>,
    want_matrix: bool,
    want_vector: bool,
}

/// Where scattered local tensors end up.
struct Sink<'s, T: Real> {
    matrix: Option<&'s mut dyn GlobalMatrix<T>>,
    vector: Option<&'s mut dyn GlobalVector<T>>,
}

impl<'a, T: Real> SystemAssembler<'a, T> {
    /// Creates an assembler for the given forms.
    ///
    /// Returns [`AssemblyError::IncompatibleForms`] if `a` is not bilinear, `L` is not linear,
    /// or the test spaces of `a` and `L` do not agree.
    pub fn new(
        mesh: &'a dyn AssemblyMesh<T>,
        a: &'a dyn LocalFormEvaluator<T>,
        l: &'a dyn LocalFormEvaluator<T>,
    ) -> eyre::Result<Self> {
        check_arity(mesh, a, l)?;
        Ok(Self {
            mesh,
            a,
            l,
            bcs: Vec::new(),
            domains: DomainMarkers::default(),
        })
    }

    pub fn with_bc(mut self, bc: &'a dyn ConstraintSource<T>) -> Self {
        self.bcs.push(bc);
        self
    }

    /// Adds several constraint sources. Later sources override earlier ones on shared dofs.
    pub fn with_bcs(mut self, bcs: impl IntoIterator<Item = &'a dyn ConstraintSource<T>>) -> Self {
        self.bcs.extend(bcs);
        self
    }

    pub fn with_domains(mut self, domains: DomainMarkers<'a>) -> Self {
        self.domains = domains;
        self
    }

    pub fn mesh(&self) -> &'a dyn AssemblyMesh<T> {
        self.mesh
    }

    /// Merges all constraint sources, in the order they were added.
    pub fn boundary_values(&self) -> eyre::Result<BoundaryValues<T>> {
        let mut values = BoundaryValues::new();
        for bc in &self.bcs {
            bc.populate_boundary_values(&mut values);
        }
        values.validate(self.a.dof_map(0).global_dimension())?;
        values.validate(self.a.dof_map(1).global_dimension())?;
        Ok(values)
    }

    pub fn assemble_system(
        &self,
        matrix: &mut dyn GlobalMatrix<T>,
        vector: &mut dyn GlobalVector<T>,
    ) -> eyre::Result<()> {
        self.assemble(AssemblyOutputs::new().with_matrix(matrix).with_vector(vector))
    }

    pub fn assemble_matrix(&self, matrix: &mut dyn GlobalMatrix<T>) -> eyre::Result<()> {
        self.assemble(AssemblyOutputs::new().with_matrix(matrix))
    }

    pub fn assemble_vector(&self, vector: &mut dyn GlobalVector<T>) -> eyre::Result<()> {
        self.assemble(AssemblyOutputs::new().with_vector(vector))
    }

    /// Assembles the system for the Newton increment around the current iterate `x0`.
    pub fn assemble_system_increment<'x>(
        &self,
        matrix: &mut dyn GlobalMatrix<T>,
        vector: &mut dyn GlobalVector<T>,
        x0: impl Into<DVectorView<'x, T>>,
    ) -> eyre::Result<()> {
        let x0 = x0.into();
        self.assemble(
            AssemblyOutputs::new()
                .with_matrix(matrix)
                .with_vector(vector)
                .with_x0(x0),
        )
    }

    /// Assembles only the right-hand side of the Newton increment around `x0`.
    pub fn assemble_vector_increment<'x>(
        &self,
        vector: &mut dyn GlobalVector<T>,
        x0: impl Into<DVectorView<'x, T>>,
    ) -> eyre::Result<()> {
        let x0 = x0.into();
        self.assemble(AssemblyOutputs::new().with_vector(vector).with_x0(x0))
    }

    /// Assembles the requested outputs on the current thread.
    pub fn assemble(&self, outputs: AssemblyOutputs<T>) -> eyre::Result<()> {
        let AssemblyOutputs { matrix, vector, x0 } = outputs;
        let targets = self.prepare(matrix.as_deref(), vector.as_deref(), x0)?;
        let pass = Pass {
            targets: &targets,
            want_matrix: matrix.is_some(),
            want_vector: vector.is_some(),
        };
        let mut sink = Sink { matrix, vector };
        let mut scratch = Scratch::default();

        let timer = Instant::now();
        for cell in 0..self.mesh.num_cells() {
            self.assemble_cell(&pass, &mut scratch, &mut sink, cell)?;
        }
        info!(
            "Assembled {} cells in {:.2?}",
            self.mesh.num_cells(),
            timer.elapsed()
        );

        if self.has_interior_facet_integrals() {
            let timer = Instant::now();
            let mut count = 0;
            for facet in 0..self.mesh.num_facets() {
                if let FacetAdjacency::Interior { cells, local_facets } =
                    self.mesh.facet_adjacency(facet)
                {
                    self.assemble_interior_facet(
                        &pass,
                        &mut scratch,
                        &mut sink,
                        facet,
                        cells,
                        local_facets,
                    )?;
                    count += 1;
                }
            }
            info!("Assembled {} interior facets in {:.2?}", count, timer.elapsed());
        }

        self.add_identity(&pass, &mut sink)
    }

    /// Assembles the requested outputs in parallel.
    ///
    /// Cells and interior facets are distributed over the rayon thread pool. Every worker
    /// accumulates into private buffers, which are merged and finally scattered into the
    /// outputs on the calling thread. The result equals that of [`SystemAssembler::assemble`]
    /// up to floating point round-off from the different summation order.
    pub fn par_assemble(&self, outputs: AssemblyOutputs<T>) -> eyre::Result<()> {
        let AssemblyOutputs { matrix, vector, x0 } = outputs;
        let targets = self.prepare(matrix.as_deref(), vector.as_deref(), x0)?;
        let pass = Pass {
            targets: &targets,
            want_matrix: matrix.is_some(),
            want_vector: vector.is_some(),
        };
        let rows = self.a.dof_map(0).global_dimension();
        let cols = self.a.dof_map(1).global_dimension();
        let scratch: ThreadLocal<RefCell<Scratch<T>>> = ThreadLocal::new();
        let new_worker = || WorkerOutput::new(pass.want_matrix, pass.want_vector, rows, cols);

        let timer = Instant::now();
        let mut merged = (0..self.mesh.num_cells())
            .into_par_iter()
            .with_min_len(64)
            .try_fold(new_worker, |mut worker, cell| -> eyre::Result<_> {
                let mut scratch = scratch.get_or_default().borrow_mut();
                self.assemble_cell(&pass, &mut scratch, &mut worker.sink(), cell)?;
                Ok(worker)
            })
            .try_reduce(new_worker, |a, b| Ok(a.merge(b)))?;
        info!(
            "Assembled {} cells in parallel in {:.2?}",
            self.mesh.num_cells(),
            timer.elapsed()
        );

        if self.has_interior_facet_integrals() {
            let timer = Instant::now();
            let interior_facets: Vec<_> = (0..self.mesh.num_facets())
                .filter_map(|facet| match self.mesh.facet_adjacency(facet) {
                    FacetAdjacency::Interior { cells, local_facets } => {
                        Some((facet, cells, local_facets))
                    }
                    FacetAdjacency::Exterior { .. } => None,
                })
                .collect();
            let facet_output = interior_facets
                .par_iter()
                .with_min_len(64)
                .try_fold(
                    new_worker,
                    |mut worker, &(facet, cells, local_facets)| -> eyre::Result<_> {
                        let mut scratch = scratch.get_or_default().borrow_mut();
                        self.assemble_interior_facet(
                            &pass,
                            &mut scratch,
                            &mut worker.sink(),
                            facet,
                            cells,
                            local_facets,
                        )?;
                        Ok(worker)
                    },
                )
                .try_reduce(new_worker, |a, b| Ok(a.merge(b)))?;
            merged = merged.merge(facet_output);
            info!(
                "Assembled {} interior facets in parallel in {:.2?}",
                interior_facets.len(),
                timer.elapsed()
            );
        }

        let mut sink = Sink { matrix, vector };
        merged.scatter_into(&mut sink)?;
        self.add_identity(&pass, &mut sink)
    }

    /// Validates the outputs and computes the values that constrained dofs are eliminated with.
    fn prepare(
        &self,
        matrix: Option<&dyn GlobalMatrix<T>>,
        vector: Option<&dyn GlobalVector<T>>,
        x0: Option<DVectorView<T>>,
    ) -> eyre::Result<BoundaryValues<T>> {
        let rows = self.a.dof_map(0).global_dimension();
        let cols = self.a.dof_map(1).global_dimension();
        if let Some(matrix) = matrix {
            if (matrix.nrows(), matrix.ncols()) != (rows, cols) {
                return Err(AssemblyError::DimensionMismatch {
                    what: "global matrix",
                    expected: (rows, cols),
                    actual: (matrix.nrows(), matrix.ncols()),
                }
                .into());
            }
        }
        if let Some(vector) = vector {
            if vector.len() != rows {
                return Err(AssemblyError::DimensionMismatch {
                    what: "global vector",
                    expected: (rows, 1),
                    actual: (vector.len(), 1),
                }
                .into());
            }
        }
        if let Some(x0) = &x0 {
            if x0.len() != rows {
                return Err(AssemblyError::DimensionMismatch {
                    what: "x0",
                    expected: (rows, 1),
                    actual: (x0.len(), 1),
                }
                .into());
            }
        }
        self.domains.validate(self.mesh)?;

        if self.mesh.num_cells() == 0 {
            warn!("Assembling over a mesh without cells");
        }
        debug!(
            "Assembling {}{} over {} cells of type {} with {} constraint source(s)",
            match (matrix.is_some(), vector.is_some()) {
                (true, true) => "matrix and vector",
                (true, false) => "matrix",
                (false, true) => "vector",
                (false, false) => "nothing",
            },
            if x0.is_some() { " (Newton increment)" } else { "" },
            self.mesh.num_cells(),
            self.mesh.cell_type().description(self.mesh.num_cells() != 1),
            self.bcs.len()
        );

        let values = self.boundary_values()?;
        if !values.is_empty() && log_enabled!(Level::Warn) {
            let untouched = self.count_untouched(&values);
            if untouched > 0 {
                warn!(
                    "{} of {} constrained dofs are not attached to any cell",
                    untouched,
                    values.len()
                );
            }
        }

        Ok(match x0 {
            Some(x0) => values.map_values(|dof, value| value - x0[dof]),
            None => values,
        })
    }

    fn count_untouched(&self, values: &BoundaryValues<T>) -> usize {
        let test = self.a.dof_map(0);
        let mut touched = vec![false; test.global_dimension()];
        let mut dofs = Vec::new();
        for cell in 0..self.mesh.num_cells() {
            dofs.resize(test.cell_dof_count(cell), 0);
            test.populate_cell_dofs(&mut dofs, cell);
            for &dof in &dofs {
                if let Some(flag) = touched.get_mut(dof) {
                    *flag = true;
                }
            }
        }
        values
            .sorted_entries()
            .iter()
            .filter(|(dof, _)| !touched.get(*dof).copied().unwrap_or(false))
            .count()
    }

    fn has_interior_facet_integrals(&self) -> bool {
        self.a.has_interior_facet_integral() || self.l.has_interior_facet_integral()
    }

    fn includes(&self, form: &dyn LocalFormEvaluator<T>, integral_type: IntegralType, entity: usize) -> bool {
        form.has_integral(integral_type)
            && self
                .domains
                .includes(integral_type, entity, form.domain_id(integral_type))
    }

    /// Whether `form` is evaluated on the facet with local index `local_facet` of `cell`.
    fn includes_exterior_facet(&self, form: &dyn LocalFormEvaluator<T>, cell: usize, local_facet: usize) -> bool {
        let facet = self.mesh.cell_facets(cell)[local_facet];
        form.has_exterior_facet_integral()
            && self.mesh.facet_adjacency(facet).is_exterior()
            && self.domains.includes(
                IntegralType::ExteriorFacet,
                facet,
                form.domain_id(IntegralType::ExteriorFacet),
            )
    }

    fn has_exterior_facets(&self, form: &dyn LocalFormEvaluator<T>, cell: usize) -> bool {
        form.has_exterior_facet_integral()
            && (0..self.mesh.cell_facets(cell).len())
                .any(|local_facet| self.includes_exterior_facet(form, cell, local_facet))
    }

    /// Assembles the cell integrals of `cell` together with the integrals over its exterior facets.
    fn assemble_cell(
        &self,
        pass: &Pass<T>,
        scratch: &mut Scratch<T>,
        sink: &mut Sink<T>,
        cell: usize,
    ) -> eyre::Result<()> {
        let (a, l) = (self.a, self.l);
        let a_cell = self.includes(a, IntegralType::Cell, cell);
        let a_facets = self.has_exterior_facets(a, cell);
        let l_cell = pass.want_vector && self.includes(l, IntegralType::Cell, cell);
        let l_facets = pass.want_vector && self.has_exterior_facets(l, cell);
        if !(a_cell || a_facets || l_cell || l_facets) {
            return Ok(());
        }

        scratch.init_cell(self.mesh, a, cell);
        let has_bc = pass.targets.has_bc(scratch.test_dofs()) || pass.targets.has_bc(scratch.trial_dofs());
        let compute_matrix = (a_cell || a_facets) && (pass.want_matrix || has_bc);
        let compute_vector = l_cell || l_facets;
        if !compute_matrix && !compute_vector {
            return Ok(());
        }

        let num_facets = self.mesh.cell_facets(cell).len();
        let parts = scratch.split_mut(self.mesh);
        let view = &parts.cells[0];
        if compute_matrix {
            if a_cell {
                a.compute_cell_tensor(view, DMatrixViewMut::from(&mut *parts.matrix))
                    .wrap_err_with(|| format!("failed to compute cell tensor of a on cell {cell}"))?;
            }
            for local_facet in 0..num_facets {
                if !a_facets || !self.includes_exterior_facet(a, cell, local_facet) {
                    continue;
                }
                a.compute_exterior_facet_tensor(view, local_facet, DMatrixViewMut::from(&mut *parts.matrix))
                    .wrap_err_with(|| format!("failed to compute facet tensor of a on cell {cell}"))?;
            }
        }
        if compute_vector {
            if l_cell {
                l.compute_cell_tensor(view, DMatrixViewMut::from(&mut *parts.vector))
                    .wrap_err_with(|| format!("failed to compute cell tensor of L on cell {cell}"))?;
            }
            for local_facet in 0..num_facets {
                if !l_facets || !self.includes_exterior_facet(l, cell, local_facet) {
                    continue;
                }
                l.compute_exterior_facet_tensor(view, local_facet, DMatrixViewMut::from(&mut *parts.vector))
                    .wrap_err_with(|| format!("failed to compute facet tensor of L on cell {cell}"))?;
            }
        }

        let scatter_vector = pass.want_vector && (compute_vector || (compute_matrix && has_bc));
        scatter(pass, parts, sink, compute_matrix, scatter_vector)
    }

    fn assemble_interior_facet(
        &self,
        pass: &Pass<T>,
        scratch: &mut Scratch<T>,
        sink: &mut Sink<T>,
        facet: usize,
        cells: [usize; 2],
        local_facets: [usize; 2],
    ) -> eyre::Result<()> {
        let (a, l) = (self.a, self.l);
        let a_facet = self.includes(a, IntegralType::InteriorFacet, facet);
        let l_facet = pass.want_vector && self.includes(l, IntegralType::InteriorFacet, facet);
        if !a_facet && !l_facet {
            return Ok(());
        }

        scratch.init_interior_facet(self.mesh, a, cells);
        let has_bc = pass.targets.has_bc(scratch.test_dofs()) || pass.targets.has_bc(scratch.trial_dofs());
        let compute_matrix = a_facet && (pass.want_matrix || has_bc);
        if !compute_matrix && !l_facet {
            return Ok(());
        }

        let parts = scratch.split_mut(self.mesh);
        let views = [&parts.cells[0], &parts.cells[1]];
        if compute_matrix {
            a.compute_interior_facet_tensor(views, local_facets, DMatrixViewMut::from(&mut *parts.matrix))
                .wrap_err_with(|| format!("failed to compute interior facet tensor of a on facet {facet}"))?;
        }
        if l_facet {
            l.compute_interior_facet_tensor(views, local_facets, DMatrixViewMut::from(&mut *parts.vector))
                .wrap_err_with(|| format!("failed to compute interior facet tensor of L on facet {facet}"))?;
        }

        let scatter_vector = pass.want_vector && (l_facet || (compute_matrix && has_bc));
        scatter(pass, parts, sink, compute_matrix, scatter_vector)
    }

    /// Gives every constrained dof an identity row and its target value on the right-hand side.
    ///
    /// Local elimination leaves zeros on the diagonal of constrained rows, so this is the only
    /// contribution to those rows.
    fn add_identity(&self, pass: &Pass<T>, sink: &mut Sink<T>) -> eyre::Result<()> {
        for (dof, target) in pass.targets.sorted_entries() {
            if let Some(matrix) = sink.matrix.as_deref_mut() {
                matrix.add_entry(dof, dof, T::one())?;
            }
            if let Some(vector) = sink.vector.as_deref_mut() {
                vector.add_entry(dof, target)?;
            }
        }
        Ok(())
    }
}

/// Eliminates the constrained dofs of the current unit and scatters the local tensors.
fn scatter<T: Real>(
    pass: &Pass<T>,
    parts: ScratchParts<T>,
    sink: &mut Sink<T>,
    compute_matrix: bool,
    scatter_vector: bool,
) -> eyre::Result<()> {
    let ScratchParts {
        matrix,
        vector,
        test_dofs,
        trial_dofs,
        ..
    } = parts;

    let local_matrix = if compute_matrix {
        Some(DMatrixViewMut::from(&mut *matrix))
    } else {
        None
    };
    let local_vector = if scatter_vector {
        Some(vector.column_mut(0))
    } else {
        None
    };
    eliminate_constraints(local_matrix, local_vector, test_dofs, trial_dofs, pass.targets, T::zero());

    if compute_matrix && pass.want_matrix {
        if let Some(global) = sink.matrix.as_deref_mut() {
            global.add_local(test_dofs, trial_dofs, DMatrixView::from(&*matrix))?;
        }
    }
    if scatter_vector {
        if let Some(global) = sink.vector.as_deref_mut() {
            global.add_local(test_dofs, vector.column(0))?;
        }
    }
    Ok(())
}

/// Private accumulation buffers of a parallel worker.
struct WorkerOutput<T: Real> {
    matrix: Option<CooMatrix<T>>,
    vector: Option<DVector<T>>,
}

impl<T: Real> WorkerOutput<T> {
    fn new(want_matrix: bool, want_vector: bool, rows: usize, cols: usize) -> Self {
        Self {
            matrix: want_matrix.then(|| CooMatrix::new(rows, cols)),
            vector: want_vector.then(|| DVector::zeros(rows)),
        }
    }

    fn sink(&mut self) -> Sink<'_, T> {
        Sink {
            matrix: self
                .matrix
                .as_mut()
                .map(|matrix| matrix as &mut dyn GlobalMatrix<T>),
            vector: self
                .vector
                .as_mut()
                .map(|vector| vector as &mut dyn GlobalVector<T>),
        }
    }

    fn merge(mut self, other: Self) -> Self {
        if let (Some(matrix), Some(other)) = (self.matrix.as_mut(), other.matrix) {
            for (i, j, &v) in other.triplet_iter() {
                matrix.push(i, j, v);
            }
        }
        if let (Some(vector), Some(other)) = (self.vector.as_mut(), other.vector) {
            *vector += other;
        }
        self
    }

    fn scatter_into(self, sink: &mut Sink<T>) -> eyre::Result<()> {
        if let (Some(coo), Some(global)) = (self.matrix, sink.matrix.as_deref_mut()) {
            for (i, j, &v) in coo.triplet_iter() {
                global.add_entry(i, j, v)?;
            }
        }
        if let (Some(local), Some(global)) = (self.vector, sink.vector.as_deref_mut()) {
            for (i, &v) in local.iter().enumerate() {
                global.add_entry(i, v)?;
            }
        }
        Ok(())
    }
}

fn check_arity<T: Real>(
    mesh: &dyn AssemblyMesh<T>,
    a: &dyn LocalFormEvaluator<T>,
    l: &dyn LocalFormEvaluator<T>,
) -> Result<(), AssemblyError> {
    if a.rank() != 2 {
        return Err(AssemblyError::IncompatibleForms(format!(
            "expected a bilinear form of rank 2, got a form of rank {}",
            a.rank()
        )));
    }
    if l.rank() != 1 {
        return Err(AssemblyError::IncompatibleForms(format!(
            "expected a linear form of rank 1, got a form of rank {}",
            l.rank()
        )));
    }

    let a_test = a.dof_map(0);
    let l_test = l.dof_map(0);
    if a_test.global_dimension() != l_test.global_dimension() {
        return Err(AssemblyError::IncompatibleForms(format!(
            "test spaces have different dimensions: {} for a and {} for L",
            a_test.global_dimension(),
            l_test.global_dimension()
        )));
    }
    for (name, dof_map) in [
        ("test space of a", a_test),
        ("trial space of a", a.dof_map(1)),
        ("test space of L", l_test),
    ] {
        if dof_map.num_cells() != mesh.num_cells() {
            return Err(AssemblyError::IncompatibleForms(format!(
                "{name} is defined on {} cells, but the mesh has {} cells",
                dof_map.num_cells(),
                mesh.num_cells()
            )));
        }
    }

    let mut a_dofs = Vec::new();
    let mut l_dofs = Vec::new();
    for cell in 0..mesh.num_cells() {
        a_dofs.resize(a_test.cell_dof_count(cell), 0);
        a_test.populate_cell_dofs(&mut a_dofs, cell);
        l_dofs.resize(l_test.cell_dof_count(cell), 0);
        l_test.populate_cell_dofs(&mut l_dofs, cell);
        if a_dofs != l_dofs {
            return Err(AssemblyError::IncompatibleForms(format!(
                "test spaces of a and L have different dofs on cell {cell}"
            )));
        }
    }
    Ok(())
}

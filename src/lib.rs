//! Finite element system assembly with symmetric application of Dirichlet boundary conditions.
//!
//! The central type is [`assembly::SystemAssembler`], which assembles a bilinear form `a` and a
//! linear form `L` into a global matrix and vector. Dirichlet conditions are eliminated from every
//! local element tensor before it is scattered, so that the assembled matrix stays symmetric
//! whenever the unconstrained local tensors are symmetric.
//!
//! The assembler only talks to its collaborators through traits:
//!
//! - [`mesh::AssemblyMesh`] for cells, vertex coordinates and facet adjacency,
//! - [`dofmap::DofMap`] for the local-to-global numbering of degrees of freedom,
//! - [`assembly::local::LocalFormEvaluator`] for the local element tensors of a form,
//! - [`bc::ConstraintSource`] for prescribed values of constrained degrees of freedom,
//! - [`assembly::global::GlobalMatrix`] and [`assembly::global::GlobalVector`] for the outputs.
//!
//! Reference implementations of all of them are provided, so that simple problems can be
//! assembled end to end.
pub mod assembly;
pub mod bc;
pub mod dofmap;
pub mod error;
pub mod mesh;

pub mod geometry {
    pub use sysasm_geometry::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use sysasm_traits::Real;

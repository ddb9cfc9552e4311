//! Assembly of local element tensors into global systems.
//!
//! [`SystemAssembler`] drives the traversal of cells and interior facets, asks the
//! [`local::LocalFormEvaluator`] of each form for local tensors, eliminates constrained degrees
//! of freedom with [`local::eliminate_constraints`] and scatters the result into
//! [`global::GlobalMatrix`] and [`global::GlobalVector`] implementations.
pub mod buffers;
pub mod global;
pub mod local;

mod system;

pub use system::*;

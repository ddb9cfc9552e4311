mod interval;
mod quadrilateral;
mod tetrahedron;
mod triangle;

pub use interval::*;
pub use quadrilateral::*;
pub use tetrahedron::*;
pub use triangle::*;

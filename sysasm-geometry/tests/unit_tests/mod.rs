mod quadrilateral;
mod tetrahedron;

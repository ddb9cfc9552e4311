use nalgebra::RealField;

pub use nalgebra;

/// Real scalar type used throughout `sysasm`.
///
/// `nalgebra`'s `RealField` is not `Copy`, which makes generic numerical code needlessly
/// noisy, so we require it here.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

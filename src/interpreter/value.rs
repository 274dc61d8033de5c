/// The runtime value union and the multi-valued return adapter.
pub mod core;
/// Immutable character strings with their original quote style.
pub mod chars;
/// The transcendental routines of the numeric kernel.
pub mod kernel;
/// N-dimensional arrays with MATLAB-style indexing and broadcasting.
pub mod multiarray;
/// The arbitrary-precision extended real and the kernel context.
pub mod real;
/// Arbitrary-precision complex scalars and their closed operation set.
pub mod scalar;
/// Named-field structures with path access.
pub mod structure;

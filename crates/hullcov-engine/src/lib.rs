//! hullcov engine crate.
//!
//! Generates analytic antialiased coverage shaders for quadratic Bézier
//! segments: emits shader IR per phase, assembles a WGSL module with its wgpu
//! interface, and evaluates the same IR on the CPU for inspection.

pub mod backend;
pub mod config;
pub mod coords;
pub mod logging;
pub mod probe;
pub mod program;
pub mod shader;

pub use config::EmitConfig;
pub use program::CurveProgram;

//! Analysis pipeline: run the external tool once per pass, salvage structure
//! from whatever text comes back, then normalize the result.

pub mod bands;
pub mod extract;
pub mod normalize;
pub mod orchestrator;
pub mod passes;
pub mod runner;

pub use normalize::normalize;
pub use orchestrator::Orchestrator;
pub use passes::Pass;
pub use runner::{PassRunner, ToolRunner};

// Library crate for integration tests.
// main.rs drives the CLI through these modules.

pub mod analysis;
pub mod api;
pub mod commands;
pub mod config;
pub mod doctor;
pub mod error;
pub mod local_llm;
pub mod preflight;
pub mod render;
pub mod report;
pub mod settings;
pub mod setup;
pub mod subscription;

//! Command handlers. Each handler delegates to the composed `CliContext`.

pub mod config;
pub mod download;
pub mod paths;
pub mod preset;
pub mod register;
pub mod status;

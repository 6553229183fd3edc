//! # attendance-reports
//!
//! Binary-side crate: configuration loading, concrete adapters for the
//! collaborator traits of `attendance-reports-core`, and the CLI.
//!
//! - [`load_config`]: YAML config plus environment secrets
//! - [`document_store`]: JSON-file `DataStore` and `ReportLedger`
//! - [`storage`]: local-disk and Supabase `ArtifactStore`s
//! - [`cli`]: argument parsing and the `run` entrypoint
pub mod cli;
pub mod document_store;
pub mod load_config;
pub mod storage;

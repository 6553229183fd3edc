#![doc = "attendance-reports-core: domain model, collaborator contracts and the report pipeline."]

//! This crate holds everything that does not depend on a concrete storage backend:
//! typed student/attendance/report records, the traits the pipeline talks to,
//! summary statistics, document rendering and the report composer.
//!
//! # Usage
//! Construct a [`composer::ReportComposer`] (and a [`roster::Roster`] for the
//! record plumbing) with concrete [`contract`] implementations. The binary crate
//! provides file-backed and Supabase adapters; tests use the generated mocks.

pub mod composer;
pub mod contract;
pub mod documents;
pub mod error;
pub mod model;
pub mod render;
pub mod roster;
pub mod summary;

pub use composer::{ReportComposer, ReportRequest};
pub use error::ReportError;
pub use roster::{DashboardStats, Roster};

//! `gridfill` library crate.
//!
//! The binary (`gridfill`) is a thin wrapper around this library so that:
//!
//! - the fetch/assembly pipeline is testable offline through `SampleSource`
//! - artifact writers and the inspector can be reused without the CLI

pub mod app;
pub mod assemble;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod registry;
pub mod report;

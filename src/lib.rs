//! gpuwatch - live GPU telemetry dashboard library.
//!
//! This library provides the core functionality behind the `gpuwatch` binary:
//! - `collector` - telemetry acquisition backends behind a common interface
//! - `history` - bounded rolling metric history feeding trend sparklines
//! - `tui` - the interactive full-screen dashboard

pub mod collector;
pub mod fmt;
pub mod history;
pub mod tui;

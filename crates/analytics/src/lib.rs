//! # Analytics Engine
//!
//! Derives performance metrics from the histories a backtest run produces.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** This crate depends only on `core-types`. It has no
//!   knowledge of providers, configuration or the simulator.
//! - **Stateless Calculation:** The `AnalyticsEngine` takes the value and
//!   transaction rows as input and produces a `PerformanceReport`. Inputs are
//!   borrowed and never modified.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The main struct that contains the calculation logic.
//! - `PerformanceReport`: The standardized struct that holds the metrics.
//! - `percentage_returns`: Period-over-period returns of a value history.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;
pub mod returns;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::PerformanceReport;
pub use returns::percentage_returns;

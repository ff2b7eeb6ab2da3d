//! Shared test fixtures for Tessera crates.
//!
//! - [`nqueens`] - N-Queens with a from-scratch and an incremental calculator
//! - [`task`] - Grouped task assignment with an additive score and a
//!   group partitioner
//!
//! Every fixture exposes its planning variable as plain functions
//! (entity count, value count, getter, setter) so that solver tests can wire
//! them into basic-variable phases.
//!
//! ```toml
//! [dev-dependencies]
//! tessera-test = { workspace = true }
//! ```

pub mod nqueens;
pub mod task;

pub use nqueens::{NQueens, NQueensCalculator, Queen};
pub use task::{Task, TaskCalculator, TaskPlan};

//! Tessera Core - score and domain types shared by every Tessera crate
//!
//! This crate provides the fundamental abstractions:
//! - Score types for representing solution quality
//! - The `PlanningSolution` trait implemented by problem models
//! - The error type propagated by directors, phases and the solver

pub mod domain;
pub mod error;
pub mod score;

pub use domain::PlanningSolution;
pub use error::{Result, TesseraError};
pub use score::{
    HardMediumSoftScore, HardSoftScore, ParseableScore, Score, ScoreParseError, SimpleScore,
};

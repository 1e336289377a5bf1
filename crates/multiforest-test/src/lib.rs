//! Shared test fixtures for Multiforest crates.
//!
//! This crate provides small panels and objective definitions with known
//! optima, plus float assertions.
//!
//! - [`scenario`] - The three-stand, two-regime, two-period panel
//! - [`forest`] - A richer panel with species, peat and deadwood attributes
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! multiforest-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use multiforest_test::scenario::{three_stand_panel, sum_volume};
//! use multiforest_test::assert_close;
//! ```

pub mod forest;
pub mod scenario;

pub use scenario::{sum_volume, three_stand_panel};

/// Absolute tolerance used by [`assert_close`].
pub const TOLERANCE: f64 = 1e-6;

/// Asserts that two floats agree up to [`TOLERANCE`] scaled by magnitude.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= TOLERANCE * scale,
        "expected {expected}, got {actual}"
    );
}

/// Asserts `actual ≥ expected` up to [`TOLERANCE`].
#[track_caller]
pub fn assert_at_least(actual: f64, expected: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        actual >= expected - TOLERANCE * scale,
        "expected at least {expected}, got {actual}"
    );
}

/// Asserts `actual ≤ expected` up to [`TOLERANCE`].
#[track_caller]
pub fn assert_at_most(actual: f64, expected: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        actual <= expected + TOLERANCE * scale,
        "expected at most {expected}, got {actual}"
    );
}

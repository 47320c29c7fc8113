//! # Wasita Support
//!
//! Shared helpers for the Wasita container crates.
//!
//! This crate provides:
//! - Rendering of resolution chains and type names for diagnostics
//! - "Did you mean?" matching for missing registrations

pub mod rendering;

//! # Wirebox Support
//!
//! Shared helpers for the Wirebox crates.
//!
//! This crate provides:
//! - Rendering of resolution chains for error messages
//! - Short type names and "did you mean?" suggestions

pub mod rendering;

//! Test utilities shared across gateway crates.
//!
//! Provides throwaway signing keys, a fluent token builder, and snapshot
//! configuration builders so tests can assemble realistic gateway state
//! without duplicating fixture plumbing.
//!
//! Test-only crate. Never ship these keys anywhere near production.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod crypto_fixtures;
pub mod snapshot_builders;
pub mod token_builders;

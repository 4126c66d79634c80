//! Shared utilities for the edge gateway.
//!
//! This crate holds the pure, I/O-free pieces of token handling that both
//! the gateway service and its test utilities depend on:
//!
//! - Structural JWT parsing (three base64url segments, size-limited)
//! - Unverified claim peeking for trust-store key selection
//! - Temporal claim checks with bounded clock-skew tolerance

pub mod jwt;

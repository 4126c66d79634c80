//! Edge gateway for the HR platform.
//!
//! A single authenticated front door for the platform's HTTP APIs:
//! verifies JWTs against a declarative issuer trust store, applies
//! fixed-window rate limits, matches routes by longest path prefix, and
//! forwards to upstream services with verified identity headers attached.
//!
//! Library crate so integration tests can build the router in-process; the
//! binary entry point lives in `main.rs`.

pub mod admission;
pub mod auth;
pub mod config;
pub mod cors;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod proxy;
pub mod routes;
pub mod snapshot;
pub mod trust;

//! Consolidated integration tests for authware.
//!
//! A single test binary keeps link time down as the suite grows.

mod decoding;
mod support;
mod transport;

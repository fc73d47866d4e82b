//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing and framing checks.

pub mod framing;
pub mod trace;

pub use framing::RejectAmbiguousFraming;
pub use trace::Trace;

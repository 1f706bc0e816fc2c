//! Library surface for the intake gate binary, split out so integration
//! tests can drive the HTTP router directly.

pub mod http;
pub mod state;

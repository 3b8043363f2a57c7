//! HTTP transport for the GWEN workspace backend.

pub mod http_backend;

pub use http_backend::HttpWorkspaceBackend;

//! Transport layer for the identity storage SDK.

pub mod http;

pub use http::HttpTransport;

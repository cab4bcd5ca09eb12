//! API modules of the identity store.

pub mod claims;

pub use claims::{ClaimDto, ClaimsApi, ClaimsInfoDto};

//! Adapters for the domain ports.

pub mod authn;
pub mod crypto;
pub mod driver;
pub mod storage;

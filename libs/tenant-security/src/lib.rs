//! Security primitives carried through every tenant-scoped operation.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod context;
pub mod secret_string;

pub use context::SecurityContext;
pub use secret_string::SecretString;

pub mod descriptor;
pub mod directive;
pub mod error;
pub mod ident;
pub mod ports;
pub mod registry;
pub mod service;
pub mod translator;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

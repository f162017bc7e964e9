#![forbid(unsafe_code)]

mod credentials;
pub mod error;
mod provider;

pub use credentials::*;
pub use provider::*;

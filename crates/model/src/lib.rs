//! Provider-neutral types for talking to chat models.
//!
//! The agent only speaks the types defined here. Each provider crate
//! translates them into its own wire format, so the agent loop never
//! has to know which backend it is driving.
//!
//! Nothing in this crate performs I/O. The traits describe what a
//! provider must offer; the provider crates do the actual work.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;
mod secret;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use secret::Masked;

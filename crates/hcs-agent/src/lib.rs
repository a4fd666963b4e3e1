//! A conversational agent that can create consensus topics and submit
//! messages to them on Hedera.
//!
//! The crate ships a CLI for use in the terminal. The pieces it is built
//! from are exposed as a library as well, so the agent can be embedded in
//! other hosts or driven with a different [`Ledger`](ledger::Ledger).

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod ledger;
pub mod llm;
pub mod prompt;
mod session;
pub mod tools;

pub use session::{DEFAULT_THREAD_ID, Session, SessionBuilder};

/// Re-exports of [`hcs_agent_core`] crate.
pub mod core {
    pub use hcs_agent_core::*;
}

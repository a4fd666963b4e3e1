//! Core logic including the agent loop, tool execution and conversation
//! checkpointing.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod checkpoint;
pub mod conversation;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentReply, DEFAULT_RECURSION_LIMIT, Error,
};
pub use model_client::TranscriptFn;

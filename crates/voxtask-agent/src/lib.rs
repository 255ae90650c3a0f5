//! # Voxtask Agent
//!
//! The functions a real-time voice agent calls while talking to a user:
//! `createTask`, `listTasks` and `createCategory`. Each one validates its
//! arguments, may ask a chat-completion model to classify the request, and
//! persists through [`voxtask_core`].
//!
//! - [`functions`]: the named, schema-described functions and their registry
//! - [`workflows`]: what each function does
//! - [`assistant`]: category, priority and style suggestions
//! - [`completion`]: the chat-completions client
//! - [`session`]: per-participant context
//! - [`bridge`]: line-delimited JSON transport for the voice framework
//! - [`config`]: layered configuration

pub mod assistant;
pub mod bridge;
pub mod completion;
pub mod config;
pub mod error;
pub mod functions;
pub mod parser;
pub mod session;
pub mod workflows;

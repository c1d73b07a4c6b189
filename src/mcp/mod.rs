//! MCP (Model Context Protocol) server module.
//!
//! Exposes the CodeGraph analyses as MCP tools over a JSON-RPC 2.0 STDIO
//! interface for AI agents.

pub mod server;
pub mod tools;
pub mod types;

pub use tools::{classify_failure, FailureKind, Operation, ToolFacade, ToolRegistration};

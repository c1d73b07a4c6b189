//! Request dispatcher: talks LSP to the external CodeGraph engine.
//!
//! - [`codec`] handles JSON-RPC framing (`Content-Length: N\r\n\r\n{json}`)
//! - [`client`] owns the server process and multiplexes requests
//! - [`engine`] maps each analysis capability to a remote procedure
//! - [`cancel`] carries per-call cancellation

pub mod cancel;
pub mod client;
pub mod codec;
pub mod engine;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use client::LspClient;
pub use engine::{AnalysisEngine, LspEngine};

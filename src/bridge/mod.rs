//! Playwright backend
//!
//! Browser automation runs in a small Node.js driver speaking
//! Content-Length framed JSON over stdio, one driver per session.

pub mod client;
pub mod codec;
pub mod protocol;
pub mod session;

pub use client::BridgeClient;
pub use session::{PlaywrightLauncher, PlaywrightSession};

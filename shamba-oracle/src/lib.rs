mod error;
pub use error::*;
mod retry;
pub use retry::*;
mod backend;
pub use backend::*;
mod client;
pub use client::*;
pub mod gemini;
pub use gemini::GeminiBackend;

pub use tokio_util::sync::CancellationToken;

//! HTTP chat transport: session lifecycle, multipart uploads, bearer auth, and health.

mod error;
mod handlers;
mod router;
mod server;
mod sessions;

pub use error::GatewayError;
pub use server::GatewayServer;

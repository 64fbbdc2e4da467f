//! # LoamDB Server
//!
//! The request-handling surface for LoamDB.
//!
//! This crate provides:
//! - [`RequestHandler`] - Typed dispatch of client requests onto a platform
//! - [`Server`] - A thin JSON-lines TCP transport around the handler
//! - [`protocol`] - The wire request and response messages
//!
//! The transport is intentionally minimal; every rule (key validation,
//! constraint checks, queueing) lives in `loamdb_core` and is reachable
//! through the handler without any networking.

mod config;
mod error;
mod handler;
pub mod protocol;
mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use handler::RequestHandler;
pub use protocol::{Request, Response};
pub use server::Server;

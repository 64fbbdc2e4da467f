//! Serve command implementation.

use loamdb_core::{Config, Consumer, Platform};
use loamdb_server::{RequestHandler, Server, ServerConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

/// Runs the serve command: opens the platform, starts the write consumer,
/// and blocks on the TCP server.
pub fn run(
    path: &Path,
    bind: SocketAddr,
    in_memory: bool,
    flush_on_write: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new()
        .in_memory(in_memory)
        .flush_on_write(flush_on_write);
    let platform = Arc::new(Platform::open(path, config)?);

    let consumer = Consumer::spawn(Arc::clone(&platform));
    let server = Server::new(ServerConfig::new(bind), RequestHandler::new(Arc::clone(&platform)));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(server.run());

    consumer.shutdown();
    platform.flush()?;
    result?;
    Ok(())
}

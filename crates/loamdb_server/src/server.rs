//! TCP front end.
//!
//! The transport is deliberately thin: one JSON request per line, one JSON
//! response per line. All semantics live in [`RequestHandler`].

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::handler::RequestHandler;
use crate::protocol::{Request, Response};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

/// The LoamDB server: a TCP listener feeding a [`RequestHandler`].
pub struct Server {
    config: ServerConfig,
    handler: RequestHandler,
}

impl Server {
    /// Creates a server from a configuration and handler.
    #[must_use]
    pub fn new(config: ServerConfig, handler: RequestHandler) -> Self {
        Self { config, handler }
    }

    /// Binds the configured address and serves connections until the task is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn run(self) -> ApiResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.run_on(listener).await
    }

    /// Serves connections on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails.
    pub async fn run_on(self, listener: TcpListener) -> ApiResult<()> {
        let local = listener.local_addr()?;
        tracing::info!(%local, "server listening");

        let limit = Arc::new(Semaphore::new(self.config.max_connections));
        let handler = Arc::new(self.handler);
        let max_request_bytes = self.config.max_request_bytes;

        loop {
            let (stream, peer) = listener.accept().await?;
            let Ok(permit) = Arc::clone(&limit).acquire_owned().await else {
                break;
            };
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(err) = serve_connection(stream, &handler, max_request_bytes).await {
                    tracing::debug!(%peer, %err, "connection closed with error");
                }
            });
        }
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    handler: &Arc<RequestHandler>,
    max_request_bytes: usize,
) -> ApiResult<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = if line.len() > max_request_bytes {
            Response::from_error(&ApiError::InvalidRequest(format!(
                "request exceeds {max_request_bytes} bytes"
            )))
        } else {
            match serde_json::from_str::<Request>(&line) {
                Ok(request) => {
                    // The platform's locks and file I/O are blocking
                    let handler = Arc::clone(handler);
                    tokio::task::spawn_blocking(move || handler.handle(request))
                        .await
                        .unwrap_or_else(|_| {
                            Response::from_error(&ApiError::Internal(
                                "request task failed".to_string(),
                            ))
                        })
                }
                Err(err) => Response::from_error(&ApiError::InvalidRequest(err.to_string())),
            }
        };

        let mut payload = serde_json::to_vec(&response)
            .map_err(|err| ApiError::Internal(err.to_string()))?;
        payload.push(b'\n');
        write_half.write_all(&payload).await?;
    }
    Ok(())
}

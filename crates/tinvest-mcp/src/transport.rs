//! Stdio and HTTP carriers for [`McpServer`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::protocol::McpServer;

/// Newline-delimited JSON-RPC over stdin/stdout.
pub async fn serve_stdio(server: Arc<McpServer>, cancel: CancellationToken) -> anyhow::Result<()> {
    info!("Serving MCP over stdio");
    serve_lines(
        server,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        cancel,
    )
    .await?;
    info!("Stdio transport stopped");
    Ok(())
}

/// Serve newline-delimited JSON-RPC from `reader` to `writer`.
///
/// Requests are handled concurrently; a single writer task owns `writer` so
/// responses never interleave. Returns on EOF or cancellation. If the writer
/// fails, reading stops at once and the write error is returned.
pub async fn serve_lines<R, W>(
    server: Arc<McpServer>,
    reader: R,
    mut writer: W,
    cancel: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let mut write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = reader.lines();

    let stopped_early = loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break None,
            done = &mut write_task => break Some(done),
            line = lines.next_line() => line.context("Failed to read request")?,
        };
        let Some(line) = line else {
            debug!("Input closed");
            break None;
        };
        if line.trim().is_empty() {
            continue;
        }

        let server = Arc::clone(&server);
        let tx = tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let Some(response) = server.handle_raw(&line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(out) => {
                    if tx.send(out).await.is_err() {
                        cancel.cancel();
                    }
                }
                Err(e) => error!(error = %e, "Failed to encode response"),
            }
        });
    };

    // The writer drains once every in-flight request has dropped its sender.
    drop(tx);
    let done = match stopped_early {
        Some(done) => {
            warn!("Response writer stopped; no longer reading requests");
            done
        }
        None => write_task.await,
    };
    done.context("Response writer panicked")?
        .context("Failed to write response")?;
    Ok(())
}

pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .with_state(server)
}

/// JSON-RPC over `POST /mcp` until `cancel` fires.
pub async fn serve_http(
    server: Arc<McpServer>,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Serving MCP over HTTP");

    axum::serve(listener, router(server))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .context("HTTP server failed")?;

    info!("HTTP transport stopped");
    Ok(())
}

async fn mcp_handler(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_raw(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

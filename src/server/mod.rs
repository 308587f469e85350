//! HTTP front end.
//!
//! ```text
//! GET /list?link=<url>&path=<dir>&page=&per_page=&cascade=
//! GET /get?link=<url>&path=<file>
//! GET /down?link=<url>&path=<file>        (honours Range)
//! ```
//!
//! Every answer except a download body is a JSON envelope
//! `{code, message, data}`; see [`response`].

mod handlers;
pub mod params;
pub mod range;
pub mod response;

use anyhow::Result;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::cli::ServerConfig;
use params::Params;
use response::Body;

/// Bind `config.addr` and serve until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };
    serve(listener, Arc::new(config), shutdown).await
}

/// Accept connections on `listener` until `shutdown` completes.
///
/// Each connection is served on its own task; connections still open at
/// shutdown are left to finish on their own.
pub async fn serve(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!("accept failed: {err}");
                    continue;
                }
            },
            _ = &mut shutdown => return Ok(()),
        };

        let config = config.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| handle(req, config.clone()));
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(%peer, "connection closed: {err}");
            }
        });
    }
}

async fn handle(
    req: Request<Incoming>,
    config: Arc<ServerConfig>,
) -> Result<Response<Body>, Infallible> {
    let span = tracing::info_span!("request", method = %req.method(), uri = %req.uri());
    Ok(dispatch(req, &config).instrument(span).await)
}

async fn dispatch(req: Request<Incoming>, config: &ServerConfig) -> Response<Body> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    if !matches!(path.as_str(), "/list" | "/get" | "/down") {
        return response::failure(StatusCode::NOT_FOUND, "not found", StatusCode::OK);
    }

    let result = match Params::from_request(&parts, body).await {
        Ok(params) => match path.as_str() {
            "/list" => handlers::list(config, &parts.headers, &params).await,
            "/get" => handlers::get(config, &parts.headers, &params).await,
            _ => handlers::down(config, &parts.headers, &params).await,
        },
        Err(err) => Err(err),
    };

    result.unwrap_or_else(|err| {
        tracing::warn!(status = %err.status(), detail = %err.detail(), "request failed");
        response::error(&err)
    })
}

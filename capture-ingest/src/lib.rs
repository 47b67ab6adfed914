pub mod capture;
pub mod config;
pub mod errors;
pub mod github;
pub mod handler;
pub mod http;
pub mod rate_limit;

use crate::errors::IngestError;
use crate::github::GithubClient;
use crate::handler::IngestHandler;
use crate::http::{HandlerBody, text_response};
use crate::rate_limit::HttpRateLimiter;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builds the collaborators from config and serves the ingestion endpoint
/// until the process is stopped.
pub async fn run(config: config::Config) -> Result<(), IngestError> {
    let rate_limiter = Arc::new(HttpRateLimiter::new(config.rate_limiter.url.clone()));
    let tracker = Arc::new(GithubClient::new(&config.github)?);
    let handler = Arc::new(IngestHandler::new(
        config.client_ip_header.clone(),
        rate_limiter,
        tracker,
    ));

    let listener =
        TcpListener::bind(format!("{}:{}", config.listener.host, config.listener.port)).await?;
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        repo = %config.github.repo,
        "capture ingest listening"
    );

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let service = IngestService {
            handler: handler.clone(),
        };

        // Hand the connection to hyper; auto-detect h1/h2 on this socket
        tokio::spawn(async move {
            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                tracing::debug!(peer = %peer_addr, error = %e, "connection ended with error");
            }
        });
    }
}

/// Hyper service wrapping the handler.
///
/// The handler already converts everything a caller can act on into a final
/// response; whatever error still escapes is mapped to a 502/500 fallback
/// here so no request ends without a response.
struct IngestService {
    handler: Arc<IngestHandler>,
}

impl Service<Request<Incoming>> for IngestService {
    type Response = Response<HandlerBody>;
    type Error = IngestError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();
        Box::pin(async move {
            match handler.handle(req).await {
                Ok(response) => Ok(response),
                Err(e @ IngestError::UpstreamRequestFailed(_)) => {
                    tracing::error!(error = %e, "upstream call failed");
                    text_response(StatusCode::BAD_GATEWAY, "Bad Gateway")
                }
                Err(e) => {
                    tracing::error!(error = %e, "request handling failed");
                    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                }
            }
        })
    }
}

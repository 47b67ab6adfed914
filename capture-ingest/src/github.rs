use crate::capture::IssueSubmission;
use crate::config::GithubConfig;
use crate::errors::IngestError;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use url::Url;

/// Identifying user-agent sent with every tracker call.
pub const SERVICE_USER_AGENT: &str = "thinkless-ingest";

/// External collaborator that persists a capture as a trackable work item.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Creates one issue. A non-success upstream status surfaces as
    /// [`IngestError::UpstreamRejected`] carrying the raw response text.
    async fn create_issue(&self, submission: &IssueSubmission) -> Result<(), IngestError>;
}

/// GitHub Issues API client for a single configured repository.
pub struct GithubClient {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, IngestError> {
        let endpoint = Url::parse(&format!(
            "{}/repos/{}/issues",
            config.api_base.as_str().trim_end_matches('/'),
            config.repo
        ))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn create_issue(&self, submission: &IssueSubmission) -> Result<(), IngestError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(USER_AGENT, SERVICE_USER_AGENT)
            .json(submission)
            .send()
            .await
            .map_err(|e| IngestError::UpstreamRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Pass the upstream body through untouched; callers treat it as opaque.
            let detail = response
                .text()
                .await
                .map_err(|e| IngestError::UpstreamRequestFailed(e.to_string()))?;
            return Err(IngestError::UpstreamRejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use std::convert::Infallible;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    #[derive(Debug)]
    struct CapturedRequest {
        method: String,
        path: String,
        authorization: Option<String>,
        user_agent: Option<String>,
        content_type: Option<String>,
        body: Bytes,
    }

    async fn start_stub_tracker(
        status: StatusCode,
        reply: &'static str,
    ) -> (u16, mpsc::UnboundedReceiver<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = hyper_util::rt::TokioIo::new(stream);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let tx = tx.clone();
                        async move {
                            let header = |name: &str| {
                                req.headers()
                                    .get(name)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string)
                            };
                            let captured = CapturedRequest {
                                method: req.method().to_string(),
                                path: req.uri().path().to_string(),
                                authorization: header("authorization"),
                                user_agent: header("user-agent"),
                                content_type: header("content-type"),
                                body: req.into_body().collect().await.unwrap().to_bytes(),
                            };
                            let _ = tx.send(captured);

                            let mut res = Response::new(Full::new(Bytes::from_static(
                                reply.as_bytes(),
                            )));
                            *res.status_mut() = status;
                            Ok::<_, Infallible>(res)
                        }
                    });
                    let _ = hyper_util::server::conn::auto::Builder::new(
                        hyper_util::rt::TokioExecutor::new(),
                    )
                    .serve_connection(io, service)
                    .await;
                });
            }
        });

        (port, rx)
    }

    fn client_for_port(port: u16) -> GithubClient {
        let config = GithubConfig {
            repo: "acme/captures".to_string(),
            token: "ghp_test".to_string(),
            api_base: Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        };
        GithubClient::new(&config).unwrap()
    }

    fn submission() -> IssueSubmission {
        IssueSubmission {
            title: "[capture] it crashes".to_string(),
            body: "details".to_string(),
            labels: vec!["capture/pending".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_issue_sends_authenticated_post() {
        let (port, mut rx) = start_stub_tracker(StatusCode::CREATED, r#"{"number":1}"#).await;
        let client = client_for_port(port);

        client.create_issue(&submission()).await.unwrap();

        let captured = rx.recv().await.unwrap();
        assert_eq!(captured.method, "POST");
        assert_eq!(captured.path, "/repos/acme/captures/issues");
        assert_eq!(captured.authorization.as_deref(), Some("Bearer ghp_test"));
        assert_eq!(captured.user_agent.as_deref(), Some(SERVICE_USER_AGENT));
        assert_eq!(captured.content_type.as_deref(), Some("application/json"));

        let sent: serde_json::Value = serde_json::from_slice(&captured.body).unwrap();
        assert_eq!(
            sent.get("title").unwrap().as_str().unwrap(),
            "[capture] it crashes"
        );
        assert_eq!(
            sent.get("labels").unwrap(),
            &serde_json::json!(["capture/pending"])
        );
    }

    #[tokio::test]
    async fn test_non_success_status_carries_raw_detail() {
        let (port, _rx) =
            start_stub_tracker(StatusCode::INTERNAL_SERVER_ERROR, "server error").await;
        let client = client_for_port(port);

        let err = client.create_issue(&submission()).await.unwrap_err();
        match err {
            IngestError::UpstreamRejected { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "server error");
            }
            other => panic!("expected UpstreamRejected, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_tracker_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client_for_port(port);
        let err = client.create_issue(&submission()).await.unwrap_err();
        assert!(matches!(err, IngestError::UpstreamRequestFailed(_)));
    }
}

use crate::errors::IngestError;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use serde::Serialize;

pub type HandlerBody = BoxBody<Bytes, IngestError>;

/// Builds a plain-text response.
pub fn text_response(
    status: StatusCode,
    text: &'static str,
) -> Result<Response<HandlerBody>, IngestError> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(text.as_bytes())).map_err(|e| match e {}).boxed())
        .map_err(|e| IngestError::InternalError(format!("Failed to build response: {e}")))
}

/// Serializes a value to JSON and wraps it in a response with the given status.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response<HandlerBody>, IngestError> {
    let bytes = serde_json::to_vec(value).map(Bytes::from)?;
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(bytes).map_err(|e| match e {}).boxed())
        .map_err(|e| IngestError::InternalError(format!("Failed to build response: {e}")))
}

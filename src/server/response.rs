//! JSON envelopes and response bodies.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::archive::Entry;
use crate::error::Error;

/// Body type of every response the server produces.
pub type Body = UnsyncBoxBody<Bytes, std::io::Error>;

pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// `{code, message, data}` wrapper around every JSON answer.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

/// One archive entry as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjResp {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub modified: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub name_in_archive: String,
    pub link_target: String,
}

impl From<&Entry> for ObjResp {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name().to_string(),
            size: entry.size,
            is_dir: entry.is_dir,
            modified: entry.modified,
            created: entry.modified,
            name_in_archive: entry.name_in_archive.clone(),
            link_target: entry.link_target.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResp {
    pub content: Vec<ObjResp>,
    pub total: usize,
}

fn json<T: Serialize>(status: StatusCode, envelope: &Envelope<T>) -> Response<Body> {
    match serde_json::to_vec(envelope) {
        Ok(body) => {
            let mut response = Response::new(full(body));
            *response.status_mut() = status;
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
            response
        }
        Err(err) => {
            tracing::error!("failed to encode response: {err}");
            let mut response = Response::new(full(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// `code: 200, message: "success"` with `data`.
pub fn success<T: Serialize>(data: T) -> Response<Body> {
    json(
        StatusCode::OK,
        &Envelope {
            code: StatusCode::OK.as_u16(),
            message: "success".to_string(),
            data,
        },
    )
}

/// An envelope carrying `code` and `message` with no data.
///
/// Sent with HTTP status 200 unless `transport` says otherwise.
pub fn failure(
    code: StatusCode,
    message: impl Into<String>,
    transport: StatusCode,
) -> Response<Body> {
    json(
        transport,
        &Envelope {
            code: code.as_u16(),
            message: message.into(),
            data: None::<()>,
        },
    )
}

/// Envelope for a failed request.
///
/// The code lives in the body; only an unsatisfiable range also changes the
/// HTTP status line.
pub fn error(err: &Error) -> Response<Body> {
    let transport = match err {
        Error::RangeNotSatisfiable(_) => err.status(),
        _ => StatusCode::OK,
    };
    failure(err.status(), err.to_string(), transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_wraps_data() {
        let response = success(ListResp {
            content: vec![],
            total: 0,
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"code": 200, "message": "success", "data": {"content": [], "total": 0}})
        );
    }

    #[tokio::test]
    async fn errors_keep_http_200_except_bad_ranges() {
        let response = error(&Error::BadRequest("link is required".into()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"code": 400, "message": "link is required", "data": null})
        );

        let response = error(&Error::RangeNotSatisfiable("bad range".into()));
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(body_json(response).await["code"], 416);
    }

    #[test]
    fn entries_render_base_names() {
        let obj = ObjResp::from(&Entry::named("docs/guide/"));
        assert_eq!(obj.name, "guide");
        assert_eq!(obj.name_in_archive, "docs/guide/");
        assert!(obj.is_dir);
        assert_eq!(obj.created, obj.modified);
    }
}

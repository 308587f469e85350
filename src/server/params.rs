//! Request parameter binding.
//!
//! Parameters come from the query string. Form-encoded bodies of other
//! methods are merged on top, body values winning.

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::http::request::Parts;
use hyper::Method;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Largest form body accepted.
const MAX_FORM_SIZE: usize = 64 * 1024;

#[derive(Debug, Default, Clone)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Params::default();
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params.0.entry(key.into_owned()).or_insert(value.into_owned());
            }
        }
        params
    }

    pub fn merge_form(&mut self, body: &[u8]) {
        for (key, value) in url::form_urlencoded::parse(body) {
            self.0.insert(key.into_owned(), value.into_owned());
        }
    }

    /// Bind the query string and, where applicable, a form body.
    pub async fn from_request(parts: &Parts, body: Incoming) -> Result<Self> {
        let mut params = Self::from_query(parts.uri.query());

        let is_form = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
        if parts.method != Method::GET && is_form {
            let body: Bytes = Limited::new(body, MAX_FORM_SIZE)
                .collect()
                .await
                .map_err(|err| Error::BadRequest(format!("unreadable form body: {err}")))?
                .to_bytes();
            params.merge_form(&body);
        }

        Ok(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(Error::BadRequest(format!("{key} is required"))),
        }
    }

    fn int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            None | Some("") => Ok(0),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| Error::BadRequest(format!("invalid {key}: {value}"))),
        }
    }

    fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None | Some("") => Ok(false),
            Some("1" | "t" | "T" | "TRUE" | "true" | "True") => Ok(true),
            Some("0" | "f" | "F" | "FALSE" | "false" | "False") => Ok(false),
            Some(value) => Err(Error::BadRequest(format!("invalid {key}: {value}"))),
        }
    }
}

/// Parameters of `/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReq {
    pub link: String,
    pub path: String,
    pub page: i64,
    pub per_page: i64,
    pub cascade: bool,
}

impl ListReq {
    pub fn bind(params: &Params) -> Result<Self> {
        Ok(Self {
            link: params.required("link")?,
            path: params.get("path").unwrap_or_default().to_string(),
            page: params.int("page")?,
            per_page: params.int("per_page")?,
            cascade: params.flag("cascade")?,
        })
    }
}

/// Parameters of `/get` and `/down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetReq {
    pub link: String,
    pub path: String,
}

impl GetReq {
    pub fn bind(params: &Params) -> Result<Self> {
        Ok(Self {
            link: params.required("link")?,
            path: params.get("path").unwrap_or_default().to_string(),
        })
    }
}

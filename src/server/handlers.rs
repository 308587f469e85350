//! The `/list`, `/get` and `/down` endpoints.
//!
//! Each request opens its archive afresh, answers, and drops it again.

use hyper::header::{COOKIE, HeaderMap, RANGE, USER_AGENT};
use hyper::Response;
use std::sync::Arc;

use super::params::{GetReq, ListReq, Params};
use super::range;
use super::response::{self, Body, ListResp, ObjResp};
use crate::archive::ArchiveHandle;
use crate::cli::ServerConfig;
use crate::error::{Error, Result};
use crate::io::{self, RemoteOptions, RemoteSource};
use crate::page::paginate;
use crate::path::resolve;

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Open `link` as an archive, forwarding the caller's cookie and user agent.
async fn open_archive(
    config: &ServerConfig,
    headers: &HeaderMap,
    link: &str,
) -> Result<(ArchiveHandle<RemoteSource>, Arc<RemoteSource>)> {
    let options = RemoteOptions {
        cookie: header_string(headers, COOKIE),
        user_agent: header_string(headers, USER_AGENT),
        timeout: config.remote_timeout,
    };
    let source = Arc::new(
        io::open_remote(link, options, config.window_size)
            .await
            .map_err(Error::RemoteFetch)?,
    );
    let archive = ArchiveHandle::open(link, source.clone()).await?;
    Ok((archive, source))
}

fn log_transfer(source: &RemoteSource) {
    tracing::debug!(
        bytes = source.get_ref().get_ref().transferred_bytes(),
        "fetched from remote"
    );
}

/// List the children of a directory, or its whole subtree with `cascade`.
pub async fn list(
    config: &ServerConfig,
    headers: &HeaderMap,
    params: &Params,
) -> Result<Response<Body>> {
    let req = ListReq::bind(params)?;
    let dir = resolve(&req.path, true)?;
    let (archive, source) = open_archive(config, headers, &req.link).await?;

    let entries = if req.cascade {
        archive.cascade_extract_dirs(&dir).await?
    } else {
        archive.extract_dirs(&dir).await?
    };
    log_transfer(&source);

    let objects: Vec<ObjResp> = entries.iter().map(ObjResp::from).collect();
    let (total, content) = paginate(objects, req.page, req.per_page);
    tracing::info!(%dir, cascade = req.cascade, total, "listed directory");
    Ok(response::success(ListResp { content, total }))
}

/// Metadata of a single file.
pub async fn get(
    config: &ServerConfig,
    headers: &HeaderMap,
    params: &Params,
) -> Result<Response<Body>> {
    let req = GetReq::bind(params)?;
    let path = resolve(&req.path, false)?;
    let (archive, source) = open_archive(config, headers, &req.link).await?;

    let entry = archive.extract_file(&path).await?;
    log_transfer(&source);
    Ok(response::success(ObjResp::from(&entry)))
}

/// Stream a file's contents, honouring a single `Range`.
pub async fn down(
    config: &ServerConfig,
    headers: &HeaderMap,
    params: &Params,
) -> Result<Response<Body>> {
    let req = GetReq::bind(params)?;
    let path = resolve(&req.path, false)?;
    let (archive, _source) = open_archive(config, headers, &req.link).await?;

    let entry = archive.extract_file(&path).await?;
    let requested = headers
        .get(RANGE)
        .map(|value| value.to_str().unwrap_or_default());
    tracing::info!(%path, size = entry.size, range = ?requested, "downloading entry");
    range::stream_entry(&archive, &entry, requested).await
}

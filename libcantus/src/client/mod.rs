//! HTTP client for the Docker Registry v2 API.
//!
//! Every method issues exactly one logical request for one [`RepoCommand`];
//! retries live in [`crate::retry`]. Failures are classified here: 5xx and
//! transport errors come back as the transient [`CantusError::Server`] and
//! [`CantusError::Network`], everything else as a terminal error.

use crate::digest::Digest;
use crate::error::{CantusError, Result};
use crate::manifest::{ImageConfigDocument, MANIFEST_ACCEPT, ManifestEnvelope};
use crate::reference::RepoCommand;
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, LINK};
use reqwest::{Body, Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;


const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";
const DOCKER_UPLOAD_UUID: &str = "Docker-Upload-UUID";

/// Response from the tags list API endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libcantus::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Longest a request may go without receiving data, in seconds (default: 30).
    /// There is no whole-request limit here; see [`crate::retry::RetryPolicy`].
    pub timeout_seconds: u64,
    /// Connect timeout in seconds (default: 30)
    pub connect_timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            connect_timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

impl From<&crate::config::Network> for ClientConfig {
    fn from(network: &crate::config::Network) -> Self {
        Self {
            timeout_seconds: network.timeout,
            connect_timeout_seconds: network.connect_timeout,
            max_idle_per_host: network.max_idle_per_host,
        }
    }
}

/// HTTP client for registry operations.
///
/// One instance (and its connection pool) is shared by every registry and
/// every concurrent task; cloning is cheap.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: ReqwestClient,
    timeout_seconds: u64,
}

impl Client {
    /// Creates a client with default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::client::Client;
    ///
    /// let client = Client::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .read_timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| CantusError::unexpected_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Fetches the manifest for `cmd`'s tag, preferring schema 2.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `cmd` has no tag
    /// - `ProtocolViolation` if `Content-Type` or `Docker-Content-Digest` is
    ///   missing, or the body does not parse
    /// - `SourceSystem` for an unsupported media type
    pub async fn get_manifest(&self, cmd: &RepoCommand) -> Result<ManifestEnvelope> {
        let tag = cmd.require_tag("Manifest lookup")?;
        let url = format!("{}/{}/manifests/{}", cmd.base_url(), cmd.repo_path(), tag);
        debug!("Retrieving type=manifest url={}", url);

        let response = self
            .send(cmd, self.http_client.get(&url).header(ACCEPT, MANIFEST_ACCEPT))
            .await?;

        let content_type = header_value(response.headers(), CONTENT_TYPE.as_str())
            .ok_or_else(|| {
                CantusError::protocol_violation(
                    cmd.registry(),
                    "Manifest response is missing Content-Type",
                )
            })?;
        let content_digest = header_value(response.headers(), DOCKER_CONTENT_DIGEST)
            .ok_or_else(|| {
                CantusError::protocol_violation(
                    cmd.registry(),
                    "Manifest response is missing Docker-Content-Digest",
                )
            })?;

        let raw = read_bytes(response, cmd).await?;
        ManifestEnvelope::parse(cmd.registry(), &content_type, &content_digest, raw)
    }

    /// Fetches every tag of `cmd`'s repository, following `Link` pagination.
    ///
    /// An empty or absent tag list is `NotFound`.
    pub async fn get_tags(&self, cmd: &RepoCommand) -> Result<Vec<String>> {
        let mut all_tags = Vec::new();
        let mut url = format!("{}/{}/tags/list", cmd.base_url(), cmd.repo_path());

        loop {
            debug!("Retrieving type=tags url={}", url);
            let response = self.send(cmd, self.http_client.get(&url)).await?;

            let next_path = extract_next_link(response.headers());

            let body = read_bytes(response, cmd).await?;
            let tags: TagsResponse = serde_json::from_slice(&body).map_err(|e| {
                CantusError::protocol_violation(
                    cmd.registry(),
                    format!("Failed to parse tags response: {}", e),
                )
            })?;
            all_tags.extend(tags.tags.unwrap_or_default());

            match next_path {
                Some(path) => url = resolve_link(&cmd.base_url(), &path),
                None => break,
            }
        }

        if all_tags.is_empty() {
            return Err(CantusError::not_found("tags", cmd.qualified_repo()));
        }
        Ok(all_tags)
    }

    /// Downloads a blob and verifies it against `digest`.
    pub async fn get_blob(&self, cmd: &RepoCommand, digest: &Digest) -> Result<Bytes> {
        let url = blob_url(cmd, digest);
        debug!("Retrieving type=blob url={}", url);

        let response = self.send(cmd, self.http_client.get(&url)).await?;
        let data = read_bytes(response, cmd).await?;

        if digest.verify(&data) == Some(false) {
            return Err(CantusError::protocol_violation(
                cmd.registry(),
                format!("Blob content does not match digest {}", digest),
            ));
        }
        Ok(data)
    }

    /// Downloads a config blob and parses it.
    pub async fn get_config_blob(
        &self,
        cmd: &RepoCommand,
        digest: &Digest,
    ) -> Result<ImageConfigDocument> {
        let data = self.get_blob(cmd, digest).await?;
        serde_json::from_slice(&data).map_err(|e| {
            CantusError::protocol_violation(
                cmd.registry(),
                format!("Config blob {} is not a valid document: {}", digest, e),
            )
        })
    }

    /// Checks whether `cmd`'s repository already holds `digest`.
    ///
    /// 2xx is `true` and 404 is `false`. Any other status is an error, never
    /// `false`.
    pub async fn blob_exists(&self, cmd: &RepoCommand, digest: &Digest) -> Result<bool> {
        let url = blob_url(cmd, digest);
        debug!("Checking type=blob url={}", url);

        let response = self
            .execute(cmd, self.http_client.head(&url))
            .await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => check_response_status(response, cmd).await.map(|_| false),
        }
    }

    /// Opens an upload session and returns its id.
    pub async fn initiate_upload(&self, cmd: &RepoCommand) -> Result<String> {
        let url = format!("{}/{}/blobs/uploads/", cmd.base_url(), cmd.repo_path());
        debug!("Initiating upload url={}", url);

        let response = self
            .send(cmd, self.http_client.post(&url).body(Vec::new()))
            .await?;

        header_value(response.headers(), DOCKER_UPLOAD_UUID).ok_or_else(|| {
            CantusError::protocol_violation(
                cmd.registry(),
                "Upload response is missing Docker-Upload-UUID",
            )
        })
    }

    /// Completes an upload session with the full blob.
    pub async fn upload_blob(
        &self,
        cmd: &RepoCommand,
        session: &str,
        digest: &Digest,
        data: Bytes,
    ) -> Result<()> {
        debug!("Uploading blob {} to={}", digest, cmd.qualified_repo());
        self.complete_upload(cmd, session, digest, Body::from(data), None)
            .await
    }

    /// Completes an upload session at `to` with the blob streamed from `from`.
    ///
    /// Nothing is buffered. The destination checks the content against the
    /// `digest` query parameter, so a corrupt source body fails the PUT.
    pub async fn transfer_blob(
        &self,
        from: &RepoCommand,
        to: &RepoCommand,
        session: &str,
        digest: &Digest,
    ) -> Result<()> {
        let source_url = blob_url(from, digest);
        debug!("Streaming blob {} from={} to={}", digest, source_url, to.qualified_repo());

        let response = self.send(from, self.http_client.get(&source_url)).await?;
        let length = response.content_length();
        let body = Body::wrap_stream(response.bytes_stream());

        self.complete_upload(to, session, digest, body, length).await
    }

    /// PUTs `body` to the session, with the digest for server-side verification.
    async fn complete_upload(
        &self,
        cmd: &RepoCommand,
        session: &str,
        digest: &Digest,
        body: Body,
        length: Option<u64>,
    ) -> Result<()> {
        let url = upload_url(cmd, session);
        let digest = digest.to_string();
        let mut request = self
            .http_client
            .put(&url)
            .query(&[("digest", digest.as_str())])
            .header(CONTENT_TYPE, "application/octet-stream");
        if let Some(length) = length {
            request = request.header(CONTENT_LENGTH, length);
        }

        self.send(cmd, request.body(body)).await.map(|_| ())
    }

    /// Pushes a manifest with its original content type and bytes.
    pub async fn put_manifest(&self, cmd: &RepoCommand, envelope: &ManifestEnvelope) -> Result<()> {
        let tag = cmd.require_tag("Manifest push")?;
        let url = format!("{}/{}/manifests/{}", cmd.base_url(), cmd.repo_path(), tag);
        debug!("Pushing manifest {} url={}", envelope.content_digest, url);

        let request = self
            .http_client
            .put(&url)
            .header(CONTENT_TYPE, envelope.content_type.as_str())
            .body(envelope.raw.clone());

        self.send(cmd, request).await.map(|_| ())
    }

    /// Sends a request and classifies a non-2xx status.
    async fn send(&self, cmd: &RepoCommand, request: RequestBuilder) -> Result<Response> {
        let response = self.execute(cmd, request).await?;
        check_response_status(response, cmd).await
    }

    /// Sends a request with the command's credentials, status left unchecked.
    async fn execute(&self, cmd: &RepoCommand, request: RequestBuilder) -> Result<Response> {
        let request = match cmd.authorization() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e, cmd.registry()))
    }

    fn translate_reqwest_error(&self, error: reqwest::Error, registry: &str) -> CantusError {
        if error.is_timeout() {
            CantusError::network_with_source(
                format!(
                    "Request to {} received no data for {} seconds",
                    registry, self.timeout_seconds
                ),
                error,
            )
        } else if error.is_connect() {
            CantusError::network_with_source(
                format!("Failed to connect to registry at {}", registry),
                error,
            )
        } else {
            CantusError::network_with_source(
                format!("Network error communicating with {}", registry),
                error,
            )
        }
    }
}

fn blob_url(cmd: &RepoCommand, digest: &Digest) -> String {
    format!("{}/{}/blobs/{}", cmd.base_url(), cmd.repo_path(), digest)
}

fn upload_url(cmd: &RepoCommand, session: &str) -> String {
    format!(
        "{}/{}/blobs/uploads/{}",
        cmd.base_url(),
        cmd.repo_path(),
        session
    )
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn read_bytes(response: Response, cmd: &RepoCommand) -> Result<Bytes> {
    response.bytes().await.map_err(|e| {
        CantusError::network_with_source(
            format!("Failed to read response body from {}", cmd.registry()),
            e,
        )
    })
}

/// Extracts the next page from a `Link: <...>; rel="next"` header.
fn extract_next_link(headers: &HeaderMap) -> Option<String> {
    let link_str = headers.get(LINK)?.to_str().ok()?;

    for link_part in link_str.split(',') {
        let link_part = link_part.trim();

        if (link_part.contains("rel=\"next\"") || link_part.contains("rel=next"))
            && let Some(start) = link_part.find('<')
            && let Some(end) = link_part.find('>')
            && start < end
        {
            return Some(link_part[start + 1..end].to_string());
        }
    }

    None
}

/// Link targets are either absolute URLs or paths starting at `/v2/`.
fn resolve_link(base_url: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    let root = base_url.trim_end_matches("/v2");
    format!("{}{}", root, link)
}

/// Maps a non-2xx response to a classified error.
async fn check_response_status(response: Response, cmd: &RepoCommand) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(unable to read response body)"));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CantusError::auth_required(
            cmd.registry(),
            format!("status={} url={}", status.as_u16(), url),
        )),
        StatusCode::NOT_FOUND => Err(CantusError::not_found("resource", url)),
        s if s.is_server_error() => Err(CantusError::server(
            format!("url={} body={}", url, error_body),
            s.as_u16(),
        )),
        s => Err(CantusError::source_system_status(
            cmd.registry(),
            format!("status={} url={} body={}", s.as_u16(), url, error_body),
            s.as_u16(),
        )),
    }
}

//! HTTP transport to the daemon
//!
//! `unix://` hosts get a hyper HTTP/1.1 connection over the socket, one
//! connection per request. `tcp://` and http(s) hosts go through reqwest.

use super::api::{ContainerApi, CreateResult, CREATE_PATH};
use crate::config::ClientConfig;
use crate::container::ContainerSpec;
use crate::error::{PouchError, Result};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::UnixStream;
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("pouch/", env!("CARGO_PKG_VERSION"));

/// Where the daemon listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Unix domain socket
    Unix(PathBuf),
    /// HTTP base URL
    Http(Url),
}

impl Endpoint {
    /// Parse a `--host` value
    pub fn parse(host: &str) -> Result<Self> {
        if let Some(path) = host.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(PouchError::Config(format!("missing socket path in '{}'", host)));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }

        let url = if let Some(addr) = host.strip_prefix("tcp://") {
            format!("http://{}", addr)
        } else if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            return Err(PouchError::Config(format!(
                "unsupported daemon host '{}', expected unix://, tcp://, http:// or https://",
                host
            )));
        };

        let url = Url::parse(&url)
            .map_err(|e| PouchError::Config(format!("invalid daemon host '{}': {}", host, e)))?;
        Ok(Endpoint::Http(url))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Http(url) => write!(f, "{}", url),
        }
    }
}

/// Error body sent by the daemon
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Daemon client
pub struct DaemonClient {
    endpoint: Endpoint,
    /// Base for request URLs; a placeholder host for Unix sockets
    base: Url,
    timeout: Duration,
    http: reqwest::Client,
}

impl DaemonClient {
    /// Create a client for an endpoint
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        let base = match &endpoint {
            Endpoint::Http(url) => url.clone(),
            Endpoint::Unix(_) => Url::parse("http://localhost")
                .map_err(|e| PouchError::Config(e.to_string()))?,
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| PouchError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            base,
            timeout,
            http,
        })
    }

    /// Create a client from the resolved client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(Endpoint::parse(&config.host)?, config.timeout())
    }

    /// Request URL for `path`, skipping empty query values
    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| PouchError::Config(format!("invalid request path '{}': {}", path, e)))?;
        for (key, value) in query.iter().filter(|(_, v)| !v.is_empty()) {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    /// POST a JSON body and decode the JSON reply.
    ///
    /// A non-2xx status becomes [`PouchError::Daemon`] carrying the daemon's
    /// message verbatim.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        let payload = serde_json::to_vec(body)?;
        debug!(%url, bytes = payload.len(), "POST");

        let (status, reply) = tokio::time::timeout(self.timeout, self.round_trip(&url, payload))
            .await
            .map_err(|_| self.timeout_error())??;
        debug!(status, bytes = reply.len(), "daemon replied");

        if !(200..300).contains(&status) {
            return Err(PouchError::Daemon {
                status,
                message: error_message(status, &reply),
            });
        }
        Ok(serde_json::from_slice(&reply)?)
    }

    async fn round_trip(&self, url: &Url, payload: Vec<u8>) -> Result<(u16, Vec<u8>)> {
        match &self.endpoint {
            Endpoint::Unix(socket) => self.unix_round_trip(socket, url, payload).await,
            Endpoint::Http(_) => {
                let response = self
                    .http
                    .post(url.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .body(payload)
                    .send()
                    .await
                    .map_err(|e| self.reqwest_error(e))?;
                let status = response.status().as_u16();
                let bytes = response.bytes().await.map_err(|e| self.reqwest_error(e))?;
                Ok((status, bytes.to_vec()))
            }
        }
    }

    /// One POST over a fresh Unix socket connection
    async fn unix_round_trip(&self, socket: &Path, url: &Url, payload: Vec<u8>) -> Result<(u16, Vec<u8>)> {
        let stream = UnixStream::connect(socket)
            .await
            .map_err(|e| self.transport_error(e))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| self.transport_error(e))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("daemon connection closed: {}", e);
            }
        });

        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let request = Request::builder()
            .method(Method::POST)
            .uri(target)
            .header(HOST, "localhost")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, payload.len())
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| self.transport_error(e))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_bytes();
        Ok((status, body.to_vec()))
    }

    fn timeout_error(&self) -> PouchError {
        PouchError::Timeout(format!(
            "no reply from {} within {}s",
            self.endpoint,
            self.timeout.as_secs()
        ))
    }

    fn transport_error(&self, err: impl fmt::Display) -> PouchError {
        PouchError::Transport {
            endpoint: self.endpoint.to_string(),
            reason: err.to_string(),
        }
    }

    fn reqwest_error(&self, err: reqwest::Error) -> PouchError {
        if err.is_timeout() {
            self.timeout_error()
        } else {
            self.transport_error(err)
        }
    }
}

impl ContainerApi for DaemonClient {
    async fn create_container(&self, spec: ContainerSpec, name: &str) -> Result<CreateResult> {
        let url = self.url(CREATE_PATH, &[("name", name)])?;
        debug!(endpoint = %self.endpoint, image = %spec.config.image, "creating container");
        self.post_json(url, &spec).await
    }
}

fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
        return err.message;
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        format!("daemon returned status {}", status)
    } else {
        text
    }
}

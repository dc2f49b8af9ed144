//! The request orchestrator: composes URL parsing, the connection pool and
//! the wire codec into one blocking `request` call, including the one-shot
//! stale-connection retry.

use std::io::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use native_tls::TlsConnector;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::codec::{self, DEFAULT_CHUNK_SIZE};
use crate::http::content;
use crate::http::headers::HeaderMap;
use crate::http::response::Response;
use crate::http::url::{Url, parse_url};
use crate::net::{self, Address, ConnectionPool, PooledConn, resolve};

/// Blocking HTTP/1.1 client with one pooled connection per destination.
///
/// Connections are created lazily, reused across requests to the same
/// address, and torn down when the client is dropped. Requests to distinct
/// destinations may run concurrently from multiple threads; requests to the
/// same destination are serialized by the single pooled connection.
///
/// ```no_run
/// let client = courier::Client::new();
/// let response = client.get("http://example.com/").send()?;
/// assert_eq!(response.status, 200);
/// # Ok::<(), courier::Error>(())
/// ```
#[derive(Debug)]
pub struct Client {
    config: Config,
    proxy: Option<Url>,
    pool: ConnectionPool,
}

impl Client {
    /// Client with the default configuration: 30 s timeout, no proxy,
    /// remote DNS, verified TLS.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            proxy: None,
            pool: ConnectionPool::new(),
        }
    }

    /// Client from an explicit configuration. Fails if the proxy URL does
    /// not parse.
    pub fn with_config(config: Config) -> Result<Self> {
        let proxy = config.proxy_url.as_deref().map(parse_url).transpose()?;
        Ok(Self {
            config,
            proxy,
            pool: ConnectionPool::new(),
        })
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Start building a request with an arbitrary method.
    pub fn request(&self, method: impl Into<String>, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            method: method.into(),
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            chunk_size: None,
            tls: None,
        }
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request("GET", url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request("POST", url)
    }

    /// Close every pooled connection. Also happens on drop.
    pub fn close_all(&self) {
        self.pool.close_all();
    }

    fn execute(
        &self,
        method: &str,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        chunk_size: usize,
        tls: Option<&TlsConnector>,
    ) -> Result<Response> {
        // Unsupported schemes fail before any network activity.
        if url.scheme != "http" && url.scheme != "https" {
            return Err(Error::SchemeNotImplemented(url.scheme.clone()));
        }
        let port = url
            .port
            .ok_or_else(|| Error::request(format!("no port known for scheme {:?}", url.scheme)))?;

        // Fill defaults without clobbering caller-supplied values.
        let mut headers = headers.clone();
        if !headers.contains("Host") {
            headers.set("Host", url.hostname.clone());
        }
        if let Some(body) = body
            && !headers.contains("Content-Length")
        {
            headers.set("Content-Length", body.len().to_string());
        }
        if let Some(auth) = &url.auth
            && !headers.contains("Authorization")
        {
            headers.set("Authorization", format!("Basic {}", BASE64.encode(auth.as_bytes())));
        }

        let host = if self.config.remote_dns {
            url.hostname.clone()
        } else {
            resolve::ip_from_hostname(&url.hostname)
                .map_err(Error::request)?
                .to_string()
        };
        let address: Address = (host, port);

        let default_tls;
        let tls = match tls {
            Some(connector) => Some(connector),
            None if url.scheme == "https" => {
                default_tls = self.default_tls_connector()?;
                Some(&default_tls)
            }
            None => None,
        };

        // At most one retry, and only for a stale pooled connection.
        let mut retried = false;
        loop {
            let mut conn = match self.pool.take(&address) {
                Some(conn) => {
                    tracing::trace!(host = %address.0, port = address.1, "reusing pooled connection");
                    conn
                }
                None => PooledConn::new(net::establish(
                    &address.0,
                    address.1,
                    self.config.timeout(),
                    self.proxy.as_ref(),
                    tls,
                    &url.hostname,
                )?),
            };

            match self.round_trip(&mut conn, method, url, &headers, body, chunk_size) {
                Ok((response, reusable)) => {
                    conn.sent_request = true;
                    if reusable {
                        self.pool.put(address, conn);
                    }
                    return Ok(response);
                }
                Err(err) => {
                    // A failed connection is never reused.
                    let had_sent = conn.sent_request;
                    drop(conn);

                    if !retried && had_sent && matches!(err, Error::EmptyResponse) {
                        // The server likely closed an idle keep-alive
                        // connection between our uses; run the whole
                        // request once more on a fresh one.
                        tracing::debug!(host = %address.0, port = address.1, "stale pooled connection, retrying");
                        retried = true;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    fn round_trip(
        &self,
        conn: &mut PooledConn,
        method: &str,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        chunk_size: usize,
    ) -> Result<(Response, bool)> {
        let request = codec::encode_request(method, &url.path, headers, body);
        conn.stream.write_all(&request)?;
        conn.stream.flush()?;

        let wire = codec::read_response(&mut conn.stream, chunk_size)?;

        let mut body = wire.body;
        if let Some(encoding) = wire.headers.get("Content-Encoding") {
            body = content::decode_content(body, encoding).map_err(Error::request)?;
        }

        tracing::debug!(
            method,
            path = %url.path,
            status = wire.status,
            body_len = body.len(),
            "request completed"
        );

        Ok((
            Response {
                status: wire.status,
                message: wire.message,
                headers: wire.headers,
                body,
            },
            wire.reusable,
        ))
    }

    fn default_tls_connector(&self) -> Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if !self.config.tls_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(Error::request)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent construction of a [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: Config,
}

impl ClientBuilder {
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(url.into());
        self
    }

    pub fn remote_dns(mut self, remote_dns: bool) -> Self {
        self.config.remote_dns = remote_dns;
        self
    }

    pub fn tls_verify(mut self, tls_verify: bool) -> Self {
        self.config.tls_verify = tls_verify;
        self
    }

    pub fn build(self) -> Result<Client> {
        Client::with_config(self.config)
    }
}

/// One request in the making; [`RequestBuilder::send`] blocks until the
/// response is fully assembled.
pub struct RequestBuilder<'a> {
    client: &'a Client,
    method: String,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    chunk_size: Option<usize>,
    tls: Option<TlsConnector>,
}

impl RequestBuilder<'_> {
    /// Set a header, replacing any prior value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set several headers at once with the same replace semantics.
    pub fn headers<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in pairs {
            self.headers.set(name, value);
        }
        self
    }

    /// Suppress a header the client would otherwise fill in (Host,
    /// Content-Length, Authorization).
    pub fn unset_header(mut self, name: impl Into<String>) -> Self {
        self.headers.unset(name);
        self
    }

    /// Request body, sent whole with a declared Content-Length.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Per-read buffer size for receiving the response.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Use a caller-supplied TLS context instead of the client default.
    pub fn tls(mut self, connector: TlsConnector) -> Self {
        self.tls = Some(connector);
        self
    }

    /// Execute the request and block until the response is assembled.
    pub fn send(self) -> Result<Response> {
        let url = parse_url(&self.url)?;
        self.client.execute(
            &self.method,
            &url,
            &self.headers,
            self.body.as_deref(),
            self.chunk_size.filter(|&n| n > 0).unwrap_or(DEFAULT_CHUNK_SIZE),
            self.tls.as_ref(),
        )
    }
}

/*
 * client.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of cloudstorage-core, the HTTP request layer of the
 * cloud storage SDK.
 *
 * cloudstorage-core is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * cloudstorage-core is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with cloudstorage-core.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Connectors: how `HttpRequestFactory` opens the stream behind an `HttpConnection`.
//!
//! `HttpClient` is the production connector (TCP, plus TLS for `https`). Tests and embedders can
//! supply their own `Connector`.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::http::connection::HttpStream;
use crate::net::http_client_config;

/// Opens byte streams to request targets.
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connect to the host and port of `target`.
    fn connect(&self, target: &Url) -> impl Future<Output = io::Result<Self::Stream>> + Send;

    /// User agent a new connection sends when the request sets none.
    fn user_agent(&self) -> Option<&str> {
        None
    }
}

/// TCP/TLS connector. Create with `HttpClient::new(&config)`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    connect_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent().to_string(),
        }
    }

    /// Connect to the given host and port. If `use_tls` is true, performs a TLS handshake with ALPN
    /// `http/1.1`.
    pub async fn connect_host(&self, host: &str, port: u16, use_tls: bool) -> io::Result<HttpStream> {
        // IPv6 literals arrive bracketed from Url::host_str.
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        let tcp = timeout(self.connect_timeout, TcpStream::connect((bare_host, port)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TCP connect timed out"))??;
        debug!(host, port, tls = use_tls, "TCP connected");

        if !use_tls {
            return Ok(HttpStream::Plain(tcp));
        }
        let server_name = ServerName::try_from(bare_host.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?;
        let connector = TlsConnector::from(http_client_config());
        let tls = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
        Ok(HttpStream::Tls(Box::new(tls)))
    }
}

impl Connector for HttpClient {
    type Stream = HttpStream;

    async fn connect(&self, target: &Url) -> io::Result<HttpStream> {
        let use_tls = match target.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported scheme: {}", other),
                ));
            }
        };
        let host = target
            .host_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "URL has no host"))?;
        let port = target
            .port_or_known_default()
            .unwrap_or(if use_tls { 443 } else { 80 });
        self.connect_host(host, port, use_tls).await
    }

    fn user_agent(&self) -> Option<&str> {
        Some(&self.user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unknown_scheme() {
        let client = HttpClient::new(&ClientConfig::default());
        let target = Url::parse("ftp://host/file").unwrap();
        let err = Connector::connect(&client, &target).await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn connects_to_local_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });
        let client = HttpClient::new(&ClientConfig::default());
        let target = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let stream = Connector::connect(&client, &target).await.unwrap();
        assert!(matches!(stream, HttpStream::Plain(_)));
        accept.await.unwrap().unwrap();
    }

    #[test]
    fn user_agent_from_config() {
        let client = HttpClient::new(&ClientConfig::new("sdk/1.0"));
        assert_eq!(Connector::user_agent(&client), Some("sdk/1.0"));
    }
}

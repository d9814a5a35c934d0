/*
 * connection.rs
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

//! HTTP/1.1 transport connection: one TCP or TLS stream, request properties, and a streamed request
//! body.
//!
//! The request head goes out lazily: when the body is opened with `output_stream()`, or when the
//! caller asks for the response stream. Bodies are sent with `Transfer-Encoding: chunked` unless a
//! `Content-Length` property fixes their size. Responses are not parsed here; `response()` hands the
//! raw stream back to the caller.
//!
//! The request line carries the request target exactly as given; the `Url` only supplies the
//! scheme, host and port. Header names must be tokens and values may not contain CR, LF or NUL.

use bytes::{BufMut, BytesMut};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tracing::{trace, warn};
use url::Url;

use crate::http::request::Method;
use crate::uri::host_header;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// How the request body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    Chunked,
    Fixed { remaining: u64 },
}

/// Where the connection is in writing its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    /// Nothing written yet; properties may still change.
    Pending,
    /// Head written, body open.
    Body(BodyFraming),
    /// Head and body (if any) fully written.
    Sent,
}

/// An open HTTP/1.1 connection to one target URL.
///
/// Configure method, flags and request properties, write the body through `output_stream()`, then
/// read the response from `response()`. The owner closes it with `close()`.
pub struct HttpConnection<S = HttpStream> {
    stream: S,
    url: Url,
    request_target: String,
    method: Method,
    properties: Vec<(String, String)>,
    default_user_agent: Option<String>,
    use_caches: bool,
    do_input: bool,
    do_output: bool,
    state: RequestState,
}

impl<S> HttpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream. The method defaults to GET, input is enabled, output is not.
    /// The request target is the path and query of `url`.
    pub fn new(stream: S, url: Url) -> Self {
        let request_target = url_request_target(&url);
        Self::with_request_target(stream, url, request_target)
    }

    /// As `new`, but the request line names `request_target` verbatim (e.g. `/bucket/a/../b?acl`)
    /// instead of the normalized path of `url`.
    pub fn with_request_target(stream: S, url: Url, request_target: impl Into<String>) -> Self {
        Self {
            stream,
            url,
            request_target: request_target.into(),
            method: Method::Get,
            properties: Vec::new(),
            default_user_agent: None,
            use_caches: true,
            do_input: true,
            do_output: false,
            state: RequestState::Pending,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Path and query written on the request line.
    pub fn request_target(&self) -> &str {
        &self.request_target
    }

    pub fn request_method(&self) -> Method {
        self.method
    }

    pub fn set_request_method(&mut self, method: Method) -> &mut Self {
        if self.configurable("method") {
            self.method = method;
        }
        self
    }

    pub fn use_caches(&self) -> bool {
        self.use_caches
    }

    /// With caching disabled the head carries `Cache-Control: no-cache` and `Pragma: no-cache`
    /// unless those properties are set explicitly.
    pub fn set_use_caches(&mut self, use_caches: bool) -> &mut Self {
        if self.configurable("use_caches") {
            self.use_caches = use_caches;
        }
        self
    }

    pub fn do_input(&self) -> bool {
        self.do_input
    }

    pub fn set_do_input(&mut self, do_input: bool) -> &mut Self {
        if self.configurable("do_input") {
            self.do_input = do_input;
        }
        self
    }

    pub fn do_output(&self) -> bool {
        self.do_output
    }

    pub fn set_do_output(&mut self, do_output: bool) -> &mut Self {
        if self.configurable("do_output") {
            self.do_output = do_output;
        }
        self
    }

    pub fn default_user_agent(&self) -> Option<&str> {
        self.default_user_agent.as_deref()
    }

    /// User agent sent when no `User-Agent` property is set.
    pub fn set_default_user_agent(&mut self, user_agent: Option<String>) -> &mut Self {
        if self.configurable("default user agent") {
            self.default_user_agent = user_agent;
        }
        self
    }

    /// Set a request header, replacing any existing one with the same name (ASCII case-insensitive).
    /// The first spelling of the name is kept.
    pub fn set_request_property(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        if !self.configurable(name) {
            return self;
        }
        let value = value.into();
        let mut matches = self
            .properties
            .iter()
            .enumerate()
            .filter(|(_, (k, _))| k.eq_ignore_ascii_case(name))
            .map(|(i, _)| i);
        match matches.next() {
            Some(first) => {
                let rest: Vec<usize> = matches.collect();
                self.properties[first].1 = value;
                for i in rest.into_iter().rev() {
                    self.properties.remove(i);
                }
            }
            None => self.properties.push((name.to_string(), value)),
        }
        self
    }

    /// Append a request header without replacing existing ones of the same name.
    pub fn add_request_property(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        if self.configurable(name) {
            self.properties.push((name.to_string(), value.into()));
        }
        self
    }

    /// First value of the named request header.
    pub fn request_property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn request_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True once the request head is on the wire.
    pub fn is_request_sent(&self) -> bool {
        self.state != RequestState::Pending
    }

    fn configurable(&self, what: &str) -> bool {
        if self.is_request_sent() {
            warn!(url = %self.url, setting = what, "request already sent; change ignored");
            return false;
        }
        true
    }

    /// Open the request body. Writes the head on first use.
    pub async fn output_stream(&mut self) -> io::Result<OutputStream<'_, S>> {
        if !self.do_output {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "output is not enabled on this connection",
            ));
        }
        match self.state {
            RequestState::Pending => {
                let framing = self.body_framing()?;
                self.write_head(Some(framing)).await?;
            }
            RequestState::Body(_) => {}
            RequestState::Sent => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "request already sent",
                ));
            }
        }
        Ok(OutputStream { conn: self })
    }

    /// Finish writing the request: send the head if it is still pending, or terminate an open body.
    pub async fn finish_request(&mut self) -> io::Result<()> {
        match self.state {
            RequestState::Pending => {
                self.write_head(None).await?;
                self.stream.flush().await
            }
            RequestState::Body(_) => self.finish_body().await,
            RequestState::Sent => Ok(()),
        }
    }

    /// Finish the request and return the stream, positioned at the start of the response.
    pub async fn response(&mut self) -> io::Result<&mut S> {
        if !self.do_input {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "input is not enabled on this connection",
            ));
        }
        self.finish_request().await?;
        Ok(&mut self.stream)
    }

    /// Shut the underlying stream down.
    pub async fn close(mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn body_framing(&self) -> io::Result<BodyFraming> {
        match self.request_property("Content-Length") {
            Some(v) => {
                let remaining = v.trim().parse::<u64>().map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid Content-Length: {}", v),
                    )
                })?;
                Ok(BodyFraming::Fixed { remaining })
            }
            None => Ok(BodyFraming::Chunked),
        }
    }

    /// Serialize the request line and headers.
    ///
    /// Properties go out in order. `Host`, `User-Agent` and the no-cache headers are added after them
    /// only when not already present. Fails with `InvalidInput` before anything is written if the
    /// target or any header would break the head's framing.
    fn head_bytes(&self, framing: Option<BodyFraming>) -> io::Result<BytesMut> {
        let target = self.request_target.as_str();
        if target.is_empty() || target.bytes().any(|b| b <= b' ' || b == 0x7f) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid request target: {:?}", target),
            ));
        }
        let mut head = BytesMut::with_capacity(256);
        put_line(&mut head, &format!("{} {} HTTP/1.1", self.method.as_str(), target));
        for (k, v) in &self.properties {
            put_header(&mut head, k, v)?;
        }
        let absent = |name: &str| self.request_property(name).is_none();
        if absent("Host") {
            if let Some(host) = host_header(&self.url) {
                put_header(&mut head, "Host", &host)?;
            }
        }
        if absent("User-Agent") {
            if let Some(ua) = &self.default_user_agent {
                put_header(&mut head, "User-Agent", ua)?;
            }
        }
        if !self.use_caches {
            if absent("Cache-Control") {
                put_header(&mut head, "Cache-Control", "no-cache")?;
            }
            if absent("Pragma") {
                put_header(&mut head, "Pragma", "no-cache")?;
            }
        }
        match framing {
            Some(BodyFraming::Chunked) => {
                if absent("Transfer-Encoding") {
                    put_header(&mut head, "Transfer-Encoding", "chunked")?;
                }
            }
            Some(BodyFraming::Fixed { .. }) => {}
            None => {
                if self.do_output && self.method.has_request_body() && absent("Content-Length") {
                    put_header(&mut head, "Content-Length", "0")?;
                }
            }
        }
        head.put_slice(b"\r\n");
        Ok(head)
    }

    async fn write_head(&mut self, framing: Option<BodyFraming>) -> io::Result<()> {
        let head = self.head_bytes(framing)?;
        self.stream.write_all(&head).await?;
        trace!(
            method = self.method.as_str(),
            url = %self.url,
            bytes = head.len(),
            "request head written"
        );
        self.state = match framing {
            Some(f) => RequestState::Body(f),
            None => RequestState::Sent,
        };
        Ok(())
    }

    async fn write_body(&mut self, data: &[u8]) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        match self.state {
            RequestState::Body(BodyFraming::Chunked) => {
                let size_line = format!("{:x}\r\n", data.len());
                self.stream.write_all(size_line.as_bytes()).await?;
                self.stream.write_all(data).await?;
                self.stream.write_all(b"\r\n").await?;
            }
            RequestState::Body(BodyFraming::Fixed { remaining }) => {
                let len = data.len() as u64;
                if len > remaining {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!(
                            "body exceeds Content-Length: {} bytes left, {} offered",
                            remaining, len
                        ),
                    ));
                }
                self.stream.write_all(data).await?;
                self.state = RequestState::Body(BodyFraming::Fixed {
                    remaining: remaining - len,
                });
            }
            RequestState::Pending | RequestState::Sent => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "request body is not open",
                ));
            }
        }
        trace!(bytes = data.len(), "request body chunk written");
        Ok(())
    }

    async fn finish_body(&mut self) -> io::Result<()> {
        match self.state {
            RequestState::Body(BodyFraming::Chunked) => {
                self.stream.write_all(b"0\r\n\r\n").await?;
            }
            RequestState::Body(BodyFraming::Fixed { remaining }) if remaining > 0 => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("body ended {} bytes short of Content-Length", remaining),
                ));
            }
            _ => {}
        }
        self.stream.flush().await?;
        self.state = RequestState::Sent;
        Ok(())
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.put_slice(line.as_bytes());
    buf.put_slice(b"\r\n");
}

fn put_header(buf: &mut BytesMut, name: &str, value: &str) -> io::Result<()> {
    check_header(name, value)?;
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_slice(b"\r\n");
    Ok(())
}

/// RFC 9110 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Reject header names that are not tokens and values containing CR, LF or NUL.
pub fn check_header(name: &str, value: &str) -> io::Result<()> {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid header name: {:?}", name),
        ));
    }
    if value.bytes().any(|b| matches!(b, b'\r' | b'\n' | 0)) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid value for header {}", name),
        ));
    }
    Ok(())
}

/// Path plus `?query` of `url`, as the request line would carry it.
fn url_request_target(url: &Url) -> String {
    let mut target = url.path().to_string();
    if let Some(q) = url.query() {
        target.push('?');
        target.push_str(q);
    }
    target
}

/// Writer for an open request body, borrowed from its connection.
pub struct OutputStream<'a, S> {
    conn: &'a mut HttpConnection<S>,
}

impl<S> OutputStream<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Write all of `data` as body bytes (one chunk when chunked).
    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.conn.write_body(data).await
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.conn.stream.flush().await
    }

    /// End the body. For a fixed-length body this fails if fewer bytes were written than declared.
    pub async fn close(self) -> io::Result<()> {
        self.conn.finish_body().await
    }
}

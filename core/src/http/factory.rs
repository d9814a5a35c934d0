/*
 * factory.rs
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

//! Request factory: turns an abstract `Request` into an open `HttpConnection` with its method,
//! headers, and body already on the wire.
//!
//! Steps: compose the URI (escaping `//` after the endpoint), place encoded parameters in the query
//! or leave them to the content, pick the redirect target when given, open the connection, apply
//! the header overlay, then stream the content in 8 KiB chunks.

use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::http::client::Connector;
use crate::http::connection::HttpConnection;
use crate::http::context::ExecutionContext;
use crate::http::request::{Method, Request};
use crate::http::connection::check_header;
use crate::uri::{append_uri, encode_parameters, host_header, request_target};

/// Copy buffer size for request content.
pub const BUFFER_SIZE: usize = 8 * 1024;

/// Content type used when the request does not set one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Builds and sends requests over connections opened by `C`. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct HttpRequestFactory<C> {
    connector: C,
}

impl<C: Connector + Sync> HttpRequestFactory<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Build the request, open a connection, write headers and content, and return the connection
    /// ready for the caller to read the response.
    ///
    /// `redirect`, when given, is the connection target as-is; the endpoint, resource path and
    /// parameters then only contribute headers. Otherwise the composed path and query go on the
    /// request line exactly as composed, dot segments included. The request's content is drained.
    ///
    /// Content is sent with `Transfer-Encoding: chunked` unless the request carries a
    /// `Content-Length` header. Many object stores refuse chunked uploads (`411 Length Required`),
    /// so set `Content-Length` whenever the size is known.
    ///
    /// A header name that is not a token, or a value containing CR, LF or NUL, fails with
    /// `RequestError::Io` of kind `InvalidInput` before anything is written.
    pub async fn create_http_request(
        &self,
        request: &mut Request,
        config: &ClientConfig,
        context: Option<&ExecutionContext>,
        redirect: Option<&Url>,
    ) -> Result<HttpConnection<C::Stream>, RequestError> {
        let (target, line_target) = match redirect {
            Some(url) => (url.clone(), None),
            None => {
                let uri = compose_uri(request);
                let line_target = request_target(&uri);
                let url = Url::parse(&uri).map_err(|e| RequestError::uri(uri, e))?;
                (url, Some(line_target))
            }
        };

        debug!(method = request.method().as_str(), target = %target, "opening connection");
        let stream = self
            .connector
            .connect(&target)
            .await
            .map_err(|source| RequestError::Connect {
                target: target.to_string(),
                source,
            })?;

        let mut connection = match line_target {
            Some(line_target) => HttpConnection::with_request_target(stream, target, line_target),
            None => HttpConnection::new(stream, target),
        };
        connection
            .set_default_user_agent(self.connector.user_agent().map(str::to_string))
            .set_request_method(request.method())
            .set_use_caches(false)
            .set_do_input(true)
            .set_do_output(true);

        configure_headers(&mut connection, request, context, config)?;

        if let Some(content) = request.content_mut() {
            let mut out = connection.output_stream().await?;
            let mut buffer = vec![0u8; BUFFER_SIZE];
            let mut total = 0u64;
            loop {
                let n = content.read(&mut buffer).await?;
                if n == 0 {
                    break;
                }
                out.write(&buffer[..n]).await?;
                total += n as u64;
            }
            out.flush().await?;
            out.close().await?;
            debug!(bytes = total, "request content sent");
        }

        Ok(connection)
    }
}

/// Endpoint + resource path, plus `?query` when the parameters belong in the URI.
///
/// The result is not normalized: `Url::parse` would resolve `.` and `..` segments and name a
/// different object.
pub fn compose_uri(request: &Request) -> String {
    let mut uri = append_uri(request.endpoint().as_str(), request.resource_path(), true);
    if let Some(params) = encode_parameters(request) {
        if params_in_uri(request.method(), request.has_content()) {
            uri.push('?');
            uri.push_str(&params);
        }
    }
    uri
}

/// Whether encoded parameters go in the query string.
///
/// Only a POST that already carries content leaves them out; the content is then expected to hold
/// them.
pub fn params_in_uri(method: Method, has_content: bool) -> bool {
    let is_post = method == Method::Post;
    !is_post || !has_content
}

/// Headers for `request`, in the order they are applied.
///
/// Caller headers first, then `Host` from the endpoint (always overriding), then the default
/// `Content-Type` if none is set or it is empty, then the merged `User-Agent` when the context
/// supplies one. Names compare ASCII case-insensitively; a later entry replaces an earlier one.
pub fn request_headers(
    request: &Request,
    context: Option<&ExecutionContext>,
    config: &ClientConfig,
) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::with_capacity(request.headers().len() + 3);
    for (name, value) in request.headers().iter() {
        overlay(&mut headers, name, value.to_string());
    }

    // Request guarantees the endpoint has a host.
    let host = host_header(request.endpoint()).unwrap_or_default();
    overlay(&mut headers, "Host", host);

    let has_content_type = headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("Content-Type") && !v.is_empty());
    if !has_content_type {
        overlay(&mut headers, "Content-Type", DEFAULT_CONTENT_TYPE.to_string());
    }

    if let Some(context_ua) = context.and_then(ExecutionContext::context_user_agent) {
        overlay(
            &mut headers,
            "User-Agent",
            create_user_agent_string(config.user_agent(), context_ua),
        );
    }
    headers
}

fn overlay(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value,
        None => headers.push((name.to_string(), value)),
    }
}

/// Apply `request_headers` to the connection. Nothing is applied if any header is malformed.
pub fn configure_headers<S>(
    connection: &mut HttpConnection<S>,
    request: &Request,
    context: Option<&ExecutionContext>,
    config: &ClientConfig,
) -> Result<(), RequestError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
    let headers = request_headers(request, context, config);
    for (name, value) in &headers {
        check_header(name, value)?;
    }
    for (name, value) in headers {
        connection.set_request_property(&name, value);
    }
    Ok(())
}

/// The configured user agent, with `context_user_agent` appended after a space unless it already
/// occurs in it.
pub fn create_user_agent_string(user_agent: &str, context_user_agent: &str) -> String {
    if user_agent.contains(context_user_agent) {
        user_agent.to_string()
    } else {
        format!("{} {}", user_agent, context_user_agent)
    }
}

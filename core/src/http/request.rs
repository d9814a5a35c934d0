/*
 * request.rs
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

//! Abstract HTTP request: method, endpoint, resource path, headers, parameters, optional content.
//!
//! This is the SDK-side description of a call. `HttpRequestFactory` turns it into a configured
//! `HttpConnection`.

use std::fmt;

use tokio::io::AsyncRead;
use url::Url;

use crate::error::RequestError;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }

    /// Methods whose requests conventionally carry a body.
    pub fn has_request_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered string map with unique, case-sensitive keys.
///
/// Inserting an existing key replaces its value and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request body source. Read to exhaustion when the request is sent.
pub type Content = Box<dyn AsyncRead + Send + Unpin>;

/// Abstract request handed to `HttpRequestFactory`.
pub struct Request {
    method: Method,
    endpoint: Url,
    resource_path: String,
    headers: Headers,
    parameters: Vec<(String, Option<String>)>,
    content: Option<Content>,
}

impl Request {
    /// New request against `endpoint`. The endpoint must have a host.
    pub fn new(method: Method, endpoint: Url) -> Result<Self, RequestError> {
        check_host(&endpoint)?;
        Ok(Self {
            method,
            endpoint,
            resource_path: String::new(),
            headers: Headers::new(),
            parameters: Vec::new(),
            content: None,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: Url) -> Result<&mut Self, RequestError> {
        check_host(&endpoint)?;
        self.endpoint = endpoint;
        Ok(self)
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Path appended after the endpoint, e.g. `/bucket/photos/cat.jpg`. Not yet encoded.
    pub fn set_resource_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.resource_path = path.into();
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }

    /// Parameters in insertion order; `None` values are sub-resources such as `?acl`.
    pub fn parameters(&self) -> &[(String, Option<String>)] {
        &self.parameters
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put_parameter(name.into(), Some(value.into()));
        self
    }

    /// Add a parameter that has a name but no value.
    pub fn add_parameter_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.put_parameter(name.into(), None);
        self
    }

    fn put_parameter(&mut self, name: String, value: Option<String>) {
        match self.parameters.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.parameters.push((name, value)),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn set_content(&mut self, content: impl AsyncRead + Send + Unpin + 'static) -> &mut Self {
        self.content = Some(Box::new(content));
        self
    }

    pub fn content_mut(&mut self) -> Option<&mut Content> {
        self.content.as_mut()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint.as_str())
            .field("resource_path", &self.resource_path)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

fn check_host(endpoint: &Url) -> Result<(), RequestError> {
    match endpoint.host_str() {
        Some(h) if !h.is_empty() => Ok(()),
        _ => Err(RequestError::NoHost(endpoint.to_string())),
    }
}

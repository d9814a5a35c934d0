/*
 * error.rs
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

//! Request and configuration errors.

use std::io;

use thiserror::Error;

/// Errors from building and sending a request.
///
/// Every variant keeps the underlying cause as its `source`; nothing is retried or
/// rewritten on the way out.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The endpoint, resource path, or query did not form a valid URI.
    #[error("invalid URI `{uri}`: {source}")]
    Uri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    /// The URI parsed but carries no host to connect to or to put in `Host`.
    #[error("URI `{0}` has no host")]
    NoHost(String),
    /// The transport connection could not be opened.
    #[error("cannot connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },
    /// Reading the request content or writing to the connection failed.
    #[error("request I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl RequestError {
    pub(crate) fn uri(uri: impl Into<String>, source: url::ParseError) -> Self {
        Self::Uri {
            uri: uri.into(),
            source,
        }
    }

    /// True for URI-construction failures (`Uri` and `NoHost`).
    pub fn is_uri_error(&self) -> bool {
        matches!(self, Self::Uri { .. } | Self::NoHost(_))
    }
}

/// Errors from loading a client configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("invalid value for <{element}>: {value}")]
    InvalidValue { element: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_keeps_source() {
        use std::error::Error as _;
        let err = RequestError::Connect {
            target: "http://localhost:1/".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.to_string().contains("http://localhost:1/"));
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "refused");
        assert!(!err.is_uri_error());
    }

    #[test]
    fn uri_errors_are_classified() {
        let err = RequestError::uri("::", url::ParseError::RelativeUrlWithoutBase);
        assert!(err.is_uri_error());
        assert!(RequestError::NoHost("data:text/plain,x".into()).is_uri_error());
    }
}

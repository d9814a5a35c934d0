/*
 * uri.rs
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

//! URI helpers for request composition: joining an endpoint with a resource path, percent-encoding
//! path and query components, and deciding whether a port must appear in the `Host` header.
//! Resource paths keep `/` literal; a `//` produced by the join is escaped as `/%2F` so that HTTP
//! stacks do not read it as a network-path reference.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;
use url::Url;

use crate::http::Request;

/// RFC 3986 unreserved characters stay literal; everything else is encoded (space as %20).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// As `COMPONENT`, but `/` separates path segments and is kept.
const PATH: &AsciiSet = &COMPONENT.remove(b'/');

/// Percent-encode a URI component. With `path` set, slashes are left as segment separators.
pub fn url_encode(value: &str, path: bool) -> String {
    let set = if path { PATH } else { COMPONENT };
    utf8_percent_encode(value, set).to_string()
}

/// Join `base_uri` and `path` with exactly one slash between them.
///
/// The path is percent-encoded (slashes kept). With `escape_double_slash`, every `//` left in the
/// encoded path becomes `/%2F`, so `http://host` + `//key` gives `http://host/%2Fkey`.
/// An empty path yields the base with a trailing slash.
pub fn append_uri(base_uri: &str, path: &str, escape_double_slash: bool) -> String {
    let mut result = base_uri.to_string();
    if path.is_empty() {
        if !result.ends_with('/') {
            result.push('/');
        }
        return result;
    }
    if path.starts_with('/') {
        if result.ends_with('/') {
            result.pop();
        }
    } else if !result.ends_with('/') {
        result.push('/');
    }
    let mut encoded = url_encode(path, true);
    if escape_double_slash {
        encoded = encoded.replace("//", "/%2F");
    }
    result.push_str(&encoded);
    result
}

/// Origin-form request target of an absolute URI: everything from the first `/` or `?` after the
/// authority, taken verbatim. A URI with no path yields `/`.
pub fn request_target(uri: &str) -> String {
    let authority_start = uri.find("://").map_or(0, |i| i + 3);
    let rest = &uri[authority_start..];
    match rest.find(|c: char| c == '/' || c == '?') {
        Some(i) if rest[i..].starts_with('?') => format!("/{}", &rest[i..]),
        Some(i) => rest[i..].to_string(),
        None => "/".to_string(),
    }
}

/// Form-encode the request parameters as `name=value&...` in insertion order.
///
/// A parameter without a value is written as its bare name. Returns `None` when the request has
/// no parameters.
pub fn encode_parameters(request: &Request) -> Option<String> {
    let params = request.parameters();
    if params.is_empty() {
        return None;
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        match value {
            Some(v) => serializer.append_pair(name, v),
            None => serializer.append_key_only(name),
        };
    }
    Some(serializer.finish())
}

/// True when `uri` names an explicit port that is not the default for its scheme.
pub fn is_using_non_default_port(uri: &Url) -> bool {
    let Some(port) = uri.port() else {
        return false;
    };
    !matches!((uri.scheme(), port), ("http", 80) | ("https", 443))
}

/// Value for the `Host` header: the host, plus `:port` when the port is not the scheme default.
pub fn host_header(uri: &Url) -> Option<String> {
    let host = uri.host_str()?;
    match uri.port() {
        Some(port) if is_using_non_default_port(uri) => Some(format!("{}:{}", host, port)),
        _ => Some(host.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn append_inserts_single_slash() {
        assert_eq!(append_uri("http://host", "bucket/key", true), "http://host/bucket/key");
        assert_eq!(append_uri("http://host/", "bucket/key", true), "http://host/bucket/key");
        assert_eq!(append_uri("http://host", "/bucket/key", true), "http://host/bucket/key");
        assert_eq!(append_uri("http://host/", "/bucket/key", true), "http://host/bucket/key");
    }

    #[test]
    fn append_empty_path_adds_trailing_slash() {
        assert_eq!(append_uri("http://host", "", true), "http://host/");
        assert_eq!(append_uri("http://host/", "", true), "http://host/");
    }

    #[test]
    fn append_escapes_double_slash() {
        assert_eq!(append_uri("http://host", "//key", true), "http://host/%2Fkey");
        assert_eq!(append_uri("http://host", "/bucket//key", true), "http://host/bucket/%2Fkey");
        assert_eq!(append_uri("http://host", "//key", false), "http://host//key");
    }

    #[test]
    fn no_literal_double_slash_after_host() {
        for endpoint in ["http://host", "https://host:8443", "http://10.0.0.1"] {
            for path in ["/", "/a", "//a", "///a/b", "/a//b", "/a b/c"] {
                let composed = append_uri(endpoint, path, true);
                let after_scheme = &composed[composed.find("://").unwrap() + 3..];
                assert!(!after_scheme.contains("//"), "{} + {} -> {}", endpoint, path, composed);
            }
        }
    }

    #[test]
    fn request_target_is_verbatim() {
        assert_eq!(request_target("http://host/bucket/a/../b?acl"), "/bucket/a/../b?acl");
        assert_eq!(request_target("https://host:8443/%2Fkey"), "/%2Fkey");
        assert_eq!(request_target("http://host"), "/");
        assert_eq!(request_target("http://host?x=1"), "/?x=1");
        assert_eq!(request_target("http://[::1]:9000/./k"), "/./k");
    }

    #[test]
    fn path_encoding_keeps_unreserved() {
        assert_eq!(url_encode("a b/c~d*e", true), "a%20b/c~d%2Ae");
        assert_eq!(url_encode("a b/c", false), "a%20b%2Fc");
        assert_eq!(url_encode("文件", true), "%E6%96%87%E4%BB%B6");
    }

    #[test]
    fn parameters_form_encoded_in_order() {
        let mut request = Request::new(Method::Get, url("http://host")).unwrap();
        assert_eq!(encode_parameters(&request), None);
        request.add_parameter("prefix", "photos/2024 june");
        request.add_parameter_name("acl");
        request.add_parameter("max-keys", "10");
        assert_eq!(
            encode_parameters(&request).as_deref(),
            Some("prefix=photos%2F2024+june&acl&max-keys=10")
        );
    }

    #[test]
    fn default_ports() {
        assert!(!is_using_non_default_port(&url("http://host")));
        assert!(!is_using_non_default_port(&url("http://host:80")));
        assert!(is_using_non_default_port(&url("http://host:8080")));
        assert!(!is_using_non_default_port(&url("https://host:443")));
        assert!(is_using_non_default_port(&url("https://host:80")));
    }

    #[test]
    fn host_header_port_only_when_non_default() {
        assert_eq!(host_header(&url("http://sinacloud.net")).unwrap(), "sinacloud.net");
        assert_eq!(host_header(&url("http://sinacloud.net:80")).unwrap(), "sinacloud.net");
        assert_eq!(host_header(&url("http://sinacloud.net:8080")).unwrap(), "sinacloud.net:8080");
        assert_eq!(host_header(&url("https://sinacloud.net:443")).unwrap(), "sinacloud.net");
        assert_eq!(host_header(&url("https://sinacloud.net:4443")).unwrap(), "sinacloud.net:4443");
        assert_eq!(host_header(&url("http://[::1]:9000")).unwrap(), "[::1]:9000");
        assert!(host_header(&url("data:text/plain,x")).is_none());
    }
}

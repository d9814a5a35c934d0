/*
 * config.rs
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

//! Client configuration: the user agent and connect timeout shared by every request.
//!
//! A `ClientConfig` is built once and shared read-only (usually behind an `Arc`). It can be loaded
//! from a small XML file with the quick_xml reader:
//!
//! ```xml
//! <client-configuration>
//!   <user-agent>my-app/2.0</user-agent>
//!   <connect-timeout-ms>5000</connect-timeout-ms>
//! </client-configuration>
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ConfigError;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("cloudstorage-core/", env!("CARGO_PKG_VERSION"));

/// TCP connect timeout when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Static client settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    user_agent: String,
    connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

/// Default config directory: ~/.cloudstorage.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|h| h.join(".cloudstorage"))
}

/// Default client configuration file: ~/.cloudstorage/client.xml.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("client.xml"))
}

/// Load a client configuration file. A missing file yields the defaults.
pub fn load_client_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ClientConfig::default()),
        Err(e) => return Err(e.into()),
    };
    parse_client_config(&content)
}

/// Parse `<client-configuration>` XML. Unknown elements are ignored; missing ones keep defaults.
pub fn parse_client_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut config = ClientConfig::default();
    let mut element_name = Vec::<u8>::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(ConfigError::Xml(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                element_name.clear();
                element_name.extend_from_slice(e.name().as_ref());
            }
            Ok(Event::Text(e)) => {
                if element_name.is_empty() {
                    continue;
                }
                let text = e
                    .unescape()
                    .map_err(|e| ConfigError::Xml(e.to_string()))?
                    .trim()
                    .to_string();
                match element_name.as_slice() {
                    b"user-agent" => config.user_agent = text,
                    b"connect-timeout-ms" => {
                        let ms = text.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                            element: "connect-timeout-ms".to_string(),
                            value: text.clone(),
                        })?;
                        config.connect_timeout = Duration::from_millis(ms);
                    }
                    _ => {}
                }
                element_name.clear();
            }
            Ok(Event::End(_)) => element_name.clear(),
            _ => {}
        }
        buf.clear();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert!(c.user_agent().starts_with("cloudstorage-core/"));
        assert_eq!(c.connect_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn parse_overrides() {
        let c = parse_client_config(
            "<?xml version=\"1.0\"?>\
             <client-configuration>\
               <user-agent> sdk/1.0 (linux) </user-agent>\
               <connect-timeout-ms>2500</connect-timeout-ms>\
               <unknown>x</unknown>\
             </client-configuration>",
        )
        .unwrap();
        assert_eq!(c.user_agent(), "sdk/1.0 (linux)");
        assert_eq!(c.connect_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn parse_partial_keeps_defaults() {
        let c = parse_client_config("<client-configuration><user-agent>a &amp; b</user-agent></client-configuration>")
            .unwrap();
        assert_eq!(c.user_agent(), "a & b");
        assert_eq!(c.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn parse_rejects_bad_timeout() {
        let err = parse_client_config(
            "<client-configuration><connect-timeout-ms>soon</connect-timeout-ms></client-configuration>",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn parse_rejects_malformed_xml() {
        let err = parse_client_config("<client-configuration><user-agent>x</agent>").unwrap_err();
        assert!(matches!(err, ConfigError::Xml(_)));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = load_client_config(&dir.path().join("absent.xml")).unwrap();
        assert_eq!(c, ClientConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "<client-configuration><user-agent>file-agent</user-agent></client-configuration>").unwrap();
        let c = load_client_config(f.path()).unwrap();
        assert_eq!(c.user_agent(), "file-agent");
    }
}

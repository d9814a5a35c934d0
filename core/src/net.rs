/*
 * net.rs
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

//! TLS client configuration for HTTPS connections (rustls via tokio-rustls).

use std::sync::{Arc, OnceLock};

use tokio_rustls::rustls::{ClientConfig as TlsClientConfig, RootCertStore};
use tracing::warn;

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            for cert in certs {
                let _ = root_store.add(cert);
            }
        }
        Err(e) => warn!(error = %e, "cannot load native root certificates"),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

static HTTP_CLIENT_CONFIG: OnceLock<Arc<TlsClientConfig>> = OnceLock::new();

/// TLS client config for HTTP/1.1 (ALPN `http/1.1`, no client auth). Built once per process.
pub fn http_client_config() -> Arc<TlsClientConfig> {
    HTTP_CLIENT_CONFIG
        .get_or_init(|| {
            let mut config = TlsClientConfig::builder()
                .with_root_certificates(build_root_store())
                .with_no_client_auth();
            config.alpn_protocols = vec![b"http/1.1".to_vec()];
            Arc::new(config)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpn_is_http11_only() {
        let config = http_client_config();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
        assert!(Arc::ptr_eq(&config, &http_client_config()));
    }
}

/*
 * lib.rs
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

//! HTTP request core for the cloud storage SDK.
//!
//! Turns an abstract [`Request`](http::Request) into an open HTTP/1.1 connection with headers and
//! body already sent:
//!
//! ```no_run
//! # async fn run() -> Result<(), cloudstorage_core::RequestError> {
//! use cloudstorage_core::http::{HttpClient, HttpRequestFactory, Method, Request};
//! use cloudstorage_core::ClientConfig;
//!
//! let config = ClientConfig::new("my-app/1.0");
//! let factory = HttpRequestFactory::new(HttpClient::new(&config));
//! let endpoint = url::Url::parse("http://sinacloud.net").expect("static URL");
//! let mut request = Request::new(Method::Get, endpoint)?;
//! request.set_resource_path("/bucket/key");
//! let mut connection = factory.create_http_request(&mut request, &config, None, None).await?;
//! let _response = connection.response().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod uri;

pub use config::ClientConfig;
pub use error::{ConfigError, RequestError};

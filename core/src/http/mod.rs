/*
 * mod.rs
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

//! HTTP request layer: abstract request model, per-call context, HTTP/1.1 connection, connectors,
//! and the request factory that ties them together.
//!
//! - `Request` describes a call independently of any transport.
//! - `HttpRequestFactory` composes the URI, opens a connection through a `Connector`, applies the
//!   header overlay, and streams the content.
//! - `HttpConnection` writes the HTTP/1.1 head and body; response bytes are left to the caller.

mod context;
mod request;

pub mod client;
pub mod connection;
pub mod factory;

pub use client::{Connector, HttpClient};
pub use connection::{HttpConnection, HttpStream, OutputStream};
pub use context::ExecutionContext;
pub use factory::{configure_headers, create_user_agent_string, HttpRequestFactory};
pub use request::{Content, Headers, Method, Request};

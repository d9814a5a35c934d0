/*
 * context.rs
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

//! Per-call execution context.

/// Caller-supplied metadata for a single request, separate from the shared `ClientConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    context_user_agent: Option<String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra user-agent token appended to the configured one for this call (e.g. a retry marker).
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            context_user_agent: Some(user_agent.into()),
        }
    }

    pub fn context_user_agent(&self) -> Option<&str> {
        self.context_user_agent.as_deref()
    }

    pub fn set_context_user_agent(&mut self, user_agent: Option<String>) {
        self.context_user_agent = user_agent;
    }
}

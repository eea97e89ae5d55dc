// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server configuration loaded from environment variables.

use crate::core::constants::{config as keys, google, limits};
use crate::core::errors::ServerError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Which transports the server runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Single client over stdin/stdout
    Stdio,
    /// HTTP server-sent events, many sessions
    Sse,
    /// Both at once
    Both,
}

impl TransportMode {
    pub fn runs_stdio(self) -> bool {
        matches!(self, TransportMode::Stdio | TransportMode::Both)
    }

    pub fn runs_sse(self) -> bool {
        matches!(self, TransportMode::Sse | TransportMode::Both)
    }
}

impl FromStr for TransportMode {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "sse" | "http" => Ok(TransportMode::Sse),
            "both" | "all" => Ok(TransportMode::Both),
            other => Err(ServerError::Configuration(format!(
                "Invalid {} value '{}': expected stdio, sse or both",
                keys::ENV_TRANSPORT,
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transport: TransportMode,
    pub bind_address: String,
    pub port: u16,
    pub session_buffer: usize,
    pub body_size_limit_bytes: usize,
    pub http_timeout_secs: u64,
    pub gmail_base_url: String,
    pub calendar_base_url: String,
    pub people_base_url: String,
    pub userinfo_url: String,
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            transport: match lookup(keys::ENV_TRANSPORT).filter(|v| !v.is_empty()) {
                Some(v) => v.parse()?,
                None => defaults.transport,
            },
            bind_address: get(keys::ENV_BIND_ADDRESS, &defaults.bind_address),
            port: parse_or_default(&lookup, keys::ENV_PORT, defaults.port)?,
            session_buffer: parse_or_default(
                &lookup,
                keys::ENV_SESSION_BUFFER,
                defaults.session_buffer,
            )?,
            body_size_limit_bytes: parse_or_default(
                &lookup,
                keys::ENV_BODY_SIZE_LIMIT,
                defaults.body_size_limit_bytes,
            )?,
            http_timeout_secs: parse_or_default(
                &lookup,
                keys::ENV_HTTP_TIMEOUT_SECS,
                defaults.http_timeout_secs,
            )?,
            gmail_base_url: get(keys::ENV_GMAIL_BASE_URL, &defaults.gmail_base_url),
            calendar_base_url: get(keys::ENV_CALENDAR_BASE_URL, &defaults.calendar_base_url),
            people_base_url: get(keys::ENV_PEOPLE_BASE_URL, &defaults.people_base_url),
            userinfo_url: get(keys::ENV_USERINFO_URL, &defaults.userinfo_url),
            log_level: get(keys::ENV_LOG_LEVEL, &defaults.log_level),
            log_format: get(keys::ENV_LOG_FORMAT, &defaults.log_format),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port == 0 {
            return Err(ServerError::Configuration(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }
        if self.session_buffer == 0 {
            return Err(ServerError::Configuration(format!(
                "{} must be greater than 0",
                keys::ENV_SESSION_BUFFER
            )));
        }
        if self.body_size_limit_bytes == 0 {
            return Err(ServerError::Configuration(format!(
                "{} must be greater than 0",
                keys::ENV_BODY_SIZE_LIMIT
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ServerError::Configuration(format!(
                "{} must be greater than 0",
                keys::ENV_HTTP_TIMEOUT_SECS
            )));
        }
        if !matches!(self.log_format.as_str(), "json" | "text") {
            return Err(ServerError::Configuration(format!(
                "Invalid {} value '{}': expected json or text",
                keys::ENV_LOG_FORMAT,
                self.log_format
            )));
        }
        Ok(())
    }

    /// `host:port` the SSE listener binds to
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ServerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).filter(|v| !v.is_empty()) {
        Some(value) => value.trim().parse::<T>().map_err(|e| {
            ServerError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
        }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportMode::Both,
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            session_buffer: limits::DEFAULT_SESSION_BUFFER,
            body_size_limit_bytes: 4 * 1024 * 1024,
            http_timeout_secs: 30,
            gmail_base_url: google::GMAIL_BASE_URL.to_string(),
            calendar_base_url: google::CALENDAR_BASE_URL.to_string(),
            people_base_url: google::PEOPLE_BASE_URL.to_string(),
            userinfo_url: google::USERINFO_URL.to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

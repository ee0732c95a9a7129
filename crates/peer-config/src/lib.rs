/*
 * Copyright 2020 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

#![warn(rust_2018_idioms)]

use std::env::VarError;
use std::time::Duration;

use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised by [`PeerConfig::from_env`] when a recognized environment
/// variable is set but cannot be parsed into its field's type.
#[derive(Debug, Error)]
#[error("invalid value for {var}: {message}")]
pub struct ConfigError {
    var: &'static str,
    message: String,
}

impl ConfigError {
    fn new(var: &'static str, message: impl ToString) -> Self {
        Self {
            var,
            message: message.to_string(),
        }
    }
}

fn env_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e @ VarError::NotUnicode(_)) => Err(ConfigError::new(name, e)),
    }
}

/// Debug-only knobs, split out so they can be serialized separately from
/// the operational settings above them (mirrors the teacher's nested
/// `debug` config section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub print_particle_id: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            print_particle_id: false,
        }
    }
}

/// Process-wide configuration for one peer. Everything a single engine
/// instance needs to come up: the default particle TTL, the relay it
/// dials on start, and the connection-bring-up timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub default_ttl_ms: u32,

    pub debug: DebugConfig,

    pub relay_address: Multiaddr,

    #[serde(with = "humantime_serde")]
    pub dial_timeout: Duration,

    pub skip_connection_check: bool,

    #[serde(with = "humantime_serde")]
    pub check_connection_timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 7000,
            debug: DebugConfig::default(),
            relay_address: "/dns4/localhost/tcp/7777"
                .parse()
                .expect("default relay multiaddr is well-formed"),
            dial_timeout: Duration::from_secs(7),
            skip_connection_check: false,
            check_connection_timeout: Duration::from_secs(10),
        }
    }
}

impl PeerConfig {
    pub fn new(relay_address: Multiaddr) -> Self {
        Self {
            relay_address,
            ..Self::default()
        }
    }

    pub fn with_default_ttl_ms(mut self, ttl_ms: u32) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn with_skip_connection_check(mut self, skip: bool) -> Self {
        self.skip_connection_check = skip;
        self
    }

    /// Resolves a config by layering recognized `FLUENCE_*` environment
    /// variables over [`PeerConfig::default`]. Builder methods applied to
    /// the result still take precedence, matching the usual
    /// defaults-then-env-then-builder precedence for this kind of config.
    ///
    /// Recognized variables: `FLUENCE_DEFAULT_TTL_MS`,
    /// `FLUENCE_RELAY_ADDRESS`, `FLUENCE_DIAL_TIMEOUT_MS`,
    /// `FLUENCE_CHECK_CONNECTION_TIMEOUT_MS`,
    /// `FLUENCE_SKIP_CONNECTION_CHECK`. Unset variables leave the default
    /// untouched; a set-but-unparseable variable is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = env_var("FLUENCE_DEFAULT_TTL_MS")? {
            cfg.default_ttl_ms = v
                .parse()
                .map_err(|e| ConfigError::new("FLUENCE_DEFAULT_TTL_MS", e))?;
        }

        if let Some(v) = env_var("FLUENCE_RELAY_ADDRESS")? {
            cfg.relay_address = v
                .parse()
                .map_err(|e| ConfigError::new("FLUENCE_RELAY_ADDRESS", e))?;
        }

        if let Some(v) = env_var("FLUENCE_DIAL_TIMEOUT_MS")? {
            let ms: u64 = v
                .parse()
                .map_err(|e| ConfigError::new("FLUENCE_DIAL_TIMEOUT_MS", e))?;
            cfg.dial_timeout = Duration::from_millis(ms);
        }

        if let Some(v) = env_var("FLUENCE_CHECK_CONNECTION_TIMEOUT_MS")? {
            let ms: u64 = v
                .parse()
                .map_err(|e| ConfigError::new("FLUENCE_CHECK_CONNECTION_TIMEOUT_MS", e))?;
            cfg.check_connection_timeout = Duration::from_millis(ms);
        }

        if let Some(v) = env_var("FLUENCE_SKIP_CONNECTION_CHECK")? {
            cfg.skip_connection_check = match v.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::new(
                        "FLUENCE_SKIP_CONNECTION_CHECK",
                        "expected true/false or 1/0",
                    ))
                }
            };
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // `from_env` reads process-global state; serialize the tests that
    // touch it so they don't interleave with each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_spec() {
        let cfg = PeerConfig::default();
        assert_eq!(cfg.default_ttl_ms, 7000);
        assert!(!cfg.debug.print_particle_id);
        assert!(!cfg.skip_connection_check);
    }

    #[test]
    fn builder_overrides_apply() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/7001".parse().unwrap();
        let cfg = PeerConfig::new(addr.clone())
            .with_default_ttl_ms(1000)
            .with_skip_connection_check(true);

        assert_eq!(cfg.relay_address, addr);
        assert_eq!(cfg.default_ttl_ms, 1000);
        assert!(cfg.skip_connection_check);
    }

    #[test]
    fn from_env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("FLUENCE_DEFAULT_TTL_MS", "1500");
        std::env::set_var("FLUENCE_SKIP_CONNECTION_CHECK", "true");

        let cfg = PeerConfig::from_env().unwrap();

        std::env::remove_var("FLUENCE_DEFAULT_TTL_MS");
        std::env::remove_var("FLUENCE_SKIP_CONNECTION_CHECK");

        assert_eq!(cfg.default_ttl_ms, 1500);
        assert!(cfg.skip_connection_check);
        assert_eq!(cfg.relay_address, PeerConfig::default().relay_address);
    }

    #[test]
    fn from_env_rejects_unparseable_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("FLUENCE_DEFAULT_TTL_MS", "not-a-number");

        let result = PeerConfig::from_env();

        std::env::remove_var("FLUENCE_DEFAULT_TTL_MS");

        assert!(result.is_err());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Identity and authentication material presented on every PDU.
    pub identity: Identity,
    /// Cluster version the session expects the drive to be running.
    #[serde(rename = "ClusterVersion", default)]
    pub cluster_version: i64,
    /// Where to connect, and how.
    pub transport: TransportConfig,
    /// Implementation/runtime parameters that live outside the wire
    /// protocol.
    pub runtime: RuntimeConfig,
}

/// Identity parameters carried in every `HmacAuth`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Identity {
    #[serde(rename = "Identity")]
    /// Numeric identity registered with the drive.
    pub id: i64,

    #[serde(rename = "Key")]
    /// Shared HMAC-SHA1 secret for this identity.
    pub key: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    Plain,
    Tls,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TransportConfig {
    #[serde(rename = "TargetAddress")]
    /// `host:port` of the drive or emulator.
    pub target_address: String,

    #[serde(rename = "Tls", default = "default_tls_mode")]
    pub tls: TlsMode,
}

fn default_tls_mode() -> TlsMode {
    TlsMode::Plain
}

#[derive(Deserialize, Serialize, Debug, Clone)]
/// Runtime-only settings that do not map to wire fields.
pub struct RuntimeConfig {
    #[serde(rename = "TimeoutConnection", with = "serde_secs")]
    /// Timeout for establishing the TCP connection and completing the
    /// handshake (waiting on `connectionReady`).
    pub timeout_connection: Duration,

    #[serde(rename = "TimeoutOperation", with = "serde_secs")]
    /// Default per-operation deadline when the caller doesn't supply one.
    pub timeout_operation: Duration,
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates invariants that `serde` alone cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.identity.key.is_empty(), "Key must not be empty");
        ensure!(
            !self.transport.target_address.is_empty(),
            "TargetAddress must not be empty"
        );
        ensure!(
            self.runtime.timeout_connection > Duration::ZERO,
            "TimeoutConnection must be > 0"
        );
        ensure!(
            self.runtime.timeout_operation > Duration::ZERO,
            "TimeoutOperation must be > 0"
        );
        Ok(())
    }
}

/// Serde helper for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

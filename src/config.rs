// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `ledger.redb` | unset (in-memory ledger) |
//! | `CONTRACT_ADDRESS` | Address encrypted inputs are bound to | `0x5FbDB2315678afecb367f032d93F642f64180aa3` |
//! | `CHAIN_ID` | Chain id in the EIP-712 decryption domain | `31337` |
//! | `AUTH_MODE` | `signed` or `insecure` (`dev` builds only) | `signed` |
//! | `COPROCESSOR_SIGNER_KEY` | Hex private key signing input proofs | random per start |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::{address, Address};

use crate::auth::AuthMode;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the ledger data directory.
///
/// When unset the ledger lives in memory and is lost on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const AUTH_MODE_ENV: &str = "AUTH_MODE";
pub const COPROCESSOR_SIGNER_KEY_ENV: &str = "COPROCESSOR_SIGNER_KEY";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Local development deployment address.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

/// Local development chain (Hardhat / Anvil).
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// File name of the ledger database inside `DATA_DIR`.
pub const LEDGER_FILE_NAME: &str = "ledger.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),

    #[error("AUTH_MODE=insecure requires a build with the `dev` feature")]
    InsecureAuthNotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub contract_address: Address,
    pub chain_id: u64,
    pub auth_mode: AuthMode,
    /// Hex private key; `None` means a fresh random key.
    pub coprocessor_signer_key: Option<String>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(raw) => parse(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };
        let bind_addr = parse(HOST_ENV, &format!("{host}:{port}"))?;

        let contract_address = match var(CONTRACT_ADDRESS_ENV) {
            Some(raw) => parse(CONTRACT_ADDRESS_ENV, &raw)?,
            None => DEFAULT_CONTRACT_ADDRESS,
        };
        let chain_id = match var(CHAIN_ID_ENV) {
            Some(raw) => parse(CHAIN_ID_ENV, &raw)?,
            None => DEFAULT_CHAIN_ID,
        };

        let auth_mode = match var(AUTH_MODE_ENV).as_deref().map(str::to_ascii_lowercase) {
            None => AuthMode::Signed,
            Some(mode) if mode == "signed" => AuthMode::Signed,
            Some(mode) if mode == "insecure" => {
                if !cfg!(feature = "dev") {
                    return Err(ConfigError::InsecureAuthNotAllowed);
                }
                AuthMode::Insecure
            }
            Some(other) => return Err(invalid(AUTH_MODE_ENV, &other, "expected signed or insecure")),
        };

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid(LOG_FORMAT_ENV, other, "expected json or pretty")),
        };

        Ok(Self {
            bind_addr,
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            contract_address,
            chain_id,
            auth_mode,
            coprocessor_signer_key: var(COPROCESSOR_SIGNER_KEY_ENV),
            tls,
            log_format,
        })
    }

    /// Ledger file location, when persistent.
    pub fn ledger_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(LEDGER_FILE_NAME))
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(var, raw, &e.to_string()))
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.contract_address, DEFAULT_CONTRACT_ADDRESS);
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.auth_mode, AuthMode::Signed);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.data_dir.is_none());
        assert!(config.ledger_path().is_none());
        assert!(config.tls.is_none());
    }

    #[test]
    fn explicit_values_are_parsed() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATA_DIR", "/var/lib/ledger"),
            ("CHAIN_ID", "11155111"),
            ("CONTRACT_ADDRESS", "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
            ("LOG_FORMAT", "json"),
            ("TLS_CERT_PATH", "/tls/cert.pem"),
            ("TLS_KEY_PATH", "/tls/key.pem"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(
            config.ledger_path().unwrap(),
            PathBuf::from("/var/lib/ledger/ledger.redb")
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tls.unwrap().key, PathBuf::from("/tls/key.pem"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("CONTRACT_ADDRESS", "0x1234")]),
            Err(ConfigError::Invalid { var: "CONTRACT_ADDRESS", .. })
        ));
        assert!(matches!(
            config_from(&[("AUTH_MODE", "trust-me")]),
            Err(ConfigError::Invalid { var: "AUTH_MODE", .. })
        ));
    }

    #[test]
    fn tls_paths_must_come_in_pairs() {
        assert!(matches!(
            config_from(&[("TLS_CERT_PATH", "/tls/cert.pem")]),
            Err(ConfigError::Incomplete(..))
        ));
    }

    #[cfg(not(feature = "dev"))]
    #[test]
    fn insecure_auth_requires_dev_build() {
        assert!(matches!(
            config_from(&[("AUTH_MODE", "insecure")]),
            Err(ConfigError::InsecureAuthNotAllowed)
        ));
    }

    #[cfg(feature = "dev")]
    #[test]
    fn insecure_auth_in_dev_build() {
        let config = config_from(&[("AUTH_MODE", "insecure")]).unwrap();
        assert_eq!(config.auth_mode, AuthMode::Insecure);
    }
}

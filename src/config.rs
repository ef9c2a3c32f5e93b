//! Backend selection from configuration files or connection URLs.

use std::fmt;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use url::Url;

use crate::backends::{AnyBackend, MsAccess, MySql, Postgres, Sqlite};
use crate::error::{DbRsError, Result};
use crate::traits::BindingMode;

/// Settings for a backend reached over the network.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// `host` or `host:port`
    pub server: String,
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub binding: BindingMode,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("binding", &self.binding)
            .finish()
    }
}

/// Settings for a file-backed backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub binding: BindingMode,
}

/// Which backend to use and how to reach it.
///
/// Deserializes from a table tagged by `backend`:
///
/// ```
/// use dbrs::BackendConfig;
///
/// let config: BackendConfig = serde_json::from_str(
///     r#"{ "backend": "sqlite", "path": "data/test.db", "binding": "legacy" }"#,
/// )
/// .unwrap();
/// let backend = config.into_backend().unwrap();
/// # let _ = backend;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    Postgres(ServerConfig),
    #[serde(rename = "mysql")]
    MySql(ServerConfig),
    MsAccess(FileConfig),
    Sqlite(FileConfig),
}

fn invalid(message: impl Into<String>) -> DbRsError {
    DbRsError::InvalidConfig(message.into())
}

fn decode(component: &str) -> Result<String> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| invalid("connection URL component is not valid UTF-8"))
}

impl ServerConfig {
    fn from_url(url: &str) -> Result<Self> {
        // the message of a url::ParseError never echoes the input
        let parsed =
            Url::parse(url).map_err(|e| invalid(format!("malformed connection URL: {e}")))?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("connection URL has no host"))?;
        let server = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let database = decode(parsed.path().trim_start_matches('/'))?;
        if database.is_empty() {
            return Err(invalid("connection URL has no database name"));
        }

        Ok(Self {
            server,
            database,
            user: decode(parsed.username())?,
            password: parsed.password().map(decode).transpose()?.unwrap_or_default(),
            binding: BindingMode::default(),
        })
    }
}

impl FileConfig {
    fn from_path(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(invalid("connection URL has no file path"));
        }
        Ok(Self {
            path: PathBuf::from(decode(path)?),
            binding: BindingMode::default(),
        })
    }
}

impl BackendConfig {
    /// Parse a connection URL.
    ///
    /// Accepted schemes: `postgres`, `postgresql`, `mysql`, `sqlite` and
    /// `ucanaccess`. Query parameters are ignored.
    pub fn from_url(url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| invalid("connection URL has no scheme"))?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => ServerConfig::from_url(url).map(Self::Postgres),
            "mysql" => ServerConfig::from_url(url).map(Self::MySql),
            "sqlite" => FileConfig::from_path(rest).map(Self::Sqlite),
            "ucanaccess" => FileConfig::from_path(rest).map(Self::MsAccess),
            other => Err(invalid(format!("unsupported scheme {other:?}"))),
        }
    }

    pub fn binding_mode(&self) -> BindingMode {
        match self {
            Self::Postgres(c) | Self::MySql(c) => c.binding,
            Self::MsAccess(c) | Self::Sqlite(c) => c.binding,
        }
    }

    pub fn with_binding_mode(mut self, mode: BindingMode) -> Self {
        match &mut self {
            Self::Postgres(c) | Self::MySql(c) => c.binding = mode,
            Self::MsAccess(c) | Self::Sqlite(c) => c.binding = mode,
        }
        self
    }

    /// Build the configured backend.
    pub fn into_backend(self) -> Result<AnyBackend> {
        let backend = match self {
            Self::Postgres(c) => Postgres::new(&c.server, &c.database, &c.user, &c.password)?
                .with_binding_mode(c.binding)
                .into(),
            Self::MySql(c) => MySql::new(&c.server, &c.database, &c.user, &c.password)?
                .with_binding_mode(c.binding)
                .into(),
            Self::MsAccess(c) => MsAccess::new(&c.path).with_binding_mode(c.binding).into(),
            Self::Sqlite(c) => Sqlite::new(&c.path).with_binding_mode(c.binding).into(),
        };
        Ok(backend)
    }
}

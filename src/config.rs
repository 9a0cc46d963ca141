use std::str::FromStr;

use clap::Args;
use sqlx::postgres::PgConnectOptions;

use crate::error::{Error, Result};

/// Where to connect. Every flag falls back to the usual libpq variable.
#[derive(Debug, Clone, Args)]
pub struct ConnectionConfig {
    /// Server host
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub host: String,

    /// Server port
    #[arg(long, env = "PGPORT", default_value_t = 4566)]
    pub port: u16,

    /// Database name
    #[arg(long, env = "PGDATABASE", default_value = "dev")]
    pub dbname: String,

    #[arg(long, env = "PGUSER", default_value = "root")]
    pub user: String,

    /// Optional; trust or peer authentication needs none
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Full connection URL, takes precedence over the individual flags
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: "localhost".to_owned(),
            port: 4566,
            dbname: "dev".to_owned(),
            user: "root".to_owned(),
            password: None,
            database_url: None,
        }
    }
}

impl ConnectionConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        ConnectionConfig {
            database_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_some() {
            return Ok(());
        }
        if self.host.is_empty() {
            return Err(Error::Config("host is empty".to_owned()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must not be 0".to_owned()));
        }
        if self.dbname.is_empty() {
            return Err(Error::Config("database name is empty".to_owned()));
        }
        if self.user.is_empty() {
            return Err(Error::Config("user is empty".to_owned()));
        }
        Ok(())
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        self.validate()?;

        if let Some(url) = &self.database_url {
            return PgConnectOptions::from_str(url).map_err(|e| Error::Config(e.to_string()));
        }

        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .application_name(env!("CARGO_PKG_NAME"));

        Ok(match &self.password {
            Some(password) => options.password(password),
            None => options,
        })
    }

    /// Endpoint description without credentials, for logs.
    pub fn describe(&self) -> String {
        match &self.database_url {
            Some(_) => "DATABASE_URL".to_owned(),
            None => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname),
        }
    }
}

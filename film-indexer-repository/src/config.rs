//! Configuration types for the source database connection.

use sqlx::postgres::PgConnectOptions;

/// Connection parameters for the Postgres source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum number of pooled connections.
    ///
    /// Every stage shares one connection by default.
    pub max_connections: u32,
}

impl SourceConfig {
    /// Create a config with the default host, port and a single connection.
    pub fn new(dbname: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            max_connections: 1,
        }
    }

    pub(crate) fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .password(&self.password)
    }
}

use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::error::CommonError;
use libsql::params::IntoParams;
use libsql::{Database, Rows};
use tracing::info;
use url::Url;

#[derive(Debug, Clone)]
pub struct Connection(pub libsql::Connection);

impl Connection {
    pub fn new(connection: libsql::Connection) -> Self {
        Self(connection)
    }
}

impl Deref for Connection {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[macro_export]
macro_rules! execute_with_retry {
    ($operation:expr) => {
        execute_with_retry!($operation, 10)
    };
    ($operation:expr, $max_retries:expr) => {{
        async {
            let mut _retries = 0u32;
            let _max_retries: u32 = $max_retries;

            loop {
                match $operation.await {
                    Ok(result) => break Ok(result),
                    Err(err) => {
                        let err_str = err.to_string();
                        if err_str.contains("database is locked") || err_str.contains("SQLITE_BUSY")
                        {
                            tracing::warn!("Database is locked, retrying... {:?}", err);
                            if _retries >= _max_retries {
                                break Err(err);
                            }

                            _retries += 1;

                            let delay_us = 10_000 * (1 << _retries.min(6));
                            tokio::time::sleep(std::time::Duration::from_micros(delay_us)).await;
                        } else {
                            tracing::error!("Error executing with retry: {:?}", err);
                            break Err(err);
                        }
                    }
                }
            }
        }
        .await
    }};
}

impl Connection {
    /// Execute a statement, retrying while the database is busy. Returns the
    /// number of changed rows.
    pub async fn execute(&self, sql: &str, params: impl IntoParams) -> libsql::Result<u64> {
        tracing::trace!("executing `{}`", sql);
        let params = params.into_params()?;
        execute_with_retry!(self.0.execute(sql, params.clone()), 10)
    }

    /// Execute a batch of `;`-separated statements.
    pub async fn execute_batch(&self, sql: &str) -> libsql::Result<()> {
        tracing::trace!("executing batch `{}`", sql);
        execute_with_retry!(self.0.execute_batch(sql), 10).map(|_| ())
    }

    /// Run a query and return its rows.
    pub async fn query(&self, sql: &str, params: impl IntoParams) -> libsql::Result<Rows> {
        let stmt = self.prepare(sql).await?;
        let params = params.into_params()?;
        execute_with_retry!(stmt.query(params.clone()), 10)
    }
}

/// Where the database lives. Parsed from `libsql://<path>?mode=local` or a
/// remote `libsql://host?auth=<token>` url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionType {
    Local { path_to_db_file: PathBuf },
    Remote { remote_url: String, auth_token: String },
}

fn get_libsql_path(url: &Url) -> String {
    if url.as_str().starts_with("libsql://./") {
        format!(".{}", url.path())
    } else {
        format!("{}{}", url.host_str().unwrap_or_default(), url.path())
    }
}

impl TryFrom<Url> for ConnectionType {
    type Error = CommonError;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        if url.scheme() != "libsql" {
            let scheme = url.scheme();
            return Err(CommonError::InvalidRequest {
                msg: format!("invalid database url scheme: {scheme}"),
                source: None,
            });
        }

        let query_value = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.to_string())
        };

        match query_value("mode").as_deref() {
            Some("local") => Ok(ConnectionType::Local {
                path_to_db_file: PathBuf::from(get_libsql_path(&url)),
            }),
            Some(mode) => Err(CommonError::InvalidRequest {
                msg: format!("invalid database mode: {mode}"),
                source: None,
            }),
            None => {
                let auth_token = query_value("auth").ok_or_else(|| CommonError::InvalidRequest {
                    msg: "remote database url requires an auth query parameter".to_string(),
                    source: None,
                })?;
                let mut remote_url = url.clone();
                remote_url.set_query(None);
                Ok(ConnectionType::Remote {
                    remote_url: remote_url.to_string(),
                    auth_token,
                })
            }
        }
    }
}

/// Build a local connection url for a database file.
pub fn local_connection_url(path: &Path) -> Result<Url, CommonError> {
    let path = path.to_string_lossy();
    let mut conn_url = Url::parse(&format!("libsql://{path}"))?;
    conn_url.query_pairs_mut().append_pair("mode", "local");
    Ok(conn_url)
}

/// Ordered `filename -> sql` map. Only `*.up.sql` entries are applied.
pub type Migrations<'a> = BTreeMap<&'a str, &'a str>;

pub async fn run_migrations(
    conn: &Connection,
    migrations: &Migrations<'_>,
) -> Result<(), CommonError> {
    for (filename, contents) in migrations.iter().filter(|(name, _)| name.contains(".up.")) {
        tracing::debug!(migration = %filename, "applying migration");
        conn.execute_batch(contents).await?;
    }
    Ok(())
}

pub async fn establish_db_connection(
    connection_string: &Url,
    migrations: Option<Migrations<'_>>,
) -> Result<(Database, Connection), CommonError> {
    let connection_type = ConnectionType::try_from(connection_string.clone())?;

    let db = match connection_type {
        ConnectionType::Local { path_to_db_file } => {
            info!(path = %path_to_db_file.display(), "establishing local connection");
            if let Some(parent) = path_to_db_file.parent() {
                if !parent.as_os_str().is_empty() && !std::fs::exists(parent)? {
                    std::fs::create_dir_all(parent)?;
                }
            }
            libsql::Builder::new_local(path_to_db_file).build().await?
        }
        ConnectionType::Remote {
            remote_url,
            auth_token,
        } => {
            info!("establishing remote connection");
            libsql::Builder::new_remote(remote_url, auth_token)
                .build()
                .await?
        }
    };

    let conn = Connection::new(db.connect()?);
    if let Some(migrations) = migrations {
        run_migrations(&conn, &migrations).await?;
    }

    Ok((db, conn))
}

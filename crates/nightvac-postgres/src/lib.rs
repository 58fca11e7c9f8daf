//! Nightvac PostgreSQL Layer
//!
//! Implements the `StatsProvider` and `Maintainer` traits over a single
//! `tokio-postgres` connection.
//!
//! # Architecture
//!
//! - One connection per run, opened at start and dropped at the end
//! - A private current-thread tokio runtime drives the async client, so the
//!   scheduler sees plain blocking calls
//! - Cost throttling (`vacuum_cost_delay`, `vacuum_cost_limit`) is applied to
//!   the session once, right after connecting
//!
//! # Examples
//!
//! ```no_run
//! use nightvac_domain::traits::StatsProvider;
//! use nightvac_domain::VacuumCost;
//! use nightvac_postgres::PgSession;
//!
//! let cost = VacuumCost { delay_ms: 2, limit: 200 };
//! let session = PgSession::connect("host=localhost user=postgres", cost).unwrap();
//! let tables = session.snapshot().unwrap();
//! println!("{} tables", tables.len());
//! ```

#![warn(missing_docs)]

mod query;

use nightvac_domain::traits::{Maintainer, StatsProvider};
use nightvac_domain::{TableName, TableStat, VacuumCost};
use query::RawStat;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::{Client, NoTls};

/// Errors that can occur talking to PostgreSQL
#[derive(Error, Debug)]
pub enum PgError {
    /// Could not start the runtime driving the connection
    #[error("Failed to start database runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// Could not connect or authenticate
    #[error("Could not connect to database: {}", describe(.0))]
    Connect(#[source] tokio_postgres::Error),

    /// A statement failed
    #[error("{}", describe(.0))]
    Query(#[from] tokio_postgres::Error),

    /// `server_version_num` was not a number
    #[error("Unexpected server version: {0}")]
    Version(String),
}

/// Prefer the server's own message over the client's generic "db error"
fn describe(error: &tokio_postgres::Error) -> String {
    match error.as_db_error() {
        Some(db) => db.message().to_string(),
        None => error.to_string(),
    }
}

/// A maintenance session on one database
///
/// # Thread Safety
///
/// The session owns a current-thread runtime and is meant to be used from a
/// single thread for the whole run.
pub struct PgSession {
    client: Client,
    runtime: Runtime,
    server_major: u32,
}

impl PgSession {
    /// Connect with a libpq-style connection string and apply the cost settings
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nightvac_domain::VacuumCost;
    /// use nightvac_postgres::PgSession;
    ///
    /// let cost = VacuumCost { delay_ms: 2, limit: 200 };
    /// let session = PgSession::connect("postgresql://postgres@localhost/app", cost).unwrap();
    /// assert!(session.server_major() >= 9);
    /// ```
    pub fn connect(conninfo: &str, cost: VacuumCost) -> Result<Self, PgError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let client = runtime.block_on(async {
            let (client, connection) = tokio_postgres::connect(conninfo, NoTls)
                .await
                .map_err(PgError::Connect)?;

            // Spawn the connection handler
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!("Postgres connection error: {}", e);
                }
            });

            Ok::<_, PgError>(client)
        })?;

        let mut session = Self {
            client,
            runtime,
            server_major: 0,
        };
        session.server_major = session.detect_server_major()?;
        tracing::debug!("Postgres major version: {}", session.server_major);
        session.apply_cost(cost)?;

        Ok(session)
    }

    /// Server major version (e.g. 15)
    pub fn server_major(&self) -> u32 {
        self.server_major
    }

    fn detect_server_major(&self) -> Result<u32, PgError> {
        let row = self
            .runtime
            .block_on(self.client.query_one("SHOW server_version_num", &[]))?;
        let version_num: String = row.try_get(0)?;
        query::parse_server_major(&version_num).ok_or(PgError::Version(version_num))
    }

    fn apply_cost(&self, cost: VacuumCost) -> Result<(), PgError> {
        for (setting, value) in [
            ("vacuum_cost_delay", cost.delay_ms),
            ("vacuum_cost_limit", cost.limit),
        ] {
            tracing::debug!("SELECT set_config('{}', '{}', false);", setting, value);
            self.runtime.block_on(self.client.execute(
                "SELECT set_config($1, $2, false)",
                &[&setting, &value.to_string()],
            ))?;
        }
        Ok(())
    }
}

impl StatsProvider for PgSession {
    type Error = PgError;

    fn snapshot(&self) -> Result<Vec<TableStat>, Self::Error> {
        let sql = query::stats_query(self.server_major);
        if self.server_major < query::INSERT_TRACKING_MAJOR {
            tracing::debug!(
                "Server {} predates n_ins_since_vacuum, insert-driven vacuums disabled",
                self.server_major
            );
        }

        let rows = self.runtime.block_on(self.client.query(sql.as_str(), &[]))?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in rows {
            let raw = RawStat {
                schema: row.try_get(0)?,
                name: row.try_get(1)?,
                freeze_age: row.try_get(2)?,
                dead_tuples: row.try_get(3)?,
                reltuples: row.try_get(4)?,
                inserted: row.try_get(5)?,
                since_autovacuum_secs: row.try_get(6)?,
            };
            stats.push(raw.into_stat());
        }
        Ok(stats)
    }
}

impl Maintainer for PgSession {
    type Error = PgError;

    fn vacuum(&mut self, table: &TableName) -> Result<(), Self::Error> {
        // Simple protocol: VACUUM refuses to run inside a transaction block
        let statement = format!("VACUUM {}", table.quoted());
        self.runtime.block_on(self.client.batch_execute(&statement))?;
        Ok(())
    }
}

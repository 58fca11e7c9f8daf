//! Table module - per-table statistics as read from the catalog

use std::fmt;
use std::time::Duration;

/// Schema-qualified table identifier
///
/// Ordering is lexicographic on `(schema, name)`, which the selector uses as
/// its deterministic tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName {
    /// Schema (namespace) the table lives in
    pub schema: String,

    /// Relation name inside the schema
    pub name: String,
}

impl TableName {
    /// Create a new table name
    ///
    /// # Examples
    ///
    /// ```
    /// use nightvac_domain::TableName;
    ///
    /// let table = TableName::new("public", "orders");
    /// assert_eq!(table.to_string(), "public.orders");
    /// ```
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Render as a double-quoted SQL identifier, safe to splice into a command
    ///
    /// Embedded double quotes are doubled, per the SQL standard.
    ///
    /// # Examples
    ///
    /// ```
    /// use nightvac_domain::TableName;
    ///
    /// let table = TableName::new("public", "odd\"name");
    /// assert_eq!(table.quoted(), r#""public"."odd""name""#);
    /// ```
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// One statistics record per table in the target database
///
/// The snapshot is read once at the start of a run; a table vacuumed mid-run
/// keeps its original numbers until the next run.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStat {
    /// Schema-qualified name, unique per snapshot
    pub identifier: TableName,

    /// Transaction-id age of the oldest unfrozen row version
    pub freeze_age: u64,

    /// Obsolete row versions awaiting vacuum
    pub dead_tuple_count: u64,

    /// Planner estimate of live rows; only used as a ratio denominator
    pub live_tuple_estimate: u64,

    /// Rows inserted since the last vacuum (`None` before PostgreSQL 13)
    pub inserted_since_vacuum: Option<u64>,

    /// Time elapsed since autovacuum last processed the table (`None` if never)
    pub since_last_autovacuum: Option<Duration>,
}

impl TableStat {
    /// Create a record with only the core counters set
    ///
    /// # Examples
    ///
    /// ```
    /// use nightvac_domain::{TableName, TableStat};
    ///
    /// let stat = TableStat::new(TableName::new("public", "events"), 10, 1000, 10_000);
    /// assert_eq!(stat.dead_ratio(), Some(0.1));
    /// assert!(stat.inserted_since_vacuum.is_none());
    /// ```
    pub fn new(
        identifier: TableName,
        freeze_age: u64,
        dead_tuple_count: u64,
        live_tuple_estimate: u64,
    ) -> Self {
        Self {
            identifier,
            freeze_age,
            dead_tuple_count,
            live_tuple_estimate,
            inserted_since_vacuum: None,
            since_last_autovacuum: None,
        }
    }

    /// Set the inserted-since-vacuum counter
    pub fn with_inserted(mut self, inserted: u64) -> Self {
        self.inserted_since_vacuum = Some(inserted);
        self
    }

    /// Set the time since the last autovacuum
    pub fn with_last_autovacuum(mut self, since: Duration) -> Self {
        self.since_last_autovacuum = Some(since);
        self
    }

    /// Dead tuples per live tuple, undefined when the estimate is zero
    pub fn dead_ratio(&self) -> Option<f64> {
        ratio(self.dead_tuple_count, self.live_tuple_estimate)
    }

    /// Inserted tuples per live tuple, undefined when either side is unknown or zero
    pub fn insert_ratio(&self) -> Option<f64> {
        self.inserted_since_vacuum
            .and_then(|inserted| ratio(inserted, self.live_tuple_estimate))
    }
}

fn ratio(count: u64, live: u64) -> Option<f64> {
    if live == 0 {
        None
    } else {
        Some(count as f64 / live as f64)
    }
}

/// Cost-based vacuum throttling applied to the maintenance session
///
/// Opaque to the scheduler; forwarded verbatim as `vacuum_cost_delay` (ms)
/// and `vacuum_cost_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VacuumCost {
    /// `vacuum_cost_delay` in milliseconds
    pub delay_ms: u32,

    /// `vacuum_cost_limit`
    pub limit: u32,
}

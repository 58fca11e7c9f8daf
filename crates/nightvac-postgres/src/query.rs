//! Catalog queries and row conversion

use nightvac_domain::{TableName, TableStat};
use std::time::Duration;

/// First server release that tracks `n_ins_since_vacuum`
pub(crate) const INSERT_TRACKING_MAJOR: u32 = 13;

/// Build the statistics query for a server major version
///
/// Covers ordinary tables and TOAST tables, skipping temporary tables that
/// belong to other sessions (VACUUM cannot process those).
pub(crate) fn stats_query(server_major: u32) -> String {
    let inserted = if server_major >= INSERT_TRACKING_MAJOR {
        "s.n_ins_since_vacuum::bigint"
    } else {
        "NULL::bigint"
    };

    format!(
        "SELECT
    ns.nspname::text,
    c.relname::text,
    age(c.relfrozenxid)::bigint,
    COALESCE(s.n_dead_tup, 0)::bigint,
    c.reltuples::float8,
    {inserted},
    EXTRACT(EPOCH FROM (now() - s.last_autovacuum))::float8
FROM pg_class c
JOIN pg_namespace ns ON c.relnamespace = ns.oid
LEFT JOIN pg_stat_all_tables s ON s.relid = c.oid
WHERE
    c.relkind = ANY(ARRAY['r', 't'])
    AND (c.relpersistence <> 't' OR ns.oid = pg_my_temp_schema())",
        inserted = inserted
    )
}

/// Column values of one statistics row, as the server returns them
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawStat {
    pub schema: String,
    pub name: String,
    pub freeze_age: i64,
    pub dead_tuples: i64,
    pub reltuples: f64,
    pub inserted: Option<i64>,
    pub since_autovacuum_secs: Option<f64>,
}

impl RawStat {
    /// Normalize server values into a domain record
    ///
    /// `reltuples` is `-1` for never-analyzed tables on PostgreSQL 14+ and is
    /// clamped to zero, like every other negative counter.
    pub fn into_stat(self) -> TableStat {
        TableStat {
            identifier: TableName::new(self.schema, self.name),
            freeze_age: non_negative(self.freeze_age),
            dead_tuple_count: non_negative(self.dead_tuples),
            live_tuple_estimate: estimate(self.reltuples),
            inserted_since_vacuum: self.inserted.map(non_negative),
            since_last_autovacuum: self
                .since_autovacuum_secs
                .filter(|secs| secs.is_finite())
                .map(|secs| Duration::from_secs_f64(secs.max(0.0))),
        }
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn estimate(reltuples: f64) -> u64 {
    if reltuples.is_finite() && reltuples > 0.0 {
        reltuples.round() as u64
    } else {
        0
    }
}

/// Major version from `server_version_num` (e.g. `150004` → 15, `90624` → 9)
pub(crate) fn parse_server_major(version_num: &str) -> Option<u32> {
    version_num.trim().parse::<u32>().ok().map(|num| num / 10_000)
}

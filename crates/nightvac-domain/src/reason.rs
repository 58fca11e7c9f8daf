//! Reason module - why a table ended up in the work queue

use std::fmt;

/// Qualification reason attached to every scheduled table
///
/// Variants are declared in priority order: a table qualifying for several
/// reasons keeps only the first one.
/// - FreezeAge: transaction-id age is past the anti-wraparound threshold
/// - DeadTuples: obsolete row versions are past the autovacuum threshold
/// - InsertedTuples: inserts since the last vacuum are past the insert threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reason {
    /// Freeze age above `freeze_max_age`
    FreezeAge,

    /// Dead tuples above threshold plus scaled live estimate
    DeadTuples,

    /// Inserted tuples above insert threshold plus scaled live estimate
    InsertedTuples,
}

impl Reason {
    /// All reasons, highest priority first
    pub const ALL: [Reason; 3] = [Reason::FreezeAge, Reason::DeadTuples, Reason::InsertedTuples];

    /// Get the reason name as it appears in logs and output
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::FreezeAge => "FREEZE_AGE",
            Reason::DeadTuples => "DEAD_TUPLES",
            Reason::InsertedTuples => "INSERTED_TUPLES",
        }
    }

    /// Parse a reason from its name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FREEZE_AGE" => Some(Reason::FreezeAge),
            "DEAD_TUPLES" => Some(Reason::DeadTuples),
            "INSERTED_TUPLES" => Some(Reason::InsertedTuples),
            _ => None,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Reason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid reason: {}", s))
    }
}

//! Shared primitive types used across the entire ledger.

/// A stable, unique identifier for any entity in the ledger.
pub type EntityId = String;

/// Roster account number. The cross-week join key between a roster
/// player and their per-week records.
pub type AccountNumber = u32;

/// A money amount in whole currency units (fractions allowed).
pub type Money = f64;

/// An RFC 3339 UTC timestamp with millisecond precision.
/// Lexicographic order is chronological order.
pub type Timestamp = String;

/// House commission on a winning stake.
pub const VIG_RATE: Money = 0.15;

/// Version written into every persisted snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

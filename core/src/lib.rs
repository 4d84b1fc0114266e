//! Slide: a personal ledger for a weekly settlement pool.
//!
//! Module map, leaves first:
//!   player_week  one player's stake and payment state in one week
//!   player       roster player with a running carry balance
//!   week         a week's members, totals, and close lifecycle
//!   ledger       the store that owns both and coordinates carries
//!
//! Persistence goes through `store::KeyValueStore`; cloud backup through
//! `remote::RemoteDocumentService`, driven by `sync::CloudSync`.

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod player;
pub mod player_week;
pub mod remote;
pub mod reports;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod types;
pub mod week;

pub use ledger::LedgerStore;
pub use player::{CarryPayment, PlayerRecord};
pub use player_week::{PaymentStatus, PlayerWeekRecord};
pub use week::{WeekLedger, WeekStatus};

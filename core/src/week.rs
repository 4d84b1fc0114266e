//! One settlement period: its member records, derived totals, and the
//! close lifecycle.
//!
//! LIFECYCLE:
//!   active ──start_close──▶ pending_close ──finalize_close──▶ closed
//!     ▲                         │
//!     └───────cancel_close──────┘
//!
//! There is no way out of `closed` from here alone. Reopening has to undo
//! roster balances first and is driven by `LedgerStore::reopen_week`.
//!
//! RULE: every aggregate is a pure function of the member records.
//! Anything that touches a member's money fields calls
//! `calculate_totals()` before returning.

use crate::{
    player_week::{PaymentStatus, PlayerWeekRecord},
    types::{AccountNumber, EntityId, Money, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    #[default]
    Active,
    PendingClose,
    Closed,
}

impl WeekStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStatus::Active => "active",
            WeekStatus::PendingClose => "pending_close",
            WeekStatus::Closed => "closed",
        }
    }
}

/// What a closed week hands to the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct CarryForwardEntry {
    pub name: String,
    pub account_number: AccountNumber,
    pub carry_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredWeek")]
pub struct WeekLedger {
    pub id: EntityId,
    pub name: String,
    players: Vec<PlayerWeekRecord>,
    pub start: Timestamp,
    pub end: Timestamp,
    in_total: Money,
    out_total: Money,
    result: Money,
    vig: Money,
    status: WeekStatus,
    expected_in: Money,
    actual_collected: Money,
    total_carried_in: Money,
    total_carried_out: Money,
    closed_date: Option<Timestamp>,
    pub previous_week_id: Option<EntityId>,
    pub next_week_id: Option<EntityId>,
    created: Timestamp,
    updated: Timestamp,
}

impl WeekLedger {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
        now: &str,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            players: Vec::new(),
            start,
            end,
            in_total: 0.0,
            out_total: 0.0,
            result: 0.0,
            vig: 0.0,
            status: WeekStatus::Active,
            expected_in: 0.0,
            actual_collected: 0.0,
            total_carried_in: 0.0,
            total_carried_out: 0.0,
            closed_date: None,
            previous_week_id: None,
            next_week_id: None,
            created: now.to_string(),
            updated: now.to_string(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────

    pub fn players(&self) -> &[PlayerWeekRecord] { &self.players }
    pub fn in_total(&self) -> Money { self.in_total }
    pub fn out_total(&self) -> Money { self.out_total }
    pub fn result(&self) -> Money { self.result }
    pub fn vig(&self) -> Money { self.vig }
    pub fn status(&self) -> WeekStatus { self.status }
    pub fn expected_in(&self) -> Money { self.expected_in }
    pub fn actual_collected(&self) -> Money { self.actual_collected }
    pub fn total_carried_in(&self) -> Money { self.total_carried_in }
    pub fn total_carried_out(&self) -> Money { self.total_carried_out }
    pub fn closed_date(&self) -> Option<&str> { self.closed_date.as_deref() }
    pub fn created(&self) -> &str { &self.created }
    pub fn updated(&self) -> &str { &self.updated }

    pub fn is_active(&self) -> bool { self.status == WeekStatus::Active }
    pub fn is_pending_close(&self) -> bool { self.status == WeekStatus::PendingClose }
    pub fn is_closed(&self) -> bool { self.status == WeekStatus::Closed }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn players_in(&self) -> impl Iterator<Item = &PlayerWeekRecord> {
        self.players.iter().filter(|p| p.is_in())
    }

    pub fn players_out(&self) -> impl Iterator<Item = &PlayerWeekRecord> {
        self.players.iter().filter(|p| p.is_out())
    }

    pub fn players_with_status(&self, status: PaymentStatus) -> impl Iterator<Item = &PlayerWeekRecord> {
        self.players.iter().filter(move |p| p.payment_status() == status)
    }

    pub fn net_result(&self) -> Money {
        self.in_total - self.out_total - self.vig
    }

    /// Percentage of the expected intake actually collected.
    pub fn collection_rate(&self) -> f64 {
        if self.expected_in == 0.0 {
            return 100.0;
        }
        self.actual_collected / self.expected_in * 100.0
    }

    pub fn uncollected(&self) -> Money {
        self.expected_in - self.actual_collected
    }

    // ── Members ───────────────────────────────────────────────────

    pub fn player(&self, id: &str) -> Option<&PlayerWeekRecord> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Mutable access to one member. Callers must follow up with
    /// `calculate_totals()`.
    pub fn player_mut(&mut self, id: &str) -> Option<&mut PlayerWeekRecord> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn player_by_account(&self, account_number: AccountNumber) -> Option<&PlayerWeekRecord> {
        self.players.iter().find(|p| p.account_number == account_number)
    }

    pub fn add_player(&mut self, record: PlayerWeekRecord, now: &str) -> &PlayerWeekRecord {
        self.players.push(record);
        self.calculate_totals();
        self.touch(now);
        &self.players[self.players.len() - 1]
    }

    pub fn remove_player(&mut self, id: &str, now: &str) -> Option<PlayerWeekRecord> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(idx);
        self.calculate_totals();
        self.touch(now);
        Some(removed)
    }

    /// Apply `f` to one member and recompute. `None` if no such member.
    pub fn update_player<R>(
        &mut self,
        id: &str,
        now: &str,
        f: impl FnOnce(&mut PlayerWeekRecord) -> R,
    ) -> Option<R> {
        let record = self.player_mut(id)?;
        let out = f(record);
        self.calculate_totals();
        self.touch(now);
        Some(out)
    }

    pub fn carry_forward_data(&self) -> Vec<CarryForwardEntry> {
        self.players
            .iter()
            .filter(|p| p.carry_forward() != 0.0)
            .map(|p| CarryForwardEntry {
                name: p.name.clone(),
                account_number: p.account_number,
                carry_amount: p.carry_forward(),
            })
            .collect()
    }

    // ── Totals ────────────────────────────────────────────────────

    /// Recompute every aggregate from the member records.
    /// Idempotent; safe to call redundantly.
    pub fn calculate_totals(&mut self) {
        let players = &self.players;

        self.in_total = players.iter().filter(|p| p.amount() > 0.0).map(|p| p.amount()).sum();
        self.out_total = players.iter().filter(|p| p.amount() < 0.0).map(|p| p.amount().abs()).sum();
        self.vig = players.iter().map(|p| p.vig()).sum();
        self.result = self.in_total - self.out_total - self.vig;

        self.total_carried_in = players.iter().filter(|p| p.carried()).map(|p| p.carry_amount()).sum();
        self.expected_in = self.in_total + self.total_carried_in;

        self.actual_collected = players
            .iter()
            .filter(|p| matches!(p.payment_status(), PaymentStatus::Paid | PaymentStatus::Partial))
            .map(|p| p.paid_amount())
            .sum();

        self.total_carried_out = players.iter().map(|p| p.carry_forward()).sum();
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Enter payment review. Only from `active`.
    pub fn start_close(&mut self, now: &str) -> bool {
        if self.status != WeekStatus::Active {
            return false;
        }
        self.status = WeekStatus::PendingClose;
        self.touch(now);
        true
    }

    /// Abandon payment review, discarding every status set so far.
    /// Only from `pending_close`.
    pub fn cancel_close(&mut self, now: &str) -> bool {
        if self.status != WeekStatus::PendingClose {
            return false;
        }
        self.unwind_close(now);
        true
    }

    /// Seal the week. No-op on a week that is already closed.
    pub fn finalize_close(&mut self, now: &str) -> bool {
        if self.status == WeekStatus::Closed {
            return false;
        }
        self.status = WeekStatus::Closed;
        self.closed_date = Some(now.to_string());
        self.calculate_totals();
        self.touch(now);
        true
    }

    /// Mark every member with a nonzero stake as paid in full.
    pub fn mark_all_paid(&mut self, now: &str) {
        for p in self.players.iter_mut().filter(|p| p.amount() != 0.0) {
            p.mark_paid(None, now);
        }
        self.calculate_totals();
        self.touch(now);
    }

    /// Back to `active` with every payment status reset to pending.
    /// Shared by `cancel_close` and the store-driven reopen.
    pub(crate) fn unwind_close(&mut self, now: &str) {
        self.status = WeekStatus::Active;
        self.closed_date = None;
        for p in &mut self.players {
            p.reset_payment_status(now);
        }
        self.calculate_totals();
        self.touch(now);
    }

    pub(crate) fn players_mut(&mut self) -> &mut [PlayerWeekRecord] {
        &mut self.players
    }

    pub(crate) fn touch(&mut self, now: &str) {
        self.updated = now.to_string();
    }
}

/// Persisted week shape, tolerant of data written by older versions.
#[derive(Deserialize)]
struct StoredWeek {
    id: EntityId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    players: Vec<PlayerWeekRecord>,
    #[serde(default)]
    start: Timestamp,
    #[serde(default)]
    end: Timestamp,
    #[serde(default)]
    status: Option<WeekStatus>,
    /// Pre-lifecycle flag: true meant open, false meant closed.
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    closed_date: Option<Timestamp>,
    #[serde(default)]
    previous_week_id: Option<EntityId>,
    #[serde(default)]
    next_week_id: Option<EntityId>,
    #[serde(default)]
    created: Timestamp,
    #[serde(default)]
    updated: Timestamp,
}

impl From<StoredWeek> for WeekLedger {
    fn from(stored: StoredWeek) -> Self {
        let status = stored.status.unwrap_or(match stored.active {
            Some(true) => WeekStatus::Active,
            _ => WeekStatus::Closed,
        });
        let mut players = stored.players;
        for p in &mut players {
            p.normalize();
        }
        let mut week = WeekLedger {
            id: stored.id,
            name: stored.name,
            players,
            start: stored.start,
            end: stored.end,
            in_total: 0.0,
            out_total: 0.0,
            result: 0.0,
            vig: 0.0,
            status,
            expected_in: 0.0,
            actual_collected: 0.0,
            total_carried_in: 0.0,
            total_carried_out: 0.0,
            closed_date: stored.closed_date,
            previous_week_id: stored.previous_week_id,
            next_week_id: stored.next_week_id,
            created: stored.created,
            updated: stored.updated,
        };
        // Stored aggregates are ignored; they are always re-derived.
        week.calculate_totals();
        week
    }
}

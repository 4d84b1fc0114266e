//! One player's participation in one week.
//!
//! `amount` is the signed stake from the house's point of view:
//! positive means the player owes the house, negative means the house
//! owes the player. Carry-in is tracked separately from the stake and
//! never folded into `result`.

use crate::types::{AccountNumber, EntityId, Money, Timestamp, VIG_RATE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Unpaid,
    Partial,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerWeekRecord {
    pub id: EntityId,
    pub name: String,
    pub account_number: AccountNumber,
    amount: Money,
    #[serde(default)]
    carried: bool,
    #[serde(default)]
    carry_amount: Money,
    #[serde(default)]
    carry_from_week_id: Option<EntityId>,
    /// Roster balance at the moment this record was created. Display only.
    #[serde(default)]
    prior_carry_balance: Money,
    #[serde(default)]
    result: Money,
    #[serde(default)]
    payment_status: PaymentStatus,
    #[serde(default)]
    paid_amount: Money,
    #[serde(default)]
    paid_date: Option<Timestamp>,
    #[serde(default)]
    note: String,
    #[serde(default)]
    created: Timestamp,
    #[serde(default)]
    updated: Timestamp,
}

impl PlayerWeekRecord {
    pub fn new(id: EntityId, name: impl Into<String>, account_number: AccountNumber, now: &str) -> Self {
        Self {
            id,
            name: name.into(),
            account_number,
            amount: 0.0,
            carried: false,
            carry_amount: 0.0,
            carry_from_week_id: None,
            prior_carry_balance: 0.0,
            result: 0.0,
            payment_status: PaymentStatus::Pending,
            paid_amount: 0.0,
            paid_date: None,
            note: String::new(),
            created: now.to_string(),
            updated: now.to_string(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────

    pub fn amount(&self) -> Money { self.amount }
    pub fn carried(&self) -> bool { self.carried }
    pub fn carry_amount(&self) -> Money { self.carry_amount }
    pub fn carry_from_week_id(&self) -> Option<&str> { self.carry_from_week_id.as_deref() }
    pub fn prior_carry_balance(&self) -> Money { self.prior_carry_balance }
    pub fn result(&self) -> Money { self.result }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn paid_amount(&self) -> Money { self.paid_amount }
    pub fn paid_date(&self) -> Option<&str> { self.paid_date.as_deref() }
    pub fn note(&self) -> &str { &self.note }
    pub fn created(&self) -> &str { &self.created }
    pub fn updated(&self) -> &str { &self.updated }

    pub fn is_in(&self) -> bool { self.amount > 0.0 }
    pub fn is_out(&self) -> bool { self.amount < 0.0 }
    pub fn absolute_amount(&self) -> Money { self.amount.abs() }

    /// This week's result from the player's side of the table.
    pub fn player_result(&self) -> Money {
        -self.result
    }

    // ── Derived money ─────────────────────────────────────────────

    /// House cut on a winning stake. A carried record's vig was already
    /// taken in the week the carry originated.
    pub fn vig(&self) -> Money {
        if self.amount > 0.0 && !self.carried {
            self.amount * VIG_RATE
        } else {
            0.0
        }
    }

    /// Stake plus carry-in, floored at zero.
    pub fn total_owed(&self) -> Money {
        let carry = if self.carried { self.carry_amount } else { 0.0 };
        (self.amount + carry).max(0.0)
    }

    /// This week's positive stake plus whatever the roster already held
    /// against the player when the record was created.
    pub fn accumulated_owed(&self) -> Money {
        self.amount.max(0.0) + self.prior_carry_balance
    }

    pub fn outstanding_balance(&self) -> Money {
        match self.payment_status {
            PaymentStatus::Paid => 0.0,
            PaymentStatus::Pending | PaymentStatus::Unpaid => self.total_owed(),
            PaymentStatus::Partial => (self.total_owed() - self.paid_amount).max(0.0),
        }
    }

    /// What must propagate to the roster / next week when the week closes.
    pub fn carry_forward(&self) -> Money {
        match self.payment_status {
            PaymentStatus::Paid | PaymentStatus::Pending => 0.0,
            PaymentStatus::Unpaid => self.total_owed(),
            PaymentStatus::Partial => (self.total_owed() - self.paid_amount).max(0.0),
        }
    }

    // ── Stake entry ───────────────────────────────────────────────

    pub fn set_amount(&mut self, amount: Money, now: &str) {
        self.amount = amount;
        self.recalculate();
        self.touch(now);
    }

    /// Player lost: they owe the house.
    pub fn set_in(&mut self, amount: Money, now: &str) {
        self.set_amount(amount.abs(), now);
    }

    /// Player won: the house owes them.
    pub fn set_out(&mut self, amount: Money, now: &str) {
        self.set_amount(-amount.abs(), now);
    }

    pub fn set_note(&mut self, note: impl Into<String>, now: &str) {
        self.note = note.into();
        self.touch(now);
    }

    pub fn set_prior_carry_balance(&mut self, balance: Money, now: &str) {
        self.prior_carry_balance = balance;
        self.touch(now);
    }

    pub fn carry_over(&mut self, amount: Money, from_week_id: Option<EntityId>, now: &str) {
        self.carried = true;
        self.carry_amount = amount;
        self.carry_from_week_id = from_week_id;
        self.recalculate();
        self.touch(now);
    }

    pub fn clear_carry(&mut self, now: &str) {
        self.carried = false;
        self.carry_amount = 0.0;
        self.carry_from_week_id = None;
        self.recalculate();
        self.touch(now);
    }

    // ── Payment transitions ───────────────────────────────────────

    /// Settle the record. Without an explicit amount the full
    /// `total_owed` is recorded as collected.
    pub fn mark_paid(&mut self, amount: Option<Money>, now: &str) {
        self.paid_amount = amount.unwrap_or_else(|| self.total_owed());
        self.payment_status = PaymentStatus::Paid;
        self.paid_date = Some(now.to_string());
        self.touch(now);
    }

    pub fn mark_unpaid(&mut self, now: &str) {
        self.payment_status = PaymentStatus::Unpaid;
        self.paid_amount = 0.0;
        self.paid_date = None;
        self.touch(now);
    }

    /// Accepted as entered, including amounts above what is owed.
    /// Derived balances clamp at zero.
    pub fn mark_partial(&mut self, paid_amount: Money, now: &str) {
        self.payment_status = PaymentStatus::Partial;
        self.paid_amount = paid_amount;
        self.paid_date = Some(now.to_string());
        self.touch(now);
    }

    pub fn reset_payment_status(&mut self, now: &str) {
        self.payment_status = PaymentStatus::Pending;
        self.paid_amount = 0.0;
        self.paid_date = None;
        self.touch(now);
    }

    fn recalculate(&mut self) {
        // carry stays out of the result
        self.result = self.amount;
    }

    pub(crate) fn normalize(&mut self) {
        self.recalculate();
    }

    fn touch(&mut self, now: &str) {
        self.updated = now.to_string();
    }
}

//! Roster player and their running carry ledger.
//!
//! `carry_balance` is the aggregate a player owes across every closed
//! week. It moves only through `add_carry` / `remove_carry` (week close
//! and reopen) and through payments. It never goes below zero.

use crate::types::{AccountNumber, EntityId, Money, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarryPayment {
    pub id: EntityId,
    pub amount: Money,
    pub date: Timestamp,
    #[serde(default)]
    pub note: String,
    /// Set when the payment was made against one specific week.
    /// `None` is a lump sum against the whole balance.
    #[serde(default)]
    pub week_id: Option<EntityId>,
    /// Portion of `amount` that actually reduced the balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied: Option<Money>,
}

impl CarryPayment {
    /// What undoing this payment gives back to the balance.
    pub fn restorable(&self) -> Money {
        self.applied.unwrap_or(self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: EntityId,
    pub name: String,
    pub account_number: AccountNumber,
    #[serde(default)]
    carry_balance: Money,
    #[serde(default)]
    carry_payments: Vec<CarryPayment>,
    #[serde(default)]
    created: Timestamp,
}

impl PlayerRecord {
    pub fn new(id: EntityId, name: impl Into<String>, account_number: AccountNumber, now: &str) -> Self {
        Self {
            id,
            name: name.into(),
            account_number,
            carry_balance: 0.0,
            carry_payments: Vec::new(),
            created: now.to_string(),
        }
    }

    pub fn carry_balance(&self) -> Money { self.carry_balance }
    pub fn carry_payments(&self) -> &[CarryPayment] { &self.carry_payments }
    pub fn created(&self) -> &str { &self.created }

    pub fn has_carry(&self) -> bool {
        self.carry_balance > 0.0
    }

    pub fn total_paid(&self) -> Money {
        self.carry_payments.iter().map(|p| p.amount).sum()
    }

    /// Payments tagged against one specific week.
    pub fn payments_for_week<'a>(&'a self, week_id: &'a str) -> impl Iterator<Item = &'a CarryPayment> + 'a {
        self.carry_payments
            .iter()
            .filter(move |p| p.week_id.as_deref() == Some(week_id))
    }

    pub fn add_carry(&mut self, amount: Money) {
        self.carry_balance = (self.carry_balance + amount).max(0.0);
    }

    /// Reverse an earlier `add_carry`. Clamped at zero, so a carry that was
    /// partly paid off in between is under-corrected rather than negative.
    pub fn remove_carry(&mut self, amount: Money) {
        self.carry_balance = (self.carry_balance - amount).max(0.0);
    }

    pub fn record_payment(
        &mut self,
        id: EntityId,
        amount: Money,
        note: impl Into<String>,
        week_id: Option<EntityId>,
        now: &str,
    ) -> CarryPayment {
        let before = self.carry_balance;
        self.carry_balance = (before - amount).max(0.0);
        let payment = CarryPayment {
            id,
            amount,
            date: now.to_string(),
            note: note.into(),
            week_id,
            applied: Some(before - self.carry_balance),
        };
        self.carry_payments.push(payment.clone());
        payment
    }

    /// Clear the whole balance in one payment. `None` when nothing is owed.
    pub fn pay_off_all(&mut self, id: EntityId, note: &str, now: &str) -> Option<CarryPayment> {
        if self.carry_balance <= 0.0 {
            return None;
        }
        let note = if note.is_empty() { "Paid in full" } else { note };
        Some(self.record_payment(id, self.carry_balance, note, None, now))
    }

    /// Undo one payment: drop it from history and give its amount back.
    /// The balance is not re-derived from the remaining history.
    pub fn remove_payment(&mut self, payment_id: &str) -> Option<CarryPayment> {
        let idx = self.carry_payments.iter().position(|p| p.id == payment_id)?;
        let payment = self.carry_payments.remove(idx);
        self.carry_balance += payment.restorable();
        Some(payment)
    }

    pub(crate) fn clamp_balance(&mut self) {
        if self.carry_balance.is_nan() || self.carry_balance < 0.0 {
            self.carry_balance = 0.0;
        }
    }
}

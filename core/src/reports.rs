//! Read-only aggregations over closed weeks. Nothing here mutates.

use crate::{
    player::{CarryPayment, PlayerRecord},
    types::{AccountNumber, EntityId, Money, Timestamp},
    week::WeekLedger,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekBalance {
    pub week_id: EntityId,
    pub week_name: String,
    pub expected: Money,
    pub collected: Money,
    pub outstanding: Money,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunningBalance {
    pub total_expected: Money,
    pub total_collected: Money,
    pub total_outstanding: Money,
    pub weekly_breakdown: Vec<WeekBalance>,
}

/// Collection totals across every closed week, in ledger order.
pub fn running_balance(weeks: &[WeekLedger]) -> RunningBalance {
    let mut balance = RunningBalance::default();
    for week in weeks.iter().filter(|w| w.is_closed()) {
        balance.total_expected += week.expected_in();
        balance.total_collected += week.actual_collected();
        balance.weekly_breakdown.push(WeekBalance {
            week_id: week.id.clone(),
            week_name: week.name.clone(),
            expected: week.expected_in(),
            collected: week.actual_collected(),
            outstanding: week.uncollected(),
        });
    }
    balance.total_outstanding = balance.total_expected - balance.total_collected;
    balance
}

/// One closed week's contribution to a player's carry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekCarry {
    pub week_id: EntityId,
    pub week_name: String,
    pub closed_date: Option<Timestamp>,
    /// Carry seeded into this week from an earlier one.
    pub carried_in: Money,
    /// Amount this week pushed onto the roster balance at close.
    pub carry_forward: Money,
    /// Payments recorded specifically against this week.
    pub paid_against_week: Money,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerCarryBreakdown {
    pub account_number: AccountNumber,
    pub name: String,
    pub carry_balance: Money,
    pub total_carried: Money,
    pub total_paid: Money,
    pub weeks: Vec<WeekCarry>,
    /// Payments not tied to any week.
    pub lump_sum_payments: Vec<CarryPayment>,
}

pub fn player_carry_breakdown(weeks: &[WeekLedger], player: &PlayerRecord) -> PlayerCarryBreakdown {
    let account = player.account_number;
    let mut rows = Vec::new();

    for week in weeks.iter().filter(|w| w.is_closed()) {
        let Some(record) = week.player_by_account(account) else { continue };
        let paid_against_week: Money = player.payments_for_week(&week.id).map(|p| p.amount).sum();
        let carried_in = if record.carried() { record.carry_amount() } else { 0.0 };
        let carry_forward = record.carry_forward();
        if carried_in == 0.0 && carry_forward == 0.0 && paid_against_week == 0.0 {
            continue;
        }
        rows.push(WeekCarry {
            week_id: week.id.clone(),
            week_name: week.name.clone(),
            closed_date: week.closed_date().map(str::to_string),
            carried_in,
            carry_forward,
            paid_against_week,
        });
    }

    PlayerCarryBreakdown {
        account_number: account,
        name: player.name.clone(),
        carry_balance: player.carry_balance(),
        total_carried: rows.iter().map(|r| r.carry_forward).sum(),
        total_paid: player.total_paid(),
        weeks: rows,
        lump_sum_payments: player
            .carry_payments()
            .iter()
            .filter(|p| p.week_id.is_none())
            .cloned()
            .collect(),
    }
}

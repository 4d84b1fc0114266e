//! Carry balance lifecycle across close, reopen, follow-on weeks and
//! payments.

mod common;

use approx::assert_abs_diff_eq;
use common::{balance, harness, seat};
use slide_core::{PaymentStatus, WeekStatus};

#[test]
fn close_pushes_carry_to_roster_and_next_week_picks_it_up() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let x = seat(s, &week, "Xavi", 7, 40.0);

    assert!(s.start_close(&week));
    assert!(s.mark_player_unpaid(&week, &x));
    let before = balance(s, 7);

    assert!(s.close_week_and_update_carries(&week));
    assert_eq!(balance(s, 7), before + 40.0);
    assert_eq!(s.week(&week).unwrap().total_carried_out(), 40.0);

    let next = s.create_next_week_from_closed(&week).expect("next week");
    let next_week = s.week(&next).unwrap();
    let record = next_week.player_by_account(7).expect("carried record");
    assert!(record.carried());
    assert_eq!(record.carry_amount(), 40.0);
    assert_eq!(record.carry_from_week_id(), Some(week.as_str()));
    assert_eq!(record.prior_carry_balance(), 40.0);
    assert_eq!(record.amount(), 0.0);
    assert_eq!(next_week.total_carried_in(), 40.0);
    assert_eq!(next_week.expected_in(), 40.0);
    assert_eq!(s.active_week_id(), Some(next.as_str()));
}

#[test]
fn close_then_reopen_restores_roster_and_resets_week() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let a = seat(s, &week, "Ana", 1, 100.0);
    let b = seat(s, &week, "Bo", 2, 60.0);
    let c = seat(s, &week, "Cy", 3, -30.0);

    // Give Bo an existing balance so we can see it restored exactly.
    let week0 = s.create_week("Week 0").id.clone();
    let z = seat(s, &week0, "Bo", 2, 25.0);
    s.start_close(&week0);
    s.mark_player_unpaid(&week0, &z);
    s.close_week_and_update_carries(&week0);
    let before: Vec<f64> = [1, 2, 3].iter().map(|a| balance(s, *a)).collect();

    s.start_close(&week);
    s.mark_player_partial(&week, &a, 70.0);
    s.mark_player_unpaid(&week, &b);
    s.mark_player_paid(&week, &c, None);
    assert!(s.close_week_and_update_carries(&week));
    assert_eq!(balance(s, 1), before[0] + 30.0);
    assert_eq!(balance(s, 2), before[1] + 60.0);
    assert_eq!(balance(s, 3), before[2]);

    assert!(s.reopen_week(&week));
    let after: Vec<f64> = [1, 2, 3].iter().map(|a| balance(s, *a)).collect();
    assert_eq!(after, before);

    let w = s.week(&week).unwrap();
    assert_eq!(w.status(), WeekStatus::Active);
    assert_eq!(w.closed_date(), None);
    assert!(w.players().iter().all(|p| p.payment_status() == PaymentStatus::Pending));
    assert_eq!(w.total_carried_out(), 0.0);
}

#[test]
fn unreviewed_carried_record_defaults_to_unpaid_on_close() {
    let mut h = harness();
    let s = &mut h.store;
    let week1 = s.create_week("Week 1").id.clone();
    let r = seat(s, &week1, "Ana", 1, 50.0);
    s.start_close(&week1);
    s.mark_player_unpaid(&week1, &r);
    s.close_week_and_update_carries(&week1);
    assert_eq!(balance(s, 1), 50.0);

    let week2 = s.create_next_week_from_closed(&week1).unwrap();
    // Nobody reviews week 2; close it straight from active.
    assert!(s.close_week_and_update_carries(&week2));

    let w2 = s.week(&week2).unwrap();
    let carried = w2.player_by_account(1).unwrap();
    assert_eq!(carried.payment_status(), PaymentStatus::Unpaid);
    assert_eq!(carried.carry_forward(), 50.0);
    // Week 2's carry is added to the roster again on its own close.
    assert_eq!(balance(s, 1), 100.0);
}

#[test]
fn uncarried_pending_records_carry_nothing() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    seat(s, &week, "Ana", 1, 80.0);
    assert!(s.close_week_and_update_carries(&week));
    assert_eq!(balance(s, 1), 0.0);
    let w = s.week(&week).unwrap();
    assert_eq!(w.players()[0].payment_status(), PaymentStatus::Pending);
    assert!(s.create_next_week_from_closed(&week).is_some());
    assert_eq!(s.weeks().last().unwrap().player_count(), 0);
}

#[test]
fn carry_for_unknown_account_stays_on_week_only() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let ghost = s.add_player_to_week(&week, "Ghost", 99).unwrap();
    s.set_player_in(&week, &ghost, 45.0);
    s.start_close(&week);
    s.mark_player_unpaid(&week, &ghost);
    assert!(s.close_week_and_update_carries(&week));

    assert!(s.player_by_account(99).is_none());
    assert_eq!(s.week(&week).unwrap().total_carried_out(), 45.0);
    assert!(s.reopen_week(&week));
}

#[test]
fn close_and_reopen_preconditions_are_silent_noops() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let r = seat(s, &week, "Ana", 1, 50.0);

    assert!(!s.reopen_week(&week));
    assert!(!s.reopen_week("missing"));
    assert!(!s.close_week_and_update_carries("missing"));
    assert!(s.create_next_week_from_closed(&week).is_none());
    assert!(s.create_next_week_from_closed("missing").is_none());

    s.start_close(&week);
    s.mark_player_unpaid(&week, &r);
    assert!(s.close_week_and_update_carries(&week));
    assert!(!s.close_week_and_update_carries(&week));
    // A second close must not double the carry.
    assert_eq!(balance(s, 1), 50.0);
}

#[test]
fn closed_week_rejects_edits() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let r = seat(s, &week, "Ana", 1, 50.0);
    s.close_week_and_update_carries(&week);

    assert!(!s.set_player_in(&week, &r, 500.0));
    assert!(!s.mark_player_paid(&week, &r, None));
    assert!(s.add_player_to_week(&week, "Late", 2).is_none());
    assert!(!s.remove_player_from_week(&week, &r));
    assert_eq!(s.week(&week).unwrap().in_total(), 50.0);
}

#[test]
fn payment_status_only_moves_during_review() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let r = seat(s, &week, "Ana", 1, 50.0);

    assert!(!s.mark_player_unpaid(&week, &r));
    assert!(!s.mark_all_paid(&week));
    assert_eq!(s.week(&week).unwrap().players()[0].payment_status(), PaymentStatus::Pending);

    s.start_close(&week);
    assert!(s.mark_all_paid(&week));
    assert_eq!(s.week(&week).unwrap().actual_collected(), 50.0);

    assert!(s.cancel_close(&week));
    let w = s.week(&week).unwrap();
    assert!(w.is_active());
    assert_eq!(w.actual_collected(), 0.0);
}

#[test]
fn next_week_dates_start_day_after_source_end() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    assert_eq!(s.week(&week).unwrap().start, "2026-01-05T12:00:00.000Z");
    assert_eq!(s.week(&week).unwrap().end, "2026-01-12T12:00:00.000Z");
    s.close_week_and_update_carries(&week);

    let next = s.create_next_week_from_closed(&week).unwrap();
    let n = s.week(&next).unwrap();
    assert_eq!(n.name, "Week 2");
    assert_eq!(n.start, "2026-01-13T12:00:00.000Z");
    assert_eq!(n.end, "2026-01-20T12:00:00.000Z");
    assert_eq!(n.previous_week_id.as_deref(), Some(week.as_str()));
    assert_eq!(s.week(&week).unwrap().next_week_id.as_deref(), Some(next.as_str()));
}

#[test]
fn duplicate_week_carries_raw_result() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    seat(s, &week, "Ana", 1, 100.0);
    seat(s, &week, "Bo", 2, -40.0);
    seat(s, &week, "Cy", 3, 0.0);

    let copy = s.duplicate_week(&week, "Week 1 (copy)").unwrap();
    let w = s.week(&copy).unwrap();
    assert_eq!(w.player_count(), 3);
    assert_eq!(w.status(), WeekStatus::Active);
    assert_eq!(w.in_total(), 0.0);

    let ana = w.player_by_account(1).unwrap();
    assert!(ana.carried());
    assert_eq!(ana.carry_amount(), 100.0);
    let bo = w.player_by_account(2).unwrap();
    assert_eq!(bo.carry_amount(), -40.0);
    let cy = w.player_by_account(3).unwrap();
    assert!(!cy.carried());
    assert!(s.duplicate_week("missing", "x").is_none());
}

#[test]
fn lump_sum_and_week_payments_reduce_balance() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let r = seat(s, &week, "Ana", 1, 90.0);
    s.start_close(&week);
    s.mark_player_unpaid(&week, &r);
    s.close_week_and_update_carries(&week);

    let lump = s.record_carry_payment(1, 20.0, "cash").unwrap();
    assert_eq!(balance(s, 1), 70.0);
    let tagged = s.record_week_carry_payment(1, &week, 30.0, "venmo").unwrap();
    assert_eq!(tagged.week_id.as_deref(), Some(week.as_str()));
    assert_eq!(balance(s, 1), 40.0);

    let undone = s.undo_carry_payment(1, &lump.id).unwrap();
    assert_eq!(undone.amount, 20.0);
    assert_eq!(balance(s, 1), 60.0);

    let all = s.pay_off_all_carry(1, "").unwrap();
    assert_eq!(all.amount, 60.0);
    assert_eq!(balance(s, 1), 0.0);
    assert!(s.pay_off_all_carry(1, "").is_none());

    assert!(s.record_carry_payment(404, 10.0, "").is_none());
    assert!(s.undo_carry_payment(1, "missing").is_none());
}

#[test]
fn overpayment_never_drives_balance_negative() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let r = seat(s, &week, "Ana", 1, 30.0);
    s.start_close(&week);
    s.mark_player_unpaid(&week, &r);
    s.close_week_and_update_carries(&week);

    let pay = s.record_carry_payment(1, 100.0, "").unwrap();
    assert_eq!(balance(s, 1), 0.0);
    s.undo_carry_payment(1, &pay.id);
    assert_eq!(balance(s, 1), 30.0);
}

#[test]
fn reopen_after_partial_payoff_under_corrects_but_stays_non_negative() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    let r = seat(s, &week, "Ana", 1, 50.0);
    s.start_close(&week);
    s.mark_player_unpaid(&week, &r);
    s.close_week_and_update_carries(&week);
    s.record_carry_payment(1, 35.0, "");

    s.reopen_week(&week);
    assert_eq!(balance(s, 1), 0.0);
}

#[test]
fn running_balance_and_breakdown_cover_closed_weeks_only() {
    let mut h = harness();
    let s = &mut h.store;
    let w1 = s.create_week("Week 1").id.clone();
    let a = seat(s, &w1, "Ana", 1, 100.0);
    let b = seat(s, &w1, "Bo", 2, 50.0);
    s.start_close(&w1);
    s.mark_player_paid(&w1, &a, None);
    s.mark_player_partial(&w1, &b, 10.0);
    s.close_week_and_update_carries(&w1);

    let w2 = s.create_next_week_from_closed(&w1).unwrap();
    seat(s, &w2, "Ana", 1, 20.0);

    let rb = s.running_balance();
    assert_eq!(rb.weekly_breakdown.len(), 1);
    assert_eq!(rb.total_expected, 150.0);
    assert_eq!(rb.total_collected, 110.0);
    assert_eq!(rb.total_outstanding, 40.0);

    s.record_week_carry_payment(2, &w1, 15.0, "");
    s.record_carry_payment(2, 5.0, "");
    let bd = s.player_carry_breakdown(2).unwrap();
    assert_eq!(bd.weeks.len(), 1);
    assert_eq!(bd.weeks[0].carry_forward, 40.0);
    assert_eq!(bd.weeks[0].paid_against_week, 15.0);
    assert_eq!(bd.total_carried, 40.0);
    assert_eq!(bd.carry_balance, 20.0);
    assert_eq!(bd.lump_sum_payments.len(), 1);
    assert!(s.player_carry_breakdown(404).is_none());
}

#[test]
fn week_totals_example() {
    let mut h = harness();
    let s = &mut h.store;
    let week = s.create_week("Week 1").id.clone();
    seat(s, &week, "Ana", 1, 100.0);
    let w = s.week(&week).unwrap();
    assert_eq!(w.in_total(), 100.0);
    assert_abs_diff_eq!(w.vig(), 15.0, epsilon = 1e-9);
    assert_abs_diff_eq!(w.result(), 85.0, epsilon = 1e-9);
}

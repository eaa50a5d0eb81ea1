//! Cycle aggregation rules.
//!
//! Pure functions that fold a claim's adjudication cycles into the derived
//! summaries. No I/O happens here; the service layer reads the ledger,
//! calls into this module, validates the result, and merge-writes it.
//!
//! The money rule is cumulative-with-cap: all paid amounts for an activity
//! are summed across cycles (takebacks subtract) and the sum is clamped to
//! `[0, submitted net]`. Denial is determined solely by the latest cycle,
//! ordered by settlement time with the ledger sequence as tiebreak.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::claim_key::ClaimKey;
use super::ledger::{Activity, AdjudicationCycle, ClaimSubmission, LifecycleEvent, LifecycleKind};
use super::summary::{ActivitySummary, ClaimPayment, PaymentStatus};
use crate::error::EngineError;

/// Aggregates one activity's cycles into its summary.
///
/// `cycles` is the claim's full cycle list; cycles belonging to other
/// activities are ignored. Zero matching cycles yield a `Pending` summary
/// with nothing paid and nothing denied.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] when the activity's submitted net is
/// negative. Malformed monetary input is rejected here, before any write,
/// never silently clamped.
pub fn rollup_activity(
    activity: &Activity,
    cycles: &[AdjudicationCycle],
) -> Result<ActivitySummary, EngineError> {
    if activity.net < Decimal::ZERO {
        return Err(EngineError::Validation(format!(
            "activity {} of claim {} has negative submitted net {}",
            activity.activity_id, activity.claim_key, activity.net
        )));
    }

    let mine: Vec<&AdjudicationCycle> = cycles
        .iter()
        .filter(|c| c.activity_id == activity.activity_id)
        .collect();

    let raw: Decimal = mine.iter().map(|c| c.paid).sum();
    let paid = raw.clamp(Decimal::ZERO, activity.net);

    let latest = mine.iter().max_by_key(|c| c.recency_key());
    let denial_code = latest.and_then(|c| c.denial_code.clone());

    let status = if denial_code.is_some() && paid.is_zero() {
        PaymentStatus::Rejected
    } else if paid == activity.net && activity.net > Decimal::ZERO {
        PaymentStatus::FullyPaid
    } else if paid > Decimal::ZERO {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Pending
    };

    let denied = if status == PaymentStatus::Rejected {
        activity.net
    } else {
        Decimal::ZERO
    };

    let paid_times = || {
        mine.iter()
            .filter(|c| c.paid > Decimal::ZERO)
            .filter_map(|c| c.settlement_at)
    };

    Ok(ActivitySummary {
        claim_key: activity.claim_key.clone(),
        activity_id: activity.activity_id.clone(),
        net: activity.net,
        paid,
        status,
        denial_code,
        denied,
        cycle_count: u32::try_from(mine.len()).unwrap_or(u32::MAX),
        first_paid_at: paid_times().min(),
        last_paid_at: paid_times().max(),
    })
}

/// Rolls refreshed activity summaries plus claim metadata into the
/// claim-level payment record. Pure; totals are sums over `summaries`, so
/// callers must pass every summary of the claim.
#[must_use]
pub fn rollup_claim(
    claim_key: &ClaimKey,
    summaries: &[ActivitySummary],
    submission: Option<&ClaimSubmission>,
    events: &[LifecycleEvent],
    cycles: &[AdjudicationCycle],
) -> ClaimPayment {
    let total_submitted: Decimal = summaries.iter().map(|s| s.net).sum();
    let total_paid: Decimal = summaries.iter().map(|s| s.paid).sum();
    let total_rejected: Decimal = summaries.iter().map(|s| s.denied).sum();

    let mut fully_paid_count = 0u32;
    let mut partially_paid_count = 0u32;
    let mut rejected_count = 0u32;
    let mut pending_count = 0u32;
    for s in summaries {
        match s.status {
            PaymentStatus::FullyPaid => fully_paid_count += 1,
            PaymentStatus::PartiallyPaid => partially_paid_count += 1,
            PaymentStatus::Rejected => rejected_count += 1,
            PaymentStatus::Pending => pending_count += 1,
        }
    }

    let references: BTreeSet<&str> = cycles
        .iter()
        .filter_map(|c| c.payment_reference.as_deref())
        .collect();
    let remittance_count = u32::try_from(references.len()).unwrap_or(u32::MAX);
    let payment_references: Vec<String> = references.iter().map(ToString::to_string).collect();

    let resubmission_count = u32::try_from(
        events
            .iter()
            .filter(|e| e.kind == LifecycleKind::Resubmission)
            .count(),
    )
    .unwrap_or(u32::MAX);

    let submission_times = || {
        events
            .iter()
            .filter(|e| matches!(e.kind, LifecycleKind::Submission | LifecycleKind::Resubmission))
            .map(|e| e.event_time)
            .chain(submission.map(|s| s.submitted_at))
    };
    let first_submission_at = submission_times().min();
    let last_submission_at = submission_times().max();

    let first_paid_at = summaries.iter().filter_map(|s| s.first_paid_at).min();
    let last_paid_at = summaries.iter().filter_map(|s| s.last_paid_at).max();
    let latest_settlement_at = cycles.iter().filter_map(|c| c.settlement_at).max();

    let days_between =
        |from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>| Some((to? - from?).num_days());
    let days_to_first_payment = days_between(first_submission_at, first_paid_at);
    let days_to_settlement = days_between(first_submission_at, latest_settlement_at);

    let latest_payment_reference = cycles
        .iter()
        .filter(|c| c.payment_reference.is_some())
        .max_by_key(|c| c.recency_key())
        .and_then(|c| c.payment_reference.clone());

    let tx_at = submission
        .map(|s| s.submitted_at)
        .or_else(|| cycles.iter().filter_map(|c| c.batch_at).max())
        .or(latest_settlement_at);

    ClaimPayment {
        claim_key: claim_key.clone(),
        total_submitted,
        total_paid,
        total_rejected,
        activity_count: u32::try_from(summaries.len()).unwrap_or(u32::MAX),
        fully_paid_count,
        partially_paid_count,
        rejected_count,
        pending_count,
        remittance_count,
        resubmission_count,
        status: claim_status(total_submitted, total_paid, total_rejected),
        first_submission_at,
        last_submission_at,
        first_paid_at,
        last_paid_at,
        latest_settlement_at,
        days_to_first_payment,
        days_to_settlement,
        latest_payment_reference,
        payment_references,
        tx_at,
    }
}

/// Four-state rule applied to claim totals.
fn claim_status(submitted: Decimal, paid: Decimal, rejected: Decimal) -> PaymentStatus {
    if submitted > Decimal::ZERO && paid.is_zero() && rejected == submitted {
        PaymentStatus::Rejected
    } else if submitted > Decimal::ZERO && paid == submitted {
        PaymentStatus::FullyPaid
    } else if paid > Decimal::ZERO {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Pending
    }
}

/// Cumulative (paid, rejected) totals over the cycles visible at a ledger
/// sequence, using the same capped per-activity rule as the live summaries.
/// Drives the running totals on timeline entries.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] when any activity carries a negative
/// submitted net.
pub fn running_totals_at(
    activities: &[Activity],
    cycles: &[AdjudicationCycle],
    max_seq: u64,
) -> Result<(Decimal, Decimal), EngineError> {
    let visible: Vec<AdjudicationCycle> = cycles
        .iter()
        .filter(|c| c.seq <= max_seq)
        .cloned()
        .collect();
    let mut paid = Decimal::ZERO;
    let mut rejected = Decimal::ZERO;
    for activity in activities {
        let summary = rollup_activity(activity, &visible)?;
        paid += summary.paid;
        rejected += summary.denied;
    }
    Ok((paid, rejected))
}

/// Checks the invariants of a computed activity summary. A violation is a
/// logic defect, surfaced as [`EngineError::Consistency`] so the write is
/// aborted and the previously committed summary stays in place.
///
/// # Errors
///
/// Returns [`EngineError::Consistency`] naming the claim and the violated
/// invariant.
pub fn validate_activity_summary(summary: &ActivitySummary) -> Result<(), EngineError> {
    let fail = |detail: String| {
        Err(EngineError::Consistency {
            claim_key: summary.claim_key.to_string(),
            detail,
        })
    };

    if summary.paid < Decimal::ZERO || summary.paid > summary.net {
        return fail(format!(
            "activity {}: paid {} outside [0, {}]",
            summary.activity_id, summary.paid, summary.net
        ));
    }
    let rejected = summary.status == PaymentStatus::Rejected;
    if rejected && (summary.denied != summary.net || !summary.paid.is_zero()) {
        return fail(format!(
            "activity {}: rejected but paid {} / denied {} do not match net {}",
            summary.activity_id, summary.paid, summary.denied, summary.net
        ));
    }
    if !rejected && !summary.denied.is_zero() {
        return fail(format!(
            "activity {}: denied {} without rejected status",
            summary.activity_id, summary.denied
        ));
    }
    if rejected && summary.denial_code.is_none() {
        return fail(format!(
            "activity {}: rejected without a denial code",
            summary.activity_id
        ));
    }
    if summary.status == PaymentStatus::FullyPaid
        && (summary.paid != summary.net || summary.net.is_zero())
    {
        return fail(format!(
            "activity {}: fully paid but paid {} != net {}",
            summary.activity_id, summary.paid, summary.net
        ));
    }
    if summary.status == PaymentStatus::PartiallyPaid && summary.paid <= Decimal::ZERO {
        return fail(format!(
            "activity {}: partially paid with nothing paid",
            summary.activity_id
        ));
    }
    Ok(())
}

/// Checks that a claim payment's totals equal the sums over its activity
/// summaries.
///
/// # Errors
///
/// Returns [`EngineError::Consistency`] naming the claim and the diverging
/// total.
pub fn validate_claim_payment(
    payment: &ClaimPayment,
    summaries: &[ActivitySummary],
) -> Result<(), EngineError> {
    let fail = |detail: String| {
        Err(EngineError::Consistency {
            claim_key: payment.claim_key.to_string(),
            detail,
        })
    };

    let submitted: Decimal = summaries.iter().map(|s| s.net).sum();
    let paid: Decimal = summaries.iter().map(|s| s.paid).sum();
    let rejected: Decimal = summaries.iter().map(|s| s.denied).sum();

    if payment.total_submitted != submitted {
        return fail(format!(
            "total submitted {} != activity sum {}",
            payment.total_submitted, submitted
        ));
    }
    if payment.total_paid != paid {
        return fail(format!(
            "total paid {} != activity sum {}",
            payment.total_paid, paid
        ));
    }
    if payment.total_rejected != rejected {
        return fail(format!(
            "total rejected {} != activity sum {}",
            payment.total_rejected, rejected
        ));
    }
    if payment.activity_count as usize != summaries.len() {
        return fail(format!(
            "activity count {} != summary count {}",
            payment.activity_count,
            summaries.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::claim_key::ActivityId;

    fn ts(day: u32) -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).single() {
            Some(t) => t,
            None => panic!("bad test timestamp"),
        }
    }

    fn activity(net: Decimal) -> Activity {
        Activity::new(ClaimKey::new("CLM-1"), ActivityId::new("A-1"), net)
    }

    fn cycle(seq: u64, paid: Decimal, denial: Option<&str>, day: Option<u32>) -> AdjudicationCycle {
        AdjudicationCycle {
            claim_key: ClaimKey::new("CLM-1"),
            activity_id: ActivityId::new("A-1"),
            seq,
            paid,
            denial_code: denial.map(ToString::to_string),
            settlement_at: day.map(ts),
            payment_reference: None,
            batch_at: None,
        }
    }

    fn roll(net: Decimal, cycles: &[AdjudicationCycle]) -> ActivitySummary {
        let Ok(summary) = rollup_activity(&activity(net), cycles) else {
            panic!("rollup failed");
        };
        summary
    }

    #[test]
    fn single_full_payment_is_fully_paid() {
        // Scenario: one cycle pays the whole net.
        let s = roll(dec!(100), &[cycle(1, dec!(100), None, Some(1))]);
        assert_eq!(s.status, PaymentStatus::FullyPaid);
        assert_eq!(s.paid, dec!(100));
        assert_eq!(s.denied, Decimal::ZERO);
    }

    #[test]
    fn lone_denial_rejects_the_full_net() {
        let s = roll(dec!(100), &[cycle(1, dec!(0), Some("D1"), Some(1))]);
        assert_eq!(s.status, PaymentStatus::Rejected);
        assert_eq!(s.paid, Decimal::ZERO);
        assert_eq!(s.denied, dec!(100));
        assert_eq!(s.denial_code.as_deref(), Some("D1"));
    }

    #[test]
    fn later_payment_clears_an_earlier_denial() {
        // Denial at t=1 reversed by a payment settled at t=5: the latest
        // cycle carries no denial, so the line is partially paid.
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(0), Some("D1"), Some(1)),
                cycle(2, dec!(60), None, Some(5)),
            ],
        );
        assert_eq!(s.status, PaymentStatus::PartiallyPaid);
        assert_eq!(s.paid, dec!(60));
        assert_eq!(s.denied, Decimal::ZERO);
        assert_eq!(s.denial_code, None);
    }

    #[test]
    fn takeback_reduces_cumulative_paid() {
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(100), None, Some(1)),
                cycle(2, dec!(-20), None, Some(10)),
            ],
        );
        assert_eq!(s.status, PaymentStatus::PartiallyPaid);
        assert_eq!(s.paid, dec!(80));
    }

    #[test]
    fn paid_is_clamped_to_net_on_overpayment() {
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(80), None, Some(1)),
                cycle(2, dec!(40), None, Some(2)),
            ],
        );
        assert_eq!(s.paid, dec!(100));
        assert_eq!(s.status, PaymentStatus::FullyPaid);
    }

    #[test]
    fn paid_is_clamped_to_zero_on_net_takeback() {
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(20), None, Some(1)),
                cycle(2, dec!(-50), None, Some(2)),
            ],
        );
        assert_eq!(s.paid, Decimal::ZERO);
        assert_eq!(s.status, PaymentStatus::Pending);
    }

    #[test]
    fn zero_net_is_never_fully_paid() {
        let s = roll(dec!(0), &[cycle(1, dec!(0), None, Some(1))]);
        assert_eq!(s.status, PaymentStatus::Pending);
        let s = roll(dec!(0), &[]);
        assert_eq!(s.status, PaymentStatus::Pending);
    }

    #[test]
    fn no_cycles_means_pending() {
        let s = roll(dec!(100), &[]);
        assert_eq!(s.status, PaymentStatus::Pending);
        assert_eq!(s.paid, Decimal::ZERO);
        assert_eq!(s.denied, Decimal::ZERO);
        assert_eq!(s.cycle_count, 0);
    }

    #[test]
    fn negative_net_is_rejected_as_validation() {
        let err = rollup_activity(&activity(dec!(-1)), &[]);
        let Err(EngineError::Validation(msg)) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("A-1"));
    }

    #[test]
    fn unsettled_denial_loses_to_settled_payment() {
        // The denial has no settlement time, so the settled paying cycle is
        // the latest one even though the denial was appended later.
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(100), None, Some(3)),
                cycle(2, dec!(0), Some("D9"), None),
            ],
        );
        assert_eq!(s.status, PaymentStatus::FullyPaid);
        assert_eq!(s.denial_code, None);
    }

    #[test]
    fn sequence_breaks_settlement_ties() {
        // Same settlement time: the later-appended cycle wins, making its
        // denial the latest verdict, and with nothing paid the line rejects.
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(0), None, Some(4)),
                cycle(2, dec!(0), Some("D3"), Some(4)),
            ],
        );
        assert_eq!(s.status, PaymentStatus::Rejected);
        assert_eq!(s.denial_code.as_deref(), Some("D3"));
    }

    #[test]
    fn rollup_is_order_independent() {
        let cycles = [
            cycle(1, dec!(0), Some("D1"), Some(1)),
            cycle(2, dec!(60), None, Some(5)),
            cycle(3, dec!(-10), None, Some(7)),
        ];
        let forward = roll(dec!(100), &cycles);
        let mut shuffled = cycles.to_vec();
        shuffled.reverse();
        let backward = roll(dec!(100), &shuffled);
        assert_eq!(forward, backward);
        let mut rotated = cycles.to_vec();
        rotated.rotate_left(1);
        assert_eq!(forward, roll(dec!(100), &rotated));
    }

    #[test]
    fn rejected_denied_and_latest_denial_agree() {
        // REJECTED, denied = net, and latest-denial-with-zero-paid are the
        // same condition stated three ways.
        let rejected = roll(dec!(100), &[cycle(1, dec!(0), Some("D1"), Some(1))]);
        assert_eq!(rejected.status, PaymentStatus::Rejected);
        assert_eq!(rejected.denied, rejected.net);
        assert!(rejected.denial_code.is_some() && rejected.paid.is_zero());

        // A paid line with a latest denial code is not rejected and carries
        // no denied amount.
        let paid_then_denied = roll(
            dec!(100),
            &[
                cycle(1, dec!(40), None, Some(1)),
                cycle(2, dec!(0), Some("D2"), Some(5)),
            ],
        );
        assert_eq!(paid_then_denied.status, PaymentStatus::PartiallyPaid);
        assert_eq!(paid_then_denied.denied, Decimal::ZERO);
        assert_eq!(paid_then_denied.denial_code.as_deref(), Some("D2"));
    }

    #[test]
    fn payment_timestamps_span_paying_cycles_only() {
        let s = roll(
            dec!(100),
            &[
                cycle(1, dec!(0), Some("D1"), Some(1)),
                cycle(2, dec!(30), None, Some(3)),
                cycle(3, dec!(30), None, Some(8)),
                cycle(4, dec!(-5), None, Some(9)),
            ],
        );
        assert_eq!(s.first_paid_at, Some(ts(3)));
        assert_eq!(s.last_paid_at, Some(ts(8)));
        assert_eq!(s.cycle_count, 4);
    }

    fn claim_cycle(
        activity: &str,
        seq: u64,
        paid: Decimal,
        denial: Option<&str>,
        day: Option<u32>,
        reference: Option<&str>,
    ) -> AdjudicationCycle {
        AdjudicationCycle {
            claim_key: ClaimKey::new("CLM-1"),
            activity_id: ActivityId::new(activity),
            seq,
            paid,
            denial_code: denial.map(ToString::to_string),
            settlement_at: day.map(ts),
            payment_reference: reference.map(ToString::to_string),
            batch_at: None,
        }
    }

    #[test]
    fn claim_rollup_sums_mixed_activities() {
        // Two activities: one fully paid, one rejected. The claim is
        // partially paid because money flowed but not the full total.
        let key = ClaimKey::new("CLM-1");
        let a1 = Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100));
        let a2 = Activity::new(key.clone(), ActivityId::new("A-2"), dec!(50));
        let cycles = [
            claim_cycle("A-1", 1, dec!(100), None, Some(2), Some("RA-1")),
            claim_cycle("A-2", 2, dec!(0), Some("D2"), Some(2), Some("RA-1")),
        ];
        let Ok(s1) = rollup_activity(&a1, &cycles) else {
            panic!("rollup failed");
        };
        let Ok(s2) = rollup_activity(&a2, &cycles) else {
            panic!("rollup failed");
        };
        let payment = rollup_claim(&key, &[s1, s2], None, &[], &cycles);

        assert_eq!(payment.total_submitted, dec!(150));
        assert_eq!(payment.total_paid, dec!(100));
        assert_eq!(payment.total_rejected, dec!(50));
        assert_eq!(payment.status, PaymentStatus::PartiallyPaid);
        assert_eq!(payment.activity_count, 2);
        assert_eq!(payment.fully_paid_count, 1);
        assert_eq!(payment.rejected_count, 1);
        assert_eq!(payment.remittance_count, 1);
    }

    #[test]
    fn claim_rejected_only_when_every_line_is() {
        let key = ClaimKey::new("CLM-1");
        let a1 = Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100));
        let cycles = [claim_cycle("A-1", 1, dec!(0), Some("D1"), Some(2), None)];
        let Ok(s1) = rollup_activity(&a1, &cycles) else {
            panic!("rollup failed");
        };
        let payment = rollup_claim(&key, &[s1], None, &[], &cycles);
        assert_eq!(payment.status, PaymentStatus::Rejected);
        assert_eq!(payment.total_rejected, dec!(100));
    }

    #[test]
    fn empty_claim_is_pending_with_zero_totals() {
        let key = ClaimKey::new("CLM-9");
        let payment = rollup_claim(&key, &[], None, &[], &[]);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.total_submitted, Decimal::ZERO);
        assert_eq!(payment.activity_count, 0);
        assert_eq!(payment.tx_at, None);
    }

    #[test]
    fn remittance_count_is_distinct_references() {
        let key = ClaimKey::new("CLM-1");
        let a1 = Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100));
        let cycles = [
            claim_cycle("A-1", 1, dec!(20), None, Some(1), Some("RA-1")),
            claim_cycle("A-1", 2, dec!(20), None, Some(2), Some("RA-2")),
            claim_cycle("A-1", 3, dec!(20), None, Some(3), Some("RA-2")),
            claim_cycle("A-1", 4, dec!(20), None, Some(4), None),
        ];
        let Ok(s1) = rollup_activity(&a1, &cycles) else {
            panic!("rollup failed");
        };
        let payment = rollup_claim(&key, &[s1], None, &[], &cycles);
        assert_eq!(payment.remittance_count, 2);
        assert_eq!(payment.payment_references, vec!["RA-1", "RA-2"]);
        assert!(payment.has_multiple_remittances());
        assert_eq!(payment.latest_payment_reference.as_deref(), Some("RA-2"));
    }

    #[test]
    fn submission_and_events_drive_dates_and_counts() {
        let key = ClaimKey::new("CLM-1");
        let a1 = Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100));
        let cycles = [claim_cycle("A-1", 2, dec!(100), None, Some(10), Some("RA-1"))];
        let submission = ClaimSubmission {
            claim_key: key.clone(),
            submitted_at: ts(1),
            payer_id: Some("PAYER-01".to_string()),
            provider_id: Some("PROV-01".to_string()),
        };
        let events = [
            LifecycleEvent {
                claim_key: key.clone(),
                seq: 1,
                kind: LifecycleKind::Submission,
                event_time: ts(1),
            },
            LifecycleEvent {
                claim_key: key.clone(),
                seq: 3,
                kind: LifecycleKind::Resubmission,
                event_time: ts(5),
            },
        ];
        let Ok(s1) = rollup_activity(&a1, &cycles) else {
            panic!("rollup failed");
        };
        let payment = rollup_claim(&key, &[s1], Some(&submission), &events, &cycles);

        assert_eq!(payment.resubmission_count, 1);
        assert!(payment.has_been_resubmitted());
        assert_eq!(payment.first_submission_at, Some(ts(1)));
        assert_eq!(payment.last_submission_at, Some(ts(5)));
        assert_eq!(payment.days_to_first_payment, Some(9));
        assert_eq!(payment.days_to_settlement, Some(9));
        assert_eq!(payment.tx_at, Some(ts(1)));
    }

    #[test]
    fn tx_time_falls_back_through_batch_then_settlement() {
        let key = ClaimKey::new("CLM-1");
        let a1 = Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100));

        let mut with_batch = claim_cycle("A-1", 1, dec!(100), None, Some(4), None);
        with_batch.batch_at = Some(ts(6));
        let Ok(s1) = rollup_activity(&a1, std::slice::from_ref(&with_batch)) else {
            panic!("rollup failed");
        };
        let payment = rollup_claim(
            &key,
            std::slice::from_ref(&s1),
            None,
            &[],
            std::slice::from_ref(&with_batch),
        );
        assert_eq!(payment.tx_at, Some(ts(6)));

        let settled_only = [claim_cycle("A-1", 1, dec!(100), None, Some(4), None)];
        let Ok(s2) = rollup_activity(&a1, &settled_only) else {
            panic!("rollup failed");
        };
        let payment = rollup_claim(&key, &[s2], None, &[], &settled_only);
        assert_eq!(payment.tx_at, Some(ts(4)));
    }

    #[test]
    fn running_totals_respect_sequence_visibility() {
        let key = ClaimKey::new("CLM-1");
        let activities = [
            Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100)),
            Activity::new(key.clone(), ActivityId::new("A-2"), dec!(50)),
        ];
        let cycles = [
            claim_cycle("A-1", 1, dec!(40), None, Some(1), None),
            claim_cycle("A-2", 3, dec!(0), Some("D1"), Some(2), None),
            claim_cycle("A-1", 5, dec!(60), None, Some(3), None),
        ];

        let Ok((paid, rejected)) = running_totals_at(&activities, &cycles, 2) else {
            panic!("running totals failed");
        };
        assert_eq!(paid, dec!(40));
        assert_eq!(rejected, Decimal::ZERO);

        let Ok((paid, rejected)) = running_totals_at(&activities, &cycles, 4) else {
            panic!("running totals failed");
        };
        assert_eq!(paid, dec!(40));
        assert_eq!(rejected, dec!(50));

        let Ok((paid, rejected)) = running_totals_at(&activities, &cycles, 5) else {
            panic!("running totals failed");
        };
        assert_eq!(paid, dec!(100));
        assert_eq!(rejected, dec!(50));
    }

    #[test]
    fn tampered_summary_fails_consistency_check() {
        let mut s = roll(dec!(100), &[cycle(1, dec!(60), None, Some(1))]);
        assert!(validate_activity_summary(&s).is_ok());
        s.paid = dec!(120);
        let Err(EngineError::Consistency { claim_key, .. }) = validate_activity_summary(&s) else {
            panic!("expected consistency error");
        };
        assert_eq!(claim_key, "CLM-1");
    }

    #[test]
    fn tampered_claim_totals_fail_consistency_check() {
        let key = ClaimKey::new("CLM-1");
        let s = roll(dec!(100), &[cycle(1, dec!(60), None, Some(1))]);
        let mut payment = rollup_claim(&key, std::slice::from_ref(&s), None, &[], &[]);
        assert!(validate_claim_payment(&payment, std::slice::from_ref(&s)).is_ok());
        payment.total_paid += Decimal::ONE;
        assert!(validate_claim_payment(&payment, std::slice::from_ref(&s)).is_err());
    }
}

use std::cmp::Ordering;

use chrono::NaiveDate;

use super::installment::LifecycleStatus;

/// Derives the lifecycle status of an installment from its dates.
///
/// The paid branch wins outright: once a payment date exists, due-date
/// comparisons are irrelevant and the stored `paid_late` hint decides between
/// [`LifecycleStatus::Paid`] and [`LifecycleStatus::PaidLate`]. The hint is
/// never recomputed here so that manual corrections made upstream survive
/// reclassification.
///
/// Unpaid installments are compared by calendar day (`NaiveDate` carries no
/// time component, so both sides are already midnight-normalized):
/// due today → `DueToday`, past due → `Overdue`, otherwise `Awaiting`.
/// Every code path that derives a status goes through this one function, so
/// the loader, the mutation reloads, and the periodic refresh can never
/// disagree on where "today" falls.
pub fn classify(
    due_date: NaiveDate,
    paid_date: Option<NaiveDate>,
    paid_late: bool,
    today: NaiveDate,
) -> LifecycleStatus {
    if paid_date.is_some() {
        return if paid_late {
            LifecycleStatus::PaidLate
        } else {
            LifecycleStatus::Paid
        };
    }
    match due_date.cmp(&today) {
        Ordering::Equal => LifecycleStatus::DueToday,
        Ordering::Less => LifecycleStatus::Overdue,
        Ordering::Greater => LifecycleStatus::Awaiting,
    }
}

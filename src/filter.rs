//! Pure predicate composition over installments. Filtering is a read-only
//! projection; it never touches status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Installment, LifecycleStatus};

/// Which date a range filter compares against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DateAnchor {
    #[default]
    Due,
    Paid,
}

/// Inclusive date range. Calendar dates carry no time component, so both
/// bounds compare as whole days.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub anchor: DateAnchor,
}

impl DateRange {
    fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    fn matches(&self, installment: &Installment) -> bool {
        let anchored = match self.anchor {
            DateAnchor::Due => Some(installment.due_date),
            DateAnchor::Paid => installment.paid_date,
        };
        let Some(date) = anchored else {
            // A paid-date range can never be satisfied by an unpaid
            // installment once either bound is set.
            return !self.is_bounded();
        };
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Filter criteria; each field is independently optional and absence means
/// "no constraint". Criteria are conjunctive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallmentFilter {
    pub status: Option<LifecycleStatus>,
    pub supplier_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub date_range: Option<DateRange>,
}

impl InstallmentFilter {
    pub fn matches(&self, installment: &Installment) -> bool {
        if let Some(status) = self.status {
            if installment.status != status {
                return false;
            }
        }
        if let Some(supplier_id) = self.supplier_id {
            if installment.supplier_id != supplier_id {
                return false;
            }
        }
        if let Some(project_id) = self.project_id {
            if installment.project_id != Some(project_id) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.matches(installment) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, installments: &[Installment]) -> Vec<Installment> {
        installments
            .iter()
            .filter(|installment| self.matches(installment))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(due: NaiveDate, paid: Option<NaiveDate>, supplier: Uuid) -> Installment {
        let mut installment = Installment::new(
            Uuid::new_v4(),
            supplier,
            1,
            1,
            100.0,
            due,
            date(2025, 1, 1),
        );
        installment.paid_date = paid;
        installment.reclassify(date(2025, 1, 1));
        installment
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let supplier = Uuid::new_v4();
        let items = vec![
            sample(date(2025, 1, 5), None, supplier),
            sample(date(2025, 2, 5), Some(date(2025, 2, 1)), supplier),
        ];
        let filter = InstallmentFilter::default();
        assert_eq!(filter.apply(&items).len(), 2);
    }

    #[test]
    fn status_criterion_is_exact() {
        let supplier = Uuid::new_v4();
        let items = vec![
            sample(date(2024, 12, 1), None, supplier), // overdue on 2025-01-01
            sample(date(2025, 3, 1), None, supplier),  // awaiting
        ];
        let filter = InstallmentFilter {
            status: Some(LifecycleStatus::Overdue),
            ..Default::default()
        };
        let narrowed = filter.apply(&items);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].status, LifecycleStatus::Overdue);
    }

    #[test]
    fn supplier_and_project_criteria_compose() {
        let supplier_a = Uuid::new_v4();
        let supplier_b = Uuid::new_v4();
        let project = Uuid::new_v4();
        let mut wanted = sample(date(2025, 1, 5), None, supplier_a);
        wanted.project_id = Some(project);
        let other_project = sample(date(2025, 1, 5), None, supplier_a);
        let other_supplier = sample(date(2025, 1, 5), None, supplier_b);
        let filter = InstallmentFilter {
            supplier_id: Some(supplier_a),
            project_id: Some(project),
            ..Default::default()
        };
        let narrowed = filter.apply(&[wanted.clone(), other_project, other_supplier]);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, wanted.id);
    }

    #[test]
    fn due_range_bounds_are_inclusive() {
        let supplier = Uuid::new_v4();
        let items = vec![
            sample(date(2025, 1, 1), None, supplier),
            sample(date(2025, 1, 15), None, supplier),
            sample(date(2025, 1, 31), None, supplier),
            sample(date(2025, 2, 1), None, supplier),
        ];
        let filter = InstallmentFilter {
            date_range: Some(DateRange {
                start: Some(date(2025, 1, 1)),
                end: Some(date(2025, 1, 31)),
                anchor: DateAnchor::Due,
            }),
            ..Default::default()
        };
        assert_eq!(filter.apply(&items).len(), 3);
    }

    #[test]
    fn bounded_paid_range_excludes_unpaid() {
        let supplier = Uuid::new_v4();
        let unpaid = sample(date(2025, 1, 10), None, supplier);
        let paid = sample(date(2025, 1, 10), Some(date(2025, 1, 12)), supplier);
        let filter = InstallmentFilter {
            date_range: Some(DateRange {
                start: Some(date(2025, 1, 1)),
                end: None,
                anchor: DateAnchor::Paid,
            }),
            ..Default::default()
        };
        let narrowed = filter.apply(&[unpaid, paid.clone()]);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, paid.id);
    }

    #[test]
    fn unbounded_paid_range_keeps_unpaid() {
        let supplier = Uuid::new_v4();
        let unpaid = sample(date(2025, 1, 10), None, supplier);
        let filter = InstallmentFilter {
            date_range: Some(DateRange {
                start: None,
                end: None,
                anchor: DateAnchor::Paid,
            }),
            ..Default::default()
        };
        assert_eq!(filter.apply(std::slice::from_ref(&unpaid)).len(), 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let supplier = Uuid::new_v4();
        let items = vec![
            sample(date(2024, 12, 1), None, supplier),
            sample(date(2025, 3, 1), None, supplier),
            sample(date(2025, 1, 2), Some(date(2025, 1, 2)), supplier),
        ];
        let filter = InstallmentFilter {
            status: Some(LifecycleStatus::Awaiting),
            supplier_id: Some(supplier),
            ..Default::default()
        };
        let once = filter.apply(&items);
        let twice = filter.apply(&once);
        assert_eq!(once.len(), twice.len());
        let once_ids: Vec<Uuid> = once.iter().map(|i| i.id).collect();
        let twice_ids: Vec<Uuid> = twice.iter().map(|i| i.id).collect();
        assert_eq!(once_ids, twice_ids);
    }
}

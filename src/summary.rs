//! Aggregation over installment collections: dashboard totals and the
//! top-supplier ranking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Installment, LifecycleStatus, Supplier};

/// Summary totals for a set of installments. `total_expected` covers every
/// installment regardless of status; the other buckets follow the current
/// status of each one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_expected: f64,
    pub total_paid: f64,
    pub total_overdue: f64,
    pub total_due_today: f64,
}

/// One entry of the supplier ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRanking {
    pub supplier_id: Uuid,
    pub name: String,
    pub total: f64,
    pub installment_count: usize,
}

pub struct SummaryService;

impl SummaryService {
    /// Single pass over the set, summing each amount into the bucket that
    /// matches its current status.
    pub fn totals(installments: &[Installment]) -> Totals {
        let mut totals = Totals::default();
        for installment in installments {
            totals.total_expected += installment.amount;
            match installment.status {
                LifecycleStatus::Paid | LifecycleStatus::PaidLate => {
                    totals.total_paid += installment.amount;
                }
                LifecycleStatus::Overdue => totals.total_overdue += installment.amount,
                LifecycleStatus::DueToday => totals.total_due_today += installment.amount,
                LifecycleStatus::Awaiting => {}
            }
        }
        totals
    }

    /// Groups by supplier, sums amounts and counts installments, joins
    /// display names, and returns the top `n` by summed amount. Suppliers
    /// with a zero sum are excluded. The sort is stable, so ties keep
    /// first-seen input order.
    pub fn top_suppliers(
        installments: &[Installment],
        suppliers: &[Supplier],
        n: usize,
    ) -> Vec<SupplierRanking> {
        let names: HashMap<Uuid, &str> = suppliers
            .iter()
            .map(|supplier| (supplier.id, supplier.name.as_str()))
            .collect();

        let mut order: Vec<Uuid> = Vec::new();
        let mut sums: HashMap<Uuid, (f64, usize)> = HashMap::new();
        for installment in installments {
            let entry = sums.entry(installment.supplier_id).or_insert_with(|| {
                order.push(installment.supplier_id);
                (0.0, 0)
            });
            entry.0 += installment.amount;
            entry.1 += 1;
        }

        let mut ranking: Vec<SupplierRanking> = order
            .into_iter()
            .filter_map(|supplier_id| {
                let (total, installment_count) = sums[&supplier_id];
                if total == 0.0 {
                    return None;
                }
                Some(SupplierRanking {
                    supplier_id,
                    name: names
                        .get(&supplier_id)
                        .map(|name| name.to_string())
                        .unwrap_or_default(),
                    total,
                    installment_count,
                })
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranking.truncate(n);
        ranking
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(amount: f64, due: NaiveDate, supplier: Uuid, today: NaiveDate) -> Installment {
        Installment::new(Uuid::new_v4(), supplier, 1, 1, amount, due, today)
    }

    fn paid(amount: f64, supplier: Uuid, today: NaiveDate) -> Installment {
        let mut installment = sample(amount, today, supplier, today);
        installment.paid_date = Some(today);
        installment.reclassify(today);
        installment
    }

    #[test]
    fn totals_bucket_by_status() {
        let today = date(2025, 1, 10);
        let supplier = Uuid::new_v4();
        let items = vec![
            sample(100.0, date(2025, 1, 20), supplier, today), // awaiting
            sample(200.0, date(2025, 1, 5), supplier, today),  // overdue
            sample(300.0, today, supplier, today),             // due today
            paid(400.0, supplier, today),
        ];
        let totals = SummaryService::totals(&items);
        assert_eq!(totals.total_expected, 1000.0);
        assert_eq!(totals.total_paid, 400.0);
        assert_eq!(totals.total_overdue, 200.0);
        assert_eq!(totals.total_due_today, 300.0);
    }

    #[test]
    fn totals_are_additive_over_disjoint_sets() {
        let today = date(2025, 1, 10);
        let supplier = Uuid::new_v4();
        let a = vec![
            sample(100.0, date(2025, 1, 20), supplier, today),
            sample(50.0, date(2025, 1, 2), supplier, today),
        ];
        let b = vec![paid(75.0, supplier, today)];
        let mut both = a.clone();
        both.extend(b.clone());
        let expected =
            SummaryService::totals(&a).total_expected + SummaryService::totals(&b).total_expected;
        assert_eq!(SummaryService::totals(&both).total_expected, expected);
    }

    #[test]
    fn top_suppliers_ranks_and_truncates() {
        let today = date(2025, 1, 10);
        let a = Supplier::new("Cimento Forte", "11.111.111/0001-11");
        let b = Supplier::new("Areia & Brita", "22.222.222/0001-22");
        let c = Supplier::new("Sem Movimento", "33.333.333/0001-33");
        let items = vec![
            sample(400.0, date(2025, 2, 1), a.id, today),
            sample(300.0, date(2025, 3, 1), a.id, today),
            sample(300.0, date(2025, 4, 1), a.id, today),
            sample(500.0, date(2025, 2, 1), b.id, today),
            sample(0.0, date(2025, 2, 1), c.id, today),
        ];
        let suppliers = vec![a.clone(), b.clone(), c];
        let ranking = SummaryService::top_suppliers(&items, &suppliers, 2);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].supplier_id, a.id);
        assert_eq!(ranking[0].total, 1000.0);
        assert_eq!(ranking[0].installment_count, 3);
        assert_eq!(ranking[0].name, "Cimento Forte");
        assert_eq!(ranking[1].supplier_id, b.id);
        assert_eq!(ranking[1].installment_count, 1);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let today = date(2025, 1, 10);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let items = vec![
            sample(250.0, date(2025, 2, 1), first, today),
            sample(250.0, date(2025, 2, 1), second, today),
        ];
        let ranking = SummaryService::top_suppliers(&items, &[], 10);
        assert_eq!(ranking[0].supplier_id, first);
        assert_eq!(ranking[1].supplier_id, second);
    }

    #[test]
    fn unknown_supplier_keeps_entry_without_name() {
        let today = date(2025, 1, 10);
        let ghost = Uuid::new_v4();
        let items = vec![sample(90.0, date(2025, 2, 1), ghost, today)];
        let ranking = SummaryService::top_suppliers(&items, &[], 5);
        assert_eq!(ranking.len(), 1);
        assert!(ranking[0].name.is_empty());
    }
}

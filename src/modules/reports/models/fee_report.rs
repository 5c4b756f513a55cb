use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::payments::models::PaymentStatus;
use crate::modules::snapshots::models::FeeSnapshot;

/// Platform fees owed by one school over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeReport {
    pub school_id: Uuid,
    /// Inclusive
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub total_fee_amount: Decimal,
    pub total_base_amount: Decimal,
    pub total_amount: Decimal,
    pub transaction_count: i64,
    /// Calendar months in ascending order; months without payments are omitted
    pub monthly: Vec<MonthlyFeeSummary>,
    pub by_payment_method: Vec<PaymentMethodBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFeeSummary {
    /// `YYYY-MM`
    pub month: String,
    pub fee_amount: Decimal,
    pub base_amount: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodBreakdown {
    pub payment_method: String,
    pub fee_amount: Decimal,
    pub transaction_count: i64,
}

#[derive(Default)]
struct Totals {
    fee_amount: Decimal,
    base_amount: Decimal,
    transaction_count: i64,
}

impl Totals {
    fn add(&mut self, snapshot: &FeeSnapshot) {
        self.fee_amount += snapshot.fee_amount;
        self.base_amount += snapshot.base_amount;
        self.transaction_count += 1;
    }
}

impl FeeReport {
    /// Roll snapshots up into a report
    ///
    /// Only completed snapshots created on a day within `[start_date, end_date]`
    /// (UTC) count. The result depends on nothing but the input.
    pub fn from_snapshots(
        school_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        snapshots: &[FeeSnapshot],
    ) -> Self {
        let mut total = Totals::default();
        let mut total_amount = Decimal::ZERO;
        let mut monthly: BTreeMap<String, Totals> = BTreeMap::new();
        let mut by_method: BTreeMap<String, Totals> = BTreeMap::new();

        let counted = snapshots.iter().filter(|s| {
            let day = s.created_at.date_naive();
            s.school_id == school_id
                && s.payment_status == PaymentStatus::Completed
                && day >= start_date
                && day <= end_date
        });

        for snapshot in counted {
            total.add(snapshot);
            total_amount += snapshot.total_amount;

            monthly
                .entry(snapshot.created_at.format("%Y-%m").to_string())
                .or_default()
                .add(snapshot);
            by_method
                .entry(snapshot.payment_method.clone())
                .or_default()
                .add(snapshot);
        }

        Self {
            school_id,
            start_date,
            end_date,
            total_fee_amount: total.fee_amount,
            total_base_amount: total.base_amount,
            total_amount,
            transaction_count: total.transaction_count,
            monthly: monthly
                .into_iter()
                .map(|(month, t)| MonthlyFeeSummary {
                    month,
                    fee_amount: t.fee_amount,
                    base_amount: t.base_amount,
                    transaction_count: t.transaction_count,
                })
                .collect(),
            by_payment_method: by_method
                .into_iter()
                .map(|(payment_method, t)| PaymentMethodBreakdown {
                    payment_method,
                    fee_amount: t.fee_amount,
                    transaction_count: t.transaction_count,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

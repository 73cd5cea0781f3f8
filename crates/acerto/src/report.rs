//! Period summary: revenue, cash, expenses and open debt.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::ExpenseCategory;
use crate::money::{Locale, Money};
use crate::state::Collections;

/// Debtors listed in a summary.
const TOP_DEBTORS: usize = 5;

/// Half-open time range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// First instant included.
    pub from: DateTime<Utc>,
    /// First instant excluded.
    pub to: DateTime<Utc>,
}

impl Period {
    /// Create a period.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `to` is not after `from`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if to <= from {
            return Err(Error::validation("period", "end must be after start"));
        }
        Ok(Self { from, to })
    }

    /// Whole days from `first` through `last`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `last` is before `first`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let from = Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN));
        let to = Utc.from_utc_datetime(&last.and_time(chrono::NaiveTime::MIN)) + Duration::days(1);
        Self::new(from, to)
    }

    /// The calendar month containing `date`.
    #[must_use]
    pub fn month_of(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let next = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        }
        .unwrap_or(first);
        Self {
            from: Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN)),
            to: Utc.from_utc_datetime(&next.and_time(chrono::NaiveTime::MIN)),
        }
    }

    /// Whether `instant` falls inside.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }
}

/// A customer and what they owe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Debtor {
    /// Customer id.
    pub customer_id: String,
    /// Customer name.
    pub name: String,
    /// Open debt.
    pub debt: Money,
}

/// Figures for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Period covered.
    pub period: Period,
    /// Billings in the period.
    pub billings: usize,
    /// Plays counted.
    pub plays: u64,
    /// Revenue before discounts.
    pub gross: Money,
    /// Discounts given.
    pub discounts: Money,
    /// Paid out to establishments.
    pub customer_share: Money,
    /// Kept by the operator.
    pub house_share: Money,
    /// Cash kept at visits (paid minus change).
    pub billing_received: Money,
    /// Cash from debt payments.
    pub debt_received: Money,
    /// All cash received.
    pub cash_received: Money,
    /// Expenses by category.
    pub expenses_by_category: BTreeMap<ExpenseCategory, Money>,
    /// All expenses.
    pub expenses: Money,
    /// Cash received minus expenses.
    pub net_result: Money,
    /// Debt still open across all customers, as of now.
    pub outstanding_debt: Money,
    /// Largest open debts.
    pub top_debtors: Vec<Debtor>,
}

impl Summary {
    /// Compute the summary of `data` over `period`.
    #[must_use]
    pub fn compute(data: &Collections, period: Period) -> Self {
        let mut summary = Self {
            period,
            billings: 0,
            plays: 0,
            gross: Money::ZERO,
            discounts: Money::ZERO,
            customer_share: Money::ZERO,
            house_share: Money::ZERO,
            billing_received: Money::ZERO,
            debt_received: Money::ZERO,
            cash_received: Money::ZERO,
            expenses_by_category: BTreeMap::new(),
            expenses: Money::ZERO,
            net_result: Money::ZERO,
            outstanding_debt: Money::ZERO,
            top_debtors: Vec::new(),
        };

        for billing in data.billings.iter().filter(|b| period.contains(b.date)) {
            let b = &billing.breakdown;
            summary.billings += 1;
            summary.plays += b.plays;
            summary.gross += b.gross;
            summary.discounts += b.discount;
            summary.customer_share += b.customer_share;
            summary.house_share += b.house_share;
            summary.billing_received += b.amount_paid - b.change;
        }

        summary.debt_received = data
            .debt_payments
            .iter()
            .filter(|p| period.contains(p.date))
            .map(|p| p.amount)
            .sum();

        for expense in data.expenses.iter().filter(|e| period.contains(e.date)) {
            *summary
                .expenses_by_category
                .entry(expense.category)
                .or_insert(Money::ZERO) += expense.amount;
            summary.expenses += expense.amount;
        }

        summary.cash_received = summary.billing_received + summary.debt_received;
        summary.net_result = summary.cash_received - summary.expenses;

        summary.outstanding_debt = data
            .customers
            .iter()
            .map(|c| c.debt.max(Money::ZERO))
            .sum();

        let mut debtors: Vec<Debtor> = data
            .customers
            .iter()
            .filter(|c| c.has_debt())
            .map(|c| Debtor {
                customer_id: c.id.clone(),
                name: c.name.clone(),
                debt: c.debt,
            })
            .collect();
        debtors.sort_by(|a, b| b.debt.cmp(&a.debt).then_with(|| a.name.cmp(&b.name)));
        debtors.truncate(TOP_DEBTORS);
        summary.top_debtors = debtors;

        summary
    }

    /// Plain-text rendering for the terminal.
    #[must_use]
    pub fn render(&self, locale: Locale) -> String {
        let m = |amount: Money| amount.format(locale);
        let mut out = String::new();
        let last_day = self.period.to - Duration::seconds(1);
        let _ = writeln!(
            out,
            "Period: {} to {}",
            self.period.from.format("%Y-%m-%d"),
            last_day.format("%Y-%m-%d")
        );
        let _ = writeln!(out, "Billings:          {}", self.billings);
        let _ = writeln!(out, "Plays:             {}", self.plays);
        let _ = writeln!(out, "Gross:             {}", m(self.gross));
        let _ = writeln!(out, "Discounts:         {}", m(self.discounts));
        let _ = writeln!(out, "Customer share:    {}", m(self.customer_share));
        let _ = writeln!(out, "House share:       {}", m(self.house_share));
        let _ = writeln!(out, "Received (visits): {}", m(self.billing_received));
        let _ = writeln!(out, "Received (debts):  {}", m(self.debt_received));
        let _ = writeln!(out, "Expenses:          {}", m(self.expenses));
        for (category, amount) in &self.expenses_by_category {
            let _ = writeln!(out, "  {:<16} {}", category.label(), m(*amount));
        }
        let _ = writeln!(out, "Net result:        {}", m(self.net_result));
        let _ = writeln!(out, "Outstanding debt:  {}", m(self.outstanding_debt));
        if !self.top_debtors.is_empty() {
            let _ = writeln!(out, "Top debtors:");
            for debtor in &self.top_debtors {
                let _ = writeln!(out, "  {:<24} {}", debtor.name, m(debtor.debt));
            }
        }
        out
    }
}

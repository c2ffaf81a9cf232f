//! Planned versus actual figures for one category in a budget period.
//!
//! These functions do no I/O. Callers fetch the rows and pass them in.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{category::Category, transaction::Transaction};

/// The planned, spent and remaining amounts for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudgetRow {
    /// The amount the user planned to spend or earn.
    pub planned_amount: Decimal,
    /// The activity in the period, always a non-negative magnitude.
    pub spent_amount: Decimal,
    /// For expenses how much is left to spend, for income how far past the plan
    /// the category is (negative while short of the plan).
    pub remaining_amount: Decimal,
    /// `spent_amount` as a percentage of `planned_amount`, 0 when nothing is planned.
    pub percentage_used: Decimal,
}

/// The activity of a category over `transactions`.
///
/// Only transactions filed under `category` count, and transfers never do.
/// Income categories count positive amounts, expense categories count the
/// magnitude of negative amounts. Amounts with the other sign are ignored.
pub fn category_activity(category: &Category, transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|transaction| {
            !transaction.is_transfer && transaction.category_id == Some(category.id)
        })
        .filter_map(|transaction| {
            if category.is_income {
                (transaction.amount > Decimal::ZERO).then_some(transaction.amount)
            } else {
                (transaction.amount < Decimal::ZERO).then_some(-transaction.amount)
            }
        })
        .sum()
}

/// Compute the budget row for `category` from its transactions in the period
/// and its planned amount, which is zero when nothing has been planned yet.
pub fn compute_category_budget_row(
    category: &Category,
    transactions: &[Transaction],
    planned_amount: Decimal,
) -> CategoryBudgetRow {
    let spent_amount = category_activity(category, transactions);

    let remaining_amount = if category.is_income {
        spent_amount - planned_amount
    } else {
        planned_amount - spent_amount
    };

    let percentage_used = if planned_amount > Decimal::ZERO {
        (spent_amount / planned_amount * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    CategoryBudgetRow {
        planned_amount,
        spent_amount,
        remaining_amount,
        percentage_used,
    }
}


#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::{
        CategoryBudgetRow, compute_category_budget_row,
        test_helpers::{category, transaction},
    };

    #[test]
    fn groceries_scenario() {
        let groceries = category(1, "Groceries", false);
        let transactions = vec![
            transaction(1, 1, dec!(-120.00), date!(2025 - 05 - 03), Some(1)),
            transaction(2, 1, dec!(-80.00), date!(2025 - 05 - 17), Some(1)),
        ];

        let row = compute_category_budget_row(&groceries, &transactions, dec!(500.00));

        assert_eq!(
            row,
            CategoryBudgetRow {
                planned_amount: dec!(500.00),
                spent_amount: dec!(200.00),
                remaining_amount: dec!(300.00),
                percentage_used: dec!(40),
            }
        );
    }

    #[test]
    fn expense_category_ignores_refunds() {
        let groceries = category(1, "Groceries", false);
        let transactions = vec![
            transaction(1, 1, dec!(-50), date!(2025 - 05 - 03), Some(1)),
            transaction(2, 1, dec!(20), date!(2025 - 05 - 04), Some(1)),
        ];

        let row = compute_category_budget_row(&groceries, &transactions, dec!(100));

        assert_eq!(row.spent_amount, dec!(50));
        assert_eq!(row.remaining_amount, dec!(50));
    }

    #[test]
    fn income_category_counts_only_positive_amounts_and_inverts_remaining() {
        let salary = category(2, "Salary", true);
        let transactions = vec![
            transaction(1, 1, dec!(3000), date!(2025 - 05 - 15), Some(2)),
            transaction(2, 1, dec!(-100), date!(2025 - 05 - 16), Some(2)),
        ];

        let row = compute_category_budget_row(&salary, &transactions, dec!(4000));

        assert_eq!(row.spent_amount, dec!(3000));
        assert_eq!(row.remaining_amount, dec!(-1000));
        assert_eq!(row.percentage_used, dec!(75));
    }

    #[test]
    fn zero_planned_amount_gives_zero_percent() {
        let groceries = category(1, "Groceries", false);
        let transactions = vec![transaction(1, 1, dec!(-10), date!(2025 - 05 - 03), Some(1))];

        let row = compute_category_budget_row(&groceries, &transactions, Decimal::ZERO);

        assert_eq!(row.percentage_used, Decimal::ZERO);
        assert_eq!(row.remaining_amount, dec!(-10));
    }

    #[test]
    fn spent_amount_is_never_negative() {
        let groceries = category(1, "Groceries", false);
        let salary = category(2, "Salary", true);
        let transactions = vec![
            transaction(1, 1, dec!(75), date!(2025 - 05 - 03), Some(1)),
            transaction(2, 1, dec!(-75), date!(2025 - 05 - 03), Some(2)),
        ];

        for category in [groceries, salary] {
            let row = compute_category_budget_row(&category, &transactions, dec!(10));

            assert_eq!(row.spent_amount, Decimal::ZERO);
        }
    }

    #[test]
    fn skips_transfers_and_other_categories() {
        let groceries = category(1, "Groceries", false);
        let mut transfer = transaction(1, 1, dec!(-500), date!(2025 - 05 - 03), Some(1));
        transfer.is_transfer = true;
        let transactions = vec![
            transfer,
            transaction(2, 1, dec!(-30), date!(2025 - 05 - 03), Some(3)),
            transaction(3, 1, dec!(-30), date!(2025 - 05 - 03), None),
        ];

        let row = compute_category_budget_row(&groceries, &transactions, dec!(100));

        assert_eq!(row.spent_amount, Decimal::ZERO);
    }

    #[test]
    fn percentage_is_rounded_to_two_places() {
        let groceries = category(1, "Groceries", false);
        let transactions = vec![transaction(1, 1, dec!(-1), date!(2025 - 05 - 03), Some(1))];

        let row = compute_category_budget_row(&groceries, &transactions, dec!(3));

        assert_eq!(row.percentage_used, dec!(33.33));
    }
}

//! Period totals, point-in-time account balances and the category breakdown.
//!
//! Everything here is pure computation over rows the caller has fetched.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    account::{Account, AccountId},
    category::{Category, CategoryId},
    transaction::{DateRange, Transaction},
};

/// The label used for activity with no category.
pub const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// An account's balance derived from its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// The account the balance is for.
    pub account_id: AccountId,
    /// The account name.
    pub name: String,
    /// The account currency.
    pub currency: String,
    /// The sum of the account's non-transfer transactions up to the cutoff.
    pub balance: Decimal,
}

/// A category's share of the period's income or expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// The category, `None` for uncategorised activity.
    pub category_id: Option<CategoryId>,
    /// The category name.
    pub name: String,
    /// Whether the amount counts as income.
    pub is_income: bool,
    /// The category's income, or its spending as a positive magnitude.
    pub amount: Decimal,
    /// `amount` as a percentage of total income or total expenses.
    pub percent: Decimal,
}

/// The figures reported for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryData {
    /// The cutoff date for balances, the last day of the period.
    pub as_of: Date,
    /// The first day of the period.
    pub start: Date,
    /// Money earned in income categories.
    pub income: Decimal,
    /// Money spent outside of income categories, as a positive magnitude.
    pub expenses: Decimal,
    /// `income - expenses`.
    pub net_income: Decimal,
    /// `net_income / income`, or 0 when there was no income.
    pub savings_rate: Decimal,
    /// Account balances as of `as_of`.
    pub accounts: Vec<AccountBalance>,
    /// The sum of the account balances.
    pub net_worth: Decimal,
    /// Categories with activity in the period.
    pub categories: Vec<CategoryBreakdown>,
}

fn percent_of(amount: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        (amount / total * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Compute the summary for `period`.
///
/// `transactions` should include everything dated on or before the end of the
/// period. Income and expenses only count transactions dated inside the period
/// while balances use all of them. Transfers are ignored throughout.
pub fn compute_period_summary(
    transactions: &[Transaction],
    accounts: &[Account],
    categories: &[Category],
    period: &DateRange,
) -> SummaryData {
    let as_of = period.end;
    let category_by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();

    let mut balances: HashMap<AccountId, Decimal> = HashMap::new();
    let mut income = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;
    let mut income_by_category: HashMap<Option<CategoryId>, Decimal> = HashMap::new();
    let mut expenses_by_category: HashMap<Option<CategoryId>, Decimal> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| !transaction.is_transfer && transaction.date <= as_of)
    {
        *balances.entry(transaction.account_id).or_default() += transaction.amount;

        if !period.contains(transaction.date) {
            continue;
        }

        let category = transaction
            .category_id
            .and_then(|id| category_by_id.get(&id).copied());
        let key = category.map(|category| category.id);

        if category.is_some_and(|category| category.is_income) {
            income += transaction.amount;
            *income_by_category.entry(key).or_default() += transaction.amount;
        } else {
            // Any non-income row counts as spending, refunds and deposits included.
            let magnitude = transaction.amount.abs();
            expenses += magnitude;
            *expenses_by_category.entry(key).or_default() += magnitude;
        }
    }

    let net_income = income - expenses;
    let savings_rate = if income > Decimal::ZERO {
        (net_income / income).round_dp(4)
    } else {
        Decimal::ZERO
    };

    let accounts: Vec<AccountBalance> = accounts
        .iter()
        .map(|account| AccountBalance {
            account_id: account.id,
            name: account.name.clone(),
            currency: account.currency.clone(),
            balance: balances.get(&account.id).copied().unwrap_or_default(),
        })
        .collect();
    let net_worth = accounts.iter().map(|account| account.balance).sum();

    let mut breakdown = Vec::new();
    for category in categories {
        if let Some(amount) = income_by_category
            .get(&Some(category.id))
            .filter(|amount| !amount.is_zero())
        {
            breakdown.push(CategoryBreakdown {
                category_id: Some(category.id),
                name: category.name.to_string(),
                is_income: true,
                amount: *amount,
                percent: percent_of(*amount, income),
            });
        }

        if let Some(amount) = expenses_by_category
            .get(&Some(category.id))
            .filter(|amount| !amount.is_zero())
        {
            breakdown.push(CategoryBreakdown {
                category_id: Some(category.id),
                name: category.name.to_string(),
                is_income: false,
                amount: *amount,
                percent: percent_of(*amount, expenses),
            });
        }
    }

    if let Some(amount) = expenses_by_category
        .get(&None)
        .filter(|amount| !amount.is_zero())
    {
        breakdown.push(CategoryBreakdown {
            category_id: None,
            name: UNCATEGORISED_LABEL.to_owned(),
            is_income: false,
            amount: *amount,
            percent: percent_of(*amount, expenses),
        });
    }

    SummaryData {
        as_of,
        start: period.start,
        income,
        expenses,
        net_income,
        savings_rate,
        accounts,
        net_worth,
        categories: breakdown,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        UserID,
        account::Account,
        budget::test_helpers::{category, transaction},
        summary::aggregation::{UNCATEGORISED_LABEL, compute_period_summary},
        transaction::DateRange,
    };

    fn account(id: i64, stored_balance: Decimal) -> Account {
        Account {
            id,
            user_id: UserID::new(1),
            name: format!("Account {id}"),
            balance: stored_balance,
            balance_date: date!(2025 - 01 - 01),
            currency: "NZD".to_owned(),
            is_active: true,
        }
    }

    fn may() -> DateRange {
        DateRange::new(date!(2025 - 05 - 01), date!(2025 - 05 - 31)).unwrap()
    }

    #[test]
    fn derived_balance_ignores_stored_balance() {
        let salary = category(1, "Salary", true);
        let rent = category(2, "Rent", false);
        let transactions = vec![
            transaction(1, 1, dec!(1000.00), date!(2025 - 05 - 01), Some(1)),
            transaction(2, 1, dec!(-250.00), date!(2025 - 05 - 02), Some(2)),
        ];

        let summary = compute_period_summary(
            &transactions,
            &[account(1, dec!(123456))],
            &[salary, rent],
            &may(),
        );

        assert_eq!(summary.accounts[0].balance, dec!(750.00));
        assert_eq!(summary.net_worth, dec!(750.00));
        assert_eq!(summary.as_of, date!(2025 - 05 - 31));
    }

    #[test]
    fn computes_income_expenses_and_savings_rate() {
        let salary = category(1, "Salary", true);
        let rent = category(2, "Rent", false);
        let food = category(3, "Food", false);
        let transactions = vec![
            transaction(1, 1, dec!(4000.00), date!(2025 - 05 - 15), Some(1)),
            transaction(2, 1, dec!(-1500.00), date!(2025 - 05 - 01), Some(2)),
            transaction(3, 1, dec!(-0.10), date!(2025 - 05 - 02), Some(3)),
            transaction(4, 1, dec!(-0.20), date!(2025 - 05 - 03), Some(3)),
        ];

        let summary = compute_period_summary(
            &transactions,
            &[account(1, dec!(0))],
            &[salary, rent, food],
            &may(),
        );

        assert_eq!(summary.income, dec!(4000.00));
        assert_eq!(summary.expenses, dec!(1500.30));
        assert_eq!(summary.net_income, dec!(2499.70));
        assert_eq!(summary.income - summary.expenses, summary.net_income);
        assert_eq!(summary.savings_rate, dec!(0.6249));
    }

    #[test]
    fn zero_income_gives_zero_savings_rate() {
        let rent = category(2, "Rent", false);
        let transactions = vec![transaction(1, 1, dec!(-10), date!(2025 - 05 - 01), Some(2))];

        let summary = compute_period_summary(&transactions, &[], &[rent], &may());

        assert_eq!(summary.income, Decimal::ZERO);
        assert_eq!(summary.savings_rate, Decimal::ZERO);
        assert_eq!(summary.net_income, dec!(-10));
    }

    #[test]
    fn non_income_amounts_count_as_expenses_whatever_their_sign() {
        let food = category(3, "Food", false);
        let transactions = vec![
            transaction(1, 1, dec!(-100), date!(2025 - 05 - 01), Some(3)),
            transaction(2, 1, dec!(20), date!(2025 - 05 - 02), Some(3)),
            transaction(3, 1, dec!(5), date!(2025 - 05 - 03), None),
        ];

        let summary =
            compute_period_summary(&transactions, &[account(1, dec!(0))], &[food], &may());

        assert_eq!(summary.expenses, dec!(125));
        assert_eq!(summary.net_income, dec!(-125));
        assert_eq!(summary.accounts[0].balance, dec!(-75));
        assert_eq!(summary.categories[0].amount, dec!(120));
    }

    #[test]
    fn transfers_are_excluded_everywhere() {
        let rent = category(2, "Rent", false);
        let mut transfer = transaction(1, 1, dec!(-500), date!(2025 - 05 - 01), Some(2));
        transfer.is_transfer = true;

        let summary = compute_period_summary(&[transfer], &[account(1, dec!(0))], &[rent], &may());

        assert_eq!(summary.expenses, Decimal::ZERO);
        assert_eq!(summary.accounts[0].balance, Decimal::ZERO);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn earlier_transactions_count_towards_balances_only() {
        let salary = category(1, "Salary", true);
        let transactions = vec![
            transaction(1, 1, dec!(100), date!(2025 - 04 - 30), Some(1)),
            transaction(2, 1, dec!(50), date!(2025 - 05 - 10), Some(1)),
            transaction(3, 1, dec!(999), date!(2025 - 06 - 01), Some(1)),
        ];

        let summary =
            compute_period_summary(&transactions, &[account(1, dec!(0))], &[salary], &may());

        assert_eq!(summary.income, dec!(50));
        assert_eq!(summary.accounts[0].balance, dec!(150));
    }

    #[test]
    fn breakdown_has_percentages_and_uncategorised_bucket() {
        let salary = category(1, "Salary", true);
        let rent = category(2, "Rent", false);
        let idle = category(3, "Idle", false);
        let transactions = vec![
            transaction(1, 1, dec!(2000), date!(2025 - 05 - 01), Some(1)),
            transaction(2, 1, dec!(-300), date!(2025 - 05 - 02), Some(2)),
            transaction(3, 1, dec!(-100), date!(2025 - 05 - 03), None),
        ];

        let summary = compute_period_summary(
            &transactions,
            &[account(1, dec!(0))],
            &[salary, rent, idle],
            &may(),
        );

        let breakdown = &summary.categories;
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].category_id, Some(1));
        assert_eq!(breakdown[0].percent, dec!(100));
        assert_eq!(breakdown[1].category_id, Some(2));
        assert_eq!(breakdown[1].amount, dec!(300));
        assert_eq!(breakdown[1].percent, dec!(75));
        assert_eq!(breakdown[2].category_id, None);
        assert_eq!(breakdown[2].name, UNCATEGORISED_LABEL);
        assert_eq!(breakdown[2].percent, dec!(25));
    }
}

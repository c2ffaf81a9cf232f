//! Builds the month view of a budget from categories, plans and transactions.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error, UserID,
    budget::{
        core::{BudgetId, get_budget_categories, get_monthly_budget},
        reconciliation::{CategoryBudgetRow, compute_category_budget_row},
    },
    category::{Category, CategoryId, CategoryName, get_categories_for_user},
    transaction::{get_transactions_in_range, month_bounds},
};

/// One category's line in the month view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudgetView {
    /// The category the line is for.
    pub category_id: CategoryId,
    /// The category name.
    pub name: CategoryName,
    /// Whether the category is for income.
    pub is_income: bool,
    /// Whether the category is flagged as excluded from budgets.
    pub exclude_from_budget: bool,
    /// Whether the category was archived, but was still active during the month.
    pub is_archived: bool,
    /// The planned and actual figures.
    #[serde(flatten)]
    pub row: CategoryBudgetRow,
}

/// Planned and actual totals across all categories for the month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetTotals {
    /// The planned amounts of income categories.
    pub planned_income: Decimal,
    /// The activity of income categories.
    pub actual_income: Decimal,
    /// The planned amounts of expense categories.
    pub planned_expenses: Decimal,
    /// The activity of expense categories.
    pub actual_expenses: Decimal,
}

/// The budget for a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOverview {
    /// The calendar year.
    pub year: i32,
    /// The month number, 1 to 12.
    pub month: u8,
    /// The first day of the month.
    pub start_date: Date,
    /// The last day of the month.
    pub end_date: Date,
    /// The stored budget, `None` until an amount is planned for the month.
    pub budget_id: Option<BudgetId>,
    /// One line per category in display order.
    pub categories: Vec<CategoryBudgetView>,
    /// The sums of the lines.
    pub totals: BudgetTotals,
}

/// Whether `category` should appear in a month starting on `month_start`.
///
/// Archived categories still show in the months before they were archived.
fn is_visible_in_month(category: &Category, month_start: Date) -> bool {
    if !category.is_archived {
        return true;
    }

    category
        .archived_at
        .is_some_and(|archived_at| archived_at.date() >= month_start)
}

/// Build the view of the user's budget for a month.
///
/// Reading a month does not create its budget. Categories without a planned
/// amount are shown with a plan of zero.
///
/// # Errors
/// Returns [Error::InvalidMonth] or [Error::InvalidYear] for a bad month, or
/// [Error::SqlError] if a query fails.
pub fn get_budget_overview(
    user_id: UserID,
    year: i32,
    month: u8,
    connection: &Connection,
) -> Result<BudgetOverview, Error> {
    let range = month_bounds(year, month)?;
    let budget = get_monthly_budget(user_id, year, month, connection)?;

    let planned: HashMap<CategoryId, Decimal> = match &budget {
        Some(budget) => get_budget_categories(budget.id, connection)?
            .into_iter()
            .map(|row| (row.category_id, row.planned_amount))
            .collect(),
        None => HashMap::new(),
    };

    let transactions = get_transactions_in_range(user_id, range, connection)?;
    let mut totals = BudgetTotals::default();

    let categories = get_categories_for_user(user_id, true, connection)?
        .into_iter()
        .filter(|category| is_visible_in_month(category, range.start))
        .map(|category| {
            let planned_amount = planned
                .get(&category.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let row = compute_category_budget_row(&category, &transactions, planned_amount);

            if category.is_income {
                totals.planned_income += row.planned_amount;
                totals.actual_income += row.spent_amount;
            } else {
                totals.planned_expenses += row.planned_amount;
                totals.actual_expenses += row.spent_amount;
            }

            CategoryBudgetView {
                category_id: category.id,
                name: category.name,
                is_income: category.is_income,
                exclude_from_budget: category.exclude_from_budget,
                is_archived: category.is_archived,
                row,
            }
        })
        .collect();

    Ok(BudgetOverview {
        year,
        month,
        start_date: range.start,
        end_date: range.end,
        budget_id: budget.map(|budget| budget.id),
        categories,
        totals,
    })
}

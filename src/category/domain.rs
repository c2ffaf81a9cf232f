//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, UserID};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl TryFrom<String> for CategoryName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CategoryName::new(&value)
    }
}

impl From<CategoryName> for String {
    fn from(value: CategoryName) -> Self {
        value.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A user-defined label for transactions (e.g., 'Groceries', 'Salary').
///
/// A category belongs to exactly one user. Archived categories are hidden from
/// budgeting views but are kept so that old transactions stay categorised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The display name, unique per user.
    pub name: CategoryName,
    /// Income categories count money coming in, all others count spending.
    pub is_income: bool,
    /// Stored for clients, budgets do not filter on it.
    pub exclude_from_budget: bool,
    /// Stored for clients, summaries do not filter on it.
    pub exclude_from_totals: bool,
    /// Whether the category is hidden from new budgets.
    pub is_archived: bool,
    /// When the category was first archived.
    pub archived_at: Option<OffsetDateTime>,
    /// Position of the category in the user's list.
    pub order: i64,
}

/// The data needed to create a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Whether the category is for income.
    #[serde(default)]
    pub is_income: bool,
    /// See [Category::exclude_from_budget].
    #[serde(default)]
    pub exclude_from_budget: bool,
    /// See [Category::exclude_from_totals].
    #[serde(default)]
    pub exclude_from_totals: bool,
}

impl NewCategory {
    /// An expense category with no exclusions.
    pub fn expense(name: CategoryName) -> Self {
        Self {
            name,
            is_income: false,
            exclude_from_budget: false,
            exclude_from_totals: false,
        }
    }

    /// An income category with no exclusions.
    pub fn income(name: CategoryName) -> Self {
        Self {
            is_income: true,
            ..Self::expense(name)
        }
    }
}

/// Changes to an existing category. Fields that are `None` are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    /// A new display name.
    pub name: Option<CategoryName>,
    /// Move the category between income and expenses.
    pub is_income: Option<bool>,
    /// See [Category::exclude_from_budget].
    pub exclude_from_budget: Option<bool>,
    /// See [Category::exclude_from_totals].
    pub exclude_from_totals: Option<bool>,
}

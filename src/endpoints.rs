//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}/close',
//! use [format_endpoint].

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to close an account.
pub const CLOSE_ACCOUNT: &str = "/api/accounts/{account_id}/close";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to update a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to archive a category.
pub const ARCHIVE_CATEGORY: &str = "/api/categories/{category_id}/archive";
/// The route to change the display order of categories.
pub const CATEGORY_ORDER: &str = "/api/categories/order";
/// The route to list and record transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to delete a transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to read a month's budget and plan amounts.
pub const BUDGETS: &str = "/api/budgets";
/// The route for the period summary.
pub const SUMMARY: &str = "/api/summary";
/// The route for the seat usage of the user's subscription.
pub const SUBSCRIPTION_STATUS: &str = "/api/subscription/status";
/// The route to list the seats of the user's subscription.
pub const SUBSCRIPTION_SEATS: &str = "/api/subscription/seats";
/// The route for an owner to remove a member.
pub const SUBSCRIPTION_SEAT: &str = "/api/subscription/seats/{user_id}";
/// The route to send an invitation.
pub const INVITATIONS: &str = "/api/invitations";
/// The route to accept an invitation.
pub const ACCEPT_INVITATION: &str = "/api/invitations/accept";
/// The route to decline an invitation.
pub const DECLINE_INVITATION: &str = "/api/invitations/decline";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

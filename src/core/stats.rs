use crate::core::models::{Expense, UserStats};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;

/// Start of the calendar month containing `now` and start of the next one.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (start, end)
}

/// Profile statistics for `user_id` over `expenses` from the user's groups.
///
/// Spend and owed/owe figures cover the current month only; `last_activity`
/// looks at every expense and falls back to `fallback_activity`.
pub fn monthly_stats(
    user_id: &str,
    expenses: &[Expense],
    groups_count: usize,
    fallback_activity: DateTime<Utc>,
    now: DateTime<Utc>,
) -> UserStats {
    let (start, end) = month_bounds(now);

    let mut total_expenses = Decimal::ZERO;
    let mut total_owed = Decimal::ZERO;
    let mut total_owe = Decimal::ZERO;

    for expense in expenses.iter().filter(|e| e.date >= start && e.date < end) {
        total_expenses += expense.amount;
        if expense.paid_by == user_id {
            total_owed += expense
                .split_between
                .iter()
                .filter(|s| s.user != user_id)
                .map(|s| s.share)
                .sum::<Decimal>();
        } else {
            total_owe += expense.share_of(user_id).unwrap_or(Decimal::ZERO);
        }
    }

    let last_activity = expenses
        .iter()
        .filter(|e| e.involves(user_id))
        .map(|e| e.date)
        .max()
        .unwrap_or(fallback_activity);

    UserStats {
        total_expenses,
        total_owed,
        total_owe,
        settled_balance: total_owed - total_owe,
        groups_count,
        last_activity,
    }
}

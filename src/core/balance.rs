//! Balance aggregation over already-fetched group snapshots.
//!
//! Everything here is a pure reduction: no storage access, no shared state.
//! Amounts are `Decimal`, so sums are exact and the order in which expenses
//! are visited never changes the result.

use crate::core::models::{Balances, Expense, Group, GroupSummary, UserTotals};
use rust_decimal::Decimal;

/// Net balance of every member across `expenses`.
///
/// Every id in `members` is present in the result, even with no expenses.
/// A payer or split user missing from `members` (for example someone who has
/// since left the group) still gets an entry, so the key set can be larger
/// than the member list. No filtering by group and no sign checks happen
/// here; callers validate on write.
pub fn compute_balances(members: &[String], expenses: &[Expense]) -> Balances {
    let mut balances: Balances = members.iter().map(|m| (m.clone(), Decimal::ZERO)).collect();

    for expense in expenses {
        *balances.entry(expense.paid_by.clone()).or_insert(Decimal::ZERO) += expense.amount;
        for split in &expense.split_between {
            *balances.entry(split.user.clone()).or_insert(Decimal::ZERO) -= split.share;
        }
    }

    balances
}

/// Total spend plus per-member balances for one group.
pub fn summarize_group(group: &Group, expenses: &[Expense]) -> GroupSummary {
    GroupSummary {
        group_total: expenses.iter().map(|e| e.amount).sum(),
        balances: compute_balances(&group.members, expenses),
    }
}

/// Folds one user's balance from each group into owed / owe totals.
pub fn summarize_user<'a, I>(user_id: &str, groups: I) -> UserTotals
where
    I: IntoIterator<Item = &'a GroupSummary>,
{
    let mut totals = UserTotals::default();
    for summary in groups {
        let balance = summary.balances.get(user_id).copied().unwrap_or(Decimal::ZERO);
        if balance > Decimal::ZERO {
            totals.total_owed += balance;
        } else if balance < Decimal::ZERO {
            totals.total_owe += balance.abs();
        }
    }
    totals.net_balance = totals.total_owed - totals.total_owe;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Split;
    use chrono::Utc;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn expense(id: &str, amount: Decimal, paid_by: &str, splits: &[(&str, Decimal)]) -> Expense {
        Expense {
            id: id.to_string(),
            group: "g1".to_string(),
            description: format!("expense {}", id),
            amount,
            paid_by: paid_by.to_string(),
            split_between: splits.iter().map(|(u, s)| Split::new(*u, *s)).collect(),
            date: Utc::now(),
            category: None,
        }
    }

    fn group(members: &[&str]) -> Group {
        Group {
            id: "g1".to_string(),
            name: "Trip".to_string(),
            description: None,
            members: ids(members),
            created_by: members[0].to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn two_member_even_split() {
        let expenses = vec![expense("e1", dec(100), "A", &[("A", dec(50)), ("B", dec(50))])];
        let balances = compute_balances(&ids(&["A", "B"]), &expenses);
        assert_eq!(balances["A"], dec(50));
        assert_eq!(balances["B"], dec(-50));
        assert_eq!(balances.values().copied().sum::<Decimal>(), Decimal::ZERO);
    }

    #[test]
    fn three_way_split() {
        let expenses = vec![expense(
            "e1",
            dec(90),
            "A",
            &[("A", dec(30)), ("B", dec(30)), ("C", dec(30))],
        )];
        let balances = compute_balances(&ids(&["A", "B", "C"]), &expenses);
        assert_eq!(balances["A"], dec(60));
        assert_eq!(balances["B"], dec(-30));
        assert_eq!(balances["C"], dec(-30));
    }

    #[test]
    fn every_member_seeded_without_expenses() {
        let balances = compute_balances(&ids(&["A", "B", "C"]), &[]);
        assert_eq!(balances.len(), 3);
        assert!(balances.values().all(|b| b.is_zero()));
    }

    #[test]
    fn zero_sum_over_mixed_payers() {
        let cents = |n: i64| Decimal::new(n, 2);
        let expenses = vec![
            expense("e1", cents(10000), "A", &[("A", cents(3334)), ("B", cents(3333)), ("C", cents(3333))]),
            expense("e2", cents(4550), "B", &[("A", cents(2275)), ("B", cents(2275))]),
            expense("e3", cents(1999), "C", &[("C", cents(1000)), ("A", cents(999))]),
        ];
        let balances = compute_balances(&ids(&["A", "B", "C"]), &expenses);
        assert_eq!(balances.values().copied().sum::<Decimal>(), Decimal::ZERO);
    }

    #[test]
    fn order_does_not_matter() {
        let cents = |n: i64| Decimal::new(n, 2);
        let mut expenses = vec![
            expense("e1", cents(1010), "A", &[("B", cents(1010))]),
            expense("e2", cents(2020), "B", &[("A", cents(1010)), ("C", cents(1010))]),
            expense("e3", cents(333), "C", &[("A", cents(111)), ("B", cents(111)), ("C", cents(111))]),
        ];
        let members = ids(&["A", "B", "C"]);
        let forward = compute_balances(&members, &expenses);
        expenses.reverse();
        let backward = compute_balances(&members, &expenses);
        expenses.swap(0, 1);
        let shuffled = compute_balances(&members, &expenses);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn recomputation_is_identical() {
        let expenses = vec![expense("e1", dec(40), "B", &[("A", dec(20)), ("B", dec(20))])];
        let members = ids(&["A", "B"]);
        assert_eq!(compute_balances(&members, &expenses), compute_balances(&members, &expenses));
    }

    #[test]
    fn former_member_still_gets_an_entry() {
        let expenses = vec![expense("e1", dec(60), "A", &[("A", dec(30)), ("Z", dec(30))])];
        let balances = compute_balances(&ids(&["A", "B"]), &expenses);
        assert_eq!(balances.len(), 3);
        assert_eq!(balances["Z"], dec(-30));
        assert_eq!(balances["B"], Decimal::ZERO);
    }

    #[test]
    fn group_total_ignores_how_expenses_are_split() {
        let g = group(&["A", "B"]);
        let expenses = vec![
            expense("e1", dec(100), "A", &[("B", dec(100))]),
            expense("e2", dec(50), "B", &[("A", dec(10)), ("B", dec(40))]),
        ];
        let summary = summarize_group(&g, &expenses);
        assert_eq!(summary.group_total, dec(150));
        assert_eq!(summary.balances["A"], dec(90));
        assert_eq!(summary.balances["B"], dec(-90));
    }

    #[test]
    fn empty_group_summary() {
        let summary = summarize_group(&group(&["A"]), &[]);
        assert_eq!(summary.group_total, Decimal::ZERO);
        assert_eq!(summary.balances.len(), 1);
    }

    #[test]
    fn user_totals_across_groups() {
        let g1 = GroupSummary {
            group_total: dec(100),
            balances: [("u".to_string(), dec(50)), ("x".to_string(), dec(-50))].into(),
        };
        let g2 = GroupSummary {
            group_total: dec(40),
            balances: [("u".to_string(), dec(-20)), ("y".to_string(), dec(20))].into(),
        };
        let g3 = GroupSummary {
            group_total: Decimal::ZERO,
            balances: [("y".to_string(), Decimal::ZERO)].into(),
        };

        let totals = summarize_user("u", [&g1, &g2, &g3]);
        assert_eq!(totals.total_owed, dec(50));
        assert_eq!(totals.total_owe, dec(20));
        assert_eq!(totals.net_balance, dec(30));
    }

    #[test]
    fn user_totals_with_no_groups() {
        let totals = summarize_user("u", std::iter::empty());
        assert_eq!(totals, UserTotals::default());
    }
}

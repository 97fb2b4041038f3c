pub mod activity;
pub mod expense;
pub mod group;
pub mod summary;
pub mod user;

pub use activity::ActivityEntry;
pub use expense::{Expense, ExpenseUpdate, ExpenseView, NewExpense, Split, SplitView};
pub use group::{Group, GroupMember, GroupUpdate, GroupView, Role};
pub use summary::{Balances, GroupSummary, UserStats, UserTotals};
pub use user::{Currency, MemberSummary, NewUser, ProfileUpdate, User};

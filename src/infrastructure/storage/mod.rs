use crate::core::errors::SplitError;
use crate::core::models::{Expense, Group, User};
use async_trait::async_trait;

/// Persistence collaborator for users, groups and expenses.
///
/// Implementations own uniqueness of user emails and usernames. Group
/// mutations apply in place and are atomic per call. Authorization (who may
/// edit) is enforced by the service.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fails with `EmailAlreadyRegistered` or `UsernameTaken` on conflict.
    async fn create_user(&self, user: User) -> Result<User, SplitError>;
    /// Replaces a stored user, re-indexing email and username.
    async fn update_user(&self, user: User) -> Result<User, SplitError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SplitError>;
    /// Users for the given ids; unknown ids are skipped.
    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, SplitError>;

    async fn save_group(&self, group: Group) -> Result<(), SplitError>;
    /// Sets the given fields in place. `Some(None)` clears the description.
    async fn update_group_details(
        &self,
        group_id: &str,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<Group, SplitError>;
    /// Fails with `AlreadyGroupMember` if `user_id` is already in the group.
    async fn add_group_member(&self, group_id: &str, user_id: &str) -> Result<Group, SplitError>;
    /// Fails with `CannotRemoveCreator` or `NotGroupMember`.
    async fn remove_group_member(&self, group_id: &str, user_id: &str) -> Result<Group, SplitError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitError>;
    /// The group only if `user_id` is one of its members.
    async fn get_member_group(&self, group_id: &str, user_id: &str) -> Result<Option<Group>, SplitError>;
    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, SplitError>;

    async fn save_expense(&self, expense: Expense) -> Result<(), SplitError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, SplitError>;
    async fn delete_expense(&self, expense_id: &str) -> Result<Option<Expense>, SplitError>;
    /// Expenses of one group, newest first.
    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, SplitError>;
}

pub mod in_memory;

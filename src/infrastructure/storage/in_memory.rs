use crate::core::errors::SplitError;
use crate::core::models::{Expense, Group, User};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    user_ids_by_email: Arc<RwLock<HashMap<String, String>>>,
    user_ids_by_username: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn claimed_by_other(index: &HashMap<String, String>, key: &str, user_id: &str) -> bool {
    index.get(key).is_some_and(|owner| owner != user_id)
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, SplitError> {
        // Lock order: users, emails, usernames.
        let mut users = self.users.write().await;
        let mut by_email = self.user_ids_by_email.write().await;
        let mut by_username = self.user_ids_by_username.write().await;

        if by_email.contains_key(&user.email) {
            return Err(SplitError::EmailAlreadyRegistered(user.email));
        }
        if let Some(ref username) = user.username {
            if by_username.contains_key(username) {
                return Err(SplitError::UsernameTaken(username.clone()));
            }
            by_username.insert(username.clone(), user.id.clone());
        }
        by_email.insert(user.email.clone(), user.id.clone());
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<User, SplitError> {
        let mut users = self.users.write().await;
        let mut by_email = self.user_ids_by_email.write().await;
        let mut by_username = self.user_ids_by_username.write().await;

        let previous = users
            .get(&user.id)
            .cloned()
            .ok_or_else(|| SplitError::UserNotFound(user.id.clone()))?;

        if claimed_by_other(&by_email, &user.email, &user.id) {
            return Err(SplitError::EmailAlreadyRegistered(user.email));
        }
        if let Some(ref username) = user.username {
            if claimed_by_other(&by_username, username, &user.id) {
                return Err(SplitError::UsernameTaken(username.clone()));
            }
        }

        by_email.remove(&previous.email);
        by_email.insert(user.email.clone(), user.id.clone());
        if let Some(ref old) = previous.username {
            by_username.remove(old);
        }
        if let Some(ref username) = user.username {
            by_username.insert(username.clone(), user.id.clone());
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SplitError> {
        let users = self.users.read().await;
        let by_email = self.user_ids_by_email.read().await;
        Ok(by_email.get(email).and_then(|id| users.get(id).cloned()))
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, SplitError> {
        let users = self.users.read().await;
        Ok(user_ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn save_group(&self, group: Group) -> Result<(), SplitError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn update_group_details(
        &self,
        group_id: &str,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<Group, SplitError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| SplitError::GroupNotFound(group_id.to_string()))?;
        if let Some(name) = name {
            group.name = name;
        }
        if let Some(description) = description {
            group.description = description;
        }
        Ok(group.clone())
    }

    async fn add_group_member(&self, group_id: &str, user_id: &str) -> Result<Group, SplitError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| SplitError::GroupNotFound(group_id.to_string()))?;
        if group.is_member(user_id) {
            return Err(SplitError::AlreadyGroupMember(user_id.to_string()));
        }
        group.members.push(user_id.to_string());
        Ok(group.clone())
    }

    async fn remove_group_member(&self, group_id: &str, user_id: &str) -> Result<Group, SplitError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| SplitError::GroupNotFound(group_id.to_string()))?;
        if group.is_creator(user_id) {
            return Err(SplitError::CannotRemoveCreator);
        }
        if !group.is_member(user_id) {
            return Err(SplitError::NotGroupMember(user_id.to_string()));
        }
        group.members.retain(|m| m != user_id);
        Ok(group.clone())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn get_member_group(&self, group_id: &str, user_id: &str) -> Result<Option<Group>, SplitError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).filter(|g| g.is_member(user_id)).cloned())
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, SplitError> {
        let groups = self.groups.read().await;
        let mut found: Vec<Group> = groups.values().filter(|g| g.is_member(user_id)).cloned().collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), SplitError> {
        let mut expenses = self.expenses.write().await;
        expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, SplitError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(expense_id).cloned())
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<Option<Expense>, SplitError> {
        let mut expenses = self.expenses.write().await;
        Ok(expenses.remove(expense_id))
    }

    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, SplitError> {
        let expenses = self.expenses.read().await;
        let mut found: Vec<Expense> = expenses.values().filter(|e| e.group == group_id).cloned().collect();
        found.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

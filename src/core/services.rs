use crate::auth::jwt::JwtService;
use crate::auth::password::PasswordHasher;
use crate::core::balance::{summarize_group, summarize_user};
use crate::core::constants::{
    AMOUNT_SCALE, EXPENSE_ADDED, EXPENSE_DELETED, EXPENSE_UPDATED, GROUP_CREATED, GROUP_UPDATED,
    MAX_AMOUNT, MAX_CATEGORY_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MEMBER_ADDED, MEMBER_REMOVED,
    MIN_PASSWORD_LENGTH, PROFILE_UPDATED, USER_REGISTERED,
};
use crate::core::errors::SplitError;
use crate::core::models::{
    ActivityEntry, Expense, ExpenseUpdate, ExpenseView, Group, GroupMember, GroupSummary, GroupUpdate, GroupView,
    MemberSummary, NewExpense, NewUser, ProfileUpdate, Role, Split, SplitView, User, UserStats, UserTotals,
};
use crate::core::stats::monthly_stats;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// A user's own record with their monthly statistics spread alongside it.
/// `lastActivity` comes from the stats.
#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub stats: UserStats,
}

pub struct SplitService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    jwt_service: JwtService,
    hasher: PasswordHasher,
}

impl<L: LoggingService, S: Storage> SplitService<L, S> {
    pub fn new(storage: S, logging: L, jwt_service: JwtService, hasher: PasswordHasher) -> Self {
        SplitService {
            storage,
            logging,
            jwt_service,
            hasher,
        }
    }

    // USERS

    #[instrument(skip_all, fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<AuthResponse, SplitError> {
        self.validate_string_input("name", &new_user.name, MAX_NAME_LENGTH)?;
        let email = self.validate_email(&new_user.email)?;
        self.validate_password(&new_user.password)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name.trim().to_string(),
            email,
            password: self.hasher.hash(&new_user.password)?,
            username: non_blank(new_user.username),
            mobile: non_blank(new_user.mobile),
            currency: Default::default(),
            last_activity: now,
            created_at: now,
        };

        let user = self.storage.create_user(user).await?;
        info!(user_id = %user.id, "user registered");

        self.record(
            USER_REGISTERED,
            None,
            json!({ "user_id": user.id, "name": user.name, "email": user.email }),
            Some(&user.id),
        )
        .await?;

        let token = self.jwt_service.generate_token(&user.id)?;
        Ok(AuthResponse { token, user })
    }

    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SplitError> {
        let email = email.trim().to_lowercase();
        let user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or(SplitError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password)? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(SplitError::InvalidCredentials);
        }

        let token = self.jwt_service.generate_token(&user.id)?;
        debug!(user_id = %user.id, "login succeeded");
        Ok(AuthResponse { token, user })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, SplitError> {
        let claims = self.jwt_service.validate_token(token)?;
        self.storage
            .get_user(&claims.sub)
            .await?
            .ok_or_else(|| SplitError::Unauthorized(format!("User {} no longer exists", claims.sub)))
    }

    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn profile(&self, user: &User) -> Result<Profile, SplitError> {
        let groups = self.storage.get_user_groups(&user.id).await?;
        let expenses = try_join_all(groups.iter().map(|g| self.storage.get_group_expenses(&g.id)))
            .await?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let stats = monthly_stats(&user.id, &expenses, groups.len(), user.last_activity, Utc::now());
        let mut user = user.clone();
        user.last_activity = stats.last_activity;
        Ok(Profile { user, stats })
    }

    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn update_profile(&self, user: &User, update: ProfileUpdate) -> Result<Profile, SplitError> {
        if update.is_empty() {
            debug!("empty profile update");
            return self.profile(user).await;
        }
        let mut updated = user.clone();

        if let Some(name) = update.name {
            self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
            updated.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            updated.email = self.validate_email(&email)?;
        }
        if let Some(password) = update.password {
            self.validate_password(&password)?;
            updated.password = self.hasher.hash(&password)?;
        }
        if let Some(username) = update.username {
            updated.username = non_blank(Some(username));
        }
        if let Some(mobile) = update.mobile {
            updated.mobile = non_blank(Some(mobile));
        }
        if let Some(currency) = update.currency {
            updated.currency = currency;
        }
        updated.last_activity = Utc::now();

        let updated = self.storage.update_user(updated).await?;
        self.record(PROFILE_UPDATED, None, json!({ "user_id": updated.id }), Some(&updated.id))
            .await?;

        self.profile(&updated).await
    }

    // GROUPS

    #[instrument(skip_all, fields(user_id = %creator.id))]
    pub async fn create_group(
        &self,
        creator: &User,
        name: String,
        description: Option<String>,
    ) -> Result<GroupView, SplitError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let description = self.validate_optional_text("description", description, MAX_DESCRIPTION_LENGTH)?;

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description,
            members: vec![creator.id.clone()],
            created_by: creator.id.clone(),
            created_at: Utc::now(),
        };
        self.storage.save_group(group.clone()).await?;
        info!(group_id = %group.id, "group created");

        self.record(
            GROUP_CREATED,
            Some(&group.id),
            json!({ "group_id": group.id, "name": group.name }),
            Some(&creator.id),
        )
        .await?;

        self.group_view(&group).await
    }

    pub async fn list_groups(&self, user: &User) -> Result<Vec<GroupView>, SplitError> {
        let groups = self.storage.get_user_groups(&user.id).await?;
        try_join_all(groups.iter().map(|g| self.group_view(g))).await
    }

    pub async fn get_group(&self, group_id: &str, requester: &User) -> Result<GroupView, SplitError> {
        let group = self.member_group(group_id, &requester.id).await?;
        self.group_view(&group).await
    }

    #[instrument(skip_all, fields(group_id = %group_id, user_id = %requester.id))]
    pub async fn update_group(
        &self,
        group_id: &str,
        requester: &User,
        update: GroupUpdate,
    ) -> Result<GroupView, SplitError> {
        let group = self.creator_group(group_id, &requester.id).await?;
        if update.is_empty() {
            debug!("empty group update");
            return self.group_view(&group).await;
        }

        let name = match update.name {
            Some(name) => {
                self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
                Some(name.trim().to_string())
            }
            None => None,
        };
        let description = match update.description {
            Some(description) => Some(self.validate_optional_text(
                "description",
                Some(description),
                MAX_DESCRIPTION_LENGTH,
            )?),
            None => None,
        };
        let group = self.storage.update_group_details(group_id, name, description).await?;

        self.record(
            GROUP_UPDATED,
            Some(group_id),
            json!({ "group_id": group_id, "name": group.name, "description": group.description }),
            Some(&requester.id),
        )
        .await?;

        self.group_view(&group).await
    }

    #[instrument(skip_all, fields(group_id = %group_id, user_id = %requester.id, member_id = %user_id))]
    pub async fn add_member(&self, group_id: &str, requester: &User, user_id: &str) -> Result<GroupView, SplitError> {
        self.member_group(group_id, &requester.id).await?;
        let user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| SplitError::UserNotFound(user_id.to_string()))?;

        let group = self.storage.add_group_member(group_id, &user.id).await?;
        debug!(members = group.members.len(), "member added");

        self.record(
            MEMBER_ADDED,
            Some(group_id),
            json!({ "group_id": group_id, "user_id": user.id, "name": user.name, "email": user.email }),
            Some(&requester.id),
        )
        .await?;

        self.group_view(&group).await
    }

    #[instrument(skip_all, fields(group_id = %group_id, user_id = %requester.id, member_id = %user_id))]
    pub async fn remove_member(
        &self,
        group_id: &str,
        requester: &User,
        user_id: &str,
    ) -> Result<GroupView, SplitError> {
        self.creator_group(group_id, &requester.id).await?;
        let group = self.storage.remove_group_member(group_id, user_id).await?;

        self.record(
            MEMBER_REMOVED,
            Some(group_id),
            json!({ "group_id": group_id, "user_id": user_id }),
            Some(&requester.id),
        )
        .await?;

        self.group_view(&group).await
    }

    pub async fn group_activity(&self, group_id: &str, requester: &User) -> Result<Vec<ActivityEntry>, SplitError> {
        self.member_group(group_id, &requester.id).await?;
        self.logging.get_group_logs(group_id).await
    }

    // EXPENSES

    #[instrument(skip_all, fields(group_id = %group_id, user_id = %payer.id))]
    pub async fn create_expense(
        &self,
        group_id: &str,
        payer: &User,
        new_expense: NewExpense,
    ) -> Result<ExpenseView, SplitError> {
        let group = self.member_group(group_id, &payer.id).await?;

        self.validate_string_input("description", &new_expense.description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_amount_input("amount", new_expense.amount)?;
        let category = self.validate_optional_text("category", new_expense.category, MAX_CATEGORY_LENGTH)?;
        self.validate_split_members(&group, &new_expense.split_between)?;
        self.validate_splits(new_expense.amount, &new_expense.split_between)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group: group.id.clone(),
            description: new_expense.description.trim().to_string(),
            amount: new_expense.amount,
            paid_by: payer.id.clone(),
            split_between: new_expense.split_between,
            date: new_expense.date.unwrap_or_else(Utc::now),
            category,
        };
        self.storage.save_expense(expense.clone()).await?;
        info!(expense_id = %expense.id, amount = %expense.amount, "expense added");

        self.record(
            EXPENSE_ADDED,
            Some(group_id),
            json!({
                "expense_id": expense.id,
                "description": expense.description,
                "amount": expense.amount,
                "paid_by": expense.paid_by
            }),
            Some(&payer.id),
        )
        .await?;

        self.expense_view(&expense).await
    }

    pub async fn list_expenses(&self, group_id: &str, requester: &User) -> Result<Vec<ExpenseView>, SplitError> {
        self.member_group(group_id, &requester.id).await?;
        let expenses = self.storage.get_group_expenses(group_id).await?;
        self.expense_views(&expenses).await
    }

    pub async fn get_expense(&self, expense_id: &str, requester: &User) -> Result<ExpenseView, SplitError> {
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| SplitError::ExpenseNotFound(expense_id.to_string()))?;
        self.member_group(&expense.group, &requester.id).await?;
        self.expense_view(&expense).await
    }

    #[instrument(skip_all, fields(expense_id = %expense_id, user_id = %requester.id))]
    pub async fn update_expense(
        &self,
        expense_id: &str,
        requester: &User,
        update: ExpenseUpdate,
    ) -> Result<ExpenseView, SplitError> {
        let mut expense = self.paid_expense(expense_id, &requester.id).await?;
        if update.is_empty() {
            debug!("empty expense update");
            return self.expense_view(&expense).await;
        }
        let group = self
            .storage
            .get_group(&expense.group)
            .await?
            .ok_or_else(|| SplitError::GroupNotFound(expense.group.clone()))?;

        if let Some(description) = update.description {
            self.validate_string_input("description", &description, MAX_DESCRIPTION_LENGTH)?;
            expense.description = description.trim().to_string();
        }
        if let Some(amount) = update.amount {
            self.validate_amount_input("amount", amount)?;
            expense.amount = amount;
        }
        if let Some(split_between) = update.split_between {
            self.validate_split_members(&group, &split_between)?;
            expense.split_between = split_between;
        }
        if update.category.is_some() {
            expense.category = self.validate_optional_text("category", update.category, MAX_CATEGORY_LENGTH)?;
        }
        self.validate_splits(expense.amount, &expense.split_between)?;

        self.storage.save_expense(expense.clone()).await?;

        self.record(
            EXPENSE_UPDATED,
            Some(&expense.group),
            json!({ "expense_id": expense.id, "description": expense.description, "amount": expense.amount }),
            Some(&requester.id),
        )
        .await?;

        self.expense_view(&expense).await
    }

    #[instrument(skip_all, fields(expense_id = %expense_id, user_id = %requester.id))]
    pub async fn delete_expense(&self, expense_id: &str, requester: &User) -> Result<ExpenseView, SplitError> {
        let expense = self.paid_expense(expense_id, &requester.id).await?;
        self.storage
            .delete_expense(&expense.id)
            .await?
            .ok_or_else(|| SplitError::ExpenseNotFound(expense_id.to_string()))?;

        self.record(
            EXPENSE_DELETED,
            Some(&expense.group),
            json!({ "expense_id": expense.id, "description": expense.description, "amount": expense.amount }),
            Some(&requester.id),
        )
        .await?;

        self.expense_view(&expense).await
    }

    // SUMMARIES

    /// Group total and per-member balances for a group the requester is in.
    #[instrument(skip_all, fields(group_id = %group_id, user_id = %requester.id))]
    pub async fn group_summary(&self, group_id: &str, requester: &User) -> Result<GroupSummary, SplitError> {
        let group = self.member_group(group_id, &requester.id).await?;
        let expenses = self.storage.get_group_expenses(&group.id).await?;
        let summary = summarize_group(&group, &expenses);
        debug!(expenses = expenses.len(), total = %summary.group_total, "group summarized");
        Ok(summary)
    }

    /// Owed / owe totals across every group the user belongs to. A failure
    /// fetching any one group aborts the whole computation.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn user_totals(&self, user: &User) -> Result<UserTotals, SplitError> {
        let groups = self.storage.get_user_groups(&user.id).await?;
        let summaries = try_join_all(groups.iter().map(|group| async move {
            let expenses = self.storage.get_group_expenses(&group.id).await?;
            Ok::<_, SplitError>(summarize_group(group, &expenses))
        }))
        .await?;

        let totals = summarize_user(&user.id, &summaries);
        debug!(groups = summaries.len(), net = %totals.net_balance, "user totals computed");
        Ok(totals)
    }

    // LOOKUPS

    async fn member_group(&self, group_id: &str, user_id: &str) -> Result<Group, SplitError> {
        self.storage
            .get_member_group(group_id, user_id)
            .await?
            .ok_or_else(|| SplitError::GroupNotFound(group_id.to_string()))
    }

    async fn creator_group(&self, group_id: &str, user_id: &str) -> Result<Group, SplitError> {
        self.storage
            .get_group(group_id)
            .await?
            .filter(|g| g.is_creator(user_id))
            .ok_or_else(|| SplitError::GroupNotFound(group_id.to_string()))
    }

    async fn paid_expense(&self, expense_id: &str, user_id: &str) -> Result<Expense, SplitError> {
        self.storage
            .get_expense(expense_id)
            .await?
            .filter(|e| e.paid_by == user_id)
            .ok_or_else(|| SplitError::ExpenseNotFound(expense_id.to_string()))
    }

    async fn member_summaries(&self, ids: Vec<String>) -> Result<HashMap<String, MemberSummary>, SplitError> {
        let users = self.storage.get_users(&ids).await?;
        Ok(users.into_iter().map(|u| (u.id.clone(), u.summary())).collect())
    }

    async fn group_view(&self, group: &Group) -> Result<GroupView, SplitError> {
        let mut ids = group.members.clone();
        ids.push(group.created_by.clone());
        let summaries = self.member_summaries(ids).await?;
        let lookup = |id: &str| summaries.get(id).cloned().unwrap_or_else(|| MemberSummary::unknown(id));

        Ok(GroupView {
            id: group.id.clone(),
            name: group.name.clone(),
            description: group.description.clone(),
            members: group
                .members
                .iter()
                .map(|id| GroupMember {
                    user: lookup(id),
                    role: group.role_of(id).unwrap_or(Role::Member),
                })
                .collect(),
            created_by: lookup(&group.created_by),
            created_at: group.created_at,
        })
    }

    async fn expense_view(&self, expense: &Expense) -> Result<ExpenseView, SplitError> {
        let mut views = self.expense_views(std::slice::from_ref(expense)).await?;
        views
            .pop()
            .ok_or_else(|| SplitError::InternalServerError("expense view missing".to_string()))
    }

    async fn expense_views(&self, expenses: &[Expense]) -> Result<Vec<ExpenseView>, SplitError> {
        let ids: HashSet<String> = expenses
            .iter()
            .flat_map(|e| std::iter::once(e.paid_by.clone()).chain(e.split_between.iter().map(|s| s.user.clone())))
            .collect();
        let summaries = self.member_summaries(ids.into_iter().collect()).await?;
        let lookup = |id: &str| summaries.get(id).cloned().unwrap_or_else(|| MemberSummary::unknown(id));

        Ok(expenses
            .iter()
            .map(|e| ExpenseView {
                id: e.id.clone(),
                group: e.group.clone(),
                description: e.description.clone(),
                amount: e.amount,
                paid_by: lookup(&e.paid_by),
                split_between: e
                    .split_between
                    .iter()
                    .map(|s| SplitView {
                        user: lookup(&s.user),
                        share: s.share,
                    })
                    .collect(),
                date: e.date,
                category: e.category.clone(),
            })
            .collect())
    }

    async fn record(
        &self,
        action: &str,
        group_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitError> {
        self.logging.log_action(action, group_id, details, user_id).await
    }

    // VALIDATION

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), SplitError> {
        if value.trim().is_empty() {
            return Err(SplitError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(SplitError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(SplitError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    /// Blank optional text is stored as `None`.
    fn validate_optional_text(
        &self,
        field: &str,
        value: Option<String>,
        max_length: usize,
    ) -> Result<Option<String>, SplitError> {
        match non_blank(value) {
            Some(text) => {
                self.validate_string_input(field, &text, max_length)?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn validate_email(&self, email: &str) -> Result<String, SplitError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(SplitError::MissingEmail);
        }
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            }
            None => false,
        };
        if !well_formed || email.chars().any(char::is_whitespace) {
            return Err(SplitError::InvalidEmail(email));
        }
        Ok(email)
    }

    fn validate_password(&self, password: &str) -> Result<(), SplitError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SplitError::invalid_input(
                "password",
                "Invalid password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<(), SplitError> {
        if amount < Decimal::ZERO {
            return Err(SplitError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot be negative",
            ));
        }
        if amount > Decimal::from(MAX_AMOUNT) {
            return Err(SplitError::invalid_input(
                field,
                "Amount Too Large",
                format!("Amount cannot exceed {}", MAX_AMOUNT),
            ));
        }
        if amount.normalize().scale() > AMOUNT_SCALE {
            return Err(SplitError::invalid_input(
                field,
                "Invalid Amount",
                format!("Amount cannot have more than {} decimal places", AMOUNT_SCALE),
            ));
        }
        Ok(())
    }

    /// Every split user must currently belong to the group, at most once.
    fn validate_split_members(&self, group: &Group, splits: &[Split]) -> Result<(), SplitError> {
        let mut seen = HashSet::new();
        for split in splits {
            if !group.is_member(&split.user) {
                warn!(user_id = %split.user, group_id = %group.id, "split user not in group");
                return Err(SplitError::InvalidSplitUser(split.user.clone()));
            }
            if !seen.insert(split.user.as_str()) {
                return Err(SplitError::invalid_input(
                    "splitBetween",
                    "Duplicate split user",
                    format!("User {} appears more than once", split.user),
                ));
            }
        }
        Ok(())
    }

    /// Shares must be valid amounts and add up exactly to the expense amount.
    fn validate_splits(&self, amount: Decimal, splits: &[Split]) -> Result<(), SplitError> {
        for split in splits {
            self.validate_amount_input("share", split.share)?;
        }
        let share_sum: Decimal = splits.iter().map(|s| s.share).sum();
        if share_sum != amount {
            warn!(%share_sum, %amount, "split shares do not add up to amount");
            return Err(SplitError::InvalidSplit);
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

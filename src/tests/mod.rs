mod group_tests;

use crate::auth::jwt::JwtService;
use crate::auth::password::PasswordHasher;
use crate::core::models::{GroupView, NewExpense, NewUser, Split, User};
use crate::core::services::SplitService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use rust_decimal::Decimal;

pub type TestService = SplitService<InMemoryLogging, InMemoryStorage>;

pub fn create_test_service() -> TestService {
    create_test_service_with_logging().0
}

/// Service plus a handle on its activity log, for asserting on entries that
/// are not tied to a group.
pub fn create_test_service_with_logging() -> (TestService, InMemoryLogging) {
    let logging = InMemoryLogging::new();
    (service_over(InMemoryStorage::new(), logging.clone()), logging)
}

pub fn service_over<S: Storage>(storage: S, logging: InMemoryLogging) -> SplitService<InMemoryLogging, S> {
    let jwt_service = JwtService::new("test-secret", chrono::Duration::hours(1));
    SplitService::new(storage, logging, jwt_service, PasswordHasher::new(4))
}

pub fn amount(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "secret123".to_string(),
        username: None,
        mobile: None,
    }
}

pub async fn register<S: Storage>(service: &SplitService<InMemoryLogging, S>, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    service.register(new_user(name, &email)).await.unwrap().user
}

/// Group created by `creator` with every user in `others` added.
pub async fn group_with<S: Storage>(
    service: &SplitService<InMemoryLogging, S>,
    creator: &User,
    others: &[&User],
) -> GroupView {
    let mut group = service
        .create_group(creator, "Trip".to_string(), None)
        .await
        .unwrap();
    for other in others {
        group = service.add_member(&group.id, creator, &other.id).await.unwrap();
    }
    group
}

pub fn expense_of(total: &str, shares: &[(&User, &str)]) -> NewExpense {
    NewExpense {
        description: "Dinner".to_string(),
        amount: amount(total),
        split_between: shares
            .iter()
            .map(|(user, share)| Split::new(user.id.clone(), amount(share)))
            .collect(),
        date: None,
        category: None,
    }
}

use crate::{
    api::models::*,
    core::{
        errors::SplitError,
        models::{
            ActivityEntry, ExpenseUpdate, ExpenseView, GroupSummary, GroupUpdate, GroupView, NewExpense, NewUser,
            ProfileUpdate, UserTotals,
        },
        services::{AuthResponse, Profile, SplitService},
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use http::header;
use std::sync::Arc;

pub type AppService = Arc<SplitService<InMemoryLogging, InMemoryStorage>>;

// Middleware to resolve the bearer token into the calling user
async fn auth_middleware(
    State(service): State<AppService>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| SplitError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| SplitError::Unauthorized("Invalid Authorization header".to_string()))?;

    let user = service.authenticate(token).await?;
    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

/// Update bodies are typed structs that reject unknown keys; any body that
/// fails to parse is reported as an invalid update.
fn update_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(update)| update).map_err(|rejection| {
        tracing::debug!(%rejection, "rejected update body");
        ApiError(SplitError::InvalidUpdates)
    })
}

// Define API routes
pub fn api_routes(service: AppService) -> Router {
    let protected_routes = Router::new()
        .route("/users/profile", get(get_profile).patch(update_profile))
        .route("/users/totals", get(get_user_totals))
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/{group_id}", get(get_group).patch(update_group))
        .route("/groups/{group_id}/members", post(add_member))
        .route(
            "/groups/{group_id}/members/{user_id}",
            axum::routing::delete(remove_member),
        )
        .route("/groups/{group_id}/activity", get(get_group_activity))
        .route("/groups/{group_id}/expenses", post(create_expense).get(list_expenses))
        .route("/groups/{group_id}/summary", get(get_group_summary))
        .route(
            "/expenses/{expense_id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/users/register", post(register)) // Unprotected
        .route("/users/login", post(login)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = NewUser,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email or username already taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(service): State<AppService>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(service): State<AppService>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = service.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile with monthly statistics", body = Profile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_profile(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(service.profile(&user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/users/profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 400, description = "Invalid updates", body = ErrorResponse),
        (status = 409, description = "Email or username already taken", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_profile(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
    let update = update_body(body)?;
    Ok(Json(service.update_profile(&user, update).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/totals",
    responses(
        (status = 200, description = "Owed / owe totals across the caller's groups", body = UserTotals),
        (status = 500, description = "A group could not be summarized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_user_totals(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<UserTotals>, ApiError> {
    Ok(Json(service.user_totals(&user).await?))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupView),
        (status = 400, description = "Bad request", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_group(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupView>), ApiError> {
    let group = service.create_group(&user, req.name, req.description).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Groups the caller belongs to", body = Vec<GroupView>)
    ),
    security(("Bearer" = []))
)]
pub async fn list_groups(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<GroupView>>, ApiError> {
    Ok(Json(service.list_groups(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group details", body = GroupView),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ApiError> {
    Ok(Json(service.get_group(&group_id, &user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = GroupUpdate,
    responses(
        (status = 200, description = "Group updated", body = GroupView),
        (status = 400, description = "Invalid updates", body = ErrorResponse),
        (status = 404, description = "Group not found or caller is not its creator", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_group(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
    body: Result<Json<GroupUpdate>, JsonRejection>,
) -> Result<Json<GroupView>, ApiError> {
    let update = update_body(body)?;
    Ok(Json(service.update_group(&group_id, &user, update).await?))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added", body = GroupView),
        (status = 400, description = "Already a member", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn add_member(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<GroupView>, ApiError> {
    Ok(Json(service.add_member(&group_id, &user, &req.user_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/members/{user_id}",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("user_id" = String, Path, description = "Member to remove")
    ),
    responses(
        (status = 200, description = "Member removed", body = GroupView),
        (status = 400, description = "Cannot remove group creator", body = ErrorResponse),
        (status = 404, description = "Group not found or caller is not its creator", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn remove_member(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<Json<GroupView>, ApiError> {
    Ok(Json(service.remove_member(&group_id, &user, &user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/activity",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group activity, newest first", body = Vec<ActivityEntry>),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group_activity(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    Ok(Json(service.group_activity(&group_id, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/expenses",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = NewExpense,
    responses(
        (status = 201, description = "Expense created", body = ExpenseView),
        (status = 400, description = "Invalid expense or split", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_expense(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
    Json(req): Json<NewExpense>,
) -> Result<(StatusCode, Json<ExpenseView>), ApiError> {
    let expense = service.create_expense(&group_id, &user, req).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/expenses",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group expenses, newest first", body = Vec<ExpenseView>),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_expenses(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<ExpenseView>>, ApiError> {
    Ok(Json(service.list_expenses(&group_id, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/summary",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group total and member balances", body = GroupSummary),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group_summary(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupSummary>, ApiError> {
    Ok(Json(service.group_summary(&group_id, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense details", body = ExpenseView),
        (status = 404, description = "Expense or group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_expense(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(expense_id): Path<String>,
) -> Result<Json<ExpenseView>, ApiError> {
    Ok(Json(service.get_expense(&expense_id, &user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "Expense ID")),
    request_body = ExpenseUpdate,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseView),
        (status = 400, description = "Invalid updates", body = ErrorResponse),
        (status = 404, description = "Expense not found or caller is not the payer", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_expense(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(expense_id): Path<String>,
    body: Result<Json<ExpenseUpdate>, JsonRejection>,
) -> Result<Json<ExpenseView>, ApiError> {
    let update = update_body(body)?;
    Ok(Json(service.update_expense(&expense_id, &user, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense deleted", body = ExpenseView),
        (status = 404, description = "Expense not found or caller is not the payer", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_expense(
    State(service): State<AppService>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(expense_id): Path<String>,
) -> Result<Json<ExpenseView>, ApiError> {
    Ok(Json(service.delete_expense(&expense_id, &user).await?))
}

use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

use crate::{
    api::models::{AddMemberRequest, CreateGroupRequest, ErrorResponse, LoginRequest},
    core::{
        models::{
            ActivityEntry, Currency, ExpenseUpdate, ExpenseView, GroupMember, GroupSummary, GroupUpdate, GroupView,
            MemberSummary, NewExpense, NewUser, ProfileUpdate, Role, Split, SplitView, User, UserStats, UserTotals,
        },
        services::{AuthResponse, Profile},
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("Bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::register,
        super::handlers::login,
        super::handlers::get_profile,
        super::handlers::update_profile,
        super::handlers::get_user_totals,
        super::handlers::create_group,
        super::handlers::list_groups,
        super::handlers::get_group,
        super::handlers::update_group,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::get_group_activity,
        super::handlers::create_expense,
        super::handlers::list_expenses,
        super::handlers::get_group_summary,
        super::handlers::get_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense
    ),
    components(schemas(
        NewUser,
        LoginRequest,
        AuthResponse,
        ProfileUpdate,
        Profile,
        UserStats,
        UserTotals,
        User,
        Currency,
        MemberSummary,
        CreateGroupRequest,
        GroupUpdate,
        AddMemberRequest,
        GroupView,
        GroupMember,
        Role,
        NewExpense,
        ExpenseUpdate,
        ExpenseView,
        Split,
        SplitView,
        GroupSummary,
        ActivityEntry,
        ErrorResponse
    )),
    modifiers(&BearerAuth),
    info(
        title = "Tabsplit API",
        description = "API for splitting shared expenses within groups",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

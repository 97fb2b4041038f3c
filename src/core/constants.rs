// Activity actions
pub const USER_REGISTERED: &str = "USER_REGISTERED";
pub const PROFILE_UPDATED: &str = "PROFILE_UPDATED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_UPDATED: &str = "GROUP_UPDATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";

// Input limits
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_CATEGORY_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_AMOUNT: i64 = 1_000_000;
pub const AMOUNT_SCALE: u32 = 2;

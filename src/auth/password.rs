use crate::core::errors::SplitError;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// bcrypt hashing with a configurable work factor.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        PasswordHasher {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, SplitError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| SplitError::InternalServerError(format!("Password hashing error: {}", e)))
    }

    pub fn verify(&self, password: &str, hashed: &str) -> Result<bool, SplitError> {
        bcrypt::verify(password, hashed)
            .map_err(|e| SplitError::InternalServerError(format!("Password verification error: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        PasswordHasher::new(bcrypt::DEFAULT_COST)
    }
}

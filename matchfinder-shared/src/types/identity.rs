use serde::{Deserialize, Serialize};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const FIRST_NAME_HEADER: &str = "x-first-name";
pub const LAST_NAME_HEADER: &str = "x-last-name";
pub const ALT_FIRST_NAME_HEADER: &str = "x-user-first-name";
pub const ALT_LAST_NAME_HEADER: &str = "x-user-last-name";

/// The caller as asserted by trusted upstream headers.
///
/// No signature or token backs these values; whoever sits in front of the
/// service is responsible for setting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl CallerIdentity {
    pub fn new(
        user_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

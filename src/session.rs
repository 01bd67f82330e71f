//! Identity lookup behind a small async port.

use async_trait::async_trait;

/// Identity port: who, if anyone, owns the calendar right now.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in owner id, or `None` when signed out.
    async fn current_user(&self) -> Option<String>;
}

/// Fixed identity, used by the CLI and in tests.
pub struct StaticSession {
    user_id: Option<String>,
}

impl StaticSession {
    pub fn signed_in(user_id: &str) -> Self {
        StaticSession {
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn signed_out() -> Self {
        StaticSession { user_id: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user(&self) -> Option<String> {
        self.user_id.clone()
    }
}

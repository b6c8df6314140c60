use std::env;

/// Name shown when no user can be resolved
pub const DEFAULT_USER: &str = "User";

/// Resolves the name of the person whose screen is being recorded
pub trait IdentityResolver: Send + Sync {
    fn current_user(&self) -> String;
}

/// Configured name, else `USER`, else `USERNAME`, else [`DEFAULT_USER`]
#[derive(Debug, Clone, Default)]
pub struct EnvIdentity {
    configured: Option<String>,
}

impl EnvIdentity {
    pub fn new(configured: Option<String>) -> Self {
        Self { configured }
    }

    fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        self.configured
            .iter()
            .cloned()
            .chain(lookup("USER"))
            .chain(lookup("USERNAME"))
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string())
    }
}

impl IdentityResolver for EnvIdentity {
    fn current_user(&self) -> String {
        self.resolve_with(|key| env::var(key).ok())
    }
}

//! User sessions: login, registration and persistence of the signed-in
//! account across restarts.
//!
//! Storage sits behind [`SessionStore`] so the HTTP layer and tests can pick
//! between an in-memory store and a JSON file on disk.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AgriMandiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Broker,
}

impl UserRole {
    /// Default home location shown before the user sets one.
    #[must_use]
    pub fn default_location(self) -> &'static str {
        match self {
            UserRole::Farmer => "Punjab, India",
            UserRole::Broker => "Mumbai, India",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub location: String,
}

/// Where the signed-in account is persisted.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<UserAccount>>;
    fn save(&self, account: &UserAccount) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Volatile store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    account: Mutex<Option<UserAccount>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<UserAccount>> {
        Ok(self
            .account
            .lock()
            .map_err(|_| AgriMandiError::general("Session store lock poisoned"))?
            .clone())
    }

    fn save(&self, account: &UserAccount) -> Result<()> {
        *self
            .account
            .lock()
            .map_err(|_| AgriMandiError::general("Session store lock poisoned"))? =
            Some(account.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .account
            .lock()
            .map_err(|_| AgriMandiError::general("Session store lock poisoned"))? = None;
        Ok(())
    }
}

/// JSON file store, one account per file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<UserAccount>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        let account = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse stored session")?;
        Ok(Some(account))
    }

    fn save(&self, account: &UserAccount) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }
        let contents = serde_json::to_string_pretty(account)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove session file: {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

/// The signed-in account plus its backing store.
pub struct SessionContext {
    store: Box<dyn SessionStore>,
    current: Option<UserAccount>,
}

impl SessionContext {
    /// Restore any persisted session from the store.
    pub fn initialize(store: Box<dyn SessionStore>) -> Result<Self> {
        let current = store.load()?;
        if let Some(account) = &current {
            info!(user = %account.id, "Restored persisted session");
        }
        Ok(Self { store, current })
    }

    /// Sign in with email and password. The account profile is derived from
    /// the email and role.
    pub fn login(&mut self, email: &str, password: &str, role: UserRole) -> Result<UserAccount> {
        if !email.contains('@') {
            return Err(AgriMandiError::validation("Please enter a valid email address").into());
        }
        validate_password(password)?;

        let name = email
            .split('@')
            .next()
            .unwrap_or(email)
            .replace(['.', '_'], " ");
        let account = UserAccount {
            id: generate_account_id(),
            name,
            email: email.to_string(),
            phone: String::new(),
            role,
            location: role.default_location().to_string(),
        };
        self.store.save(&account)?;
        info!(user = %account.id, role = ?role, "User signed in");
        self.current = Some(account.clone());
        Ok(account)
    }

    /// Create an account with an explicit profile.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
        role: UserRole,
    ) -> Result<UserAccount> {
        if name.trim().is_empty() {
            return Err(AgriMandiError::validation("Name cannot be empty").into());
        }
        if !email.contains('@') {
            return Err(AgriMandiError::validation("Please enter a valid email address").into());
        }
        validate_password(password)?;

        let account = UserAccount {
            id: generate_account_id(),
            name: name.trim().to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            role,
            location: role.default_location().to_string(),
        };
        self.store.save(&account)?;
        info!(user = %account.id, role = ?role, "User registered");
        self.current = Some(account.clone());
        Ok(account)
    }

    /// Sign out and drop the persisted session.
    pub fn logout(&mut self) -> Result<()> {
        if let Some(account) = self.current.take() {
            info!(user = %account.id, "User signed out");
        }
        self.store.clear()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&UserAccount> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.current.as_ref().map(|a| a.role)
    }
}

/// Passwords need at least 8 characters with an uppercase letter, a
/// lowercase letter and a digit.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(
            AgriMandiError::validation("Password must be at least 8 characters long").into(),
        );
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AgriMandiError::validation(
            "Password must contain an uppercase letter",
        )
        .into());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AgriMandiError::validation(
            "Password must contain a lowercase letter",
        )
        .into());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AgriMandiError::validation("Password must contain a digit").into());
    }
    Ok(())
}

fn generate_account_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("user-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SessionContext {
        SessionContext::initialize(Box::new(MemorySessionStore::default())).unwrap()
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Abcdef12").is_ok());
        assert!(validate_password("short1A").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }

    #[test]
    fn test_login_builds_profile_from_email() {
        let mut session = context();
        let account = session
            .login("ravi.kumar@example.com", "Secret123", UserRole::Farmer)
            .unwrap();
        assert_eq!(account.name, "ravi kumar");
        assert_eq!(account.location, "Punjab, India");
        assert!(account.id.starts_with("user-"));
        assert_eq!(account.id.len(), "user-".len() + 9);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_broker_default_location() {
        let mut session = context();
        let account = session
            .login("broker@example.com", "Secret123", UserRole::Broker)
            .unwrap();
        assert_eq!(account.location, "Mumbai, India");
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut session = context();
        assert!(
            session
                .login("not-an-email", "Secret123", UserRole::Farmer)
                .is_err()
        );
    }

    #[test]
    fn test_logout_clears_store() {
        let mut session = context();
        session
            .login("farmer@example.com", "Secret123", UserRole::Farmer)
            .unwrap();
        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.role().is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "agrimandi-session-test-{}-{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let store = FileSessionStore::new(path.clone());

        let account = UserAccount {
            id: "user-abc123def".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            phone: String::new(),
            role: UserRole::Farmer,
            location: "Punjab, India".to_string(),
        };
        store.save(&account).unwrap();
        assert_eq!(store.load().unwrap(), Some(account));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_session_restored_from_store() {
        let store = MemorySessionStore::default();
        let account = UserAccount {
            id: "user-xyz987abc".to_string(),
            name: "Persisted".to_string(),
            email: "persist@example.com".to_string(),
            phone: String::new(),
            role: UserRole::Broker,
            location: "Mumbai, India".to_string(),
        };
        store.save(&account).unwrap();

        let session = SessionContext::initialize(Box::new(store)).unwrap();
        assert_eq!(session.current_user(), Some(&account));
        assert_eq!(session.role(), Some(UserRole::Broker));
    }
}

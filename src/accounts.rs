//! Account registration, login and password reset.
//!
//! Login issues a signed bearer token carrying `{id, role}`; that token is the
//! only thing the appointment API consults to identify the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, PasswordHasher, TokenSigner};
use crate::db::{AccountStore, DatabaseError};
use crate::models::{Actor, NewAccount, Role};

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub surname: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub username: String,
    pub email: String,
    pub new_password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Invalid username")]
    UnknownUsername,
    #[error("Invalid password")]
    WrongPassword,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid email")]
    EmailMismatch,
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Storage failure: {0}")]
    Storage(#[from] DatabaseError),
}

// ─── Service ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    signer: Arc<TokenSigner>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, hasher: PasswordHasher, signer: Arc<TokenSigner>) -> Self {
        Self {
            store,
            hasher,
            signer,
        }
    }

    /// Create an account. Surname is kept only for patients and address
    /// only for staff.
    pub fn register(&self, req: RegisterRequest) -> Result<String, AccountError> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(AccountError::Validation("username is required".into()));
        }
        if req.password.is_empty() {
            return Err(AccountError::Validation("password is required".into()));
        }
        if self.store.find_by_username(&username)?.is_some() {
            tracing::info!(%username, "registration rejected: username taken");
            return Err(AccountError::UsernameTaken);
        }

        let new = NewAccount {
            role: req.role,
            name: req.name,
            surname: req.surname.filter(|_| req.role == Role::Patient),
            email: req.email,
            phone_number: req.phone_number,
            address: req.address.filter(|_| req.role == Role::Staff),
            username: username.clone(),
            password_hash: self.hasher.hash(&req.password),
        };

        let id = match self.store.create_account(new) {
            Ok(id) => id,
            // Lost a race with a concurrent registration of the same name.
            Err(DatabaseError::ConstraintViolation(_)) => return Err(AccountError::UsernameTaken),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(%username, user_id = %id, role = %req.role, "account registered");
        Ok(id)
    }

    pub fn login(&self, req: &LoginRequest, now: DateTime<Utc>) -> Result<Session, AccountError> {
        let account = self
            .store
            .find_by_username(req.username.trim())?
            .ok_or(AccountError::UnknownUsername)?;

        if !self.hasher.verify(&req.password, &account.password_hash)? {
            tracing::info!(username = %account.username, "login rejected: wrong password");
            return Err(AccountError::WrongPassword);
        }

        let actor = Actor {
            id: account.id.clone(),
            role: account.role,
        };
        let token = self.signer.issue(&actor, now)?;

        tracing::info!(user_id = %account.id, role = %account.role, "login succeeded");
        Ok(Session {
            token,
            user_id: account.id,
            role: account.role,
            expires_at: now + self.signer.ttl(),
        })
    }

    /// Replace the password when username and email match.
    pub fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), AccountError> {
        let account = self
            .store
            .find_by_username(req.username.trim())?
            .ok_or(AccountError::UserNotFound)?;

        if account.email != req.email {
            return Err(AccountError::EmailMismatch);
        }
        if req.new_password.is_empty() {
            return Err(AccountError::Validation("newPassword is required".into()));
        }

        self.store
            .update_password(&account.id, &self.hasher.hash(&req.new_password))?;
        tracing::info!(user_id = %account.id, "password reset");
        Ok(())
    }

    /// Resolve a bearer token into the actor it was issued for.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<Actor, CryptoError> {
        self.signer.verify(token, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};
    use chrono::Duration;

    fn service_with(store: Arc<dyn AccountStore>) -> AccountService {
        let signer = TokenSigner::new(&[42u8; 32], Duration::hours(1)).unwrap();
        AccountService::new(store, PasswordHasher::new(1_000), Arc::new(signer))
    }

    fn service() -> AccountService {
        service_with(Arc::new(MemoryStore::new()))
    }

    fn register_req(username: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            role,
            name: "Lerato".into(),
            surname: Some("Molefe".into()),
            email: "lerato@example.com".into(),
            phone_number: "0719876543".into(),
            address: Some("12 Long St".into()),
            username: username.into(),
            password: "correct horse".into(),
        }
    }

    #[test]
    fn test_register_then_login() {
        let svc = service();
        let id = svc.register(register_req("lerato", Role::Patient)).unwrap();

        let now = Utc::now();
        let session = svc
            .login(
                &LoginRequest {
                    username: "lerato".into(),
                    password: "correct horse".into(),
                },
                now,
            )
            .unwrap();
        assert_eq!(session.user_id, id);
        assert_eq!(session.role, Role::Patient);

        let actor = svc.authenticate(&session.token, now).unwrap();
        assert_eq!(actor, Actor::patient(id));
    }

    #[test]
    fn test_duplicate_username() {
        let svc = service();
        svc.register(register_req("lerato", Role::Patient)).unwrap();
        let err = svc.register(register_req("lerato", Role::Staff)).unwrap_err();
        assert!(matches!(err, AccountError::UsernameTaken));
    }

    #[test]
    fn test_duplicate_username_on_sqlite() {
        let svc = service_with(Arc::new(SqliteStore::open_in_memory().unwrap()));
        svc.register(register_req("lerato", Role::Patient)).unwrap();
        let err = svc.register(register_req("lerato", Role::Patient)).unwrap_err();
        assert!(matches!(err, AccountError::UsernameTaken));
    }

    #[test]
    fn test_role_specific_fields() {
        let store = Arc::new(MemoryStore::new());
        let svc = service_with(store.clone());
        svc.register(register_req("pat", Role::Patient)).unwrap();
        svc.register(register_req("doc", Role::Staff)).unwrap();

        let pat = store.find_by_username("pat").unwrap().unwrap();
        assert!(pat.surname.is_some());
        assert!(pat.address.is_none());
        let doc = store.find_by_username("doc").unwrap().unwrap();
        assert!(doc.surname.is_none());
        assert!(doc.address.is_some());
        assert_ne!(doc.password_hash, "correct horse");
    }

    #[test]
    fn test_login_failures() {
        let svc = service();
        svc.register(register_req("lerato", Role::Patient)).unwrap();

        let err = svc
            .login(
                &LoginRequest {
                    username: "nobody".into(),
                    password: "x".into(),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, AccountError::UnknownUsername));

        let err = svc
            .login(
                &LoginRequest {
                    username: "lerato".into(),
                    password: "wrong".into(),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, AccountError::WrongPassword));
    }

    #[test]
    fn test_reset_password() {
        let svc = service();
        svc.register(register_req("lerato", Role::Patient)).unwrap();

        let err = svc
            .reset_password(&ResetPasswordRequest {
                username: "lerato".into(),
                email: "someone@else.com".into(),
                new_password: "new pass".into(),
            })
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailMismatch));

        svc.reset_password(&ResetPasswordRequest {
            username: "lerato".into(),
            email: "lerato@example.com".into(),
            new_password: "new pass".into(),
        })
        .unwrap();

        let login = |password: &str| {
            svc.login(
                &LoginRequest {
                    username: "lerato".into(),
                    password: password.into(),
                },
                Utc::now(),
            )
        };
        assert!(login("new pass").is_ok());
        assert!(matches!(login("correct horse"), Err(AccountError::WrongPassword)));
    }

    #[test]
    fn test_reset_unknown_user() {
        let err = service()
            .reset_password(&ResetPasswordRequest {
                username: "ghost".into(),
                email: "g@example.com".into(),
                new_password: "x".into(),
            })
            .unwrap_err();
        assert!(matches!(err, AccountError::UserNotFound));
    }
}

// ============================
// luxe-backend-lib/src/auth/service.rs
// ============================
//! Registration, login and session resolution.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use luxe_common::{LoginRequest, PublicUser, RegisterRequest, UserRole};
use metrics::counter;

use super::federation::ExternalIdentity;
use super::password::PasswordHasher;
use super::token::TokenIssuer;
use crate::config::{BootstrapAdmin, Settings};
use crate::error::AppError;
use crate::metrics::{
    AUTH_FEDERATED_LOGIN, AUTH_LOGIN_FAILURE, AUTH_LOGIN_SUCCESS, AUTH_REGISTER,
};
use crate::store::{normalize_email, NewUser, StoreError, UserRecord, UserStore};
use crate::validation::{meets_minimum_length, validate_login, validate_registration};

/// An authenticated user together with a freshly issued session token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

/// Which login entry point is being used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginGate {
    Any,
    AdminOnly,
}

/// The auth core. Holds no mutable state of its own; the store is the
/// only shared resource.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    store_timeout: Duration,
    min_password_length: usize,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            store,
            hasher: PasswordHasher::new(settings.password_hash_log_n)?,
            tokens: TokenIssuer::new(settings.jwt_secret.expose().as_bytes(), settings.session_ttl()),
            store_timeout: settings.store_timeout(),
            min_password_length: settings.min_password_length,
        })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Run a store call under the configured timeout
    async fn with_store<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::error!(op, timeout_ms = self.store_timeout.as_millis() as u64, "user store timed out");
                Err(AppError::StoreTimeout(op))
            },
        }
    }

    /// Create a `user` account and sign it in.
    ///
    /// Checks run in order: required fields, duplicate email, password
    /// length. A concurrent registration that loses the insert race also
    /// gets `DuplicateUser`.
    pub async fn register(&self, req: RegisterRequest) -> Result<Session, AppError> {
        let registration = validate_registration(req)?;

        if self
            .with_store("find_by_email", self.store.find_by_email(&registration.email))
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateUser);
        }
        if !meets_minimum_length(&registration.password, self.min_password_length) {
            return Err(AppError::WeakPassword(self.min_password_length));
        }

        let password_hash = self.hasher.hash_owned(registration.password).await?;
        let record = self
            .with_store(
                "insert",
                self.store.insert(NewUser {
                    name: registration.name,
                    email: registration.email,
                    password_hash: Some(password_hash),
                    role: UserRole::User,
                    google_id: None,
                }),
            )
            .await?;

        counter!(AUTH_REGISTER).increment(1);
        tracing::info!(user_id = %record.id, "user registered");
        self.start_session(record)
    }

    /// Password login for any role
    pub async fn login(&self, req: LoginRequest) -> Result<Session, AppError> {
        self.authenticate(req, LoginGate::Any).await
    }

    /// Password login that only admits `admin` accounts
    pub async fn login_admin(&self, req: LoginRequest) -> Result<Session, AppError> {
        self.authenticate(req, LoginGate::AdminOnly).await
    }

    async fn authenticate(&self, req: LoginRequest, gate: LoginGate) -> Result<Session, AppError> {
        let credentials = validate_login(req)?;
        let user = self
            .with_store("find_by_email", self.store.find_by_email(&credentials.email))
            .await?;

        // the hash comparison runs even for unknown emails
        let stored_hash = user.as_ref().and_then(|u| u.password_hash.clone());
        let password_ok = self
            .hasher
            .verify_owned(credentials.password, stored_hash)
            .await?;

        match user {
            Some(user) if password_ok && (gate == LoginGate::Any || user.role.is_admin()) => {
                counter!(AUTH_LOGIN_SUCCESS).increment(1);
                tracing::info!(user_id = %user.id, admin_gate = gate == LoginGate::AdminOnly, "login succeeded");
                self.start_session(user)
            },
            _ => {
                counter!(AUTH_LOGIN_FAILURE).increment(1);
                tracing::debug!(admin_gate = gate == LoginGate::AdminOnly, "login rejected");
                Err(AppError::InvalidCredentials)
            },
        }
    }

    /// Identity behind a session token. A bad, expired or orphaned token is
    /// `Unauthenticated`; only store failures are server errors.
    pub async fn resolve(&self, token: &str) -> Result<PublicUser, AppError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            AppError::Unauthenticated
        })?;

        self.with_store("find_by_id", self.store.find_by_id(claims.sub))
            .await?
            .map(UserRecord::into_public)
            .ok_or_else(|| {
                tracing::debug!(user_id = %claims.sub, "session token for missing user");
                AppError::Unauthenticated
            })
    }

    /// Map a verified external identity onto a local account, creating one
    /// with an unusable password on first sight.
    pub async fn sign_in_federated(&self, identity: ExternalIdentity) -> Result<Session, AppError> {
        let email = normalize_email(&identity.email);
        if let Some(user) = self
            .with_store("find_by_email", self.store.find_by_email(&email))
            .await?
        {
            counter!(AUTH_FEDERATED_LOGIN).increment(1);
            tracing::info!(user_id = %user.id, "federated login for existing user");
            return self.start_session(user);
        }

        let placeholder = self.hasher.unusable_hash().await?;
        let created = self
            .with_store(
                "insert",
                self.store.insert(NewUser {
                    name: identity.name,
                    email: email.clone(),
                    password_hash: Some(placeholder),
                    role: UserRole::User,
                    google_id: Some(identity.subject),
                }),
            )
            .await;

        let user = match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "user created from federated identity");
                user
            },
            // lost a race with a parallel first login for the same email
            Err(AppError::DuplicateUser) => self
                .with_store("find_by_email", self.store.find_by_email(&email))
                .await?
                .ok_or_else(|| AppError::Internal("user vanished after duplicate insert".into()))?,
            Err(e) => return Err(e),
        };

        counter!(AUTH_FEDERATED_LOGIN).increment(1);
        self.start_session(user)
    }

    /// Create the configured admin unless its email is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<bool, AppError> {
        let email = normalize_email(&admin.email);
        if let Some(existing) = self
            .with_store("find_by_email", self.store.find_by_email(&email))
            .await?
        {
            if !existing.role.is_admin() {
                tracing::warn!(user_id = %existing.id, "bootstrap admin email belongs to a non-admin account");
            }
            return Ok(false);
        }

        let password_hash = self
            .hasher
            .hash_owned(admin.password.expose().to_string())
            .await?;
        let record = self
            .with_store(
                "insert",
                self.store.insert(NewUser {
                    name: admin.name.clone(),
                    email,
                    password_hash: Some(password_hash),
                    role: UserRole::Admin,
                    google_id: None,
                }),
            )
            .await?;

        tracing::info!(user_id = %record.id, "bootstrap admin created");
        Ok(true)
    }

    fn start_session(&self, user: UserRecord) -> Result<Session, AppError> {
        let token = self.tokens.issue(user.id)?;
        Ok(Session {
            user: user.into_public(),
            token,
        })
    }
}

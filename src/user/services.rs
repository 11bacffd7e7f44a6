use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    config::AuthConfig,
    error::AuthError,
    user::{
        dto::PublicUser,
        jwt::JwtKeys,
        password::Hasher,
        repo::UserStore,
        repo_types::{NewUser, User},
    },
};

const MAX_NAME_LENGTH: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s\p{Cc}]+@[^@\s\p{Cc}]+\.[^@\s\p{Cc}]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims the address and lowercases its domain. The local part stays
/// case-sensitive.
pub(crate) fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Registration and token issuance on top of a [`UserStore`].
///
/// Holds no mutable state of its own; uniqueness of emails under concurrent
/// registration is left to the store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Hasher,
    keys: JwtKeys,
    min_password_length: usize,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, config: &AuthConfig) -> anyhow::Result<Self> {
        Ok(Self {
            users,
            hasher: Hasher::new(config.hashing)?,
            keys,
            min_password_length: config.min_password_length,
        })
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Validates input, hashes the password and stores a new user. Every
    /// rejection happens before the single store write.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<PublicUser, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = ?email, "invalid email");
            return Err(AuthError::Validation("Enter a valid email address.".into()));
        }

        let name = name.trim();
        if name.is_empty() {
            warn!(email = %email, "blank name");
            return Err(AuthError::Validation("name may not be blank".into()));
        }
        if name.chars().any(char::is_control) {
            warn!(email = %email, "control characters in name");
            return Err(AuthError::Validation(
                "name may not contain control characters".into(),
            ));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            warn!(email = %email, "name too long");
            return Err(AuthError::Validation(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        if password.chars().count() < self.min_password_length {
            warn!(email = %email, "password too short");
            return Err(AuthError::InvalidPassword {
                min_length: self.min_password_length,
            });
        }

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hasher.hash(password).map_err(|e| {
            error!(error = %e, "hash_password failed");
            AuthError::Internal(e)
        })?;

        let user = self
            .users
            .create(NewUser {
                email,
                name: name.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| {
                let e = AuthError::from(e);
                match &e {
                    AuthError::DuplicateUser => warn!("email registered concurrently"),
                    other => error!(error = %other, "create user failed"),
                }
                e
            })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(PublicUser::from(user))
    }

    /// Checks the credential pair and mints a fresh bearer token.
    pub async fn issue_token(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        if password.is_empty() {
            warn!(email = ?email, "login with blank password");
            return Err(AuthError::Authentication);
        }
        // never registrable, and the database would reject the lookup
        if email.chars().any(char::is_control) {
            warn!(email = ?email, "login with control characters in email");
            return Err(AuthError::Authentication);
        }

        let user = match self.users.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::Authentication);
            }
        };

        let ok = self.users.verify_password(&user, password).map_err(|e| {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            AuthError::Internal(e)
        })?;
        if !ok {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::Authentication);
        }
        if !user.is_active {
            warn!(email = %email, user_id = %user.id, "login inactive user");
            return Err(AuthError::Authentication);
        }

        let token = self.keys.sign(user.id).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AuthError::Internal(e)
        })?;

        info!(user_id = %user.id, email = %user.email, "token issued");
        Ok(token)
    }

    /// Resolves a bearer token to the active user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AuthError::Unauthorized
        })?;

        match self.users.find_by_id(claims.sub).await? {
            Some(user) if user.is_active => Ok(user),
            Some(user) => {
                warn!(user_id = %user.id, "token for inactive user");
                Err(AuthError::Unauthorized)
            }
            None => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

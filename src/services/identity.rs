// src/services/identity.rs
use crate::errors::CarscanError;
use crate::models::User;
use crate::validation::{self, RegistrationForm};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An authenticated user context. Callers hand this to whatever needs the
/// current user instead of reading it from shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: Uuid,
    pub user: User,
}

impl Session {
    pub fn user_id(&self) -> String {
        self.user.id.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Session, CarscanError>;

    async fn register(&self, form: &RegistrationForm) -> Result<Session, CarscanError>;

    async fn logout(&self, session: &Session) -> Result<(), CarscanError>;

    /// Returns the session's user with `update` merged in.
    async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<User, CarscanError>;

    /// Current state of the session's user, or `Auth` if the session ended.
    async fn current_user(&self, session: &Session) -> Result<User, CarscanError>;
}

struct Account {
    user: User,
    salt: Uuid,
    password_digest: Vec<u8>,
}

#[derive(Default)]
struct Directory {
    // keyed by lowercased email
    accounts: HashMap<String, Account>,
    sessions: HashMap<Uuid, String>,
}

/// Identity provider that keeps accounts in process memory.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    directory: RwLock<Directory>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn digest_password(salt: &Uuid, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_email<'a>(directory: &'a Directory, session: &Session) -> Result<&'a String, CarscanError> {
    directory
        .sessions
        .get(&session.token)
        .ok_or_else(|| CarscanError::Auth("Session is no longer active".to_string()))
}

fn open_session(directory: &mut Directory, user: &User) -> Session {
    let token = Uuid::new_v4();
    directory.sessions.insert(token, account_key(&user.email));
    Session {
        token,
        user: user.clone(),
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn login(&self, email: &str, password: &str) -> Result<Session, CarscanError> {
        validation::validate_login(email, password)?;

        let mut directory = self.directory.write().await;
        let account = directory
            .accounts
            .get(&account_key(email))
            .ok_or_else(|| CarscanError::Auth("Invalid email or password".to_string()))?;

        if digest_password(&account.salt, password) != account.password_digest {
            return Err(CarscanError::Auth("Invalid email or password".to_string()));
        }

        let user = account.user.clone();
        let session = open_session(&mut directory, &user);
        info!("User {} logged in", user.id);
        Ok(session)
    }

    async fn register(&self, form: &RegistrationForm) -> Result<Session, CarscanError> {
        validation::validate_registration(form)?;

        let mut directory = self.directory.write().await;
        let key = account_key(&form.email);
        if directory.accounts.contains_key(&key) {
            return Err(CarscanError::Auth(format!(
                "An account for {} already exists",
                form.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: form.email.trim().to_string(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone: form.phone.clone(),
            avatar: None,
            created_at: Utc::now(),
        };
        let salt = Uuid::new_v4();
        let password_digest = digest_password(&salt, &form.password);

        directory.accounts.insert(
            key,
            Account {
                user: user.clone(),
                salt,
                password_digest,
            },
        );
        let session = open_session(&mut directory, &user);
        info!("Registered user {}", user.id);
        Ok(session)
    }

    async fn logout(&self, session: &Session) -> Result<(), CarscanError> {
        let mut directory = self.directory.write().await;
        directory.sessions.remove(&session.token);
        Ok(())
    }

    async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<User, CarscanError> {
        if let Some(email) = &update.email {
            validation::validate_email(email)?;
        }

        let mut directory = self.directory.write().await;
        let old_key = session_email(&directory, session)?.clone();

        if let Some(email) = &update.email {
            let new_key = account_key(email);
            if new_key != old_key && directory.accounts.contains_key(&new_key) {
                return Err(CarscanError::Auth(format!(
                    "An account for {} already exists",
                    email
                )));
            }
        }

        let mut account = directory
            .accounts
            .remove(&old_key)
            .ok_or_else(|| CarscanError::Auth("Account no longer exists".to_string()))?;

        let user = &mut account.user;
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = update.email {
            user.email = email.trim().to_string();
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar);
        }

        let updated = user.clone();
        let new_key = account_key(&updated.email);
        for owner in directory.sessions.values_mut() {
            if *owner == old_key {
                *owner = new_key.clone();
            }
        }
        directory.accounts.insert(new_key, account);
        Ok(updated)
    }

    async fn current_user(&self, session: &Session) -> Result<User, CarscanError> {
        let directory = self.directory.read().await;
        let key = session_email(&directory, session)?;
        directory
            .accounts
            .get(key)
            .map(|account| account.user.clone())
            .ok_or_else(|| CarscanError::Auth("Account no longer exists".to_string()))
    }
}

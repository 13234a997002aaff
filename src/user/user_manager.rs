use super::{auth::PasswordHasherKind, UserRole};
use crate::error::{HiringError, HiringResult};
use crate::store::{
    is_unique_violation, CompanyDraft, FullStore, Gender, NewUser, PageRequest, Paged, User,
    UserFilter, UserUpdate,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub company_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRecruiterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company_name: String,
    #[serde(default)]
    pub company_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cv: Option<String>,
    /// Only applied when the caller may manage users.
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Only applied when the caller may manage users.
    #[serde(default)]
    pub company_id: Option<i64>,
}

fn validate_identity(name: &str, email: &str) -> HiringResult<()> {
    if name.trim().is_empty() {
        return Err(HiringError::InvalidRequest("Name must not be empty".to_string()));
    }
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid_email {
        return Err(HiringError::InvalidRequest(format!(
            "Invalid email address: {}",
            email
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> HiringResult<()> {
    if password.is_empty() {
        return Err(HiringError::InvalidRequest(
            "Password must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn email_taken(email: &str) -> HiringError {
    HiringError::AlreadyExists(format!("Email {} is already in use", email))
}

pub struct UserManager {
    store: Arc<dyn FullStore>,
    hasher: PasswordHasherKind,
}

impl UserManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self {
            store,
            hasher: PasswordHasherKind::default(),
        }
    }

    fn ensure_email_free(&self, email: &str) -> HiringResult<()> {
        if self.store.get_user_by_email(email)?.is_some() {
            return Err(email_taken(email));
        }
        Ok(())
    }

    fn reload(&self, id: i64) -> HiringResult<User> {
        self.store
            .get_user(id)?
            .ok_or_else(|| HiringError::not_found("User", id))
    }

    pub fn create_user(&self, request: CreateUserRequest) -> HiringResult<User> {
        validate_identity(&request.name, &request.email)?;
        validate_password(&request.password)?;
        self.ensure_email_free(&request.email)?;
        if let Some(company_id) = request.company_id {
            if self.store.get_company(company_id)?.is_none() {
                return Err(HiringError::not_found("Company", company_id));
            }
        }

        let email = request.email.clone();
        let id = self
            .store
            .create_user(&NewUser {
                name: request.name,
                email: request.email,
                password_hash: Some(self.hasher.hash(&request.password)?),
                age: request.age,
                gender: request.gender,
                address: request.address,
                avatar: None,
                cv: None,
                role: request.role.unwrap_or(UserRole::Candidate),
                company_id: request.company_id,
            })
            .map_err(|e| HiringError::on_write(e, || email_taken(&email)))?;
        self.reload(id)
    }

    /// Public self-registration. The role is always Candidate.
    pub fn register(&self, mut request: CreateUserRequest) -> HiringResult<User> {
        request.role = Some(UserRole::Candidate);
        request.company_id = None;
        self.create_user(request)
    }

    /// Creates a company and its first recruiter in one transaction.
    pub fn register_recruiter(&self, request: RegisterRecruiterRequest) -> HiringResult<User> {
        validate_identity(&request.name, &request.email)?;
        validate_password(&request.password)?;
        if request.company_name.trim().is_empty() {
            return Err(HiringError::InvalidRequest(
                "Company name must not be empty".to_string(),
            ));
        }
        self.ensure_email_free(&request.email)?;
        let password_hash = self.hasher.hash(&request.password)?;

        let company = CompanyDraft {
            name: request.company_name,
            description: None,
            address: request.company_address,
            logo: None,
        };
        let recruiter = NewUser {
            name: request.name,
            email: request.email,
            password_hash: Some(password_hash),
            age: None,
            gender: None,
            address: None,
            avatar: None,
            cv: None,
            role: UserRole::Recruiter,
            company_id: None,
        };
        let (company_id, id) = self
            .store
            .create_recruiter_with_company(&company, &recruiter)
            .map_err(|e| HiringError::on_write(e, || email_taken(&recruiter.email)))?;
        info!("Registered recruiter {} for company {}", id, company_id);
        self.reload(id)
    }

    pub fn update_user(&self, request: UpdateUserRequest, can_manage: bool) -> HiringResult<User> {
        let current = self.reload(request.id)?;
        if request.name.trim().is_empty() {
            return Err(HiringError::InvalidRequest("Name must not be empty".to_string()));
        }

        let (role, company_id) = if can_manage {
            (
                request.role.unwrap_or(current.role),
                request.company_id.or(current.company_id()),
            )
        } else {
            (current.role, current.company_id())
        };
        if let Some(company_id) = company_id {
            if self.store.get_company(company_id)?.is_none() {
                return Err(HiringError::not_found("Company", company_id));
            }
        }

        self.store.update_user(
            current.id,
            &UserUpdate {
                name: request.name,
                age: request.age,
                gender: request.gender,
                address: request.address,
                avatar: request.avatar.or(current.avatar),
                cv: request.cv.or(current.cv),
                role,
                company_id,
            },
        )?;
        self.reload(current.id)
    }

    pub fn delete_user(&self, id: i64) -> HiringResult<()> {
        if !self.store.delete_user(id)? {
            return Err(HiringError::not_found("User", id));
        }
        info!("Soft-deleted user {}", id);
        Ok(())
    }

    pub fn restore_user(&self, id: i64) -> HiringResult<User> {
        if !self.store.restore_user(id)? {
            return Err(HiringError::not_found("User", id));
        }
        info!("Restored user {}", id);
        self.reload(id)
    }

    pub fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> HiringResult<()> {
        let user = self.reload(user_id)?;
        validate_password(new_password)?;
        let matches = match user.password_hash.as_deref() {
            Some(hash) => self.hasher.verify(old_password, hash)?,
            None => false,
        };
        if !matches {
            return Err(HiringError::InvalidRequest(
                "Old password is incorrect".to_string(),
            ));
        }
        self.store
            .set_password_hash(user_id, &self.hasher.hash(new_password)?)?;
        Ok(())
    }

    /// Checks an email/password pair. Unknown, inactive and password-less
    /// accounts all fail the same way.
    pub fn verify_credentials(&self, email: &str, password: &str) -> HiringResult<User> {
        let invalid = || HiringError::Unauthorized("Invalid email or password".to_string());
        let user = self.store.get_user_by_email(email)?.ok_or_else(invalid)?;
        if !user.active {
            return Err(invalid());
        }
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(invalid());
        };
        match self.hasher.verify(password, hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(invalid()),
            Err(err) => {
                warn!("Stored password hash for user {} is unreadable: {}", user.id, err);
                Err(invalid())
            }
        }
    }

    /// Returns the user for a verified Google identity, creating a Candidate
    /// account without password on first sign-in.
    pub fn find_or_create_google_user(
        &self,
        email: &str,
        name: &str,
        picture: Option<&str>,
    ) -> HiringResult<User> {
        if let Some(user) = self.store.get_user_by_email(email)? {
            if !user.active {
                return Err(HiringError::Unauthorized("Account is disabled".to_string()));
            }
            return Ok(user);
        }
        let name = if name.trim().is_empty() { email } else { name };
        let created = self.store.create_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: None,
            age: None,
            gender: None,
            address: None,
            avatar: picture.map(str::to_string),
            cv: None,
            role: UserRole::Candidate,
            company_id: None,
        });
        let id = match created {
            Ok(id) => id,
            // Concurrent first sign-in of the same account.
            Err(e) if is_unique_violation(&e) => {
                return self
                    .store
                    .get_user_by_email(email)?
                    .ok_or_else(|| email_taken(email));
            }
            Err(e) => return Err(e.into()),
        };
        info!("Created user {} from Google sign-in", id);
        self.reload(id)
    }

    /// Creates the configured admin account if it does not exist yet.
    pub fn ensure_admin(&self, email: &str, password: &str) -> HiringResult<()> {
        if self.store.get_user_by_email(email)?.is_some() {
            return Ok(());
        }
        self.create_user(CreateUserRequest {
            name: "Admin".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            age: None,
            gender: None,
            address: None,
            role: Some(UserRole::Admin),
            company_id: None,
        })?;
        info!("Created admin user {}", email);
        Ok(())
    }

    pub fn get_user(&self, id: i64) -> HiringResult<User> {
        self.reload(id)
    }

    pub fn list_users(&self, filter: &UserFilter, page: PageRequest) -> HiringResult<Paged<User>> {
        Ok(self.store.list_users(filter, page)?)
    }

    pub fn store_refresh_token(&self, user_id: i64, token: Option<&str>) -> HiringResult<()> {
        Ok(self.store.set_refresh_token(user_id, token)?)
    }

    /// Finds the active user holding `token` as their current refresh token.
    pub fn user_for_refresh_token(&self, token: &str, email: &str) -> HiringResult<User> {
        self.store
            .get_user_by_refresh_token(token, email)?
            .filter(|user| user.active)
            .ok_or_else(|| HiringError::Unauthorized("Invalid refresh token".to_string()))
    }
}

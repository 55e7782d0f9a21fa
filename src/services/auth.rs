//! Account management and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{LoginRequest, SignupRequest, UpdateProfile, UserClaims, UserPublic},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account and return its id
    pub async fn signup(&self, payload: SignupRequest) -> AppResult<i32> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.users.email_exists(&payload.email).await? {
            return Err(AppError::Validation("Email already taken".to_string()));
        }

        let password_hash = hash_password(&payload.password)?;
        let user = self
            .repository
            .users
            .create(&payload, &password_hash)
            .await?;

        Ok(user.id)
    }

    /// Authenticate by email and password, returning a JWT and the profile
    pub async fn login(&self, payload: LoginRequest) -> AppResult<(String, UserPublic)> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let user = self
            .repository
            .users
            .get_by_email(&payload.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(&user.password, &payload.password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        // Create JWT token
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, UserPublic::from(user)))
    }

    /// Update the caller's own profile (name, major, year group)
    pub async fn update_profile(
        &self,
        user_id: i32,
        profile: UpdateProfile,
    ) -> AppResult<UserPublic> {
        profile
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let user = self
            .repository
            .users
            .update_profile(user_id, &profile)
            .await?;

        Ok(UserPublic::from(user))
    }
}

/// Hash a password using Argon2
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
pub(crate) fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

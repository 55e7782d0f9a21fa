//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, SignupRequest, UpdateProfile, User, UserPublic},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, password, major, year_group FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(user)
    }

    /// Get user by email (primary authentication method)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password, major, year_group
            FROM users WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Email addresses of every admin account (lifecycle notification targets)
    pub async fn admin_emails(&self) -> AppResult<Vec<String>> {
        let emails: Vec<String> = sqlx::query_scalar("SELECT email FROM users WHERE role = $1")
            .bind(Role::Admin)
            .fetch_all(&self.pool)
            .await?;
        Ok(emails)
    }

    /// Public profile by ID
    pub async fn get_public(&self, id: i32) -> AppResult<UserPublic> {
        let user = sqlx::query_as::<_, UserPublic>(
            "SELECT id, name, email, role, major, year_group FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(user)
    }

    /// Create a new user
    pub async fn create(&self, signup: &SignupRequest, password_hash: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, role, password, major, year_group)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, role, password, major, year_group
            "#,
        )
        .bind(&signup.name)
        .bind(&signup.email)
        .bind(signup.role)
        .bind(password_hash)
        .bind(&signup.major)
        .bind(signup.year_group)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user's own profile (name, major, year group)
    pub async fn update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<User> {
        let mut sets = Vec::new();
        let mut param_idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(profile.name, "name");
        add_field!(profile.major, "major");
        add_field!(profile.year_group, "year_group");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = ${}",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(profile.name);
        bind_field!(profile.major);
        bind_field!(profile.year_group);

        builder.bind(id).execute(&self.pool).await?;

        self.get_by_id(id).await
    }
}

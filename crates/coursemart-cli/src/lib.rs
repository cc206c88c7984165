//! # Coursemart CLI
//!
//! Administrative operations run outside the HTTP API. Admin accounts cannot
//! be created through registration, so the first one comes from here.

use sqlx::PgPool;

use coursemart_core::{AppError, UserRole, hash_password};
use coursemart_models::UserId;

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOutcome {
    Created(UserId),
    /// An account with this email already exists; nothing was changed.
    AlreadyExists,
}

/// Basic shape checks before touching the database.
pub fn validate_new_admin(admin: &NewAdmin) -> Result<(), String> {
    let email = admin.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(format!("'{email}' is not a valid email address")),
    }

    if admin.password.chars().count() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    Ok(())
}

/// Insert an active admin unless the email is taken.
pub async fn create_admin(pool: &PgPool, admin: &NewAdmin) -> Result<AdminOutcome, AppError> {
    let email = admin.email.trim().to_lowercase();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&email)
        .fetch_one(pool)
        .await?;
    if exists {
        return Ok(AdminOutcome::AlreadyExists);
    }

    let password_hash = hash_password(&admin.password)?;

    let id = sqlx::query_scalar::<_, UserId>(
        r#"INSERT INTO users (email, password_hash, full_name, role, is_active)
           VALUES ($1, $2, $3, $4, TRUE)
           RETURNING id"#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&admin.full_name)
    .bind(UserRole::Admin)
    .fetch_one(pool)
    .await?;

    Ok(AdminOutcome::Created(id))
}

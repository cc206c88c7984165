use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use coursemart_auth::create_access_token;
use coursemart_config::{JwtConfig, RegistrationConfig};
use coursemart_core::{AppError, UserRole, hash_password, verify_password};
use coursemart_models::{LoginRequest, RegisterRequest, TokenResponse, User, UserId, UserProfile};

use crate::metrics;

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, is_active, created_at, updated_at";

/// Same message for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService;

impl AuthService {
    /// Pick the role a new account gets. Admins are never self-registered.
    pub fn role_for_new_account(registration: &RegistrationConfig, email: &str) -> UserRole {
        if registration.is_trusted_seller(email) {
            UserRole::Seller
        } else {
            UserRole::Buyer
        }
    }

    #[instrument(skip(db, registration, dto), fields(email = %dto.email))]
    pub async fn register_user(
        db: &PgPool,
        registration: &RegistrationConfig,
        dto: RegisterRequest,
    ) -> Result<UserProfile, AppError> {
        let email = dto.email.trim().to_lowercase();

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&email)
                .fetch_one(db)
                .await?;

        if exists {
            return Err(AppError::conflict(anyhow!("Email already registered")));
        }

        let role = Self::role_for_new_account(registration, &email);
        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, full_name, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(&dto.full_name)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            // Lost a race with a concurrent registration of the same email.
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict(anyhow!("Email already registered"))
            }
            _ => AppError::database(e),
        })?;

        metrics::track_user_registered(role.as_str());
        tracing::info!(user_id = %user.id, role = role.as_str(), "user registered");

        Ok(user.into())
    }

    #[instrument(skip(db, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<TokenResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let Some(user) =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(&email)
                .fetch_optional(db)
                .await?
        else {
            metrics::track_user_login_failure("unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&dto.password, &user.password_hash)? {
            metrics::track_user_login_failure("wrong_password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_active {
            metrics::track_user_login_failure("inactive");
            return Err(AppError::unauthorized("Account is deactivated"));
        }

        let access_token =
            create_access_token(user.id.into_inner(), &user.email, user.role, jwt_config)?;

        metrics::track_user_login_success(user.role.as_str());
        metrics::track_jwt_issued();

        Ok(TokenResponse::bearer(access_token))
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, user_id: UserId) -> Result<UserProfile, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        Ok(user.into())
    }
}

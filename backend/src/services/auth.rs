//! Authentication service for user registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::types::Language;
use shared::validation::{validate_email, validate_password};

/// Permissions granted to a freshly registered operator
const DEFAULT_PERMISSIONS: &[&str] = &["catalog:read", "packing:operate"];

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering an operator account on an existing site
#[derive(Debug, Deserialize)]
pub struct RegisterUserInput {
    pub site_id: Uuid,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub preferred_language: Option<Language>,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub site_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub site_id: String,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub site_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub permissions: Vec<String>,
    pub preferred_language: String,
    pub is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register an operator account on an existing site
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<RegisterResponse> {
        validate_email(&input.email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
            message_fr: "Format d'adresse e-mail invalide".to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
            message_fr: "Le mot de passe doit contenir au moins 8 caractères".to_string(),
        })?;

        // Site must exist
        let site_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sites WHERE id = $1)")
                .bind(input.site_id)
                .fetch_one(&self.db)
                .await?;

        if !site_exists {
            return Err(AppError::NotFound("Site".to_string()));
        }

        // Check if email already exists
        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(&input.email)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        // Hash password
        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let language = input.preferred_language.unwrap_or_default();
        let permissions: Vec<String> = DEFAULT_PERMISSIONS.iter().map(|p| p.to_string()).collect();

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (site_id, email, password_hash, display_name, permissions, preferred_language)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.site_id)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.display_name)
        .bind(&permissions)
        .bind(language.code())
        .fetch_one(&self.db)
        .await?;

        // Generate tokens
        let tokens = self.generate_tokens(user_id, input.site_id, &permissions)?;

        // Store refresh token
        self.store_refresh_token(user_id, &tokens.refresh_token)
            .await?;

        Ok(RegisterResponse {
            user_id,
            site_id: input.site_id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        })
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        // Find user by email
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, site_id, email, password_hash, display_name, permissions,
                   preferred_language, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid email or password".to_string(),
            message_fr: "Adresse e-mail ou mot de passe incorrect".to_string(),
        })?;

        // Check if user is active
        if !user.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_fr: "Ce compte est désactivé".to_string(),
            });
        }

        // Verify password
        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::Unauthorized {
                message: "Invalid email or password".to_string(),
                message_fr: "Adresse e-mail ou mot de passe incorrect".to_string(),
            });
        }

        // Update last login
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        // Generate tokens
        let tokens = self.generate_tokens(user.id, user.site_id, &user.permissions)?;

        // Store refresh token
        self.store_refresh_token(user.id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Refresh access token using refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        // Hash the refresh token to look up
        let token_hash = Self::hash_token(refresh_token);

        // Find valid refresh token
        let token_record = sqlx::query_as::<_, (Uuid, Uuid, Vec<String>)>(
            r#"
            SELECT rt.user_id, u.site_id, u.permissions
            FROM refresh_tokens rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_fr: "Jeton de rafraîchissement invalide ou expiré".to_string(),
        })?;

        let (user_id, site_id, permissions) = token_record;

        // Revoke old refresh token
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.db)
            .await?;

        // Generate new tokens
        let tokens = self.generate_tokens(user_id, site_id, &permissions)?;

        // Store new refresh token
        self.store_refresh_token(user_id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized {
            message: format!("Invalid token: {}", e),
            message_fr: "Jeton invalide".to_string(),
        })?;

        Ok(token_data.claims)
    }

    /// Generate access and refresh tokens
    fn generate_tokens(
        &self,
        user_id: Uuid,
        site_id: Uuid,
        permissions: &[String],
    ) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        // Access token claims
        let access_claims = Claims {
            sub: user_id.to_string(),
            site_id: site_id.to_string(),
            permissions: permissions.to_vec(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        // Refresh token (simple random token)
        let refresh_token = Uuid::new_v4().to_string();

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let token_hash = Self::hash_token(token);
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Hash a token for storage
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        let a = AuthService::hash_token("some-refresh-token");
        let b = AuthService::hash_token("some-refresh-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_token_differs_per_token() {
        assert_ne!(
            AuthService::hash_token("token-a"),
            AuthService::hash_token("token-b")
        );
    }
}

use serde::Deserialize;

use crate::auth::{generate_jwt, hash_password, verify_password, AuthError, Claims, MIN_PASSWORD_LEN};
use crate::config::AppConfig;
use crate::database::models::{NewUser, User};
use crate::database::store::ApiaryStore;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::validation::FieldErrors;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A freshly issued session.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_in: i64,
}

pub async fn register(store: &dyn ApiaryStore, input: RegisterInput) -> Result<User, ApiError> {
    let mut errors = FieldErrors::new();
    let username = errors
        .required("username", input.username.map(|u| u.trim().to_string()))
        .filter(|u| !u.is_empty());
    if username.is_none() {
        errors.add("username", "This field may not be blank.");
    }
    let password = errors.required("password", input.password);
    if let Some(password) = &password {
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Ensure this field has at least {} characters.", MIN_PASSWORD_LEN),
            );
        }
    }
    errors.finish()?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::validation_error("Invalid input", None));
    };

    let password_hash = hash_password(&password)?;
    let user = store
        .insert_user(NewUser {
            username,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Integrity(_) => ApiError::conflict("A user with that username already exists."),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn login(store: &dyn ApiaryStore, config: &AppConfig, input: LoginInput) -> Result<Session, ApiError> {
    let mut errors = FieldErrors::new();
    let username = errors.required("username", input.username);
    let password = errors.required("password", input.password);
    errors.finish()?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::validation_error("Invalid input", None));
    };

    let user = store
        .user_by_username(username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(username = %user.username, "password rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = generate_jwt(&Claims::new(&user, config), config)?;
    tracing::info!(user_id = user.id, "login");
    Ok(Session {
        token,
        user,
        expires_in: config.jwt_expiry_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validate_jwt;
    use crate::database::MemoryStore;

    fn registration(username: &str, password: &str) -> RegisterInput {
        RegisterInput {
            username: Some(username.into()),
            password: Some(password.into()),
            first_name: "Ann".into(),
            ..Default::default()
        }
    }

    fn credentials(username: &str, password: &str) -> LoginInput {
        LoginInput {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = MemoryStore::new();
        let config = AppConfig::development();
        let user = register(&store, registration("ann", "correct-horse")).await.unwrap();
        assert_eq!(user.first_name, "Ann");

        let session = login(&store, &config, credentials("ann", "correct-horse")).await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(validate_jwt(&session.token, &config).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn short_password_and_duplicate_username() {
        let store = MemoryStore::new();
        let err = register(&store, registration("ann", "short")).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        register(&store, registration("ann", "correct-horse")).await.unwrap();
        let err = register(&store, registration("ann", "another-horse")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let store = MemoryStore::new();
        let config = AppConfig::development();
        register(&store, registration("ann", "correct-horse")).await.unwrap();

        let wrong = login(&store, &config, credentials("ann", "wrong-horse")).await.unwrap_err();
        assert_eq!(wrong.status_code(), 401);
        let unknown = login(&store, &config, credentials("bob", "correct-horse")).await.unwrap_err();
        assert_eq!(unknown.status_code(), 401);
    }
}

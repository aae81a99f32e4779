use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::account_repo;
use crate::error::{DomainError, DomainResult};
use crate::models::AccountRow;

/// Registration form data after shape-level decoding, before domain
/// validation. Validation lives here rather than in any framework form
/// machinery so the rules hold for every caller.
#[derive(Debug)]
pub struct RegistrationInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub profile_image: Option<String>,
}

impl RegistrationInput {
    pub fn validate(&self) -> DomainResult<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(DomainError::InvalidInput("invalid email address".into()));
        }
        validate_username(&self.username)?;
        if self.password.len() < 8 {
            return Err(DomainError::InvalidInput(
                "password must be at least 8 characters".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct ProfileUpdate {
    pub email: String,
    pub username: String,
    pub profile_image: Option<String>,
    pub hide_email: bool,
}

impl ProfileUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(DomainError::InvalidInput("invalid email address".into()));
        }
        validate_username(&self.username)
    }
}

fn validate_username(username: &str) -> DomainResult<()> {
    let username = username.trim();
    if username.len() < 3 || username.len() > 30 {
        return Err(DomainError::InvalidInput(
            "username must be 3-30 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(DomainError::InvalidInput(
            "username may only contain letters, digits, '_' and '.'".into(),
        ));
    }
    Ok(())
}

pub async fn register(pool: &SqlitePool, input: RegistrationInput) -> DomainResult<AccountRow> {
    input.validate()?;

    let email = input.email.trim();
    let username = input.username.trim();
    if account_repo::load_account_by_email(pool, email).await?.is_some() {
        return Err(DomainError::Duplicate("email already registered"));
    }
    if account_repo::load_account_by_username(pool, username)
        .await?
        .is_some()
    {
        return Err(DomainError::Duplicate("username already taken"));
    }

    let id = Uuid::new_v4().to_string();
    let password_hash = hash_password(&input.password)?;
    let created_at = Utc::now().to_rfc3339();
    account_repo::insert_account(
        pool,
        account_repo::NewAccount {
            id: &id,
            email,
            username,
            password_hash: &password_hash,
            profile_image: input.profile_image.as_deref(),
            hide_email: true,
            created_at: &created_at,
        },
    )
    .await?;

    get(pool, &id).await
}

/// Case-insensitive email lookup plus password check. Both a missing
/// account and a wrong password map to the same error so login failures
/// don't reveal which part was wrong.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> DomainResult<AccountRow> {
    let Some(account) = account_repo::load_account_by_email(pool, email.trim()).await? else {
        return Err(DomainError::Permission("invalid email or password"));
    };
    let parsed = PasswordHash::new(&account.password_hash)
        .map_err(|_| DomainError::Permission("invalid email or password"))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| DomainError::Permission("invalid email or password"))?;
    Ok(account)
}

pub async fn get(pool: &SqlitePool, account_id: &str) -> DomainResult<AccountRow> {
    account_repo::load_account(pool, account_id)
        .await?
        .ok_or(DomainError::NotFound("account"))
}

/// Case-insensitive substring search over email or username. An empty
/// query matches nothing rather than everything.
pub async fn search(pool: &SqlitePool, query: &str) -> DomainResult<Vec<AccountRow>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    Ok(account_repo::search_accounts(pool, query).await?)
}

/// Only the owning account may edit its profile.
pub async fn update_profile(
    pool: &SqlitePool,
    actor_id: &str,
    target_id: &str,
    update: ProfileUpdate,
) -> DomainResult<()> {
    if actor_id != target_id {
        return Err(DomainError::Permission("you can only edit your own profile"));
    }
    update.validate()?;

    let email = update.email.trim();
    let username = update.username.trim();
    if let Some(existing) = account_repo::load_account_by_email(pool, email).await? {
        if existing.id != target_id {
            return Err(DomainError::Duplicate("email already registered"));
        }
    }
    if let Some(existing) = account_repo::load_account_by_username(pool, username).await? {
        if existing.id != target_id {
            return Err(DomainError::Duplicate("username already taken"));
        }
    }

    let updated = account_repo::update_profile(
        pool,
        target_id,
        account_repo::ProfileChanges {
            email,
            username,
            profile_image: update.profile_image.as_deref(),
            hide_email: update.hide_email,
        },
    )
    .await?;
    if updated == 0 {
        return Err(DomainError::NotFound("account"));
    }
    Ok(())
}

fn hash_password(password: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DomainError::InvalidInput(format!("could not hash password: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::memory_pool;

    fn input(email: &str, username: &str) -> RegistrationInput {
        RegistrationInput {
            email: email.to_string(),
            username: username.to_string(),
            password: "hunter2hunter2".to_string(),
            profile_image: None,
        }
    }

    #[tokio::test]
    async fn register_and_authenticate() {
        let pool = memory_pool().await;
        let account = register(&pool, input("ada@example.com", "ada")).await.unwrap();
        assert_eq!(account.username, "ada");
        assert!(account.hide_email != 0);

        // Email match is case-insensitive.
        let authed = authenticate(&pool, "ADA@Example.COM", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(authed.id, account.id);

        let err = authenticate(&pool, "ada@example.com", "wrong-password").await;
        assert!(matches!(err, Err(DomainError::Permission(_))));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected_case_insensitively() {
        let pool = memory_pool().await;
        register(&pool, input("ada@example.com", "ada")).await.unwrap();

        let err = register(&pool, input("ADA@EXAMPLE.COM", "someone_else")).await;
        assert!(matches!(err, Err(DomainError::Duplicate(_))));

        let err = register(&pool, input("other@example.com", "ADA")).await;
        assert!(matches!(err, Err(DomainError::Duplicate(_))));
    }

    #[tokio::test]
    async fn validation_produces_typed_errors() {
        let pool = memory_pool().await;

        let err = register(&pool, input("not-an-email", "ada")).await;
        assert!(matches!(err, Err(DomainError::InvalidInput(_))));

        let err = register(&pool, input("ada@example.com", "a")).await;
        assert!(matches!(err, Err(DomainError::InvalidInput(_))));

        let mut short_password = input("ada@example.com", "ada");
        short_password.password = "short".to_string();
        let err = register(&pool, short_password).await;
        assert!(matches!(err, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn search_matches_email_or_username() {
        let pool = memory_pool().await;
        register(&pool, input("ada@example.com", "ada")).await.unwrap();
        register(&pool, input("grace@navy.mil", "hopper")).await.unwrap();

        let hits = search(&pool, "ada").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "ada");

        // Matches the email of one account and the username of the other.
        let hits = search(&pool, "A").await.unwrap();
        assert_eq!(hits.len(), 2);

        assert!(search(&pool, "  ").await.unwrap().is_empty());
        assert!(search(&pool, "zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_treats_like_metacharacters_as_literals() {
        let pool = memory_pool().await;
        register(&pool, input("ada@example.com", "ada_l")).await.unwrap();
        register(&pool, input("adax@example.com", "adaxl")).await.unwrap();

        // '_' must not act as a single-character wildcard.
        let hits = search(&pool, "ada_l").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "ada_l");

        // A bare '%' must not match every account.
        assert!(search(&pool, "%").await.unwrap().is_empty());
        assert!(search(&pool, "\\").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_the_owner_may_edit() {
        let pool = memory_pool().await;
        let ada = register(&pool, input("ada@example.com", "ada")).await.unwrap();
        let eve = register(&pool, input("eve@example.com", "eve")).await.unwrap();

        let update = ProfileUpdate {
            email: "ada@lovelace.dev".to_string(),
            username: "ada".to_string(),
            profile_image: Some("https://img.example/ada.png".to_string()),
            hide_email: false,
        };
        let err = update_profile(&pool, &eve.id, &ada.id, update).await;
        assert!(matches!(err, Err(DomainError::Permission(_))));

        let update = ProfileUpdate {
            email: "ada@lovelace.dev".to_string(),
            username: "ada".to_string(),
            profile_image: None,
            hide_email: false,
        };
        update_profile(&pool, &ada.id, &ada.id, update).await.unwrap();
        let reloaded = get(&pool, &ada.id).await.unwrap();
        assert_eq!(reloaded.email, "ada@lovelace.dev");
        assert_eq!(reloaded.hide_email, 0);
    }

    #[tokio::test]
    async fn edit_cannot_steal_another_accounts_identity() {
        let pool = memory_pool().await;
        register(&pool, input("ada@example.com", "ada")).await.unwrap();
        let eve = register(&pool, input("eve@example.com", "eve")).await.unwrap();

        let update = ProfileUpdate {
            email: "ada@example.com".to_string(),
            username: "eve".to_string(),
            profile_image: None,
            hide_email: true,
        };
        let err = update_profile(&pool, &eve.id, &eve.id, update).await;
        assert!(matches!(err, Err(DomainError::Duplicate(_))));
    }
}

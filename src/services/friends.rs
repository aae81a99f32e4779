use sqlx::SqlitePool;

use crate::database::{account_repo, friend_list_repo};
use crate::error::{DomainError, DomainResult};
use crate::models::AccountRow;

/// A materialized view of one account's confirmed friends.
#[derive(Debug)]
pub struct FriendList {
    pub owner_id: String,
    pub members: Vec<AccountRow>,
}

/// Returns the owner's friend list, creating the empty list row on first
/// access.
pub async fn get_or_create(pool: &SqlitePool, owner_id: &str) -> DomainResult<FriendList> {
    if account_repo::load_account(pool, owner_id).await?.is_none() {
        return Err(DomainError::NotFound("account"));
    }
    let mut tx = pool.begin().await?;
    friend_list_repo::ensure_friend_list(&mut *tx, owner_id).await?;
    tx.commit().await?;

    let members = friend_list_repo::load_members(pool, owner_id).await?;
    Ok(FriendList {
        owner_id: owner_id.to_string(),
        members,
    })
}

/// Adds the friendship in both directions inside one transaction, so the
/// relation is never visible one-sided. Adding an existing friend is a
/// no-op.
pub async fn add_friend(pool: &SqlitePool, owner_id: &str, friend_id: &str) -> DomainResult<()> {
    if owner_id == friend_id {
        return Err(DomainError::SelfReference("cannot friend yourself"));
    }
    if account_repo::load_account(pool, friend_id).await?.is_none() {
        return Err(DomainError::NotFound("account"));
    }

    let mut tx = pool.begin().await?;
    friend_list_repo::ensure_friend_list(&mut *tx, owner_id).await?;
    friend_list_repo::ensure_friend_list(&mut *tx, friend_id).await?;
    friend_list_repo::insert_membership_pair(&mut *tx, owner_id, friend_id).await?;
    tx.commit().await?;
    Ok(())
}

/// Removes the friendship from both sides. Removing someone who is not a
/// friend is a no-op, not an error.
pub async fn unfriend(pool: &SqlitePool, owner_id: &str, friend_id: &str) -> DomainResult<()> {
    let mut tx = pool.begin().await?;
    friend_list_repo::delete_membership_pair(&mut *tx, owner_id, friend_id).await?;
    tx.commit().await?;
    Ok(())
}

/// True only when both sides list each other. A one-sided row would be a
/// bug in the symmetric write path, and this probe reports it as
/// not-friends.
pub async fn is_mutual_friend(
    pool: &SqlitePool,
    owner_id: &str,
    candidate_id: &str,
) -> DomainResult<bool> {
    let forward = friend_list_repo::is_member(pool, owner_id, candidate_id).await?;
    if !forward {
        return Ok(false);
    }
    Ok(friend_list_repo::is_member(pool, candidate_id, owner_id).await?)
}

pub async fn members_of(pool: &SqlitePool, account_id: &str) -> DomainResult<Vec<AccountRow>> {
    if account_repo::load_account(pool, account_id).await?.is_none() {
        return Err(DomainError::NotFound("account"));
    }
    Ok(friend_list_repo::load_members(pool, account_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{memory_pool, seed_account};

    #[tokio::test]
    async fn friendship_is_symmetric() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;
        seed_account(&pool, "b", "bob").await;

        add_friend(&pool, "a", "b").await.unwrap();

        let a_members = members_of(&pool, "a").await.unwrap();
        let b_members = members_of(&pool, "b").await.unwrap();
        assert_eq!(a_members.len(), 1);
        assert_eq!(a_members[0].id, "b");
        assert_eq!(b_members.len(), 1);
        assert_eq!(b_members[0].id, "a");
        assert!(is_mutual_friend(&pool, "a", "b").await.unwrap());
        assert!(is_mutual_friend(&pool, "b", "a").await.unwrap());
    }

    #[tokio::test]
    async fn adding_an_existing_friend_is_a_noop() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;
        seed_account(&pool, "b", "bob").await;

        add_friend(&pool, "a", "b").await.unwrap();
        add_friend(&pool, "a", "b").await.unwrap();
        add_friend(&pool, "b", "a").await.unwrap();

        assert_eq!(members_of(&pool, "a").await.unwrap().len(), 1);
        assert_eq!(members_of(&pool, "b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_friendship_is_rejected() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;

        let err = add_friend(&pool, "a", "a").await;
        assert!(matches!(err, Err(DomainError::SelfReference(_))));
        assert!(members_of(&pool, "a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfriend_removes_both_sides_and_tolerates_strangers() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;
        seed_account(&pool, "b", "bob").await;
        seed_account(&pool, "c", "carol").await;

        add_friend(&pool, "a", "b").await.unwrap();
        unfriend(&pool, "b", "a").await.unwrap();

        assert!(members_of(&pool, "a").await.unwrap().is_empty());
        assert!(members_of(&pool, "b").await.unwrap().is_empty());
        assert!(!is_mutual_friend(&pool, "a", "b").await.unwrap());

        // Not currently friends: a no-op, not an error.
        unfriend(&pool, "a", "c").await.unwrap();
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;

        let first = get_or_create(&pool, "a").await.unwrap();
        assert!(first.members.is_empty());
        let second = get_or_create(&pool, "a").await.unwrap();
        assert_eq!(second.owner_id, "a");
        assert!(second.members.is_empty());

        let err = get_or_create(&pool, "ghost").await;
        assert!(matches!(err, Err(DomainError::NotFound(_))));
    }
}

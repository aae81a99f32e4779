use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{account_repo, friend_list_repo, friend_request_repo};
use crate::error::{DomainError, DomainResult};
use crate::models::{AccountRow, FriendRequestRow};

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_DECLINED: &str = "declined";

/// A pending request joined with its sender, for the requests page.
#[derive(Debug)]
pub struct PendingRequest {
    pub request: FriendRequestRow,
    pub sender: AccountRow,
}

/// Creates a new active request. At most one active request may exist per
/// ordered (sender, receiver) pair; the pre-check gives a typed error and
/// the partial unique index catches the concurrent case.
pub async fn send(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
) -> DomainResult<FriendRequestRow> {
    if sender_id == receiver_id {
        return Err(DomainError::SelfReference(
            "cannot send a friend request to yourself",
        ));
    }
    if account_repo::load_account(pool, receiver_id).await?.is_none() {
        return Err(DomainError::NotFound("account"));
    }
    if friend_request_repo::find_active(pool, sender_id, receiver_id)
        .await?
        .is_some()
    {
        return Err(DomainError::Duplicate("friend request already pending"));
    }

    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();
    let insert = friend_request_repo::insert_request(
        pool,
        friend_request_repo::NewFriendRequest {
            id: &id,
            sender_id,
            receiver_id,
            created_at: &created_at,
        },
    )
    .await;
    match insert {
        Ok(()) => {}
        // Lost the race against another send for the same pair.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(DomainError::Duplicate("friend request already pending"));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(FriendRequestRow {
        id,
        sender_id: sender_id.to_string(),
        receiver_id: receiver_id.to_string(),
        status: STATUS_ACTIVE.to_string(),
        created_at,
        resolved_at: None,
    })
}

/// Sender withdraws their own pending request. The row is retained as
/// history with a `cancelled` disposition.
pub async fn cancel(pool: &SqlitePool, actor_id: &str, request_id: &str) -> DomainResult<FriendRequestRow> {
    let request = load(pool, request_id).await?;
    if request.sender_id != actor_id {
        return Err(DomainError::Permission(
            "only the sender can cancel a friend request",
        ));
    }
    transition(pool, request_id, STATUS_CANCELLED).await
}

/// Receiver declines the request; the sender keeps no standing to retry
/// until they send a fresh one.
pub async fn decline(pool: &SqlitePool, actor_id: &str, request_id: &str) -> DomainResult<FriendRequestRow> {
    let request = load(pool, request_id).await?;
    if request.receiver_id != actor_id {
        return Err(DomainError::Permission(
            "only the receiver can decline a friend request",
        ));
    }
    transition(pool, request_id, STATUS_DECLINED).await
}

/// Receiver accepts the request. Marking the request accepted and writing
/// both sides of the friendship happen in a single transaction, so either
/// everything lands or nothing does.
pub async fn accept(pool: &SqlitePool, actor_id: &str, request_id: &str) -> DomainResult<FriendRequestRow> {
    let request = load(pool, request_id).await?;
    if request.receiver_id != actor_id {
        return Err(DomainError::Permission(
            "only the receiver can accept a friend request",
        ));
    }

    let resolved_at = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    let updated = friend_request_repo::mark_transition(
        &mut *tx,
        request_id,
        STATUS_ACCEPTED,
        &resolved_at,
    )
    .await?;
    if updated == 0 {
        return Err(DomainError::InvalidState("friend request is not active"));
    }
    friend_list_repo::ensure_friend_list(&mut *tx, &request.sender_id).await?;
    friend_list_repo::ensure_friend_list(&mut *tx, &request.receiver_id).await?;
    friend_list_repo::insert_membership_pair(&mut *tx, &request.receiver_id, &request.sender_id)
        .await?;
    tx.commit().await?;

    load(pool, request_id).await
}

pub async fn find_active(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
) -> DomainResult<Option<FriendRequestRow>> {
    Ok(friend_request_repo::find_active(pool, sender_id, receiver_id).await?)
}

/// Active requests addressed to `account_id`, newest first. Viewing is
/// restricted to the account itself.
pub async fn pending_for(
    pool: &SqlitePool,
    actor_id: &str,
    account_id: &str,
) -> DomainResult<Vec<PendingRequest>> {
    if actor_id != account_id {
        return Err(DomainError::Permission(
            "you can only view your own friend requests",
        ));
    }
    let rows = friend_request_repo::list_pending_for_receiver(pool, account_id).await?;
    let mut pending = Vec::with_capacity(rows.len());
    for request in rows {
        let Some(sender) = account_repo::load_account(pool, &request.sender_id).await? else {
            continue;
        };
        pending.push(PendingRequest { request, sender });
    }
    Ok(pending)
}

async fn load(pool: &SqlitePool, request_id: &str) -> DomainResult<FriendRequestRow> {
    friend_request_repo::load_request(pool, request_id)
        .await?
        .ok_or(DomainError::NotFound("friend request"))
}

async fn transition(
    pool: &SqlitePool,
    request_id: &str,
    new_status: &str,
) -> DomainResult<FriendRequestRow> {
    let resolved_at = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    let updated =
        friend_request_repo::mark_transition(&mut *tx, request_id, new_status, &resolved_at).await?;
    if updated == 0 {
        return Err(DomainError::InvalidState("friend request is not active"));
    }
    tx.commit().await?;
    load(pool, request_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::friends;
    use crate::services::testing::{memory_pool, seed_account};

    async fn pair(pool: &SqlitePool) {
        seed_account(pool, "a", "alice").await;
        seed_account(pool, "b", "bob").await;
    }

    #[tokio::test]
    async fn send_creates_an_active_request() {
        let pool = memory_pool().await;
        pair(&pool).await;

        let request = send(&pool, "a", "b").await.unwrap();
        assert_eq!(request.status, STATUS_ACTIVE);

        let found = find_active(&pool, "a", "b").await.unwrap().unwrap();
        assert_eq!(found.id, request.id);
        assert!(find_active(&pool, "b", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn self_and_duplicate_sends_are_rejected() {
        let pool = memory_pool().await;
        pair(&pool).await;

        let err = send(&pool, "a", "a").await;
        assert!(matches!(err, Err(DomainError::SelfReference(_))));

        send(&pool, "a", "b").await.unwrap();
        let err = send(&pool, "a", "b").await;
        assert!(matches!(err, Err(DomainError::Duplicate(_))));

        // The reverse direction is a different ordered pair.
        send(&pool, "b", "a").await.unwrap();
    }

    #[tokio::test]
    async fn accept_makes_both_accounts_friends() {
        let pool = memory_pool().await;
        pair(&pool).await;

        let request = send(&pool, "a", "b").await.unwrap();
        let accepted = accept(&pool, "b", &request.id).await.unwrap();
        assert_eq!(accepted.status, STATUS_ACCEPTED);
        assert!(accepted.resolved_at.is_some());

        assert!(friends::is_mutual_friend(&pool, "a", "b").await.unwrap());
        assert!(find_active(&pool, "a", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn decline_resolves_without_friendship() {
        let pool = memory_pool().await;
        pair(&pool).await;

        let request = send(&pool, "a", "b").await.unwrap();
        let declined = decline(&pool, "b", &request.id).await.unwrap();
        assert_eq!(declined.status, STATUS_DECLINED);
        assert!(!friends::is_mutual_friend(&pool, "a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn cancel_retains_the_request_as_history() {
        let pool = memory_pool().await;
        pair(&pool).await;

        let request = send(&pool, "a", "b").await.unwrap();
        let cancelled = cancel(&pool, "a", &request.id).await.unwrap();
        assert_eq!(cancelled.status, STATUS_CANCELLED);

        // History retained, but no longer active; a fresh send is allowed.
        assert!(find_active(&pool, "a", "b").await.unwrap().is_none());
        send(&pool, "a", "b").await.unwrap();
    }

    #[tokio::test]
    async fn terminal_requests_reject_further_transitions() {
        let pool = memory_pool().await;
        pair(&pool).await;

        let request = send(&pool, "a", "b").await.unwrap();
        accept(&pool, "b", &request.id).await.unwrap();

        let err = accept(&pool, "b", &request.id).await;
        assert!(matches!(err, Err(DomainError::InvalidState(_))));
        let err = decline(&pool, "b", &request.id).await;
        assert!(matches!(err, Err(DomainError::InvalidState(_))));
        let err = cancel(&pool, "a", &request.id).await;
        assert!(matches!(err, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn only_the_right_party_may_transition() {
        let pool = memory_pool().await;
        pair(&pool).await;
        seed_account(&pool, "c", "carol").await;

        let request = send(&pool, "a", "b").await.unwrap();

        let err = accept(&pool, "a", &request.id).await;
        assert!(matches!(err, Err(DomainError::Permission(_))));
        let err = decline(&pool, "c", &request.id).await;
        assert!(matches!(err, Err(DomainError::Permission(_))));
        let err = cancel(&pool, "b", &request.id).await;
        assert!(matches!(err, Err(DomainError::Permission(_))));

        // The request is untouched by the failed attempts.
        let found = find_active(&pool, "a", "b").await.unwrap().unwrap();
        assert_eq!(found.status, STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn pending_listing_is_own_only_and_newest_first() {
        let pool = memory_pool().await;
        pair(&pool).await;
        seed_account(&pool, "c", "carol").await;

        send(&pool, "a", "c").await.unwrap();
        send(&pool, "b", "c").await.unwrap();

        let err = pending_for(&pool, "a", "c").await;
        assert!(matches!(err, Err(DomainError::Permission(_))));

        let pending = pending_for(&pool, "c", "c").await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|p| p.sender.username == "alice"));
        assert!(pending.iter().any(|p| p.sender.username == "bob"));
    }
}

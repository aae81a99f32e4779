use sqlx::SqlitePool;

use crate::database::{friend_list_repo, friend_request_repo};
use crate::error::DomainResult;

/// How a viewer relates to the profile they are looking at. Drives which
/// action the profile page offers (send / cancel / accept-decline / remove).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipStatus {
    SelfProfile,
    Friends,
    RequestSentByViewer,
    RequestSentToViewer,
    NoRelation,
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub status: RelationshipStatus,
    /// Id of the active request, when the status is one of the pending
    /// variants; the page needs it to post cancel/accept/decline.
    pub pending_request_id: Option<String>,
}

impl Relationship {
    pub fn is_self(&self) -> bool {
        self.status == RelationshipStatus::SelfProfile
    }

    fn plain(status: RelationshipStatus) -> Self {
        Relationship {
            status,
            pending_request_id: None,
        }
    }
}

/// Computes the viewer/target relationship. The order of the checks is
/// load-bearing: an established friendship must win over any stale active
/// request record, so membership is probed before the request lookups.
pub async fn resolve(
    pool: &SqlitePool,
    viewer_id: Option<&str>,
    target_id: &str,
) -> DomainResult<Relationship> {
    let Some(viewer_id) = viewer_id else {
        return Ok(Relationship::plain(RelationshipStatus::NoRelation));
    };
    if viewer_id == target_id {
        return Ok(Relationship::plain(RelationshipStatus::SelfProfile));
    }
    if friend_list_repo::is_member(pool, viewer_id, target_id).await? {
        return Ok(Relationship::plain(RelationshipStatus::Friends));
    }
    if let Some(request) = friend_request_repo::find_active(pool, target_id, viewer_id).await? {
        return Ok(Relationship {
            status: RelationshipStatus::RequestSentToViewer,
            pending_request_id: Some(request.id),
        });
    }
    if let Some(request) = friend_request_repo::find_active(pool, viewer_id, target_id).await? {
        return Ok(Relationship {
            status: RelationshipStatus::RequestSentByViewer,
            pending_request_id: Some(request.id),
        });
    }
    Ok(Relationship::plain(RelationshipStatus::NoRelation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{memory_pool, seed_account};
    use crate::services::{friend_requests, friends};

    #[tokio::test]
    async fn anonymous_viewers_are_strangers() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;

        let relationship = resolve(&pool, None, "a").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::NoRelation);
        assert!(!relationship.is_self());
    }

    #[tokio::test]
    async fn own_profile_resolves_to_self() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;

        let relationship = resolve(&pool, Some("a"), "a").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::SelfProfile);
        assert!(relationship.is_self());
    }

    #[tokio::test]
    async fn pending_request_is_directional() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;
        seed_account(&pool, "b", "bob").await;

        let request = friend_requests::send(&pool, "a", "b").await.unwrap();

        let from_sender = resolve(&pool, Some("a"), "b").await.unwrap();
        assert_eq!(from_sender.status, RelationshipStatus::RequestSentByViewer);
        assert_eq!(from_sender.pending_request_id.as_deref(), Some(request.id.as_str()));

        let from_receiver = resolve(&pool, Some("b"), "a").await.unwrap();
        assert_eq!(from_receiver.status, RelationshipStatus::RequestSentToViewer);
        assert_eq!(
            from_receiver.pending_request_id.as_deref(),
            Some(request.id.as_str())
        );
    }

    #[tokio::test]
    async fn accept_then_remove_walks_the_full_lifecycle() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;
        seed_account(&pool, "b", "bob").await;

        let request = friend_requests::send(&pool, "a", "b").await.unwrap();
        friend_requests::accept(&pool, "b", &request.id).await.unwrap();

        let relationship = resolve(&pool, Some("a"), "b").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::Friends);
        let relationship = resolve(&pool, Some("b"), "a").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::Friends);

        friends::unfriend(&pool, "a", "b").await.unwrap();
        let relationship = resolve(&pool, Some("a"), "b").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::NoRelation);
    }

    #[tokio::test]
    async fn friendship_wins_over_a_stale_active_request() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;
        seed_account(&pool, "b", "bob").await;

        // Friendship established directly, with a leftover active request
        // still on file in both directions.
        friend_requests::send(&pool, "a", "b").await.unwrap();
        friend_requests::send(&pool, "b", "a").await.unwrap();
        friends::add_friend(&pool, "a", "b").await.unwrap();

        let relationship = resolve(&pool, Some("a"), "b").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::Friends);
        assert!(relationship.pending_request_id.is_none());
        let relationship = resolve(&pool, Some("b"), "a").await.unwrap();
        assert_eq!(relationship.status, RelationshipStatus::Friends);
    }
}

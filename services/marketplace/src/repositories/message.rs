//! Message repository for database operations

use chrono::Utc;
use common::error::DatabaseResult;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::models::MessageDetail;

/// Message repository
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a message inside an open transaction, returning it with participant names
    pub async fn insert(
        conn: &mut SqliteConnection,
        sender_id: i64,
        receiver_id: i64,
        listing_id: i64,
        content: &str,
    ) -> DatabaseResult<MessageDetail> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, listing_id, content, timestamp)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(listing_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        info!(
            "Stored message {} from user {} to user {} about listing {}",
            id, sender_id, receiver_id, listing_id
        );

        let message = sqlx::query_as::<_, MessageDetail>(
            r#"
            SELECT m.id, m.sender_id, m.receiver_id, m.listing_id, m.content, m.timestamp,
                   s.username AS sender, r.username AS receiver
            FROM messages m
            JOIN users s ON s.id = m.sender_id
            JOIN users r ON r.id = m.receiver_id
            WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(message)
    }

    /// Every message a user sent or received, newest first
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<MessageDetail>> {
        let messages = sqlx::query_as::<_, MessageDetail>(
            r#"
            SELECT m.id, m.sender_id, m.receiver_id, m.listing_id, m.content, m.timestamp,
                   s.username AS sender, r.username AS receiver
            FROM messages m
            JOIN users s ON s.id = m.sender_id
            JOIN users r ON r.id = m.receiver_id
            WHERE m.sender_id = ? OR m.receiver_id = ?
            ORDER BY m.timestamp DESC, m.id DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingFields, NewListing, NewUser};
    use crate::repositories::{ListingRepository, UserRepository, test_pool};

    async fn user(pool: &SqlitePool, name: &str) -> i64 {
        let new_user = NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password: "unused".to_string(),
        };
        UserRepository::new(pool.clone())
            .create(&new_user, "$argon2id$placeholder")
            .await
            .unwrap()
            .id
    }

    async fn listing(pool: &SqlitePool, seller_id: i64) -> i64 {
        let new_listing = NewListing {
            fields: ListingFields {
                title: "Lamp".to_string(),
                description: "Desk lamp".to_string(),
                price: 15.0,
                is_rental: false,
                rental_duration: None,
                category: None,
            },
            images: Vec::new(),
            video: None,
            seller_id,
        };
        let mut conn = pool.acquire().await.unwrap();
        ListingRepository::insert(&mut conn, &new_listing).await.unwrap()
    }

    #[tokio::test]
    async fn test_thread_visible_to_both_parties_newest_first() {
        let pool = test_pool().await;
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let carol = user(&pool, "carol").await;
        let lamp = listing(&pool, bob).await;
        let repo = MessageRepository::new(pool.clone());

        let mut conn = pool.acquire().await.unwrap();
        let first = MessageRepository::insert(&mut conn, alice, bob, lamp, "Still available?")
            .await
            .unwrap();
        let second = MessageRepository::insert(&mut conn, bob, alice, lamp, "Yes")
            .await
            .unwrap();
        drop(conn);

        assert_eq!(first.sender, "alice");
        assert_eq!(first.receiver, "bob");

        let for_alice: Vec<i64> = repo
            .list_for_user(alice)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        let for_bob: Vec<i64> = repo
            .list_for_user(bob)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();

        assert_eq!(for_alice, vec![second.id, first.id]);
        assert_eq!(for_bob, vec![second.id, first.id]);
        assert!(repo.list_for_user(carol).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_listing_violates_foreign_key() {
        let pool = test_pool().await;
        let alice = user(&pool, "alice").await;

        let mut conn = pool.acquire().await.unwrap();
        let err = MessageRepository::insert(&mut conn, alice, alice, 999, "hello")
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }
}

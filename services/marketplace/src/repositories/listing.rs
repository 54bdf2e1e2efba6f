//! Listing repository for database operations

use chrono::Utc;
use common::error::DatabaseResult;
use sqlx::{SqliteConnection, SqlitePool, types::Json};
use tracing::info;

use crate::models::{ListingDetail, ListingSummary, NewListing};

const DETAIL_QUERY: &str = r#"
    SELECT l.id, l.title, l.description, l.price, l.is_rental, l.rental_duration,
           l.images, l.video, l.category, l.seller_id, u.username AS seller,
           l.created_at, l.is_available
    FROM listings l
    JOIN users u ON u.id = l.seller_id
    WHERE l.id = ?
"#;

/// Listing repository
#[derive(Clone)]
pub struct ListingRepository {
    pool: SqlitePool,
}

impl ListingRepository {
    /// Create a new listing repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a listing inside an open transaction, returning its ID
    pub async fn insert(conn: &mut SqliteConnection, listing: &NewListing) -> DatabaseResult<i64> {
        let fields = &listing.fields;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO listings (title, description, price, is_rental, rental_duration,
                                  images, video, category, seller_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.is_rental)
        .bind(fields.rental_duration)
        .bind(Json(&listing.images))
        .bind(&listing.video)
        .bind(&fields.category)
        .bind(listing.seller_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        info!("Created listing {} for seller {}", id, listing.seller_id);
        Ok(id)
    }

    /// Check a listing ID inside an open transaction
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> DatabaseResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(found.is_some())
    }

    /// Load a listing with its seller name on a specific connection
    pub async fn fetch_detail(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> DatabaseResult<Option<ListingDetail>> {
        let listing = sqlx::query_as::<_, ListingDetail>(DETAIL_QUERY)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(listing)
    }

    /// Get a listing by ID
    pub async fn find_detail(&self, id: i64) -> DatabaseResult<Option<ListingDetail>> {
        let listing = sqlx::query_as::<_, ListingDetail>(DETAIL_QUERY)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    /// Get all listings in storage order
    pub async fn list_all(&self) -> DatabaseResult<Vec<ListingSummary>> {
        let listings = sqlx::query_as::<_, ListingSummary>(
            r#"
            SELECT l.id, l.title, l.description, l.price, l.is_rental, l.category,
                   l.seller_id, u.username AS seller, l.created_at, l.is_available
            FROM listings l
            JOIN users u ON u.id = l.seller_id
            ORDER BY l.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingFields, NewUser};
    use crate::repositories::{UserRepository, test_pool};

    async fn seller(pool: &SqlitePool) -> i64 {
        let user = NewUser {
            username: "seller".to_string(),
            email: "seller@example.com".to_string(),
            password: "unused".to_string(),
        };
        UserRepository::new(pool.clone())
            .create(&user, "$argon2id$placeholder")
            .await
            .unwrap()
            .id
    }

    fn bike(seller_id: i64) -> NewListing {
        NewListing {
            fields: ListingFields {
                title: "Bike".to_string(),
                description: "A red bike".to_string(),
                price: 120.5,
                is_rental: true,
                rental_duration: Some(48),
                category: Some("sports".to_string()),
            },
            images: vec!["1_a.png".to_string(), "1_b.jpg".to_string()],
            video: Some("1_c.mp4".to_string()),
            seller_id,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_detail() {
        let pool = test_pool().await;
        let seller_id = seller(&pool).await;
        let repo = ListingRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let id = ListingRepository::insert(&mut tx, &bike(seller_id)).await.unwrap();
        tx.commit().await.unwrap();

        let detail = repo.find_detail(id).await.unwrap().unwrap();
        assert_eq!(detail.title, "Bike");
        assert_eq!(detail.seller, "seller");
        assert_eq!(detail.images, vec!["1_a.png", "1_b.jpg"]);
        assert_eq!(detail.video.as_deref(), Some("1_c.mp4"));
        assert_eq!(detail.rental_duration, Some(48));
        assert!(detail.is_available);
    }

    #[tokio::test]
    async fn test_rolled_back_insert_leaves_no_row() {
        let pool = test_pool().await;
        let seller_id = seller(&pool).await;
        let repo = ListingRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let id = ListingRepository::insert(&mut tx, &bike(seller_id)).await.unwrap();
        assert!(ListingRepository::exists(&mut tx, id).await.unwrap());
        tx.rollback().await.unwrap();

        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_seller_is_rejected() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let err = ListingRepository::insert(&mut conn, &bike(404)).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_list_all_in_id_order() {
        let pool = test_pool().await;
        let seller_id = seller(&pool).await;
        let repo = ListingRepository::new(pool.clone());

        let mut conn = pool.acquire().await.unwrap();
        let first = ListingRepository::insert(&mut conn, &bike(seller_id)).await.unwrap();
        let second = ListingRepository::insert(&mut conn, &bike(seller_id)).await.unwrap();
        drop(conn);

        let ids: Vec<i64> = repo.list_all().await.unwrap().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(repo.find_detail(second + 1).await.unwrap().is_none());
    }
}

//! Listing models for the marketplace

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Raw text fields collected from a listing creation form
#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub is_rental: Option<String>,
    pub rental_duration: Option<String>,
    pub category: Option<String>,
}

/// Validated scalar fields of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub is_rental: bool,
    /// Hours; always `None` for non-rental listings
    pub rental_duration: Option<i64>,
    pub category: Option<String>,
}

/// Listing ready to be inserted
#[derive(Debug, Clone)]
pub struct NewListing {
    pub fields: ListingFields,
    /// Stored upload names, in submission order
    pub images: Vec<String>,
    pub video: Option<String>,
    pub seller_id: i64,
}

/// Listing as shown in the catalogue
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ListingSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub is_rental: bool,
    pub category: Option<String>,
    pub seller_id: i64,
    pub seller: String,
    pub created_at: DateTime<Utc>,
    pub is_available: bool,
}

/// Full listing detail including attachments
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ListingDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub is_rental: bool,
    pub rental_duration: Option<i64>,
    #[sqlx(json)]
    pub images: Vec<String>,
    pub video: Option<String>,
    pub category: Option<String>,
    pub seller_id: i64,
    pub seller: String,
    pub created_at: DateTime<Utc>,
    pub is_available: bool,
}

//! Message models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Request for sending a message about a listing
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    pub receiver_id: Option<i64>,
    pub listing_id: Option<i64>,
    pub content: Option<String>,
}

/// Message annotated with sender and receiver display names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MessageDetail {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub listing_id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub receiver: String,
}

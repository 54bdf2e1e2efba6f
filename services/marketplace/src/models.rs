//! Marketplace models for database rows and request/response payloads

pub mod listing;
pub mod message;
pub mod session;
pub mod user;

// Re-export for convenience
pub use listing::{ListingDetail, ListingFields, ListingForm, ListingSummary, NewListing};
pub use message::{MessageDetail, SendMessageRequest};
pub use session::Session;
pub use user::{LoginRequest, LoginResponse, NewUser, RegisterRequest, User, UserResponse};

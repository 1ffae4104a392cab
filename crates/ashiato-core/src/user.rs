//! User accounts. Credentials are verified by the server crate; the core only
//! carries the stored hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:           Uuid,
  pub username:          String,
  pub email:             String,
  /// Argon2 PHC string.
  #[serde(skip_serializing, default)]
  pub password_hash:     String,
  pub profile_image_url: Option<String>,
  pub bio:               String,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

//! Account handlers: registration, login and the current user.
//!
//! | Method | Path             | Notes |
//! |--------|------------------|-------|
//! | `POST` | `/auth/register` | Body: [`RegisterBody`]; returns 201 + [`AuthResponse`] |
//! | `POST` | `/auth/login`    | Body: [`LoginBody`]; returns [`AuthResponse`] |
//! | `GET`  | `/me`            | The signed-in user |

use ashiato_api::Viewer;
use ashiato_core::{
  store::{Deadline, FriendshipStore, PinStore, UserStore, bounded, committed},
  user::User,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{hash_password, issue_token, verify_password},
  error::Error,
};

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub email:    String,
  pub password: String,
}

impl RegisterBody {
  /// Trim the username, lowercase the email and check lengths.
  fn validate(self) -> Result<Self, Error> {
    let username = self.username.trim().to_string();
    let email = self.email.trim().to_lowercase();

    if !USERNAME_LEN.contains(&username.chars().count()) {
      return Err(Error::BadRequest("username must be 3 to 32 characters".into()));
    }
    if !email.contains('@') {
      return Err(Error::BadRequest("email address is invalid".into()));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::BadRequest(format!(
        "password must be at least {MIN_PASSWORD_LEN} characters"
      )));
    }
    Ok(Self { username, email, password: self.password })
  }
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub user:  User,
  pub token: String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: PinStore + FriendshipStore + UserStore,
{
  let body = body.validate()?;
  let now = ashiato_core::now();
  let user = User {
    user_id:           Uuid::new_v4(),
    username:          body.username,
    email:             body.email,
    password_hash:     hash_password(&body.password)?,
    profile_image_url: None,
    bio:               String::new(),
    created_at:        now,
    updated_at:        now,
  };

  let inserted = committed(
    "insert_user",
    state.store.insert_user(user.clone(), Deadline::after(state.storage_timeout)),
  )
  .await?;
  if !inserted {
    return Err(Error::Conflict("username or email already registered".into()));
  }

  tracing::info!(user = %user.user_id, username = %user.username, "registered user");
  let token = issue_token(&state.auth, user.user_id, &user.username)?;
  Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, Error>
where
  S: PinStore + FriendshipStore + UserStore,
{
  let email = body.email.trim().to_lowercase();
  let user = bounded(
    state.storage_timeout,
    "find_user_by_email",
    state.store.find_user_by_email(&email),
  )
  .await?
  .ok_or(Error::Unauthorized)?;

  verify_password(&body.password, &user.password_hash)?;

  let token = issue_token(&state.auth, user.user_id, &user.username)?;
  Ok(Json(AuthResponse { user, token }))
}

/// `GET /me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  Viewer(viewer): Viewer,
) -> Result<Json<User>, Error>
where
  S: PinStore + FriendshipStore + UserStore,
{
  bounded(state.storage_timeout, "get_user", state.store.get_user(viewer))
    .await?
    .map(Json)
    .ok_or(Error::NotFound)
}

//! Handlers for `/pins` endpoints.
//!
//! | Method   | Path         | Notes |
//! |----------|--------------|-------|
//! | `GET`    | `/pins`      | `?sw_lat&sw_lng&ne_lat&ne_lng` required; optional `privacy` |
//! | `POST`   | `/pins`      | Body: [`NewPinBody`]; returns 201 + stored pin |
//! | `DELETE` | `/pins/:id`  | Soft-removes one of the viewer's pins; returns 204 |

use std::sync::Arc;

use ashiato_core::{
  Engine,
  geo::Viewport,
  pin::{NewPin, Pin, PrivacyMode},
  store::{FriendshipStore, PinStore},
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

// ─── List ─────────────────────────────────────────────────────────────────────

/// South-west and north-east corners of the map viewport.
#[derive(Debug, Deserialize)]
pub struct ViewportParams {
  pub sw_lat:  f64,
  pub sw_lng:  f64,
  pub ne_lat:  f64,
  pub ne_lng:  f64,
  /// Narrows the result to one privacy mode. Defaults to `public`.
  pub privacy: Option<PrivacyMode>,
}

impl ViewportParams {
  pub fn viewport(&self) -> Result<Viewport, ApiError> {
    Ok(Viewport::new(self.sw_lat, self.ne_lat, self.sw_lng, self.ne_lng)?)
  }
}

#[derive(Debug, Serialize)]
pub struct PinList {
  pub pins: Vec<Pin>,
}

/// `GET /pins?sw_lat=..&sw_lng=..&ne_lat=..&ne_lng=..[&privacy=friends]`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Query(params): Query<ViewportParams>,
) -> Result<Json<PinList>, ApiError>
where
  S: PinStore + FriendshipStore,
{
  let pins = engine
    .resolver
    .pins_visible_to(viewer, params.viewport()?, params.privacy)
    .await?;
  Ok(Json(PinList { pins }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewPinBody {
  pub latitude:        f64,
  pub longitude:       f64,
  #[serde(default)]
  pub content_text:    String,
  pub media_url:       Option<String>,
  #[serde(default)]
  pub privacy_setting: PrivacyMode,
}

impl From<NewPinBody> for NewPin {
  fn from(body: NewPinBody) -> Self {
    NewPin {
      latitude:        body.latitude,
      longitude:       body.longitude,
      content_text:    body.content_text,
      media_url:       body.media_url,
      privacy_setting: body.privacy_setting,
    }
  }
}

/// `POST /pins`
pub async fn create<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Json(body): Json<NewPinBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PinStore + FriendshipStore,
{
  let pin = engine.pins.post(viewer, body.into()).await?;
  Ok((StatusCode::CREATED, Json(pin)))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /pins/:id`
pub async fn remove<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PinStore + FriendshipStore,
{
  engine.pins.remove(viewer, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

//! Visibility resolver: which pins a viewer may see inside a viewport.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Result,
  friendship::FriendshipStatus,
  geo::Viewport,
  pin::{Pin, PinStatus, PrivacyMode},
  store::{PinCandidate, PinStore, bounded},
};

/// Authorization rule, independent of any display filter.
///
/// Authors always see their own pins; public pins are visible to everyone;
/// friends-only pins need an accepted friendship with the author.
pub fn is_authorized(viewer: Uuid, pin: &Pin, friendship: Option<FriendshipStatus>) -> bool {
  if pin.owner_id == viewer {
    return true;
  }
  match pin.privacy_setting {
    PrivacyMode::Public => true,
    PrivacyMode::Friends => friendship == Some(FriendshipStatus::Accepted),
  }
}

/// Filter and order candidate rows returned by a store.
///
/// Every rule is re-applied here regardless of what the store already
/// filtered. Output is newest first, ties broken by descending id.
pub fn select_visible(
  viewer: Uuid,
  viewport: &Viewport,
  privacy_filter: PrivacyMode,
  candidates: Vec<PinCandidate>,
) -> Vec<Pin> {
  let mut pins: Vec<Pin> = candidates
    .into_iter()
    .filter(|c| {
      c.pin.status == PinStatus::Active
        && c.pin.privacy_setting == privacy_filter
        && viewport.contains(&c.pin.coordinate)
        && is_authorized(viewer, &c.pin, c.friendship)
    })
    .map(|c| c.pin)
    .collect();

  pins.sort_by(|a, b| {
    b.created_at
      .cmp(&a.created_at)
      .then_with(|| b.pin_id.cmp(&a.pin_id))
  });
  pins
}

pub struct VisibilityResolver<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S> Clone for VisibilityResolver<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), timeout: self.timeout } }
}

impl<S: PinStore> VisibilityResolver<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// Every pin inside `viewport` that `viewer` may see, newest first.
  ///
  /// `privacy_filter` narrows the result to pins with that privacy mode and
  /// defaults to [`PrivacyMode::Public`]. It never grants access.
  pub async fn pins_visible_to(
    &self,
    viewer: Uuid,
    viewport: Viewport,
    privacy_filter: Option<PrivacyMode>,
  ) -> Result<Vec<Pin>> {
    let filter = privacy_filter.unwrap_or_default();

    let candidates = bounded(
      self.timeout,
      "pins_in_viewport",
      self.store.pins_in_viewport(viewer, viewport, filter),
    )
    .await?;

    let fetched = candidates.len();
    let pins = select_visible(viewer, &viewport, filter, candidates);
    tracing::debug!(%viewer, %filter, fetched, visible = pins.len(), "resolved viewport");
    Ok(pins)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration as TimeDelta, Utc};

  use super::*;
  use crate::geo::Coordinate;

  fn pin(owner: Uuid, lat: f64, lng: f64, privacy: PrivacyMode) -> Pin {
    Pin {
      pin_id:          Uuid::new_v4(),
      owner_id:        owner,
      coordinate:      Coordinate { latitude: lat, longitude: lng },
      content_text:    "hello".into(),
      media_url:       None,
      privacy_setting: privacy,
      status:          PinStatus::Active,
      created_at:      Utc::now(),
    }
  }

  fn candidate(pin: Pin, friendship: Option<FriendshipStatus>) -> PinCandidate {
    PinCandidate { pin, friendship }
  }

  fn tokyo() -> Viewport { Viewport::new(35.0, 36.0, 139.0, 140.0).unwrap() }

  #[test]
  fn owner_always_authorized() {
    let owner = Uuid::new_v4();
    let p = pin(owner, 35.5, 139.5, PrivacyMode::Friends);
    assert!(is_authorized(owner, &p, None));
  }

  #[test]
  fn friends_pin_requires_accepted() {
    let viewer = Uuid::new_v4();
    let p = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Friends);

    assert!(!is_authorized(viewer, &p, None));
    assert!(!is_authorized(viewer, &p, Some(FriendshipStatus::Pending)));
    assert!(!is_authorized(viewer, &p, Some(FriendshipStatus::Blocked)));
    assert!(is_authorized(viewer, &p, Some(FriendshipStatus::Accepted)));
  }

  #[test]
  fn public_pin_visible_to_strangers() {
    let p = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Public);
    assert!(is_authorized(Uuid::new_v4(), &p, None));
  }

  #[test]
  fn drops_rows_outside_viewport() {
    let viewer = Uuid::new_v4();
    let inside = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Public);
    let outside = pin(Uuid::new_v4(), 34.7, 135.5, PrivacyMode::Public);

    let out = select_visible(
      viewer,
      &tokyo(),
      PrivacyMode::Public,
      vec![candidate(inside.clone(), None), candidate(outside, None)],
    );
    assert_eq!(out, vec![inside]);
  }

  #[test]
  fn filter_narrows_but_never_widens() {
    let viewer = Uuid::new_v4();
    let public = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Public);
    let stranger_friends_only = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Friends);
    let friend_friends_only = pin(Uuid::new_v4(), 35.6, 139.6, PrivacyMode::Friends);

    let rows = || {
      vec![
        candidate(public.clone(), None),
        candidate(stranger_friends_only.clone(), None),
        candidate(friend_friends_only.clone(), Some(FriendshipStatus::Accepted)),
      ]
    };

    let publics = select_visible(viewer, &tokyo(), PrivacyMode::Public, rows());
    assert_eq!(publics, vec![public.clone()]);

    let friends = select_visible(viewer, &tokyo(), PrivacyMode::Friends, rows());
    assert_eq!(friends, vec![friend_friends_only.clone()]);
  }

  #[test]
  fn removed_pins_are_hidden() {
    let owner = Uuid::new_v4();
    let mut p = pin(owner, 35.5, 139.5, PrivacyMode::Public);
    p.status = PinStatus::Removed;

    assert!(select_visible(owner, &tokyo(), PrivacyMode::Public, vec![candidate(p, None)]).is_empty());
  }

  #[test]
  fn newest_first() {
    let viewer = Uuid::new_v4();
    let now = Utc::now();
    let mut old = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Public);
    old.created_at = now - TimeDelta::hours(2);
    let mut mid = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Public);
    mid.created_at = now - TimeDelta::hours(1);
    let mut new = pin(Uuid::new_v4(), 35.5, 139.5, PrivacyMode::Public);
    new.created_at = now;

    let out = select_visible(
      viewer,
      &tokyo(),
      PrivacyMode::Public,
      vec![candidate(mid.clone(), None), candidate(old.clone(), None), candidate(new.clone(), None)],
    );
    assert_eq!(out, vec![new, mid, old]);
  }
}

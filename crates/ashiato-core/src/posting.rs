//! The post-creation flow: gate, then insert.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Error, Result,
  gate::{GateConfig, check_drift},
  geo::Coordinate,
  pin::{NewPin, Pin, PinStatus},
  store::{Deadline, PinStore, bounded, committed},
};

pub struct PinService<S> {
  store:   Arc<S>,
  gate:    GateConfig,
  timeout: Duration,
}

impl<S> Clone for PinService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), gate: self.gate, timeout: self.timeout }
  }
}

impl<S: PinStore> PinService<S> {
  pub fn new(store: Arc<S>, gate: GateConfig, timeout: Duration) -> Self {
    Self { store, gate, timeout }
  }

  /// Create a pin for `owner`.
  ///
  /// The drift check runs against the most recent pin inside the same store
  /// transaction as the insert, so consecutive posts by one user are
  /// serialised. On [`Error::StorageUnavailable`] no pin was stored.
  pub async fn post(&self, owner: Uuid, input: NewPin) -> Result<Pin> {
    let coordinate = Coordinate::new(input.latitude, input.longitude)?;

    let pin = Pin {
      pin_id: Uuid::new_v4(),
      owner_id: owner,
      coordinate,
      content_text: input.content_text,
      media_url: input.media_url.filter(|url| !url.trim().is_empty()),
      privacy_setting: input.privacy_setting,
      status: PinStatus::Active,
      created_at: crate::now(),
    };

    let gate = self.gate;
    let verdict = committed(
      "insert_pin_guarded",
      self.store.insert_pin_guarded(
        pin,
        move |previous| check_drift(&gate, previous, &coordinate),
        Deadline::after(self.timeout),
      ),
    )
    .await?;

    match verdict {
      Ok(pin) => {
        tracing::info!(pin_id = %pin.pin_id, %owner, privacy = %pin.privacy_setting, "pin created");
        Ok(pin)
      }
      Err(e) => {
        tracing::warn!(
          %owner,
          latitude = coordinate.latitude,
          longitude = coordinate.longitude,
          "pin rejected: {e}"
        );
        Err(e)
      }
    }
  }

  /// Soft-delete one of `owner`'s pins. Pins owned by someone else are
  /// reported as not found.
  pub async fn remove(&self, owner: Uuid, pin_id: Uuid) -> Result<()> {
    let pin = bounded(self.timeout, "get_pin", self.store.get_pin(pin_id))
      .await?
      .filter(|pin| pin.owner_id == owner)
      .ok_or_else(|| Error::not_found("pin", pin_id))?;

    if pin.status == PinStatus::Removed {
      return Ok(());
    }

    let updated = committed(
      "set_pin_status",
      self
        .store
        .set_pin_status(pin_id, PinStatus::Removed, Deadline::after(self.timeout)),
    )
    .await?;

    if !updated {
      return Err(Error::not_found("pin", pin_id));
    }
    tracing::info!(%pin_id, %owner, "pin removed");
    Ok(())
  }
}

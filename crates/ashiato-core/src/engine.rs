//! [`Engine`] bundles the services over one shared store.

use std::{sync::Arc, time::Duration};

use crate::{
  comment::CommentService,
  gate::{GateConfig, LocationGate},
  oracle::FriendshipOracle,
  posting::PinService,
  store::{CommentStore, FriendshipStore, PinStore},
  visibility::VisibilityResolver,
};

/// Default deadline for a single store call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Explicit configuration for every service; nothing is read from the
/// environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
  pub gate:            GateConfig,
  pub storage_timeout: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { gate: GateConfig::default(), storage_timeout: DEFAULT_STORAGE_TIMEOUT }
  }
}

pub struct Engine<S> {
  pub gate:     LocationGate<S>,
  pub resolver: VisibilityResolver<S>,
  pub oracle:   FriendshipOracle<S>,
  pub pins:     PinService<S>,
  pub comments: CommentService<S>,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self {
    Self {
      gate:     self.gate.clone(),
      resolver: self.resolver.clone(),
      oracle:   self.oracle.clone(),
      pins:     self.pins.clone(),
      comments: self.comments.clone(),
    }
  }
}

impl<S: PinStore + FriendshipStore + CommentStore> Engine<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
    let timeout = config.storage_timeout;
    Self {
      gate:     LocationGate::new(Arc::clone(&store), config.gate, timeout),
      resolver: VisibilityResolver::new(Arc::clone(&store), timeout),
      oracle:   FriendshipOracle::new(Arc::clone(&store), timeout),
      pins:     PinService::new(Arc::clone(&store), config.gate, timeout),
      comments: CommentService::new(store, timeout),
    }
  }
}

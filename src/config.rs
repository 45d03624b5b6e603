//! Connection configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hub::ReconnectPolicy;

/// Automatic-reconnect directive.
///
/// With the `serde` feature it is written either as a boolean or as an array
/// of retry delays in milliseconds, e.g. `"auto_reconnect": [0, 1000, 5000]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "AutoReconnectRepr", into = "AutoReconnectRepr"))]
pub enum AutoReconnect {
  #[default]
  Disabled,
  /// Reconnect with the client's default schedule.
  Enabled,
  /// Reconnect waiting the given milliseconds before each attempt.
  Delays(Vec<u64>),
}

impl AutoReconnect {
  pub fn is_enabled(&self) -> bool { !matches!(self, AutoReconnect::Disabled) }

  /// The policy to build the hub client with, `None` when disabled.
  pub fn policy(&self) -> Option<ReconnectPolicy> {
    match self {
      AutoReconnect::Disabled => None,
      AutoReconnect::Enabled => Some(ReconnectPolicy::Default),
      AutoReconnect::Delays(delays) => Some(ReconnectPolicy::Delays(
        delays.iter().map(|ms| Duration::from_millis(*ms)).collect(),
      )),
    }
  }
}

impl From<bool> for AutoReconnect {
  fn from(enabled: bool) -> Self {
    if enabled { AutoReconnect::Enabled } else { AutoReconnect::Disabled }
  }
}

impl From<Vec<u64>> for AutoReconnect {
  fn from(delays: Vec<u64>) -> Self { AutoReconnect::Delays(delays) }
}

#[cfg(feature = "serde")]
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AutoReconnectRepr {
  Flag(bool),
  Delays(Vec<u64>),
}

#[cfg(feature = "serde")]
impl From<AutoReconnectRepr> for AutoReconnect {
  fn from(repr: AutoReconnectRepr) -> Self {
    match repr {
      AutoReconnectRepr::Flag(enabled) => enabled.into(),
      AutoReconnectRepr::Delays(delays) => delays.into(),
    }
  }
}

#[cfg(feature = "serde")]
impl From<AutoReconnect> for AutoReconnectRepr {
  fn from(directive: AutoReconnect) -> Self {
    match directive {
      AutoReconnect::Disabled => AutoReconnectRepr::Flag(false),
      AutoReconnect::Enabled => AutoReconnectRepr::Flag(true),
      AutoReconnect::Delays(delays) => AutoReconnectRepr::Delays(delays),
    }
  }
}

/// Everything needed to build a hub connection. Read-only once the adapter
/// owns it.
///
/// `O` is the client's own connection-options type; it is passed through
/// without being looked at.
///
/// ```rust
/// use srrx::config::{AutoReconnect, SrrxConfig};
///
/// let config = SrrxConfig::<()>::new("https://example.com/hubs/chat")
///   .with_auto_reconnect(vec![0, 1_000, 5_000]);
/// assert_eq!(config.auto_reconnect, AutoReconnect::Delays(vec![0, 1_000, 5_000]));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SrrxConfig<O = ()> {
  pub url: String,
  #[cfg_attr(feature = "serde", serde(default))]
  pub auto_reconnect: AutoReconnect,
  #[cfg_attr(feature = "serde", serde(default))]
  pub connection: O,
}

impl<O: Default> SrrxConfig<O> {
  pub fn new(url: impl Into<String>) -> Self {
    Self { url: url.into(), auto_reconnect: AutoReconnect::default(), connection: O::default() }
  }
}

impl<O> SrrxConfig<O> {
  pub fn with_auto_reconnect(mut self, auto_reconnect: impl Into<AutoReconnect>) -> Self {
    self.auto_reconnect = auto_reconnect.into();
    self
  }

  /// Replaces the pass-through connection options.
  pub fn with_connection<T>(self, connection: T) -> SrrxConfig<T> {
    SrrxConfig { url: self.url, auto_reconnect: self.auto_reconnect, connection }
  }
}

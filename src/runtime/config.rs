// src/runtime/config.rs

use crate::error::EventletError;

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

/// Environment variable read when the runtime is not configured explicitly.
pub const FAILURE_POLICY_ENV: &str = "EVENTLETS_FAILURE_POLICY";

const ALREADY_CONFIGURED_ERROR_MSG: &str = "eventlet runtime already configured";

/// What happens when an eventlet's work panics or returns `Err`.
///
/// The outcome is always recorded on the handle (see `Eventlet::outcome`);
/// the policy only decides who else hears about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
  /// Log the failure at `error` level and keep the hub running.
  #[default]
  Log,
  /// Record the failure and log it at `debug` level only.
  Ignore,
  /// Re-raise the failure as a panic into whoever resumed the eventlet,
  /// usually the hub callback. `ManualHub` lets it unwind out of `tick`;
  /// `TokioHub` keeps it until `#[eventlets::main]` or `#[eventlets::test]`
  /// re-raises it after the body returns (see
  /// [`resume_escaped_panic`](super::resume_escaped_panic)).
  Propagate,
}

impl FromStr for FailurePolicy {
  type Err = EventletError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "log" => Ok(FailurePolicy::Log),
      "ignore" => Ok(FailurePolicy::Ignore),
      "propagate" => Ok(FailurePolicy::Propagate),
      other => Err(EventletError::InvalidConfig(format!("unknown failure policy '{}'", other))),
    }
  }
}

impl fmt::Display for FailurePolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FailurePolicy::Log => "log",
      FailurePolicy::Ignore => "ignore",
      FailurePolicy::Propagate => "propagate",
    };
    f.write_str(name)
  }
}

/// Process-wide defaults for eventlets. Individual eventlets can override
/// them through `Eventlet::builder`.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
  /// Applied to every eventlet that does not set its own policy.
  pub failure_policy: FailurePolicy,
}

impl RuntimeConfig {
  /// Defaults, overridden by `EVENTLETS_FAILURE_POLICY` when it is set.
  /// An unparseable value is reported and ignored.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(raw) = std::env::var(FAILURE_POLICY_ENV) {
      match raw.parse::<FailurePolicy>() {
        Ok(policy) => config.failure_policy = policy,
        Err(e) => warn!(env = FAILURE_POLICY_ENV, value = %raw, error = %e, "Ignoring invalid runtime setting"),
      }
    }
    config
  }
}

static RUNTIME_CONFIG: OnceCell<RuntimeConfig> = OnceCell::new();

/// Sets the process-wide configuration. Must happen before the first eventlet
/// is created; afterwards the configuration is frozen.
pub fn configure(config: RuntimeConfig) -> Result<(), EventletError> {
  info!(failure_policy = %config.failure_policy, "Configuring eventlet runtime");
  RUNTIME_CONFIG.set(config).map_err(|_| {
    warn!("{}", ALREADY_CONFIGURED_ERROR_MSG);
    EventletError::InvalidState(ALREADY_CONFIGURED_ERROR_MSG)
  })
}

/// The active configuration, resolved from the environment on first use if
/// [`configure`] was never called.
pub fn current() -> &'static RuntimeConfig {
  RUNTIME_CONFIG.get_or_init(RuntimeConfig::from_env)
}

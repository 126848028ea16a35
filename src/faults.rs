//! Substitution policy for per-frame scalars that fail to compute.
//!
//! Every scalar stream of the tracker (heading, axis lengths, ...) owns one
//! [`ScalarGuard`]. A fault never escapes the frame it happened in: the guard
//! publishes the configured substitute and counts the fault.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Publish `NaN`.
    #[default]
    Nan,
    /// Publish `0.0`.
    Zero,
    /// Publish the last good value (`NaN` before the first one).
    RepeatLast,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ScalarFault {
    #[error("{name} is not finite ({value})")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} is undefined: {reason}")]
    Undefined {
        name: &'static str,
        reason: &'static str,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GuardedValue {
    pub value: f64,
    pub faulted: bool,
}

#[derive(Clone, Debug)]
pub struct ScalarGuard {
    name: &'static str,
    policy: FaultPolicy,
    last_good: Option<f64>,
    faults: usize,
}

impl ScalarGuard {
    pub fn new(name: &'static str, policy: FaultPolicy) -> Self {
        Self {
            name,
            policy,
            last_good: None,
            faults: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> FaultPolicy {
        self.policy
    }

    /// `Err(NonFinite)` for `NaN` and infinities.
    pub fn check(&self, value: f64) -> Result<f64, ScalarFault> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ScalarFault::NonFinite {
                name: self.name,
                value,
            })
        }
    }

    /// Pass good values through and substitute faults.
    pub fn apply(&mut self, value: Result<f64, ScalarFault>) -> GuardedValue {
        match value.and_then(|v| self.check(v)) {
            Ok(v) => {
                self.last_good = Some(v);
                GuardedValue {
                    value: v,
                    faulted: false,
                }
            }
            Err(fault) => {
                self.faults += 1;
                let value = self.substitute();
                match fault {
                    ScalarFault::NonFinite { .. } => {
                        warn!("{fault}; substituting {value} ({:?})", self.policy)
                    }
                    ScalarFault::Undefined { .. } => {
                        debug!("{fault}; substituting {value} ({:?})", self.policy)
                    }
                }
                GuardedValue {
                    value,
                    faulted: true,
                }
            }
        }
    }

    /// Shorthand for `apply(check(value))`.
    pub fn observe(&mut self, value: f64) -> GuardedValue {
        self.apply(Ok(value))
    }

    fn substitute(&self) -> f64 {
        match self.policy {
            FaultPolicy::Nan => f64::NAN,
            FaultPolicy::Zero => 0.0,
            FaultPolicy::RepeatLast => self.last_good.unwrap_or(f64::NAN),
        }
    }

    pub fn last_good(&self) -> Option<f64> {
        self.last_good
    }

    pub fn faults(&self) -> usize {
        self.faults
    }

    pub fn reset(&mut self) {
        self.last_good = None;
        self.faults = 0;
    }
}

//! Interval schedules for [`crate::retry`].
//!
//! `retry` takes any sequence of durations; [`Backoff`] builds the common
//! shapes and can be deserialised from configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A retry schedule.
///
/// `retries` is the number of intervals produced, i.e. the number of attempts
/// after the first one. Delays are in whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// The same delay before every retry.
    Constant {
        /// Delay before each retry.
        interval_ms: u64,
        /// Number of retries.
        retries: usize,
    },

    /// A delay that grows by a fixed step: `initial`, `initial + step`, ...
    Linear {
        /// Delay before the first retry.
        initial_ms: u64,
        /// Added to the delay after each retry.
        step_ms: u64,
        /// Number of retries.
        retries: usize,
    },

    /// A delay multiplied by `factor` after each retry, optionally capped.
    Exponential {
        /// Delay before the first retry.
        initial_ms: u64,
        /// Growth factor applied after each retry.
        factor: u32,
        /// Number of retries.
        retries: usize,
        /// Upper bound for any single delay.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_ms: Option<u64>,
    },
}

impl Backoff {
    /// `retries` retries, each after `interval`.
    pub fn constant(interval: Duration, retries: usize) -> Self {
        Self::Constant {
            interval_ms: millis(interval),
            retries,
        }
    }

    /// `retries` retries after `initial`, `initial + step`, `initial + 2 * step`, ...
    pub fn linear(initial: Duration, step: Duration, retries: usize) -> Self {
        Self::Linear {
            initial_ms: millis(initial),
            step_ms: millis(step),
            retries,
        }
    }

    /// `retries` retries after `initial`, `initial * factor`, `initial * factor^2`, ...
    pub fn exponential(initial: Duration, factor: u32, retries: usize) -> Self {
        Self::Exponential {
            initial_ms: millis(initial),
            factor,
            retries,
            max_ms: None,
        }
    }

    /// Caps every delay of an exponential schedule at `max`.
    ///
    /// Other schedules are returned unchanged.
    #[must_use]
    pub fn with_max(self, max: Duration) -> Self {
        match self {
            Self::Exponential {
                initial_ms,
                factor,
                retries,
                ..
            } => Self::Exponential {
                initial_ms,
                factor,
                retries,
                max_ms: Some(millis(max)),
            },
            other => other,
        }
    }

    /// Number of retries this schedule allows.
    pub fn retries(&self) -> usize {
        match *self {
            Self::Constant { retries, .. }
            | Self::Linear { retries, .. }
            | Self::Exponential { retries, .. } => retries,
        }
    }

    /// Expands the schedule into the interval sequence `retry` consumes.
    pub fn intervals(&self) -> Vec<Duration> {
        match *self {
            Self::Constant {
                interval_ms,
                retries,
            } => vec![Duration::from_millis(interval_ms); retries],
            Self::Linear {
                initial_ms,
                step_ms,
                retries,
            } => (0..retries)
                .map(|i| {
                    let step = step_ms.saturating_mul(u64::try_from(i).unwrap_or(u64::MAX));
                    Duration::from_millis(initial_ms.saturating_add(step))
                })
                .collect(),
            Self::Exponential {
                initial_ms,
                factor,
                retries,
                max_ms,
            } => (0..retries)
                .map(|i| {
                    let exp = u32::try_from(i).unwrap_or(u32::MAX);
                    let delay = initial_ms.saturating_mul(u64::from(factor).saturating_pow(exp));
                    Duration::from_millis(max_ms.map_or(delay, |max| delay.min(max)))
                })
                .collect(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

//! Precomputed rotation durations.
//!
//! A worker's turn length is `base_cycle_minutes * sequence[index] / normalizer`.
//! Indices wrap modulo the sequence length, so durations repeat cyclically.

use chrono::Duration;
use conductor_config::SchedulerConfig;
use conductor_core::SchedulerError;

/// First `len` Fibonacci numbers starting `1, 1, 2, ...`.
pub fn fibonacci(len: usize) -> Vec<u64> {
    let mut seq = Vec::with_capacity(len);
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 0..len {
        seq.push(a);
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    seq
}

#[derive(Debug, Clone, PartialEq)]
pub struct DurationSequence {
    values: Vec<u64>,
    base_cycle_minutes: f64,
    normalizer: f64,
}

impl DurationSequence {
    pub fn new(
        values: Vec<u64>,
        base_cycle_minutes: f64,
        normalizer: f64,
    ) -> Result<Self, SchedulerError> {
        if values.is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "duration sequence cannot be empty".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| *v == 0) {
            return Err(SchedulerError::InvalidConfig(format!(
                "duration sequence entry {pos} must be > 0"
            )));
        }
        if values.windows(2).any(|w| w[1] < w[0]) {
            return Err(SchedulerError::InvalidConfig(
                "duration sequence must be non-decreasing".to_string(),
            ));
        }
        for (key, value) in [
            ("base_cycle_minutes", base_cycle_minutes),
            ("sequence_normalizer", normalizer),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SchedulerError::InvalidConfig(format!(
                    "{key} must be a positive number (got {value})"
                )));
            }
        }
        Ok(Self {
            values,
            base_cycle_minutes,
            normalizer,
        })
    }

    pub fn from_config(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::new(
            config.duration_sequence.clone(),
            config.base_cycle_minutes,
            config.sequence_normalizer,
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; construction rejects empty sequences.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Sequence value at `index`, wrapping.
    pub fn value(&self, index: usize) -> u64 {
        self.values[index % self.values.len()]
    }

    /// Turn length in minutes for `index`.
    pub fn minutes(&self, index: usize) -> f64 {
        self.base_cycle_minutes * self.value(index) as f64 / self.normalizer
    }

    /// Turn length as a duration, at microsecond precision.
    pub fn window(&self, index: usize) -> Duration {
        let micros = (self.minutes(index) * 60.0 * 1_000_000.0).round();
        if micros >= i64::MAX as f64 {
            Duration::MAX
        } else {
            Duration::microseconds(micros as i64)
        }
    }
}

//! Angular deduplication of candidate rays

use std::collections::HashSet;

/// Dedup bucket scale: angles are bucketed by `round(angle * tolerance)`.
/// Zero disables deduplication entirely.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tolerance(f64);

impl Tolerance {
    pub const DISABLED: Tolerance = Tolerance(0.0);

    /// Negative or non-finite values fail soft to `DISABLED`
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Tolerance(value)
        } else {
            if value != 0.0 {
                log::warn!("Ray dedup tolerance {} is not usable; dedup disabled", value);
            }
            Self::DISABLED
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_enabled(&self) -> bool {
        self.0 > 0.0
    }

    /// Bucket key for `angle`: the bits of `round(angle * t)`, so keys collide
    /// exactly when `round(angle * t) / t` does, at any magnitude
    #[inline]
    pub fn bucket(&self, angle: f64) -> u64 {
        // Adding 0.0 folds -0.0 into 0.0
        ((angle * self.0).round() + 0.0).to_bits()
    }

    /// Quantized angle as the host reports it
    #[inline]
    pub fn quantize(&self, angle: f64) -> f64 {
        if self.is_enabled() {
            (angle * self.0).round() / self.0
        } else {
            angle
        }
    }
}

/// Buckets already emitted during one cast
#[derive(Debug, Default)]
pub struct AngleSet {
    tolerance: Tolerance,
    seen: HashSet<u64>,
}

impl AngleSet {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            seen: HashSet::new(),
        }
    }

    /// Record `angle`; returns false if its bucket was already taken.
    /// Always true when dedup is disabled.
    pub fn insert(&mut self, angle: f64) -> bool {
        if !self.tolerance.is_enabled() {
            return true;
        }
        self.seen.insert(self.tolerance.bucket(angle))
    }

    /// Record `angle` unconditionally so later candidates dedup against it
    pub fn reserve(&mut self, angle: f64) {
        if self.tolerance.is_enabled() {
            self.seen.insert(self.tolerance.bucket(angle));
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

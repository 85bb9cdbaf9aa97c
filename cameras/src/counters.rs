//! Ray Counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Diagnostic counters of ray generation outcomes. Updated concurrently from
/// every ray generation call.
#[derive(Debug, Default)]
pub struct RayCounters {
    successful: AtomicU64,
    vignetted: AtomicU64,
    total_internal_reflection: AtomicU64,
}

impl RayCounters {
    /// Returns a new set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a ray that was generated successfully.
    pub fn add_successful(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a ray that was rejected after exhausting its retries.
    pub fn add_vignetted(&self) {
        self.vignetted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a refraction that failed due to total internal reflection.
    pub fn add_total_internal_reflection(&self) {
        self.total_internal_reflection
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of successful rays.
    pub fn successful(&self) -> u64 {
        self.successful.load(Ordering::Relaxed)
    }

    /// Returns the number of vignetted rays.
    pub fn vignetted(&self) -> u64 {
        self.vignetted.load(Ordering::Relaxed)
    }

    /// Returns the number of total internal reflections.
    pub fn total_internal_reflection(&self) -> u64 {
        self.total_internal_reflection.load(Ordering::Relaxed)
    }

    /// Returns the percentage of rays that were vignetted, or 0 when no rays
    /// were generated.
    pub fn vignetted_percentage(&self) -> f64 {
        let vignetted = self.vignetted();
        let total = vignetted + self.successful();
        if total == 0 {
            0.0
        } else {
            100.0 * vignetted as f64 / total as f64
        }
    }

    /// Log the counters.
    ///
    /// * `label` - Name of the lens model the counters belong to.
    pub fn report(&self, label: &str) {
        info!("{label} statistics");
        info!("{:<40} {:>12}", "Successful rays", self.successful());
        info!("{:<40} {:>12}", "Vignetted rays", self.vignetted());
        info!(
            "{:<40} {:>12.6}",
            "Vignetted percentage",
            self.vignetted_percentage()
        );
        info!(
            "{:<40} {:>12}",
            "Total internal reflection cases",
            self.total_internal_reflection()
        );
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

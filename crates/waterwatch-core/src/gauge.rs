//! Presentation helpers for the water gauge shown to users.

use crate::counter::CAPACITY_ML;

/// Water gauge derived from the weekly counter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauge {
    /// Accumulated milliliters
    pub value_ml: u32,
    /// Gauge ceiling in milliliters
    pub capacity_ml: u32,
}

impl Gauge {
    /// Gauge over an arbitrary ceiling
    pub fn new(value_ml: u32, capacity_ml: u32) -> Self {
        Self {
            value_ml,
            capacity_ml,
        }
    }

    /// Gauge over the weekly counter capacity
    pub fn weekly(value_ml: u32) -> Self {
        Self::new(value_ml, CAPACITY_ML)
    }

    /// Consumption in liters
    pub fn liters(&self) -> f64 {
        self.value_ml as f64 / 1000.0
    }

    /// Equivalent number of 0.5 L bottles, rounded to the nearest bottle
    pub fn bottles(&self) -> u32 {
        (self.liters() / 0.5).round() as u32
    }

    /// Fill level as a percentage of capacity, clamped to 100
    pub fn fill_percent(&self) -> f64 {
        if self.capacity_ml == 0 {
            return 0.0;
        }
        (self.value_ml as f64 / self.capacity_ml as f64 * 100.0).min(100.0)
    }

    /// One-line summary for logs and the status command
    pub fn summary(&self) -> String {
        let bottles = self.bottles();
        format!(
            "{:.2} L (~{} bottle{} of 0.5 L, {:.0}% of weekly cap)",
            self.liters(),
            bottles,
            if bottles == 1 { "" } else { "s" },
            self.fill_percent()
        )
    }
}

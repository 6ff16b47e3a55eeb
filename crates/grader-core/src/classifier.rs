use crate::models::{Branding, ReferenceValues, SensorKind};

/// Half-width of the open interval around the reference temperature that a
/// thermometer's mean must fall inside.
pub const MEAN_TOLERANCE: f64 = 0.5;

/// A thermometer whose standard deviation is below this is "ultra precise".
pub const ULTRA_PRECISE_MAX_STDDEV: f64 = 3.0;

/// A thermometer whose standard deviation is below this is "very precise".
pub const VERY_PRECISE_MAX_STDDEV: f64 = 5.0;

/// The humidity band half-width is the reference humidity divided by this,
/// i.e. one percent of the reference value.
pub const HUMIDITY_TOLERANCE_DIVISOR: f64 = 100.0;

// ── Statistics helpers ────────────────────────────────────────────────────────

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bessel-corrected sample standard deviation.
///
/// Returns `None` with fewer than two values, where the statistic is
/// undefined.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() as f64 - 1.0)).sqrt())
}

// ── Classification ────────────────────────────────────────────────────────────

impl SensorKind {
    /// Brand a sensor of this kind from its reading values.
    ///
    /// Pure: identical inputs always produce the identical branding.
    pub fn classify(self, reference: &ReferenceValues, readings: &[f64]) -> Branding {
        match self {
            Self::Thermometer => classify_thermometer(reference, readings),
            Self::HumiditySensor => classify_humidity(reference, readings),
        }
    }
}

/// Thermometer rules.
///
/// The mean must lie strictly inside `(ref - 0.5, ref + 0.5)`; the standard
/// deviation then picks the label with strict `< 3` and `< 5` thresholds.
/// With fewer than two readings the branding stays "precise".
pub fn classify_thermometer(reference: &ReferenceValues, readings: &[f64]) -> Branding {
    let (Some(m), Some(sd)) = (mean(readings), sample_std_dev(readings)) else {
        return SensorKind::Thermometer.default_branding();
    };

    let lo = reference.temperature - MEAN_TOLERANCE;
    let hi = reference.temperature + MEAN_TOLERANCE;
    if m > lo && m < hi {
        if sd < ULTRA_PRECISE_MAX_STDDEV {
            return Branding::UltraPrecise;
        }
        if sd < VERY_PRECISE_MAX_STDDEV {
            return Branding::VeryPrecise;
        }
    }
    SensorKind::Thermometer.default_branding()
}

/// Humidity sensor rules.
///
/// Every reading must fall inside the closed band
/// `[ref - ref/100, ref + ref/100]`; the first reading outside it discards
/// the sensor and the rest are not examined.
pub fn classify_humidity(reference: &ReferenceValues, readings: &[f64]) -> Branding {
    let delta = reference.humidity / HUMIDITY_TOLERANCE_DIVISOR;
    let lo = reference.humidity - delta;
    let hi = reference.humidity + delta;

    if readings.iter().any(|&r| r < lo || r > hi) {
        Branding::Discard
    } else {
        SensorKind::HumiditySensor.default_branding()
    }
}

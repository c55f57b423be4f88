use serde::{Deserialize, Serialize};

use crate::error::{CosechaError, Result};

/// Canonical feature order. The model's input contract is positional, so
/// every path that turns a `FeatureVector` into numbers goes through
/// [`FeatureVector::values`] and nothing else.
pub const FEATURE_NAMES: [&str; 7] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

/// One observation of soil chemistry and climate, in the canonical order.
///
/// All seven fields are required and finite; construction from text fails
/// loudly instead of defaulting. Domain conventions (non-negative nutrients,
/// pH in [0, 14]) are the caller's responsibility and are not clamped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl FeatureVector {
    pub fn new(
        n: f64,
        p: f64,
        k: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Self {
        Self {
            n,
            p,
            k,
            temperature,
            humidity,
            ph,
            rainfall,
        }
    }

    /// Builds a vector from seven textual fields in canonical order, as
    /// collected by the CLI or the wizard.
    pub fn parse(raw: &[&str; NUM_FEATURES]) -> Result<Self> {
        let mut values = [0.0; NUM_FEATURES];
        for (i, &cell) in raw.iter().enumerate() {
            values[i] = parse_feature(FEATURE_NAMES[i], cell)?;
        }
        Ok(Self::from_values(values))
    }

    pub fn from_values(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            n: values[0],
            p: values[1],
            k: values[2],
            temperature: values[3],
            humidity: values[4],
            ph: values[5],
            rainfall: values[6],
        }
    }

    /// The fields in canonical order, the only shape the forest consumes.
    pub fn values(&self) -> [f64; NUM_FEATURES] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    /// Rejects vectors that would silently corrupt a prediction.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.values()) {
            if !value.is_finite() {
                return Err(CosechaError::Input(format!(
                    "feature '{name}' is not a finite number (got {value})"
                )));
            }
        }
        Ok(())
    }
}

fn parse_feature(name: &str, cell: &str) -> Result<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Err(CosechaError::Input(format!("feature '{name}' is missing")));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| CosechaError::Input(format!("feature '{name}' is not numeric: '{trimmed}'")))?;
    if !value.is_finite() {
        return Err(CosechaError::Input(format!(
            "feature '{name}' is not a finite number: '{trimmed}'"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_follow_canonical_order() {
        let fv = FeatureVector::new(90.0, 42.0, 43.0, 22.0, 80.0, 6.5, 200.0);
        assert_eq!(fv.values(), [90.0, 42.0, 43.0, 22.0, 80.0, 6.5, 200.0]);
    }

    #[test]
    fn parse_accepts_textual_fields() {
        let fv = FeatureVector::parse(&["90", "42", "43", "22.0", "80", "6.5", "200"]).unwrap();
        assert_eq!(fv, FeatureVector::new(90.0, 42.0, 43.0, 22.0, 80.0, 6.5, 200.0));
    }

    #[test]
    fn parse_rejects_missing_field() {
        let err = FeatureVector::parse(&["90", "42", "43", "22", "80", "  ", "200"]).unwrap_err();
        assert!(err.to_string().contains("'ph' is missing"), "{err}");
    }

    #[test]
    fn parse_rejects_non_numeric_field() {
        let err = FeatureVector::parse(&["90", "42", "abc", "22", "80", "6.5", "200"]).unwrap_err();
        assert!(err.to_string().contains("'K' is not numeric"), "{err}");
    }

    #[test]
    fn parse_rejects_non_finite_field() {
        let err = FeatureVector::parse(&["90", "42", "43", "inf", "80", "6.5", "200"]).unwrap_err();
        assert!(err.to_string().contains("temperature"), "{err}");
    }

    #[test]
    fn validate_rejects_nan() {
        let mut fv = FeatureVector::new(90.0, 42.0, 43.0, 22.0, 80.0, 6.5, 200.0);
        fv.humidity = f64::NAN;
        assert!(fv.validate().is_err());
        fv.humidity = 80.0;
        assert!(fv.validate().is_ok());
    }
}

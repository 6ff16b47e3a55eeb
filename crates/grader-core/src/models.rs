use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Keyword that introduces the calibration line of a log file.
pub const REFERENCE_KEYWORD: &str = "reference";

/// Known-good room conditions a log file is calibrated against.
///
/// Replaced wholesale when a file carries a second reference line. A file
/// without any reference line is graded against the zero value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValues {
    /// Reference temperature.
    pub temperature: f64,
    /// Reference relative humidity, in percent.
    pub humidity: f64,
}

impl ReferenceValues {
    /// Number of numeric fields a reference line must carry.
    pub const FIELD_COUNT: usize = 2;

    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

/// A single `<timestamp> <value>` line inside a sensor block.
///
/// The timestamp is kept verbatim; nothing downstream interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: String,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// The kinds of sensor a log file may describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Thermometer,
    #[serde(rename = "humidity")]
    HumiditySensor,
}

impl SensorKind {
    /// Resolve a header keyword (`thermometer`, `humidity`) to a kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "thermometer" => Some(Self::Thermometer),
            "humidity" => Some(Self::HumiditySensor),
            _ => None,
        }
    }

    /// The header keyword for this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Thermometer => "thermometer",
            Self::HumiditySensor => "humidity",
        }
    }

    /// Branding a sensor of this kind keeps unless classification promotes
    /// or discards it.
    pub fn default_branding(self) -> Branding {
        match self {
            Self::Thermometer => Branding::Precise,
            Self::HumiditySensor => Branding::Keep,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Quality label assigned to a sensor after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branding {
    #[serde(rename = "ultra precise")]
    UltraPrecise,
    #[serde(rename = "very precise")]
    VeryPrecise,
    #[serde(rename = "precise")]
    Precise,
    #[serde(rename = "keep")]
    Keep,
    #[serde(rename = "discard")]
    Discard,
}

impl Branding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UltraPrecise => "ultra precise",
            Self::VeryPrecise => "very precise",
            Self::Precise => "precise",
            Self::Keep => "keep",
            Self::Discard => "discard",
        }
    }
}

impl fmt::Display for Branding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed sensor block: its readings in arrival order and the branding
/// computed when the block was sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub kind: SensorKind,
    pub name: String,
    pub readings: Vec<Reading>,
    pub branding: Branding,
}

impl SensorRecord {
    /// Reading values in arrival order, as fed to the classifier.
    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }
}

/// Final sensor-name → branding mapping for one log file.
///
/// Backed by a `BTreeMap` so iteration, and therefore serialisation, is
/// ordered by sensor name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeReport {
    brandings: BTreeMap<String, Branding>,
}

impl GradeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a branding; a later record for the same name replaces the
    /// earlier one.
    pub fn insert(&mut self, name: impl Into<String>, branding: Branding) {
        self.brandings.insert(name.into(), branding);
    }

    pub fn get(&self, name: &str) -> Option<Branding> {
        self.brandings.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.brandings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brandings.is_empty()
    }
}

impl<'a> FromIterator<&'a SensorRecord> for GradeReport {
    fn from_iter<I: IntoIterator<Item = &'a SensorRecord>>(iter: I) -> Self {
        let mut report = GradeReport::new();
        for record in iter {
            report.insert(record.name.clone(), record.branding);
        }
        report
    }
}

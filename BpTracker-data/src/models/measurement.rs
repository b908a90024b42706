use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Arm the cuff was placed on
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    /// Left arm
    Left,

    /// Right arm
    Right,

    /// Not recorded
    #[default]
    Unspecified,
}

impl Arm {
    /// Parse an arm tag, accepting both the English tags and the legacy
    /// Chinese tags written by earlier versions of the app.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "left" | "Left" | "LEFT" | "左手" | "左" => Arm::Left,
            "right" | "Right" | "RIGHT" | "右手" | "右" => Arm::Right,
            _ => Arm::Unspecified,
        }
    }

    /// Display label used in tables and exports
    pub fn label(&self) -> &'static str {
        match self {
            Arm::Left => "左手",
            Arm::Right => "右手",
            Arm::Unspecified => "未指定",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arm::Left => write!(f, "left"),
            Arm::Right => write!(f, "right"),
            Arm::Unspecified => write!(f, "unspecified"),
        }
    }
}

impl<'de> Deserialize<'de> for Arm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Arm::from_tag(&tag))
    }
}

/// Storage model for a blood pressure measurement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    /// Unique identifier, immutable once assigned
    pub id: String,

    /// When the measurement was taken
    pub timestamp: DateTime<Utc>,

    /// Systolic blood pressure in mmHg (the higher number)
    pub systolic: u16,

    /// Diastolic blood pressure in mmHg (the lower number)
    pub diastolic: u16,

    /// Heart rate in beats per minute
    pub heart_rate: u16,

    /// Arm used for the measurement
    #[serde(default)]
    pub arm: Arm,

    /// Free-form note, may be empty
    #[serde(default)]
    pub note: String,
}

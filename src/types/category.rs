//! Categorical buckets derived from the raw measurements during enrichment.
//!
//! Each enum maps to a fixed set of labels written into the batch as a string column.

use std::fmt;

/// Temperature bucket: `> 30` is Hot, `< 10` is Cold, anything else Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureCategory {
    Hot,
    Moderate,
    Cold,
}

impl TemperatureCategory {
    pub const ALL: [TemperatureCategory; 3] = [Self::Hot, Self::Moderate, Self::Cold];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureCategory::Hot => "Hot",
            TemperatureCategory::Moderate => "Moderate",
            TemperatureCategory::Cold => "Cold",
        }
    }
}

/// Precipitation bucket: `> 10` is Rainy, `> 0` is Light_rain, anything else Dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecipitationCategory {
    Rainy,
    LightRain,
    Dry,
}

impl PrecipitationCategory {
    pub const ALL: [PrecipitationCategory; 3] = [Self::Rainy, Self::LightRain, Self::Dry];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipitationCategory::Rainy => "Rainy",
            PrecipitationCategory::LightRain => "Light_rain",
            PrecipitationCategory::Dry => "Dry",
        }
    }
}

/// UV index bucket, following the WHO exposure scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UvCategory {
    /// Below 3.
    Low,
    /// 3 up to (not including) 6.
    Moderate,
    /// 6 up to 8.
    High,
    /// 8 up to 11.
    VeryHigh,
    /// 11 and above.
    Extreme,
}

impl UvCategory {
    pub const ALL: [UvCategory; 5] = [
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::VeryHigh,
        Self::Extreme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UvCategory::Low => "Low",
            UvCategory::Moderate => "Moderate",
            UvCategory::High => "High",
            UvCategory::VeryHigh => "Very High",
            UvCategory::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for TemperatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PrecipitationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UvCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

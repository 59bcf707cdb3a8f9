use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(EntryId);
id_newtype!(UserId);

/// Lifecycle stage of an entry. The ordinal is what crosses the wire and must
/// stay aligned with the remote schema's enum numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawGrowthStage", into = "i32")]
pub enum GrowthStage {
    #[default]
    Seed,
    Sprout,
    Bloom,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown growth stage '{0}'")]
pub struct ParseGrowthStageError(pub String);

impl GrowthStage {
    pub const ALL: [GrowthStage; 3] = [GrowthStage::Seed, GrowthStage::Sprout, GrowthStage::Bloom];

    pub fn ordinal(self) -> i32 {
        match self {
            GrowthStage::Seed => 0,
            GrowthStage::Sprout => 1,
            GrowthStage::Bloom => 2,
        }
    }

    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(GrowthStage::Seed),
            1 => Some(GrowthStage::Sprout),
            2 => Some(GrowthStage::Bloom),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GrowthStage::Seed => "Seed",
            GrowthStage::Sprout => "Sprout",
            GrowthStage::Bloom => "Bloom",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.strip_prefix("GROWTH_STAGE_").unwrap_or(upper.as_str()) {
            "SEED" => Some(GrowthStage::Seed),
            "SPROUT" => Some(GrowthStage::Sprout),
            "BLOOM" => Some(GrowthStage::Bloom),
            _ => None,
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the selection value a form control produces (`"0"`, `"1"`, `"2"`)
/// as well as the stage names.
impl FromStr for GrowthStage {
    type Err = ParseGrowthStageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(ordinal) = trimmed.parse::<i32>() {
            return GrowthStage::from_ordinal(ordinal)
                .ok_or_else(|| ParseGrowthStageError(raw.to_string()));
        }
        GrowthStage::from_name(trimmed).ok_or_else(|| ParseGrowthStageError(raw.to_string()))
    }
}

impl From<GrowthStage> for i32 {
    fn from(value: GrowthStage) -> Self {
        value.ordinal()
    }
}

impl TryFrom<i32> for GrowthStage {
    type Error = ParseGrowthStageError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        GrowthStage::from_ordinal(value).ok_or_else(|| ParseGrowthStageError(value.to_string()))
    }
}

// Servers following the protobuf JSON mapping echo enum names, so both forms
// are accepted on the way in.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGrowthStage {
    Ordinal(i32),
    Name(String),
}

impl TryFrom<RawGrowthStage> for GrowthStage {
    type Error = ParseGrowthStageError;

    fn try_from(value: RawGrowthStage) -> Result<Self, Self::Error> {
        match value {
            RawGrowthStage::Ordinal(ordinal) => GrowthStage::try_from(ordinal),
            RawGrowthStage::Name(name) => {
                GrowthStage::from_name(&name).ok_or(ParseGrowthStageError(name))
            }
        }
    }
}

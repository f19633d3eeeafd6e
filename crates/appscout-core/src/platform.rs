use serde::{Deserialize, Serialize};

/// The app store a candidate was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(crate::ConfigError::Validation(format!(
                "unknown platform: {other}"
            ))),
        }
    }
}

/// Per-platform feature support for the enrichment surfaces.
///
/// Review harvesting and per-country lookups are only wired up for stores
/// that expose the corresponding public endpoints. Callers check the
/// capability and treat an unsupported platform as a no-op, never an error.
pub trait PlatformCapabilities {
    fn supports_reviews(&self) -> bool;
    fn supports_country_lookup(&self) -> bool;
}

impl PlatformCapabilities for Platform {
    fn supports_reviews(&self) -> bool {
        matches!(self, Platform::Ios)
    }

    fn supports_country_lookup(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

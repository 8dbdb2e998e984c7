//! Vertical analysis levels.

use crate::grid::{domains, GridSpec};
use crate::variable::VariableKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vertical level an analysis run is keyed on.
///
/// Surface runs analyze sea-level pressure; upper-air runs analyze
/// geopotential height of the pressure surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelTag {
    #[serde(rename = "SURFACE")]
    Surface,
    #[serde(rename = "850HPA")]
    Hpa850,
    #[serde(rename = "700HPA")]
    Hpa700,
    #[serde(rename = "500HPA")]
    Hpa500,
    #[serde(rename = "200HPA")]
    Hpa200,
}

impl LevelTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelTag::Surface => "SURFACE",
            LevelTag::Hpa850 => "850HPA",
            LevelTag::Hpa700 => "700HPA",
            LevelTag::Hpa500 => "500HPA",
            LevelTag::Hpa200 => "200HPA",
        }
    }

    pub fn is_surface(&self) -> bool {
        matches!(self, LevelTag::Surface)
    }

    /// The variable the isopleths and centers of this level are drawn from.
    pub fn primary_variable(&self) -> VariableKind {
        if self.is_surface() {
            VariableKind::Pressure
        } else {
            VariableKind::Height
        }
    }

    /// Analysis grid for this level.
    pub fn domain(&self) -> GridSpec {
        if self.is_surface() {
            domains::surface()
        } else {
            domains::upper_air()
        }
    }

    pub fn all() -> &'static [LevelTag] {
        &[
            LevelTag::Surface,
            LevelTag::Hpa850,
            LevelTag::Hpa700,
            LevelTag::Hpa500,
            LevelTag::Hpa200,
        ]
    }
}

impl fmt::Display for LevelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelTag {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SURFACE" => Ok(LevelTag::Surface),
            "850HPA" => Ok(LevelTag::Hpa850),
            "700HPA" => Ok(LevelTag::Hpa700),
            "500HPA" => Ok(LevelTag::Hpa500),
            "200HPA" => Ok(LevelTag::Hpa200),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown level: {0}")]
pub struct UnknownLevel(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for tag in LevelTag::all() {
            assert_eq!(tag.as_str().parse::<LevelTag>().unwrap(), *tag);
        }
        assert!("900HPA".parse::<LevelTag>().is_err());
    }

    #[test]
    fn test_primary_variable() {
        assert_eq!(LevelTag::Surface.primary_variable(), VariableKind::Pressure);
        assert_eq!(LevelTag::Hpa500.primary_variable(), VariableKind::Height);
    }

    #[test]
    fn test_domain_selection() {
        assert_eq!(LevelTag::Surface.domain(), domains::surface());
        assert_eq!(LevelTag::Hpa850.domain(), domains::upper_air());
    }
}

// src/model/format.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Banner format, determines the aspect ratio of the surface.
///
/// The first three are the regular formats a scene author picks from; the
/// rest can only be activated by the backend's unit metadata.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AdFormat {
    Tall,
    Wide,
    Square,
    MobilePhoneInterstitial,
    Billboard,
    MediumRectangle,
}

impl AdFormat {
    pub const ALL: [AdFormat; 6] = [
        AdFormat::Tall,
        AdFormat::Wide,
        AdFormat::Square,
        AdFormat::MobilePhoneInterstitial,
        AdFormat::Billboard,
        AdFormat::MediumRectangle,
    ];

    /// Formats the backend may substitute for the configured one.
    pub const BETA: [AdFormat; 3] = [
        AdFormat::MobilePhoneInterstitial,
        AdFormat::Billboard,
        AdFormat::MediumRectangle,
    ];

    /// Used whenever a format name is not recognized.
    pub const DEFAULT: AdFormat = AdFormat::Square;

    pub fn name(&self) -> &'static str {
        match self {
            AdFormat::Tall => "tall",
            AdFormat::Wide => "wide",
            AdFormat::Square => "square",
            AdFormat::MobilePhoneInterstitial => "mobile-phone-interstitial",
            AdFormat::Billboard => "billboard",
            AdFormat::MediumRectangle => "medium-rectangle",
        }
    }

    /// Position in the format list; beta formats follow the regular ones.
    pub fn index(&self) -> usize {
        AdFormat::ALL.iter().position(|f| f == self).unwrap_or(2)
    }

    pub fn is_beta(&self) -> bool {
        AdFormat::BETA.contains(self)
    }

    /// Lenient lookup: unknown names resolve to [`AdFormat::DEFAULT`].
    pub fn from_name_or_default(name: &str) -> AdFormat {
        name.parse().unwrap_or(AdFormat::DEFAULT)
    }
}

impl FromStr for AdFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown banner format: {}", s))
    }
}

impl fmt::Display for AdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Visual style of the default banner artwork.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdStyle {
    Standard,
    Minimal,
    #[default]
    Transparent,
}

impl AdStyle {
    pub const ALL: [AdStyle; 3] = [AdStyle::Standard, AdStyle::Minimal, AdStyle::Transparent];

    pub fn name(&self) -> &'static str {
        match self {
            AdStyle::Standard => "standard",
            AdStyle::Minimal => "minimal",
            AdStyle::Transparent => "transparent",
        }
    }
}

impl fmt::Display for AdStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chain the NFT-backed content path is looked up on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Polygon,
    Rinkeby,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Polygon => "polygon",
            Network::Rinkeby => "rinkeby",
        }
    }
}

/// Concrete dimensions a banner should be rendered at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FormatSpec {
    pub format: AdFormat,
    pub ratio: f32,  // width / height
    pub width: f32,  // world units
    pub height: f32, // world units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Billboard".parse::<AdFormat>(), Ok(AdFormat::Billboard));
        assert_eq!(" wide ".parse::<AdFormat>(), Ok(AdFormat::Wide));
        assert!("banner".parse::<AdFormat>().is_err());
    }

    #[test]
    fn unknown_names_fall_back_to_square() {
        assert_eq!(AdFormat::from_name_or_default("leaderboard"), AdFormat::Square);
    }

    #[test]
    fn beta_formats_follow_regular_ones() {
        assert_eq!(AdFormat::MobilePhoneInterstitial.index(), 3);
        assert_eq!(AdFormat::Billboard.index(), 4);
        assert_eq!(AdFormat::MediumRectangle.index(), 5);
        assert!(AdFormat::BETA.iter().all(AdFormat::is_beta));
        assert!(!AdFormat::Square.is_beta());
    }

    #[test]
    fn serde_uses_kebab_case_names() {
        let json = serde_json::to_string(&AdFormat::MobilePhoneInterstitial).unwrap();
        assert_eq!(json, "\"mobile-phone-interstitial\"");
        let style: AdStyle = serde_json::from_str("\"minimal\"").unwrap();
        assert_eq!(style, AdStyle::Minimal);
    }
}

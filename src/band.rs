//! Popularity bands
//!
//! A predicted score in 0..=100 falls into one of five bands. Each band's
//! label and narrative is fixed text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Band {
    VeryPopular,
    Popular,
    Medium,
    Low,
    VeryLow,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BandInfo {
    pub band: Band,
    /// Inclusive lower bound of the score
    pub lower: f64,
    pub label: &'static str,
    pub css_class: &'static str,
    pub interpretation: &'static str,
    pub recommendations: [&'static str; 3],
}

/// Highest band first
pub const BANDS: [BandInfo; 5] = [
    BandInfo {
        band: Band::VeryPopular,
        lower: 80.0,
        label: "Very popular",
        css_class: "category-very-high",
        interpretation: "This track has the characteristics of a hit! \
            High chances of reaching the top charts.",
        recommendations: [
            "Excellent audio characteristics",
            "Fits popular playlists",
            "High potential for viral spread",
        ],
    },
    BandInfo {
        band: Band::Popular,
        lower: 60.0,
        label: "Popular",
        css_class: "category-high",
        interpretation: "A track with good characteristics. \
            It can become popular with the right promotion.",
        recommendations: [
            "Good chances of success",
            "Worth adding to themed playlists",
            "Worth investing in marketing",
        ],
    },
    BandInfo {
        band: Band::Medium,
        lower: 40.0,
        label: "Medium popularity",
        css_class: "category-medium",
        interpretation: "A track with average characteristics. It can find its niche.",
        recommendations: [
            "Suits a specific audience",
            "Focus on targeted marketing",
            "Consider raising danceability or energy",
        ],
    },
    BandInfo {
        band: Band::Low,
        lower: 20.0,
        label: "Low popularity",
        css_class: "category-low",
        interpretation: "A track with the characteristics of niche music.",
        recommendations: [
            "Aim at a narrow target audience",
            "Energy or danceability may be too low",
            "Consider changing the arrangement",
        ],
    },
    BandInfo {
        band: Band::VeryLow,
        lower: f64::NEG_INFINITY,
        label: "Very low popularity",
        css_class: "category-very-low",
        interpretation: "The track has characteristics that are unusual for popular music.",
        recommendations: [
            "Audio characteristics are far from the mainstream",
            "May suit specific genres (ambient, experimental)",
            "Consider rethinking the concept of the track",
        ],
    },
];

/// Text shown under every prediction
pub const DISCLAIMER: &str = "The prediction is based on audio characteristics only. \
Real popularity depends on many other factors: artist recognition, marketing, trends, \
playlist placement and so on.";

pub fn classify(score: f64) -> &'static BandInfo {
    BANDS
        .iter()
        .find(|b| score >= b.lower)
        .unwrap_or(&BANDS[BANDS.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify(85.0).band, Band::VeryPopular);
        assert_eq!(classify(65.0).band, Band::Popular);
        assert_eq!(classify(45.0).band, Band::Medium);
        assert_eq!(classify(25.0).band, Band::Low);
        assert_eq!(classify(10.0).band, Band::VeryLow);
    }

    #[test]
    fn test_boundaries_belong_to_higher_band() {
        assert_eq!(classify(80.0).band, Band::VeryPopular);
        assert_eq!(classify(60.0).band, Band::Popular);
        assert_eq!(classify(40.0).band, Band::Medium);
        assert_eq!(classify(20.0).band, Band::Low);
        assert_eq!(classify(19.999).band, Band::VeryLow);
    }

    #[test]
    fn test_out_of_range_scores() {
        assert_eq!(classify(140.0).band, Band::VeryPopular);
        assert_eq!(classify(-3.0).band, Band::VeryLow);
        assert_eq!(classify(f64::NAN).band, Band::VeryLow);
    }

    #[test]
    fn test_table_is_descending() {
        for pair in BANDS.windows(2) {
            assert!(pair[0].lower > pair[1].lower);
        }
    }
}

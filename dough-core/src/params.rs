use serde::{Deserialize, Serialize};

/// Pre-ferment kind. Poolish is fixed at 100% hydration; biga hydration
/// comes from [`RecipeParameters::biga_hydration`].
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PreFermentType {
    Poolish,
    Biga,
}

impl PreFermentType {
    pub fn as_str(self) -> &'static str {
        match self {
            PreFermentType::Poolish => "poolish",
            PreFermentType::Biga => "biga",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "poolish" => Some(PreFermentType::Poolish),
            "biga" => Some(PreFermentType::Biga),
            _ => None,
        }
    }
}

/// Input for recipe computation. All ratios are baker's percentages as
/// fractions of flour weight (flour = 1.0), e.g. 0.65 for 65% hydration.
///
/// Flour weight itself is never an input; it is derived from the total
/// dough weight (`num_balls * ball_weight`) and the percentage sum.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeParameters {
    /// Number of dough balls, at least 1.
    pub num_balls: u32,
    /// Weight of a single ball in grams.
    pub ball_weight: f64,
    pub hydration: f64,
    pub salt: f64,
    pub yeast: f64,
    pub oil: f64,
    pub sugar: f64,
    /// Knock a fixed 2.5 points off hydration for humid kitchens.
    pub humidity_adjust: bool,
    pub use_pre_ferment: bool,
    pub pre_ferment_type: PreFermentType,
    /// Share of the total flour fermented in the first stage (0..=1).
    pub pre_ferment_flour_percent: f64,
    /// Hydration of a biga pre-ferment. Ignored for poolish.
    pub biga_hydration: f64,
}

impl RecipeParameters {
    /// Total dough weight in grams. Always recomputed, never stored.
    pub fn total_dough_weight(&self) -> f64 {
        f64::from(self.num_balls) * self.ball_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_ferment_type_round_trips_as_str() {
        for t in [PreFermentType::Poolish, PreFermentType::Biga] {
            assert_eq!(PreFermentType::parse(t.as_str()), Some(t));
        }
        assert_eq!(PreFermentType::parse("levain"), None);
    }
}

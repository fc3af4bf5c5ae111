//! Baker's-percentage engine.
//!
//! One pure transformation: [`RecipeParameters`] in, fully materialised
//! [`CalculatedRecipe`] out. Flour is derived from the total dough weight
//! and the percentage sum; everything else hangs off flour.

use crate::error::InvalidParameters;
use crate::params::{PreFermentType, RecipeParameters};

/// Fixed hydration reduction applied when humidity adjustment is on:
/// 2.5 percentage points, not configurable.
pub const HUMIDITY_HYDRATION_OFFSET: f64 = 0.025;

/// Percentages actually applied (post humidity adjustment), expressed
/// x100 for display.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BakersPercentages {
    pub hydration: f64,
    pub salt: f64,
    pub yeast: f64,
    pub oil: f64,
    pub sugar: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SingleStageRecipe {
    pub flour_g: f64,
    pub water_g: f64,
    pub salt_g: f64,
    pub yeast_g: f64,
    pub oil_g: f64,
    pub sugar_g: f64,
    pub total_weight_g: f64,
    pub percentages: BakersPercentages,
}

/// First stage of a two-stage dough.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreFermentStage {
    pub kind: PreFermentType,
    pub flour_g: f64,
    pub water_g: f64,
    pub yeast_g: f64,
    /// Pre-ferment hydration, x100. Always 100 for poolish.
    pub hydration_pct: f64,
    /// Share of the total flour in this stage, x100.
    pub flour_share_pct: f64,
}

/// Second stage: the remaining ingredients mixed with the ripe pre-ferment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FinalDoughStage {
    pub flour_g: f64,
    pub water_g: f64,
    pub salt_g: f64,
    /// Always zero. The pre-ferment carries the whole yeast dose
    /// (traditional method), so the final mix gets none.
    pub yeast_g: f64,
    pub oil_g: f64,
    pub sugar_g: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TwoStageRecipe {
    pub pre_ferment: PreFermentStage,
    pub final_dough: FinalDoughStage,
    pub total_weight_g: f64,
    pub percentages: BakersPercentages,
}

/// Result of a calculation. Recomputed from scratch on every parameter
/// change; nothing here is authoritative state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CalculatedRecipe {
    SingleStage(SingleStageRecipe),
    TwoStage(TwoStageRecipe),
}

impl CalculatedRecipe {
    pub fn total_weight_g(&self) -> f64 {
        match self {
            CalculatedRecipe::SingleStage(r) => r.total_weight_g,
            CalculatedRecipe::TwoStage(r) => r.total_weight_g,
        }
    }

    pub fn percentages(&self) -> BakersPercentages {
        match self {
            CalculatedRecipe::SingleStage(r) => r.percentages,
            CalculatedRecipe::TwoStage(r) => r.percentages,
        }
    }
}

// Flour, water, oil and sugar land on whole grams; salt and yeast keep one
// decimal because they are dosed on finer scales.
fn round_g(x: f64) -> f64 {
    x.round()
}

fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn validate(params: &RecipeParameters) -> Result<(), InvalidParameters> {
    if params.num_balls < 1 {
        return Err(InvalidParameters::new("number of balls must be at least 1"));
    }
    if !(params.ball_weight > 0.0) || !params.ball_weight.is_finite() {
        return Err(InvalidParameters::new(format!(
            "ball weight must be a positive number of grams, got {}",
            params.ball_weight
        )));
    }
    if params.use_pre_ferment {
        if !(0.0..=1.0).contains(&params.pre_ferment_flour_percent) {
            return Err(InvalidParameters::new(format!(
                "pre-ferment flour share must be between 0 and 1, got {}",
                params.pre_ferment_flour_percent
            )));
        }
        if params.pre_ferment_type == PreFermentType::Biga && !(params.biga_hydration > 0.0) {
            return Err(InvalidParameters::new(format!(
                "biga hydration must be positive, got {}",
                params.biga_hydration
            )));
        }
    }
    Ok(())
}

/// Derive ingredient weights from baker's percentages.
///
/// `flour = total / (1 + hydration + salt + yeast + oil + sugar)`, where
/// hydration is reduced by [`HUMIDITY_HYDRATION_OFFSET`] when humidity
/// adjustment is on. With a pre-ferment enabled, the batch is split into a
/// first stage and a final dough; both stages derive from the rounded
/// whole-batch figures so flour and water are conserved exactly.
pub fn calculate(params: &RecipeParameters) -> Result<CalculatedRecipe, InvalidParameters> {
    validate(params)?;

    let total = params.total_dough_weight();
    let hydration = if params.humidity_adjust {
        params.hydration - HUMIDITY_HYDRATION_OFFSET
    } else {
        params.hydration
    };

    let divisor = 1.0 + hydration + params.salt + params.yeast + params.oil + params.sugar;
    if !divisor.is_finite() || divisor <= 0.0 {
        return Err(InvalidParameters::new(format!(
            "ingredient percentages sum to a non-positive dough divisor ({divisor:.3})"
        )));
    }

    let flour = round_g(total / divisor);
    let water = round_g(flour * hydration);
    let salt = round_tenth(flour * params.salt);
    let yeast = round_tenth(flour * params.yeast);
    let oil = round_g(flour * params.oil);
    let sugar = round_g(flour * params.sugar);

    let percentages = BakersPercentages {
        hydration: hydration * 100.0,
        salt: params.salt * 100.0,
        yeast: params.yeast * 100.0,
        oil: params.oil * 100.0,
        sugar: params.sugar * 100.0,
    };

    if !params.use_pre_ferment {
        return Ok(CalculatedRecipe::SingleStage(SingleStageRecipe {
            flour_g: flour,
            water_g: water,
            salt_g: salt,
            yeast_g: yeast,
            oil_g: oil,
            sugar_g: sugar,
            total_weight_g: total,
            percentages,
        }));
    }

    let pf_hydration = match params.pre_ferment_type {
        // Poolish is 100% hydration by definition; only biga is adjustable.
        PreFermentType::Poolish => 1.0,
        PreFermentType::Biga => params.biga_hydration,
    };
    let pf_flour = round_g(flour * params.pre_ferment_flour_percent);
    let pf_water = round_g(pf_flour * pf_hydration);

    let pre_ferment = PreFermentStage {
        kind: params.pre_ferment_type,
        flour_g: pf_flour,
        water_g: pf_water,
        // All of the yeast ferments in the first stage.
        yeast_g: yeast,
        hydration_pct: pf_hydration * 100.0,
        flour_share_pct: params.pre_ferment_flour_percent * 100.0,
    };
    let final_dough = FinalDoughStage {
        flour_g: flour - pf_flour,
        water_g: water - pf_water,
        salt_g: salt,
        yeast_g: 0.0,
        oil_g: oil,
        sugar_g: sugar,
    };

    Ok(CalculatedRecipe::TwoStage(TwoStageRecipe {
        pre_ferment,
        final_dough,
        total_weight_g: total,
        percentages,
    }))
}

/* ===========================
Unit tests
=========================== */

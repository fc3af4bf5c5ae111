//! Named style presets. Each style is a literal, version-controlled record:
//! a complete default parameter set plus presentation-only guidance. The
//! calculator never reads the metadata.

use crate::params::{PreFermentType, RecipeParameters};

pub const CUSTOM_STYLE_ID: &str = "custom";

/// Oven, flour and schedule guidance for one style. Consumed by the
/// presentation layer only.
#[derive(Copy, Clone, Debug)]
pub struct StyleMeta {
    pub equipment: &'static str,
    pub flour: &'static str,
    pub bake_temp_c: u16,
    pub bake_time: &'static str,
    pub fermentation: &'static str,
    pub tips: &'static [&'static str],
}

#[derive(Copy, Clone, Debug)]
pub struct StylePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub defaults: RecipeParameters,
    pub meta: StyleMeta,
}

// Latent pre-ferment defaults shared by the direct-dough styles: a style
// starts without a pre-ferment, but switching one on lands on a sane
// 25% poolish rather than zeroed fields.
const fn direct(
    num_balls: u32,
    ball_weight: f64,
    hydration: f64,
    salt: f64,
    yeast: f64,
    oil: f64,
    sugar: f64,
) -> RecipeParameters {
    RecipeParameters {
        num_balls,
        ball_weight,
        hydration,
        salt,
        yeast,
        oil,
        sugar,
        humidity_adjust: false,
        use_pre_ferment: false,
        pre_ferment_type: PreFermentType::Poolish,
        pre_ferment_flour_percent: 0.25,
        biga_hydration: 0.5,
    }
}

static STYLES: [StylePreset; 7] = [
    StylePreset {
        id: "neapolitan",
        name: "Neapolitan",
        defaults: direct(4, 250.0, 0.65, 0.02, 0.003, 0.0, 0.0),
        meta: StyleMeta {
            equipment: "Wood-fired or high-temperature pizza oven, pizza peel",
            flour: "Finely milled 00 flour, W260-300",
            bake_temp_c: 450,
            bake_time: "60-90 seconds",
            fermentation: "2 h bulk at room temperature, then 4-6 h in balls",
            tips: &[
                "Leave the cornicione untouched when stretching",
                "Turn the pizza every 20-30 seconds in the oven",
            ],
        },
    },
    StylePreset {
        id: "new-york",
        name: "New York",
        defaults: direct(4, 300.0, 0.62, 0.02, 0.004, 0.025, 0.02),
        meta: StyleMeta {
            equipment: "Home oven with baking steel or stone",
            flour: "High-protein bread flour (12.5-14%)",
            bake_temp_c: 280,
            bake_time: "6-8 minutes",
            fermentation: "1 h at room temperature, then 24-72 h cold in balls",
            tips: &[
                "The oil and sugar keep the crust tender and help browning",
                "Cold fermentation builds the classic flavour; 48 h is the sweet spot",
            ],
        },
    },
    StylePreset {
        id: "detroit",
        name: "Detroit",
        defaults: direct(2, 450.0, 0.70, 0.02, 0.005, 0.02, 0.01),
        meta: StyleMeta {
            equipment: "Rectangular steel pan (10x14\"), well oiled",
            flour: "Bread flour; the high hydration wants strong gluten",
            bake_temp_c: 260,
            bake_time: "12-15 minutes",
            fermentation: "2 h bulk, then 2-4 h proofed directly in the pan",
            tips: &[
                "Press the dough to the corners in two passes, resting between",
                "Cheese up to the pan edge makes the caramelised frico crown",
            ],
        },
    },
    StylePreset {
        id: "thin-crispy",
        name: "Thin & Crispy",
        defaults: direct(4, 180.0, 0.55, 0.02, 0.004, 0.03, 0.01),
        meta: StyleMeta {
            equipment: "Home oven, baking stone, rolling pin",
            flour: "All-purpose flour works fine at this hydration",
            bake_temp_c: 230,
            bake_time: "10-12 minutes",
            fermentation: "1 h bulk, 2 h in balls; long rests are unnecessary",
            tips: &[
                "Roll, don't stretch, for an even cracker-thin base",
                "Dock the dough to stop large bubbles",
            ],
        },
    },
    StylePreset {
        id: "poolish-biga",
        name: "Poolish / Biga",
        defaults: RecipeParameters {
            use_pre_ferment: true,
            pre_ferment_flour_percent: 0.3,
            ..direct(4, 250.0, 0.65, 0.025, 0.003, 0.0, 0.0)
        },
        meta: StyleMeta {
            equipment: "Same as Neapolitan; plus a covered container for the starter",
            flour: "00 or bread flour, W280+",
            bake_temp_c: 450,
            bake_time: "60-90 seconds",
            fermentation: "Pre-ferment 12-16 h at cool room temperature, final dough 3-4 h",
            tips: &[
                "All of the yeast goes into the pre-ferment; the final mix gets none",
                "A poolish is ready when domed and just starting to recede",
            ],
        },
    },
    StylePreset {
        id: "emergency",
        name: "Emergency",
        defaults: direct(4, 250.0, 0.60, 0.02, 0.01, 0.01, 0.01),
        meta: StyleMeta {
            equipment: "Home oven as hot as it goes, stone or steel if you have one",
            flour: "Whatever is in the cupboard",
            bake_temp_c: 250,
            bake_time: "7-9 minutes",
            fermentation: "Single 2 h rise at warm room temperature, ball half-way",
            tips: &[
                "The heavy yeast dose trades flavour for speed; eat it fresh",
                "Pair with the countdown timer so the balls do not over-proof",
            ],
        },
    },
    StylePreset {
        id: CUSTOM_STYLE_ID,
        name: "Custom",
        defaults: direct(4, 250.0, 0.60, 0.02, 0.003, 0.0, 0.0),
        meta: StyleMeta {
            equipment: "Your call",
            flour: "Match the flour to your target hydration",
            bake_temp_c: 250,
            bake_time: "varies",
            fermentation: "varies",
            tips: &["Start from a named style and nudge one parameter at a time"],
        },
    },
];

pub fn all_styles() -> &'static [StylePreset] {
    &STYLES
}

pub fn style_ids() -> impl Iterator<Item = &'static str> {
    STYLES.iter().map(|s| s.id)
}

pub fn style_by_id(id: &str) -> Option<&'static StylePreset> {
    STYLES.iter().find(|s| s.id == id)
}

/// Default parameters for a style id. Unknown ids fall back to the custom
/// style; this is a fallback, never an error.
pub fn defaults_for(id: &str) -> RecipeParameters {
    match style_by_id(id) {
        Some(style) => style.defaults,
        // custom is the last table entry
        None => STYLES[STYLES.len() - 1].defaults,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_styles_with_unique_ids() {
        let ids: Vec<_> = style_ids().collect();
        assert_eq!(ids.len(), 7);
        for id in &ids {
            assert_eq!(ids.iter().filter(|i| *i == id).count(), 1, "{id} duplicated");
        }
        assert!(ids.contains(&CUSTOM_STYLE_ID));
    }

    #[test]
    fn unknown_style_falls_back_to_custom() {
        let fallback = defaults_for("chicago-deep-dish");
        assert_eq!(fallback, defaults_for(CUSTOM_STYLE_ID));
    }

    #[test]
    fn pre_ferment_style_ships_enabled() {
        let preset = style_by_id("poolish-biga").unwrap();
        assert!(preset.defaults.use_pre_ferment);
        assert!(preset.defaults.pre_ferment_flour_percent > 0.0);
    }

    #[test]
    fn every_default_set_is_calculable() {
        for style in all_styles() {
            assert!(
                crate::calculator::calculate(&style.defaults).is_ok(),
                "style {} has broken defaults",
                style.id
            );
        }
    }
}

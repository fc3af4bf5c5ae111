use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

pub const GRAMS_PER_OUNCE: f64 = 28.3495;

/// Storage key for the persisted display-unit preference. The stored value
/// is exactly `"grams"` or `"ounces"`.
pub const UNIT_PREF_KEY: &str = "weight_unit";

/// Display unit for ingredient weights.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Grams,
    Ounces,
}

impl WeightUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightUnit::Grams => "grams",
            WeightUnit::Ounces => "ounces",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grams" => Some(WeightUnit::Grams),
            "ounces" => Some(WeightUnit::Ounces),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            WeightUnit::Grams => "g",
            WeightUnit::Ounces => "oz",
        }
    }
}

fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Convert a gram weight into the display unit, applying the unit's own
/// rounding: whole grams, ounces to one decimal.
pub fn convert_weight(grams: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Grams => grams.round(),
        WeightUnit::Ounces => round_tenth(grams / GRAMS_PER_OUNCE),
    }
}

pub fn format_weight(grams: f64, unit: WeightUnit) -> String {
    match unit {
        WeightUnit::Grams => format!("{:.0} {}", convert_weight(grams, unit), unit.suffix()),
        WeightUnit::Ounces => format!("{:.1} {}", convert_weight(grams, unit), unit.suffix()),
    }
}

/// Like [`format_weight`], but doses under 10 g keep one decimal place in
/// either unit. A 1.8 g yeast dose must not display as "2 g".
pub fn format_weight_precise(grams: f64, unit: WeightUnit) -> String {
    if grams < 10.0 {
        let value = match unit {
            WeightUnit::Grams => round_tenth(grams),
            WeightUnit::Ounces => round_tenth(grams / GRAMS_PER_OUNCE),
        };
        format!("{:.1} {}", value, unit.suffix())
    } else {
        format_weight(grams, unit)
    }
}

/// Read the persisted unit preference, defaulting to grams when the store
/// is unavailable or holds an unknown value.
pub fn load_unit_preference(store: &impl KeyValueStore) -> WeightUnit {
    match store.get(UNIT_PREF_KEY) {
        Ok(Some(raw)) => WeightUnit::parse(&raw).unwrap_or_default(),
        Ok(None) => WeightUnit::default(),
        Err(err) => {
            tracing::warn!(%err, "unit preference unreadable, defaulting to grams");
            WeightUnit::default()
        }
    }
}

/// Persist the unit preference. Best-effort: failures are logged, not
/// surfaced.
pub fn save_unit_preference(store: &mut impl KeyValueStore, unit: WeightUnit) {
    if let Err(err) = store.set(UNIT_PREF_KEY, unit.as_str()) {
        tracing::warn!(%err, "could not persist unit preference");
    }
}

/* ===========================
Volume conversion
=========================== */

pub const TABLESPOONS_PER_CUP: f64 = 16.0;
pub const TEASPOONS_PER_CUP: f64 = 48.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VolumeUnit {
    Cup,
    Tablespoon,
    Teaspoon,
}

/// Measured density for one ingredient. Sub-cup densities are optional;
/// when absent the cup figure is divided down (16 tbsp / 48 tsp per cup).
#[derive(Copy, Clone, Debug)]
pub struct VolumeDensity {
    pub ingredient: &'static str,
    pub grams_per_cup: f64,
    pub grams_per_tablespoon: Option<f64>,
    pub grams_per_teaspoon: Option<f64>,
}

impl VolumeDensity {
    pub fn grams_per(&self, unit: VolumeUnit) -> f64 {
        match unit {
            VolumeUnit::Cup => self.grams_per_cup,
            VolumeUnit::Tablespoon => self
                .grams_per_tablespoon
                .unwrap_or(self.grams_per_cup / TABLESPOONS_PER_CUP),
            VolumeUnit::Teaspoon => self
                .grams_per_teaspoon
                .unwrap_or(self.grams_per_cup / TEASPOONS_PER_CUP),
        }
    }
}

// Spooned-and-leveled cup weights; salt/yeast/sugar get measured spoon
// weights because the cup ratio is too coarse at those doses.
static DENSITIES: [VolumeDensity; 6] = [
    VolumeDensity {
        ingredient: "flour",
        grams_per_cup: 125.0,
        grams_per_tablespoon: None,
        grams_per_teaspoon: None,
    },
    VolumeDensity {
        ingredient: "water",
        grams_per_cup: 236.6,
        grams_per_tablespoon: None,
        grams_per_teaspoon: None,
    },
    VolumeDensity {
        ingredient: "salt",
        grams_per_cup: 273.0,
        grams_per_tablespoon: Some(17.1),
        grams_per_teaspoon: Some(5.7),
    },
    VolumeDensity {
        ingredient: "yeast",
        grams_per_cup: 150.0,
        grams_per_tablespoon: Some(9.4),
        grams_per_teaspoon: Some(3.1),
    },
    VolumeDensity {
        ingredient: "oil",
        grams_per_cup: 218.0,
        grams_per_tablespoon: Some(13.6),
        grams_per_teaspoon: None,
    },
    VolumeDensity {
        ingredient: "sugar",
        grams_per_cup: 200.0,
        grams_per_tablespoon: Some(12.5),
        grams_per_teaspoon: Some(4.2),
    },
];

pub fn densities() -> &'static [VolumeDensity] {
    &DENSITIES
}

pub fn density_for(ingredient: &str) -> Option<&'static VolumeDensity> {
    DENSITIES.iter().find(|d| d.ingredient == ingredient)
}

/// Grams for a volume measure of an ingredient, `None` for unknown
/// ingredients.
pub fn volume_to_grams(ingredient: &str, amount: f64, unit: VolumeUnit) -> Option<f64> {
    density_for(ingredient).map(|d| amount * d.grams_per(unit))
}

/// Volume measure equivalent to a gram weight, `None` for unknown
/// ingredients.
pub fn grams_to_volume(ingredient: &str, grams: f64, unit: VolumeUnit) -> Option<f64> {
    density_for(ingredient).map(|d| grams / d.grams_per(unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use approx::assert_relative_eq;

    #[test]
    fn ounces_round_to_one_decimal() {
        assert_relative_eq!(convert_weight(598.0, WeightUnit::Ounces), 21.1);
        assert_relative_eq!(convert_weight(598.0, WeightUnit::Grams), 598.0);
        assert_relative_eq!(convert_weight(598.4, WeightUnit::Grams), 598.0);
    }

    #[test]
    fn small_doses_keep_a_decimal() {
        assert_eq!(format_weight_precise(1.8, WeightUnit::Grams), "1.8 g");
        assert_eq!(format_weight_precise(1.8, WeightUnit::Ounces), "0.1 oz");
        assert_eq!(format_weight_precise(389.0, WeightUnit::Grams), "389 g");
    }

    #[test]
    fn spoon_fallback_divides_the_cup() {
        // flour has no spoon density recorded
        let per_tbsp = density_for("flour").unwrap().grams_per(VolumeUnit::Tablespoon);
        assert_relative_eq!(per_tbsp, 125.0 / 16.0);
        let per_tsp = density_for("flour").unwrap().grams_per(VolumeUnit::Teaspoon);
        assert_relative_eq!(per_tsp, 125.0 / 48.0);

        // salt uses its measured teaspoon weight, not the cup ratio
        let salt_tsp = density_for("salt").unwrap().grams_per(VolumeUnit::Teaspoon);
        assert_relative_eq!(salt_tsp, 5.7);
    }

    #[test]
    fn volume_lookup_unknown_ingredient() {
        assert!(volume_to_grams("saffron", 1.0, VolumeUnit::Cup).is_none());
        assert_relative_eq!(
            volume_to_grams("water", 2.0, VolumeUnit::Cup).unwrap(),
            473.2
        );
    }

    #[test]
    fn unit_preference_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(load_unit_preference(&store), WeightUnit::Grams);
        save_unit_preference(&mut store, WeightUnit::Ounces);
        assert_eq!(load_unit_preference(&store), WeightUnit::Ounces);
        // stored form is the stable string, not a serde wrapper
        assert_eq!(
            store.get(UNIT_PREF_KEY).unwrap().as_deref(),
            Some("ounces")
        );
    }
}

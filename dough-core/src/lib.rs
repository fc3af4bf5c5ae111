//! Core engine for the dough calculator: baker's-percentage recipe
//! computation (single- and two-stage), named style presets, a share-link
//! codec, weight/volume unit conversion, and a persistence-backed
//! countdown timer. Everything here is pure and synchronous; rendering
//! and scheduling belong to the front-end.

pub mod calculator;
pub mod error;
pub mod params;
pub mod presets;
pub mod share;
pub mod storage;
pub mod timer;
pub mod units;

pub use calculator::{
    BakersPercentages, CalculatedRecipe, FinalDoughStage, HUMIDITY_HYDRATION_OFFSET,
    PreFermentStage, SingleStageRecipe, TwoStageRecipe, calculate,
};
pub use error::{InvalidParameters, StorageError};
pub use params::{PreFermentType, RecipeParameters};
pub use presets::{CUSTOM_STYLE_ID, StyleMeta, StylePreset, all_styles, defaults_for, style_by_id};
pub use share::{SharedRecipe, decode, encode};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use timer::{Clock, EmergencyTimer, SystemClock, TIMER_SNAPSHOT_KEY, TimerEvent, TimerSnapshot};
pub use units::{
    VolumeDensity, VolumeUnit, WeightUnit, convert_weight, format_weight, format_weight_precise,
    load_unit_preference, save_unit_preference, volume_to_grams,
};

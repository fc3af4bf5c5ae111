use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use std::{fs, thread};

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use dough_core::{
    CalculatedRecipe, EmergencyTimer, InvalidParameters, JsonFileStore, KeyValueStore, MemoryStore,
    PreFermentType, RecipeParameters, SharedRecipe, SingleStageRecipe, TIMER_SNAPSHOT_KEY,
    TimerEvent, TwoStageRecipe, WeightUnit, calculate, defaults_for,
    format_weight, format_weight_precise, load_unit_preference, presets, save_unit_preference,
    share, units,
};

/// Display unit mirrors dough-core (derive for Clap).
#[derive(Copy, Clone, Debug, ValueEnum)]
enum UnitFlag {
    Grams,
    Ounces,
}

impl From<UnitFlag> for WeightUnit {
    fn from(u: UnitFlag) -> Self {
        match u {
            UnitFlag::Grams => WeightUnit::Grams,
            UnitFlag::Ounces => WeightUnit::Ounces,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PreFermentFlag {
    Poolish,
    Biga,
    /// Direct dough, no pre-ferment
    Off,
}

#[derive(Parser, Debug)]
#[command(
    name = "dough-cli",
    about = "Pizza dough calculator: baker's percentages, share links, countdown timer.",
    version
)]
struct Cli {
    /// Local state file (display unit preference, timer snapshot)
    #[arg(long, default_value = ".dough-state.json", global = true)]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute ingredient weights for a style, with optional overrides
    Recipe {
        /// Style id (see `styles`); unknown ids fall back to custom
        #[arg(long, default_value = "custom")]
        style: String,

        /// Number of dough balls
        #[arg(long)]
        balls: Option<u32>,

        /// Weight of one ball in grams
        #[arg(long)]
        ball_weight: Option<f64>,

        /// Hydration in percent of flour, e.g. 65
        #[arg(long)]
        hydration: Option<f64>,

        /// Salt in percent of flour, e.g. 2.0
        #[arg(long)]
        salt: Option<f64>,

        /// Yeast in percent of flour, e.g. 0.3
        #[arg(long)]
        yeast: Option<f64>,

        /// Oil in percent of flour
        #[arg(long)]
        oil: Option<f64>,

        /// Sugar in percent of flour
        #[arg(long)]
        sugar: Option<f64>,

        /// Knock 2.5 points off hydration for a humid kitchen
        #[arg(long)]
        humidity_adjust: bool,

        /// Ferment part of the flour first
        #[arg(long, value_enum)]
        pre_ferment: Option<PreFermentFlag>,

        /// Percent of the flour in the pre-ferment, e.g. 25
        #[arg(long)]
        pre_ferment_flour: Option<f64>,

        /// Biga hydration in percent, e.g. 50
        #[arg(long)]
        biga_hydration: Option<f64>,

        /// Display unit (persisted as the new preference)
        #[arg(long, value_enum)]
        units: Option<UnitFlag>,

        /// Apply parameters from a share link before the flags above
        #[arg(long)]
        link: Option<String>,

        /// Print a share link for the effective parameters
        #[arg(long)]
        share: bool,

        /// Load a parameter profile JSON before applying flags
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Save the effective parameters to a profile JSON
        #[arg(long)]
        save_profile: Option<PathBuf>,
    },

    /// List the built-in styles, or show one style in detail
    Styles {
        /// Style id to expand
        id: Option<String>,
    },

    /// Decode a share link and print the recipe it describes
    Share {
        link: String,

        #[arg(long, value_enum)]
        units: Option<UnitFlag>,
    },

    /// Run the countdown timer; resumes a persisted countdown if one exists
    Timer {
        /// Countdown length in minutes
        #[arg(long, default_value_t = 120)]
        minutes: i64,

        /// Discard any persisted countdown and start fresh
        #[arg(long)]
        fresh: bool,
    },

    /// Volume equivalents (cups/tbsp/tsp) for an ingredient weight
    Volume {
        /// flour, water, salt, yeast, oil or sugar
        ingredient: String,

        /// Weight in grams
        grams: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Recipe {
            style,
            balls,
            ball_weight,
            hydration,
            salt,
            yeast,
            oil,
            sugar,
            humidity_adjust,
            pre_ferment,
            pre_ferment_flour,
            biga_hydration,
            units,
            link,
            share,
            profile,
            save_profile,
        } => {
            let mut params = defaults_for(&style);

            if let Some(path) = &profile {
                params = load_profile(path);
            }
            if let Some(link) = &link {
                let Some(decoded) = dough_core::decode(link) else {
                    eprintln!("Not a share link: {link}");
                    std::process::exit(1);
                };
                params = decoded.overlay_on(params);
            }

            if let Some(n) = balls {
                params.num_balls = n;
            }
            if let Some(w) = ball_weight {
                params.ball_weight = w;
            }
            if let Some(h) = hydration {
                params.hydration = h / 100.0;
            }
            if let Some(s) = salt {
                params.salt = s / 100.0;
            }
            if let Some(y) = yeast {
                params.yeast = y / 100.0;
            }
            if let Some(o) = oil {
                params.oil = o / 100.0;
            }
            if let Some(s) = sugar {
                params.sugar = s / 100.0;
            }
            if humidity_adjust {
                params.humidity_adjust = true;
            }
            match pre_ferment {
                Some(PreFermentFlag::Poolish) => {
                    params.use_pre_ferment = true;
                    params.pre_ferment_type = PreFermentType::Poolish;
                }
                Some(PreFermentFlag::Biga) => {
                    params.use_pre_ferment = true;
                    params.pre_ferment_type = PreFermentType::Biga;
                }
                Some(PreFermentFlag::Off) => params.use_pre_ferment = false,
                None => {}
            }
            if let Some(p) = pre_ferment_flour {
                params.pre_ferment_flour_percent = p / 100.0;
            }
            if let Some(h) = biga_hydration {
                params.biga_hydration = h / 100.0;
            }

            if let Some(path) = &save_profile {
                save_profile_file(path, &params);
            }

            let unit = resolve_unit(&cli.state_file, units);
            let recipe = calculate_or_exit(&params);
            render_recipe(&params, &recipe, unit);

            if share {
                let query = dough_core::encode(&SharedRecipe::from_params(Some(&style), &params));
                println!("\nShare link query: ?{query}");
            }
        }

        Commands::Styles { id } => match id {
            Some(id) => print_style_detail(&id),
            None => print_style_list(),
        },

        Commands::Share { link, units } => {
            let Some(decoded) = share::decode(&link) else {
                eprintln!("Not a share link: {link}");
                std::process::exit(1);
            };
            let style = decoded.style.clone().unwrap_or_else(|| "custom".to_owned());
            let params = decoded.overlay_on(defaults_for(&style));

            println!("Style: {style}");
            if let Some(ft) = &decoded.flour_type {
                println!("Flour: {ft}");
            }
            let unit = resolve_unit(&cli.state_file, units);
            let recipe = calculate_or_exit(&params);
            render_recipe(&params, &recipe, unit);
        }

        Commands::Timer { minutes, fresh } => run_timer(&cli.state_file, minutes, fresh),

        Commands::Volume { ingredient, grams } => {
            let Some(density) = units::density_for(&ingredient) else {
                eprintln!(
                    "No volume table for '{ingredient}'. Known: {}",
                    units::densities()
                        .iter()
                        .map(|d| d.ingredient)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                std::process::exit(1);
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("Measure").add_attribute(Attribute::Bold),
                    Cell::new("Amount").add_attribute(Attribute::Bold),
                ]);
            for (label, unit) in [
                ("Cups", units::VolumeUnit::Cup),
                ("Tablespoons", units::VolumeUnit::Tablespoon),
                ("Teaspoons", units::VolumeUnit::Teaspoon),
            ] {
                table.add_row(vec![
                    Cell::new(label),
                    Cell::new(format!("{:.2}", grams / density.grams_per(unit))),
                ]);
            }
            println!("{grams:.0} g of {ingredient}:");
            println!("{table}");
        }
    }
}

fn load_profile(path: &PathBuf) -> RecipeParameters {
    let Ok(txt) = fs::read_to_string(path) else {
        eprintln!("Failed to read profile: {}", path.display());
        std::process::exit(1);
    };
    match serde_json::from_str(&txt) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("Invalid profile JSON {}: {err}", path.display());
            std::process::exit(1);
        }
    }
}

fn save_profile_file(path: &PathBuf, params: &RecipeParameters) {
    let json = match serde_json::to_string_pretty(params) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("Failed to encode profile: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = fs::write(path, json) {
        eprintln!("Failed to save profile: {err}");
        std::process::exit(1);
    }
    println!("Profile saved to {}", path.display());
}

fn calculate_or_exit(params: &RecipeParameters) -> CalculatedRecipe {
    match calculate(params) {
        Ok(recipe) => recipe,
        Err(InvalidParameters { reason }) => {
            eprintln!("Cannot compute recipe: {reason}");
            std::process::exit(1);
        }
    }
}

/// Explicit flag wins and becomes the persisted preference; otherwise the
/// stored preference, defaulting to grams.
fn resolve_unit(state_file: &PathBuf, flag: Option<UnitFlag>) -> WeightUnit {
    let mut store = open_store(state_file);
    match flag {
        Some(flag) => {
            let unit = flag.into();
            save_unit_preference(&mut store, unit);
            unit
        }
        None => load_unit_preference(&store),
    }
}

/// File-backed store, degrading to memory-only when the file is
/// unavailable.
fn open_store(state_file: &PathBuf) -> Box<dyn KeyValueStore> {
    match JsonFileStore::open(state_file) {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!(%err, "state file unavailable, preferences will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

fn ingredient_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Ingredient").add_attribute(Attribute::Bold),
            Cell::new("Amount").add_attribute(Attribute::Bold),
            Cell::new("Baker's %").add_attribute(Attribute::Bold),
        ]);
    table
}

fn render_recipe(params: &RecipeParameters, recipe: &CalculatedRecipe, unit: WeightUnit) {
    println!(
        "\n{} ball(s) x {:.0} g = {:.0} g dough",
        params.num_balls,
        params.ball_weight,
        recipe.total_weight_g()
    );

    match recipe {
        CalculatedRecipe::SingleStage(r) => render_single_stage(r, unit),
        CalculatedRecipe::TwoStage(r) => render_two_stage(r, unit),
    }
}

fn render_single_stage(r: &SingleStageRecipe, unit: WeightUnit) {
    let pct = &r.percentages;
    let mut table = ingredient_table();
    table.add_row(vec![
        Cell::new("Flour"),
        Cell::new(format_weight(r.flour_g, unit)),
        Cell::new("100%"),
    ]);
    table.add_row(vec![
        Cell::new("Water"),
        Cell::new(format_weight(r.water_g, unit)),
        Cell::new(format!("{:.1}%", pct.hydration)),
    ]);
    table.add_row(vec![
        Cell::new("Salt"),
        Cell::new(format_weight_precise(r.salt_g, unit)),
        Cell::new(format!("{:.1}%", pct.salt)),
    ]);
    table.add_row(vec![
        Cell::new("Yeast"),
        Cell::new(format_weight_precise(r.yeast_g, unit)),
        Cell::new(format!("{:.2}%", pct.yeast)),
    ]);
    if r.oil_g > 0.0 {
        table.add_row(vec![
            Cell::new("Oil"),
            Cell::new(format_weight(r.oil_g, unit)),
            Cell::new(format!("{:.1}%", pct.oil)),
        ]);
    }
    if r.sugar_g > 0.0 {
        table.add_row(vec![
            Cell::new("Sugar"),
            Cell::new(format_weight(r.sugar_g, unit)),
            Cell::new(format!("{:.1}%", pct.sugar)),
        ]);
    }
    println!("{table}");
}

fn render_two_stage(r: &TwoStageRecipe, unit: WeightUnit) {
    let pf = &r.pre_ferment;
    println!(
        "\n=== Pre-ferment: {} ({:.0}% of flour at {:.0}% hydration) ===",
        pf.kind.as_str(),
        pf.flour_share_pct,
        pf.hydration_pct
    );
    let mut table = ingredient_table();
    table.add_row(vec![
        Cell::new("Flour"),
        Cell::new(format_weight(pf.flour_g, unit)),
        Cell::new(format!("{:.0}%", pf.flour_share_pct)),
    ]);
    table.add_row(vec![
        Cell::new("Water"),
        Cell::new(format_weight(pf.water_g, unit)),
        Cell::new(format!("{:.0}%", pf.hydration_pct)),
    ]);
    table.add_row(vec![
        Cell::new("Yeast"),
        Cell::new(format_weight_precise(pf.yeast_g, unit)),
        Cell::new("all of it"),
    ]);
    println!("{table}");

    let fd = &r.final_dough;
    let pct = &r.percentages;
    println!("\n=== Final dough (add the ripe pre-ferment) ===");
    let mut table = ingredient_table();
    table.add_row(vec![
        Cell::new("Flour"),
        Cell::new(format_weight(fd.flour_g, unit)),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Water"),
        Cell::new(format_weight(fd.water_g, unit)),
        Cell::new(format!("{:.1}% overall", pct.hydration)),
    ]);
    table.add_row(vec![
        Cell::new("Salt"),
        Cell::new(format_weight_precise(fd.salt_g, unit)),
        Cell::new(format!("{:.1}%", pct.salt)),
    ]);
    table.add_row(vec![
        Cell::new("Yeast"),
        Cell::new("none"),
        Cell::new("the pre-ferment carries it"),
    ]);
    if fd.oil_g > 0.0 {
        table.add_row(vec![
            Cell::new("Oil"),
            Cell::new(format_weight(fd.oil_g, unit)),
            Cell::new(format!("{:.1}%", pct.oil)),
        ]);
    }
    if fd.sugar_g > 0.0 {
        table.add_row(vec![
            Cell::new("Sugar"),
            Cell::new(format_weight(fd.sugar_g, unit)),
            Cell::new(format!("{:.1}%", pct.sugar)),
        ]);
    }
    println!("{table}");
}

fn print_style_list() {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").add_attribute(Attribute::Bold),
            Cell::new("Style").add_attribute(Attribute::Bold),
            Cell::new("Hydration").add_attribute(Attribute::Bold),
            Cell::new("Balls").add_attribute(Attribute::Bold),
            Cell::new("Bake").add_attribute(Attribute::Bold),
        ]);
    for style in presets::all_styles() {
        let d = &style.defaults;
        table.add_row(vec![
            Cell::new(style.id),
            Cell::new(style.name),
            Cell::new(format!("{:.0}%", d.hydration * 100.0)),
            Cell::new(format!("{} x {:.0} g", d.num_balls, d.ball_weight)),
            Cell::new(format!(
                "{}°C, {}",
                style.meta.bake_temp_c, style.meta.bake_time
            )),
        ]);
    }
    println!("{table}");
}

fn print_style_detail(id: &str) {
    let Some(style) = presets::style_by_id(id) else {
        eprintln!("Unknown style '{id}'; run `styles` for the list");
        std::process::exit(1);
    };
    let d = &style.defaults;
    println!("{} ({})", style.name, style.id);
    println!("  Dough:        {} x {:.0} g", d.num_balls, d.ball_weight);
    println!(
        "  Percentages:  {:.0}% water, {:.1}% salt, {:.2}% yeast, {:.1}% oil, {:.1}% sugar",
        d.hydration * 100.0,
        d.salt * 100.0,
        d.yeast * 100.0,
        d.oil * 100.0,
        d.sugar * 100.0
    );
    if d.use_pre_ferment {
        println!(
            "  Pre-ferment:  {} with {:.0}% of the flour",
            d.pre_ferment_type.as_str(),
            d.pre_ferment_flour_percent * 100.0
        );
    }
    println!("  Equipment:    {}", style.meta.equipment);
    println!("  Flour:        {}", style.meta.flour);
    println!(
        "  Bake:         {}°C, {}",
        style.meta.bake_temp_c, style.meta.bake_time
    );
    println!("  Fermentation: {}", style.meta.fermentation);
    for tip in style.meta.tips {
        println!("  • {tip}");
    }
}

fn fmt_countdown(ms: i64) -> String {
    let total_secs = (ms + 999) / 1000; // show 0:00 only at true zero
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Terminal bell plus a line of text. Output failures are irrelevant to
/// the countdown and ignored.
fn notify_completion() {
    let mut out = std::io::stdout();
    let _ = writeln!(out, "\x07\nTime's up! Get the dough in the oven.");
    let _ = out.flush();
}

fn run_timer(state_file: &PathBuf, minutes: i64, fresh: bool) {
    let mut store = open_store(state_file);
    if fresh {
        if let Err(err) = store.remove(TIMER_SNAPSHOT_KEY) {
            tracing::warn!(%err, "could not discard persisted countdown");
        }
    }

    let (mut timer, resumed) = EmergencyTimer::new(minutes * 60_000, store);
    match resumed {
        Some(TimerEvent::Completed) => {
            // it ran out while no process was watching
            notify_completion();
            return;
        }
        Some(TimerEvent::Started) => {
            println!(
                "Resuming countdown: {} left",
                fmt_countdown(timer.remaining_ms())
            );
        }
        _ => {
            timer.start();
        }
    }

    let end = Local::now() + chrono::Duration::milliseconds(timer.remaining_ms());
    println!(
        "Counting down {} (until ~{}). Ctrl+C to leave; the countdown resumes on next run.",
        fmt_countdown(timer.remaining_ms()),
        end.format("%H:%M")
    );

    loop {
        thread::sleep(Duration::from_secs(1));
        match timer.tick() {
            Some(TimerEvent::Tick { remaining_ms }) => {
                print!("\r{}   ", fmt_countdown(remaining_ms));
                let _ = std::io::stdout().flush();
            }
            Some(TimerEvent::Completed) => {
                notify_completion();
                break;
            }
            _ => break,
        }
    }
}

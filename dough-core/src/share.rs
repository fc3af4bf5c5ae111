//! Share-link codec.
//!
//! A recipe serialises to a short query string (`n=4&w=250&h=65&...`) with
//! one- or two-letter keys. Percent-like fields travel as scaled integers
//! (hydration x100, salt/yeast x1000, oil/sugar/pre-ferment share x100) so
//! links never carry floating-point noise. Only fields that differ from
//! the unset baseline are emitted, keeping links short.
//!
//! Decoding is forgiving: unknown or malformed keys are dropped without
//! error, and missing fields stay `None` so the caller can overlay the
//! decoded values onto a style's defaults.

use crate::params::{PreFermentType, RecipeParameters};

/// Partial view of a recipe as carried by a share link. Decorative fields
/// (`style`, `flour_type`) ride along for the presentation layer; the
/// calculator never sees them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedRecipe {
    pub style: Option<String>,
    pub num_balls: Option<u32>,
    pub ball_weight: Option<f64>,
    pub hydration: Option<f64>,
    pub salt: Option<f64>,
    pub yeast: Option<f64>,
    pub oil: Option<f64>,
    pub sugar: Option<f64>,
    pub use_pre_ferment: bool,
    pub pre_ferment_type: Option<PreFermentType>,
    pub pre_ferment_flour_percent: Option<f64>,
    pub humidity_adjust: bool,
    pub flour_type: Option<String>,
}

impl SharedRecipe {
    /// Full snapshot of a parameter set, ready for [`encode`].
    pub fn from_params(style: Option<&str>, params: &RecipeParameters) -> Self {
        Self {
            style: style.map(str::to_owned),
            num_balls: Some(params.num_balls),
            ball_weight: Some(params.ball_weight),
            hydration: Some(params.hydration),
            salt: Some(params.salt),
            yeast: Some(params.yeast),
            oil: Some(params.oil),
            sugar: Some(params.sugar),
            use_pre_ferment: params.use_pre_ferment,
            pre_ferment_type: Some(params.pre_ferment_type),
            pre_ferment_flour_percent: Some(params.pre_ferment_flour_percent),
            humidity_adjust: params.humidity_adjust,
            flour_type: None,
        }
    }

    /// Fill the gaps with `base` (typically the shared style's defaults).
    /// Booleans are definitive in a link (an omitted flag means off), so
    /// they are taken verbatim, not merged.
    pub fn overlay_on(&self, base: RecipeParameters) -> RecipeParameters {
        RecipeParameters {
            num_balls: self.num_balls.unwrap_or(base.num_balls),
            ball_weight: self.ball_weight.unwrap_or(base.ball_weight),
            hydration: self.hydration.unwrap_or(base.hydration),
            salt: self.salt.unwrap_or(base.salt),
            yeast: self.yeast.unwrap_or(base.yeast),
            oil: self.oil.unwrap_or(base.oil),
            sugar: self.sugar.unwrap_or(base.sugar),
            humidity_adjust: self.humidity_adjust,
            use_pre_ferment: self.use_pre_ferment,
            pre_ferment_type: self.pre_ferment_type.unwrap_or(base.pre_ferment_type),
            pre_ferment_flour_percent: self
                .pre_ferment_flour_percent
                .unwrap_or(base.pre_ferment_flour_percent),
            // the link format carries no biga-hydration key
            biga_hydration: base.biga_hydration,
        }
    }
}

fn scaled(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

/// Serialise to the query-string form (no leading `?`).
pub fn encode(share: &SharedRecipe) -> String {
    let mut pairs: Vec<String> = Vec::new();

    if let Some(style) = &share.style {
        pairs.push(format!("s={}", urlencoding::encode(style)));
    }
    if let Some(n) = share.num_balls {
        pairs.push(format!("n={n}"));
    }
    if let Some(w) = share.ball_weight {
        pairs.push(format!("w={}", w.round() as i64));
    }
    if let Some(h) = share.hydration {
        pairs.push(format!("h={}", scaled(h, 100.0)));
    }
    if let Some(sa) = share.salt {
        pairs.push(format!("sa={}", scaled(sa, 1000.0)));
    }
    if let Some(y) = share.yeast {
        pairs.push(format!("y={}", scaled(y, 1000.0)));
    }
    // oil and sugar stay out of the link when zero
    if let Some(o) = share.oil {
        if scaled(o, 100.0) != 0 {
            pairs.push(format!("o={}", scaled(o, 100.0)));
        }
    }
    if let Some(su) = share.sugar {
        if scaled(su, 100.0) != 0 {
            pairs.push(format!("su={}", scaled(su, 100.0)));
        }
    }
    if share.use_pre_ferment {
        pairs.push("pf=1".to_owned());
        if let Some(t) = share.pre_ferment_type {
            pairs.push(format!("pft={}", t.as_str()));
        }
        if let Some(p) = share.pre_ferment_flour_percent {
            pairs.push(format!("pfp={}", scaled(p, 100.0)));
        }
    }
    if share.humidity_adjust {
        pairs.push("ha=1".to_owned());
    }
    if let Some(ft) = &share.flour_type {
        pairs.push(format!("ft={}", urlencoding::encode(ft)));
    }

    pairs.join("&")
}

/// Query-string portion of the input: everything after the first `?`, or
/// the input itself when it already looks like a bare query string.
fn query_of(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(idx) = trimmed.find('?') {
        return Some(&trimmed[idx + 1..]);
    }
    if trimmed.contains('=') {
        return Some(trimmed);
    }
    None
}

/// Parse a share link (full URL or raw query string) into a partial
/// recipe. Returns `None` only when the input is neither; individual bad
/// keys or values are silently dropped.
pub fn decode(input: &str) -> Option<SharedRecipe> {
    let query = query_of(input)?;
    let mut share = SharedRecipe::default();

    for pair in query.split('&') {
        let Some((key, raw)) = pair.split_once('=') else {
            continue;
        };
        let Ok(value) = urlencoding::decode(raw) else {
            continue;
        };
        match key {
            "s" => share.style = Some(value.into_owned()),
            "n" => share.num_balls = value.parse().ok(),
            "w" => share.ball_weight = value.parse::<u32>().ok().map(f64::from),
            "h" => share.hydration = value.parse::<i64>().ok().map(|v| v as f64 / 100.0),
            "sa" => share.salt = value.parse::<i64>().ok().map(|v| v as f64 / 1000.0),
            "y" => share.yeast = value.parse::<i64>().ok().map(|v| v as f64 / 1000.0),
            "o" => share.oil = value.parse::<i64>().ok().map(|v| v as f64 / 100.0),
            "su" => share.sugar = value.parse::<i64>().ok().map(|v| v as f64 / 100.0),
            "pf" => share.use_pre_ferment = value == "1",
            "pft" => share.pre_ferment_type = PreFermentType::parse(&value),
            "pfp" => {
                share.pre_ferment_flour_percent =
                    value.parse::<i64>().ok().map(|v| v as f64 / 100.0);
            }
            "ha" => share.humidity_adjust = value == "1",
            "ft" => share.flour_type = Some(value.into_owned()),
            _ => {}
        }
    }

    Some(share)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use approx::assert_relative_eq;

    fn neapolitan() -> RecipeParameters {
        presets::defaults_for("neapolitan")
    }

    #[test]
    fn encode_skips_unset_baseline() {
        let share = SharedRecipe::from_params(Some("neapolitan"), &neapolitan());
        let query = encode(&share);
        assert_eq!(query, "s=neapolitan&n=4&w=250&h=65&sa=20&y=3");
    }

    #[test]
    fn encode_emits_pre_ferment_block_only_when_on() {
        let mut params = neapolitan();
        params.use_pre_ferment = true;
        params.pre_ferment_type = PreFermentType::Biga;
        params.pre_ferment_flour_percent = 0.3;
        let query = encode(&SharedRecipe::from_params(None, &params));
        assert!(query.contains("pf=1&pft=biga&pfp=30"));

        params.use_pre_ferment = false;
        let query = encode(&SharedRecipe::from_params(None, &params));
        assert!(!query.contains("pf"));
    }

    #[test]
    fn round_trip_reproduces_parameters() {
        let mut params = neapolitan();
        params.oil = 0.02;
        params.sugar = 0.01;
        params.humidity_adjust = true;
        params.use_pre_ferment = true;
        params.pre_ferment_flour_percent = 0.25;

        let encoded = encode(&SharedRecipe::from_params(Some("custom"), &params));
        let decoded = decode(&encoded).unwrap();
        let rebuilt = decoded.overlay_on(presets::defaults_for("custom"));

        assert_eq!(rebuilt.num_balls, params.num_balls);
        assert_relative_eq!(rebuilt.ball_weight, params.ball_weight);
        assert_relative_eq!(rebuilt.hydration, params.hydration);
        assert_relative_eq!(rebuilt.salt, params.salt);
        assert_relative_eq!(rebuilt.yeast, params.yeast);
        assert_relative_eq!(rebuilt.oil, params.oil);
        assert_relative_eq!(rebuilt.sugar, params.sugar);
        assert!(rebuilt.humidity_adjust);
        assert!(rebuilt.use_pre_ferment);
        assert_eq!(rebuilt.pre_ferment_type, params.pre_ferment_type);
        assert_relative_eq!(
            rebuilt.pre_ferment_flour_percent,
            params.pre_ferment_flour_percent
        );
    }

    #[test]
    fn decode_accepts_full_urls() {
        let decoded =
            decode("https://example.com/calculator?h=70&n=2&w=280").unwrap();
        assert_relative_eq!(decoded.hydration.unwrap(), 0.70);
        assert_eq!(decoded.num_balls, Some(2));
        assert_relative_eq!(decoded.ball_weight.unwrap(), 280.0);
    }

    #[test]
    fn decode_drops_unknown_and_malformed_keys() {
        let decoded = decode("h=65&bogus=1&sa=notanumber&=orphan&y=3").unwrap();
        assert_relative_eq!(decoded.hydration.unwrap(), 0.65);
        assert_eq!(decoded.salt, None);
        assert_relative_eq!(decoded.yeast.unwrap(), 0.003);
    }

    #[test]
    fn decode_rejects_non_links() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("   "), None);
        assert_eq!(decode("just some words"), None);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults_on_overlay() {
        let decoded = decode("h=70").unwrap();
        let base = neapolitan();
        let rebuilt = decoded.overlay_on(base);
        assert_relative_eq!(rebuilt.hydration, 0.70);
        assert_eq!(rebuilt.num_balls, base.num_balls);
        assert_relative_eq!(rebuilt.salt, base.salt);
        // no ha key in the link means the flag is off
        assert!(!rebuilt.humidity_adjust);
    }

    #[test]
    fn style_and_flour_type_survive_percent_encoding() {
        let mut share = SharedRecipe::default();
        share.style = Some("new-york".to_owned());
        share.flour_type = Some("00 flour".to_owned());
        let query = encode(&share);
        assert!(query.contains("ft=00%20flour"));

        let decoded = decode(&query).unwrap();
        assert_eq!(decoded.style.as_deref(), Some("new-york"));
        assert_eq!(decoded.flour_type.as_deref(), Some("00 flour"));
    }
}

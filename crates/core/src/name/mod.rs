//! Vehicle name resolution.
//!
//! Turns a noisy listing title ("Yamaha R3 2016/2017 vermelha ABS") into the
//! canonical cache key ("yamaha r3 2016"), and derives the query variations
//! used when searching image sources.
//!
//! ### Normalization
//! - Lowercase and trim, then pull the model year out before any stripping.
//! - Punctuation becomes whitespace, whitespace is collapsed.
//! - Trim levels, colors, fuel and condition words are dropped, as are short
//!   numeric tokens and bare years. Displacements such as `1.6` split on the
//!   dot into short numbers and go with them.
//! - The extracted year is appended as the last token.

mod category;
mod year;

pub use category::{VehicleCategory, detect_vehicle_category};
pub use year::{extract_year, is_year_token};

use serde::{Deserialize, Serialize};

/// Words that describe a particular unit rather than the model.
const STOP_WORDS: &[&str] = &[
    // trim and equipment
    "abs", "ubs", "cbs", "ebs", "tcs", "flex", "blueflex", "totalflex", "turbo", "sport", "limited", "premium",
    "deluxe", "standard", "automatico", "manual", "automatica", "mecanica", "completo", "completa", "basico",
    "basica", "edition", "special", "exclusive", "comfort",
    // colors
    "branco", "branca", "preto", "preta", "vermelho", "vermelha", "azul", "amarelo", "amarela", "verde", "cinza",
    "prata", "dourado", "dourada", "laranja", "rosa", "roxo", "roxa", "bege", "marrom", "vinho",
    // fuel
    "gasolina", "alcool", "diesel", "gnv", "eletrico", "hibrido",
    // condition
    "zero", "km", "0km", "novo", "nova", "usado", "usada",
];

fn is_short_number(token: &str) -> bool {
    token.len() < 4 && token.chars().all(|c| c.is_ascii_digit())
}

fn keep_token(token: &str) -> bool {
    !STOP_WORDS.contains(&token) && !is_short_number(token) && !is_year_token(token)
}

/// Normalize a raw vehicle description into its canonical cache key.
///
/// Pure and deterministic; normalizing an already-normalized key returns it
/// unchanged.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let year = extract_year(&lowered);

    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().filter(|t| keep_token(t)).collect();

    if let Some(year) = year.as_deref() {
        tokens.push(year);
    }

    tokens.join(" ")
}

/// Build the ordered, de-duplicated list of search queries for a raw name.
///
/// Order: full key, key without the year, first two tokens, first three
/// tokens. The first element is always the full normalized key.
pub fn generate_search_variations(raw: &str) -> Vec<String> {
    let key = normalize(raw);
    let tokens: Vec<&str> = key.split_whitespace().collect();

    let mut candidates = vec![key.clone()];

    let without_year = tokens
        .iter()
        .copied()
        .filter(|t| !is_year_token(t))
        .collect::<Vec<_>>()
        .join(" ");
    if without_year != key && !without_year.is_empty() {
        candidates.push(without_year);
    }

    if tokens.len() > 2 {
        candidates.push(tokens[..2].join(" "));
    }
    if tokens.len() > 3 {
        candidates.push(tokens[..3].join(" "));
    }

    let mut variations: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variations.contains(&candidate) {
            variations.push(candidate);
        }
    }
    variations
}

/// Everything the pipeline derives from one raw vehicle name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDescriptor {
    pub original_name: String,
    pub normalized_key: String,
    pub category: VehicleCategory,
    pub year: Option<String>,
}

impl VehicleDescriptor {
    pub fn from_raw(raw: &str) -> Self {
        Self {
            original_name: raw.to_string(),
            normalized_key: normalize(raw),
            category: detect_vehicle_category(raw),
            year: extract_year(raw),
        }
    }
}

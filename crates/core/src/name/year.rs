//! Model-year extraction from free text.

use regex::Regex;
use std::sync::LazyLock;

/// Year patterns in priority order.
///
/// The pair patterns must run before the bare one, otherwise the two-digit
/// tail of `2016/17` would never be recognised as part of the pair.
static YEAR_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\b(?:19|20)\d{2}/(?:19|20)?\d{2}\b").expect("valid year pair regex"),
        Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"),
        Regex::new(r"\b\d{2}/\d{2}\b").expect("valid short year pair regex"),
    ]
});

static BARE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").expect("valid bare year regex"));

/// Extract the model year from a vehicle description.
///
/// Tries `YYYY/YYYY` or `YYYY/YY`, then `YYYY`, then `YY/YY`, and returns
/// the first year of the first match. Two-digit years are expanded with a
/// `20` prefix.
/// `_` counts as a separator, so `gol_2019` still yields `2019`.
pub fn extract_year(raw: &str) -> Option<String> {
    let text = raw.to_lowercase().replace('_', " ");

    YEAR_PATTERNS.iter().find_map(|pattern| {
        let found = pattern.find(&text)?.as_str();
        let first = found.split('/').next().unwrap_or(found);
        if first.len() == 2 { Some(format!("20{first}")) } else { Some(first.to_string()) }
    })
}

/// Whether a single token is a bare four-digit model year.
pub fn is_year_token(token: &str) -> bool {
    BARE_YEAR.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_pair() {
        assert_eq!(extract_year("Yamaha R3 2016/2017 vermelha"), Some("2016".into()));
    }

    #[test]
    fn test_long_short_pair() {
        assert_eq!(extract_year("Honda CG 160 2019/20"), Some("2019".into()));
    }

    #[test]
    fn test_underscore_separated_year() {
        assert_eq!(extract_year("Gol_2019"), Some("2019".into()));
        assert_eq!(extract_year("2016_2017 uno"), Some("2016".into()));
    }

    #[test]
    fn test_bare_year() {
        assert_eq!(extract_year("Chevrolet Onix 2019 branco"), Some("2019".into()));
    }

    #[test]
    fn test_short_pair_expands() {
        assert_eq!(extract_year("Fiat Uno 16/17"), Some("2016".into()));
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(extract_year("civic 2014 motor 2018"), Some("2014".into()));
    }

    #[test]
    fn test_no_year() {
        assert_eq!(extract_year("Volkswagen Gol 1.6"), None);
        assert_eq!(extract_year("Fiat 147"), None);
    }

    #[test]
    fn test_year_inside_word_ignored() {
        assert_eq!(extract_year("model x2016"), None);
    }

    #[test]
    fn test_is_year_token() {
        assert!(is_year_token("1998"));
        assert!(is_year_token("2024"));
        assert!(!is_year_token("1600"));
        assert!(!is_year_token("20245"));
        assert!(!is_year_token("r3"));
    }
}

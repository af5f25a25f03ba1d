//! Entry classification.
//!
//! Board entries come in two shapes:
//! - Coordinate literals: `"(40.7,-74.0)"`
//! - Free-text addresses: `"123 Main St, Springfield, IL, USA"`
//!
//! Literals are parsed directly. Addresses are passed to the geocoder
//! verbatim, along with a best-guess city token taken from the
//! comma-separated parts after dropping a trailing country name.

use raid_map_report_models::{AddressCandidate, Coordinates};

use crate::GeocodeError;

/// Trailing country tokens stripped before picking the city (compared
/// uppercased).
pub const COUNTRY_CODES: &[&str] = &["USA", "UNITED STATES", "EE. UU."];

/// Classifies one board entry.
///
/// # Errors
///
/// Returns [`GeocodeError::MalformedLiteral`] if the entry is wrapped in
/// parentheses but is not a `lat,lon` pair.
pub fn classify(entry: &str) -> Result<AddressCandidate, GeocodeError> {
    if let Some(inner) = entry.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        let coordinates = parse_literal(inner).ok_or_else(|| GeocodeError::MalformedLiteral {
            entry: entry.to_string(),
        })?;
        return Ok(AddressCandidate::Literal { coordinates });
    }

    Ok(AddressCandidate::Textual {
        query: entry.to_string(),
        city_hint: city_hint(entry),
    })
}

/// Picks the city token out of a comma-separated address.
///
/// With two or more parts left after dropping a trailing country, the
/// second-to-last part wins; otherwise the only part is used, even when
/// it is a region rather than a city. An entry that is nothing but a
/// country name has no hint.
#[must_use]
pub fn city_hint(entry: &str) -> Option<String> {
    let mut parts: Vec<&str> = entry.split(',').map(str::trim).collect();

    if parts.last().is_some_and(|last| is_country_code(last)) {
        parts.pop();
    }

    match parts.as_slice() {
        [] => None,
        [only] => Some((*only).to_string()),
        [.., city, _] => Some((*city).to_string()),
    }
}

/// Whether `token` is one of the stripped [`COUNTRY_CODES`].
#[must_use]
pub fn is_country_code(token: &str) -> bool {
    let upper = token.to_uppercase();
    COUNTRY_CODES.iter().any(|code| upper == *code)
}

/// Parses the interior of a `(lat,lon)` literal.
fn parse_literal(inner: &str) -> Option<Coordinates> {
    let (lat, lon) = inner.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;

    (lat.is_finite() && lon.is_finite()).then_some(Coordinates::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textual(query: &str, hint: Option<&str>) -> AddressCandidate {
        AddressCandidate::Textual {
            query: query.to_string(),
            city_hint: hint.map(String::from),
        }
    }

    #[test]
    fn classifies_coordinate_literal() {
        assert_eq!(
            classify("(40.7,-74.0)").unwrap(),
            AddressCandidate::Literal {
                coordinates: Coordinates::new(40.7, -74.0)
            }
        );
    }

    #[test]
    fn literal_tolerates_inner_whitespace() {
        assert_eq!(
            classify("( 34.05 , -118.25 )").unwrap(),
            AddressCandidate::Literal {
                coordinates: Coordinates::new(34.05, -118.25)
            }
        );
    }

    #[test]
    fn rejects_literal_without_comma() {
        assert!(matches!(
            classify("(40.7 -74.0)"),
            Err(GeocodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn rejects_literal_with_extra_comma() {
        assert!(matches!(
            classify("(40.7,-74.0,12)"),
            Err(GeocodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn rejects_literal_with_text() {
        assert!(matches!(
            classify("(near the park, downtown)"),
            Err(GeocodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn rejects_empty_literal() {
        assert!(matches!(
            classify("()"),
            Err(GeocodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_literal() {
        assert!(matches!(
            classify("(NaN,inf)"),
            Err(GeocodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn strips_usa_and_takes_second_to_last() {
        assert_eq!(
            classify("123 Main St, Springfield, IL, USA").unwrap(),
            textual("123 Main St, Springfield, IL, USA", Some("Springfield"))
        );
    }

    #[test]
    fn street_is_the_hint_when_only_street_and_city_remain() {
        assert_eq!(
            classify("123 Main St, Springfield, USA").unwrap(),
            textual("123 Main St, Springfield, USA", Some("123 Main St"))
        );
    }

    #[test]
    fn country_code_match_is_case_insensitive() {
        assert_eq!(
            city_hint("500 Elm St, Houston, TX, United States").as_deref(),
            Some("Houston")
        );
        assert_eq!(
            city_hint("Calle 8, Miami, FL, ee. uu.").as_deref(),
            Some("Miami")
        );
    }

    #[test]
    fn keeps_last_part_when_not_a_country() {
        assert_eq!(
            city_hint("456 Oak Ave, Unnamed Town").as_deref(),
            Some("456 Oak Ave")
        );
    }

    #[test]
    fn single_part_is_its_own_hint() {
        assert_eq!(
            classify("Unknown Location").unwrap(),
            textual("Unknown Location", Some("Unknown Location"))
        );
    }

    #[test]
    fn falls_back_to_first_part_after_stripping() {
        assert_eq!(city_hint("Texas, USA").as_deref(), Some("Texas"));
    }

    #[test]
    fn country_only_entry_has_no_hint() {
        assert_eq!(classify("USA").unwrap(), textual("USA", None));
    }

    #[test]
    fn only_one_trailing_country_is_stripped() {
        assert_eq!(city_hint("USA, USA").as_deref(), Some("USA"));
    }

    #[test]
    fn unbalanced_parenthesis_is_textual() {
        assert_eq!(
            classify("(40.7,-74.0").unwrap(),
            textual("(40.7,-74.0", Some("(40.7"))
        );
    }
}

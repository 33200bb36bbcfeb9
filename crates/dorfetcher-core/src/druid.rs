use crate::errors::{FetchError, Result};
use crate::model::{DRUID_PREFIX, FEDORA_PREFIX};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// ASCII letters and digits only.
static DRUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z]{2}[0-9]{3}[a-zA-Z]{2}[0-9]{4}").expect("druid pattern compiles")
});

/// Distinct part of a druid, e.g. `oo000oo0001`, with any prefix stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Druid(String);

impl Druid {
    /// Extracts the first druid-shaped token from `raw`.
    ///
    /// `oo000oo0001`, `druid:oo000oo0001` and `info:fedora/druid:oo000oo0001`
    /// all parse to the same value; input without a druid is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        DRUID_PATTERN
            .find(raw)
            .map(|m| Druid(m.as_str().to_string()))
            .ok_or_else(|| FetchError::InvalidIdentifier(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `druid:<id>`, the form stored in the identifier field.
    pub fn for_index(&self) -> String {
        format!("{}{}", DRUID_PREFIX, self.0)
    }

    /// `info:fedora/druid:<id>`, the form stored in controller relationship fields.
    pub fn for_controller(&self) -> String {
        format!("{}{}{}", FEDORA_PREFIX, DRUID_PREFIX, self.0)
    }
}

impl fmt::Display for Druid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes() {
        for raw in [
            "oo000oo0001",
            "druid:oo000oo0001",
            "info:fedora/druid:oo000oo0001",
        ] {
            assert_eq!(Druid::parse(raw).unwrap().as_str(), "oo000oo0001");
        }
    }

    #[test]
    fn takes_first_match() {
        let d = Druid::parse("see ab123cd4567 and ef890gh1234").unwrap();
        assert_eq!(d.as_str(), "ab123cd4567");
    }

    #[test]
    fn parse_is_idempotent() {
        let once = Druid::parse("druid:pv820dk6668").unwrap();
        let twice = Druid::parse(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_junk() {
        assert_eq!(
            Druid::parse("junk"),
            Err(FetchError::InvalidIdentifier("junk".into()))
        );
        assert!(Druid::parse("oo00oo0001").is_err());
        assert!(Druid::parse("").is_err());
    }

    #[test]
    fn rejects_non_ascii_digits() {
        let arabic_indic = "ab\u{0661}\u{0662}\u{0663}cd\u{0664}\u{0665}\u{0666}\u{0667}";
        assert!(Druid::parse(arabic_indic).is_err());
        let fullwidth = "druid:oo\u{FF10}\u{FF10}\u{FF10}oo\u{FF10}\u{FF10}\u{FF10}\u{FF11}";
        assert!(Druid::parse(fullwidth).is_err());
        assert_eq!(
            Druid::parse("ab\u{0661}23cd4567 oo000oo0001").unwrap().as_str(),
            "oo000oo0001"
        );
    }

    #[test]
    fn encodings() {
        let d = Druid::parse("oo000oo0001").unwrap();
        assert_eq!(d.for_index(), "druid:oo000oo0001");
        assert_eq!(d.for_controller(), "info:fedora/druid:oo000oo0001");
    }
}

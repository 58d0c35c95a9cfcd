//! Process-wide, immutable configuration for where each year's snapshot
//! lives and which format it is encoded in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uscode_core::SourceFormat;

/// One year's source location and encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSource {
    pub source_path: String,
    pub format: SourceFormat,
}

/// The year-to-source mapping, built once at process start and handed to
/// the section loader by value. Deliberately not a hidden global — callers
/// assemble it (from JSON, TOML, or in-process construction) and own it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YearsConfig {
    years: BTreeMap<i32, YearSource>,
}

impl YearsConfig {
    pub fn new() -> Self {
        YearsConfig::default()
    }

    pub fn insert(&mut self, year: i32, source_path: impl Into<String>, format: SourceFormat) -> &mut Self {
        self.years.insert(
            year,
            YearSource {
                source_path: source_path.into(),
                format,
            },
        );
        self
    }

    pub fn get(&self, year: i32) -> Option<&YearSource> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trip() {
        let mut cfg = YearsConfig::new();
        cfg.insert(2024, "usc18-2024.xml", SourceFormat::NativeMarkup);
        let entry = cfg.get(2024).unwrap();
        assert_eq!(entry.source_path, "usc18-2024.xml");
        assert_eq!(entry.format, SourceFormat::NativeMarkup);
    }

    #[test]
    fn unknown_year_is_none() {
        let cfg = YearsConfig::new();
        assert!(cfg.get(1999).is_none());
    }

    #[test]
    fn years_are_reported_in_order() {
        let mut cfg = YearsConfig::new();
        cfg.insert(2018, "a.htm", SourceFormat::Presentational);
        cfg.insert(2002, "b.htm", SourceFormat::Presentational);
        let years: Vec<i32> = cfg.years().collect();
        assert_eq!(years, vec![2002, 2018]);
    }

    #[test]
    fn config_round_trips_json() {
        let mut cfg = YearsConfig::new();
        cfg.insert(2024, "usc18-2024.xml", SourceFormat::NativeMarkup);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: YearsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(2024), cfg.get(2024));
    }
}

//! Routes a `(section, year)` lookup to the right extractor, caches the
//! result, and exposes uniform lookup/listing over a year-indexed config.

use crate::config::YearsConfig;
use crate::fixups::apply_fixups;
use crate::format_a::parse_format_a;
use crate::format_b::parse_format_b;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, Mutex};
use uscode_core::{Provision, Result, SourceFormat, UscError};

/// Decode raw source bytes, trying UTF-8 first, then Latin-1, then
/// Windows-1252 (the only difference from Latin-1 being the 0x80-0x9F
/// range, which Latin-1 leaves as C1 control codes). Latin-1 and CP1252
/// both accept every byte sequence, so this effectively never reaches
/// `ParseFailure` in practice — it is kept as an explicit three-step chain
/// to match the source's documented decoding behavior.
fn decode_bytes(bytes: &[u8], section: &str, year: i32) -> Result<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }
    if let Some(s) = decode_latin1(bytes) {
        return Ok(s);
    }
    if let Some(s) = decode_cp1252(bytes) {
        return Ok(s);
    }
    Err(UscError::ParseFailure {
        section: section.to_string(),
        year,
        reason: "could not decode source as utf-8, latin-1, or cp1252".to_string(),
    })
}

fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| b as char).collect())
}

fn cp1252_high_byte(b: u8) -> char {
    match b {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        other => other as char,
    }
}

fn decode_cp1252(bytes: &[u8]) -> Option<String> {
    Some(
        bytes
            .iter()
            .map(|&b| if (0x80..=0x9F).contains(&b) { cp1252_high_byte(b) } else { b as char })
            .collect(),
    )
}

static SECTION_HEAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"§\s*([0-9]+[a-zA-Z\-]*)\.").expect("valid regex"));

fn scan_format_a_sections(xml: &str) -> HashSet<String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut out = HashSet::new();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "section" {
                    if let Some(id) = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"identifier")
                        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
                    {
                        if let Some(tail) = id.rsplit('/').next() {
                            if let Some(num) = tail.strip_prefix('s') {
                                out.insert(num.to_string());
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    out
}

fn scan_format_b_sections(html: &str) -> HashSet<String> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("h3.section-head") else {
        return HashSet::new();
    };
    let mut out = HashSet::new();
    for el in document.select(&selector) {
        let text = el.text().collect::<String>().replace(['\u{a0}', '\u{202f}'], " ");
        if let Some(caps) = SECTION_HEAD.captures(&text) {
            out.insert(caps[1].to_string());
        }
    }
    out
}

/// Routes `(section, year)` lookups to the appropriate extractor, caching
/// every tree it builds and exposing the year-indexed availability table.
pub struct SectionLoader {
    config: YearsConfig,
    parse_cache: Mutex<HashMap<(String, i32), Arc<Provision>>>,
    section_index: HashMap<i32, HashSet<String>>,
}

impl SectionLoader {
    /// Build a loader over `config`, scanning each year's source once to
    /// populate the section-number index used by [`SectionLoader::list_sections`]
    /// and [`SectionLoader::get_versions`].
    pub fn new(config: YearsConfig) -> Self {
        let mut section_index = HashMap::new();
        for year in config.years() {
            let Some(source) = config.get(year) else { continue };
            let sections = match std::fs::read(&source.source_path) {
                Ok(bytes) => match decode_bytes(&bytes, "*", year) {
                    Ok(text) => match source.format {
                        SourceFormat::NativeMarkup => scan_format_a_sections(&text),
                        SourceFormat::Presentational => scan_format_b_sections(&text),
                    },
                    Err(err) => {
                        tracing::warn!(year, error = %err, "could not decode source while building index");
                        HashSet::new()
                    }
                },
                Err(err) => {
                    tracing::warn!(year, path = %source.source_path, error = %err, "source missing for year");
                    HashSet::new()
                }
            };
            section_index.insert(year, sections);
        }
        SectionLoader {
            config,
            parse_cache: Mutex::new(HashMap::new()),
            section_index,
        }
    }

    /// Fetch a parsed section, parsing and caching it at most once per
    /// `(section, year)` key for the loader's lifetime.
    pub fn get_section(&self, section: &str, year: i32) -> Result<Arc<Provision>> {
        let key = (section.to_string(), year);
        if let Some(tree) = self
            .parse_cache
            .lock()
            .expect("parse cache mutex poisoned")
            .get(&key)
            .cloned()
        {
            tracing::debug!(section, year, "parse cache hit");
            return Ok(tree);
        }

        let source = self.config.get(year).ok_or(UscError::SourceUnavailable { year })?;
        let bytes = std::fs::read(&source.source_path)?;
        let text = decode_bytes(&bytes, section, year)?;
        let mut tree = match source.format {
            SourceFormat::NativeMarkup => parse_format_a(&text, section, year, &source.source_path)?,
            SourceFormat::Presentational => parse_format_b(&text, section, year, &source.source_path)?,
        };
        apply_fixups(&mut tree, section);

        let tree = Arc::new(tree);
        let mut cache = self.parse_cache.lock().expect("parse cache mutex poisoned");
        let tree = cache.entry(key).or_insert(tree).clone();
        tracing::debug!(section, year, "parse cache miss; parsed and cached");
        Ok(tree)
    }

    /// All parsed versions of `section` across every year it is known to
    /// appear in, per the section-number index.
    pub fn get_versions(&self, section: &str) -> HashMap<i32, Arc<Provision>> {
        let mut out = HashMap::new();
        for year in self.config.years() {
            let present = self
                .section_index
                .get(&year)
                .map(|set| set.contains(section))
                .unwrap_or(false);
            if !present {
                continue;
            }
            match self.get_section(section, year) {
                Ok(tree) => {
                    out.insert(year, tree);
                }
                Err(err) => {
                    tracing::warn!(section, year, error = %err, "failed to parse known-present section");
                }
            }
        }
        out
    }

    /// Every known section number, its (best-effort) heading from its
    /// earliest available year, and the years it appears in.
    pub fn list_sections(&self) -> Vec<(String, Option<String>, Vec<i32>)> {
        let mut by_section: HashMap<String, Vec<i32>> = HashMap::new();
        for (year, sections) in &self.section_index {
            for section in sections {
                by_section.entry(section.clone()).or_default().push(*year);
            }
        }

        let mut out = Vec::with_capacity(by_section.len());
        for (section, mut years) in by_section {
            years.sort_unstable();
            let heading = years
                .first()
                .and_then(|&y| self.get_section(&section, y).ok())
                .and_then(|tree| tree.heading.clone());
            out.push((section, heading, years));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Years known to have any source at all (including years whose source
    /// file was unreadable, which map to an empty section set).
    pub fn available_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.section_index.keys().copied().collect();
        years.sort_unstable();
        years
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use uscode_core::SourceFormat;

    fn write_fixture(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn format_a_doc() -> String {
        r#"<uslm xmlns="http://xml.house.gov/schemas/uslm/1.0">
            <section identifier="/us/usc/t18/s922">
                <num>§922.</num>
                <heading>Unlawful acts</heading>
                <subsection identifier="/us/usc/t18/s922/a">
                    <num>(a)</num>
                    <content>It shall be unlawful.</content>
                </subsection>
            </section>
        </uslm>"#
            .to_string()
    }

    #[test]
    fn loads_and_caches_a_section() {
        let fixture = write_fixture(&format_a_doc());
        let mut config = YearsConfig::new();
        config.insert(2024, fixture.path().to_str().unwrap(), SourceFormat::NativeMarkup);
        let loader = SectionLoader::new(config);

        let tree = loader.get_section("922", 2024).unwrap();
        assert_eq!(tree.id, "/us/usc/t18/s922");

        let cached = loader.get_section("922", 2024).unwrap();
        assert!(Arc::ptr_eq(&tree, &cached));
    }

    #[test]
    fn unknown_year_is_source_unavailable() {
        let loader = SectionLoader::new(YearsConfig::new());
        let err = loader.get_section("922", 1950).unwrap_err();
        assert!(matches!(err, UscError::SourceUnavailable { year: 1950 }));
    }

    #[test]
    fn list_sections_reports_years_and_heading() {
        let fixture = write_fixture(&format_a_doc());
        let mut config = YearsConfig::new();
        config.insert(2024, fixture.path().to_str().unwrap(), SourceFormat::NativeMarkup);
        let loader = SectionLoader::new(config);

        let listing = loader.list_sections();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].0, "922");
        assert_eq!(listing[0].1.as_deref(), Some("Unlawful acts"));
        assert_eq!(listing[0].2, vec![2024]);
    }

    #[test]
    fn missing_source_file_yields_empty_index_for_that_year() {
        let mut config = YearsConfig::new();
        config.insert(2024, "/no/such/path.xml", SourceFormat::NativeMarkup);
        let loader = SectionLoader::new(config);
        assert!(loader.list_sections().is_empty());
        assert_eq!(loader.available_years(), vec![2024]);
    }
}

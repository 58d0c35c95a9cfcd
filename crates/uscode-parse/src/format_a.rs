//! The native-markup ("Format A") extractor.
//!
//! This source already carries explicit structural tags and `identifier`
//! attributes, so there is no numbering to reconstruct: we just pull-parse
//! the target `<section>` subtree and recurse into its direct structural
//! children in document order.

use crate::reference::classify_ref;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use uscode_core::{canonical_id, section_base, Provision, ProvisionLevel, Reference, SectionMetadata, SourceFormat, UscError};

fn local_name_of(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).into_owned()
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Parse a section out of a native-markup document.
pub fn parse_format_a(xml: &str, section: &str, year: i32, source_name: &str) -> Result<Provision, UscError> {
    let mut reader = Reader::from_str(xml);
    let target_id = section_base(section);

    loop {
        let event = reader.read_event().map_err(|e| UscError::ParseFailure {
            section: section.to_string(),
            year,
            reason: e.to_string(),
        })?;
        match event {
            Event::Start(e) if local_name_of(e.name()) == "section" => {
                if attr(&e, "identifier").as_deref() == Some(target_id.as_str()) {
                    let mut node = read_node(&mut reader, ProvisionLevel::Section, &target_id, Some(target_id.clone()))
                        .map_err(|e| UscError::ParseFailure {
                            section: section.to_string(),
                            year,
                            reason: e.to_string(),
                        })?;
                    node.metadata = Some(SectionMetadata {
                        year,
                        source: source_name.to_string(),
                        format: SourceFormat::NativeMarkup,
                    });
                    return Ok(node);
                }
                skip_to_end(&mut reader, "section").map_err(|e| UscError::ParseFailure {
                    section: section.to_string(),
                    year,
                    reason: e.to_string(),
                })?;
            }
            Event::Eof => {
                return Err(UscError::SectionNotFound {
                    section: section.to_string(),
                    year,
                });
            }
            _ => {}
        }
    }
}

/// Read one structural node, recursing into direct structural children only.
/// Assumes `num` precedes any nested structural child in document order, so
/// a child's id (built from this node's `id`) is always available by the
/// time the child is encountered.
fn read_node(
    reader: &mut Reader<&[u8]>,
    tag: ProvisionLevel,
    parent_id: &str,
    precomputed_id: Option<String>,
) -> Result<Provision, quick_xml::Error> {
    let mut node = Provision {
        id: precomputed_id.clone().unwrap_or_default(),
        tag,
        num: String::new(),
        heading: None,
        text: String::new(),
        refs: Vec::new(),
        subsections: Vec::new(),
        paragraphs: Vec::new(),
        subparagraphs: Vec::new(),
        clauses: Vec::new(),
        subclauses: Vec::new(),
        metadata: None,
    };
    let mut has_chapeau = false;
    let self_tag = tag.as_str();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name_of(e.name());
                match name.as_str() {
                    "num" => {
                        node.num = read_text_only(reader, "num")?;
                        if precomputed_id.is_none() {
                            node.id = canonical_id(parent_id, &node.num);
                        }
                    }
                    "heading" => node.heading = Some(read_text_only(reader, "heading")?),
                    "chapeau" => {
                        let (text, refs) = read_text_and_refs(reader, "chapeau")?;
                        node.text = text;
                        node.refs = refs;
                        has_chapeau = true;
                    }
                    "content" => {
                        if has_chapeau {
                            skip_to_end(reader, "content")?;
                        } else {
                            let (text, refs) = read_text_and_refs(reader, "content")?;
                            node.text = text;
                            node.refs = refs;
                        }
                    }
                    "subsection" | "paragraph" | "subparagraph" | "clause" | "subclause" => {
                        let child_level = ProvisionLevel::from(name.as_str());
                        let child = read_node(reader, child_level, &node.id, None)?;
                        node.push_child(child);
                    }
                    _ => skip_to_end(reader, &name)?,
                }
            }
            Event::End(e) if local_name_of(e.name()) == self_tag => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(node)
}

fn read_text_only(reader: &mut Reader<&[u8]>, tag: &str) -> Result<String, quick_xml::Error> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.decode()?),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::End(e) if local_name_of(e.name()) == tag => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

/// Read text content plus any nested `<ref href="...">` elements, folding
/// their display text back into the returned string so plain-text rendering
/// stays contiguous.
fn read_text_and_refs(reader: &mut Reader<&[u8]>, tag: &str) -> Result<(String, Vec<Reference>), quick_xml::Error> {
    let mut text = String::new();
    let mut refs = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.decode()?),
            Event::Start(e) if local_name_of(e.name()) == "ref" => {
                let href = attr(&e, "href").unwrap_or_default();
                let inner = read_text_only(reader, "ref")?;
                text.push_str(&inner);
                if !href.is_empty() {
                    let (ref_type, target_title, target_section) = classify_ref(&href);
                    refs.push(Reference {
                        target: href,
                        display_text: inner,
                        ref_type,
                        target_title,
                        target_section,
                    });
                }
            }
            Event::Start(e) => {
                let name = local_name_of(e.name());
                let (inner_text, inner_refs) = read_text_and_refs(reader, &name)?;
                text.push_str(&inner_text);
                refs.extend(inner_refs);
            }
            Event::End(e) if local_name_of(e.name()) == tag => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((text.trim().to_string(), refs))
}

fn skip_to_end(reader: &mut Reader<&[u8]>, tag: &str) -> Result<(), quick_xml::Error> {
    let mut depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) if local_name_of(e.name()) == tag => depth += 1,
            Event::End(e) if local_name_of(e.name()) == tag => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

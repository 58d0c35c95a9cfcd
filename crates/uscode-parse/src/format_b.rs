//! The presentational-source ("Format B") reconstructor.
//!
//! Hierarchy is not explicit in this source: it is reconstructed from CSS
//! indentation classes and inline numbering tokens in two passes. Pass 1
//! (`flatten`) walks the section's sibling elements into a flat list of
//! [`RawBlock`]s; Pass 2 (`fold`) replays that list through the numbering
//! classifier to build a [`Provision`] tree.

use crate::numbering::{classify_level, ParentStack};
use crate::reference::classify_ref;
use crate::tokens::parse_leading_tokens;
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use uscode_core::{canonical_id, section_base, Provision, ProvisionLevel, Reference, SectionMetadata, SourceFormat, UscError};

/// A candidate provision block discovered by Pass 1, before it has been
/// folded into the tree.
#[derive(Debug, Clone)]
struct RawBlock {
    css_level: ProvisionLevel,
    is_root_css: bool,
    tokens: Vec<String>,
    text: String,
    refs: Vec<Reference>,
    is_repealed: bool,
}

/// One node under construction during Pass 2, held in a flat arena so that
/// already-open ancestors stay reachable by index while we keep appending
/// descendants to them (see the "Parent stack" design note).
struct ArenaNode {
    id: String,
    tag: ProvisionLevel,
    num: String,
    text: String,
    refs: Vec<Reference>,
    parent: Option<usize>,
}

fn css_level_from_class(class_attr: &str) -> (ProvisionLevel, bool) {
    let trimmed = class_attr.trim();
    let level = match trimmed {
        "statutory-body" => ProvisionLevel::Subsection,
        "statutory-body-1em" => ProvisionLevel::Paragraph,
        "statutory-body-2em" => ProvisionLevel::Subparagraph,
        "statutory-body-3em" => ProvisionLevel::Clause,
        "statutory-body-4em" => ProvisionLevel::Subclause,
        _ => ProvisionLevel::Subsection,
    };
    (level, trimmed == "statutory-body")
}

/// Collect direct text, inline emphasis/link text, and outgoing references
/// from `node`'s descendants, refusing to descend into a nested block-level
/// `<p>` (those are processed independently in their own Pass-1 iteration).
fn collect_inline(node: NodeRef<'_, Node>, out: &mut String, refs: &mut Vec<Reference>) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => {
            let tag = el.name();
            if tag == "p" {
                return;
            }
            if tag == "a" {
                let href = el.attr("href").unwrap_or("").to_string();
                let mut inner = String::new();
                for child in node.children() {
                    collect_inline(child, &mut inner, refs);
                }
                out.push_str(&inner);
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
            } else {
                for child in node.children() {
                    collect_inline(child, out, refs);
                }
            }
        }
        _ => {}
    }
}

fn direct_text_and_refs(el: ElementRef<'_>) -> (String, Vec<Reference>) {
    let mut text = String::new();
    let mut refs = Vec::new();
    for child in el.children() {
        collect_inline(child, &mut text, &mut refs);
    }
    (text, refs)
}

fn build_raw_block(el: ElementRef<'_>) -> Option<RawBlock> {
    let class_attr = el.value().attr("class").unwrap_or("");
    let (css_level, is_root_css) = css_level_from_class(class_attr);
    let (full_text, refs) = direct_text_and_refs(el);
    let parsed = parse_leading_tokens(full_text.trim());
    if parsed.tokens.is_empty() {
        return None;
    }
    Some(RawBlock {
        css_level,
        is_root_css,
        tokens: parsed.tokens,
        text: parsed.remaining_text,
        refs,
        is_repealed: parsed.is_repealed,
    })
}

fn normalize_nbsp(s: &str) -> String {
    s.replace('\u{a0}', " ").replace('\u{202f}', " ")
}

fn heading_matches(text: &str, section: &str) -> bool {
    let norm = normalize_nbsp(text);
    norm.contains(&format!("§{section}.")) || norm.contains(&format!("§ {section}."))
}

fn extract_heading_text(full: &str, section: &str) -> String {
    let mut s = normalize_nbsp(full);
    for marker in [format!("§ {section}."), format!("§{section}.")] {
        if let Some(pos) = s.find(&marker) {
            s.replace_range(pos..pos + marker.len(), "");
            break;
        }
    }
    s.trim().to_string()
}

fn is_section_heading(el: &ElementRef<'_>) -> bool {
    el.value().name() == "h3"
        && el
            .value()
            .attr("class")
            .map(|c| c.split_whitespace().any(|cls| cls == "section-head"))
            .unwrap_or(false)
}

/// Pass 1: flatten the sibling run following the matched section heading
/// into a sequence of candidate blocks.
fn flatten(document: &Html, section: &str, year: i32) -> Result<(Vec<RawBlock>, String), UscError> {
    let heading_sel = Selector::parse("h3.section-head").map_err(|e| UscError::ParseFailure {
        section: section.to_string(),
        year,
        reason: format!("invalid selector: {e}"),
    })?;

    let start = document
        .select(&heading_sel)
        .find(|h| heading_matches(&h.text().collect::<String>(), section))
        .ok_or_else(|| UscError::SectionNotFound {
            section: section.to_string(),
            year,
        })?;

    let heading_text = extract_heading_text(&start.text().collect::<String>(), section);

    let mut blocks = Vec::new();
    let mut next = start.next_sibling();
    while let Some(n) = next {
        if let Some(el) = ElementRef::wrap(n) {
            if is_section_heading(&el) {
                break;
            }
            if el.value().name() == "p" {
                if let Some(block) = build_raw_block(el) {
                    blocks.push(block);
                }
            }
        }
        next = n.next_sibling();
    }
    Ok((blocks, heading_text))
}

fn find_parent(level_node: &[Option<usize>; 10], target_level: u8) -> usize {
    if target_level < 5 {
        return 0;
    }
    let mut lvl = target_level.min(9);
    loop {
        if let Some(idx) = level_node[lvl as usize] {
            return idx;
        }
        if lvl == 5 {
            return 0;
        }
        lvl -= 1;
    }
}

fn clear_deeper(stack: &mut ParentStack, level_node: &mut [Option<usize>; 10], level: u8) {
    stack.clear_deeper_than(level);
    for slot in level_node.iter_mut().skip((level + 1) as usize) {
        *slot = None;
    }
}

/// Pass 2: fold the flat candidate list into a tree.
fn fold(blocks: Vec<RawBlock>, section: &str) -> Vec<ArenaNode> {
    let root_id = section_base(section);
    let mut arena = vec![ArenaNode {
        id: root_id,
        tag: ProvisionLevel::Section,
        num: String::new(),
        text: String::new(),
        refs: Vec::new(),
        parent: None,
    }];
    let mut stack = ParentStack::empty();
    let mut level_node: [Option<usize>; 10] = [None; 10];
    let mut prev_css: Option<ProvisionLevel> = None;

    for block in blocks {
        if block.tokens.len() == 1 {
            let token = &block.tokens[0];
            let classify_stack = if block.is_root_css {
                ParentStack::empty()
            } else {
                stack
            };
            let level = classify_level(token, block.css_level, &classify_stack, prev_css);
            let parent_idx = find_parent(&level_node, level.as_u8().wrapping_sub(1));
            let id = canonical_id(&arena[parent_idx].id, token);
            let idx = arena.len();
            arena.push(ArenaNode {
                id,
                tag: level,
                num: format!("({token})"),
                text: block.text.clone(),
                refs: block.refs.clone(),
                parent: Some(parent_idx),
            });
            level_node[level.as_u8() as usize] = Some(idx);
            stack.set(level.as_u8(), true);
            clear_deeper(&mut stack, &mut level_node, level.as_u8());
        } else if block.is_repealed {
            let mut last: Option<(u8, usize)> = None;
            for token in &block.tokens {
                let level = classify_level(token, block.css_level, &stack, prev_css);
                let parent_idx = find_parent(&level_node, level.as_u8().wrapping_sub(1));
                let id = canonical_id(&arena[parent_idx].id, token);
                let idx = arena.len();
                arena.push(ArenaNode {
                    id,
                    tag: level,
                    num: format!("({token})"),
                    text: block.text.clone(),
                    refs: block.refs.clone(),
                    parent: Some(parent_idx),
                });
                last = Some((level.as_u8(), idx));
            }
            if let Some((level, idx)) = last {
                level_node[level as usize] = Some(idx);
                stack.set(level, true);
                clear_deeper(&mut stack, &mut level_node, level);
            }
        } else {
            let first_level = classify_level(&block.tokens[0], block.css_level, &ParentStack::empty(), prev_css);
            let parent0_idx = find_parent(&level_node, first_level.as_u8().wrapping_sub(1));
            let id0 = canonical_id(&arena[parent0_idx].id, &block.tokens[0]);
            let idx0 = arena.len();
            arena.push(ArenaNode {
                id: id0,
                tag: first_level,
                num: format!("({})", block.tokens[0]),
                text: String::new(),
                refs: Vec::new(),
                parent: Some(parent0_idx),
            });

            let mut touched = vec![(first_level.as_u8(), idx0)];
            let mut prev_idx = idx0;
            let mut prev_level = first_level.as_u8();
            let last_i = block.tokens.len() - 1;
            for (i, token) in block.tokens.iter().enumerate().skip(1) {
                let level_u8 = (prev_level + 1).min(9);
                let level = ProvisionLevel::from_u8(level_u8).unwrap();
                let id = canonical_id(&arena[prev_idx].id, token);
                let idx = arena.len();
                let (text, refs) = if i == last_i {
                    (block.text.clone(), block.refs.clone())
                } else {
                    (String::new(), Vec::new())
                };
                arena.push(ArenaNode {
                    id,
                    tag: level,
                    num: format!("({token})"),
                    text,
                    refs,
                    parent: Some(prev_idx),
                });
                touched.push((level_u8, idx));
                prev_idx = idx;
                prev_level = level_u8;
            }

            for (level, idx) in &touched {
                level_node[*level as usize] = Some(*idx);
                stack.set(*level, true);
            }
            clear_deeper(&mut stack, &mut level_node, prev_level);
        }
        prev_css = Some(block.css_level);
    }

    arena
}

fn build_tree(arena: Vec<ArenaNode>, metadata: SectionMetadata, heading: Option<String>) -> Provision {
    let mut built: Vec<Option<Provision>> = arena
        .iter()
        .enumerate()
        .map(|(i, n)| {
            Some(Provision {
                id: n.id.clone(),
                tag: n.tag,
                num: n.num.clone(),
                heading: if i == 0 { heading.clone() } else { None },
                text: n.text.clone(),
                refs: n.refs.clone(),
                subsections: Vec::new(),
                paragraphs: Vec::new(),
                subparagraphs: Vec::new(),
                clauses: Vec::new(),
                subclauses: Vec::new(),
                metadata: if i == 0 { Some(metadata.clone()) } else { None },
            })
        })
        .collect();

    for idx in (1..arena.len()).rev() {
        let node = built[idx].take().expect("each arena node built exactly once");
        let parent_idx = arena[idx].parent.expect("non-root nodes always have a parent");
        built[parent_idx]
            .as_mut()
            .expect("parent still present")
            .push_child_front(node);
    }

    built[0].take().expect("root always present")
}

/// Parse a section out of a presentational-format document.
pub fn parse_format_b(html: &str, section: &str, year: i32, source_name: &str) -> Result<Provision, UscError> {
    let document = Html::parse_document(html);
    let (blocks, heading_text) = flatten(&document, section, year)?;
    let arena = fold(blocks, section);
    let metadata = SectionMetadata {
        year,
        source: source_name.to_string(),
        format: SourceFormat::Presentational,
    };
    let heading = if heading_text.is_empty() {
        None
    } else {
        Some(heading_text)
    };
    Ok(build_tree(arena, metadata, heading))
}

//! Splitting `word/document.xml` into its top-level body children.

use quick_xml::Reader;
use quick_xml::events::{BytesRef, Event};

use crate::domain::AppError;

/// Classification of a direct child of `<w:body>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Paragraph,
    Table,
    SectionProperties,
    Other,
}

impl NodeKind {
    fn from_local_name(name: &[u8]) -> Self {
        match name {
            b"p" => NodeKind::Paragraph,
            b"tbl" => NodeKind::Table,
            b"sectPr" => NodeKind::SectionProperties,
            _ => NodeKind::Other,
        }
    }

    pub(crate) fn is_block(self) -> bool {
        matches!(self, NodeKind::Paragraph | NodeKind::Table)
    }
}

/// One direct child of the body with its raw markup.
#[derive(Debug, Clone)]
pub(crate) struct BodyNode {
    pub kind: NodeKind,
    pub xml: String,
    /// Trimmed plain text; empty for non-block nodes.
    pub text: String,
}

impl BodyNode {
    /// Build a node from a well-formed element fragment.
    pub(crate) fn from_fragment(xml: String) -> Result<Self, AppError> {
        let kind = root_kind(&xml)?;
        let text = match kind {
            NodeKind::Paragraph => extract_text(&xml)?.trim().to_string(),
            NodeKind::Table => table_cells(&xml)?
                .into_iter()
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            NodeKind::SectionProperties | NodeKind::Other => String::new(),
        };
        Ok(Self { kind, xml, text })
    }
}

/// Markup surrounding the body children.
#[derive(Debug, Clone)]
pub(crate) struct BodyLayout {
    /// Everything up to and including the body start tag.
    pub prefix: String,
    /// Everything from the body end tag on.
    pub suffix: String,
    /// Namespace prefix used by the body element (usually `w`).
    pub ns_prefix: Option<String>,
}

/// Split a main document part into layout and body children.
pub(crate) fn split_document(xml: &str) -> Result<(BodyLayout, Vec<BodyNode>), AppError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut body: Option<(usize, Option<String>, usize)> = None;
    let mut child_start = 0usize;
    let mut nodes = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(start) => {
                match body {
                    None if start.local_name().as_ref() == b"body" => {
                        let ns_prefix = start
                            .name()
                            .prefix()
                            .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned());
                        body = Some((depth, ns_prefix, after));
                    }
                    Some((body_depth, ..)) if depth == body_depth + 1 => {
                        child_start = tag_start(xml, before);
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some((body_depth, ns_prefix, body_open_end)) = &body {
                    if depth == body_depth + 1 {
                        let fragment = xml[child_start..after].to_string();
                        nodes.push(BodyNode::from_fragment(fragment)?);
                    } else if depth == *body_depth {
                        let layout = BodyLayout {
                            prefix: xml[..*body_open_end].to_string(),
                            suffix: xml[tag_start(xml, before)..].to_string(),
                            ns_prefix: ns_prefix.clone(),
                        };
                        return Ok((layout, nodes));
                    }
                }
            }
            Event::Empty(empty) => match &body {
                None if empty.local_name().as_ref() == b"body" => {
                    let qualified = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                    let ns_prefix = empty
                        .name()
                        .prefix()
                        .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned());
                    let start = tag_start(xml, before);
                    let layout = BodyLayout {
                        prefix: format!("{}<{}>", &xml[..start], qualified),
                        suffix: format!("</{}>{}", qualified, &xml[after..]),
                        ns_prefix,
                    };
                    return Ok((layout, nodes));
                }
                Some((body_depth, ..)) if depth == body_depth + 1 => {
                    let fragment = xml[tag_start(xml, before)..after].to_string();
                    nodes.push(BodyNode::from_fragment(fragment)?);
                }
                _ => {}
            },
            Event::Comment(_) => {
                if let Some((body_depth, ..)) = &body {
                    if depth == body_depth + 1 {
                        let fragment = xml[tag_start(xml, before)..after].to_string();
                        nodes.push(BodyNode { kind: NodeKind::Other, xml: fragment, text: String::new() });
                    }
                }
            }
            Event::Eof => {
                return Err(AppError::structural("main document part has no complete body element"));
            }
            _ => {}
        }
    }
}

/// Concatenated run text of a fragment: `t` text, `tab` as `\t`, `br`/`cr` as `\n`.
pub(crate) fn extract_text(xml: &str) -> Result<String, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut in_text = false;
    let mut output = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) if start.local_name().as_ref() == b"t" => in_text = true,
            Event::End(end) if end.local_name().as_ref() == b"t" => in_text = false,
            Event::Empty(empty) => match empty.local_name().as_ref() {
                b"tab" => output.push('\t'),
                b"br" | b"cr" => output.push('\n'),
                _ => {}
            },
            Event::Text(text) if in_text => {
                let decoded = text.decode().map_err(|e| AppError::structural(e.to_string()))?;
                output.push_str(&decoded);
            }
            Event::CData(data) if in_text => {
                let decoded = data.decode().map_err(|e| AppError::structural(e.to_string()))?;
                output.push_str(&decoded);
            }
            Event::GeneralRef(reference) if in_text => push_reference(&mut output, &reference)?,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(output)
}

/// Trimmed text of every cell of a table fragment, row by row.
pub(crate) fn table_cells(xml: &str) -> Result<Vec<String>, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut cells = Vec::new();
    let mut cell: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"tc" => cell = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(end) => match end.local_name().as_ref() {
                b"tc" => {
                    if let Some(text) = cell.take() {
                        cells.push(text.trim().to_string());
                    }
                }
                b"t" => in_text = false,
                b"p" => {
                    if let Some(text) = cell.as_mut() {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Empty(empty) => {
                if let Some(text) = cell.as_mut() {
                    match empty.local_name().as_ref() {
                        b"tab" => text.push('\t'),
                        b"br" | b"cr" => text.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(content) if in_text => {
                if let Some(text) = cell.as_mut() {
                    let decoded =
                        content.decode().map_err(|e| AppError::structural(e.to_string()))?;
                    text.push_str(&decoded);
                }
            }
            Event::GeneralRef(reference) if in_text => {
                if let Some(text) = cell.as_mut() {
                    push_reference(text, &reference)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(cells)
}

fn root_kind(xml: &str) -> Result<NodeKind, AppError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(start) | Event::Empty(start) => {
                return Ok(NodeKind::from_local_name(start.local_name().as_ref()));
            }
            Event::Eof => return Ok(NodeKind::Other),
            _ => {}
        }
    }
}

fn push_reference(output: &mut String, reference: &BytesRef<'_>) -> Result<(), AppError> {
    let name = reference.decode().map_err(|e| AppError::structural(e.to_string()))?;
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(ch) = value.and_then(char::from_u32) {
            output.push(ch);
        }
        return Ok(());
    }
    match quick_xml::escape::resolve_predefined_entity(&name) {
        Some(resolved) => output.push_str(resolved),
        None => {
            output.push('&');
            output.push_str(&name);
            output.push(';');
        }
    }
    Ok(())
}

/// Offset of the `<` opening the tag whose event started at `position`.
fn tag_start(xml: &str, position: usize) -> usize {
    let bytes = xml.as_bytes();
    if bytes.get(position) == Some(&b'<') {
        return position;
    }
    bytes[..position.min(bytes.len())].iter().rposition(|b| *b == b'<').unwrap_or(position)
}

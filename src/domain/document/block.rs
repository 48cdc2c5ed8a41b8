//! Block-level element types of the structural model.

use std::path::PathBuf;

/// Kind of a positional unit in the document body.
///
/// A whole table is one unit, so "paragraph or table cell" addressing maps to
/// `Paragraph` or `Table`; individual cells are read, never addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A body paragraph.
    Paragraph,
    /// A table; its cells are reachable through `DocumentModel::table_cells`.
    Table,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Table => "table",
        }
    }
}

/// Read-only view of one block.
///
/// Borrows from the model, so a view can never outlive a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Position among all blocks, including empty ones.
    pub index: usize,
    pub kind: BlockKind,
    /// Extracted plain text, trimmed.
    pub text: &'a str,
}

/// Rendering hint for a new paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphStyle {
    #[default]
    Body,
    /// Fixed-width, compact spacing.
    Code,
}

/// Element that the model knows how to serialize into the body.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderableBlock {
    Paragraph { text: String, style: ParagraphStyle },
    Table { headers: Option<Vec<String>>, rows: Vec<Vec<String>> },
    Image { path: PathBuf, width_inches: f64 },
}

impl RenderableBlock {
    pub fn text(text: impl Into<String>) -> Self {
        RenderableBlock::Paragraph { text: text.into(), style: ParagraphStyle::Body }
    }

    /// A single line of source code. Blank lines become one space so they survive layout.
    pub fn code_line(line: &str) -> Self {
        let text = if line.trim().is_empty() { " ".to_string() } else { line.to_string() };
        RenderableBlock::Paragraph { text, style: ParagraphStyle::Code }
    }
}

/// Pad or truncate every row to `columns` cells.
pub(crate) fn normalize_rows(rows: &[Vec<String>], columns: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().take(columns).cloned().collect();
            cells.resize(columns, String::new());
            cells
        })
        .collect()
}

/// Column count of a table: the header width when present, otherwise the widest row.
pub(crate) fn column_count(headers: Option<&[String]>, rows: &[Vec<String>]) -> usize {
    match headers {
        Some(headers) => headers.len(),
        None => rows.iter().map(Vec::len).max().unwrap_or(0),
    }
}

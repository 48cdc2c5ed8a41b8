//! Structural model of a Word document body.
//!
//! The body is held as an ordered list of its direct children. Paragraphs and
//! tables are *blocks*, addressed by their position among all blocks; empty
//! blocks keep their index so addresses always match the real body. All
//! mutation goes through [`DocumentModel::splice_after`].

mod block;
mod body;
mod markup;
mod package;

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::AppError;

pub use block::{Block, BlockKind, ParagraphStyle, RenderableBlock};
pub(crate) use block::normalize_rows;

use body::{BodyLayout, BodyNode, NodeKind};
use markup::{EMU_PER_INCH, Markup, PictureRef};
use package::{MAIN_DOCUMENT, Package};

/// Fallback height/width ratio when the image header cannot be read.
const DEFAULT_ASPECT: f64 = 0.75;

static DRAWING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"docPr\b[^>]*?\bid="(\d+)""#).expect("valid docPr id regex"));

/// In-memory document: packaged container plus the parsed body.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    package: Package,
    layout: BodyLayout,
    nodes: Vec<BodyNode>,
    markup: Markup,
    next_drawing_id: u32,
    dirty: bool,
}

impl DocumentModel {
    /// Load a document from disk.
    pub fn load(source: &Path) -> Result<Self, AppError> {
        let bytes = fs::read(source).map_err(|e| {
            AppError::structural(format!("cannot read {}: {}", source.display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    /// Parse a document from the raw container bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AppError> {
        let package = Package::open(bytes)?;
        let xml = package
            .read_text(MAIN_DOCUMENT)?
            .ok_or_else(|| AppError::structural(format!("missing {MAIN_DOCUMENT}")))?;
        let (layout, nodes) = body::split_document(&xml)?;

        let next_drawing_id = DRAWING_ID
            .captures_iter(&xml)
            .filter_map(|captures| captures[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let markup = Markup::new(layout.ns_prefix.clone());
        debug!(nodes = nodes.len(), "parsed document body");
        Ok(Self { package, layout, nodes, markup, next_drawing_id, dirty: false })
    }

    /// Number of blocks, empty ones included.
    pub fn block_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.kind.is_block()).count()
    }

    /// Trimmed text of the block at `index`.
    pub fn text_of(&self, index: usize) -> Result<&str, AppError> {
        self.block_node(index).map(|node| node.text.as_str())
    }

    /// Kind of the block at `index`.
    pub fn kind_of(&self, index: usize) -> Result<BlockKind, AppError> {
        self.block_node(index).map(|node| block_kind(node.kind))
    }

    /// Non-empty blocks, each carrying its position in the full block sequence.
    pub fn blocks(&self) -> impl Iterator<Item = Block<'_>> {
        self.all_blocks().filter(|block| !block.text.is_empty())
    }

    /// Cell texts of a table block, row by row.
    pub fn table_cells(&self, index: usize) -> Result<Vec<String>, AppError> {
        let node = self.block_node(index)?;
        match node.kind {
            NodeKind::Table => body::table_cells(&node.xml),
            _ => Ok(Vec::new()),
        }
    }

    /// All non-empty text, one line per paragraph and per table cell.
    pub fn full_text(&self) -> String {
        self.blocks().map(|block| block.text).collect::<Vec<_>>().join("\n")
    }

    /// Non-empty block text in the `before` blocks preceding and `after` blocks following `index`.
    pub fn context_around(&self, index: usize, before: usize, after: usize) -> (String, String) {
        let start = index.saturating_sub(before);
        let end = index.saturating_add(after);
        let mut preceding = Vec::new();
        let mut following = Vec::new();
        for block in self.blocks() {
            if block.index >= start && block.index < index {
                preceding.push(block.text);
            } else if block.index > index && block.index <= end {
                following.push(block.text);
            }
        }
        (preceding.join("\n"), following.join("\n"))
    }

    /// Insert `new_blocks` right after block `index`, or at the end of the body when
    /// `index >= block_count()`. Returns the number of blocks inserted.
    ///
    /// Rendering happens before anything is inserted, so a failure leaves the
    /// model untouched.
    pub fn splice_after(
        &mut self,
        index: usize,
        new_blocks: Vec<RenderableBlock>,
    ) -> Result<usize, AppError> {
        let mut rendered = Vec::with_capacity(new_blocks.len());
        let mut package = self.package.clone();
        let mut next_drawing_id = self.next_drawing_id;
        for block in &new_blocks {
            let xml = match block {
                RenderableBlock::Paragraph { text, style } => self.markup.paragraph(text, *style),
                RenderableBlock::Table { headers, rows } => {
                    self.markup.table(headers.as_deref(), rows)
                }
                RenderableBlock::Image { path, width_inches } => {
                    let xml = self.image_markup(
                        &mut package,
                        next_drawing_id,
                        path,
                        *width_inches,
                    )?;
                    next_drawing_id += 1;
                    xml
                }
            };
            rendered.push(BodyNode::from_fragment(xml)?);
        }

        let inserted = rendered.len();
        let position = self.insertion_position(index);
        self.nodes.splice(position..position, rendered);
        self.package = package;
        self.next_drawing_id = next_drawing_id;
        self.dirty = self.dirty || inserted > 0;
        Ok(inserted)
    }

    /// Write the document to `destination`. An unmodified model writes the
    /// main document part back verbatim.
    pub fn save(&self, destination: &Path) -> Result<(), AppError> {
        let xml = self.dirty.then(|| self.body_xml());
        self.package.save(destination, xml.as_deref())
    }

    /// Serialized container bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AppError> {
        let xml = self.dirty.then(|| self.body_xml());
        let cursor = self.package.write_to(std::io::Cursor::new(Vec::new()), xml.as_deref())?;
        Ok(cursor.into_inner())
    }

    fn body_xml(&self) -> String {
        let mut xml = self.layout.prefix.clone();
        for node in &self.nodes {
            xml.push_str(&node.xml);
        }
        xml.push_str(&self.layout.suffix);
        xml
    }

    fn all_blocks(&self) -> impl Iterator<Item = Block<'_>> {
        self.nodes.iter().filter(|node| node.kind.is_block()).enumerate().map(|(index, node)| {
            Block { index, kind: block_kind(node.kind), text: node.text.as_str() }
        })
    }

    fn block_node(&self, index: usize) -> Result<&BodyNode, AppError> {
        self.nodes
            .iter()
            .filter(|node| node.kind.is_block())
            .nth(index)
            .ok_or(AppError::OutOfRange { index, count: self.block_count() })
    }

    /// Node position right after block `index`; past-the-end goes before the section properties.
    fn insertion_position(&self, index: usize) -> usize {
        let found = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind.is_block())
            .nth(index)
            .map(|(position, _)| position + 1);

        found.unwrap_or_else(|| {
            self.nodes
                .iter()
                .rposition(|node| node.kind == NodeKind::SectionProperties)
                .unwrap_or(self.nodes.len())
        })
    }

    fn image_markup(
        &self,
        package: &mut Package,
        drawing_id: u32,
        path: &Path,
        width_inches: f64,
    ) -> Result<String, AppError> {
        let image_error = |reason: String| AppError::Image { path: path.display().to_string(), reason };

        let extension = image_extension(path)
            .ok_or_else(|| image_error("unsupported image format".to_string()))?;
        let bytes = fs::read(path).map_err(|e| image_error(e.to_string()))?;
        if !(width_inches.is_finite() && width_inches > 0.0) {
            return Err(image_error(format!("invalid width {width_inches}")));
        }

        let aspect = png_dimensions(&bytes)
            .filter(|(width, height)| *width > 0 && *height > 0)
            .map(|(width, height)| f64::from(height) / f64::from(width))
            .unwrap_or(DEFAULT_ASPECT);
        let width_emu = (width_inches * EMU_PER_INCH).round() as u64;
        let height_emu = (width_inches * aspect * EMU_PER_INCH).round() as u64;

        let relationship_id = package.embed_image(&bytes, &extension)?;
        let name = file_name(path);
        Ok(self.markup.picture(&PictureRef {
            relationship_id: &relationship_id,
            drawing_id,
            name: &name,
            width_emu,
            height_emu,
        }))
    }
}

fn block_kind(kind: NodeKind) -> BlockKind {
    match kind {
        NodeKind::Table => BlockKind::Table,
        _ => BlockKind::Paragraph,
    }
}

fn image_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    matches!(extension.as_str(), "png" | "jpg" | "jpeg" | "gif" | "bmp").then_some(extension)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Width and height from a PNG IHDR chunk.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
    if bytes.len() < 24 || !bytes.starts_with(SIGNATURE) || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

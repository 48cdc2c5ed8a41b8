//! Packaged-XML container (ZIP) access.
//!
//! Parts that are never replaced are copied raw on save, so their compressed
//! bytes stay identical to the source.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::AppError;

pub(crate) const MAIN_DOCUMENT: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const EMPTY_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    "</Relationships>"
);

static RELATIONSHIP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bId="rId(\d+)""#).expect("valid relationship id regex"));

#[derive(Debug, Clone)]
pub(crate) struct Package {
    /// Original container bytes, shared between clones.
    source: Arc<[u8]>,
    entry_names: Vec<String>,
    replaced: BTreeMap<String, Vec<u8>>,
    added: BTreeMap<String, Vec<u8>>,
    /// Media digest -> relationship id, so identical images share one part.
    media: HashMap<String, String>,
}

impl Package {
    pub(crate) fn open(source: Vec<u8>) -> Result<Self, AppError> {
        let mut archive = ZipArchive::new(Cursor::new(source.as_slice()))?;
        let mut entry_names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            entry_names.push(archive.by_index(index)?.name().to_string());
        }
        if !entry_names.iter().any(|name| name == MAIN_DOCUMENT) {
            return Err(AppError::structural(format!("missing {MAIN_DOCUMENT}")));
        }
        drop(archive);

        Ok(Self {
            source: source.into(),
            entry_names,
            replaced: BTreeMap::new(),
            added: BTreeMap::new(),
            media: HashMap::new(),
        })
    }

    /// Current content of a part as UTF-8, or `None` if the part does not exist.
    pub(crate) fn read_text(&self, name: &str) -> Result<Option<String>, AppError> {
        if let Some(bytes) = self.replaced.get(name).or_else(|| self.added.get(name)) {
            return String::from_utf8(bytes.clone())
                .map(Some)
                .map_err(|e| AppError::structural(format!("{name} is not UTF-8: {e}")));
        }
        if !self.entry_names.iter().any(|entry| entry == name) {
            return Ok(None);
        }

        let mut archive = ZipArchive::new(Cursor::new(&self.source[..]))?;
        let mut file = archive.by_name(name)?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| AppError::structural(format!("cannot read {name}: {e}")))?;
        Ok(Some(content))
    }

    fn put(&mut self, name: &str, bytes: Vec<u8>) {
        if self.entry_names.iter().any(|entry| entry == name) {
            self.replaced.insert(name.to_string(), bytes);
        } else {
            self.added.insert(name.to_string(), bytes);
        }
    }

    /// Store image bytes as a media part and return its relationship id.
    pub(crate) fn embed_image(&mut self, bytes: &[u8], extension: &str) -> Result<String, AppError> {
        let digest = hex_digest(bytes);
        if let Some(existing) = self.media.get(&digest) {
            return Ok(existing.clone());
        }

        let target = format!("media/docfill-{}.{}", &digest[..16], extension);
        let rels = self.read_text(DOCUMENT_RELS)?.unwrap_or_else(|| EMPTY_RELS.to_string());
        let next_id = RELATIONSHIP_ID
            .captures_iter(&rels)
            .filter_map(|captures| captures[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let relationship_id = format!("rId{next_id}");
        let relationship = format!(
            r#"<Relationship Id="{relationship_id}" Type="{IMAGE_RELATIONSHIP}" Target="{target}"/>"#
        );
        let rels = insert_before_closing(&rels, "</Relationships>", &relationship)
            .ok_or_else(|| AppError::structural(format!("{DOCUMENT_RELS} has no root end tag")))?;
        self.put(DOCUMENT_RELS, rels.into_bytes());

        let content_types = self
            .read_text(CONTENT_TYPES)?
            .ok_or_else(|| AppError::structural(format!("missing {CONTENT_TYPES}")))?;
        if !declares_extension(&content_types, extension) {
            let default = format!(
                r#"<Default Extension="{extension}" ContentType="{}"/>"#,
                media_type(extension)
            );
            let updated = insert_before_closing(&content_types, "</Types>", &default)
                .ok_or_else(|| AppError::structural(format!("{CONTENT_TYPES} has no root end tag")))?;
            self.put(CONTENT_TYPES, updated.into_bytes());
        }

        self.put(&format!("word/{target}"), bytes.to_vec());
        self.media.insert(digest, relationship_id.clone());
        Ok(relationship_id)
    }

    /// Serialize the package, substituting the main document part when given.
    pub(crate) fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        main_document: Option<&str>,
    ) -> Result<W, AppError> {
        let mut archive = ZipArchive::new(Cursor::new(&self.source[..]))?;
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (index, name) in self.entry_names.iter().enumerate() {
            let replacement = match (name.as_str(), main_document) {
                (MAIN_DOCUMENT, Some(xml)) => Some(xml.as_bytes()),
                _ => self.replaced.get(name).map(Vec::as_slice),
            };
            match replacement {
                Some(bytes) => {
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(bytes)?;
                }
                None => zip.raw_copy_file(archive.by_index(index)?)?,
            }
        }
        for (name, bytes) in &self.added {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        Ok(zip.finish()?)
    }

    /// Write to `path` through a sibling temp file so a failed save never truncates the target.
    pub(crate) fn save(&self, path: &Path, main_document: Option<&str>) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = temp_path(path);
        let file = fs::File::create(&temp)?;
        let result = self.write_to(file, main_document).and_then(|file| {
            file.sync_all()?;
            Ok(())
        });
        if let Err(err) = result {
            let _ = fs::remove_file(&temp);
            return Err(err);
        }
        fs::rename(&temp, path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".docfill-tmp");
    path.with_file_name(name)
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|byte| format!("{byte:02x}")).collect()
}

fn insert_before_closing(xml: &str, closing: &str, fragment: &str) -> Option<String> {
    let position = xml.rfind(closing)?;
    let mut updated = String::with_capacity(xml.len() + fragment.len());
    updated.push_str(&xml[..position]);
    updated.push_str(fragment);
    updated.push_str(&xml[position..]);
    Some(updated)
}

fn declares_extension(content_types: &str, extension: &str) -> bool {
    let lowered = content_types.to_ascii_lowercase();
    lowered.contains(&format!("extension=\"{}\"", extension.to_ascii_lowercase()))
}

fn media_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

//! OOXML package access: parts, relationships and media.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mdocx_core::ExtractedImage;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::ExtractError;
use crate::node::Node;

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const RELS_PART: &str = "word/_rels/document.xml.rels";
pub(crate) const STYLES_PART: &str = "word/styles.xml";
pub(crate) const NUMBERING_PART: &str = "word/numbering.xml";

/// Opened DOCX package.
pub(crate) struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self, ExtractError> {
        Ok(Self {
            archive: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// Raw bytes of a part, `None` when absent.
    pub(crate) fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, ExtractError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    /// UTF-8 text of a part, `None` when absent.
    pub(crate) fn read_text(&mut self, name: &str) -> Result<Option<String>, ExtractError> {
        match self.read(name)? {
            Some(bytes) => {
                let text = std::str::from_utf8(&bytes)?;
                Ok(Some(text.trim_start_matches('\u{feff}').to_owned()))
            }
            None => Ok(None),
        }
    }

    /// Resolve a relationship target relative to `word/`.
    pub(crate) fn part_name(target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_owned();
        }
        let mut parts: Vec<&str> = vec!["word"];
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }
        parts.join("/")
    }
}

/// A relationship from `document.xml.rels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub target: String,
    pub external: bool,
}

/// Relationship id to target.
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    pub(crate) fn from_tree(root: &Node) -> Self {
        let mut by_id = HashMap::new();
        if let Some(rels) = root.child("Relationships") {
            for rel in rels.children_named("Relationship") {
                if let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) {
                    by_id.insert(
                        id.to_owned(),
                        Relationship {
                            target: target.to_owned(),
                            external: rel.attr("TargetMode") == Some("External"),
                        },
                    );
                }
            }
        }
        Self { by_id }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }
}

/// Turns media parts into image sources: extracted files or data URIs.
#[derive(Debug)]
pub(crate) struct Media {
    /// Link prefix for extracted files; `None` inlines data URIs.
    extract_to: Option<String>,
    sources: HashMap<String, String>,
    pub images: Vec<ExtractedImage>,
    pub count: usize,
}

impl Media {
    pub(crate) fn new(extract_to: Option<&Path>) -> Self {
        Self {
            extract_to: extract_to.map(|dir| {
                dir.to_string_lossy()
                    .replace('\\', "/")
                    .trim_end_matches('/')
                    .to_owned()
            }),
            sources: HashMap::new(),
            images: Vec::new(),
            count: 0,
        }
    }

    /// Image source for a media part, reading it once.
    pub(crate) fn source(
        &mut self,
        package: &mut Package<'_>,
        part: &str,
    ) -> Result<Option<String>, ExtractError> {
        if let Some(src) = self.sources.get(part) {
            self.count += 1;
            return Ok(Some(src.clone()));
        }
        let Some(bytes) = package.read(part)? else {
            return Ok(None);
        };

        let file_name = part.rsplit('/').next().unwrap_or(part).to_owned();
        let src = match &self.extract_to {
            Some(dir) => {
                let src = if dir.is_empty() {
                    file_name.clone()
                } else {
                    format!("{dir}/{file_name}")
                };
                self.images.push(ExtractedImage { file_name, bytes });
                src
            }
            None => format!(
                "data:{};base64,{}",
                mime_type(&file_name),
                STANDARD.encode(&bytes)
            ),
        };
        self.sources.insert(part.to_owned(), src.clone());
        self.count += 1;
        Ok(Some(src))
    }
}

fn mime_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

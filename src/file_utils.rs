use anyhow::{Context, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::render::{output_file_name, OutputFormat};

// @module: File and directory utilities

/// Kind of input the pipeline can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Word-processor package, translated in place
    Docx,
    /// PDF, extracted then rendered
    Pdf,
    /// Raster image with its mime type
    Image(&'static str),
    /// Extracted pages as JSON (output of `extract`)
    Pages,
    /// Anything else
    Unknown,
}

impl FileType {
    /// Mime type sent to the oracles
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Docx => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            Self::Pdf => Some("application/pdf"),
            Self::Image(mime) => Some(*mime),
            Self::Pages => Some("application/json"),
            Self::Unknown => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

fn type_from_extension(ext: &str) -> FileType {
    match ext {
        "docx" => FileType::Docx,
        "pdf" => FileType::Pdf,
        "png" => FileType::Image("image/png"),
        "jpg" | "jpeg" => FileType::Image("image/jpeg"),
        "webp" => FileType::Image("image/webp"),
        "gif" => FileType::Image("image/gif"),
        "json" => FileType::Pages,
        _ => FileType::Unknown,
    }
}

fn type_from_magic(header: &[u8]) -> FileType {
    if header.starts_with(b"%PDF") {
        FileType::Pdf
    } else if header.starts_with(&[0x89, b'P', b'N', b'G']) {
        FileType::Image("image/png")
    } else if header.starts_with(&[0xff, 0xd8, 0xff]) {
        FileType::Image("image/jpeg")
    } else if header.starts_with(b"GIF8") {
        FileType::Image("image/gif")
    } else if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        FileType::Image("image/webp")
    } else if header.starts_with(b"PK\x03\x04") {
        // Any zip is treated as a word-processor package; the surgeon rejects others
        FileType::Docx
    } else {
        FileType::Unknown
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// File stem used for output naming; `document` when the path has none.
    /// Saved pages files (`<stem>_pages.json`) map back to their source stem.
    pub fn file_stem<P: AsRef<Path>>(path: P) -> String {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let stem = match stem.strip_suffix("_pages") {
            Some(source) if is_json => source.to_string(),
            _ => stem,
        };

        if stem.is_empty() {
            "document".to_string()
        } else {
            stem
        }
    }

    /// `<output_dir>/<stem>_translated.<ext>`
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        format: OutputFormat,
    ) -> PathBuf {
        output_dir
            .as_ref()
            .join(output_file_name(&Self::file_stem(input_file), format))
    }

    /// `<output_dir>/<stem><suffix>` for side files such as saved pages or outcomes
    pub fn generate_side_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2, suffix: &str) -> PathBuf {
        output_dir
            .as_ref()
            .join(format!("{}{}", Self::file_stem(input_file), suffix))
    }

    /// Find every supported input file under `dir`, sorted by path
    pub fn find_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::detect_file_type(path)?.is_supported() {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a whole file
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write `content` atomically: bytes go to a temporary file in the target
    /// directory which is then renamed over the destination
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        temp.write_all(content)
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        temp.persist(path)
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        Ok(())
    }

    /// Detect the input kind from the extension, falling back to magic bytes
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let by_extension = type_from_extension(&ext.to_string_lossy().to_lowercase());
            if by_extension.is_supported() {
                return Ok(by_extension);
            }
        }

        let mut header = [0u8; 12];
        let mut file = fs::File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
        let read = file.read(&mut header)?;
        Ok(type_from_magic(&header[..read]))
    }
}

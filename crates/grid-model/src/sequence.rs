//! Candidate files and numbered image sequences.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Anything the sequence detector can group: it only needs a file name.
pub trait NamedFile {
    /// Base file name, including extension.
    fn file_name(&self) -> &str;
}

impl NamedFile for str {
    fn file_name(&self) -> &str {
        self
    }
}

impl NamedFile for &str {
    fn file_name(&self) -> &str {
        self
    }
}

impl NamedFile for String {
    fn file_name(&self) -> &str {
        self.as_str()
    }
}

/// A user-supplied image file. Immutable once read.
#[derive(Clone)]
pub struct CandidateFile {
    name: String,
    path: Option<PathBuf>,
    bytes: Arc<[u8]>,
}

impl CandidateFile {
    /// Wrap in-memory bytes under a file name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            path: None,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The name is the path's final component.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            bytes: bytes.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the file was read from, if it came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw encoded image data.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded data.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }
}

impl NamedFile for CandidateFile {
    fn file_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// How the frame number is written in a sequence's file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Numbering {
    /// Fixed-width number of 2 to 4 digits (e.g. `007`).
    Padded { width: usize },
    /// Unpadded counting (`1`, `2`, ..., `10`).
    Natural,
}

/// The shared naming pattern of a sequence's files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequencePattern {
    /// Text before the frame number (may be empty).
    pub prefix: String,
    /// Extension including the leading dot.
    pub suffix: String,
    pub numbering: Numbering,
}

impl SequencePattern {
    pub fn padded(prefix: impl Into<String>, width: usize, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            numbering: Numbering::Padded { width },
        }
    }

    pub fn natural(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            numbering: Numbering::Natural,
        }
    }

    /// Digit width for padded patterns.
    pub fn digit_width(&self) -> Option<usize> {
        match self.numbering {
            Numbering::Padded { width } => Some(width),
            Numbering::Natural => None,
        }
    }
}

impl fmt::Display for SequencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.numbering {
            Numbering::Padded { width } => {
                write!(f, "{}{}{}", self.prefix, "0".repeat(width), self.suffix)
            }
            Numbering::Natural => write!(f, "{}#{}", self.prefix, self.suffix),
        }
    }
}

/// A numbered run of at least two files, ordered by frame number.
#[derive(Debug, Clone)]
pub struct Sequence<F = CandidateFile> {
    pattern: SequencePattern,
    files: Vec<F>,
    indices: Vec<u32>,
}

impl<F> Sequence<F> {
    /// Build a sequence from files and their parsed indices.
    ///
    /// Fails unless there are at least two files, one index per file, and
    /// the indices are strictly increasing.
    pub fn new(pattern: SequencePattern, files: Vec<F>, indices: Vec<u32>) -> Result<Self, ModelError> {
        if files.len() < 2 || files.len() != indices.len() {
            return Err(ModelError::InvalidSequence {
                reason: format!("{} files with {} indices", files.len(), indices.len()),
            });
        }
        if indices.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ModelError::InvalidSequence {
                reason: "frame indices are not strictly increasing".to_string(),
            });
        }
        Ok(Self {
            pattern,
            files,
            indices,
        })
    }

    pub fn pattern(&self) -> &SequencePattern {
        &self.pattern
    }

    pub fn files(&self) -> &[F] {
        &self.files
    }

    /// Parsed frame number of each file, parallel to `files()`.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of frames. Always at least two.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; sequences hold at least two files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<F: NamedFile> Sequence<F> {
    /// File names in frame order.
    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(NamedFile::file_name).collect()
    }
}

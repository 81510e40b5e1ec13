//! Binlog positions and their ordering.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A location in the replication log: a segment (binlog file) name and a
/// byte offset within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    file: String,
    offset: u64,
}

impl Position {
    /// Create a position from a segment name and offset.
    pub fn new(file: impl Into<String>, offset: u64) -> Self {
        Self {
            file: file.into(),
            offset,
        }
    }

    /// Segment (binlog file) name.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Byte offset within the segment.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether this position is strictly newer than `other`.
    ///
    /// Every position is newer than an absent one. Equal positions are
    /// neither newer nor older.
    pub fn newer_than(&self, other: Option<&Position>) -> bool {
        match other {
            None => true,
            Some(other) => match compare_segments(&self.file, &other.file) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => self.offset > other.offset,
            },
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.offset)
    }
}

/// Order two segment names.
///
/// MySQL names binlog segments `<base>.<sequence>`. When both names share a
/// base and both sequences are numeric the sequences are compared as numbers,
/// so a rollover past the zero-padded width still sorts correctly. Anything
/// else falls back to lexical order.
pub fn compare_segments(a: &str, b: &str) -> Ordering {
    match (split_segment(a), split_segment(b)) {
        (Some((base_a, seq_a)), Some((base_b, seq_b))) if base_a == base_b => {
            seq_a.cmp(&seq_b).then_with(|| a.cmp(b))
        }
        _ => a.cmp(b),
    }
}

fn split_segment(name: &str) -> Option<(&str, u64)> {
    let (base, seq) = name.rsplit_once('.')?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    seq.parse().ok().map(|seq| (base, seq))
}

//! Classification labels derived from raster file names.
//!
//! `data/Rasters/Hydraulic/Depth____0.0.asc` -> `["Depth", "0.0"]`

use crate::error::{BatchError, Result};

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Final path segment, accepting both `/` and `\` separators.
fn basename(path: &str) -> &str {
    path.trim_end_matches(is_separator)
        .rsplit(is_separator)
        .next()
        .unwrap_or_default()
}

/// File name up to the first `.` that is not a decimal point.
///
/// A dot between two ASCII digits belongs to a value such as `0.5`, so
/// `Depth____0.5.asc` keeps `Depth____0.5` while `a.b.c` keeps `a`.
fn stem(name: &str) -> &str {
    let bytes = name.as_bytes();
    let cut = bytes.iter().enumerate().position(|(i, &b)| {
        let decimal = i > 0
            && bytes[i - 1].is_ascii_digit()
            && bytes.get(i + 1).map_or(false, u8::is_ascii_digit);
        b == b'.' && !decimal
    });
    match cut {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Underscore-separated tokens of the file stem, empty tokens dropped.
pub fn extract_label(path: &str) -> Vec<String> {
    stem(basename(path))
        .split('_')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// First two label tokens of a raster, e.g. variable name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabel {
    pub class: String,
    pub value: String,
}

impl ClassLabel {
    pub fn from_path(raster: &str) -> Result<Self> {
        Self::from_tokens(raster, extract_label(raster))
    }

    pub fn from_tokens(raster: &str, tokens: Vec<String>) -> Result<Self> {
        let found = tokens.len();
        let mut tokens = tokens.into_iter();
        match (tokens.next(), tokens.next()) {
            (Some(class), Some(value)) => Ok(ClassLabel { class, value }),
            _ => Err(BatchError::InsufficientLabel {
                raster: raster.to_string(),
                found,
            }),
        }
    }

    /// `<class>_<value>`, the output file stem.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.class, self.value)
    }
}

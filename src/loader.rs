use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::{BatchError, Result};

/// Raster paths from the first CSV record. Later records are ignored.
pub fn load_paths(path: &Path) -> Result<Vec<String>> {
    let mut records = read_file(path)?;
    if records.len() > 1 {
        warn!(
            "{:?}: using first record only, ignoring {} more (see --all-rows)",
            path,
            records.len() - 1
        );
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }
    Ok(records.swap_remove(0))
}

/// Raster paths from every CSV record, flattened in file order.
pub fn load_all_paths(path: &Path) -> Result<Vec<String>> {
    Ok(read_file(path)?.into_iter().flatten().collect())
}

fn read_file(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(file).map_err(|source| BatchError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("{:?}: {} record(s)", path, records.len());
    Ok(records)
}

/// Parse comma-separated records, skipping `#` comment lines.
///
/// Records may differ in length. Blanks before a field are dropped ahead of
/// quote detection, so `a, "b,c"` is two fields. Bytes that are not UTF-8
/// become U+FFFD instead of failing the record.
pub fn read_records<R: Read>(mut input: R) -> std::result::Result<Vec<Vec<String>>, csv::Error> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw)?;
    let trimmed = trim_leading_blanks(&raw);

    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .comment(Some(b'#'))
        .flexible(true)
        .has_headers(false)
        .from_reader(trimmed.as_slice());

    let mut records = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        records.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(records)
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | 0x0b | 0x0c)
}

/// Drop blanks at the start of every field outside quoted sections.
/// Comment lines pass through untouched.
fn trim_leading_blanks(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied().peekable();
    let mut line_start = true;
    let mut field_start = true;
    let mut in_quotes = false;

    while let Some(b) = bytes.next() {
        if in_quotes {
            out.push(b);
            if b == b'"' {
                if bytes.peek() == Some(&b'"') {
                    out.push(b'"');
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        if line_start && b == b'#' {
            out.push(b);
            for c in bytes.by_ref() {
                out.push(c);
                if c == b'\n' {
                    break;
                }
            }
            continue;
        }
        if field_start && is_blank(b) {
            continue;
        }
        if field_start && b == b'"' {
            in_quotes = true;
        }
        out.push(b);
        line_start = b == b'\n';
        field_start = b == b',' || b == b'\n';
    }
    out
}

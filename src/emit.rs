use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BatchError, Result};
use crate::job::GdalJob;

/// 4-space pretty printer that writes `<`, `>`, `&`, U+2028 and U+2029
/// as `\uXXXX` escapes.
struct BatchFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl<'a> BatchFormatter<'a> {
    fn new() -> Self {
        BatchFormatter {
            pretty: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl<'a> Formatter for BatchFormatter<'a> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// JSON array with 4-space indentation and a trailing newline.
pub fn render(jobs: &[GdalJob]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = BatchFormatter::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    jobs.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write the batch file, replacing any previous one.
///
/// The bytes go to a temp file next to `path` which is then renamed over it,
/// so readers see either the old file or the complete new one.
pub fn write_json(jobs: &[GdalJob], path: &Path) -> Result<()> {
    let bytes = render(jobs)?;
    let write_err = |source: std::io::Error| BatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

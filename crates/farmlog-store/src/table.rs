//! Minimal CSV tables: a header row plus string fields.
//!
//! Fields containing a comma, quote or line break are quoted, with embedded
//! quotes doubled. Every write replaces the whole file: the table is written
//! to a sibling temporary file and renamed over the target.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// One data row and the line it started on (for error messages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Column positions for a fixed set of names, resolved once per file.
#[derive(Debug, Clone)]
pub struct Columns {
    names: Vec<&'static str>,
    positions: Vec<usize>,
}

impl Columns {
    pub fn resolve(table: &Table, names: &[&'static str], path: &Path) -> StoreResult<Self> {
        let positions = names
            .iter()
            .map(|name| {
                table.column(name).ok_or_else(|| StoreError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self {
            names: names.to_vec(),
            positions,
        })
    }

    /// Field `name` of `row`. Names outside the resolved set read as empty.
    pub fn get<'r>(&self, row: &'r Row, name: &str) -> &'r str {
        self.names
            .iter()
            .position(|n| *n == name)
            .and_then(|i| row.fields.get(self.positions[i]))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Parse CSV text. Empty text yields `None`.
pub fn parse(text: &str) -> Result<Option<Table>, (usize, String)> {
    let mut rows = split_rows(text)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(None);
    };
    let width = header.fields.len();
    let rows = rows
        .map(|row| {
            if row.fields.len() == width {
                Ok(row)
            } else {
                Err((
                    row.line,
                    format!("expected {} fields, found {}", width, row.fields.len()),
                ))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Table {
        header: header.fields,
        rows,
    }))
}

fn split_rows(text: &str) -> Result<Vec<Row>, (usize, String)> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                rows.push(Row {
                    line: row_line,
                    fields: std::mem::take(&mut fields),
                });
                line += 1;
                row_line = line;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err((row_line, "unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push(Row {
            line: row_line,
            fields,
        });
    }
    rows.retain(|r| !(r.fields.len() == 1 && r.fields[0].is_empty()));
    Ok(rows)
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render a header and rows as CSV text, one line per row.
pub fn render<S: AsRef<str>>(header: &[&str], rows: &[Vec<S>]) -> String {
    let mut out = String::new();
    push_line(&mut out, header.iter().copied());
    for row in rows {
        push_line(&mut out, row.iter().map(AsRef::as_ref));
    }
    out
}

fn push_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let line: Vec<_> = fields.map(escape).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// Read and parse the table at `path`. A missing or empty file yields `None`.
pub fn read(path: &Path) -> StoreResult<Option<Table>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    parse(&text).map_err(|(line, message)| StoreError::malformed(path, line, message))
}

/// Replace the file at `path` with the given table.
pub fn write<S: AsRef<str>>(path: &Path, header: &[&str], rows: &[Vec<S>]) -> StoreResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, render(header, rows)).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

//! Tabular output sinks
//!
//! Plugins hand their results to a [`TabularWriter`] as a named table of
//! typed columns. The writer decides how the rows are persisted: one CSV
//! file per table, one SQLite table per table, or several at once with
//! [`MultiWriter`].

use crate::errors::Error;
use crate::time::Timestamp;
use crate::utils::next_available_file_name;
use std::path::{Path, PathBuf};

/// Semantic type of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Text,
    Date,
    Integer,
}

impl DataType {
    fn sqlite_affinity(self) -> &'static str {
        match self {
            DataType::Text => "TEXT",
            // ISO 8601 text sorts chronologically
            DataType::Date => "TEXT",
            DataType::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub data_type: DataType,
}

impl Column {
    pub const fn new(name: &'static str, data_type: DataType) -> Self {
        Self { name, data_type }
    }
}

/// A single value in an output row
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Date(Timestamp),
    Integer(i64),
}

impl Cell {
    fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Date(ts) => ts.to_string(),
            Cell::Integer(i) => i.to_string(),
        }
    }
}

impl rusqlite::ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value};

        let value = match self {
            Cell::Text(s) => Value::Text(s.clone()),
            Cell::Date(Timestamp::Unavailable) => Value::Null,
            Cell::Date(ts) => Value::Text(ts.to_string()),
            Cell::Integer(i) => Value::Integer(*i),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Appends rows to a structured output sink.
pub trait TabularWriter {
    /// Writes `rows` to the table `table_name`. `sheet_name` groups related
    /// tables for sinks that support it.
    fn write_rows(
        &mut self,
        sheet_name: &str,
        table_name: &str,
        columns: &[Column],
        rows: &[Vec<Cell>],
    ) -> Result<(), Error>;
}

/// Output formats selectable in [`OutputParams`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Sqlite,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "sqlite" | "db" => Ok(OutputFormat::Sqlite),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

/// Where and how results are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputParams {
    pub output_dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

impl OutputParams {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats: vec![OutputFormat::Csv],
        }
    }

    #[must_use]
    pub fn formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Opens a writer for every configured format.
    ///
    /// The SQLite database is created as `dockitems.db` in the output
    /// directory.
    pub fn open_writer(&self) -> Result<MultiWriter, Error> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut writer = MultiWriter::new();
        for format in &self.formats {
            match format {
                OutputFormat::Csv => writer.push(CsvWriter::new(&self.output_dir)),
                OutputFormat::Sqlite => {
                    writer.push(SqliteWriter::open(self.output_dir.join("dockitems.db"))?)
                }
            }
        }
        Ok(writer)
    }
}

/// Writes each table to `<dir>/<table>.csv`
#[derive(Debug)]
pub struct CsvWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        }
    }

    /// Paths of the files created so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TabularWriter for CsvWriter {
    fn write_rows(
        &mut self,
        _sheet_name: &str,
        table_name: &str,
        columns: &[Column],
        rows: &[Vec<Cell>],
    ) -> Result<(), Error> {
        let path = next_available_file_name(&self.dir.join(format!("{}.csv", table_name)));
        let mut writer = csv::Writer::from_path(&path)?;

        writer.write_record(columns.iter().map(|c| c.name))?;
        for row in rows {
            writer.write_record(row.iter().map(Cell::to_text))?;
        }

        writer.flush()?;
        self.written.push(path);
        Ok(())
    }
}

/// Writes each table into a SQLite database
#[derive(Debug)]
pub struct SqliteWriter {
    conn: rusqlite::Connection,
}

impl SqliteWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            conn: rusqlite::Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(Self {
            conn: rusqlite::Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl TabularWriter for SqliteWriter {
    fn write_rows(
        &mut self,
        _sheet_name: &str,
        table_name: &str,
        columns: &[Column],
        rows: &[Vec<Cell>],
    ) -> Result<(), Error> {
        let table = quote_identifier(table_name);
        let definitions = columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(c.name), c.data_type.sqlite_affinity()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute(
            &format!("CREATE TABLE IF NOT EXISTS {} ({})", table, definitions),
            [],
        )?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
            for row in rows {
                stmt.execute(rusqlite::params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Forwards every table to each of its writers in turn
#[derive(Default)]
pub struct MultiWriter {
    writers: Vec<Box<dyn TabularWriter>>,
}

impl MultiWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, writer: impl TabularWriter + 'static) {
        self.writers.push(Box::new(writer));
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl TabularWriter for MultiWriter {
    fn write_rows(
        &mut self,
        sheet_name: &str,
        table_name: &str,
        columns: &[Column],
        rows: &[Vec<Cell>],
    ) -> Result<(), Error> {
        for writer in &mut self.writers {
            writer.write_rows(sheet_name, table_name, columns, rows)?;
        }
        Ok(())
    }
}

impl<W: TabularWriter + ?Sized> TabularWriter for &mut W {
    fn write_rows(
        &mut self,
        sheet_name: &str,
        table_name: &str,
        columns: &[Column],
        rows: &[Vec<Cell>],
    ) -> Result<(), Error> {
        (**self).write_rows(sheet_name, table_name, columns, rows)
    }
}

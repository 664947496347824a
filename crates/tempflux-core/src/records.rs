use std::io::{self, Read, Write};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize, Serializer};

use crate::conversion::TemperatureUnit;
use crate::error::{PipelineError, Result};

pub const FIELD_COUNT: usize = 5;

pub const PASS_THROUGH_COLUMNS: [&str; 4] = ["Year", "Month", "Day", "Time"];

/// One data row as read from the input. Every field is kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemperatureRecord {
    pub year: String,
    pub month: String,
    pub day: String,
    pub time: String,
    pub temperature: String,
}

impl TemperatureRecord {
    pub fn with_temperature(&self, temperature: f64) -> ConvertedRecord {
        ConvertedRecord {
            year: self.year.clone(),
            month: self.month.clone(),
            day: self.day.clone(),
            time: self.time.clone(),
            temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedRecord {
    pub year: String,
    pub month: String,
    pub day: String,
    pub time: String,
    #[serde(serialize_with = "two_decimals")]
    pub temperature: f64,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.2}"))
}

/// Header row written at the top of every output file.
pub fn output_header(unit: TemperatureUnit) -> Vec<String> {
    PASS_THROUGH_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(std::iter::once(unit.column_name()))
        .collect()
}

/// Passes bytes through, remembering the last one and whether the source
/// has run dry.
struct TrackedSource<R> {
    inner: R,
    exhausted: bool,
    last_byte: Option<u8>,
}

impl<R: Read> Read for TrackedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.last_byte = Some(buf[n - 1]);
        } else if !buf.is_empty() {
            self.exhausted = true;
        }
        Ok(n)
    }
}

/// Reads the header and strict 5-field data rows.
///
/// Rows end at `\n`; a trailing `\r` is stripped. Blank lines are malformed
/// rows, so line numbers are tracked to spot the ones the `csv` parser skips.
pub struct RecordReader<R> {
    inner: csv::Reader<TrackedSource<R>>,
    row: StringRecord,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        let source = TrackedSource {
            inner: reader,
            exhausted: false,
            last_byte: None,
        };
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_reader(source);
        Self {
            inner,
            row: StringRecord::new(),
        }
    }

    /// Reads the first row. Returns `None` when the input has no rows at all.
    pub fn read_header(&mut self) -> Result<Option<Vec<String>>> {
        if !self.read_row()? {
            return Ok(None);
        }
        Ok(Some(self.fields().map(str::to_string).collect()))
    }

    /// Reads the next data row along with its 1-based line number.
    pub fn next_record(&mut self) -> Result<Option<(u64, TemperatureRecord)>> {
        let line = self.inner.position().line();
        let has_row = self.read_row()?;
        let consumed = self.inner.position().line() - line;

        if !has_row {
            // Anything consumed after the last row was blank lines.
            if consumed > 0 {
                return Err(blank_line(line));
            }
            return Ok(None);
        }

        let embedded: u64 = self
            .row
            .iter()
            .map(|field| field.matches('\n').count() as u64)
            .sum();
        let source = self.inner.get_ref();
        let unterminated = source.exhausted && source.last_byte != Some(b'\n');
        if consumed > embedded + u64::from(!unterminated) {
            return Err(blank_line(line));
        }

        if self.row.len() != FIELD_COUNT {
            // A `\r\n` blank line arrives as a single `\r` field.
            if self.row.len() == 1 && &self.row[0] == "\r" {
                return Err(blank_line(line));
            }
            return Err(PipelineError::MalformedRow {
                line,
                found: self.row.len(),
                expected: FIELD_COUNT,
            });
        }

        let mut record: TemperatureRecord = self.row.deserialize(None)?;
        if record.temperature.ends_with('\r') {
            record.temperature.pop();
        }
        Ok(Some((line, record)))
    }

    fn read_row(&mut self) -> Result<bool> {
        let line = self.inner.position().line();
        self.inner.read_record(&mut self.row).map_err(|err| {
            let invalid = match err.kind() {
                csv::ErrorKind::Utf8 { pos, err } => {
                    Some((pos.as_ref().map_or(line, |pos| pos.line()), err.field() + 1))
                }
                _ => None,
            };
            match invalid {
                Some((line, field)) => PipelineError::InvalidUtf8 { line, field },
                None => PipelineError::Csv(err),
            }
        })
    }

    fn fields(&self) -> impl Iterator<Item = &str> {
        let last = self.row.len().saturating_sub(1);
        self.row.iter().enumerate().map(move |(idx, field)| {
            if idx == last {
                field.strip_suffix('\r').unwrap_or(field)
            } else {
                field
            }
        })
    }
}

fn blank_line(line: u64) -> PipelineError {
    PipelineError::MalformedRow {
        line,
        found: 0,
        expected: FIELD_COUNT,
    }
}

pub struct RecordWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        let inner = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        Self { inner }
    }

    pub fn write_header(&mut self, header: &[String]) -> Result<()> {
        self.inner.write_record(header)?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &ConvertedRecord) -> Result<()> {
        self.inner.serialize(record)?;
        Ok(())
    }

    /// Flushes buffered rows and hands back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| PipelineError::Io(err.into_error()))
    }
}

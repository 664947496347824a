use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::conversion::Conversion;
use crate::error::{PipelineError, Result};
use crate::records::{output_header, RecordReader, RecordWriter};

pub const DEFAULT_INPUT_FILE: &str = "batchfile_2_kelvin.csv";
pub const DEFAULT_OUTPUT_FILE: &str = "batchfile_3_farenheit.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Write to a temporary sibling file and rename it into place on success.
    pub staged_output: bool,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            staged_output: false,
        }
    }

    pub fn staged(mut self, staged_output: bool) -> Self {
        self.staged_output = staged_output;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_written: usize,
}

/// Converts every data row of `config.input` from Kelvin to Fahrenheit.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    run_with(config, Conversion::KELVIN_TO_FAHRENHEIT)
}

pub(crate) fn run_with(config: &PipelineConfig, conversion: Conversion) -> Result<RunSummary> {
    info!(
        "Starting conversion from {} to {}.",
        config.input.display(),
        config.output.display()
    );

    let input = File::open(&config.input).map_err(|source| PipelineError::InputOpen {
        path: config.input.clone(),
        source,
    })?;
    let mut reader = RecordReader::new(input);

    let header = reader
        .read_header()?
        .ok_or_else(|| PipelineError::MissingHeader {
            path: config.input.clone(),
        })?;
    info!("Header read and skipped: {header:?}");

    let sink = OutputSink::open(&config.output, config.staged_output)?;
    let mut writer = RecordWriter::new(sink);
    writer.write_header(&output_header(conversion.target))?;

    let mut rows_written = 0;
    while let Some((line, record)) = reader.next_record()? {
        let converted = conversion
            .convert(&record.temperature)
            .map_err(|source| PipelineError::Conversion { line, source })?;
        writer.write_record(&record.with_temperature(converted))?;
        rows_written += 1;
        debug!(
            "Processed row from {}{} to {converted:.2}{}",
            record.temperature, conversion.source, conversion.target
        );
    }

    writer.finish()?.commit(&config.output)?;

    info!("Conversion process completed successfully. Wrote {rows_written} rows.");
    Ok(RunSummary {
        input: config.input.clone(),
        output: config.output.clone(),
        rows_written,
    })
}

/// Where converted rows land. A staged sink is discarded unless committed.
enum OutputSink {
    Direct(File),
    Staged(NamedTempFile),
}

impl OutputSink {
    fn open(path: &Path, staged: bool) -> Result<Self> {
        let opened = if staged {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            tempfile::Builder::new()
                .prefix(".tempflux-")
                .suffix(".csv.tmp")
                .tempfile_in(dir)
                .map(OutputSink::Staged)
        } else {
            File::create(path).map(OutputSink::Direct)
        };

        opened.map_err(|source| PipelineError::OutputOpen {
            path: path.to_path_buf(),
            source,
        })
    }

    fn commit(self, path: &Path) -> Result<()> {
        match self {
            // The output may be a pipe or a device, which cannot be synced.
            OutputSink::Direct(mut file) => file.flush()?,
            OutputSink::Staged(file) => {
                file.as_file().sync_all()?;
                file.persist(path).map_err(|err| PipelineError::Persist {
                    path: path.to_path_buf(),
                    source: err.error,
                })?;
            }
        }
        Ok(())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Direct(file) => file.write(buf),
            OutputSink::Staged(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Direct(file) => file.flush(),
            OutputSink::Staged(file) => file.flush(),
        }
    }
}

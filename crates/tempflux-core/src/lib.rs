//! Batch conversion of temperature records: read a delimited file, convert the
//! temperature column, write a new delimited file.

pub mod conversion;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod records;

pub use conversion::{convert, Conversion, ConversionError, TemperatureUnit};
pub use error::{FailureKind, PipelineError, Result};
pub use pipeline::{run, PipelineConfig, RunSummary, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE};
pub use records::{ConvertedRecord, TemperatureRecord};

use std::fmt;
use std::num::ParseFloatError;

use thiserror::Error;
use tracing::debug;

const KELVIN_OFFSET: f64 = 273.15;
const FAHRENHEIT_OFFSET: f64 = 32.0;

#[derive(Debug, Error)]
#[error("temperature {value:?} is not a number: {source}")]
pub struct ConversionError {
    pub value: String,
    #[source]
    pub source: ParseFloatError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            TemperatureUnit::Kelvin => "K",
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    /// Column name used for this unit in delimited files, e.g. `TempF`.
    pub fn column_name(&self) -> String {
        format!("Temp{}", self.abbreviation())
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => value - KELVIN_OFFSET,
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - FAHRENHEIT_OFFSET) * 5.0 / 9.0,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => celsius + KELVIN_OFFSET,
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + FAHRENHEIT_OFFSET,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// A fixed unit pair. Results are rounded to two decimal places, half away
/// from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub source: TemperatureUnit,
    pub target: TemperatureUnit,
}

impl Conversion {
    pub const KELVIN_TO_FAHRENHEIT: Conversion = Conversion {
        source: TemperatureUnit::Kelvin,
        target: TemperatureUnit::Fahrenheit,
    };

    pub fn apply(&self, value: f64) -> f64 {
        let celsius = self.source.to_celsius(value);
        round_to_hundredths(self.target.from_celsius(celsius))
    }

    /// Parses `value` as a number in the source unit and converts it.
    pub fn convert(&self, value: &str) -> Result<f64, ConversionError> {
        debug!("Calling convert() with {value}.");
        let parsed: f64 = value.trim().parse().map_err(|source| ConversionError {
            value: value.to_string(),
            source,
        })?;
        let converted = self.apply(parsed);
        debug!(
            "Converted {value}{} to {converted}{}.",
            self.source, self.target
        );
        Ok(converted)
    }
}

/// Kelvin to Fahrenheit, the conversion the pipeline runs.
pub fn convert(value: &str) -> Result<f64, ConversionError> {
    Conversion::KELVIN_TO_FAHRENHEIT.convert(value)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

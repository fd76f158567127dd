//! Entry points exposed to a host language.
//!
//! A host holds prints as lists of integers. [`to_values`] and [`from_values`]
//! convert between those lists and byte buffers; [`load_print`] and
//! [`verify_user`] are the two operations a host calls.

use std::{fs, io, path::Path, vec::Vec};

use log::debug;
use thiserror::Error;

use crate::sans::{fmd::FmdError, format::FmdDialect};

use super::engine::{EngineError, FmdRef, Matcher, PROBABILITY_ONE};

/// Errors occurring in a bridge call.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Invalid print: {0}")]
    Fmd(#[from] FmdError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A host value does not fit in a byte.
    #[error("Value {value} at index {index} is not a byte.")]
    NotAByte { index: usize, value: u32 },
}

/// Verification parameters.
#[derive(Debug, Clone, Copy)]
pub struct VerifyConfig {
    /// Dialect of both prints.
    pub dialect: FmdDialect,
    /// Scores below this value are matches.
    pub threshold: u32,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            dialect: FmdDialect::Ansi378,
            threshold: PROBABILITY_ONE / 100_000,
        }
    }
}

/// Load a print from a file.
pub fn load_print(path: impl AsRef<Path>) -> Result<Vec<u8>, Error> {
    let print = fs::read(path.as_ref())?;
    debug!("Loaded {} bytes from {}", print.len(), path.as_ref().display());

    Ok(print)
}

/// Compare the first view of two prints.
///
/// Returns whether the engine's dissimilarity score falls below the
/// configured threshold.
pub fn verify_user(
    matcher: &mut impl Matcher,
    db: &[u8],
    check: &[u8],
    config: &VerifyConfig,
) -> Result<bool, Error> {
    let db = FmdRef::new(config.dialect, db).view(0)?;
    let check = FmdRef::new(config.dialect, check).view(0)?;

    let score = matcher.compare(&db, &check)?;
    debug!("Dissimilarity {score} against threshold {}", config.threshold);

    Ok(score < config.threshold)
}

/// Convert a byte buffer to a host value list.
pub fn to_values(bytes: &[u8]) -> Vec<u32> {
    bytes.iter().map(|b| *b as u32).collect()
}

/// Convert a host value list to a byte buffer.
pub fn from_values(values: &[u32]) -> Result<Vec<u8>, Error> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| u8::try_from(value).map_err(|_| Error::NotAByte { index, value }))
        .collect()
}

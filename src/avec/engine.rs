//! Interface of the external minutiae engine.
//!
//! The engine is opaque. This module fixes what the codec hands it and how
//! its result codes are surfaced; implementations live outside this crate.
//!
//! The codec's obligation is to hand over well-formed views: a [`ViewRef`]
//! can only be built from a record whose header decodes and whose view lies
//! wholly inside the buffer. The engine treats the view bytes as one
//! indivisible comparison unit.

use std::vec::Vec;

use thiserror::Error;

use crate::sans::{
    fmd::{FmdError, FmdRecord, fmd_view_slice, read_fmd_header},
    format::{FidDialect, FmdDialect},
};

use super::{builder::RawImage, enrollment::EnrolledView};

/// Normalised score for a probability of one.
///
/// Dissimilarity scores run from zero (identical) to this value (no match).
pub const PROBABILITY_ONE: u32 = 0x7FFF_FFFF;

const FACILITY: i32 = 0x05BA;

/// Failure codes an engine may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    NotImplemented = 10,
    Failure = 11,
    NoData = 12,
    MoreData = 13,
    InvalidParameter = 20,
    InvalidFid = 101,
    TooSmallArea = 102,
    InvalidFmd = 201,
    EnrollmentInProgress = 301,
    EnrollmentNotStarted = 302,
    EnrollmentNotReady = 303,
}

impl ResultCode {
    /// The raw code, tagged with the engine's facility.
    pub const fn raw(self) -> i32 {
        self as i32 | (FACILITY << 16)
    }

    /// Decode a raw failure code.
    pub fn from_raw(code: i32) -> Option<Self> {
        if code >> 16 != FACILITY {
            return None;
        }

        Some(match code & 0xFFFF {
            10 => Self::NotImplemented,
            11 => Self::Failure,
            12 => Self::NoData,
            13 => Self::MoreData,
            20 => Self::InvalidParameter,
            101 => Self::InvalidFid,
            102 => Self::TooSmallArea,
            201 => Self::InvalidFmd,
            301 => Self::EnrollmentInProgress,
            302 => Self::EnrollmentNotStarted,
            303 => Self::EnrollmentNotReady,
            _ => return None,
        })
    }
}

/// A failure reported by the engine, passed through unchanged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine reported {0:?}.")]
    Reported(ResultCode),
    #[error("Engine returned an unrecognised code ({0:#010x}).")]
    Unknown(i32),
}

/// Turn a raw engine return code into a result.
pub fn check(code: i32) -> Result<(), EngineError> {
    match code {
        0 => Ok(()),
        _ => Err(ResultCode::from_raw(code)
            .map(EngineError::Reported)
            .unwrap_or(EngineError::Unknown(code))),
    }
}

/// A complete minutiae record of a known dialect.
#[derive(Debug, Clone, Copy)]
pub struct FmdRef<'a> {
    pub dialect: FmdDialect,
    pub bytes: &'a [u8],
}

impl<'a> FmdRef<'a> {
    pub fn new(dialect: FmdDialect, bytes: &'a [u8]) -> Self {
        Self { dialect, bytes }
    }

    /// Select one view of this record for the engine.
    pub fn view(&self, view_idx: usize) -> Result<ViewRef<'a>, FmdError> {
        let record = read_fmd_header(self.dialect, self.bytes)?;
        let bytes = fmd_view_slice(self.dialect, self.bytes, view_idx)
            .ok_or(FmdError::NoSuchView(view_idx))?;

        Ok(ViewRef {
            dialect: self.dialect,
            record,
            view_idx,
            bytes,
        })
    }
}

/// A single, validated view of a minutiae record.
#[derive(Debug, Clone, Copy)]
pub struct ViewRef<'a> {
    pub dialect: FmdDialect,
    /// Header of the record the view was taken from.
    pub record: FmdRecord,
    pub view_idx: usize,
    /// The exact bytes of the view, neither truncated nor padded.
    pub bytes: &'a [u8],
}

/// A view selected by identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Index of the record in the gallery.
    pub fmd_idx: usize,
    /// Index of the view within that record.
    pub view_idx: usize,
}

/// Fingerprint comparison.
pub trait Matcher {
    /// Dissimilarity score between two views.
    fn compare(&mut self, a: &ViewRef<'_>, b: &ViewRef<'_>) -> Result<u32, EngineError>;

    /// Compare a view against every view of a gallery.
    ///
    /// Returns at most `candidate_cnt` candidates scoring below `threshold`,
    /// best first.
    fn identify(
        &mut self,
        probe: &ViewRef<'_>,
        gallery: &[FmdRef<'_>],
        threshold: u32,
        candidate_cnt: usize,
    ) -> Result<Vec<Candidate>, EngineError>;
}

/// Feature extraction.
pub trait Extractor {
    /// Extract a minutiae record from a raw image.
    fn from_raw(
        &mut self,
        image: &RawImage<'_>,
        dialect: FmdDialect,
    ) -> Result<Vec<u8>, EngineError>;

    /// Extract a minutiae record from an image record.
    fn from_fid(
        &mut self,
        fid_dialect: FidDialect,
        fid: &[u8],
        dialect: FmdDialect,
    ) -> Result<Vec<u8>, EngineError>;
}

/// Conversion of minutiae records between dialects.
pub trait Converter {
    /// Re-encode a minutiae record of `from` as a record of `to`.
    fn convert(
        &mut self,
        from: FmdDialect,
        fmd: &[u8],
        to: FmdDialect,
    ) -> Result<Vec<u8>, EngineError>;
}

/// Fusion of enrolled views into a single template.
pub trait Fuser {
    /// Produce a minutiae record of `dialect` from the supplied views.
    fn fuse(
        &mut self,
        dialect: FmdDialect,
        views: &[EnrolledView],
    ) -> Result<Vec<u8>, EngineError>;
}

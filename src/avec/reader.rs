//! Reader-based record loading.
//!
//! Each function reads exactly one record: enough bytes to decode the header,
//! then the remainder announced by its length field. Trailing data is left in
//! the reader.

use std::{
    io::{self, Read},
    vec::Vec,
};

use log::debug;
use thiserror::Error;

use crate::sans::{
    fid::{FidError, read_fid_header},
    fmd::{FmdError, read_fmd_header},
    format::{FidDialect, FmdDialect, FmdLayout},
};

/// Errors occurring while loading a record from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Invalid image record header.
    #[error("Invalid image record header: {0}")]
    Fid(#[from] FidError),
    /// Invalid minutiae record header.
    #[error("Invalid minutiae record header: {0}")]
    Fmd(#[from] FmdError),
}

/// Load one image record from a reader.
pub fn read_fid(r: &mut impl Read, dialect: FidDialect) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();

    take(r, &mut buf, dialect.layout().header_length)?;
    let record = read_fid_header(dialect, &buf)?;

    let remaining = record.record_length as usize - buf.len();
    take(r, &mut buf, remaining)?;

    debug!("Loaded a {}-byte image record", buf.len());

    Ok(buf)
}

/// Load one minutiae record from a reader.
pub fn read_fmd(r: &mut impl Read, dialect: FmdDialect) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();

    let layout = FmdLayout::for_record(dialect, 0);
    take(r, &mut buf, layout.header_length())?;

    // A zero short length announces the extended header.
    if dialect == FmdDialect::Ansi378 && buf[8..10] == [0, 0] {
        take(r, &mut buf, 4)?;
    }

    let record = read_fmd_header(dialect, &buf)?;

    let remaining = record.record_length as usize - buf.len();
    take(r, &mut buf, remaining)?;

    debug!(
        "Loaded a {}-byte minutiae record holding {} views",
        buf.len(),
        record.view_cnt
    );

    Ok(buf)
}

/// Append an exact number of bytes from a reader to a buffer.
///
/// The buffer grows only as data arrives, so a length field larger than the
/// input ends in `UnexpectedEof` rather than a matching allocation.
fn take(r: &mut impl Read, buf: &mut Vec<u8>, n: usize) -> Result<(), Error> {
    let read = r.by_ref().take(n as u64).read_to_end(buf)?;

    if read < n {
        Err(io::Error::from(io::ErrorKind::UnexpectedEof))?;
    }

    Ok(())
}

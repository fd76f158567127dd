//! Fingerprint image records (FID).
//!
//! ```text
//! [8]  magic and version ("FIR\0" "010\0")
//! [6]  record length (upper 2 bytes reserved as zero)
//! [4]  CBEFF product identifier (ANSI only)
//! [18] device, acquisition level, finger count, units, resolutions,
//!      pixel depth, compression, reserved
//! ```
//!
//! Each view follows with a 14-byte header and its pixel payload. The first
//! four bytes of a view give its total length, which is how the next view is
//! found.

use log::{trace, warn};
use thiserror::Error;
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::big_endian::{U16, U32},
};

use super::{
    endian::{get_be32, read_be32, write_be32},
    finger::{FingerPosition, ImpressionType},
    format::{FID_VIEW_HEADER_LENGTH, FidDialect},
};

/// Magic and version tag opening every image record.
pub const FID_MAGIC: [u8; 8] = [b'F', b'I', b'R', 0, b'0', b'1', b'0', 0];

/// An error reading or writing an image record.
#[derive(Debug, Error)]
pub enum FidError {
    /// The buffer ends before the structure being accessed.
    #[error("Unexpectedly reached the end of the slice.")]
    EndOfSlice,
    /// Incorrect record type marker.
    #[error("Incorrect image record marker.")]
    NotFidData,
    /// The record length cannot even hold the header.
    #[error("Record length ({length}) is shorter than the header ({minimum}).")]
    RecordTooShort { length: u32, minimum: usize },
    /// A record must describe at least one finger.
    #[error("Record holds no fingers.")]
    NoFingers,
    /// A view's stored length cannot even hold its header.
    #[error("View length ({0}) is shorter than the view header.")]
    ViewLengthTooShort(u32),
    /// Supplied pixels do not cover the view's dimensions.
    #[error("Expected {expected} pixels for the view, found {found}.")]
    PixelCountMismatch { expected: usize, found: usize },
}

/// Image record header fields.
///
/// Resolutions are square. Writing stores each value in both the horizontal
/// and vertical fields; reading takes the horizontal one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FidRecord {
    /// Total length of the record, including headers and all views.
    pub record_length: u32,
    /// CBEFF product identifier. Always zero for ISO records.
    pub cbeff_id: u32,
    pub capture_device_id: u16,
    /// From Table 1 in ANSI INCITS 381-2004.
    pub acquisition_level: u16,
    /// Number of fingers in the record, at least one.
    pub finger_cnt: u8,
    /// Pixels per inch (1) or per centimetre (2).
    pub scale_units: u8,
    pub scan_res: u16,
    pub image_res: u16,
    /// Pixel depth, 1 to 16 bits.
    pub bpp: u8,
    /// From Table 3 in ANSI INCITS 381-2004.
    pub compression: u8,
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
struct Preamble {
    magic: [u8; 8],
    length_high: U16,
    record_length: U32,
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
struct RecordTail {
    capture_device_id: U16,
    acquisition_level: U16,
    finger_cnt: u8,
    scale_units: u8,
    scan_res_h: U16,
    scan_res_v: U16,
    image_res_h: U16,
    image_res_v: U16,
    bpp: u8,
    compression: u8,
    reserved: U16,
}

/// Offset of the first field displaced by the ANSI vendor identifier.
const TAIL_OFFSET: usize = 14;

/// Read the record header of an image record.
///
/// A record must describe at least one finger, as on write.
pub fn read_fid_header(dialect: FidDialect, r: &[u8]) -> Result<FidRecord, FidError> {
    let layout = dialect.layout();
    let header = r.get(..layout.header_length).ok_or(FidError::EndOfSlice)?;

    let (preamble, _) = Preamble::read_from_prefix(header).map_err(|_| FidError::EndOfSlice)?;

    if preamble.magic[..4] != FID_MAGIC[..4] {
        Err(FidError::NotFidData)?;
    }

    let record_length = preamble.record_length.get();
    if (record_length as usize) < layout.header_length {
        Err(FidError::RecordTooShort {
            length: record_length,
            minimum: layout.header_length,
        })?;
    }

    let cbeff_id = if layout.has_vendor_id {
        read_be32(header, TAIL_OFFSET)
    } else {
        0
    };

    let (tail, _) = RecordTail::read_from_prefix(&header[TAIL_OFFSET + layout.shift..])
        .map_err(|_| FidError::EndOfSlice)?;

    if tail.finger_cnt == 0 {
        Err(FidError::NoFingers)?;
    }

    Ok(FidRecord {
        record_length,
        cbeff_id,
        capture_device_id: tail.capture_device_id.get(),
        acquisition_level: tail.acquisition_level.get(),
        finger_cnt: tail.finger_cnt,
        scale_units: tail.scale_units,
        scan_res: tail.scan_res_h.get(),
        image_res: tail.image_res_h.get(),
        bpp: tail.bpp,
        compression: tail.compression,
    })
}

/// Write the record header of an image record.
///
/// Nothing is written unless the whole header fits in `w`.
pub fn write_fid_header(
    record: &FidRecord,
    dialect: FidDialect,
    w: &mut [u8],
) -> Result<(), FidError> {
    let layout = dialect.layout();
    let header = w
        .get_mut(..layout.header_length)
        .ok_or(FidError::EndOfSlice)?;

    if (record.record_length as usize) < layout.header_length {
        Err(FidError::RecordTooShort {
            length: record.record_length,
            minimum: layout.header_length,
        })?;
    }
    if record.finger_cnt == 0 {
        Err(FidError::NoFingers)?;
    }

    let preamble = Preamble {
        magic: FID_MAGIC,
        length_high: U16::new(0),
        record_length: U32::new(record.record_length),
    };
    preamble
        .write_to_prefix(header)
        .map_err(|_| FidError::EndOfSlice)?;

    if layout.has_vendor_id {
        write_be32(header, TAIL_OFFSET, record.cbeff_id);
    }

    let tail = RecordTail {
        capture_device_id: U16::new(record.capture_device_id),
        acquisition_level: U16::new(record.acquisition_level),
        finger_cnt: record.finger_cnt,
        scale_units: record.scale_units,
        scan_res_h: U16::new(record.scan_res),
        scan_res_v: U16::new(record.scan_res),
        image_res_h: U16::new(record.image_res),
        image_res_v: U16::new(record.image_res),
        bpp: record.bpp,
        compression: record.compression,
        reserved: U16::new(0),
    };
    tail.write_to_prefix(&mut header[TAIL_OFFSET + layout.shift..])
        .map_err(|_| FidError::EndOfSlice)?;

    Ok(())
}

/// Find the offset of the `view_idx`-th view of an image record.
///
/// Walks the chain of length-prefixed views from the end of the header.
/// Returns `None` if the walk reaches the end of the record (or of the
/// buffer) first.
pub fn locate_fid_view(dialect: FidDialect, r: &[u8], view_idx: usize) -> Option<usize> {
    let record_length = get_be32(r, 10)? as usize;
    let mut pos = dialect.layout().header_length;

    let mut i = 0;
    while i < view_idx && pos < record_length {
        let length = get_be32(r, pos)?;
        trace!("Image view {i} at {pos} spans {length} bytes");

        pos = pos.checked_add(length as usize)?;
        i += 1;
    }

    if pos >= record_length || pos >= r.len() {
        return None;
    }

    Some(pos)
}

/// The stored bytes of the `view_idx`-th view of an image record.
pub fn fid_view_slice(dialect: FidDialect, r: &[u8], view_idx: usize) -> Option<&[u8]> {
    let offset = locate_fid_view(dialect, r, view_idx)?;
    let length = get_be32(r, offset)? as usize;

    r.get(offset..offset.checked_add(length)?)
}

/// Image view header fields, excluding the stored length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FidViewHeader {
    /// Raw finger position. See [`FidViewHeader::position`].
    pub finger_position: u8,
    /// Number of views of this finger, at least one.
    pub view_cnt: u8,
    pub view_number: u8,
    /// 1 to 100, or 254 for "unobtainable" in ANSI records.
    pub quality: u8,
    /// Raw impression type. See [`FidViewHeader::impression`].
    pub impression_type: u8,
    pub width: u16,
    pub height: u16,
}

impl FidViewHeader {
    pub fn position(&self) -> Option<FingerPosition> {
        self.finger_position.try_into().ok()
    }

    pub fn impression(&self) -> Option<ImpressionType> {
        self.impression_type.try_into().ok()
    }

    /// Number of pixels in an uncompressed view of this size.
    pub fn pixel_cnt(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A single view of an image record, borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FidView<'a> {
    pub header: FidViewHeader,
    pub pixels: &'a [u8],
}

impl FidView<'_> {
    /// Total length of the view, including its header.
    pub fn data_length(&self) -> usize {
        FID_VIEW_HEADER_LENGTH + self.pixels.len()
    }
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
struct ViewHeader {
    data_length: U32,
    finger_position: u8,
    view_cnt: u8,
    view_number: u8,
    quality: u8,
    impression_type: u8,
    width: U16,
    height: U16,
    reserved: u8,
}

/// Read an image view starting at the beginning of `r`.
///
/// The payload is the `data_length - 14` bytes following the view header.
pub fn read_fid_view(r: &[u8]) -> Result<FidView<'_>, FidError> {
    let (raw, _) = ViewHeader::read_from_prefix(r).map_err(|_| FidError::EndOfSlice)?;

    let data_length = raw.data_length.get();
    if (data_length as usize) < FID_VIEW_HEADER_LENGTH {
        Err(FidError::ViewLengthTooShort(data_length))?;
    }

    let header = FidViewHeader {
        finger_position: raw.finger_position,
        view_cnt: raw.view_cnt,
        view_number: raw.view_number,
        quality: raw.quality,
        impression_type: raw.impression_type,
        width: raw.width.get(),
        height: raw.height.get(),
    };

    let pixels = r
        .get(FID_VIEW_HEADER_LENGTH..data_length as usize)
        .ok_or(FidError::EndOfSlice)?;

    if pixels.len() != header.pixel_cnt() {
        warn!(
            "Image view of {}x{} holds {} payload bytes",
            header.width,
            header.height,
            pixels.len()
        );
    }

    Ok(FidView { header, pixels })
}

/// Write an image view header at the beginning of `w`.
///
/// The stored length is derived from the view's dimensions. Returns the
/// payload region following the header, sized for the view's pixels.
pub fn write_fid_view_header<'a>(
    header: &FidViewHeader,
    w: &'a mut [u8],
) -> Result<&'a mut [u8], FidError> {
    let data_length = FID_VIEW_HEADER_LENGTH + header.pixel_cnt();
    let view = w.get_mut(..data_length).ok_or(FidError::EndOfSlice)?;

    let raw = ViewHeader {
        data_length: U32::new(data_length as u32),
        finger_position: header.finger_position,
        view_cnt: header.view_cnt,
        view_number: header.view_number,
        quality: header.quality,
        impression_type: header.impression_type,
        width: U16::new(header.width),
        height: U16::new(header.height),
        reserved: 0,
    };
    raw.write_to_prefix(view).map_err(|_| FidError::EndOfSlice)?;

    Ok(&mut view[FID_VIEW_HEADER_LENGTH..])
}

/// Write an image view, header and pixels, at the beginning of `w`.
///
/// Returns the number of bytes written.
pub fn write_fid_view(view: &FidView<'_>, w: &mut [u8]) -> Result<usize, FidError> {
    let expected = view.header.pixel_cnt();
    if view.pixels.len() != expected {
        Err(FidError::PixelCountMismatch {
            expected,
            found: view.pixels.len(),
        })?;
    }

    write_fid_view_header(&view.header, w)?.copy_from_slice(view.pixels);

    Ok(view.data_length())
}

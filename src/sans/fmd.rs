//! Fingerprint minutiae records (FMD).
//!
//! ```text
//! [8]  magic and version ("FMR\0" " 20\0")
//!      record length and vendor identifier, per [`FmdLayout`]:
//!        ANSI short:     [2] length            [4] CBEFF id
//!        ANSI extended:  [2] zero  [4] length  [4] CBEFF id
//!        ISO:            [4] length
//! [12] equipment, width, height, resolutions, view count, reserved
//! ```
//!
//! Each view is a 4-byte header, a table of 6-byte minutiae, a 2-byte
//! extended block length and the extended block itself. Minutiae are opaque
//! to this codec.

use log::{debug, trace};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::big_endian::U16,
};

use super::{
    endian::{get_be16, get_be32, write_be16, write_be32},
    finger::{FingerPosition, ImpressionType},
    format::{FMD_MINUTIA_LENGTH, FMD_VIEW_HEADER_LENGTH, FmdDialect, FmdLayout, LengthEncoding},
};

/// Magic and version tag opening every minutiae record.
pub const FMD_MAGIC: [u8; 8] = [b'F', b'M', b'R', 0, b' ', b'2', b'0', 0];

/// A single minutia entry, left undecoded.
pub type Minutia = [u8; FMD_MINUTIA_LENGTH];

/// An error reading or writing a minutiae record.
#[derive(Debug, Error)]
pub enum FmdError {
    /// The buffer ends before the structure being accessed.
    #[error("Unexpectedly reached the end of the slice.")]
    EndOfSlice,
    /// Incorrect record type marker.
    #[error("Incorrect minutiae record marker.")]
    NotFmdData,
    /// The record length cannot even hold the header.
    #[error("Record length ({length}) is shorter than the header ({minimum}).")]
    RecordTooShort { length: u32, minimum: usize },
    /// A view holds at most 255 minutiae.
    #[error("Too many minutiae for a single view ({0}).")]
    TooManyMinutiae(usize),
    /// An extended block holds at most 65535 bytes.
    #[error("Extended data block too long ({0}).")]
    ExtendedBlockTooLong(usize),
    /// The record holds no view at this index.
    #[error("No view at index {0}.")]
    NoSuchView(usize),
}

/// Minutiae record header fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FmdRecord {
    /// Total length of the record, including headers and all views.
    pub record_length: u32,
    /// CBEFF product identifier. Always zero for ISO records.
    pub cbeff_id: u32,
    /// Capture equipment compliance, 4 bits.
    pub equipment_compliance: u8,
    /// Capture equipment identifier, 12 bits.
    pub equipment_id: u16,
    pub width: u16,
    pub height: u16,
    /// Square resolution, stored for both axes.
    pub resolution: u16,
    pub view_cnt: u8,
}

impl FmdRecord {
    /// Header layout this record is written with.
    pub fn layout(&self, dialect: FmdDialect) -> FmdLayout {
        FmdLayout::for_record(dialect, self.record_length)
    }
}

bitfield! {
    struct Equipment(u16) {
        [0..12] id: u16,
        [12..16] compliance: u8,
    }
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
struct RecordTail {
    equipment: U16,
    width: U16,
    height: U16,
    resolution_x: U16,
    resolution_y: U16,
    view_cnt: u8,
    reserved: u8,
}

/// Offset of the equipment field in ISO records.
const TAIL_OFFSET: usize = 12;

/// Read the record header of a minutiae record.
///
/// ANSI records are first read with the short length field; a zero there
/// selects the extended layout.
pub fn read_fmd_header(dialect: FmdDialect, r: &[u8]) -> Result<FmdRecord, FmdError> {
    resolve_fmd_header(dialect, r).map(|(record, _)| record)
}

/// Read the record header of a minutiae record, along with the layout it
/// was found in.
///
/// The layout follows the stored length field, not the decoded length. An
/// ANSI record with the zero escape is extended even if its length would
/// fit the short field.
pub fn resolve_fmd_header(
    dialect: FmdDialect,
    r: &[u8],
) -> Result<(FmdRecord, FmdLayout), FmdError> {
    match r.get(..4) {
        Some(magic) if magic == &FMD_MAGIC[..4] => {}
        Some(_) => Err(FmdError::NotFmdData)?,
        None => Err(FmdError::EndOfSlice)?,
    }

    let (layout, record_length, cbeff_id) = match dialect {
        FmdDialect::Ansi378 => match get_be16(r, 8).ok_or(FmdError::EndOfSlice)? {
            0 => (
                FmdLayout::Ansi(LengthEncoding::Extended),
                get_be32(r, 10).ok_or(FmdError::EndOfSlice)?,
                get_be32(r, 14).ok_or(FmdError::EndOfSlice)?,
            ),
            length => (
                FmdLayout::Ansi(LengthEncoding::Short),
                length as u32,
                get_be32(r, 10).ok_or(FmdError::EndOfSlice)?,
            ),
        },
        FmdDialect::Iso19794_2 => (
            FmdLayout::Iso,
            get_be32(r, 8).ok_or(FmdError::EndOfSlice)?,
            0,
        ),
    };

    debug!("Minutiae record of {record_length} bytes uses {layout:?}");

    let header_length = layout.header_length();
    let header = r.get(..header_length).ok_or(FmdError::EndOfSlice)?;

    if (record_length as usize) < header_length {
        Err(FmdError::RecordTooShort {
            length: record_length,
            minimum: header_length,
        })?;
    }

    let (tail, _) = RecordTail::read_from_prefix(&header[TAIL_OFFSET + layout.shift()..])
        .map_err(|_| FmdError::EndOfSlice)?;

    let equipment = Equipment(tail.equipment.get());

    let record = FmdRecord {
        record_length,
        cbeff_id,
        equipment_compliance: equipment.compliance(),
        equipment_id: equipment.id(),
        width: tail.width.get(),
        height: tail.height.get(),
        resolution: tail.resolution_x.get(),
        view_cnt: tail.view_cnt,
    };

    Ok((record, layout))
}

/// Write the record header of a minutiae record.
///
/// The layout is chosen by the record length: ANSI records longer than
/// `0xFFFF` bytes get the extended length field. Only the low 4 bits of the
/// compliance and the low 12 bits of the equipment identifier are stored.
/// Nothing is written unless the whole header fits in `w`.
///
/// Returns the layout written.
pub fn write_fmd_header(
    record: &FmdRecord,
    dialect: FmdDialect,
    w: &mut [u8],
) -> Result<FmdLayout, FmdError> {
    let layout = record.layout(dialect);
    let header_length = layout.header_length();
    let header = w.get_mut(..header_length).ok_or(FmdError::EndOfSlice)?;

    if (record.record_length as usize) < header_length {
        Err(FmdError::RecordTooShort {
            length: record.record_length,
            minimum: header_length,
        })?;
    }

    header[..8].copy_from_slice(&FMD_MAGIC);

    match layout {
        FmdLayout::Ansi(LengthEncoding::Short) => {
            write_be16(header, 8, record.record_length as u16);
        }
        FmdLayout::Ansi(LengthEncoding::Extended) => {
            write_be16(header, 8, 0);
            write_be32(header, 10, record.record_length);
        }
        FmdLayout::Iso => {
            write_be32(header, 8, record.record_length);
        }
    }

    if let Some(at) = layout.vendor_id_offset() {
        write_be32(header, at, record.cbeff_id);
    }

    let mut equipment = Equipment(0);
    equipment.set_id(record.equipment_id & 0x0FFF);
    equipment.set_compliance(record.equipment_compliance & 0x0F);

    let tail = RecordTail {
        equipment: U16::new(equipment.0),
        width: U16::new(record.width),
        height: U16::new(record.height),
        resolution_x: U16::new(record.resolution),
        resolution_y: U16::new(record.resolution),
        view_cnt: record.view_cnt,
        reserved: 0,
    };
    tail.write_to_prefix(&mut header[TAIL_OFFSET + layout.shift()..])
        .map_err(|_| FmdError::EndOfSlice)?;

    Ok(layout)
}

/// Find the offset of the `view_idx`-th view of a minutiae record.
///
/// Returns `None` for an index outside the record's view count, an invalid
/// header, or a walk that leaves the record or the buffer.
pub fn locate_fmd_view(dialect: FmdDialect, r: &[u8], view_idx: usize) -> Option<usize> {
    let (record, layout) = resolve_fmd_header(dialect, r).ok()?;

    if view_idx >= record.view_cnt as usize {
        return None;
    }

    let record_length = record.record_length as usize;
    let mut pos = layout.header_length();

    let mut i = 0;
    while i < view_idx && pos < record_length {
        // Skip the view header and minutiae table, landing on the extended
        // block length, then skip that field and the block it measures.
        let minutia_cnt = *r.get(pos + 3)? as usize;
        pos += FMD_VIEW_HEADER_LENGTH + minutia_cnt * FMD_MINUTIA_LENGTH;

        let ext_block_length = get_be16(r, pos)? as usize;
        pos += 2 + ext_block_length;

        trace!("Minutiae view {i} holds {minutia_cnt} minutiae and {ext_block_length} extended bytes");
        i += 1;
    }

    if pos >= record_length || pos >= r.len() {
        return None;
    }

    Some(pos)
}

/// The exact bytes of the `view_idx`-th view of a minutiae record.
///
/// This is the unit handed to a matching engine. `None` if the view does not
/// lie wholly inside the buffer.
pub fn fmd_view_slice(dialect: FmdDialect, r: &[u8], view_idx: usize) -> Option<&[u8]> {
    let offset = locate_fmd_view(dialect, r, view_idx)?;
    let view = read_fmd_view(&r[offset..]).ok()?;

    r.get(offset..offset + view.length())
}

/// Minutiae view header fields, excluding the minutia count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FmdViewHeader {
    /// Raw finger position. See [`FmdViewHeader::position`].
    pub finger_position: u8,
    /// 0 to 15.
    pub view_number: u8,
    /// Raw impression type, 4 bits. See [`FmdViewHeader::impression`].
    pub impression_type: u8,
    /// 1 to 100, or 254 for "unobtainable" in ANSI records.
    pub quality: u8,
}

impl FmdViewHeader {
    pub fn position(&self) -> Option<FingerPosition> {
        self.finger_position.try_into().ok()
    }

    pub fn impression(&self) -> Option<ImpressionType> {
        self.impression_type.try_into().ok()
    }
}

/// A single view of a minutiae record, borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmdView<'a> {
    pub header: FmdViewHeader,
    pub minutiae: &'a [Minutia],
    pub ext_block: &'a [u8],
}

impl FmdView<'_> {
    pub fn minutia_cnt(&self) -> usize {
        self.minutiae.len()
    }

    pub fn ext_block_length(&self) -> usize {
        self.ext_block.len()
    }

    /// Total length of the view in bytes.
    pub fn length(&self) -> usize {
        FMD_VIEW_HEADER_LENGTH + self.minutiae.len() * FMD_MINUTIA_LENGTH + 2 + self.ext_block.len()
    }
}

bitfield! {
    struct ViewNumbering(u8) {
        [0..4] impression_type: u8,
        [4..8] view_number: u8,
    }
}

/// Read a minutiae view starting at the beginning of `r`.
pub fn read_fmd_view(r: &[u8]) -> Result<FmdView<'_>, FmdError> {
    let raw = r.get(..FMD_VIEW_HEADER_LENGTH).ok_or(FmdError::EndOfSlice)?;
    let numbering = ViewNumbering(raw[1]);

    let header = FmdViewHeader {
        finger_position: raw[0],
        view_number: numbering.view_number(),
        impression_type: numbering.impression_type(),
        quality: raw[2],
    };

    let table_end = FMD_VIEW_HEADER_LENGTH + raw[3] as usize * FMD_MINUTIA_LENGTH;
    let table = r
        .get(FMD_VIEW_HEADER_LENGTH..table_end)
        .ok_or(FmdError::EndOfSlice)?;
    let minutiae = <[Minutia]>::ref_from_bytes(table).map_err(|_| FmdError::EndOfSlice)?;

    let ext_block_length = get_be16(r, table_end).ok_or(FmdError::EndOfSlice)? as usize;
    let ext_block = r
        .get(table_end + 2..table_end + 2 + ext_block_length)
        .ok_or(FmdError::EndOfSlice)?;

    Ok(FmdView {
        header,
        minutiae,
        ext_block,
    })
}

/// Write a minutiae view at the beginning of `w`.
///
/// The minutia count and extended block length are derived from the
/// supplied slices. Nothing is written unless the whole view fits in `w`.
///
/// Returns the number of bytes written.
pub fn write_fmd_view(view: &FmdView<'_>, w: &mut [u8]) -> Result<usize, FmdError> {
    let minutia_cnt = u8::try_from(view.minutiae.len())
        .map_err(|_| FmdError::TooManyMinutiae(view.minutiae.len()))?;
    let ext_block_length = u16::try_from(view.ext_block.len())
        .map_err(|_| FmdError::ExtendedBlockTooLong(view.ext_block.len()))?;

    let length = view.length();
    let out = w.get_mut(..length).ok_or(FmdError::EndOfSlice)?;

    let mut numbering = ViewNumbering(0);
    numbering.set_view_number(view.header.view_number & 0x0F);
    numbering.set_impression_type(view.header.impression_type & 0x0F);

    out[0] = view.header.finger_position;
    out[1] = numbering.0;
    out[2] = view.header.quality;
    out[3] = minutia_cnt;

    let table_end = FMD_VIEW_HEADER_LENGTH + view.minutiae.len() * FMD_MINUTIA_LENGTH;
    out[FMD_VIEW_HEADER_LENGTH..table_end].copy_from_slice(view.minutiae.as_bytes());

    write_be16(out, table_end, ext_block_length);
    out[table_end + 2..].copy_from_slice(view.ext_block);

    Ok(length)
}

//! Record dialects and the header layouts they imply.
//!
//! Layout differences are kept in the tables on [`FidDialect`] and
//! [`FmdLayout`]. Field access elsewhere adds the layout's shift to a fixed
//! base offset rather than branching on the dialect.

use thiserror::Error;

/// Length of an ANSI 381-2004 image record header.
pub const FID_ANSI_381_2004_HEADER_LENGTH: usize = 36;
/// Length of an ISO 19794-4-2005 image record header.
pub const FID_ISO_19794_4_2005_HEADER_LENGTH: usize = 32;
/// Length of an image view header, for either dialect.
pub const FID_VIEW_HEADER_LENGTH: usize = 14;

/// Length of a short-form ANSI 378-2004 minutiae record header.
pub const FMD_ANSI_378_2004_HEADER_LENGTH: usize = 26;
/// Length of an ISO 19794-2-2005 minutiae record header.
pub const FMD_ISO_19794_2_2005_HEADER_LENGTH: usize = 24;
/// Length of a minutiae view header, for either dialect.
pub const FMD_VIEW_HEADER_LENGTH: usize = 4;
/// Length of a single minutia entry.
pub const FMD_MINUTIA_LENGTH: usize = 6;

/// Maximum size of a single-view FMD with no extended data block.
pub const MAX_FMD_SIZE: usize = FMD_ANSI_378_2004_HEADER_LENGTH
    + FMD_VIEW_HEADER_LENGTH
    + 255 * FMD_MINUTIA_LENGTH
    + 2;

/// Largest record length representable by the short ANSI length field.
pub const FMD_SHORT_LENGTH_MAX: u32 = 0xFFFF;

/// An unrecognised format code.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The code names no supported record format.
    #[error("Unknown record format code ({0:#010x}).")]
    UnknownFormat(u32),
}

/// Standard governing a fingerprint image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FidDialect {
    /// ANSI INCITS 381-2004.
    Ansi381,
    /// ISO/IEC 19794-4:2005.
    Iso19794_4,
}

/// Header geometry of an image record dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FidLayout {
    /// Header length, and so the offset of the first view.
    pub header_length: usize,
    /// Displacement of every field after byte 14.
    pub shift: usize,
    /// Whether a 4-byte CBEFF product identifier sits at byte 14.
    pub has_vendor_id: bool,
}

impl FidDialect {
    /// Format code used by the capture SDK for this dialect.
    pub const fn code(self) -> u32 {
        match self {
            Self::Ansi381 => 0x001B_0401,
            Self::Iso19794_4 => 0x0101_0007,
        }
    }

    /// Header geometry of this dialect.
    pub const fn layout(self) -> FidLayout {
        match self {
            Self::Ansi381 => FidLayout {
                header_length: FID_ANSI_381_2004_HEADER_LENGTH,
                shift: 4,
                has_vendor_id: true,
            },
            Self::Iso19794_4 => FidLayout {
                header_length: FID_ISO_19794_4_2005_HEADER_LENGTH,
                shift: 0,
                has_vendor_id: false,
            },
        }
    }
}

impl TryFrom<u32> for FidDialect {
    type Error = FormatError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0x001B_0401 => Ok(Self::Ansi381),
            0x0101_0007 => Ok(Self::Iso19794_4),
            _ => Err(FormatError::UnknownFormat(code)),
        }
    }
}

/// Standard governing a fingerprint minutiae record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FmdDialect {
    /// ANSI INCITS 378-2004.
    Ansi378,
    /// ISO/IEC 19794-2:2005.
    Iso19794_2,
}

impl FmdDialect {
    /// Format code used by the capture SDK for this dialect.
    pub const fn code(self) -> u32 {
        match self {
            Self::Ansi378 => 0x001B_0001,
            Self::Iso19794_2 => 0x0101_0001,
        }
    }
}

impl TryFrom<u32> for FmdDialect {
    type Error = FormatError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0x001B_0001 => Ok(Self::Ansi378),
            0x0101_0001 => Ok(Self::Iso19794_2),
            _ => Err(FormatError::UnknownFormat(code)),
        }
    }
}

/// Encoding of the ANSI minutiae record length field.
///
/// Records up to [`FMD_SHORT_LENGTH_MAX`] bytes store a 2-byte length. Larger
/// records store zero there, followed by a 4-byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthEncoding {
    Short,
    Extended,
}

impl LengthEncoding {
    /// Choose the encoding able to hold `record_length`.
    pub const fn for_record_length(record_length: u32) -> Self {
        if record_length > FMD_SHORT_LENGTH_MAX {
            Self::Extended
        } else {
            Self::Short
        }
    }
}

/// Resolved header shape of a minutiae record.
///
/// The dialect and the length encoding are independent choices; only ANSI
/// records carry a length encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmdLayout {
    Ansi(LengthEncoding),
    Iso,
}

impl FmdLayout {
    /// Resolve the layout a record of `record_length` bytes is written with.
    pub const fn for_record(dialect: FmdDialect, record_length: u32) -> Self {
        match dialect {
            FmdDialect::Ansi378 => Self::Ansi(LengthEncoding::for_record_length(record_length)),
            FmdDialect::Iso19794_2 => Self::Iso,
        }
    }

    /// Dialect of this layout.
    pub const fn dialect(self) -> FmdDialect {
        match self {
            Self::Ansi(_) => FmdDialect::Ansi378,
            Self::Iso => FmdDialect::Iso19794_2,
        }
    }

    /// Header length, and so the offset of the first view.
    pub const fn header_length(self) -> usize {
        match self {
            Self::Ansi(LengthEncoding::Short) => FMD_ANSI_378_2004_HEADER_LENGTH,
            Self::Ansi(LengthEncoding::Extended) => FMD_ANSI_378_2004_HEADER_LENGTH + 4,
            Self::Iso => FMD_ISO_19794_2_2005_HEADER_LENGTH,
        }
    }

    /// Displacement of the fields following the length and vendor fields,
    /// relative to their ISO positions.
    pub const fn shift(self) -> usize {
        match self {
            Self::Ansi(LengthEncoding::Short) => 2,
            Self::Ansi(LengthEncoding::Extended) => 6,
            Self::Iso => 0,
        }
    }

    /// Offset of the 4-byte CBEFF product identifier, if present.
    pub const fn vendor_id_offset(self) -> Option<usize> {
        match self {
            Self::Ansi(LengthEncoding::Short) => Some(10),
            Self::Ansi(LengthEncoding::Extended) => Some(14),
            Self::Iso => None,
        }
    }
}

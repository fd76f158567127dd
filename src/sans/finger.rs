//! Finger positions and impression types shared by both record families.
//!
//! Records store these as raw bytes. The enumerations here decode them where a
//! caller wants the named value.

/// Finger position, from Table 5 of ANSI INCITS 381-2004.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerPosition {
    Unknown = 0,
    RightThumb = 1,
    RightIndex = 2,
    RightMiddle = 3,
    RightRing = 4,
    RightLittle = 5,
    LeftThumb = 6,
    LeftIndex = 7,
    LeftMiddle = 8,
    LeftRing = 9,
    LeftLittle = 10,
}

impl TryFrom<u8> for FingerPosition {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Unknown,
            1 => Self::RightThumb,
            2 => Self::RightIndex,
            3 => Self::RightMiddle,
            4 => Self::RightRing,
            5 => Self::RightLittle,
            6 => Self::LeftThumb,
            7 => Self::LeftIndex,
            8 => Self::LeftMiddle,
            9 => Self::LeftRing,
            10 => Self::LeftLittle,
            _ => Err(value)?,
        })
    }
}

/// Impression type, from Table 2 of ANSI INCITS 378-2004.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpressionType {
    LivePlain = 0,
    LiveRolled = 1,
    NonlivePlain = 2,
    NonliveRolled = 3,
    Swipe = 8,
}

impl TryFrom<u8> for ImpressionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::LivePlain,
            1 => Self::LiveRolled,
            2 => Self::NonlivePlain,
            3 => Self::NonliveRolled,
            8 => Self::Swipe,
            _ => Err(value)?,
        })
    }
}

/// Quality value meaning "unobtainable" in ANSI records.
pub const QUALITY_UNOBTAINABLE: u8 = 254;

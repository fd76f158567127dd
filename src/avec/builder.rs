//! Assembly of complete multi-view records.

use std::vec::Vec;

use thiserror::Error;

use crate::sans::{
    fid::{FidError, FidRecord, FidView, FidViewHeader, write_fid_header, write_fid_view},
    finger::{ImpressionType, QUALITY_UNOBTAINABLE},
    fmd::{FmdError, FmdRecord, FmdView, write_fmd_header, write_fmd_view},
    format::{FidDialect, FmdDialect, FmdLayout},
};

/// Errors occurring while assembling a record.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fid(#[from] FidError),
    #[error(transparent)]
    Fmd(#[from] FmdError),
    /// A record holds at most 255 views.
    #[error("Too many views for a single record ({0}).")]
    TooManyViews(usize),
    /// The record length does not fit its length field.
    #[error("Record too long ({0} bytes).")]
    RecordTooLong(usize),
}

/// Builder for an image record.
///
/// The record length and finger count are computed from the views added;
/// any values set on the template record are replaced.
#[derive(Debug)]
pub struct FidBuilder<'a> {
    dialect: FidDialect,
    record: FidRecord,
    views: Vec<FidView<'a>>,
}

impl<'a> FidBuilder<'a> {
    pub fn new(dialect: FidDialect, record: FidRecord) -> Self {
        Self {
            dialect,
            record,
            views: Vec::new(),
        }
    }

    /// Append a view.
    pub fn view(mut self, view: FidView<'a>) -> Self {
        self.views.push(view);
        self
    }

    pub fn build(self) -> Result<Vec<u8>, Error> {
        let header_length = self.dialect.layout().header_length;
        let total = header_length + self.views.iter().map(FidView::data_length).sum::<usize>();

        let mut fingers = [false; 256];
        for view in &self.views {
            fingers[view.header.finger_position as usize] = true;
        }
        let finger_cnt = fingers.iter().filter(|f| **f).count();

        let record = FidRecord {
            record_length: u32::try_from(total).map_err(|_| Error::RecordTooLong(total))?,
            finger_cnt: u8::try_from(finger_cnt).map_err(|_| Error::TooManyViews(finger_cnt))?,
            ..self.record
        };

        let mut buf = std::vec![0; total];
        write_fid_header(&record, self.dialect, &mut buf)?;

        let mut pos = header_length;
        for view in &self.views {
            pos += write_fid_view(view, &mut buf[pos..])?;
        }

        Ok(buf)
    }
}

/// Builder for a minutiae record.
///
/// The record length and view count are computed from the views added;
/// any values set on the template record are replaced. The header layout
/// follows from the final length.
#[derive(Debug)]
pub struct FmdBuilder<'a> {
    dialect: FmdDialect,
    record: FmdRecord,
    views: Vec<FmdView<'a>>,
}

impl<'a> FmdBuilder<'a> {
    pub fn new(dialect: FmdDialect, record: FmdRecord) -> Self {
        Self {
            dialect,
            record,
            views: Vec::new(),
        }
    }

    /// Append a view.
    pub fn view(mut self, view: FmdView<'a>) -> Self {
        self.views.push(view);
        self
    }

    pub fn build(self) -> Result<Vec<u8>, Error> {
        let view_cnt = u8::try_from(self.views.len())
            .map_err(|_| Error::TooManyViews(self.views.len()))?;

        let body = self.views.iter().map(FmdView::length).sum::<usize>();

        // The extended layout only applies once the short header no longer
        // fits the length field.
        let short = FmdLayout::for_record(self.dialect, 0).header_length() + body;
        let short = u32::try_from(short).map_err(|_| Error::RecordTooLong(short))?;
        let layout = FmdLayout::for_record(self.dialect, short);

        let total = layout.header_length() + body;
        let record = FmdRecord {
            record_length: u32::try_from(total).map_err(|_| Error::RecordTooLong(total))?,
            view_cnt,
            ..self.record
        };

        let mut buf = std::vec![0; total];
        write_fmd_header(&record, self.dialect, &mut buf)?;

        let mut pos = layout.header_length();
        for view in &self.views {
            pos += write_fmd_view(view, &mut buf[pos..])?;
        }

        Ok(buf)
    }
}

/// An uncompressed 8-bit raw image.
///
/// Pixels are row-major with no padding, and pixels are square.
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    pub pixels: &'a [u8],
    pub width: u16,
    pub height: u16,
    /// Resolution in pixels per inch.
    pub dpi: u16,
    /// Raw finger position.
    pub finger_position: u8,
    /// CBEFF product identifier, from the IBIA registry.
    pub cbeff_id: u32,
}

/// Wrap a raw image in a single-view image record.
pub fn raw_to_fid(dialect: FidDialect, image: &RawImage<'_>) -> Result<Vec<u8>, Error> {
    let record = FidRecord {
        cbeff_id: image.cbeff_id,
        scale_units: 1,
        scan_res: image.dpi,
        image_res: image.dpi,
        bpp: 8,
        ..FidRecord::default()
    };

    let quality = match dialect {
        FidDialect::Ansi381 => QUALITY_UNOBTAINABLE,
        FidDialect::Iso19794_4 => 0,
    };

    let view = FidView {
        header: FidViewHeader {
            finger_position: image.finger_position,
            view_cnt: 1,
            view_number: 1,
            quality,
            impression_type: ImpressionType::LivePlain as u8,
            width: image.width,
            height: image.height,
        },
        pixels: image.pixels,
    };

    FidBuilder::new(dialect, record).view(view).build()
}

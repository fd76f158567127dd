#![cfg(feature = "std")]

use whorl::{
    avec::{
        FmdBuilder, raw_to_fid,
        bridge::{self, VerifyConfig, from_values, load_print, to_values, verify_user},
        builder::RawImage,
        engine::{
            Candidate, Converter, EngineError, Extractor, FmdRef, Fuser, Matcher,
            PROBABILITY_ONE, ResultCode, ViewRef, check,
        },
        enrollment::{EnrolledView, Enrollment, EnrollmentConfig, Error, State},
    },
    sans::{
        fid::{locate_fid_view, read_fid_header, read_fid_view},
        fmd::{
            FmdError, FmdRecord, FmdView, FmdViewHeader, Minutia, locate_fmd_view,
            read_fmd_header, read_fmd_view,
        },
        format::{FidDialect, FmdDialect},
    },
};

fn print(dialect: FmdDialect, seed: u8, view_cnt: usize) -> Vec<u8> {
    let minutiae: Vec<Minutia> = (0..4).map(|i| [seed.wrapping_add(i); 6]).collect();

    let mut builder = FmdBuilder::new(
        dialect,
        FmdRecord {
            width: 320,
            height: 480,
            resolution: 197,
            ..FmdRecord::default()
        },
    );
    for i in 0..view_cnt {
        builder = builder.view(FmdView {
            header: FmdViewHeader {
                finger_position: 2,
                view_number: i as u8,
                impression_type: 0,
                quality: 60,
            },
            minutiae: &minutiae,
            ext_block: &[],
        });
    }

    builder.build().unwrap()
}

/// Concatenates the accepted views.
#[derive(Default)]
struct Concat {
    calls: usize,
}

impl Fuser for Concat {
    fn fuse(
        &mut self,
        _dialect: FmdDialect,
        views: &[EnrolledView],
    ) -> Result<Vec<u8>, EngineError> {
        self.calls += 1;
        Ok(views.iter().flat_map(|v| v.view.iter().copied()).collect())
    }
}

struct Failing;

impl Fuser for Failing {
    fn fuse(
        &mut self,
        _dialect: FmdDialect,
        _views: &[EnrolledView],
    ) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::Reported(ResultCode::Failure))
    }
}

/// Scores identical views zero and anything else as no match.
struct Exact;

impl Matcher for Exact {
    fn compare(&mut self, a: &ViewRef<'_>, b: &ViewRef<'_>) -> Result<u32, EngineError> {
        Ok(if a.bytes == b.bytes { 0 } else { PROBABILITY_ONE })
    }

    fn identify(
        &mut self,
        probe: &ViewRef<'_>,
        gallery: &[FmdRef<'_>],
        threshold: u32,
        candidate_cnt: usize,
    ) -> Result<Vec<Candidate>, EngineError> {
        let mut candidates = Vec::new();

        for (fmd_idx, fmd) in gallery.iter().enumerate() {
            let mut view_idx = 0;
            while let Ok(view) = fmd.view(view_idx) {
                if self.compare(probe, &view)? < threshold {
                    candidates.push(Candidate { fmd_idx, view_idx });
                }
                view_idx += 1;
            }
        }

        candidates.truncate(candidate_cnt);
        Ok(candidates)
    }
}

/// Produces one minutia per pixel row, with no feature detection at all.
struct RowExtractor;

impl Extractor for RowExtractor {
    fn from_raw(
        &mut self,
        image: &RawImage<'_>,
        dialect: FmdDialect,
    ) -> Result<Vec<u8>, EngineError> {
        let fid = raw_to_fid(FidDialect::Iso19794_4, image)
            .map_err(|_| EngineError::Reported(ResultCode::InvalidParameter))?;
        self.from_fid(FidDialect::Iso19794_4, &fid, dialect)
    }

    fn from_fid(
        &mut self,
        fid_dialect: FidDialect,
        fid: &[u8],
        dialect: FmdDialect,
    ) -> Result<Vec<u8>, EngineError> {
        let record = read_fid_header(fid_dialect, fid)
            .map_err(|_| EngineError::Reported(ResultCode::InvalidFid))?;
        let offset = locate_fid_view(fid_dialect, fid, 0)
            .ok_or(EngineError::Reported(ResultCode::InvalidFid))?;
        let view = read_fid_view(&fid[offset..])
            .map_err(|_| EngineError::Reported(ResultCode::InvalidFid))?;

        let minutiae: Vec<Minutia> = (0..view.header.height)
            .map(|y| {
                let [hi, lo] = y.to_be_bytes();
                [0, 0, hi, lo, 0, 50]
            })
            .collect();

        FmdBuilder::new(
            dialect,
            FmdRecord {
                width: view.header.width,
                height: view.header.height,
                resolution: record.scan_res,
                ..FmdRecord::default()
            },
        )
        .view(FmdView {
            header: FmdViewHeader {
                finger_position: view.header.finger_position,
                view_number: 0,
                impression_type: view.header.impression_type,
                quality: 60,
            },
            minutiae: &minutiae,
            ext_block: &[],
        })
        .build()
        .map_err(|_| EngineError::Reported(ResultCode::Failure))
    }
}

/// Re-encodes every view unchanged under the target dialect's header.
struct Rewrap;

impl Converter for Rewrap {
    fn convert(
        &mut self,
        from: FmdDialect,
        fmd: &[u8],
        to: FmdDialect,
    ) -> Result<Vec<u8>, EngineError> {
        let invalid = || EngineError::Reported(ResultCode::InvalidFmd);

        let record = read_fmd_header(from, fmd).map_err(|_| invalid())?;
        let cbeff_id = match to {
            FmdDialect::Ansi378 => record.cbeff_id,
            FmdDialect::Iso19794_2 => 0,
        };

        let mut builder = FmdBuilder::new(to, FmdRecord { cbeff_id, ..record });
        for i in 0..record.view_cnt as usize {
            let offset = locate_fmd_view(from, fmd, i).ok_or_else(invalid)?;
            builder = builder.view(read_fmd_view(&fmd[offset..]).map_err(|_| invalid())?);
        }

        builder.build().map_err(|_| invalid())
    }
}

#[test]
fn converted_prints_keep_views() {
    let ansi = print(FmdDialect::Ansi378, 4, 3);
    let iso = Rewrap
        .convert(FmdDialect::Ansi378, &ansi, FmdDialect::Iso19794_2)
        .unwrap();

    assert_eq!(iso.len(), ansi.len() - 2);

    let from = FmdRef::new(FmdDialect::Ansi378, &ansi);
    let to = FmdRef::new(FmdDialect::Iso19794_2, &iso);
    for i in 0..3 {
        assert_eq!(from.view(i).unwrap().bytes, to.view(i).unwrap().bytes);
    }

    let back = Rewrap
        .convert(FmdDialect::Iso19794_2, &iso, FmdDialect::Ansi378)
        .unwrap();
    assert_eq!(back.len(), ansi.len());

    assert!(matches!(
        Rewrap.convert(FmdDialect::Ansi378, &ansi[..20], FmdDialect::Iso19794_2),
        Err(EngineError::Reported(ResultCode::InvalidFmd))
    ));
}

#[test]
fn extracted_prints_enroll() {
    let pixels = [0x40; 6];
    let image = RawImage {
        pixels: &pixels,
        width: 2,
        height: 3,
        dpi: 500,
        finger_position: 2,
        cbeff_id: 0,
    };

    let record = RowExtractor.from_raw(&image, FmdDialect::Ansi378).unwrap();
    let fmd = FmdRef::new(FmdDialect::Ansi378, &record);
    let view = fmd.view(0).unwrap();

    assert_eq!(view.record.width, 2);
    assert_eq!(view.record.resolution, 500);
    assert_eq!(view.bytes.len(), 4 + 3 * 6 + 2);

    let mut session = Enrollment::new(EnrollmentConfig { views_required: 1 });
    session.start(FmdDialect::Ansi378).unwrap();
    assert_eq!(session.add(fmd, 0).unwrap(), State::Ready);

    assert!(matches!(
        RowExtractor.from_fid(FidDialect::Ansi381, &record, FmdDialect::Ansi378),
        Err(EngineError::Reported(ResultCode::InvalidFid))
    ));
}

#[test]
fn session_becomes_ready() {
    let record = print(FmdDialect::Ansi378, 1, 1);
    let mut session = Enrollment::new(EnrollmentConfig { views_required: 3 });
    assert_eq!(session.state(), State::NotStarted);

    session.start(FmdDialect::Ansi378).unwrap();
    assert_eq!(session.state(), State::InProgress);

    let fmd = FmdRef::new(FmdDialect::Ansi378, &record);
    assert_eq!(session.add(fmd, 0).unwrap(), State::InProgress);
    assert_eq!(session.add(fmd, 0).unwrap(), State::InProgress);
    assert_eq!(session.add(fmd, 0).unwrap(), State::Ready);

    let mut fuser = Concat::default();
    let template = session.create_fmd(&mut fuser).unwrap();
    assert_eq!(fuser.calls, 1);
    assert_eq!(template.len(), 3 * (record.len() - 26));

    session.finish();
    assert_eq!(session.state(), State::NotStarted);
    assert!(session.views().is_empty());
}

#[test]
fn session_holds_exact_views() {
    let record = print(FmdDialect::Iso19794_2, 9, 2);
    let fmd = FmdRef::new(FmdDialect::Iso19794_2, &record);

    let mut session = Enrollment::default();
    session.start(FmdDialect::Iso19794_2).unwrap();
    session.add(fmd, 1).unwrap();

    let view = &session.views()[0];
    assert_eq!(view.dialect, FmdDialect::Iso19794_2);
    assert_eq!(view.record.view_cnt, 2);
    assert_eq!(view.view, &record[54..]);
}

#[test]
fn session_state_errors() {
    let record = print(FmdDialect::Ansi378, 1, 1);
    let fmd = FmdRef::new(FmdDialect::Ansi378, &record);
    let mut fuser = Concat::default();

    let mut session = Enrollment::default();
    assert!(matches!(session.add(fmd, 0), Err(Error::NotStarted)));
    assert!(matches!(session.create_fmd(&mut fuser), Err(Error::NotStarted)));

    session.start(FmdDialect::Ansi378).unwrap();
    assert!(matches!(
        session.start(FmdDialect::Ansi378),
        Err(Error::InProgress)
    ));

    session.add(fmd, 0).unwrap();
    assert!(matches!(session.create_fmd(&mut fuser), Err(Error::NotReady)));
    assert_eq!(fuser.calls, 0);

    session.finish();
    session.start(FmdDialect::Iso19794_2).unwrap();
}

#[test]
fn session_rejects_invalid_views() {
    let record = print(FmdDialect::Ansi378, 1, 1);
    let mut session = Enrollment::default();
    session.start(FmdDialect::Ansi378).unwrap();

    let fmd = FmdRef::new(FmdDialect::Ansi378, &record);
    assert!(matches!(
        session.add(fmd, 1),
        Err(Error::Fmd(FmdError::NoSuchView(1)))
    ));

    let truncated = FmdRef::new(FmdDialect::Ansi378, &record[..record.len() - 1]);
    assert!(matches!(
        session.add(truncated, 0),
        Err(Error::Fmd(FmdError::NoSuchView(0)))
    ));

    let foreign = FmdRef::new(FmdDialect::Ansi378, b"FIR\0010\0");
    assert!(matches!(
        session.add(foreign, 0),
        Err(Error::Fmd(FmdError::NotFmdData))
    ));

    assert!(session.views().is_empty());
    assert_eq!(session.state(), State::InProgress);
}

#[test]
fn session_rejects_other_dialects() {
    let record = print(FmdDialect::Iso19794_2, 1, 1);
    let mut session = Enrollment::default();
    session.start(FmdDialect::Ansi378).unwrap();

    assert!(matches!(
        session.add(FmdRef::new(FmdDialect::Iso19794_2, &record), 0),
        Err(Error::DialectMismatch {
            expected: FmdDialect::Ansi378,
            found: FmdDialect::Iso19794_2,
        })
    ));
    assert!(session.views().is_empty());
}

#[test]
fn engine_failures_pass_through() {
    let record = print(FmdDialect::Ansi378, 1, 1);
    let mut session = Enrollment::new(EnrollmentConfig { views_required: 1 });
    session.start(FmdDialect::Ansi378).unwrap();
    session.add(FmdRef::new(FmdDialect::Ansi378, &record), 0).unwrap();

    assert!(matches!(
        session.create_fmd(&mut Failing),
        Err(Error::Engine(EngineError::Reported(ResultCode::Failure)))
    ));
}

#[test]
fn result_codes() {
    assert!(check(0).is_ok());

    let code = ResultCode::InvalidFmd.raw();
    assert_eq!(code, 0x05BA_00C9);
    assert_eq!(ResultCode::from_raw(code), Some(ResultCode::InvalidFmd));
    assert!(matches!(
        check(code),
        Err(EngineError::Reported(ResultCode::InvalidFmd))
    ));

    assert_eq!(ResultCode::from_raw(201), None);
    assert_eq!(ResultCode::from_raw(0x05BA_0001), None);
    assert!(matches!(check(-1), Err(EngineError::Unknown(-1))));

    for code in [
        ResultCode::NotImplemented,
        ResultCode::MoreData,
        ResultCode::TooSmallArea,
        ResultCode::EnrollmentNotReady,
    ] {
        assert_eq!(ResultCode::from_raw(code.raw()), Some(code));
    }
}

#[test]
fn verify_compares_first_views() {
    let enrolled = print(FmdDialect::Ansi378, 1, 2);
    let same = print(FmdDialect::Ansi378, 1, 1);
    let other = print(FmdDialect::Ansi378, 2, 1);
    let config = VerifyConfig::default();

    assert!(verify_user(&mut Exact, &enrolled, &same, &config).unwrap());
    assert!(!verify_user(&mut Exact, &enrolled, &other, &config).unwrap());

    let closed = VerifyConfig {
        threshold: 0,
        ..config
    };
    assert!(!verify_user(&mut Exact, &enrolled, &same, &closed).unwrap());
}

#[test]
fn verify_rejects_invalid_prints() {
    let enrolled = print(FmdDialect::Ansi378, 1, 1);

    assert!(matches!(
        verify_user(&mut Exact, &enrolled, &[], &VerifyConfig::default()),
        Err(bridge::Error::Fmd(FmdError::EndOfSlice))
    ));
}

#[test]
fn identify_finds_matching_views() {
    let probe_record = print(FmdDialect::Iso19794_2, 5, 1);
    let probe = FmdRef::new(FmdDialect::Iso19794_2, &probe_record).view(0).unwrap();

    let miss = print(FmdDialect::Iso19794_2, 6, 2);
    let hit = print(FmdDialect::Iso19794_2, 5, 3);
    let gallery = [
        FmdRef::new(FmdDialect::Iso19794_2, &miss),
        FmdRef::new(FmdDialect::Iso19794_2, &hit),
    ];

    let candidates = Exact.identify(&probe, &gallery, 1, 8).unwrap();
    assert_eq!(
        candidates,
        [Candidate {
            fmd_idx: 1,
            view_idx: 0,
        }]
    );
}

#[test]
fn host_values() {
    let record = print(FmdDialect::Ansi378, 200, 1);
    let values = to_values(&record);

    assert_eq!(values.len(), record.len());
    assert_eq!(values[0], b'F' as u32);
    assert_eq!(from_values(&values).unwrap(), record);

    assert!(matches!(
        from_values(&[1, 2, 256]),
        Err(bridge::Error::NotAByte {
            index: 2,
            value: 256
        })
    ));
}

#[test]
fn prints_load_from_files() {
    let record = print(FmdDialect::Ansi378, 3, 1);
    let path = std::env::temp_dir().join(format!("whorl-print-{}.fmd", std::process::id()));
    std::fs::write(&path, &record).unwrap();

    assert_eq!(load_print(&path).unwrap(), record);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(load_print(&path), Err(bridge::Error::Io(_))));
}

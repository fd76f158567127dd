use std::{env, fs::File, io};

use whorl::{
    avec::{read_fid, read_fmd},
    sans::{
        fid::{locate_fid_view, read_fid_header, read_fid_view},
        fmd::{locate_fmd_view, read_fmd_header, read_fmd_view},
        format::{FidDialect, FmdDialect},
    },
};

enum Format {
    Fid(FidDialect),
    Fmd(FmdDialect),
}

fn parse_args() -> Result<(Format, String), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);

    let format = match args.next().as_deref() {
        Some("fid-ansi") => Format::Fid(FidDialect::Ansi381),
        Some("fid-iso") => Format::Fid(FidDialect::Iso19794_4),
        Some("fmd-ansi") => Format::Fmd(FmdDialect::Ansi378),
        Some("fmd-iso") => Format::Fmd(FmdDialect::Iso19794_2),
        _ => {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Expected one of fid-ansi, fid-iso, fmd-ansi, fmd-iso",
            )));
        }
    };

    let path = args.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Not enough arguments")
    })?;

    Ok((format, path))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let (format, path) = parse_args()?;
    let mut file = File::open(path)?;

    match format {
        Format::Fid(dialect) => {
            let record = read_fid(&mut file, dialect)?;
            let header = read_fid_header(dialect, &record)?;
            println!("{header:#?}");

            let mut i = 0;
            while let Some(offset) = locate_fid_view(dialect, &record, i) {
                let view = read_fid_view(&record[offset..])?;
                println!(
                    "view {i} at {offset}: {:?}, {} payload bytes",
                    view.header,
                    view.pixels.len()
                );
                i += 1;
            }
        }
        Format::Fmd(dialect) => {
            let record = read_fmd(&mut file, dialect)?;
            let header = read_fmd_header(dialect, &record)?;
            println!("{header:#?}");

            for i in 0..header.view_cnt as usize {
                let Some(offset) = locate_fmd_view(dialect, &record, i) else {
                    println!("view {i}: missing");
                    break;
                };
                let view = read_fmd_view(&record[offset..])?;
                println!(
                    "view {i} at {offset}: {:?}, {} minutiae, {} extended bytes",
                    view.header,
                    view.minutia_cnt(),
                    view.ext_block_length()
                );
            }
        }
    }

    Ok(())
}

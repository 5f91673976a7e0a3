//! Run the encode pipeline: raw sectors in, channel bits (or raw lines) out.

use std::fs::File;
use std::io::BufWriter;
use log::{info,debug};
use crate::circ::CircEncoder;
use crate::patterns;
use crate::scramble;
use crate::sink::{EfmSink,RawSink,SymbolSink};
use crate::{SECTOR_BYTES,STDRESULT};
use super::CommandError;

const RCH: &str = "unreachable was reached";

pub fn encode(cmd: &clap::ArgMatches) -> STDRESULT {
    let input = cmd.get_one::<String>("input").expect(RCH);
    let digital = cmd.get_flag("digital");
    let pregap = cmd.get_flag("pregap");
    let text = cmd.get_flag("text");
    let efm_path = cmd.get_one::<String>("efm");
    let out_path = cmd.get_one::<String>("output");
    if text && efm_path.is_none() {
        eprintln!("--text requires --efm");
        return Err(Box::new(CommandError::InvalidCommand));
    }
    let (data,count) = crate::read_raw_sectors(input)?;
    info!("{}: {} sectors",input,count);
    let mut sink: Box<dyn SymbolSink> = match (efm_path,out_path) {
        (Some(p),_) => Box::new(EfmSink::new(BufWriter::new(File::create(p)?),text)),
        (_,Some(p)) => Box::new(RawSink::new(BufWriter::new(File::create(p)?))),
        _ => return Err(Box::new(CommandError::InvalidCommand))
    };
    let mut enc = CircEncoder::new();
    let mut lba: u32 = 0;
    if pregap {
        debug!("synthesizing {} pregap sectors",patterns::PREGAP_SECTORS);
        for _ in 0..patterns::PREGAP_SECTORS {
            let mut sec = patterns::pregap_sector(lba)?;
            // pregap sectors carry the data sync header, so they are
            // scrambled like any other data sector
            scramble::apply(&mut sec);
            let sub = patterns::pregap_subchannel(lba)?;
            enc.queue(&sec,Some(&sub[..]),sink.as_mut())?;
            lba += 1;
        }
    }
    for (n,chunk) in data.chunks_exact(SECTOR_BYTES).enumerate() {
        let mut sec = chunk.to_vec();
        if digital {
            scramble::apply(&mut sec);
        }
        let sub = patterns::track_subchannel(n as u32,digital)?;
        enc.queue(&sec,Some(&sub[..]),sink.as_mut())?;
        lba += 1;
    }
    enc.flush(sink.as_mut())?;
    sink.finish()?;
    info!("encoded {} sectors",lba);
    Ok(())
}

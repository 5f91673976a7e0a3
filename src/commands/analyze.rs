//! Run the decoder over a captured bitstream and report what it found.

use std::fs::File;
use std::io::{BufWriter,Write};
use log::info;
use crate::decoder;
use crate::subchannel::{PFlag,QData};
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

pub fn analyze(cmd: &clap::ArgMatches) -> STDRESULT {
    let input = cmd.get_one::<String>("input").expect(RCH);
    let show_frames = cmd.get_flag("frames");
    let show_sectors = cmd.get_flag("sectors");
    let show_errors = cmd.get_flag("errors");
    let show_dataq = cmd.get_flag("dataq");
    let cooked = cmd.get_flag("cooked");
    let data = std::fs::read(input)?;
    let levels = decoder::bits_from_bytes(&data);
    info!("{}: {} channel bits",input,levels.len());
    let ans = decoder::analyze(&levels)?;
    if show_frames {
        println!("frames: {}",ans.frames);
        println!("frames with corrupt sync bits: {}",ans.bad_sync_frames);
        println!("invalid merge groups: {}",ans.bad_merge_groups);
        println!("erasures: {}",ans.erasures);
    }
    if show_errors {
        println!("C1 codewords flagged: {}",ans.c1_flagged);
        println!("C2 codewords flagged: {}",ans.c2_flagged);
        println!("sectors lost to missing S0: {}",ans.lost_sectors);
    }
    if show_sectors || show_dataq {
        for sec in &ans.sectors {
            let p = match sec.p {
                PFlag::Inside => "track",
                PFlag::Gap => "gap",
                PFlag::Mixed => "mixed P"
            };
            let crc = if sec.q.crc_ok { "valid CRC" } else { "BAD CRC" };
            if show_sectors {
                println!("sector {}: {}, {}, {}{}",
                    sec.index,p,crc,
                    if sec.q.adr_control.is_data() { "data" } else { "audio" },
                    if sec.descrambled { ", descrambled" } else { "" });
            }
            if show_dataq {
                match sec.q.data {
                    QData::Position { track, index, track_msf, disc_msf } => {
                        println!("sector {}: Q track {:02x} index {:02x} at {} / {}",
                            sec.index,track.bcd(),index.bcd(),track_msf,disc_msf);
                    },
                    QData::Raw(raw) => {
                        println!("sector {}: Q adr {} data {}",
                            sec.index,sec.q.adr_control.adr(),hex::encode(raw));
                    }
                }
            }
        }
    }
    println!("{} sectors decoded",ans.sectors.len());
    if let Some(path) = cmd.get_one::<String>("output") {
        let mut out = BufWriter::new(File::create(path)?);
        for sec in &ans.sectors {
            out.write_all(&sec.data)?;
            if !cooked {
                out.write_all(&sec.sub)?;
            }
        }
        out.flush()?;
        info!("wrote {} sectors to {}",ans.sectors.len(),path);
    }
    Ok(())
}

//! Convert a logic-analyzer CSV capture into a packed bit file.
//!
//! Captures come out of the analyzer as one sample per text line, usually
//! `time,channel` with a header row; only the last 0/1 field on each line
//! matters here.

use std::fs::File;
use std::io::{BufWriter,Write};
use log::{info,warn};
use regex::Regex;
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

pub fn parsecsv(cmd: &clap::ArgMatches) -> STDRESULT {
    let input = cmd.get_one::<String>("input").expect(RCH);
    let output = cmd.get_one::<String>("output").expect(RCH);
    let text = std::fs::read_to_string(input)?;
    // numeric fields only, so header rows fall through
    let level_patt = Regex::new(r"^[0-9eE+\-.,;\t ]*([01])\s*$").expect(RCH);
    let mut out = BufWriter::new(File::create(output)?);
    let mut acc: u8 = 0;
    let mut mask: u8 = 1;
    let mut count: usize = 0;
    let mut skipped: usize = 0;
    for line in text.lines() {
        match level_patt.captures(line) {
            Some(cap) => {
                if cap.get(1).expect(RCH).as_str()=="1" {
                    acc |= mask;
                }
                if mask==0x80 {
                    out.write_all(&[acc])?;
                    acc = 0;
                    mask = 1;
                } else {
                    mask <<= 1;
                }
                count += 1;
            },
            None => skipped += 1
        }
    }
    if mask != 1 {
        out.write_all(&[acc])?;
    }
    out.flush()?;
    if skipped > 1 {
        // one skipped line is just the header
        warn!("{} lines had no level field",skipped);
    }
    info!("packed {} samples into {}",count,output);
    println!("{} samples",count);
    Ok(())
}

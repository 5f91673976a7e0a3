//! ## Test pattern and pregap synthesis
//!
//! Pattern sectors exercise the encoder and decoder: because the interleave
//! mixes rows and columns over a 105-line window, a constant-per-column or
//! constant-per-row payload makes mistakes in the delay tables stand out
//! immediately.  The pregap synthesizer produces the 153 lead-in sectors a
//! data track starts with: sync header, BCD timecode, mode byte, and a
//! matching subchannel block.

use crate::circ::{LINES_PER_SECTOR,PAYLOAD_COLS};
use crate::{SECTOR_BYTES,SUB_BYTES};
use crate::msf::{Bcd,Msf};
use crate::scramble::DATA_SYNC;
use crate::subchannel::{self,AdrControl,Q,QData};
use crate::DYNERR;
use std::str::FromStr;

/// sectors of pregap in front of a data track
pub const PREGAP_SECTORS: usize = 153;

#[derive(PartialEq,Clone,Copy)]
pub enum Pattern {
    /// every byte is its payload column number
    Cols,
    /// every byte is its payload row number
    Rows,
    /// every byte is its sector number
    Secs,
    /// every byte is its sector offset mod 256
    Bytes
}

impl FromStr for Pattern {
    type Err = crate::commands::CommandError;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "cols" => Ok(Self::Cols),
            "rows" => Ok(Self::Rows),
            "secs" => Ok(Self::Secs),
            "bytes" => Ok(Self::Bytes),
            _ => Err(crate::commands::CommandError::UnknownPattern)
        }
    }
}

/// generate `count` pattern sectors
pub fn generate(pattern: Pattern,count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count*SECTOR_BYTES);
    for i in 0..count {
        for j in 0..LINES_PER_SECTOR {
            for k in 0..PAYLOAD_COLS {
                out.push(match pattern {
                    Pattern::Cols => k as u8,
                    Pattern::Rows => j as u8,
                    Pattern::Secs => i as u8,
                    Pattern::Bytes => (j*PAYLOAD_COLS + k) as u8
                });
            }
        }
    }
    out
}

/// A pregap sector: data sync header, then minute/second/frame in BCD and
/// the mode byte, zero elsewhere.
pub fn pregap_sector(lba: u32) -> Result<[u8;SECTOR_BYTES],DYNERR> {
    let msf = Msf::from_lba(lba).ok_or("timecode out of range")?;
    let mut sec = [0u8;SECTOR_BYTES];
    sec[0..12].copy_from_slice(&DATA_SYNC);
    sec[12] = msf.0.bcd();
    sec[13] = msf.1.bcd();
    sec[14] = msf.2.bcd();
    sec[15] = 1;
    Ok(sec)
}

/// Subchannel block for a pregap sector: P flags the gap, Q counts the
/// track-relative time down and the absolute time up.
pub fn pregap_subchannel(lba: u32) -> Result<[u8;SUB_BYTES],DYNERR> {
    let remaining = (PREGAP_SECTORS as u32).saturating_sub(lba + 1);
    let q = Q {
        adr_control: AdrControl::MODE1_DATA,
        data: QData::Position {
            track: Bcd::from_binary(1).ok_or("bad track")?,
            index: Bcd::from_binary(0).ok_or("bad index")?,
            track_msf: Msf::from_lba(remaining).ok_or("timecode out of range")?,
            disc_msf: Msf::from_lba(lba).ok_or("timecode out of range")?
        },
        crc_ok: true
    };
    let mut cols = [[0u8;12];8];
    cols[0] = [0xff;12];
    cols[1] = q.to_raw();
    Ok(subchannel::from_bit_columns(&cols))
}

/// Subchannel block for an ordinary program-area sector.
pub fn track_subchannel(lba: u32,data: bool) -> Result<[u8;SUB_BYTES],DYNERR> {
    let q = Q {
        adr_control: if data { AdrControl::MODE1_DATA } else { AdrControl::MODE1_AUDIO },
        data: QData::Position {
            track: Bcd::from_binary(1).ok_or("bad track")?,
            index: Bcd::from_binary(1).ok_or("bad index")?,
            track_msf: Msf::from_lba(lba).ok_or("timecode out of range")?,
            disc_msf: Msf::from_lba(lba + PREGAP_SECTORS as u32).ok_or("timecode out of range")?
        },
        crc_ok: true
    };
    let mut cols = [[0u8;12];8];
    cols[1] = q.to_raw();
    Ok(subchannel::from_bit_columns(&cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subchannel::{bit_columns,p_flag,PFlag};

    #[test]
    fn pattern_sizes() {
        assert_eq!(generate(Pattern::Cols,3).len(),3*SECTOR_BYTES);
        let rows = generate(Pattern::Rows,1);
        assert_eq!(rows[5*24 + 7],5);
        let cols = generate(Pattern::Cols,1);
        assert_eq!(cols[5*24 + 7],7);
    }

    #[test]
    fn pregap_header() {
        let sec = pregap_sector(0).unwrap();
        assert_eq!(&sec[0..12],&DATA_SYNC);
        assert_eq!(&sec[12..16],&[0,0,0,1]);
        let sec = pregap_sector(75*60 + 75*2 + 3).unwrap();
        assert_eq!(&sec[12..15],&[0x01,0x02,0x03]);
    }

    #[test]
    fn pregap_subchannel_decodes() {
        let sub = pregap_subchannel(10).unwrap();
        let cols = bit_columns(&sub);
        assert_eq!(p_flag(&cols[0]),PFlag::Gap);
        let q = Q::from_raw(cols[1]);
        assert!(q.crc_ok);
        assert!(q.adr_control.is_data());
        match q.data {
            QData::Position { index, disc_msf, .. } => {
                assert_eq!(index.binary(),0);
                assert_eq!(disc_msf.lba(),10);
            },
            _ => panic!("expected position data")
        }
    }
}

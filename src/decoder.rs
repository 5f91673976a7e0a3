//! ## Bitstream decoder
//!
//! Takes a captured channel-level sequence all the way back to sectors:
//! find the sync pattern, split into 588-bit frames, undo NRZ-I, look up
//! the channel symbols, assemble 98-frame blocks keyed on the S0/S1
//! subchannel markers, check every C1 and C2 codeword through the decode
//! skews, undo the interleave, read subchannel P and Q, and descramble
//! payloads that Q marks as data.
//!
//! The decoder never gives up on a damaged stream: unknown channel words
//! become erasures, bad CRCs are flagged but the fields still surfaced, and
//! non-zero syndromes are reported with their errata positions without any
//! correction being applied.

use crate::efm::{self,Symbol};
use crate::rs;
use crate::scramble;
use crate::sink::{SYNC_PATTERN,SYNC_BITS,BITS_PER_FRAME,SYMBOLS_PER_FRAME};
use crate::subchannel::{self,PFlag,Q};
use crate::circ::{DELAYED_LINE,SWIZZLE,DELAYED_C2_DECODE,LINES_PER_SECTOR,PAYLOAD_COLS};
use crate::{SECTOR_BYTES,SUB_BYTES,DYNERR};
use log::{trace,debug,info,warn};

#[derive(thiserror::Error,Debug)]
pub enum DecodeError {
    #[error("no frame sync pattern in the capture")]
    SyncNotFound,
    #[error("capture too short")]
    TooShort
}

/// one demodulated frame
struct Frame {
    sub: Symbol,
    /// 32 data symbols; -1 marks an erasure
    row: [i16;32],
    sync_ok: bool,
    bad_merge: usize
}

/// everything the analyzer learned about a capture
pub struct Analysis {
    pub frames: usize,
    pub bad_sync_frames: usize,
    pub bad_merge_groups: usize,
    pub erasures: usize,
    /// rows whose C1 codeword had non-zero syndromes
    pub c1_flagged: usize,
    /// rows whose C2 codeword had non-zero syndromes
    pub c2_flagged: usize,
    pub lost_sectors: usize,
    pub sectors: Vec<DecodedSector>
}

pub struct DecodedSector {
    /// ordinal of the sector in the capture (the dropped first one is 0)
    pub index: usize,
    pub data: Vec<u8>,
    pub sub: [u8;SUB_BYTES],
    pub p: PFlag,
    pub q: Q,
    /// payload was descrambled because Q flagged digital data
    pub descrambled: bool
}

/// Interpret a captured file as channel levels: if every byte is an ASCII
/// '0'/'1' or whitespace the file is text, one character per bit; otherwise
/// it is packed binary, LSB first.
pub fn bits_from_bytes(data: &[u8]) -> Vec<u8> {
    let is_text = data.iter().all(|&b| b==b'0' || b==b'1' || b.is_ascii_whitespace());
    if is_text && data.contains(&b'0') {
        return data.iter().filter_map(|&b| match b {
            b'0' => Some(0),
            b'1' => Some(1),
            _ => None
        }).collect();
    }
    let mut bits = Vec::with_capacity(data.len()*8);
    for &byte in data {
        for i in 0..8 {
            bits.push((byte >> i) & 1);
        }
    }
    bits
}

/// Find the first NRZ-I image of the sync pattern: 11 of one level, 11 of
/// the other, 3 of the first again (the 25th bit is the first merge bit,
/// which never flips the level after a sync).
fn find_sync(levels: &[u8]) -> Option<usize> {
    if levels.len() < SYNC_BITS + 1 {
        return None;
    }
    'outer: for start in 0..levels.len()-SYNC_BITS {
        let first = levels[start];
        for i in 1..SYNC_BITS+1 {
            let expect = match i {
                1..=10 => first,
                11..=21 => 1 - first,
                _ => first
            };
            if levels[start+i] != expect {
                continue 'outer;
            }
        }
        return Some(start);
    }
    None
}

/// NRZ-I decode and split into frames starting at a sync boundary
fn demodulate(levels: &[u8]) -> Vec<Frame> {
    let mut bits = Vec::with_capacity(levels.len());
    bits.push(1u8);  // a capture aligned on sync starts with a transition
    for i in 1..levels.len() {
        bits.push(levels[i] ^ levels[i-1]);
    }
    let mut frames = Vec::new();
    for chunk in bits.chunks_exact(BITS_PER_FRAME) {
        let mut sync_ok = true;
        for i in 0..SYNC_BITS {
            if chunk[i] as u32 != (SYNC_PATTERN >> i) & 1 {
                sync_ok = false;
                break;
            }
        }
        let mut sub = Symbol::Erasure;
        let mut row = [-1i16;32];
        let mut bad_merge = 0;
        let mut pos = SYNC_BITS;
        for s in 0..SYMBOLS_PER_FRAME {
            if chunk[pos] + chunk[pos+1] + chunk[pos+2] > 1 {
                bad_merge += 1;
            }
            pos += 3;
            let mut code: u16 = 0;
            for k in 0..14 {
                code |= (chunk[pos+k] as u16) << k;
            }
            pos += 14;
            let sym = efm::decode(code);
            if s==0 {
                sub = sym;
            } else {
                row[s-1] = match sym {
                    Symbol::Byte(b) => b as i16,
                    _ => -1
                };
            }
        }
        // the merge group in front of the next sync pattern
        if chunk[pos] + chunk[pos+1] + chunk[pos+2] > 1 {
            bad_merge += 1;
        }
        frames.push(Frame { sub, row, sync_ok, bad_merge });
    }
    frames
}

/// gather one C1 codeword ending at row `r`; returns codeword bytes with
/// erasures zeroed plus the erasure positions
fn gather_c1(rows: &[[i16;32]],r: usize) -> ([u8;32],Vec<usize>) {
    let mut cw = [0u8;32];
    let mut erasures = Vec::new();
    for c in 0..32 {
        let v = rows[r - c%2][c];
        if v < 0 {
            erasures.push(c);
            continue;
        }
        cw[c] = if (12..16).contains(&c) || c >= 28 { v as u8 ^ 0xff } else { v as u8 };
    }
    (cw,erasures)
}

fn gather_c2(rows: &[[i16;32]],r: usize) -> ([u8;28],Vec<usize>) {
    let mut cw = [0u8;28];
    let mut erasures = Vec::new();
    for c in 0..28 {
        let v = rows[r - DELAYED_C2_DECODE[c]][c];
        if v < 0 {
            erasures.push(c);
            continue;
        }
        cw[c] = if (12..16).contains(&c) { v as u8 ^ 0xff } else { v as u8 };
    }
    (cw,erasures)
}

/// report a flagged codeword: syndromes, locator, errata positions
fn report_errata(which: &str,r: usize,synd: &[u8;4],erasures: &[usize],n: usize) {
    let folded = rs::forney_syndromes(synd,erasures);
    let lambda = rs::berlekamp_massey(&folded[erasures.len().min(4)..]);
    let errata = rs::chien_search(&lambda,n);
    warn!("{} sector {} row {} syndromes {}",which,r/LINES_PER_SECTOR,r%LINES_PER_SECTOR,hex::encode(synd));
    debug!("{} row {} erasures {:?} errata {:?}",which,r,erasures,errata);
}

/// Run the full analysis over a channel-level capture.
pub fn analyze(levels: &[u8]) -> Result<Analysis,DYNERR> {
    let start = find_sync(levels).ok_or(DecodeError::SyncNotFound)?;
    info!("frame sync at bit {}",start);
    let frames = demodulate(&levels[start..]);
    if frames.len() < 2*LINES_PER_SECTOR {
        return Err(Box::new(DecodeError::TooShort));
    }
    let mut ans = Analysis {
        frames: frames.len(),
        bad_sync_frames: 0,
        bad_merge_groups: 0,
        erasures: 0,
        c1_flagged: 0,
        c2_flagged: 0,
        lost_sectors: 0,
        sectors: Vec::new()
    };
    let mut rows: Vec<[i16;32]> = Vec::with_capacity(frames.len());
    for (n,f) in frames.iter().enumerate() {
        if !f.sync_ok {
            debug!("frame {} sync bits corrupt",n);
            ans.bad_sync_frames += 1;
        }
        if f.bad_merge > 0 {
            debug!("frame {} has {} bad merge groups",n,f.bad_merge);
            ans.bad_merge_groups += f.bad_merge;
        }
        ans.erasures += f.row.iter().filter(|&&v| v < 0).count();
        rows.push(f.row);
    }
    // codeword checks through the decode-side skews
    for r in 1..rows.len() {
        let (cw,erasures) = gather_c1(&rows,r);
        let synd = rs::syndromes(&cw);
        if synd != [0,0,0,0] || !erasures.is_empty() {
            ans.c1_flagged += 1;
            report_errata("C1",r,&synd,&erasures,32);
        }
        if r >= DELAYED_C2_DECODE[0] {
            let (cw,erasures) = gather_c2(&rows,r);
            let synd = rs::syndromes(&cw);
            if synd != [0,0,0,0] || !erasures.is_empty() {
                ans.c2_flagged += 1;
                report_errata("C2",r,&synd,&erasures,28);
            }
        }
    }
    // sector assembly keyed on the subchannel markers
    let mut starts: Vec<usize> = Vec::new();
    let mut hunt = 0;
    let mut n = 0;
    while n < frames.len() {
        if frames[n].sub==Symbol::S0 {
            if n + LINES_PER_SECTOR > frames.len() {
                break;
            }
            if frames[n+1].sub != Symbol::S1 {
                warn!("frame {} should carry the S1 marker",n+1);
            }
            starts.push(n);
            hunt = 0;
            n += LINES_PER_SECTOR;
        } else {
            hunt += 1;
            if hunt==LINES_PER_SECTOR {
                warn!("no S0 marker for a whole block, sector lost");
                ans.lost_sectors += 1;
                hunt = 0;
            }
            n += 1;
        }
    }
    info!("{} sector starts, first discarded as partial",starts.len());
    let inv = inverse_swizzle();
    for (k,&start) in starts.iter().enumerate().skip(1) {
        // de-interleave needs lines past the end of this block
        if start + LINES_PER_SECTOR - 1 + DELAYED_LINE[0] - DELAYED_LINE[PAYLOAD_COLS-1] >= rows.len() {
            trace!("sector {} runs off the end of the capture",k);
            break;
        }
        let mut data = vec![0u8;SECTOR_BYTES];
        for r in 0..LINES_PER_SECTOR {
            for col in 0..PAYLOAD_COLS {
                let c = inv[col];
                let line = start + r + DELAYED_LINE[0] - DELAYED_LINE[c];
                let pos = if c < 12 { c } else { c + 4 };
                let v = rows[line][pos];
                data[r*PAYLOAD_COLS + col] = if v < 0 { 0 } else { v as u8 };
            }
        }
        // subchannel bytes ride on frames 2..97 of the block
        let mut sub = [0u8;SUB_BYTES];
        for i in 0..SUB_BYTES {
            sub[i] = match frames[start + 2 + i].sub {
                Symbol::Byte(b) => b,
                _ => {
                    debug!("sector {} subchannel byte {} unreadable",k,i);
                    0
                }
            };
        }
        let cols = subchannel::bit_columns(&sub);
        let p = subchannel::p_flag(&cols[0]);
        let q = Q::from_raw(cols[1]);
        let mut descrambled = false;
        if q.adr_control.is_data() {
            match scramble::find_sync(&data) {
                Some(s) => {
                    trace!("sector {} data sync at offset {}",k,s);
                    scramble::apply_at(&mut data,s);
                    descrambled = true;
                },
                None => debug!("sector {} flagged as data but has no sync header",k)
            }
        }
        ans.sectors.push(DecodedSector { index: k, data, sub, p, q, descrambled });
    }
    Ok(ans)
}

fn inverse_swizzle() -> [usize;PAYLOAD_COLS] {
    let mut inv = [0usize;PAYLOAD_COLS];
    for c in 0..PAYLOAD_COLS {
        inv[SWIZZLE[c]] = c;
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_binary_bits() {
        assert_eq!(bits_from_bytes(b"0110"),vec![0,1,1,0]);
        assert_eq!(bits_from_bytes(&[0x05]),vec![1,0,1,0,0,0,0,0]);
    }

    #[test]
    fn sync_pattern_found() {
        // short runs in front so nothing sync-shaped appears early
        let mut levels: Vec<u8> = (0..40).map(|i| (i & 1) as u8).collect();
        let pat: Vec<u8> = (0..25).map(|i| match i { 0..=10 => 1, 11..=21 => 0, _ => 1 }).collect();
        levels.extend_from_slice(&pat);
        levels.extend_from_slice(&[0,0,1,0,0]);
        assert_eq!(find_sync(&levels),Some(40));
        // the complement must be found at the same place
        let flipped: Vec<u8> = levels.iter().map(|&b| 1-b).collect();
        assert_eq!(find_sync(&flipped),Some(40));
    }

    #[test]
    fn sync_rejects_noise() {
        let levels: Vec<u8> = (0..200).map(|i| ((i*7+3)/5) as u8 & 1).collect();
        assert_eq!(find_sync(&levels),None);
    }
}

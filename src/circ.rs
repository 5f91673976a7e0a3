//! ## Cross-interleaved Reed-Solomon encoder
//!
//! The real-time CIRC pipeline: sectors go in one at a time, 33-symbol
//! lines come out 98 per sector.  Each line carries one subchannel symbol
//! followed by 12 payload bytes, 4 inverted C2 parity bytes, 12 more
//! payload bytes and 4 inverted C1 parity bytes.  The payload is gathered
//! through the delay/swizzle tables below, so any one line mixes bytes from
//! up to 105 different input rows; that spread is what turns a physical
//! scratch into many small, correctable codeword errors.
//!
//! The encoder keeps three whole sectors of lookahead and a 59-line ring of
//! already-emitted data.  The past ring starts out holding silence, whose
//! parity is zero, so the very first lines are valid codewords over a
//! garbage prefix.

use crate::efm::Symbol;
use crate::rs;
use crate::sink::SymbolSink;
use crate::{STDRESULT,DYNERR,SECTOR_BYTES,SUB_BYTES};
use log::trace;

#[derive(thiserror::Error,Debug)]
pub enum CircError {
    #[error("sector must be exactly 2352 bytes")]
    SectorLength,
    #[error("subchannel block must be exactly 96 bytes")]
    SubchannelLength
}

pub const LINES_PER_SECTOR: usize = 98;
pub const LINE_BYTES: usize = 32;
/// payload columns per line (the line minus both parity fields)
pub const PAYLOAD_COLS: usize = 24;

/// sectors of lookahead the encoder holds before it emits anything
pub const LOOKAHEAD_SECTORS: usize = 3;

/// lines of history one C2 codeword reaches back
const PAST_LINES: usize = 59;

/// line delay, relative to the emitting line, of each payload column
pub const DELAYED_LINE: [usize;PAYLOAD_COLS] = [
    106,103,98,95,90,87,82,79,74,71,66,63,
    44,41,36,33,29,26,20,17,12,9,5,2
];

/// input-stream column feeding each payload column
pub const SWIZZLE: [usize;PAYLOAD_COLS] = [
    5,4,13,12,21,20,7,6,15,14,23,22,
    9,8,17,16,1,0,11,10,19,18,3,2
];

/// line delay of each payload column as seen by the C2 code
pub const DELAYED_C2_DATA: [usize;PAYLOAD_COLS] = [
    107,104,99,96,91,88,83,80,75,72,67,64,
    43,40,35,32,27,24,19,16,11,8,3,0
];

/// line delay of each of the four C2 parity bytes
pub const C2_PARITY_DELAYS: [usize;4] = [59,56,51,48];

/// decode-side delay of every C2 codeword position (data, parity, data)
pub const DELAYED_C2_DECODE: [usize;28] = [
    107,104,99,96,91,88,83,80,75,72,67,64,
    59,56,51,48,
    43,40,35,32,27,24,19,16,11,8,3,0
];

/// the smallest line delay; chosen so a data-sector sync header is never
/// split across the interleave
pub const DELAY_OFFSET: usize = 2;

/// Fixed-capacity ring with random access; index 0 is the oldest element
/// and pushing drops it.
pub struct Ring<T: Copy,const N: usize> {
    storage: [T;N],
    head: usize
}

impl <T: Copy,const N: usize> Ring<T,N> {
    pub fn filled(v: T) -> Self {
        Self { storage: [v;N], head: 0 }
    }
    pub fn get(&self,i: usize) -> &T {
        &self.storage[(self.head + i) % N]
    }
    pub fn push(&mut self,v: T) {
        self.storage[self.head] = v;
        self.head = (self.head + 1) % N;
    }
}

/// one line of past data: 12 payload bytes, 4 C2 bytes as stored
/// (inverted), 12 payload bytes
type PastLine = [u8;28];

/// silence: zero data and zero C2 parity, stored inverted
const SILENT_LINE: PastLine = [
    0,0,0,0,0,0,0,0,0,0,0,0,
    0xff,0xff,0xff,0xff,
    0,0,0,0,0,0,0,0,0,0,0,0
];

pub struct CircEncoder {
    sectors: Vec<Vec<u8>>,
    subs: Vec<Vec<u8>>,
    past: Ring<PastLine,PAST_LINES>,
    /// how many queued sectors still have to be emitted
    pending: usize
}

impl CircEncoder {
    pub fn new() -> Self {
        Self {
            sectors: Vec::new(),
            subs: Vec::new(),
            past: Ring::filled(SILENT_LINE),
            pending: 0
        }
    }
    /// Queue one sector with an optional subchannel block.  Nothing is
    /// emitted until three sectors are buffered; from then on every call
    /// emits the 98 lines of the oldest sector to the sink.
    pub fn queue(&mut self,sector: &[u8],sub: Option<&[u8]>,sink: &mut dyn SymbolSink) -> STDRESULT {
        if sector.len() != SECTOR_BYTES {
            return Err(Box::new(CircError::SectorLength));
        }
        if let Some(s) = sub {
            if s.len() != SUB_BYTES {
                return Err(Box::new(CircError::SubchannelLength));
            }
        }
        self.sectors.push(sector.to_vec());
        self.subs.push(match sub {
            Some(s) => s.to_vec(),
            None => vec![0;SUB_BYTES]
        });
        self.pending += 1;
        if self.sectors.len() < LOOKAHEAD_SECTORS {
            return Ok(());
        }
        trace!("emitting sector, {} pending",self.pending);
        for i in 0..LINES_PER_SECTOR {
            self.emit_line(i,sink)?;
        }
        self.sectors.remove(0);
        self.subs.remove(0);
        self.pending -= 1;
        Ok(())
    }
    /// Push silence until every real sector has been emitted.  The tail of
    /// the output is then interleave runout, just as the head was warmup.
    pub fn flush(&mut self,sink: &mut dyn SymbolSink) -> STDRESULT {
        while self.pending > 0 {
            self.sectors.push(vec![0;SECTOR_BYTES]);
            self.subs.push(vec![0;SUB_BYTES]);
            if self.sectors.len() < LOOKAHEAD_SECTORS {
                continue;
            }
            for i in 0..LINES_PER_SECTOR {
                self.emit_line(i,sink)?;
            }
            self.sectors.remove(0);
            self.subs.remove(0);
            self.pending -= 1;
        }
        self.sectors.clear();
        self.subs.clear();
        Ok(())
    }
    /// byte of the buffered input stream; row 0 is the first row of the
    /// sector being emitted
    fn stream_byte(&self,row: usize,col: usize) -> u8 {
        let sec = row / LINES_PER_SECTOR;
        let r = row % LINES_PER_SECTOR;
        self.sectors[sec][r*PAYLOAD_COLS + col]
    }
    /// C2 parity (uninverted) of the codeword whose parity byte lies
    /// `loc` lines behind its newest data byte.  The first half of the
    /// codeword is already emitted and comes from the past ring; the second
    /// half is still in the sector buffer.
    fn c2_at(&self,i: usize,loc: usize) -> Result<[u8;4],DYNERR> {
        let mut msg = [0u8;PAYLOAD_COLS];
        for c in 0..12 {
            let row = PAST_LINES - (DELAYED_C2_DATA[c] - loc);
            msg[c] = self.past.get(row)[c];
        }
        for c in 12..PAYLOAD_COLS {
            let row = DELAYED_LINE[c] + i + loc - DELAYED_C2_DATA[c] - DELAY_OFFSET;
            msg[c] = self.stream_byte(row,SWIZZLE[c]);
        }
        rs::c2_parity(&msg)
    }
    fn emit_line(&mut self,i: usize,sink: &mut dyn SymbolSink) -> STDRESULT {
        // subchannel symbol
        match i {
            0 => sink.put_symbol(Symbol::S0)?,
            1 => sink.put_symbol(Symbol::S1)?,
            _ => sink.put_symbol(Symbol::Byte(self.subs[0][i-2]))?
        };
        // payload gather
        let mut p = [0u8;PAYLOAD_COLS];
        for c in 0..PAYLOAD_COLS {
            p[c] = self.stream_byte(DELAYED_LINE[c] + i - DELAY_OFFSET,SWIZZLE[c]);
        }
        // C2 parity, stored inverted, each byte from its own delay location
        let mut c2v = [0u8;4];
        for n in 0..4 {
            c2v[n] = self.c2_at(i,C2_PARITY_DELAYS[n])?[n] ^ 0xff;
        }
        // the C2 values the next line will compute, needed by C1 below
        let mut c2f = [0u8;2];
        for half in 0..2 {
            c2f[half] = self.c2_at(i,C2_PARITY_DELAYS[half*2] + 1)?[half*2];
        }
        // C1 parity, stored inverted.  The last interleave stage delays
        // even-position symbols one line, so this line carries p0/p2 of the
        // codeword anchored here (even columns fresh, odd columns one line
        // old) and p1/p3 of the next line's codeword (even columns one line
        // ahead, odd columns fresh).
        let mut c1v = [0u8;4];
        let mut msg = [0u8;28];
        for c in 0..PAYLOAD_COLS {
            let pos = if c < 12 { c } else { c + 4 };
            msg[pos] = match c % 2 {
                0 => self.stream_byte(DELAYED_LINE[c] + i + 1 - DELAY_OFFSET,SWIZZLE[c]),
                _ => p[c]
            };
        }
        msg[12] = c2f[0];
        msg[13] = c2v[1] ^ 0xff;
        msg[14] = c2f[1];
        msg[15] = c2v[3] ^ 0xff;
        let parity = rs::c1_parity(&msg)?;
        c1v[1] = parity[1] ^ 0xff;
        c1v[3] = parity[3] ^ 0xff;
        let last = self.past.get(PAST_LINES - 1);
        for c in 0..PAYLOAD_COLS {
            let pos = if c < 12 { c } else { c + 4 };
            msg[pos] = match c % 2 {
                0 => p[c],
                _ => last[pos]
            };
        }
        msg[12] = c2v[0] ^ 0xff;
        msg[13] = last[13] ^ 0xff;
        msg[14] = c2v[2] ^ 0xff;
        msg[15] = last[15] ^ 0xff;
        let parity = rs::c1_parity(&msg)?;
        c1v[0] = parity[0] ^ 0xff;
        c1v[2] = parity[2] ^ 0xff;
        // emit and remember the line
        let mut past: PastLine = [0;28];
        for c in 0..12 {
            sink.put_symbol(Symbol::Byte(p[c]))?;
            past[c] = p[c];
        }
        for n in 0..4 {
            sink.put_symbol(Symbol::Byte(c2v[n]))?;
            past[12+n] = c2v[n];
        }
        for c in 12..PAYLOAD_COLS {
            sink.put_symbol(Symbol::Byte(p[c]))?;
            past[c+4] = p[c];
        }
        for n in 0..4 {
            sink.put_symbol(Symbol::Byte(c1v[n]))?;
        }
        self.past.push(past);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::STDRESULT;

    /// captures lines for inspection
    struct Capture {
        syms: Vec<Symbol>
    }
    impl SymbolSink for Capture {
        fn put_symbol(&mut self,sym: Symbol) -> STDRESULT {
            self.syms.push(sym);
            Ok(())
        }
        fn finish(&mut self) -> STDRESULT {
            Ok(())
        }
    }

    fn lines_of(cap: &Capture) -> Vec<Vec<Symbol>> {
        cap.syms.chunks(33).map(|c| c.to_vec()).collect()
    }

    #[test]
    fn rejects_bad_lengths() {
        let mut enc = CircEncoder::new();
        let mut cap = Capture { syms: Vec::new() };
        assert!(enc.queue(&[0;100],None,&mut cap).is_err());
        assert!(enc.queue(&[0;SECTOR_BYTES],Some(&[0;95][..]),&mut cap).is_err());
    }

    #[test]
    fn silent_sectors_emit_silent_lines() {
        let mut enc = CircEncoder::new();
        let mut cap = Capture { syms: Vec::new() };
        for _ in 0..4 {
            enc.queue(&[0;SECTOR_BYTES],None,&mut cap).unwrap();
        }
        let lines = lines_of(&cap);
        assert_eq!(lines.len(),2*LINES_PER_SECTOR);
        for (n,line) in lines.iter().enumerate() {
            match n % LINES_PER_SECTOR {
                0 => assert_eq!(line[0],Symbol::S0),
                1 => assert_eq!(line[0],Symbol::S1),
                _ => assert_eq!(line[0],Symbol::Byte(0))
            }
            for c in 0..32 {
                let expect = if (12..16).contains(&c) || c >= 28 { 0xff } else { 0 };
                assert_eq!(line[1+c],Symbol::Byte(expect),"line {} col {}",n,c);
            }
        }
    }

    #[test]
    fn emitted_lines_are_valid_codewords() {
        // decode-side gather: C1 delays by column parity, C2 by its table
        let mut enc = CircEncoder::new();
        let mut cap = Capture { syms: Vec::new() };
        for s in 0..6u32 {
            let sec: Vec<u8> = (0..SECTOR_BYTES).map(|i| (i as u32*7 + s*13) as u8).collect();
            enc.queue(&sec,None,&mut cap).unwrap();
        }
        let lines = lines_of(&cap);
        let rows: Vec<Vec<u8>> = lines.iter().map(|l| l[1..].iter().map(|s| match s {
            Symbol::Byte(b) => *b,
            _ => panic!("marker in data position")
        }).collect()).collect();
        for r in 1..rows.len() {
            let mut cw = [0u8;32];
            for c in 0..32 {
                let v = rows[r - c%2][c];
                cw[c] = if (12..16).contains(&c) || c >= 28 { v ^ 0xff } else { v };
            }
            assert_eq!(rs::syndromes(&cw),[0,0,0,0],"C1 row {}",r);
        }
        for r in 107..rows.len() {
            let mut cw = [0u8;28];
            for c in 0..28 {
                let v = rows[r - DELAYED_C2_DECODE[c]][c];
                cw[c] = if (12..16).contains(&c) { v ^ 0xff } else { v };
            }
            assert_eq!(rs::syndromes(&cw),[0,0,0,0],"C2 row {}",r);
        }
    }

    #[test]
    fn flush_drains_all_sectors() {
        let mut enc = CircEncoder::new();
        let mut cap = Capture { syms: Vec::new() };
        for _ in 0..2 {
            enc.queue(&[0x5a;SECTOR_BYTES],None,&mut cap).unwrap();
        }
        assert_eq!(cap.syms.len(),0);
        enc.flush(&mut cap).unwrap();
        assert_eq!(cap.syms.len(),2*LINES_PER_SECTOR*33);
    }
}

//! ## Channel bit emission
//!
//! This handles the bit-level end of the encoder: 14-bit symbols go in,
//! NRZ-I channel levels come out, packed LSB-first into bytes or written as
//! '0'/'1' text.  Between symbols the sink inserts 3 merge bits chosen from
//! two bits of history and two bits of lookahead; the policy is the most
//! eager transition-inserting choice that stays legal under the d=2/k=10
//! run-length rules, which keeps clock recovery healthy.  Every 33rd symbol
//! is preceded by the 24-bit frame sync pattern.

use std::io::Write;
use crate::efm::{self,Symbol};
use crate::STDRESULT;

/// the 24-bit frame sync pattern, bit 0 first: ones at offsets 0, 11 and 22
pub const SYNC_PATTERN: u32 = 0x400801;
pub const SYNC_BITS: usize = 24;
/// symbols per frame, one subchannel symbol plus 32 data bytes
pub const SYMBOLS_PER_FRAME: usize = 33;
/// channel bits per frame: sync + 34 merge groups + 33 symbols
pub const BITS_PER_FRAME: usize = 588;

/// Anything that can accept the encoder's symbol stream.
pub trait SymbolSink {
    fn put_symbol(&mut self,sym: Symbol) -> STDRESULT;
    /// flush whatever is buffered; the sink is reusable afterwards
    fn finish(&mut self) -> STDRESULT;
}

/// Modulates symbols to the physical channel bitstream.
pub struct EfmSink<W: Write> {
    out: W,
    text: bool,
    /// current NRZ-I level
    last_bit: u8,
    /// two most recent pre-NRZ-I bits, bit 0 newest
    last_few: u8,
    /// symbol position within the frame
    column: usize,
    acc: u8,
    mask: u8
}

impl <W: Write> EfmSink<W> {
    pub fn new(out: W,text: bool) -> Self {
        Self { out, text, last_bit: 0, last_few: 0, column: 0, acc: 0, mask: 1 }
    }
    /// count of symbols accepted modulo one frame
    pub fn column(&self) -> usize {
        self.column
    }
    fn put_bit(&mut self,b: u8) -> STDRESULT {
        if b > 0 {
            self.last_bit ^= 1;
        }
        self.last_few = ((self.last_few << 1) | b) & 3;
        if self.text {
            self.out.write_all(&[b'0' + self.last_bit])?;
            return Ok(());
        }
        if self.last_bit > 0 {
            self.acc |= self.mask;
        }
        if self.mask==0x80 {
            self.out.write_all(&[self.acc])?;
            self.acc = 0;
            self.mask = 1;
        } else {
            self.mask <<= 1;
        }
        Ok(())
    }
    fn put_code(&mut self,code: u32,count: usize) -> STDRESULT {
        for i in 0..count {
            self.put_bit(((code >> i) & 1) as u8)?;
        }
        Ok(())
    }
    /// Choose and emit 3 merge bits given the next symbol's first two bits.
    /// With v = (history << 2) | lookahead: insert a transition whenever both
    /// neighbors are low, otherwise shift the mandatory gap to whichever side
    /// needs it, otherwise stay silent.
    fn merge(&mut self,next_two: u8) -> STDRESULT {
        let v = ((self.last_few & 3) << 2) | (next_two & 3);
        let bits: u8 = if v & 0b0101 == 0 {
            0b010
        } else if v==0b0001 {
            0b001  // emitted bit 0 first: 1,0,0
        } else if v==0b0100 {
            0b100  // 0,0,1
        } else {
            0b000
        };
        self.put_code(bits as u32,3)
    }
}

impl <W: Write> SymbolSink for EfmSink<W> {
    fn put_symbol(&mut self,sym: Symbol) -> STDRESULT {
        if self.column==0 {
            self.put_code(SYNC_PATTERN,SYNC_BITS)?;
        }
        let code = efm::encode(sym)?;
        self.merge((code & 3) as u8)?;
        self.put_code(code as u32,14)?;
        self.column += 1;
        if self.column==SYMBOLS_PER_FRAME {
            // the sync pattern always starts 1,0
            self.merge(0b01)?;
            self.column = 0;
        }
        Ok(())
    }
    fn finish(&mut self) -> STDRESULT {
        if !self.text && self.mask != 1 {
            self.out.write_all(&[self.acc])?;
        }
        self.out.flush()?;
        self.last_bit = 0;
        self.last_few = 0;
        self.column = 0;
        self.acc = 0;
        self.mask = 1;
        Ok(())
    }
}

/// Writes the 32 data bytes of each line and drops subchannel markers;
/// used for the raw (pre-modulation) output format.
pub struct RawSink<W: Write> {
    out: W,
    column: usize
}

impl <W: Write> RawSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, column: 0 }
    }
}

impl <W: Write> SymbolSink for RawSink<W> {
    fn put_symbol(&mut self,sym: Symbol) -> STDRESULT {
        let col = self.column;
        self.column = (self.column + 1) % SYMBOLS_PER_FRAME;
        if col==0 {
            return Ok(());
        }
        match sym {
            Symbol::Byte(b) => {
                self.out.write_all(&[b])?;
                Ok(())
            },
            _ => Err(Box::new(efm::EfmError::InvalidSymbol))
        }
    }
    fn finish(&mut self) -> STDRESULT {
        self.out.flush()?;
        self.column = 0;
        Ok(())
    }
}

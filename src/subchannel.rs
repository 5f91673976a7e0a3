//! ## Subchannel data
//!
//! Each sector carries 96 subchannel bytes (frames 2..97 of the block).
//! Transposing them bit-serially, MSB first, gives 8 parallel 96-bit
//! columns named P through W.  Only P and Q are interpreted here: P flags
//! track gaps, Q carries control/address information protected by an
//! inverted CRC-16-CCITT over its first 80 bits.  R..W pass through.

use crate::crc;
use crate::msf::{Bcd,Msf};
use crate::SUB_BYTES;
use log::debug;

/// transpose the 96 subchannel bytes into 8 twelve-byte bit columns,
/// index 0 = P (bit 7 of every byte), index 7 = W
pub fn bit_columns(sub: &[u8]) -> [[u8;12];8] {
    let mut cols = [[0u8;12];8];
    for (bit,&b) in sub.iter().enumerate().take(SUB_BYTES) {
        for ch in 0..8 {
            if b & (0x80 >> ch) > 0 {
                cols[ch][bit/8] |= 0x80 >> (bit & 7);
            }
        }
    }
    cols
}

/// inverse of `bit_columns`, used when synthesizing subchannel blocks
pub fn from_bit_columns(cols: &[[u8;12];8]) -> [u8;SUB_BYTES] {
    let mut sub = [0u8;SUB_BYTES];
    for ch in 0..8 {
        for bit in 0..SUB_BYTES {
            if cols[ch][bit/8] & (0x80 >> (bit & 7)) > 0 {
                sub[bit] |= 0x80 >> ch;
            }
        }
    }
    sub
}

/// what the P column says about the current sector
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum PFlag {
    /// all zeros, inside a track
    Inside,
    /// all ones, in a gap
    Gap,
    /// anything else
    Mixed
}

pub fn p_flag(p: &[u8;12]) -> PFlag {
    if p.iter().all(|&b| b==0) {
        PFlag::Inside
    } else if p.iter().all(|&b| b==0xff) {
        PFlag::Gap
    } else {
        PFlag::Mixed
    }
}

/// the control/address byte opening subchannel Q
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct AdrControl(pub u8);

impl AdrControl {
    /// mode-1 position data for an audio track
    pub const MODE1_AUDIO: AdrControl = AdrControl(0x11);
    /// mode-1 position data for a digital data track
    pub const MODE1_DATA: AdrControl = AdrControl(0x41);

    pub fn is_data(&self) -> bool {
        self.0 & 0x40 != 0
    }
    pub fn is_audio(&self) -> bool {
        !self.is_data()
    }
    pub fn pre_emphasis(&self) -> bool {
        self.is_audio() && self.0 & 0x10 != 0
    }
    pub fn copy_permitted(&self) -> bool {
        self.0 & 0x20 != 0
    }
    pub fn four_channel(&self) -> bool {
        self.is_audio() && self.0 & 0x80 != 0
    }
    /// address mode selecting the interpretation of data-Q
    pub fn adr(&self) -> u8 {
        self.0 & 0xf
    }
}

/// mode-specific payload of subchannel Q
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum QData {
    /// ADR 1: position within the track and on the disc
    Position { track: Bcd, index: Bcd, track_msf: Msf, disc_msf: Msf },
    /// any mode this decoder does not interpret
    Raw([u8;9])
}

/// a decoded subchannel-Q block
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct Q {
    pub adr_control: AdrControl,
    pub data: QData,
    pub crc_ok: bool
}

impl Q {
    /// Decode a 12-byte Q column.  A CRC failure is flagged but the fields
    /// are still surfaced.
    pub fn from_raw(raw: [u8;12]) -> Q {
        let stored = ((raw[10] as u16) << 8) | raw[11] as u16;
        let crc_ok = (crc::crc16(&raw[0..10]) ^ 0xffff)==stored;
        if !crc_ok {
            debug!("subchannel Q CRC mismatch on {}",hex::encode(raw));
        }
        let adr_control = AdrControl(raw[0]);
        let data = match adr_control.adr() {
            1 => Q::position_data(&raw),
            _ => QData::Raw(raw[1..10].try_into().expect("slice length")),
        };
        Q { adr_control, data, crc_ok }
    }
    fn position_data(raw: &[u8;12]) -> QData {
        let fields = (
            Bcd::from_bcd(raw[1]),
            Bcd::from_bcd(raw[2]),
            Bcd::from_bcd(raw[3]),Bcd::from_bcd(raw[4]),Bcd::from_bcd(raw[5]),
            Bcd::from_bcd(raw[7]),Bcd::from_bcd(raw[8]),Bcd::from_bcd(raw[9])
        );
        match fields {
            (Some(track),Some(index),Some(m),Some(s),Some(f),Some(am),Some(asec),Some(af)) => {
                QData::Position {
                    track,
                    index,
                    track_msf: Msf(m,s,f),
                    disc_msf: Msf(am,asec,af)
                }
            },
            _ => {
                debug!("subchannel Q has non-BCD position fields");
                QData::Raw(raw[1..10].try_into().expect("slice length"))
            }
        }
    }
    /// Raw 12-byte representation with a freshly computed CRC.
    pub fn to_raw(&self) -> [u8;12] {
        let mut raw = [0u8;12];
        raw[0] = self.adr_control.0;
        match self.data {
            QData::Position { track, index, track_msf, disc_msf } => {
                raw[1] = track.bcd();
                raw[2] = index.bcd();
                raw[3] = track_msf.0.bcd();
                raw[4] = track_msf.1.bcd();
                raw[5] = track_msf.2.bcd();
                raw[7] = disc_msf.0.bcd();
                raw[8] = disc_msf.1.bcd();
                raw[9] = disc_msf.2.bcd();
            },
            QData::Raw(data) => {
                raw[1..10].copy_from_slice(&data);
            }
        }
        let crc = crc::crc16(&raw[0..10]) ^ 0xffff;
        raw[10] = (crc >> 8) as u8;
        raw[11] = crc as u8;
        raw
    }
}

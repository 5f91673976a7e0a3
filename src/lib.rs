//! # `cdkit` main library
//!
//! This library encodes and decodes the physical bitstream of a Red Book
//! compact disc: the CIRC error-control interleave and the EFM line code
//! that sit between 2352-byte sectors and the channel levels actually
//! pressed into the disc.
//!
//! ## Architecture
//!
//! The encode path is a push pipeline.  `circ::CircEncoder` takes sectors
//! (plus optional 96-byte subchannel blocks), applies the C2 and C1
//! Reed-Solomon codes through the interleave delays, and emits 33-symbol
//! lines into anything implementing `sink::SymbolSink` — normally
//! `sink::EfmSink`, which modulates symbols to 14-bit channel words with
//! merge bits, frame sync and NRZ-I, or `sink::RawSink` for the
//! pre-modulation byte format.
//!
//! The decode path lives in `decoder`: it reverses every stage and reports
//! what it finds (syndromes, errata positions, CRC results) rather than
//! silently fixing anything.
//!
//! Everything below those two sits in leaf modules: `gf` and `rs` for the
//! field and code arithmetic, `efm` for the modulation tables, `msf` and
//! `crc` and `subchannel` for the timecode and control data, `scramble` for
//! the data-sector scrambler, `patterns` for test and pregap synthesis.
//!
//! Set the RUST_LOG environment variable to control logging level.

pub mod gf;
pub mod rs;
pub mod efm;
pub mod sink;
pub mod msf;
pub mod crc;
pub mod subchannel;
pub mod scramble;
pub mod circ;
pub mod decoder;
pub mod patterns;
pub mod commands;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// bytes in one sector of user data
pub const SECTOR_BYTES: usize = 2352;
/// subchannel bytes accompanying one sector
pub const SUB_BYTES: usize = 96;

/// Read a file of raw sectors, checking that the size is a whole number of
/// sectors, and return (data, sector count).
pub fn read_raw_sectors(path: &str) -> Result<(Vec<u8>,usize),DYNERR> {
    let data = std::fs::read(path)?;
    if data.len()==0 || data.len() % SECTOR_BYTES != 0 {
        log::error!("{} is not a whole number of {}-byte sectors",path,SECTOR_BYTES);
        return Err(Box::new(commands::CommandError::UnsupportedFormat));
    }
    let count = data.len() / SECTOR_BYTES;
    Ok((data,count))
}

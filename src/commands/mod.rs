//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.  The encoder and decoder
//! proper live in the library; these modules only move bytes between files
//! and the codec.

pub mod encode;
pub mod analyze;
pub mod parsecsv;
pub mod mkraw;

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("One of the parameters was out of range")]
    OutOfRange,
    #[error("Input source is not supported")]
    UnsupportedFormat,
    #[error("Test pattern is unknown")]
    UnknownPattern,
    #[error("File not found")]
    FileNotFound
}

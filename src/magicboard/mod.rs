//! Magic board test sequences.
//!
//! The magic board is a test fixture whose serial register routes
//! controller outputs to inputs. It is programmed one bit at a time
//! through the `BitLevel` parameter. This module builds the register
//! bitstrings and the canned load/configure/expose sequences that use
//! them.

mod bits;
mod sequence;

pub use bits::{make_bitstring, BoardElement, Identifier};
pub use sequence::{magicboard, run, write_bits, MagicboardRun, RunOptions};

use thiserror::Error;

/// Errors from building or writing register bitstrings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Not one of driver, dnl, hvlc, hvhc, adc or null.
    #[error("unrecognized board element '{0}'")]
    UnknownElement(String),
    /// Not of the form `NAME,CHANNEL`.
    #[error("invalid identifier '{0}' (expected NAME,CHANNEL)")]
    InvalidIdentifier(String),
    /// A bitstring character other than `0` or `1`.
    #[error("invalid bit '{0}' in bitstring")]
    InvalidBit(char),
}

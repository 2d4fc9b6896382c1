//! Serial-register bitstrings.

use super::BoardError;
use std::fmt;
use std::str::FromStr;

/// A routable element on the magic board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardElement {
    /// Clock driver output, 24 channels.
    Driver,
    /// Differential non-linearity source.
    Dnl,
    /// High-voltage low-current bias, 24 channels.
    Hvlc,
    /// High-voltage high-current bias, 6 channels.
    Hvhc,
    /// ADC input, 16 channels.
    Adc,
    /// No connection.
    Null,
}

impl FromStr for BoardElement {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driver" => Ok(Self::Driver),
            "dnl" => Ok(Self::Dnl),
            "hvlc" => Ok(Self::Hvlc),
            "hvhc" => Ok(Self::Hvhc),
            "adc" => Ok(Self::Adc),
            "null" => Ok(Self::Null),
            _ => Err(BoardError::UnknownElement(s.to_string())),
        }
    }
}

impl fmt::Display for BoardElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Driver => "driver",
            Self::Dnl => "dnl",
            Self::Hvlc => "hvlc",
            Self::Hvhc => "hvhc",
            Self::Adc => "adc",
            Self::Null => "null",
        })
    }
}

/// An element and channel, e.g. `driver,3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    /// Board element.
    pub element: BoardElement,
    /// Channel number; wraps per element.
    pub channel: u32,
}

impl Identifier {
    /// Creates an identifier.
    pub fn new(element: BoardElement, channel: u32) -> Self {
        Self { element, channel }
    }
}

impl FromStr for Identifier {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, channel) = s
            .split_once(',')
            .ok_or_else(|| BoardError::InvalidIdentifier(s.to_string()))?;
        let channel = channel
            .trim()
            .parse()
            .map_err(|_| BoardError::InvalidIdentifier(s.to_string()))?;
        Ok(Self::new(name.parse()?, channel))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.element, self.channel)
    }
}

/// Register bitstring for an identifier, most significant bit first.
///
/// Channel numbers wrap at the number of channels the element has.
pub fn make_bitstring(id: Identifier) -> String {
    let chan = id.channel;
    match id.element {
        BoardElement::Driver => format!("{:06b}", chan % 24),
        BoardElement::Dnl => format!("{:06b}", 24),
        BoardElement::Hvlc => format!("{:06b}", 32 + chan % 24),
        BoardElement::Hvhc => format!("{:06b}", 56 + chan % 6),
        BoardElement::Adc => format!("{:016b}", 1u32 << (chan % 16)),
        BoardElement::Null if chan == 16 => format!("{:016b}", 0),
        BoardElement::Null => format!("{:06b}", 25),
    }
}

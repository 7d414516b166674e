//! `$FALADATA` status frame encoding and decoding.
//!
//! Frame format (ASCII, `;` separated, newline terminated):
//! - `$FALADATA` marker
//! - channel count (always 8)
//! - trigger pin (channel index of the lowest trigger mask bit, 0 if none)
//! - trigger mask
//! - edge flag: `N` (no edge trigger), `R` (rising), `F` (falling)
//! - effective sample rate in Hz (frequency × oversampling)
//! - number of samples available
//! - number of samples captured before the trigger
//!
//! Every field, including the last, is followed by `;`.

use core::fmt::Write;
use core::str::FromStr;

use heapless::String;

use crate::{CHANNEL_COUNT, CHUNK_SIZE};

/// Frame marker
pub const STATUS_PREFIX: &str = "$FALADATA";

/// Maximum encoded frame size; a frame must fit one transport packet
pub const STATUS_FRAME_MAX: usize = CHUNK_SIZE;

/// Errors that can occur while encoding or parsing a status frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusError {
    /// Encoded frame does not fit in [`STATUS_FRAME_MAX`] bytes
    BufferTooSmall,
    /// Line does not start with the `$FALADATA` marker
    MissingPrefix,
    /// Line is not newline terminated
    Unterminated,
    /// Wrong number of fields
    FieldCount,
    /// A numeric field failed to parse
    InvalidNumber,
    /// Unknown edge flag character
    InvalidEdge,
}

/// Edge trigger flag reported in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeFlag {
    /// Level trigger or no trigger configured
    #[default]
    None,
    /// Trigger on the transition into the pattern with pattern bits high
    Rising,
    /// Trigger on the transition into the pattern with pattern bits low
    Falling,
}

impl EdgeFlag {
    /// Wire character for this flag
    pub fn as_char(self) -> char {
        match self {
            EdgeFlag::None => 'N',
            EdgeFlag::Rising => 'R',
            EdgeFlag::Falling => 'F',
        }
    }

    /// Decode a wire character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'N' => Some(EdgeFlag::None),
            'R' => Some(EdgeFlag::Rising),
            'F' => Some(EdgeFlag::Falling),
            _ => None,
        }
    }
}

/// Snapshot of the capture announced to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFrame {
    /// Number of channels per sample
    pub channels: u8,
    /// Trigger channel index
    pub trigger_pin: u8,
    /// Trigger channel mask
    pub trigger_mask: u8,
    /// Edge trigger flag
    pub edge: EdgeFlag,
    /// Effective sample rate in Hz
    pub rate_hz: u32,
    /// Samples available for a dump
    pub samples: u32,
    /// Samples captured before the trigger point
    pub pre_trigger: u32,
}

impl StatusFrame {
    /// Frame for an untriggered capture
    pub fn untriggered(rate_hz: u32, samples: u32) -> Self {
        Self {
            channels: CHANNEL_COUNT,
            trigger_pin: 0,
            trigger_mask: 0,
            edge: EdgeFlag::None,
            rate_hz,
            samples,
            pre_trigger: 0,
        }
    }

    /// Encode this frame into a fixed-capacity string
    pub fn encode(&self) -> Result<String<STATUS_FRAME_MAX>, StatusError> {
        let mut line = String::new();
        writeln!(
            line,
            "{};{};{};{};{};{};{};{};",
            STATUS_PREFIX,
            self.channels,
            self.trigger_pin,
            self.trigger_mask,
            self.edge.as_char(),
            self.rate_hz,
            self.samples,
            self.pre_trigger
        )
        .map_err(|_| StatusError::BufferTooSmall)?;
        Ok(line)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode_into(&self, buffer: &mut [u8]) -> Result<usize, StatusError> {
        let line = self.encode()?;
        let bytes = line.as_bytes();
        if buffer.len() < bytes.len() {
            return Err(StatusError::BufferTooSmall);
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Parse a complete, newline-terminated frame
    pub fn parse(line: &str) -> Result<Self, StatusError> {
        let body = line.strip_suffix('\n').ok_or(StatusError::Unterminated)?;
        let body = body.strip_suffix('\r').unwrap_or(body);

        let mut fields = body.split(';');
        if fields.next() != Some(STATUS_PREFIX) {
            return Err(StatusError::MissingPrefix);
        }

        let channels = number(fields.next())?;
        let trigger_pin = number(fields.next())?;
        let trigger_mask = number(fields.next())?;
        let edge = {
            let field = fields.next().ok_or(StatusError::FieldCount)?;
            let mut chars = field.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => EdgeFlag::from_char(c).ok_or(StatusError::InvalidEdge)?,
                _ => return Err(StatusError::InvalidEdge),
            }
        };
        let rate_hz = number(fields.next())?;
        let samples = number(fields.next())?;
        let pre_trigger = number(fields.next())?;

        // Trailing `;` leaves one empty field and nothing after it
        if fields.next() != Some("") || fields.next().is_some() {
            return Err(StatusError::FieldCount);
        }

        Ok(Self {
            channels,
            trigger_pin,
            trigger_mask,
            edge,
            rate_hz,
            samples,
            pre_trigger,
        })
    }
}

fn number<T: FromStr>(field: Option<&str>) -> Result<T, StatusError> {
    field
        .ok_or(StatusError::FieldCount)?
        .parse()
        .map_err(|_| StatusError::InvalidNumber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_untriggered() {
        let frame = StatusFrame::untriggered(8_000_000, 131_072);
        let line = frame.encode().unwrap();
        assert_eq!(line.as_str(), "$FALADATA;8;0;0;N;8000000;131072;0;\n");
    }

    #[test]
    fn test_encode_empty_capture() {
        let frame = StatusFrame::untriggered(8_000_000, 0);
        assert_eq!(
            frame.encode().unwrap().as_str(),
            "$FALADATA;8;0;0;N;8000000;0;0;\n"
        );
    }

    #[test]
    fn test_encode_into_reports_length() {
        let frame = StatusFrame::untriggered(1000, 10);
        let mut buffer = [0u8; STATUS_FRAME_MAX];
        let len = frame.encode_into(&mut buffer).unwrap();
        assert_eq!(&buffer[..len], b"$FALADATA;8;0;0;N;1000;10;0;\n");

        let mut tiny = [0u8; 8];
        assert_eq!(frame.encode_into(&mut tiny), Err(StatusError::BufferTooSmall));
    }

    #[test]
    fn test_largest_frame_fits_one_packet() {
        let frame = StatusFrame {
            channels: u8::MAX,
            trigger_pin: u8::MAX,
            trigger_mask: u8::MAX,
            edge: EdgeFlag::Falling,
            rate_hz: u32::MAX,
            samples: u32::MAX,
            pre_trigger: u32::MAX,
        };
        let line = frame.encode().unwrap();
        assert!(line.len() <= STATUS_FRAME_MAX);
    }

    #[test]
    fn test_parse_triggered_frame() {
        let frame = StatusFrame::parse("$FALADATA;8;3;8;R;1000000;4096;1024;\n").unwrap();
        assert_eq!(frame.trigger_pin, 3);
        assert_eq!(frame.trigger_mask, 8);
        assert_eq!(frame.edge, EdgeFlag::Rising);
        assert_eq!(frame.rate_hz, 1_000_000);
        assert_eq!(frame.samples, 4096);
        assert_eq!(frame.pre_trigger, 1024);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            StatusFrame::parse("$FALADATA;8;0;0;N;1;2;3;"),
            Err(StatusError::Unterminated)
        );
        assert_eq!(
            StatusFrame::parse("$SUMP;8;0;0;N;1;2;3;\n"),
            Err(StatusError::MissingPrefix)
        );
        assert_eq!(
            StatusFrame::parse("$FALADATA;8;0;0;N;1;2;\n"),
            Err(StatusError::InvalidNumber)
        );
        assert_eq!(
            StatusFrame::parse("$FALADATA;8;0;0;X;1;2;3;\n"),
            Err(StatusError::InvalidEdge)
        );
        assert_eq!(
            StatusFrame::parse("$FALADATA;8;0;0;N;1;2;3;4;\n"),
            Err(StatusError::FieldCount)
        );
    }

    proptest! {
        #[test]
        fn prop_any_frame_fits_one_packet(
            rate in any::<u32>(),
            samples in any::<u32>(),
            pre in any::<u32>(),
            mask in any::<u8>(),
        ) {
            let frame = StatusFrame {
                channels: CHANNEL_COUNT,
                trigger_pin: mask.trailing_zeros().min(7) as u8,
                trigger_mask: mask,
                edge: EdgeFlag::Rising,
                rate_hz: rate,
                samples,
                pre_trigger: pre,
            };
            let line = frame.encode().unwrap();
            prop_assert!(line.len() <= STATUS_FRAME_MAX);
            prop_assert!(line.ends_with('\n'));
        }
    }
}

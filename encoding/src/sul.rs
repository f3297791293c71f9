//! The storage unit label: the fixed 80-byte ASCII prelude of every
//! storage unit.

use crate::visible::{MAX_RECORD_LENGTH, MIN_RECORD_LENGTH};
use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

/// Module-level error type:
/// for errors which may occur while emitting the storage unit label.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The sequence number does not fit its four-character field.
    #[snafu(display("Sequence number {} does not fit 4 characters", value))]
    SequenceOutOfRange {
        /// The offending sequence number.
        value: u32,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The maximum record length is outside the allowed range.
    #[snafu(display(
        "Maximum record length {} is outside the allowed 20..=16384 range",
        value
    ))]
    MaxLengthOutOfRange {
        /// The offending configuration value.
        value: u16,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The storage set identifier does not fit its field or is not ASCII.
    #[snafu(display("Storage set identifier must be at most 60 ASCII characters"))]
    BadIdentifier {
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The sink rejected the bytes.
    #[snafu(display("Failed to write the storage unit label"))]
    WriteLabel {
        /// Backtrace of the failure site.
        backtrace: Backtrace,
        /// The underlying I/O error.
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The storage unit label: sequence number, format version, structure code,
/// record length ceiling and storage set identifier, laid out in 80
/// space-padded ASCII bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUnitLabel {
    /// The storage unit sequence number, 1 for a single-unit set.
    pub sequence_number: u32,
    /// The maximum visible record length, also echoed in every packer.
    pub max_record_length: u16,
    /// The storage set identifier, at most 60 ASCII characters.
    pub storage_set_id: String,
}

impl StorageUnitLabel {
    /// The fixed byte length of a storage unit label.
    pub const LENGTH: usize = 80;

    /// Create a label with the given identifier and the default framing.
    pub fn new<T: Into<String>>(storage_set_id: T) -> Self {
        StorageUnitLabel {
            storage_set_id: storage_set_id.into(),
            ..StorageUnitLabel::default()
        }
    }

    /// Render the label into its fixed 80-byte form.
    pub fn to_bytes(&self) -> Result<[u8; Self::LENGTH]> {
        ensure!(
            self.sequence_number <= 9_999,
            SequenceOutOfRangeSnafu {
                value: self.sequence_number,
            }
        );
        ensure!(
            (MIN_RECORD_LENGTH..=MAX_RECORD_LENGTH).contains(&self.max_record_length),
            MaxLengthOutOfRangeSnafu {
                value: self.max_record_length,
            }
        );
        ensure!(
            self.storage_set_id.len() <= 60
                && self
                    .storage_set_id
                    .bytes()
                    .all(|b| (0x20..=0x7E).contains(&b)),
            BadIdentifierSnafu
        );
        let rendered = format!(
            "{:>4}V1.00RECORD{:05}{:<60}",
            self.sequence_number, self.max_record_length, self.storage_set_id
        );
        let mut label = [0_u8; Self::LENGTH];
        label.copy_from_slice(rendered.as_bytes());
        Ok(label)
    }

    /// Write the label to the given sink, returning the number of bytes.
    pub fn write<W>(&self, mut to: W) -> Result<usize>
    where
        W: Write,
    {
        let label = self.to_bytes()?;
        to.write_all(&label).context(WriteLabelSnafu)?;
        Ok(Self::LENGTH)
    }
}

impl Default for StorageUnitLabel {
    fn default() -> Self {
        StorageUnitLabel {
            sequence_number: 1,
            max_record_length: crate::visible::DEFAULT_RECORD_LENGTH,
            storage_set_id: String::from("DEFAULT STORAGE SET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_layout() {
        let sul = StorageUnitLabel {
            sequence_number: 1,
            max_record_length: 8_192,
            storage_set_id: "MY STORAGE SET".into(),
        };
        let bytes = sul.to_bytes().unwrap();
        assert_eq!(bytes.len(), 80);
        assert_eq!(&bytes[..4], b"   1");
        assert_eq!(&bytes[4..9], b"V1.00");
        assert_eq!(&bytes[9..15], b"RECORD");
        assert_eq!(&bytes[15..20], b"08192");
        assert_eq!(&bytes[20..34], b"MY STORAGE SET");
        assert!(bytes[34..].iter().all(|b| *b == b' '));
    }

    #[test]
    fn bounds_are_validated() {
        let mut sul = StorageUnitLabel::new("X");
        sul.sequence_number = 10_000;
        assert!(matches!(
            sul.to_bytes(),
            Err(Error::SequenceOutOfRange { .. })
        ));

        let mut sul = StorageUnitLabel::new("X");
        sul.max_record_length = 16_385;
        assert!(matches!(
            sul.to_bytes(),
            Err(Error::MaxLengthOutOfRange { .. })
        ));

        let sul = StorageUnitLabel::new("y".repeat(61));
        assert!(matches!(sul.to_bytes(), Err(Error::BadIdentifier { .. })));

        let sul = StorageUnitLabel::new("caf\u{e9}");
        assert!(sul.to_bytes().is_err());
    }

    #[test]
    fn write_counts_bytes() {
        let mut out = vec![];
        let n = StorageUnitLabel::default().write(&mut out).unwrap();
        assert_eq!(n, 80);
        assert_eq!(out.len(), 80);
    }
}

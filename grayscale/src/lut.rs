//! Look-up table (LUT) implementation and decoding functions.
//!
//! This module contains the [`LookupTable`] data type,
//! built from a DICOM LUT attribute group:
//! the three values of the _LUT Descriptor_
//! describe the format of the entries held by _LUT Data_.
//! The same format is shared by the Modality LUT,
//! the VOI LUT and the Presentation LUT.
//!
//! Decoding follows what is found in the wild
//! rather than only what the standard allows.
//! In particular, some implementations encode 8-bit entries
//! with 16 bits allocated per entry, padding the high bits,
//! which is recovered here.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use dicom_core::value::PrimitiveValue;
use dicom_core::DataDictionary;
use dicom_encoding::transfer_syntax::Endianness;
use snafu::{ensure, OptionExt, Snafu};

use crate::attribute::DataSet;
use crate::tags;

/// The number of entries implied by a first descriptor value of 0.
pub const MAX_LUT_ENTRIES: u32 = 65536;

/// The LUT could not be read from the given attributes.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[non_exhaustive]
pub enum ReadLutError {
    /// Missing LUT Descriptor
    MissingDescriptor,
    /// Illegal number of LUT Descriptor values {len}
    DescriptorLength { len: usize },
    /// Missing LUT Data
    MissingData,
    /// Illegal number of bits for each entry in the LUT Data: {bits}
    InvalidBitsPerEntry { bits: i32 },
    /// LUT Data of {len} bytes cannot hold {entries} 16-bit entries
    UnexpectedDataLength { len: usize, entries: u32 },
}

/// A structural inconsistency found in a LUT
/// which could nevertheless be built.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LutIssue {
    /// The number of samples differs from the descriptor's entry count.
    LengthMismatch { data_length: usize, entry_count: u32 },
    /// There are more samples than `bits_per_entry` can address.
    LengthExceedsBits { data_length: usize, bits_per_entry: u16 },
    /// A sample is larger than `bits_per_entry` allows.
    SampleOutOfRange {
        index: usize,
        value: i32,
        bits_per_entry: u16,
    },
}

impl std::fmt::Display for LutIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LutIssue::LengthMismatch {
                data_length,
                entry_count,
            } => write!(
                f,
                "LUT Data length {} mismatch number of entries {} in LUT Descriptor",
                data_length, entry_count
            ),
            LutIssue::LengthExceedsBits {
                data_length,
                bits_per_entry,
            } => write!(
                f,
                "Illegal LUT Data length {} with respect to the number of bits in LUT Descriptor {}",
                data_length, bits_per_entry
            ),
            LutIssue::SampleOutOfRange {
                index,
                value,
                bits_per_entry,
            } => write!(
                f,
                "LUT entry #{} = {} does not fit in {} bits",
                index, value, bits_per_entry
            ),
        }
    }
}

/// The raw content of a _LUT Data_ attribute.
///
/// Byte strings (OB) keep the byte order of the data set,
/// whereas 16-bit words (US, SS, OW) are already in native form.
#[derive(Debug, Clone, PartialEq)]
pub enum LutPayload {
    /// 8-bit values, as stored
    Bytes(Vec<u8>),
    /// 16-bit values
    Words(Vec<u16>),
}

impl LutPayload {
    /// Interpret a primitive value as LUT data.
    ///
    /// Returns `None` if the value is empty
    /// or cannot be read as a list of integers.
    pub fn from_value(value: &PrimitiveValue) -> Option<Self> {
        match value {
            PrimitiveValue::Empty => None,
            PrimitiveValue::U8(bytes) => Some(LutPayload::Bytes(bytes.to_vec())),
            PrimitiveValue::U16(words) => Some(LutPayload::Words(words.to_vec())),
            PrimitiveValue::I16(words) => Some(LutPayload::Words(
                words.iter().map(|&w| w as u16).collect(),
            )),
            other => other
                .to_multi_int::<i32>()
                .ok()
                .map(|values| LutPayload::Words(values.into_iter().map(|v| v as u16).collect())),
        }
    }

    /// The data as a byte string.
    /// Words are serialized in the given byte order.
    pub fn to_bytes(&self, byte_order: Endianness) -> Vec<u8> {
        match self {
            LutPayload::Bytes(bytes) => bytes.clone(),
            LutPayload::Words(words) => {
                let mut out = vec![0; words.len() * 2];
                match byte_order {
                    Endianness::Little => LittleEndian::write_u16_into(words, &mut out),
                    Endianness::Big => BigEndian::write_u16_into(words, &mut out),
                }
                out
            }
        }
    }

    /// The data as 16-bit words.
    /// Bytes are paired in the given byte order,
    /// a trailing odd byte is ignored.
    pub fn to_words(&self, byte_order: Endianness) -> Vec<u16> {
        match self {
            LutPayload::Words(words) => words.clone(),
            LutPayload::Bytes(bytes) => {
                let mut out = vec![0; bytes.len() / 2];
                let src = &bytes[..out.len() * 2];
                match byte_order {
                    Endianness::Little => LittleEndian::read_u16_into(src, &mut out),
                    Endianness::Big => BigEndian::read_u16_into(src, &mut out),
                }
                out
            }
        }
    }
}

/// A look up table decoded from a DICOM LUT attribute group.
///
/// The first sample maps the input value `offset`,
/// the following ones map consecutive input values.
///
/// # Example
///
/// ```
/// # use dicom_grayscale::lut::{LookupTable, LutPayload, ReadLutError};
/// # use dicom_encoding::transfer_syntax::Endianness;
/// // 4 entries starting at -2, 8 bits each
/// let data = LutPayload::Bytes(vec![0, 10, 20, 30]);
/// let lut = LookupTable::from_parts(&[4, 0xFE, 8], Some(&data), Endianness::Little, false)?;
///
/// assert_eq!(lut.offset(), -2);
/// assert_eq!(lut.lookup(-1), Some(10));
/// // values outside of the domain are clamped
/// assert_eq!(lut.lookup(100), Some(30));
/// # Result::<(), ReadLutError>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    /// the input value mapped by the first entry
    offset: i32,
    /// the number of entries declared in the descriptor
    entry_count: u32,
    /// the number of bits of each entry
    bits_per_entry: u16,
    /// the table entries
    samples: Vec<i32>,
    /// whether 16-bit entries are interpreted as signed
    signed: bool,
}

impl LookupTable {
    /// Read a LUT from a data set item
    /// containing the _LUT Descriptor_ and _LUT Data_ attributes.
    ///
    /// `signed` tells whether 16-bit entries are signed,
    /// as specified by the pixel representation of the stage input.
    pub fn from_item<D>(item: &DataSet<'_, D>, signed: bool) -> Result<Self, ReadLutError>
    where
        D: DataDictionary + Clone,
    {
        let descriptor = item
            .ints(tags::LUT_DESCRIPTOR)
            .context(MissingDescriptorSnafu)?;
        let payload = item
            .primitive(tags::LUT_DATA)
            .and_then(LutPayload::from_value);
        Self::from_parts(&descriptor, payload.as_ref(), item.byte_order(), signed)
    }

    /// Build a LUT from the three descriptor values
    /// and the raw LUT data.
    pub fn from_parts(
        descriptor: &[i32],
        data: Option<&LutPayload>,
        byte_order: Endianness,
        signed: bool,
    ) -> Result<Self, ReadLutError> {
        ensure!(
            descriptor.len() == 3,
            DescriptorLengthSnafu {
                len: descriptor.len()
            }
        );

        // first value: number of entries, 0 means 2^16
        let entry_count = match descriptor[0] {
            0 => MAX_LUT_ENTRIES,
            // encoded as SS
            n if n < 0 => n as u16 as u32,
            n => n as u32,
        };

        // second value: first input value mapped,
        // reinterpreted as signed to recover negative values
        let offset = if entry_count <= 256 {
            descriptor[1] as i8 as i32
        } else if entry_count <= MAX_LUT_ENTRIES {
            descriptor[1] as i16 as i32
        } else {
            descriptor[1]
        };

        // third value: number of bits per entry
        let bits = descriptor[2];
        let data = data.context(MissingDataSnafu)?;

        let samples: Vec<i32> = match bits {
            1..=8 => {
                let bytes = data.to_bytes(byte_order);
                let bytes = if is_padded(bytes.len(), entry_count) {
                    unpad(&bytes, entry_count, byte_order)
                } else {
                    bytes
                };
                bytes.into_iter().map(i32::from).collect()
            }
            9..=16 if entry_count <= 256 => {
                let bytes = data.to_bytes(byte_order);
                ensure!(
                    is_padded(bytes.len(), entry_count),
                    UnexpectedDataLengthSnafu {
                        len: bytes.len(),
                        entries: entry_count,
                    }
                );
                unpad(&bytes, entry_count, byte_order)
                    .into_iter()
                    .map(i32::from)
                    .collect()
            }
            9..=16 => data
                .to_words(byte_order)
                .into_iter()
                .map(|w| if signed { w as i16 as i32 } else { w as i32 })
                .collect(),
            _ => return InvalidBitsPerEntrySnafu { bits }.fail(),
        };

        Ok(LookupTable {
            offset,
            entry_count,
            bits_per_entry: bits as u16,
            samples,
            signed,
        })
    }

    /// The input value mapped by the first entry.
    #[inline]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// The number of entries declared by the LUT descriptor.
    #[inline]
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// The number of bits of each entry.
    #[inline]
    pub fn bits_per_entry(&self) -> u16 {
        self.bits_per_entry
    }

    /// Whether 16-bit entries were interpreted as signed.
    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The table entries.
    #[inline]
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// Check whether an input value is within the domain of the table.
    pub fn contains(&self, value: i32) -> bool {
        let index = value as i64 - self.offset as i64;
        index >= 0 && index < self.samples.len() as i64
    }

    /// Apply the table to a single input value.
    ///
    /// Values outside of the domain are clamped to the first or last entry.
    /// Returns `None` only if the table is empty.
    pub fn lookup(&self, value: i32) -> Option<i32> {
        let last = self.samples.len().checked_sub(1)?;
        let index = (value as i64 - self.offset as i64).clamp(0, last as i64);
        self.samples.get(index as usize).copied()
    }

    /// Report how this table deviates from its descriptor.
    pub fn issues(&self) -> Vec<LutIssue> {
        let mut issues = Vec::new();
        let data_length = self.samples.len();
        if data_length != self.entry_count as usize {
            issues.push(LutIssue::LengthMismatch {
                data_length,
                entry_count: self.entry_count,
            });
        }
        let capacity = 1_i64 << self.bits_per_entry;
        if data_length as i64 > capacity {
            issues.push(LutIssue::LengthExceedsBits {
                data_length,
                bits_per_entry: self.bits_per_entry,
            });
        }
        if let Some((index, &value)) = self
            .samples
            .iter()
            .enumerate()
            .find(|(_, v)| (**v as i64).abs() > capacity)
        {
            issues.push(LutIssue::SampleOutOfRange {
                index,
                value,
                bits_per_entry: self.bits_per_entry,
            });
        }
        issues
    }
}

/// Whether the data holds exactly one 16-bit slot per entry
/// of a table with at most 256 entries.
#[inline]
fn is_padded(byte_length: usize, entry_count: u32) -> bool {
    entry_count <= 256 && byte_length == (entry_count as usize) << 1
}

/// Extract the significant byte of each 16-bit slot.
fn unpad(bytes: &[u8], entry_count: u32, byte_order: Endianness) -> Vec<u8> {
    let shift = match byte_order {
        Endianness::Little => 0,
        Endianness::Big => 1,
    };
    (0..entry_count as usize)
        .map(|i| bytes[(i << 1) + shift])
        .collect()
}

//! The metadata footer duckdb expects at the end of a loadable extension.
//!
//! The footer is a WebAssembly custom section named `duckdb_signature`, so the
//! same layout works for native libraries and wasm modules. It holds eight
//! fixed-width fields followed by a signature. duckdb reads the fields in
//! reverse, so `metadata_version` is the last field before the signature.

use std::io::{self, Write};

use bytemuck::{Pod, Zeroable};
use gimli::leb128::write as leb128;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

pub const FIELD_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 256;

const SECTION_NAME: &[u8] = b"duckdb_signature";
const CUSTOM_SECTION_ID: u8 = 0;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("value is {len} bytes, fields hold at most 32")]
    FieldTooLong { len: usize },

    #[error("footer needs {expected} bytes, got {actual}")]
    FooterTooShort { expected: usize, actual: usize },

    #[error("footer does not start with a `duckdb_signature` section")]
    InvalidSectionHeader,

    #[error("{value:?} is not a known extension ABI type, expected one of: {expected}")]
    UnknownAbiType { value: String, expected: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
pub enum ExtensionAbiType {
    /// Entry points `{name}_init(DatabaseInstance&)` and `{name}_version()`.
    #[strum(serialize = "CPP")]
    Cpp,
    #[strum(serialize = "C_STRUCT")]
    CStruct,
}

impl ExtensionAbiType {
    pub fn parse(value: &str) -> Result<Self, Error> {
        value.parse().map_err(|_| Error::UnknownAbiType {
            value: value.to_string(),
            expected: Self::iter()
                .map(|it| it.as_ref().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct MetadataFields {
    pub meta_8: [u8; FIELD_LEN],
    pub meta_7: [u8; FIELD_LEN],
    pub meta_6: [u8; FIELD_LEN],
    pub extension_abi_type: [u8; FIELD_LEN],
    pub extension_version: [u8; FIELD_LEN],
    pub duckdb_version: [u8; FIELD_LEN],
    pub platform: [u8; FIELD_LEN],
    pub metadata_version: [u8; FIELD_LEN],
    pub signature: [u8; SIGNATURE_LEN],
}

impl MetadataFields {
    pub const ENCODED_LEN: usize = std::mem::size_of::<MetadataFields>();

    pub fn footer_len() -> Result<usize, Error> {
        Ok(section_header()?.len() + Self::ENCODED_LEN)
    }

    pub fn write(&self, output: &mut impl Write) -> Result<(), Error> {
        output.write_all(&section_header()?)?;
        output.write_all(bytemuck::bytes_of(self))?;

        Ok(())
    }

    /// Decodes the footer from the tail of `bytes`.
    pub fn from_footer(bytes: &[u8]) -> Result<Self, Error> {
        let header = section_header()?;
        let expected = header.len() + Self::ENCODED_LEN;
        if bytes.len() < expected {
            return Err(Error::FooterTooShort {
                expected,
                actual: bytes.len(),
            });
        }

        let footer = &bytes[bytes.len() - expected..];
        let (found_header, fields) = footer.split_at(header.len());
        if found_header != header.as_slice() {
            return Err(Error::InvalidSectionHeader);
        }

        Ok(bytemuck::pod_read_unaligned(fields))
    }
}

/// Pads `value` with NUL bytes to a full field.
pub fn pad_32(value: &[u8]) -> Result<[u8; FIELD_LEN], Error> {
    if value.len() > FIELD_LEN {
        return Err(Error::FieldTooLong { len: value.len() });
    }

    let mut field = [0; FIELD_LEN];
    field[..value.len()].copy_from_slice(value);

    Ok(field)
}

/// Reads a padded field back, stopping at the first NUL.
pub fn field_str(field: &[u8; FIELD_LEN]) -> Option<&str> {
    let len = field.iter().position(|it| *it == 0).unwrap_or(FIELD_LEN);
    std::str::from_utf8(&field[..len]).ok()
}

fn section_header() -> Result<Vec<u8>, Error> {
    let mut fields_len = Vec::new();
    leb128::unsigned(&mut fields_len, MetadataFields::ENCODED_LEN as u64)?;

    let payload_len = 1 + SECTION_NAME.len() + fields_len.len() + MetadataFields::ENCODED_LEN;

    let mut header = vec![CUSTOM_SECTION_ID];
    leb128::unsigned(&mut header, payload_len as u64)?;
    header.push(SECTION_NAME.len() as u8);
    header.extend_from_slice(SECTION_NAME);
    header.extend_from_slice(&fields_len);

    Ok(header)
}

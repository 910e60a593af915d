//! Container header structures, serialization, and validating parsers.
//!
//! Parsers validate magic and version before any other field, then check the
//! structural invariants: table lengths against the declared chunk count,
//! chunk offsets strictly increasing, the first offset landing exactly after
//! the header, and every offset inside the container.

use crate::{Error, Result};

use super::{
    CHUNKED_HEADER_BASE_SIZE, CHUNKED_MAGIC, FORMAT_VERSION, PLAIN_HEADER_SIZE, PLAIN_MAGIC,
};

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Checks the version byte against the highest version this build decodes.
fn check_version(version: u8) -> Result<()> {
    if version > FORMAT_VERSION {
        return Err(Error::UnsupportedVersion {
            version,
            highest: FORMAT_VERSION,
        });
    }
    Ok(())
}

/// Header of a plain (single-payload) container.
///
/// The payload that follows is the bit-stream output of one coder pass over
/// the whole token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainHeader {
    /// Length of the original text in bytes.
    pub original_len: u32,
    /// Number of tokens in the coded stream.
    pub token_count: u32,
    /// Hash identifying the model that produced the probabilities.
    pub model_hash: u32,
}

impl PlainHeader {
    /// Serializes the header to its fixed 25-byte layout.
    pub fn serialize(&self) -> [u8; PLAIN_HEADER_SIZE] {
        let mut out = [0u8; PLAIN_HEADER_SIZE];
        out[0..4].copy_from_slice(&PLAIN_MAGIC);
        out[4] = FORMAT_VERSION;
        out[5..9].copy_from_slice(&self.original_len.to_le_bytes());
        out[9..13].copy_from_slice(&self.token_count.to_le_bytes());
        out[13..17].copy_from_slice(&self.model_hash.to_le_bytes());
        // Bytes 17..25 are reserved and stay zero.
        out
    }

    /// Parses and validates a plain header from the start of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The magic does not match the plain container
    /// - The version is newer than this build supports
    /// - The buffer is shorter than the fixed header
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 || bytes[..4] != PLAIN_MAGIC {
            return Err(Error::InvalidFormat(
                "missing plain container magic".into(),
            ));
        }
        if bytes.len() < PLAIN_HEADER_SIZE {
            return Err(Error::corrupt_header(
                bytes.len() as u64,
                format!("header truncated: need {PLAIN_HEADER_SIZE} bytes, have {}", bytes.len()),
            ));
        }
        check_version(bytes[4])?;

        Ok(Self {
            original_len: read_u32_le(bytes, 5),
            token_count: read_u32_le(bytes, 9),
            model_hash: read_u32_le(bytes, 13),
        })
    }

    /// Splits a container into its parsed header and payload slice.
    pub fn split(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let header = Self::parse(bytes)?;
        Ok((header, &bytes[PLAIN_HEADER_SIZE..]))
    }

    /// Frames a payload with this header into a complete container.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(PLAIN_HEADER_SIZE + payload.len());
        out.extend_from_slice(&self.serialize());
        out.extend_from_slice(payload);
        out
    }
}

/// Header of a chunked (parallel-decodable) container.
///
/// Carries one absolute payload offset and one on-wire token count per
/// chunk. On-wire counts include each chunk's overlap prefix;
/// `total_token_count` counts the reconstructed stream, overlap excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedHeader {
    /// Length of the original text in bytes.
    pub original_len: u32,
    /// Tokens in the reconstructed stream, overlap duplicates excluded.
    pub total_token_count: u32,
    /// Hash identifying the model that produced the probabilities.
    pub model_hash: u32,
    /// Configured chunk size in tokens.
    pub chunk_size: u16,
    /// Configured overlap size in tokens.
    pub overlap_size: u16,
    /// Absolute byte offset of each chunk payload from the container start.
    pub chunk_offsets: Vec<u32>,
    /// On-wire token count of each chunk, overlap included.
    pub chunk_token_counts: Vec<u16>,
}

impl ChunkedHeader {
    /// Number of chunks in the container.
    pub fn chunk_count(&self) -> usize {
        self.chunk_offsets.len()
    }

    /// Total header size in bytes: the 25-byte base plus 6 bytes per chunk.
    pub fn header_size(&self) -> usize {
        CHUNKED_HEADER_BASE_SIZE + 6 * self.chunk_count()
    }

    /// Serializes the header, offset table, and token-count table.
    ///
    /// # Panics
    ///
    /// Panics if the offset and token-count tables disagree in length or the
    /// chunk count exceeds `u16::MAX`; the compression driver validates both
    /// before constructing a header.
    pub fn serialize(&self) -> Vec<u8> {
        assert_eq!(self.chunk_offsets.len(), self.chunk_token_counts.len());
        let count = u16::try_from(self.chunk_count()).expect("chunk count fits u16");

        let mut out = Vec::with_capacity(self.header_size());
        out.extend_from_slice(&CHUNKED_MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&self.original_len.to_le_bytes());
        out.extend_from_slice(&self.total_token_count.to_le_bytes());
        out.extend_from_slice(&self.model_hash.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&self.chunk_size.to_le_bytes());
        out.extend_from_slice(&self.overlap_size.to_le_bytes());
        out.extend_from_slice(&[0u8; 2]);
        for offset in &self.chunk_offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        for token_count in &self.chunk_token_counts {
            out.extend_from_slice(&token_count.to_le_bytes());
        }
        out
    }

    /// Parses and validates a chunked header from the start of a container.
    ///
    /// Offsets are checked for strict monotonicity here; whether they point
    /// inside an actual container is a property of the container, checked by
    /// [`payload_slices`](Self::payload_slices) when payloads are extracted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The magic does not match the chunked container
    /// - The version is newer than this build supports
    /// - The offset or token-count table is truncated
    /// - Offsets are not strictly increasing
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 || bytes[..4] != CHUNKED_MAGIC {
            return Err(Error::InvalidFormat(
                "missing chunked container magic".into(),
            ));
        }
        if bytes.len() < CHUNKED_HEADER_BASE_SIZE {
            return Err(Error::corrupt_header(
                bytes.len() as u64,
                format!(
                    "header truncated: need {CHUNKED_HEADER_BASE_SIZE} bytes, have {}",
                    bytes.len()
                ),
            ));
        }
        check_version(bytes[4])?;

        let original_len = read_u32_le(bytes, 5);
        let total_token_count = read_u32_le(bytes, 9);
        let model_hash = read_u32_le(bytes, 13);
        let chunk_count = read_u16_le(bytes, 17) as usize;
        let chunk_size = read_u16_le(bytes, 19);
        let overlap_size = read_u16_le(bytes, 21);

        let header_size = CHUNKED_HEADER_BASE_SIZE + 6 * chunk_count;
        if bytes.len() < header_size {
            return Err(Error::corrupt_header(
                bytes.len() as u64,
                format!(
                    "chunk tables truncated: {chunk_count} chunks need {header_size} bytes, have {}",
                    bytes.len()
                ),
            ));
        }

        let mut chunk_offsets = Vec::with_capacity(chunk_count);
        for i in 0..chunk_count {
            chunk_offsets.push(read_u32_le(bytes, CHUNKED_HEADER_BASE_SIZE + 4 * i));
        }
        let counts_base = CHUNKED_HEADER_BASE_SIZE + 4 * chunk_count;
        let mut chunk_token_counts = Vec::with_capacity(chunk_count);
        for i in 0..chunk_count {
            chunk_token_counts.push(read_u16_le(bytes, counts_base + 2 * i));
        }

        for i in 1..chunk_count {
            if chunk_offsets[i] <= chunk_offsets[i - 1] {
                return Err(Error::corrupt_header(
                    (CHUNKED_HEADER_BASE_SIZE + 4 * i) as u64,
                    format!(
                        "chunk offsets not strictly increasing: {} then {}",
                        chunk_offsets[i - 1],
                        chunk_offsets[i]
                    ),
                ));
            }
        }

        Ok(Self {
            original_len,
            total_token_count,
            model_hash,
            chunk_size,
            overlap_size,
            chunk_offsets,
            chunk_token_counts,
        })
    }

    /// Returns each chunk's payload slice within a full container.
    ///
    /// Payload lengths are derived from consecutive offsets; the final chunk
    /// runs to the end of the container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the first offset does not land
    /// exactly after the header tables, or if any offset points past the end
    /// of the container.
    pub fn payload_slices<'a>(&self, container: &'a [u8]) -> Result<Vec<&'a [u8]>> {
        let count = self.chunk_count();
        let header_size = self.header_size();
        if count > 0 && self.chunk_offsets[0] as usize != header_size {
            return Err(Error::corrupt_header(
                CHUNKED_HEADER_BASE_SIZE as u64,
                format!(
                    "first chunk offset {} does not follow the {header_size}-byte header",
                    self.chunk_offsets[0]
                ),
            ));
        }
        (0..count)
            .map(|i| {
                let start = self.chunk_offsets[i] as usize;
                let end = if i + 1 < count {
                    self.chunk_offsets[i + 1] as usize
                } else {
                    container.len()
                };
                if start < header_size || end > container.len() {
                    return Err(Error::corrupt_header(
                        (CHUNKED_HEADER_BASE_SIZE + 4 * i) as u64,
                        format!(
                            "chunk {i} payload {start}..{end} outside container of {} bytes",
                            container.len()
                        ),
                    ));
                }
                Ok(&container[start..end])
            })
            .collect()
    }
}

/// Summary of a container's header, readable without a model or tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerInfo {
    /// A plain single-payload container.
    Plain(PlainHeader),
    /// A chunked parallel-decodable container.
    Chunked(ChunkedHeader),
}

impl ContainerInfo {
    /// Length of the original text in bytes.
    pub fn original_len(&self) -> u32 {
        match self {
            Self::Plain(h) => h.original_len,
            Self::Chunked(h) => h.original_len,
        }
    }

    /// Tokens in the reconstructed stream.
    pub fn token_count(&self) -> u32 {
        match self {
            Self::Plain(h) => h.token_count,
            Self::Chunked(h) => h.total_token_count,
        }
    }

    /// Hash of the model the container was produced with.
    pub fn model_hash(&self) -> u32 {
        match self {
            Self::Plain(h) => h.model_hash,
            Self::Chunked(h) => h.model_hash,
        }
    }

    /// Number of chunks; 1 for plain containers.
    pub fn chunk_count(&self) -> usize {
        match self {
            Self::Plain(_) => 1,
            Self::Chunked(h) => h.chunk_count(),
        }
    }
}

/// Parses either container's header. See [`crate::format::inspect`].
pub fn inspect(bytes: &[u8]) -> Result<ContainerInfo> {
    if super::is_chunked(bytes) {
        Ok(ContainerInfo::Chunked(ChunkedHeader::parse(bytes)?))
    } else if bytes.len() >= 4 && bytes[..4] == PLAIN_MAGIC {
        Ok(ContainerInfo::Plain(PlainHeader::parse(bytes)?))
    } else {
        Err(Error::InvalidFormat(
            "leading bytes match no known container magic".into(),
        ))
    }
}

//! Snapshots: content-addressed prior-good states used by repair.
//!
//! The payload layout is private to this subsystem — it's decoded only by
//! the subsystem that produced it, never exchanged with another
//! implementation. This implementation chooses a hand-rolled,
//! length-prefixed little-endian record format rather than adding a
//! serialization crate for a format with exactly one reader and one
//! writer.

use ochrance_verify::{Block, BlockMetadata};
use ochrance_oracle::HashAlgorithm;

/// `(snapshot-id, timestamp, opaque-payload)`. Snapshots are append-only
/// historical records — once constructed, never mutated.
#[derive(Debug, Clone)]
pub struct Snapshot {
    snapshot_id: String,
    timestamp: String,
    payload: Vec<u8>,
}

/// Why decoding a snapshot's payload failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot payload truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("snapshot payload has unrecognised format tag {tag}")]
    BadFormatTag { tag: u8 },
}

const FORMAT_TAG: u8 = 0x01;

/// Encode `blocks`/`metadata` into the opaque payload layout this crate
/// defines. Record layout, little-endian throughout:
/// `[tag: u8][block_count: u32]` then, per block,
/// `[raw_len: u32][raw_bytes][modified_at_len: u16][modified_at]
///  [owner_len: u16][owner][read_only: u8]`.
#[must_use]
pub fn encode_payload(blocks: &[Block], metadata: &[BlockMetadata]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(FORMAT_TAG);
    out.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    for (block, meta) in blocks.iter().zip(metadata) {
        let raw = block.raw_bytes();
        out.extend_from_slice(&(raw.len() as u32).to_le_bytes());
        out.extend_from_slice(raw);

        let modified_at = meta.modified_at.as_bytes();
        out.extend_from_slice(&(modified_at.len() as u16).to_le_bytes());
        out.extend_from_slice(modified_at);

        let owner = meta.owner.as_bytes();
        out.extend_from_slice(&(owner.len() as u16).to_le_bytes());
        out.extend_from_slice(owner);

        out.push(u8::from(meta.read_only));
    }
    out
}

/// Decoded snapshot content: the block/metadata vectors this subsystem's
/// payload format encodes.
pub struct DecodedSnapshot {
    pub blocks: Vec<Block>,
    pub metadata: Vec<BlockMetadata>,
}

impl DecodedSnapshot {
    #[must_use]
    pub fn n(&self) -> usize {
        self.blocks.len()
    }
}

/// Decode a payload produced by [`encode_payload`]. Returns
/// [`SnapshotError::Truncated`] or [`SnapshotError::BadFormatTag`] on any
/// malformed input, which the repair engine surfaces as `snapshot-corrupt`.
pub fn decode_payload(algorithm: HashAlgorithm, payload: &[u8]) -> Result<DecodedSnapshot, SnapshotError> {
    let mut cursor = Cursor::new(payload);

    let tag = cursor.read_u8()?;
    if tag != FORMAT_TAG {
        return Err(SnapshotError::BadFormatTag { tag });
    }

    let count = cursor.read_u32()? as usize;
    let mut blocks = Vec::with_capacity(count);
    let mut metadata = Vec::with_capacity(count);

    for _ in 0..count {
        let raw_len = cursor.read_u32()? as usize;
        let raw = cursor.read_bytes(raw_len)?;
        blocks.push(Block::new(algorithm, raw.to_vec()));

        let modified_at_len = cursor.read_u16()? as usize;
        let modified_at = cursor.read_utf8(modified_at_len)?;

        let owner_len = cursor.read_u16()? as usize;
        let owner = cursor.read_utf8(owner_len)?;

        let read_only = cursor.read_u8()? != 0;
        metadata.push(BlockMetadata::new(modified_at, owner, read_only));
    }

    Ok(DecodedSnapshot { blocks, metadata })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(SnapshotError::Truncated { offset: self.pos })?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, SnapshotError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, SnapshotError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_utf8(&mut self, len: usize) -> Result<String, SnapshotError> {
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl Snapshot {
    #[must_use]
    pub fn new(snapshot_id: impl Into<String>, timestamp: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            timestamp: timestamp.into(),
            payload,
        }
    }

    /// Build a snapshot directly from a known-good block/metadata pair,
    /// encoding the payload with [`encode_payload`].
    #[must_use]
    pub fn capture(snapshot_id: impl Into<String>, timestamp: impl Into<String>, blocks: &[Block], metadata: &[BlockMetadata]) -> Self {
        Self::new(snapshot_id, timestamp, encode_payload(blocks, metadata))
    }

    #[must_use]
    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn decode(&self, algorithm: HashAlgorithm) -> Result<DecodedSnapshot, SnapshotError> {
        decode_payload(algorithm, &self.payload)
    }
}

//! MessagePack serialisation helpers.

use rmp_serde::Serializer;
use serde::Serialize;

use crate::log_entry::LogEntry;

use super::SendError;

/// Serialise a batch into a MessagePack array of `{category, message}` maps.
pub fn serialise_batch(entries: &[LogEntry]) -> Result<Vec<u8>, SendError> {
    let mut buf = Vec::with_capacity(64 * entries.len().max(1));
    entries
        .serialize(&mut Serializer::new(&mut buf).with_struct_map())
        .map_err(|err| SendError::Encode(err.to_string()))?;
    Ok(buf)
}

/// Frame the payload with a big-endian `u32` length prefix.
pub fn frame_payload(payload: &[u8], max_size: usize) -> Result<Vec<u8>, SendError> {
    let too_large = || SendError::FrameTooLarge {
        size: payload.len(),
        max: max_size,
    };
    if payload.len() > max_size {
        return Err(too_large());
    }
    let len = u32::try_from(payload.len()).map_err(|_| too_large())?;
    let mut framed = Vec::with_capacity(payload.len().saturating_add(4));
    framed.extend(len.to_be_bytes());
    framed.extend_from_slice(payload);
    Ok(framed)
}

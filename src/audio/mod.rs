use serde::{Deserialize, Serialize};

use crate::error::SegmentationError;

/// A bounded slice of an audio track, identified by its position.
///
/// Chunks are contiguous and non-overlapping; the last chunk of a track may
/// be shorter than the configured chunk length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Zero-based sequence index within the track
    pub index: usize,

    /// Offset from the start of the track in milliseconds
    pub offset_ms: u64,

    /// Chunk duration in milliseconds
    pub duration_ms: u64,
}

impl AudioChunk {
    /// Offset of the first millisecond past this chunk.
    pub fn end_ms(&self) -> u64 {
        self.offset_ms + self.duration_ms
    }
}

/// Split a track of `track_duration_ms` into fixed-length ordered chunks.
///
/// Chunk `i` spans `[i * chunk_length_ms, min((i + 1) * chunk_length_ms, D))`,
/// so the chunks cover the track exactly once. A zero-duration track yields
/// zero chunks, which downstream stages treat as an empty transcript.
pub fn segment(
    track_duration_ms: u64,
    chunk_length_ms: u64,
) -> Result<Vec<AudioChunk>, SegmentationError> {
    if chunk_length_ms == 0 {
        return Err(SegmentationError::InvalidChunkLength(chunk_length_ms));
    }

    let mut chunks = Vec::new();
    let mut offset = 0u64;

    while offset < track_duration_ms {
        let duration = chunk_length_ms.min(track_duration_ms - offset);
        chunks.push(AudioChunk {
            index: chunks.len(),
            offset_ms: offset,
            duration_ms: duration,
        });
        offset += duration;
    }

    Ok(chunks)
}

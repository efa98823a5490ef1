//! Resynchronizing frame decoder
//!
//! Turns arbitrary byte chunks into acceleration values. The only state kept
//! between calls is the unconsumed tail of the previous chunk (the carry),
//! which is always shorter than one frame.
//!
//! # Algorithm
//!
//! The carry and the new chunk are joined into one working buffer and a
//! cursor scans it:
//!
//! - if the two bytes at `cursor + 2` are the `0x01 0x01` marker, the 4-byte
//!   window is a frame: decode it and advance by 4
//! - otherwise drop one byte and retry at the next offset
//!
//! Whatever remains after the last possible frame boundary becomes the new
//! carry. The earliest matching window always wins, so marker-like payload
//! bytes can yield a false frame; that ambiguity is inherent to the wire
//! format and is left as is.

use crate::types::{G_CONVERSION_FACTOR, PACKET_SIZE};

/// Frame-end sentinel
pub const FRAME_MARKER: [u8; 2] = [0x01, 0x01];

/// Bytes carried between decode calls
///
/// Invariant: `carry().len() < PACKET_SIZE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderState {
    carry: Vec<u8>,
}

impl DecoderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconsumed tail of the previous chunk
    pub fn carry(&self) -> &[u8] {
        &self.carry
    }

    pub fn is_empty(&self) -> bool {
        self.carry.is_empty()
    }
}

/// Counters accumulated by a [`FrameDecoder`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DecodeStats {
    /// Frames successfully decoded
    pub frames: u64,
    /// Bytes discarded while resynchronizing
    pub dropped_bytes: u64,
    /// Total bytes fed to the decoder
    pub bytes_in: u64,
}

/// Convert a raw signed reading to g
#[inline]
pub fn raw_to_g(raw: i16) -> f64 {
    raw as f64 / G_CONVERSION_FACTOR
}

/// Encode a value in g into a wire frame
///
/// The value is quantized to the nearest count and saturates at the `i16`
/// range.
pub fn encode_frame(value: f64) -> [u8; 4] {
    let counts = (value * G_CONVERSION_FACTOR)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
    let [high, low] = counts.to_be_bytes();
    [high, low, FRAME_MARKER[0], FRAME_MARKER[1]]
}

/// Result of scanning one working buffer
struct Scan {
    values: Vec<f64>,
    consumed: usize,
    dropped: usize,
}

fn scan(buffer: &[u8]) -> Scan {
    let mut values = Vec::with_capacity(buffer.len() / PACKET_SIZE);
    let mut dropped = 0;
    let mut i = 0;

    while i + PACKET_SIZE <= buffer.len() {
        if buffer[i + 2] == FRAME_MARKER[0] && buffer[i + 3] == FRAME_MARKER[1] {
            let raw = i16::from_be_bytes([buffer[i], buffer[i + 1]]);
            values.push(raw_to_g(raw));
            i += PACKET_SIZE;
        } else {
            dropped += 1;
            i += 1;
        }
    }

    Scan {
        values,
        consumed: i,
        dropped,
    }
}

/// Decode a chunk against a carried state
///
/// Pure: returns the decoded values and the next state without touching
/// `state`. An empty chunk yields no values and an identical state.
pub fn decode(state: &DecoderState, chunk: &[u8]) -> (Vec<f64>, DecoderState) {
    let mut buffer = Vec::with_capacity(state.carry.len() + chunk.len());
    buffer.extend_from_slice(&state.carry);
    buffer.extend_from_slice(chunk);

    let result = scan(&buffer);
    let carry = buffer[result.consumed..].to_vec();
    (result.values, DecoderState { carry })
}

/// Stateful decoder holding the carry between chunks
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    state: DecoderState,
    stats: DecodeStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the values it completes, in stream order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<f64> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let mut buffer = std::mem::take(&mut self.state.carry);
        buffer.extend_from_slice(chunk);

        let result = scan(&buffer);
        buffer.drain(..result.consumed);
        self.state.carry = buffer;

        self.stats.bytes_in += chunk.len() as u64;
        self.stats.frames += result.values.len() as u64;
        self.stats.dropped_bytes += result.dropped as u64;

        if result.dropped > 0 {
            tracing::trace!("Resync dropped {} byte(s)", result.dropped);
        }

        result.values
    }

    /// Clear the carry and counters
    pub fn reset(&mut self) {
        self.state = DecoderState::default();
        self.stats = DecodeStats::default();
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STEP: f64 = 1.0 / G_CONVERSION_FACTOR;

    #[test]
    fn test_decode_scenario_positive_and_negative_one() {
        let stream = [0x00, 0x01, 0x01, 0x01, 0xFF, 0xFF, 0x01, 0x01];
        let (values, state) = decode(&DecoderState::new(), &stream);
        assert_eq!(values, vec![1.0 / 16393.0, -1.0 / 16393.0]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_decode_extremes() {
        let (values, _) = decode(&DecoderState::new(), &[0x7F, 0xFF, 0x01, 0x01, 0x80, 0x00, 0x01, 0x01]);
        assert_eq!(values, vec![32767.0 / 16393.0, -32768.0 / 16393.0]);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let (_, state) = decode(&DecoderState::new(), &[0x12, 0x34]);
        let (values, next) = decode(&state, &[]);
        assert!(values.is_empty());
        assert_eq!(next, state);
    }

    #[test]
    fn test_short_chunks_extend_carry() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(&[0x40]).is_empty());
        assert_eq!(decoder.state().carry(), &[0x40]);
        assert!(decoder.feed(&[0x09, 0x01]).is_empty());
        assert_eq!(decoder.state().carry(), &[0x40, 0x09, 0x01]);

        let values = decoder.feed(&[0x01]);
        assert_eq!(values, vec![1.0]);
        assert!(decoder.state().is_empty());
    }

    #[test]
    fn test_resync_drops_leading_garbage() {
        let mut decoder = FrameDecoder::new();
        let mut stream = vec![0xAB, 0xCD, 0xEF];
        stream.extend_from_slice(&encode_frame(0.5));
        let values = decoder.feed(&stream);
        assert_eq!(values.len(), 1);
        assert!((values[0] - 0.5).abs() <= STEP);
        assert_eq!(decoder.stats().dropped_bytes, 3);
        assert_eq!(decoder.stats().frames, 1);
    }

    #[test]
    fn test_carry_never_reaches_packet_size() {
        let mut decoder = FrameDecoder::new();
        for chunk in [&[0x02u8, 0x03, 0x04][..], &[0x05, 0x06], &[0x07; 9]] {
            decoder.feed(chunk);
            assert!(decoder.state().carry().len() < PACKET_SIZE);
        }
    }

    #[test]
    fn test_marker_collision_in_payload_is_accepted() {
        // Known limitation: a stray 0x07 followed by the real frame
        // [0x00, 0x01, 0x01, 0x01] makes the window starting at the stray
        // byte match first, so the wrong value is emitted and the real
        // marker lands in the carry.
        let stream = [0x07, 0x00, 0x01, 0x01, 0x01, 0x01];
        let (values, state) = decode(&DecoderState::new(), &stream);
        assert_eq!(values, vec![raw_to_g(0x0700)]);
        assert_eq!(state.carry(), &[0x01, 0x01]);
    }

    #[test]
    fn test_reset_clears_carry_and_stats() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&[0x00, 0x01, 0x01, 0x01, 0x33]);
        decoder.reset();
        assert!(decoder.state().is_empty());
        assert_eq!(decoder.stats(), DecodeStats::default());
    }

    #[test]
    fn test_encode_saturates() {
        assert_eq!(encode_frame(10.0), [0x7F, 0xFF, 0x01, 0x01]);
        assert_eq!(encode_frame(-10.0), [0x80, 0x00, 0x01, 0x01]);
    }

    proptest! {
        #[test]
        fn test_frame_round_trip(counts in -32768i32..32768) {
            let value = counts as f64 / G_CONVERSION_FACTOR;
            let (values, _) = decode(&DecoderState::new(), &encode_frame(value));
            prop_assert_eq!(values.len(), 1);
            prop_assert!((values[0] - value).abs() <= STEP);
        }

        #[test]
        fn test_chunk_split_invariance(
            stream in prop::collection::vec(any::<u8>(), 0..256),
            cuts in prop::collection::vec(0usize..256, 0..16)
        ) {
            let (whole, whole_state) = decode(&DecoderState::new(), &stream);

            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(stream.len())).collect();
            cuts.sort_unstable();

            let mut state = DecoderState::new();
            let mut pieces = Vec::new();
            let mut start = 0;
            for cut in cuts.into_iter().chain(std::iter::once(stream.len())) {
                let (values, next) = decode(&state, &stream[start..cut]);
                pieces.extend(values);
                state = next;
                start = cut;
            }

            prop_assert_eq!(pieces, whole);
            prop_assert_eq!(state, whole_state);
        }

        #[test]
        fn test_resync_recovers_every_frame(
            frames in prop::collection::vec(-32768i32..32768, 1..40),
            garbage in prop::collection::vec(prop::collection::vec(0x02u8..=0xFF, 0..4), 1..40)
        ) {
            // Garbage bytes are never 0x00/0x01 and frame payloads are kept
            // clear of 0x01 so no spurious marker can form.
            let frames: Vec<i16> = frames
                .into_iter()
                .map(|c| {
                    let [h, l] = (c as i16).to_be_bytes();
                    i16::from_be_bytes([if h == 0x01 { 0x02 } else { h }, if l == 0x01 { 0x02 } else { l }])
                })
                .collect();

            let mut stream = Vec::new();
            for (i, raw) in frames.iter().enumerate() {
                if let Some(junk) = garbage.get(i) {
                    stream.extend_from_slice(junk);
                }
                let [h, l] = raw.to_be_bytes();
                stream.extend_from_slice(&[h, l, 0x01, 0x01]);
            }

            let (values, _) = decode(&DecoderState::new(), &stream);
            let expected: Vec<f64> = frames.iter().map(|&r| raw_to_g(r)).collect();
            prop_assert_eq!(values, expected);
        }

        #[test]
        fn test_stateful_matches_pure(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..16)
        ) {
            let mut decoder = FrameDecoder::new();
            let mut state = DecoderState::new();
            for chunk in &chunks {
                let (expected, next) = decode(&state, chunk);
                prop_assert_eq!(decoder.feed(chunk), expected);
                prop_assert_eq!(decoder.state(), &next);
                state = next;
            }
        }
    }
}

//! Test data builders for byte streams

use vibscope::protocol::encode_frame;

/// Builder for sensor byte streams
///
/// Frames and raw noise can be interleaved, then the stream is cut into
/// chunks the way a serial read would deliver it.
#[derive(Debug, Default, Clone)]
pub struct StreamBuilder {
    bytes: Vec<u8>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame per value (in g)
    pub fn frames(mut self, values: &[f64]) -> Self {
        for &value in values {
            self.bytes.extend_from_slice(&encode_frame(value));
        }
        self
    }

    /// Append `count` frames of a constant value
    pub fn repeat(self, value: f64, count: usize) -> Self {
        self.frames(&vec![value; count])
    }

    /// Append raw bytes (noise, partial frames)
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// Split the stream into chunks of the given sizes, cycling through them
    pub fn chunked(self, sizes: &[usize]) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        let mut rest = self.bytes.as_slice();
        let mut sizes = sizes.iter().copied().filter(|&s| s > 0).cycle();
        while !rest.is_empty() {
            let size = sizes.next().unwrap_or(rest.len()).min(rest.len());
            let (head, tail) = rest.split_at(size);
            chunks.push(head.to_vec());
            rest = tail;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_builder() {
        let stream = StreamBuilder::new().frames(&[0.0]).raw(&[0xAA]).build();
        assert_eq!(stream, vec![0x00, 0x00, 0x01, 0x01, 0xAA]);
    }

    #[test]
    fn test_chunked_preserves_bytes() {
        let builder = StreamBuilder::new().repeat(0.25, 5);
        let whole = builder.clone().build();
        let chunks = builder.chunked(&[3, 1, 7]);
        assert_eq!(chunks.concat(), whole);
        assert_eq!(chunks[0].len(), 3);
        assert_eq!(chunks[1].len(), 1);
    }
}

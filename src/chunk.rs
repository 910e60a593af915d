//! Token-stream chunking for parallel decompression.
//!
//! A chunked container cuts the token stream at fixed output positions, and
//! every chunk after the first carries an overlap prefix: a verbatim copy of
//! the tokens immediately before its cut point. Each chunk is coded with a
//! freshly reset model, so the overlap tokens cost redundant bits but let
//! the decoder's model warm up on real context before any token that
//! contributes to the output. Merging drops each overlap prefix again.

/// A chunk's position in the token stream.
///
/// `start..end` is the on-wire token range, overlap included; `overlap` of
/// those tokens duplicate the previous chunk's tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// First on-wire token index.
    pub start: usize,
    /// One past the last on-wire token index.
    pub end: usize,
    /// Number of leading tokens duplicated from the previous chunk.
    pub overlap: usize,
}

impl ChunkSpan {
    /// Number of tokens this chunk carries on the wire.
    pub fn wire_len(&self) -> usize {
        self.end - self.start
    }

    /// Number of tokens this chunk contributes to the reconstructed stream.
    pub fn output_len(&self) -> usize {
        self.wire_len() - self.overlap
    }
}

/// Cuts a token stream of `total` tokens into chunk spans.
///
/// Cut points sit at multiples of `chunk_size`; chunk `i >= 1` starts
/// `overlap_size` tokens earlier (clamped at the stream start). An empty
/// stream yields no chunks.
pub fn plan_chunks(total: usize, chunk_size: usize, overlap_size: usize) -> Vec<ChunkSpan> {
    assert!(chunk_size >= 1, "chunk size must be at least 1");
    let mut spans = Vec::new();
    let mut cut = 0usize;
    while cut < total {
        let overlap = if cut == 0 { 0 } else { overlap_size.min(cut) };
        spans.push(ChunkSpan {
            start: cut - overlap,
            end: (cut + chunk_size).min(total),
            overlap,
        });
        cut += chunk_size;
    }
    spans
}

/// Merges per-chunk decoded token arrays back into one stream.
///
/// Takes chunk 0 whole; for later chunks drops the overlap prefix, which
/// duplicates the tail of the previous chunk's decoded output. Debug builds
/// assert that equality.
pub fn merge_decoded(chunks: Vec<Vec<u32>>, overlaps: &[usize]) -> Vec<u32> {
    debug_assert_eq!(chunks.len(), overlaps.len());
    let mut merged: Vec<u32> = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
    for (chunk, &overlap) in chunks.into_iter().zip(overlaps) {
        debug_assert!(
            merged.len() >= overlap && merged[merged.len() - overlap..] == chunk[..overlap],
            "overlap prefix does not match the previous chunk's tail"
        );
        merged.extend_from_slice(&chunk[overlap..]);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_with_overlap() {
        // 15 tokens, size 5, overlap 2: wire ranges [0,5), [3,10), [8,15).
        let spans = plan_chunks(15, 5, 2);
        assert_eq!(
            spans,
            vec![
                ChunkSpan { start: 0, end: 5, overlap: 0 },
                ChunkSpan { start: 3, end: 10, overlap: 2 },
                ChunkSpan { start: 8, end: 15, overlap: 2 },
            ]
        );
        let output: usize = spans.iter().map(ChunkSpan::output_len).sum();
        assert_eq!(output, 15);
    }

    #[test]
    fn test_plan_empty_stream() {
        assert!(plan_chunks(0, 128, 16).is_empty());
    }

    #[test]
    fn test_plan_single_short_chunk() {
        let spans = plan_chunks(3, 128, 16);
        assert_eq!(spans, vec![ChunkSpan { start: 0, end: 3, overlap: 0 }]);
    }

    #[test]
    fn test_plan_exact_multiple() {
        let spans = plan_chunks(10, 5, 2);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1], ChunkSpan { start: 3, end: 10, overlap: 2 });
    }

    #[test]
    fn test_plan_overlap_clamped_at_stream_start() {
        // Second chunk wants 16 tokens of overlap but only 4 exist.
        let spans = plan_chunks(12, 4, 16);
        assert_eq!(spans[1], ChunkSpan { start: 0, end: 8, overlap: 4 });
        assert_eq!(spans[2], ChunkSpan { start: 0, end: 12, overlap: 8 });
    }

    #[test]
    fn test_plan_zero_overlap() {
        let spans = plan_chunks(10, 4, 0);
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.overlap == 0));
    }

    #[test]
    fn test_merge_drops_overlap_prefixes() {
        let tokens: Vec<u32> = (1..=15).collect();
        let spans = plan_chunks(tokens.len(), 5, 2);
        let chunks: Vec<Vec<u32>> = spans
            .iter()
            .map(|s| tokens[s.start..s.end].to_vec())
            .collect();
        assert_eq!(chunks[1], vec![4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(chunks[2], vec![9, 10, 11, 12, 13, 14, 15]);

        let overlaps: Vec<usize> = spans.iter().map(|s| s.overlap).collect();
        assert_eq!(merge_decoded(chunks, &overlaps), tokens);
    }

    #[test]
    fn test_merge_single_chunk() {
        assert_eq!(merge_decoded(vec![vec![9, 8, 7]], &[0]), vec![9, 8, 7]);
    }

    #[test]
    fn test_merge_empty() {
        assert_eq!(merge_decoded(Vec::new(), &[]), Vec::<u32>::new());
    }
}

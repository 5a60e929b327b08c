//! Chunk encoder: ciphertext → ordered envelopes → rendered symbols

use std::sync::atomic::{AtomicU64, Ordering};

use gzqr_core::{GzqrError, GzqrResult};
use rayon::prelude::*;

use crate::context::RunContext;
use crate::envelope::{ChunkEnvelope, GlobalMetadata};

/// Cut `ciphertext` into `chunk_size` pieces; the last one may be shorter.
pub fn split(ciphertext: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    ciphertext.chunks(chunk_size.max(1)).collect()
}

/// Build every envelope and hand its text to `render` on the worker pool.
///
/// `render` receives the chunk index and the serialized envelope. Rendering
/// order is unspecified; the embedded index is authoritative. Returns the
/// number of chunks rendered.
pub fn encode_chunks<F>(
    ciphertext: &[u8],
    meta: &GlobalMetadata,
    ctx: &RunContext,
    render: F,
) -> GzqrResult<u64>
where
    F: Fn(u64, &str) -> GzqrResult<()> + Sync,
{
    let pieces = split(ciphertext, meta.chunk_size as usize);
    let total = pieces.len() as u64;
    if total != meta.total {
        return Err(GzqrError::Envelope(format!(
            "metadata declares {} chunks but ciphertext splits into {total}",
            meta.total
        )));
    }

    tracing::info!(total, chunk_size = meta.chunk_size, workers = ctx.workers, "encoding chunks");

    let done = AtomicU64::new(0);
    ctx.pool()?.install(|| {
        pieces
            .par_iter()
            .enumerate()
            .try_for_each(|(i, piece)| -> GzqrResult<()> {
                let index = i as u64;
                let text = ChunkEnvelope::new(index, piece.to_vec(), meta.clone()).to_text()?;
                render(index, &text)?;
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                ctx.report(n, total, "encode");
                Ok(())
            })
    })?;

    tracing::debug!(total, "all chunks rendered");
    Ok(total)
}

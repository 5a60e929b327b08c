//! Chunk reconstruction from an unordered, noisy candidate set
//!
//! Candidates are scanned in parallel. Each decoded text is parsed and
//! verified on its own; failures are counted and skipped. Accepted chunks go
//! into one mutex-guarded index map whose critical section is a metadata
//! compare plus an insert. The first accepted chunk latches the archive
//! metadata. Completion and integrity checks run only after every worker has
//! joined.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use gzqr_core::{GzqrError, GzqrResult, MISSING_LISTED};
use gzqr_crypto::sha256_hex;
use rayon::prelude::*;

use crate::context::RunContext;
use crate::envelope::{ChunkEnvelope, GlobalMetadata};

/// Per-run candidate accounting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: usize,
    /// No symbol found, or the image could not be read
    pub undetected: usize,
    /// Symbol found but not a valid envelope for this protocol
    pub rejected: usize,
    /// Valid envelope for an index already accepted
    pub duplicates: usize,
    pub accepted: usize,
}

/// Verified ciphertext plus the metadata needed to decrypt it.
#[derive(Debug)]
pub struct Reconstruction {
    pub ciphertext: Vec<u8>,
    pub meta: GlobalMetadata,
    pub stats: ScanStats,
}

#[derive(Default)]
struct Assembly {
    latched: Option<GlobalMetadata>,
    chunks: HashMap<u64, Vec<u8>>,
    mismatch: Option<(u64, &'static str)>,
    stats: ScanStats,
}

enum Outcome {
    Undetected,
    Rejected,
    Valid(ChunkEnvelope),
}

/// Rebuild the archive ciphertext from `candidates`.
///
/// `detect` turns one candidate into its symbol text; `Ok(None)` and `Err`
/// both count as undetected and never abort the run.
pub fn reconstruct<C, D>(candidates: &[C], detect: D, ctx: &RunContext) -> GzqrResult<Reconstruction>
where
    C: Sync,
    D: Fn(&C) -> GzqrResult<Option<String>> + Sync,
{
    let total_candidates = candidates.len() as u64;
    let assembly = Mutex::new(Assembly::default());
    let done = AtomicU64::new(0);

    tracing::info!(candidates = candidates.len(), workers = ctx.workers, "scanning candidates");

    ctx.pool()?.install(|| {
        candidates.par_iter().for_each(|candidate| {
            let outcome = scan_one(candidate, &detect);
            {
                let mut asm = assembly.lock().unwrap_or_else(PoisonError::into_inner);
                asm.accept(outcome);
            }
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            ctx.report(n, total_candidates, "scan");
        });
    });

    // every worker has joined; the map is complete
    let mut asm = assembly.into_inner().unwrap_or_else(PoisonError::into_inner);
    asm.stats.candidates = candidates.len();
    let stats = asm.stats.clone();
    tracing::info!(
        candidates = stats.candidates,
        undetected = stats.undetected,
        rejected = stats.rejected,
        duplicates = stats.duplicates,
        accepted = stats.accepted,
        "scan finished"
    );

    if let Some((index, field)) = asm.mismatch {
        return Err(GzqrError::MetadataMismatch { index, field });
    }
    let meta = asm.latched.take().ok_or(GzqrError::NoValidChunks {
        candidates: candidates.len(),
    })?;

    // every accepted index is below total, so the gap count is exact and the
    // listing stops after MISSING_LISTED gaps plus the accepted indices
    let count = meta.total.saturating_sub(asm.chunks.len() as u64);
    if count > 0 {
        let missing: Vec<u64> = (0..meta.total)
            .filter(|i| !asm.chunks.contains_key(i))
            .take(MISSING_LISTED)
            .collect();
        return Err(GzqrError::MissingChunks {
            total: meta.total,
            missing,
            count,
        });
    }

    let mut ciphertext = Vec::with_capacity(asm.chunks.values().map(Vec::len).sum());
    for i in 0..meta.total {
        if let Some(bytes) = asm.chunks.remove(&i) {
            ciphertext.extend_from_slice(&bytes);
        }
    }

    let actual = sha256_hex(&ciphertext);
    if !actual.eq_ignore_ascii_case(&meta.cipher_hash) {
        return Err(GzqrError::GlobalIntegrity {
            expected: meta.cipher_hash.clone(),
            actual,
        });
    }

    tracing::debug!(bytes = ciphertext.len(), total = meta.total, "ciphertext reassembled");
    Ok(Reconstruction {
        ciphertext,
        meta,
        stats,
    })
}

fn scan_one<C, D>(candidate: &C, detect: &D) -> Outcome
where
    D: Fn(&C) -> GzqrResult<Option<String>>,
{
    let text = match detect(candidate) {
        Ok(Some(text)) => text,
        Ok(None) => return Outcome::Undetected,
        Err(e) => {
            tracing::debug!("candidate unreadable: {e}");
            return Outcome::Undetected;
        }
    };
    match ChunkEnvelope::from_text(&text).and_then(|env| env.verify().map(|()| env)) {
        Ok(env) => Outcome::Valid(env),
        Err(e) => {
            tracing::debug!("candidate rejected: {e}");
            Outcome::Rejected
        }
    }
}

impl Assembly {
    fn accept(&mut self, outcome: Outcome) {
        let env = match outcome {
            Outcome::Undetected => {
                self.stats.undetected += 1;
                return;
            }
            Outcome::Rejected => {
                self.stats.rejected += 1;
                return;
            }
            Outcome::Valid(env) => env,
        };

        if let Some(latched) = &self.latched {
            if let Some(field) = latched.first_difference(&env.meta) {
                tracing::warn!(index = env.index, field, "chunk from a different archive");
                if self.mismatch.is_none() {
                    self.mismatch = Some((env.index, field));
                }
                self.stats.rejected += 1;
                return;
            }
        } else {
            self.latched = Some(env.meta.clone());
        }

        if self.chunks.contains_key(&env.index) {
            self.stats.duplicates += 1;
        } else {
            self.chunks.insert(env.index, env.data);
            self.stats.accepted += 1;
        }
    }
}

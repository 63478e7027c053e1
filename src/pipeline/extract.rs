//! Parallel extraction stage
//!
//! Byte buffers are materialised by the caller. Each one is parsed on the
//! worker pool; a malformed buffer becomes an entry in `errors` and never
//! aborts the batch.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::AnalysisContext;
use crate::classfile::{self, TypeModel};
use crate::error::AnalysisError;

/// One compiled type handed over by the caller
#[derive(Debug, Clone)]
pub struct ClassSource {
    /// Where the bytes came from (a path or archive entry), used in errors
    pub origin: String,
    pub bytes: Vec<u8>,
}

impl ClassSource {
    pub fn new(origin: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            origin: origin.into(),
            bytes,
        }
    }
}

/// Models that parsed, in input order, plus one error line per failure
#[derive(Debug, Default)]
pub struct Extraction {
    pub models: Vec<TypeModel>,
    pub errors: Vec<String>,
}

/// Extract every source on the context's worker pool.
///
/// Only cancellation or a pool that cannot be built stop the stage.
pub fn extract_all(
    ctx: &AnalysisContext,
    sources: &[ClassSource],
) -> Result<Extraction, AnalysisError> {
    let start = Instant::now();
    let total = sources.len();
    let done = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.workers)
        .build()?;

    let parsed: Result<Vec<_>, AnalysisError> = pool.install(|| {
        sources
            .par_iter()
            .map(|source| {
                ctx.cancel.check()?;
                let result = classfile::extract(&source.bytes);
                let count = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = &ctx.progress {
                    progress(count, total);
                }
                Ok(result)
            })
            .collect()
    });

    let mut extraction = Extraction::default();
    for (source, result) in sources.iter().zip(parsed?) {
        match result {
            Ok(model) => {
                debug!("Extracted {} from {}", model.name, source.origin);
                extraction.models.push(model);
            }
            Err(e) => {
                warn!("Skipping {}: {}", source.origin, e);
                extraction.errors.push(format!("{}: {}", source.origin, e));
            }
        }
    }

    info!(
        "Extracted {}/{} types in {:?}",
        extraction.models.len(),
        total,
        start.elapsed()
    );
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::builder::ClassFileBuilder;
    use crate::pipeline::CancellationToken;
    use std::sync::Arc;

    #[test]
    fn test_bad_sources_are_isolated() {
        let good = ClassFileBuilder::new("com/acme/Order").build();
        let sources = vec![
            ClassSource::new("Order.class", good),
            ClassSource::new("Empty.class", Vec::new()),
            ClassSource::new("Junk.class", vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]),
        ];
        let out = extract_all(&AnalysisContext::new().with_workers(2), &sources).unwrap();
        assert_eq!(out.models.len(), 1);
        assert_eq!(out.models[0].name, "com.acme.Order");
        assert_eq!(out.errors.len(), 2);
        assert!(out.errors[0].starts_with("Empty.class: "));
        assert!(out.errors[1].starts_with("Junk.class: "));
    }

    #[test]
    fn test_progress_reaches_total() {
        let sources: Vec<_> = (0..5)
            .map(|i| {
                ClassSource::new(
                    format!("T{}.class", i),
                    ClassFileBuilder::new(&format!("p/T{}", i)).build(),
                )
            })
            .collect();
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let ctx = AnalysisContext::new().with_progress(Arc::new(move |done: usize, total: usize| {
            assert_eq!(total, 5);
            sink.fetch_max(done, Ordering::Relaxed);
        }));
        let out = extract_all(&ctx, &sources).unwrap();
        assert_eq!(out.models.len(), 5);
        assert_eq!(seen.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = AnalysisContext::new().with_cancellation(token);
        let sources = vec![ClassSource::new("A.class", ClassFileBuilder::new("A").build())];
        assert!(matches!(
            extract_all(&ctx, &sources),
            Err(AnalysisError::Cancelled)
        ));
    }
}

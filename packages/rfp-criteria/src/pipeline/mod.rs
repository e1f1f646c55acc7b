//! The criteria pipeline.
//!
//! The pipeline covers:
//! - Semantic chunking of document text
//! - Criteria extraction (LLM path with a pattern-based fallback)
//! - Conversion of extractions into criteria
//! - Document classification and the extraction gate
//! - Six-way AI categorization
//! - Map-then-reduce summarization

pub mod categorize;
pub mod chunk;
pub mod classify;
pub mod convert;
pub mod extract;
pub mod fallback;
pub mod prompts;
pub mod summarize;

pub use categorize::{CategoryLabel, Categorizer};
pub use chunk::{split_semantic, DEFAULT_CHUNK_SIZE};
pub use classify::Classifier;
pub use convert::{convert_extractions, to_criterion};
pub use extract::ExtractionEngine;
pub use fallback::fallback_extract;
pub use summarize::{Summarizer, CONSOLIDATION_FAILED_SUMMARY, NO_SUMMARY};

use std::future::Future;
use std::time::Duration;

use crate::error::{CriteriaError, Result};

/// Run an external call under a time limit.
///
/// An elapsed limit becomes `CriteriaError::Timeout` for `operation`.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CriteriaError::Timeout { operation, limit }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let ok = bounded("op", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = bounded("slow op", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            slow,
            Err(CriteriaError::Timeout { operation: "slow op", .. })
        ));
    }
}

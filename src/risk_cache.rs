//! Content-addressed cache around the risk aggregator.
//!
//! The cache key is derived from the latest statement's canonical JSON
//! serialization, scoped per company: a newer filing produces a new key
//! and thereby invalidates the old entry without any explicit deletion.
//! The cache is an optimization, never a dependency: every cache
//! failure degrades to computing the result fresh.

use crate::cache_store::{CacheStore, Namespace};
use crate::cache_validator::{sha256_hex, SealedCacheValue};
use crate::models::{FinancialStatement, HasRegistrationDate, RiskAssessment};
use crate::risk::calculate_risk_indicators;
use chrono::NaiveDate;
use std::time::Duration;

/// Retention window for computed indicator pairs.
pub const RISK_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Hex characters of the content digest kept in the key. Plenty for the
/// expected per-company statement cardinality.
const CONTENT_HASH_LEN: usize = 16;

/// Cache key for a (company, latest statement) pair.
///
/// The digest covers the statement content only; historical context is
/// deliberately not part of the key. The latest statement is the
/// dominant factor, and the history for a given latest statement is
/// assumed stable within the retention window.
pub fn risk_cache_key(company_id: &str, latest: &FinancialStatement) -> String {
    let canonical = serde_json::to_vec(latest).unwrap_or_default();
    let digest = sha256_hex(&canonical);
    format!(
        "risk_indicators:{}:{}",
        company_id,
        &digest[..CONTENT_HASH_LEN]
    )
}

/// Computes risk assessments, memoizing them in the injected cache
/// store under a content-addressed key.
#[derive(Clone)]
pub struct RiskIndicatorService<C> {
    cache: C,
}

impl<C: CacheStore> RiskIndicatorService<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Returns the cached assessment for this (company, latest
    /// statement) pair, or computes and stores it.
    ///
    /// Cache read failures and undecodable entries are treated as
    /// misses; write failures are logged and swallowed. The caller
    /// always gets an assessment.
    pub async fn indicators_for<T: HasRegistrationDate>(
        &self,
        company_id: &str,
        latest: &FinancialStatement,
        historical: &[FinancialStatement],
        filing_entries: &[T],
        as_of_date: NaiveDate,
    ) -> RiskAssessment {
        let key = risk_cache_key(company_id, latest);

        match self.cache.get(Namespace::Risk, &key).await {
            Ok(Some(stored)) => {
                if let Some(payload) = SealedCacheValue::open(&stored) {
                    match serde_json::from_str::<RiskAssessment>(&payload) {
                        Ok(assessment) => {
                            tracing::debug!("risk cache hit for {}", key);
                            return assessment;
                        }
                        Err(e) => {
                            tracing::warn!("discarding undecodable risk cache entry {}: {}", key, e)
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("risk cache read failed for {}, computing fresh: {}", key, e)
            }
        }

        let (indicators, score) =
            calculate_risk_indicators(latest, historical, filing_entries, as_of_date);
        let assessment = RiskAssessment { indicators, score };

        match serde_json::to_string(&assessment) {
            Ok(payload) => {
                let sealed = SealedCacheValue::seal(payload).serialize();
                if let Err(e) = self
                    .cache
                    .set(Namespace::Risk, &key, sealed, RISK_CACHE_TTL)
                    .await
                {
                    tracing::warn!("risk cache write failed for {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize risk assessment for {}: {}", key, e),
        }

        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_for_identical_content() {
        let statement = FinancialStatement::default();
        assert_eq!(
            risk_cache_key("123456a", &statement),
            risk_cache_key("123456a", &statement)
        );
    }

    #[test]
    fn cache_key_is_scoped_per_company() {
        let statement = FinancialStatement::default();
        assert_ne!(
            risk_cache_key("123456a", &statement),
            risk_cache_key("654321b", &statement)
        );
    }

    #[test]
    fn cache_key_changes_with_statement_content() {
        let statement = FinancialStatement::default();
        let mut changed = statement.clone();
        changed.assets.total_assets = Some(1.0);

        assert_ne!(
            risk_cache_key("123456a", &statement),
            risk_cache_key("123456a", &changed)
        );
    }

    #[test]
    fn cache_key_embeds_company_and_short_digest() {
        let key = risk_cache_key("123456a", &FinancialStatement::default());
        let mut parts = key.split(':');
        assert_eq!(parts.next(), Some("risk_indicators"));
        assert_eq!(parts.next(), Some("123456a"));
        let digest = parts.next().unwrap();
        assert_eq!(digest.len(), CONTENT_HASH_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! Listing enrichment through the valuation cache.
//!
//! ### Flow per listing
//!
//! 1. Take the lock for the listing's identity
//! 2. Sweep records older than the cache TTL
//! 3. On a cache hit, copy the stored valuation (no fetch, no write)
//! 4. On a miss, fetch candidates, reduce them, store the result
//!
//! The lock spans steps 2 through 4, so a concurrent caller with the same
//! identity either sees the fresh record or waits for it. Distinct
//! identities run in parallel up to the configured concurrency.

mod locks;

use chrono::{DateTime, Utc};
use futures_util::{StreamExt, stream};
use househunt_core::{CacheDb, Listing};
use std::sync::Arc;

use crate::valuation::{ValuationError, ValuationProvider, reduce};
use locks::IdentityLocks;

/// How a listing obtained its valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    CacheHit,
    Fetched,
}

/// Enrichment failure. The listing is left unenriched.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("valuation lookup failed: {0}")]
    Provider(#[from] ValuationError),

    #[error("valuation cache error: {0}")]
    Cache(#[from] househunt_core::Error),
}

/// Summary of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub hits: usize,
    pub fetched: usize,
    pub failed: usize,
}

impl EnrichStats {
    pub fn from_results(results: &[Result<EnrichOutcome, EnrichError>]) -> Self {
        results.iter().fold(Self::default(), |mut stats, result| {
            match result {
                Ok(EnrichOutcome::CacheHit) => stats.hits += 1,
                Ok(EnrichOutcome::Fetched) => stats.fetched += 1,
                Err(_) => stats.failed += 1,
            }
            stats
        })
    }

    pub fn total(&self) -> usize {
        self.hits + self.fetched + self.failed
    }
}

/// Attaches valuations to listings, consulting the cache first.
pub struct Enricher<P> {
    cache: CacheDb,
    provider: P,
    locks: Arc<IdentityLocks>,
    concurrency: usize,
}

impl<P: ValuationProvider> Enricher<P> {
    pub fn new(cache: CacheDb, provider: P) -> Self {
        Self { cache, provider, locks: Arc::new(IdentityLocks::default()), concurrency: 1 }
    }

    /// Maximum listings enriched at once by [`Enricher::enrich_all`]. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    /// Enrich one listing against the wall clock.
    ///
    /// The sweep uses the time the identity lock is taken and the stored
    /// record uses the time of the write.
    pub async fn enrich(&self, listing: &mut Listing) -> Result<EnrichOutcome, EnrichError> {
        self.enrich_inner(listing, None).await
    }

    /// Enrich one listing with `now` used for both the sweep and the write.
    pub async fn enrich_at(&self, listing: &mut Listing, now: DateTime<Utc>) -> Result<EnrichOutcome, EnrichError> {
        self.enrich_inner(listing, Some(now)).await
    }

    async fn enrich_inner(
        &self, listing: &mut Listing, fixed: Option<DateTime<Utc>>,
    ) -> Result<EnrichOutcome, EnrichError> {
        let clock = || fixed.unwrap_or_else(Utc::now);
        let identity = listing.identity();
        let _guard = self.locks.acquire(&identity).await;

        self.cache.sweep_valuations(clock()).await?;

        if let Some(record) = self.cache.get_valuation(&identity).await? {
            tracing::debug!("valuation cache hit for {}", listing.property);
            listing.valuation = Some(record.valuation);
            return Ok(EnrichOutcome::CacheHit);
        }

        let results = self.provider.fetch(&listing.property).await?;
        let valuation = reduce(&results);
        self.cache.upsert_valuation(&identity, listing, &valuation, clock()).await?;
        listing.valuation = Some(valuation);

        tracing::debug!("valuation fetched for {}: {}", listing.property, valuation);
        Ok(EnrichOutcome::Fetched)
    }

    /// Enrich every listing, returning one result per listing in input order.
    ///
    /// Each record is stamped when it is written, not when the batch started.
    /// A failure on one listing does not stop the others.
    pub async fn enrich_all(&self, listings: &mut [Listing]) -> Vec<Result<EnrichOutcome, EnrichError>> {
        let results: Vec<_> = stream::iter(listings.iter_mut())
            .map(|listing| self.enrich(listing))
            .buffered(self.concurrency)
            .collect()
            .await;

        let stats = EnrichStats::from_results(&results);
        tracing::info!(
            total = stats.total(),
            hits = stats.hits,
            fetched = stats.fetched,
            failed = stats.failed,
            "enrichment finished"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::SearchResults;
    use async_trait::async_trait;
    use chrono::Duration;
    use househunt_core::{FieldValue, Property, Valuation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that counts calls and answers with fixed amounts.
    struct MockProvider {
        amounts: Vec<i64>,
        calls: AtomicUsize,
        fail: bool,
        delay: std::time::Duration,
    }

    impl MockProvider {
        fn with_amounts(amounts: &[i64]) -> Self {
            Self { amounts: amounts.to_vec(), calls: AtomicUsize::new(0), fail: false, delay: Default::default() }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::with_amounts(&[]) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ValuationProvider for MockProvider {
        async fn fetch(&self, _property: &Property) -> Result<SearchResults, ValuationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ValuationError::HttpError { status: 503 });
            }
            Ok(SearchResults::with_amounts(&self.amounts))
        }
    }

    fn listing(street: &str) -> Listing {
        Listing {
            property: Property {
                street_address: street.into(),
                city: "Boston".into(),
                state: "MA".into(),
                zip_code: "02101".into(),
                beds: FieldValue::Integer(2),
                baths: FieldValue::Integer(1),
                sq_ft: FieldValue::Integer(950),
                ..Default::default()
            },
            list_price: FieldValue::Integer(340_000),
            status: "Active".into(),
            ..Default::default()
        }
    }

    async fn enricher(provider: MockProvider) -> Enricher<MockProvider> {
        Enricher::new(CacheDb::open_in_memory().await.unwrap(), provider)
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let enricher = enricher(MockProvider::with_amounts(&[300_000, 350_000])).await;
        let mut l = listing("1 Main St");

        let outcome = enricher.enrich(&mut l).await.unwrap();
        assert_eq!(outcome, EnrichOutcome::Fetched);
        assert_eq!(l.valuation, Some(Valuation::Estimate(350_000)));
        assert_eq!(enricher.provider().calls(), 1);

        let record = enricher.cache().get_valuation(&l.identity()).await.unwrap().unwrap();
        assert_eq!(record.valuation, Valuation::Estimate(350_000));
        assert_eq!(record.listing.valuation, Some(Valuation::Estimate(350_000)));
        assert_eq!(enricher.cache().count_valuations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_hit_skips_provider() {
        let enricher = enricher(MockProvider::with_amounts(&[300_000])).await;
        let now = Utc::now();
        let stored = listing("1 Main St");
        enricher
            .cache()
            .upsert_valuation(&stored.identity(), &stored, &Valuation::Estimate(310_000), now - Duration::hours(1))
            .await
            .unwrap();

        let mut l = listing("1 Main St");
        let outcome = enricher.enrich_at(&mut l, now).await.unwrap();
        assert_eq!(outcome, EnrichOutcome::CacheHit);
        assert_eq!(l.valuation, Some(Valuation::Estimate(310_000)));
        assert_eq!(enricher.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_is_cached() {
        let enricher = enricher(MockProvider::with_amounts(&[])).await;
        let mut first = listing("9 Nowhere Rd");
        assert_eq!(enricher.enrich(&mut first).await.unwrap(), EnrichOutcome::Fetched);
        assert_eq!(first.valuation, Some(Valuation::Unavailable));

        let mut second = listing("9 Nowhere Rd");
        assert_eq!(enricher.enrich(&mut second).await.unwrap(), EnrichOutcome::CacheHit);
        assert_eq!(second.valuation, Some(Valuation::Unavailable));
        assert_eq!(enricher.provider().calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_record_is_refetched() {
        let enricher = enricher(MockProvider::with_amounts(&[400_000])).await;
        let now = Utc::now();
        let stored = listing("1 Main St");
        enricher
            .cache()
            .upsert_valuation(&stored.identity(), &stored, &Valuation::Estimate(310_000), now - Duration::hours(13))
            .await
            .unwrap();

        let mut l = listing("1 Main St");
        let outcome = enricher.enrich_at(&mut l, now).await.unwrap();
        assert_eq!(outcome, EnrichOutcome::Fetched);
        assert_eq!(l.valuation, Some(Valuation::Estimate(400_000)));
        assert_eq!(enricher.provider().calls(), 1);

        let record = enricher.cache().get_valuation(&l.identity()).await.unwrap().unwrap();
        assert_eq!(record.last_updated.timestamp(), now.timestamp());
        assert_eq!(enricher.cache().count_valuations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_leaves_listing_unenriched() {
        let enricher = enricher(MockProvider::failing()).await;
        let mut l = listing("1 Main St");

        let result = enricher.enrich(&mut l).await;
        assert!(matches!(result, Err(EnrichError::Provider(ValuationError::HttpError { status: 503 }))));
        assert!(l.valuation.is_none());
        assert_eq!(enricher.cache().count_valuations().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_enrich_all_preserves_order_and_collects_failures() {
        let enricher = enricher(MockProvider::with_amounts(&[500_000])).await.with_concurrency(3);
        let mut listings = vec![listing("1 Main St"), listing("2 Elm St"), listing("3 Oak St")];

        let results = enricher.enrich_all(&mut listings).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| matches!(r, Ok(EnrichOutcome::Fetched))));
        assert_eq!(listings[1].property.street_address, "2 Elm St");
        assert!(listings.iter().all(|l| l.valuation == Some(Valuation::Estimate(500_000))));

        let stats = EnrichStats::from_results(&results);
        assert_eq!(stats, EnrichStats { hits: 0, fetched: 3, failed: 0 });
        assert_eq!(stats.total(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_identities_fetch_once() {
        let provider = MockProvider {
            delay: std::time::Duration::from_millis(20),
            ..MockProvider::with_amounts(&[360_000])
        };
        let enricher = enricher(provider).await.with_concurrency(4);
        let mut listings = vec![listing("1 Main St"); 4];

        let results = enricher.enrich_all(&mut listings).await;
        let stats = EnrichStats::from_results(&results);
        assert_eq!(stats, EnrichStats { hits: 3, fetched: 1, failed: 0 });
        assert_eq!(enricher.provider().calls(), 1);
        assert_eq!(enricher.cache().count_valuations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_records_stamped_at_write_time() {
        let provider = MockProvider {
            delay: std::time::Duration::from_millis(60),
            ..MockProvider::with_amounts(&[300_000])
        };
        let enricher = enricher(provider).await;
        let mut listings = vec![listing("1 Main St"), listing("2 Elm St"), listing("3 Oak St")];

        let before = Utc::now();
        enricher.enrich_all(&mut listings).await;

        let first = enricher.cache().get_valuation(&listings[0].identity()).await.unwrap().unwrap();
        let last = enricher.cache().get_valuation(&listings[2].identity()).await.unwrap().unwrap();
        assert!(first.last_updated > before);
        assert!(last.last_updated - before >= Duration::milliseconds(150));
        assert!(last.last_updated > first.last_updated);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let enricher = enricher(MockProvider::with_amounts(&[])).await.with_concurrency(0);
        assert_eq!(enricher.concurrency, 1);
    }
}

//! The advanced-results entry point used by listing route handlers.

use bson::Document as BsonDocument;
use std::time::Instant;

use crate::errors::QueryError;
use crate::query::{AdvancedResults, RawQuery, ResultsOptions, translate};
use crate::repository::Repository;
use crate::utils::num::{u128_to_u64_saturating, usize_to_u64};
use crate::utils::trace::{self, QueryTrace};

/// Filters, shapes and paginates one listing request.
///
/// The total count (filter only) and the page itself are requested concurrently; both
/// use the offset and limit computed up front. Any repository failure fails the call.
///
/// # Errors
/// `MalformedShapingParameter` from translation, or whatever the repository returns
/// (normally `RepositoryUnavailable`), unmodified.
pub async fn advanced_results<R>(
    raw: &RawQuery,
    repository: &R,
    options: &ResultsOptions,
) -> Result<AdvancedResults<BsonDocument>, QueryError>
where
    R: Repository + ?Sized,
{
    let started = Instant::now();
    let translated = translate(raw, options)?;
    let collection = repository.collection();

    let (total, data) = match tokio::try_join!(
        repository.count(&translated.filter),
        repository.fetch(&translated.find)
    ) {
        Ok(pair) => pair,
        Err(e) => {
            log::warn!("listing {collection} failed: {e}");
            return Err(e);
        }
    };

    let pagination = translated.page.cursors(total);
    let results = AdvancedResults::new(data, pagination);
    trace::record(QueryTrace {
        collection: collection.to_string(),
        duration_ms: u128_to_u64_saturating(started.elapsed().as_millis()),
        total,
        returned: usize_to_u64(results.count),
        page: translated.page.page,
        limit: translated.page.limit,
        skip: translated.page.offset,
    });
    log::debug!(
        "listing {collection}: filter={} total={total} returned={}",
        translated.filter.to_document(),
        results.count
    );
    Ok(results)
}

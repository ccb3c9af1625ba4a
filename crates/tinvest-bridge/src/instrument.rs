//! Free-text query to instrument resolution.

use tinvest_client::{ClientError, InstrumentSearch};
use tinvest_models::{InstrumentKind, InstrumentRef};
use tracing::debug;

use crate::error::ToolError;

/// Takes the first search result as canonical.
///
/// An empty result and a failed search both fold into `NotFound`.
pub async fn resolve<S>(search: &S, query: &str) -> Result<InstrumentRef, ToolError>
where
    S: InstrumentSearch + ?Sized,
{
    let found = match search.find_instrument(query).await {
        Ok(found) => found.into_iter().next(),
        Err(e) => {
            debug!(%query, error = %e, "Instrument search failed");
            None
        }
    };
    found.ok_or_else(|| ToolError::NotFound {
        query: query.to_string(),
    })
}

/// Search results of one kind, in backend order. No match is an empty list.
pub async fn resolve_by_kind<S>(
    search: &S,
    query: &str,
    kind: InstrumentKind,
) -> Result<Vec<InstrumentRef>, ClientError>
where
    S: InstrumentSearch + ?Sized,
{
    let found = search.find_instrument(query).await?;
    Ok(found.into_iter().filter(|i| i.kind == kind).collect())
}

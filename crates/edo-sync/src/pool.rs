//! Bounded fan-out of per-item work.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `tasks` with at most `width` in flight and wait for every one of
/// them. Results come back in input order; a failing task does not stop
/// the others.
pub async fn settle_all<F>(tasks: impl IntoIterator<Item = F>, width: usize) -> Vec<F::Output>
where
    F: Future,
{
    stream::iter(tasks).buffered(width.max(1)).collect().await
}

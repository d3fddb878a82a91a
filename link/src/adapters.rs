//! Consumer adapters built on [`ResultStream::next`].
//!
//! Every adapter that consumes the stream to an end (natural or not)
//! closes it before returning, so the engine execution is always released.

use std::future::Future;
use std::time::Duration;

use crate::{
    error::{LinkError, Result},
    models::ResultItem,
    stream::ResultStream,
};

impl ResultStream {
    /// Collect items until the end of the stream or until `limit` items
    /// were received, whichever comes first. Reaching the limit aborts the
    /// rest of the execution.
    pub async fn list(&mut self, limit: Option<usize>) -> Result<Vec<ResultItem>> {
        let mut items = Vec::new();
        if limit == Some(0) {
            self.close();
            return Ok(items);
        }
        loop {
            match self.next().await {
                Some(Ok(item)) => {
                    items.push(item);
                    if limit.is_some_and(|max| items.len() >= max) {
                        log::debug!(
                            "[JQL_STREAM] stream#{} limit of {} reached, closing",
                            self.id(),
                            items.len()
                        );
                        break;
                    }
                },
                Some(Err(err)) => {
                    self.close();
                    return Err(err);
                },
                None => break,
            }
        }
        self.close();
        Ok(items)
    }

    /// At most `n` items.
    pub async fn first_n(&mut self, n: usize) -> Result<Vec<ResultItem>> {
        self.list(Some(n)).await
    }

    /// The first item, or `None` for an empty result. Never `NotFound`.
    pub async fn first(&mut self) -> Result<Option<ResultItem>> {
        Ok(self.first_n(1).await?.into_iter().next())
    }

    /// The single scalar produced by the query, e.g. by `| count`.
    ///
    /// An empty stream is [`LinkError::NotFound`]; a document where a scalar
    /// was expected is [`LinkError::UnexpectedItem`].
    pub async fn scalar_int(&mut self) -> Result<i64> {
        let result = match self.next().await {
            Some(Ok(ResultItem::Scalar(value))) => match self.next().await {
                None => Ok(value),
                Some(Err(err)) => Err(err),
                Some(Ok(item)) => Err(LinkError::UnexpectedItem(format!(
                    "scalar result followed by {:?}",
                    item
                ))),
            },
            Some(Ok(ResultItem::Document(doc))) => Err(LinkError::UnexpectedItem(format!(
                "expected a scalar result, got document {}",
                doc.id()
            ))),
            Some(Err(err)) => Err(err),
            None => Err(LinkError::NotFound("query produced no scalar result".into())),
        };
        self.close();
        result
    }

    /// Run `callback` for every item until the end of the stream.
    ///
    /// The first callback error aborts the stream and is returned. On
    /// success, returns the number of items processed.
    pub async fn for_each<F>(&mut self, mut callback: F) -> Result<u64>
    where
        F: FnMut(ResultItem) -> Result<()>,
    {
        let mut processed = 0;
        loop {
            let item = match self.next().await {
                Some(Ok(item)) => item,
                Some(Err(err)) => {
                    self.close();
                    return Err(err);
                },
                None => break,
            };
            if let Err(err) = callback(item) {
                log::debug!("[JQL_STREAM] stream#{} callback failed: {}", self.id(), err);
                self.abort();
                self.close();
                return Err(err);
            }
            processed += 1;
        }
        self.close();
        Ok(processed)
    }

    /// Async flavour of [`for_each`](Self::for_each). The next item is not
    /// pulled until the future returned for the previous one completes.
    pub async fn for_each_async<F, Fut>(&mut self, mut callback: F) -> Result<u64>
    where
        F: FnMut(ResultItem) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut processed = 0;
        loop {
            let item = match self.next().await {
                Some(Ok(item)) => item,
                Some(Err(err)) => {
                    self.close();
                    return Err(err);
                },
                None => break,
            };
            if let Err(err) = callback(item).await {
                self.abort();
                self.close();
                return Err(err);
            }
            processed += 1;
        }
        self.close();
        Ok(processed)
    }

    /// Drain the stream discarding items; report only success or the
    /// terminal error.
    pub async fn completion(&mut self) -> Result<()> {
        let result = loop {
            match self.next().await {
                Some(Ok(_)) => continue,
                Some(Err(err)) => break Err(err),
                None => break Ok(()),
            }
        };
        self.close();
        result
    }

    /// [`next`](Self::next) with a deadline. On expiry the stream is aborted
    /// and `Some(Err(LinkError::TimeoutError))` is returned; the following
    /// call yields `None`.
    pub async fn next_timeout(&mut self, timeout: Duration) -> Option<Result<ResultItem>> {
        match tokio::time::timeout(timeout, self.next()).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "[JQL_STREAM] stream#{} no result within {:?}, aborting",
                    self.id(),
                    timeout
                );
                self.abort();
                Some(Err(LinkError::TimeoutError(format!(
                    "no result within {:?}",
                    timeout
                ))))
            },
        }
    }
}

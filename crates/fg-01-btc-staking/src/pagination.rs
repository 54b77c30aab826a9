//! Lazy page streams over paginated gateway queries.
//!
//! A page sequence is a finite [`Stream`] built with `try_unfold`: the cursor
//! is stream state, not a variable threaded through a loop. Each call to
//! `stream()` starts again from the first page.

use crate::error::GatewayResult;
use crate::ports::outbound::{ChainQueryGateway, Page, PageKey};
use futures::stream::{self, Stream, TryStreamExt};
use shared_types::{BtcDelegation, FinalityProvider};
use std::future::Future;

enum Cursor {
    Start,
    Next(PageKey),
    Done,
}

/// Turn a page-fetching function into a stream of page contents.
///
/// Terminates after the first page without a continuation cursor. The first
/// error ends the stream.
pub fn paginate<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = GatewayResult<Vec<T>>> + Send + 'a
where
    T: Send + 'a,
    F: Fn(Option<PageKey>) -> Fut + Send + 'a,
    Fut: Future<Output = GatewayResult<Page<T>>> + Send + 'a,
{
    stream::try_unfold(Cursor::Start, move |cursor| {
        let request = match cursor {
            Cursor::Start => Some(fetch(None)),
            Cursor::Next(key) => Some(fetch(Some(key))),
            Cursor::Done => None,
        };
        async move {
            let Some(request) = request else {
                return Ok(None);
            };
            let page = request.await?;
            let next = match page.continuation() {
                Some(key) => Cursor::Next(key.clone()),
                None => Cursor::Done,
            };
            Ok(Some((page.items, next)))
        }
    })
}

/// Restartable page sequence over one provider's delegations.
pub struct DelegationPages<'a, G: ?Sized> {
    gateway: &'a G,
    fp_btc_pk_hex: &'a str,
}

impl<'a, G: ChainQueryGateway + ?Sized> DelegationPages<'a, G> {
    pub fn new(gateway: &'a G, fp_btc_pk_hex: &'a str) -> Self {
        Self {
            gateway,
            fp_btc_pk_hex,
        }
    }

    /// Fresh stream from the first page.
    pub fn stream(&self) -> impl Stream<Item = GatewayResult<Vec<BtcDelegation>>> + Send + 'a {
        let gateway = self.gateway;
        let fp = self.fp_btc_pk_hex;
        paginate(move |cursor| gateway.list_delegations(fp, cursor))
    }

    /// Collect every delegation across all pages.
    pub async fn collect_all(&self) -> GatewayResult<Vec<BtcDelegation>> {
        self.stream()
            .try_fold(Vec::new(), |mut all, page| async move {
                all.extend(page);
                Ok(all)
            })
            .await
    }
}

/// Restartable page sequence over a consumer chain's finality providers.
pub struct FinalityProviderPages<'a, G: ?Sized> {
    gateway: &'a G,
    consumer_id: &'a str,
}

impl<'a, G: ChainQueryGateway + ?Sized> FinalityProviderPages<'a, G> {
    pub fn new(gateway: &'a G, consumer_id: &'a str) -> Self {
        Self {
            gateway,
            consumer_id,
        }
    }

    pub fn stream(&self) -> impl Stream<Item = GatewayResult<Vec<FinalityProvider>>> + Send + 'a {
        let gateway = self.gateway;
        let consumer_id = self.consumer_id;
        paginate(move |cursor| gateway.list_finality_providers(consumer_id, cursor))
    }

    pub async fn collect_all(&self) -> GatewayResult<Vec<FinalityProvider>> {
        self.stream()
            .try_fold(Vec::new(), |mut all, page| async move {
                all.extend(page);
                Ok(all)
            })
            .await
    }
}

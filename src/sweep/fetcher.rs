//! Cursor-paginated enumeration of every conversation in the service.

use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::conversations::{ConversationDescriptor, ConversationsApi};
use crate::error::FetchError;

enum Cursor {
    First,
    Next(String),
    Done,
}

/// Walks the listing endpoint page by page.
pub struct PageFetcher<'a, C> {
    api: &'a C,
    page_size: u32,
}

impl<'a, C: ConversationsApi> PageFetcher<'a, C> {
    pub fn new(api: &'a C, page_size: u32) -> Self {
        Self { api, page_size }
    }

    /// Lazy, finite sequence of descriptors in platform order.
    ///
    /// Consumes the fetcher: the sequence cannot be restarted. The first
    /// failing page ends the stream with a [`FetchError`].
    pub fn into_stream(self) -> impl Stream<Item = Result<ConversationDescriptor, FetchError>> + 'a {
        let Self { api, page_size } = self;
        stream::try_unfold((Cursor::First, 0usize), move |(cursor, page)| async move {
            let cursor = match cursor {
                Cursor::Done => return Ok::<_, FetchError>(None),
                Cursor::First => None,
                Cursor::Next(c) => Some(c),
            };
            let result = api
                .list_page(cursor.as_deref(), page_size)
                .await
                .map_err(|source| FetchError::Page { page, source })?;

            debug!(page, items = result.items.len(), has_next = result.has_next_page, "fetched page");

            let next = match (result.has_next_page, result.next_cursor) {
                (false, _) => Cursor::Done,
                (true, Some(c)) => Cursor::Next(c),
                (true, None) => return Err(FetchError::MissingCursor { page }),
            };
            let items = stream::iter(result.items.into_iter().map(Ok::<_, FetchError>));
            Ok::<_, FetchError>(Some((items, (next, page + 1))))
        })
        .try_flatten()
    }

    /// Drain every page. All-or-nothing: any page failure discards what was fetched.
    pub async fn fetch_all(self) -> Result<Vec<ConversationDescriptor>, FetchError> {
        self.into_stream().try_collect().await
    }
}

//! Fetch → filter → paginate for one listed scope.
//!
//! Without a search the data source cuts the window itself (`fetch_page`).
//! With a search the whole scope is fetched, narrowed by [`SearchFilter`], and
//! sliced in memory. Totals are re-read on every call.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::{
    domain::{Record, RecordScope, UserId},
    errors::{PaginationError, Result},
    formatting,
    keyboards::pagination_keyboard,
    messaging::types::InlineKeyboard,
    pagination::{PageInfo, PageRequest, Paginator},
    search::{SearchFilter, SearchQuery},
    store::{RecordFilter, RecordSource},
};

/// One rendered-ready page of a scope.
#[derive(Clone, Debug)]
pub struct ListView {
    pub scope: RecordScope,
    pub records: Vec<Record>,
    pub info: PageInfo,
    /// Raw text of the active search, if any.
    pub search: Option<String>,
    /// The requested page when it no longer existed and the last page was shown instead.
    pub clamped_from: Option<usize>,
}

impl ListView {
    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    pub fn render(&self) -> String {
        let title = self.scope.title();
        if self.is_empty() {
            return formatting::render_empty(title, self.search.as_deref());
        }
        let mut text = formatting::render_page(title, &self.records, &self.info, self.search.as_deref());
        if let Some(requested) = self.clamped_from {
            text.push_str(&format!(
                "\n<i>Page {requested} no longer exists; showing the last page.</i>"
            ));
        }
        text
    }

    pub fn keyboard(&self) -> InlineKeyboard {
        pagination_keyboard(&self.info, self.scope, self.search.is_some())
    }
}

/// Fetch rounds for a plain listing before falling back to one full fetch.
const WINDOW_ATTEMPTS: usize = 3;

pub struct ListingService {
    source: Arc<dyn RecordSource>,
    paginator: Paginator,
    filter: SearchFilter,
}

impl ListingService {
    pub fn new(source: Arc<dyn RecordSource>, paginator: Paginator, filter: SearchFilter) -> Self {
        Self {
            source,
            paginator,
            filter,
        }
    }

    pub fn paginator(&self) -> Paginator {
        self.paginator
    }

    pub fn source(&self) -> &Arc<dyn RecordSource> {
        &self.source
    }

    /// Build page `page` of `scope` for `owner`, optionally narrowed by `query`.
    ///
    /// A page past the end re-renders the last existing page and records the
    /// original request in [`ListView::clamped_from`].
    pub async fn list(
        &self,
        owner: UserId,
        scope: RecordScope,
        page: usize,
        query: Option<&SearchQuery>,
    ) -> Result<ListView> {
        let filter = RecordFilter::new(scope, today());
        let query = query.filter(|q| !q.is_empty());

        let view = match query {
            None => self.list_window(owner, filter, page).await?,
            Some(q) => self.list_filtered(owner, filter, page, q).await?,
        };

        tracing::debug!(
            user_id = owner.0,
            scope = scope.key(),
            page = view.info.current_page,
            total = view.info.total_items,
            searching = view.search.is_some(),
            "listing page"
        );
        Ok(view)
    }

    async fn list_window(&self, owner: UserId, filter: RecordFilter, page: usize) -> Result<ListView> {
        let size = self.paginator.page_size();
        let requested = page.max(1);
        let mut page = requested;

        for _ in 0..WINDOW_ATTEMPTS {
            let (records, total) = self
                .source
                .fetch_page(owner, filter, self.paginator.offset(page), size)
                .await?;
            let (resolved, _) = self.resolve_page(page, total)?;
            if resolved == page {
                return Ok(ListView {
                    scope: filter.scope,
                    info: self.paginator.page_info(page, total),
                    records,
                    search: None,
                    clamped_from: (page != requested).then_some(requested),
                });
            }
            // The set shrank past this page; the window and the total must come from one fetch.
            page = resolved;
        }

        tracing::debug!(
            user_id = owner.0,
            scope = filter.scope.key(),
            page = requested,
            "window kept moving, listing from one full fetch"
        );
        let all = self.source.fetch_all(owner, filter).await?;
        let (page, clamped_from) = self.resolve_page(requested, all.len())?;
        let (slice, info) = self.paginator.paginate(&all, page);
        Ok(ListView {
            scope: filter.scope,
            records: slice.to_vec(),
            info,
            search: None,
            clamped_from,
        })
    }

    async fn list_filtered(
        &self,
        owner: UserId,
        filter: RecordFilter,
        page: usize,
        query: &SearchQuery,
    ) -> Result<ListView> {
        let all = self.source.fetch_all(owner, filter).await?;
        let matched = self.filter.apply(all, query, filter.scope.search_fields());

        let (page, clamped_from) = self.resolve_page(page.max(1), matched.len())?;
        let (slice, info) = self.paginator.paginate(&matched, page);

        Ok(ListView {
            scope: filter.scope,
            records: slice.to_vec(),
            info,
            search: Some(query.raw.clone()),
            clamped_from,
        })
    }

    /// Validate `page`; an out-of-range page falls back to the last one.
    fn resolve_page(&self, page: usize, total: usize) -> Result<(usize, Option<usize>)> {
        let request = PageRequest {
            page,
            page_size: self.paginator.page_size(),
            total_items: total,
        };
        match request.resolve() {
            Ok(info) if info.is_empty() => {
                Ok((1, (info.current_page > 1).then_some(info.current_page)))
            }
            Ok(info) => Ok((info.current_page, None)),
            Err(PaginationError::OutOfRange { page, total_pages }) if total_pages > 0 => {
                Ok((total_pages, Some(page)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

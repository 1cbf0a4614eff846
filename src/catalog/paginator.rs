use std::{collections::VecDeque, future::Future};

use crate::{
    error::Result,
    types::{Cursor, Identified, Page},
};

/// How the cursor for the next page is derived from the page just fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRule {
    /// Next cursor is the last item's identifier ("fetch after this ID").
    Token,
    /// Next cursor is the number of items fetched so far.
    Offset,
}

/// Lazily walks a paged collection, one item at a time.
///
/// The fetch function is called with the current cursor whenever the buffered
/// page runs dry. The stream ends at the first empty page and stays ended;
/// a paginator cannot be restarted.
pub struct Paginator<T, F> {
    fetch: F,
    rule: CursorRule,
    cursor: Cursor,
    buffer: VecDeque<T>,
    fetched: u32,
    pages: u32,
    done: bool,
}

impl<T, F, Fut> Paginator<T, F>
where
    T: Identified,
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(rule: CursorRule, fetch: F) -> Self {
        Self::starting_at(rule, Cursor::Start, fetch)
    }

    pub fn starting_at(rule: CursorRule, cursor: Cursor, fetch: F) -> Self {
        Self {
            fetch,
            rule,
            cursor,
            buffer: VecDeque::new(),
            fetched: 0,
            pages: 0,
            done: false,
        }
    }

    /// Next item, fetching a new page if needed. `Ok(None)` once exhausted.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.buffer.is_empty() && !self.done {
            self.fill().await?;
        }
        Ok(self.buffer.pop_front())
    }

    /// Drains the remaining items into a vector.
    pub async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Number of non-empty pages fetched so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn is_done(&self) -> bool {
        self.done && self.buffer.is_empty()
    }

    async fn fill(&mut self) -> Result<()> {
        let page = (self.fetch)(self.cursor.clone()).await?;
        tracing::trace!(cursor = ?self.cursor, items = page.items.len(), "page fetched");

        let Some(last) = page.items.last() else {
            self.done = true;
            return Ok(());
        };

        self.fetched += page.items.len() as u32;
        self.pages += 1;
        self.cursor = match self.rule {
            CursorRule::Token => Cursor::After(last.id().to_string()),
            CursorRule::Offset => Cursor::Offset(self.fetched),
        };
        self.buffer.extend(page.items);
        Ok(())
    }
}

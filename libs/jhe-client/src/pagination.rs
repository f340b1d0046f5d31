//! Following FHIR search results across pages
//!
//! The Exchange pages FHIR searches with `next` links and is known to repeat
//! records on page boundaries. [`PageWalker`] removes the repeats, honours an
//! optional limit, and stops following links once a page brings nothing new,
//! so a page made only of repeats cannot loop forever.
//!
//! The walker does no I/O. It tells its driver what to do next through
//! [`Step`]: [`walk`] drives it with a blocking fetch function, and
//! [`crate::JheClient`] drives it with async HTTP.

use crate::error::{Error, Result};
use jhe_models::{unwrap_entry, Bundle};
use serde_json::Value;
use std::collections::HashSet;
use std::iter::FusedIterator;

/// What the driver of a [`PageWalker`] should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Hand this record to the consumer.
    Entry(Value),
    /// Fetch this URL and pass the page to [`PageWalker::load`].
    Fetch(String),
    /// The walk is over.
    Done,
}

#[derive(Debug)]
pub struct PageWalker {
    entries: std::vec::IntoIter<Value>,
    next_url: Option<String>,
    page_had_new: bool,
    seen: HashSet<String>,
    yielded: usize,
    limit: Option<usize>,
    pages: usize,
    done: bool,
}

impl PageWalker {
    /// Start a walk at `first`. `limit` caps the number of entries produced;
    /// `None` means no cap.
    pub fn new(first: Bundle, limit: Option<usize>) -> Self {
        let mut walker = Self {
            entries: Vec::new().into_iter(),
            next_url: None,
            page_had_new: false,
            seen: HashSet::new(),
            yielded: 0,
            limit,
            pages: 0,
            done: false,
        };
        walker.load(first);
        walker
    }

    /// Continue with the page fetched for the last [`Step::Fetch`].
    pub fn load(&mut self, page: Bundle) {
        self.pages += 1;
        self.next_url = page.next_link().map(str::to_string);
        self.entries = page.entry.unwrap_or_default().into_iter();
        self.page_had_new = false;
        tracing::debug!(
            page = self.pages,
            entries = self.entries.len(),
            has_next = self.next_url.is_some(),
            "loaded result page"
        );
    }

    /// Advance the walk.
    ///
    /// An entry without a usable `id` is an error and ends the walk.
    pub fn step(&mut self) -> Result<Step> {
        if self.done || self.limit.is_some_and(|limit| self.yielded >= limit) {
            self.done = true;
            return Ok(Step::Done);
        }

        for entry in self.entries.by_ref() {
            let record = unwrap_entry(entry);
            let id = match entry_id(&record) {
                Ok(id) => id,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };
            if !self.seen.insert(id.clone()) {
                // the server repeats records across page boundaries
                tracing::trace!(id, page = self.pages, "skipping duplicate entry");
                continue;
            }
            self.page_had_new = true;
            self.yielded += 1;
            return Ok(Step::Entry(record));
        }

        match self.next_url.take() {
            Some(url) if self.page_had_new => Ok(Step::Fetch(url)),
            _ => {
                self.done = true;
                Ok(Step::Done)
            }
        }
    }

    /// End the walk early, e.g. after a failed fetch.
    pub fn finish(&mut self) {
        self.done = true;
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Entries produced so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Pages loaded so far, the first one included.
    pub fn pages(&self) -> usize {
        self.pages
    }
}

/// Dedup key of a record: its `id`, string or number.
fn entry_id(record: &Value) -> Result<String> {
    match record.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(Error::InvalidFieldValue(format!("entry id {other}"))),
        None => Err(Error::MissingField("entry.id".into())),
    }
}

/// Lazy, deduplicated entries of `initial` and the pages after it.
///
/// `fetch_next` is called with each `next` URL, and only when the consumer
/// asks for an entry past the end of the current page. A fetch error is
/// returned in place of that entry and ends the walk.
pub fn walk<F>(initial: Bundle, fetch_next: F, limit: Option<usize>) -> Walk<F>
where
    F: FnMut(&str) -> Result<Bundle>,
{
    Walk {
        walker: PageWalker::new(initial, limit),
        fetch_next,
    }
}

/// Iterator returned by [`walk`].
pub struct Walk<F> {
    walker: PageWalker,
    fetch_next: F,
}

impl<F> Walk<F> {
    pub fn walker(&self) -> &PageWalker {
        &self.walker
    }
}

impl<F> Iterator for Walk<F>
where
    F: FnMut(&str) -> Result<Bundle>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.step() {
                Ok(Step::Entry(entry)) => return Some(Ok(entry)),
                Ok(Step::Fetch(url)) => match (self.fetch_next)(&url) {
                    Ok(page) => self.walker.load(page),
                    Err(e) => {
                        self.walker.finish();
                        return Some(Err(e));
                    }
                },
                Ok(Step::Done) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<F> FusedIterator for Walk<F> where F: FnMut(&str) -> Result<Bundle> {}

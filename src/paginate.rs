// ABOUTME: Cursor-driven pagination over a PageSource
// ABOUTME: Blocks for the server-reported reset window when the call budget runs out

use crate::api::PageSource;
use crate::model::Page;
use crate::Result;
use std::time::Duration;
use tracing::{debug, warn};

/// Blocking wait used between pages when the rate limit is exhausted.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Walks the cursor chain of one universe, one page at a time.
///
/// There is no page cap: a server that never returns an empty cursor
/// keeps the loop going.
pub struct Paginator<'a, S: PageSource, Z: Sleeper> {
    source: &'a S,
    sleeper: &'a Z,
    universe_id: &'a str,
    cursor: Option<String>,
    wait: Option<Duration>,
    finished: bool,
    pages: usize,
}

impl<'a, S: PageSource, Z: Sleeper> Paginator<'a, S, Z> {
    pub fn new(source: &'a S, sleeper: &'a Z, universe_id: &'a str) -> Self {
        Paginator {
            source,
            sleeper,
            universe_id,
            cursor: None,
            wait: None,
            finished: false,
            pages: 0,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Fetches the next page, or `None` once the cursor chain has ended.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        if self.finished {
            return Ok(None);
        }

        if let Some(wait) = self.wait.take() {
            warn!(seconds = wait.as_secs(), "rate limited, waiting for reset");
            self.sleeper.sleep(wait);
        }

        let page = self
            .source
            .fetch_page(self.universe_id, self.cursor.as_deref())?;
        self.pages += 1;

        debug!(
            page = self.pages,
            entries = page.entries.len(),
            remaining = page.rate.remaining,
            more = !page.is_last(),
            "fetched page"
        );

        if page.rate.remaining <= 1 {
            self.wait = Some(Duration::from_secs(page.rate.reset_seconds));
        }

        match &page.next_cursor {
            Some(cursor) => self.cursor = Some(cursor.clone()),
            None => self.finished = true,
        }

        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RateLimit;
    use crate::Error;
    use std::cell::RefCell;

    struct ScriptedSource {
        pages: RefCell<Vec<Result<Page>>>,
        cursors: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page>>) -> Self {
            ScriptedSource {
                pages: RefCell::new(pages.into_iter().rev().collect()),
                cursors: RefCell::new(vec![]),
            }
        }
    }

    impl PageSource for ScriptedSource {
        fn fetch_page(&self, _universe_id: &str, cursor: Option<&str>) -> Result<Page> {
            self.cursors.borrow_mut().push(cursor.map(String::from));
            self.pages
                .borrow_mut()
                .pop()
                .expect("fetched past the last page")
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        waits: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.waits.borrow_mut().push(duration);
        }
    }

    fn page(next: Option<&str>, remaining: i64, reset_seconds: u64) -> Result<Page> {
        Ok(Page {
            entries: vec![],
            next_cursor: next.map(String::from),
            rate: RateLimit {
                remaining,
                reset_seconds,
            },
        })
    }

    #[test]
    fn test_follows_cursor_chain() {
        let source = ScriptedSource::new(vec![
            page(Some("a"), 50, 0),
            page(Some("b"), 49, 0),
            page(None, 48, 0),
        ]);
        let sleeper = RecordingSleeper::default();
        let mut paginator = Paginator::new(&source, &sleeper, "1");

        while paginator.next_page().unwrap().is_some() {}

        assert_eq!(paginator.pages(), 3);
        assert_eq!(
            *source.cursors.borrow(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
        assert!(sleeper.waits.borrow().is_empty());
        assert!(paginator.next_page().unwrap().is_none());
    }

    #[test]
    fn test_waits_before_next_call_when_budget_exhausted() {
        let source = ScriptedSource::new(vec![page(Some("a"), 1, 7), page(None, 60, 0)]);
        let sleeper = RecordingSleeper::default();
        let mut paginator = Paginator::new(&source, &sleeper, "1");

        paginator.next_page().unwrap();
        assert!(sleeper.waits.borrow().is_empty());

        paginator.next_page().unwrap();
        assert_eq!(*sleeper.waits.borrow(), vec![Duration::from_secs(7)]);
    }

    #[test]
    fn test_no_wait_after_last_page() {
        let source = ScriptedSource::new(vec![page(None, 0, 30)]);
        let sleeper = RecordingSleeper::default();
        let mut paginator = Paginator::new(&source, &sleeper, "1");

        while paginator.next_page().unwrap().is_some() {}
        assert!(sleeper.waits.borrow().is_empty());
    }

    #[test]
    fn test_fetch_error_propagates() {
        let source = ScriptedSource::new(vec![
            page(Some("a"), 10, 0),
            Err(Error::MalformedReference("boom".into())),
        ]);
        let sleeper = RecordingSleeper::default();
        let mut paginator = Paginator::new(&source, &sleeper, "1");

        assert!(paginator.next_page().is_ok());
        assert!(paginator.next_page().is_err());
    }
}

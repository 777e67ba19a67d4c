//! Result iterator
//!
//! Yields records from a point lookup or a store cursor. Scan results are
//! filtered through the residual predicate as they are pulled, so the
//! iterator is the unit of backpressure.
//!
//! # States
//!
//! - Single: a point lookup result, yielded at most once
//! - Streaming: an open store cursor
//! - Closed: exhausted, failed or closed by the caller
//!
//! The store cursor is closed on exhaustion, on the first store error, on
//! `close()` and on drop, whichever comes first.

use std::mem;

use tracing::debug;

use crate::planner::PredicateExpr;
use crate::store::{Record, RecordCursor};

use super::errors::QueryResult;

enum IterState<C: RecordCursor> {
    Single(Option<Record>),
    Streaming {
        cursor: C,
        predicate: Option<PredicateExpr>,
    },
    Closed,
}

/// Records returned by a query
pub struct RecordIter<C: RecordCursor> {
    state: IterState<C>,
    returned: usize,
    skipped: usize,
}

impl<C: RecordCursor> RecordIter<C> {
    /// Iterator over a point lookup result (zero or one record)
    pub fn single(record: Option<Record>) -> Self {
        Self::with_state(IterState::Single(record))
    }

    /// Iterator over a store cursor, keeping only records that pass `predicate`
    pub fn streaming(cursor: C, predicate: Option<PredicateExpr>) -> Self {
        Self::with_state(IterState::Streaming { cursor, predicate })
    }

    fn with_state(state: IterState<C>) -> Self {
        Self {
            state,
            returned: 0,
            skipped: 0,
        }
    }

    /// Releases the underlying cursor. Idempotent.
    pub fn close(&mut self) {
        let state = mem::replace(&mut self.state, IterState::Closed);
        if let IterState::Streaming { mut cursor, .. } = state {
            cursor.close();
            debug!(
                returned = self.returned,
                skipped = self.skipped,
                "closed query cursor"
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, IterState::Closed)
    }

    /// Records rejected by the residual predicate so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<C: RecordCursor> Iterator for RecordIter<C> {
    type Item = QueryResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match &mut self.state {
            IterState::Closed => return None,
            IterState::Single(record) => {
                let record = record.take();
                self.state = IterState::Closed;
                return record.map(|r| {
                    self.returned += 1;
                    Ok(r)
                });
            }
            IterState::Streaming { cursor, predicate } => loop {
                match cursor.next() {
                    Some(Ok(record)) => {
                        if predicate.as_ref().map_or(true, |p| p.matches(&record.bins)) {
                            break Some(Ok(record));
                        }
                        self.skipped += 1;
                    }
                    Some(Err(err)) => break Some(Err(err)),
                    None => break None,
                }
            },
        };

        match next {
            Some(Ok(record)) => {
                self.returned += 1;
                Some(Ok(record))
            }
            Some(Err(err)) => {
                self.close();
                Some(Err(err.into()))
            }
            None => {
                self.close();
                None
            }
        }
    }
}

impl<C: RecordCursor> Drop for RecordIter<C> {
    fn drop(&mut self) {
        self.close();
    }
}

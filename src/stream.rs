//! Cancellable pull-based stream of authorship records.

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::model::{AuthorshipRecord, StreamStatus};

/// Wraps a fallible record producer.
///
/// Yields records until the producer is exhausted, the token is cancelled, or
/// the producer reports an error. It never yields past that point, and the
/// reason is available from [`RecordStream::status`].
pub struct RecordStream<I> {
    inner: I,
    cancel: CancellationToken,
    status: StreamStatus,
    yielded: u64,
}

impl<I> RecordStream<I>
where
    I: Iterator<Item = Result<AuthorshipRecord>>,
{
    pub fn new(inner: I, cancel: CancellationToken) -> Self {
        Self {
            inner,
            cancel,
            status: StreamStatus::Running,
            yielded: 0,
        }
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn into_status(self) -> StreamStatus {
        self.status
    }

    /// Records yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }
}

/// Stream over records that cannot fail.
pub fn from_records<J>(
    records: J,
    cancel: CancellationToken,
) -> RecordStream<impl Iterator<Item = Result<AuthorshipRecord>>>
where
    J: IntoIterator<Item = AuthorshipRecord>,
{
    RecordStream::new(records.into_iter().map(Ok), cancel)
}

impl<I> Iterator for RecordStream<I>
where
    I: Iterator<Item = Result<AuthorshipRecord>>,
{
    type Item = AuthorshipRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.status != StreamStatus::Running {
            return None;
        }
        if self.cancel.is_cancelled() {
            debug!(records = self.yielded, "record stream cancelled");
            self.status = StreamStatus::Cancelled;
            return None;
        }
        match self.inner.next() {
            Some(Ok(record)) => {
                self.yielded += 1;
                Some(record)
            }
            Some(Err(e)) => {
                warn!(error = %e, records = self.yielded, "record stream failed, keeping partial results");
                self.status = StreamStatus::Failed {
                    error: e.to_string(),
                };
                None
            }
            None => {
                self.status = StreamStatus::Complete;
                None
            }
        }
    }
}

//! Stale-response guard for page loads.
//!
//! Every page owns a [`RequestTracker`]. Each load takes a [`Ticket`]; a
//! result is only committed while its ticket is the newest one and the page
//! has not been left. Leaving the page cancels whatever is still in flight.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::PosResult;

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    token: CancellationToken,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct RequestTracker {
    page: &'static str,
    generation: AtomicU64,
    token: Mutex<CancellationToken>,
}

impl RequestTracker {
    pub fn new(page: &'static str) -> Self {
        Self {
            page,
            generation: AtomicU64::new(0),
            token: Mutex::new(CancellationToken::new()),
        }
    }

    fn page_token(&self) -> CancellationToken {
        match self.token.lock() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Start a load. Any earlier ticket becomes stale.
    pub fn begin(&self) -> Ticket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            generation,
            token: self.page_token().child_token(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        !ticket.token.is_cancelled() && self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Cancel in-flight loads and invalidate outstanding tickets.
    pub fn leave(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut token = match self.token.lock() {
            Ok(token) => token,
            Err(poisoned) => poisoned.into_inner(),
        };
        token.cancel();
        *token = CancellationToken::new();
        debug!(page = self.page, "page left, pending loads cancelled");
    }

    /// Drive `load` under `ticket`. Returns `Ok(None)` when the result
    /// arrived stale or the page was left before it completed; a stale
    /// failure is dropped the same way.
    pub async fn run<T, F>(&self, ticket: Ticket, load: F) -> PosResult<Option<T>>
    where
        F: Future<Output = PosResult<T>>,
    {
        let result = tokio::select! {
            _ = ticket.token.cancelled() => None,
            r = load => Some(r),
        };
        match result {
            None => Ok(None),
            Some(r) => {
                if self.is_current(&ticket) {
                    r.map(Some)
                } else {
                    debug!(
                        page = self.page,
                        generation = ticket.generation,
                        "discarding stale response"
                    );
                    Ok(None)
                }
            }
        }
    }
}

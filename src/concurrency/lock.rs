//! Page-level lock management for strict two-phase locking.
//!
//! Every page access made through the buffer pool first takes a shared or
//! exclusive lock here. Locks are only ever released all at once, when their
//! transaction completes. A request that cannot be granted waits on a condition
//! variable; before waiting, the requester's edges in the waits-for graph are
//! refreshed and the request fails if they close a cycle.

use crate::error::{AbortReason, DbError, Result};
use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Lock modes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Shared lock for read operations.
    Shared,
    /// Exclusive lock for write operations.
    Exclusive,
}

impl LockMode {
    /// Checks if this lock mode is compatible with another.
    pub fn is_compatible_with(&self, other: &LockMode) -> bool {
        matches!((self, other), (LockMode::Shared, LockMode::Shared))
    }

    /// True if holding `self` already satisfies a request for `requested`.
    fn covers(&self, requested: LockMode) -> bool {
        *self == LockMode::Exclusive || requested == LockMode::Shared
    }
}

/// Waits-for graph: tid -> set of tids it is blocked on.
#[derive(Debug, Default)]
struct DeadlockDetector {
    wait_for: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl DeadlockDetector {
    fn set_edges(&mut self, waiter: TransactionId, holders: HashSet<TransactionId>) {
        self.wait_for.insert(waiter, holders);
    }

    fn clear_edges(&mut self, waiter: TransactionId) {
        self.wait_for.remove(&waiter);
    }

    fn remove_transaction(&mut self, tid: TransactionId) {
        self.wait_for.remove(&tid);
        for wait_set in self.wait_for.values_mut() {
            wait_set.remove(&tid);
        }
    }

    /// True if `waiter` is reachable from any transaction it waits for.
    fn has_cycle_through(&self, waiter: TransactionId) -> bool {
        let Some(direct) = self.wait_for.get(&waiter) else {
            return false;
        };

        let mut visited = HashSet::new();
        let mut queue: VecDeque<TransactionId> = direct.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if current == waiter {
                return true;
            }
            if visited.insert(current) {
                if let Some(next) = self.wait_for.get(&current) {
                    queue.extend(next.iter().copied());
                }
            }
        }

        false
    }
}

#[derive(Debug, Default)]
struct LockTable {
    /// Granted locks per page.
    holders: HashMap<PageId, HashMap<TransactionId, LockMode>>,
    /// Pages locked per transaction.
    held: HashMap<TransactionId, HashSet<PageId>>,
    detector: DeadlockDetector,
}

impl LockTable {
    /// Other transactions whose granted locks conflict with the request.
    fn blockers(
        &self,
        tid: TransactionId,
        page_id: PageId,
        mode: LockMode,
    ) -> HashSet<TransactionId> {
        self.holders
            .get(&page_id)
            .map(|granted| {
                granted
                    .iter()
                    .filter(|(holder, held)| **holder != tid && !held.is_compatible_with(&mode))
                    .map(|(holder, _)| *holder)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn grant(&mut self, tid: TransactionId, page_id: PageId, mode: LockMode) {
        self.holders.entry(page_id).or_default().insert(tid, mode);
        self.held.entry(tid).or_default().insert(page_id);
        self.detector.clear_edges(tid);
    }

    fn mode_held(&self, tid: TransactionId, page_id: PageId) -> Option<LockMode> {
        self.holders
            .get(&page_id)
            .and_then(|granted| granted.get(&tid))
            .copied()
    }
}

/// Shared/exclusive page locks with deadlock detection and a bounded wait.
#[derive(Debug)]
pub struct LockManager {
    table: Mutex<LockTable>,
    released: Condvar,
    timeout: Duration,
}

impl LockManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Mutex::new(LockTable::default()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Blocks until `tid` holds `page_id` in at least `mode`.
    ///
    /// A shared lock held by `tid` alone is upgraded in place. Fails with
    /// `TransactionAborted` when waiting would deadlock or exceeds the
    /// configured bound; the caller must then abort the transaction.
    pub fn acquire(&self, tid: TransactionId, page_id: PageId, mode: LockMode) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut table = self.table.lock();

        loop {
            if let Some(held) = table.mode_held(tid, page_id) {
                if held.covers(mode) {
                    table.detector.clear_edges(tid);
                    return Ok(());
                }
            }

            let blockers = table.blockers(tid, page_id, mode);
            if blockers.is_empty() {
                table.grant(tid, page_id, mode);
                log::trace!("{} granted {:?} on {}", tid, mode, page_id);
                return Ok(());
            }

            log::debug!("{} waits for {:?} on {} held by {:?}", tid, mode, page_id, blockers);
            table.detector.set_edges(tid, blockers);
            if table.detector.has_cycle_through(tid) {
                table.detector.clear_edges(tid);
                log::info!("{} aborted: deadlock on {}", tid, page_id);
                return Err(DbError::TransactionAborted {
                    tid,
                    reason: AbortReason::Deadlock,
                });
            }

            if self.released.wait_until(&mut table, deadline).timed_out() {
                table.detector.clear_edges(tid);
                log::info!("{} aborted: lock wait on {} timed out", tid, page_id);
                return Err(DbError::TransactionAborted {
                    tid,
                    reason: AbortReason::LockTimeout,
                });
            }
        }
    }

    /// Releases every lock `tid` holds and wakes all waiters.
    pub fn release_all(&self, tid: TransactionId) {
        let mut table = self.table.lock();
        if let Some(pages) = table.held.remove(&tid) {
            for page_id in pages {
                if let Some(granted) = table.holders.get_mut(&page_id) {
                    granted.remove(&tid);
                    if granted.is_empty() {
                        table.holders.remove(&page_id);
                    }
                }
            }
        }
        table.detector.remove_transaction(tid);
        drop(table);

        self.released.notify_all();
    }

    pub fn holds_lock(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.table.lock().mode_held(tid, page_id).is_some()
    }

    pub fn lock_mode(&self, tid: TransactionId, page_id: PageId) -> Option<LockMode> {
        self.table.lock().mode_held(tid, page_id)
    }

    /// Pages currently locked by `tid`, in page order.
    pub fn pages_held(&self, tid: TransactionId) -> Vec<PageId> {
        let table = self.table.lock();
        let mut pages: Vec<PageId> = table
            .held
            .get(&tid)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default();
        pages.sort();
        pages
    }
}

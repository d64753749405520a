//! Admission control for memory-hard hashing.
//!
//! The budget is a fixed number of slots, each worth `slot_kib` of Argon2
//! memory (the current policy's memory cost). A computation takes as many
//! slots as its own memory cost needs, so aggregate memory never exceeds
//! `slots x slot_kib` even when a stored hash is heavier than the policy.
//! Callers wait in FIFO order up to a timeout and are shed with
//! [`HashError::Busy`] after that.
//!
//! The controller is an ordinary value shared via `Arc`, not a global, so
//! tests can build one per case.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::error::HashError;

/// Aggregate memory budget used when none is configured (512 MiB).
pub const DEFAULT_MEMORY_BUDGET_KIB: u64 = 512 * 1024;

/// How long a caller waits for a slot by default.
pub const DEFAULT_ADMISSION_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest slot count; `acquire_many` takes a `u32`.
const MAX_SLOTS: usize = u32::MAX as usize;

/// Number of slots that fit `budget_kib` when each computation needs
/// `memory_cost_kib`. Never less than one.
pub fn slots_for_budget(budget_kib: u64, memory_cost_kib: u32) -> usize {
    let per_slot = u64::from(memory_cost_kib.max(1));
    usize::try_from(budget_kib / per_slot)
        .unwrap_or(usize::MAX)
        .clamp(1, MAX_SLOTS.min(Semaphore::MAX_PERMITS))
}

/// Point-in-time view of the controller, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmissionStats {
    pub slots_total: usize,
    pub slots_available: usize,
    /// Computations currently holding slots.
    pub in_flight: usize,
    pub memory_budget_kib: u64,
    pub memory_reserved_kib: u64,
    pub admitted_total: u64,
    pub rejected_total: u64,
}

#[derive(Debug)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    slot_kib: u32,
    active: Arc<AtomicUsize>,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

impl AdmissionController {
    /// Create a controller with `slots` slots (at least one) of `slot_kib`
    /// each.
    pub fn new(slots: usize, slot_kib: u32) -> Self {
        let capacity = slots.clamp(1, MAX_SLOTS.min(Semaphore::MAX_PERMITS));
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            slot_kib: slot_kib.max(1),
            active: Arc::new(AtomicUsize::new(0)),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Slots a computation with `memory_cost_kib` must hold. Rounds up.
    pub fn slots_needed(&self, memory_cost_kib: u32) -> usize {
        let needed = memory_cost_kib.div_ceil(self.slot_kib).max(1);
        usize::try_from(needed).unwrap_or(usize::MAX)
    }

    /// Whether a computation of `memory_cost_kib` could ever be admitted.
    pub fn fits_budget(&self, memory_cost_kib: u32) -> bool {
        self.slots_needed(memory_cost_kib) <= self.capacity
    }

    /// Reserve one slot, waiting at most `timeout`.
    pub async fn admit(&self, timeout: Duration) -> Result<AdmissionTicket, HashError> {
        self.admit_slots(1, timeout).await
    }

    /// Reserve enough slots for a computation of `memory_cost_kib`, waiting
    /// at most `timeout`.
    pub async fn admit_memory(
        &self,
        memory_cost_kib: u32,
        timeout: Duration,
    ) -> Result<AdmissionTicket, HashError> {
        self.admit_slots(self.slots_needed(memory_cost_kib), timeout).await
    }

    /// Reserve one slot only if it is free immediately.
    pub fn try_admit(&self) -> Result<AdmissionTicket, HashError> {
        self.try_admit_slots(1)
    }

    /// A zero timeout only succeeds if the slots are free right now.
    /// Dropping the returned future before it resolves leaves the queue
    /// untouched.
    async fn admit_slots(
        &self,
        slots: usize,
        timeout: Duration,
    ) -> Result<AdmissionTicket, HashError> {
        if slots > self.capacity {
            return Err(self.reject("exceeds memory budget"));
        }
        if timeout.is_zero() {
            return self.try_admit_slots(slots);
        }

        let started = Instant::now();
        let acquire = Arc::clone(&self.semaphore).acquire_many_owned(slots as u32);
        match tokio::time::timeout(timeout, acquire).await {
            Ok(Ok(permit)) => Ok(self.issue(permit, started)),
            Ok(Err(_closed)) => Err(self.reject("closed")),
            Err(_elapsed) => Err(self.reject("timeout")),
        }
    }

    fn try_admit_slots(&self, slots: usize) -> Result<AdmissionTicket, HashError> {
        if slots > self.capacity {
            return Err(self.reject("exceeds memory budget"));
        }
        match Arc::clone(&self.semaphore).try_acquire_many_owned(slots as u32) {
            Ok(permit) => Ok(self.issue(permit, Instant::now())),
            Err(TryAcquireError::NoPermits) => Err(self.reject("no free slot")),
            Err(TryAcquireError::Closed) => Err(self.reject("closed")),
        }
    }

    /// Stop admitting. Queued and future callers get [`HashError::Busy`];
    /// tickets already issued stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
        tracing::info!(in_flight = self.in_flight(), "Admission closed");
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_flight(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn memory_budget_kib(&self) -> u64 {
        self.capacity as u64 * u64::from(self.slot_kib)
    }

    /// Memory currently reserved by admitted computations.
    pub fn memory_reserved_kib(&self) -> u64 {
        self.capacity.saturating_sub(self.available()) as u64 * u64::from(self.slot_kib)
    }

    pub fn stats(&self) -> AdmissionStats {
        let slots_available = self.available();
        AdmissionStats {
            slots_total: self.capacity,
            slots_available,
            in_flight: self.in_flight(),
            memory_budget_kib: self.memory_budget_kib(),
            memory_reserved_kib: self.capacity.saturating_sub(slots_available) as u64
                * u64::from(self.slot_kib),
            admitted_total: self.admitted.load(Ordering::Relaxed),
            rejected_total: self.rejected.load(Ordering::Relaxed),
        }
    }

    fn issue(&self, permit: OwnedSemaphorePermit, started: Instant) -> AdmissionTicket {
        self.admitted.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            slots = permit.num_permits(),
            waited_ms = started.elapsed().as_millis() as u64,
            in_flight = self.in_flight(),
            "Admitted hashing request"
        );
        AdmissionTicket {
            _permit: permit,
            active: Arc::clone(&self.active),
            admitted_at: Instant::now(),
        }
    }

    fn reject(&self, reason: &'static str) -> HashError {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            reason,
            slots = self.capacity,
            in_flight = self.in_flight(),
            "Hashing request shed"
        );
        HashError::Busy
    }
}

/// A reserved slot. The slot is returned exactly once, when the ticket is
/// dropped, on every exit path.
#[derive(Debug)]
#[must_use = "dropping the ticket releases the slot immediately"]
pub struct AdmissionTicket {
    _permit: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
    admitted_at: Instant,
}

impl AdmissionTicket {
    /// Time since the slot was granted.
    pub fn held_for(&self) -> Duration {
        self.admitted_at.elapsed()
    }
}

impl Drop for AdmissionTicket {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        tracing::trace!(held_ms = self.held_for().as_millis() as u64, "Released hashing slot");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

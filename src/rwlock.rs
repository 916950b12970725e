//! A reader/writer lock with explicit starvation-avoidance handoff.
//!
//! [`std::sync::RwLock`] makes no fairness guarantee: a steady stream of
//! readers can starve a waiting writer (or vice versa, depending on the
//! platform's pthread implementation). This lock instead tracks the
//! counts of current and waiting readers/writers itself, plus a one-shot
//! `change` flag, so that a writer releasing its lock admits *all*
//! currently-waiting readers as a single batch before any later writer
//! can cut back in — the thing that actually prevents reader starvation.
//!
//! The protocol (the four `rcount`/`wcount`/`rwait`/`wwait`/`change`
//! rules below) is the ported body of a `pthread_mutex_t` +
//! `pthread_cond_t` pair; only the RAII guard surface on top is this
//! crate's own.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};

struct State {
    rcount: usize,
    wcount: usize,
    rwait: usize,
    wwait: usize,
    change: bool,
}

impl State {
    const fn new() -> Self {
        State {
            rcount: 0,
            wcount: 0,
            rwait: 0,
            wwait: 0,
            change: false,
        }
    }
}

/// A blocking reader/writer lock guarding a value of type `T`.
pub(crate) struct RwLock<T: ?Sized> {
    state: Mutex<State>,
    can_read: Condvar,
    can_write: Condvar,
    data: std::cell::UnsafeCell<T>,
}

// SAFETY: access to `data` is only ever granted while `state` attests
// that the calling thread holds a read or write slot; the rules enforced
// through `state` give the same aliasing guarantees std's RwLock does.
unsafe impl<T: ?Sized + Send> Send for RwLock<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    pub(crate) fn new(data: T) -> Self {
        RwLock {
            state: Mutex::new(State::new()),
            can_read: Condvar::new(),
            can_write: Condvar::new(),
            data: std::cell::UnsafeCell::new(data),
        }
    }
}

impl<T: ?Sized> RwLock<T> {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("rwlock state mutex poisoned")
    }

    fn acquire_read(&self) {
        let mut state = self.lock_state();
        if state.wcount + state.wwait > 0 && !state.change {
            loop {
                state.rwait += 1;
                state = self
                    .can_read
                    .wait(state)
                    .expect("rwlock state mutex poisoned");
                state.rwait -= 1;
                if !(state.wcount > 0 && !state.change) {
                    break;
                }
            }
        }
        state.change = false;
        state.rcount += 1;
        log::trace!("rwlock: reader admitted (rcount={})", state.rcount);
    }

    fn release_read(&self) {
        let mut state = self.lock_state();
        state.rcount -= 1;
        let notify_writer = state.rcount == 0 && state.wwait > 0;
        if notify_writer {
            self.can_write.notify_one();
        }
        log::trace!(
            "rwlock: reader released (rcount={}, notified_writer={notify_writer})",
            state.rcount
        );
    }

    fn acquire_write(&self) {
        let mut state = self.lock_state();
        while state.rcount + state.wcount > 0 || state.change {
            state.wwait += 1;
            state = self
                .can_write
                .wait(state)
                .expect("rwlock state mutex poisoned");
            state.wwait -= 1;
        }
        state.wcount += 1;
        log::trace!("rwlock: writer admitted");
    }

    fn release_write(&self) {
        let mut state = self.lock_state();
        state.wcount -= 1;
        if state.rwait > 0 {
            // Hand off to every reader currently queued, as one batch,
            // before any later writer gets a chance to cut back in.
            state.change = true;
            log::trace!("rwlock: writer released, handing off to {} readers", state.rwait);
            self.can_read.notify_all();
        } else if state.wwait > 0 {
            log::trace!("rwlock: writer released, notifying one waiting writer");
            self.can_write.notify_one();
        } else {
            log::trace!("rwlock: writer released (wcount={})", state.wcount);
        }
    }

    /// Blocks until a read slot is available, returning an RAII guard.
    pub(crate) fn read_lock(&self) -> RwLockReadGuard<'_, T> {
        self.acquire_read();
        RwLockReadGuard { lock: self }
    }

    /// Blocks until exclusive write access is available, returning an
    /// RAII guard.
    pub(crate) fn write_lock(&self) -> RwLockWriteGuard<'_, T> {
        self.acquire_write();
        RwLockWriteGuard { lock: self }
    }

    /// Acquires a read slot without producing a guard.
    ///
    /// Used by the tree's path-descent machinery, which acquires a read
    /// lock on a node, then needs to look up one of its children *while
    /// still holding that lock* before deciding whether to descend
    /// further — a shape RAII guards tied to a single lexical scope
    /// don't fit when the lock must outlive the stack frame that took it
    /// and be released by an entirely separate, later call over the same
    /// path. Every `raw_read_lock` must be paired with exactly one
    /// `raw_read_unlock`.
    pub(crate) fn raw_read_lock(&self) {
        self.acquire_read();
    }

    /// Releases a read slot taken with [`Self::raw_read_lock`].
    pub(crate) fn raw_read_unlock(&self) {
        self.release_read();
    }

    /// Reads the protected value without acquiring a lock of its own.
    ///
    /// # Safety
    /// The caller must already hold a read or write lock on `self` —
    /// via a guard, or via [`Self::raw_read_lock`] — for as long as the
    /// returned reference is used.
    pub(crate) unsafe fn data_unchecked(&self) -> &T {
        &*self.data.get()
    }

    /// Mutably accesses the protected value without acquiring a lock of
    /// its own.
    ///
    /// # Safety
    /// The caller must hold a write lock that dominates `self` — either
    /// directly, or transitively via an ancestor node's write lock under
    /// the tree's locking discipline (see `tree::Tree::move_to`) — for
    /// as long as the returned reference is used, and must not alias it
    /// with any other live reference obtained this way.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn data_unchecked_mut(&self) -> &mut T {
        &mut *self.data.get()
    }
}

/// RAII guard granting shared read access to a [`RwLock`]'s data.
pub(crate) struct RwLockReadGuard<'a, T: ?Sized> {
    lock: &'a RwLock<T>,
}

impl<'a, T: ?Sized> Deref for RwLockReadGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding this guard is exactly holding a read slot.
        unsafe { self.lock.data_unchecked() }
    }
}

impl<'a, T: ?Sized> Drop for RwLockReadGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// RAII guard granting exclusive write access to a [`RwLock`]'s data.
pub(crate) struct RwLockWriteGuard<'a, T: ?Sized> {
    lock: &'a RwLock<T>,
}

impl<'a, T: ?Sized> Deref for RwLockWriteGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding this guard is exactly holding the write slot.
        unsafe { self.lock.data_unchecked() }
    }
}

impl<'a, T: ?Sized> DerefMut for RwLockWriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: holding this guard is exactly holding the write slot.
        unsafe { self.lock.data_unchecked_mut() }
    }
}

impl<'a, T: ?Sized> Drop for RwLockWriteGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

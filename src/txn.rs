//! Transaction boundary: pre-commit notification.
//!
//! A [`LineSink`](crate::LineSink) publishes its output at the *pre-commit*
//! point of the host's transaction. The only capability it needs from the
//! host is expressed by [`TransactionNotifier`]: register a callback to run
//! once, just before the active transaction commits, unless that transaction
//! is read-only. Hosts with a real transaction manager implement the trait;
//! [`Transaction`] is a minimal in-process implementation for standalone jobs
//! and tests.

use std::sync::Mutex;

use crate::error::{SinkError, SinkResult};

/// One-shot callback invoked at the pre-commit phase of a transaction.
pub type PreCommit = Box<dyn FnOnce() -> SinkResult<()> + Send>;

/// Capability to run a callback once, just before the active transaction
/// commits.
pub trait TransactionNotifier: Send + Sync {
    /// Register `callback` to run exactly once at pre-commit.
    ///
    /// Implementations for read-only transactions may drop the callback
    /// without running it. The callback must not be invoked synchronously
    /// from within this method.
    ///
    /// # Errors
    /// [`SinkError::State`] if no transaction is active, e.g. it has already
    /// committed.
    fn on_pre_commit(&self, callback: PreCommit) -> SinkResult<()>;
}

/// Minimal in-process transaction.
///
/// Stages pre-commit callbacks and runs them, in registration order, exactly
/// once at [`commit`](Transaction::commit). A read-only transaction accepts
/// registrations but drops them unrun.
pub struct Transaction {
    inner: Mutex<Staged>,
}

struct Staged {
    read_only: bool,
    committed: bool,
    callbacks: Vec<PreCommit>,
}

impl Transaction {
    /// A read-write transaction.
    pub fn new() -> Self {
        Self::with_read_only(false)
    }

    /// A read-only transaction: registered callbacks are never run.
    pub fn read_only() -> Self {
        Self::with_read_only(true)
    }

    fn with_read_only(read_only: bool) -> Self {
        Self {
            inner: Mutex::new(Staged {
                read_only,
                committed: false,
                callbacks: Vec::new(),
            }),
        }
    }

    /// Run all staged callbacks in registration order, then finish.
    ///
    /// The transaction is marked committed before the callbacks run, so a
    /// second `commit` fails regardless of callback outcomes.
    ///
    /// # Errors
    /// The first callback error aborts the commit; remaining callbacks are
    /// dropped unrun.
    pub fn commit(&self) -> SinkResult<()> {
        let callbacks = {
            let mut staged = self.inner.lock().unwrap();
            if staged.committed {
                return Err(SinkError::State("transaction already committed"));
            }
            staged.committed = true;
            std::mem::take(&mut staged.callbacks)
        };
        for callback in callbacks {
            callback()?;
        }
        Ok(())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionNotifier for Transaction {
    fn on_pre_commit(&self, callback: PreCommit) -> SinkResult<()> {
        let mut staged = self.inner.lock().unwrap();
        if staged.committed {
            return Err(SinkError::State("transaction already committed"));
        }
        if !staged.read_only {
            staged.callbacks.push(callback);
        }
        Ok(())
    }
}

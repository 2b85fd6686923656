//! Transactions over game state.
//!
//! A transaction keeps the state it started from plus a log of named
//! operations, each optionally carrying a snapshot. Because `GameState` is
//! built on persistent collections, a snapshot is a cheap structural clone.
//!
//! Rolling back hands the caller a state to continue from; the manager never
//! owns the live state.

use tracing::{debug, error};

use crate::core::GameState;

/// One logged step of a transaction.
#[derive(Clone, Debug)]
pub struct Operation {
    pub description: String,
    /// State right before the step ran, if the caller provided one.
    pub snapshot: Option<GameState>,
}

#[derive(Clone, Debug)]
struct Pending {
    initial: GameState,
    operations: Vec<Operation>,
}

/// Begin / commit / rollback bookkeeping for one engine.
#[derive(Clone, Debug, Default)]
pub struct TransactionManager {
    pending: Option<Pending>,
    committed: u64,
    rolled_back: u64,
}

impl TransactionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transaction from `state`.
    ///
    /// Beginning while another transaction is pending logs an error and
    /// replaces the stale one.
    pub fn begin(&mut self, state: &GameState) {
        if let Some(stale) = &self.pending {
            error!(
                operations = stale.operations.len(),
                "transaction begun while another was pending; discarding the stale one"
            );
        }
        self.pending = Some(Pending {
            initial: state.clone(),
            operations: Vec::new(),
        });
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Operations logged so far in the pending transaction.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        self.pending.as_ref().map(|p| p.operations.as_slice()).unwrap_or(&[])
    }

    /// Log an operation. Ignored (with an error log) if nothing is pending.
    pub fn add_operation(&mut self, description: impl Into<String>, snapshot: Option<&GameState>) {
        let description = description.into();
        let Some(pending) = self.pending.as_mut() else {
            error!(%description, "operation logged outside a transaction");
            return;
        };
        pending.operations.push(Operation {
            description,
            snapshot: snapshot.cloned(),
        });
    }

    /// Close the pending transaction, keeping its changes.
    ///
    /// Returns false if nothing was pending.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.committed += 1;
                debug!(operations = pending.operations.len(), "transaction committed");
                true
            }
            None => {
                error!("commit without a pending transaction");
                false
            }
        }
    }

    /// Abandon the pending transaction, returning the state it began from.
    pub fn rollback(&mut self) -> Option<GameState> {
        let Some(pending) = self.pending.take() else {
            error!("rollback without a pending transaction");
            return None;
        };
        self.rolled_back += 1;
        debug!(operations = pending.operations.len(), "transaction rolled back");
        Some(pending.initial)
    }

    /// Undo operations from `index` onwards, keeping earlier ones.
    ///
    /// Returns the snapshot taken before operation `index` (the initial
    /// state for index 0). The transaction stays pending. `None` if the
    /// index is out of range or that operation carried no snapshot.
    pub fn rollback_to(&mut self, index: usize) -> Option<GameState> {
        let pending = self.pending.as_mut()?;
        if index >= pending.operations.len() {
            return None;
        }
        let state = if index == 0 {
            pending.initial.clone()
        } else {
            pending.operations[index].snapshot.clone()?
        };
        pending.operations.truncate(index);
        debug!(index, "partial rollback");
        Some(state)
    }

    /// Run `op` on a working copy of `state` inside a transaction.
    ///
    /// `Ok` commits and returns the new state. `Err` rolls back and returns
    /// the error; `state` itself is never touched.
    pub fn run<E>(
        &mut self,
        state: &GameState,
        description: &str,
        op: impl FnOnce(&mut GameState) -> Result<(), E>,
    ) -> Result<GameState, E> {
        self.begin(state);
        self.add_operation(description, None);
        let mut working = state.clone();
        match op(&mut working) {
            Ok(()) => {
                self.commit();
                Ok(working)
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    /// Transactions committed since creation.
    #[must_use]
    pub fn committed_count(&self) -> u64 {
        self.committed
    }

    /// Transactions rolled back since creation.
    #[must_use]
    pub fn rolled_back_count(&self) -> u64 {
        self.rolled_back
    }
}

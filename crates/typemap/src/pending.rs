//! Deferred registrations and the per-thread skip stack that guards their flush.

use crate::entity::EntityRef;
use crate::error::{TypeMapError, TypeMapErrorExt};
use crate::map::{State, TypeMap};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::Location;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

#[derive(Debug)]
pub(crate) struct PendingRecord {
    pub(crate) entity: EntityRef,
    pub(crate) origin: &'static Location<'static>,
}

#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    queue: Mutex<VecDeque<PendingRecord>>,
}

impl PendingQueue {
    pub(crate) fn push(&self, record: PendingRecord) {
        self.queue.lock().push_back(record);
    }

    fn pop(&self) -> Option<PendingRecord> {
        self.queue.lock().pop_front()
    }

    fn requeue(&self, records: Vec<PendingRecord>) {
        if !records.is_empty() {
            self.queue.lock().extend(records);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

/// Entities that must not be registered by flushes running on the current thread.
///
/// Each lookup pushes its skip set for its whole duration, so nested lookups issued from
/// resolvers or loaders still honor the sets of every enclosing lookup.
#[derive(Debug, Default)]
pub(crate) struct SkipRegister {
    stacks: Mutex<FxHashMap<ThreadId, Vec<Vec<EntityRef>>>>,
}

impl SkipRegister {
    pub(crate) fn push(&self, set: Vec<EntityRef>) -> SkipGuard<'_> {
        self.stacks.lock().entry(thread::current().id()).or_default().push(set);
        SkipGuard { owner: self }
    }

    pub(crate) fn contains(&self, entity: &EntityRef) -> bool {
        let stacks = self.stacks.lock();
        stacks.get(&thread::current().id()).is_some_and(|stack| {
            stack.iter().flatten().any(|skipped| Arc::ptr_eq(skipped, entity))
        })
    }
}

/// Pops the skip set pushed by [`SkipRegister::push`].
#[derive(Debug)]
pub(crate) struct SkipGuard<'a> {
    owner: &'a SkipRegister,
}

impl Drop for SkipGuard<'_> {
    fn drop(&mut self) {
        let id = thread::current().id();
        let mut stacks = self.owner.stacks.lock();
        if let Some(stack) = stacks.get_mut(&id) {
            stack.pop();
            if stack.is_empty() {
                stacks.remove(&id);
            }
        }
    }
}

impl TypeMap {
    /// Queues `entity` for registration on the next lookup that flushes.
    ///
    /// The caller location is recorded and reported if the deferred registration fails.
    #[track_caller]
    pub fn postpone_registration(&self, entity: EntityRef) {
        if entity.is_registered() {
            return;
        }
        let origin = Location::caller();
        debug!(key = %entity.key(), %origin, "Registration postponed");
        self.state().pending.push(PendingRecord { entity, origin });
    }

    /// Registers every pending entity that is not registered yet.
    ///
    /// Entities in a skip set of the current thread are put back in the queue. A failure
    /// stops the flush: entities registered so far stay registered and the remainder stays
    /// queued.
    pub(crate) fn register_pending(&self, state: &State) -> Result<(), TypeMapError> {
        if state.pending.is_empty() {
            return Ok(());
        }

        let mut skipped = Vec::new();
        let mut flushed = 0_usize;
        let outcome = loop {
            let Some(record) = state.pending.pop() else {
                break Ok(());
            };
            if record.entity.is_registered() {
                continue;
            }
            if state.skip.contains(&record.entity) {
                skipped.push(record);
                continue;
            }
            if let Err(err) = self.register_entity(Arc::clone(&record.entity)) {
                break Err::<(), _>(err).context(format!("Defined at: {}", record.origin));
            }
            flushed += 1;
        };

        if flushed > 0 || !skipped.is_empty() {
            debug!(flushed, skipped = skipped.len(), "Pending registrations flushed");
        }
        state.pending.requeue(skipped);
        outcome
    }
}

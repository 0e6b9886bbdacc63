//! Assignment orchestration.
//!
//! The only component that writes grids. Every change follows the same
//! pipeline:
//!
//! 1. **Validate**: directory lookups only, no store access
//! 2. **Lock**: owner key, every resource of the old and new week, and
//!    every journal entry intersecting those
//! 3. **Replay**: finish any interrupted commit on the locked grids
//! 4. **Detect**: scan the new week; any conflict rejects the whole
//!    submission with nothing written
//! 5. **Journal**: record the final state of every grid about to change
//! 6. **Propagate**: clear stale bookings, bind new ones, write the owner
//! 7. **Retire**: drop the journal entry
//!
//! Readers never block on writers. A read replays pending writes for the
//! grid it returns only when it can lock them immediately.

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::detector::{self, ConflictDetector, SlotStatus};
use super::journal::{PendingLog, PendingWrite};
use super::locks::{LockSet, LockTable};
use super::propagation::Propagation;
use super::request::{
    Availability, AvailabilityQuery, Holder, LabeledBooking, LabeledCell, Labeler, OwnerView,
    ResourceView, WeekSubmission,
};
use crate::config::SchedulerConfig;
use crate::directory::{Directory, Scope};
use crate::error::ScheduleError;
use crate::models::{OwnerGrid, OwnerId, ResourceGrid, ResourceId, WeekEntry};
use crate::store::{GridStore, Store, StoreError, StoreKey};
use crate::validation::{check_owner, check_resource, parse_slot, validate_submission};

/// Accepts owner weeks and keeps resource grids in step with them.
///
/// # Examples
/// ```
/// use u_timetable::directory::{MemoryDirectory, OwnerInfo, ResourceInfo, Scope, SubjectInfo};
/// use u_timetable::models::WeekEntry;
/// use u_timetable::scheduler::{Orchestrator, WeekSubmission};
/// use u_timetable::store::MemoryStore;
///
/// let directory = MemoryDirectory::new()
///     .with_owner(OwnerInfo::class("ClassA", "III CSE A"))
///     .with_subject(SubjectInfo::new("S1", "CS301", "Operating Systems"))
///     .with_resource(ResourceInfo::staff("F1", "Dr. Rao"));
/// let orchestrator = Orchestrator::new(MemoryStore::new(), directory);
///
/// let week = vec![WeekEntry::new("Mon", 1, "S1").with_primary("F1")];
/// orchestrator
///     .submit(&WeekSubmission::new("ClassA", week), &Scope::Global)
///     .unwrap();
///
/// let f1 = orchestrator.resource_grid(&"F1".into(), &Scope::Global).unwrap();
/// assert_eq!(f1.occupied_count(), 1);
/// ```
#[derive(Debug)]
pub struct Orchestrator<S, D> {
    store: GridStore<S>,
    directory: D,
    config: SchedulerConfig,
    locks: LockTable,
    journal: PendingLog,
}

impl<S: Store, D: Directory> Orchestrator<S, D> {
    pub fn new(store: S, directory: D) -> Self {
        Self {
            store: GridStore::new(store),
            directory,
            config: SchedulerConfig::default(),
            locks: LockTable::new(),
            journal: PendingLog::new(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &GridStore<S> {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Replaces the owner's whole week.
    ///
    /// Slots not listed become vacant and their resource bookings are
    /// released. Either every touched grid reflects the new week, or the
    /// call fails and (for `PropagationIncomplete`) the remaining writes
    /// are replayed by the next access.
    ///
    /// # Returns
    /// The committed owner grid.
    #[instrument(skip_all, fields(owner = %submission.owner_id))]
    pub fn submit(
        &self,
        submission: &WeekSubmission,
        scope: &Scope,
    ) -> Result<OwnerGrid, ScheduleError> {
        let week = validate_submission(submission, &self.directory, scope, self.config.auto_staff)
            .map_err(ScheduleError::Validation)?;
        self.commit(&submission.owner_id, |_| week.clone())
    }

    /// Sets a single cell, keeping the rest of the owner's week.
    ///
    /// A vacant `entry` clears the cell.
    #[instrument(skip_all, fields(owner = %owner, day = %entry.day, period = entry.period))]
    pub fn assign_cell(
        &self,
        owner: &OwnerId,
        entry: &WeekEntry,
        scope: &Scope,
    ) -> Result<OwnerGrid, ScheduleError> {
        let single = WeekSubmission::new(owner.clone(), vec![entry.clone()]);
        let parsed = validate_submission(&single, &self.directory, scope, self.config.auto_staff)
            .map_err(ScheduleError::Validation)?;
        let slot = parse_slot(&entry.day, entry.period)?;
        let cell = parsed.cell_at(slot).clone();
        self.commit(owner, |old| old.clone().with_cell(slot, cell.clone()))
    }

    /// Vacates the owner's week and releases all its bookings.
    #[instrument(skip_all, fields(owner = %owner))]
    pub fn clear_owner(&self, owner: &OwnerId, scope: &Scope) -> Result<(), ScheduleError> {
        check_owner(owner, &self.directory, scope)?;
        self.commit(owner, |_| OwnerGrid::default()).map(|_| ())
    }

    /// The owner's stored week; all vacant if never submitted.
    pub fn owner_grid(&self, owner: &OwnerId, scope: &Scope) -> Result<OwnerGrid, ScheduleError> {
        check_owner(owner, &self.directory, scope)?;
        self.settle(StoreKey::Owner(owner.clone()))?;
        Ok(self.store.load_owner(owner)?.unwrap_or_default())
    }

    /// The resource's stored week; all free if never referenced.
    pub fn resource_grid(
        &self,
        resource: &ResourceId,
        scope: &Scope,
    ) -> Result<ResourceGrid, ScheduleError> {
        check_resource(resource, &self.directory, scope)?;
        self.settle(StoreKey::Resource(resource.clone()))?;
        Ok(self.store.load_resource(resource)?.unwrap_or_default())
    }

    /// Owner week with subject and resource labels.
    pub fn fetch_owner(&self, owner: &OwnerId, scope: &Scope) -> Result<OwnerView, ScheduleError> {
        let grid = self.owner_grid(owner, scope)?;
        let labels = Labeler::new(&self.directory);
        Ok(OwnerView {
            owner: labels.owner(owner),
            grid: grid.map(|_, cell| LabeledCell {
                subject: cell.subject.as_ref().map(|s| labels.subject(s)),
                primary: cell.primary.as_ref().map(|r| labels.resource(r)),
                secondary: cell.secondary.as_ref().map(|r| labels.resource(r)),
            }),
        })
    }

    /// Resource week with owner and subject labels.
    pub fn fetch_resource(
        &self,
        resource: &ResourceId,
        scope: &Scope,
    ) -> Result<ResourceView, ScheduleError> {
        let info = check_resource(resource, &self.directory, scope)?;
        self.settle(StoreKey::Resource(resource.clone()))?;
        let grid = self.store.load_resource(resource)?.unwrap_or_default();
        let labels = Labeler::new(&self.directory);
        Ok(ResourceView {
            resource: labels.resource(resource),
            kind: info.kind,
            utilization: grid.utilization(),
            grid: grid.map(|_, booking| {
                booking.as_ref().map(|b| LabeledBooking {
                    owner: labels.owner(&b.owner),
                    subject: labels.subject(&b.subject),
                })
            }),
        })
    }

    /// Whether a resource is free at one slot.
    ///
    /// Bookings of `excluding_owner_id` count as free, so an owner editing
    /// its own week sees its current bookings as available.
    pub fn availability(
        &self,
        query: &AvailabilityQuery,
        scope: &Scope,
    ) -> Result<Availability, ScheduleError> {
        let slot = parse_slot(&query.day, query.period)?;
        check_resource(&query.resource_id, &self.directory, &Scope::Global)?;
        if let Some(owner) = &query.excluding_owner_id {
            check_owner(owner, &self.directory, scope)?;
        }

        self.settle(StoreKey::Resource(query.resource_id.clone()))?;
        let grid = self.store.load_resource(&query.resource_id)?;

        let status = detector::check(
            grid.as_ref(),
            &query.resource_id,
            slot,
            query.excluding_owner_id.as_ref(),
        );
        Ok(match status {
            SlotStatus::Free | SlotStatus::OwnedBySelf => Availability {
                free: true,
                conflict: None,
            },
            SlotStatus::Conflict(c) => {
                let labels = Labeler::new(&self.directory);
                Availability {
                    free: false,
                    conflict: Some(Holder {
                        owner_label: labels.owner(&c.conflicting_owner_id).text,
                        subject_label: labels.subject(&c.conflicting_subject_id).text,
                        owner_id: c.conflicting_owner_id,
                        subject_id: c.conflicting_subject_id,
                    }),
                }
            }
        })
    }

    /// Replays every journaled commit. Call once at startup.
    ///
    /// # Returns
    /// Number of commits completed.
    #[instrument(skip_all)]
    pub fn recover(&self) -> Result<usize, ScheduleError> {
        let journal = self.journal.snapshot(&self.store)?;
        let mut replayed = 0;
        for entry in journal.entries() {
            let started = Instant::now();
            let keys = entry.keys();
            let count = keys.len();
            let _lease = self
                .locks
                .acquire(keys, self.config.lock_timeout())
                .ok_or_else(|| busy(started, count))?;
            if self.journal.snapshot(&self.store)?.get(&entry.owner) == Some(entry) {
                self.replay(entry)?;
                replayed += 1;
            }
        }
        if replayed > 0 {
            info!(replayed, "recovered interrupted commits");
        }
        Ok(replayed)
    }

    fn commit(
        &self,
        owner: &OwnerId,
        plan: impl Fn(&OwnerGrid) -> OwnerGrid,
    ) -> Result<OwnerGrid, ScheduleError> {
        let lease = self.lock_for(owner, &plan)?;

        let previous = self.store.load_owner(owner)?;
        let old = previous.clone().unwrap_or_default();
        let week = plan(&old);

        let mut detector = ConflictDetector::new(&self.store);
        let conflicts = detector.scan(owner, &week)?;
        if !conflicts.is_empty() {
            info!(%owner, conflicts = conflicts.len(), "submission rejected");
            return Err(ScheduleError::Conflict(conflicts));
        }
        for resource in old.resources() {
            detector.preload(&resource)?;
        }

        let loaded = detector.into_loaded();
        let propagation = Propagation::plan(owner, previous.as_ref(), &week, loaded);
        if propagation.is_noop() {
            debug!(%owner, "week unchanged");
            return Ok(week);
        }

        self.journal.record(&self.store, propagation.pending())?;
        propagation.apply(&self.store).map_err(|source| {
            warn!(%owner, error = %source, "propagation interrupted, pending writes kept");
            ScheduleError::PropagationIncomplete {
                owner: owner.clone(),
                source,
            }
        })?;
        if let Err(e) = self.journal.retire(&self.store, owner) {
            warn!(%owner, error = %e, "committed but journal entry not retired");
        }
        drop(lease);

        info!(
            %owner,
            cells = week.occupied_count(),
            resources = propagation.touched(),
            "week committed"
        );
        Ok(week)
    }

    /// Locks every key the commit will touch.
    ///
    /// The set is planned without locks, so it is re-derived once held. If
    /// it grew meanwhile (another commit changed the old week, or a journal
    /// entry appeared), the lease is dropped and a larger set requested.
    fn lock_for(
        &self,
        owner: &OwnerId,
        plan: &impl Fn(&OwnerGrid) -> OwnerGrid,
    ) -> Result<LockSet<'_>, ScheduleError> {
        let started = Instant::now();
        let mut wanted = self.required_keys(owner, plan)?;

        for attempt in 1..=self.config.lock_attempts.max(1) {
            let remaining = self.config.lock_timeout().saturating_sub(started.elapsed());
            let count = wanted.len();
            let lease = self
                .locks
                .acquire(wanted, remaining)
                .ok_or_else(|| busy(started, count))?;

            self.replay_covered(&lease)?;
            let required = self.required_keys(owner, plan)?;
            if lease.covers(&required) {
                return Ok(lease);
            }
            debug!(%owner, attempt, "lock set grew, re-planning");
            wanted = required.union(lease.keys()).cloned().collect();
        }
        Err(busy(started, wanted.len()))
    }

    fn required_keys(
        &self,
        owner: &OwnerId,
        plan: &impl Fn(&OwnerGrid) -> OwnerGrid,
    ) -> Result<BTreeSet<StoreKey>, StoreError> {
        let old = self.store.load_owner(owner)?.unwrap_or_default();
        let week = plan(&old);
        let mut keys: BTreeSet<StoreKey> = old
            .resources()
            .into_iter()
            .chain(week.resources())
            .map(StoreKey::Resource)
            .collect();
        keys.insert(StoreKey::Owner(owner.clone()));
        self.journal.snapshot(&self.store)?.close_over(&mut keys);
        Ok(keys)
    }

    /// Replays journal entries lying entirely inside `lease`.
    fn replay_covered(&self, lease: &LockSet<'_>) -> Result<(), ScheduleError> {
        let journal = self.journal.snapshot(&self.store)?;
        for entry in journal.involving(lease.keys()) {
            if lease.covers(&entry.keys()) {
                self.replay(entry)?;
            }
        }
        Ok(())
    }

    /// Replays entries writing `key` whose grids are free right now.
    fn settle(&self, key: StoreKey) -> Result<(), ScheduleError> {
        let journal = self.journal.snapshot(&self.store)?;
        if journal.is_empty() {
            return Ok(());
        }
        let wanted = BTreeSet::from([key]);
        for entry in journal.involving(&wanted) {
            let Some(_lease) = self.locks.try_acquire(entry.keys()) else {
                debug!(owner = %entry.owner, "pending writes held by a commit, reading as is");
                continue;
            };
            if self.journal.snapshot(&self.store)?.get(&entry.owner) == Some(entry) {
                self.replay(entry)?;
            }
        }
        Ok(())
    }

    fn replay(&self, entry: &PendingWrite) -> Result<(), ScheduleError> {
        entry
            .apply(&self.store)
            .map_err(|source| ScheduleError::PropagationIncomplete {
                owner: entry.owner.clone(),
                source,
            })?;
        self.journal.retire(&self.store, &entry.owner)?;
        info!(owner = %entry.owner, resources = entry.resources.len(), "replayed pending writes");
        Ok(())
    }
}

fn busy(started: Instant, keys: usize) -> ScheduleError {
    ScheduleError::Busy {
        waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        keys,
    }
}

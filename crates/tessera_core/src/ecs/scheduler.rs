//! # System Scheduler
//!
//! Decides the order in which registered systems execute each frame and
//! drives the three per-frame phases over that order.
//!
//! ## Scheduling model
//!
//! Each system carries a priority and zero or more dependency edges;
//! `depends_on(a, b)` means *a runs after b within the same frame*. The
//! scheduler derives a single linear **work order** from both inputs:
//!
//! 1. Systems connected through the dependency relation (direction
//!    ignored) form a **priority group**; a group's priority is the
//!    maximum of its members', so a low-priority system that feeds a
//!    high-priority one is pulled forward with it.
//! 2. Groups are concatenated by descending priority, ties resolved by
//!    discovery order.
//! 3. Within a group, a topological sort over the directed edges places
//!    every prerequisite before its dependents. A cycle is detected and
//!    reported; it never hangs the traversal.
//!
//! The work order is recomputed only on an explicit
//! [`Scheduler::compute_work_order`] call after registration or graph
//! changes settle, never per frame. Frames then walk the cached order
//! three times (`pre_update`, `update`, `post_update`), skipping inactive
//! systems without ever reordering them.
//!
//! Everything here is strictly single-threaded and synchronous.

use std::collections::{BTreeMap, BTreeSet};

use super::error::CoreError;
use super::system::{System, SystemId, SystemPriority, LOWEST_SYSTEM_PRIORITY};

/// Positional snapshot of the active flag of every system in the work
/// order. Captured by [`Scheduler::work_state`] and restored by
/// [`Scheduler::set_work_state`].
pub type WorkStateMask = Vec<bool>;

/// Vertex colour for the iterative depth-first traversal.
const WHITE: u8 = 0;
/// On the traversal stack; meeting a grey vertex again closes a cycle.
const GREY: u8 = 1;
/// Fully processed.
const BLACK: u8 = 2;

/// Per-system bookkeeping owned by the scheduler.
struct SystemEntry {
    /// The schedulable unit itself.
    system: Box<dyn System>,
    /// Higher runs earlier (subject to dependencies).
    priority: SystemPriority,
    /// Inactive systems keep their work-order position but receive no
    /// phase calls.
    active: bool,
}

/// Owner of the dependency graph, the computed work order, and the
/// per-frame phase walk.
///
/// # Example
///
/// ```rust,ignore
/// let mut scheduler = Scheduler::new();
/// scheduler.register(INPUT, InputSystem::default())?;
/// scheduler.register(PHYSICS, PhysicsSystem::default())?;
/// scheduler.add_dependency(PHYSICS, INPUT)?; // physics after input
/// scheduler.compute_work_order()?;
///
/// scheduler.pre_update(dt);
/// scheduler.update(dt);
/// scheduler.post_update(dt);
/// ```
pub struct Scheduler {
    /// Registered systems, keyed by their stable type id.
    entries: BTreeMap<SystemId, SystemEntry>,
    /// `depends_on[a]` holds every `b` that must run before `a`.
    depends_on: BTreeMap<SystemId, BTreeSet<SystemId>>,
    /// Registration sequence; seeds group discovery deterministically.
    registration_order: Vec<SystemId>,
    /// Cached linear execution order, rebuilt by `compute_work_order`.
    work_order: Vec<SystemId>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            depends_on: BTreeMap::new(),
            registration_order: Vec::new(),
            work_order: Vec::new(),
        }
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a system under `id` with the lowest priority.
    ///
    /// The system joins the work order on the next
    /// [`Self::compute_work_order`] call.
    pub fn register<S: System + 'static>(&mut self, id: SystemId, system: S) -> Result<(), CoreError> {
        self.register_with_priority(id, system, LOWEST_SYSTEM_PRIORITY)
    }

    /// Registers a system under `id` with an explicit priority.
    pub fn register_with_priority<S: System + 'static>(
        &mut self,
        id: SystemId,
        system: S,
        priority: SystemPriority,
    ) -> Result<(), CoreError> {
        if self.entries.contains_key(&id) {
            return Err(CoreError::DuplicateSystem(id));
        }

        self.entries.insert(
            id,
            SystemEntry {
                system: Box::new(system),
                priority,
                active: true,
            },
        );
        self.depends_on.insert(id, BTreeSet::new());
        self.registration_order.push(id);

        Ok(())
    }

    /// Unregisters a system, dropping every dependency edge that touches
    /// it and removing it from the cached work order.
    ///
    /// The remaining order stays valid for the remaining systems; a
    /// recompute is only needed to let group priorities settle again.
    pub fn unregister(&mut self, id: SystemId) -> Result<Box<dyn System>, CoreError> {
        let entry = self.entries.remove(&id).ok_or(CoreError::UnknownSystem(id))?;

        self.depends_on.remove(&id);
        for deps in self.depends_on.values_mut() {
            deps.remove(&id);
        }
        self.registration_order.retain(|&other| other != id);
        self.work_order.retain(|&other| other != id);

        Ok(entry.system)
    }

    /// Records `depends_on(a, b)`: `a` must execute after `b`.
    ///
    /// Both systems must already be registered and `a` may not depend on
    /// itself. Recording the same edge twice is a no-op.
    pub fn add_dependency(&mut self, a: SystemId, b: SystemId) -> Result<(), CoreError> {
        if a == b {
            return Err(CoreError::SelfDependency(a));
        }
        if !self.entries.contains_key(&b) {
            return Err(CoreError::UnknownSystem(b));
        }
        let deps = self.depends_on.get_mut(&a).ok_or(CoreError::UnknownSystem(a))?;
        deps.insert(b);

        Ok(())
    }

    /// Changes a system's priority.
    ///
    /// Takes effect on the next [`Self::compute_work_order`]; the cached
    /// order is deliberately left untouched.
    pub fn set_priority(&mut self, id: SystemId, priority: SystemPriority) -> Result<(), CoreError> {
        let entry = self.entries.get_mut(&id).ok_or(CoreError::UnknownSystem(id))?;
        entry.priority = priority;
        Ok(())
    }

    /// Returns a system's current priority.
    pub fn priority(&self, id: SystemId) -> Result<SystemPriority, CoreError> {
        self.entries
            .get(&id)
            .map(|entry| entry.priority)
            .ok_or(CoreError::UnknownSystem(id))
    }

    /// Sets a system's active flag. Inactive systems keep their position
    /// in the work order but receive no phase calls.
    pub fn set_active(&mut self, id: SystemId, active: bool) -> Result<(), CoreError> {
        let entry = self.entries.get_mut(&id).ok_or(CoreError::UnknownSystem(id))?;
        entry.active = active;
        Ok(())
    }

    /// Returns a system's active flag.
    pub fn is_active(&self, id: SystemId) -> Result<bool, CoreError> {
        self.entries
            .get(&id)
            .map(|entry| entry.active)
            .ok_or(CoreError::UnknownSystem(id))
    }

    /// Returns a system's human-readable name.
    pub fn system_name(&self, id: SystemId) -> Result<&str, CoreError> {
        self.entries
            .get(&id)
            .map(|entry| entry.system.name())
            .ok_or(CoreError::UnknownSystem(id))
    }

    /// Returns the cached work order. Empty until the first successful
    /// [`Self::compute_work_order`] call.
    #[must_use]
    pub fn work_order(&self) -> &[SystemId] {
        &self.work_order
    }

    /// Rebuilds the work order from the dependency graph and priorities.
    ///
    /// On success the new order is cached and reported to the diagnostics
    /// sink. On a detected dependency cycle the previous order is left
    /// untouched and [`CoreError::DependencyCycle`] names the system at
    /// which the cycle closed.
    pub fn compute_work_order(&mut self) -> Result<(), CoreError> {
        let groups = self.priority_groups();
        let order = self.sort_groups(groups)?;

        self.work_order = order;

        // Fire-and-forget diagnostics; never affects the computed order.
        tracing::info!("system work order updated:");
        for id in &self.work_order {
            tracing::info!("  {} ({})", self.entries[id].system.name(), id);
        }

        Ok(())
    }

    /// Captures the active flag of every system at its work-order position.
    #[must_use]
    pub fn work_state(&self) -> WorkStateMask {
        self.work_order
            .iter()
            .map(|id| self.entries[id].active)
            .collect()
    }

    /// Restores a previously captured work-state mask.
    ///
    /// The mask length must equal the current work-order length; anything
    /// else is a contract violation and changes nothing.
    pub fn set_work_state(&mut self, mask: &[bool]) -> Result<(), CoreError> {
        if mask.len() != self.work_order.len() {
            return Err(CoreError::WorkStateMask {
                expected: self.work_order.len(),
                actual: mask.len(),
            });
        }

        for (index, &active) in mask.iter().enumerate() {
            let id = self.work_order[index];
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.active = active;
            }
        }

        Ok(())
    }

    /// Runs the pre-update phase over the work order.
    pub fn pre_update(&mut self, dt: f64) {
        self.run_phase(dt, |system, dt| system.pre_update(dt));
    }

    /// Runs the update phase over the work order.
    pub fn update(&mut self, dt: f64) {
        self.run_phase(dt, |system, dt| system.update(dt));
    }

    /// Runs the post-update phase over the work order.
    pub fn post_update(&mut self, dt: f64) {
        self.run_phase(dt, |system, dt| system.post_update(dt));
    }

    /// Walks the cached order once, invoking `phase` on active systems.
    fn run_phase(&mut self, dt: f64, phase: fn(&mut dyn System, f64)) {
        // The order is taken out for the walk so entries can be borrowed
        // mutably; phase callbacks cannot reach the scheduler.
        let order = std::mem::take(&mut self.work_order);
        for &id in &order {
            if let Some(entry) = self.entries.get_mut(&id) {
                if entry.active {
                    phase(entry.system.as_mut(), dt);
                }
            }
        }
        self.work_order = order;
    }

    /// Partitions systems into connected groups (edge direction ignored)
    /// and tags each group with its maximum member priority.
    ///
    /// Groups are discovered in registration order, which fixes the
    /// tie-break between equal-priority groups.
    fn priority_groups(&self) -> Vec<(SystemPriority, Vec<SystemId>)> {
        let mut undirected: BTreeMap<SystemId, BTreeSet<SystemId>> = self
            .entries
            .keys()
            .map(|&id| (id, BTreeSet::new()))
            .collect();
        for (&a, deps) in &self.depends_on {
            for &b in deps {
                if let Some(neighbours) = undirected.get_mut(&a) {
                    neighbours.insert(b);
                }
                if let Some(neighbours) = undirected.get_mut(&b) {
                    neighbours.insert(a);
                }
            }
        }

        let mut visited: BTreeSet<SystemId> = BTreeSet::new();
        let mut groups: Vec<(SystemPriority, Vec<SystemId>)> = Vec::new();

        for &seed in &self.registration_order {
            if !visited.insert(seed) {
                continue;
            }

            let mut members = Vec::new();
            let mut worklist = vec![seed];
            let mut group_priority = LOWEST_SYSTEM_PRIORITY;

            while let Some(id) = worklist.pop() {
                group_priority = group_priority.max(self.entries[&id].priority);
                for &neighbour in &undirected[&id] {
                    if visited.insert(neighbour) {
                        worklist.push(neighbour);
                    }
                }
                members.push(id);
            }

            groups.push((group_priority, members));
        }

        groups
    }

    /// Orders groups by descending priority and each group internally by
    /// its dependency edges, concatenating into one linear order.
    fn sort_groups(
        &self,
        mut groups: Vec<(SystemPriority, Vec<SystemId>)>,
    ) -> Result<Vec<SystemId>, CoreError> {
        // Stable sort keeps discovery order between equal priorities.
        groups.sort_by_key(|&(priority, _)| std::cmp::Reverse(priority));

        // dependents[b] = every a with depends_on(a, b), ascending.
        let mut dependents: BTreeMap<SystemId, Vec<SystemId>> = BTreeMap::new();
        for (&a, deps) in &self.depends_on {
            for &b in deps {
                dependents.entry(b).or_default().push(a);
            }
        }

        let mut state: BTreeMap<SystemId, u8> =
            self.entries.keys().map(|&id| (id, WHITE)).collect();
        let mut order = Vec::with_capacity(self.entries.len());

        for (_, members) in groups {
            let mut group_order = Vec::with_capacity(members.len());

            for &member in &members {
                if state.get(&member).copied().unwrap_or(WHITE) != WHITE {
                    continue;
                }

                // Iterative depth-first traversal over dependents; a
                // post-order emit followed by a reversal puts every
                // prerequisite before its dependents.
                let mut stack: Vec<(SystemId, usize)> = vec![(member, 0)];
                state.insert(member, GREY);

                while let Some(&(id, next)) = stack.last() {
                    let successors = dependents.get(&id).map_or(&[][..], Vec::as_slice);

                    if next == successors.len() {
                        stack.pop();
                        state.insert(id, BLACK);
                        group_order.push(id);
                        continue;
                    }

                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }

                    let successor = successors[next];
                    match state.get(&successor).copied().unwrap_or(WHITE) {
                        WHITE => {
                            state.insert(successor, GREY);
                            stack.push((successor, 0));
                        }
                        GREY => return Err(CoreError::DependencyCycle(successor)),
                        _ => {}
                    }
                }
            }

            group_order.reverse();
            order.extend(group_order);
        }

        Ok(order)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const A: SystemId = SystemId::new(1);
    const B: SystemId = SystemId::new(2);
    const C: SystemId = SystemId::new(3);
    const D: SystemId = SystemId::new(4);
    const E: SystemId = SystemId::new(5);

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: CallLog,
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn pre_update(&mut self, _dt: f64) {
            self.log.borrow_mut().push(format!("pre:{}", self.name));
        }

        fn update(&mut self, _dt: f64) {
            self.log.borrow_mut().push(format!("run:{}", self.name));
        }

        fn post_update(&mut self, _dt: f64) {
            self.log.borrow_mut().push(format!("post:{}", self.name));
        }
    }

    fn add(
        scheduler: &mut Scheduler,
        id: SystemId,
        name: &'static str,
        priority: SystemPriority,
        log: &CallLog,
    ) {
        scheduler
            .register_with_priority(
                id,
                Recorder {
                    name,
                    log: Rc::clone(log),
                },
                priority,
            )
            .unwrap();
    }

    fn position(order: &[SystemId], id: SystemId) -> usize {
        order.iter().position(|&other| other == id).unwrap()
    }

    #[test]
    fn reference_scenario_orders_groups_and_members() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 1, &log);
        add(&mut scheduler, B, "b", 1, &log);
        add(&mut scheduler, C, "c", 5, &log);
        add(&mut scheduler, D, "d", 10, &log);
        add(&mut scheduler, E, "e", 0, &log);

        scheduler.add_dependency(B, A).unwrap(); // b after a
        scheduler.add_dependency(C, B).unwrap(); // c after b
        scheduler.compute_work_order().unwrap();

        assert_eq!(scheduler.work_order(), &[D, A, B, C, E]);
    }

    #[test]
    fn dependency_edges_are_respected() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        for (id, name) in [(A, "a"), (B, "b"), (C, "c"), (D, "d")] {
            add(&mut scheduler, id, name, 0, &log);
        }
        // Diamond: d after b and c, both after a.
        let edges = [(B, A), (C, A), (D, B), (D, C)];
        for (after, before) in edges {
            scheduler.add_dependency(after, before).unwrap();
        }
        scheduler.compute_work_order().unwrap();

        let order = scheduler.work_order();
        assert_eq!(order.len(), 4);
        for (after, before) in edges {
            assert!(
                position(order, before) < position(order, after),
                "{before} must precede {after} in {order:?}"
            );
        }
    }

    #[test]
    fn disjoint_groups_order_by_priority_not_registration() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        // Low priority registered first.
        add(&mut scheduler, A, "low", 1, &log);
        add(&mut scheduler, B, "high", 9, &log);
        scheduler.compute_work_order().unwrap();

        assert_eq!(scheduler.work_order(), &[B, A]);
    }

    #[test]
    fn priority_is_inherited_by_the_whole_group() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "low", 0, &log);
        add(&mut scheduler, B, "high", 200, &log);
        add(&mut scheduler, C, "mid", 100, &log);

        // low runs after high; the pair inherits priority 200 and the
        // whole group goes before mid despite low's own priority of 0.
        scheduler.add_dependency(A, B).unwrap();
        scheduler.compute_work_order().unwrap();

        assert_eq!(scheduler.work_order(), &[B, A, C]);
    }

    #[test]
    fn dependency_cycle_is_detected_not_followed() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 0, &log);
        add(&mut scheduler, B, "b", 0, &log);
        add(&mut scheduler, C, "c", 0, &log);
        scheduler.compute_work_order().unwrap();
        let before = scheduler.work_order().to_vec();

        scheduler.add_dependency(A, B).unwrap();
        scheduler.add_dependency(B, C).unwrap();
        scheduler.add_dependency(C, A).unwrap();

        let err = scheduler.compute_work_order().unwrap_err();
        assert!(matches!(err, CoreError::DependencyCycle(_)));
        // The previous order survives a failed recompute.
        assert_eq!(scheduler.work_order(), &before[..]);
    }

    #[test]
    fn graph_contract_violations_are_rejected() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();
        add(&mut scheduler, A, "a", 0, &log);

        assert_eq!(
            scheduler.add_dependency(A, A),
            Err(CoreError::SelfDependency(A))
        );
        assert_eq!(
            scheduler.add_dependency(A, B),
            Err(CoreError::UnknownSystem(B))
        );
        assert_eq!(
            scheduler.add_dependency(B, A),
            Err(CoreError::UnknownSystem(B))
        );
        assert_eq!(scheduler.set_priority(B, 5), Err(CoreError::UnknownSystem(B)));

        let result = scheduler.register(
            A,
            Recorder {
                name: "again",
                log: Rc::clone(&log),
            },
        );
        assert_eq!(result, Err(CoreError::DuplicateSystem(A)));
    }

    #[test]
    fn phases_walk_the_order_and_skip_inactive_systems() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 0, &log);
        add(&mut scheduler, B, "b", 0, &log);
        scheduler.add_dependency(B, A).unwrap();
        scheduler.compute_work_order().unwrap();

        scheduler.pre_update(16.0);
        scheduler.update(16.0);
        scheduler.post_update(16.0);
        assert_eq!(
            log.borrow().as_slice(),
            &["pre:a", "pre:b", "run:a", "run:b", "post:a", "post:b"]
        );

        log.borrow_mut().clear();
        scheduler.set_active(B, false).unwrap();
        scheduler.update(16.0);
        assert_eq!(log.borrow().as_slice(), &["run:a"]);
    }

    #[test]
    fn work_state_mask_restores_activity_exactly() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 0, &log);
        add(&mut scheduler, B, "b", 0, &log);
        add(&mut scheduler, C, "c", 0, &log);
        scheduler.compute_work_order().unwrap();

        scheduler.set_active(B, false).unwrap();
        let mask = scheduler.work_state();
        assert_eq!(mask, vec![true, false, true]);

        // Scramble activity, then restore the snapshot.
        scheduler.set_active(A, false).unwrap();
        scheduler.set_active(B, true).unwrap();
        scheduler.set_work_state(&mask).unwrap();

        assert!(scheduler.is_active(A).unwrap());
        assert!(!scheduler.is_active(B).unwrap());
        assert!(scheduler.is_active(C).unwrap());

        scheduler.update(16.0);
        assert_eq!(log.borrow().as_slice(), &["run:a", "run:c"]);
    }

    #[test]
    fn malformed_mask_length_is_rejected() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 0, &log);
        add(&mut scheduler, B, "b", 0, &log);
        scheduler.compute_work_order().unwrap();

        assert_eq!(
            scheduler.set_work_state(&[true]),
            Err(CoreError::WorkStateMask {
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn unregister_drops_edges_and_work_order_entry() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 0, &log);
        add(&mut scheduler, B, "b", 0, &log);
        scheduler.add_dependency(B, A).unwrap();
        scheduler.compute_work_order().unwrap();

        scheduler.unregister(A).unwrap();
        assert_eq!(scheduler.work_order(), &[B]);
        assert_eq!(scheduler.len(), 1);

        // The removed system can come back with a clean slate.
        add(&mut scheduler, A, "a", 0, &log);
        scheduler.compute_work_order().unwrap();
        let order = scheduler.work_order();
        assert_eq!(order.len(), 2);

        scheduler.update(16.0);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn priority_changes_apply_only_on_recompute() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        add(&mut scheduler, A, "a", 0, &log);
        add(&mut scheduler, B, "b", 10, &log);
        scheduler.compute_work_order().unwrap();
        assert_eq!(scheduler.work_order(), &[B, A]);

        scheduler.set_priority(A, 500).unwrap();
        assert_eq!(scheduler.work_order(), &[B, A]);
        assert_eq!(scheduler.priority(A).unwrap(), 500);

        scheduler.compute_work_order().unwrap();
        assert_eq!(scheduler.work_order(), &[A, B]);
    }

    #[test]
    fn default_registration_uses_lowest_priority() {
        let log = CallLog::default();
        let mut scheduler = Scheduler::new();

        scheduler
            .register(
                A,
                Recorder {
                    name: "a",
                    log: Rc::clone(&log),
                },
            )
            .unwrap();
        assert_eq!(scheduler.priority(A).unwrap(), LOWEST_SYSTEM_PRIORITY);
        assert_eq!(scheduler.system_name(A).unwrap(), "a");
    }
}

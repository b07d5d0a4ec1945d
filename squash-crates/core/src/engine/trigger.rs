use log::debug;

use crate::containers::HashMap;
use crate::environment::Environment;
use crate::environment::UndoAction;
use crate::propagation::PropagatorId;

/// How long a propagator stays in the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Population {
    /// Posted before search; propagated once when the engine is initialised.
    Static,
    /// Posted during search and kept forever; propagated again after backtracking above the world
    /// it last ran in.
    Permanent,
    /// Posted during search and retracted when the world it was posted in is popped.
    Temporary,
}

#[derive(Clone, Copy, Debug)]
struct PermanentPropagator {
    id: PropagatorId,
    /// `None` if the propagator has not been run since it was posted.
    last_run: Option<usize>,
}

impl PermanentPropagator {
    fn needs_to_run(&self, world: usize) -> bool {
        !matches!(self.last_run, Some(last_run) if last_run <= world)
    }
}

/// Decides which propagators need a full propagation independently of domain events.
#[derive(Debug, Default)]
pub(crate) struct PropagationTrigger {
    static_to_run: Vec<PropagatorId>,
    permanent: Vec<PermanentPropagator>,
    populations: HashMap<PropagatorId, Population>,
}

impl PropagationTrigger {
    /// Registers static propagators; each is run once by the next [`PropagationTrigger::propagate`].
    pub(crate) fn add_all(&mut self, propagators: impl IntoIterator<Item = PropagatorId>) {
        for id in propagators {
            let _ = self.populations.insert(id, Population::Static);
            self.static_to_run.push(id);
        }
    }

    /// Registers a propagator posted during search. A temporary propagator is retracted through an
    /// undo action of the current world.
    pub(crate) fn dyn_add(
        &mut self,
        id: PropagatorId,
        permanent: bool,
        environment: &mut Environment,
    ) {
        if permanent {
            let _ = self.populations.insert(id, Population::Permanent);
            self.permanent.push(PermanentPropagator { id, last_run: None });
        } else {
            let _ = self.populations.insert(id, Population::Temporary);
            environment.save_action(UndoAction::RetractPropagator(id));
        }
    }

    pub(crate) fn remove(&mut self, id: PropagatorId) {
        match self.populations.remove(&id) {
            Some(Population::Static) => self.static_to_run.retain(|&other| other != id),
            Some(Population::Permanent) => self.permanent.retain(|entry| entry.id != id),
            Some(Population::Temporary) | None => {}
        }
    }

    pub(crate) fn population(&self, id: PropagatorId) -> Option<Population> {
        self.populations.get(&id).copied()
    }

    pub(crate) fn need_to_run(&self, world: usize) -> bool {
        !self.static_to_run.is_empty() || self.permanent.iter().any(|entry| entry.needs_to_run(world))
    }

    /// Hands every propagator which has to run to `schedule`: the static ones which never ran and
    /// the permanent ones which were undone by backtracking.
    pub(crate) fn propagate(&mut self, world: usize, mut schedule: impl FnMut(PropagatorId)) {
        for id in self.static_to_run.drain(..) {
            schedule(id);
        }

        for entry in self.permanent.iter_mut() {
            if entry.needs_to_run(world) {
                if entry.last_run.is_some() {
                    debug!("re-running permanent propagator {} at world {world}", entry.id);
                }
                schedule(entry.id);
                entry.last_run = Some(world);
            }
        }
    }
}

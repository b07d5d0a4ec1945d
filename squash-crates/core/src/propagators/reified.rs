use enumset::EnumSet;

use crate::asserts::squash_assert_simple;
use crate::basic_types::PropagationStatus;
use crate::environment::ReversibleInteger;
use crate::propagation::DomainEvent;
use crate::propagation::DomainEvents;
use crate::propagation::Domains;
use crate::propagation::EnqueueDecision;
use crate::propagation::Entailment;
use crate::propagation::LocalId;
use crate::propagation::PropagationContext;
use crate::propagation::PropagationMask;
use crate::propagation::Priority;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::ReadDomains;
use crate::statistics::StatisticLogger;
use crate::variables::DomainId;

/// A [`PropagatorConstructor`] for the [`ReifiedPropagator`].
#[derive(Clone, Debug)]
pub struct ReifiedArgs<WrappedArgs> {
    pub propagator: WrappedArgs,
    /// A variable with domain `{0, 1}`.
    pub reification: DomainId,
}

impl<WrappedArgs, WrappedPropagator> PropagatorConstructor for ReifiedArgs<WrappedArgs>
where
    WrappedArgs: PropagatorConstructor<PropagatorImpl = WrappedPropagator>,
    WrappedPropagator: Propagator,
{
    type PropagatorImpl = ReifiedPropagator<WrappedPropagator>;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        let ReifiedArgs {
            propagator,
            reification,
        } = self;

        squash_assert_simple!(
            context.lower_bound(reification) >= 0 && context.upper_bound(reification) <= 1,
            "the reification variable {reification} must be 0/1"
        );

        let propagator = propagator.create(context.reborrow());
        let reification_id = context.get_next_local_id();
        context.register(reification, reification_id);

        let name = format!("Reified({})", propagator.name());

        ReifiedPropagator {
            propagator,
            reification,
            reification_id,
            enabled_at_full: context.new_reversible_integer(0),
            name,
        }
    }
}

/// Propagator for the constraint `r -> p`, where `r` is a 0/1 variable and `p` is an arbitrary
/// propagator.
///
/// The wrapped propagator only propagates once `r = 1`. While `r` is unfixed, `r` is fixed to 0 as
/// soon as `p` is entailed to be false.
#[derive(Clone, Debug)]
pub struct ReifiedPropagator<WrappedPropagator> {
    propagator: WrappedPropagator,
    reification: DomainId,
    /// Larger than any id registered by the wrapped propagator.
    reification_id: LocalId,
    /// 1 once the wrapped propagator received its full propagation for `r = 1`.
    enabled_at_full: ReversibleInteger,
    name: String,
}

impl<WrappedPropagator> ReifiedPropagator<WrappedPropagator> {
    pub fn inner(&self) -> &WrappedPropagator {
        &self.propagator
    }
}

impl<WrappedPropagator: Propagator> Propagator for ReifiedPropagator<WrappedPropagator> {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.propagator.priority()
    }

    fn propagation_conditions(&self, local_id: LocalId) -> DomainEvents {
        if local_id == self.reification_id {
            DomainEvents::ASSIGN
        } else {
            self.propagator.propagation_conditions(local_id)
        }
    }

    fn reacts_to_fine_events(&self) -> bool {
        self.propagator.reacts_to_fine_events()
    }

    fn notify(
        &mut self,
        domains: Domains,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
    ) -> EnqueueDecision {
        if local_id == self.reification_id || domains.fixed_value(self.reification) != Some(1) {
            // Events on the wrapped scope may change the entailment of `p` while `r` is unfixed.
            EnqueueDecision::Enqueue
        } else {
            self.propagator.notify(domains, local_id, events)
        }
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        mask: PropagationMask,
    ) -> PropagationStatus {
        match context.fixed_value(self.reification) {
            Some(0) => {
                context.set_passive();
                Ok(())
            }
            Some(_) => {
                let mask = if context.read_integer(self.enabled_at_full) == 0 {
                    let _ = context.assign_integer(self.enabled_at_full, 1);
                    PropagationMask::Full
                } else {
                    mask
                };
                self.propagator.propagate(context.reborrow(), mask)
            }
            None => {
                if self.propagator.is_entailed(context.domains()) == Entailment::False {
                    let _ = context.instantiate(self.reification, 0)?;
                    context.set_passive();
                }
                Ok(())
            }
        }
    }

    fn is_entailed(&self, domains: Domains) -> Entailment {
        match domains.fixed_value(self.reification) {
            Some(0) => Entailment::True,
            Some(_) => self.propagator.is_entailed(domains),
            None => match self.propagator.is_entailed(domains) {
                Entailment::True => Entailment::True,
                Entailment::False | Entailment::Undefined => Entailment::Undefined,
            },
        }
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.propagator.log_statistics(statistic_logger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::PropagatorState;
    use crate::propagators::LessOrEqualArgs;
    use crate::propagators::NotEqualArgs;
    use crate::state::State;

    #[test]
    fn wrapped_propagator_waits_for_the_reification() {
        let mut state = State::default();
        let x = state.new_interval_variable(0, 10);
        let y = state.new_interval_variable(0, 5);
        let r = state.new_interval_variable(0, 1);
        let _ = state.add_propagator(ReifiedArgs {
            propagator: LessOrEqualArgs { x, y, offset: 0 },
            reification: r,
        });

        state.propagate().expect("consistent");
        assert_eq!(state.upper_bound(x), 10);

        state.push();
        let _ = state.post_instantiate(r, 1).expect("1 is in the domain");
        state.propagate().expect("consistent");
        assert_eq!(state.upper_bound(x), 5);

        state.pop();
        assert_eq!(state.upper_bound(x), 10);
    }

    #[test]
    fn false_entailment_fixes_the_reification_to_zero() {
        let mut state = State::default();
        let x = state.new_interval_variable(0, 10);
        let y = state.new_interval_variable(0, 3);
        let r = state.new_interval_variable(0, 1);
        let handle = state.add_propagator(ReifiedArgs {
            propagator: LessOrEqualArgs { x, y, offset: 0 },
            reification: r,
        });
        state.propagate().expect("consistent");

        state.push();
        let _ = state.post_lower_bound(x, 5).expect("in domain");
        state.propagate().expect("r can be 0");

        assert_eq!(state.fixed_value(r), Some(0));
        assert_eq!(
            state.propagator_state(handle.id()),
            Some(PropagatorState::Passive)
        );

        state.pop();
        assert!(!state.is_fixed(r));
    }

    #[test]
    fn wrapped_contradictions_surface_when_enabled() {
        let mut state = State::default();
        let x = state.new_interval_variable(4, 4);
        let y = state.new_interval_variable(4, 4);
        let r = state.new_interval_variable(1, 1);
        let _ = state.add_propagator(ReifiedArgs {
            propagator: NotEqualArgs { x, y, offset: 0 },
            reification: r,
        });

        assert!(state.propagate().is_err());
    }

    #[test]
    fn name_mentions_the_wrapped_propagator() {
        let mut state = State::default();
        let x = state.new_interval_variable(0, 1);
        let y = state.new_interval_variable(0, 1);
        let r = state.new_interval_variable(0, 1);
        let handle = state.add_propagator(ReifiedArgs {
            propagator: NotEqualArgs { x, y, offset: 0 },
            reification: r,
        });

        let propagator = state.get_propagator(handle).expect("present");
        assert_eq!(propagator.name(), "Reified(NotEqual)");
        assert_eq!(propagator.inner().name(), "NotEqual");
    }
}

use enumset::EnumSet;

use crate::basic_types::PropagationStatus;
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
use crate::variables::DomainId;

const X: LocalId = LocalId::from(0);
const Y: LocalId = LocalId::from(1);

/// The [`PropagatorConstructor`] for the [`NotEqualPropagator`].
#[derive(Clone, Copy, Debug)]
pub struct NotEqualArgs {
    pub x: DomainId,
    pub y: DomainId,
    pub offset: i32,
}

impl PropagatorConstructor for NotEqualArgs {
    type PropagatorImpl = NotEqualPropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        let NotEqualArgs { x, y, offset } = self;

        context.register(x, X);
        context.register(y, Y);

        NotEqualPropagator { x, y, offset }
    }
}

/// Propagator for the constraint `x != y + offset`.
///
/// Only reacts once one of the two sides is fixed; it then removes the forbidden value from the
/// other side.
#[derive(Clone, Debug)]
pub struct NotEqualPropagator {
    x: DomainId,
    y: DomainId,
    offset: i32,
}

impl NotEqualPropagator {
    /// The value `y` may not take when `x = value`.
    fn forbidden_for_y(&self, value: i32) -> Option<i32> {
        value.checked_sub(self.offset)
    }

    /// The value `x` may not take when `y = value`.
    fn forbidden_for_x(&self, value: i32) -> Option<i32> {
        value.checked_add(self.offset)
    }
}

impl Propagator for NotEqualPropagator {
    fn name(&self) -> &str {
        "NotEqual"
    }

    fn priority(&self) -> Priority {
        Priority::Binary
    }

    fn propagation_conditions(&self, _local_id: LocalId) -> DomainEvents {
        DomainEvents::ASSIGN
    }

    fn reacts_to_fine_events(&self) -> bool {
        true
    }

    fn notify(
        &mut self,
        domains: Domains,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
    ) -> EnqueueDecision {
        if !events.contains(DomainEvent::Assign) {
            return EnqueueDecision::Skip;
        }

        // Only worth a call if the fixed value still has a counterpart on the other side.
        let has_support = if local_id == X {
            domains
                .fixed_value(self.x)
                .and_then(|value| self.forbidden_for_y(value))
                .is_some_and(|value| domains.contains(self.y, value))
        } else {
            domains
                .fixed_value(self.y)
                .and_then(|value| self.forbidden_for_x(value))
                .is_some_and(|value| domains.contains(self.x, value))
        };

        if has_support {
            EnqueueDecision::Enqueue
        } else {
            EnqueueDecision::Skip
        }
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        if let Some(value) = context
            .fixed_value(self.x)
            .and_then(|value| self.forbidden_for_y(value))
        {
            let _ = context.remove(self.y, value)?;
        }

        if let Some(value) = context
            .fixed_value(self.y)
            .and_then(|value| self.forbidden_for_x(value))
        {
            let _ = context.remove(self.x, value)?;
        }

        if self.is_entailed(context.domains()) == Entailment::True {
            context.set_passive();
        }

        Ok(())
    }

    fn is_entailed(&self, domains: Domains) -> Entailment {
        let offset = i64::from(self.offset);
        let x_lb = i64::from(domains.lower_bound(self.x));
        let x_ub = i64::from(domains.upper_bound(self.x));
        let y_lb = i64::from(domains.lower_bound(self.y)) + offset;
        let y_ub = i64::from(domains.upper_bound(self.y)) + offset;

        if x_ub < y_lb || y_ub < x_lb {
            return Entailment::True;
        }

        match (domains.fixed_value(self.x), domains.fixed_value(self.y)) {
            (Some(x), Some(y)) if i64::from(x) == i64::from(y) + offset => Entailment::False,
            (Some(_), Some(_)) => Entailment::True,
            (Some(x), None) => match self.forbidden_for_y(x) {
                Some(value) if domains.contains(self.y, value) => Entailment::Undefined,
                _ => Entailment::True,
            },
            (None, Some(y)) => match self.forbidden_for_x(y) {
                Some(value) if domains.contains(self.x, value) => Entailment::Undefined,
                _ => Entailment::True,
            },
            (None, None) => Entailment::Undefined,
        }
    }
}

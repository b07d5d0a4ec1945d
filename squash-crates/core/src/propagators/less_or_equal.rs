use crate::basic_types::PropagationStatus;
use crate::propagation::DomainEvent;
use crate::propagation::DomainEvents;
use crate::propagation::Domains;
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

/// The [`PropagatorConstructor`] for the [`LessOrEqualPropagator`].
#[derive(Clone, Copy, Debug)]
pub struct LessOrEqualArgs {
    pub x: DomainId,
    pub y: DomainId,
    pub offset: i32,
}

impl PropagatorConstructor for LessOrEqualArgs {
    type PropagatorImpl = LessOrEqualPropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        let LessOrEqualArgs { x, y, offset } = self;

        context.register(x, X);
        context.register(y, Y);

        LessOrEqualPropagator { x, y, offset }
    }
}

/// Bounds propagator for the constraint `x <= y + offset`.
///
/// The lower bound of `x` pushes up the lower bound of `y`, and the upper bound of `y` pushes down
/// the upper bound of `x`; no other event can lead to a deduction.
#[derive(Clone, Debug)]
pub struct LessOrEqualPropagator {
    x: DomainId,
    y: DomainId,
    offset: i32,
}

impl LessOrEqualPropagator {
    fn tighten_x(&self, context: &mut PropagationContext) -> PropagationStatus {
        let bound = i64::from(context.upper_bound(self.y)) + i64::from(self.offset);
        if let Ok(bound) = i32::try_from(bound) {
            let _ = context.set_upper_bound(self.x, bound)?;
        } else if bound < i64::from(i32::MIN) {
            return Err(context.fail(Some(self.x), "no value of x is small enough"));
        }
        Ok(())
    }

    fn tighten_y(&self, context: &mut PropagationContext) -> PropagationStatus {
        let bound = i64::from(context.lower_bound(self.x)) - i64::from(self.offset);
        if let Ok(bound) = i32::try_from(bound) {
            let _ = context.set_lower_bound(self.y, bound)?;
        } else if bound > i64::from(i32::MAX) {
            return Err(context.fail(Some(self.y), "no value of y is large enough"));
        }
        Ok(())
    }
}

impl Propagator for LessOrEqualPropagator {
    fn name(&self) -> &str {
        "LessOrEqual"
    }

    fn priority(&self) -> Priority {
        Priority::Binary
    }

    fn propagation_conditions(&self, local_id: LocalId) -> DomainEvents {
        if local_id == X {
            DomainEvents::LOWER_BOUND
        } else {
            DomainEvents::UPPER_BOUND
        }
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        mask: PropagationMask,
    ) -> PropagationStatus {
        let events = mask.events();

        if events.contains(DomainEvent::UpperBound) {
            self.tighten_x(&mut context)?;
        }
        if events.contains(DomainEvent::LowerBound) {
            self.tighten_y(&mut context)?;
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
        let y_lb = i64::from(domains.lower_bound(self.y));
        let y_ub = i64::from(domains.upper_bound(self.y));

        if x_ub <= y_lb + offset {
            Entailment::True
        } else if x_lb > y_ub + offset {
            Entailment::False
        } else {
            Entailment::Undefined
        }
    }
}

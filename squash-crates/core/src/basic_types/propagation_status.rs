use std::fmt::Display;

use crate::propagation::PropagatorId;
use crate::variables::DomainId;

/// The result of invoking a propagator or of propagating to a fixpoint.
pub type PropagationStatus = Result<(), Contradiction>;

/// Who requested a domain modification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cause {
    /// The modification was done by the given propagator while it was propagating.
    Propagator(PropagatorId),
    /// The modification came from outside the engine, e.g. a search decision.
    External,
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::Propagator(propagator) => write!(f, "propagator {propagator}"),
            Cause::External => write!(f, "an external decision"),
        }
    }
}

/// Signals that the current world admits no solution.
///
/// Two kinds of contradiction exist:
/// 1) a modification would leave a variable with an empty domain;
/// 2) a propagator explicitly detects that its constraint cannot be satisfied.
///
/// After a contradiction the engine keeps its pending work; the search driver is expected to call
/// [`State::flush`](crate::state::State::flush) and then backtrack.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Contradiction {
    #[error(transparent)]
    EmptyDomain(EmptyDomainContradiction),
    #[error(transparent)]
    Propagator(PropagatorContradiction),
}

impl Contradiction {
    pub fn cause(&self) -> Cause {
        match self {
            Contradiction::EmptyDomain(contradiction) => contradiction.cause,
            Contradiction::Propagator(contradiction) => Cause::Propagator(contradiction.propagator),
        }
    }

    /// The variable involved in the contradiction, if any.
    pub fn domain(&self) -> Option<DomainId> {
        match self {
            Contradiction::EmptyDomain(contradiction) => Some(contradiction.domain),
            Contradiction::Propagator(contradiction) => contradiction.domain,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Contradiction::EmptyDomain(_) => "the domain became empty",
            Contradiction::Propagator(contradiction) => &contradiction.message,
        }
    }
}

impl From<EmptyDomainContradiction> for Contradiction {
    fn from(value: EmptyDomainContradiction) -> Self {
        Contradiction::EmptyDomain(value)
    }
}

impl From<PropagatorContradiction> for Contradiction {
    fn from(value: PropagatorContradiction) -> Self {
        Contradiction::Propagator(value)
    }
}

/// A modification which would have left a domain empty. The domain itself is left untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("the domain of {domain} became empty due to {cause}")]
pub struct EmptyDomainContradiction {
    pub domain: DomainId,
    pub cause: Cause,
}

/// A contradiction stated explicitly by a propagator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("propagator {propagator} failed: {message}")]
pub struct PropagatorContradiction {
    pub propagator: PropagatorId,
    pub domain: Option<DomainId>,
    pub message: String,
}

use enumset::EnumSet;
use log::trace;

use super::DomainEvent;
use super::DomainId;
use crate::asserts::squash_assert_moderate;
use crate::asserts::squash_assert_simple;
use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::basic_types::EmptyDomainContradiction;
use crate::containers::KeyedVec;
use crate::environment::Environment;
use crate::environment::ReversibleInteger;
use crate::environment::ReversibleSet;
use crate::environment::SetKind;
use crate::environment::UndoStrategy;

/// The number of values in `[lower_bound, upper_bound]`.
fn universe_size(lower_bound: i32, upper_bound: i32) -> usize {
    usize::try_from(i64::from(upper_bound) - i64::from(lower_bound) + 1).unwrap_or(usize::MAX)
}

/// A modification was rejected because it would have emptied the domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EmptyDomain {
    pub(crate) domain: DomainId,
}

impl EmptyDomain {
    pub(crate) fn with_cause(self, cause: Cause) -> Contradiction {
        EmptyDomainContradiction {
            domain: self.domain,
            cause,
        }
        .into()
    }
}

/// The events fired by one domain modification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DomainEventRecord {
    pub(crate) domain: DomainId,
    pub(crate) events: EnumSet<DomainEvent>,
    pub(crate) cause: Cause,
}

/// The domain of a variable lives in the environment: a reversible set of values together with
/// reversible bounds.
#[derive(Clone, Copy, Debug)]
struct IntegerDomain {
    values: ReversibleSet,
    lower_bound: ReversibleInteger,
    upper_bound: ReversibleInteger,
}

/// The integer variables of the solver.
///
/// Domains are never left empty: a modification which would remove the last value is rejected and
/// reported as an empty domain instead. Every effective modification is recorded as a
/// [`DomainEventRecord`] until the engine takes it.
#[derive(Debug, Default)]
pub struct DomainStore {
    domains: KeyedVec<DomainId, IntegerDomain>,
    events: Vec<DomainEventRecord>,
}

impl DomainStore {
    /// Creates a variable with the given values. Values may be given in any order and may repeat.
    ///
    /// # Panics
    /// If `values` is empty, or if `kind` is [`SetKind::Interval`] and the values are not
    /// contiguous.
    pub(crate) fn new_domain(
        &mut self,
        environment: &mut Environment,
        kind: SetKind,
        strategy: UndoStrategy,
        mut values: Vec<i32>,
    ) -> DomainId {
        values.sort_unstable();
        values.dedup();
        squash_assert_simple!(!values.is_empty(), "cannot create a variable without values");

        let lower_bound = values[0];
        let upper_bound = values[values.len() - 1];
        squash_assert_simple!(
            kind != SetKind::Interval
                || (i64::from(upper_bound) - i64::from(lower_bound) + 1) as usize == values.len(),
            "an interval domain cannot have holes"
        );

        let capacity = universe_size(lower_bound, upper_bound);
        let set = environment.new_set_with(kind, strategy, lower_bound, capacity, values);
        self.insert_domain(environment, set, lower_bound, upper_bound)
    }

    /// Creates a variable with domain `[lower_bound, upper_bound]`. With [`SetKind::Interval`] this
    /// takes constant time whatever the size of the range.
    ///
    /// # Panics
    /// If the range is empty.
    pub(crate) fn new_interval_domain(
        &mut self,
        environment: &mut Environment,
        kind: SetKind,
        strategy: UndoStrategy,
        lower_bound: i32,
        upper_bound: i32,
    ) -> DomainId {
        squash_assert_simple!(
            lower_bound <= upper_bound,
            "the domain [{lower_bound}, {upper_bound}] is empty"
        );

        let capacity = universe_size(lower_bound, upper_bound);
        let set = environment.new_full_set(kind, strategy, lower_bound, capacity);
        self.insert_domain(environment, set, lower_bound, upper_bound)
    }

    fn insert_domain(
        &mut self,
        environment: &mut Environment,
        values: ReversibleSet,
        lower_bound: i32,
        upper_bound: i32,
    ) -> DomainId {
        let domain = self.domains.push(IntegerDomain {
            values,
            lower_bound: environment.new_integer(i64::from(lower_bound)),
            upper_bound: environment.new_integer(i64::from(upper_bound)),
        });
        trace!("created {domain} with domain [{lower_bound}, {upper_bound}]");
        domain
    }

    pub fn num_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn lower_bound(&self, environment: &Environment, domain: DomainId) -> i32 {
        environment.read(self.domains[domain].lower_bound) as i32
    }

    pub fn upper_bound(&self, environment: &Environment, domain: DomainId) -> i32 {
        environment.read(self.domains[domain].upper_bound) as i32
    }

    pub fn contains(&self, environment: &Environment, domain: DomainId, value: i32) -> bool {
        environment.set_contains(self.domains[domain].values, value)
    }

    pub fn size(&self, environment: &Environment, domain: DomainId) -> usize {
        environment.set_size(self.domains[domain].values)
    }

    pub fn is_fixed(&self, environment: &Environment, domain: DomainId) -> bool {
        self.lower_bound(environment, domain) == self.upper_bound(environment, domain)
    }

    /// The smallest value in the domain strictly greater than `value`.
    pub fn next_value(&self, environment: &Environment, domain: DomainId, value: i32) -> Option<i32> {
        environment.set_next_value(self.domains[domain].values, value)
    }

    /// The largest value in the domain strictly smaller than `value`.
    pub fn previous_value(
        &self,
        environment: &Environment,
        domain: DomainId,
        value: i32,
    ) -> Option<i32> {
        environment.set_previous_value(self.domains[domain].values, value)
    }

    /// The reversible set holding the values of the domain.
    pub(crate) fn values_of(&self, domain: DomainId) -> ReversibleSet {
        self.domains[domain].values
    }

    /// The values of the domain in increasing order.
    pub fn values(&self, environment: &Environment, domain: DomainId) -> Vec<i32> {
        let mut values = environment
            .set_values(self.domains[domain].values)
            .collect::<Vec<_>>();
        values.sort_unstable();
        values
    }

    pub(crate) fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Moves the recorded events into `buffer`, oldest first.
    pub(crate) fn take_events(&mut self, buffer: &mut Vec<DomainEventRecord>) {
        buffer.append(&mut self.events);
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }
}

/// Domain modifications; each returns whether the domain changed.
impl DomainStore {
    /// Removes `value`. Values strictly inside an interval domain cannot be removed; such requests
    /// leave the domain unchanged.
    pub(crate) fn remove(
        &mut self,
        environment: &mut Environment,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, EmptyDomain> {
        let IntegerDomain {
            values,
            lower_bound,
            upper_bound,
        } = self.domains[domain];

        if !environment.set_contains(values, value) {
            return Ok(false);
        }
        if environment.set_size(values) == 1 {
            return Err(EmptyDomain { domain });
        }
        if !environment.remove_from_set(values, value) {
            return Ok(false);
        }

        let mut events = EnumSet::only(DomainEvent::Removal);
        if i64::from(value) == environment.read(lower_bound) {
            let new_lower_bound = environment.set_next_value(values, value).unwrap_or(value);
            let _ = environment.assign(lower_bound, i64::from(new_lower_bound));
            events |= DomainEvent::LowerBound;
        }
        if i64::from(value) == environment.read(upper_bound) {
            let new_upper_bound = environment
                .set_previous_value(values, value)
                .unwrap_or(value);
            let _ = environment.assign(upper_bound, i64::from(new_upper_bound));
            events |= DomainEvent::UpperBound;
        }

        self.record(environment, domain, events, cause);
        Ok(true)
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        environment: &mut Environment,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, EmptyDomain> {
        let events = self.tighten_lower_bound(environment, domain, value)?;
        self.record(environment, domain, events, cause);
        Ok(!events.is_empty())
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        environment: &mut Environment,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, EmptyDomain> {
        let events = self.tighten_upper_bound(environment, domain, value)?;
        self.record(environment, domain, events, cause);
        Ok(!events.is_empty())
    }

    /// Reduces the domain to `value`.
    pub(crate) fn instantiate(
        &mut self,
        environment: &mut Environment,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, EmptyDomain> {
        if !self.contains(environment, domain, value) {
            return Err(EmptyDomain { domain });
        }

        let events = self.tighten_lower_bound(environment, domain, value)?
            | self.tighten_upper_bound(environment, domain, value)?;
        self.record(environment, domain, events, cause);
        Ok(!events.is_empty())
    }

    fn tighten_lower_bound(
        &mut self,
        environment: &mut Environment,
        domain: DomainId,
        value: i32,
    ) -> Result<EnumSet<DomainEvent>, EmptyDomain> {
        let IntegerDomain {
            values,
            lower_bound,
            upper_bound,
        } = self.domains[domain];
        let upper = environment.read(upper_bound) as i32;

        if value <= environment.read(lower_bound) as i32 {
            return Ok(EnumSet::empty());
        }
        if value > upper {
            return Err(EmptyDomain { domain });
        }

        let _ = environment.restrict_set(values, value, i32::MAX);

        let new_lower_bound = if environment.set_contains(values, value) {
            value
        } else {
            environment.set_next_value(values, value).unwrap_or(upper)
        };
        let _ = environment.assign(lower_bound, i64::from(new_lower_bound));

        Ok(DomainEvent::LowerBound | DomainEvent::Removal)
    }

    fn tighten_upper_bound(
        &mut self,
        environment: &mut Environment,
        domain: DomainId,
        value: i32,
    ) -> Result<EnumSet<DomainEvent>, EmptyDomain> {
        let IntegerDomain {
            values,
            lower_bound,
            upper_bound,
        } = self.domains[domain];
        let lower = environment.read(lower_bound) as i32;

        if value >= environment.read(upper_bound) as i32 {
            return Ok(EnumSet::empty());
        }
        if value < lower {
            return Err(EmptyDomain { domain });
        }

        let _ = environment.restrict_set(values, i32::MIN, value);

        let new_upper_bound = if environment.set_contains(values, value) {
            value
        } else {
            environment.set_previous_value(values, value).unwrap_or(lower)
        };
        let _ = environment.assign(upper_bound, i64::from(new_upper_bound));

        Ok(DomainEvent::UpperBound | DomainEvent::Removal)
    }

    fn record(
        &mut self,
        environment: &Environment,
        domain: DomainId,
        mut events: EnumSet<DomainEvent>,
        cause: Cause,
    ) {
        if events.is_empty() {
            return;
        }
        if self.is_fixed(environment, domain) {
            events |= DomainEvent::Assign;
        }
        squash_assert_moderate!(self.size(environment, domain) > 0);

        trace!("{domain} changed with events {events:?} due to {cause}");
        self.events.push(DomainEventRecord {
            domain,
            events,
            cause,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(kind: SetKind, values: Vec<i32>) -> (Environment, DomainStore, DomainId) {
        let mut environment = Environment::default();
        let mut store = DomainStore::default();
        let domain = store.new_domain(&mut environment, kind, UndoStrategy::Trailing, values);
        (environment, store, domain)
    }

    fn take_events(store: &mut DomainStore) -> Vec<EnumSet<DomainEvent>> {
        let mut buffer = vec![];
        store.take_events(&mut buffer);
        buffer.into_iter().map(|record| record.events).collect()
    }

    #[test]
    fn removing_the_lower_bound_moves_it_past_holes() {
        let (mut environment, mut store, x) = store_with(SetKind::Bitset, vec![1, 3, 4, 7]);

        let changed = store
            .remove(&mut environment, x, 1, Cause::External)
            .expect("non-empty");

        assert!(changed);
        assert_eq!(store.lower_bound(&environment, x), 3);
        assert_eq!(
            take_events(&mut store),
            vec![DomainEvent::Removal | DomainEvent::LowerBound]
        );
    }

    #[test]
    fn removing_the_last_value_is_rejected() {
        let (mut environment, mut store, x) = store_with(SetKind::SwapList, vec![5]);

        let result = store.remove(&mut environment, x, 5, Cause::External);

        assert_eq!(result, Err(EmptyDomain { domain: x }));
        assert!(store.contains(&environment, x, 5));
        assert!(!store.has_pending_events());
    }

    #[test]
    fn interior_removal_of_an_interval_is_a_no_op() {
        let (mut environment, mut store, x) = store_with(SetKind::Interval, (0..=4).collect());

        let changed = store
            .remove(&mut environment, x, 2, Cause::External)
            .expect("non-empty");

        assert!(!changed);
        assert_eq!(store.size(&environment, x), 5);
        assert!(!store.has_pending_events());
    }

    #[test]
    fn tightening_a_bound_to_a_hole_snaps_to_next_value() {
        let (mut environment, mut store, x) = store_with(SetKind::LinkedList, vec![0, 2, 5, 9]);

        let _ = store
            .set_lower_bound(&mut environment, x, 3, Cause::External)
            .expect("non-empty");
        let _ = store
            .set_upper_bound(&mut environment, x, 8, Cause::External)
            .expect("non-empty");

        assert_eq!(store.values(&environment, x), vec![5]);
        assert_eq!(store.lower_bound(&environment, x), 5);
        assert_eq!(store.upper_bound(&environment, x), 5);
        assert_eq!(
            take_events(&mut store),
            vec![
                DomainEvent::Removal | DomainEvent::LowerBound,
                DomainEvent::Removal | DomainEvent::UpperBound | DomainEvent::Assign
            ]
        );
    }

    #[test]
    fn bounds_crossing_is_an_empty_domain() {
        let (mut environment, mut store, x) = store_with(SetKind::Interval, (0..=4).collect());

        let result = store.set_lower_bound(&mut environment, x, 5, Cause::External);

        assert!(result.is_err());
        assert_eq!(store.values(&environment, x), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn instantiate_fires_a_single_record() {
        let (mut environment, mut store, x) = store_with(SetKind::Interval, (0..=9).collect());

        let changed = store
            .instantiate(&mut environment, x, 4, Cause::External)
            .expect("4 is in the domain");

        assert!(changed);
        assert_eq!(store.values(&environment, x), vec![4]);
        assert_eq!(
            take_events(&mut store),
            vec![
                DomainEvent::Removal
                    | DomainEvent::LowerBound
                    | DomainEvent::UpperBound
                    | DomainEvent::Assign
            ]
        );
    }

    #[test]
    fn huge_interval_domains_are_created_and_tightened() {
        let mut environment = Environment::default();
        let mut store = DomainStore::default();
        let x = store.new_interval_domain(
            &mut environment,
            SetKind::Interval,
            UndoStrategy::Trailing,
            i32::MIN,
            i32::MAX,
        );
        assert_eq!(store.size(&environment, x), 1 << 32);

        environment.push();
        let _ = store
            .set_upper_bound(&mut environment, x, i32::MIN + 2, Cause::External)
            .expect("non-empty");
        assert_eq!(store.size(&environment, x), 3);

        environment.pop();
        assert_eq!(store.lower_bound(&environment, x), i32::MIN);
        assert_eq!(store.upper_bound(&environment, x), i32::MAX);
    }

    #[test]
    fn domains_are_restored_on_pop() {
        for kind in [
            SetKind::Bitset,
            SetKind::SwapList,
            SetKind::Interval,
            SetKind::LinkedList,
        ] {
            let (mut environment, mut store, x) = store_with(kind, (0..=9).collect());

            environment.push();
            let _ = store
                .set_lower_bound(&mut environment, x, 3, Cause::External)
                .expect("non-empty");
            let _ = store
                .remove(&mut environment, x, 9, Cause::External)
                .expect("non-empty");

            environment.pop();

            assert_eq!(store.values(&environment, x), (0..=9).collect::<Vec<_>>());
            assert_eq!(store.lower_bound(&environment, x), 0);
            assert_eq!(store.upper_bound(&environment, x), 9);
        }
    }
}

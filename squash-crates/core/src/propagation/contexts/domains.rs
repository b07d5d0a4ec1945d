use crate::environment::Environment;
use crate::environment::ReversibleInteger;
use crate::environment::ReversibleSet;
use crate::environment::SetCursor;
use crate::variables::DomainId;
use crate::variables::DomainStore;

/// Read access to the domains of the variables and to the reversible state of the environment.
///
/// Implemented by every context handed to a propagator; only [`ReadDomains::environment`] and
/// [`ReadDomains::domain_store`] need to be provided.
pub trait ReadDomains {
    #[doc(hidden)]
    fn environment(&self) -> &Environment;

    #[doc(hidden)]
    fn domain_store(&self) -> &DomainStore;

    fn lower_bound(&self, var: DomainId) -> i32 {
        self.domain_store().lower_bound(self.environment(), var)
    }

    fn upper_bound(&self, var: DomainId) -> i32 {
        self.domain_store().upper_bound(self.environment(), var)
    }

    fn contains(&self, var: DomainId, value: i32) -> bool {
        self.domain_store().contains(self.environment(), var, value)
    }

    fn is_fixed(&self, var: DomainId) -> bool {
        self.domain_store().is_fixed(self.environment(), var)
    }

    /// The value of `var` if its domain is a singleton.
    fn fixed_value(&self, var: DomainId) -> Option<i32> {
        self.is_fixed(var).then(|| self.lower_bound(var))
    }

    fn domain_size(&self, var: DomainId) -> usize {
        self.domain_store().size(self.environment(), var)
    }

    /// The smallest value in the domain of `var` strictly greater than `value`.
    fn next_value(&self, var: DomainId, value: i32) -> Option<i32> {
        self.domain_store().next_value(self.environment(), var, value)
    }

    /// The largest value in the domain of `var` strictly smaller than `value`.
    fn previous_value(&self, var: DomainId, value: i32) -> Option<i32> {
        self.domain_store()
            .previous_value(self.environment(), var, value)
    }

    /// Returns the next value of the domain of `var` visited by `cursor`. The order depends on the
    /// representation of the domain.
    ///
    /// ```ignore
    /// let mut cursor = SetCursor::default();
    /// while let Some(value) = context.next_in_domain(var, &mut cursor) {
    ///     if value % 2 == 1 {
    ///         let _ = context.remove(var, value)?;
    ///         context.notify_removed_from_domain(var, &mut cursor);
    ///     }
    /// }
    /// ```
    fn next_in_domain(&self, var: DomainId, cursor: &mut SetCursor) -> Option<i32> {
        self.environment()
            .next_in_set(self.domain_store().values_of(var), cursor)
    }

    /// Must be called after removing the value last returned by `cursor` from the domain of
    /// `var`, before the cursor is advanced again.
    fn notify_removed_from_domain(&self, var: DomainId, cursor: &mut SetCursor) {
        self.environment()
            .notify_removed_from_set(self.domain_store().values_of(var), cursor)
    }

    fn read_integer(&self, integer: ReversibleInteger) -> i64 {
        self.environment().read(integer)
    }

    fn set_contains(&self, set: ReversibleSet, value: i32) -> bool {
        self.environment().set_contains(set, value)
    }

    fn set_size(&self, set: ReversibleSet) -> usize {
        self.environment().set_size(set)
    }

    /// Returns the next member of `set` visited by `cursor`.
    fn next_in_set(&self, set: ReversibleSet, cursor: &mut SetCursor) -> Option<i32> {
        self.environment().next_in_set(set, cursor)
    }

    /// Must be called after removing the member last returned by `cursor` from `set`.
    fn notify_removed_from_set(&self, set: ReversibleSet, cursor: &mut SetCursor) {
        self.environment().notify_removed_from_set(set, cursor)
    }
}

/// A read-only view of the domains.
#[derive(Clone, Copy, Debug)]
pub struct Domains<'a> {
    environment: &'a Environment,
    domain_store: &'a DomainStore,
}

impl<'a> Domains<'a> {
    pub(crate) fn new(environment: &'a Environment, domain_store: &'a DomainStore) -> Self {
        Domains {
            environment,
            domain_store,
        }
    }
}

impl ReadDomains for Domains<'_> {
    fn environment(&self) -> &Environment {
        self.environment
    }

    fn domain_store(&self) -> &DomainStore {
        self.domain_store
    }
}

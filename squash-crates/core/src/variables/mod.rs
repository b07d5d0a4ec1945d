//! Integer variables: identifiers, the events fired when their domains change and the store of
//! their reversible domains.
mod domain_events;
mod domain_id;
mod domain_store;

pub use domain_events::*;
pub use domain_id::DomainId;
pub(crate) use domain_store::DomainEventRecord;
pub use domain_store::DomainStore;
pub(crate) use domain_store::EmptyDomain;

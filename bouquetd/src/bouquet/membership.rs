//! Service membership set.

use std::collections::BTreeSet;

use bouquet_protocol::ServiceId;

/// Set of services referenced by a bouquet.
///
/// Holds ids only; a service referenced here is owned by the service subsystem
/// and may be referenced by any number of bouquets at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    services: BTreeSet<ServiceId>,
}

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, service: ServiceId) -> bool {
        self.services.contains(&service)
    }

    /// Add a service. Returns false if it was already present.
    pub fn insert(&mut self, service: ServiceId) -> bool {
        self.services.insert(service)
    }

    /// Remove a service. Returns false if it was not present.
    pub fn remove(&mut self, service: ServiceId) -> bool {
        self.services.remove(&service)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ServiceId> + '_ {
        self.services.iter().copied()
    }

    /// Members of `self` that are not in `other`.
    pub fn difference(&self, other: &MembershipSet) -> Vec<ServiceId> {
        self.services.difference(&other.services).copied().collect()
    }
}

impl FromIterator<ServiceId> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = ServiceId>>(iter: I) -> Self {
        Self {
            services: iter.into_iter().collect(),
        }
    }
}

//! End-of-scan reconciliation.

use bouquet_protocol::ServiceId;
use log::trace;

use super::collab::ServiceDirectory;
use super::entity::Bouquet;
use super::membership::MembershipSet;

impl Bouquet {
    /// Close a scan cycle.
    ///
    /// Members that were not seen during the cycle are dropped from the current
    /// set and the scan set starts over empty. Channels mapped from the dropped
    /// services are left alone; the returned list lets the caller unmap them with
    /// [`Bouquet::unmap_service`] if it wants to.
    pub fn completed<S>(&mut self, services: &S) -> Vec<ServiceId>
    where
        S: ServiceDirectory + ?Sized,
    {
        trace!(
            "Bouquet: completed: active={} old={}",
            self.active_services.len(),
            self.services.len()
        );

        let stale = self.services.difference(&self.active_services);
        for service in &stale {
            self.remove_service(*service, &services.nicename(*service));
        }

        self.active_services = MembershipSet::new();
        stale
    }
}

//! Deferred service resolution.
//!
//! Membership read at startup is a list of service identifiers, and the service
//! subsystem may not be able to answer lookups yet. The list is parked on the
//! bouquet ([`LoadPhase::Pending`]) until [`Bouquet::resolve_pending`] runs.

use log::trace;

use super::collab::Collaborators;
use super::entity::{Bouquet, LoadPhase};

impl Bouquet {
    /// Turn pending identifiers into members.
    ///
    /// Identifiers that do not resolve are dropped. The dirty flag is kept as it
    /// was, so a clean load stays clean. Returns the number of services added;
    /// calling it again is a no-op.
    pub fn resolve_pending(&mut self, collab: &mut dyn Collaborators) -> usize {
        let pending = match std::mem::replace(&mut self.phase, LoadPhase::Resolved) {
            LoadPhase::Pending(list) => list,
            other => {
                self.phase = other;
                return 0;
            }
        };

        let dirty = self.dirty;
        let mut added = 0;
        for identifier in &pending {
            match collab.find_by_identifier(identifier) {
                Some(service) => {
                    self.add_service(service, collab);
                    added += 1;
                }
                None => trace!(
                    "Bouquet: {}: service {} not available",
                    self.display_name(),
                    identifier
                ),
            }
        }
        self.dirty = dirty;
        added
    }
}

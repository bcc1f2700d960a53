//! Channel mapping engine.
//!
//! Decides, per service, whether a bouquet member gets a channel, and carries
//! out the [`MappingAction`]s produced by policy changes.

use bouquet_protocol::{ChannelId, ServiceId, TagId};
use log::{info, trace};

use super::collab::{Collaborators, MappingOrigin};
use super::entity::{is_blank_name, Bouquet};
use super::policy::MappingAction;

impl Bouquet {
    /// Record a service as a member of this bouquet.
    ///
    /// A new member is mapped right away when mapping is active. Outside of a
    /// load the service is also marked as seen in the running scan cycle, even if
    /// it was already a member.
    pub fn add_service(&mut self, service: ServiceId, collab: &mut dyn Collaborators) {
        if !self.services.contains(service) {
            trace!(
                "Bouquet: add service {} to {}",
                collab.nicename(service),
                self.display_name()
            );
            self.services.insert(service);
            self.dirty = true;
            if self.flags.is_mapping() {
                self.map_channel(service, collab);
            }
        }
        if !self.is_loading() {
            self.active_services.insert(service);
        }
    }

    /// Name of the channel tag owned by this bouquet.
    pub fn tag_name(&self) -> String {
        format!("*** {}", self.name.as_deref().unwrap_or("???"))
    }

    fn tag(&self, collab: &mut dyn Collaborators, create: bool) -> Option<TagId> {
        collab.find_by_name(&self.tag_name(), create)
    }

    /// Channel that this bouquet already mapped from `service`.
    pub fn mapped_channel(&self, service: ServiceId, collab: &dyn Collaborators) -> Option<ChannelId> {
        collab
            .channel_mappings(service)
            .into_iter()
            .find(|m| m.bouquet == Some(self.id))
            .map(|m| m.channel)
    }

    fn map_channel(&self, service: ServiceId, collab: &mut dyn Collaborators) {
        if !self.flags.map_no_lcn && collab.channel_number(service) <= 0 {
            return;
        }
        if !self.flags.map_no_name && is_blank_name(collab.channel_name(service).as_deref()) {
            return;
        }

        let channel = match self.mapped_channel(service, collab) {
            Some(channel) => Some(channel),
            None => {
                let origin = MappingOrigin {
                    bouquet: self.id,
                    lcn_offset: self.lcn_offset,
                };
                collab.synthesize_from_service(service, &origin)
            }
        };

        if let (Some(channel), true) = (channel, self.flags.channel_tag) {
            if let Some(tag) = self.tag(collab, true) {
                collab.map(channel, tag);
            }
        }
    }

    fn unmap_channel(&self, service: ServiceId, collab: &mut dyn Collaborators) {
        for mapping in collab.channel_mappings(service) {
            if mapping.bouquet != Some(self.id) {
                continue;
            }
            info!(
                "Bouquet: {} / {}: unmapped from {}",
                collab.display_name(mapping.channel),
                collab.nicename(service),
                self.display_name()
            );
            collab.delete(mapping.channel, true);
        }
    }

    /// Delete the channels this bouquet produced from `service`.
    pub fn unmap_service(&self, service: ServiceId, collab: &mut dyn Collaborators) {
        self.unmap_channel(service, collab);
    }

    /// Walk every member: map when mapping is active, unmap otherwise.
    pub fn map_to_channels(&self, collab: &mut dyn Collaborators) {
        let mapping = self.flags.is_mapping();
        for service in self.services.iter() {
            if mapping {
                self.map_channel(service, collab);
            } else {
                self.unmap_channel(service, collab);
            }
        }
    }

    /// Carry out the side effect of a policy change.
    pub fn apply_action(&self, action: MappingAction, collab: &mut dyn Collaborators) {
        match action {
            MappingAction::Nothing => {}
            MappingAction::RemapAll => self.map_to_channels(collab),
            MappingAction::UnmapZeroNumbered => {
                for service in self.services.iter() {
                    if collab.channel_number(service) <= 0 {
                        self.unmap_channel(service, collab);
                    }
                }
            }
            MappingAction::UnmapUnnamed => {
                for service in self.services.iter() {
                    if is_blank_name(collab.channel_name(service).as_deref()) {
                        self.unmap_channel(service, collab);
                    }
                }
            }
            MappingAction::UntagMapped => {
                let Some(tag) = self.tag(collab, false) else {
                    return;
                };
                for service in self.services.iter() {
                    if let Some(channel) = self.mapped_channel(service, collab) {
                        collab.unmap(channel, tag);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bouquet::policy::PolicyFlags;
    use crate::bouquet::testing::FakeWorld;
    use bouquet_protocol::BouquetId;

    fn mapping_bouquet() -> Bouquet {
        let mut bq = Bouquet::new(BouquetId::generate());
        bq.name = Some("Astra".into());
        bq.flags = PolicyFlags {
            enabled: true,
            map_to_channels: true,
            ..PolicyFlags::default()
        };
        bq
    }

    #[test]
    fn test_add_service_maps_once() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(5, Some("One"));
        let mut bq = mapping_bouquet();

        bq.add_service(svc, &mut world);
        bq.add_service(svc, &mut world);

        assert_eq!(bq.services().len(), 1);
        assert_eq!(world.synthesized_count(svc), 1);
        assert!(bq.active_services().contains(svc));
        assert!(bq.is_dirty());
    }

    #[test]
    fn test_add_service_inactive_does_not_map() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(5, Some("One"));
        let mut bq = mapping_bouquet();
        bq.flags.enabled = false;

        bq.add_service(svc, &mut world);

        assert!(bq.contains_service(svc));
        assert!(world.synthesized.is_empty());
    }

    #[test]
    fn test_add_service_while_loading_skips_scan_set() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(5, Some("One"));
        let mut bq = mapping_bouquet();

        bq.begin_load();
        bq.add_service(svc, &mut world);
        bq.finish_load();

        assert!(bq.contains_service(svc));
        assert!(bq.active_services().is_empty());
    }

    #[test]
    fn test_readd_refreshes_scan_set() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(5, Some("One"));
        let mut bq = mapping_bouquet();
        bq.services.insert(svc);

        bq.add_service(svc, &mut world);

        assert!(bq.active_services().contains(svc));
        assert!(!bq.is_dirty());
    }

    #[test]
    fn test_zero_number_and_blank_name_gates() {
        let mut world = FakeWorld::new();
        let zero = world.add_service(0, Some("Zero"));
        let unnamed = world.add_service(7, Some("  "));
        let mut bq = mapping_bouquet();

        bq.add_service(zero, &mut world);
        bq.add_service(unnamed, &mut world);
        assert!(world.synthesized.is_empty());

        bq.flags.map_no_lcn = true;
        bq.flags.map_no_name = true;
        bq.map_to_channels(&mut world);
        assert_eq!(world.synthesized.len(), 2);
    }

    #[test]
    fn test_existing_mapping_is_reused() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(3, Some("Three"));
        let mut bq = mapping_bouquet();
        bq.add_service(svc, &mut world);
        let channel = world.channel_for(svc, bq.id()).unwrap();

        bq.map_to_channels(&mut world);

        assert_eq!(world.synthesized_count(svc), 1);
        assert_eq!(world.channel_for(svc, bq.id()), Some(channel));
    }

    #[test]
    fn test_declined_synthesis_is_silent() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(3, Some("Three"));
        world.declined.insert(svc);
        let mut bq = mapping_bouquet();
        bq.flags.channel_tag = true;

        bq.add_service(svc, &mut world);

        assert!(bq.contains_service(svc));
        assert!(world.channels.is_empty());
        assert!(world.tags.is_empty());
    }

    #[test]
    fn test_channel_tag_applied() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(3, Some("Three"));
        let mut bq = mapping_bouquet();
        bq.flags.channel_tag = true;

        bq.add_service(svc, &mut world);

        let tag = world.tags["*** Astra"];
        let channel = world.channel_for(svc, bq.id()).unwrap();
        assert!(world.channel_tags(channel).contains(&tag));
    }

    #[test]
    fn test_tag_name_without_name() {
        let bq = Bouquet::new(BouquetId::generate());
        assert_eq!(bq.tag_name(), "*** ???");
    }

    #[test]
    fn test_unmap_only_touches_own_channels() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(3, Some("Three"));
        let mut ours = mapping_bouquet();
        let mut theirs = mapping_bouquet();
        ours.add_service(svc, &mut world);
        theirs.add_service(svc, &mut world);
        assert_eq!(world.channels.len(), 2);

        ours.unmap_service(svc, &mut world);

        assert!(world.channel_for(svc, ours.id()).is_none());
        assert!(world.channel_for(svc, theirs.id()).is_some());
    }

    #[test]
    fn test_remap_when_disabled_unmaps() {
        let mut world = FakeWorld::new();
        let a = world.add_service(1, Some("A"));
        let b = world.add_service(2, Some("B"));
        let mut bq = mapping_bouquet();
        bq.add_service(a, &mut world);
        bq.add_service(b, &mut world);
        assert_eq!(world.channels.len(), 2);

        bq.flags.map_to_channels = false;
        bq.apply_action(MappingAction::RemapAll, &mut world);

        assert!(world.channels.is_empty());
        assert_eq!(world.deleted.len(), 2);
        assert_eq!(bq.services().len(), 2);
    }

    #[test]
    fn test_unmap_zero_numbered_is_minimal() {
        let mut world = FakeWorld::new();
        let zero = world.add_service(0, Some("Zero"));
        let five = world.add_service(5, Some("Five"));
        let mut bq = mapping_bouquet();
        bq.flags.map_no_lcn = true;
        bq.add_service(zero, &mut world);
        bq.add_service(five, &mut world);
        let kept = world.channel_for(five, bq.id()).unwrap();

        bq.flags.map_no_lcn = false;
        bq.apply_action(MappingAction::UnmapZeroNumbered, &mut world);

        assert!(world.channel_for(zero, bq.id()).is_none());
        assert_eq!(world.channel_for(five, bq.id()), Some(kept));
    }

    #[test]
    fn test_untag_keeps_channels() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(3, Some("Three"));
        let mut bq = mapping_bouquet();
        bq.flags.channel_tag = true;
        bq.add_service(svc, &mut world);
        let channel = world.channel_for(svc, bq.id()).unwrap();

        bq.flags.channel_tag = false;
        bq.apply_action(MappingAction::UntagMapped, &mut world);

        assert!(world.channels.contains_key(&channel));
        assert!(world.channel_tags(channel).is_empty());
    }

    #[test]
    fn test_untag_without_tag_does_not_create_it() {
        let mut world = FakeWorld::new();
        let svc = world.add_service(3, Some("Three"));
        let mut bq = mapping_bouquet();
        bq.add_service(svc, &mut world);

        bq.apply_action(MappingAction::UntagMapped, &mut world);

        assert!(world.tags.is_empty());
    }
}

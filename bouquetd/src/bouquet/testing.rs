//! In-memory service/channel/tag world for tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use bouquet_protocol::{BouquetId, ChannelId, ServiceId, TagId};

use super::collab::{
    ChannelDirectory, ChannelMapping, ChannelTagDirectory, EventSink, MappingOrigin,
    ServiceDirectory,
};

#[derive(Debug, Clone)]
pub struct FakeService {
    pub nicename: String,
    pub number: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakeChannel {
    pub service: ServiceId,
    pub bouquet: Option<BouquetId>,
    pub lcn_offset: u32,
    pub tags: BTreeSet<TagId>,
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    pub services: HashMap<ServiceId, FakeService>,
    pub channels: BTreeMap<ChannelId, FakeChannel>,
    pub tags: HashMap<String, TagId>,
    /// Services the synthesizer refuses to map.
    pub declined: HashSet<ServiceId>,
    pub synthesized: Vec<(ServiceId, BouquetId)>,
    pub deleted: Vec<ChannelId>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_service(&mut self, number: i64, name: Option<&str>) -> ServiceId {
        let id = ServiceId::generate();
        self.services.insert(
            id,
            FakeService {
                nicename: format!("svc-{}", self.services.len()),
                number,
                name: name.map(str::to_string),
            },
        );
        id
    }

    /// Channel mapped from `service` by `bouquet`.
    pub fn channel_for(&self, service: ServiceId, bouquet: BouquetId) -> Option<ChannelId> {
        self.channels
            .iter()
            .find(|(_, ch)| ch.service == service && ch.bouquet == Some(bouquet))
            .map(|(id, _)| *id)
    }

    pub fn channel_tags(&self, channel: ChannelId) -> BTreeSet<TagId> {
        self.channels
            .get(&channel)
            .map(|ch| ch.tags.clone())
            .unwrap_or_default()
    }

    pub fn synthesized_count(&self, service: ServiceId) -> usize {
        self.synthesized.iter().filter(|(s, _)| *s == service).count()
    }
}

impl ServiceDirectory for FakeWorld {
    fn nicename(&self, service: ServiceId) -> String {
        self.services
            .get(&service)
            .map(|s| s.nicename.clone())
            .unwrap_or_else(|| service.to_string())
    }

    fn channel_number(&self, service: ServiceId) -> i64 {
        self.services.get(&service).map(|s| s.number).unwrap_or(0)
    }

    fn channel_name(&self, service: ServiceId) -> Option<String> {
        self.services.get(&service).and_then(|s| s.name.clone())
    }

    fn channel_mappings(&self, service: ServiceId) -> Vec<ChannelMapping> {
        self.channels
            .iter()
            .filter(|(_, ch)| ch.service == service)
            .map(|(id, ch)| ChannelMapping {
                channel: *id,
                bouquet: ch.bouquet,
            })
            .collect()
    }

    fn find_by_identifier(&self, identifier: &str) -> Option<ServiceId> {
        identifier
            .parse::<ServiceId>()
            .ok()
            .filter(|id| self.services.contains_key(id))
    }
}

impl ChannelDirectory for FakeWorld {
    fn display_name(&self, channel: ChannelId) -> String {
        self.channels
            .get(&channel)
            .map(|ch| self.nicename(ch.service))
            .unwrap_or_default()
    }

    fn delete(&mut self, channel: ChannelId, _cascade: bool) {
        if self.channels.remove(&channel).is_some() {
            self.deleted.push(channel);
        }
    }

    fn synthesize_from_service(
        &mut self,
        service: ServiceId,
        origin: &MappingOrigin,
    ) -> Option<ChannelId> {
        if self.declined.contains(&service) {
            return None;
        }
        let id = ChannelId::generate();
        self.channels.insert(
            id,
            FakeChannel {
                service,
                bouquet: Some(origin.bouquet),
                lcn_offset: origin.lcn_offset,
                tags: BTreeSet::new(),
            },
        );
        self.synthesized.push((service, origin.bouquet));
        Some(id)
    }
}

impl ChannelTagDirectory for FakeWorld {
    fn find_by_name(&mut self, name: &str, create: bool) -> Option<TagId> {
        if let Some(tag) = self.tags.get(name) {
            return Some(*tag);
        }
        if !create {
            return None;
        }
        let tag = TagId::generate();
        self.tags.insert(name.to_string(), tag);
        Some(tag)
    }

    fn map(&mut self, channel: ChannelId, tag: TagId) {
        if let Some(ch) = self.channels.get_mut(&channel) {
            ch.tags.insert(tag);
        }
    }

    fn unmap(&mut self, channel: ChannelId, tag: TagId) {
        if let Some(ch) = self.channels.get_mut(&channel) {
            ch.tags.remove(&tag);
        }
    }
}

/// Event sink that records every event.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<(String, BouquetId)>>>,
}

impl RecordingSink {
    pub fn count_for(&self, id: BouquetId) -> usize {
        self.events.lock().iter().filter(|(_, e)| *e == id).count()
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: &str, id: BouquetId) {
        self.events.lock().push((event.to_string(), id));
    }
}

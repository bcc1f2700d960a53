//! Contracts for the collaborators the bouquet subsystem calls out to.
//!
//! Services, channels and channel tags are owned elsewhere in the backend. The
//! bouquet code only holds their ids and reaches them through these traits.

use bouquet_protocol::{BouquetId, ChannelId, ConfigMap, ServiceId, TagId};
use log::debug;

use crate::database;

/// One link from a service to a channel it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMapping {
    pub channel: ChannelId,
    /// Bouquet that created the channel, if any.
    pub bouquet: Option<BouquetId>,
}

/// What the channel synthesizer is told about the requesting bouquet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingOrigin {
    pub bouquet: BouquetId,
    pub lcn_offset: u32,
}

/// Read access to broadcast services.
pub trait ServiceDirectory {
    /// Human readable name for log lines.
    fn nicename(&self, service: ServiceId) -> String;

    /// Logical channel number; zero or negative means unset.
    fn channel_number(&self, service: ServiceId) -> i64;

    /// Channel display name announced by the service.
    fn channel_name(&self, service: ServiceId) -> Option<String>;

    /// Channels currently mapped from this service.
    fn channel_mappings(&self, service: ServiceId) -> Vec<ChannelMapping>;

    /// Resolve a persisted service identifier to a live service.
    fn find_by_identifier(&self, identifier: &str) -> Option<ServiceId>;
}

/// Channel storage and synthesis.
pub trait ChannelDirectory {
    fn display_name(&self, channel: ChannelId) -> String;

    /// Delete a channel. With `cascade` its service mappings go too.
    fn delete(&mut self, channel: ChannelId, cascade: bool);

    /// Build a new channel from a service, or decline with `None`.
    fn synthesize_from_service(
        &mut self,
        service: ServiceId,
        origin: &MappingOrigin,
    ) -> Option<ChannelId>;
}

/// Channel tag storage.
pub trait ChannelTagDirectory {
    fn find_by_name(&mut self, name: &str, create: bool) -> Option<TagId>;
    fn map(&mut self, channel: ChannelId, tag: TagId);
    fn unmap(&mut self, channel: ChannelId, tag: TagId);
}

/// Everything the mapping engine needs, on one object.
///
/// Channel deletion must be visible through [`ServiceDirectory::channel_mappings`],
/// so services and channels are served by the same implementation.
pub trait Collaborators: ServiceDirectory + ChannelDirectory + ChannelTagDirectory {}

impl<T> Collaborators for T where T: ServiceDirectory + ChannelDirectory + ChannelTagDirectory {}

/// Persistence of configuration records.
pub trait SettingsStore {
    /// All records of a category as `(name, config)`, ordered by name.
    fn load(&self, category: &str) -> database::Result<Vec<(String, ConfigMap)>>;

    fn save(&self, config: &ConfigMap, path: &str) -> database::Result<()>;

    fn remove(&self, path: &str) -> database::Result<()>;
}

/// Receiver of structural change events.
pub trait EventSink: Send {
    fn notify(&self, event: &str, id: BouquetId);
}

/// Default sink: writes the event to the debug log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn notify(&self, event: &str, id: BouquetId) {
        debug!("Event: {} changed ({})", event, id);
    }
}

/// Collaborators for running without the service subsystem.
///
/// No service resolves and no channel is ever produced, so bouquets keep their
/// persisted membership untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCollaborators;

impl ServiceDirectory for OfflineCollaborators {
    fn nicename(&self, service: ServiceId) -> String {
        service.to_string()
    }

    fn channel_number(&self, _service: ServiceId) -> i64 {
        0
    }

    fn channel_name(&self, _service: ServiceId) -> Option<String> {
        None
    }

    fn channel_mappings(&self, _service: ServiceId) -> Vec<ChannelMapping> {
        Vec::new()
    }

    fn find_by_identifier(&self, _identifier: &str) -> Option<ServiceId> {
        None
    }
}

impl ChannelDirectory for OfflineCollaborators {
    fn display_name(&self, channel: ChannelId) -> String {
        channel.to_string()
    }

    fn delete(&mut self, _channel: ChannelId, _cascade: bool) {}

    fn synthesize_from_service(
        &mut self,
        _service: ServiceId,
        _origin: &MappingOrigin,
    ) -> Option<ChannelId> {
        None
    }
}

impl ChannelTagDirectory for OfflineCollaborators {
    fn find_by_name(&mut self, _name: &str, _create: bool) -> Option<TagId> {
        None
    }

    fn map(&mut self, _channel: ChannelId, _tag: TagId) {}

    fn unmap(&mut self, _channel: ChannelId, _tag: TagId) {}
}

//! Bouquet registry.
//!
//! [`Bouquets`] owns every bouquet, indexed by source key (ordered) and by
//! uuid. Holding `&mut Bouquets` means holding the subsystem lock; see
//! [`super::BouquetSubsystem`].

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use bouquet_protocol::{
    property, AccessLevel, BouquetId, ConfigMap, PropertyValue, ServiceId, BOUQUET_CLASS,
};
use log::{debug, error, info, warn};

use super::collab::{Collaborators, EventSink, LogEventSink, ServiceDirectory, SettingsStore};
use super::entity::Bouquet;
use super::{BouquetError, Result};

/// Settings category of persisted bouquets.
pub const SETTINGS_CATEGORY: &str = "bouquet";

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Record and entity are gone.
    Removed,
    /// Shielded bouquet: membership cleared, record rewritten.
    Emptied,
}

/// The set of live bouquets.
pub struct Bouquets {
    by_source: BTreeMap<String, Bouquet>,
    by_id: HashMap<BouquetId, String>,
    events: Box<dyn EventSink>,
}

impl Default for Bouquets {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bouquets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bouquets")
            .field("count", &self.by_source.len())
            .finish_non_exhaustive()
    }
}

fn check_access(access: AccessLevel, operation: &'static str) -> Result<()> {
    if access.permits(BOUQUET_CLASS.permission) {
        Ok(())
    } else {
        Err(BouquetError::PermissionDenied(operation))
    }
}

impl Bouquets {
    pub fn new() -> Self {
        Self::with_event_sink(Box::new(LogEventSink))
    }

    pub fn with_event_sink(events: Box<dyn EventSink>) -> Self {
        Self {
            by_source: BTreeMap::new(),
            by_id: HashMap::new(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    /// Bouquets in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Bouquet> {
        self.by_source.values()
    }

    pub fn get(&self, id: BouquetId) -> Option<&Bouquet> {
        self.by_id.get(&id).and_then(|src| self.by_source.get(src))
    }

    pub fn get_mut(&mut self, id: BouquetId) -> Option<&mut Bouquet> {
        let src = self.by_id.get(&id)?;
        self.by_source.get_mut(src)
    }

    fn require_mut(&mut self, id: BouquetId) -> Result<&mut Bouquet> {
        self.get_mut(id)
            .ok_or_else(|| BouquetError::NotFound(id.to_string()))
    }

    pub fn get_by_source(&self, source: &str) -> Option<&Bouquet> {
        self.by_source.get(source)
    }

    /// Find the bouquet for `source`, creating it when asked to and a name is
    /// given.
    pub fn find_by_source(
        &mut self,
        source: &str,
        create: bool,
        name: Option<&str>,
    ) -> Option<&mut Bouquet> {
        if self.by_source.contains_key(source) {
            return self.by_source.get_mut(source);
        }
        match name {
            Some(name) if create && !name.is_empty() => {
                self.create(None, None, Some(name), Some(source)).ok()
            }
            _ => None,
        }
    }

    /// Make sure a system managed bouquet exists and is shielded.
    pub fn ensure_system(&mut self, source: &str, name: &str) -> Option<BouquetId> {
        let bq = self.find_by_source(source, true, Some(name))?;
        if !bq.is_shielded() {
            info!("Bouquet: {} is system managed", bq.display_name());
            bq.set_shielded(true);
        }
        Some(bq.id())
    }

    /// Allocate and register a bouquet.
    ///
    /// A caller supplied uuid must parse and must not be in use. With `conf`
    /// the persisted properties are applied in load mode; `name` and `source`
    /// override what the config says.
    ///
    /// # Panics
    ///
    /// If another bouquet already uses the resulting source key.
    pub fn create(
        &mut self,
        uuid: Option<&str>,
        conf: Option<&ConfigMap>,
        name: Option<&str>,
        source: Option<&str>,
    ) -> Result<&mut Bouquet> {
        let id = match uuid {
            Some(text) => {
                let id = text.parse::<BouquetId>().map_err(|_| {
                    error!("Bouquet: invalid uuid '{}'", text);
                    BouquetError::InvalidIdentity(text.to_string())
                })?;
                // The settings path is derived from the canonical form
                if id.to_string() != text {
                    error!("Bouquet: uuid '{}' is not in canonical form", text);
                    return Err(BouquetError::InvalidIdentity(text.to_string()));
                }
                if self.by_id.contains_key(&id) {
                    error!("Bouquet: uuid '{}' already in use", text);
                    return Err(BouquetError::InvalidIdentity(text.to_string()));
                }
                id
            }
            None => loop {
                let id = BouquetId::generate();
                if !self.by_id.contains_key(&id) {
                    break id;
                }
            },
        };

        let mut bq = Bouquet::new(id);

        if let Some(conf) = conf {
            bq.begin_load();
            bq.load_config(conf);
            bq.finish_load();
        }
        if let Some(name) = name {
            bq.name = Some(name.to_string());
        }
        if let Some(source) = source {
            bq.source = source.to_string();
        }
        bq.dirty = true;

        match self.by_source.entry(bq.source.clone()) {
            Entry::Occupied(entry) => {
                panic!("Bouquet: duplicate source key {:?}", entry.key());
            }
            Entry::Vacant(entry) => {
                debug!("Bouquet: created {} ({})", bq.display_name(), id);
                self.by_id.insert(id, entry.key().clone());
                Ok(entry.insert(bq))
            }
        }
    }

    /// Unregister and drop a bouquet.
    fn destroy(&mut self, id: BouquetId) -> Option<Bouquet> {
        let source = self.by_id.remove(&id)?;
        let bq = self.by_source.remove(&source);
        if let Some(bq) = &bq {
            debug!("Bouquet: destroyed {} ({})", bq.display_name(), id);
        }
        bq
    }

    /// Forget a service that is being deleted for good.
    pub fn destroy_by_service(&mut self, service: ServiceId) {
        for bq in self.by_source.values_mut() {
            if bq.services.contains(service) {
                bq.services.remove(service);
                bq.dirty = true;
            }
            bq.active_services.remove(service);
        }
    }

    /// Load every persisted bouquet.
    ///
    /// Records with an unusable uuid or a source that is already taken are
    /// skipped. Loaded bouquets start clean.
    pub fn init(&mut self, store: &dyn SettingsStore) -> Result<usize> {
        let records = store.load(SETTINGS_CATEGORY)?;
        let mut loaded = 0;

        for (name, conf) in records {
            let source = conf
                .get(property::SOURCE)
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if self.by_source.contains_key(source) {
                error!(
                    "Bouquet: {}: source {:?} already loaded, skipping",
                    name, source
                );
                continue;
            }
            match self.create(Some(&name), Some(&conf), None, None) {
                Ok(bq) => {
                    bq.clear_dirty();
                    loaded += 1;
                }
                Err(e) => warn!("Bouquet: skipping record {}: {}", name, e),
            }
        }

        info!("Bouquet: loaded {} bouquets", loaded);
        Ok(loaded)
    }

    /// Resolve the pending membership of every bouquet.
    pub fn resolve_services(&mut self, collab: &mut dyn Collaborators) -> usize {
        let mut added = 0;
        for bq in self.by_source.values_mut() {
            if !bq.pending_services().is_empty() {
                added += bq.resolve_pending(collab);
            }
        }
        added
    }

    /// Close the scan cycle of one bouquet.
    pub fn completed(
        &mut self,
        id: BouquetId,
        services: &dyn ServiceDirectory,
    ) -> Result<Vec<ServiceId>> {
        let bq = self.require_mut(id)?;
        Ok(bq.completed(services))
    }

    /// Persist a bouquet and clear its dirty flag.
    pub fn save(&mut self, id: BouquetId, store: &dyn SettingsStore, notify: bool) -> Result<()> {
        let bq = self.require_mut(id)?;
        store.save(&bq.save_config(), &bq.settings_path())?;
        bq.clear_dirty();
        if notify {
            self.events.notify(BOUQUET_CLASS.event, id);
        }
        Ok(())
    }

    /// Persist every dirty bouquet. Returns how many were written.
    pub fn save_dirty(&mut self, store: &dyn SettingsStore) -> Result<usize> {
        let mut saved = 0;
        for bq in self.by_source.values_mut() {
            if bq.is_dirty() {
                store.save(&bq.save_config(), &bq.settings_path())?;
                bq.clear_dirty();
                saved += 1;
            }
        }
        Ok(saved)
    }

    /// List bouquets for an API caller.
    pub fn list(&self, access: AccessLevel) -> Result<Vec<&Bouquet>> {
        check_access(access, "list")?;
        Ok(self.iter().collect())
    }

    /// Read one property for an API caller.
    pub fn read_property(
        &self,
        access: AccessLevel,
        id: BouquetId,
        prop: &str,
    ) -> Result<PropertyValue> {
        check_access(access, "read")?;
        let bq = self
            .get(id)
            .ok_or_else(|| BouquetError::NotFound(id.to_string()))?;
        Ok(bq.get_property(prop)?)
    }

    /// Write one property through the edit path.
    ///
    /// A change runs the property's policy rule, then the bouquet is saved and
    /// a change event is emitted. Returns false when the value was unchanged.
    pub fn write_property(
        &mut self,
        access: AccessLevel,
        id: BouquetId,
        prop: &str,
        value: PropertyValue,
        collab: &mut dyn Collaborators,
        store: &dyn SettingsStore,
    ) -> Result<bool> {
        check_access(access, "write")?;
        let def = property::lookup(prop)
            .ok_or_else(|| bouquet_protocol::PropertyError::Unknown(prop.to_string()))?;
        if def.opts.rdonly {
            return Err(bouquet_protocol::PropertyError::ReadOnly(prop.to_string()).into());
        }

        let bq = self.require_mut(id)?;
        let Some(action) = bq.store_property(def, value)? else {
            return Ok(false);
        };
        debug!("Bouquet: {}: {} changed, {:?}", bq.display_name(), prop, action);
        bq.apply_action(action, collab);
        bq.mark_dirty();

        self.save(id, store, true)?;
        Ok(true)
    }

    /// Delete a bouquet on behalf of a user.
    ///
    /// A shielded bouquet is only emptied and saved again.
    pub fn delete(
        &mut self,
        access: AccessLevel,
        id: BouquetId,
        store: &dyn SettingsStore,
    ) -> Result<DeleteOutcome> {
        check_access(access, "delete")?;
        let bq = self.require_mut(id)?;

        if !bq.is_shielded() {
            store.remove(&bq.settings_path())?;
            self.destroy(id);
            return Ok(DeleteOutcome::Removed);
        }

        info!("Bouquet: {} is shielded, clearing services", bq.display_name());
        bq.clear_services();
        self.save(id, store, true)?;
        Ok(DeleteOutcome::Emptied)
    }

    /// Destroy every bouquet.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Some((_, bq)) = self.by_source.pop_first() {
            self.by_id.remove(&bq.id);
            count += 1;
        }
        count
    }
}

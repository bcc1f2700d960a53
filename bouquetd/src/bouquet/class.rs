//! Property access for bouquet records.
//!
//! Maps the property table in [`bouquet_protocol::property`] onto [`Bouquet`]
//! fields: typed get/render, loading from and saving to a [`ConfigMap`], and
//! storing values written through the edit path.

use std::collections::HashSet;

use bouquet_protocol::{
    property, ConfigMap, PropertyDef, PropertyError, PropertyKind, PropertyValue,
};
use log::warn;
use serde_json::Value;

use super::entity::Bouquet;
use super::policy::{self, MappingAction, PolicyFlag};

fn lookup(id: &str) -> Result<&'static PropertyDef, PropertyError> {
    property::lookup(id).ok_or_else(|| PropertyError::Unknown(id.to_string()))
}

impl Bouquet {
    /// Title shown in listings: the comment if set, otherwise the name.
    pub fn title(&self) -> &str {
        match self.comment.as_deref() {
            Some(comment) if !comment.is_empty() => comment,
            _ => self.name.as_deref().unwrap_or(""),
        }
    }

    /// Identifiers of the current members.
    pub fn service_identifiers(&self) -> Vec<String> {
        self.services.iter().map(|s| s.to_string()).collect()
    }

    /// Read a property.
    pub fn get_property(&self, id: &str) -> Result<PropertyValue, PropertyError> {
        let def = lookup(id)?;
        if let Some(flag) = PolicyFlag::from_property(def.id) {
            return Ok(PropertyValue::Bool(self.flags.get(flag)));
        }
        let value = match def.id {
            property::NAME => PropertyValue::Str(self.name.clone()),
            property::SOURCE => PropertyValue::Str(Some(self.source.clone())),
            property::SERVICES => PropertyValue::StrList(self.service_identifiers()),
            property::SERVICES_COUNT => {
                PropertyValue::U32(u32::try_from(self.services.len()).unwrap_or(u32::MAX))
            }
            property::COMMENT => PropertyValue::Str(self.comment.clone()),
            property::LCN_OFFSET => PropertyValue::U32(self.lcn_offset),
            _ => return Err(PropertyError::Unknown(id.to_string())),
        };
        Ok(value)
    }

    /// Display form of a property.
    pub fn render_property(&self, id: &str) -> Result<String, PropertyError> {
        if id == property::SERVICES {
            return Ok(format!("Services Count {}", self.services.len()));
        }
        Ok(self.get_property(id)?.to_string())
    }

    /// Store a value without running any policy rule.
    ///
    /// Returns the mapping action the change calls for, or `None` if the value
    /// did not change. Read-only properties are accepted here; the edit path
    /// filters them out before calling.
    pub(super) fn store_property(
        &mut self,
        def: &PropertyDef,
        value: PropertyValue,
    ) -> Result<Option<MappingAction>, PropertyError> {
        if !def.kind.accepts(&value) {
            return Err(PropertyError::TypeMismatch {
                id: def.id.to_string(),
                expected: def.kind,
            });
        }

        if let (Some(flag), PropertyValue::Bool(b)) = (PolicyFlag::from_property(def.id), &value) {
            let (next, action) = policy::transition(self.flags, flag, *b);
            if next == self.flags {
                return Ok(None);
            }
            self.flags = next;
            return Ok(Some(action));
        }

        let changed = match (def.id, value) {
            (property::NAME, PropertyValue::Str(s)) => replace(&mut self.name, s),
            (property::COMMENT, PropertyValue::Str(s)) => replace(&mut self.comment, s),
            (property::SOURCE, PropertyValue::Str(s)) => {
                replace(&mut self.source, s.unwrap_or_default())
            }
            (property::LCN_OFFSET, PropertyValue::U32(n)) => replace(&mut self.lcn_offset, n),
            (property::SERVICES, PropertyValue::StrList(list)) => {
                self.stage_services(list);
                true
            }
            // Derived, nothing to store
            (property::SERVICES_COUNT, _) => false,
            (id, _) => return Err(PropertyError::Unknown(id.to_string())),
        };

        Ok(changed.then_some(MappingAction::Nothing))
    }

    /// Apply a persisted config.
    ///
    /// Every known, savable key present in `conf` is applied. Values of the
    /// wrong type are skipped with a warning.
    pub(super) fn load_config(&mut self, conf: &ConfigMap) {
        for def in property::BOUQUET_PROPERTIES {
            if def.opts.nosave {
                continue;
            }
            let Some(raw) = conf.get(def.id) else {
                continue;
            };
            let Some(value) = PropertyValue::from_json(def.kind, raw) else {
                warn!(
                    "Bouquet: {}: ignoring {} value {} (expected {})",
                    self.id, def.id, raw, def.kind
                );
                continue;
            };
            if let Err(e) = self.store_property(def, value) {
                warn!("Bouquet: {}: {}", self.id, e);
            }
        }

        if let Some(PropertyValue::Bool(true)) = conf
            .get(property::SHIELD)
            .and_then(|v| PropertyValue::from_json(PropertyKind::Bool, v))
        {
            self.shielded = true;
        }
    }

    /// Build the persisted form of this bouquet.
    ///
    /// While membership is still pending, the unresolved identifiers are saved
    /// along with the resolved ones.
    pub fn save_config(&self) -> ConfigMap {
        let mut conf = ConfigMap::new();
        for def in property::BOUQUET_PROPERTIES {
            if def.opts.nosave {
                continue;
            }
            let value = if def.id == property::SERVICES {
                let mut list = self.service_identifiers();
                let mut seen: HashSet<String> = list.iter().cloned().collect();
                for pending in self.pending_services() {
                    if seen.insert(pending.clone()) {
                        list.push(pending.clone());
                    }
                }
                PropertyValue::StrList(list)
            } else {
                match self.get_property(def.id) {
                    Ok(value) => value,
                    Err(_) => continue,
                }
            };
            if let Some(json) = value.to_json() {
                conf.insert(def.id.to_string(), json);
            }
        }
        if self.shielded {
            conf.insert(property::SHIELD.to_string(), Value::Bool(true));
        }
        conf
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

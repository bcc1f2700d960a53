//! The bouquet record.

use bouquet_protocol::{BouquetId, ServiceId};

use super::membership::MembershipSet;
use super::policy::PolicyFlags;

/// Where a bouquet stands between loading and service resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    /// Persisted config is being applied. Holds the membership list read so far.
    Loading { pending: Option<Vec<String>> },
    /// Loaded; these service identifiers wait for the service subsystem.
    Pending(Vec<String>),
    /// Membership is fully held in the current set.
    Resolved,
}

/// A named, source-identified collection of services.
#[derive(Debug)]
pub struct Bouquet {
    pub(super) id: BouquetId,
    pub(super) source: String,
    pub(super) name: Option<String>,
    pub(super) comment: Option<String>,
    pub(super) flags: PolicyFlags,
    pub(super) lcn_offset: u32,
    pub(super) shielded: bool,
    /// Services believed to belong to the bouquet (persisted).
    pub(super) services: MembershipSet,
    /// Services observed during the running scan cycle.
    pub(super) active_services: MembershipSet,
    pub(super) phase: LoadPhase,
    pub(super) dirty: bool,
}

impl Bouquet {
    pub(super) fn new(id: BouquetId) -> Self {
        Self {
            id,
            source: String::new(),
            name: None,
            comment: None,
            flags: PolicyFlags::default(),
            lcn_offset: 0,
            shielded: false,
            services: MembershipSet::new(),
            active_services: MembershipSet::new(),
            phase: LoadPhase::Resolved,
            dirty: false,
        }
    }

    pub fn id(&self) -> BouquetId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Name for log lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unknown>")
    }

    pub fn flags(&self) -> PolicyFlags {
        self.flags
    }

    pub fn lcn_offset(&self) -> u32 {
        self.lcn_offset
    }

    pub fn is_shielded(&self) -> bool {
        self.shielded
    }

    pub fn set_shielded(&mut self, shielded: bool) {
        if self.shielded != shielded {
            self.shielded = shielded;
            self.dirty = true;
        }
    }

    pub fn services(&self) -> &MembershipSet {
        &self.services
    }

    pub fn active_services(&self) -> &MembershipSet {
        &self.active_services
    }

    pub fn contains_service(&self, service: ServiceId) -> bool {
        self.services.contains(service)
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading { .. })
    }

    /// Identifiers still waiting for resolution.
    pub fn pending_services(&self) -> &[String] {
        match &self.phase {
            LoadPhase::Pending(list) => list,
            _ => &[],
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(super) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Settings path of the persisted record.
    pub fn settings_path(&self) -> String {
        format!("bouquet/{}", self.id)
    }

    /// Stage a persisted membership list.
    ///
    /// The list is kept only while loading; any write replaces the previous
    /// pending list.
    pub(super) fn stage_services(&mut self, list: Vec<String>) {
        match &mut self.phase {
            LoadPhase::Loading { pending } => *pending = Some(list),
            _ => self.phase = LoadPhase::Resolved,
        }
    }

    pub(super) fn begin_load(&mut self) {
        self.phase = LoadPhase::Loading { pending: None };
    }

    pub(super) fn finish_load(&mut self) {
        let phase = std::mem::replace(&mut self.phase, LoadPhase::Resolved);
        if let LoadPhase::Loading {
            pending: Some(list),
        } = phase
        {
            if !list.is_empty() {
                self.phase = LoadPhase::Pending(list);
            }
        }
    }

    /// Drop a service from the current set.
    pub(super) fn remove_service(&mut self, service: ServiceId, nicename: &str) -> bool {
        if !self.services.remove(service) {
            return false;
        }
        log::trace!("Bouquet: remove service {} from {}", nicename, self.display_name());
        self.dirty = true;
        true
    }

    /// Replace the current set with an empty one.
    pub(super) fn clear_services(&mut self) {
        self.services = MembershipSet::new();
        if matches!(self.phase, LoadPhase::Pending(_)) {
            self.phase = LoadPhase::Resolved;
        }
        self.dirty = true;
    }
}

/// A name is blank when absent or made only of characters at or below U+0020.
pub fn is_blank_name(name: Option<&str>) -> bool {
    match name {
        None => true,
        Some(s) => s.chars().all(|c| c <= ' '),
    }
}

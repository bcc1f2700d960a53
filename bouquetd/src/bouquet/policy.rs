//! Mapping policy flags and their change rules.
//!
//! A flag write is a pure transition: it takes the current flags and the new
//! value and yields the next flags plus the [`MappingAction`] the mapping engine
//! has to run. Nothing here touches channels.

use bouquet_protocol::property;

/// The boolean policy flags of a bouquet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyFlags {
    pub enabled: bool,
    pub map_to_channels: bool,
    /// Map services whose channel number is unset.
    pub map_no_lcn: bool,
    /// Map services with a blank name.
    pub map_no_name: bool,
    /// Tag mapped channels with the bouquet tag.
    pub channel_tag: bool,
}

impl PolicyFlags {
    /// True when membership changes produce channels.
    pub fn is_mapping(&self) -> bool {
        self.enabled && self.map_to_channels
    }

    pub fn get(&self, flag: PolicyFlag) -> bool {
        match flag {
            PolicyFlag::Enabled => self.enabled,
            PolicyFlag::MapToChannels => self.map_to_channels,
            PolicyFlag::MapNoLcn => self.map_no_lcn,
            PolicyFlag::MapNoName => self.map_no_name,
            PolicyFlag::ChannelTag => self.channel_tag,
        }
    }

    pub fn set(&mut self, flag: PolicyFlag, value: bool) {
        let slot = match flag {
            PolicyFlag::Enabled => &mut self.enabled,
            PolicyFlag::MapToChannels => &mut self.map_to_channels,
            PolicyFlag::MapNoLcn => &mut self.map_no_lcn,
            PolicyFlag::MapNoName => &mut self.map_no_name,
            PolicyFlag::ChannelTag => &mut self.channel_tag,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyFlag {
    Enabled,
    MapToChannels,
    MapNoLcn,
    MapNoName,
    ChannelTag,
}

impl PolicyFlag {
    pub const ALL: [PolicyFlag; 5] = [
        PolicyFlag::Enabled,
        PolicyFlag::MapToChannels,
        PolicyFlag::MapNoLcn,
        PolicyFlag::MapNoName,
        PolicyFlag::ChannelTag,
    ];

    pub fn from_property(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.property() == id)
    }

    pub fn property(self) -> &'static str {
        match self {
            PolicyFlag::Enabled => property::ENABLED,
            PolicyFlag::MapToChannels => property::MAP_TO_CHANNELS,
            PolicyFlag::MapNoLcn => property::MAP_NO_LCN,
            PolicyFlag::MapNoName => property::MAP_NO_NAME,
            PolicyFlag::ChannelTag => property::CHANNEL_TAG,
        }
    }
}

/// Side effect required after a policy change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingAction {
    Nothing,
    /// Map every member if mapping is active, otherwise unmap every member.
    RemapAll,
    /// Unmap members whose channel number is unset.
    UnmapZeroNumbered,
    /// Unmap members whose name is blank.
    UnmapUnnamed,
    /// Remove the bouquet tag from every channel this bouquet mapped.
    UntagMapped,
}

/// Apply a flag write.
///
/// Turning a restriction off only needs to retire the channels the old rule
/// allowed and the new one does not; anything else is a full remap.
pub fn transition(flags: PolicyFlags, flag: PolicyFlag, value: bool) -> (PolicyFlags, MappingAction) {
    if flags.get(flag) == value {
        return (flags, MappingAction::Nothing);
    }

    let mut next = flags;
    next.set(flag, value);

    let action = match flag {
        PolicyFlag::Enabled | PolicyFlag::MapToChannels => MappingAction::RemapAll,
        PolicyFlag::MapNoLcn if !value && next.is_mapping() => MappingAction::UnmapZeroNumbered,
        PolicyFlag::MapNoName if !value && next.is_mapping() => MappingAction::UnmapUnnamed,
        PolicyFlag::ChannelTag if !value && next.is_mapping() => MappingAction::UntagMapped,
        PolicyFlag::MapNoLcn | PolicyFlag::MapNoName | PolicyFlag::ChannelTag => {
            MappingAction::RemapAll
        }
    };

    (next, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> PolicyFlags {
        PolicyFlags {
            enabled: true,
            map_to_channels: true,
            map_no_lcn: true,
            map_no_name: true,
            channel_tag: true,
        }
    }

    #[test]
    fn test_unchanged_value_is_noop() {
        let flags = active();
        for flag in PolicyFlag::ALL {
            assert_eq!(transition(flags, flag, true), (flags, MappingAction::Nothing));
        }
    }

    #[test]
    fn test_enable_and_maptoch_always_remap() {
        let (next, action) = transition(active(), PolicyFlag::Enabled, false);
        assert!(!next.enabled);
        assert_eq!(action, MappingAction::RemapAll);

        let (next, action) = transition(next, PolicyFlag::Enabled, true);
        assert!(next.enabled);
        assert_eq!(action, MappingAction::RemapAll);

        let (_, action) = transition(active(), PolicyFlag::MapToChannels, false);
        assert_eq!(action, MappingAction::RemapAll);
    }

    #[test]
    fn test_restriction_off_while_active_is_minimal() {
        assert_eq!(
            transition(active(), PolicyFlag::MapNoLcn, false).1,
            MappingAction::UnmapZeroNumbered
        );
        assert_eq!(
            transition(active(), PolicyFlag::MapNoName, false).1,
            MappingAction::UnmapUnnamed
        );
        assert_eq!(
            transition(active(), PolicyFlag::ChannelTag, false).1,
            MappingAction::UntagMapped
        );
    }

    #[test]
    fn test_restriction_off_while_inactive_remaps() {
        let mut flags = active();
        flags.enabled = false;
        assert_eq!(
            transition(flags, PolicyFlag::MapNoLcn, false).1,
            MappingAction::RemapAll
        );
        assert_eq!(
            transition(flags, PolicyFlag::ChannelTag, false).1,
            MappingAction::RemapAll
        );
    }

    #[test]
    fn test_restriction_on_remaps() {
        let mut flags = active();
        flags.map_no_name = false;
        let (next, action) = transition(flags, PolicyFlag::MapNoName, true);
        assert!(next.map_no_name);
        assert_eq!(action, MappingAction::RemapAll);
    }

    #[test]
    fn test_flag_property_names() {
        assert_eq!(PolicyFlag::from_property("mapnolcn"), Some(PolicyFlag::MapNoLcn));
        assert_eq!(PolicyFlag::from_property("chtag"), Some(PolicyFlag::ChannelTag));
        assert_eq!(PolicyFlag::from_property("name"), None);
    }
}

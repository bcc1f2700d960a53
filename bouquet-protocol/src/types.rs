//! Property definitions for the bouquet record.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PropertyError;

/// Persisted property bag (one per record).
pub type ConfigMap = serde_json::Map<String, Value>;

/// Access level of the caller of the edit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    /// Regular viewer account.
    User,
    /// Administrative account.
    Admin,
}

impl AccessLevel {
    /// Returns true if this level satisfies `required`.
    pub fn permits(self, required: AccessLevel) -> bool {
        self >= required
    }
}

/// Class-level metadata for a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    pub class: &'static str,
    pub caption: &'static str,
    /// Event name emitted on structural changes.
    pub event: &'static str,
    /// API endpoint listing the records of this class.
    pub list_uri: &'static str,
    pub permission: AccessLevel,
}

pub const BOUQUET_CLASS: ClassInfo = ClassInfo {
    class: "bouquet",
    caption: "Bouquet",
    event: "bouquet",
    list_uri: "bouquet/list",
    permission: AccessLevel::Admin,
};

/// Value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Bool,
    Str,
    U32,
    StrList,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Str => "str",
            PropertyKind::U32 => "u32",
            PropertyKind::StrList => "str list",
        };
        f.write_str(name)
    }
}

impl PropertyKind {
    /// Returns true if `value` has this kind. `Str` also accepts an absent string.
    pub fn accepts(self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (PropertyKind::Bool, PropertyValue::Bool(_))
                | (PropertyKind::Str, PropertyValue::Str(_))
                | (PropertyKind::U32, PropertyValue::U32(_))
                | (PropertyKind::StrList, PropertyValue::StrList(_))
        )
    }

    /// Parse a command line / form value into this kind.
    pub fn parse(self, id: &str, text: &str) -> Result<PropertyValue, PropertyError> {
        let invalid = || PropertyError::InvalidValue {
            id: id.to_string(),
            value: text.to_string(),
        };
        match self {
            PropertyKind::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(PropertyValue::Bool(true)),
                "0" | "false" | "no" | "off" => Ok(PropertyValue::Bool(false)),
                _ => Err(invalid()),
            },
            PropertyKind::Str => {
                if text.is_empty() {
                    Ok(PropertyValue::Str(None))
                } else {
                    Ok(PropertyValue::Str(Some(text.to_string())))
                }
            }
            PropertyKind::U32 => text
                .trim()
                .parse::<u32>()
                .map(PropertyValue::U32)
                .map_err(|_| invalid()),
            PropertyKind::StrList => Ok(PropertyValue::StrList(
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }
}

/// Typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Bool(bool),
    Str(Option<String>),
    U32(u32),
    StrList(Vec<String>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Str(_) => PropertyKind::Str,
            PropertyValue::U32(_) => PropertyKind::U32,
            PropertyValue::StrList(_) => PropertyKind::StrList,
        }
    }

    /// Convert to the JSON form stored in a [`ConfigMap`]. Absent strings have no
    /// stored form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            PropertyValue::Bool(b) => Some(Value::Bool(*b)),
            PropertyValue::Str(s) => s.as_ref().map(|s| Value::String(s.clone())),
            PropertyValue::U32(n) => Some(Value::from(*n)),
            PropertyValue::StrList(l) => Some(Value::Array(
                l.iter().map(|s| Value::String(s.clone())).collect(),
            )),
        }
    }

    /// Read a stored JSON value as `kind`.
    ///
    /// Booleans are also accepted as 0/1 numbers, the way older settings files
    /// store them. Non-string list entries are dropped.
    pub fn from_json(kind: PropertyKind, value: &Value) -> Option<Self> {
        match kind {
            PropertyKind::Bool => match value {
                Value::Bool(b) => Some(PropertyValue::Bool(*b)),
                Value::Number(n) => n.as_i64().map(|n| PropertyValue::Bool(n != 0)),
                _ => None,
            },
            PropertyKind::Str => match value {
                Value::String(s) => Some(PropertyValue::Str(Some(s.clone()))),
                Value::Null => Some(PropertyValue::Str(None)),
                _ => None,
            },
            PropertyKind::U32 => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(PropertyValue::U32),
            PropertyKind::StrList => value.as_array().map(|items| {
                PropertyValue::StrList(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                )
            }),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Str(s) => f.write_str(s.as_deref().unwrap_or("")),
            PropertyValue::U32(n) => write!(f, "{}", n),
            PropertyValue::StrList(l) => f.write_str(&l.join(",")),
        }
    }
}

/// Property option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyOpts {
    /// Not writable through the edit path (still loaded from config).
    pub rdonly: bool,
    /// Not shown in default listings.
    pub hidden: bool,
    /// Derived; never persisted.
    pub nosave: bool,
}

impl PropertyOpts {
    pub const NONE: PropertyOpts = PropertyOpts {
        rdonly: false,
        hidden: false,
        nosave: false,
    };
    pub const RDONLY: PropertyOpts = PropertyOpts {
        rdonly: true,
        hidden: false,
        nosave: false,
    };
}

/// One entry of a class property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDef {
    pub id: &'static str,
    pub caption: &'static str,
    pub kind: PropertyKind,
    pub opts: PropertyOpts,
}

/// The bouquet property table.
pub mod property {
    use super::{PropertyDef, PropertyKind, PropertyOpts};

    pub const ENABLED: &str = "enabled";
    pub const MAP_TO_CHANNELS: &str = "maptoch";
    pub const MAP_NO_LCN: &str = "mapnolcn";
    pub const MAP_NO_NAME: &str = "mapnoname";
    pub const CHANNEL_TAG: &str = "chtag";
    pub const NAME: &str = "name";
    pub const SOURCE: &str = "source";
    pub const SERVICES: &str = "services";
    pub const SERVICES_COUNT: &str = "services_count";
    pub const COMMENT: &str = "comment";
    pub const LCN_OFFSET: &str = "lcn_off";

    /// Persisted-only key marking a shielded bouquet.
    pub const SHIELD: &str = "shield";

    const fn def(
        id: &'static str,
        caption: &'static str,
        kind: PropertyKind,
        opts: PropertyOpts,
    ) -> PropertyDef {
        PropertyDef {
            id,
            caption,
            kind,
            opts,
        }
    }

    pub const BOUQUET_PROPERTIES: &[PropertyDef] = &[
        def(ENABLED, "Enabled", PropertyKind::Bool, PropertyOpts::NONE),
        def(MAP_TO_CHANNELS, "Auto-Map to Channels", PropertyKind::Bool, PropertyOpts::NONE),
        def(MAP_NO_LCN, "Map Zero Numbers", PropertyKind::Bool, PropertyOpts::NONE),
        def(MAP_NO_NAME, "Map No Name", PropertyKind::Bool, PropertyOpts::NONE),
        def(CHANNEL_TAG, "Create Tag", PropertyKind::Bool, PropertyOpts::NONE),
        def(NAME, "Name", PropertyKind::Str, PropertyOpts::NONE),
        def(SOURCE, "Source", PropertyKind::Str, PropertyOpts::RDONLY),
        def(
            SERVICES,
            "Services",
            PropertyKind::StrList,
            PropertyOpts {
                rdonly: true,
                hidden: true,
                nosave: false,
            },
        ),
        def(
            SERVICES_COUNT,
            "# Services",
            PropertyKind::U32,
            PropertyOpts {
                rdonly: true,
                hidden: false,
                nosave: true,
            },
        ),
        def(COMMENT, "Comment", PropertyKind::Str, PropertyOpts::NONE),
        def(LCN_OFFSET, "Channel Number Offset", PropertyKind::U32, PropertyOpts::NONE),
    ];

    /// Find a property definition by id.
    pub fn lookup(id: &str) -> Option<&'static PropertyDef> {
        BOUQUET_PROPERTIES.iter().find(|p| p.id == id)
    }
}

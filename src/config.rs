//! Configuration document model.
//!
//! A configuration is a YAML document with an optional `general` section,
//! one designated layout section (default `LPGROUPS`) and any number of
//! free-form key/value sections that model code reads through the typed
//! getters on [`Config`].
//!
//! ```yaml
//! general:
//!   kernel_processes_per_pe: 16
//!   workers_per_pe: 1
//! LPGROUPS:
//!   MODELNET_GRP:
//!     repetitions: 16
//!     server: 1
//!     modelnet_simplenet: 1
//! PARAMS:
//!   packet_size: 512
//! ```
//!
//! Mapping order is preserved by `serde_yaml::Mapping`, and the layout is
//! built in exactly the order the groups and types are written.

use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::str::FromStr;

use crate::layout::types::REPETITIONS_KEY;
use crate::layout::{EntityType, Group, Layout};

/// Name of the section holding the layout when `general.layout_section` is unset
pub const DEFAULT_LAYOUT_SECTION: &str = "LPGROUPS";

/// Kernel processes per processing element when not configured
pub const DEFAULT_KERNEL_PROCESSES_PER_PE: u64 = 16;

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
    #[error("Invalid group '{group}': {reason}")]
    InvalidGroup { group: String, reason: String },
    #[error("Invalid value for '{key}' in section '{section}': {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },
    #[error("Configuration has no '{0}' section")]
    MissingSection(String),
    #[error("Malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings that shape the execution topology rather than the layout
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    /// Sub-schedulers per processing element
    #[serde(default = "default_kernel_processes")]
    pub kernel_processes_per_pe: u64,
    /// Physical workers per processing element that kernel processes map onto
    #[serde(default = "default_workers")]
    pub workers_per_pe: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Top-level section that holds the group declarations
    #[serde(default = "default_layout_section")]
    pub layout_section: String,
}

fn default_kernel_processes() -> u64 {
    DEFAULT_KERNEL_PROCESSES_PER_PE
}

fn default_workers() -> u64 {
    1
}

fn default_layout_section() -> String {
    DEFAULT_LAYOUT_SECTION.to_string()
}

impl GeneralConfig {
    /// The configured `log_level` as a filter, if one is set and parses
    pub fn log_filter(&self) -> Option<LevelFilter> {
        self.log_level
            .as_deref()
            .and_then(|level| LevelFilter::from_str(level).ok())
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            kernel_processes_per_pe: default_kernel_processes(),
            workers_per_pe: default_workers(),
            log_level: None,
            layout_section: default_layout_section(),
        }
    }
}

/// A loaded configuration: general settings, the layout, and every other section
#[derive(Debug, Clone)]
pub struct Config {
    pub general: GeneralConfig,
    pub layout: Layout,
    /// Remaining top-level sections in document order
    sections: Mapping,
}

impl Config {
    /// Parse a configuration from YAML text. Does not validate.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a configuration from an already-parsed YAML value. Does not validate.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Mapping(mut root) = value else {
            return Err(ValidationError::InvalidLayout(
                "configuration root must be a mapping of sections".to_string(),
            ));
        };

        let general = match root.shift_remove("general") {
            Some(Value::Null) | None => GeneralConfig::default(),
            Some(v) => serde_yaml::from_value(v)?,
        };

        let section_name = general.layout_section.clone();
        let section = root
            .shift_remove(section_name.as_str())
            .ok_or_else(|| ValidationError::MissingSection(section_name.clone()))?;
        let layout = parse_layout(&section_name, &section)?;

        Ok(Self {
            general,
            layout,
            sections: root,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.kernel_processes_per_pe == 0 {
            return Err(ValidationError::InvalidGeneral(
                "kernel_processes_per_pe must be at least 1".to_string(),
            ));
        }
        if self.general.workers_per_pe == 0 {
            return Err(ValidationError::InvalidGeneral(
                "workers_per_pe must be at least 1".to_string(),
            ));
        }
        if let Some(level) = &self.general.log_level {
            if LevelFilter::from_str(level).is_err() {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log_level '{}'",
                    level
                )));
            }
        }
        if self.general.layout_section.is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "layout_section cannot be empty".to_string(),
            ));
        }

        self.layout.validate()
    }

    /// Names of the free-form sections, in document order
    pub fn section_names(&self) -> Vec<String> {
        self.sections.keys().filter_map(scalar_to_string).collect()
    }

    /// Raw string value of `key` in `section`, if both exist and the value is a scalar
    pub fn get_value(&self, section: &str, key: &str) -> Option<String> {
        self.sections
            .get(section)?
            .as_mapping()?
            .get(key)
            .and_then(scalar_to_string)
    }

    /// Parse `key` in `section` as `T`. Missing keys are `Ok(None)`.
    pub fn get_parsed<T>(&self, section: &str, key: &str) -> Result<Option<T>, ValidationError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_value(section, key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ValidationError::InvalidValue {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("'{}': {}", raw, e),
                }),
        }
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, ValidationError> {
        self.get_parsed(section, key)
    }

    pub fn get_uint(&self, section: &str, key: &str) -> Result<Option<u64>, ValidationError> {
        self.get_parsed(section, key)
    }

    pub fn get_float(&self, section: &str, key: &str) -> Result<Option<f64>, ValidationError> {
        self.get_parsed(section, key)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, ValidationError> {
        self.get_parsed(section, key)
    }
}

/// Render a YAML scalar as the string the key/value model expects
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a non-negative integer count, accepting quoted numbers
fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Walk the designated section: every nested mapping is a group
fn parse_layout(section_name: &str, section: &Value) -> Result<Layout, ValidationError> {
    let entries = section.as_mapping().ok_or_else(|| {
        ValidationError::InvalidLayout(format!(
            "section '{}' must contain group subsections",
            section_name
        ))
    })?;

    let mut groups = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let name = scalar_to_string(key).ok_or_else(|| {
            ValidationError::InvalidLayout(format!(
                "non-scalar group name in section '{}'",
                section_name
            ))
        })?;

        match value {
            Value::Mapping(group_entries) => groups.push(parse_group(name, group_entries)?),
            _ => warn!(
                "Ignoring key '{}' in section '{}': only group subsections are read",
                name, section_name
            ),
        }
    }

    Ok(Layout::new(groups))
}

/// `repetitions` sets the repetition count; every other key declares a type
fn parse_group(name: String, entries: &Mapping) -> Result<Group, ValidationError> {
    let mut group = Group::new(name, 1);

    for (key, value) in entries {
        let key = scalar_to_string(key).ok_or_else(|| ValidationError::InvalidGroup {
            group: group.name.clone(),
            reason: "non-scalar key".to_string(),
        })?;

        let count = parse_count(value).ok_or_else(|| ValidationError::InvalidGroup {
            group: group.name.clone(),
            reason: format!("value of '{}' must be a non-negative integer", key),
        })?;

        if key == REPETITIONS_KEY {
            group.repetitions = count;
        } else {
            group.types.push(EntityType::new(key, count));
        }
    }

    Ok(group)
}

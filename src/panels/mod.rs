use log::info;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One customizable panel field. The JSON snapshot distinguishes an absent
/// key (inherit the built-in default), an explicit empty string (suppress the
/// element) and a stored override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CustomField {
    #[default]
    Inherit,
    Cleared,
    Value(String),
}

impl CustomField {
    pub fn is_inherit(&self) -> bool {
        matches!(self, CustomField::Inherit)
    }

    /// Written by the edit commands: a provided empty string clears, any
    /// other provided value overrides.
    pub fn from_input(value: &str) -> Self {
        if value.is_empty() {
            CustomField::Cleared
        } else {
            CustomField::Value(value.to_string())
        }
    }

    /// Resolves against the renderer default. `Cleared` suppresses the
    /// element entirely; overrides come back trimmed, and a blank override
    /// behaves like `Cleared`.
    pub fn resolve(&self, default: &str) -> Option<String> {
        match self {
            CustomField::Inherit => {
                if default.is_empty() {
                    None
                } else {
                    Some(default.to_string())
                }
            }
            CustomField::Cleared => None,
            CustomField::Value(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Customization view semantics: only a non-empty override displays,
    /// everything else falls back to the label.
    pub fn display_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            CustomField::Value(s) if !s.is_empty() => s,
            _ => fallback,
        }
    }
}

impl Serialize for CustomField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CustomField::Inherit => serializer.serialize_none(),
            CustomField::Cleared => serializer.serialize_str(""),
            CustomField::Value(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for CustomField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            Ok(CustomField::Cleared)
        } else {
            Ok(CustomField::Value(s))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    #[serde(default, skip_serializing_if = "CustomField::is_inherit")]
    pub title: CustomField,
    #[serde(default, skip_serializing_if = "CustomField::is_inherit")]
    pub description: CustomField,
    #[serde(default, skip_serializing_if = "CustomField::is_inherit")]
    pub image: CustomField,
    #[serde(default, skip_serializing_if = "CustomField::is_inherit")]
    pub thumbnail: CustomField,
    #[serde(default, skip_serializing_if = "CustomField::is_inherit")]
    pub footer: CustomField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl Customization {
    pub fn is_default(&self) -> bool {
        *self == Customization::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelKind {
    #[default]
    #[serde(rename = "select_menu")]
    SelectMenu,
    #[serde(rename = "buttons")]
    Buttons,
}

impl PanelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::SelectMenu => "select_menu",
            PanelKind::Buttons => "buttons",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomButton {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PanelKind,
    #[serde(default)]
    pub setores: Vec<Sector>,
    #[serde(rename = "customButtons", default)]
    pub custom_buttons: Vec<CustomButton>,
    #[serde(rename = "supportRoles", default)]
    pub support_roles: Vec<String>,
    /// Single-role field written by /setup. Kept alongside `supportRoles`
    /// because older snapshots only carry this one.
    #[serde(
        rename = "supportRoleId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub support_role_id: Option<String>,
    #[serde(
        rename = "categoryId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
    #[serde(
        rename = "logsChannelId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub logs_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Customization::is_default")]
    pub customization: Customization,
}

impl PanelConfig {
    pub fn new(name: &str, kind: PanelKind) -> Self {
        PanelConfig {
            name: name.to_string(),
            kind,
            ..PanelConfig::default()
        }
    }

    /// A panel counts as configured once /setup gave it a category and a
    /// support role.
    pub fn is_configured(&self) -> bool {
        self.category_id.is_some() && self.support_role_id.is_some()
    }

    /// Role list used for channel overwrites and staff pings: the
    /// `supportRoles` list, or the legacy single role when the list is empty.
    pub fn effective_support_roles(&self) -> Vec<String> {
        if !self.support_roles.is_empty() {
            return self.support_roles.clone();
        }
        self.support_role_id.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildConfig {
    #[serde(default)]
    pub panels: BTreeMap<String, PanelConfig>,
}

/// Owned configuration snapshot, loaded once at startup and passed by
/// reference into the command handlers. Every mutation is followed by an
/// explicit `save()` at the call site.
#[derive(Debug)]
pub struct PanelStore {
    path: PathBuf,
    pub guilds: BTreeMap<String, GuildConfig>,
}

impl PanelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PanelStore {
            path: path.into(),
            guilds: BTreeMap::new(),
        }
    }

    /// Missing file creates an empty snapshot on disk. A present but
    /// unreadable or unparsable file is a startup error. Guild entries
    /// written before the multi-panel layout are wrapped into a `default`
    /// panel in memory; the migrated shape reaches disk on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            let store = PanelStore::new(path);
            store.save()?;
            info!("created empty config snapshot at {}", store.path.display());
            return Ok(store);
        }
        let data = fs::read_to_string(&path)?;
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&data)?;
        let mut guilds = BTreeMap::new();
        for (guild_id, value) in raw {
            let value = migrate_guild_value(&guild_id, value);
            let parsed: GuildConfig = serde_json::from_value(value)?;
            guilds.insert(guild_id, parsed);
        }
        info!(
            "loaded config for {} guild(s) from {}",
            guilds.len(),
            path.display()
        );
        Ok(PanelStore { path, guilds })
    }

    /// Serializes the whole snapshot and overwrites the file in place.
    pub fn save(&self) -> Result<(), StoreError> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.guilds.serialize(&mut ser)?;
        fs::write(&self.path, buf)?;
        Ok(())
    }

    pub fn guild(&self, guild_id: &str) -> Option<&GuildConfig> {
        self.guilds.get(guild_id)
    }

    pub fn guild_mut(&mut self, guild_id: &str) -> &mut GuildConfig {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    pub fn panel(&self, guild_id: &str, panel_id: &str) -> Option<&PanelConfig> {
        self.guilds.get(guild_id)?.panels.get(panel_id)
    }

    pub fn panel_mut(&mut self, guild_id: &str, panel_id: &str) -> Option<&mut PanelConfig> {
        self.guilds.get_mut(guild_id)?.panels.get_mut(panel_id)
    }

    /// Returns false when the id is already taken in the guild.
    pub fn create_panel(&mut self, guild_id: &str, panel_id: &str, panel: PanelConfig) -> bool {
        let guild = self.guild_mut(guild_id);
        if guild.panels.contains_key(panel_id) {
            return false;
        }
        guild.panels.insert(panel_id.to_string(), panel);
        true
    }

    pub fn delete_panel(&mut self, guild_id: &str, panel_id: &str) -> Option<PanelConfig> {
        self.guilds.get_mut(guild_id)?.panels.remove(panel_id)
    }
}

fn migrate_guild_value(guild_id: &str, value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(ref map) if map.contains_key("panels") => value,
        serde_json::Value::Object(old) => {
            info!("migrating legacy guild config for {guild_id}");
            let mut panel = serde_json::Map::new();
            panel.insert(
                "name".to_string(),
                serde_json::Value::String("Painel Padrão".to_string()),
            );
            for (key, old_value) in old {
                panel.insert(key, old_value);
            }
            serde_json::json!({ "panels": { "default": panel } })
        }
        other => other,
    }
}

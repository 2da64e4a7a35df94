//! Inbound interaction payloads and the custom id router.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::channels::{ChannelData, MemberData, UserData};
use crate::tickets::TICKET_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionKind {
    Command,
    Component,
    ModalSubmit,
    Other,
}

impl From<u8> for InteractionKind {
    fn from(raw: u8) -> Self {
        match raw {
            2 => InteractionKind::Command,
            3 => InteractionKind::Component,
            5 => InteractionKind::ModalSubmit,
            _ => InteractionKind::Other,
        }
    }
}

/// One INTERACTION_CREATE payload. `member` is set inside guilds, `user`
/// in DMs, so actor lookups go through [`Interaction::actor`].
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel: Option<ChannelData>,
    #[serde(default)]
    pub member: Option<MemberData>,
    #[serde(default)]
    pub user: Option<UserData>,
    #[serde(default)]
    pub data: InteractionData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub components: Vec<ModalRow>,
    #[serde(default)]
    pub resolved: ResolvedData,
}

/// Entities the platform attaches for channel/role/user options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub channels: HashMap<String, ChannelData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModalRow {
    #[serde(default)]
    pub components: Vec<ModalField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModalField {
    pub custom_id: String,
    #[serde(default)]
    pub value: String,
}

impl Interaction {
    pub fn from_value(value: Value) -> Result<Interaction, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn actor(&self) -> Option<&UserData> {
        self.member
            .as_ref()
            .map(|member| &member.user)
            .or(self.user.as_ref())
    }

    pub fn channel_name(&self) -> &str {
        self.channel
            .as_ref()
            .map(|channel| channel.name.as_str())
            .unwrap_or("")
    }

    pub fn in_ticket_channel(&self) -> bool {
        self.channel_name().starts_with(TICKET_PREFIX)
    }

    pub fn command_name(&self) -> &str {
        self.data.name.as_deref().unwrap_or("")
    }

    pub fn custom_id(&self) -> &str {
        self.data.custom_id.as_deref().unwrap_or("")
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.data
            .options
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_str())
    }

    /// First selected value of a select menu interaction.
    pub fn first_value(&self) -> Option<&str> {
        self.data.values.first().map(String::as_str)
    }

    /// Display name of a channel option, from the payload's resolved data.
    pub fn resolved_channel_name(&self, channel_id: &str) -> Option<&str> {
        self.data
            .resolved
            .channels
            .get(channel_id)
            .map(|channel| channel.name.as_str())
    }

    pub fn modal_value(&self, custom_id: &str) -> Option<&str> {
        self.data
            .components
            .iter()
            .flat_map(|row| &row.components)
            .find(|field| field.custom_id == custom_id)
            .map(|field| field.value.as_str())
    }
}

/// Every component custom id the bot emits. Exact ids are matched before
/// prefixed ones so `ticket_add_user` is never read as an `add_user_` click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlId {
    CloseTicket,
    ClaimTicket,
    ArchiveTicket,
    Settings,
    NotifyUser,
    NotifyStaff,
    Unclaim,
    AddUserPicker,
    RemoveUserPicker,
    CreateTicket { panel_id: String, label: String },
    SelectSector { panel_id: String },
    ViewTranscript { channel_id: String },
    AddUser { user_id: String },
    RemoveUser { user_id: String },
}

impl ControlId {
    pub fn parse(custom_id: &str) -> Option<ControlId> {
        match custom_id {
            "fechar_ticket" => return Some(ControlId::CloseTicket),
            "reivindicar_ticket" => return Some(ControlId::ClaimTicket),
            "arquivar_ticket" => return Some(ControlId::ArchiveTicket),
            "ticket_settings" => return Some(ControlId::Settings),
            "ticket_notify_user" => return Some(ControlId::NotifyUser),
            "ticket_notify_staff" => return Some(ControlId::NotifyStaff),
            "ticket_unclaim" => return Some(ControlId::Unclaim),
            "ticket_add_user" => return Some(ControlId::AddUserPicker),
            "ticket_remove_user" => return Some(ControlId::RemoveUserPicker),
            _ => {}
        }
        if let Some(rest) = custom_id.strip_prefix("create_ticket:") {
            // labels may contain colons; panel ids cannot
            let (panel_id, label) = rest.split_once(':')?;
            return Some(ControlId::CreateTicket {
                panel_id: panel_id.to_string(),
                label: label.to_string(),
            });
        }
        if let Some(panel_id) = custom_id.strip_prefix("select_setor:") {
            return Some(ControlId::SelectSector {
                panel_id: panel_id.to_string(),
            });
        }
        if let Some(channel_id) = custom_id.strip_prefix("view_transcript:") {
            return Some(ControlId::ViewTranscript {
                channel_id: channel_id.to_string(),
            });
        }
        if let Some(user_id) = custom_id.strip_prefix("add_user_") {
            return Some(ControlId::AddUser {
                user_id: user_id.to_string(),
            });
        }
        if let Some(user_id) = custom_id.strip_prefix("remove_user_") {
            return Some(ControlId::RemoveUser {
                user_id: user_id.to_string(),
            });
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalId {
    NotifyUser,
}

impl ModalId {
    pub fn parse(custom_id: &str) -> Option<ModalId> {
        match custom_id {
            "modal_notify_user" => Some(ModalId::NotifyUser),
            _ => None,
        }
    }
}

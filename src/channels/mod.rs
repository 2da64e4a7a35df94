pub mod discord;
pub mod gateway;

pub use discord::DiscordProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::utils::EmojiSpec;

pub const VIEW_CHANNEL: u64 = 1 << 10;
pub const SEND_MESSAGES: u64 = 1 << 11;
pub const READ_MESSAGE_HISTORY: u64 = 1 << 16;
pub const MANAGE_CHANNELS: u64 = 1 << 4;
pub const ADMINISTRATOR: u64 = 1 << 3;

pub const EPHEMERAL: u32 = 64;

/// Permission bits travel as decimal strings on the wire.
mod perm_bits {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bits: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bits.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub id: String,
    /// 0 targets a role, 1 a member.
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(with = "perm_bits", default)]
    pub allow: u64,
    #[serde(with = "perm_bits", default)]
    pub deny: u64,
}

impl PermissionOverwrite {
    pub fn role(id: impl Into<String>, allow: u64, deny: u64) -> Self {
        PermissionOverwrite {
            id: id.into(),
            kind: 0,
            allow,
            deny,
        }
    }

    pub fn member(id: impl Into<String>, allow: u64, deny: u64) -> Self {
        PermissionOverwrite {
            id: id.into(),
            kind: 1,
            allow,
            deny,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Embed::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: name.into(),
            icon_url,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(EmbedMedia { url: url.into() });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(EmbedMedia { url: url.into() });
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn timestamp(mut self, iso: impl Into<String>) -> Self {
        self.timestamp = Some(iso.into());
        self
    }

    pub fn timestamp_now(self) -> Self {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        self.timestamp(now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
    Link = 5,
}

impl ButtonStyle {
    /// Style names as stored in the config snapshot. Unknown names fall back
    /// to Primary.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Secondary" => ButtonStyle::Secondary,
            "Success" => ButtonStyle::Success,
            "Danger" => ButtonStyle::Danger,
            "Link" => ButtonStyle::Link,
            _ => ButtonStyle::Primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Component {
    ActionRow(ActionRow),
    Button(Button),
    SelectMenu(SelectMenu),
    TextInput(TextInput),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn new(components: Vec<Component>) -> Component {
        Component::ActionRow(ActionRow {
            kind: 1,
            components,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    kind: u8,
    pub style: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<PartialEmoji>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Button {
    pub fn new(style: ButtonStyle, custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Button {
            kind: 2,
            style: style as u8,
            label: Some(label.into()),
            emoji: None,
            custom_id: Some(custom_id.into()),
            url: None,
        }
    }

    pub fn link(url: impl Into<String>, label: impl Into<String>) -> Self {
        Button {
            kind: 2,
            style: ButtonStyle::Link as u8,
            label: Some(label.into()),
            emoji: None,
            custom_id: None,
            url: Some(url.into()),
        }
    }

    pub fn emoji_only(style: ButtonStyle, custom_id: impl Into<String>, emoji: PartialEmoji) -> Self {
        Button {
            kind: 2,
            style: style as u8,
            label: None,
            emoji: Some(emoji),
            custom_id: Some(custom_id.into()),
            url: None,
        }
    }

    pub fn emoji(mut self, emoji: PartialEmoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    pub fn into_component(self) -> Component {
        Component::Button(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectMenu {
    #[serde(rename = "type")]
    kind: u8,
    pub custom_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub options: Vec<SelectOption>,
}

impl SelectMenu {
    pub fn new(custom_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        SelectMenu {
            kind: 3,
            custom_id: custom_id.into(),
            placeholder: Some(placeholder.into()),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn into_component(self) -> Component {
        Component::SelectMenu(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<PartialEmoji>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInput {
    #[serde(rename = "type")]
    kind: u8,
    pub custom_id: String,
    pub label: String,
    /// 1 short, 2 paragraph.
    pub style: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
}

impl TextInput {
    pub fn paragraph(
        custom_id: impl Into<String>,
        label: impl Into<String>,
        placeholder: impl Into<String>,
        max_length: u16,
    ) -> Self {
        TextInput {
            kind: 4,
            custom_id: custom_id.into(),
            label: label.into(),
            style: 2,
            placeholder: Some(placeholder.into()),
            required: true,
            max_length: Some(max_length),
        }
    }

    pub fn into_component(self) -> Component {
        Component::TextInput(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialEmoji {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub animated: bool,
}

impl From<EmojiSpec> for PartialEmoji {
    fn from(spec: EmojiSpec) -> Self {
        match spec {
            EmojiSpec::Unicode(name) => PartialEmoji {
                id: None,
                name,
                animated: false,
            },
            EmojiSpec::Custom { id, name, animated } => PartialEmoji {
                id: Some(id),
                name,
                animated,
            },
        }
    }
}

/// Message body for sends and edits. `None` embeds/components leave the
/// target untouched on edits, `Some(vec![])` clears them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        OutboundMessage {
            content: Some(content.into()),
            ..OutboundMessage::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        OutboundMessage {
            embeds: Some(vec![embed]),
            ..OutboundMessage::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }

    pub fn with_components(mut self, rows: Vec<Component>) -> Self {
        self.components = Some(rows);
        self
    }

    pub fn clear_embeds(mut self) -> Self {
        self.embeds = Some(Vec::new());
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components = Some(Vec::new());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseMessage {
    #[serde(flatten)]
    pub message: OutboundMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

impl ResponseMessage {
    pub fn ephemeral(message: OutboundMessage) -> Self {
        ResponseMessage {
            message,
            flags: Some(EPHEMERAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalData {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Message(ResponseMessage),
    Modal(ModalData),
}

/// Interaction callback: type 4 replies, 5 defers, 7 updates the source
/// message, 9 opens a modal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn reply(message: OutboundMessage) -> Self {
        InteractionResponse {
            kind: 4,
            data: Some(ResponseData::Message(ResponseMessage {
                message,
                flags: None,
            })),
        }
    }

    pub fn ephemeral(message: OutboundMessage) -> Self {
        InteractionResponse {
            kind: 4,
            data: Some(ResponseData::Message(ResponseMessage {
                message,
                flags: Some(EPHEMERAL),
            })),
        }
    }

    pub fn deferred() -> Self {
        InteractionResponse { kind: 5, data: None }
    }

    pub fn deferred_ephemeral() -> Self {
        InteractionResponse {
            kind: 5,
            data: Some(ResponseData::Message(ResponseMessage {
                message: OutboundMessage::default(),
                flags: Some(EPHEMERAL),
            })),
        }
    }

    pub fn update(message: OutboundMessage) -> Self {
        InteractionResponse {
            kind: 7,
            data: Some(ResponseData::Message(ResponseMessage {
                message,
                flags: None,
            })),
        }
    }

    pub fn modal(custom_id: impl Into<String>, title: impl Into<String>, rows: Vec<Component>) -> Self {
        InteractionResponse {
            kind: 9,
            data: Some(ResponseData::Modal(ModalData {
                custom_id: custom_id.into(),
                title: title.into(),
                components: rows,
            })),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub bot: bool,
}

impl UserData {
    /// `name#1234` for legacy accounts, plain username for migrated ones.
    pub fn tag(&self) -> String {
        if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberData {
    pub user: UserData,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Computed channel permissions, only present on interaction payloads.
    #[serde(default)]
    pub permissions: String,
}

impl MemberData {
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|id| id == role_id)
    }

    pub fn has_permission(&self, bit: u64) -> bool {
        self.permissions
            .parse::<u64>()
            .map(|mask| mask & bit != 0)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleData {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildData {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentData {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedFieldData {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedFooterData {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub fields: Vec<EmbedFieldData>,
    #[serde(default)]
    pub footer: Option<EmbedFooterData>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Rebuilds an outbound embed from a fetched one, for edits that rewrite a
/// single field and resend the rest untouched.
impl From<&EmbedData> for Embed {
    fn from(data: &EmbedData) -> Self {
        Embed {
            title: data.title.clone(),
            description: data.description.clone(),
            color: data.color,
            author: None,
            footer: data
                .footer
                .as_ref()
                .map(|f| EmbedFooter { text: f.text.clone() }),
            image: None,
            thumbnail: None,
            fields: data
                .fields
                .iter()
                .map(|f| EmbedField {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
            timestamp: data.timestamp.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub author: UserData,
    #[serde(default)]
    pub attachments: Vec<AttachmentData>,
    #[serde(default)]
    pub embeds: Vec<EmbedData>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<u64> },
    #[error("api error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Everything the bot consumes from the platform. One REST implementation;
/// tests substitute an in-memory fake.
#[async_trait::async_trait]
pub trait ChannelProvider: Send + Sync {
    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ChannelError>;

    async fn edit_original_response(
        &self,
        token: &str,
        message: &OutboundMessage,
    ) -> Result<(), ChannelError>;

    /// Same PATCH carrying a file attachment alongside the payload.
    async fn edit_original_response_with_file(
        &self,
        token: &str,
        message: &OutboundMessage,
        file_name: &str,
        file_contents: &[u8],
    ) -> Result<(), ChannelError>;

    async fn create_followup(
        &self,
        token: &str,
        message: &ResponseMessage,
    ) -> Result<(), ChannelError>;

    async fn create_guild_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: Option<&str>,
        overwrites: &[PermissionOverwrite],
    ) -> Result<ChannelData, ChannelError>;

    async fn get_channel(&self, channel_id: &str) -> Result<ChannelData, ChannelError>;

    async fn get_guild_channels(&self, guild_id: &str) -> Result<Vec<ChannelData>, ChannelError>;

    async fn delete_channel(&self, channel_id: &str) -> Result<(), ChannelError>;

    async fn get_guild(&self, guild_id: &str) -> Result<GuildData, ChannelError>;

    async fn get_guild_roles(&self, guild_id: &str) -> Result<Vec<RoleData>, ChannelError>;

    async fn list_guild_members(
        &self,
        guild_id: &str,
        limit: u8,
    ) -> Result<Vec<MemberData>, ChannelError>;

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<MessageData, ChannelError>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), ChannelError>;

    async fn get_channel_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<MessageData>, ChannelError>;

    async fn get_channel_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<MessageData, ChannelError>;

    async fn edit_channel_permission(
        &self,
        channel_id: &str,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), ChannelError>;

    async fn delete_channel_permission(
        &self,
        channel_id: &str,
        overwrite_id: &str,
    ) -> Result<(), ChannelError>;

    async fn create_dm_channel(&self, user_id: &str) -> Result<ChannelData, ChannelError>;

    async fn get_user(&self, user_id: &str) -> Result<UserData, ChannelError>;

    async fn get_current_user(&self) -> Result<UserData, ChannelError>;

    async fn register_commands(&self, commands: &serde_json::Value) -> Result<(), ChannelError>;

    async fn send_dm(
        &self,
        user_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), ChannelError> {
        let dm = self.create_dm_channel(user_id).await?;
        self.send_message(&dm.id, message).await?;
        Ok(())
    }
}

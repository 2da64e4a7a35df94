use crate::channels::{
    ChannelData, ChannelError, ChannelProvider, GuildData, InteractionResponse, MemberData,
    MessageData, OutboundMessage, PermissionOverwrite, ResponseMessage, RoleData, UserData,
};
use reqwest::Method;
use serde::Serialize;

pub struct DiscordProvider {
    client: reqwest::Client,
    base_url: String,
    token: String,
    application_id: String,
}

impl DiscordProvider {
    pub fn new(token: &str, application_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://discord.com/api/v10".to_string(),
            token: token.to_string(),
            application_id: application_id.to_string(),
        }
    }

    /// Points the provider at a different API root. Used by tests running
    /// against a local mock server.
    pub fn with_base_url(token: &str, application_id: &str, base_url: &str) -> Self {
        let mut provider = Self::new(token, application_id);
        provider.base_url = base_url.to_string();
        provider
    }

    fn api(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bot {}", self.token))
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ChannelError> {
        let response = request
            .send()
            .await
            .map_err(|e| ChannelError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(ChannelError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChannelError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ChannelError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ChannelError::NetworkError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ChannelProvider for DiscordProvider {
    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ChannelError> {
        let request = self
            .api(
                Method::POST,
                &format!("/interactions/{}/{}/callback", interaction_id, token),
            )
            .json(response);
        self.execute(request).await?;
        Ok(())
    }

    async fn edit_original_response(
        &self,
        token: &str,
        message: &OutboundMessage,
    ) -> Result<(), ChannelError> {
        let request = self
            .api(
                Method::PATCH,
                &format!(
                    "/webhooks/{}/{}/messages/@original",
                    self.application_id, token
                ),
            )
            .json(message);
        self.execute(request).await?;
        Ok(())
    }

    async fn edit_original_response_with_file(
        &self,
        token: &str,
        message: &OutboundMessage,
        file_name: &str,
        file_contents: &[u8],
    ) -> Result<(), ChannelError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| ChannelError::NetworkError(e.to_string()))?;
        let part = reqwest::multipart::Part::bytes(file_contents.to_vec())
            .file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("payload_json", payload)
            .part("files[0]", part);
        let request = self
            .api(
                Method::PATCH,
                &format!(
                    "/webhooks/{}/{}/messages/@original",
                    self.application_id, token
                ),
            )
            .multipart(form);
        self.execute(request).await?;
        Ok(())
    }

    async fn create_followup(
        &self,
        token: &str,
        message: &ResponseMessage,
    ) -> Result<(), ChannelError> {
        let request = self
            .api(
                Method::POST,
                &format!("/webhooks/{}/{}", self.application_id, token),
            )
            .json(message);
        self.execute(request).await?;
        Ok(())
    }

    async fn create_guild_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: Option<&str>,
        overwrites: &[PermissionOverwrite],
    ) -> Result<ChannelData, ChannelError> {
        let body = CreateGuildChannel {
            name: name.to_string(),
            kind: 0,
            parent_id: parent_id.map(str::to_string),
            permission_overwrites: overwrites.to_vec(),
        };
        let request = self
            .api(Method::POST, &format!("/guilds/{}/channels", guild_id))
            .json(&body);
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_channel(&self, channel_id: &str) -> Result<ChannelData, ChannelError> {
        let request = self.api(Method::GET, &format!("/channels/{}", channel_id));
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_guild_channels(&self, guild_id: &str) -> Result<Vec<ChannelData>, ChannelError> {
        let request = self.api(Method::GET, &format!("/guilds/{}/channels", guild_id));
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), ChannelError> {
        let request = self.api(Method::DELETE, &format!("/channels/{}", channel_id));
        self.execute(request).await?;
        Ok(())
    }

    async fn get_guild(&self, guild_id: &str) -> Result<GuildData, ChannelError> {
        let request = self.api(Method::GET, &format!("/guilds/{}", guild_id));
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_guild_roles(&self, guild_id: &str) -> Result<Vec<RoleData>, ChannelError> {
        let request = self.api(Method::GET, &format!("/guilds/{}/roles", guild_id));
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn list_guild_members(
        &self,
        guild_id: &str,
        limit: u8,
    ) -> Result<Vec<MemberData>, ChannelError> {
        let request = self.api(
            Method::GET,
            &format!("/guilds/{}/members?limit={}", guild_id, limit),
        );
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<MessageData, ChannelError> {
        let request = self
            .api(Method::POST, &format!("/channels/{}/messages", channel_id))
            .json(message);
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), ChannelError> {
        let request = self
            .api(
                Method::PATCH,
                &format!("/channels/{}/messages/{}", channel_id, message_id),
            )
            .json(message);
        self.execute(request).await?;
        Ok(())
    }

    async fn get_channel_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<MessageData>, ChannelError> {
        let mut path = format!("/channels/{}/messages?limit={}", channel_id, limit);
        if let Some(before) = before {
            path.push_str(&format!("&before={}", before));
        }
        let request = self.api(Method::GET, &path);
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_channel_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<MessageData, ChannelError> {
        let request = self.api(
            Method::GET,
            &format!("/channels/{}/messages/{}", channel_id, message_id),
        );
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn edit_channel_permission(
        &self,
        channel_id: &str,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), ChannelError> {
        let request = self
            .api(
                Method::PUT,
                &format!("/channels/{}/permissions/{}", channel_id, overwrite.id),
            )
            .json(overwrite);
        self.execute(request).await?;
        Ok(())
    }

    async fn delete_channel_permission(
        &self,
        channel_id: &str,
        overwrite_id: &str,
    ) -> Result<(), ChannelError> {
        let request = self.api(
            Method::DELETE,
            &format!("/channels/{}/permissions/{}", channel_id, overwrite_id),
        );
        self.execute(request).await?;
        Ok(())
    }

    async fn create_dm_channel(&self, user_id: &str) -> Result<ChannelData, ChannelError> {
        let body = CreateDMChannel {
            recipient_id: user_id.to_string(),
        };
        let request = self.api(Method::POST, "/users/@me/channels").json(&body);
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_user(&self, user_id: &str) -> Result<UserData, ChannelError> {
        let request = self.api(Method::GET, &format!("/users/{}", user_id));
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_current_user(&self) -> Result<UserData, ChannelError> {
        let request = self.api(Method::GET, "/users/@me");
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn register_commands(&self, commands: &serde_json::Value) -> Result<(), ChannelError> {
        let request = self
            .api(
                Method::PUT,
                &format!("/applications/{}/commands", self.application_id),
            )
            .json(commands);
        self.execute(request).await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreateGuildChannel {
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    permission_overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Serialize)]
struct CreateDMChannel {
    recipient_id: String,
}

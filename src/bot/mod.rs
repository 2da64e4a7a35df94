//! Event dispatch and the ticket lifecycle.
//!
//! A single task owns [`TicketBot`] and feeds it gateway events in order;
//! every registry and the panel store are plain fields, no locking.

pub mod commands;
pub mod error;
pub mod events;

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::time::{sleep, Duration};

use crate::bot::error::BotError;
use crate::bot::events::{ControlId, Interaction, InteractionKind, ModalId};
use crate::channels::{
    ChannelError, ChannelProvider, Embed, EmbedData, InteractionResponse, MessageData,
    OutboundMessage, PermissionOverwrite, ResponseMessage, UserData, ADMINISTRATOR,
    MANAGE_CHANNELS, READ_MESSAGE_HISTORY, SEND_MESSAGES, VIEW_CHANNEL,
};
use crate::panels::{PanelConfig, PanelStore};
use crate::shared::state::StatusState;
use crate::shared::utils::sanitize_username;
use crate::tickets::ui::{self, PickerAction};
use crate::tickets::{
    transcript, SelectionContext, TicketMetadata, TicketRegistry, TranscriptCache, TICKET_PREFIX,
};

const GENERIC_ERROR: &str = "❌ Erro ao processar a interação!";
const TICKET_CHANNEL_ONLY: &str = "❌ Este comando só pode ser usado em canais de ticket!";
const PANEL_NOT_CONFIGURED: &str = "❌ Este painel não está configurado corretamente! Peça a um administrador para usar `/selecionar_painel` e `/setup`.";
const SUPPORT_ONLY_CLAIM: &str =
    "❌ Apenas membros da equipe de suporte podem reivindicar tickets!";
const SUPPORT_ONLY_SETTINGS: &str =
    "❌ Apenas membros da equipe de suporte podem acessar as configurações do ticket!";
const CONTROL_NOT_FOUND: &str =
    "❌ Não foi possível encontrar a mensagem de controle do ticket!";
const CLAIM_EDIT_FAILED: &str =
    "❌ Não foi possível atualizar o ticket. A mensagem de controle pode ter sido deletada.";
const UNCLAIM_EDIT_FAILED: &str =
    "❌ Erro ao atualizar o ticket. A mensagem de controle pode ter sido deletada.";
const SETTINGS_NO_CONTEXT: &str =
    "❌ Não foi possível recuperar as informações deste ticket! (Bot pode ter sido reiniciado)";
const NOTIFY_NO_CONTEXT: &str = "❌ Não foi possível recuperar as informações deste ticket!";
const PANEL_CONFIG_MISSING: &str = "❌ Configuração do painel não encontrada!";
const MEMBER_FETCH_FAILED: &str = "❌ Erro ao buscar membros do servidor!";
const DM_FAILED: &str =
    "❌ Não foi possível enviar a mensagem. O usuário pode ter DMs desativadas.";
const TRANSCRIPT_MISS: &str =
    "❌ Transcrição não disponível. O ticket pode ter sido fechado há muito tempo.";
const TRANSCRIPT_UPLOAD_FAILED: &str =
    "❌ Erro ao enviar transcrição. Por favor, contate um administrador.";

pub struct TicketBot {
    pub(crate) provider: Arc<dyn ChannelProvider>,
    pub(crate) store: PanelStore,
    pub(crate) selections: SelectionContext,
    pub(crate) registry: TicketRegistry,
    pub(crate) transcripts: TranscriptCache,
    pub(crate) status: Arc<StatusState>,
}

impl TicketBot {
    pub fn new(
        provider: Arc<dyn ChannelProvider>,
        store: PanelStore,
        status: Arc<StatusState>,
    ) -> Self {
        Self {
            provider,
            store,
            selections: SelectionContext::default(),
            registry: TicketRegistry::default(),
            transcripts: TranscriptCache::default(),
            status,
        }
    }

    /// Entry point for every gateway dispatch event.
    pub async fn handle_event(&mut self, name: &str, payload: Value) {
        match name {
            "READY" => self.on_ready(&payload),
            "GUILD_CREATE" => {
                if let Some(guild_id) = payload["id"].as_str() {
                    self.status.add_guild(guild_id);
                    debug!("guild {} available", guild_id);
                }
            }
            "GUILD_DELETE" => {
                if let Some(guild_id) = payload["id"].as_str() {
                    self.status.remove_guild(guild_id);
                    info!("removed from guild {}", guild_id);
                }
            }
            "INTERACTION_CREATE" => self.on_interaction(payload).await,
            other => debug!("ignoring gateway event {}", other),
        }
    }

    fn on_ready(&self, payload: &Value) {
        if let Ok(user) = serde_json::from_value::<UserData>(payload["user"].clone()) {
            let tag = user.tag();
            self.status.set_identity(&user.id, &tag);
            info!("logged in as {}", tag);
        }
        if let Some(guilds) = payload["guilds"].as_array() {
            for guild in guilds {
                if let Some(guild_id) = guild["id"].as_str() {
                    self.status.add_guild(guild_id);
                }
            }
            info!("serving {} guilds", self.status.guild_count());
        }
    }

    async fn on_interaction(&mut self, payload: Value) {
        let interaction = match Interaction::from_value(payload) {
            Ok(interaction) => interaction,
            Err(err) => {
                warn!("discarding malformed interaction: {}", err);
                return;
            }
        };
        let outcome = match interaction.kind {
            InteractionKind::Command => {
                commands::handle(self, &interaction).await.map(Some)
            }
            InteractionKind::Component => self.handle_component(&interaction).await,
            InteractionKind::ModalSubmit => self.handle_modal(&interaction).await,
            InteractionKind::Other => return,
        };
        match outcome {
            Ok(Some(response)) => {
                if let Err(err) = self
                    .provider
                    .create_interaction_response(&interaction.id, &interaction.token, &response)
                    .await
                {
                    error!("failed to respond to interaction {}: {}", interaction.id, err);
                }
            }
            Ok(None) => {}
            Err(err) => self.reject(&interaction, err).await,
        }
    }

    /// Turns a handler error into the ephemeral reply the member sees.
    async fn reject(&self, interaction: &Interaction, err: BotError) {
        if err.is_internal() {
            error!("interaction {} failed: {}", interaction.id, err);
        }
        let response = InteractionResponse::ephemeral(OutboundMessage::text(err.user_message()));
        if let Err(send_err) = self
            .provider
            .create_interaction_response(&interaction.id, &interaction.token, &response)
            .await
        {
            error!("failed to deliver error reply: {}", send_err);
        }
    }

    async fn handle_component(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        let Some(control) = ControlId::parse(interaction.custom_id()) else {
            debug!("ignoring component {}", interaction.custom_id());
            return Ok(None);
        };
        match control {
            ControlId::CreateTicket { panel_id, label } => {
                self.open_ticket(interaction, &panel_id, &label, false).await
            }
            ControlId::SelectSector { panel_id } => {
                let reason = interaction
                    .first_value()
                    .ok_or_else(|| BotError::Validation(GENERIC_ERROR.to_string()))?
                    .to_string();
                self.open_ticket(interaction, &panel_id, &reason, true).await
            }
            ControlId::ClaimTicket => self.claim(interaction).await,
            ControlId::Unclaim => self.unclaim(interaction).await,
            ControlId::ArchiveTicket => self.archive(interaction).await,
            ControlId::CloseTicket => self.close(interaction).await,
            ControlId::Settings => self.settings(interaction).map(Some),
            ControlId::NotifyUser => Ok(Some(ui::notify_user_modal())),
            ControlId::NotifyStaff => self.notify_staff(interaction).await,
            ControlId::AddUserPicker => self
                .member_picker(interaction, PickerAction::Add)
                .await
                .map(Some),
            ControlId::RemoveUserPicker => self
                .member_picker(interaction, PickerAction::Remove)
                .await
                .map(Some),
            ControlId::AddUser { user_id } => self
                .picker_overwrite(interaction, &user_id, PickerAction::Add)
                .await
                .map(Some),
            ControlId::RemoveUser { user_id } => self
                .picker_overwrite(interaction, &user_id, PickerAction::Remove)
                .await
                .map(Some),
            ControlId::ViewTranscript { channel_id } => {
                self.view_transcript(interaction, &channel_id).await
            }
        }
    }

    async fn handle_modal(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        match ModalId::parse(interaction.custom_id()) {
            Some(ModalId::NotifyUser) => self.notify_user_submit(interaction).await.map(Some),
            None => {
                debug!("ignoring modal {}", interaction.custom_id());
                Ok(None)
            }
        }
    }

    /// Opens a ticket channel. `from_select` distinguishes the dropdown path
    /// from the custom-button path; they differ in preconditions and in the
    /// control message footer.
    async fn open_ticket(
        &mut self,
        interaction: &Interaction,
        panel_id: &str,
        reason: &str,
        from_select: bool,
    ) -> Result<Option<InteractionResponse>, BotError> {
        let guild_id = guild_of(interaction)?.to_string();
        let user = actor_of(interaction)?.clone();
        let panel = match self.store.panel(&guild_id, panel_id) {
            Some(panel) if from_select && panel.is_configured() => panel.clone(),
            Some(panel) if !from_select && panel.category_id.is_some() => panel.clone(),
            _ => return Err(BotError::Validation(PANEL_NOT_CONFIGURED.to_string())),
        };

        let channel_name = format!("{}{}", TICKET_PREFIX, sanitize_username(&user.username));
        let channels = self.provider.get_guild_channels(&guild_id).await?;
        if let Some(existing) = channels
            .iter()
            .find(|channel| channel.name == channel_name && channel.kind == 0)
        {
            return Err(BotError::Validation(format!(
                "❌ Você já tem um ticket aberto: <#{}>",
                existing.id
            )));
        }

        self.provider
            .create_interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::deferred_ephemeral(),
            )
            .await?;

        if let Err(err) = self
            .create_ticket(interaction, &guild_id, panel_id, &panel, reason, from_select, &user)
            .await
        {
            error!("failed to create ticket for {}: {}", user.tag(), err);
            let followup = ResponseMessage::ephemeral(OutboundMessage::text(format!(
                "❌ Erro ao criar o ticket: {}",
                err
            )));
            if let Err(send_err) = self.provider.create_followup(&interaction.token, &followup).await
            {
                error!("failed to deliver ticket error followup: {}", send_err);
            }
        }
        Ok(None)
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_ticket(
        &mut self,
        interaction: &Interaction,
        guild_id: &str,
        panel_id: &str,
        panel: &PanelConfig,
        reason: &str,
        from_select: bool,
        user: &UserData,
    ) -> Result<(), ChannelError> {
        let bot_id = self.bot_user_id().await?;
        let mut overwrites = vec![
            PermissionOverwrite::role(guild_id, 0, VIEW_CHANNEL),
            PermissionOverwrite::member(
                &user.id,
                VIEW_CHANNEL | SEND_MESSAGES | READ_MESSAGE_HISTORY,
                0,
            ),
            PermissionOverwrite::member(&bot_id, VIEW_CHANNEL | SEND_MESSAGES | MANAGE_CHANNELS, 0),
        ];
        let support_roles = panel.effective_support_roles();
        for role_id in &support_roles {
            overwrites.push(PermissionOverwrite::role(
                role_id,
                VIEW_CHANNEL | SEND_MESSAGES | READ_MESSAGE_HISTORY,
                0,
            ));
        }

        let channel_name = format!("{}{}", TICKET_PREFIX, sanitize_username(&user.username));
        let channel = self
            .provider
            .create_guild_channel(guild_id, &channel_name, panel.category_id.as_deref(), &overwrites)
            .await?;

        self.registry.insert(TicketMetadata {
            guild_id: guild_id.to_string(),
            panel_id: panel_id.to_string(),
            user_id: user.id.clone(),
            channel_id: channel.id.clone(),
            reason: reason.to_string(),
            control_message_id: None,
        });

        let mentions = ui::role_mentions(&support_roles);
        let footer = if from_select {
            ui::CONTROL_FOOTER_SELECT
        } else {
            ui::CONTROL_FOOTER_BUTTONS
        };
        let control = ui::control_message(&user.id, reason, &mentions, footer);
        let posted = self.provider.send_message(&channel.id, &control).await?;
        self.registry.set_control_message(&channel.id, &posted.id);

        self.provider
            .edit_original_response(&interaction.token, &ui::creation_reply(guild_id, &channel.id))
            .await?;

        let origin = if from_select { "sector" } else { "button" };
        info!(
            "ticket {} created by {} (panel {}, {} {})",
            channel_name,
            user.tag(),
            panel.name,
            origin,
            reason
        );

        if let Some(logs_channel) = panel.logs_channel_id.as_deref() {
            let label = if from_select { "Setor" } else { "Categoria" };
            let embed = ui::open_log(
                &user.id,
                &user.tag(),
                &panel.name,
                label,
                reason,
                &channel.id,
                Utc::now().timestamp(),
            );
            if let Err(err) = self
                .provider
                .send_message(logs_channel, &OutboundMessage::embed(embed))
                .await
            {
                error!("failed to send ticket-open log: {}", err);
            }
        }
        Ok(())
    }

    async fn claim(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        if !interaction.in_ticket_channel() {
            return Err(BotError::Validation(TICKET_CHANNEL_ONLY.to_string()));
        }
        let channel_id = channel_of(interaction)?.to_string();
        let guild_id = guild_of(interaction)?;
        let user = actor_of(interaction)?.clone();
        let member = interaction
            .member
            .as_ref()
            .ok_or_else(|| BotError::Validation(GENERIC_ERROR.to_string()))?;

        // support membership is checked across every panel in the guild, so a
        // claim still works when the ticket's metadata was lost to a restart
        let is_support = self
            .store
            .guild(guild_id)
            .map(|guild| {
                guild.panels.values().any(|panel| {
                    panel.support_roles.iter().any(|role| member.has_role(role))
                })
            })
            .unwrap_or(false);
        if !is_support {
            return Err(BotError::Validation(SUPPORT_ONLY_CLAIM.to_string()));
        }

        let message = match self.find_control_message(&channel_id).await {
            Ok(Some(message)) => message,
            Ok(None) => return Err(BotError::Validation(CONTROL_NOT_FOUND.to_string())),
            Err(err) => {
                error!("failed to fetch ticket control message: {}", err);
                return Err(BotError::Validation(CLAIM_EDIT_FAILED.to_string()));
            }
        };
        let Some(source) = message.embeds.first() else {
            return Err(BotError::Validation(CLAIM_EDIT_FAILED.to_string()));
        };
        let updated = staff_update(source, &format!("<@{}>", user.id));
        if let Err(err) = self
            .provider
            .edit_message(&channel_id, &message.id, &OutboundMessage::embed(updated))
            .await
        {
            error!("failed to update ticket control message: {}", err);
            return Err(BotError::Validation(CLAIM_EDIT_FAILED.to_string()));
        }

        self.registry.claim(&channel_id, &user.tag());
        info!("ticket {} claimed by {}", interaction.channel_name(), user.tag());
        Ok(Some(InteractionResponse::reply(OutboundMessage::embed(
            ui::claim_notice(&user.id),
        ))))
    }

    async fn unclaim(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        self.provider
            .create_interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::deferred_ephemeral(),
            )
            .await?;
        let content = self.unclaim_outcome(interaction).await;
        self.edit_deferred(&interaction.token, &content).await;
        Ok(None)
    }

    async fn unclaim_outcome(&mut self, interaction: &Interaction) -> String {
        if !interaction.in_ticket_channel() {
            return TICKET_CHANNEL_ONLY.to_string();
        }
        let (Some(channel_id), Some(user)) =
            (interaction.channel_id.clone(), interaction.actor().cloned())
        else {
            return GENERIC_ERROR.to_string();
        };
        let Some(claimant) = self.registry.claimant(&channel_id).map(str::to_string) else {
            return "❌ Este ticket não foi reivindicado por ninguém!".to_string();
        };
        if claimant != user.tag() {
            return format!(
                "❌ Você não pode desistir deste ticket! Ele foi reivindicado por **{}**.",
                claimant
            );
        }

        let message = match self.find_control_message(&channel_id).await {
            Ok(Some(message)) => message,
            Ok(None) => return CONTROL_NOT_FOUND.to_string(),
            Err(err) => {
                error!("failed to fetch ticket control message: {}", err);
                return UNCLAIM_EDIT_FAILED.to_string();
            }
        };
        let Some(source) = message.embeds.first() else {
            return UNCLAIM_EDIT_FAILED.to_string();
        };
        let updated = staff_update(source, ui::UNCLAIMED_STAFF);
        if let Err(err) = self
            .provider
            .edit_message(&channel_id, &message.id, &OutboundMessage::embed(updated))
            .await
        {
            error!("failed to reset ticket control message: {}", err);
            return UNCLAIM_EDIT_FAILED.to_string();
        }

        self.registry.unclaim(&channel_id);
        info!("ticket {} released by {}", interaction.channel_name(), user.tag());
        "✅ Você desistiu deste ticket com sucesso! Outro membro da equipe pode reivindicá-lo agora."
            .to_string()
    }

    async fn archive(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        if !interaction.in_ticket_channel() {
            return Err(BotError::Validation(TICKET_CHANNEL_ONLY.to_string()));
        }
        let channel_id = channel_of(interaction)?.to_string();
        let guild_id = guild_of(interaction)?.to_string();
        let user = actor_of(interaction)?.clone();

        self.provider
            .create_interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::reply(OutboundMessage::embed(ui::archive_notice(&user.id))),
            )
            .await?;

        match self.lock_channel(&guild_id, &channel_id).await {
            Ok(()) => {
                if let Some(control_id) = self
                    .registry
                    .get(&channel_id)
                    .and_then(|meta| meta.control_message_id.clone())
                {
                    let strip = OutboundMessage::default().clear_components();
                    if let Err(err) =
                        self.provider.edit_message(&channel_id, &control_id, &strip).await
                    {
                        warn!("could not strip controls from ticket {}: {}", channel_id, err);
                    }
                }
                info!("ticket {} archived by {}", interaction.channel_name(), user.tag());
            }
            Err(err) => error!("failed to archive ticket {}: {}", channel_id, err),
        }
        Ok(None)
    }

    /// Denies SEND_MESSAGES for @everyone, keeping whatever the overwrite
    /// already denied (the VIEW_CHANNEL deny from channel creation).
    async fn lock_channel(&self, guild_id: &str, channel_id: &str) -> Result<(), ChannelError> {
        let channel = self.provider.get_channel(channel_id).await?;
        let mut overwrite = channel
            .permission_overwrites
            .iter()
            .find(|overwrite| overwrite.id == guild_id)
            .cloned()
            .unwrap_or_else(|| PermissionOverwrite::role(guild_id, 0, 0));
        overwrite.deny |= SEND_MESSAGES;
        self.provider.edit_channel_permission(channel_id, &overwrite).await
    }

    async fn close(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        if !interaction.in_ticket_channel() {
            return Err(BotError::Validation(TICKET_CHANNEL_ONLY.to_string()));
        }
        let channel_id = channel_of(interaction)?.to_string();
        let guild_id = guild_of(interaction)?.to_string();
        let channel_name = interaction.channel_name().to_string();
        let user = actor_of(interaction)?.clone();

        let metadata = self.registry.get(&channel_id).cloned();
        if metadata.is_none() {
            warn!("no metadata for ticket {} (bot may have restarted)", channel_id);
        }

        self.provider
            .create_interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::deferred(),
            )
            .await?;

        let guild_name = match self.provider.get_guild(&guild_id).await {
            Ok(guild) => guild.name,
            Err(err) => {
                warn!("could not resolve guild {}: {}", guild_id, err);
                String::new()
            }
        };
        let transcript =
            transcript::generate(self.provider.as_ref(), &channel_id, &channel_name, &guild_name)
                .await;

        let close_reply = OutboundMessage::embed(ui::close_notice(&user.id));
        if let Err(err) = self.provider.edit_original_response(&interaction.token, &close_reply).await
        {
            error!("failed to edit close reply: {}", err);
        }
        info!("ticket {} closed by {}", channel_name, user.tag());

        if let Some(metadata) = &metadata {
            match self
                .deliver_close_dm(metadata, &user, &guild_name, &channel_id, &channel_name)
                .await
            {
                Ok(opener_tag) => {
                    info!("close DM delivered to {}", opener_tag);
                    if let Some(text) = transcript.as_deref() {
                        self.transcripts.insert(&channel_id, text);
                    }
                }
                Err(err) => {
                    error!("failed to DM ticket opener {}: {}", metadata.user_id, err);
                    warn!("user may have DMs disabled or blocked the bot");
                }
            }
        }

        self.send_close_log(&guild_id, &user, &channel_name).await;

        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            if let Err(err) = provider.delete_channel(&channel_id).await {
                error!("failed to delete ticket channel {}: {}", channel_id, err);
            }
        });
        Ok(None)
    }

    async fn deliver_close_dm(
        &self,
        metadata: &TicketMetadata,
        actor: &UserData,
        guild_name: &str,
        channel_id: &str,
        channel_name: &str,
    ) -> Result<String, ChannelError> {
        let opener = self.provider.get_user(&metadata.user_id).await?;
        let reason = if metadata.reason.is_empty() {
            "Não especificado"
        } else {
            &metadata.reason
        };
        let dm = ui::close_dm(&actor.id, reason, channel_name, guild_name, channel_id);
        self.provider.send_dm(&metadata.user_id, &dm).await?;
        Ok(opener.tag())
    }

    /// Sends the close log to the first panel in the guild with a logs
    /// channel configured.
    async fn send_close_log(&self, guild_id: &str, actor: &UserData, channel_name: &str) {
        let Some(logs_channel) = self
            .store
            .guild(guild_id)
            .and_then(|guild| guild.panels.values().find_map(|panel| panel.logs_channel_id.clone()))
        else {
            return;
        };
        let username = channel_name.strip_prefix(TICKET_PREFIX).unwrap_or(channel_name);
        let embed = ui::close_log(
            username,
            &actor.id,
            &actor.tag(),
            channel_name,
            Utc::now().timestamp(),
        );
        if let Err(err) = self
            .provider
            .send_message(&logs_channel, &OutboundMessage::embed(embed))
            .await
        {
            error!("failed to send ticket-close log: {}", err);
        }
    }

    fn settings(&self, interaction: &Interaction) -> Result<InteractionResponse, BotError> {
        let channel_id = channel_of(interaction)?;
        let metadata = self
            .registry
            .get(channel_id)
            .ok_or_else(|| BotError::Validation(SETTINGS_NO_CONTEXT.to_string()))?;
        let panel = self
            .store
            .panel(&metadata.guild_id, &metadata.panel_id)
            .ok_or_else(|| BotError::Validation(PANEL_CONFIG_MISSING.to_string()))?;

        let member = interaction.member.as_ref();
        let roles = panel.effective_support_roles();
        let has_support = member
            .map(|member| roles.iter().any(|role| member.has_role(role)))
            .unwrap_or(false);
        let is_admin = member
            .map(|member| member.has_permission(ADMINISTRATOR))
            .unwrap_or(false);
        if !has_support && !is_admin {
            return Err(BotError::Authorization(SUPPORT_ONLY_SETTINGS.to_string()));
        }
        Ok(InteractionResponse::ephemeral(ui::settings_menu()))
    }

    async fn notify_staff(
        &mut self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, BotError> {
        self.provider
            .create_interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::deferred_ephemeral(),
            )
            .await?;

        let channel_id = interaction.channel_id.as_deref().unwrap_or("");
        let content = match self.registry.get(channel_id) {
            None => NOTIFY_NO_CONTEXT.to_string(),
            Some(metadata) => match self.store.panel(&metadata.guild_id, &metadata.panel_id) {
                None => PANEL_CONFIG_MISSING.to_string(),
                Some(panel) => {
                    let mentions = ui::role_mentions(&panel.effective_support_roles());
                    if mentions.is_empty() {
                        "❌ Nenhum cargo de suporte configurado para notificar!".to_string()
                    } else {
                        format!(
                            "✅ Equipe de suporte notificada!\n\n🔔 **Cargos notificados:** {}",
                            mentions
                        )
                    }
                }
            },
        };
        self.edit_deferred(&interaction.token, &content).await;
        Ok(None)
    }

    async fn member_picker(
        &self,
        interaction: &Interaction,
        action: PickerAction,
    ) -> Result<InteractionResponse, BotError> {
        let guild_id = guild_of(interaction)?;
        let members = match self.provider.list_guild_members(guild_id, 100).await {
            Ok(members) => members,
            Err(err) => {
                error!("failed to list members of {}: {}", guild_id, err);
                return Err(BotError::Validation(MEMBER_FETCH_FAILED.to_string()));
            }
        };
        let users: Vec<UserData> = members
            .into_iter()
            .map(|member| member.user)
            .filter(|user| !user.bot)
            .take(25)
            .collect();
        if users.is_empty() {
            let empty = match action {
                PickerAction::Add => "❌ Nenhum usuário disponível para adicionar!",
                PickerAction::Remove => "❌ Nenhum usuário disponível para remover!",
            };
            return Err(BotError::Validation(empty.to_string()));
        }
        Ok(InteractionResponse::ephemeral(ui::member_picker(action, &users)))
    }

    /// A click on one of the picker buttons. Updates the picker message in
    /// place, clearing its embed and buttons.
    async fn picker_overwrite(
        &self,
        interaction: &Interaction,
        user_id: &str,
        action: PickerAction,
    ) -> Result<InteractionResponse, BotError> {
        let channel_id = channel_of(interaction)?;
        let result = match action {
            PickerAction::Add => {
                let overwrite = PermissionOverwrite::member(
                    user_id,
                    VIEW_CHANNEL | SEND_MESSAGES | READ_MESSAGE_HISTORY,
                    0,
                );
                self.provider.edit_channel_permission(channel_id, &overwrite).await
            }
            PickerAction::Remove => {
                self.provider.delete_channel_permission(channel_id, user_id).await
            }
        };
        let content = match (result, action) {
            (Ok(()), PickerAction::Add) => {
                info!("user {} added to ticket {}", user_id, channel_id);
                format!("✅ Usuário <@{}> adicionado ao ticket com sucesso!", user_id)
            }
            (Ok(()), PickerAction::Remove) => {
                info!("user {} removed from ticket {}", user_id, channel_id);
                format!("✅ Usuário <@{}> removido do ticket com sucesso!", user_id)
            }
            (Err(err), PickerAction::Add) => {
                error!("failed to add user {} to ticket {}: {}", user_id, channel_id, err);
                "❌ Erro ao adicionar usuário ao ticket!".to_string()
            }
            (Err(err), PickerAction::Remove) => {
                error!("failed to remove user {} from ticket {}: {}", user_id, channel_id, err);
                "❌ Erro ao remover usuário do ticket!".to_string()
            }
        };
        Ok(InteractionResponse::update(
            OutboundMessage::text(content).clear_embeds().clear_components(),
        ))
    }

    async fn view_transcript(
        &mut self,
        interaction: &Interaction,
        channel_id: &str,
    ) -> Result<Option<InteractionResponse>, BotError> {
        self.provider
            .create_interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::deferred_ephemeral(),
            )
            .await?;

        let Some(text) = self.transcripts.get(channel_id).map(str::to_string) else {
            self.edit_deferred(&interaction.token, TRANSCRIPT_MISS).await;
            return Ok(None);
        };
        let file_name = format!("transcript_{}.txt", channel_id);
        let message = OutboundMessage::text("📄 Aqui está a transcrição do seu ticket:");
        match self
            .provider
            .edit_original_response_with_file(&interaction.token, &message, &file_name, text.as_bytes())
            .await
        {
            Ok(()) => {
                if let Some(user) = interaction.actor() {
                    info!("transcript of {} delivered to {}", channel_id, user.tag());
                }
            }
            Err(err) => {
                error!("failed to upload transcript of {}: {}", channel_id, err);
                self.edit_deferred(&interaction.token, TRANSCRIPT_UPLOAD_FAILED).await;
            }
        }
        Ok(None)
    }

    async fn notify_user_submit(
        &mut self,
        interaction: &Interaction,
    ) -> Result<InteractionResponse, BotError> {
        let channel_id = channel_of(interaction)?;
        let metadata = self
            .registry
            .get(channel_id)
            .cloned()
            .ok_or_else(|| BotError::Validation(NOTIFY_NO_CONTEXT.to_string()))?;
        let message = interaction
            .modal_value("notify_message")
            .ok_or_else(|| BotError::Validation(GENERIC_ERROR.to_string()))?;
        let content = format!(
            "📧 **Mensagem da equipe de suporte:**\n\n{}\n\n*Ticket: {}*",
            message,
            interaction.channel_name()
        );
        match self.deliver_notify_dm(&metadata.user_id, &content).await {
            Ok(opener_tag) => Ok(InteractionResponse::ephemeral(OutboundMessage::text(
                format!("✅ Mensagem enviada com sucesso para {}!", opener_tag),
            ))),
            Err(err) => {
                error!("failed to DM ticket opener {}: {}", metadata.user_id, err);
                Err(BotError::Validation(DM_FAILED.to_string()))
            }
        }
    }

    async fn deliver_notify_dm(&self, user_id: &str, content: &str) -> Result<String, ChannelError> {
        let opener = self.provider.get_user(user_id).await?;
        self.provider.send_dm(user_id, &OutboundMessage::text(content)).await?;
        Ok(opener.tag())
    }

    async fn find_control_message(
        &self,
        channel_id: &str,
    ) -> Result<Option<MessageData>, ChannelError> {
        if let Some(message_id) = self
            .registry
            .get(channel_id)
            .and_then(|meta| meta.control_message_id.clone())
        {
            return self
                .provider
                .get_channel_message(channel_id, &message_id)
                .await
                .map(Some);
        }
        // metadata lost, scan the latest messages for the control embed
        let bot_id = self.bot_user_id().await?;
        let recent = self.provider.get_channel_messages(channel_id, 10, None).await?;
        Ok(recent.into_iter().find(|message| {
            message.author.id == bot_id
                && message
                    .embeds
                    .first()
                    .map(|embed| embed.title.as_deref() == Some(ui::CONTROL_TITLE))
                    .unwrap_or(false)
        }))
    }

    async fn bot_user_id(&self) -> Result<String, ChannelError> {
        if let Some(id) = self.status.bot_id() {
            return Ok(id);
        }
        Ok(self.provider.get_current_user().await?.id)
    }

    async fn edit_deferred(&self, token: &str, content: &str) {
        if let Err(err) = self
            .provider
            .edit_original_response(token, &OutboundMessage::text(content))
            .await
        {
            error!("failed to edit deferred reply: {}", err);
        }
    }
}

fn actor_of<'a>(interaction: &'a Interaction) -> Result<&'a UserData, BotError> {
    interaction
        .actor()
        .ok_or_else(|| BotError::Validation(GENERIC_ERROR.to_string()))
}

fn guild_of(interaction: &Interaction) -> Result<&str, BotError> {
    interaction
        .guild_id
        .as_deref()
        .ok_or_else(|| BotError::Validation(GENERIC_ERROR.to_string()))
}

fn channel_of(interaction: &Interaction) -> Result<&str, BotError> {
    interaction
        .channel_id
        .as_deref()
        .ok_or_else(|| BotError::Validation(GENERIC_ERROR.to_string()))
}

/// Clones a control embed rewriting only the staff field.
fn staff_update(source: &EmbedData, staff: &str) -> Embed {
    let mut embed = Embed::from(source);
    for field in &mut embed.fields {
        if field.name == ui::STAFF_FIELD_NAME {
            field.value = staff.to_string();
        }
    }
    embed
}

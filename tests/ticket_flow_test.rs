#[cfg(test)]
mod ticket_flow_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use ticketbot::bot::TicketBot;
    use ticketbot::channels::{
        ChannelData, ChannelError, ChannelProvider, EmbedData, GuildData, InteractionResponse,
        MemberData, MessageData, OutboundMessage, PermissionOverwrite, ResponseData,
        ResponseMessage, RoleData, UserData, READ_MESSAGE_HISTORY, SEND_MESSAGES, VIEW_CHANNEL,
    };
    use ticketbot::panels::{PanelConfig, PanelKind, PanelStore, Sector};
    use ticketbot::shared::state::StatusState;
    use ticketbot::tests::test_util;

    const GUILD: &str = "g1";

    #[derive(Default)]
    struct FakeState {
        next_id: u64,
        channels: HashMap<String, ChannelData>,
        messages: Vec<(String, MessageData)>,
        responses: Vec<(String, InteractionResponse)>,
        token_edits: Vec<(String, OutboundMessage)>,
        followups: Vec<(String, ResponseMessage)>,
        uploads: Vec<(String, String, String)>,
        message_edits: Vec<(String, String, OutboundMessage)>,
        permission_edits: Vec<(String, PermissionOverwrite)>,
        permission_deletes: Vec<(String, String)>,
        deleted_channels: Vec<String>,
    }

    struct FakeProvider {
        state: Mutex<FakeState>,
        users: HashMap<String, UserData>,
        members: Vec<MemberData>,
        undeliverable: Vec<String>,
    }

    fn plain_user(id: &str, username: &str) -> UserData {
        UserData {
            id: id.to_string(),
            username: username.to_string(),
            discriminator: "0".to_string(),
            bot: false,
        }
    }

    fn guild_member(id: &str, username: &str, roles: &[&str]) -> MemberData {
        MemberData {
            user: plain_user(id, username),
            roles: roles.iter().map(|role| role.to_string()).collect(),
            permissions: String::new(),
        }
    }

    impl FakeProvider {
        fn new() -> Arc<Self> {
            Self::with_undeliverable(&[])
        }

        fn with_undeliverable(user_ids: &[&str]) -> Arc<Self> {
            let mut users = HashMap::new();
            for (id, name) in [("u1", "Ana Clara"), ("u2", "Bruno"), ("u3", "Carla")] {
                users.insert(id.to_string(), plain_user(id, name));
            }
            users.insert(
                "bot-1".to_string(),
                UserData {
                    id: "bot-1".to_string(),
                    username: "Atendente 7M".to_string(),
                    discriminator: "0".to_string(),
                    bot: true,
                },
            );
            let mut bot_member = guild_member("bot-1", "Atendente 7M", &[]);
            bot_member.user.bot = true;
            Arc::new(FakeProvider {
                state: Mutex::default(),
                users,
                members: vec![
                    guild_member("u1", "Ana Clara", &[]),
                    guild_member("u2", "Bruno", &["r-sup"]),
                    guild_member("u3", "Carla", &[]),
                    bot_member,
                ],
                undeliverable: user_ids.iter().map(|id| id.to_string()).collect(),
            })
        }

        fn next_id(state: &mut FakeState, prefix: &str) -> String {
            state.next_id += 1;
            format!("{}{}", prefix, state.next_id)
        }

        fn bot_user(&self) -> UserData {
            self.users["bot-1"].clone()
        }

        fn outbound_embeds(message: &OutboundMessage) -> Vec<EmbedData> {
            message
                .embeds
                .as_ref()
                .map(|embeds| {
                    embeds
                        .iter()
                        .map(|embed| {
                            let raw = serde_json::to_value(embed).unwrap();
                            serde_json::from_value(raw).unwrap()
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChannelProvider for FakeProvider {
        async fn create_interaction_response(
            &self,
            interaction_id: &str,
            _token: &str,
            response: &InteractionResponse,
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            state
                .responses
                .push((interaction_id.to_string(), response.clone()));
            Ok(())
        }

        async fn edit_original_response(
            &self,
            token: &str,
            message: &OutboundMessage,
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.token_edits.push((token.to_string(), message.clone()));
            Ok(())
        }

        async fn edit_original_response_with_file(
            &self,
            token: &str,
            _message: &OutboundMessage,
            file_name: &str,
            file_contents: &[u8],
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.uploads.push((
                token.to_string(),
                file_name.to_string(),
                String::from_utf8_lossy(file_contents).into_owned(),
            ));
            Ok(())
        }

        async fn create_followup(
            &self,
            token: &str,
            message: &ResponseMessage,
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.followups.push((token.to_string(), message.clone()));
            Ok(())
        }

        async fn create_guild_channel(
            &self,
            _guild_id: &str,
            name: &str,
            _parent_id: Option<&str>,
            overwrites: &[PermissionOverwrite],
        ) -> Result<ChannelData, ChannelError> {
            let mut state = self.state.lock().unwrap();
            let id = Self::next_id(&mut state, "c");
            let channel = ChannelData {
                id: id.clone(),
                name: name.to_string(),
                kind: 0,
                permission_overwrites: overwrites.to_vec(),
            };
            state.channels.insert(id, channel.clone());
            Ok(channel)
        }

        async fn get_channel(&self, channel_id: &str) -> Result<ChannelData, ChannelError> {
            let state = self.state.lock().unwrap();
            state
                .channels
                .get(channel_id)
                .cloned()
                .ok_or(ChannelError::ApiError {
                    status: 404,
                    message: "Unknown Channel".to_string(),
                })
        }

        async fn get_guild_channels(
            &self,
            _guild_id: &str,
        ) -> Result<Vec<ChannelData>, ChannelError> {
            let state = self.state.lock().unwrap();
            Ok(state.channels.values().cloned().collect())
        }

        async fn delete_channel(&self, channel_id: &str) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.channels.remove(channel_id);
            state.deleted_channels.push(channel_id.to_string());
            Ok(())
        }

        async fn get_guild(&self, guild_id: &str) -> Result<GuildData, ChannelError> {
            Ok(GuildData {
                id: guild_id.to_string(),
                name: "Loja 7M".to_string(),
            })
        }

        async fn get_guild_roles(&self, _guild_id: &str) -> Result<Vec<RoleData>, ChannelError> {
            Ok(vec![RoleData {
                id: "r-sup".to_string(),
                name: "Suporte".to_string(),
            }])
        }

        async fn list_guild_members(
            &self,
            _guild_id: &str,
            limit: u8,
        ) -> Result<Vec<MemberData>, ChannelError> {
            Ok(self
                .members
                .iter()
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn send_message(
            &self,
            channel_id: &str,
            message: &OutboundMessage,
        ) -> Result<MessageData, ChannelError> {
            let mut state = self.state.lock().unwrap();
            let id = Self::next_id(&mut state, "m");
            let stored = MessageData {
                id: id.clone(),
                content: message.content.clone().unwrap_or_default(),
                author: self.bot_user(),
                attachments: Vec::new(),
                embeds: Self::outbound_embeds(message),
                timestamp: "2026-08-26T12:00:00.000000+00:00".to_string(),
            };
            state.messages.push((channel_id.to_string(), stored.clone()));
            Ok(stored)
        }

        async fn edit_message(
            &self,
            channel_id: &str,
            message_id: &str,
            message: &OutboundMessage,
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            let embeds = Self::outbound_embeds(message);
            let target = state
                .messages
                .iter_mut()
                .find(|(channel, stored)| channel == channel_id && stored.id == message_id);
            match target {
                Some((_, stored)) => {
                    if let Some(content) = &message.content {
                        stored.content = content.clone();
                    }
                    if message.embeds.is_some() {
                        stored.embeds = embeds;
                    }
                }
                None => {
                    return Err(ChannelError::ApiError {
                        status: 404,
                        message: "Unknown Message".to_string(),
                    });
                }
            }
            state.message_edits.push((
                channel_id.to_string(),
                message_id.to_string(),
                message.clone(),
            ));
            Ok(())
        }

        async fn get_channel_messages(
            &self,
            channel_id: &str,
            limit: u8,
            before: Option<&str>,
        ) -> Result<Vec<MessageData>, ChannelError> {
            let state = self.state.lock().unwrap();
            let mut newest_first: Vec<MessageData> = state
                .messages
                .iter()
                .filter(|(channel, _)| channel == channel_id)
                .map(|(_, message)| message.clone())
                .rev()
                .collect();
            if let Some(before) = before {
                match newest_first.iter().position(|message| message.id == before) {
                    Some(pos) => newest_first = newest_first.split_off(pos + 1),
                    None => newest_first.clear(),
                }
            }
            newest_first.truncate(limit as usize);
            Ok(newest_first)
        }

        async fn get_channel_message(
            &self,
            channel_id: &str,
            message_id: &str,
        ) -> Result<MessageData, ChannelError> {
            let state = self.state.lock().unwrap();
            state
                .messages
                .iter()
                .find(|(channel, message)| channel == channel_id && message.id == message_id)
                .map(|(_, message)| message.clone())
                .ok_or(ChannelError::ApiError {
                    status: 404,
                    message: "Unknown Message".to_string(),
                })
        }

        async fn edit_channel_permission(
            &self,
            channel_id: &str,
            overwrite: &PermissionOverwrite,
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            if let Some(channel) = state.channels.get_mut(channel_id) {
                channel
                    .permission_overwrites
                    .retain(|existing| existing.id != overwrite.id);
                channel.permission_overwrites.push(overwrite.clone());
            }
            state
                .permission_edits
                .push((channel_id.to_string(), overwrite.clone()));
            Ok(())
        }

        async fn delete_channel_permission(
            &self,
            channel_id: &str,
            overwrite_id: &str,
        ) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            if let Some(channel) = state.channels.get_mut(channel_id) {
                channel
                    .permission_overwrites
                    .retain(|existing| existing.id != overwrite_id);
            }
            state
                .permission_deletes
                .push((channel_id.to_string(), overwrite_id.to_string()));
            Ok(())
        }

        async fn create_dm_channel(&self, user_id: &str) -> Result<ChannelData, ChannelError> {
            if self.undeliverable.iter().any(|blocked| blocked == user_id) {
                return Err(ChannelError::ApiError {
                    status: 403,
                    message: "Cannot send messages to this user".to_string(),
                });
            }
            Ok(ChannelData {
                id: format!("dm-{}", user_id),
                name: String::new(),
                kind: 1,
                permission_overwrites: Vec::new(),
            })
        }

        async fn get_user(&self, user_id: &str) -> Result<UserData, ChannelError> {
            self.users
                .get(user_id)
                .cloned()
                .ok_or(ChannelError::ApiError {
                    status: 404,
                    message: "Unknown User".to_string(),
                })
        }

        async fn get_current_user(&self) -> Result<UserData, ChannelError> {
            Ok(self.bot_user())
        }

        async fn register_commands(&self, _commands: &Value) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn response_content(response: &InteractionResponse) -> String {
        match &response.data {
            Some(ResponseData::Message(reply)) => reply.message.content.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn response_flags(response: &InteractionResponse) -> Option<u32> {
        match &response.data {
            Some(ResponseData::Message(reply)) => reply.flags,
            _ => None,
        }
    }

    fn response_embed_json(response: &InteractionResponse) -> Value {
        match &response.data {
            Some(ResponseData::Message(reply)) => reply
                .message
                .embeds
                .as_ref()
                .and_then(|embeds| embeds.first())
                .map(|embed| serde_json::to_value(embed).unwrap())
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    fn member_payload(user_id: &str, username: &str, roles: &[&str], permissions: &str) -> Value {
        json!({
            "user": {"id": user_id, "username": username, "discriminator": "0"},
            "roles": roles,
            "permissions": permissions
        })
    }

    fn admin_payload(user_id: &str, username: &str) -> Value {
        member_payload(user_id, username, &[], "2147483647")
    }

    fn component_click(
        id: &str,
        custom_id: &str,
        channel_id: &str,
        channel_name: &str,
        member: Value,
    ) -> Value {
        json!({
            "id": id,
            "token": format!("tok-{}", id),
            "type": 3,
            "guild_id": GUILD,
            "channel_id": channel_id,
            "channel": {"id": channel_id, "name": channel_name, "type": 0},
            "member": member,
            "data": {"custom_id": custom_id}
        })
    }

    fn select_pick(
        id: &str,
        custom_id: &str,
        value: &str,
        channel_id: &str,
        channel_name: &str,
        member: Value,
    ) -> Value {
        json!({
            "id": id,
            "token": format!("tok-{}", id),
            "type": 3,
            "guild_id": GUILD,
            "channel_id": channel_id,
            "channel": {"id": channel_id, "name": channel_name, "type": 0},
            "member": member,
            "data": {"custom_id": custom_id, "values": [value]}
        })
    }

    fn slash(id: &str, name: &str, options: Value, member: Value) -> Value {
        json!({
            "id": id,
            "token": format!("tok-{}", id),
            "type": 2,
            "guild_id": GUILD,
            "channel_id": "c-admin",
            "channel": {"id": "c-admin", "name": "admin", "type": 0},
            "member": member,
            "data": {"name": name, "options": options}
        })
    }

    fn modal_submit(
        id: &str,
        custom_id: &str,
        field: &str,
        value: &str,
        channel_id: &str,
        channel_name: &str,
        member: Value,
    ) -> Value {
        json!({
            "id": id,
            "token": format!("tok-{}", id),
            "type": 5,
            "guild_id": GUILD,
            "channel_id": channel_id,
            "channel": {"id": channel_id, "name": channel_name, "type": 0},
            "member": member,
            "data": {
                "custom_id": custom_id,
                "components": [{"components": [{"custom_id": field, "value": value}]}]
            }
        })
    }

    fn configured_store(dir: &tempfile::TempDir) -> PanelStore {
        let mut store = PanelStore::new(dir.path().join("config.json"));
        let mut panel = PanelConfig::new("Painel Padrão", PanelKind::SelectMenu);
        panel.category_id = Some("cat-1".to_string());
        panel.support_role_id = Some("r-sup".to_string());
        panel.support_roles = vec!["r-sup".to_string()];
        panel.setores = vec![Sector {
            nome: "Vendas".to_string(),
            descricao: "Dúvidas sobre compras".to_string(),
            emoji: None,
        }];
        store.create_panel(GUILD, "default", panel);
        store
    }

    fn bot_with(provider: Arc<FakeProvider>, store: PanelStore) -> TicketBot {
        let status = Arc::new(StatusState::new());
        status.set_identity("bot-1", "Atendente 7M");
        TicketBot::new(provider, store, status)
    }

    async fn open_ticket(bot: &mut TicketBot, provider: &Arc<FakeProvider>) -> String {
        let click = component_click(
            "i-open",
            "create_ticket:default:Suporte",
            "c-panel",
            "atendimento",
            member_payload("u1", "Ana Clara", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", click).await;
        let state = provider.state.lock().unwrap();
        state
            .channels
            .values()
            .find(|channel| channel.name.starts_with("ticket-de-"))
            .expect("ticket channel should exist")
            .id
            .clone()
    }

    #[tokio::test]
    async fn button_click_opens_one_ticket_per_user() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));

        let ticket_id = open_ticket(&mut bot, &provider).await;

        {
            let state = provider.state.lock().unwrap();
            let ticket = state.channels.get(&ticket_id).unwrap();
            assert_eq!(ticket.name, "ticket-de-ana-clara");

            let everyone = ticket
                .permission_overwrites
                .iter()
                .find(|overwrite| overwrite.id == GUILD)
                .expect("@everyone overwrite");
            assert_eq!(everyone.deny & VIEW_CHANNEL, VIEW_CHANNEL);
            let opener = ticket
                .permission_overwrites
                .iter()
                .find(|overwrite| overwrite.id == "u1")
                .expect("opener overwrite");
            assert_eq!(
                opener.allow,
                VIEW_CHANNEL | SEND_MESSAGES | READ_MESSAGE_HISTORY
            );
            assert!(ticket.permission_overwrites.iter().any(|o| o.id == "r-sup"));
            assert!(ticket.permission_overwrites.iter().any(|o| o.id == "bot-1"));

            let (_, ack) = &state.responses[0];
            assert_eq!(ack.kind, 5);
            assert_eq!(response_flags(ack), Some(64));

            let (_, control) = state
                .messages
                .iter()
                .find(|(channel, _)| channel == &ticket_id)
                .expect("control message");
            assert_eq!(
                control.embeds[0].title.as_deref(),
                Some("🎫 Ticket - Menu Inicial")
            );
            assert_eq!(
                control.embeds[0].fields[2].value,
                "Ninguém reivindicou esse ticket!"
            );

            let (_, reply) = state
                .token_edits
                .iter()
                .find(|(token, _)| token == "tok-i-open")
                .expect("creation reply");
            let rendered = serde_json::to_value(reply).unwrap().to_string();
            assert!(rendered.contains(&ticket_id));
        }

        let again = component_click(
            "i-again",
            "create_ticket:default:Suporte",
            "c-panel",
            "atendimento",
            member_payload("u1", "Ana Clara", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", again).await;

        let state = provider.state.lock().unwrap();
        let (interaction_id, rejection) = state.responses.last().unwrap();
        assert_eq!(interaction_id, "i-again");
        assert_eq!(rejection.kind, 4);
        assert_eq!(response_flags(rejection), Some(64));
        assert_eq!(
            response_content(rejection),
            format!("❌ Você já tem um ticket aberto: <#{}>", ticket_id)
        );
        assert_eq!(state.channels.len(), 1);
    }

    #[tokio::test]
    async fn sector_selection_requires_a_configured_panel() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut store = PanelStore::new(dir.path().join("config.json"));
        // category but no support role: buttons would work, the menu not
        let mut panel = PanelConfig::new("Painel Padrão", PanelKind::SelectMenu);
        panel.category_id = Some("cat-1".to_string());
        store.create_panel(GUILD, "default", panel);
        let mut bot = bot_with(provider.clone(), store);

        let pick = select_pick(
            "i-pick",
            "select_setor:default",
            "Vendas",
            "c-panel",
            "atendimento",
            member_payload("u1", "Ana Clara", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", pick).await;

        let state = provider.state.lock().unwrap();
        let (_, response) = state.responses.last().unwrap();
        assert_eq!(
            response_content(response),
            "❌ Este painel não está configurado corretamente! Peça a um administrador para usar `/selecionar_painel` e `/setup`."
        );
        assert!(state.channels.is_empty());
    }

    #[tokio::test]
    async fn sector_selection_opens_with_the_picked_reason() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut store = configured_store(&dir);
        store
            .panel_mut(GUILD, "default")
            .unwrap()
            .logs_channel_id = Some("c-logs".to_string());
        let mut bot = bot_with(provider.clone(), store);

        let pick = select_pick(
            "i-pick",
            "select_setor:default",
            "Vendas",
            "c-panel",
            "atendimento",
            member_payload("u1", "Ana Clara", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", pick).await;

        let state = provider.state.lock().unwrap();
        let ticket = state
            .channels
            .values()
            .find(|channel| channel.name == "ticket-de-ana-clara")
            .expect("ticket channel");

        let (_, control) = state
            .messages
            .iter()
            .find(|(channel, _)| channel == &ticket.id)
            .expect("control message");
        assert_eq!(control.embeds[0].fields[1].value, "Vendas");
        assert_eq!(
            control.embeds[0].footer.as_ref().map(|f| f.text.as_str()),
            Some("Powered by 7M")
        );

        let (_, log) = state
            .messages
            .iter()
            .find(|(channel, _)| channel == "c-logs")
            .expect("open log");
        assert_eq!(log.embeds[0].title.as_deref(), Some("📂 Ticket Aberto"));
        let body = log.embeds[0].description.as_deref().unwrap();
        assert!(body.contains("**Setor:** Vendas"));
        assert!(body.contains("**Painel:** Painel Padrão"));
    }

    #[tokio::test]
    async fn claim_is_limited_to_support_and_rewrites_the_control_embed() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let outsider = component_click(
            "i-claim-no",
            "reivindicar_ticket",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u3", "Carla", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", outsider).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, denied) = state.responses.last().unwrap();
            assert_eq!(
                response_content(denied),
                "❌ Apenas membros da equipe de suporte podem reivindicar tickets!"
            );
            assert!(state.message_edits.is_empty());
        }

        let staff = component_click(
            "i-claim",
            "reivindicar_ticket",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", staff).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, notice) = state.responses.last().unwrap();
            assert_eq!(notice.kind, 4);
            assert_eq!(response_flags(notice), None);
            let embed = response_embed_json(notice).to_string();
            assert!(embed.contains("<@u2>"));

            let (channel, _, edit) = state.message_edits.last().expect("control rewrite");
            assert_eq!(channel, &ticket_id);
            let fields = &edit.embeds.as_ref().unwrap()[0].fields;
            assert_eq!(fields[2].name, "👮 Staff");
            assert_eq!(fields[2].value, "<@u2>");
            assert_eq!(fields[0].value, "<@u1> 🎲");
        }
    }

    #[tokio::test]
    async fn only_the_claimant_can_release_a_ticket() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let unclaimed = component_click(
            "i-early",
            "ticket_unclaim",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", unclaimed).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, edit) = state.token_edits.last().unwrap();
            assert_eq!(
                edit.content.as_deref(),
                Some("❌ Este ticket não foi reivindicado por ninguém!")
            );
        }

        let claim = component_click(
            "i-claim",
            "reivindicar_ticket",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", claim).await;

        let wrong_user = component_click(
            "i-wrong",
            "ticket_unclaim",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u3", "Carla", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", wrong_user).await;
        {
            let state = provider.state.lock().unwrap();
            let (token, edit) = state.token_edits.last().unwrap();
            assert_eq!(token, "tok-i-wrong");
            assert_eq!(
                edit.content.as_deref(),
                Some("❌ Você não pode desistir deste ticket! Ele foi reivindicado por **Bruno**.")
            );
        }

        let release = component_click(
            "i-release",
            "ticket_unclaim",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", release).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, edit) = state.token_edits.last().unwrap();
            assert_eq!(
                edit.content.as_deref(),
                Some("✅ Você desistiu deste ticket com sucesso! Outro membro da equipe pode reivindicá-lo agora.")
            );
            let (_, _, rewrite) = state.message_edits.last().unwrap();
            let fields = &rewrite.embeds.as_ref().unwrap()[0].fields;
            assert_eq!(fields[2].value, "Ninguém reivindicou esse ticket!");
        }
    }

    #[tokio::test]
    async fn archive_denies_sending_and_strips_the_controls() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let archive = component_click(
            "i-arc",
            "arquivar_ticket",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", archive).await;

        let state = provider.state.lock().unwrap();
        let (_, notice) = state.responses.last().unwrap();
        assert_eq!(notice.kind, 4);
        assert!(response_embed_json(notice).to_string().contains("<@u2>"));

        let (channel, overwrite) = state.permission_edits.last().expect("lock edit");
        assert_eq!(channel, &ticket_id);
        assert_eq!(overwrite.id, GUILD);
        // merges onto the deny that hid the channel at creation
        assert_eq!(overwrite.deny, VIEW_CHANNEL | SEND_MESSAGES);

        let (_, _, strip) = state.message_edits.last().expect("component strip");
        assert_eq!(strip.components, Some(Vec::new()));
        assert!(strip.embeds.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn close_notifies_the_opener_and_deletes_the_channel() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        {
            let mut state = provider.state.lock().unwrap();
            let id = FakeProvider::next_id(&mut state, "m");
            state.messages.push((
                ticket_id.clone(),
                MessageData {
                    id,
                    content: "olá, preciso de ajuda".to_string(),
                    author: plain_user("u1", "Ana Clara"),
                    attachments: Vec::new(),
                    embeds: Vec::new(),
                    timestamp: "2026-08-26T12:05:00.000000+00:00".to_string(),
                },
            ));
        }

        let close = component_click(
            "i-close",
            "fechar_ticket",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", close).await;

        {
            let state = provider.state.lock().unwrap();
            let (_, ack) = state.responses.last().unwrap();
            assert_eq!(ack.kind, 5);
            assert!(ack.data.is_none(), "close acknowledgement is public");

            let (token, closed) = state.token_edits.last().unwrap();
            assert_eq!(token, "tok-i-close");
            assert!(closed.embeds.is_some());

            let (_, dm) = state
                .messages
                .iter()
                .find(|(channel, _)| channel == "dm-u1")
                .expect("close DM");
            let field = |name: &str| {
                dm.embeds[0]
                    .fields
                    .iter()
                    .find(|field| field.name == name)
                    .map(|field| field.value.clone())
            };
            assert_eq!(field("Motivo").as_deref(), Some("Suporte"));
            assert_eq!(field("Servidor").as_deref(), Some("Loja 7M"));
            assert_eq!(field("Nome do Ticket").as_deref(), Some("ticket-de-ana-clara"));

            assert!(!state.deleted_channels.contains(&ticket_id));
        }

        tokio::time::sleep(Duration::from_secs(6)).await;
        {
            let state = provider.state.lock().unwrap();
            assert!(state.deleted_channels.contains(&ticket_id));
        }

        let view = component_click(
            "i-view",
            &format!("view_transcript:{}", ticket_id),
            "c-admin",
            "admin",
            member_payload("u1", "Ana Clara", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", view).await;

        let state = provider.state.lock().unwrap();
        let (token, file_name, contents) = state.uploads.last().expect("transcript upload");
        assert_eq!(token, "tok-i-view");
        assert_eq!(file_name, &format!("transcript_{}.txt", ticket_id));
        assert!(contents.contains("TRANSCRIÇÃO DO TICKET"));
        assert!(contents.contains("olá, preciso de ajuda"));
        assert!(contents.contains("Loja 7M"));
    }

    #[tokio::test(start_paused = true)]
    async fn undeliverable_dm_skips_the_transcript_cache() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::with_undeliverable(&["u1"]);
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let close = component_click(
            "i-close",
            "fechar_ticket",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", close).await;
        tokio::time::sleep(Duration::from_secs(6)).await;

        let view = component_click(
            "i-view",
            &format!("view_transcript:{}", ticket_id),
            "c-admin",
            "admin",
            member_payload("u1", "Ana Clara", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", view).await;

        let state = provider.state.lock().unwrap();
        // the failed DM does not stop the deletion, only the cache
        assert!(state.deleted_channels.contains(&ticket_id));
        assert!(state.uploads.is_empty());
        let (token, edit) = state.token_edits.last().unwrap();
        assert_eq!(token, "tok-i-view");
        assert_eq!(
            edit.content.as_deref(),
            Some("❌ Transcrição não disponível. O ticket pode ter sido fechado há muito tempo.")
        );
    }

    #[tokio::test]
    async fn settings_menu_gates_on_support_or_admin() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let outsider = component_click(
            "i-s1",
            "ticket_settings",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u3", "Carla", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", outsider).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, denied) = state.responses.last().unwrap();
            assert_eq!(
                response_content(denied),
                "❌ Apenas membros da equipe de suporte podem acessar as configurações do ticket!"
            );
        }

        let staff = component_click(
            "i-s2",
            "ticket_settings",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", staff).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, menu) = state.responses.last().unwrap();
            assert_eq!(menu.kind, 4);
            assert_eq!(response_flags(menu), Some(64));
            match &menu.data {
                Some(ResponseData::Message(reply)) => {
                    assert!(reply.message.components.as_ref().is_some_and(|rows| !rows.is_empty()));
                }
                other => panic!("expected a message response, got {:?}", other),
            }
        }

        let admin = component_click(
            "i-s3",
            "ticket_settings",
            &ticket_id,
            "ticket-de-ana-clara",
            admin_payload("u3", "Carla"),
        );
        bot.handle_event("INTERACTION_CREATE", admin).await;
        let state = provider.state.lock().unwrap();
        let (_, menu) = state.responses.last().unwrap();
        assert_eq!(menu.kind, 4);
    }

    #[tokio::test]
    async fn notify_flows_reach_staff_and_opener() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let staff_ping = component_click(
            "i-staff",
            "ticket_notify_staff",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", staff_ping).await;
        {
            let state = provider.state.lock().unwrap();
            let (token, edit) = state.token_edits.last().unwrap();
            assert_eq!(token, "tok-i-staff");
            assert_eq!(
                edit.content.as_deref(),
                Some("✅ Equipe de suporte notificada!\n\n🔔 **Cargos notificados:** <@&r-sup>")
            );
        }

        let open_modal = component_click(
            "i-modal",
            "ticket_notify_user",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", open_modal).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, modal) = state.responses.last().unwrap();
            assert_eq!(modal.kind, 9);
        }

        let submitted = modal_submit(
            "i-sub",
            "modal_notify_user",
            "notify_message",
            "Seu pedido foi enviado.",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", submitted).await;

        let state = provider.state.lock().unwrap();
        let (_, confirmation) = state.responses.last().unwrap();
        assert_eq!(
            response_content(confirmation),
            "✅ Mensagem enviada com sucesso para Ana Clara!"
        );
        let (_, dm) = state
            .messages
            .iter()
            .find(|(channel, _)| channel == "dm-u1")
            .expect("notify DM");
        assert!(dm.content.contains("Seu pedido foi enviado."));
        assert!(dm.content.contains("ticket-de-ana-clara"));
    }

    #[tokio::test]
    async fn member_picker_adds_and_removes_participants() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let mut bot = bot_with(provider.clone(), configured_store(&dir));
        let ticket_id = open_ticket(&mut bot, &provider).await;

        let picker = component_click(
            "i-pick",
            "ticket_add_user",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", picker).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, menu) = state.responses.last().unwrap();
            assert_eq!(response_flags(menu), Some(64));
            let rendered = serde_json::to_value(menu).unwrap().to_string();
            // bots are filtered out of the picker
            assert!(rendered.contains("add_user_u3"));
            assert!(!rendered.contains("add_user_bot-1"));
        }

        let add = component_click(
            "i-add",
            "add_user_u3",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", add).await;
        {
            let state = provider.state.lock().unwrap();
            let (channel, overwrite) = state.permission_edits.last().unwrap();
            assert_eq!(channel, &ticket_id);
            assert_eq!(overwrite.id, "u3");
            assert_eq!(
                overwrite.allow,
                VIEW_CHANNEL | SEND_MESSAGES | READ_MESSAGE_HISTORY
            );
            let (_, update) = state.responses.last().unwrap();
            assert_eq!(update.kind, 7);
            assert_eq!(
                response_content(update),
                "✅ Usuário <@u3> adicionado ao ticket com sucesso!"
            );
        }

        let remove = component_click(
            "i-rem",
            "remove_user_u3",
            &ticket_id,
            "ticket-de-ana-clara",
            member_payload("u2", "Bruno", &["r-sup"], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", remove).await;
        let state = provider.state.lock().unwrap();
        let (channel, overwrite_id) = state.permission_deletes.last().unwrap();
        assert_eq!(channel, &ticket_id);
        assert_eq!(overwrite_id, "u3");
        let (_, update) = state.responses.last().unwrap();
        assert_eq!(
            response_content(update),
            "✅ Usuário <@u3> removido do ticket com sucesso!"
        );
    }

    #[tokio::test]
    async fn admin_commands_build_configure_and_post_a_panel() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let store = PanelStore::new(dir.path().join("config.json"));
        let mut bot = bot_with(provider.clone(), store);

        let blocked = slash(
            "i-c0",
            "criar_painel",
            json!([{"name": "nome", "value": "Vendas"}]),
            member_payload("u3", "Carla", &[], "0"),
        );
        bot.handle_event("INTERACTION_CREATE", blocked).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, denied) = state.responses.last().unwrap();
            assert_eq!(
                response_content(denied),
                "❌ Você precisa ser um administrador para usar este comando!"
            );
        }

        let create = slash(
            "i-c1",
            "criar_painel",
            json!([{"name": "nome", "value": "Vendas"}]),
            admin_payload("u2", "Bruno"),
        );
        bot.handle_event("INTERACTION_CREATE", create).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, created) = state.responses.last().unwrap();
            assert_eq!(response_flags(created), Some(64));
            let embed = response_embed_json(created);
            assert_eq!(embed["title"], "✅ Painel Criado!");
            assert!(embed["description"].as_str().unwrap().contains("`vendas`"));
        }

        let configure = json!({
            "id": "i-c2",
            "token": "tok-i-c2",
            "type": 2,
            "guild_id": GUILD,
            "channel_id": "c-admin",
            "channel": {"id": "c-admin", "name": "admin", "type": 0},
            "member": admin_payload("u2", "Bruno"),
            "data": {
                "name": "setup",
                "options": [
                    {"name": "cargo", "value": "r-sup"},
                    {"name": "categoria", "value": "cat-1"}
                ],
                "resolved": {"channels": {"cat-1": {"id": "cat-1", "name": "Tickets", "type": 4}}}
            }
        });
        bot.handle_event("INTERACTION_CREATE", configure).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, configured) = state.responses.last().unwrap();
            let embed = response_embed_json(configured);
            assert_eq!(embed["title"], "✅ Configuração Concluída!");
            let description = embed["description"].as_str().unwrap();
            assert!(description.contains("<@&r-sup>"));
            assert!(description.contains("Tickets"));
        }

        let empty_panel = slash(
            "i-c3",
            "enviar_painel",
            json!([{"name": "painel", "value": "vendas"}]),
            admin_payload("u2", "Bruno"),
        );
        bot.handle_event("INTERACTION_CREATE", empty_panel).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, rejected) = state.responses.last().unwrap();
            assert_eq!(
                response_content(rejected),
                "❌ Este painel não tem setores configurados! Use `/selecionar_painel` e depois `/add_setor`."
            );
        }

        let sector = slash(
            "i-c4",
            "add_setor",
            json!([
                {"name": "nome", "value": "Financeiro"},
                {"name": "descricao", "value": "Pagamentos e reembolsos"}
            ]),
            admin_payload("u2", "Bruno"),
        );
        bot.handle_event("INTERACTION_CREATE", sector).await;

        let publish = slash(
            "i-c5",
            "enviar_painel",
            json!([{"name": "painel", "value": "vendas"}]),
            admin_payload("u2", "Bruno"),
        );
        bot.handle_event("INTERACTION_CREATE", publish).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, sent) = state.responses.last().unwrap();
            assert_eq!(response_content(sent), "✅ Painel de tickets enviado!");
            let (channel, panel_message) = state.messages.last().expect("panel message");
            assert_eq!(channel, "c-admin");
            assert!(!panel_message.embeds.is_empty());
        }

        let snapshot = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert!(snapshot.contains("\"vendas\""));
        assert!(snapshot.contains("\"supportRoles\""));
        assert!(snapshot.contains("Financeiro"));

        let drop_panel = slash(
            "i-c6",
            "deletar_painel",
            json!([{"name": "painel", "value": "vendas"}]),
            admin_payload("u2", "Bruno"),
        );
        bot.handle_event("INTERACTION_CREATE", drop_panel).await;
        {
            let state = provider.state.lock().unwrap();
            let (_, deleted) = state.responses.last().unwrap();
            let embed = response_embed_json(deleted);
            assert_eq!(embed["title"], "🗑️ Painel Deletado!");
        }

        let listing = slash(
            "i-c7",
            "listar_paineis",
            json!([]),
            admin_payload("u2", "Bruno"),
        );
        bot.handle_event("INTERACTION_CREATE", listing).await;
        let state = provider.state.lock().unwrap();
        let (_, empty) = state.responses.last().unwrap();
        assert_eq!(
            response_content(empty),
            "❌ Nenhum painel configurado ainda! Use `/criar_painel` para criar um."
        );
    }

    #[tokio::test]
    async fn ready_and_guild_events_feed_the_status_page() {
        test_util::setup();
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let status = Arc::new(StatusState::new());
        let mut bot = TicketBot::new(
            provider.clone(),
            PanelStore::new(dir.path().join("config.json")),
            status.clone(),
        );

        assert!(!status.online());
        let ready = json!({
            "user": {"id": "bot-1", "username": "Atendente 7M", "discriminator": "0", "bot": true},
            "guilds": [{"id": "g1"}, {"id": "g2"}]
        });
        bot.handle_event("READY", ready).await;
        assert!(status.online());
        assert_eq!(status.bot_tag().as_deref(), Some("Atendente 7M"));
        assert_eq!(status.guild_count(), 2);

        bot.handle_event("GUILD_CREATE", json!({"id": "g3"})).await;
        assert_eq!(status.guild_count(), 3);
        bot.handle_event("GUILD_DELETE", json!({"id": "g2"})).await;
        assert_eq!(status.guild_count(), 2);

        // unknown events and malformed interactions are dropped quietly
        bot.handle_event("TYPING_START", json!({})).await;
        bot.handle_event("INTERACTION_CREATE", json!({"nope": true}))
            .await;
        assert!(provider.state.lock().unwrap().responses.is_empty());
    }
}

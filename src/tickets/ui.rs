//! Outbound message builders: panel renders, ticket controls, lifecycle embeds.

use chrono::Local;

use crate::channels::{
    ActionRow, Button, ButtonStyle, Component, Embed, InteractionResponse, OutboundMessage,
    PartialEmoji, SelectMenu, SelectOption, TextInput, UserData,
};
use crate::panels::{PanelConfig, PanelKind};
use crate::shared::utils::{create_safe_custom_id, is_valid_emoji, is_valid_url, parse_emoji};

pub const CONTROL_TITLE: &str = "🎫 Ticket - Menu Inicial";
pub const STAFF_FIELD_NAME: &str = "👮 Staff";
pub const UNCLAIMED_STAFF: &str = "Ninguém reivindicou esse ticket!";
pub const STORE_FOOTER: &str = "Powered by 7M Store";
pub const CONTROL_FOOTER_BUTTONS: &str = "Mensagem de: DRAGON STORE";
pub const CONTROL_FOOTER_SELECT: &str = "Powered by 7M";

const PANEL_IMAGE: &str = "https://i.postimg.cc/RFbMNyv3/standard-9.gif";
const SELECT_AUTHOR: &str = "Suporte";
const SELECT_AUTHOR_ICON: &str = "https://i.postimg.cc/mkhf55vf/group-icon.png";
const SELECT_DESCRIPTION: &str = "Está precisando de ajuda ou quer denunciar algum problema?\nEscolha a opção abaixo e aguarde a equipe de suporte!";
const BUTTONS_DESCRIPTION: &str = "**Para que possamos iniciar o seu atendimento, selecione o setor desejado no menu abaixo.**\n\n**H͟o͟r͟á͟r͟i͟o͟ ͟d͟e͟ ͟A͟t͟e͟n͟d͟i͟m͟e͟n͟t͟o͟:**\n\n> Segunda a Sexta\n8:00h as 22:30h\n\n> Sábado e Domingo\n7:00h as 21:30h\n\n> **Caso envie mensagens fora do horário de atendimento, aguarde. Assim que um staff estiver disponível, irá lhe atender com o setor de atendimento selecionado. Por favor, evite menções e abrir ticket à toa sem precisar de suporte.**";

fn unicode(emoji: &str) -> PartialEmoji {
    PartialEmoji {
        id: None,
        name: emoji.to_string(),
        animated: false,
    }
}

fn resolve_emoji(raw: &Option<String>) -> Option<PartialEmoji> {
    let raw = raw.as_deref()?;
    if raw.is_empty() || !is_valid_emoji(raw) {
        return None;
    }
    parse_emoji(raw).map(PartialEmoji::from)
}

/// Renders a panel into the message posted in the configured channel.
pub fn render_panel(panel_id: &str, panel: &PanelConfig) -> OutboundMessage {
    match panel.kind {
        PanelKind::SelectMenu => render_select_panel(panel_id, panel),
        PanelKind::Buttons => render_button_panel(panel_id, panel),
    }
}

fn render_select_panel(panel_id: &str, panel: &PanelConfig) -> OutboundMessage {
    let custom = &panel.customization;
    let mut embed = Embed::new()
        .color(custom.color.unwrap_or(0xff0000))
        .timestamp_now();
    if let Some(author) = custom.title.resolve(SELECT_AUTHOR) {
        embed = embed.author(author, Some(SELECT_AUTHOR_ICON.to_string()));
    }
    if let Some(description) = custom.description.resolve(SELECT_DESCRIPTION) {
        embed = embed.description(description);
    }
    if let Some(image) = custom.image.resolve(PANEL_IMAGE) {
        if is_valid_url(&image) {
            embed = embed.image(image);
        }
    }
    if let Some(thumbnail) = custom.thumbnail.resolve("") {
        if is_valid_url(&thumbnail) {
            embed = embed.thumbnail(thumbnail);
        }
    }

    let mut menu = SelectMenu::new(
        format!("select_setor:{}", panel_id),
        "Selecione o ticket desejado",
    );
    for setor in &panel.setores {
        menu = menu.option(SelectOption {
            label: setor.nome.clone(),
            value: setor.nome.clone(),
            description: Some(setor.descricao.clone()),
            emoji: resolve_emoji(&setor.emoji),
        });
    }

    OutboundMessage::embed(embed).with_components(vec![ActionRow::new(vec![menu.into_component()])])
}

fn render_button_panel(panel_id: &str, panel: &PanelConfig) -> OutboundMessage {
    let custom = &panel.customization;
    let default_title = format!("**{}**", panel.name);
    let mut embed = Embed::new()
        .color(custom.color.unwrap_or(0x0099ff))
        .timestamp_now();
    if let Some(title) = custom.title.resolve(&default_title) {
        embed = embed.title(title);
    }
    if let Some(description) = custom.description.resolve(BUTTONS_DESCRIPTION) {
        embed = embed.description(description);
    }
    if let Some(image) = custom.image.resolve(PANEL_IMAGE) {
        if is_valid_url(&image) {
            embed = embed.image(image);
        }
    }
    if let Some(thumbnail) = custom.thumbnail.resolve("") {
        if is_valid_url(&thumbnail) {
            embed = embed.thumbnail(thumbnail);
        }
    }
    if let Some(footer) = custom.footer.resolve(STORE_FOOTER) {
        embed = embed.footer(footer);
    }

    let buttons: Vec<Component> = panel
        .custom_buttons
        .iter()
        .map(|btn| {
            let mut button = Button::new(
                ButtonStyle::from_name(&btn.style),
                create_safe_custom_id(panel_id, &btn.label),
                &btn.label,
            );
            if let Some(emoji) = resolve_emoji(&btn.emoji) {
                button = button.emoji(emoji);
            }
            button.into_component()
        })
        .collect();
    let rows: Vec<Component> = buttons
        .chunks(5)
        .map(|chunk| ActionRow::new(chunk.to_vec()))
        .collect();

    OutboundMessage::embed(embed).with_components(rows)
}

/// The action row pinned under every ticket control message.
pub fn control_row() -> Component {
    ActionRow::new(vec![
        Button::new(ButtonStyle::Danger, "fechar_ticket", "Fechar")
            .emoji(unicode("🗑️"))
            .into_component(),
        Button::new(ButtonStyle::Secondary, "reivindicar_ticket", "Reivindicar")
            .emoji(unicode("🙋"))
            .into_component(),
        Button::new(ButtonStyle::Secondary, "arquivar_ticket", "Arquivar Ticket")
            .emoji(unicode("📁"))
            .into_component(),
        Button::emoji_only(ButtonStyle::Secondary, "ticket_settings", unicode("⚙️"))
            .into_component(),
    ])
}

pub fn role_mentions(role_ids: &[String]) -> String {
    role_ids
        .iter()
        .map(|id| format!("<@&{}>", id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First message inside a fresh ticket channel. `mentions` is the support
/// role mention string, empty when the panel has no roles configured.
pub fn control_message(
    opener_id: &str,
    reason: &str,
    mentions: &str,
    footer: &str,
) -> OutboundMessage {
    let content = if mentions.is_empty() {
        format!("<@{}>", opener_id)
    } else {
        format!("<@{}> {}", opener_id, mentions)
    };
    let embed = Embed::new()
        .title(CONTROL_TITLE)
        .description(
            "Aguarde a chegada da equipe de suporte para dar continuidade ao atendimento. \
             Enquanto isso, aproveite para nos fornecer mais detalhes sobre o que você precisa.",
        )
        .field("👤 Usuário", format!("<@{}> 🎲", opener_id), false)
        .field("📄 Motivo", reason, false)
        .field(STAFF_FIELD_NAME, UNCLAIMED_STAFF, false)
        .color(0x5865f2)
        .footer(footer)
        .timestamp_now();
    OutboundMessage::text(content)
        .with_embed(embed)
        .with_components(vec![control_row()])
}

/// Ephemeral confirmation shown to the opener, with a jump link.
pub fn creation_reply(guild_id: &str, channel_id: &str) -> OutboundMessage {
    let url = format!("https://discord.com/channels/{}/{}", guild_id, channel_id);
    let button = Button::link(url, "Go to Ticket").emoji(unicode("🔗"));
    OutboundMessage::text("✅ Your ticket has been created!")
        .with_components(vec![ActionRow::new(vec![button.into_component()])])
}

/// `reason_label` is "Categoria" for button panels and "Setor" for select panels.
pub fn open_log(
    opener_id: &str,
    opener_tag: &str,
    panel_name: &str,
    reason_label: &str,
    reason: &str,
    channel_id: &str,
    unix: i64,
) -> Embed {
    Embed::new()
        .title("📂 Ticket Aberto")
        .description(format!(
            "**Usuário:** <@{}> ({})\n**ID:** {}\n**Painel:** {}\n**{}:** {}\n**Canal:** <#{}>\n**Horário:** <t:{}:F>",
            opener_id, opener_tag, opener_id, panel_name, reason_label, reason, channel_id, unix
        ))
        .color(0x00ff00)
        .footer(STORE_FOOTER)
        .timestamp_now()
}

pub fn claim_notice(actor_id: &str) -> Embed {
    Embed::new()
        .title("✋ Ticket Reivindicado")
        .description(format!(
            "Este ticket foi reivindicado por <@{}>.\n\nEle será responsável pelo atendimento.",
            actor_id
        ))
        .color(0xffd700)
        .footer(STORE_FOOTER)
        .timestamp_now()
}

pub fn archive_notice(actor_id: &str) -> Embed {
    Embed::new()
        .title("📁 Ticket Arquivado")
        .description(format!(
            "Ticket arquivado por <@{}>.\n\nEste canal será arquivado.",
            actor_id
        ))
        .color(0x95a5a6)
        .footer(STORE_FOOTER)
        .timestamp_now()
}

pub fn close_notice(actor_id: &str) -> Embed {
    Embed::new()
        .title("🔒 Ticket Fechado")
        .description(format!(
            "Ticket fechado por <@{}>.\n\nEste canal será deletado em 5 segundos...",
            actor_id
        ))
        .color(0xff0000)
        .footer(STORE_FOOTER)
        .timestamp_now()
}

/// DM sent to the opener when the ticket closes, with the transcript button.
pub fn close_dm(
    actor_id: &str,
    reason: &str,
    ticket_name: &str,
    server_name: &str,
    channel_id: &str,
) -> OutboundMessage {
    let embed = Embed::new()
        .title("Ticket Fechado")
        .description(format!("Este ticket foi fechado por <@{}>.", actor_id))
        .field("Motivo", reason, false)
        .field("Nome do Ticket", ticket_name, false)
        .field("Servidor", server_name, false)
        .color(0x5865f2)
        .timestamp_now();
    let button = Button::new(
        ButtonStyle::Secondary,
        format!("view_transcript:{}", channel_id),
        "Ver Transcrição",
    )
    .emoji(unicode("📄"));
    OutboundMessage::embed(embed)
        .with_components(vec![ActionRow::new(vec![button.into_component()])])
}

pub fn close_log(
    ticket_username: &str,
    actor_id: &str,
    actor_tag: &str,
    channel_name: &str,
    unix: i64,
) -> Embed {
    Embed::new()
        .title("🔒 Ticket Fechado")
        .description(format!(
            "**Username do Ticket:** {}\n**Fechado por:** <@{}> ({})\n**Canal:** #{}\n**Horário:** <t:{}:F>",
            ticket_username, actor_id, actor_tag, channel_name, unix
        ))
        .color(0xff0000)
        .footer(STORE_FOOTER)
        .timestamp_now()
}

pub fn settings_menu() -> OutboundMessage {
    let embed = Embed::new()
        .title("⚙️ Configurações do Ticket")
        .description(format!(
            "Selecione uma ação abaixo:\n\nHoje às {}",
            Local::now().format("%H:%M")
        ))
        .color(0x5865f2)
        .timestamp_now();
    let row = ActionRow::new(vec![
        Button::new(ButtonStyle::Secondary, "ticket_notify_user", "Notificar Usuário")
            .emoji(unicode("📧"))
            .into_component(),
        Button::new(ButtonStyle::Secondary, "ticket_notify_staff", "Notificar Staff")
            .emoji(unicode("🔔"))
            .into_component(),
        Button::new(ButtonStyle::Secondary, "ticket_unclaim", "Desistir do Ticket")
            .emoji(unicode("🚫"))
            .into_component(),
    ]);
    OutboundMessage::embed(embed).with_components(vec![row])
}

pub fn notify_user_modal() -> InteractionResponse {
    let input = TextInput::paragraph(
        "notify_message",
        "Mensagem para enviar ao usuário",
        "Digite a mensagem que será enviada por DM ao criador do ticket...",
        2000,
    );
    InteractionResponse::modal(
        "modal_notify_user",
        "Notificar Usuário",
        vec![ActionRow::new(vec![input.into_component()])],
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    Add,
    Remove,
}

/// One button per member, five per row, at most five rows.
pub fn member_picker(action: PickerAction, users: &[UserData]) -> OutboundMessage {
    let (title, description, color, prefix, style) = match action {
        PickerAction::Add => (
            "➕ Adicionar Usuário ao Ticket",
            "Clique no botão do usuário que deseja adicionar:",
            0x00ff00,
            "add_user_",
            ButtonStyle::Success,
        ),
        PickerAction::Remove => (
            "➖ Remover Usuário do Ticket",
            "Clique no botão do usuário que deseja remover:",
            0xff0000,
            "remove_user_",
            ButtonStyle::Danger,
        ),
    };
    let buttons: Vec<Component> = users
        .iter()
        .map(|user| {
            let label: String = user.username.chars().take(80).collect();
            Button::new(style, format!("{}{}", prefix, user.id), label).into_component()
        })
        .collect();
    let rows: Vec<Component> = buttons
        .chunks(5)
        .take(5)
        .map(|chunk| ActionRow::new(chunk.to_vec()))
        .collect();
    let embed = Embed::new()
        .title(title)
        .description(description)
        .color(color)
        .timestamp_now();
    OutboundMessage::embed(embed).with_components(rows)
}

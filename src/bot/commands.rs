//! Slash command surface: registration payload and the 26 handlers.

use log::{error, info, warn};
use serde_json::{json, Value};

use crate::bot::error::BotError;
use crate::bot::events::Interaction;
use crate::bot::TicketBot;
use crate::channels::{
    Embed, InteractionResponse, OutboundMessage, PermissionOverwrite, UserData, ADMINISTRATOR,
    MANAGE_CHANNELS, READ_MESSAGE_HISTORY, SEND_MESSAGES, VIEW_CHANNEL,
};
use crate::panels::{CustomButton, CustomField, PanelKind, PanelStore, Sector};
use crate::shared::utils::{
    create_safe_custom_id, is_valid_emoji, is_valid_url, parse_color, sanitize_panel_id,
    validate_button_label, validate_custom_id, validate_select_menu_option,
};
use crate::tickets::ui;

const ADMIN_ONLY: &str = "❌ Você precisa ser um administrador!";
const ADMIN_ONLY_COMMAND: &str = "❌ Você precisa ser um administrador para usar este comando!";
const INVALID_EMOJI: &str =
    "❌ Emoji inválido! Use um emoji Unicode válido (🎫) ou personalizado (<:nome:id>).";
const INVALID_URL: &str = "❌ URL inválida! Use uma URL válida começando com http:// ou https://.";
const TICKET_CHANNEL_ONLY: &str = "❌ Este comando só pode ser usado em canais de ticket!";
const NO_SELECTION: &str =
    "❌ Você precisa selecionar um painel primeiro! Use `/selecionar_painel` ou `/criar_painel`.";
const STALE_SELECTION: &str = "❌ O painel selecionado não existe mais! Use `/selecionar_painel`.";
const MISSING_CONTEXT: &str = "❌ Erro ao processar a interação!";

/// Commands that operate on the actor's currently selected panel.
const REQUIRES_PANEL: &[&str] = &[
    "setup",
    "logs",
    "add_cargo",
    "remove_cargo",
    "list_cargos",
    "add_button",
    "remove_button",
    "list_buttons",
    "add_setor",
    "remove_setor",
    "list_setores",
    "edit_titulo",
    "edit_descricao",
    "edit_imagem",
    "edit_thumbnail",
    "edit_footer",
    "edit_color",
    "ver_personalizacao",
    "set_tipo_painel",
];

/// Registration payload for the global command PUT. Option types: 3 string,
/// 6 user, 7 channel, 8 role.
pub fn definitions() -> Value {
    json!([
        {
            "name": "criar_painel",
            "description": "Cria um novo painel de tickets",
            "options": [
                {
                    "name": "nome",
                    "description": "Nome do painel (ex: Suporte, Vendas, VIP)",
                    "type": 3,
                    "required": true
                },
                {
                    "name": "tipo",
                    "description": "Tipo de interface do painel",
                    "type": 3,
                    "required": false,
                    "choices": [
                        {"name": "Select Menu (Menu Dropdown)", "value": "select_menu"},
                        {"name": "Botões", "value": "buttons"}
                    ]
                }
            ]
        },
        {
            "name": "listar_paineis",
            "description": "Lista todos os painéis de tickets configurados"
        },
        {
            "name": "selecionar_painel",
            "description": "Seleciona qual painel deseja editar",
            "options": [
                {
                    "name": "painel",
                    "description": "ID do painel a selecionar",
                    "type": 3,
                    "required": true
                }
            ]
        },
        {
            "name": "enviar_painel",
            "description": "Envia um painel de tickets no canal atual",
            "options": [
                {
                    "name": "painel",
                    "description": "ID do painel a enviar",
                    "type": 3,
                    "required": true
                }
            ]
        },
        {
            "name": "deletar_painel",
            "description": "Deleta um painel de tickets",
            "options": [
                {
                    "name": "painel",
                    "description": "ID do painel a deletar",
                    "type": 3,
                    "required": true
                }
            ]
        },
        {
            "name": "setup",
            "description": "Configura o painel selecionado (cargo de suporte e categoria)",
            "options": [
                {
                    "name": "cargo",
                    "description": "Cargo que terá acesso aos tickets",
                    "type": 8,
                    "required": true
                },
                {
                    "name": "categoria",
                    "description": "Categoria onde os tickets serão criados",
                    "type": 7,
                    "required": true,
                    "channel_types": [4]
                }
            ]
        },
        {
            "name": "adduser",
            "description": "Adiciona um usuário ao ticket atual",
            "options": [
                {
                    "name": "usuario",
                    "description": "Usuário a ser adicionado ao ticket",
                    "type": 6,
                    "required": true
                }
            ]
        },
        {
            "name": "remove_user",
            "description": "Remove um usuário do ticket atual",
            "options": [
                {
                    "name": "usuario",
                    "description": "Usuário a ser removido do ticket",
                    "type": 6,
                    "required": true
                }
            ]
        },
        {
            "name": "logs",
            "description": "Configura o canal de logs do painel selecionado",
            "options": [
                {
                    "name": "canal",
                    "description": "Canal onde os logs serão enviados",
                    "type": 7,
                    "required": true,
                    "channel_types": [0]
                }
            ]
        },
        {
            "name": "add_cargo",
            "description": "Adiciona um cargo de suporte ao painel selecionado",
            "options": [
                {
                    "name": "cargo",
                    "description": "Cargo que terá acesso aos tickets",
                    "type": 8,
                    "required": true
                }
            ]
        },
        {
            "name": "remove_cargo",
            "description": "Remove um cargo de suporte do painel selecionado",
            "options": [
                {
                    "name": "cargo",
                    "description": "Cargo a ser removido",
                    "type": 8,
                    "required": true
                }
            ]
        },
        {
            "name": "list_cargos",
            "description": "Lista todos os cargos de suporte do painel selecionado"
        },
        {
            "name": "add_button",
            "description": "Adiciona um botão personalizado ao painel selecionado",
            "options": [
                {
                    "name": "label",
                    "description": "Texto que aparece no botão",
                    "type": 3,
                    "required": true
                },
                {
                    "name": "emoji",
                    "description": "Emoji do botão (ex: 🎫 ou <:nome:id>)",
                    "type": 3,
                    "required": false
                },
                {
                    "name": "cor",
                    "description": "Cor do botão",
                    "type": 3,
                    "required": false,
                    "choices": [
                        {"name": "Azul", "value": "Primary"},
                        {"name": "Cinza", "value": "Secondary"},
                        {"name": "Verde", "value": "Success"},
                        {"name": "Vermelho", "value": "Danger"}
                    ]
                }
            ]
        },
        {
            "name": "remove_button",
            "description": "Remove um botão do painel selecionado",
            "options": [
                {
                    "name": "label",
                    "description": "Label do botão a ser removido",
                    "type": 3,
                    "required": true
                }
            ]
        },
        {
            "name": "list_buttons",
            "description": "Lista todos os botões do painel selecionado"
        },
        {
            "name": "add_setor",
            "description": "Adiciona um setor ao painel selecionado",
            "options": [
                {
                    "name": "nome",
                    "description": "Nome do setor (ex: Suporte, Vendas, Financeiro)",
                    "type": 3,
                    "required": true
                },
                {
                    "name": "descricao",
                    "description": "Descrição do setor",
                    "type": 3,
                    "required": true
                },
                {
                    "name": "emoji",
                    "description": "Emoji do setor",
                    "type": 3,
                    "required": false
                }
            ]
        },
        {
            "name": "remove_setor",
            "description": "Remove um setor do painel selecionado",
            "options": [
                {
                    "name": "nome",
                    "description": "Nome do setor a ser removido",
                    "type": 3,
                    "required": true
                }
            ]
        },
        {
            "name": "list_setores",
            "description": "Lista todos os setores do painel selecionado"
        },
        {
            "name": "edit_titulo",
            "description": "Edita o título do painel selecionado (deixe vazio para remover)",
            "options": [
                {
                    "name": "titulo",
                    "description": "Novo título do painel (deixe vazio para remover)",
                    "type": 3,
                    "required": false
                }
            ]
        },
        {
            "name": "edit_descricao",
            "description": "Edita a descrição do painel selecionado (deixe vazio para remover)",
            "options": [
                {
                    "name": "descricao",
                    "description": "Nova descrição do painel (deixe vazio para remover)",
                    "type": 3,
                    "required": false
                }
            ]
        },
        {
            "name": "edit_imagem",
            "description": "Edita a imagem (banner) do painel selecionado",
            "options": [
                {
                    "name": "url",
                    "description": "URL da imagem (deixe vazio para remover)",
                    "type": 3,
                    "required": false
                }
            ]
        },
        {
            "name": "edit_thumbnail",
            "description": "Edita a thumbnail (miniatura) do painel selecionado",
            "options": [
                {
                    "name": "url",
                    "description": "URL da thumbnail (deixe vazio para remover)",
                    "type": 3,
                    "required": false
                }
            ]
        },
        {
            "name": "edit_footer",
            "description": "Edita o rodapé do painel selecionado",
            "options": [
                {
                    "name": "texto",
                    "description": "Texto do rodapé (deixe vazio para remover)",
                    "type": 3,
                    "required": false
                }
            ]
        },
        {
            "name": "edit_color",
            "description": "Edita a cor da borda do embed do painel selecionado",
            "options": [
                {
                    "name": "cor",
                    "description": "Cor em hexadecimal (ex: #0099FF) ou nome de cor",
                    "type": 3,
                    "required": true
                }
            ]
        },
        {
            "name": "ver_personalizacao",
            "description": "Visualiza as configurações de personalização do painel selecionado"
        },
        {
            "name": "set_tipo_painel",
            "description": "Define o tipo de interface do painel (select menu ou botões)",
            "options": [
                {
                    "name": "tipo",
                    "description": "Tipo de interface",
                    "type": 3,
                    "required": true,
                    "choices": [
                        {"name": "Select Menu (Menu Dropdown)", "value": "select_menu"},
                        {"name": "Botões", "value": "buttons"}
                    ]
                }
            ]
        }
    ])
}

pub async fn handle(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    let name = interaction.command_name().to_string();
    if REQUIRES_PANEL.contains(&name.as_str()) {
        let panel_id = require_selected_panel(bot, interaction)?;
        return panel_command(bot, interaction, &name, &panel_id).await;
    }
    match name.as_str() {
        "criar_painel" => criar_painel(bot, interaction),
        "listar_paineis" => listar_paineis(bot, interaction),
        "selecionar_painel" => selecionar_painel(bot, interaction),
        "enviar_painel" => enviar_painel(bot, interaction).await,
        "deletar_painel" => deletar_painel(bot, interaction),
        "adduser" => adduser(bot, interaction).await,
        "remove_user" => remove_user(bot, interaction).await,
        other => {
            warn!("unhandled command: {}", other);
            Err(BotError::Validation(MISSING_CONTEXT.to_string()))
        }
    }
}

async fn panel_command(
    bot: &mut TicketBot,
    interaction: &Interaction,
    name: &str,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    match name {
        "setup" => setup(bot, interaction, panel_id),
        "logs" => logs(bot, interaction, panel_id),
        "add_cargo" => add_cargo(bot, interaction, panel_id),
        "remove_cargo" => remove_cargo(bot, interaction, panel_id),
        "list_cargos" => list_cargos(bot, interaction, panel_id).await,
        "add_button" => add_button(bot, interaction, panel_id),
        "remove_button" => remove_button(bot, interaction, panel_id),
        "list_buttons" => list_buttons(bot, panel_id, interaction),
        "add_setor" => add_setor(bot, interaction, panel_id),
        "remove_setor" => remove_setor(bot, interaction, panel_id),
        "list_setores" => list_setores(bot, panel_id, interaction),
        "edit_titulo" => edit_titulo(bot, interaction, panel_id),
        "edit_descricao" => edit_descricao(bot, interaction, panel_id),
        "edit_imagem" => edit_imagem(bot, interaction, panel_id),
        "edit_thumbnail" => edit_thumbnail(bot, interaction, panel_id),
        "edit_footer" => edit_footer(bot, interaction, panel_id),
        "edit_color" => edit_color(bot, interaction, panel_id),
        "ver_personalizacao" => ver_personalizacao(bot, interaction, panel_id),
        "set_tipo_painel" => set_tipo_painel(bot, interaction, panel_id),
        other => {
            warn!("unhandled panel command: {}", other);
            Err(BotError::Validation(MISSING_CONTEXT.to_string()))
        }
    }
}

fn actor_of<'a>(interaction: &'a Interaction) -> Result<&'a UserData, BotError> {
    interaction
        .actor()
        .ok_or_else(|| BotError::Validation(MISSING_CONTEXT.to_string()))
}

fn guild_of(interaction: &Interaction) -> Result<&str, BotError> {
    interaction
        .guild_id
        .as_deref()
        .ok_or_else(|| BotError::Validation(MISSING_CONTEXT.to_string()))
}

fn channel_of(interaction: &Interaction) -> Result<&str, BotError> {
    interaction
        .channel_id
        .as_deref()
        .ok_or_else(|| BotError::Validation(MISSING_CONTEXT.to_string()))
}

fn required_str<'a>(interaction: &'a Interaction, name: &str) -> Result<&'a str, BotError> {
    interaction
        .option_str(name)
        .ok_or_else(|| BotError::Validation(MISSING_CONTEXT.to_string()))
}

fn require_permission(interaction: &Interaction, bit: u64, message: &str) -> Result<(), BotError> {
    let allowed = interaction
        .member
        .as_ref()
        .map(|member| member.has_permission(bit))
        .unwrap_or(false);
    if allowed {
        Ok(())
    } else {
        Err(BotError::Authorization(message.to_string()))
    }
}

/// Resolves the actor's selected panel and checks it still exists.
fn require_selected_panel(
    bot: &TicketBot,
    interaction: &Interaction,
) -> Result<String, BotError> {
    let guild_id = guild_of(interaction)?;
    let user = actor_of(interaction)?;
    let panel_id = bot
        .selections
        .selected(guild_id, &user.id)
        .ok_or_else(|| BotError::Validation(NO_SELECTION.to_string()))?;
    if bot.store.panel(guild_id, panel_id).is_none() {
        return Err(BotError::Validation(STALE_SELECTION.to_string()));
    }
    Ok(panel_id.to_string())
}

fn panel_entry<'a>(
    store: &'a mut PanelStore,
    guild_id: &str,
    panel_id: &str,
) -> Result<&'a mut crate::panels::PanelConfig, BotError> {
    store
        .panel_mut(guild_id, panel_id)
        .ok_or_else(|| BotError::Validation(STALE_SELECTION.to_string()))
}

fn store_embed(title: &str, description: String, color: u32) -> Embed {
    Embed::new()
        .title(title)
        .description(description)
        .color(color)
        .footer(ui::STORE_FOOTER)
        .timestamp_now()
}

fn ephemeral_embed(embed: Embed) -> InteractionResponse {
    InteractionResponse::ephemeral(OutboundMessage::embed(embed))
}

fn kind_label(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::SelectMenu => "Select Menu (Dropdown)",
        PanelKind::Buttons => "Botões",
    }
}

fn criar_painel(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY_COMMAND)?;
    let nome = required_str(interaction, "nome")?.to_string();
    let kind = match interaction.option_str("tipo") {
        Some("buttons") => PanelKind::Buttons,
        _ => PanelKind::SelectMenu,
    };
    let guild_id = guild_of(interaction)?.to_string();
    let user_id = actor_of(interaction)?.id.clone();
    let panel_id = sanitize_panel_id(&nome);

    let panel = crate::panels::PanelConfig::new(&nome, kind);
    if !bot.store.create_panel(&guild_id, &panel_id, panel) {
        return Err(BotError::Validation(
            "❌ Já existe um painel com esse nome!".to_string(),
        ));
    }
    bot.store.save()?;
    bot.selections.select(&guild_id, &user_id, &panel_id);
    info!("panel {} created in guild {}", panel_id, guild_id);

    Ok(ephemeral_embed(store_embed(
        "✅ Painel Criado!",
        format!(
            "**Painel de tickets criado com sucesso!**\n\n📋 **Nome:** {}\n🆔 **ID:** `{}`\n🎛️ **Tipo:** {}\n\n✨ Este painel foi automaticamente selecionado. Use `/setup` para configurá-lo.",
            nome,
            panel_id,
            kind_label(kind)
        ),
        0x00ff00,
    )))
}

fn listar_paineis(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    let guild_id = guild_of(interaction)?;
    let user_id = &actor_of(interaction)?.id;
    let panels = bot
        .store
        .guild(guild_id)
        .map(|guild| &guild.panels)
        .filter(|panels| !panels.is_empty())
        .ok_or_else(|| {
            BotError::Validation(
                "❌ Nenhum painel configurado ainda! Use `/criar_painel` para criar um.".to_string(),
            )
        })?;

    let selected = bot.selections.selected(guild_id, user_id);
    let lines = panels
        .iter()
        .map(|(id, panel)| {
            let marker = if selected == Some(id.as_str()) { "✅ " } else { "" };
            let configured = if panel.is_configured() { "✓" } else { "⚠️" };
            format!(
                "{}**{}** {}\n└ ID: `{}` | Setores: {}",
                marker,
                panel.name,
                configured,
                id,
                panel.setores.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let embed = Embed::new()
        .title("📋 Painéis de Tickets Configurados")
        .description(format!(
            "{}\n\n✅ = Selecionado | ✓ = Configurado | ⚠️ = Não configurado",
            lines
        ))
        .color(0x0099ff)
        .footer("Use /selecionar_painel para escolher um painel")
        .timestamp_now();
    Ok(ephemeral_embed(embed))
}

fn selecionar_painel(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    let panel_id = required_str(interaction, "painel")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();
    let user_id = actor_of(interaction)?.id.clone();

    let panel_name = bot
        .store
        .panel(&guild_id, &panel_id)
        .map(|panel| panel.name.clone())
        .ok_or_else(|| {
            BotError::Validation(
                "❌ Painel não encontrado! Use `/listar_paineis` para ver os disponíveis."
                    .to_string(),
            )
        })?;
    bot.selections.select(&guild_id, &user_id, &panel_id);

    Ok(ephemeral_embed(store_embed(
        "✅ Painel Selecionado!",
        format!(
            "Você agora está editando: **{}**\n\nTodos os comandos de configuração serão aplicados a este painel.",
            panel_name
        ),
        0x00ff00,
    )))
}

async fn enviar_painel(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    require_permission(
        interaction,
        MANAGE_CHANNELS,
        "❌ Você não tem permissão para usar este comando!",
    )?;
    let panel_id = required_str(interaction, "painel")?;
    let guild_id = guild_of(interaction)?;
    let channel_id = channel_of(interaction)?;

    let panel = bot
        .store
        .panel(guild_id, panel_id)
        .ok_or_else(|| BotError::Validation("❌ Painel não encontrado!".to_string()))?;
    match panel.kind {
        PanelKind::SelectMenu if panel.setores.is_empty() => {
            return Err(BotError::Validation(
                "❌ Este painel não tem setores configurados! Use `/selecionar_painel` e depois `/add_setor`.".to_string(),
            ));
        }
        PanelKind::Buttons if panel.custom_buttons.is_empty() => {
            return Err(BotError::Validation(
                "❌ Este painel não tem botões configurados! Use `/selecionar_painel` e depois `/add_button`.".to_string(),
            ));
        }
        _ => {}
    }

    let message = ui::render_panel(panel_id, panel);
    match bot.provider.send_message(channel_id, &message).await {
        Ok(_) => Ok(InteractionResponse::ephemeral(OutboundMessage::text(
            "✅ Painel de tickets enviado!",
        ))),
        Err(err) => {
            error!("failed to post panel {} in {}: {}", panel_id, channel_id, err);
            Ok(InteractionResponse::ephemeral(OutboundMessage::text(
                format!("❌ Erro ao enviar painel: {}", err),
            )))
        }
    }
}

fn deletar_painel(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let panel_id = required_str(interaction, "painel")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let removed = bot
        .store
        .delete_panel(&guild_id, &panel_id)
        .ok_or_else(|| BotError::Validation("❌ Painel não encontrado!".to_string()))?;
    bot.store.save()?;
    bot.selections.purge_panel(&guild_id, &panel_id);
    info!("panel {} deleted in guild {}", panel_id, guild_id);

    Ok(ephemeral_embed(store_embed(
        "🗑️ Painel Deletado!",
        format!("O painel **{}** foi removido.", removed.name),
        0xff6b6b,
    )))
}

fn setup(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let cargo = required_str(interaction, "cargo")?.to_string();
    let categoria = required_str(interaction, "categoria")?.to_string();
    let category_name = interaction
        .resolved_channel_name(&categoria)
        .unwrap_or(&categoria)
        .to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    panel.support_role_id = Some(cargo.clone());
    panel.category_id = Some(categoria);
    if !panel.support_roles.contains(&cargo) {
        panel.support_roles.push(cargo.clone());
    }
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "✅ Configuração Concluída!",
        format!(
            "**Painel \"{}\" configurado com sucesso!**\n\n📌 **Cargo de Suporte:** <@&{}>\n📁 **Categoria:** {}",
            panel_name, cargo, category_name
        ),
        0x00ff00,
    )))
}

fn logs(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let canal = required_str(interaction, "canal")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    panel.logs_channel_id = Some(canal.clone());
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "✅ Canal de Logs Configurado!",
        format!(
            "**Canal de logs do painel \"{}\" configurado!**\n\n📋 **Canal de Logs:** <#{}>",
            panel_name, canal
        ),
        0x00ff00,
    )))
}

fn add_cargo(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let cargo = required_str(interaction, "cargo")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.support_roles.contains(&cargo) {
        return Err(BotError::Validation(
            "❌ Este cargo já está configurado!".to_string(),
        ));
    }
    panel.support_roles.push(cargo.clone());
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "✅ Cargo Adicionado!",
        format!(
            "**Cargo adicionado ao painel \"{}\"!**\n\n📌 **Cargo:** <@&{}>",
            panel_name, cargo
        ),
        0x00ff00,
    )))
}

fn remove_cargo(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let cargo = required_str(interaction, "cargo")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.support_roles.is_empty() {
        return Err(BotError::Validation(
            "❌ Nenhum cargo configurado ainda!".to_string(),
        ));
    }
    let index = panel
        .support_roles
        .iter()
        .position(|id| *id == cargo)
        .ok_or_else(|| BotError::Validation("❌ Este cargo não está na lista!".to_string()))?;
    panel.support_roles.remove(index);
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "🗑️ Cargo Removido!",
        format!(
            "**Cargo removido do painel \"{}\"!**\n\n📌 **Cargo:** <@&{}>",
            panel_name, cargo
        ),
        0xff6b6b,
    )))
}

async fn list_cargos(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    let guild_id = guild_of(interaction)?.to_string();
    let (panel_name, support_roles) = {
        let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
        (panel.name.clone(), panel.support_roles.clone())
    };
    if support_roles.is_empty() {
        return Err(BotError::Validation(
            "❌ Nenhum cargo de suporte configurado!".to_string(),
        ));
    }

    let guild_roles = bot.provider.get_guild_roles(&guild_id).await?;
    let lines = support_roles
        .iter()
        .map(|role_id| {
            if guild_roles.iter().any(|role| role.id == *role_id) {
                format!("• <@&{}>", role_id)
            } else {
                format!("• ID: {} (cargo não encontrado)", role_id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ephemeral_embed(store_embed(
        &format!("📋 Cargos - {}", panel_name),
        lines,
        0x0099ff,
    )))
}

fn add_button(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let label = required_str(interaction, "label")?.to_string();
    let emoji = interaction.option_str("emoji").map(str::to_string);
    let cor = interaction.option_str("cor").unwrap_or("Primary").to_string();
    let guild_id = guild_of(interaction)?.to_string();

    if let Err(message) = validate_button_label(&label) {
        return Err(BotError::Validation(format!("❌ {}", message)));
    }
    let custom_id = create_safe_custom_id(panel_id, &label);
    if validate_custom_id(&custom_id).is_err() {
        return Err(BotError::Validation(format!(
            "❌ O label é muito longo! O ID gerado ({} chars) excede o limite de 100 caracteres. Use um label mais curto.",
            custom_id.chars().count()
        )));
    }
    if let Some(emoji) = emoji.as_deref() {
        if !is_valid_emoji(emoji) {
            return Err(BotError::Validation(INVALID_EMOJI.to_string()));
        }
    }

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.custom_buttons.iter().any(|button| button.label == label) {
        return Err(BotError::Validation(
            "❌ Já existe um botão com esse label!".to_string(),
        ));
    }
    panel.custom_buttons.push(CustomButton {
        label: label.clone(),
        emoji: emoji.clone(),
        style: cor.clone(),
    });
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let emoji_line = emoji
        .as_deref()
        .filter(|e| !e.is_empty())
        .map(|e| format!("😀 **Emoji:** {}\n", e))
        .unwrap_or_default();
    Ok(ephemeral_embed(store_embed(
        "✅ Botão Adicionado!",
        format!(
            "**Botão adicionado ao painel \"{}\"!**\n\n🏷️ **Label:** {}\n{}🎨 **Cor:** {}",
            panel_name, label, emoji_line, cor
        ),
        0x00ff00,
    )))
}

fn remove_button(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let label = required_str(interaction, "label")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.custom_buttons.is_empty() {
        return Err(BotError::Validation(
            "❌ Nenhum botão configurado ainda!".to_string(),
        ));
    }
    let index = panel
        .custom_buttons
        .iter()
        .position(|button| button.label == label)
        .ok_or_else(|| BotError::Validation("❌ Botão não encontrado!".to_string()))?;
    panel.custom_buttons.remove(index);
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "🗑️ Botão Removido!",
        format!(
            "**Botão removido do painel \"{}\"!**\n\n🏷️ **Label:** {}",
            panel_name, label
        ),
        0xff6b6b,
    )))
}

fn list_buttons(
    bot: &mut TicketBot,
    panel_id: &str,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    let guild_id = guild_of(interaction)?.to_string();
    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.custom_buttons.is_empty() {
        return Err(BotError::Validation(
            "❌ Nenhum botão personalizado configurado!".to_string(),
        ));
    }
    let lines = panel
        .custom_buttons
        .iter()
        .enumerate()
        .map(|(i, button)| {
            format!(
                "{}. **{}** {} - Cor: {}",
                i + 1,
                button.label,
                button.emoji.as_deref().unwrap_or(""),
                button.style
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let title = format!("🔘 Botões - {}", panel.name);

    Ok(ephemeral_embed(store_embed(&title, lines, 0x0099ff)))
}

fn add_setor(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let nome = required_str(interaction, "nome")?.to_string();
    let descricao = required_str(interaction, "descricao")?.to_string();
    let emoji = interaction.option_str("emoji").map(str::to_string);
    let guild_id = guild_of(interaction)?.to_string();

    if let Err(message) = validate_select_menu_option(&nome, &nome, &descricao) {
        return Err(BotError::Validation(format!("❌ {}", message)));
    }
    if let Some(emoji) = emoji.as_deref() {
        if !is_valid_emoji(emoji) {
            return Err(BotError::Validation(INVALID_EMOJI.to_string()));
        }
    }

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.setores.iter().any(|sector| sector.nome == nome) {
        return Err(BotError::Validation(
            "❌ Já existe um setor com esse nome!".to_string(),
        ));
    }
    panel.setores.push(Sector {
        nome: nome.clone(),
        descricao: descricao.clone(),
        emoji: emoji.clone(),
    });
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let emoji_line = emoji
        .as_deref()
        .filter(|e| !e.is_empty())
        .map(|e| format!("\n😀 **Emoji:** {}", e))
        .unwrap_or_default();
    Ok(ephemeral_embed(store_embed(
        "✅ Setor Adicionado!",
        format!(
            "**Setor adicionado ao painel \"{}\"!**\n\n📌 **Nome:** {}\n📝 **Descrição:** {}{}",
            panel_name, nome, descricao, emoji_line
        ),
        0x00ff00,
    )))
}

fn remove_setor(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let nome = required_str(interaction, "nome")?.to_string();
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.setores.is_empty() {
        return Err(BotError::Validation(
            "❌ Nenhum setor configurado ainda!".to_string(),
        ));
    }
    let index = panel
        .setores
        .iter()
        .position(|sector| sector.nome == nome)
        .ok_or_else(|| BotError::Validation("❌ Setor não encontrado!".to_string()))?;
    panel.setores.remove(index);
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "🗑️ Setor Removido!",
        format!(
            "**Setor removido do painel \"{}\"!**\n\n📌 **Nome:** {}",
            panel_name, nome
        ),
        0xff6b6b,
    )))
}

fn list_setores(
    bot: &mut TicketBot,
    panel_id: &str,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    let guild_id = guild_of(interaction)?.to_string();
    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if panel.setores.is_empty() {
        return Err(BotError::Validation(
            "❌ Nenhum setor configurado ainda!".to_string(),
        ));
    }
    let lines = panel
        .setores
        .iter()
        .enumerate()
        .map(|(i, sector)| {
            format!(
                "{}. {} **{}** - {}",
                i + 1,
                sector.emoji.as_deref().filter(|e| !e.is_empty()).unwrap_or("📌"),
                sector.nome,
                sector.descricao
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let title = format!("📂 Setores - {}", panel.name);

    Ok(ephemeral_embed(store_embed(&title, lines, 0x0099ff)))
}

fn edit_titulo(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let titulo = interaction.option_str("titulo").map(str::to_string);
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if let Some(value) = titulo.as_deref() {
        panel.customization.title = CustomField::from_input(value);
    }
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let provided = titulo.as_deref().filter(|t| !t.trim().is_empty());
    let embed = match provided {
        Some(value) => store_embed(
            "✅ Título Atualizado!",
            format!("**Novo título do painel \"{}\":**\n\n{}", panel_name, value),
            0x00ff00,
        ),
        None => store_embed(
            "🗑️ Título Removido!",
            format!(
                "**Título removido do painel \"{}\". Nenhum título será exibido.**",
                panel_name
            ),
            0xff6b6b,
        ),
    };
    Ok(ephemeral_embed(embed))
}

fn edit_descricao(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let descricao = interaction.option_str("descricao").map(str::to_string);
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if let Some(value) = descricao.as_deref() {
        panel.customization.description = CustomField::from_input(value);
    }
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let provided = descricao.as_deref().filter(|d| !d.trim().is_empty());
    let embed = match provided {
        Some(value) => store_embed(
            "✅ Descrição Atualizada!",
            format!(
                "**Nova descrição configurada para o painel \"{}\"!**\n\n{}",
                panel_name, value
            ),
            0x00ff00,
        ),
        None => store_embed(
            "🗑️ Descrição Removida!",
            format!(
                "**Descrição removida do painel \"{}\". Nenhuma descrição será exibida.**",
                panel_name
            ),
            0xff6b6b,
        ),
    };
    Ok(ephemeral_embed(embed))
}

fn edit_imagem(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let url = interaction.option_str("url").map(str::to_string);
    if let Some(url) = url.as_deref() {
        if !url.trim().is_empty() && !is_valid_url(url) {
            return Err(BotError::Validation(INVALID_URL.to_string()));
        }
    }
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if let Some(value) = url.as_deref() {
        panel.customization.image = CustomField::from_input(value);
    }
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let provided = url.as_deref().filter(|u| !u.trim().is_empty());
    let embed = match provided {
        Some(value) => store_embed(
            "✅ Imagem Atualizada!",
            format!(
                "**Imagem do painel \"{}\" atualizada!**\n\n📷 URL: {}",
                panel_name, value
            ),
            0x00ff00,
        ),
        None => store_embed(
            "🗑️ Imagem Removida!",
            format!(
                "**Imagem removida do painel \"{}\". Nenhuma imagem será exibida.**",
                panel_name
            ),
            0xff6b6b,
        ),
    };
    Ok(ephemeral_embed(embed))
}

fn edit_thumbnail(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let url = interaction.option_str("url").map(str::to_string);
    if let Some(url) = url.as_deref() {
        if !url.trim().is_empty() && !is_valid_url(url) {
            return Err(BotError::Validation(INVALID_URL.to_string()));
        }
    }
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if let Some(value) = url.as_deref() {
        panel.customization.thumbnail = CustomField::from_input(value);
    }
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let provided = url.as_deref().filter(|u| !u.trim().is_empty());
    let embed = match provided {
        Some(value) => store_embed(
            "✅ Thumbnail Atualizada!",
            format!(
                "**Thumbnail do painel \"{}\" atualizada!**\n\n📷 URL: {}",
                panel_name, value
            ),
            0x00ff00,
        ),
        None => store_embed(
            "🗑️ Thumbnail Removida!",
            format!(
                "**Thumbnail removida do painel \"{}\". Nenhuma thumbnail será exibida.**",
                panel_name
            ),
            0xff6b6b,
        ),
    };
    Ok(ephemeral_embed(embed))
}

fn edit_footer(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let texto = interaction.option_str("texto").map(str::to_string);
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    if let Some(value) = texto.as_deref() {
        panel.customization.footer = CustomField::from_input(value);
    }
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let provided = texto.as_deref().filter(|t| !t.trim().is_empty());
    let embed = match provided {
        Some(value) => store_embed(
            "✅ Rodapé Atualizado!",
            format!(
                "**Rodapé do painel \"{}\" atualizado!**\n\n📝 Texto: {}",
                panel_name, value
            ),
            0x00ff00,
        ),
        None => store_embed(
            "🗑️ Rodapé Removido!",
            format!(
                "**Rodapé removido do painel \"{}\". Nenhum rodapé será exibido.**",
                panel_name
            ),
            0xff6b6b,
        ),
    };
    Ok(ephemeral_embed(embed))
}

fn edit_color(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let cor = required_str(interaction, "cor")?;
    let value = parse_color(cor).ok_or_else(|| {
        BotError::Validation(
            "❌ Cor inválida! Use formato hexadecimal (#0099FF ou 0x0099FF) ou nome de cor (vermelho, verde, azul, etc).".to_string(),
        )
    })?;
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    panel.customization.color = Some(value);
    let panel_name = panel.name.clone();
    bot.store.save()?;

    Ok(ephemeral_embed(store_embed(
        "✅ Cor Atualizada!",
        format!("**Cor da borda do painel \"{}\" atualizada!**", panel_name),
        value,
    )))
}

fn ver_personalizacao(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    let guild_id = guild_of(interaction)?.to_string();
    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    let custom = &panel.customization;

    let tipo = match panel.kind {
        PanelKind::Buttons => "Botões",
        PanelKind::SelectMenu => "Select Menu",
    };
    let descricao = if matches!(custom.description, CustomField::Value(ref s) if !s.is_empty()) {
        "Personalizada ✓"
    } else {
        "Padrão"
    };
    let cor = match custom.color {
        Some(value) => format!("#{:06X}", value),
        None => "Padrão (#0099FF)".to_string(),
    };
    let info = [
        format!("**Painel:** {}", panel.name),
        String::new(),
        format!("🎛️ **Tipo:** {}", tipo),
        format!("📝 **Título:** {}", custom.title.display_or("Padrão")),
        format!("📄 **Descrição:** {}", descricao),
        format!("🎨 **Cor:** {}", cor),
        format!("🖼️ **Imagem:** {}", custom.image.display_or("Padrão")),
        format!("🖼️ **Thumbnail:** {}", custom.thumbnail.display_or("Nenhuma")),
        format!(
            "📌 **Rodapé:** {}",
            custom.footer.display_or("Padrão (Powered by 7M Store)")
        ),
    ]
    .join("\n");

    let mut embed = store_embed(
        "🎨 Personalização do Painel",
        info,
        custom.color.unwrap_or(0x0099ff),
    );
    if let CustomField::Value(url) = &custom.thumbnail {
        if !url.is_empty() && is_valid_url(url) {
            embed = embed.thumbnail(url.clone());
        }
    }
    Ok(ephemeral_embed(embed))
}

fn set_tipo_painel(
    bot: &mut TicketBot,
    interaction: &Interaction,
    panel_id: &str,
) -> Result<InteractionResponse, BotError> {
    require_permission(interaction, ADMINISTRATOR, ADMIN_ONLY)?;
    let kind = match required_str(interaction, "tipo")? {
        "buttons" => PanelKind::Buttons,
        _ => PanelKind::SelectMenu,
    };
    let guild_id = guild_of(interaction)?.to_string();

    let panel = panel_entry(&mut bot.store, &guild_id, panel_id)?;
    panel.kind = kind;
    let panel_name = panel.name.clone();
    bot.store.save()?;

    let hint = match kind {
        PanelKind::Buttons => "💡 Use `/add_button` para adicionar botões personalizados!",
        PanelKind::SelectMenu => "💡 Use `/add_setor` para adicionar opções ao menu!",
    };
    Ok(ephemeral_embed(store_embed(
        "✅ Tipo de Painel Atualizado!",
        format!(
            "**O painel \"{}\" agora usa:** {}\n\n{}",
            panel_name,
            kind_label(kind),
            hint
        ),
        0x00ff00,
    )))
}

async fn adduser(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    if !interaction.in_ticket_channel() {
        return Err(BotError::Validation(TICKET_CHANNEL_ONLY.to_string()));
    }
    let user_id = required_str(interaction, "usuario")?.to_string();
    let channel_id = channel_of(interaction)?.to_string();
    let actor = actor_of(interaction)?.clone();

    let overwrite = PermissionOverwrite::member(
        &user_id,
        VIEW_CHANNEL | SEND_MESSAGES | READ_MESSAGE_HISTORY,
        0,
    );
    if let Err(err) = bot.provider.edit_channel_permission(&channel_id, &overwrite).await {
        error!("failed to add user {} to {}: {}", user_id, channel_id, err);
        return Err(BotError::Validation(
            "❌ Erro ao adicionar o usuário. Verifique as permissões do bot.".to_string(),
        ));
    }
    info!(
        "user {} added to {} by {}",
        user_id,
        interaction.channel_name(),
        actor.tag()
    );

    // visible to the whole channel
    Ok(InteractionResponse::reply(OutboundMessage::embed(
        store_embed(
            "✅ Usuário Adicionado",
            format!("<@{}> foi adicionado ao ticket por <@{}>.", user_id, actor.id),
            0x00ff00,
        ),
    )))
}

async fn remove_user(
    bot: &mut TicketBot,
    interaction: &Interaction,
) -> Result<InteractionResponse, BotError> {
    if !interaction.in_ticket_channel() {
        return Err(BotError::Validation(TICKET_CHANNEL_ONLY.to_string()));
    }
    let user_id = required_str(interaction, "usuario")?.to_string();
    let channel_id = channel_of(interaction)?.to_string();
    let actor = actor_of(interaction)?.clone();

    if let Err(err) = bot
        .provider
        .delete_channel_permission(&channel_id, &user_id)
        .await
    {
        error!("failed to remove user {} from {}: {}", user_id, channel_id, err);
        return Err(BotError::Validation(
            "❌ Erro ao remover o usuário. Verifique as permissões do bot.".to_string(),
        ));
    }
    info!(
        "user {} removed from {} by {}",
        user_id,
        interaction.channel_name(),
        actor.tag()
    );

    Ok(InteractionResponse::reply(OutboundMessage::embed(
        store_embed(
            "🚫 Usuário Removido",
            format!("<@{}> foi removido do ticket por <@{}>.", user_id, actor.id),
            0xff6b6b,
        ),
    )))
}

//! Plain-text transcript of a ticket channel, oldest message first.

use chrono::{DateTime, Local};
use log::error;

use crate::channels::{ChannelError, ChannelProvider, MessageData};

const RULE: &str = "═══════════════════════════════════════";
const PAGE_SIZE: u8 = 100;

fn local_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Local)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Pages newest-first. Each page is internally newest to oldest and pages
/// step backwards in time, so one flat reverse yields chronological order.
async fn fetch_all(
    provider: &dyn ChannelProvider,
    channel_id: &str,
) -> Result<Vec<MessageData>, ChannelError> {
    let mut messages: Vec<MessageData> = Vec::new();
    let mut before: Option<String> = None;
    loop {
        let page = provider
            .get_channel_messages(channel_id, PAGE_SIZE, before.as_deref())
            .await?;
        if page.is_empty() {
            break;
        }
        let last_page = page.len() < PAGE_SIZE as usize;
        before = page.last().map(|message| message.id.clone());
        messages.extend(page);
        if last_page {
            break;
        }
    }
    messages.reverse();
    Ok(messages)
}

fn render(channel_name: &str, guild_name: &str, messages: &[MessageData]) -> String {
    let mut out = format!(
        "{rule}\n📋 TRANSCRIÇÃO DO TICKET\n{rule}\nCanal: #{channel}\nServidor: {guild}\nData: {date}\nTotal de Mensagens: {total}\n{rule}\n\n",
        rule = RULE,
        channel = channel_name,
        guild = guild_name,
        date = Local::now().format("%d/%m/%Y, %H:%M:%S"),
        total = messages.len(),
    );

    for message in messages {
        let content = if message.content.is_empty() {
            "[Sem conteúdo de texto]"
        } else {
            message.content.as_str()
        };
        out.push_str(&format!(
            "[{}] {}:\n{}\n",
            local_timestamp(&message.timestamp),
            message.author.tag(),
            content
        ));
        if !message.attachments.is_empty() {
            let urls: Vec<&str> = message
                .attachments
                .iter()
                .map(|attachment| attachment.url.as_str())
                .collect();
            out.push_str(&format!("📎 Anexos: {}\n", urls.join(", ")));
        }
        if !message.embeds.is_empty() {
            out.push_str(&format!("📊 Embeds: {} embed(s)\n", message.embeds.len()));
        }
        out.push('\n');
    }

    out.push_str(&format!("{rule}\nFim da transcrição\n{rule}\n", rule = RULE));
    out
}

/// Renders the full channel history. Returns `None` when a page fetch
/// fails; the close flow then carries on without a transcript.
pub async fn generate(
    provider: &dyn ChannelProvider,
    channel_id: &str,
    channel_name: &str,
    guild_name: &str,
) -> Option<String> {
    match fetch_all(provider, channel_id).await {
        Ok(messages) => Some(render(channel_name, guild_name, &messages)),
        Err(e) => {
            error!("failed to build transcript for {}: {}", channel_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{AttachmentData, EmbedData, UserData};
    use crate::tests::test_util;

    fn author(name: &str) -> UserData {
        UserData {
            id: "1".to_string(),
            username: name.to_string(),
            discriminator: "0".to_string(),
            bot: false,
        }
    }

    fn message(id: &str, content: &str) -> MessageData {
        MessageData {
            id: id.to_string(),
            content: content.to_string(),
            author: author("ana"),
            attachments: Vec::new(),
            embeds: Vec::new(),
            timestamp: "2026-08-26T12:00:00.000000+00:00".to_string(),
        }
    }

    #[test]
    fn renders_header_and_footer() {
        test_util::setup();
        let out = render("ticket-de-ana", "Loja 7M", &[]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], RULE);
        assert_eq!(lines[1], "📋 TRANSCRIÇÃO DO TICKET");
        assert_eq!(lines[3], "Canal: #ticket-de-ana");
        assert_eq!(lines[4], "Servidor: Loja 7M");
        assert!(lines[5].starts_with("Data: "));
        assert_eq!(lines[6], "Total de Mensagens: 0");
        assert!(out.ends_with(&format!("{}\nFim da transcrição\n{}\n", RULE, RULE)));
    }

    #[test]
    fn renders_message_body_and_extras() {
        test_util::setup();
        let mut with_extras = message("2", "");
        with_extras.attachments = vec![
            AttachmentData {
                url: "https://cdn.example/a.png".to_string(),
            },
            AttachmentData {
                url: "https://cdn.example/b.png".to_string(),
            },
        ];
        with_extras.embeds = vec![EmbedData::default()];

        let out = render(
            "ticket-de-ana",
            "Loja 7M",
            &[message("1", "olá, preciso de ajuda"), with_extras],
        );
        assert!(out.contains("] ana:\nolá, preciso de ajuda\n"));
        assert!(out.contains("] ana:\n[Sem conteúdo de texto]\n"));
        assert!(out.contains("📎 Anexos: https://cdn.example/a.png, https://cdn.example/b.png\n"));
        assert!(out.contains("📊 Embeds: 1 embed(s)\n"));
        assert!(out.contains("Total de Mensagens: 2"));
    }

    #[test]
    fn timestamps_localize_or_pass_through() {
        test_util::setup();
        let formatted = local_timestamp("2026-08-26T12:00:00.000000+00:00");
        let shape = regex::Regex::new(r"^\d{2}/\d{2}/\d{4}, \d{2}:\d{2}:\d{2}$").unwrap();
        assert!(shape.is_match(&formatted), "got {}", formatted);
        assert_eq!(local_timestamp("not a date"), "not a date");
    }
}

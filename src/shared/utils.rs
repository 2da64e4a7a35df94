use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

/// Maximum length the platform allows for a component custom id.
pub const CUSTOM_ID_MAX: usize = 100;

static CUSTOM_EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(a)?:(\w+):(\d+)>").unwrap_or_else(|e| panic!("custom emoji regex: {e}"))
});

static UNICODE_EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[\p{Emoji}\p{Emoji_Presentation}\p{Emoji_Modifier_Base}\p{Emoji_Modifier}\p{Emoji_Component}]+$",
    )
    .unwrap_or_else(|e| panic!("unicode emoji regex: {e}"))
});

fn slug(input: &str, sep: char, max_len: usize) -> String {
    let lowered = input.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            sep
        };
        // collapse runs of the separator
        if mapped == sep && out.ends_with(sep) {
            continue;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches(sep);
    trimmed.chars().take(max_len).collect()
}

/// Slug used to derive the deterministic per-user ticket channel name.
/// Two usernames that collapse to the same slug collide on purpose.
pub fn sanitize_username(username: &str) -> String {
    slug(username, '-', 40)
}

/// Slug used as the stable panel identifier, derived from the display name.
pub fn sanitize_panel_id(name: &str) -> String {
    slug(name, '_', 32)
}

pub fn is_valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

/// Empty means "no emoji" and is accepted. Otherwise the value must carry a
/// platform custom-emoji token or consist solely of Unicode emoji code points.
pub fn is_valid_emoji(emoji: &str) -> bool {
    if emoji.is_empty() {
        return true;
    }
    if CUSTOM_EMOJI_RE.is_match(emoji) {
        return true;
    }
    UNICODE_EMOJI_RE.is_match(emoji)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmojiSpec {
    Unicode(String),
    Custom {
        id: String,
        name: String,
        animated: bool,
    },
}

pub fn parse_emoji(emoji: &str) -> Option<EmojiSpec> {
    if emoji.is_empty() {
        return None;
    }
    if let Some(caps) = CUSTOM_EMOJI_RE.captures(emoji) {
        return Some(EmojiSpec::Custom {
            id: caps[3].to_string(),
            name: caps[2].to_string(),
            animated: caps.get(1).is_some(),
        });
    }
    Some(EmojiSpec::Unicode(emoji.to_string()))
}

pub fn validate_button_label(label: &str) -> Result<(), String> {
    if label.trim().is_empty() {
        return Err("O label não pode estar vazio!".to_string());
    }
    if label.chars().count() > 80 {
        return Err("O label do botão não pode ter mais de 80 caracteres!".to_string());
    }
    Ok(())
}

pub fn validate_custom_id(custom_id: &str) -> Result<(), String> {
    if custom_id.trim().is_empty() {
        return Err("O ID personalizado não pode estar vazio!".to_string());
    }
    if custom_id.chars().count() > CUSTOM_ID_MAX {
        return Err("O ID personalizado não pode ter mais de 100 caracteres!".to_string());
    }
    Ok(())
}

pub fn validate_select_menu_option(
    label: &str,
    value: &str,
    description: &str,
) -> Result<(), String> {
    if label.trim().is_empty() {
        return Err("O nome do setor não pode estar vazio!".to_string());
    }
    if value.trim().is_empty() {
        return Err("O valor do setor não pode estar vazio!".to_string());
    }
    if description.trim().is_empty() {
        return Err("A descrição do setor não pode estar vazia!".to_string());
    }
    if label.chars().count() > 100 {
        return Err("O nome do setor não pode ter mais de 100 caracteres!".to_string());
    }
    if value.chars().count() > 100 {
        return Err("O valor do setor não pode ter mais de 100 caracteres!".to_string());
    }
    if description.chars().count() > 100 {
        return Err("A descrição do setor não pode ter mais de 100 caracteres!".to_string());
    }
    Ok(())
}

/// Builds `create_ticket:<panelId>:<label>` truncating the label so the whole
/// id stays inside the 100-character platform budget. The reserve accounts for
/// the literal prefix and the two separators.
pub fn create_safe_custom_id(panel_id: &str, label: &str) -> String {
    let budget = CUSTOM_ID_MAX
        .saturating_sub(panel_id.chars().count())
        .saturating_sub(15 + 2);
    let safe_label: String = label.chars().take(budget).collect();
    format!("create_ticket:{panel_id}:{safe_label}")
}

/// Accepts `#RRGGBB`, `0x`-prefixed hex, or a known pt/en color name.
pub fn parse_color(input: &str) -> Option<u32> {
    if let Some(hex) = input.strip_prefix('#') {
        return u32::from_str_radix(hex, 16).ok();
    }
    if let Some(hex) = input.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok();
    }
    let named = match input.to_lowercase().as_str() {
        "vermelho" | "red" => 0xff0000,
        "verde" | "green" => 0x00ff00,
        "azul" | "blue" => 0x0099ff,
        "amarelo" | "yellow" => 0xffff00,
        "roxo" | "purple" => 0x9b59b6,
        "laranja" | "orange" => 0xff9900,
        "rosa" | "pink" => 0xff69b4,
        "preto" | "black" => 0x000000,
        "branco" | "white" => 0xffffff,
        "cinza" | "gray" => 0x808080,
        _ => return None,
    };
    Some(named)
}

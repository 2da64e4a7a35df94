pub mod transcript;
pub mod ui;

use std::collections::HashMap;

/// Ticket channels are named `ticket-de-<slug>`; every ticket-only control
/// checks the channel name against this prefix.
pub const TICKET_PREFIX: &str = "ticket-de-";

/// Which panel a staff member is currently editing, per guild and user.
/// Process-local: selections reset on restart.
#[derive(Debug, Default)]
pub struct SelectionContext {
    selected: HashMap<(String, String), String>,
}

impl SelectionContext {
    pub fn select(&mut self, guild_id: &str, user_id: &str, panel_id: &str) {
        self.selected.insert(
            (guild_id.to_string(), user_id.to_string()),
            panel_id.to_string(),
        );
    }

    pub fn selected(&self, guild_id: &str, user_id: &str) -> Option<&str> {
        self.selected
            .get(&(guild_id.to_string(), user_id.to_string()))
            .map(String::as_str)
    }

    /// Cascade for panel deletion: drops every selection in the guild that
    /// pointed at the removed panel.
    pub fn purge_panel(&mut self, guild_id: &str, panel_id: &str) {
        self.selected
            .retain(|(g, _), p| g != guild_id || p != panel_id);
    }
}

#[derive(Debug, Clone)]
pub struct TicketMetadata {
    pub guild_id: String,
    pub panel_id: String,
    pub user_id: String,
    pub channel_id: String,
    pub reason: String,
    pub control_message_id: Option<String>,
}

/// Open-ticket bookkeeping keyed by channel id. Lost on restart, which the
/// handlers tolerate (claim falls back to a message scan, settings reports
/// the restart). Entries are never pruned.
#[derive(Debug, Default)]
pub struct TicketRegistry {
    tickets: HashMap<String, TicketMetadata>,
    claims: HashMap<String, String>,
}

impl TicketRegistry {
    pub fn insert(&mut self, metadata: TicketMetadata) {
        self.tickets.insert(metadata.channel_id.clone(), metadata);
    }

    pub fn get(&self, channel_id: &str) -> Option<&TicketMetadata> {
        self.tickets.get(channel_id)
    }

    pub fn set_control_message(&mut self, channel_id: &str, message_id: &str) {
        if let Some(meta) = self.tickets.get_mut(channel_id) {
            meta.control_message_id = Some(message_id.to_string());
        }
    }

    /// Tag of the staff member currently holding the ticket.
    pub fn claimant(&self, channel_id: &str) -> Option<&str> {
        self.claims.get(channel_id).map(String::as_str)
    }

    pub fn claim(&mut self, channel_id: &str, staff_tag: &str) {
        self.claims
            .insert(channel_id.to_string(), staff_tag.to_string());
    }

    pub fn unclaim(&mut self, channel_id: &str) {
        self.claims.remove(channel_id);
    }
}

/// Transcripts kept in memory for the "Ver Transcrição" button, keyed by the
/// closed channel's id. Only filled after the close DM went through.
#[derive(Debug, Default)]
pub struct TranscriptCache {
    transcripts: HashMap<String, String>,
}

impl TranscriptCache {
    pub fn insert(&mut self, channel_id: &str, transcript: &str) {
        self.transcripts
            .insert(channel_id.to_string(), transcript.to_string());
    }

    pub fn get(&self, channel_id: &str) -> Option<&str> {
        self.transcripts.get(channel_id).map(String::as_str)
    }
}

use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: String,
    pub tag: String,
}

/// Runtime status shared between the gateway task and the web server.
/// Identity is set on READY; the guild set tracks GUILD_CREATE/DELETE.
pub struct StatusState {
    identity: RwLock<Option<BotIdentity>>,
    guilds: RwLock<HashSet<String>>,
    started: Instant,
}

impl StatusState {
    pub fn new() -> Self {
        Self {
            identity: RwLock::new(None),
            guilds: RwLock::new(HashSet::new()),
            started: Instant::now(),
        }
    }

    pub fn set_identity(&self, id: &str, tag: &str) {
        *self.identity.write().unwrap() = Some(BotIdentity {
            id: id.to_string(),
            tag: tag.to_string(),
        });
    }

    pub fn bot_id(&self) -> Option<String> {
        self.identity.read().unwrap().as_ref().map(|b| b.id.clone())
    }

    pub fn bot_tag(&self) -> Option<String> {
        self.identity.read().unwrap().as_ref().map(|b| b.tag.clone())
    }

    pub fn online(&self) -> bool {
        self.identity.read().unwrap().is_some()
    }

    pub fn add_guild(&self, guild_id: &str) {
        self.guilds.write().unwrap().insert(guild_id.to_string());
    }

    pub fn remove_guild(&self, guild_id: &str) {
        self.guilds.write().unwrap().remove(guild_id);
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.read().unwrap().len()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl Default for StatusState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    #[test]
    fn tracks_identity_and_guilds() {
        test_util::setup();
        let status = StatusState::new();
        assert!(!status.online());
        assert_eq!(status.guild_count(), 0);

        status.set_identity("1", "bot#0");
        status.add_guild("g1");
        status.add_guild("g2");
        status.add_guild("g1");
        assert!(status.online());
        assert_eq!(status.bot_id().as_deref(), Some("1"));
        assert_eq!(status.bot_tag().as_deref(), Some("bot#0"));
        assert_eq!(status.guild_count(), 2);

        status.remove_guild("g1");
        assert_eq!(status.guild_count(), 1);
    }
}

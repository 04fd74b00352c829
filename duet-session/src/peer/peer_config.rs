use duet_core::IceServerConfig;
use std::time::Duration;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:global.stun.twilio.com:3478";
pub const DEFAULT_GATHER_TIMEOUT: Duration = Duration::from_millis(3000);

/// Настройки WebRTC (STUN/TURN) для создаваемых соединений.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Сколько ждать сбора ICE кандидатов перед отправкой дескрипшена.
    /// `None` означает ждать до конца.
    pub gather_timeout: Option<Duration>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(vec![
                DEFAULT_STUN_ADDR.to_owned(),
                DEFAULT_STUN_ADDR_2.to_owned(),
            ])],
            gather_timeout: Some(DEFAULT_GATHER_TIMEOUT),
        }
    }
}

impl PeerConfig {
    /// Host candidates only. Used for loopback calls and tests.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
            gather_timeout: Some(Duration::from_secs(1)),
        }
    }

    pub fn with_ice_server(mut self, server: IceServerConfig) -> Self {
        self.ice_servers.push(server);
        self
    }
}

use anyhow::{Context, Result};
use dialoguer::Input;
use duet::model::IceServerConfig;
use duet::session::PeerConfig;
use duet::{PeerIdentity, RoomId};

pub const TURN_URL_ENV: &str = "TURN_URL";
pub const TURN_USERNAME_ENV: &str = "TURN_USERNAME";
pub const TURN_CREDENTIAL_ENV: &str = "TURN_CREDENTIAL";

pub fn resolve_identity(email: Option<String>) -> Result<PeerIdentity> {
    if let Some(id) = email.as_deref().and_then(PeerIdentity::parse) {
        return Ok(id);
    }
    let input: String = Input::new()
        .with_prompt("Email")
        .validate_with(|s: &String| -> Result<(), &'static str> {
            PeerIdentity::parse(s).map(|_| ()).ok_or("email must not be empty")
        })
        .interact_text()
        .context("Failed to read email")?;
    PeerIdentity::parse(&input).context("Email must not be empty")
}

pub fn resolve_room(room: Option<String>) -> Result<RoomId> {
    if let Some(room) = room.as_deref().and_then(RoomId::parse) {
        return Ok(room);
    }
    let input: String = Input::new()
        .with_prompt("Room")
        .validate_with(|s: &String| -> Result<(), &'static str> {
            RoomId::parse(s).map(|_| ()).ok_or("room must not be empty")
        })
        .interact_text()
        .context("Failed to read room")?;
    RoomId::parse(&input).context("Room must not be empty")
}

/// STUN servers from the command line replace the defaults; TURN comes from the environment.
pub fn peer_config(stun: Vec<String>, turn: Option<IceServerConfig>) -> PeerConfig {
    let mut config = PeerConfig::default();
    if !stun.is_empty() {
        config.ice_servers = vec![IceServerConfig::stun(stun)];
    }
    match turn {
        Some(server) => config.with_ice_server(server),
        None => config,
    }
}

pub fn turn_from_env() -> Option<IceServerConfig> {
    turn_from_vars(
        std::env::var(TURN_URL_ENV).ok(),
        std::env::var(TURN_USERNAME_ENV).ok(),
        std::env::var(TURN_CREDENTIAL_ENV).ok(),
    )
}

fn turn_from_vars(
    url: Option<String>,
    username: Option<String>,
    credential: Option<String>,
) -> Option<IceServerConfig> {
    let url = url.filter(|u| !u.trim().is_empty())?;
    Some(IceServerConfig {
        urls: vec![url],
        username,
        credential,
    })
}

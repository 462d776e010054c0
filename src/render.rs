//! Text rendering of a session snapshot.
//!
//! Pure function of the snapshot; holds no state and never writes back.

use crate::session::state::{SessionPhase, SessionSnapshot};

const TITLE: &str = "Web3 Dashboard";
const SUBTITLE: &str = "Real-time Blockchain Sync";

/// Characters kept at the start and end of a shortened address.
const ADDRESS_HEAD: usize = 10;
const ADDRESS_TAIL: usize = 8;

/// Render the dashboard card for `snapshot`.
pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut lines = vec![TITLE.to_string(), SUBTITLE.to_string(), String::new()];

    if snapshot.install_required {
        lines.push("No wallet detected. Install a browser wallet (e.g. MetaMask) and retry.".to_string());
    }

    match snapshot.phase() {
        SessionPhase::Connecting => lines.push("[ Connecting... ]".to_string()),
        SessionPhase::Disconnected => lines.push("[ Connect Wallet ]".to_string()),
        SessionPhase::Connected => {
            let session = &snapshot.session;
            let network = &snapshot.network;
            lines.push(format!("Wallet Address  {}", short_address(&session.address)));
            lines.push(format!("Live Balance    {} {}", session.balance, network.symbol));
            lines.push(format!("Network         {} ({})", network.name, network.accent_color));
            lines.push(format!("● Live Syncing with {}...", network.name));
        }
    }

    lines.join("\n")
}

/// `0x12345678...9abcdef0` style shortening. Short inputs are returned whole.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= ADDRESS_HEAD + ADDRESS_TAIL {
        return address.to_string();
    }

    let head: String = chars[..ADDRESS_HEAD].iter().collect();
    let tail: String = chars[chars.len() - ADDRESS_TAIL..].iter().collect();
    format!("{}...{}", head, tail)
}

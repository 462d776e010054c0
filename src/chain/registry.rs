//! Static chain registry.
//!
//! Maps a chain id to the display metadata shown next to a session.

use serde::{Deserialize, Serialize};

/// Neutral accent color used for unknown and pending networks.
pub const NEUTRAL_COLOR: &str = "#94a3b8";

/// Symbol shown when the native currency of a chain is unknown.
pub const UNKNOWN_SYMBOL: &str = "Tokens";

/// A static registry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub chain_id: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub accent_color: &'static str,
}

/// Known chains, keyed by decimal chain id.
const KNOWN_CHAINS: &[ChainEntry] = &[
    ChainEntry { chain_id: "1", name: "Ethereum Mainnet", symbol: "ETH", accent_color: "#627eea" },
    ChainEntry { chain_id: "11155111", name: "Sepolia Testnet", symbol: "ETH", accent_color: "#cfb5f0" },
    ChainEntry { chain_id: "137", name: "Polygon Mainnet", symbol: "MATIC", accent_color: "#8247e5" },
    ChainEntry { chain_id: "80002", name: "Polygon Amoy", symbol: "MATIC", accent_color: "#a77cf2" },
    ChainEntry { chain_id: "56", name: "BSC Mainnet", symbol: "BNB", accent_color: "#f0b90b" },
    ChainEntry { chain_id: "42161", name: "Arbitrum One", symbol: "ETH", accent_color: "#28a0f0" },
];

/// Display metadata for the network a session is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Authoritative key. Empty until the first refresh.
    pub chain_id: String,
    /// Human-readable network name.
    pub name: String,
    /// Native currency symbol.
    pub symbol: String,
    /// Accent color (CSS hex).
    pub accent_color: String,
}

impl NetworkInfo {
    /// Placeholder shown before any chain has been resolved.
    pub fn pending() -> Self {
        Self {
            chain_id: String::new(),
            name: "Checking...".to_string(),
            symbol: "ETH".to_string(),
            accent_color: NEUTRAL_COLOR.to_string(),
        }
    }

    /// Generic entry for a chain id with no registry record.
    pub fn unknown(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            name: format!("Unknown Network ({})", chain_id),
            symbol: UNKNOWN_SYMBOL.to_string(),
            accent_color: NEUTRAL_COLOR.to_string(),
        }
    }

    /// True when this is the pre-refresh placeholder.
    pub fn is_pending(&self) -> bool {
        self.chain_id.is_empty()
    }
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self::pending()
    }
}

impl From<&ChainEntry> for NetworkInfo {
    fn from(entry: &ChainEntry) -> Self {
        Self {
            chain_id: entry.chain_id.to_string(),
            name: entry.name.to_string(),
            symbol: entry.symbol.to_string(),
            accent_color: entry.accent_color.to_string(),
        }
    }
}

/// Chain id to display metadata lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainRegistry;

impl ChainRegistry {
    /// Create a registry over the built-in chain table.
    pub fn new() -> Self {
        Self
    }

    /// Resolve display metadata for a chain id.
    ///
    /// Total: every input yields a `NetworkInfo`. Hex ids are normalized to
    /// decimal first, so `"0xaa36a7"` resolves to Sepolia.
    pub fn lookup(&self, chain_id: &str) -> NetworkInfo {
        let key = normalize_chain_id(chain_id);
        match self.entry(&key) {
            Some(entry) => NetworkInfo::from(entry),
            None => NetworkInfo::unknown(&key),
        }
    }

    /// Get the raw registry record for a decimal chain id.
    pub fn entry(&self, chain_id: &str) -> Option<&'static ChainEntry> {
        KNOWN_CHAINS.iter().find(|e| e.chain_id == chain_id)
    }

    /// All known chains.
    pub fn entries(&self) -> &'static [ChainEntry] {
        KNOWN_CHAINS
    }
}

/// Normalize a chain id to its decimal string form.
///
/// Accepts decimal (`"137"`) and `0x`-prefixed hex (`"0x89"`). Anything that
/// does not parse is returned trimmed but otherwise untouched.
pub fn normalize_chain_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));

    let parsed = match hex {
        Some(digits) => u64::from_str_radix(digits, 16).ok(),
        None => trimmed.parse::<u64>().ok(),
    };

    match parsed {
        Some(id) => id.to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_chains() {
        let registry = ChainRegistry::new();

        let sepolia = registry.lookup("11155111");
        assert_eq!(sepolia.name, "Sepolia Testnet");
        assert_eq!(sepolia.symbol, "ETH");

        let polygon = registry.lookup("137");
        assert_eq!(polygon.name, "Polygon Mainnet");
        assert_eq!(polygon.symbol, "MATIC");

        assert_eq!(registry.lookup("1").name, "Ethereum Mainnet");
        assert_eq!(registry.lookup("80002").name, "Polygon Amoy");
        assert_eq!(registry.lookup("56").symbol, "BNB");
        assert_eq!(registry.lookup("42161").name, "Arbitrum One");
    }

    #[test]
    fn test_unknown_chain_fallback() {
        let info = ChainRegistry::new().lookup("31337");
        assert_eq!(info.chain_id, "31337");
        assert!(info.name.contains("31337"));
        assert_eq!(info.symbol, UNKNOWN_SYMBOL);
        assert_eq!(info.accent_color, NEUTRAL_COLOR);
    }

    #[test]
    fn test_lookup_is_total() {
        let registry = ChainRegistry::new();
        for input in ["", "   ", "abc", "0x", "0xzz", "-1", "99999999999999999999999", "🦀"] {
            let info = registry.lookup(input);
            assert!(!info.name.is_empty(), "no name for {:?}", input);
            assert_eq!(info.symbol, UNKNOWN_SYMBOL);
        }
    }

    #[test]
    fn test_hex_chain_ids() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.lookup("0xaa36a7").name, "Sepolia Testnet");
        assert_eq!(registry.lookup("0x89").name, "Polygon Mainnet");
        assert_eq!(registry.lookup("0X1").chain_id, "1");
    }

    #[test]
    fn test_normalize_chain_id() {
        assert_eq!(normalize_chain_id(" 137 "), "137");
        assert_eq!(normalize_chain_id("0x38"), "56");
        assert_eq!(normalize_chain_id("mainnet"), "mainnet");
    }

    #[test]
    fn test_pending_network() {
        let info = NetworkInfo::default();
        assert!(info.is_pending());
        assert_eq!(info.name, "Checking...");
    }
}

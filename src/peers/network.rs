/// Chain identification from the message-start (magic) bytes.
use bitcoin::p2p::Magic;

/// testnet4 message start.
const TESTNET4_MAGIC: [u8; 4] = [0x1c, 0x16, 0x3f, 0x28];

/// Chains whose magic bytes are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Main,
    Testnet3,
    Testnet4,
    Signet,
    Regtest,
}

impl Network {
    /// Look up the chain for a magic value. Custom signets are not recognized.
    #[must_use]
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        if magic == TESTNET4_MAGIC {
            return Some(Self::Testnet4);
        }
        match bitcoin::Network::from_magic(Magic::from_bytes(magic))? {
            bitcoin::Network::Bitcoin => Some(Self::Main),
            bitcoin::Network::Testnet => Some(Self::Testnet3),
            bitcoin::Network::Signet => Some(Self::Signet),
            bitcoin::Network::Regtest => Some(Self::Regtest),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Testnet3 => "testnet3",
            Self::Testnet4 => "testnet4",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        }
    }
}

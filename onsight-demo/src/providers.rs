/// A wallet provider profile the demo can emulate.
///
/// Each profile mirrors one of the provider integrations the demo ships:
/// same buttons, different connection SDK underneath. Mobile profiles report
/// navigation as `screen` events instead of `page` events.
#[derive(Debug, Clone, Copy)]
pub struct ProviderProfile {
    pub name: &'static str,
    /// Connector label the wallet library would report.
    pub connector: &'static str,
    /// Chain the wallet connects to initially.
    pub default_chain: u64,
    /// Chain targeted by the "switch chain" action.
    pub alternate_chain: u64,
    pub mobile: bool,
}

/// The provider integrations available to the demo.
pub const PROFILES: &[ProviderProfile] = &[
    ProviderProfile {
        name: "reown",
        connector: "Reown AppKit",
        default_chain: 1,
        alternate_chain: 42_161,
        mobile: false,
    },
    ProviderProfile {
        name: "porto",
        connector: "Porto",
        default_chain: 1,
        alternate_chain: 8_453,
        mobile: false,
    },
    ProviderProfile {
        name: "privy",
        connector: "Privy",
        default_chain: 1,
        alternate_chain: 137,
        mobile: false,
    },
    ProviderProfile {
        name: "dynamic",
        connector: "Dynamic",
        default_chain: 1,
        alternate_chain: 10,
        mobile: false,
    },
    ProviderProfile {
        name: "metamask",
        connector: "MetaMask",
        default_chain: 1,
        alternate_chain: 59_144,
        mobile: false,
    },
    ProviderProfile {
        name: "web3-onboard",
        connector: "Web3-Onboard",
        default_chain: 1,
        alternate_chain: 42_161,
        mobile: false,
    },
    ProviderProfile {
        name: "mobile",
        connector: "WalletConnect",
        default_chain: 1,
        alternate_chain: 8_453,
        mobile: true,
    },
];

/// Looks a profile up by name.
pub fn find(name: &str) -> Option<&'static ProviderProfile> {
    PROFILES.iter().find(|profile| profile.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_profile_is_findable() {
        for profile in PROFILES {
            assert_eq!(find(profile.name).map(|p| p.connector), Some(profile.connector));
        }
        assert!(find("unknown").is_none());
    }
}

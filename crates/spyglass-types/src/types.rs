use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The transport a protocol version runs on.
///
/// `Stream` versions speak over a plain TCP connection. `Datagram`
/// versions negotiate session parameters (protocol revision, timeouts,
/// session id) at the transport layer before any application data flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    Stream,
    Datagram,
}

/// A wire protocol version.
///
/// Identity is the numeric id: two versions with the same id compare
/// equal regardless of display name. Ordering follows release order,
/// which the numeric ids track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub name: String,
    pub id: i32,
    pub transport: Transport,
}

impl ProtocolVersion {
    pub fn stream(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
            transport: Transport::Stream,
        }
    }

    pub fn datagram(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
            transport: Transport::Datagram,
        }
    }
}

impl PartialEq for ProtocolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProtocolVersion {}

impl std::hash::Hash for ProtocolVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// The set of protocol versions this process knows about.
///
/// Versions are kept newest to oldest; that enumeration order is what
/// version pickers and suggestion lists consume. The native version is
/// fixed at construction and never changes.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: Vec<ProtocolVersion>,
    native: ProtocolVersion,
}

impl VersionRegistry {
    /// Build a registry from a newest-to-oldest version list.
    /// The native version must be one of the listed versions.
    pub fn new(versions: Vec<ProtocolVersion>, native: ProtocolVersion) -> Self {
        debug_assert!(versions.contains(&native));
        Self { versions, native }
    }

    /// The built-in version set. Native is the newest stream version.
    pub fn well_known() -> Self {
        let versions = vec![
            ProtocolVersion::stream("1.21.1", 767),
            ProtocolVersion::datagram("bedrock-1.21.0", 685),
            ProtocolVersion::stream("1.20.6", 766),
            ProtocolVersion::stream("1.20.4", 765),
            ProtocolVersion::stream("1.20.2", 764),
            ProtocolVersion::stream("1.20", 763),
            ProtocolVersion::stream("1.19.4", 762),
            ProtocolVersion::stream("1.18.2", 758),
            ProtocolVersion::stream("1.16.5", 754),
            ProtocolVersion::stream("1.12.2", 340),
            ProtocolVersion::stream("1.8.9", 47),
        ];
        let native = versions[0].clone();
        Self { versions, native }
    }

    pub fn native(&self) -> &ProtocolVersion {
        &self.native
    }

    /// All known versions, newest to oldest.
    pub fn versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }

    pub fn contains(&self, version: &ProtocolVersion) -> bool {
        self.versions.contains(version)
    }

    pub fn by_name(&self, name: &str) -> Option<&ProtocolVersion> {
        self.versions.iter().find(|v| v.name == name)
    }

    pub fn by_id(&self, id: i32) -> Option<&ProtocolVersion> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// A signed-in user identity, when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
    pub uuid: Uuid,
}

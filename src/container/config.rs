//! Container creation specification
//!
//! The three-part request sent to the daemon: the container config, the host
//! config (resources, isolation, devices) and the networking config. Field
//! names on the wire follow the Docker/Pouch API (PascalCase).

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;

/// A complete creation request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSpec {
    /// Identity and runtime fields, sent at the top level of the body
    #[serde(flatten)]
    pub config: ContainerConfig,
    /// Resource limits, isolation and devices
    pub host_config: HostConfig,
    /// Network attachments
    pub networking_config: NetworkingConfig,
}

/// Container configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    /// Image reference
    pub image: String,
    /// Command override; empty keeps the image default
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,
    /// Entrypoint override; empty keeps the image default
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    /// Environment variables, `KEY=value`
    pub env: Vec<String>,
    /// Labels in command-line order
    #[serde(serialize_with = "serialize_pairs")]
    pub labels: Vec<KeyValue>,
    /// Working directory
    pub working_dir: String,
    /// User or UID
    pub user: String,
    /// Hostname
    pub hostname: String,
    /// Allocate a tty
    pub tty: bool,
}

/// Host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    /// Bind mounts, `src:dst[:opts]`
    pub binds: Vec<String>,
    /// OCI runtime name
    pub runtime: String,
    /// Primary network
    pub network_mode: String,
    pub restart_policy: RestartPolicy,
    pub ipc_mode: NamespaceMode,
    pub pid_mode: NamespaceMode,
    #[serde(rename = "UTSMode")]
    pub uts_mode: NamespaceMode,
    /// Sysctls in command-line order
    #[serde(serialize_with = "serialize_pairs")]
    pub sysctls: Vec<KeyValue>,
    pub security_opt: Vec<String>,
    pub cap_add: Vec<String>,
    pub cap_drop: Vec<String>,
    pub privileged: bool,
    pub enable_lxcfs: bool,
    /// Resource limits, flattened into the host config as the daemon expects
    #[serde(flatten)]
    pub resources: Resources,
}

/// Resource limits
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resources {
    /// CPU share weight
    pub cpu_shares: i64,
    pub cpuset_cpus: String,
    pub cpuset_mems: String,
    /// Memory limit in bytes, 0 for none
    pub memory: i64,
    /// Memory plus swap in bytes, 0 for none, -1 for unlimited
    pub memory_swap: i64,
    /// 0..=100, or -1 to inherit
    pub memory_swappiness: i64,
    pub memory_wmark_ratio: i64,
    pub memory_extra: i64,
    pub memory_force_empty_ctl: i64,
    pub sche_lat_switch: i64,
    pub devices: Vec<DeviceMapping>,
    /// Relative block IO weight, 0 disables
    pub blkio_weight: u16,
    pub blkio_weight_device: DeviceTable<WeightDevice>,
    pub blkio_device_read_bps: DeviceTable<ThrottleDevice>,
    pub blkio_device_write_bps: DeviceTable<ThrottleDevice>,
    #[serde(rename = "BlkioDeviceReadIOps")]
    pub blkio_device_read_iops: DeviceTable<ThrottleDevice>,
    #[serde(rename = "BlkioDeviceWriteIOps")]
    pub blkio_device_write_iops: DeviceTable<ThrottleDevice>,
    /// Intel RDT L3 cache bitmask, passed through
    pub intel_rdt_l3_cbm: String,
}

/// Unset sentinel for memory swappiness
pub const SWAPPINESS_UNSET: i64 = -1;

impl Default for Resources {
    fn default() -> Self {
        Self {
            cpu_shares: 0,
            cpuset_cpus: String::new(),
            cpuset_mems: String::new(),
            memory: 0,
            memory_swap: 0,
            memory_swappiness: SWAPPINESS_UNSET,
            memory_wmark_ratio: 0,
            memory_extra: 0,
            memory_force_empty_ctl: 0,
            sche_lat_switch: 0,
            devices: Vec::new(),
            blkio_weight: 0,
            blkio_weight_device: DeviceTable::default(),
            blkio_device_read_bps: DeviceTable::default(),
            blkio_device_write_bps: DeviceTable::default(),
            blkio_device_read_iops: DeviceTable::default(),
            blkio_device_write_iops: DeviceTable::default(),
            intel_rdt_l3_cbm: String::new(),
        }
    }
}

/// A `key=value` pair from a label or sysctl flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Emits pairs as a JSON object in order. Repeated keys are emitted as-is;
/// merging them is the daemon's call.
fn serialize_pairs<S: Serializer>(pairs: &[KeyValue], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(pairs.iter().map(|kv| (&kv.key, &kv.value)))
}

/// Host device exposed to the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceMapping {
    pub path_on_host: String,
    pub path_in_container: String,
    pub cgroup_permissions: String,
}

/// Restart policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    /// Empty when no policy was requested
    pub name: String,
    pub maximum_retry_count: i64,
}

/// Namespace sharing mode for IPC, PID and UTS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceMode {
    /// A fresh namespace for the container
    #[default]
    Private,
    /// The host's namespace
    Host,
    /// Another container's namespace
    Container(String),
    /// Any other mode the daemon understands (`private`, `shareable`, ...)
    Other(String),
}

impl fmt::Display for NamespaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceMode::Private => Ok(()),
            NamespaceMode::Host => write!(f, "host"),
            NamespaceMode::Container(name) => write!(f, "container:{}", name),
            NamespaceMode::Other(mode) => f.write_str(mode),
        }
    }
}

impl Serialize for NamespaceMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Entry of a per-device table
pub trait DeviceEntry {
    fn path(&self) -> &str;
}

/// Per-device weight override
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeightDevice {
    pub path: String,
    pub weight: u16,
}

impl DeviceEntry for WeightDevice {
    fn path(&self) -> &str {
        &self.path
    }
}

/// Per-device rate cap (bytes or operations per second)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThrottleDevice {
    pub path: String,
    pub rate: u64,
}

impl DeviceEntry for ThrottleDevice {
    fn path(&self) -> &str {
        &self.path
    }
}

/// Device-path keyed table. Inserting a path that is already present
/// replaces its value in place, so the last occurrence wins while the
/// first occurrence keeps its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeviceTable<T>(Vec<T>);

impl<T> Default for DeviceTable<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: DeviceEntry> DeviceTable<T> {
    pub fn insert(&mut self, entry: T) {
        match self.0.iter_mut().find(|e| e.path() == entry.path()) {
            Some(slot) => *slot = entry,
            None => self.0.push(entry),
        }
    }

    pub fn get(&self, path: &str) -> Option<&T> {
        self.0.iter().find(|e| e.path() == path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T: DeviceEntry> FromIterator<T> for DeviceTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::default();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Network attachments, in command-line order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkingConfig {
    pub networks: Vec<String>,
}

#[derive(Serialize)]
struct EndpointSettings {}

struct Endpoints<'a>(&'a [String]);

impl Serialize for Endpoints<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|name| (name, EndpointSettings {})))
    }
}

impl Serialize for NetworkingConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NetworkingConfig", 1)?;
        state.serialize_field("EndpointsConfig", &Endpoints(&self.networks))?;
        state.end()
    }
}

//! Container creation request
//!
//! This module turns the flags of `pouch create` into the three-part
//! specification submitted to the daemon.

pub mod builder;
pub mod config;
pub mod flags;
pub mod opts;

pub use builder::build_spec;
pub use config::{
    ContainerConfig, ContainerSpec, DeviceMapping, DeviceTable, HostConfig, KeyValue,
    NamespaceMode, NetworkingConfig, Resources, RestartPolicy, ThrottleDevice, WeightDevice,
};
pub use flags::CreateFlags;

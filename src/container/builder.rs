//! Flag set to container specification
//!
//! Pure data transformation: no I/O, every field populated, and any
//! structural failure reported against the flag that caused it.

use super::config::{
    ContainerConfig, ContainerSpec, DeviceTable, HostConfig, NetworkingConfig, Resources,
};
use super::flags::CreateFlags;
use super::opts::{self, ParseResult};
use crate::error::{PouchError, Result};
use tracing::debug;

/// Builds the full creation request.
///
/// `args` are the positionals: the image first, then the command override.
pub fn build_spec(flags: &CreateFlags, args: &[String]) -> Result<ContainerSpec> {
    let (image, cmd) = args.split_first().ok_or_else(|| {
        PouchError::InvalidArgument(
            "\"create\" requires at least 1 argument: IMAGE [ARG...]".to_string(),
        )
    })?;

    let spec = ContainerSpec {
        config: build_container_config(flags, image, cmd)?,
        host_config: build_host_config(flags)?,
        networking_config: NetworkingConfig {
            networks: flags.networks.clone(),
        },
    };

    debug!(
        image = %spec.config.image,
        devices = spec.host_config.resources.devices.len(),
        networks = spec.networking_config.networks.len(),
        "built container spec"
    );
    Ok(spec)
}

fn build_container_config(
    flags: &CreateFlags,
    image: &str,
    cmd: &[String],
) -> Result<ContainerConfig> {
    Ok(ContainerConfig {
        image: image.to_string(),
        cmd: cmd.to_vec(),
        entrypoint: opts::parse_entrypoint(&flags.entrypoint),
        env: flags.env.clone(),
        labels: each("label", &flags.labels, opts::parse_key_value)?,
        working_dir: flags.workdir.clone(),
        user: flags.user.clone(),
        hostname: flags.hostname.clone(),
        tty: flags.tty,
    })
}

fn build_host_config(flags: &CreateFlags) -> Result<HostConfig> {
    Ok(HostConfig {
        binds: flags.volume.clone(),
        runtime: flags.runtime.clone(),
        network_mode: flags.networks.first().cloned().unwrap_or_default(),
        restart_policy: check("restart", opts::parse_restart_policy(&flags.restart_policy))?,
        ipc_mode: opts::parse_namespace_mode(&flags.ipc_mode),
        pid_mode: opts::parse_namespace_mode(&flags.pid_mode),
        uts_mode: opts::parse_namespace_mode(&flags.uts_mode),
        sysctls: each("sysctl", &flags.sysctls, opts::parse_key_value)?,
        security_opt: flags.security_opt.clone(),
        cap_add: flags.cap_add.clone(),
        cap_drop: flags.cap_drop.clone(),
        privileged: flags.privileged,
        enable_lxcfs: flags.enable_lxcfs,
        resources: build_resources(flags)?,
    })
}

fn build_resources(flags: &CreateFlags) -> Result<Resources> {
    Ok(Resources {
        cpu_shares: flags.cpu_share,
        cpuset_cpus: flags.cpuset_cpus.clone(),
        cpuset_mems: flags.cpuset_mems.clone(),
        memory: check("memory", opts::parse_memory(&flags.memory))?,
        memory_swap: check("memory-swap", opts::parse_memory_swap(&flags.memory_swap))?,
        memory_swappiness: check(
            "memory-swappiness",
            opts::validate_swappiness(flags.memory_swappiness),
        )?,
        memory_wmark_ratio: flags.memory_wmark_ratio,
        memory_extra: flags.memory_extra,
        memory_force_empty_ctl: flags.memory_force_empty_ctl,
        sche_lat_switch: flags.sche_lat_switch,
        devices: each("device", &flags.devices, opts::parse_device_mapping)?,
        blkio_weight: check("blkio-weight", opts::validate_blkio_weight(flags.blkio_weight))?,
        blkio_weight_device: table(
            "blkio-weight-device",
            &flags.blkio_weight_device,
            opts::parse_weight_device,
        )?,
        blkio_device_read_bps: table(
            "device-read-bps",
            &flags.device_read_bps,
            opts::parse_throttle_bps,
        )?,
        blkio_device_write_bps: table(
            "device-write-bps",
            &flags.device_write_bps,
            opts::parse_throttle_bps,
        )?,
        blkio_device_read_iops: table(
            "device-read-iops",
            &flags.device_read_iops,
            opts::parse_throttle_iops,
        )?,
        blkio_device_write_iops: table(
            "device-write-iops",
            &flags.device_write_iops,
            opts::parse_throttle_iops,
        )?,
        intel_rdt_l3_cbm: flags.intel_rdt_l3_cbm.clone(),
    })
}

fn check<T>(flag: &'static str, parsed: ParseResult<T>) -> Result<T> {
    parsed.map_err(|reason| PouchError::invalid_flag(flag, reason))
}

/// Parses every occurrence of a list flag, keeping order and duplicates
fn each<T>(
    flag: &'static str,
    values: &[String],
    parse: fn(&str) -> ParseResult<T>,
) -> Result<Vec<T>> {
    values.iter().map(|v| check(flag, parse(v))).collect()
}

/// Parses every occurrence of a per-device flag into a last-write-wins table
fn table<T: super::config::DeviceEntry>(
    flag: &'static str,
    values: &[String],
    parse: fn(&str) -> ParseResult<T>,
) -> Result<DeviceTable<T>> {
    values.iter().map(|v| check(flag, parse(v))).collect()
}

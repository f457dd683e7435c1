//! Flags of the `create` command
//!
//! One named field per flag. The clap defaults and [`Default`] agree, so the
//! builder can be driven from a plain value without going through the parser.

use super::config::SWAPPINESS_UNSET;
use clap::Args;

/// Long description shown by `pouch create --help`
pub const CREATE_DESCRIPTION: &str = "Create a static container object in Pouchd. \
When creating, all configuration user input will be stored in memory store of Pouchd. \
This is useful when you wish to create a container configuration ahead of time so that \
Pouchd will preserve the resource in advance. \
The container you created is ready to start when you need it.";

/// Example shown after the help text
pub const CREATE_EXAMPLE: &str = "Example:
  $ pouch create --name foo busybox:latest
  container ID: e1d541722d68dc5d133cca9e7bd8fd9338603e1763096c8e853522b60d11f7b9, name: foo";

/// Create command flags
#[derive(Args, Debug, Clone, PartialEq)]
pub struct CreateFlags {
    /// Specify name of container
    #[arg(long, default_value = "")]
    pub name: String,

    /// Allocate a tty device
    #[arg(short, long)]
    pub tty: bool,

    /// Bind mount volumes to container
    #[arg(short, long, value_delimiter = ',')]
    pub volume: Vec<String>,

    /// Specify oci runtime
    #[arg(long, default_value = "")]
    pub runtime: String,

    /// Set environment variables for container
    #[arg(short, long, value_delimiter = ',')]
    pub env: Vec<String>,

    /// Set label for a container
    #[arg(short, long = "label", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Overwrite the default entrypoint
    #[arg(long, default_value = "")]
    pub entrypoint: String,

    /// Set the working directory in a container
    #[arg(short, long, default_value = "")]
    pub workdir: String,

    /// UID
    #[arg(short, long, default_value = "")]
    pub user: String,

    /// Set container's hostname
    #[arg(long, default_value = "")]
    pub hostname: String,

    /// CPU shares
    #[arg(long = "cpu-share", default_value_t = 0, allow_negative_numbers = true)]
    pub cpu_share: i64,

    /// CPUs in cpuset
    #[arg(long, default_value = "")]
    pub cpuset_cpus: String,

    /// MEMs in cpuset
    #[arg(long, default_value = "")]
    pub cpuset_mems: String,

    /// Container memory swappiness [0, 100]
    #[arg(
        long,
        alias = "memory-wappiness",
        default_value_t = SWAPPINESS_UNSET,
        allow_negative_numbers = true
    )]
    pub memory_swappiness: i64,

    /// Container memory limit
    #[arg(short, long, default_value = "")]
    pub memory: String,

    /// Container swap limit
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub memory_swap: String,

    /// Represent this container's memory low water mark percentage, range in [0, 100].
    /// The value of memory low water mark is memory.limit_in_bytes * MemoryWmarkRatio
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub memory_wmark_ratio: i64,

    /// Represent container's memory high water mark percentage, range in [0, 100]
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub memory_extra: i64,

    /// Whether to reclaim page cache when deleting the cgroup of container
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub memory_force_empty_ctl: i64,

    /// Whether to enable scheduler latency count in cpuacct
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub sche_lat_switch: i64,

    /// Add a host device to the container
    #[arg(long = "device", value_delimiter = ',')]
    pub devices: Vec<String>,

    /// Enable lxcfs
    #[arg(long = "enableLxcfs")]
    pub enable_lxcfs: bool,

    /// Restart policy to apply when container exits
    #[arg(long = "restart", default_value = "")]
    pub restart_policy: String,

    /// IPC namespace to use
    #[arg(long = "ipc", default_value = "")]
    pub ipc_mode: String,

    /// PID namespace to use
    #[arg(long = "pid", default_value = "")]
    pub pid_mode: String,

    /// UTS namespace to use
    #[arg(long = "uts", default_value = "")]
    pub uts_mode: String,

    /// Sysctl options
    #[arg(long = "sysctl", value_delimiter = ',')]
    pub sysctls: Vec<String>,

    /// Set networks to container
    #[arg(long = "net", value_delimiter = ',')]
    pub networks: Vec<String>,

    /// Security Options
    #[arg(long = "security-opt", value_delimiter = ',')]
    pub security_opt: Vec<String>,

    /// Give extended privileges to the container
    #[arg(long)]
    pub privileged: bool,

    /// Add Linux capabilities
    #[arg(long, value_delimiter = ',')]
    pub cap_add: Vec<String>,

    /// Drop Linux capabilities
    #[arg(long, value_delimiter = ',')]
    pub cap_drop: Vec<String>,

    /// Block IO (relative weight), between 10 and 1000, or 0 to disable
    #[arg(long, default_value_t = 0)]
    pub blkio_weight: u16,

    /// Block IO weight (relative device weight)
    #[arg(long)]
    pub blkio_weight_device: Vec<String>,

    /// Limit read rate (bytes per second) from a device
    #[arg(long)]
    pub device_read_bps: Vec<String>,

    /// Limit read rate (IO per second) from a device
    #[arg(long)]
    pub device_read_iops: Vec<String>,

    /// Limit write rate (bytes per second) from a device
    #[arg(long)]
    pub device_write_bps: Vec<String>,

    /// Limit write rate (IO per second) from a device
    #[arg(long)]
    pub device_write_iops: Vec<String>,

    /// Limit container resource for Intel RDT/CAT which introduced in Linux 4.10 kernel
    #[arg(long, default_value = "")]
    pub intel_rdt_l3_cbm: String,
}

impl Default for CreateFlags {
    fn default() -> Self {
        Self {
            name: String::new(),
            tty: false,
            volume: Vec::new(),
            runtime: String::new(),
            env: Vec::new(),
            labels: Vec::new(),
            entrypoint: String::new(),
            workdir: String::new(),
            user: String::new(),
            hostname: String::new(),
            cpu_share: 0,
            cpuset_cpus: String::new(),
            cpuset_mems: String::new(),
            memory_swappiness: SWAPPINESS_UNSET,
            memory: String::new(),
            memory_swap: String::new(),
            memory_wmark_ratio: 0,
            memory_extra: 0,
            memory_force_empty_ctl: 0,
            sche_lat_switch: 0,
            devices: Vec::new(),
            enable_lxcfs: false,
            restart_policy: String::new(),
            ipc_mode: String::new(),
            pid_mode: String::new(),
            uts_mode: String::new(),
            sysctls: Vec::new(),
            networks: Vec::new(),
            security_opt: Vec::new(),
            privileged: false,
            cap_add: Vec::new(),
            cap_drop: Vec::new(),
            blkio_weight: 0,
            blkio_weight_device: Vec::new(),
            device_read_bps: Vec::new(),
            device_read_iops: Vec::new(),
            device_write_bps: Vec::new(),
            device_write_iops: Vec::new(),
            intel_rdt_l3_cbm: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        flags: CreateFlags,
    }

    fn parse(args: &[&str]) -> CreateFlags {
        let argv = std::iter::once("create").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().flags
    }

    #[test]
    fn test_parser_defaults_match_default() {
        assert_eq!(parse(&[]), CreateFlags::default());
    }

    #[test]
    fn test_list_flags_keep_order_and_duplicates() {
        let flags = parse(&["-e", "A=1", "--env", "B=2,A=1", "--cap-add", "NET_ADMIN"]);
        assert_eq!(flags.env, vec!["A=1", "B=2", "A=1"]);
        assert_eq!(flags.cap_add, vec!["NET_ADMIN"]);
    }

    #[test]
    fn test_swappiness_alias_and_negative_values() {
        let flags = parse(&["--memory-wappiness", "30"]);
        assert_eq!(flags.memory_swappiness, 30);

        let flags = parse(&["--memory-swap", "-1", "--memory-swappiness", "-1"]);
        assert_eq!(flags.memory_swap, "-1");
        assert_eq!(flags.memory_swappiness, -1);
    }

    #[test]
    fn test_device_rate_flags_repeat() {
        let flags = parse(&[
            "--device-read-bps",
            "/dev/sda:1mb",
            "--device-read-bps",
            "/dev/sda:2mb",
        ]);
        assert_eq!(flags.device_read_bps, vec!["/dev/sda:1mb", "/dev/sda:2mb"]);
    }

    #[test]
    fn test_camel_case_lxcfs_flag() {
        let flags = parse(&["--enableLxcfs", "--privileged"]);
        assert!(flags.enable_lxcfs);
        assert!(flags.privileged);
    }
}

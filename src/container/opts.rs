//! Parsers for structured flag values
//!
//! Each parser returns the reason as a plain string on failure; the builder
//! attaches the flag name.

use super::config::{
    DeviceMapping, KeyValue, NamespaceMode, RestartPolicy, ThrottleDevice, WeightDevice,
    SWAPPINESS_UNSET,
};
use regex::Regex;
use std::sync::OnceLock;

pub type ParseResult<T> = std::result::Result<T, String>;

/// Lowest non-zero block IO weight
pub const MIN_BLKIO_WEIGHT: u16 = 10;
/// Highest block IO weight
pub const MAX_BLKIO_WEIGHT: u16 = 1000;

const DEFAULT_DEVICE_PERMISSIONS: &str = "rwm";

fn size_regex() -> &'static Regex {
    static SIZE: OnceLock<Regex> = OnceLock::new();
    SIZE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?) ?([kKmMgGtTpP])?[iI]?[bB]?$").expect("size pattern is valid")
    })
}

/// Parses a human size such as `512m`, `1.5g` or `1024` into bytes.
/// Multipliers are binary.
pub fn parse_size(s: &str) -> ParseResult<i64> {
    let caps = size_regex()
        .captures(s.trim())
        .ok_or_else(|| format!("invalid size: '{}'", s))?;

    let number: f64 = caps[1]
        .parse()
        .map_err(|_| format!("invalid size: '{}'", s))?;

    let shift = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => 0,
        Some(unit) => match unit.as_str() {
            "k" => 10,
            "m" => 20,
            "g" => 30,
            "t" => 40,
            _ => 50,
        },
    };

    let bytes = number * (1u64 << shift) as f64;
    if bytes > i64::MAX as f64 {
        return Err(format!("size out of range: '{}'", s));
    }
    Ok(bytes as i64)
}

/// Memory limit: empty means no limit
pub fn parse_memory(s: &str) -> ParseResult<i64> {
    if s.is_empty() {
        return Ok(0);
    }
    parse_size(s)
}

/// Memory plus swap: empty means unset, `-1` means unlimited
pub fn parse_memory_swap(s: &str) -> ParseResult<i64> {
    match s {
        "" => Ok(0),
        "-1" => Ok(-1),
        _ => parse_size(s),
    }
}

pub fn validate_swappiness(value: i64) -> ParseResult<i64> {
    if value == SWAPPINESS_UNSET || (0..=100).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is out of range [0, 100]", value))
    }
}

pub fn validate_blkio_weight(weight: u16) -> ParseResult<u16> {
    if weight == 0 || (MIN_BLKIO_WEIGHT..=MAX_BLKIO_WEIGHT).contains(&weight) {
        Ok(weight)
    } else {
        Err(format!(
            "{} is out of range [{}, {}] (0 disables)",
            weight, MIN_BLKIO_WEIGHT, MAX_BLKIO_WEIGHT
        ))
    }
}

/// Splits `<path>:<value>` and checks the path is a device node
fn split_device_pair(s: &str) -> ParseResult<(&str, &str)> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("bad format: '{}', expected <device-path>:<value>", s));
    }
    if !parts[0].starts_with("/dev/") {
        return Err(format!("bad format for device path: '{}'", parts[0]));
    }
    Ok((parts[0], parts[1]))
}

/// `--blkio-weight-device /dev/sda:300`
pub fn parse_weight_device(s: &str) -> ParseResult<WeightDevice> {
    let (path, value) = split_device_pair(s)?;
    let weight: u16 = value
        .parse()
        .map_err(|_| format!("invalid weight for device: '{}'", s))?;
    if !(MIN_BLKIO_WEIGHT..=MAX_BLKIO_WEIGHT).contains(&weight) {
        return Err(format!(
            "invalid weight for device: '{}', must be in [{}, {}]",
            s, MIN_BLKIO_WEIGHT, MAX_BLKIO_WEIGHT
        ));
    }
    Ok(WeightDevice {
        path: path.to_string(),
        weight,
    })
}

/// `--device-read-bps /dev/sda:1mb`
pub fn parse_throttle_bps(s: &str) -> ParseResult<ThrottleDevice> {
    let (path, value) = split_device_pair(s)?;
    let rate = parse_size(value).map_err(|_| format!("invalid rate for device: '{}'", s))?;
    Ok(ThrottleDevice {
        path: path.to_string(),
        rate: rate as u64,
    })
}

/// `--device-read-iops /dev/sda:400`
pub fn parse_throttle_iops(s: &str) -> ParseResult<ThrottleDevice> {
    let (path, value) = split_device_pair(s)?;
    let rate: u64 = value
        .parse()
        .map_err(|_| format!("invalid rate for device: '{}'", s))?;
    Ok(ThrottleDevice {
        path: path.to_string(),
        rate,
    })
}

fn valid_device_mode(mode: &str) -> bool {
    if mode.is_empty() {
        return false;
    }
    let mut seen = [false; 3];
    for c in mode.chars() {
        let idx = match c {
            'r' => 0,
            'w' => 1,
            'm' => 2,
            _ => return false,
        };
        if seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

/// `--device host[:container][:perms]`
pub fn parse_device_mapping(s: &str) -> ParseResult<DeviceMapping> {
    let parts: Vec<&str> = s.split(':').collect();
    let (host, mut container, perms) = match parts.as_slice() {
        [host] => (*host, "", DEFAULT_DEVICE_PERMISSIONS),
        [host, second] if valid_device_mode(second) => (*host, "", *second),
        [host, second] => (*host, *second, DEFAULT_DEVICE_PERMISSIONS),
        [host, container, perms] => (*host, *container, *perms),
        _ => return Err(format!("invalid device specification: '{}'", s)),
    };

    if host.is_empty() {
        return Err(format!("invalid device specification: '{}'", s));
    }
    if !valid_device_mode(perms) {
        return Err(format!("invalid device permissions '{}' in '{}'", perms, s));
    }
    if container.is_empty() {
        container = host;
    }

    Ok(DeviceMapping {
        path_on_host: host.to_string(),
        path_in_container: container.to_string(),
        cgroup_permissions: perms.to_string(),
    })
}

/// `--restart no|always|unless-stopped|on-failure[:N]`
pub fn parse_restart_policy(s: &str) -> ParseResult<RestartPolicy> {
    if s.is_empty() {
        return Ok(RestartPolicy::default());
    }

    let (name, count) = match s.split_once(':') {
        Some((name, count)) => (name, Some(count)),
        None => (s, None),
    };

    match (name, count) {
        ("no" | "always" | "unless-stopped", None) | ("on-failure", None) => Ok(RestartPolicy {
            name: name.to_string(),
            maximum_retry_count: 0,
        }),
        ("on-failure", Some(count)) => {
            let maximum_retry_count: i64 = count
                .parse()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| format!("invalid maximum retry count: '{}'", count))?;
            Ok(RestartPolicy {
                name: name.to_string(),
                maximum_retry_count,
            })
        }
        ("no" | "always" | "unless-stopped", Some(_)) => Err(format!(
            "maximum retry count cannot be used with restart policy '{}'",
            name
        )),
        _ => Err(format!("invalid restart policy: '{}'", s)),
    }
}

/// `key=value`; the value may be empty, the key may not
pub fn parse_key_value(s: &str) -> ParseResult<KeyValue> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(KeyValue::new(key, value)),
        _ => Err(format!("'{}' is not in key=value format", s)),
    }
}

/// Namespace mode. Anything other than empty, `host` or `container:<name>`
/// is handed to the daemon as written.
pub fn parse_namespace_mode(s: &str) -> NamespaceMode {
    match s {
        "" => NamespaceMode::Private,
        "host" => NamespaceMode::Host,
        _ => match s.strip_prefix("container:") {
            Some(name) if !name.is_empty() => NamespaceMode::Container(name.to_string()),
            _ => NamespaceMode::Other(s.to_string()),
        },
    }
}

/// Entrypoint override, split on whitespace
pub fn parse_entrypoint(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1k").unwrap(), 1024);
        assert_eq!(parse_size("512m").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1 << 30);
        assert_eq!(parse_size("1.5g").unwrap(), 3 << 29);
        assert_eq!(parse_size("2 MiB").unwrap(), 2 << 20);
        assert!(parse_size("").is_err());
        assert!(parse_size("-1").is_err());
        assert!(parse_size("12x").is_err());
    }

    #[test]
    fn test_memory_and_swap() {
        assert_eq!(parse_memory("").unwrap(), 0);
        assert_eq!(parse_memory("64m").unwrap(), 64 << 20);
        assert_eq!(parse_memory_swap("").unwrap(), 0);
        assert_eq!(parse_memory_swap("-1").unwrap(), -1);
        assert_eq!(parse_memory_swap("1g").unwrap(), 1 << 30);
        assert!(parse_memory_swap("-2").is_err());
    }

    #[test]
    fn test_swappiness_range() {
        assert_eq!(validate_swappiness(-1).unwrap(), -1);
        assert_eq!(validate_swappiness(0).unwrap(), 0);
        assert_eq!(validate_swappiness(100).unwrap(), 100);
        assert!(validate_swappiness(101).is_err());
        assert!(validate_swappiness(-2).is_err());
    }

    #[test]
    fn test_blkio_weight_range() {
        assert!(validate_blkio_weight(0).is_ok());
        assert!(validate_blkio_weight(10).is_ok());
        assert!(validate_blkio_weight(1000).is_ok());
        assert!(validate_blkio_weight(9).is_err());
        assert!(validate_blkio_weight(1001).is_err());
    }

    #[test]
    fn test_weight_device() {
        let dev = parse_weight_device("/dev/sda:300").unwrap();
        assert_eq!(dev.path, "/dev/sda");
        assert_eq!(dev.weight, 300);
        assert!(parse_weight_device("/dev/sda:5").is_err());
        assert!(parse_weight_device("/dev/sda").is_err());
        assert!(parse_weight_device("sda:300").is_err());
        assert!(parse_weight_device("/dev/sda:abc").is_err());
    }

    #[test]
    fn test_throttle_devices() {
        let bps = parse_throttle_bps("/dev/sda:1mb").unwrap();
        assert_eq!(bps.rate, 1 << 20);
        let iops = parse_throttle_iops("/dev/sdb:400").unwrap();
        assert_eq!(iops.path, "/dev/sdb");
        assert_eq!(iops.rate, 400);
        assert!(parse_throttle_iops("/dev/sdb:1k").is_err());
        assert!(parse_throttle_bps("/dev/sda:fast").is_err());
        assert!(parse_throttle_bps("/dev/sda:1:2").is_err());
    }

    #[test]
    fn test_device_mapping_forms() {
        let dev = parse_device_mapping("/dev/fuse").unwrap();
        assert_eq!(dev.path_in_container, "/dev/fuse");
        assert_eq!(dev.cgroup_permissions, "rwm");

        let dev = parse_device_mapping("/dev/fuse:r").unwrap();
        assert_eq!(dev.path_in_container, "/dev/fuse");
        assert_eq!(dev.cgroup_permissions, "r");

        let dev = parse_device_mapping("/dev/sda:/dev/xvda").unwrap();
        assert_eq!(dev.path_in_container, "/dev/xvda");
        assert_eq!(dev.cgroup_permissions, "rwm");

        let dev = parse_device_mapping("/dev/sda:/dev/xvda:rw").unwrap();
        assert_eq!(dev.cgroup_permissions, "rw");

        assert!(parse_device_mapping("/dev/sda:/dev/xvda:rx").is_err());
        assert!(parse_device_mapping("/dev/sda:/dev/xvda:rr").is_err());
        assert!(parse_device_mapping("a:b:c:d").is_err());
        assert!(parse_device_mapping(":/dev/xvda").is_err());
    }

    #[test]
    fn test_restart_policy() {
        assert_eq!(parse_restart_policy("").unwrap(), RestartPolicy::default());
        assert_eq!(parse_restart_policy("always").unwrap().name, "always");
        let policy = parse_restart_policy("on-failure:3").unwrap();
        assert_eq!(policy.name, "on-failure");
        assert_eq!(policy.maximum_retry_count, 3);
        assert!(parse_restart_policy("always:3").is_err());
        assert!(parse_restart_policy("on-failure:-1").is_err());
        assert!(parse_restart_policy("sometimes").is_err());
    }

    #[test]
    fn test_key_value() {
        assert_eq!(parse_key_value("a=b=c").unwrap(), KeyValue::new("a", "b=c"));
        assert_eq!(parse_key_value("a=").unwrap(), KeyValue::new("a", ""));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_namespace_mode() {
        assert_eq!(parse_namespace_mode(""), NamespaceMode::Private);
        assert_eq!(parse_namespace_mode("host"), NamespaceMode::Host);
        assert_eq!(
            parse_namespace_mode("container:db"),
            NamespaceMode::Container("db".to_string())
        );
        for mode in ["private", "shareable", "none", "container:"] {
            assert_eq!(parse_namespace_mode(mode), NamespaceMode::Other(mode.to_string()));
            assert_eq!(parse_namespace_mode(mode).to_string(), mode);
        }
    }

    #[test]
    fn test_entrypoint_split() {
        assert!(parse_entrypoint("").is_empty());
        assert_eq!(parse_entrypoint(" /bin/sh  -c "), vec!["/bin/sh", "-c"]);
    }
}

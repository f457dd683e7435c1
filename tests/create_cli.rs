//! End-to-end tests for `pouch create` against a fake daemon on a Unix socket.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use tempfile::TempDir;

const ID: &str = "e1d541722d68dc5d133cca9e7bd8fd9338603e1763096c8e853522b60d11f7b9";

/// Accept one connection, answer with `status`/`body`, and hand back the raw
/// request.
fn fake_daemon(socket: &Path, status: &'static str, body: String) -> JoinHandle<String> {
    let listener = UnixListener::bind(socket).expect("bind fake daemon socket");
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).expect("read request");
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length: usize = text[..head_end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse().ok())
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let reply = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(reply.as_bytes()).expect("write reply");
        String::from_utf8(request).expect("utf-8 request")
    })
}

fn socket_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("pouchd.sock")
}

fn pouch(tmp: &TempDir, args: &[&str]) -> Output {
    let host = format!("unix://{}", socket_path(tmp).display());
    Command::new(env!("CARGO_BIN_EXE_pouch"))
        .args(["-H", &host, "--timeout", "10"])
        .args(args)
        .env_remove("POUCH_HOST")
        .env_remove("RUST_LOG")
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path())
        .output()
        .expect("failed to execute pouch")
}

#[test]
fn create_prints_id_and_name() {
    let tmp = TempDir::new().unwrap();
    let daemon = fake_daemon(
        &socket_path(&tmp),
        "201 Created",
        format!(r#"{{"Id":"{}","Name":"foo","Warnings":null}}"#, ID),
    );

    let output = pouch(&tmp, &["create", "--name", "foo", "busybox:latest"]);
    let request = daemon.join().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("container ID: {}, name: foo\n", ID)
    );
    assert!(request.starts_with("POST /containers/create?name=foo HTTP/1.1\r\n"));
    assert!(request.contains(r#""Image":"busybox:latest""#));
}

#[test]
fn create_prints_warnings_first() {
    let tmp = TempDir::new().unwrap();
    let daemon = fake_daemon(
        &socket_path(&tmp),
        "201 Created",
        format!(r#"{{"Id":"{}","Name":"foo","Warnings":["low memory"]}}"#, ID),
    );

    let output = pouch(&tmp, &["create", "--name", "foo", "-m", "4m", "busybox"]);
    daemon.join().unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("WARNING: low memory\ncontainer ID: {}, name: foo\n", ID)
    );
}

#[test]
fn create_sends_flags_and_command() {
    let tmp = TempDir::new().unwrap();
    let daemon = fake_daemon(
        &socket_path(&tmp),
        "201 Created",
        format!(r#"{{"Id":"{}","Name":"gen-1"}}"#, ID),
    );

    let output = pouch(
        &tmp,
        &[
            "create",
            "--device-read-bps",
            "/dev/sda:1mb",
            "--device-read-bps",
            "/dev/sda:2mb",
            "--ipc",
            "host",
            "--cap-add",
            "NET_ADMIN",
            "busybox",
            "top",
            "-b",
        ],
    );
    let request = daemon.join().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).ends_with("name: gen-1\n"));

    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(value["Cmd"], serde_json::json!(["top", "-b"]));
    assert_eq!(value["HostConfig"]["IpcMode"], "host");
    assert_eq!(value["HostConfig"]["CapAdd"], serde_json::json!(["NET_ADMIN"]));
    assert_eq!(
        value["HostConfig"]["BlkioDeviceReadBps"],
        serde_json::json!([{"Path": "/dev/sda", "Rate": 2097152}])
    );
}

#[test]
fn create_reports_daemon_failure() {
    let tmp = TempDir::new().unwrap();
    let daemon = fake_daemon(
        &socket_path(&tmp),
        "404 Not Found",
        r#"{"message":"image not found"}"#.to_string(),
    );

    let output = pouch(&tmp, &["create", "nosuchimage"]);
    daemon.join().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to create container: image not found"),
        "got: {stderr}"
    );
    assert!(!String::from_utf8_lossy(&output.stdout).contains("container ID"));
}

#[test]
fn create_without_image_never_contacts_daemon() {
    let tmp = TempDir::new().unwrap();
    let listener = UnixListener::bind(socket_path(&tmp)).unwrap();
    listener.set_nonblocking(true).unwrap();

    let output = pouch(&tmp, &["create", "--name", "foo"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("requires at least 1 argument"));
    match listener.accept() {
        Err(e) => assert_eq!(e.kind(), ErrorKind::WouldBlock),
        Ok(_) => panic!("daemon was contacted"),
    }
}

#[test]
fn create_rejects_bad_device_rate() {
    let tmp = TempDir::new().unwrap();
    let listener = UnixListener::bind(socket_path(&tmp)).unwrap();
    listener.set_nonblocking(true).unwrap();

    let output = pouch(&tmp, &["create", "--device-write-iops", "/dev/sda:lots", "busybox"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--device-write-iops"));
    assert!(listener.accept().is_err());
}

#[test]
fn create_help_shows_description_and_example() {
    let tmp = TempDir::new().unwrap();
    let output = pouch(&tmp, &["create", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Create a static container object in Pouchd"));
    assert!(stdout.contains("pouch create --name foo busybox:latest"));
    assert!(stdout.contains("--blkio-weight-device"));
}

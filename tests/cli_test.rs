//! End-to-end runs of the built binary against stand-in yt-dlp/ffmpeg scripts.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}

/// Fake tools that answer the version probes and "download" `output`
fn fake_tools(bin: &Path, output: &Path) {
    fs::create_dir_all(bin).unwrap();
    write_script(&bin.join("ffmpeg"), "exit 0");
    write_script(
        &bin.join("yt-dlp"),
        &format!(
            r#"if [ "$1" = "--version" ]; then echo 2024.01.01; exit 0; fi
echo "[progress] 512 2048 NA"
echo "[progress] 2048 2048 NA"
touch "{file}"
echo "[file] {file}"
exit 0"#,
            file = output.display()
        ),
    );
}

#[test]
fn json_mode_keeps_stdout_to_event_lines() {
    let temp = TempDir::new().expect("temp dir");
    let bin = temp.path().join("bin");
    let out_dir = temp.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();
    fake_tools(&bin, &out_dir.join("clip.mp3"));

    let path = format!(
        "{}:{}",
        bin.display(),
        std::env::var("PATH").unwrap_or_default()
    );
    let output = Command::new(env!("CARGO_BIN_EXE_medialoader"))
        .arg("--json")
        .arg("--config")
        .arg(temp.path().join("config.txt"))
        .arg("--dest")
        .arg(&out_dir)
        .arg("http://a")
        .env("PATH", path)
        .output()
        .expect("run medialoader");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);

    let events: Vec<String> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line)
                .unwrap_or_else(|e| panic!("non-JSON line on stdout {:?}: {}", line, e));
            value["event"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(events.first().map(String::as_str), Some("started"));
    assert_eq!(events.last().map(String::as_str), Some("finished"));
    assert_eq!(events.iter().filter(|e| *e == "finished").count(), 1);
    assert!(stderr.contains("Starting queue run"));
}

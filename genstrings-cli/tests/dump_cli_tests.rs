use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn genstrings_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("genstrings"))
}

fn dump(path: &std::path::Path) -> std::process::Output {
    genstrings_cmd()
        .args(["dump", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_dump_info_plist_as_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Info.plist");
    fs::write(
        &path,
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
            "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
            "<plist version=\"1.0\"><dict>",
            "<key>CFBundleDisplayName</key><string>Demo</string>",
            "<key>LSRequiresIPhoneOS</key><true/>",
            "<key>Version</key><integer>3</integer>",
            "<key>Icon</key><data>ab+/</data>",
            "</dict></plist>\n"
        ),
    )
    .unwrap();

    let output = dump(&path);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "CFBundleDisplayName": "Demo",
            "Icon": [105, 191, 191],
            "LSRequiresIPhoneOS": true,
            "Version": 3
        })
    );
}

#[test]
fn test_dump_objc_routine_calls() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("View.m");
    fs::write(&path, "x = NSLocalizedString(@\"a\" @\"b\", @\"c\");\n").unwrap();

    let output = dump(&path);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["key"], "ab");
    assert_eq!(json[0]["comment"], "c");
    assert_eq!(json[0]["start_line"], 1);
    assert_eq!(json[0]["start_col"], 5);
}

#[test]
fn test_dump_reports_lex_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Localizable.strings");
    fs::write(&path, "\"a\" = \"\\q\";\n").unwrap();

    let output = dump(&path);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Localizable.strings:1:7: invalid escape"),
        "{stderr}"
    );
}

use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voiceclip_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voiceclip").expect("voiceclip test binary not built")
}

#[test]
fn voiceclip_help_mentions_name() {
    let output = Command::new(voiceclip_bin())
        .arg("--help")
        .output()
        .expect("run voiceclip --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("VoiceClip"));
}

#[test]
fn voiceclip_list_input_devices_prints_message() {
    let output = Command::new(voiceclip_bin())
        .arg("--list-input-devices")
        .output()
        .expect("run voiceclip --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("Failed to list audio input devices")
    );
}

#[test]
fn voiceclip_rejects_invalid_threshold() {
    let output = Command::new(voiceclip_bin())
        .args(["--threshold", "2.0", "--run-secs", "1"])
        .output()
        .expect("run voiceclip with bad threshold");
    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("--threshold"));
}

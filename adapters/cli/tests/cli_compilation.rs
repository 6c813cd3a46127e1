use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "tileworld"])
        .status()
        .expect("failed to invoke cargo check for tileworld CLI binary");

    assert!(status.success(), "cargo check --bin tileworld should succeed");
}

#[test]
fn demo_scenario_runs_to_completion() {
    let output = Command::new(env!("CARGO_BIN_EXE_tileworld"))
        .args(["--ticks", "30", "--dump-mesh"])
        .output()
        .expect("failed to run tileworld CLI binary");

    assert!(output.status.success(), "tileworld exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("navigation mesh:"));
    assert!(stdout.contains("Pedestrian"));
}

#[test]
fn missing_scenario_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_tileworld"))
        .args(["--scenario", "does-not-exist.toml"])
        .output()
        .expect("failed to run tileworld CLI binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scenario"));
}

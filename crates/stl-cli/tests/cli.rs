//! CLI command integration tests.
//! Each test writes into its own temp directory.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stl_cmd() -> Command {
    #[allow(deprecated)]
    let cmd = Command::cargo_bin("stl").unwrap();
    cmd
}

fn write_negctl(dir: &TempDir) -> std::path::PathBuf {
    stl_cmd()
        .args(["synth", "negctl", "--out-dir"])
        .arg(dir.path().join("synth"))
        .assert()
        .success();
    dir.path().join("synth/negctl_input.csv")
}

#[test]
fn classify_make_sample_then_classify() {
    let dir = TempDir::new().unwrap();
    let sample_dir = dir.path().join("sample");
    stl_cmd()
        .args(["classify", "--make-sample", "--out-dir"])
        .arg(&sample_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("sample_input.csv"));

    let out = dir.path().join("out");
    stl_cmd()
        .args(["classify", "--input"])
        .arg(sample_dir.join("sample_input.csv"))
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("rows=50"));

    let trace = fs::read_to_string(out.join("stl_trace_out.csv")).unwrap();
    assert!(trace.starts_with("t,d,delta_d,r,s,state,phi_T\n"));
    assert_eq!(trace.lines().count(), 51);
    assert!(out.join("summary.txt").exists());
    let manifest = fs::read_to_string(out.join("MANIFEST.sha256")).unwrap();
    assert_eq!(manifest.lines().count(), 2);
}

#[test]
fn classify_rejects_bad_window() {
    let dir = TempDir::new().unwrap();
    let input = write_negctl(&dir);
    stl_cmd()
        .args(["classify", "--w", "0", "--input"])
        .arg(&input)
        .arg("--out-dir")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("W must be >= 1"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn classify_reports_bad_line() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.csv");
    fs::write(&input, "t,d\n0,0.1\n1,oops\n").unwrap();
    stl_cmd()
        .args(["classify", "--input"])
        .arg(&input)
        .arg("--out-dir")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn audit_threshold_is_premature() {
    let dir = TempDir::new().unwrap();
    let input = write_negctl(&dir);
    let out = dir.path().join("sad");
    stl_cmd()
        .args(["audit", "--w", "20", "--tau-s", "0.9", "--tau-l", "0.1", "--eps", "0.02"])
        .args(["--rule", "d>=0.5", "--events", "enter_true", "--input"])
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("SAD(P):      1.000000"));

    let i3 = fs::read_to_string(out.join("SAD_TABLE_I3_EVENT_ACCOUNTING.csv")).unwrap();
    assert_eq!(i3, "E_total,E_premature,E_aligned,SAD(P)\n1,1,0,1.000000\n");
}

#[test]
fn audit_debounced_from_config_is_zero() {
    let dir = TempDir::new().unwrap();
    let input = write_negctl(&dir);
    let config = dir.path().join("run.toml");
    fs::write(
        &config,
        "[params]\nW = 20\ntau_s = 0.9\ntau_l = 0.1\neps = 0.02\n\n\
         [dataset]\nname = \"negctl\"\n\n[naive]\npolicy = \"debounced\"\n",
    )
    .unwrap();

    stl_cmd()
        .args(["audit", "--json", "--config"])
        .arg(&config)
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(dir.path().join("sad"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"e_premature\": 0"))
        .stdout(predicate::str::contains("\"name\": \"negctl\""));
}

#[test]
fn audit_against_exported_trace() {
    let dir = TempDir::new().unwrap();
    let input = write_negctl(&dir);
    let classified = dir.path().join("classify");
    stl_cmd()
        .args(["classify", "--w", "20", "--tau-s", "0.9", "--tau-l", "0.1", "--eps", "0.02"])
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(&classified)
        .assert()
        .success();

    stl_cmd()
        .args(["audit", "--w", "20", "--tau-s", "0.9", "--tau-l", "0.1", "--input"])
        .arg(&input)
        .arg("--trace")
        .arg(classified.join("stl_trace_out.csv"))
        .arg("--out-dir")
        .arg(dir.path().join("unstated"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing: eps"));
    assert!(!dir.path().join("unstated").exists());

    let out = dir.path().join("sad");
    stl_cmd()
        .args(["audit", "--w", "20", "--tau-s", "0.9", "--tau-l", "0.1", "--eps", "0.02"])
        .args(["--mode", "ge", "--threshold", "0.5", "--events", "enter_true", "--input"])
        .arg(&input)
        .arg("--trace")
        .arg(classified.join("stl_trace_out.csv"))
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("E_premature: 1"));

    let i4 = fs::read_to_string(out.join("SAD_TABLE_I4_EVENT_TIMING.csv")).unwrap();
    assert!(i4.contains("1,24,enter_true,24.000000,TRUE,,47.000000,23.000000,YES,NO"));
}

#[test]
fn audit_no_events_is_na() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("flat.csv");
    let mut csv = String::from("t,d\n");
    for i in 0..30 {
        csv.push_str(&format!("{i},0.3\n"));
    }
    fs::write(&input, csv).unwrap();

    stl_cmd()
        .args(["audit", "--rule", "d>=0.5", "--input"])
        .arg(&input)
        .arg("--out-dir")
        .arg(dir.path().join("sad"))
        .assert()
        .success()
        .stdout(predicate::str::contains("SAD(P):      NA"));
}

#[test]
fn audit_rejects_bad_rule() {
    let dir = TempDir::new().unwrap();
    let input = write_negctl(&dir);
    stl_cmd()
        .args(["audit", "--rule", "d == 0.5", "--input"])
        .arg(&input)
        .arg("--out-dir")
        .arg(dir.path().join("sad"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn algebra_passes() {
    let dir = TempDir::new().unwrap();
    stl_cmd()
        .args(["algebra", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("OVERALL: PASS"));
    assert!(dir.path().join("operator_preservation_table.csv").exists());
    assert!(dir.path().join("MANIFEST.sha256").exists());
}

#[test]
fn synth_generators() {
    let dir = TempDir::new().unwrap();
    for (kind, file, rows) in [
        ("threshold-stress", "threshold_stress_input.csv", 4 * 60),
        ("ice-like", "ice_like_input.csv", 104),
        ("sample", "sample_input.csv", 50),
    ] {
        let out = dir.path().join(kind);
        stl_cmd()
            .args(["synth", kind, "--out-dir"])
            .arg(&out)
            .assert()
            .success();
        let text = fs::read_to_string(out.join(file)).unwrap();
        assert_eq!(text.lines().count(), rows + 1, "{kind}");
    }

    stl_cmd()
        .args(["synth", "threshold-stress", "--step", "0", "--out-dir"])
        .arg(dir.path().join("bad"))
        .assert()
        .failure();
}

#[test]
fn drawdown_adapter() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prices.tsv");
    fs::write(
        &input,
        "Date\tOpen\tClose\n2020-01-03\t1\t90\n2020-01-01\t1\t100\n2020-01-02\t1\t95\n",
    )
    .unwrap();
    let out = dir.path().join("adapter");
    stl_cmd()
        .args(["drawdown", "--lookback", "2", "--dd-scale", "0.2", "--input"])
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("dates=2020-01-01..2020-01-03"));

    let text = fs::read_to_string(out.join("stl_input_t_d.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "t,d,close,roll_peak,drawdown");
    assert_eq!(lines[1], "0.000000,0.000000,100.000000,100.000000,0.000000");
    // peak over the last two rows is 95
    assert!(lines[3].starts_with("2.000000,"));
    assert!(lines[3].contains(",90.000000,95.000000,"));
}

#[test]
fn verify_replay_passes() {
    let dir = TempDir::new().unwrap();
    stl_cmd()
        .args(["verify", "--replay", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("VERIFY_REPLAY: PASS"));

    let base = dir.path().join("stl_verify_out/REPLAY_A");
    assert!(base.join("MANIFEST.sha256").exists());
    assert!(base.join("NEGCTL_SWEEP/SAD/SAD_TABLE_I2_RUN_DECLARATION.csv").exists());
    assert!(base.join("NEGCTL_SWEEP/SAD_DEBOUNCED/MANIFEST.sha256").exists());
    assert!(base.join("OPERATOR_PRESERVATION/summary.txt").exists());
}

#[test]
fn verify_single_run_b() {
    let dir = TempDir::new().unwrap();
    stl_cmd()
        .args(["verify", "--run-id", "B", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: STL verification complete"));
    assert!(dir.path().join("stl_verify_out/REPLAY_B/summary.txt").exists());
}

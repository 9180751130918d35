use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn sample_csv(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("tips.csv");
    fs::write(
        &path,
        "day,bill,tip\nThu,16.9,1.0\nFri,10.3,1.7\nSat,21.0,3.5\nSun,23.7,3.3\nThu,24.6,3.6\n",
    )
    .unwrap();
    path
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("scatter"))
        .stdout(predicate::str::contains("pair"))
        .stdout(predicate::str::contains("box"));
}

#[test]
fn subcommand_help_lists_common_options() {
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.args(["joint", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--annotation"))
        .stdout(predicate::str::contains("--hue"))
        .stdout(predicate::str::contains("--kind"));
}

#[test]
fn missing_column_fails_with_its_name() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_csv(dir.path());
    let out = dir.path().join("out.svg");
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("scatter")
        .arg("--data")
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["-x", "bill", "-y", "tips"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("tips"));
    assert!(!out.exists());
}

#[test]
fn unknown_joint_kind_is_rejected_by_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_csv(dir.path());
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("joint")
        .arg("--data")
        .arg(&data)
        .args(["--out", "x.svg", "-x", "bill", "-y", "tip", "--kind", "swirl"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("swirl"));
}

#[test]
fn negative_pie_values_fail() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("shares.csv");
    fs::write(&data, "name,share\na,3\nb,-1\n").unwrap();
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("pie")
        .arg("--data")
        .arg(&data)
        .arg("--out")
        .arg(dir.path().join("pie.svg"))
        .args(["--values", "share", "--labels", "name"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn scatter_writes_svg_when_a_font_is_available() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_csv(dir.path());
    let out = dir.path().join("tips.svg");
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("scatter")
        .arg("--data")
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["-x", "bill", "-y", "tip", "--hue", "day", "--title", "Tips"]);
    let output = cmd.output().unwrap();
    if output.status.success() {
        assert!(fs::read_to_string(&out).unwrap().contains("Tips"));
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("no usable font"), "unexpected failure: {stderr}");
    }
}

#[test]
fn displot_with_a_blank_hue_reports_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("blank.csv");
    fs::write(&data, "v,h\n1,\n2,\n3,\n").unwrap();
    let out = dir.path().join("blank.svg");
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("displot")
        .arg("--data")
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["-y", "v", "--hue", "h"]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Wrote chart").not());
    assert!(!out.exists());
}

#[test]
fn displot_without_values_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("missing.csv");
    fs::write(&data, "v,h\n,a\n,b\n").unwrap();
    let out = dir.path().join("missing.svg");
    let mut cmd = Command::cargo_bin("neon").unwrap();
    cmd.arg("displot")
        .arg("--data")
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["-y", "v"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no data to plot"));
    assert!(!out.exists());
}

#[test]
fn displot_keeps_its_own_size_unless_asked() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_csv(dir.path());
    let run = |name: &str, extra: &[&str]| {
        let out = dir.path().join(name);
        let mut cmd = Command::cargo_bin("neon").unwrap();
        cmd.arg("displot")
            .arg("--data")
            .arg(&data)
            .arg("--out")
            .arg(&out)
            .args(["-y", "tip"])
            .args(extra);
        let output = cmd.output().unwrap();
        if output.status.success() {
            Some(fs::read_to_string(&out).unwrap())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("no usable font"), "unexpected failure: {stderr}");
            None
        }
    };
    if let Some(svg) = run("default.svg", &[]) {
        assert!(svg.contains(r#"width="800""#));
        assert!(svg.contains(r#"height="600""#));
    }
    if let Some(svg) = run("wide.svg", &["--width", "1000"]) {
        assert!(svg.contains(r#"width="1000""#));
        assert!(svg.contains(r#"height="600""#));
    }
}

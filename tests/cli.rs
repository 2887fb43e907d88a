//! The `heatgrid` binary: argument handling, exit status and output.

use std::path::Path;
use std::process::{Command, Output};

use heatgrid_git::{GitRepo, GixRepo, RefName};
use tempfile::TempDir;

fn heatgrid(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_heatgrid"))
        .args(args)
        .current_dir(cwd)
        .env("HEATGRID_LOG", "warn")
        .env_remove("HEATGRID_SEED")
        .output()
        .expect("failed to run heatgrid")
}

/// Runs with no git identity anywhere: empty home, no system config, no
/// identity environment variables.
fn heatgrid_without_identity(args: &[&str], cwd: &Path) -> Output {
    let home = cwd.join("empty-home");
    std::fs::create_dir_all(&home).unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_heatgrid"));
    cmd.args(args)
        .current_dir(cwd)
        .env("HEATGRID_LOG", "warn")
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", &home)
        .env("GIT_CONFIG_NOSYSTEM", "1");
    for var in [
        "HEATGRID_SEED",
        "GIT_CONFIG_GLOBAL",
        "GIT_CONFIG_SYSTEM",
        "GIT_AUTHOR_NAME",
        "GIT_AUTHOR_EMAIL",
        "GIT_COMMITTER_NAME",
        "GIT_COMMITTER_EMAIL",
        "EMAIL",
    ] {
        cmd.env_remove(var);
    }
    cmd.output().expect("failed to run heatgrid")
}

fn tip_author(repo: &Path) -> (String, String) {
    let repo = GixRepo::open(repo).unwrap();
    let tip = repo
        .read_ref(&RefName::branch("main").unwrap())
        .unwrap()
        .unwrap();
    let author = repo.read_commit(tip).unwrap().author;
    (author.name, author.email)
}

fn zero_grid_with(line: usize, row: &str) -> String {
    let mut lines = vec!["#######"; 52];
    lines[line] = row;
    lines.join("\n") + "\n"
}

#[test]
fn bad_row_length_fails_before_touching_the_repo() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grid.txt"), zero_grid_with(5, "######")).unwrap();

    let out = heatgrid(&["2022", "grid.txt", "--repo", "out"], dir.path());
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("week 5"), "{stderr}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unknown_glyph_is_named() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grid.txt"), zero_grid_with(9, "###Z###")).unwrap();

    let out = heatgrid(&["2022", "grid.txt", "--repo", "out"], dir.path());
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("week 9, day 3"), "{stderr}");
    assert!(stderr.contains("'Z'"), "{stderr}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn out_of_range_year_fails() {
    let dir = TempDir::new().unwrap();
    let out = heatgrid(&["1800", "--repo", "out"], dir.path());
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid year 1800"), "{stderr}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn dry_run_prints_json_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = heatgrid(
        &["2022", "--repo", "out", "--seed", "7", "--dry-run", "--format", "json"],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["seed"], 7);
    assert_eq!(summary["dry_run"], true);
    assert_eq!(summary["written"], 0);
    assert!(summary["planned"].as_u64().unwrap() > 0);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn config_file_is_honoured() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("out");
    std::fs::create_dir(&repo).unwrap();
    std::fs::write(
        dir.path().join("grid.txt"),
        zero_grid_with(20, "#$#####"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("heatgrid.toml"),
        "[repo]\nbranch = \"drawing\"\n\n[build]\nbatch_size = 2\n",
    )
    .unwrap();

    let out = heatgrid(
        &[
            "2022",
            "grid.txt",
            "--repo",
            "out",
            "--seed",
            "3",
            "--config",
            "heatgrid.toml",
        ],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("refs/heads/drawing"), "{stdout}");
    let tip = GixRepo::open(&repo)
        .unwrap()
        .read_ref(&RefName::branch("drawing").unwrap())
        .unwrap();
    assert!(tip.is_some());
}

#[test]
fn malformed_config_reports_its_line() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bad.toml"), "[build]\nbatch_size = \"many\"\n").unwrap();
    let out = heatgrid(
        &["2022", "--repo", "out", "--config", "bad.toml"],
        dir.path(),
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("bad.toml"), "{stderr}");
    assert!(stderr.contains("line 2"), "{stderr}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn configured_identity_is_enough_without_git_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grid.txt"), zero_grid_with(3, "##$####")).unwrap();
    std::fs::write(
        dir.path().join("heatgrid.toml"),
        "[identity]\nname = \"Pat\"\nemail = \"pat@example.com\"\n",
    )
    .unwrap();

    let out = heatgrid_without_identity(
        &["2022", "grid.txt", "--repo", "art", "--seed", "2", "--config", "heatgrid.toml"],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        tip_author(&dir.path().join("art")),
        ("Pat".to_owned(), "pat@example.com".to_owned())
    );
}

#[test]
fn placeholder_identity_is_used_without_any_configuration() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grid.txt"), zero_grid_with(3, "##$####")).unwrap();

    let out = heatgrid_without_identity(
        &["2022", "grid.txt", "--repo", "art", "--seed", "2"],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        tip_author(&dir.path().join("art")),
        ("heatgrid".to_owned(), "heatgrid@localhost".to_owned())
    );
}

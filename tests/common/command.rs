use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with `1.txt`, `a/2.txt` and `a/b/3.txt` committed on master
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one\n".to_string()));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three\n".to_string(),
    ));

    run_kit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    kit_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_kit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("kit").expect("Failed to find kit binary");
    cmd.current_dir(dir);
    cmd.envs([
        ("NO_COLOR", "1"),
        ("GIT_AUTHOR_NAME", AUTHOR_NAME),
        ("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("GIT_AUTHOR_DATE", AUTHOR_DATE),
    ]);
    cmd.env_remove("KIT_LOG");
    cmd.args(args);
    cmd
}

pub fn kit_commit(dir: &Path, message: &str) -> Command {
    run_kit_command(dir, &["commit", "-m", message])
}

/// Write `content` to `path`, stage it and commit it
pub fn commit_file(dir: &Path, path: &str, content: &str, message: &str) {
    write_file(FileSpec::new(dir.join(path), content.to_string()));
    run_kit_command(dir, &["add", path]).assert().success();
    kit_commit(dir, message).assert().success();
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success();
    String::from_utf8(output.get_output().stdout.clone()).expect("stdout should be UTF-8")
}

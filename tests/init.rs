use assert_fs::TempDir;
use predicates::prelude::*;
use rstest::rstest;

mod common;
use common::command::{repository_dir, run_kit_command};

#[rstest]
fn new_repository_initiated_with_kit_directory(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir_absolute_path = repository_dir.path().canonicalize()?.display().to_string();

    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Initialized empty kit repository in .+\.kit\n$")?)
        .stdout(predicate::str::contains(dir_absolute_path));

    let kit_dir = repository_dir.path().join(".kit");
    assert!(kit_dir.join("objects").is_dir());
    assert!(kit_dir.join("refs").join("heads").is_dir());
    assert!(kit_dir.join("refs").join("tags").is_dir());
    assert_eq!(std::fs::read_to_string(kit_dir.join("HEAD"))?, "ref: refs/heads/master");

    Ok(())
}

#[rstest]
fn init_is_idempotent(repository_dir: TempDir) {
    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Reinitialized existing kit repository in"));
}

#[rstest]
fn init_creates_the_target_directory(repository_dir: TempDir) {
    let target = repository_dir.path().join("nested").join("project");

    run_kit_command(repository_dir.path(), &["init", "nested/project"])
        .assert()
        .success();

    assert!(target.join(".kit").join("HEAD").is_file());
}

#[rstest]
fn commands_are_found_from_a_subdirectory(repository_dir: TempDir) {
    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    let nested = repository_dir.path().join("src").join("deep");
    std::fs::create_dir_all(&nested).unwrap();

    run_kit_command(&nested, &["status"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("On branch master"));
}

#[rstest]
fn commands_outside_a_repository_fail(repository_dir: TempDir) {
    run_kit_command(repository_dir.path(), &["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a kit repository"));
}

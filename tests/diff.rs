use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::command::{init_repository_dir, run_kit_command, stdout_of};

const ONE_BLOB: &str = "5626abf";
const UNO_BLOB: &str = "e438487";
const THREE_BLOB: &str = "2bdf67a";

fn modified_one_patch() -> String {
    format!(
        "diff --kit a/1.txt b/1.txt\n\
         index {ONE_BLOB}..{UNO_BLOB}\n\
         --- a/1.txt\n\
         +++ b/1.txt\n\
         @@ -1,1 +1,1 @@\n\
         -one\n\
         +uno\n"
    )
}

#[rstest]
fn show_unstaged_changes(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("1.txt").write_str("uno\n")?;
    init_repository_dir.child("untracked.txt").write_str("ignored by diff\n")?;

    assert_eq!(stdout_of(&mut run_kit_command(dir, &["diff"])), modified_one_patch());
    run_kit_command(dir, &["diff", "--cached"]).assert().success().stdout("");

    Ok(())
}

#[rstest]
fn show_staged_changes(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("1.txt").write_str("uno\n")?;
    run_kit_command(dir, &["add", "1.txt"]).assert().success();

    run_kit_command(dir, &["diff"]).assert().success().stdout("");
    assert_eq!(
        stdout_of(&mut run_kit_command(dir, &["diff", "--cached"])),
        modified_one_patch()
    );

    Ok(())
}

#[rstest]
fn show_deleted_file(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    std::fs::remove_file(dir.join("a").join("b").join("3.txt"))?;

    run_kit_command(dir, &["diff"]).assert().success().stdout(format!(
        "diff --kit a/a/b/3.txt b/a/b/3.txt\n\
         deleted file\n\
         index {THREE_BLOB}..0000000\n\
         --- a/a/b/3.txt\n\
         +++ /dev/null\n\
         @@ -1,1 +0,0 @@\n\
         -three\n"
    ));

    Ok(())
}

#[rstest]
fn show_changes_against_a_revision(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("new.txt").write_str("fresh\n")?;

    run_kit_command(dir, &["diff", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "diff --kit a/new.txt b/new.txt\nnew file\nindex 0000000..",
        ))
        .stdout(predicate::str::contains("--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1,1 @@\n+fresh\n"));

    Ok(())
}

#[rstest]
fn binary_content_is_not_diffed_by_line(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("1.txt").write_binary(&[0xff, 0xfe, 0x00])?;

    run_kit_command(dir, &["diff"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("Binary files a/1.txt and b/1.txt differ\n"));

    Ok(())
}

#[rstest]
fn name_status_lists_each_change(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("1.txt").write_str("uno\n")?;
    init_repository_dir.child("new.txt").write_str("fresh\n")?;
    std::fs::remove_file(dir.join("a").join("b").join("3.txt"))?;
    run_kit_command(dir, &["add", "."]).assert().success();

    run_kit_command(dir, &["diff", "--cached", "--name-status"])
        .assert()
        .success()
        .stdout("M\t1.txt\nD\ta/b/3.txt\nA\tnew.txt\n");

    Ok(())
}

#[rstest]
#[case("D", "D\ta/b/3.txt\n")]
#[case("AM", "M\t1.txt\nA\tnew.txt\n")]
fn diff_filter_keeps_only_the_requested_kinds(
    init_repository_dir: TempDir,
    #[case] filter: &str,
    #[case] expected: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("1.txt").write_str("uno\n")?;
    init_repository_dir.child("new.txt").write_str("fresh\n")?;
    std::fs::remove_file(dir.join("a").join("b").join("3.txt"))?;
    run_kit_command(dir, &["add", "."]).assert().success();

    let filter_arg = format!("--diff-filter={filter}");
    run_kit_command(dir, &["diff", "--cached", "--name-status", &filter_arg])
        .assert()
        .success()
        .stdout(expected.to_string());

    Ok(())
}

#[rstest]
fn diff_filter_applies_to_patches(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    init_repository_dir.child("1.txt").write_str("uno\n")?;
    std::fs::remove_file(dir.join("a").join("b").join("3.txt"))?;

    assert_eq!(
        stdout_of(&mut run_kit_command(dir, &["diff", "--diff-filter=M"])),
        modified_one_patch()
    );

    Ok(())
}

#[rstest]
fn unknown_diff_filter_is_rejected(init_repository_dir: TempDir) {
    run_kit_command(init_repository_dir.path(), &["diff", "--diff-filter=X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid diff filter 'X'"));
}

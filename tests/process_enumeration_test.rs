//! Process enumeration and library listing against a live fixture

mod common;

use common::{unique_needle, Fixture};
use memwalk::process::{
    all_pids, close_all, find_processes_with_library, grep, has_library, loaded_libraries,
    matching_loaded_libraries, processes,
};
use memwalk::ProcessHandle;
use regex::Regex;

fn fixture_pattern() -> Regex {
    Regex::new("memwalk-fixture").unwrap()
}

#[test]
fn test_fixture_pid_listed() {
    let fixture = Fixture::spawn(&unique_needle(), 64).unwrap();
    let pids = all_pids().result.unwrap();
    assert!(pids.contains(&fixture.pid()));
}

#[test]
fn test_grep_finds_fixture() {
    let fixture = Fixture::spawn(&unique_needle(), 64).unwrap();

    let (found, _soft) = grep(&fixture_pattern()).into_parts();
    let found = found.unwrap();
    assert!(found.iter().any(|p| p.pid() == fixture.pid()));
    for process in &found {
        assert!(fixture_pattern().is_match(&process.name().unwrap()));
    }
    close_all(found);
}

#[test]
fn test_processes_snapshot_names_fixture() {
    let fixture = Fixture::spawn(&unique_needle(), 64).unwrap();

    let infos = processes().result.unwrap();
    let info = infos
        .iter()
        .find(|info| info.pid == fixture.pid())
        .expect("fixture listed");
    assert!(info.name.starts_with("memwalk-fixture"));
}

#[test]
fn test_fixture_libraries() {
    let fixture = Fixture::spawn(&unique_needle(), 64).unwrap();
    let process = ProcessHandle::open(fixture.pid()).unwrap();

    let libraries = loaded_libraries(&process).result.unwrap();
    assert!(!libraries.is_empty());

    let own = matching_loaded_libraries(&process, &fixture_pattern()).result.unwrap();
    assert_eq!(own.len(), 1, "executable listed once: {own:?}");

    let _ = process.close();
}

#[test]
fn test_library_lookup_by_file_name() {
    let fixture = Fixture::spawn(&unique_needle(), 64).unwrap();

    let pattern = Regex::new("^memwalk-fixture").unwrap();
    assert!(has_library(fixture.pid(), &pattern).unwrap());

    let pids = find_processes_with_library(&pattern).result.unwrap();
    assert!(pids.contains(&fixture.pid()));
}

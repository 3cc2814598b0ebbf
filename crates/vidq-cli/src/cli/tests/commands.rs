//! Tests for submit, status, cancel, due.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_submit() {
    match parse(&["vidq", "submit", "job.json"]) {
        CliCommand::Submit { path } => assert_eq!(path, PathBuf::from("job.json")),
        _ => panic!("expected Submit"),
    }
}

#[test]
fn cli_submit_has_no_detach_flag() {
    assert!(Cli::try_parse_from(["vidq", "submit", "--no-wait", "/tmp/j.json"]).is_err());
}

#[test]
fn cli_parse_status() {
    match parse(&["vidq", "status"]) {
        CliCommand::Status => {}
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_cancel() {
    match parse(&["vidq", "cancel", "67e55044-10b1-426f-9247-bb680e5fe0c8"]) {
        CliCommand::Cancel { id } => {
            assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8")
        }
        _ => panic!("expected Cancel"),
    }
}

#[test]
fn cli_parse_cancel_rejects_non_uuid() {
    assert!(Cli::try_parse_from(["vidq", "cancel", "42"]).is_err());
}

#[test]
fn cli_parse_due_default_and_explicit() {
    match parse(&["vidq", "due"]) {
        CliCommand::Due { at } => assert!(at.is_none()),
        _ => panic!("expected Due"),
    }
    match parse(&["vidq", "due", "--at", "2024-05-01T22:30:00"]) {
        CliCommand::Due { at } => {
            let at = at.unwrap();
            assert_eq!(at.to_string(), "2024-05-01 22:30:00");
        }
        _ => panic!("expected Due"),
    }
}

#[test]
fn cli_parse_unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(["vidq", "add", "https://example.com"]).is_err());
}

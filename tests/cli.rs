// tests/cli.rs

use clap::error::ErrorKind;
use xrun::cli::try_parse_from;
use xrun::is_quit_command;

#[test]
fn no_arguments_means_no_build_args() {
    let args = try_parse_from(["xrun"]).unwrap();
    assert!(args.build_args.is_empty());
}

#[test]
fn arguments_are_forwarded_verbatim() {
    let args = try_parse_from(["xrun", "-tags", "dev", "./cmd/server"]).unwrap();
    assert_eq!(args.build_args, vec!["-tags", "dev", "./cmd/server"]);

    let args = try_parse_from(["xrun", "-race", "--ldflags=-s -w"]).unwrap();
    assert_eq!(args.build_args, vec!["-race", "--ldflags=-s -w"]);
}

#[test]
fn help_is_not_intercepted() {
    let args = try_parse_from(["xrun", "-h"]).unwrap();
    assert_eq!(args.build_args, vec!["-h"]);
}

#[test]
fn short_version_is_forwarded() {
    let args = try_parse_from(["xrun", "-V"]).unwrap();
    assert_eq!(args.build_args, vec!["-V"]);

    let args = try_parse_from(["xrun", "--help"]).unwrap();
    assert_eq!(args.build_args, vec!["--help"]);
}

#[test]
fn version_flag_is_handled_by_xrun() {
    let err = try_parse_from(["xrun", "--version"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn quit_command_is_q_in_any_case() {
    assert!(is_quit_command("q"));
    assert!(is_quit_command("Q"));
    assert!(is_quit_command("  q \r"));
    assert!(!is_quit_command("quit"));
    assert!(!is_quit_command(""));
}

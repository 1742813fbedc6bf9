//! Tests for the download subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use vidget_core::protocol::{MediaFormat, Quality};

#[test]
fn cli_parse_download_defaults() {
    match parse(&["vidget", "download", "https://youtu.be/abc123"]) {
        CliCommand::Download {
            url,
            format,
            quality,
        } => {
            assert_eq!(url, "https://youtu.be/abc123");
            assert_eq!(format, MediaFormat::Video);
            assert_eq!(quality, Quality::Best);
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_audio_720() {
    match parse(&[
        "vidget",
        "download",
        "https://vimeo.com/1",
        "--format",
        "audio",
        "-q",
        "720p",
    ]) {
        CliCommand::Download {
            format, quality, ..
        } => {
            assert_eq!(format, MediaFormat::Audio);
            assert_eq!(quality, Quality::Hd720);
        }
        _ => panic!("expected Download with options"),
    }
}

#[test]
fn cli_parse_download_rejects_unknown_format() {
    let res = Cli::try_parse_from(["vidget", "download", "https://x", "--format", "flac"]);
    assert!(res.is_err());
}

#[test]
fn cli_parse_download_requires_url() {
    assert!(Cli::try_parse_from(["vidget", "download"]).is_err());
}

//! Argument parsing and the upgrade run behind the binary

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pfv_format::{declared_version, FormatVersion};
use pfv_upgrade::{migrate_with, UpgradeOptions};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Upgrade succeeded, or `--check` found a current document
pub(crate) const EXIT_OK: u8 = 0;
/// `--check` found a document that needs upgrading
pub(crate) const EXIT_NEEDS_UPGRADE: u8 = 1;
/// Any error, or `--check` found a document newer than this build reads
pub(crate) const EXIT_FAILURE: u8 = 2;

pub(crate) fn command() -> Command {
    Command::new("pfv-upgrade")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upgrade a raw profile document to the current format version")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Profile file to read"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .help("Write the upgraded profile here instead of stdout"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .action(ArgAction::SetTrue)
                .help("Pretty-print the upgraded profile"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["output", "pretty"])
                .help("Only report the declared version; exit 1 if an upgrade is needed"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_parser(value_parser!(usize))
                .help("Fail if embedded subprocess profiles nest deeper than this"),
        )
        .arg(
            Arg::new("no-verify")
                .long("no-verify")
                .action(ArgAction::SetTrue)
                .help("Skip re-checking library order after the upgrade"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Log every upgrade step (ignored when RUST_LOG is set)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Format of log lines written to stderr"),
        )
}

/// Settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliConfig {
    pub(crate) input: PathBuf,
    pub(crate) output: Option<PathBuf>,
    pub(crate) pretty: bool,
    pub(crate) check: bool,
    pub(crate) verbose: bool,
    pub(crate) json_logs: bool,
    pub(crate) options: UpgradeOptions,
}

impl CliConfig {
    pub(crate) fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let input = matches
            .get_one::<PathBuf>("input")
            .cloned()
            .context("missing INPUT")?;

        let mut options =
            UpgradeOptions::new().with_verify_library_order(!matches.get_flag("no-verify"));
        if let Some(depth) = matches.get_one::<usize>("max-depth") {
            options = options.with_max_embedded_depth(*depth);
        }

        Ok(Self {
            input,
            output: matches.get_one::<PathBuf>("output").cloned(),
            pretty: matches.get_flag("pretty"),
            check: matches.get_flag("check"),
            verbose: matches.get_flag("verbose"),
            json_logs: matches
                .get_one::<String>("log-format")
                .is_some_and(|format| format == "json"),
            options,
        })
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over `--verbose` when set.
pub(crate) fn init_tracing(config: &CliConfig) {
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Read, upgrade, and write one profile; returns the process exit code
pub(crate) fn run(config: &CliConfig, out: &mut dyn Write) -> anyhow::Result<u8> {
    let input = config.input.display();
    let text = fs::read_to_string(&config.input)
        .with_context(|| format!("failed to read {input}"))?;
    let mut doc: Value =
        serde_json::from_str(&text).with_context(|| format!("{input} is not valid JSON"))?;

    if config.check {
        let version = declared_version(&doc);
        let (status, code) = match version.cmp(&FormatVersion::CURRENT) {
            std::cmp::Ordering::Equal => ("current", EXIT_OK),
            std::cmp::Ordering::Less => ("needs upgrade", EXIT_NEEDS_UPGRADE),
            std::cmp::Ordering::Greater => ("newer than this build supports", EXIT_FAILURE),
        };
        writeln!(out, "{input}: format version {version} ({status})")?;
        return Ok(code);
    }

    let report = migrate_with(&mut doc, &config.options)
        .with_context(|| format!("failed to upgrade {input}"))?;

    let rendered = if config.pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };

    match &config.output {
        Some(path) => fs::write(path, format!("{rendered}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => writeln!(out, "{rendered}")?,
    }

    if report.is_noop() {
        tracing::info!("{} is already at version {}", input, report.to);
    } else {
        tracing::info!(
            "Upgraded {} from version {} to {} ({} embedded subprocess profiles)",
            input,
            report.from,
            report.to,
            report.embedded_profiles
        );
    }
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfv_test_utils::{current_profile, parent_with_subprocess};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, doc: &Value) -> PathBuf {
        let path = dir.path().join("profile.json");
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    fn config_for(args: &[&str]) -> CliConfig {
        let matches = command()
            .try_get_matches_from(std::iter::once("pfv-upgrade").chain(args.iter().copied()))
            .unwrap();
        CliConfig::from_matches(&matches).unwrap()
    }

    #[test]
    fn parses_flags_into_options() {
        let config = config_for(&["in.json", "--max-depth", "3", "--no-verify", "-v"]);
        assert_eq!(config.input, PathBuf::from("in.json"));
        assert_eq!(config.options.max_embedded_depth, Some(3));
        assert!(!config.options.verify_library_order);
        assert!(config.verbose);
        assert!(!config.json_logs);
    }

    #[test]
    fn check_conflicts_with_output() {
        let result = command().try_get_matches_from(["pfv-upgrade", "in.json", "--check", "-o", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn upgrades_file_to_output_path() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, &parent_with_subprocess());
        let output = dir.path().join("out.json");
        let config = config_for(&[input.to_str().unwrap(), "-o", output.to_str().unwrap()]);

        let mut stdout = Vec::new();
        let code = run(&config, &mut stdout).unwrap();

        assert_eq!(code, EXIT_OK);
        assert!(stdout.is_empty());
        let written: Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["meta"]["version"], 4);
        assert!(written["libs"].is_array());
    }

    #[test]
    fn writes_to_stdout_by_default() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, &current_profile());
        let config = config_for(&[input.to_str().unwrap()]);

        let mut stdout = Vec::new();
        run(&config, &mut stdout).unwrap();

        let printed: Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(printed, current_profile());
    }

    #[test]
    fn check_reports_exit_codes() {
        let dir = TempDir::new().unwrap();

        let legacy = write_input(&dir, &parent_with_subprocess());
        let mut stdout = Vec::new();
        let code = run(&config_for(&[legacy.to_str().unwrap(), "--check"]), &mut stdout).unwrap();
        assert_eq!(code, EXIT_NEEDS_UPGRADE);
        assert!(String::from_utf8(stdout).unwrap().contains("format version 3 (needs upgrade)"));

        let current = write_input(&dir, &current_profile());
        let mut stdout = Vec::new();
        let code = run(&config_for(&[current.to_str().unwrap(), "--check"]), &mut stdout).unwrap();
        assert_eq!(code, EXIT_OK);

        let newer = write_input(&dir, &serde_json::json!({"meta": {"version": 5}}));
        let mut stdout = Vec::new();
        let code = run(&config_for(&[newer.to_str().unwrap(), "--check"]), &mut stdout).unwrap();
        assert_eq!(code, EXIT_FAILURE);
        assert!(String::from_utf8(stdout).unwrap().contains("newer than this build supports"));
    }

    #[test]
    fn upgrade_failure_names_input_and_version() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, &serde_json::json!({"meta": {"version": 9}}));
        let config = config_for(&[input.to_str().unwrap()]);

        let err = run(&config, &mut Vec::new()).unwrap_err();
        let message = format!("{err:#}");

        assert!(message.contains("failed to upgrade"));
        assert!(message.contains("format version 9"));
        assert!(err
            .downcast_ref::<pfv_upgrade::UpgradeError>()
            .is_some_and(pfv_upgrade::UpgradeError::is_too_new));
    }

    #[test]
    fn missing_input_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let config = config_for(&[missing.to_str().unwrap()]);

        let err = run(&config, &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}

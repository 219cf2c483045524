use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.ini";
pub const LOG_FILE: &str = "debug.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(AppConfig),
    Help,
}

impl AppConfig {
    pub fn from_args() -> Result<Self> {
        match Self::parse(env::args().skip(1))? {
            CliCommand::Run(config) => Ok(config),
            CliCommand::Help => {
                print_help();
                std::process::exit(0);
            }
        }
    }

    pub fn parse<I>(args: I) -> Result<CliCommand>
    where
        I: IntoIterator<Item = String>,
    {
        let mut data_dir = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => {
                    let value = args.next().context("missing value for --data-dir")?;
                    if value.trim().is_empty() {
                        bail!("--data-dir must not be empty");
                    }
                    data_dir = Some(PathBuf::from(value));
                }
                "--help" | "-h" => return Ok(CliCommand::Help),
                _ => bail!("unknown argument: {arg}"),
            }
        }

        Ok(CliCommand::Run(Self {
            data_dir: data_dir.unwrap_or_else(default_data_dir),
        }))
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// Creates the data directory and, when it has no settings yet, copies a
    /// `settings.ini` left in the working directory by older versions. Returns
    /// the path of the adopted file.
    pub fn prepare(&self) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("failed to create data directory: {}", self.data_dir.display())
        })?;
        match env::current_dir() {
            Ok(cwd) => self.adopt_legacy_settings(&cwd),
            Err(_) => Ok(None),
        }
    }

    fn adopt_legacy_settings(&self, legacy_dir: &Path) -> Result<Option<PathBuf>> {
        let target = self.settings_path();
        if target.exists() {
            return Ok(None);
        }
        let legacy = legacy_dir.join(SETTINGS_FILE);
        if !legacy.is_file() || legacy == target {
            return Ok(None);
        }
        fs::copy(&legacy, &target).with_context(|| {
            format!(
                "failed to copy legacy settings from {} to {}",
                legacy.display(),
                target.display()
            )
        })?;
        Ok(Some(legacy))
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Some(local) = env::var_os("LOCALAPPDATA") {
        return PathBuf::from(local).join("CountdownMaster");
    }
    if let Some(xdg) = env::var_os("XDG_DATA_HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(xdg).join("countdown-master");
    }
    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("countdown-master");
    }
    PathBuf::from("data")
}

fn print_help() {
    println!(
        "\
Countdown Master

Usage:
  countdown-master [--data-dir <path>]

Options:
  --data-dir   Folder for profile logs, settings.ini and debug.log
               (default: %LOCALAPPDATA%\\CountdownMaster or ~/.local/share/countdown-master)
  -h, --help   Print this help"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn data_dir_flag_is_used() -> Result<()> {
        let command = AppConfig::parse(args(&["--data-dir", "/tmp/cm"]))?;
        let CliCommand::Run(config) = command else {
            panic!("expected run command");
        };
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cm"));
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/cm").join("settings.ini"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/cm").join("debug.log"));
        Ok(())
    }

    #[test]
    fn help_and_bad_arguments() {
        assert_eq!(AppConfig::parse(args(&["-h"])).ok(), Some(CliCommand::Help));
        assert!(AppConfig::parse(args(&["--data-dir"])).is_err());
        assert!(AppConfig::parse(args(&["--verbose"])).is_err());
    }

    #[test]
    fn legacy_settings_are_copied_once() -> Result<()> {
        let legacy = tempdir()?;
        let data = tempdir()?;
        fs::write(legacy.path().join(SETTINGS_FILE), "[ui]\nshow_heatmap=0\n")?;
        let config = AppConfig {
            data_dir: data.path().to_path_buf(),
        };

        assert_eq!(
            config.adopt_legacy_settings(legacy.path())?,
            Some(legacy.path().join(SETTINGS_FILE))
        );
        assert_eq!(
            fs::read_to_string(config.settings_path())?,
            "[ui]\nshow_heatmap=0\n"
        );
        assert_eq!(config.adopt_legacy_settings(legacy.path())?, None);
        Ok(())
    }
}

//! Test runner configuration in the shape karma expects.

pub mod launchers;
pub mod runner;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;

use crate::config::schema::{SauceLabsConfig, TasksConfig};

pub use launchers::sauce_launchers;
pub use runner::{KarmaRunner, TestRunner};

/// Options handed to `karma start`. Unset fields are left to the project's config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KarmaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browsers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_disconnect_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_disconnect_tolerance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_no_activity_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_launchers: Option<BTreeMap<String, CustomLauncher>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sauce_labs: Option<SauceLabsOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLauncher {
    pub base: String,
    pub browser_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SauceLabsOptions {
    pub test_name: String,
    pub record_screenshots: bool,
    pub start_connect: bool,
    pub connect_options: ConnectOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOptions {
    pub port: u16,
    #[serde(rename = "selenium-version")]
    pub selenium_version: String,
    pub logfile: String,
}

impl From<&SauceLabsConfig> for SauceLabsOptions {
    fn from(config: &SauceLabsConfig) -> Self {
        Self {
            test_name: config.test_name.clone(),
            record_screenshots: config.record_screenshots,
            start_connect: config.start_connect,
            connect_options: ConnectOptions {
                port: config.port,
                selenium_version: config.selenium_version.clone(),
                logfile: config.logfile.clone(),
            },
        }
    }
}

impl KarmaConfig {
    /// Options every run starts from: the project's config file, run once.
    pub fn defaults(config_file: PathBuf) -> Self {
        Self {
            config_file: Some(config_file),
            single_run: Some(true),
            ..Self::default()
        }
    }

    /// Shallow merge: every field set in `overrides` replaces the one in `self`.
    pub fn merge(self, overrides: KarmaConfig) -> KarmaConfig {
        KarmaConfig {
            config_file: overrides.config_file.or(self.config_file),
            single_run: overrides.single_run.or(self.single_run),
            browsers: overrides.browsers.or(self.browsers),
            reporters: overrides.reporters.or(self.reporters),
            browser_disconnect_timeout: overrides
                .browser_disconnect_timeout
                .or(self.browser_disconnect_timeout),
            browser_disconnect_tolerance: overrides
                .browser_disconnect_tolerance
                .or(self.browser_disconnect_tolerance),
            browser_no_activity_timeout: overrides
                .browser_no_activity_timeout
                .or(self.browser_no_activity_timeout),
            capture_timeout: overrides.capture_timeout.or(self.capture_timeout),
            custom_launchers: overrides.custom_launchers.or(self.custom_launchers),
            sauce_labs: overrides.sauce_labs.or(self.sauce_labs),
        }
    }
}

/// The kinds of test runs the tasks know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestPreset {
    Unit,
    Coverage,
    Browsers,
    #[value(name = "saucelabs")]
    SauceLabs,
    Watch,
}

impl TestPreset {
    pub const ALL: [TestPreset; 5] = [
        TestPreset::Unit,
        TestPreset::Coverage,
        TestPreset::Browsers,
        TestPreset::SauceLabs,
        TestPreset::Watch,
    ];

    pub fn stage_name(self) -> &'static str {
        match self {
            TestPreset::Unit => "test:unit",
            TestPreset::Coverage => "test:coverage",
            TestPreset::Browsers => "test:browsers",
            TestPreset::SauceLabs => "test:saucelabs",
            TestPreset::Watch => "test:watch",
        }
    }

    /// Options this preset sets on top of [`KarmaConfig::defaults`].
    pub fn overrides(self, config: &TasksConfig) -> KarmaConfig {
        match self {
            TestPreset::Unit | TestPreset::Coverage => KarmaConfig::default(),
            TestPreset::Browsers => KarmaConfig {
                browsers: Some(config.test.browsers.clone()),
                ..KarmaConfig::default()
            },
            TestPreset::SauceLabs => {
                let launchers = sauce_launchers(&config.saucelabs);
                KarmaConfig {
                    browsers: Some(launchers.keys().cloned().collect()),
                    browser_disconnect_timeout: Some(10_000),
                    browser_disconnect_tolerance: Some(2),
                    browser_no_activity_timeout: Some(240_000),
                    capture_timeout: Some(240_000),
                    custom_launchers: Some(launchers),
                    reporters: Some(
                        ["coverage", "progress", "saucelabs"]
                            .into_iter()
                            .map(String::from)
                            .collect(),
                    ),
                    sauce_labs: Some(SauceLabsOptions::from(&config.saucelabs)),
                    ..KarmaConfig::default()
                }
            }
            TestPreset::Watch => KarmaConfig {
                single_run: Some(false),
                ..KarmaConfig::default()
            },
        }
    }

    /// Full options for a run of this preset in the project at `root`.
    pub fn karma_config(self, root: &Path, config: &TasksConfig) -> KarmaConfig {
        KarmaConfig::defaults(root.join(&config.test.config_file)).merge(self.overrides(config))
    }
}

impl fmt::Display for TestPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage_name())
    }
}

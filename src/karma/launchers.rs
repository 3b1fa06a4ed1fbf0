use std::collections::BTreeMap;

use super::CustomLauncher;
use crate::config::schema::SauceLabsConfig;

const SAUCE_BASE: &str = "SauceLabs";

/// Built-in Sauce Labs matrix: (launcher, browser, platform, version).
const DEFAULT_MATRIX: &[(&str, &str, Option<&str>, Option<&str>)] = &[
    ("sl_chrome", "chrome", None, None),
    ("sl_safari", "safari", None, None),
    ("sl_firefox", "firefox", None, None),
    ("sl_ie_9", "internet explorer", Some("Windows 7"), Some("9")),
    ("sl_ie_10", "internet explorer", Some("Windows 7"), Some("10")),
    ("sl_ie_11", "internet explorer", Some("Windows 8.1"), Some("11")),
    ("sl_iphone", "iphone", Some("OS X 10.10"), Some("7.1")),
    ("sl_android_4", "android", Some("Linux"), Some("4.4")),
    ("sl_android_5", "android", Some("Linux"), Some("5.0")),
];

/// Launchers for the Sauce Labs run; configured launchers replace the built-in matrix.
pub fn sauce_launchers(config: &SauceLabsConfig) -> BTreeMap<String, CustomLauncher> {
    if !config.launchers.is_empty() {
        return config
            .launchers
            .iter()
            .map(|(name, l)| {
                (
                    name.clone(),
                    CustomLauncher {
                        base: SAUCE_BASE.to_string(),
                        browser_name: l.browser_name.clone(),
                        platform: l.platform.clone(),
                        version: l.version.clone(),
                    },
                )
            })
            .collect();
    }

    DEFAULT_MATRIX
        .iter()
        .map(|&(name, browser, platform, version)| {
            (
                name.to_string(),
                CustomLauncher {
                    base: SAUCE_BASE.to_string(),
                    browser_name: browser.to_string(),
                    platform: platform.map(String::from),
                    version: version.map(String::from),
                },
            )
        })
        .collect()
}

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Result, TasksError};

/// Closing marker appended after the `.params` assignments.
pub const FOOTER_END: &str = "\n/* jshint ignore:end */\n";

/// Parameter names of every template seen during one pipeline run, keyed by the
/// compiled output file and then by fully-qualified template name.
///
/// Templates keep the order in which they were first registered; parameter lists keep
/// insertion order and may contain repeats.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    files: BTreeMap<PathBuf, Vec<(String, Vec<String>)>>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `namespace.template` has an entry for `file`, even if it declares no params.
    pub fn register_template(&mut self, file: &Path, namespace: &str, template: &str) {
        self.entry(file, namespace, template);
    }

    /// Append `param` to the list of `namespace.template` in `file`.
    pub fn record(&mut self, file: &Path, namespace: &str, template: &str, param: &str) {
        self.entry(file, namespace, template).push(param.to_string());
    }

    /// Recorded templates and their params for a source document, in registration order.
    pub fn templates(&self, file: &Path) -> &[(String, Vec<String>)] {
        self.files
            .get(&output_key(file))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Params recorded for one fully-qualified template name.
    pub fn params(&self, file: &Path, qualified_name: &str) -> Option<&[String]> {
        self.templates(file)
            .iter()
            .find(|(name, _)| name == qualified_name)
            .map(|(_, params)| params.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Footer appended to the compiled output of `file`.
    pub fn render_footer(&self, file: &Path) -> Result<String> {
        let mut footer = String::new();
        for (name, params) in self.templates(file) {
            let json = serde_json::to_string(params).map_err(|e| TasksError::Serialize {
                context: format!("params of {name}"),
                source: e,
            })?;
            footer.push_str(&format!("\n{name}.params = {json};"));
        }
        footer.push_str(FOOTER_END);
        Ok(footer)
    }

    fn entry(&mut self, file: &Path, namespace: &str, template: &str) -> &mut Vec<String> {
        let qualified = format!("{namespace}.{template}");
        let templates = self.files.entry(output_key(file)).or_default();
        let index = match templates.iter().position(|(name, _)| *name == qualified) {
            Some(index) => index,
            None => {
                templates.push((qualified, Vec::new()));
                templates.len() - 1
            }
        };
        &mut templates[index].1
    }
}

/// The compiled output of `foo.soy` is `foo.soy.js`.
pub fn output_key(file: &Path) -> PathBuf {
    let mut key = OsString::from(file.as_os_str());
    key.push(".js");
    PathBuf::from(key)
}

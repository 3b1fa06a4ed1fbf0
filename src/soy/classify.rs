use std::collections::HashSet;

use super::parser::TemplateCommand;

/// Names of delegate templates that already declare an `element` variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPresenceMap {
    names: HashSet<String>,
}

impl ElementPresenceMap {
    /// Build the map from every command of one document.
    pub fn from_commands(commands: &[TemplateCommand]) -> Self {
        let names = commands
            .iter()
            .filter(|c| c.is_element_variant())
            .map(|c| c.name.clone())
            .collect();
        Self { names }
    }

    pub fn has_element(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

use std::path::{Component, Path, PathBuf};

use super::classify::ElementPresenceMap;
use super::generate::Boilerplate;
use super::params::ParameterRegistry;
use super::parser::{extract_params, parse_document};
use crate::error::Result;

/// Separates hand-written templates from generated ones.
pub const GENERATED_MARKER: &str = "\n// The following templates were generated by soy-tasks.\n\
                                    // Please don't edit them by hand.\n";

const REGISTRY_MODULE: &str = "component/ComponentRegistry";

/// One template source file flowing through the soy stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    /// Path relative to the source root; also the key of its registry entries.
    pub path: PathBuf,
    /// Known once the document has been rewritten.
    pub namespace: Option<String>,
    pub contents: String,
}

impl TemplateDocument {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: None,
            contents: contents.into(),
        }
    }
}

/// Text of a document without anything a previous rewrite appended.
pub fn strip_generated(text: &str) -> &str {
    match text.find(GENERATED_MARKER) {
        Some(index) => &text[..index],
        None => text,
    }
}

/// Appends boilerplate templates to documents and records their params.
#[derive(Debug)]
pub struct Rewriter {
    boilerplate: Boilerplate,
}

impl Rewriter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            boilerplate: Boilerplate::new()?,
        })
    }

    /// Rewrite `document` in place, recording the params of its templates in `registry`.
    ///
    /// A document without a namespace is left untouched and `MalformedDocument` is returned.
    pub fn rewrite(
        &self,
        document: &mut TemplateDocument,
        registry: &mut ParameterRegistry,
    ) -> Result<()> {
        let original = strip_generated(&document.contents);
        let parsed = parse_document(&document.path, original)?;
        let elements = ElementPresenceMap::from_commands(&parsed.commands);

        let mut generated = String::new();
        let mut params = Vec::new();
        for command in parsed.commands.iter().filter(|c| !c.is_delegate) {
            generated.push_str(
                &self
                    .boilerplate
                    .for_command(&parsed.namespace, command, &elements)?,
            );
            params.push((command.name.as_str(), extract_params(command)));
        }

        for (template, names) in params {
            registry.register_template(&document.path, &parsed.namespace, template);
            for name in names {
                registry.record(&document.path, &parsed.namespace, template, &name);
            }
        }

        let mut contents = String::with_capacity(original.len() + GENERATED_MARKER.len() + generated.len());
        contents.push_str(original);
        contents.push_str(GENERATED_MARKER);
        contents.push_str(&generated);

        document.contents = contents;
        document.namespace = Some(parsed.namespace);
        Ok(())
    }
}

/// Where compiled templates import the component registry from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryImport {
    /// The same import prefix for every file (e.g. `aui`).
    Fixed(String),
    /// A project directory, imported relative to each compiled file.
    Relative(PathBuf),
}

impl RegistryImport {
    /// Module path of the component registry as seen from `file`.
    pub fn module_path(&self, file: &Path) -> String {
        let base = match self {
            RegistryImport::Fixed(prefix) => prefix.trim_end_matches('/').to_string(),
            RegistryImport::Relative(core_dir) => {
                let from = file.parent().unwrap_or_else(|| Path::new(""));
                relative_path(from, core_dir)
            }
        };
        if base.is_empty() {
            REGISTRY_MODULE.to_string()
        } else {
            format!("{base}/{REGISTRY_MODULE}")
        }
    }
}

/// Preamble prepended to a compiled template file.
pub fn render_header(import: &RegistryImport, file: &Path) -> String {
    format!(
        "/* jshint ignore:start */\n\
         import ComponentRegistry from '{}';\n\
         var Templates = ComponentRegistry.Templates;\n",
        import.module_path(file)
    )
}

/// Forward-slash path from directory `from` to `to`, both relative to the same root.
fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(from.len() - common)
        .collect();
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if parts.first().map(String::as_str) == Some("..") {
        parts.join("/")
    } else {
        parts.insert(0, ".".to_string());
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TasksError;
    use crate::soy::parser::parse_commands;

    const WIDGET: &str = "{namespace a.b.MyWidget}\n/**\n*/\n{template .content}\nHi\n{/template}";

    fn rewrite(path: &str, text: &str, registry: &mut ParameterRegistry) -> TemplateDocument {
        let mut doc = TemplateDocument::new(path, text);
        Rewriter::new().unwrap().rewrite(&mut doc, registry).unwrap();
        doc
    }

    #[test]
    fn appends_component_boilerplate() {
        let mut registry = ParameterRegistry::new();
        let doc = rewrite("MyWidget.soy", WIDGET, &mut registry);

        assert!(doc.contents.starts_with(WIDGET));
        assert!(doc.contents.contains(GENERATED_MARKER));
        assert!(doc.contents.contains("{deltemplate MyWidget}"));
        assert!(doc.contents.contains("{deltemplate ComponentTemplate variant=\"'MyWidget'\"}"));
        assert!(doc.contents.contains("{deltemplate ComponentElement variant=\"'MyWidget'\"}"));
        assert!(doc.contents.contains("{deltemplate MyWidget variant=\"'element'\"}"));
        assert_eq!(doc.namespace.as_deref(), Some("a.b.MyWidget"));
    }

    #[test]
    fn one_component_template_per_module_regardless_of_surfaces() {
        let text = format!(
            "{WIDGET}\n/** */\n{{template .header}}{{/template}}\n/** */\n{{template .footer}}{{/template}}\n"
        );
        let mut registry = ParameterRegistry::new();
        let doc = rewrite("MyWidget.soy", &text, &mut registry);

        assert_eq!(doc.contents.matches("{deltemplate ComponentTemplate ").count(), 1);
        assert_eq!(doc.contents.matches("{deltemplate ComponentElement ").count(), 1);
        assert!(doc.contents.contains("{deltemplate MyWidget.header}"));
        assert!(doc.contents.contains("{deltemplate MyWidget.footer}"));
    }

    #[test]
    fn records_params_in_declaration_order() {
        let text = "{namespace ns.W}\n/**\n * @param c\n */\n{template .content}\n{@param a: string}\n{@param b: int}\n{/template}\n";
        let mut registry = ParameterRegistry::new();
        rewrite("W.soy", text, &mut registry);

        assert_eq!(
            registry.params(Path::new("W.soy"), "ns.W.content").unwrap(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn delegate_templates_are_not_recorded() {
        let text = "{namespace ns.W}\n/** @param x */\n{deltemplate W variant=\"'element'\"}{/deltemplate}\n";
        let mut registry = ParameterRegistry::new();
        let doc = rewrite("W.soy", text, &mut registry);

        assert!(registry.templates(Path::new("W.soy")).is_empty());
        assert!(doc.contents.ends_with(GENERATED_MARKER));
    }

    #[test]
    fn missing_namespace_fails_without_touching_document() {
        let mut doc = TemplateDocument::new("bad.soy", "/** */\n{template .content}{/template}");
        let mut registry = ParameterRegistry::new();
        let err = Rewriter::new()
            .unwrap()
            .rewrite(&mut doc, &mut registry)
            .unwrap_err();

        assert!(matches!(err, TasksError::MalformedDocument { .. }));
        assert_eq!(doc.contents, "/** */\n{template .content}{/template}");
        assert!(registry.is_empty());
    }

    #[test]
    fn rewriting_twice_gives_the_same_document() {
        let mut registry = ParameterRegistry::new();
        let once = rewrite("MyWidget.soy", WIDGET, &mut registry);
        let twice = rewrite("MyWidget.soy", &once.contents, &mut ParameterRegistry::new());
        assert_eq!(once.contents, twice.contents);
    }

    #[test]
    fn original_declarations_parse_the_same_after_rewrite() {
        let text = format!("{WIDGET}\n/** @param id */\n{{template .header}}{{/template}}\n");
        let mut registry = ParameterRegistry::new();
        let doc = rewrite("MyWidget.soy", &text, &mut registry);

        assert_eq!(
            parse_commands(strip_generated(&doc.contents)),
            parse_commands(&text)
        );
    }

    #[test]
    fn header_uses_fixed_prefix() {
        let header = render_header(
            &RegistryImport::Fixed("aui".into()),
            Path::new("src/widget/MyWidget.soy.js"),
        );
        assert_eq!(
            header,
            "/* jshint ignore:start */\n\
             import ComponentRegistry from 'aui/component/ComponentRegistry';\n\
             var Templates = ComponentRegistry.Templates;\n"
        );
    }

    #[test]
    fn header_path_can_depend_on_the_file() {
        let import = RegistryImport::Relative(PathBuf::from("src/core"));
        assert_eq!(
            import.module_path(Path::new("src/widget/MyWidget.soy.js")),
            "../core/component/ComponentRegistry"
        );
        assert_eq!(
            import.module_path(Path::new("src/MyWidget.soy.js")),
            "./core/component/ComponentRegistry"
        );
        assert_eq!(
            import.module_path(Path::new("src/core/Core.soy.js")),
            "./component/ComponentRegistry"
        );
    }

    #[test]
    fn missing_namespace_leaves_document_untouched() {
        let text = "/** @param id */\n{template .content}{/template}\n";
        let mut doc = TemplateDocument::new("W.soy", text);
        let mut registry = ParameterRegistry::new();

        let err = Rewriter::new().unwrap().rewrite(&mut doc, &mut registry).unwrap_err();

        assert!(matches!(err, TasksError::MalformedDocument { .. }));
        assert_eq!(doc.contents, text);
        assert!(registry.is_empty());
    }

    #[test]
    fn params_separated_by_extra_whitespace_are_recorded() {
        let text = "{namespace ns.W}\n/**\n * @param  id  the id\n * @param\tlabel\n */\n{template .content}\n{/template}\n";
        let mut registry = ParameterRegistry::new();
        rewrite("W.soy", text, &mut registry);

        assert_eq!(
            registry.params(Path::new("W.soy"), "ns.W.content").unwrap(),
            ["id", "label"]
        );
    }
}

//! Boilerplate delegate templates for soy components.
//!
//! Every component gets a fixed composition: a component delegate that forwards to
//! `Component`, a `ComponentTemplate` variant that renders the content template inside an
//! element, and an element variant holding the container markup. Every other template of
//! the component (a "surface") gets an element wrapper plus a delegate that renders the
//! surface through it.

use serde::Serialize;
use tera::{Context, Tera};

use super::classify::ElementPresenceMap;
use super::parser::{module_name, TemplateCommand};
use crate::error::{Result, TasksError};

/// Name of the template holding a component's root content.
pub const CONTENT_TEMPLATE: &str = "content";

const COMPONENT: &str = "component.soy";
const COMPONENT_TEMPLATE: &str = "component_template.soy";
const DEFAULT_ELEMENT: &str = "default_element.soy";
const COMPONENT_ELEMENT: &str = "component_element.soy";
const SURFACE: &str = "surface.soy";
const SURFACE_ELEMENT: &str = "surface_element.soy";

const TEMPLATES: &[(&str, &str)] = &[
    (
        COMPONENT,
        r#"
/**
 * @param? children
 * @param? ref
 */
{deltemplate {{ module }}}
{delcall Component data="all"}
{param componentName: '{{ module }}' /}
{/delcall}
{/deltemplate}
"#,
    ),
    (
        COMPONENT_TEMPLATE,
        r#"
/**
 * @param? elementClasses
 * @param id
 */
{deltemplate ComponentTemplate variant="'{{ module }}'"}
{delcall ComponentElement data="all" variant="'{{ module }}'"}
{param elementContent kind="html"}
{if not $ij.skipNestedComponentContents}
{call .content data="all" /}
{/if}
{/param}
{/delcall}
{/deltemplate}
"#,
    ),
    (
        DEFAULT_ELEMENT,
        r#"
/**
 * @param? elementClasses
 * @param? elementContent
 * @param id
 */
{deltemplate {{ module }} variant="'element'"}
<div id="{$id}" class="{{ css_class }} component{if $elementClasses} {$elementClasses}{/if}" data-component="">
{$elementContent}
</div>
{/deltemplate}
"#,
    ),
    (
        COMPONENT_ELEMENT,
        r#"
/**
 * @param? elementClasses
 * @param? elementContent
 * @param id
 */
{deltemplate ComponentElement variant="'{{ module }}'"}
{delcall {{ module }} variant="'element'" data="all" /}
{/deltemplate}
"#,
    ),
    (
        SURFACE,
        r#"
/**
 * @param id
 */
{deltemplate {{ module }}.{{ surface }}}
{delcall {{ module }}.{{ surface }} variant="'element'" data="all"}
{param elementContent kind="html"}
{if not $ij.skipSurfaceContents}
{call .{{ surface }} data="all" /}
{/if}
{/param}
{/delcall}
{/deltemplate}
"#,
    ),
    (
        SURFACE_ELEMENT,
        r#"
/**
 * @param? elementContent
 * @param id
 */
{deltemplate {{ module }}.{{ surface }} variant="'element'"}
<div id="{$id}-{{ surface }}">
{$elementContent}
</div>
{/deltemplate}
"#,
    ),
];

/// Parameters of the component-level templates.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentParams<'a> {
    pub module: &'a str,
    pub css_class: String,
}

impl<'a> ComponentParams<'a> {
    pub fn new(module: &'a str) -> Self {
        Self {
            module,
            css_class: module.to_lowercase(),
        }
    }
}

/// Parameters of the surface templates.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceParams<'a> {
    pub module: &'a str,
    pub surface: &'a str,
}

/// Renders the boilerplate delegate templates.
#[derive(Debug)]
pub struct Boilerplate {
    tera: Tera,
}

impl Boilerplate {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|e| TasksError::TemplateRender {
                template: "<boilerplate>".into(),
                source: e,
            })?;
        Ok(Self { tera })
    }

    /// `{deltemplate Module}` forwarding to the shared `Component` delegate.
    pub fn component(&self, params: &ComponentParams<'_>) -> Result<String> {
        self.render(COMPONENT, params)
    }

    /// `{deltemplate ComponentTemplate variant="'Module'"}` wrapping `.content`.
    pub fn component_template(&self, params: &ComponentParams<'_>) -> Result<String> {
        self.render(COMPONENT_TEMPLATE, params)
    }

    /// Default `{deltemplate Module variant="'element'"}` container markup.
    pub fn default_element(&self, params: &ComponentParams<'_>) -> Result<String> {
        self.render(DEFAULT_ELEMENT, params)
    }

    /// `{deltemplate ComponentElement variant="'Module'"}` forwarding to the element variant.
    pub fn component_element(&self, params: &ComponentParams<'_>) -> Result<String> {
        self.render(COMPONENT_ELEMENT, params)
    }

    /// `{deltemplate Module.surface}` rendering the surface through its element.
    pub fn surface(&self, params: &SurfaceParams<'_>) -> Result<String> {
        self.render(SURFACE, params)
    }

    /// `{deltemplate Module.surface variant="'element'"}` wrapper markup.
    pub fn surface_element(&self, params: &SurfaceParams<'_>) -> Result<String> {
        self.render(SURFACE_ELEMENT, params)
    }

    /// All boilerplate for one command of a document in `namespace`.
    ///
    /// Delegate templates are never wrapped, and element variants already present in
    /// the document are not generated again.
    pub fn for_command(
        &self,
        namespace: &str,
        command: &TemplateCommand,
        elements: &ElementPresenceMap,
    ) -> Result<String> {
        if command.is_delegate {
            return Ok(String::new());
        }

        let module = module_name(namespace);
        let mut out = String::new();

        if command.name == CONTENT_TEMPLATE {
            let params = ComponentParams::new(module);
            out.push_str(&self.component(&params)?);
            out.push_str(&self.component_template(&params)?);
            if !elements.has_element(module) {
                out.push_str(&self.default_element(&params)?);
            }
            out.push_str(&self.component_element(&params)?);
        } else {
            let params = SurfaceParams {
                module,
                surface: &command.name,
            };
            if !elements.has_element(&format!("{module}.{}", command.name)) {
                out.push_str(&self.surface_element(&params)?);
            }
            out.push_str(&self.surface(&params)?);
        }

        Ok(out)
    }

    fn render<T: Serialize>(&self, template: &str, params: &T) -> Result<String> {
        let context = Context::from_serialize(params).map_err(|e| TasksError::TemplateRender {
            template: template.to_string(),
            source: e,
        })?;
        self.tera
            .render(template, &context)
            .map_err(|e| TasksError::TemplateRender {
                template: template.to_string(),
                source: e,
            })
    }
}

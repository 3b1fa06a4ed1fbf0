use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{Result, TasksError};

/// Name used by doc tags that apply to every parameter (`@param *`).
pub const WILDCARD_PARAM: &str = "*";

/// A single `@tag name description` entry from a doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    /// Tag name without the leading `@`. Optional params keep their `?` (`param?`).
    pub tag: String,
    pub name: String,
    pub description: String,
}

/// One `{template}` or `{deltemplate}` declaration found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCommand {
    pub name: String,
    pub is_delegate: bool,
    /// Only set for delegate templates declared with a `variant` attribute.
    pub variant: Option<String>,
    /// Declaration text from the opening tag up to (not including) the closing tag.
    pub raw_contents: String,
    pub doc_tags: Vec<DocTag>,
}

impl TemplateCommand {
    /// True for `{deltemplate X variant="'element'"}` declarations.
    pub fn is_element_variant(&self) -> bool {
        self.is_delegate && self.variant.as_deref() == Some("element")
    }
}

/// A template document reduced to the pieces the generator needs.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub namespace: String,
    pub commands: Vec<TemplateCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block<'a> {
    Comment(&'a str),
    Code { start: usize, text: &'a str },
}

fn doc_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*\*.*?\*/").expect("valid regex"))
}

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{namespace\s+([\w.$]+)[^}]*\}").expect("valid regex"))
}

fn template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\{template\s+\.([\w$]+)[^}]*\}").expect("valid regex"))
}

fn deltemplate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\{deltemplate\s+([\w.$]+)([^}]*)\}").expect("valid regex"))
}

fn variant_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"variant\s*=\s*"'?([\w.$]*)'?""#).expect("valid regex"))
}

fn inline_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{@param\s+([^\s:}]+)\s*:[^}]*\}").expect("valid regex"))
}

/// Return the namespace declared by `{namespace ...}`, if any.
pub fn parse_namespace(text: &str) -> Option<&str> {
    namespace_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse a whole document. A missing namespace is fatal for the document.
pub fn parse_document(path: &Path, text: &str) -> Result<ParsedDocument> {
    let namespace = parse_namespace(text).ok_or_else(|| TasksError::MalformedDocument {
        path: path.to_path_buf(),
        reason: "no {namespace ...} declaration found".into(),
    })?;

    Ok(ParsedDocument {
        namespace: namespace.to_string(),
        commands: parse_commands(text),
    })
}

/// Find every documented template declaration, in document order.
///
/// Only code blocks that directly follow a `/** ... */` comment are considered.
/// Blocks that are not template declarations are skipped.
pub fn parse_commands(text: &str) -> Vec<TemplateCommand> {
    let blocks = split_blocks(text);
    let mut commands = Vec::new();

    for pair in blocks.windows(2) {
        let (Block::Comment(comment), Block::Code { start, text: code }) = (pair[0], pair[1])
        else {
            continue;
        };
        if let Some(command) = parse_declaration(text, start, code, comment) {
            commands.push(command);
        }
    }

    commands
}

/// Split text into alternating doc-comment and code blocks.
fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    for m in doc_comment_re().find_iter(text) {
        if m.start() > cursor {
            blocks.push(Block::Code {
                start: cursor,
                text: &text[cursor..m.start()],
            });
        }
        blocks.push(Block::Comment(m.as_str()));
        cursor = m.end();
    }
    if cursor < text.len() {
        blocks.push(Block::Code {
            start: cursor,
            text: &text[cursor..],
        });
    }

    blocks
}

fn parse_declaration(
    text: &str,
    code_start: usize,
    code: &str,
    comment: &str,
) -> Option<TemplateCommand> {
    let (name, is_delegate, variant, decl_offset) = if let Some(caps) = template_re().captures(code)
    {
        let open = caps.get(0)?;
        let leading = open.as_str().len() - open.as_str().trim_start().len();
        (caps[1].to_string(), false, None, open.start() + leading)
    } else if let Some(caps) = deltemplate_re().captures(code) {
        let open = caps.get(0)?;
        let leading = open.as_str().len() - open.as_str().trim_start().len();
        let variant = variant_re()
            .captures(&caps[2])
            .map(|v| v[1].to_string())
            .filter(|v| !v.is_empty());
        (caps[1].to_string(), true, variant, open.start() + leading)
    } else {
        return None;
    };

    if name.is_empty() {
        return None;
    }

    let decl_start = code_start + decl_offset;
    let closing = if is_delegate {
        "{/deltemplate}"
    } else {
        "{/template}"
    };
    let rest = &text[decl_start..];
    let raw_contents = match rest.find(closing) {
        Some(end) => &rest[..end],
        None => rest,
    };

    Some(TemplateCommand {
        name,
        is_delegate,
        variant,
        raw_contents: raw_contents.to_string(),
        doc_tags: parse_doc_tags(comment),
    })
}

/// Parse the `@tag name description` entries of a `/** ... */` comment.
///
/// Untagged lines after a tag continue that tag's description.
pub fn parse_doc_tags(comment: &str) -> Vec<DocTag> {
    let inner = comment
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    let mut tags: Vec<DocTag> = Vec::new();
    for line in inner.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(tagged) = line.strip_prefix('@') {
            let (tag, rest) = next_word(tagged);
            let (name, rest) = next_word(rest);
            tags.push(DocTag {
                tag: tag.to_string(),
                name: name.trim_end_matches(':').to_string(),
                description: rest.trim().to_string(),
            });
        } else if let Some(last) = tags.last_mut() {
            if !last.description.is_empty() {
                last.description.push(' ');
            }
            last.description.push_str(line);
        }
    }

    tags
}

/// Split off the first whitespace-separated word of `text`.
fn next_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

/// Parameter names declared by a command: inline `{@param name: type}` annotations
/// first, then `@param` doc tags, each in declaration order.
pub fn extract_params(command: &TemplateCommand) -> Vec<String> {
    let inline = inline_param_re()
        .captures_iter(&command.raw_contents)
        .map(|caps| caps[1].to_string());

    let documented = command
        .doc_tags
        .iter()
        .filter(|t| t.tag == "param" && !t.name.is_empty() && t.name != WILDCARD_PARAM)
        .map(|t| t.name.clone());

    inline.chain(documented).collect()
}

/// The component's module name: the last segment of its namespace.
pub fn module_name(namespace: &str) -> &str {
    namespace.rsplit('.').next().unwrap_or(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGET: &str = r#"{namespace Templates.MyWidget}

/**
 * @param id
 * @param? title: optional heading
 *     spanning two lines
 */
{template .content}
  {@param items: list<string>}
  <div>{$title}</div>
{/template}

/**
 */
{deltemplate MyWidget.header variant="'element'"}
  <header id="{$id}-header">{$elementContent}</header>
{/deltemplate}

<p>stray markup</p>
"#;

    #[test]
    fn parses_namespace() {
        assert_eq!(parse_namespace(WIDGET), Some("Templates.MyWidget"));
        assert_eq!(
            parse_namespace("{namespace a.b.C autoescape=\"strict\"}"),
            Some("a.b.C")
        );
        assert_eq!(parse_namespace("{template .x}{/template}"), None);
    }

    #[test]
    fn missing_namespace_is_malformed() {
        let err = parse_document(Path::new("x.soy"), "/** */\n{template .a}{/template}")
            .unwrap_err();
        assert!(matches!(err, TasksError::MalformedDocument { .. }));
    }

    #[test]
    fn finds_template_and_deltemplate_commands() {
        let commands = parse_commands(WIDGET);
        assert_eq!(commands.len(), 2);

        assert_eq!(commands[0].name, "content");
        assert!(!commands[0].is_delegate);
        assert_eq!(commands[0].variant, None);
        assert!(commands[0].raw_contents.starts_with("{template .content}"));
        assert!(commands[0].raw_contents.contains("{@param items"));
        assert!(!commands[0].raw_contents.contains("{/template}"));

        assert_eq!(commands[1].name, "MyWidget.header");
        assert!(commands[1].is_delegate);
        assert_eq!(commands[1].variant.as_deref(), Some("element"));
        assert!(commands[1].is_element_variant());
    }

    #[test]
    fn ignores_code_blocks_without_declarations() {
        let text = "{namespace a.B}\n/** file comment */\n<p>markup</p>\n";
        assert!(parse_commands(text).is_empty());
    }

    #[test]
    fn ignores_templates_without_doc_comment() {
        let text = "{namespace a.B}\n{template .content}\n{/template}\n";
        assert!(parse_commands(text).is_empty());
    }

    #[test]
    fn reads_unquoted_variant() {
        let text = "/** */\n{deltemplate Foo variant=\"element\"}{/deltemplate}";
        let commands = parse_commands(text);
        assert_eq!(commands[0].variant.as_deref(), Some("element"));
    }

    #[test]
    fn parses_doc_tags_with_continuation_lines() {
        let commands = parse_commands(WIDGET);
        let tags = &commands[0].doc_tags;
        assert_eq!(tags.len(), 2);
        assert_eq!(
            tags[0],
            DocTag {
                tag: "param".into(),
                name: "id".into(),
                description: String::new(),
            }
        );
        assert_eq!(tags[1].tag, "param?");
        assert_eq!(tags[1].name, "title");
        assert_eq!(tags[1].description, "optional heading spanning two lines");
    }

    #[test]
    fn doc_tags_tolerate_repeated_whitespace() {
        let tags = parse_doc_tags("/**\n * @param  id   the  id\n * @param\tlabel:\tshown text\n */");
        assert_eq!(
            tags,
            vec![
                DocTag {
                    tag: "param".into(),
                    name: "id".into(),
                    description: "the  id".into(),
                },
                DocTag {
                    tag: "param".into(),
                    name: "label".into(),
                    description: "shown text".into(),
                },
            ]
        );
    }

    #[test]
    fn extracts_inline_params_before_doc_params() {
        let text = r#"/**
 * @param c
 * @param *
 * @param? d
 */
{template .content}
  {@param a: string}
  {@param b : number}
  {@param? e: string}
{/template}"#;
        let commands = parse_commands(text);
        assert_eq!(extract_params(&commands[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn module_name_is_last_namespace_segment() {
        assert_eq!(module_name("a.b.MyWidget"), "MyWidget");
        assert_eq!(module_name("Templates.Tooltip"), "Tooltip");
        assert_eq!(module_name("Single"), "Single");
    }
}

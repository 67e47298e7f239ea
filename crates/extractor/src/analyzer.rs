use crate::doc_comment::summary_from_comments;
use crate::error::{ExtractorError, Result};
use tree_sitter::{Node, Parser};

const CLASS_DECLARATION: &str = "class_declaration";
const NAMESPACE_DECLARATION: &str = "namespace_declaration";
const FILE_SCOPED_NAMESPACE: &str = "file_scoped_namespace_declaration";
const COMMENT: &str = "comment";
const PREPROC_PREFIX: &str = "preproc_";

/// A class declaration carrying a non-empty summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentedClass {
    /// Simple class name
    pub name: String,

    /// Enclosing namespace, dotted, outermost first
    pub namespace: Option<String>,

    /// Cleaned summary text
    pub summary: String,

    /// Line of the class declaration (1-indexed)
    pub line: usize,
}

/// AST-based analyzer that finds documented classes in C# source
pub struct ClassDocAnalyzer {
    parser: Parser,
}

impl ClassDocAnalyzer {
    pub fn new() -> Result<Self> {
        let language: tree_sitter::Language = tree_sitter_c_sharp::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ExtractorError::tree_sitter(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    /// The first class, in document order, that has a non-empty summary. Nested classes
    /// count at their position in the source.
    pub fn first_documented_class(&mut self, content: &str) -> Result<Option<DocumentedClass>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ExtractorError::parse("Failed to parse source code"))?;
        let root = tree.root_node();
        if root.has_error() {
            log::debug!("Source contains syntax errors, extracting what parsed");
        }

        Ok(find_documented_class(content, root, root))
    }
}

/// Pre-order walk stopping at the first documented class
fn find_documented_class(content: &str, root: Node, node: Node) -> Option<DocumentedClass> {
    if node.kind() == CLASS_DECLARATION {
        if let Some(class) = documented_class(content, root, node) {
            return Some(class);
        }
    }

    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find_map(|child| find_documented_class(content, root, child));
    found
}

fn documented_class(content: &str, root: Node, class_node: Node) -> Option<DocumentedClass> {
    let comments = preceding_comments(content, class_node);
    let summary = summary_from_comments(comments)?;
    let name = class_name(content, class_node)?;

    Some(DocumentedClass {
        name,
        namespace: enclosing_namespace(content, root, class_node),
        summary,
        line: class_node.start_position().row + 1,
    })
}

/// Comment tokens directly above a declaration, in source order.
///
/// Attributes and modifiers are part of the declaration node, so a doc comment written
/// above `[Serializable] public class Foo` is still a sibling of the node. Directive lines
/// between the comment and the class (`#region`, `#if UNITY_EDITOR`) are stepped over, and
/// when the class opens a `#if` block the walk continues above the directive.
fn preceding_comments<'a>(content: &'a str, node: Node) -> Vec<&'a str> {
    let mut comments = Vec::new();
    let mut anchor = node;
    loop {
        let mut sibling = anchor.prev_sibling();
        while let Some(prev) = sibling {
            if prev.kind() == COMMENT {
                comments.push(node_text(content, prev));
            } else if !is_directive_line(prev) && !is_directive_header(anchor, prev) {
                break;
            }
            sibling = prev.prev_sibling();
        }

        // reached the top of a conditional block without hitting a declaration
        let opens_block = sibling.is_none()
            && anchor
                .parent()
                .is_some_and(|parent| parent.kind().starts_with(PREPROC_PREFIX));
        match anchor.parent() {
            Some(parent) if opens_block => anchor = parent,
            _ => break,
        }
    }
    comments.reverse();
    comments
}

/// A preprocessor node that holds no declarations of its own
fn is_directive_line(node: Node) -> bool {
    if !node.kind().starts_with(PREPROC_PREFIX) {
        return false;
    }
    let mut cursor = node.walk();
    let has_declaration = node
        .named_children(&mut cursor)
        .any(|child| child.kind().ends_with("_declaration"));
    !has_declaration
}

/// The `#if` keyword or condition in front of the first item of a conditional block
fn is_directive_header(anchor: Node, prev: Node) -> bool {
    let Some(parent) = anchor.parent() else {
        return false;
    };
    if !parent.kind().starts_with(PREPROC_PREFIX) {
        return false;
    }
    !prev.is_named()
        || parent.child_by_field_name("condition") == Some(prev)
        || prev.start_position().row == parent.start_position().row
}

fn class_name(content: &str, class_node: Node) -> Option<String> {
    if let Some(name) = class_node.child_by_field_name("name") {
        return Some(node_text(content, name).to_string());
    }

    let mut cursor = class_node.walk();
    let name = class_node
        .children(&mut cursor)
        .find(|child| child.kind() == "identifier")
        .map(|child| node_text(content, child).to_string());
    name
}

/// Dotted namespace around `node`: nested block namespaces outermost first, else the
/// file-scoped namespace declared before the node.
fn enclosing_namespace(content: &str, root: Node, node: Node) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        if matches!(parent.kind(), NAMESPACE_DECLARATION | FILE_SCOPED_NAMESPACE) {
            if let Some(name) = parent.child_by_field_name("name") {
                parts.push(compact(node_text(content, name)));
            }
        }
        current = parent.parent();
    }

    if parts.is_empty() {
        let mut cursor = root.walk();
        let file_scoped = root
            .children(&mut cursor)
            .filter(|child| child.kind() == FILE_SCOPED_NAMESPACE)
            .take_while(|child| child.start_byte() < node.start_byte())
            .last()
            .and_then(|decl| decl.child_by_field_name("name"))
            .map(|name| compact(node_text(content, name)));
        return file_scoped;
    }

    parts.reverse();
    Some(parts.join("."))
}

fn node_text<'a>(content: &'a str, node: Node) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}

/// Drop whitespace inside a qualified name (`Game . Core` -> `Game.Core`)
fn compact(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

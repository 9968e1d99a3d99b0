use crate::model::{ApiCallFact, ComponentKind, ElementKind, Position};
use serde::Serialize;

/// A component definition found in one file. Only identifiers that start
/// uppercase and whose body contains JSX qualify.
#[derive(Debug, Serialize, Clone)]
pub struct ComponentDefinition {
    pub name: String,
    pub file: String,
    pub position: Position,
    pub kind: ComponentKind,
    pub exported: bool,
    /// Byte range of the definition body, used to attribute data-source
    /// calls and state hooks to their owning component.
    #[serde(skip)]
    pub byte_range: (usize, usize),
}

impl ComponentDefinition {
    pub fn contains_byte(&self, offset: usize) -> bool {
        offset >= self.byte_range.0 && offset < self.byte_range.1
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HandlerBindingKind {
    DirectReference,
    MemberAccess,
    InlineClosure,
}

/// One event-handler attribute on a JSX element. Closures may resolve to
/// zero or many callee names.
#[derive(Debug, Serialize, Clone)]
pub struct EventHandlerBinding {
    pub event: String,
    pub kind: HandlerBindingKind,
    pub callees: Vec<String>,
}

/// A JSX element that carries information: it has event handlers, data
/// bindings, or represents a data-source or state hook. Purely passive
/// markup never reaches this struct.
#[derive(Debug, Serialize, Clone)]
pub struct InformativeElement {
    pub kind: ElementKind,
    pub name: String,
    pub position: Position,
    pub component: String,
    pub handlers: Vec<EventHandlerBinding>,
    pub data_bindings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_identifier: Option<String>,
}

/// A capitalized JSX usage of some component inside another component's
/// body. Folded into render locations rather than producing a node.
#[derive(Debug, Serialize, Clone)]
pub struct ComponentUsage {
    pub name: String,
    pub used_in: String,
    pub file: String,
    pub position: Position,
}

#[derive(Debug, Serialize, Clone)]
pub struct ImportRecord {
    pub source: String,
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_name: Option<String>,
    pub relative: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct StateHookFact {
    pub hook: String,
    pub component: String,
    pub position: Position,
}

/// A react-router style route declaration found in JSX.
#[derive(Debug, Serialize, Clone)]
pub struct RouteDecl {
    pub path: String,
    pub component: String,
    pub file: String,
}

/// Everything extracted from one frontend file in a single pass plus the
/// two auxiliary traversals.
#[derive(Debug, Serialize, Clone, Default)]
pub struct FileFacts {
    pub file: String,
    pub components: Vec<ComponentDefinition>,
    pub elements: Vec<InformativeElement>,
    pub usages: Vec<ComponentUsage>,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<String>,
    pub api_calls: Vec<ApiCallFact>,
    pub state_hooks: Vec<StateHookFact>,
    pub routes: Vec<RouteDecl>,
}

impl FileFacts {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}

/// Widgets that are interactive by default: a usage of one of these inside
/// a component body is markup, never a rendered child component.
pub fn default_interactive_widgets() -> Vec<String> {
    [
        "Button", "Input", "Select", "Checkbox", "Radio", "Switch", "Slider", "TextField",
        "TextArea", "Form", "Link", "Menu", "MenuItem", "Dialog", "Modal", "Dropdown", "Tab",
        "Tabs", "Table", "Tooltip", "IconButton",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

/// Markup tags that carry no information on their own. An element with one
/// of these names is dropped unless it has handlers or data bindings.
pub const PASSIVE_TAGS: &[&str] = &[
    "div", "span", "p", "section", "article", "header", "footer", "main", "aside", "nav", "ul",
    "ol", "li", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "em", "small", "b", "i",
];

/// JSX tag names classified as input elements when they carry handlers.
pub const INPUT_TAGS: &[&str] = &["input", "select", "textarea", "button", "form", "option", "label"];

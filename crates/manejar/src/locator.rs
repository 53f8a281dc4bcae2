//! Locator descriptors and the locator-expression compiler.
//!
//! A [`LocatorTemplate`] is the immutable value parsed from a declarative
//! operation: a selector kind plus a raw template string that may carry
//! positional `%s` / `%d` format placeholders. Rendering a template with its
//! trailing call arguments, then resolving it against a
//! [`ScopeStack`](crate::ScopeStack), yields the final [`Locator`] handed to
//! the driver.
//!
//! Whether a template composes with ancestor panels is a fixed property of
//! its kind, not configurable per instance: `id` and `css` fragments resolve
//! against the scope stack, everything else is absolute.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{ManejarError, ManejarResult};

/// Selector kind for locating elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorKind {
    /// Element id, treated as a composable fragment (`"panel-" + "field"`)
    Id,
    /// CSS selector, treated as a composable fragment
    CssSelector,
    /// Form control name
    Name,
    /// XPath expression, always absolute
    XPath,
    /// Full anchor text
    LinkText,
    /// Partial anchor text
    PartialLinkText,
    /// Class name
    ClassName,
    /// Tag name
    TagName,
}

impl LocatorKind {
    /// Whether templates of this kind resolve against the scope stack.
    ///
    /// Fixed per kind: `id` and `css` selectors are relative fragments meant
    /// to compose with an ancestor prefix; every other kind is absolute and
    /// ignores the stack entirely.
    #[must_use]
    pub const fn needs_scope_resolution(self) -> bool {
        matches!(self, Self::Id | Self::CssSelector)
    }

    /// Whether this kind has a composition rule when it appears as an
    /// ancestor on the scope stack.
    ///
    /// Both fragment kinds compose by plain string concatenation, matching
    /// the fragment locator convention used throughout the framework rather
    /// than full CSS descendant combinators.
    #[must_use]
    pub const fn composes(self) -> bool {
        matches!(self, Self::Id | Self::CssSelector)
    }

    /// Canonical lower-case name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CssSelector => "css",
            Self::Name => "name",
            Self::XPath => "xpath",
            Self::LinkText => "link-text",
            Self::PartialLinkText => "partial-link-text",
            Self::ClassName => "class-name",
            Self::TagName => "tag-name",
        }
    }
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional format placeholder inside a locator template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `%s` — accepts string or integer arguments
    Str,
    /// `%d` — accepts integer arguments only
    Int,
}

/// A call-time argument consumed by locator format placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgValue {
    /// String argument
    Str(String),
    /// Integer argument
    Int(i64),
}

impl ArgValue {
    /// Short description of the argument kind, for diagnostics
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Declarative locator descriptor: a selector kind plus a template string.
///
/// Immutable once created. Templates may contain positional `%s` / `%d`
/// placeholders consumed by the trailing arguments of the owning operation;
/// `%%` is an escaped literal percent and is not counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorTemplate {
    kind: LocatorKind,
    template: String,
}

impl LocatorTemplate {
    /// Create a template of an arbitrary kind
    #[must_use]
    pub fn new(kind: LocatorKind, template: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
        }
    }

    /// Create an id fragment template
    #[must_use]
    pub fn id(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::Id, template)
    }

    /// Create a CSS selector template
    #[must_use]
    pub fn css(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::CssSelector, template)
    }

    /// Create a form-control-name template
    #[must_use]
    pub fn name(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::Name, template)
    }

    /// Create an XPath template
    #[must_use]
    pub fn xpath(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::XPath, template)
    }

    /// Create a link-text template
    #[must_use]
    pub fn link_text(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::LinkText, template)
    }

    /// Create a partial-link-text template
    #[must_use]
    pub fn partial_link_text(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::PartialLinkText, template)
    }

    /// Create a class-name template
    #[must_use]
    pub fn class_name(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::ClassName, template)
    }

    /// Create a tag-name template
    #[must_use]
    pub fn tag_name(template: impl Into<String>) -> Self {
        Self::new(LocatorKind::TagName, template)
    }

    /// Get the selector kind
    #[must_use]
    pub const fn kind(&self) -> LocatorKind {
        self.kind
    }

    /// Get the raw template string
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether this template resolves against the scope stack
    #[must_use]
    pub const fn needs_scope_resolution(&self) -> bool {
        self.kind.needs_scope_resolution()
    }

    /// Positional placeholders declared by the template, in order
    #[must_use]
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut found = Vec::new();
        let mut chars = self.template.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                continue;
            }
            match chars.next() {
                Some('s') => found.push(Placeholder::Str),
                Some('d') => found.push(Placeholder::Int),
                // "%%" is a literal percent; any other conversion is
                // copied through verbatim at render time
                _ => {}
            }
        }
        found
    }

    /// Number of positional placeholders in the template
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders().len()
    }

    /// Render the template with positional arguments.
    ///
    /// `%s` accepts strings and integers (integers render in decimal);
    /// `%d` requires an integer. `operation` names the caller for
    /// diagnostics.
    ///
    /// # Errors
    ///
    /// [`ManejarError::LocatorArity`] if the argument count does not equal
    /// the placeholder count; [`ManejarError::ArgumentMismatch`] if a `%d`
    /// placeholder receives a string.
    pub fn render(&self, operation: &str, args: &[ArgValue]) -> ManejarResult<String> {
        let expected = self.placeholder_count();
        if args.len() != expected {
            return Err(ManejarError::LocatorArity {
                operation: operation.to_string(),
                expected,
                found: args.len(),
            });
        }

        let mut out = String::with_capacity(self.template.len());
        let mut next = 0usize;
        let mut chars = self.template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    match &args[next] {
                        ArgValue::Str(s) => out.push_str(s),
                        ArgValue::Int(i) => out.push_str(&i.to_string()),
                    }
                    next += 1;
                }
                Some('d') => {
                    chars.next();
                    match &args[next] {
                        ArgValue::Int(i) => out.push_str(&i.to_string()),
                        ArgValue::Str(_) => {
                            return Err(ManejarError::ArgumentMismatch {
                                operation: operation.to_string(),
                                message: format!(
                                    "format arg {next} must be an integer for %d"
                                ),
                            });
                        }
                    }
                    next += 1;
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        }
        Ok(out)
    }
}

impl fmt::Display for LocatorTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.template)
    }
}

/// A fully resolved locator, ready to hand to the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    kind: LocatorKind,
    value: String,
}

impl Locator {
    /// Create a resolved locator
    #[must_use]
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Get the selector kind
    #[must_use]
    pub const fn kind(&self) -> LocatorKind {
        self.kind
    }

    /// Get the resolved selector value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod kind_tests {
        use super::*;

        #[test]
        fn test_fragment_kinds_resolve() {
            assert!(LocatorKind::Id.needs_scope_resolution());
            assert!(LocatorKind::CssSelector.needs_scope_resolution());
        }

        #[test]
        fn test_absolute_kinds_do_not_resolve() {
            assert!(!LocatorKind::XPath.needs_scope_resolution());
            assert!(!LocatorKind::Name.needs_scope_resolution());
            assert!(!LocatorKind::LinkText.needs_scope_resolution());
            assert!(!LocatorKind::ClassName.needs_scope_resolution());
            assert!(!LocatorKind::TagName.needs_scope_resolution());
        }

        #[test]
        fn test_display() {
            assert_eq!(LocatorKind::CssSelector.to_string(), "css");
            assert_eq!(LocatorKind::PartialLinkText.to_string(), "partial-link-text");
        }
    }

    mod placeholder_tests {
        use super::*;

        #[test]
        fn test_counts_both_conversions() {
            let t = LocatorTemplate::id("panel-%s[%d]-");
            assert_eq!(t.placeholders(), vec![Placeholder::Str, Placeholder::Int]);
        }

        #[test]
        fn test_escaped_percent_not_counted() {
            let t = LocatorTemplate::css("div[width='100%%'] %s");
            assert_eq!(t.placeholder_count(), 1);
        }

        #[test]
        fn test_plain_template_has_none() {
            assert_eq!(LocatorTemplate::css("h1").placeholder_count(), 0);
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_renders_positionally() {
            let t = LocatorTemplate::id("submit-%s[%d]");
            let rendered = t
                .render("clickFormSubmit", &["main".into(), 3.into()])
                .unwrap();
            assert_eq!(rendered, "submit-main[3]");
        }

        #[test]
        fn test_integer_renders_through_string_placeholder() {
            let t = LocatorTemplate::id("user-%s");
            assert_eq!(t.render("readUser", &[7.into()]).unwrap(), "user-7");
        }

        #[test]
        fn test_escaped_percent_renders_literally() {
            let t = LocatorTemplate::css("col-%%-%s");
            assert_eq!(t.render("readCol", &["a".into()]).unwrap(), "col-%-a");
        }

        #[test]
        fn test_too_few_args_is_arity_error() {
            let t = LocatorTemplate::id("panel-%s-%s");
            let err = t.render("setField", &["only".into()]).unwrap_err();
            assert!(matches!(
                err,
                ManejarError::LocatorArity {
                    expected: 2,
                    found: 1,
                    ..
                }
            ));
        }

        #[test]
        fn test_too_many_args_is_arity_error() {
            let t = LocatorTemplate::id("user-%d");
            let err = t
                .render("readUsers", &[1.into(), 2.into()])
                .unwrap_err();
            assert!(matches!(err, ManejarError::LocatorArity { .. }));
        }

        #[test]
        fn test_string_into_int_placeholder_rejected() {
            let t = LocatorTemplate::id("row-%d");
            let err = t.render("clickRow", &["nope".into()]).unwrap_err();
            assert!(matches!(err, ManejarError::ArgumentMismatch { .. }));
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_display() {
            let locator = Locator::new(LocatorKind::Id, "panel-field");
            assert_eq!(locator.to_string(), "id(panel-field)");
        }

        #[test]
        fn test_accessors() {
            let locator = Locator::new(LocatorKind::CssSelector, "h1");
            assert_eq!(locator.kind(), LocatorKind::CssSelector);
            assert_eq!(locator.value(), "h1");
        }
    }
}

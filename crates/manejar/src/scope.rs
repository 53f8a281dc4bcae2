//! Scope stacks for resolving nested panel locators.
//!
//! A [`ScopeStack`] is the ordered chain of ancestor panel locators an
//! instance is nested within, outermost first. Stacks are immutable value
//! objects: [`ScopeStack::push`] returns a new stack and never mutates in
//! place, so a panel and any factory holding an older stack reference always
//! observe the chain they were created with.

use std::sync::Arc;

use crate::locator::{Locator, LocatorTemplate};
use crate::result::{ManejarError, ManejarResult};

/// Ordered chain of ancestor panel locator templates, outermost first
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    ancestors: Arc<Vec<LocatorTemplate>>,
}

impl ScopeStack {
    /// Create an empty stack (top-level pages)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new stack with one more ancestor pushed innermost
    #[must_use]
    pub fn push(&self, ancestor: LocatorTemplate) -> Self {
        let mut ancestors = Vec::with_capacity(self.ancestors.len() + 1);
        ancestors.extend(self.ancestors.iter().cloned());
        ancestors.push(ancestor);
        Self {
            ancestors: Arc::new(ancestors),
        }
    }

    /// Number of ancestors on the stack
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Whether the stack has no ancestors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Resolve a rendered template value against the stack.
    ///
    /// Absolute kinds ignore the stack entirely. Fragment kinds walk the
    /// ancestors innermost-first, prefixing each ancestor's template per its
    /// kind's composition rule, and stop at the first absolute ancestor.
    /// Resolution is pure: resolving twice from the same stack yields the
    /// same locator.
    ///
    /// # Errors
    ///
    /// [`ManejarError::ScopeResolution`] if a composing ancestor's kind has
    /// no composition rule. Unreachable while the fragment kinds and the
    /// composable kinds coincide, but guarded explicitly.
    pub fn resolve(&self, template: &LocatorTemplate, rendered: &str) -> ManejarResult<Locator> {
        if !template.needs_scope_resolution() {
            return Ok(Locator::new(template.kind(), rendered));
        }

        let mut value = rendered.to_string();
        for ancestor in self.ancestors.iter().rev() {
            if !ancestor.needs_scope_resolution() {
                // an absolute ancestor establishes absolute context;
                // nothing outside it contributes a prefix
                break;
            }
            if !ancestor.kind().composes() {
                return Err(ManejarError::ScopeResolution {
                    message: format!(
                        "ancestor {ancestor} has no composition rule for nested locators"
                    ),
                });
            }
            value = format!("{}{}", ancestor.template(), value);
        }
        Ok(Locator::new(template.kind(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod push_tests {
        use super::*;

        #[test]
        fn test_push_is_pure() {
            let empty = ScopeStack::new();
            let one = empty.push(LocatorTemplate::id("panel-"));
            assert_eq!(empty.depth(), 0);
            assert_eq!(one.depth(), 1);
        }

        #[test]
        fn test_empty_default() {
            assert!(ScopeStack::default().is_empty());
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_empty_stack_is_identity() {
            let stack = ScopeStack::new();
            let template = LocatorTemplate::id("field");
            let locator = stack.resolve(&template, "field").unwrap();
            assert_eq!(locator.value(), "field");
        }

        #[test]
        fn test_single_ancestor_prefixes() {
            let stack = ScopeStack::new().push(LocatorTemplate::id("panel-"));
            let template = LocatorTemplate::id("field");
            let locator = stack.resolve(&template, "field").unwrap();
            assert_eq!(locator.value(), "panel-field");
        }

        #[test]
        fn test_innermost_ancestor_applies_first() {
            let stack = ScopeStack::new()
                .push(LocatorTemplate::id("page-"))
                .push(LocatorTemplate::id("panel-"));
            let template = LocatorTemplate::id("field");
            let locator = stack.resolve(&template, "field").unwrap();
            assert_eq!(locator.value(), "page-panel-field");
        }

        #[test]
        fn test_absolute_template_ignores_stack() {
            let stack = ScopeStack::new().push(LocatorTemplate::id("panel-"));
            let template = LocatorTemplate::xpath("//h1");
            let locator = stack.resolve(&template, "//h1").unwrap();
            assert_eq!(locator.value(), "//h1");
        }

        #[test]
        fn test_absolute_ancestor_terminates_walk() {
            let stack = ScopeStack::new()
                .push(LocatorTemplate::id("outer-"))
                .push(LocatorTemplate::xpath("//form"))
                .push(LocatorTemplate::id("inner-"));
            let template = LocatorTemplate::id("field");
            let locator = stack.resolve(&template, "field").unwrap();
            // the xpath ancestor stops the walk; "outer-" never applies
            assert_eq!(locator.value(), "inner-field");
        }

        #[test]
        fn test_resolution_is_idempotent() {
            let stack = ScopeStack::new()
                .push(LocatorTemplate::id("a-"))
                .push(LocatorTemplate::id("b-"));
            let template = LocatorTemplate::id("leaf");
            let first = stack.resolve(&template, "leaf").unwrap();
            let second = stack.resolve(&template, "leaf").unwrap();
            assert_eq!(first, second);
        }

        #[test]
        fn test_css_fragments_concatenate() {
            let stack = ScopeStack::new().push(LocatorTemplate::css("#form "));
            let template = LocatorTemplate::css("input");
            let locator = stack.resolve(&template, "input").unwrap();
            assert_eq!(locator.value(), "#form input");
        }
    }
}

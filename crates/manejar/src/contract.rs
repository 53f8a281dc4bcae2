//! Declarative contract metadata.
//!
//! A contract describes a page or panel as data: a list of
//! [`OperationSpec`]s, each carrying a name, a parameter list, a declared
//! return, and an optional locator template. Matching is ordinary data
//! inspection over these values; there is no runtime type introspection.
//!
//! Contract types implement [`Contract`] plus one of the two capability
//! tags: [`PageLike`] (top-level, independently addressable) or
//! [`PanelLike`] (composable, scoped region nestable inside another
//! contract).

use std::any::TypeId;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locator::LocatorTemplate;

/// A declarative contract type: a page or panel described as data
pub trait Contract: 'static {
    /// Display name used in logs and diagnostics
    #[must_use]
    fn display_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Build the contract's operation metadata
    fn describe() -> ContractSpec;
}

/// Capability tag for top-level, independently addressable contracts
pub trait PageLike: Contract {}

/// Capability tag for composable, scope-resolved contracts
pub trait PanelLike: Contract {}

/// Static reference to a contract type, carried inside return declarations
/// so nested synthesis needs no runtime reflection
#[derive(Clone, Copy)]
pub struct ContractRef {
    name: &'static str,
    type_id: TypeId,
    describe: fn() -> ContractSpec,
}

impl ContractRef {
    /// Capture a reference to a contract type
    #[must_use]
    pub fn of<T: Contract>() -> Self {
        Self {
            name: T::display_name(),
            type_id: TypeId::of::<T>(),
            describe: T::describe,
        }
    }

    /// The referenced contract's display name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The referenced contract's type id
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Build the referenced contract's metadata
    #[must_use]
    pub fn describe(&self) -> ContractSpec {
        (self.describe)()
    }

    /// Whether this reference points at `T`
    #[must_use]
    pub fn is<T: Contract>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for ContractRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractRef").field("name", &self.name).finish()
    }
}

impl PartialEq for ContractRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ContractRef {}

/// Declared parameter type of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    /// String parameter
    Str,
    /// Integer parameter
    Int,
    /// Form model parameter (flat field-name-to-value mapping)
    Model,
}

/// Declared return of an operation.
///
/// `Void`, `SelfChain`, `Panel` and `Page` form the standard returns every
/// state-mutating rule accepts; `Text` is the terminal return reserved for
/// read operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnSpec {
    /// Mutates state; the caller instance is handed back for chaining
    Void,
    /// Explicit chain return of the same contract
    SelfChain,
    /// Terminal string value (read operations only)
    Text,
    /// Navigates into a nested scoped contract, no URL change implied
    Panel(ContractRef),
    /// Navigates to a new top-level contract
    Page(ContractRef),
}

impl ReturnSpec {
    /// Whether this is one of the standard returns
    #[must_use]
    pub const fn is_standard(&self) -> bool {
        matches!(
            self,
            Self::Void | Self::SelfChain | Self::Panel(_) | Self::Page(_)
        )
    }
}

/// Contract kind: page (addressable) or panel (scoped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractKind {
    /// Top-level contract, optionally carrying a base address template
    Page {
        /// Address template appended to the harness base URL; may contain
        /// `%s` / `%d` placeholders fed by the open call's arguments
        url: Option<String>,
    },
    /// Composable contract resolved through the scope stack
    Panel,
}

/// One declared operation of a contract
#[derive(Debug, Clone)]
pub struct OperationSpec {
    name: String,
    params: Vec<ParamType>,
    ret: ReturnSpec,
    locator: Option<LocatorTemplate>,
}

impl OperationSpec {
    /// Create an operation with no parameters, a void return, and no locator
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: ReturnSpec::Void,
            locator: None,
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn with_param(mut self, param: ParamType) -> Self {
        self.params.push(param);
        self
    }

    /// Attach a locator template
    #[must_use]
    pub fn with_locator(mut self, locator: LocatorTemplate) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Declare the return explicitly
    #[must_use]
    pub fn returns(mut self, ret: ReturnSpec) -> Self {
        self.ret = ret;
        self
    }

    /// Declare an explicit chain return
    #[must_use]
    pub fn returns_self(self) -> Self {
        self.returns(ReturnSpec::SelfChain)
    }

    /// Declare a terminal string return (read operations)
    #[must_use]
    pub fn returns_text(self) -> Self {
        self.returns(ReturnSpec::Text)
    }

    /// Declare a nested panel return
    #[must_use]
    pub fn returns_panel<C: PanelLike>(self) -> Self {
        self.returns(ReturnSpec::Panel(ContractRef::of::<C>()))
    }

    /// Declare a top-level page return
    #[must_use]
    pub fn returns_page<C: PageLike>(self) -> Self {
        self.returns(ReturnSpec::Page(ContractRef::of::<C>()))
    }

    /// Operation name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter list, in order
    #[must_use]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Declared return
    #[must_use]
    pub const fn ret(&self) -> &ReturnSpec {
        &self.ret
    }

    /// Declared locator template, if any
    #[must_use]
    pub const fn locator(&self) -> Option<&LocatorTemplate> {
        self.locator.as_ref()
    }
}

/// Contract metadata: name, kind, and declared operations
#[derive(Debug, Clone)]
pub struct ContractSpec {
    name: String,
    kind: ContractKind,
    operations: Vec<OperationSpec>,
}

impl ContractSpec {
    /// Create a page contract
    #[must_use]
    pub fn page(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ContractKind::Page { url: None },
            operations: Vec::new(),
        }
    }

    /// Create a panel contract
    #[must_use]
    pub fn panel(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ContractKind::Panel,
            operations: Vec::new(),
        }
    }

    /// Attach the address template of a page contract
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        assert!(
            matches!(self.kind, ContractKind::Page { .. }),
            "only page contracts carry an address template"
        );
        self.kind = ContractKind::Page {
            url: Some(url.into()),
        };
        self
    }

    /// Append an operation
    #[must_use]
    pub fn with_operation(mut self, operation: OperationSpec) -> Self {
        self.operations.push(operation);
        self
    }

    /// Contract display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contract kind
    #[must_use]
    pub const fn kind(&self) -> &ContractKind {
        &self.kind
    }

    /// Address template, if this is a page contract that declares one
    #[must_use]
    pub fn url_template(&self) -> Option<&str> {
        match &self.kind {
            ContractKind::Page { url } => url.as_deref(),
            ContractKind::Panel => None,
        }
    }

    /// Declared operations, in order
    #[must_use]
    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SomePage;
    impl Contract for SomePage {
        fn display_name() -> &'static str {
            "SomePage"
        }
        fn describe() -> ContractSpec {
            ContractSpec::page("SomePage")
        }
    }
    impl PageLike for SomePage {}

    struct SomePanel;
    impl Contract for SomePanel {
        fn display_name() -> &'static str {
            "SomePanel"
        }
        fn describe() -> ContractSpec {
            ContractSpec::panel("SomePanel")
        }
    }
    impl PanelLike for SomePanel {}

    mod contract_ref_tests {
        use super::*;

        #[test]
        fn test_identity_by_type() {
            let a = ContractRef::of::<SomePage>();
            let b = ContractRef::of::<SomePage>();
            let c = ContractRef::of::<SomePanel>();
            assert_eq!(a, b);
            assert_ne!(a, c);
            assert!(a.is::<SomePage>());
            assert!(!a.is::<SomePanel>());
        }

        #[test]
        fn test_describe_round_trip() {
            let r = ContractRef::of::<SomePanel>();
            assert_eq!(r.describe().name(), "SomePanel");
        }
    }

    mod return_spec_tests {
        use super::*;

        #[test]
        fn test_standard_returns() {
            assert!(ReturnSpec::Void.is_standard());
            assert!(ReturnSpec::SelfChain.is_standard());
            assert!(ReturnSpec::Panel(ContractRef::of::<SomePanel>()).is_standard());
            assert!(ReturnSpec::Page(ContractRef::of::<SomePage>()).is_standard());
        }

        #[test]
        fn test_text_is_not_standard() {
            assert!(!ReturnSpec::Text.is_standard());
        }
    }

    mod builder_tests {
        use super::*;
        use crate::locator::LocatorTemplate;

        #[test]
        fn test_page_with_url() {
            let spec = ContractSpec::page("Results").with_url("/results?q=%s");
            assert_eq!(spec.url_template(), Some("/results?q=%s"));
        }

        #[test]
        fn test_panel_has_no_url() {
            assert_eq!(ContractSpec::panel("Form").url_template(), None);
        }

        #[test]
        fn test_operation_defaults() {
            let op = OperationSpec::new("clickSubmit");
            assert_eq!(op.name(), "clickSubmit");
            assert!(op.params().is_empty());
            assert_eq!(*op.ret(), ReturnSpec::Void);
            assert!(op.locator().is_none());
        }

        #[test]
        fn test_operation_builder_chain() {
            let op = OperationSpec::new("setQuery")
                .with_param(ParamType::Str)
                .with_locator(LocatorTemplate::name("q"))
                .returns_self();
            assert!(matches!(op.params(), [ParamType::Str]));
            assert_eq!(*op.ret(), ReturnSpec::SelfChain);
            assert!(op.locator().is_some());
        }

        #[test]
        fn test_operations_keep_declaration_order() {
            let spec = ContractSpec::panel("P")
                .with_operation(OperationSpec::new("first"))
                .with_operation(OperationSpec::new("second"));
            let names: Vec<&str> = spec.operations().iter().map(OperationSpec::name).collect();
            assert_eq!(names, vec!["first", "second"]);
        }
    }
}

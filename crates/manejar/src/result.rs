//! Result and error types for Manejar.
//!
//! Synthesis-time errors are raised eagerly when a contract is compiled, so a
//! misconfigured contract fails before any test runs. Runtime errors from the
//! driver surface propagate unchanged; any interaction failure against a live
//! browser is a test failure.

use thiserror::Error;

/// Result type for Manejar operations
pub type ManejarResult<T> = Result<T, ManejarError>;

/// Errors that can occur in Manejar
#[derive(Debug, Error)]
pub enum ManejarError {
    /// Locator format-placeholder count does not match the trailing parameters
    #[error("locator arity mismatch in {operation}: template expects {expected} format args, found {found}")]
    LocatorArity {
        /// Operation whose locator was being compiled
        operation: String,
        /// Placeholders declared by the template
        expected: usize,
        /// Trailing parameters available as format args
        found: usize,
    },

    /// No generator rule matches a declared operation
    #[error("no generator rule matches operation {contract}::{operation}")]
    UnsupportedOperationShape {
        /// Contract being compiled
        contract: String,
        /// Offending operation
        operation: String,
    },

    /// Contract declares no operations at all
    #[error("contract {contract} declares no matchable operations")]
    ContractShape {
        /// Offending contract
        contract: String,
    },

    /// More than one generator rule claims an operation
    #[error("generator rules [{rules}] all match operation {operation}")]
    RuleConflict {
        /// Offending operation
        operation: String,
        /// Names of the conflicting rules
        rules: String,
    },

    /// A scoped locator could not be resolved against the scope stack
    #[error("scope resolution failed: {message}")]
    ScopeResolution {
        /// What went wrong
        message: String,
    },

    /// A locator never resolved to a live element
    #[error("element not found for locator {locator}")]
    ElementNotFound {
        /// The locator that failed to resolve
        locator: String,
    },

    /// Operation name is not declared on the contract
    #[error("contract {contract} has no operation named {operation}")]
    UnknownOperation {
        /// Contract the call was dispatched against
        contract: String,
        /// Requested operation name
        operation: String,
    },

    /// Call-time arguments disagree with the declared parameter list
    #[error("invalid arguments for {operation}: {message}")]
    ArgumentMismatch {
        /// Operation being invoked
        operation: String,
        /// What disagreed
        message: String,
    },

    /// Requested target contract differs from the operation's declared return
    #[error("operation {operation} targets contract {expected}, requested {requested}")]
    ContractMismatch {
        /// Operation being invoked
        operation: String,
        /// Contract declared by the operation's return
        expected: String,
        /// Contract requested by the caller
        requested: String,
    },

    /// Driver-level failure, optionally carrying a screenshot of the page state
    #[error("driver error: {message}")]
    Driver {
        /// Error message
        message: String,
        /// Base64-encoded screenshot attached by the driver, if any
        screenshot: Option<String>,
    },

    /// Navigation error
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManejarError {
    /// Driver-level failure without an attached screenshot
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            screenshot: None,
        }
    }
}

//! Manejar: declarative page-object synthesis for browser-driven testing.
//!
//! Declare *what* a page or panel looks like — click this control, read this
//! text, set this field, each bound to a named locator — and Manejar
//! synthesizes the implementation that drives a browser session. No method
//! bodies are written by hand and no code is generated at run time: each
//! contract is compiled once into a table of primitive call plans, and a
//! generic dispatch handle executes those plans against the driver.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     MANEJAR Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────┐   ┌────────────┐               │
//! │  │ Contract   │   │ Generator   │   │ Page       │               │
//! │  │ metadata   │──►│ registry    │──►│ factory    │──► PageHandle │
//! │  │ (declared) │   │ (synthesis) │   │ (wiring)   │               │
//! │  └────────────┘   └─────────────┘   └─────┬──────┘               │
//! │                                           │ click/set/read      │
//! │                                     ┌─────▼──────┐               │
//! │                                     │ Driver     │               │
//! │                                     │ session    │               │
//! │                                     └────────────┘               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use manejar::{
//!     Contract, ContractSpec, LocatorTemplate, OperationSpec, PageFactory, PageLike,
//!     ScriptedSession,
//! };
//! use std::sync::Arc;
//!
//! struct Index;
//!
//! impl Contract for Index {
//!     fn display_name() -> &'static str {
//!         "Index"
//!     }
//!     fn describe() -> ContractSpec {
//!         ContractSpec::page("Index").with_url("/").with_operation(
//!             OperationSpec::new("readHeading")
//!                 .with_locator(LocatorTemplate::css("h1"))
//!                 .returns_text(),
//!         )
//!     }
//! }
//! impl PageLike for Index {}
//!
//! # fn main() -> manejar::ManejarResult<()> {
//! let session = Arc::new(ScriptedSession::new().with_text("h1", "Example Domain"));
//! let factory = PageFactory::new(session);
//! let index = factory.create::<Index>()?;
//! assert_eq!(index.read("readHeading")?, "Example Domain");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod contract;
mod driver;
mod factory;
mod generator;
mod harness;
mod locator;
mod model;
mod query;
mod result;
mod scope;
mod synthesis;

pub use contract::{
    Contract, ContractKind, ContractRef, ContractSpec, OperationSpec, PageLike, PanelLike,
    ParamType, ReturnSpec,
};
pub use driver::{
    DriverSession, FinderPolicy, PerformedAction, ScriptedSession, SessionProvider,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
pub use factory::{Outcome, PageFactory, PageHandle, RawHandle};
pub use generator::{
    Epilogue, GeneratorRegistry, MethodGenerator, MethodPlan, PlanStep, RULE_ORDER,
};
pub use harness::{BrowserHarness, HarnessConfig, UrlArg};
pub use locator::{ArgValue, Locator, LocatorKind, LocatorTemplate, Placeholder};
pub use model::{FormField, FormModel};
pub use query::QueryParams;
pub use result::{ManejarError, ManejarResult};
pub use scope::ScopeStack;
pub use synthesis::{compile, compiled_for, CompiledContract, CompiledOperation};

/// Derive [`FormModel`] for a struct with named fields.
///
/// Supports `#[manejar(rename = "...")]` and `#[manejar(skip)]` field
/// attributes; every kept field's value renders through [`ToString`].
#[cfg(feature = "derive")]
pub use manejar_derive::FormModel;

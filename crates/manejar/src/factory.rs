//! Instance factory and the generic dispatch layer.
//!
//! [`PageFactory::create`] turns a contract type into a live, wired
//! [`PageHandle`]: the contract is compiled (once, cached per type) into a
//! plan table, and the handle dispatches every declared operation by name
//! against that table — slicing call arguments into locator format args and
//! business args, rendering and scope-resolving the locator, executing the
//! primitive against the driver session, then applying the return epilogue.
//!
//! Dispatch is dynamic: an unknown operation name or an argument list that
//! disagrees with the declaration is a call-time error, the price of
//! implementing contracts without generated code.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use tracing::{debug, info};

use crate::contract::{Contract, ContractKind, ContractRef, PanelLike, ParamType};
use crate::driver::{DriverSession, FinderPolicy};
use crate::generator::{Epilogue, PlanStep};
use crate::locator::{ArgValue, LocatorKind, LocatorTemplate};
use crate::model::FormModel;
use crate::result::{ManejarError, ManejarResult};
use crate::scope::ScopeStack;
use crate::synthesis::{self, CompiledContract, CompiledOperation};

/// Produces live, wired implementations of declarative contracts
#[derive(Clone)]
pub struct PageFactory {
    session: Arc<dyn DriverSession>,
    finder: FinderPolicy,
}

impl PageFactory {
    /// Create a factory bound to a driver session
    #[must_use]
    pub fn new(session: Arc<dyn DriverSession>) -> Self {
        Self {
            session,
            finder: FinderPolicy::default(),
        }
    }

    /// Set the element-finding policy wired into created instances
    #[must_use]
    pub const fn with_finder(mut self, finder: FinderPolicy) -> Self {
        self.finder = finder;
        self
    }

    /// The element-finding policy
    #[must_use]
    pub const fn finder(&self) -> &FinderPolicy {
        &self.finder
    }

    /// Create a top-level instance of a contract.
    ///
    /// # Errors
    ///
    /// Synthesis errors for misdeclared contracts, raised eagerly here
    /// rather than on first call.
    pub fn create<T: Contract>(&self) -> ManejarResult<PageHandle<T>> {
        let raw = self.create_raw(ContractRef::of::<T>(), ScopeStack::new())?;
        Ok(PageHandle::from_raw(raw))
    }

    /// Create a panel instance nested under an explicit scope stack.
    ///
    /// # Errors
    ///
    /// Synthesis errors for misdeclared contracts.
    pub fn create_scoped<T: PanelLike>(&self, scope: ScopeStack) -> ManejarResult<PageHandle<T>> {
        let raw = self.create_raw(ContractRef::of::<T>(), scope)?;
        Ok(PageHandle::from_raw(raw))
    }

    fn create_raw(&self, contract: ContractRef, scope: ScopeStack) -> ManejarResult<RawHandle> {
        let compiled = synthesis::compiled_for(contract)?;
        debug!("[{}] created", compiled.name());
        if matches!(compiled.kind(), ContractKind::Page { .. }) {
            if let Ok(url) = self.session.current_url() {
                debug!("[{}] url is {}", compiled.name(), url);
            }
        }
        Ok(RawHandle {
            session: Arc::clone(&self.session),
            finder: self.finder,
            factory: self.clone(),
            compiled,
            scope,
            contract_type: contract.type_id(),
        })
    }
}

impl fmt::Debug for PageFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFactory")
            .field("finder", &self.finder)
            .finish_non_exhaustive()
    }
}

/// What an invoked operation produced
#[derive(Debug)]
pub enum Outcome {
    /// Terminal text value of a read
    Text(String),
    /// The caller instance chains
    Chained,
    /// A nested panel instance, scoped under the invoked operation
    Panel(RawHandle),
    /// A new top-level page instance
    Page(RawHandle),
}

/// A live synthesized instance, dispatching operations by name.
///
/// Usually reached through [`PageHandle`], which adds the contract type;
/// the raw handle is what epilogues hand back before the caller names the
/// target type.
#[derive(Clone)]
pub struct RawHandle {
    session: Arc<dyn DriverSession>,
    finder: FinderPolicy,
    factory: PageFactory,
    compiled: Arc<CompiledContract>,
    scope: ScopeStack,
    contract_type: TypeId,
}

impl RawHandle {
    /// The contract's display name
    #[must_use]
    pub fn contract_name(&self) -> &str {
        self.compiled.name()
    }

    /// The instance's scope stack
    #[must_use]
    pub const fn scope(&self) -> &ScopeStack {
        &self.scope
    }

    /// Number of ancestor panels this instance is nested within
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.scope.depth()
    }

    /// The element-finding policy wired into this instance
    #[must_use]
    pub const fn finder(&self) -> &FinderPolicy {
        &self.finder
    }

    /// The session's current URL
    ///
    /// # Errors
    ///
    /// Driver-level errors only.
    pub fn current_url(&self) -> ManejarResult<String> {
        self.session.current_url()
    }

    /// Invoke a declared operation with its full argument list.
    ///
    /// Arguments before the operation's slice index are consumed by the
    /// rule's value binding (the text of a `set`); arguments at or after it
    /// feed the locator's format placeholders.
    ///
    /// # Errors
    ///
    /// [`ManejarError::UnknownOperation`] for undeclared names,
    /// [`ManejarError::ArgumentMismatch`] when the arguments disagree with
    /// the declaration, and any driver error the primitive raises.
    pub fn invoke(&self, operation: &str, args: &[ArgValue]) -> ManejarResult<Outcome> {
        let op = self.operation(operation)?;
        self.check_args(operation, op, args)?;
        let slice = op.plan().slice_at().min(args.len());
        let (value_args, fmt_args) = args.split_at(slice);

        match op.plan().step() {
            PlanStep::Click { locator } => {
                let rendered = locator.render(operation, fmt_args)?;
                let resolved = self.scope.resolve(locator, &rendered)?;
                info!("[{}] click - {}", self.compiled.name(), resolved);
                self.session.click(&resolved)?;
                self.conclude(
                    op.plan().epilogue(),
                    Some(LocatorTemplate::new(locator.kind(), rendered)),
                )
            }
            PlanStep::SetText { locator } => {
                let value = match value_args {
                    [ArgValue::Str(s)] => s.as_str(),
                    _ => {
                        return Err(ManejarError::ArgumentMismatch {
                            operation: operation.to_string(),
                            message: "first argument must be the string value".to_string(),
                        })
                    }
                };
                let rendered = locator.render(operation, fmt_args)?;
                let resolved = self.scope.resolve(locator, &rendered)?;
                info!("[{}] set {} - {}", self.compiled.name(), value, resolved);
                self.session.set_text(&resolved, value)?;
                self.conclude(
                    op.plan().epilogue(),
                    Some(LocatorTemplate::new(locator.kind(), rendered)),
                )
            }
            PlanStep::ReadText { locator } => {
                let rendered = locator.render(operation, fmt_args)?;
                let resolved = self.scope.resolve(locator, &rendered)?;
                info!("[{}] read - {}", self.compiled.name(), resolved);
                let text = self.session.read_text(&resolved)?;
                Ok(Outcome::Text(text))
            }
            PlanStep::SetModelFields { .. } => Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation takes a form model; call set_model".to_string(),
            }),
        }
    }

    /// Invoke a form-model operation: one `setText` per field, each located
    /// by the operation's prefix plus the field name.
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn invoke_model(&self, operation: &str, model: &dyn FormModel) -> ManejarResult<Outcome> {
        let op = self.operation(operation)?;
        let PlanStep::SetModelFields { prefix } = op.plan().step() else {
            return Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation does not take a form model".to_string(),
            });
        };

        let rendered_prefix = match prefix {
            Some(template) => Some(template.render(operation, &[])?),
            None => None,
        };
        let kind = prefix
            .as_ref()
            .map_or(LocatorKind::Id, LocatorTemplate::kind);

        for field in model.fields() {
            let composed = format!(
                "{}{}",
                rendered_prefix.as_deref().unwrap_or(""),
                field.name
            );
            let template = LocatorTemplate::new(kind, composed.clone());
            let resolved = self.scope.resolve(&template, &composed)?;
            info!(
                "[{}] set {} - {}",
                self.compiled.name(),
                field.value,
                resolved
            );
            self.session.set_text(&resolved, &field.value)?;
        }

        let pushed = rendered_prefix.map(|p| LocatorTemplate::new(kind, p));
        self.conclude(op.plan().epilogue(), pushed)
    }

    /// Read a terminal text operation
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn read(&self, operation: &str) -> ManejarResult<String> {
        self.read_with(operation, &[])
    }

    /// Read a terminal text operation whose locator takes format args
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn read_with(&self, operation: &str, args: &[ArgValue]) -> ManejarResult<String> {
        match self.invoke(operation, args)? {
            Outcome::Text(text) => Ok(text),
            _ => Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation is not a read".to_string(),
            }),
        }
    }

    /// Invoke a chaining click operation
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn click(&self, operation: &str) -> ManejarResult<&Self> {
        self.click_with(operation, &[])
    }

    /// Invoke a chaining click operation whose locator takes format args
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn click_with(&self, operation: &str, args: &[ArgValue]) -> ManejarResult<&Self> {
        let outcome = self.invoke(operation, args)?;
        self.expect_chain(operation, &outcome)
    }

    /// Invoke a click operation declared to open another contract
    ///
    /// # Errors
    ///
    /// [`ManejarError::ContractMismatch`] when `C` is not the declared
    /// target, plus the classes of [`RawHandle::invoke`]. The target is
    /// checked before the click executes.
    pub fn click_into<C: Contract>(&self, operation: &str) -> ManejarResult<PageHandle<C>> {
        self.click_into_with(operation, &[])
    }

    /// [`RawHandle::click_into`] with locator format args
    ///
    /// # Errors
    ///
    /// As [`RawHandle::click_into`].
    pub fn click_into_with<C: Contract>(
        &self,
        operation: &str,
        args: &[ArgValue],
    ) -> ManejarResult<PageHandle<C>> {
        self.check_target::<C>(operation)?;
        let outcome = self.invoke(operation, args)?;
        Self::expect_handle(operation, outcome)
    }

    /// Invoke a chaining set operation with its string value
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn set(&self, operation: &str, value: &str) -> ManejarResult<&Self> {
        self.set_with(operation, value, &[])
    }

    /// Invoke a chaining set operation whose locator takes format args
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn set_with(
        &self,
        operation: &str,
        value: &str,
        fmt_args: &[ArgValue],
    ) -> ManejarResult<&Self> {
        let mut args = Vec::with_capacity(fmt_args.len() + 1);
        args.push(ArgValue::Str(value.to_string()));
        args.extend_from_slice(fmt_args);
        let outcome = self.invoke(operation, &args)?;
        self.expect_chain(operation, &outcome)
    }

    /// Invoke a set operation declared to open another contract
    ///
    /// # Errors
    ///
    /// As [`RawHandle::click_into`].
    pub fn set_into<C: Contract>(
        &self,
        operation: &str,
        value: &str,
    ) -> ManejarResult<PageHandle<C>> {
        self.check_target::<C>(operation)?;
        let outcome = self.invoke(operation, &[ArgValue::Str(value.to_string())])?;
        Self::expect_handle(operation, outcome)
    }

    /// Invoke a chaining form-model operation
    ///
    /// # Errors
    ///
    /// Same classes as [`RawHandle::invoke`].
    pub fn set_model(&self, operation: &str, model: &dyn FormModel) -> ManejarResult<&Self> {
        let outcome = self.invoke_model(operation, model)?;
        self.expect_chain(operation, &outcome)
    }

    /// Invoke a form-model operation declared to open another contract
    ///
    /// # Errors
    ///
    /// As [`RawHandle::click_into`].
    pub fn set_model_into<C: Contract>(
        &self,
        operation: &str,
        model: &dyn FormModel,
    ) -> ManejarResult<PageHandle<C>> {
        self.check_target::<C>(operation)?;
        let outcome = self.invoke_model(operation, model)?;
        Self::expect_handle(operation, outcome)
    }

    fn operation(&self, name: &str) -> ManejarResult<&CompiledOperation> {
        self.compiled
            .operation(name)
            .ok_or_else(|| ManejarError::UnknownOperation {
                contract: self.compiled.name().to_string(),
                operation: name.to_string(),
            })
    }

    fn check_args(
        &self,
        operation: &str,
        op: &CompiledOperation,
        args: &[ArgValue],
    ) -> ManejarResult<()> {
        let params = op.spec().params();
        if params.len() != args.len() {
            return Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: format!("declared {} parameters, got {}", params.len(), args.len()),
            });
        }
        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            let ok = match param {
                ParamType::Str => matches!(arg, ArgValue::Str(_)),
                ParamType::Int => matches!(arg, ArgValue::Int(_)),
                ParamType::Model => {
                    return Err(ManejarError::ArgumentMismatch {
                        operation: operation.to_string(),
                        message: "operation takes a form model; call set_model".to_string(),
                    })
                }
            };
            if !ok {
                return Err(ManejarError::ArgumentMismatch {
                    operation: operation.to_string(),
                    message: format!(
                        "parameter {index} expects {param:?}, got {}",
                        arg.kind_name()
                    ),
                });
            }
        }
        Ok(())
    }

    fn check_target<C: Contract>(&self, operation: &str) -> ManejarResult<()> {
        let op = self.operation(operation)?;
        match op.plan().epilogue() {
            Epilogue::OpenPanel(target) | Epilogue::GoToPage(target) => {
                if target.is::<C>() {
                    Ok(())
                } else {
                    Err(ManejarError::ContractMismatch {
                        operation: operation.to_string(),
                        expected: target.name().to_string(),
                        requested: C::display_name().to_string(),
                    })
                }
            }
            Epilogue::ReturnSelf | Epilogue::Terminal => Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation does not open another contract".to_string(),
            }),
        }
    }

    fn expect_chain<'a>(&'a self, operation: &str, outcome: &Outcome) -> ManejarResult<&'a Self> {
        match outcome {
            Outcome::Chained => Ok(self),
            Outcome::Panel(_) | Outcome::Page(_) => Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation opens another contract; use the _into variant".to_string(),
            }),
            Outcome::Text(_) => Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation returns text; use read".to_string(),
            }),
        }
    }

    fn expect_handle<C: Contract>(
        operation: &str,
        outcome: Outcome,
    ) -> ManejarResult<PageHandle<C>> {
        match outcome {
            Outcome::Panel(raw) | Outcome::Page(raw) => {
                if raw.contract_type == TypeId::of::<C>() {
                    Ok(PageHandle::from_raw(raw))
                } else {
                    Err(ManejarError::ContractMismatch {
                        operation: operation.to_string(),
                        expected: raw.compiled.name().to_string(),
                        requested: C::display_name().to_string(),
                    })
                }
            }
            Outcome::Chained | Outcome::Text(_) => Err(ManejarError::ArgumentMismatch {
                operation: operation.to_string(),
                message: "operation does not open another contract".to_string(),
            }),
        }
    }

    fn conclude(
        &self,
        epilogue: &Epilogue,
        pushed: Option<LocatorTemplate>,
    ) -> ManejarResult<Outcome> {
        match epilogue {
            // terminal reads hand their value back inline, never here
            Epilogue::ReturnSelf | Epilogue::Terminal => Ok(Outcome::Chained),
            Epilogue::OpenPanel(target) => {
                let scope = pushed.map_or_else(|| self.scope.clone(), |t| self.scope.push(t));
                Ok(Outcome::Panel(self.factory.create_raw(*target, scope)?))
            }
            Epilogue::GoToPage(target) => Ok(Outcome::Page(
                self.factory.create_raw(*target, ScopeStack::new())?,
            )),
        }
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHandle")
            .field("contract", &self.compiled.name())
            .field("scope_depth", &self.scope.depth())
            .finish_non_exhaustive()
    }
}

/// A live synthesized instance of a specific contract type.
///
/// Derefs to [`RawHandle`] for the whole dynamic dispatch surface.
pub struct PageHandle<T: Contract> {
    raw: RawHandle,
    _contract: PhantomData<fn() -> T>,
}

impl<T: Contract> PageHandle<T> {
    fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _contract: PhantomData,
        }
    }

    /// Drop the contract type and keep the dynamic handle
    #[must_use]
    pub fn into_raw(self) -> RawHandle {
        self.raw
    }
}

impl<T: Contract> Deref for PageHandle<T> {
    type Target = RawHandle;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl<T: Contract> Clone for PageHandle<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _contract: PhantomData,
        }
    }
}

impl<T: Contract> fmt::Debug for PageHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle")
            .field("contract", &self.raw.compiled.name())
            .field("scope_depth", &self.raw.scope.depth())
            .finish()
    }
}

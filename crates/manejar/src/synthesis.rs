//! Contract compilation and the process-wide plan cache.
//!
//! Synthesis turns a contract's declarative metadata into a table mapping
//! operation names to primitive call plans. It is pure computation, performed
//! eagerly and completely: every declared operation must be claimed by
//! exactly one generator rule or the whole contract fails, before any test
//! runs.
//!
//! Compiled contracts are cached per contract type for the life of the
//! process. The cache is populate-once / read-many; the lock is held through
//! compilation so concurrent requests for the same not-yet-compiled contract
//! type compile it at most once.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::contract::{ContractKind, ContractRef, ContractSpec, OperationSpec};
use crate::generator::{GeneratorRegistry, MethodPlan};
use crate::result::{ManejarError, ManejarResult};

/// One synthesized operation: its declaration plus its compiled plan
#[derive(Debug, Clone)]
pub struct CompiledOperation {
    spec: OperationSpec,
    plan: MethodPlan,
}

impl CompiledOperation {
    /// The operation's declaration
    #[must_use]
    pub const fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    /// The operation's compiled plan
    #[must_use]
    pub const fn plan(&self) -> &MethodPlan {
        &self.plan
    }
}

/// A fully synthesized contract: every declared operation compiled to a plan
#[derive(Debug)]
pub struct CompiledContract {
    name: String,
    kind: ContractKind,
    operations: HashMap<String, CompiledOperation>,
}

impl CompiledContract {
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

    /// Look up a compiled operation by name
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&CompiledOperation> {
        self.operations.get(name)
    }

    /// Number of compiled operations
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

/// Compile a contract's metadata into an operation table.
///
/// # Errors
///
/// [`ManejarError::ContractShape`] for contracts with no operations, or any
/// error a generator rule raised while matching and planning.
pub fn compile(spec: &ContractSpec) -> ManejarResult<CompiledContract> {
    if spec.operations().is_empty() {
        return Err(ManejarError::ContractShape {
            contract: spec.name().to_string(),
        });
    }

    let registry = GeneratorRegistry::standard();
    let mut operations = HashMap::with_capacity(spec.operations().len());
    for op in spec.operations() {
        let plan = registry.plan_for(spec.name(), op)?;
        operations.insert(
            op.name().to_string(),
            CompiledOperation {
                spec: op.clone(),
                plan,
            },
        );
    }

    Ok(CompiledContract {
        name: spec.name().to_string(),
        kind: spec.kind().clone(),
        operations,
    })
}

fn cache() -> &'static Mutex<HashMap<TypeId, Arc<CompiledContract>>> {
    static CACHE: OnceLock<Mutex<HashMap<TypeId, Arc<CompiledContract>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Fetch the compiled form of a contract type, compiling it at most once.
///
/// # Errors
///
/// Whatever [`compile`] raises for the contract. Failed compilations are not
/// cached, so a corrected contract definition recompiles on the next call.
pub fn compiled_for(contract: ContractRef) -> ManejarResult<Arc<CompiledContract>> {
    let mut cache = cache().lock().expect("plan cache poisoned");
    if let Some(compiled) = cache.get(&contract.type_id()) {
        return Ok(Arc::clone(compiled));
    }
    let compiled = Arc::new(compile(&contract.describe())?);
    cache.insert(contract.type_id(), Arc::clone(&compiled));
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contract, ParamType};
    use crate::locator::LocatorTemplate;

    struct Index;
    impl Contract for Index {
        fn display_name() -> &'static str {
            "Index"
        }
        fn describe() -> ContractSpec {
            ContractSpec::page("Index")
                .with_url("/")
                .with_operation(
                    OperationSpec::new("readHeading")
                        .with_locator(LocatorTemplate::css("h1"))
                        .returns_text(),
                )
                .with_operation(
                    OperationSpec::new("clickMoreInformation")
                        .with_locator(LocatorTemplate::css("a")),
                )
        }
    }

    struct Empty;
    impl Contract for Empty {
        fn display_name() -> &'static str {
            "Empty"
        }
        fn describe() -> ContractSpec {
            ContractSpec::page("Empty")
        }
    }

    struct Misdeclared;
    impl Contract for Misdeclared {
        fn display_name() -> &'static str {
            "Misdeclared"
        }
        fn describe() -> ContractSpec {
            ContractSpec::page("Misdeclared")
                .with_operation(
                    OperationSpec::new("readHeading")
                        .with_locator(LocatorTemplate::css("h1"))
                        .returns_text(),
                )
                .with_operation(OperationSpec::new("hoverMenu").with_locator(
                    LocatorTemplate::id("menu"),
                ))
        }
    }

    mod compile_tests {
        use super::*;

        #[test]
        fn test_compiles_every_operation() {
            let compiled = compile(&Index::describe()).unwrap();
            assert_eq!(compiled.operation_count(), 2);
            assert!(compiled.operation("readHeading").is_some());
            assert!(compiled.operation("clickMoreInformation").is_some());
            assert!(compiled.operation("missing").is_none());
        }

        #[test]
        fn test_empty_contract_fails_shape_check() {
            let err = compile(&Empty::describe()).unwrap_err();
            assert!(matches!(err, ManejarError::ContractShape { .. }));
        }

        #[test]
        fn test_one_bad_operation_fails_the_whole_contract() {
            let err = compile(&Misdeclared::describe()).unwrap_err();
            match err {
                ManejarError::UnsupportedOperationShape {
                    contract,
                    operation,
                } => {
                    assert_eq!(contract, "Misdeclared");
                    assert_eq!(operation, "hoverMenu");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_arity_error_declared_with_param_mismatch() {
            let spec = ContractSpec::page("Bad").with_operation(
                OperationSpec::new("clickCell")
                    .with_param(ParamType::Str)
                    .with_locator(LocatorTemplate::id("cell-%s-%s")),
            );
            let err = compile(&spec).unwrap_err();
            assert!(matches!(err, ManejarError::LocatorArity { .. }));
        }
    }

    mod cache_tests {
        use super::*;

        #[test]
        fn test_same_contract_type_shares_one_compilation() {
            let first = compiled_for(ContractRef::of::<Index>()).unwrap();
            let second = compiled_for(ContractRef::of::<Index>()).unwrap();
            assert!(Arc::ptr_eq(&first, &second));
        }

        #[test]
        fn test_failed_compilation_is_not_cached() {
            let first = compiled_for(ContractRef::of::<Misdeclared>());
            assert!(first.is_err());
            let second = compiled_for(ContractRef::of::<Misdeclared>());
            assert!(second.is_err());
        }
    }
}

//! Generator rules and the synthesis registry.
//!
//! Each rule owns two decisions: does a declared operation match my shape,
//! and, if so, what primitive call plan implements it. Rules are stateless
//! and side-effect-free; a [`MethodPlan`] is pure data executed later by the
//! dispatch layer.
//!
//! Name matching is word-boundary matching, not substring matching: the verb
//! prefix must be followed by an uppercase letter, a digit, an underscore, or
//! `$`, so `clickable` never matches the click rule. The patterns are fixed
//! regexes compiled once when the registry is built.

use regex::Regex;

use crate::contract::{OperationSpec, ParamType, ReturnSpec};
use crate::locator::{LocatorTemplate, Placeholder};
use crate::result::{ManejarError, ManejarResult};

/// The primitive action a generated operation performs
#[derive(Debug, Clone)]
pub enum PlanStep {
    /// Click the located element
    Click {
        /// Declared locator template
        locator: LocatorTemplate,
    },
    /// Type the operation's first argument into the located element
    SetText {
        /// Declared locator template
        locator: LocatorTemplate,
    },
    /// Read the located element's text
    ReadText {
        /// Declared locator template
        locator: LocatorTemplate,
    },
    /// Type every field of a form model into its own located element
    SetModelFields {
        /// Locator prefix composed with each field name; field names alone
        /// locate the inputs when absent
        prefix: Option<LocatorTemplate>,
    },
}

/// What a generated operation produces after its primitive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Epilogue {
    /// Hand the caller instance back for chaining
    ReturnSelf,
    /// Construct the nested panel contract, scoped under this operation's
    /// locator
    OpenPanel(crate::contract::ContractRef),
    /// Construct the new top-level page contract with a fresh scope
    GoToPage(crate::contract::ContractRef),
    /// No epilogue; the primitive's value is terminal
    Terminal,
}

impl Epilogue {
    /// Epilogue implied by a declared return
    #[must_use]
    pub const fn for_return(ret: &ReturnSpec) -> Self {
        match ret {
            ReturnSpec::Void | ReturnSpec::SelfChain => Self::ReturnSelf,
            ReturnSpec::Panel(c) => Self::OpenPanel(*c),
            ReturnSpec::Page(c) => Self::GoToPage(*c),
            ReturnSpec::Text => Self::Terminal,
        }
    }
}

/// Compiled implementation plan for one declared operation
#[derive(Debug, Clone)]
pub struct MethodPlan {
    step: PlanStep,
    epilogue: Epilogue,
    slice_at: usize,
}

impl MethodPlan {
    fn new(step: PlanStep, epilogue: Epilogue, slice_at: usize) -> Self {
        Self {
            step,
            epilogue,
            slice_at,
        }
    }

    /// The primitive action
    #[must_use]
    pub const fn step(&self) -> &PlanStep {
        &self.step
    }

    /// The return epilogue
    #[must_use]
    pub const fn epilogue(&self) -> &Epilogue {
        &self.epilogue
    }

    /// Index at which the declared parameters were sliced; parameters at or
    /// after it are the locator's format args
    #[must_use]
    pub const fn slice_at(&self) -> usize {
        self.slice_at
    }
}

/// A pattern-matching generator rule
pub trait MethodGenerator: Send + Sync {
    /// Stable rule name, used in conflict diagnostics
    fn rule_name(&self) -> &'static str;

    /// Index at which declared parameters are sliced into locator format
    /// args; parameters before it are consumed by the rule itself
    fn slice_at(&self) -> usize {
        0
    }

    /// Decide whether this rule can generate the operation.
    ///
    /// # Errors
    ///
    /// [`ManejarError::LocatorArity`] when the operation's verb and shape
    /// match but its locator placeholders disagree with the sliced
    /// parameters; arity failures are diagnosed, never silently unmatched.
    fn matches(&self, op: &OperationSpec) -> ManejarResult<bool>;

    /// Emit the primitive call plan for a matched operation.
    ///
    /// # Errors
    ///
    /// Rules currently emit infallibly once matched; the `Result` keeps the
    /// emission contract uniform with matching.
    fn plan(&self, op: &OperationSpec) -> ManejarResult<MethodPlan>;
}

/// Compile the word-boundary pattern for a verb prefix
fn verb_pattern(verb: &str) -> Regex {
    Regex::new(&format!(r"^{verb}[\p{{Lu}}\d_$]")).expect("hard-coded rule pattern")
}

/// Check the parameters sliced at `slice_at` against the operation's locator
/// placeholders.
///
/// Mirrors the matching contract shared by every rule: only string and
/// integer parameters can feed format placeholders, a `%d` placeholder will
/// not take a string parameter, and with no locator there must be nothing
/// left to format. A placeholder count that disagrees with the sliced
/// parameter count is an arity error, not a non-match.
fn format_args_match(op: &OperationSpec, slice_at: usize) -> ManejarResult<bool> {
    let params = &op.params()[slice_at.min(op.params().len())..];

    if params
        .iter()
        .any(|p| !matches!(p, ParamType::Str | ParamType::Int))
    {
        return Ok(false);
    }

    let Some(locator) = op.locator() else {
        return Ok(params.is_empty());
    };

    let placeholders = locator.placeholders();
    if placeholders.len() != params.len() {
        return Err(ManejarError::LocatorArity {
            operation: op.name().to_string(),
            expected: placeholders.len(),
            found: params.len(),
        });
    }

    for (placeholder, param) in placeholders.iter().zip(params) {
        if matches!(placeholder, Placeholder::Int) && matches!(param, ParamType::Str) {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Generates `click` operations: a locator, zero parameters beyond the
/// locator's format args, and a standard return.
struct ClickRule {
    pattern: Regex,
}

impl ClickRule {
    fn new() -> Self {
        Self {
            pattern: verb_pattern("click"),
        }
    }
}

impl MethodGenerator for ClickRule {
    fn rule_name(&self) -> &'static str {
        "click"
    }

    fn matches(&self, op: &OperationSpec) -> ManejarResult<bool> {
        if !self.pattern.is_match(op.name()) || op.locator().is_none() || !op.ret().is_standard() {
            return Ok(false);
        }
        format_args_match(op, self.slice_at())
    }

    fn plan(&self, op: &OperationSpec) -> ManejarResult<MethodPlan> {
        let locator = op
            .locator()
            .cloned()
            .expect("click operations carry a locator template");
        Ok(MethodPlan::new(
            PlanStep::Click { locator },
            Epilogue::for_return(op.ret()),
            self.slice_at(),
        ))
    }
}

/// Generates `read` operations: a locator, zero parameters beyond the
/// locator's format args, and a terminal string return.
struct ReadRule {
    pattern: Regex,
}

impl ReadRule {
    fn new() -> Self {
        Self {
            pattern: verb_pattern("read"),
        }
    }
}

impl MethodGenerator for ReadRule {
    fn rule_name(&self) -> &'static str {
        "read"
    }

    fn matches(&self, op: &OperationSpec) -> ManejarResult<bool> {
        if !self.pattern.is_match(op.name())
            || op.locator().is_none()
            || *op.ret() != ReturnSpec::Text
        {
            return Ok(false);
        }
        format_args_match(op, self.slice_at())
    }

    fn plan(&self, op: &OperationSpec) -> ManejarResult<MethodPlan> {
        let locator = op
            .locator()
            .cloned()
            .expect("read operations carry a locator template");
        Ok(MethodPlan::new(
            PlanStep::ReadText { locator },
            Epilogue::Terminal,
            self.slice_at(),
        ))
    }
}

/// Generates single-value `set` operations: first parameter is the string
/// value, the rest feed the locator, standard return.
struct SetInputRule {
    pattern: Regex,
}

impl SetInputRule {
    fn new() -> Self {
        Self {
            pattern: verb_pattern("set"),
        }
    }
}

impl MethodGenerator for SetInputRule {
    fn rule_name(&self) -> &'static str {
        "set-input"
    }

    fn slice_at(&self) -> usize {
        1
    }

    fn matches(&self, op: &OperationSpec) -> ManejarResult<bool> {
        if !self.pattern.is_match(op.name())
            || op.params().first() != Some(&ParamType::Str)
            || op.locator().is_none()
            || !op.ret().is_standard()
        {
            return Ok(false);
        }
        format_args_match(op, self.slice_at())
    }

    fn plan(&self, op: &OperationSpec) -> ManejarResult<MethodPlan> {
        let locator = op
            .locator()
            .cloned()
            .expect("set operations carry a locator template");
        Ok(MethodPlan::new(
            PlanStep::SetText { locator },
            Epilogue::for_return(op.ret()),
            self.slice_at(),
        ))
    }
}

/// Generates whole-form `set` operations: exactly one form model parameter,
/// standard return. The operation's locator template, when present, prefixes
/// every field name; tried before the single-value rule so a composite model
/// argument never falls through to it.
struct SetModelRule {
    pattern: Regex,
}

impl SetModelRule {
    fn new() -> Self {
        Self {
            pattern: verb_pattern("set"),
        }
    }
}

impl MethodGenerator for SetModelRule {
    fn rule_name(&self) -> &'static str {
        "set-model"
    }

    fn slice_at(&self) -> usize {
        1
    }

    fn matches(&self, op: &OperationSpec) -> ManejarResult<bool> {
        if !self.pattern.is_match(op.name())
            || !matches!(op.params(), [ParamType::Model])
            || !op.ret().is_standard()
        {
            return Ok(false);
        }
        // the model consumes the only parameter, so the template may not
        // declare placeholders
        format_args_match(op, self.slice_at())
    }

    fn plan(&self, op: &OperationSpec) -> ManejarResult<MethodPlan> {
        Ok(MethodPlan::new(
            PlanStep::SetModelFields {
                prefix: op.locator().cloned(),
            },
            Epilogue::for_return(op.ret()),
            self.slice_at(),
        ))
    }
}

/// Fixed evaluation order of the standard rules.
///
/// The order is a designed priority, not incidental wiring: `set-model` is
/// tried before `set-input` so a composite model argument is claimed by the
/// model rule instead of failing the single-value rule's type check.
pub const RULE_ORDER: [&str; 4] = ["set-model", "click", "read", "set-input"];

/// Ordered collection of generator rules.
///
/// Rules are mutually exclusive by design; the registry verifies it. Zero
/// matches or more than one match for an operation is a synthesis-time
/// configuration error, surfaced once per operation when the contract is
/// compiled.
pub struct GeneratorRegistry {
    rules: Vec<Box<dyn MethodGenerator>>,
}

impl GeneratorRegistry {
    /// Build the standard registry in [`RULE_ORDER`]
    #[must_use]
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Box::new(SetModelRule::new()),
                Box::new(ClickRule::new()),
                Box::new(ReadRule::new()),
                Box::new(SetInputRule::new()),
            ],
        }
    }

    /// Append a custom rule, evaluated after the standard rules.
    ///
    /// A custom rule must stay mutually exclusive with the existing ones;
    /// the registry reports a conflict if it ever claims an operation
    /// another rule already claims.
    #[must_use]
    pub fn with_rule(mut self, rule: Box<dyn MethodGenerator>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Names of the registered rules, in evaluation order
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule_name()).collect()
    }

    /// Produce the plan for one declared operation.
    ///
    /// # Errors
    ///
    /// [`ManejarError::UnsupportedOperationShape`] when no rule matches,
    /// [`ManejarError::RuleConflict`] when more than one does, or whatever
    /// diagnosis a rule raised while matching.
    pub fn plan_for(&self, contract: &str, op: &OperationSpec) -> ManejarResult<MethodPlan> {
        let mut matched: Vec<&dyn MethodGenerator> = Vec::new();
        for rule in &self.rules {
            if rule.matches(op)? {
                matched.push(rule.as_ref());
            }
        }
        match matched.as_slice() {
            [] => Err(ManejarError::UnsupportedOperationShape {
                contract: contract.to_string(),
                operation: op.name().to_string(),
            }),
            [rule] => rule.plan(op),
            many => Err(ManejarError::RuleConflict {
                operation: op.name().to_string(),
                rules: many
                    .iter()
                    .map(|r| r.rule_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("rules", &self.rule_names())
            .finish()
    }
}

//! Module-level driver of the differential comparison.
//!
//! [`ModuleComparator`] compares one function pair at a time. When a session
//! ends with an inline request, the requested callee is inlined into both
//! working copies and the pair is compared again, up to
//! [`DiffConfig::max_inline_attempts`] times.
use std::{collections::HashSet, fmt};

use dfinstr::modules::{Function, Module};
use log::{info, warn};
use petgraph::{algo::tarjan_scc, prelude::DiGraphMap};

use crate::{
    base::config::DiffConfig,
    compare::{Side, differential::compare_functions},
    debuginfo::DebugInfo,
    utils::error::{DiffError, DiffResult},
};

pub mod inline;

/// Verdict for a function pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ResultKind {
    Equal,
    NotEqual,
    /// No verdict within the inlining budget.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDiff {
    pub left: String,
    pub right: String,
    pub kind: ResultKind,
    /// Comparison sessions run.
    pub attempts: usize,
    /// Callees inlined before the verdict, in order.
    pub inlined: Vec<String>,
}

impl fmt::Display for FunctionDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <-> {}: {} after {} attempt(s)",
            self.left, self.right, self.kind, self.attempts
        )?;
        if !self.inlined.is_empty() {
            write!(f, " (inlined: {})", self.inlined.join(", "))?;
        }
        Ok(())
    }
}

/// Names of the functions lying on a call cycle of `module`.
pub fn recursive_functions(module: &Module) -> HashSet<String> {
    let mut graph = DiGraphMap::<&str, ()>::new();
    for function in module.functions.values() {
        graph.add_node(function.name.as_str());
        for call in function.calls() {
            if let Some(callee) = module.callee_name(call) {
                graph.add_edge(function.name.as_str(), callee, ());
            }
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(String::from)
        .collect()
}

#[derive(Debug, Default)]
pub struct ModuleComparator {
    pub config: DiffConfig,
    pub debug_info: DebugInfo,
}

impl ModuleComparator {
    pub fn new(config: DiffConfig, debug_info: DebugInfo) -> Self {
        Self { config, debug_info }
    }

    fn working_copy(module: &Module, name: &str, side: Side) -> DiffResult<Function> {
        let function = module
            .function_by_name(name)
            .ok_or_else(|| DiffError::FunctionNotFound {
                name: name.to_string(),
                side,
            })?
            .clone();
        Self::verify(&function, side)?;
        Ok(function)
    }

    fn verify(function: &Function, side: Side) -> DiffResult<()> {
        if function.is_declaration() {
            return Ok(());
        }
        function
            .check_ssa()
            .map_err(|source| DiffError::MalformedFunction {
                function: function.name.clone(),
                side,
                source,
            })
    }

    /// Compare `left_name` of `left_module` against `right_name` of
    /// `right_module`. The modules are never modified: inlining works on
    /// copies of the two functions.
    pub fn compare_function_pair(
        &self,
        left_module: &Module,
        right_module: &Module,
        left_name: &str,
        right_name: &str,
    ) -> DiffResult<FunctionDiff> {
        let mut left = Self::working_copy(left_module, left_name, Side::Left)?;
        let mut right = Self::working_copy(right_module, right_name, Side::Right)?;

        let cyclic: HashSet<String> = recursive_functions(left_module)
            .into_iter()
            .chain(recursive_functions(right_module))
            .collect();

        let mut diff = FunctionDiff {
            left: left_name.to_string(),
            right: right_name.to_string(),
            kind: ResultKind::Unknown,
            attempts: 0,
            inlined: Vec::new(),
        };

        while diff.attempts < self.config.max_inline_attempts {
            diff.attempts += 1;
            info!(
                "Comparing `{}` and `{}` (attempt {}/{})",
                left_name, right_name, diff.attempts, self.config.max_inline_attempts
            );

            let mut comparison = compare_functions(
                &self.config,
                &self.debug_info,
                (left_module, &left),
                (right_module, &right),
            );
            if comparison.is_equal() {
                diff.kind = ResultKind::Equal;
                return Ok(diff);
            }

            let Some(request) = comparison.take_inline_request() else {
                diff.kind = ResultKind::NotEqual;
                return Ok(diff);
            };

            if cyclic.contains(&request.callee) {
                warn!("Not inlining `{}`: it is part of a call cycle", request.callee);
                diff.kind = ResultKind::NotEqual;
                return Ok(diff);
            }

            let inlined_left = inline::inline_calls(left_module, &mut left, &request.callee);
            let inlined_right = inline::inline_calls(right_module, &mut right, &request.callee);
            if inlined_left + inlined_right == 0 {
                warn!("Inline request for `{}` changed nothing", request.callee);
                diff.kind = ResultKind::NotEqual;
                return Ok(diff);
            }

            info!(
                "Inlined `{}` ({} left, {} right call site(s)), requested from the {} side",
                request.callee, inlined_left, inlined_right, request.side
            );
            Self::verify(&left, Side::Left)?;
            Self::verify(&right, Side::Right)?;
            diff.inlined.push(request.callee);
        }

        warn!(
            "Giving up on `{}` and `{}` after {} attempt(s)",
            left_name, right_name, diff.attempts
        );
        Ok(diff)
    }
}

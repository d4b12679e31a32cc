//! Product compilation.
//!
//! A product is declared as an ordered list of [`EventSource`] entries and
//! compiled in two passes: a token-level prepass over every event collects
//! the full variable table (so an early event may reference a variable a
//! later event writes), then each event is parsed against that table into
//! fully index-resolved statements. The compiled [`Product`] is immutable
//! and `Send + Sync`, so one instance is shared across all pricing workers.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tenor_core::{Date, Tenor};

use crate::ast::Stmt;
use crate::error::ScriptError;
use crate::lexer::{lex, Token};
use crate::parser::{self, Symbols, BUILTINS};

/// When an event's script runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventDate {
    /// A single fixed date.
    Date(Date),
    /// A named constant; the event's text is its numeric value. Markers
    /// must precede every dated event.
    Marker(String),
    /// A periodic schedule; the script runs at the end of each period.
    Schedule {
        start: Date,
        end: Date,
        freq: Tenor,
    },
}

/// One raw event: when it runs and what it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSource {
    pub date: EventDate,
    pub script: String,
}

impl EventSource {
    /// A named constant, e.g. `marker("strike", "110")`.
    pub fn marker(name: &str, value: &str) -> Self {
        Self {
            date: EventDate::Marker(name.to_string()),
            script: value.to_string(),
        }
    }

    /// A script at a single fixed date.
    pub fn dated(date: Date, script: &str) -> Self {
        Self {
            date: EventDate::Date(date),
            script: script.to_string(),
        }
    }

    /// A script repeated on a periodic schedule. Inside the script,
    /// `PeriodBegin` and `PeriodEnd` expand to each period's boundary dates.
    pub fn schedule(start: Date, end: Date, freq: Tenor, script: &str) -> Self {
        Self {
            date: EventDate::Schedule { start, end, freq },
            script: script.to_string(),
        }
    }
}

/// Pricing-date context a product is compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationContext {
    /// All cashflows are deflated to this date; events may not precede it.
    pub valuation_date: Date,
}

/// One entry of the compiled variable table.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    /// Lowercased source name.
    pub name: String,
    /// Whether the variable ever receives a `pays`; leg variables sum to
    /// the product value.
    pub is_leg: bool,
}

/// A compiled product: per-event statement lists plus the tables the
/// evaluator and the model need.
#[derive(Debug, Clone)]
pub struct Product {
    pub(crate) events: Vec<Vec<Stmt>>,
    event_dates: Vec<Date>,
    variables: Vec<VarInfo>,
    timeline: Vec<f64>,
    pub(crate) max_nested_ifs: usize,
    valuation_date: Date,
}

impl Product {
    /// Compiles a list of raw events; see [`Product::compile`].
    pub fn new(sources: &[EventSource], ctx: &ValuationContext) -> Result<Self, ScriptError> {
        Self::compile(sources, ctx)
    }

    /// Compiles a list of raw events.
    ///
    /// Markers become cells, schedules are expanded, same-date events are
    /// merged, and every script is parsed against the product-wide variable
    /// table.
    ///
    /// # Errors
    ///
    /// Any [`ScriptError`]; errors inside a specific event are wrapped in
    /// [`ScriptError::Event`] carrying the index into the expanded, merged
    /// event list.
    pub fn compile(sources: &[EventSource], ctx: &ValuationContext) -> Result<Self, ScriptError> {
        let (cells, dated) = split_cells(sources)?;
        let expanded = expand_schedules(&dated)?;
        let merged = merge_and_order(expanded)?;

        for (i, (date, _)) in merged.iter().enumerate() {
            if *date < ctx.valuation_date {
                return Err(ScriptError::EventBeforeValuation {
                    date: date.to_string(),
                }
                .in_event(i));
            }
        }

        let mut token_streams = Vec::with_capacity(merged.len());
        for (i, (_, script)) in merged.iter().enumerate() {
            token_streams.push(lex(script).map_err(|e| e.in_event(i))?);
        }

        let (variables, var_table) = build_variables(&token_streams, &cells);
        let symbols = Symbols {
            cells: &cells,
            vars: &var_table,
        };

        let mut events = Vec::with_capacity(merged.len());
        let mut max_nested_ifs = 0;
        for (i, tokens) in token_streams.iter().enumerate() {
            let mut stmts = parser::parse_event(tokens, &symbols).map_err(|e| e.in_event(i))?;
            let mut writes = BTreeSet::new();
            let depth = annotate(&mut stmts, &mut writes);
            max_nested_ifs = max_nested_ifs.max(depth);
            events.push(stmts);
        }

        let event_dates: Vec<Date> = merged.iter().map(|(d, _)| *d).collect();
        let timeline = event_dates
            .iter()
            .map(|d| (*d - ctx.valuation_date) as f64 / 365.0)
            .collect();

        Ok(Product {
            events,
            event_dates,
            variables,
            timeline,
            max_nested_ifs,
            valuation_date: ctx.valuation_date,
        })
    }

    /// The variable table, in first-write order.
    pub fn variables(&self) -> &[VarInfo] {
        &self.variables
    }

    /// Event times as ACT/365F year fractions from the valuation date, in
    /// event order. The model simulates the underlying at exactly these
    /// times.
    pub fn timeline(&self) -> &[f64] {
        &self.timeline
    }

    /// The merged event dates, in order.
    pub fn event_dates(&self) -> &[Date] {
        &self.event_dates
    }

    /// Number of merged events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The date everything is deflated to.
    pub fn valuation_date(&self) -> Date {
        self.valuation_date
    }

    /// Deepest `if` nesting across all events.
    pub fn max_nested_ifs(&self) -> usize {
        self.max_nested_ifs
    }
}

/// Splits leading markers into the cell table.
fn split_cells(
    sources: &[EventSource],
) -> Result<(HashMap<String, f64>, Vec<EventSource>), ScriptError> {
    let mut cells = HashMap::new();
    let mut dated = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        match &source.date {
            EventDate::Marker(name) => {
                if !dated.is_empty() {
                    return Err(ScriptError::Syntax {
                        line: 1,
                        msg: format!("marker '{}' must precede all dated events", name),
                    }
                    .in_event(i));
                }
                let value: f64 = source.script.trim().parse().map_err(|_| {
                    ScriptError::Syntax {
                        line: 1,
                        msg: format!("marker '{}' is not a number: '{}'", name, source.script),
                    }
                    .in_event(i)
                })?;
                cells.insert(name.to_lowercase(), value);
            }
            _ => dated.push(source.clone()),
        }
    }
    Ok((cells, dated))
}

/// Expands schedules into per-period events with boundary-date substitution.
fn expand_schedules(sources: &[EventSource]) -> Result<Vec<(Date, String)>, ScriptError> {
    let mut expanded = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        match &source.date {
            EventDate::Date(date) => expanded.push((*date, source.script.clone())),
            EventDate::Schedule { start, end, freq } => {
                if start >= end {
                    return Err(ScriptError::InvalidDateOrder {
                        start: start.to_string(),
                        end: end.to_string(),
                    }
                    .in_event(i));
                }
                let mut period_begin = *start;
                loop {
                    let stepped = freq.add_to(period_begin).map_err(|e| {
                        ScriptError::Syntax {
                            line: 1,
                            msg: e.to_string(),
                        }
                        .in_event(i)
                    })?;
                    let period_end = stepped.min(*end);
                    let script =
                        substitute_period_dates(&source.script, period_begin, period_end);
                    expanded.push((period_end, script));
                    if period_end == *end {
                        break;
                    }
                    period_begin = period_end;
                }
            }
            EventDate::Marker(_) => unreachable!("markers are split off first"),
        }
    }
    Ok(expanded)
}

/// Checks global date order and merges same-date events.
fn merge_and_order(expanded: Vec<(Date, String)>) -> Result<Vec<(Date, String)>, ScriptError> {
    let mut merged: Vec<(Date, String)> = Vec::with_capacity(expanded.len());
    for (i, (date, script)) in expanded.into_iter().enumerate() {
        match merged.last_mut() {
            Some((prev, _)) if date < *prev => {
                return Err(ScriptError::NonMonotonicSchedule {
                    prev: prev.to_string(),
                    next: date.to_string(),
                }
                .in_event(i));
            }
            Some((prev, text)) if date == *prev => {
                text.push('\n');
                text.push_str(&script);
            }
            _ => merged.push((date, script)),
        }
    }
    Ok(merged)
}

/// Replaces `PeriodBegin` / `PeriodEnd` words (case-insensitive, whole words
/// only) with inline date literals.
fn substitute_period_dates(script: &str, begin: Date, end: Date) -> String {
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &script[start..i];
            match word.to_lowercase().as_str() {
                "periodbegin" => out.push_str(&begin.to_string()),
                "periodend" => out.push_str(&end.to_string()),
                _ => out.push_str(word),
            }
        } else {
            out.push(b as char);
            i += 1;
        }
    }
    out
}

/// Builds the variable table from the prepass over all token streams.
fn build_variables(
    token_streams: &[Vec<Token>],
    cells: &HashMap<String, f64>,
) -> (Vec<VarInfo>, HashMap<String, usize>) {
    let mut variables: Vec<VarInfo> = Vec::new();
    let mut table = HashMap::new();
    for tokens in token_streams {
        for (name, is_pays) in parser::write_targets(tokens) {
            if cells.contains_key(&name) || BUILTINS.contains(&name.as_str()) {
                // The parser rejects these targets with a proper error
                continue;
            }
            let index = *table.entry(name.clone()).or_insert_with(|| {
                variables.push(VarInfo {
                    name: name.clone(),
                    is_leg: false,
                });
                variables.len() - 1
            });
            variables[index].is_leg |= is_pays;
        }
    }
    (variables, table)
}

/// Fills each `if` node's affected-variable list and returns the nesting
/// depth of the statement list.
fn annotate(stmts: &mut [Stmt], writes: &mut BTreeSet<usize>) -> usize {
    let mut depth = 0;
    for stmt in stmts {
        match stmt {
            Stmt::Assign { var, .. } | Stmt::Pays { var, .. } => {
                writes.insert(*var);
            }
            Stmt::If {
                then_branch,
                else_branch,
                affected,
                ..
            } => {
                let mut inner = BTreeSet::new();
                let then_depth = annotate(then_branch, &mut inner);
                let else_depth = annotate(else_branch, &mut inner);
                *affected = inner.iter().copied().collect();
                writes.extend(inner);
                depth = depth.max(1 + then_depth.max(else_depth));
            }
        }
    }
    depth
}

//! The `lq` command line: argument parsing and query execution.
//!
//! ```text
//! lq [--pretty] [--input <file>|-] <op> [<arg>] [<op> [<arg>]]... [<terminal>]
//! ```
//!
//! The input is a JSON document (stdin by default). Operators apply left to
//! right; the result is printed as JSON.

use std::io::Read;
use std::path::PathBuf;

use lq_core::{Enumerable, OrderedEnumerable};
use lq_value::{invalid_argument, to_json_text, LinqResult, Value};

/// A command-line mistake; reported with the usage text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("missing operator")]
    MissingOperator,
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("`{0}` expects an argument")]
    MissingArgument(String),
    #[error("`{op}` expects a non-negative count, got `{got}`")]
    BadCount { op: String, got: String },
    #[error("`then-by` must follow `order-by`, `order-by-desc` or `then-by`")]
    DanglingThenBy,
    #[error("`{0}` ends the query; nothing may follow it")]
    TrailingAfterTerminal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Query(Query),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub pretty: bool,
    pub input: Input,
    pub steps: Vec<Step>,
    pub terminal: Option<Terminal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    pub fn read(&self) -> std::io::Result<String> {
        match self {
            Input::Stdin => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
            Input::File(path) => std::fs::read_to_string(path),
        }
    }
}

/// A lazy operator; lambda arguments are kept as text until the query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Where(String),
    Select(String),
    SelectKey(String),
    OrderBy(String),
    OrderByDesc(String),
    ThenBy(String),
    Take(usize),
    Skip(usize),
    Distinct,
    Reverse,
    Values,
    Keys,
    GroupBy(String),
}

impl Step {
    fn is_ordering(&self) -> bool {
        matches!(self, Step::OrderBy(_) | Step::OrderByDesc(_) | Step::ThenBy(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    Count,
    Sum,
    First,
    Last,
    Implode(String),
}

pub fn parse_args(args: &[String]) -> Result<Command, UsageError> {
    let mut pretty = false;
    let mut input = Input::Stdin;
    let mut steps: Vec<Step> = Vec::new();
    let mut terminal: Option<(String, Terminal)> = None;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if let Some((op, _)) = &terminal {
            return Err(UsageError::TrailingAfterTerminal(op.clone()));
        }
        let mut operand = || {
            args.next()
                .cloned()
                .ok_or_else(|| UsageError::MissingArgument(arg.clone()))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--pretty" => pretty = true,
            "--input" | "-i" => {
                let path = operand()?;
                input = if path == "-" {
                    Input::Stdin
                } else {
                    Input::File(PathBuf::from(path))
                };
            }
            "where" => steps.push(Step::Where(operand()?)),
            "select" => steps.push(Step::Select(operand()?)),
            "select-key" => steps.push(Step::SelectKey(operand()?)),
            "order-by" => steps.push(Step::OrderBy(operand()?)),
            "order-by-desc" => steps.push(Step::OrderByDesc(operand()?)),
            "then-by" => {
                if !steps.last().is_some_and(Step::is_ordering) {
                    return Err(UsageError::DanglingThenBy);
                }
                steps.push(Step::ThenBy(operand()?));
            }
            "take" => steps.push(Step::Take(parse_count(arg, &operand()?)?)),
            "skip" => steps.push(Step::Skip(parse_count(arg, &operand()?)?)),
            "distinct" => steps.push(Step::Distinct),
            "reverse" => steps.push(Step::Reverse),
            "values" => steps.push(Step::Values),
            "keys" => steps.push(Step::Keys),
            "group-by" => steps.push(Step::GroupBy(operand()?)),
            "count" => terminal = Some((arg.clone(), Terminal::Count)),
            "sum" => terminal = Some((arg.clone(), Terminal::Sum)),
            "first" => terminal = Some((arg.clone(), Terminal::First)),
            "last" => terminal = Some((arg.clone(), Terminal::Last)),
            "implode" => terminal = Some((arg.clone(), Terminal::Implode(operand()?))),
            other if other.starts_with('-') => {
                return Err(UsageError::UnknownOption(other.to_string()));
            }
            other => return Err(UsageError::UnknownOperator(other.to_string())),
        }
    }

    if steps.is_empty() && terminal.is_none() {
        return Err(UsageError::MissingOperator);
    }
    Ok(Command::Query(Query {
        pretty,
        input,
        steps,
        terminal: terminal.map(|(_, t)| t),
    }))
}

fn parse_count(op: &str, text: &str) -> Result<usize, UsageError> {
    text.parse().map_err(|_| UsageError::BadCount {
        op: op.to_string(),
        got: text.to_string(),
    })
}

/// Run `query` against JSON `text` and render the result as JSON.
#[tracing::instrument(level = "debug", skip_all, fields(steps = query.steps.len()))]
pub fn run(query: &Query, text: &str) -> LinqResult<String> {
    let mut seq = Enumerable::from_json(text)?;
    let mut ordered: Option<OrderedEnumerable> = None;

    for step in &query.steps {
        if let Step::ThenBy(selector) = step {
            let Some(current) = ordered.take() else {
                return Err(invalid_argument("then-by", "no ordering to refine"));
            };
            let refined = current.then_by(selector.as_str(), None)?;
            seq = Enumerable::clone(&refined);
            ordered = Some(refined);
            continue;
        }
        ordered = None;
        seq = match step {
            Step::Where(predicate) => seq.where_(predicate.as_str())?,
            Step::Select(selector) => seq.select(selector.as_str())?,
            Step::SelectKey(selector) => seq.select_key(selector.as_str())?,
            Step::OrderBy(selector) | Step::OrderByDesc(selector) => {
                let sorted = if matches!(step, Step::OrderBy(_)) {
                    seq.order_by(selector.as_str(), None)?
                } else {
                    seq.order_by_descending(selector.as_str(), None)?
                };
                let next = Enumerable::clone(&sorted);
                ordered = Some(sorted);
                next
            }
            Step::Take(n) => seq.take(*n),
            Step::Skip(n) => seq.skip(*n),
            Step::Distinct => seq.distinct(None),
            Step::Reverse => seq.reverse(),
            Step::Values => seq.values(),
            Step::Keys => seq.keys(),
            Step::GroupBy(selector) => seq.group_by(selector.as_str())?,
            Step::ThenBy(_) => seq,
        };
    }

    let result = match &query.terminal {
        None => Value::array(seq.to_array()?),
        Some(Terminal::Count) => Value::index(seq.count()?),
        Some(Terminal::Sum) => seq.sum(None)?,
        Some(Terminal::First) => seq.first(None)?,
        Some(Terminal::Last) => seq.last(None)?,
        Some(Terminal::Implode(separator)) => Value::string(seq.implode(separator, None)?),
    };
    to_json_text(&result, query.pretty)
}

pub const USAGE: &str = "\
Usage: lq [--pretty] [--input <file>|-] <op> [<arg>] ... [<terminal>]

Reads a JSON document (stdin by default), applies the operators left to
right and prints the result as JSON.

Options:
  --pretty              Pretty-print the output
  -i, --input <file>    Read from <file>; `-` means stdin
  -h, --help            Show this help

Operators:
  where <lambda>        Keep elements for which the lambda is truthy
  select <lambda>       Replace each value
  select-key <lambda>   Replace each key
  order-by <lambda>     Stable ascending sort
  order-by-desc <lambda>
                        Stable descending sort
  then-by <lambda>      Break ties of the preceding sort
  take <n>, skip <n>    Slice from the front
  distinct, reverse, values, keys
  group-by <lambda>     Group by the lambda's result

Terminals:
  count, sum, first, last, implode <sep>

Example:
  echo '[3,1,2]' | lq where '$x => $x > 1' order-by '$x => $x' values

Set LQ_LOG (or RUST_LOG) to a tracing filter such as `lq_core=trace`.";

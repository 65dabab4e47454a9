// Formula evaluator - walks the AST, pulling cell and range values through a Resolver

use crate::address::CellAddr;
use super::parser::{Expr, Op};
use super::{eval_logical, eval_math, eval_text};

/// Source of cell values for the evaluator. The evaluator never owns grid
/// storage; every reference goes through these two calls.
pub trait Resolver {
    /// Displayed value of a single cell (formula cells are evaluated).
    fn resolve_cell(&self, addr: CellAddr) -> Value;

    /// Values of the rectangle spanned by two corners, inclusive.
    /// Rows are the outer sequence, columns the inner one. Corners may be
    /// given in any order.
    fn resolve_range(&self, top_left: CellAddr, bottom_right: CellAddr) -> Vec<Vec<Value>> {
        let (min_row, max_row) = (top_left.row.min(bottom_right.row), top_left.row.max(bottom_right.row));
        let (min_col, max_col) = (top_left.col.min(bottom_right.col), top_left.col.max(bottom_right.col));

        (min_row..=max_row)
            .map(|row| {
                (min_col..=max_col)
                    .map(|col| self.resolve_cell(CellAddr { row, col }))
                    .collect()
            })
            .collect()
    }

    /// Non-empty values of the rectangle in row-major order. Aggregates only
    /// need these, so sparse stores override this to skip the empty area.
    fn range_values(&self, top_left: CellAddr, bottom_right: CellAddr) -> Vec<Value> {
        self.resolve_range(top_left, bottom_right)
            .into_iter()
            .flatten()
            .filter(|v| *v != Value::Empty)
            .collect()
    }
}

// =============================================================================
// Value: The scalar primitive for all cell values and formula results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
}

impl Value {
    pub fn to_number(&self) -> Result<f64, String> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) if s.trim().is_empty() => Ok(0.0),
            Value::Text(s) => s.trim().parse::<f64>().map_err(|_| "#VALUE!".to_string()),
            Value::Empty => Ok(0.0),
            Value::Error(e) => Err(e.clone()),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
            Value::Empty => String::new(),
            Value::Error(e) => {
                if e.starts_with('#') { e.clone() } else { format!("#ERR: {}", e) }
            }
        }
    }

    pub fn to_bool(&self) -> Result<bool, String> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(s) => {
                let upper = s.to_uppercase();
                if upper == "TRUE" { Ok(true) }
                else if upper == "FALSE" { Ok(false) }
                else { Err("#VALUE!".to_string()) }
            }
            Value::Empty => Ok(false),
            Value::Error(e) => Err(e.clone()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

/// Integers print without decimals; other numbers keep at most ten places.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NUM!".to_string()
    } else if n.is_infinite() {
        "#DIV/0!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let s = format!("{:.10}", n);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Parse and evaluate formula text in one step. Parse failures become error values.
pub fn evaluate_formula<R: Resolver>(formula: &str, resolver: &R) -> Value {
    match super::parser::parse(formula) {
        Ok(expr) => evaluate(&expr, resolver),
        Err(e) => Value::Error(e),
    }
}

pub fn evaluate<R: Resolver>(expr: &Expr, resolver: &R) -> Value {
    match expr {
        Expr::Empty => Value::Empty,
        Expr::Number(n) => Value::Number(*n),
        Expr::Text(s) => Value::Text(s.clone()),
        Expr::Boolean(b) => Value::Boolean(*b),
        Expr::CellRef(addr) => match resolver.resolve_cell(*addr) {
            // A reference to an empty cell reads as zero
            Value::Empty => Value::Number(0.0),
            other => other,
        },
        Expr::Range { .. } => Value::Error("#VALUE!".to_string()),
        Expr::Function { name, args } => evaluate_function(name, args, resolver),
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate(left, resolver);
            let right = evaluate(right, resolver);

            if let Value::Error(e) = &left {
                return Value::Error(e.clone());
            }
            if let Value::Error(e) = &right {
                return Value::Error(e.clone());
            }

            match op {
                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow => {
                    let (a, b) = match (left.to_number(), right.to_number()) {
                        (Ok(a), Ok(b)) => (a, b),
                        (Err(e), _) | (_, Err(e)) => return Value::Error(e),
                    };
                    let result = match op {
                        Op::Add => a + b,
                        Op::Sub => a - b,
                        Op::Mul => a * b,
                        Op::Div => {
                            if b == 0.0 {
                                return Value::Error("#DIV/0!".to_string());
                            }
                            a / b
                        }
                        _ => a.powf(b),
                    };
                    if result.is_finite() {
                        Value::Number(result)
                    } else {
                        Value::Error("#NUM!".to_string())
                    }
                }
                Op::Concat => Value::Text(format!("{}{}", left.to_text(), right.to_text())),
                Op::Lt | Op::Gt | Op::Eq | Op::LtEq | Op::GtEq | Op::NotEq => {
                    Value::Boolean(compare(*op, &left, &right))
                }
            }
        }
    }
}

// Numbers compare numerically, everything else as case-insensitive text
fn compare(op: Op, left: &Value, right: &Value) -> bool {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (Value::Text(_), _) | (_, Value::Text(_)) => {
            match (left.to_number(), right.to_number()) {
                (Ok(a), Ok(b)) if !matches!(left, Value::Empty) && !matches!(right, Value::Empty) => {
                    a.partial_cmp(&b)
                }
                _ => Some(left.to_text().to_lowercase().cmp(&right.to_text().to_lowercase())),
            }
        }
        _ => match (left.to_number(), right.to_number()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };

    match ordering {
        Some(Ordering::Less) => matches!(op, Op::Lt | Op::LtEq | Op::NotEq),
        Some(Ordering::Greater) => matches!(op, Op::Gt | Op::GtEq | Op::NotEq),
        Some(Ordering::Equal) => matches!(op, Op::Eq | Op::LtEq | Op::GtEq),
        None => matches!(op, Op::NotEq),
    }
}

fn evaluate_function<R: Resolver>(name: &str, args: &[Expr], resolver: &R) -> Value {
    if let Some(result) = eval_math::try_evaluate(name, args, resolver) {
        return result;
    }
    if let Some(result) = eval_text::try_evaluate(name, args, resolver) {
        return result;
    }
    if let Some(result) = eval_logical::try_evaluate(name, args, resolver) {
        return result;
    }
    Value::Error("#NAME?".to_string())
}

/// Collect numeric values from arguments. Inside ranges only numbers count;
/// direct arguments are coerced. The first error wins.
pub(crate) fn collect_numbers<R: Resolver>(args: &[Expr], resolver: &R) -> Result<Vec<f64>, String> {
    let mut values = Vec::new();

    for arg in args {
        match arg {
            Expr::Range { start, end } => {
                for value in resolver.range_values(*start, *end) {
                    match value {
                        Value::Number(n) => values.push(n),
                        Value::Error(e) => return Err(e),
                        _ => {}
                    }
                }
            }
            Expr::Empty => {}
            _ => values.push(evaluate(arg, resolver).to_number()?),
        }
    }

    Ok(values)
}

/// Evaluate a single-argument function's argument, checking the arity.
pub(crate) fn single_arg<R: Resolver>(name: &str, args: &[Expr], resolver: &R) -> Result<Value, Value> {
    if args.len() != 1 {
        return Err(Value::Error(format!("{} requires exactly one argument", name)));
    }
    let value = evaluate(&args[0], resolver);
    if let Value::Error(e) = value {
        return Err(Value::Error(e));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<CellAddr, Value>);

    impl Resolver for MapResolver {
        fn resolve_cell(&self, addr: CellAddr) -> Value {
            self.0.get(&addr).cloned().unwrap_or(Value::Empty)
        }
    }

    fn resolver(cells: &[(&str, Value)]) -> MapResolver {
        MapResolver(
            cells
                .iter()
                .map(|(label, v)| (CellAddr::parse(label).unwrap(), v.clone()))
                .collect(),
        )
    }

    fn eval(formula: &str, r: &MapResolver) -> Value {
        evaluate_formula(formula, r)
    }

    #[test]
    fn test_arithmetic() {
        let r = resolver(&[]);
        assert_eq!(eval("1+2", &r), Value::Number(3.0));
        assert_eq!(eval("2*3+4", &r), Value::Number(10.0));
        assert_eq!(eval("(2+3)*4", &r), Value::Number(20.0));
        assert_eq!(eval("2^10", &r), Value::Number(1024.0));
        assert_eq!(eval("50%", &r), Value::Number(0.5));
        assert_eq!(eval("-3+1", &r), Value::Number(-2.0));
    }

    #[test]
    fn test_div_zero() {
        let r = resolver(&[]);
        assert_eq!(eval("1/0", &r), Value::Error("#DIV/0!".to_string()));
    }

    #[test]
    fn test_cell_refs() {
        let r = resolver(&[("A1", Value::Number(2.0)), ("B1", Value::Number(3.0))]);
        assert_eq!(eval("A1+B1", &r), Value::Number(5.0));
        // Empty reads as zero
        assert_eq!(eval("A1+Z99", &r), Value::Number(2.0));
    }

    #[test]
    fn test_numeric_text_coerces() {
        let r = resolver(&[("A1", Value::Text("4".to_string())), ("A2", Value::Text("x".to_string()))]);
        assert_eq!(eval("A1*2", &r), Value::Number(8.0));
        assert_eq!(eval("A2*2", &r), Value::Error("#VALUE!".to_string()));
    }

    #[test]
    fn test_range_rows_outer_inclusive() {
        struct Recording(std::cell::RefCell<Vec<String>>);
        impl Resolver for Recording {
            fn resolve_cell(&self, addr: CellAddr) -> Value {
                self.0.borrow_mut().push(addr.to_string());
                Value::Number(1.0)
            }
        }

        let r = Recording(std::cell::RefCell::new(Vec::new()));
        // Corners given bottom-right first are normalized
        assert_eq!(evaluate_formula("SUM(B2:A1)", &r), Value::Number(4.0));
        assert_eq!(*r.0.borrow(), vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_error_propagates() {
        let r = resolver(&[("A1", Value::Error("#CIRC!".to_string()))]);
        assert_eq!(eval("A1+1", &r), Value::Error("#CIRC!".to_string()));
        assert_eq!(eval("SUM(A1:A3)", &r), Value::Error("#CIRC!".to_string()));
    }

    #[test]
    fn test_comparisons() {
        let r = resolver(&[("A1", Value::Text("Foo".to_string()))]);
        assert_eq!(eval("1<2", &r), Value::Boolean(true));
        assert_eq!(eval("3<>3", &r), Value::Boolean(false));
        assert_eq!(eval("A1=\"foo\"", &r), Value::Boolean(true));
        assert_eq!(eval("\"10\"=10", &r), Value::Boolean(true));
    }

    #[test]
    fn test_concat() {
        let r = resolver(&[("A1", Value::Number(1.5))]);
        assert_eq!(eval("\"x\"&A1&TRUE", &r), Value::Text("x1.5TRUE".to_string()));
    }

    #[test]
    fn test_unknown_function_and_parse_error() {
        let r = resolver(&[]);
        assert_eq!(eval("NOPE(1)", &r), Value::Error("#NAME?".to_string()));
        let parse_err = eval("1+", &r);
        assert!(parse_err.is_error());
        assert!(parse_err.to_text().starts_with("#ERR: "));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(2.5), "2.5");
    }
}

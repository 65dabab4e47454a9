// Text functions: CONCATENATE, LEN, UPPER, LOWER, TRIM, LEFT, RIGHT

use super::eval::{evaluate, single_arg, Resolver, Value};
use super::parser::Expr;

pub(crate) fn try_evaluate<R: Resolver>(
    name: &str, args: &[Expr], resolver: &R,
) -> Option<Value> {
    let result = match name {
        "CONCATENATE" | "CONCAT" => {
            let mut result = String::new();
            for arg in args {
                match arg {
                    Expr::Range { start, end } => {
                        for value in resolver.range_values(*start, *end).iter() {
                            if let Value::Error(e) = value {
                                return Some(Value::Error(e.clone()));
                            }
                            result.push_str(&value.to_text());
                        }
                    }
                    _ => match evaluate(arg, resolver) {
                        Value::Error(e) => return Some(Value::Error(e)),
                        value => result.push_str(&value.to_text()),
                    },
                }
            }
            Value::Text(result)
        }
        "LEN" => match single_arg(name, args, resolver) {
            Ok(v) => Value::Number(v.to_text().chars().count() as f64),
            Err(e) => e,
        },
        "UPPER" => match single_arg(name, args, resolver) {
            Ok(v) => Value::Text(v.to_text().to_uppercase()),
            Err(e) => e,
        },
        "LOWER" => match single_arg(name, args, resolver) {
            Ok(v) => Value::Text(v.to_text().to_lowercase()),
            Err(e) => e,
        },
        "TRIM" => match single_arg(name, args, resolver) {
            // Leading/trailing spaces removed, internal runs collapsed
            Ok(v) => Value::Text(v.to_text().split_whitespace().collect::<Vec<_>>().join(" ")),
            Err(e) => e,
        },
        "LEFT" | "RIGHT" => {
            if args.is_empty() || args.len() > 2 {
                return Some(Value::Error(format!("{} requires 1 or 2 arguments", name)));
            }
            let text = match evaluate(&args[0], resolver) {
                Value::Error(e) => return Some(Value::Error(e)),
                v => v.to_text(),
            };
            let count = if args.len() == 2 {
                match evaluate(&args[1], resolver).to_number() {
                    Ok(n) if n < 0.0 => return Some(Value::Error("#VALUE!".to_string())),
                    Ok(n) => n as usize,
                    Err(e) => return Some(Value::Error(e)),
                }
            } else {
                1
            };
            let len = text.chars().count();
            if name == "LEFT" {
                Value::Text(text.chars().take(count).collect())
            } else {
                Value::Text(text.chars().skip(len.saturating_sub(count)).collect())
            }
        }
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use crate::address::CellAddr;
    use crate::formula::eval::{evaluate_formula, Resolver, Value};

    struct Row;

    impl Resolver for Row {
        fn resolve_cell(&self, addr: CellAddr) -> Value {
            match (addr.row, addr.col) {
                (1, 1) => Value::Text("  Hello   World ".to_string()),
                (1, 2) => Value::Number(42.0),
                (1, 3) => Value::Text("ab".to_string()),
                _ => Value::Empty,
            }
        }
    }

    #[test]
    fn test_concatenate() {
        assert_eq!(evaluate_formula("CONCATENATE(\"n=\", B1)", &Row), Value::Text("n=42".to_string()));
        assert_eq!(evaluate_formula("CONCAT(B1:C1)", &Row), Value::Text("42ab".to_string()));
    }

    #[test]
    fn test_case_and_len() {
        assert_eq!(evaluate_formula("UPPER(C1)", &Row), Value::Text("AB".to_string()));
        assert_eq!(evaluate_formula("LOWER(\"MiXeD\")", &Row), Value::Text("mixed".to_string()));
        assert_eq!(evaluate_formula("LEN(B1)", &Row), Value::Number(2.0));
    }

    #[test]
    fn test_trim() {
        assert_eq!(evaluate_formula("TRIM(A1)", &Row), Value::Text("Hello World".to_string()));
    }

    #[test]
    fn test_left_right() {
        assert_eq!(evaluate_formula("LEFT(\"spreadsheet\", 6)", &Row), Value::Text("spread".to_string()));
        assert_eq!(evaluate_formula("RIGHT(\"spreadsheet\", 5)", &Row), Value::Text("sheet".to_string()));
        assert_eq!(evaluate_formula("LEFT(\"abc\")", &Row), Value::Text("a".to_string()));
        assert_eq!(evaluate_formula("RIGHT(\"abc\", 10)", &Row), Value::Text("abc".to_string()));
    }
}

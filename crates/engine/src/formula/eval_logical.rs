// Logical functions: IF, AND, OR, NOT

use super::eval::{evaluate, single_arg, Resolver, Value};
use super::parser::Expr;

pub(crate) fn try_evaluate<R: Resolver>(
    name: &str, args: &[Expr], resolver: &R,
) -> Option<Value> {
    let result = match name {
        "IF" => {
            if args.len() < 2 || args.len() > 3 {
                return Some(Value::Error("IF requires 2 or 3 arguments".to_string()));
            }
            let condition = match evaluate(&args[0], resolver).to_bool() {
                Ok(b) => b,
                Err(e) => return Some(Value::Error(e)),
            };
            if condition {
                evaluate(&args[1], resolver)
            } else if args.len() == 3 {
                evaluate(&args[2], resolver)
            } else {
                Value::Boolean(false)
            }
        }
        "AND" | "OR" => {
            if args.is_empty() {
                return Some(Value::Error(format!("{} requires at least one argument", name)));
            }
            let short_circuit = name == "OR";
            for arg in args {
                match evaluate(arg, resolver).to_bool() {
                    Ok(b) if b == short_circuit => return Some(Value::Boolean(short_circuit)),
                    Ok(_) => {}
                    Err(e) => return Some(Value::Error(e)),
                }
            }
            Value::Boolean(!short_circuit)
        }
        "NOT" => match single_arg(name, args, resolver).map(|v| v.to_bool()) {
            Ok(Ok(b)) => Value::Boolean(!b),
            Ok(Err(e)) => Value::Error(e),
            Err(e) => e,
        },
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use crate::address::CellAddr;
    use crate::formula::eval::{evaluate_formula, Resolver, Value};

    struct Cells;

    impl Resolver for Cells {
        fn resolve_cell(&self, addr: CellAddr) -> Value {
            match addr.label().as_str() {
                "A1" => Value::Number(10.0),
                "A2" => Value::Text("oops".to_string()),
                _ => Value::Empty,
            }
        }
    }

    #[test]
    fn test_if() {
        assert_eq!(evaluate_formula("IF(A1>5, \"big\", \"small\")", &Cells), Value::Text("big".to_string()));
        assert_eq!(evaluate_formula("IF(A1>50, \"big\", \"small\")", &Cells), Value::Text("small".to_string()));
        assert_eq!(evaluate_formula("IF(A1>50, 1)", &Cells), Value::Boolean(false));
        assert!(evaluate_formula("IF(A2, 1, 2)", &Cells).is_error());
    }

    #[test]
    fn test_and_or_not() {
        assert_eq!(evaluate_formula("AND(TRUE, A1)", &Cells), Value::Boolean(true));
        assert_eq!(evaluate_formula("AND(TRUE, B9)", &Cells), Value::Boolean(false));
        assert_eq!(evaluate_formula("OR(FALSE, A1=10)", &Cells), Value::Boolean(true));
        assert_eq!(evaluate_formula("OR(FALSE, 0)", &Cells), Value::Boolean(false));
        assert_eq!(evaluate_formula("NOT(A1)", &Cells), Value::Boolean(false));
        assert!(evaluate_formula("AND()", &Cells).is_error());
    }
}

// Math and aggregate functions: SUM, AVERAGE, MIN, MAX, COUNT, ABS, ROUND, INT, MOD, POWER, SQRT

use super::eval::{collect_numbers, evaluate, single_arg, Resolver, Value};
use super::parser::Expr;

pub(crate) fn try_evaluate<R: Resolver>(
    name: &str, args: &[Expr], resolver: &R,
) -> Option<Value> {
    let result = match name {
        "SUM" => match collect_numbers(args, resolver) {
            Ok(vals) => Value::Number(vals.iter().sum()),
            Err(e) => Value::Error(e),
        },
        "AVERAGE" | "AVG" => match collect_numbers(args, resolver) {
            Ok(vals) if vals.is_empty() => Value::Error("#DIV/0!".to_string()),
            Ok(vals) => Value::Number(vals.iter().sum::<f64>() / vals.len() as f64),
            Err(e) => Value::Error(e),
        },
        "MIN" => match collect_numbers(args, resolver) {
            Ok(vals) if vals.is_empty() => Value::Number(0.0),
            Ok(vals) => Value::Number(vals.iter().cloned().fold(f64::INFINITY, f64::min)),
            Err(e) => Value::Error(e),
        },
        "MAX" => match collect_numbers(args, resolver) {
            Ok(vals) if vals.is_empty() => Value::Number(0.0),
            Ok(vals) => Value::Number(vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
            Err(e) => Value::Error(e),
        },
        "COUNT" => {
            // Counts numbers only; text and errors in ranges are skipped
            let mut count = 0usize;
            for arg in args {
                match arg {
                    Expr::Range { start, end } => {
                        count += resolver
                            .range_values(*start, *end)
                            .iter()
                            .filter(|v| matches!(v, Value::Number(_)))
                            .count();
                    }
                    Expr::Empty => {}
                    _ => {
                        if let Value::Number(_) = evaluate(arg, resolver) {
                            count += 1;
                        }
                    }
                }
            }
            Value::Number(count as f64)
        }
        "ABS" => unary_number(name, args, resolver, f64::abs),
        "INT" => unary_number(name, args, resolver, f64::floor),
        "SQRT" => match single_number(name, args, resolver) {
            Ok(n) if n < 0.0 => Value::Error("#NUM!".to_string()),
            Ok(n) => Value::Number(n.sqrt()),
            Err(e) => e,
        },
        "ROUND" => {
            if args.is_empty() || args.len() > 2 {
                return Some(Value::Error("ROUND requires 1 or 2 arguments".to_string()));
            }
            let value = match evaluate(&args[0], resolver).to_number() {
                Ok(n) => n,
                Err(e) => return Some(Value::Error(e)),
            };
            let decimals = if args.len() == 2 {
                match evaluate(&args[1], resolver).to_number() {
                    Ok(n) => n as i32,
                    Err(e) => return Some(Value::Error(e)),
                }
            } else {
                0
            };
            let factor = 10_f64.powi(decimals);
            Value::Number((value * factor).round() / factor)
        }
        "MOD" | "POWER" => {
            if args.len() != 2 {
                return Some(Value::Error(format!("{} requires exactly 2 arguments", name)));
            }
            let a = match evaluate(&args[0], resolver).to_number() {
                Ok(n) => n,
                Err(e) => return Some(Value::Error(e)),
            };
            let b = match evaluate(&args[1], resolver).to_number() {
                Ok(n) => n,
                Err(e) => return Some(Value::Error(e)),
            };
            if name == "MOD" {
                if b == 0.0 {
                    return Some(Value::Error("#DIV/0!".to_string()));
                }
                // Result takes the sign of the divisor
                Value::Number(a - b * (a / b).floor())
            } else {
                Value::Number(a.powf(b))
            }
        }
        _ => return None,
    };
    Some(result)
}

fn single_number<R: Resolver>(name: &str, args: &[Expr], resolver: &R) -> Result<f64, Value> {
    let value = single_arg(name, args, resolver)?;
    value.to_number().map_err(Value::Error)
}

fn unary_number<R: Resolver>(name: &str, args: &[Expr], resolver: &R, f: fn(f64) -> f64) -> Value {
    match single_number(name, args, resolver) {
        Ok(n) => Value::Number(f(n)),
        Err(e) => e,
    }
}

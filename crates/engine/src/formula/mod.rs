// Formula parsing and evaluation

pub mod parser;
pub mod eval;

pub(crate) mod eval_math;
pub(crate) mod eval_text;
pub(crate) mod eval_logical;

//! Compliance evaluation: certificate facts against program requirements.

mod evaluator;

pub use evaluator::{Evaluator, EvaluatorOptions, evaluate, evaluate_now};

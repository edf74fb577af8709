pub mod eval;
pub mod special_forms;

pub use eval::{eval_value, EvalResult, Interpreter};
pub use special_forms::SPECIAL_FORM_NAMES;

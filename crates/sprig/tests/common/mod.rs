use sprig_core::SprigError;
use sprig_eval::Interpreter;

/// Evaluate a sequence of top-level forms in one interpreter and return
/// the printed form of the last result.
pub fn eval_forms(forms: &[&str]) -> String {
    let mut interp = Interpreter::new();
    let mut last = interp.heap().nil();
    for form in forms {
        last = interp
            .eval_str(form)
            .unwrap_or_else(|e| panic!("`{form}` failed: {e}"));
    }
    interp.print(last)
}

/// Evaluate one form, returning its printed result.
pub fn eval_one(input: &str) -> String {
    eval_forms(&[input])
}

/// Evaluate forms expecting the final one to fail; earlier forms must
/// succeed.
pub fn eval_forms_err(forms: &[&str]) -> SprigError {
    let mut interp = Interpreter::new();
    let (last, setup) = forms.split_last().expect("at least one form");
    for form in setup {
        interp
            .eval_str(form)
            .unwrap_or_else(|e| panic!("`{form}` failed: {e}"));
    }
    interp
        .eval_str(last)
        .expect_err(&format!("expected error for: {last}"))
}

use std::cell::Cell;

use sprig_core::value::list_to_vec;
use sprig_core::{env, intern, truthiness, Heap, ObjId, Object, Spur, SprigError};

use crate::eval::{eval_in, eval_value, param_list, Context, Step};

/// Pre-interned `Spur` handles for the special form names.
///
/// Every list expression checks whether its head names a special form, so
/// the comparison is done on interned keys instead of resolving strings.
struct SpecialFormSpurs {
    begin: Spur,
    cond: Spur,
    define: Spur,
    else_: Spur,
    if_: Spur,
    lambda: Spur,
    set_bang: Spur,
}

impl SpecialFormSpurs {
    fn init() -> Self {
        Self {
            begin: intern("begin"),
            cond: intern("cond"),
            define: intern("define"),
            else_: intern("else"),
            if_: intern("if"),
            lambda: intern("lambda"),
            set_bang: intern("set!"),
        }
    }
}

thread_local! {
    static SF: Cell<Option<&'static SpecialFormSpurs>> = const { Cell::new(None) };
}

fn special_forms() -> &'static SpecialFormSpurs {
    SF.with(|cell| match cell.get() {
        Some(sf) => sf,
        None => {
            let sf: &'static SpecialFormSpurs = Box::leak(Box::new(SpecialFormSpurs::init()));
            cell.set(Some(sf));
            sf
        }
    })
}

/// Canonical list of the special form names, for REPL help and completion.
pub const SPECIAL_FORM_NAMES: &[&str] = &["begin", "cond", "define", "if", "lambda", "set!"];

/// Dispatch a special form by its head symbol. Returns None when the head
/// is not a special form and ordinary application should proceed.
pub(crate) fn try_eval_special(
    heap: &mut Heap,
    head: Spur,
    operands: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Option<Result<Step, SprigError>> {
    let sf = special_forms();

    if head == sf.if_ {
        Some(eval_if(heap, operands, env_id, ctx))
    } else if head == sf.define {
        Some(eval_define(heap, operands, env_id))
    } else if head == sf.cond {
        Some(eval_cond(heap, operands, env_id, ctx))
    } else if head == sf.begin {
        Some(eval_begin(heap, operands, env_id, ctx))
    } else if head == sf.lambda {
        Some(eval_lambda(heap, operands, env_id))
    } else if head == sf.set_bang {
        Some(eval_set(heap, operands, env_id))
    } else {
        None
    }
}

/// `(define name expr)` binds into the innermost frame; `(define (name
/// params...) body...)` is sugar for binding a named lambda. Both fail if
/// the innermost frame already binds the name.
fn eval_define(heap: &mut Heap, operands: ObjId, env_id: ObjId) -> Result<Step, SprigError> {
    let (target, rest) = match heap.get(operands) {
        Object::Pair { first, rest } => (*first, *rest),
        _ => {
            return Err(SprigError::invalid_form(
                "define",
                "expected a target and a value",
            ))
        }
    };

    enum Target {
        Plain(Spur),
        Sugar { name_id: ObjId, params: ObjId },
    }
    let parsed = match heap.get(target) {
        Object::Symbol(name) => Target::Plain(*name),
        Object::Pair { first, rest } => Target::Sugar {
            name_id: *first,
            params: *rest,
        },
        other => {
            return Err(SprigError::invalid_form(
                "define",
                format!("target must be a name or (name params...), got {}", other.type_name()),
            ))
        }
    };

    match parsed {
        Target::Plain(name) => {
            let exprs = list_to_vec(heap, rest).ok_or_else(|| {
                SprigError::invalid_form("define", "expected a single value expression")
            })?;
            if exprs.len() != 1 {
                return Err(SprigError::invalid_form(
                    "define",
                    format!("expected a single value expression, got {}", exprs.len()),
                ));
            }
            let value = eval_value(heap, exprs[0], env_id)?;
            env::define(heap, env_id, name, value)?;
            Ok(Step::Done(value))
        }
        Target::Sugar { name_id, params } => {
            let name = match heap.get(name_id) {
                Object::Symbol(name) => *name,
                other => {
                    return Err(SprigError::invalid_form(
                        "define",
                        format!("procedure name must be a symbol, got {}", other.type_name()),
                    ))
                }
            };
            let proc_ = make_procedure(heap, params, rest, env_id, Some(name), "define")?;
            env::define(heap, env_id, name, proc_)?;
            Ok(Step::Done(proc_))
        }
    }
}

/// `(set! name expr)` mutates the nearest enclosing binding; it never
/// creates one.
fn eval_set(heap: &mut Heap, operands: ObjId, env_id: ObjId) -> Result<Step, SprigError> {
    let forms = list_to_vec(heap, operands)
        .ok_or_else(|| SprigError::invalid_form("set!", "expected a name and an expression"))?;
    if forms.len() != 2 {
        return Err(SprigError::invalid_form(
            "set!",
            format!("expected a name and an expression, got {} operands", forms.len()),
        ));
    }
    let name = match heap.get(forms[0]) {
        Object::Symbol(name) => *name,
        other => {
            return Err(SprigError::invalid_form(
                "set!",
                format!("target must be a symbol, got {}", other.type_name()),
            ))
        }
    };
    let value = eval_value(heap, forms[1], env_id)?;
    env::assign(heap, env_id, name, value)?;
    Ok(Step::Done(value))
}

/// `(if predicate consequent alternative)`, exactly three operands. The
/// chosen branch inherits the caller's tail context.
fn eval_if(
    heap: &mut Heap,
    operands: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Result<Step, SprigError> {
    let forms = list_to_vec(heap, operands)
        .ok_or_else(|| SprigError::invalid_form("if", "operands must form a proper list"))?;
    if forms.len() != 3 {
        return Err(SprigError::invalid_form(
            "if",
            format!("expected 3 operands, got {}", forms.len()),
        ));
    }
    let test = eval_value(heap, forms[0], env_id)?;
    if truthiness(heap, test)? {
        eval_in(heap, forms[1], env_id, ctx)
    } else {
        eval_in(heap, forms[2], env_id, ctx)
    }
}

/// `(cond (predicate action)... (else action)?)`. Clause shape and the
/// else-must-be-final rule are validated before any predicate runs; the
/// matched action inherits the caller's tail context. No match and no else
/// evaluates to nil.
fn eval_cond(
    heap: &mut Heap,
    operands: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Result<Step, SprigError> {
    let clauses = list_to_vec(heap, operands)
        .ok_or_else(|| SprigError::invalid_form("cond", "clauses must form a proper list"))?;
    let else_spur = special_forms().else_;

    let mut parsed = Vec::with_capacity(clauses.len());
    for (i, clause) in clauses.iter().enumerate() {
        let parts = list_to_vec(heap, *clause).ok_or_else(|| {
            SprigError::invalid_form("cond", "clause must be a (predicate action) list")
        })?;
        if parts.len() != 2 {
            return Err(SprigError::invalid_form(
                "cond",
                format!("clause must be (predicate action), got {} elements", parts.len()),
            ));
        }
        let is_else = matches!(heap.get(parts[0]), Object::Symbol(s) if *s == else_spur);
        if is_else && i != clauses.len() - 1 {
            return Err(SprigError::invalid_form(
                "cond",
                "else must be the final clause",
            ));
        }
        let predicate = if is_else { None } else { Some(parts[0]) };
        parsed.push((predicate, parts[1]));
    }

    for (predicate, action) in parsed {
        match predicate {
            None => return eval_in(heap, action, env_id, ctx),
            Some(predicate) => {
                let value = eval_value(heap, predicate, env_id)?;
                if truthiness(heap, value)? {
                    return eval_in(heap, action, env_id, ctx);
                }
            }
        }
    }
    Ok(Step::Done(heap.nil()))
}

/// `(begin expr...)`: evaluate in order, return the last result. This is
/// also how procedure bodies run; the final expression inherits the tail
/// context.
fn eval_begin(
    heap: &mut Heap,
    operands: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Result<Step, SprigError> {
    let forms = list_to_vec(heap, operands)
        .ok_or_else(|| SprigError::invalid_form("begin", "operands must form a proper list"))?;
    let Some((last, init)) = forms.split_last() else {
        return Ok(Step::Done(heap.nil()));
    };
    for expr in init {
        eval_value(heap, *expr, env_id)?;
    }
    eval_in(heap, *last, env_id, ctx)
}

/// `(lambda (params...) body...)` captures the current environment.
fn eval_lambda(heap: &mut Heap, operands: ObjId, env_id: ObjId) -> Result<Step, SprigError> {
    let (params, body) = match heap.get(operands) {
        Object::Pair { first, rest } => (*first, *rest),
        _ => {
            return Err(SprigError::invalid_form(
                "lambda",
                "expected a parameter list and a body",
            ))
        }
    };
    make_procedure(heap, params, body, env_id, None, "lambda").map(Step::Done)
}

/// Validate parameter list and body, then allocate the closure. The body
/// keeps its list form: `apply_procedure` walks it as a begin sequence.
fn make_procedure(
    heap: &mut Heap,
    params: ObjId,
    body: ObjId,
    env_id: ObjId,
    name: Option<Spur>,
    form: &'static str,
) -> Result<ObjId, SprigError> {
    param_list(heap, params, form)?;
    let body_exprs = list_to_vec(heap, body)
        .ok_or_else(|| SprigError::invalid_form(form, "body must be a proper list"))?;
    if body_exprs.is_empty() {
        return Err(SprigError::invalid_form(form, "body must not be empty"));
    }
    heap.alloc(Object::Procedure {
        params,
        body,
        env: env_id,
        name,
    })
}

use std::rc::Rc;

use sprig_core::value::list_to_vec;
use sprig_core::{env, printer, resolve, Heap, NativeDef, ObjId, Object, Spur, SprigError};

use crate::special_forms;

pub type EvalResult = Result<ObjId, SprigError>;

/// Outcome of evaluating an expression whose context may be tail position.
///
/// `SelfCall` is produced only when a tail call resolves to the procedure
/// object currently executing; the body loop in `apply_procedure` consumes
/// it by rewriting its frame in place. A call to any other callable takes
/// the ordinary, stack-growing path and comes back as `Done`.
pub(crate) enum Step {
    Done(ObjId),
    SelfCall(Vec<ObjId>),
}

/// Whether the expression being evaluated sits in tail position of the
/// procedure identified by `current`.
#[derive(Clone, Copy)]
pub(crate) enum Context {
    Ordinary,
    Tail { current: ObjId },
}

const DEFAULT_HEAP_CAPACITY: usize = 65_536;

/// The interpreter owns the heap and the root environment. One instance,
/// one evaluation in flight at a time.
pub struct Interpreter {
    heap: Heap,
    global_env: ObjId,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_heap_capacity(DEFAULT_HEAP_CAPACITY)
    }

    pub fn with_heap_capacity(capacity: usize) -> Self {
        // Room for the builtins plus a working margin.
        let mut heap = Heap::new(capacity.max(64));
        let global_env = env::extend(&mut heap, None)
            .expect("fresh heap cannot be exhausted");
        sprig_stdlib::register_stdlib(&mut heap, global_env)
            .expect("stdlib registration into a fresh heap cannot fail");
        // The root environment is rooted for the interpreter's lifetime;
        // everything the user defines hangs off it.
        heap.push_root(global_env);
        Interpreter { heap, global_env }
    }

    /// Parse one expression and evaluate it.
    pub fn eval_str(&mut self, input: &str) -> EvalResult {
        let expr = sprig_reader::read(&mut self.heap, input)?;
        self.eval(expr)
    }

    /// One outer evaluation: the collection-enabled bracket and the single
    /// catch point errors unwind to. Side effects committed before a
    /// failure stay committed.
    ///
    /// The returned handle stays valid until the next evaluation begins;
    /// print or store it before evaluating again.
    pub fn eval(&mut self, expr: ObjId) -> EvalResult {
        // Root the expression graph before the bracket opens: enabling
        // collection can itself trigger a cycle.
        let base = self.heap.root_depth();
        self.heap.push_root(expr);
        self.heap.collect_enable();
        let result = eval_value(&mut self.heap, expr, self.global_env);
        // Keep the result alive through the closing sweep.
        if let Ok(id) = &result {
            self.heap.push_root(*id);
        }
        self.heap.collect_disable();
        self.heap.truncate_roots(base);
        result
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn global_env(&self) -> ObjId {
        self.global_env
    }

    /// Read-compatible rendering of a result.
    pub fn print(&self, id: ObjId) -> String {
        printer::print(&self.heap, id)
    }
}

/// Evaluate in ordinary (non-tail) context.
pub fn eval_value(heap: &mut Heap, expr: ObjId, env_id: ObjId) -> EvalResult {
    match eval_in(heap, expr, env_id, Context::Ordinary)? {
        Step::Done(value) => Ok(value),
        Step::SelfCall(_) => unreachable!("self tail call outside any procedure body"),
    }
}

/// The dispatcher. Classification: non-pair non-symbol values evaluate to
/// themselves; symbols are variable references; pairs are special forms or
/// applications, and their operator must be a bare symbol.
///
/// Rooting invariant: a value returned from here is not rooted. Callers
/// must root or store it before the next allocation; every call site in
/// this crate does so immediately.
pub(crate) fn eval_in(
    heap: &mut Heap,
    expr: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Result<Step, SprigError> {
    enum Shape {
        SelfEval,
        Variable(Spur),
        Combination { op: ObjId, operands: ObjId },
    }
    let shape = match heap.get(expr) {
        Object::Symbol(name) => Shape::Variable(*name),
        Object::Pair { first, rest } => Shape::Combination {
            op: *first,
            operands: *rest,
        },
        _ => Shape::SelfEval,
    };

    match shape {
        Shape::SelfEval => Ok(Step::Done(expr)),
        Shape::Variable(name) => env::lookup(heap, env_id, name)
            .map(Step::Done)
            .ok_or_else(|| SprigError::Unbound(resolve(name))),
        Shape::Combination { op, operands } => {
            let op_name = match heap.get(op) {
                Object::Symbol(name) => *name,
                _ => {
                    return Err(SprigError::InvalidOperator(printer::display_truncated(
                        heap, op, 40,
                    )))
                }
            };
            // Special forms are matched positionally, before any variable
            // lookup: the six keywords cannot be shadowed.
            if let Some(result) = special_forms::try_eval_special(heap, op_name, operands, env_id, ctx)
            {
                return result;
            }
            eval_application(heap, op_name, operands, env_id, ctx)
        }
    }
}

/// Apply whatever the operator names. The root-depth bracket guarantees
/// push/pop symmetry on both the normal return and the error unwind.
fn eval_application(
    heap: &mut Heap,
    op_name: Spur,
    operands: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Result<Step, SprigError> {
    let base = heap.root_depth();
    let step = apply_call(heap, op_name, operands, env_id, ctx);
    heap.truncate_roots(base);
    step
}

fn apply_call(
    heap: &mut Heap,
    op_name: Spur,
    operands: ObjId,
    env_id: ObjId,
    ctx: Context,
) -> Result<Step, SprigError> {
    let callable = env::lookup(heap, env_id, op_name)
        .ok_or_else(|| SprigError::Unbound(resolve(op_name)))?;
    heap.push_root(callable);

    let operand_exprs = list_to_vec(heap, operands).ok_or_else(|| {
        SprigError::invalid_form("call", "operands must form a proper list")
    })?;

    // Left to right; each result is rooted the moment it exists so later
    // operand evaluation cannot reclaim it.
    let mut args = Vec::with_capacity(operand_exprs.len());
    for operand in operand_exprs {
        let value = eval_value(heap, operand, env_id)?;
        heap.push_root(value);
        args.push(value);
    }
    // The evaluated arguments travel as a Sequence, the internal collection
    // kind, never as user-visible pairs.
    let seq = heap.alloc(Object::Sequence(args.clone()))?;
    heap.push_root(seq);

    enum Callee {
        Procedure,
        Native(Rc<NativeDef>),
        Other,
    }
    let callee = match heap.get(callable) {
        Object::Procedure { .. } => Callee::Procedure,
        Object::Native(def) => Callee::Native(Rc::clone(def)),
        _ => Callee::Other,
    };

    match callee {
        Callee::Procedure => {
            if let Context::Tail { current } = ctx {
                if callable == current {
                    // Same procedure object in tail position: hand the
                    // actuals back for the in-place frame rewrite. Nothing
                    // allocates between here and the rebind.
                    return Ok(Step::SelfCall(args));
                }
            }
            apply_procedure(heap, callable, &args).map(Step::Done)
        }
        Callee::Native(def) => apply_native(heap, &def, &args).map(Step::Done),
        Callee::Other => Err(SprigError::InvalidOperator(printer::display_truncated(
            heap, callable, 40,
        ))),
    }
}

/// Read a parameter list into interned names, rejecting anything that is
/// not a proper list of symbols.
pub(crate) fn param_list(
    heap: &Heap,
    params: ObjId,
    form: &'static str,
) -> Result<Vec<Spur>, SprigError> {
    let items = list_to_vec(heap, params).ok_or_else(|| {
        SprigError::invalid_form(form, "parameter list must be a proper list")
    })?;
    items
        .iter()
        .map(|id| match heap.get(*id) {
            Object::Symbol(name) => Ok(*name),
            other => Err(SprigError::invalid_form(
                form,
                format!("parameter must be a symbol, got {}", other.type_name()),
            )),
        })
        .collect()
}

/// Apply a user procedure: extend the *captured* environment (lexical
/// scope) with a frame binding formals to actuals, then run the body with
/// its final expression in tail position. Self-recursive tail calls rebind
/// that same frame and restart the body instead of recursing.
fn apply_procedure(heap: &mut Heap, proc_id: ObjId, args: &[ObjId]) -> EvalResult {
    let base = heap.root_depth();
    let result = apply_procedure_inner(heap, proc_id, args);
    heap.truncate_roots(base);
    result
}

fn apply_procedure_inner(heap: &mut Heap, proc_id: ObjId, args: &[ObjId]) -> EvalResult {
    let (params, body, captured_env, name) = match heap.get(proc_id) {
        Object::Procedure {
            params,
            body,
            env,
            name,
        } => (*params, *body, *env, *name),
        other => panic!("applying non-procedure {}", other.type_name()),
    };
    let param_names = param_list(heap, params, "lambda")?;
    let display_name = name
        .map(resolve)
        .unwrap_or_else(|| "lambda".to_string());
    if args.len() != param_names.len() {
        return Err(SprigError::arity(
            display_name,
            param_names.len().to_string(),
            args.len(),
        ));
    }

    let frame_env = env::extend(heap, Some(captured_env))?;
    heap.push_root(frame_env);
    for (param, arg) in param_names.iter().zip(args.iter()) {
        env::define(heap, frame_env, *param, *arg)?;
    }

    let body_exprs =
        list_to_vec(heap, body).expect("procedure body was validated at construction");
    loop {
        for expr in &body_exprs[..body_exprs.len() - 1] {
            eval_value(heap, *expr, frame_env)?;
        }
        let last = *body_exprs.last().expect("procedure body is non-empty");
        match eval_in(heap, last, frame_env, Context::Tail { current: proc_id })? {
            Step::Done(value) => return Ok(value),
            Step::SelfCall(new_args) => {
                if new_args.len() != param_names.len() {
                    return Err(SprigError::arity(
                        name.map(resolve).unwrap_or_else(|| "lambda".to_string()),
                        param_names.len().to_string(),
                        new_args.len(),
                    ));
                }
                // The actuals are unrooted here, but no allocation happens
                // between the tail call's return and this rewrite.
                env::rebind(heap, frame_env, &param_names, &new_args);
            }
        }
    }
}

/// Apply a native: the descriptor's contract is enforced before the host
/// function runs.
fn apply_native(heap: &mut Heap, def: &NativeDef, args: &[ObjId]) -> EvalResult {
    if args.len() < def.required || (args.len() > def.required && !def.rest) {
        let expected = if def.rest {
            format!("{}+", def.required)
        } else {
            def.required.to_string()
        };
        return Err(SprigError::arity(def.name.clone(), expected, args.len()));
    }
    (def.func)(heap, args)
}

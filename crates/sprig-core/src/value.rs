use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lasso::Rodeo;
pub use lasso::Spur;

use crate::error::SprigError;
use crate::heap::{Heap, ObjId};

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// A native procedure callable from Sprig code.
pub type NativeFnInner = dyn Fn(&mut Heap, &[ObjId]) -> Result<ObjId, SprigError>;

/// Descriptor for a host-provided builtin: the evaluator enforces the
/// argument-count contract before the function is ever invoked.
pub struct NativeDef {
    pub name: String,
    /// Number of arguments the builtin needs.
    pub required: usize,
    /// Whether arguments beyond `required` are accepted.
    pub rest: bool,
    pub func: Box<NativeFnInner>,
}

impl NativeDef {
    pub fn new(
        name: impl Into<String>,
        required: usize,
        rest: bool,
        f: impl Fn(&mut Heap, &[ObjId]) -> Result<ObjId, SprigError> + 'static,
    ) -> Self {
        NativeDef {
            name: name.into(),
            required,
            rest,
            func: Box::new(f),
        }
    }
}

impl fmt::Debug for NativeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.name)
    }
}

/// The closed set of runtime variants. Every value the evaluator touches is
/// one of these, stored in a heap slot and addressed by `ObjId`.
#[derive(Debug)]
pub enum Object {
    /// The `#nil` empty/absent value. One singleton per heap, always rooted.
    Nil,
    Int(i64),
    Bool(bool),
    Str(String),
    /// Unbound name token: special-form keyword or variable reference.
    Symbol(Spur),
    /// User-level cons cell.
    Pair { first: ObjId, rest: ObjId },
    /// Evaluated-argument list, internal to the evaluator. Distinct from
    /// `Pair` so user data never aliases call plumbing.
    Sequence(Vec<ObjId>),
    /// A closure. `env` is shared with every other holder; the collector,
    /// not the procedure, decides when it dies.
    Procedure {
        params: ObjId,
        body: ObjId,
        env: ObjId,
        name: Option<Spur>,
    },
    Native(Rc<NativeDef>),
    /// One lexical scope level: a binding frame plus the enclosing scope.
    Env {
        frame: Vec<(Spur, ObjId)>,
        parent: Option<ObjId>,
    },
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Nil => "nil",
            Object::Int(_) => "integer",
            Object::Bool(_) => "boolean",
            Object::Str(_) => "string",
            Object::Symbol(_) => "symbol",
            Object::Pair { .. } => "pair",
            Object::Sequence(_) => "sequence",
            Object::Procedure { .. } => "procedure",
            Object::Native(_) => "native",
            Object::Env { .. } => "environment",
        }
    }

    /// Visit every child handle this object owns. The collector's mark
    /// phase drives this; the per-variant cases mirror the data model:
    /// pairs trace both cells, procedures trace params/body/env, and
    /// environments trace their frame bindings plus the parent scope.
    pub fn trace(&self, visit: &mut impl FnMut(ObjId)) {
        match self {
            Object::Nil
            | Object::Int(_)
            | Object::Bool(_)
            | Object::Str(_)
            | Object::Symbol(_)
            | Object::Native(_) => {}
            Object::Pair { first, rest } => {
                visit(*first);
                visit(*rest);
            }
            Object::Sequence(items) => {
                for item in items {
                    visit(*item);
                }
            }
            Object::Procedure {
                params, body, env, ..
            } => {
                visit(*params);
                visit(*body);
                visit(*env);
            }
            Object::Env { frame, parent } => {
                for (_, value) in frame {
                    visit(*value);
                }
                if let Some(parent) = parent {
                    visit(*parent);
                }
            }
        }
    }
}

/// Boolean coercion for `if`/`cond` predicates and condition-style natives.
///
/// Integers are true when nonzero, strings when non-empty, sequences when
/// non-empty; pairs, procedures, and natives are always true. Anything else
/// cannot stand in condition position.
pub fn truthiness(heap: &Heap, id: ObjId) -> Result<bool, SprigError> {
    match heap.get(id) {
        Object::Int(n) => Ok(*n != 0),
        Object::Bool(b) => Ok(*b),
        Object::Str(s) => Ok(!s.is_empty()),
        Object::Sequence(items) => Ok(!items.is_empty()),
        Object::Pair { .. } => Ok(true),
        Object::Procedure { .. } | Object::Native(_) => Ok(true),
        other => Err(SprigError::InvalidCondition(other.type_name().to_string())),
    }
}

/// Collect a proper list (pair chain ending in nil) into a Vec of element
/// handles. Returns None for dotted tails.
pub fn list_to_vec(heap: &Heap, id: ObjId) -> Option<Vec<ObjId>> {
    let mut items = Vec::new();
    let mut current = id;
    loop {
        match heap.get(current) {
            Object::Nil => return Some(items),
            Object::Pair { first, rest } => {
                items.push(*first);
                current = *rest;
            }
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap() -> Heap {
        Heap::new(256)
    }

    #[test]
    fn intern_is_stable() {
        assert_eq!(intern("cons"), intern("cons"));
        assert_ne!(intern("car"), intern("cdr"));
        assert_eq!(resolve(intern("lambda")), "lambda");
    }

    #[test]
    fn with_resolved_borrows() {
        let spur = intern("begin");
        assert_eq!(with_resolved(spur, |s| s.len()), 5);
    }

    #[test]
    fn type_names() {
        let mut h = heap();
        let n = h.alloc(Object::Int(1)).unwrap();
        let s = h.alloc(Object::Str("x".into())).unwrap();
        assert_eq!(h.get(n).type_name(), "integer");
        assert_eq!(h.get(s).type_name(), "string");
        assert_eq!(h.get(h.nil()).type_name(), "nil");
    }

    #[test]
    fn truthiness_table() {
        let mut h = heap();
        let zero = h.alloc(Object::Int(0)).unwrap();
        let one = h.alloc(Object::Int(1)).unwrap();
        let t = h.alloc(Object::Bool(true)).unwrap();
        let f = h.alloc(Object::Bool(false)).unwrap();
        let empty = h.alloc(Object::Str(String::new())).unwrap();
        let full = h.alloc(Object::Str("x".into())).unwrap();
        let pair = h
            .alloc(Object::Pair {
                first: one,
                rest: zero,
            })
            .unwrap();

        assert!(!truthiness(&h, zero).unwrap());
        assert!(truthiness(&h, one).unwrap());
        assert!(truthiness(&h, t).unwrap());
        assert!(!truthiness(&h, f).unwrap());
        assert!(!truthiness(&h, empty).unwrap());
        assert!(truthiness(&h, full).unwrap());
        assert!(truthiness(&h, pair).unwrap());
    }

    #[test]
    fn truthiness_rejects_nil_and_symbols() {
        let mut h = heap();
        let sym = h.alloc(Object::Symbol(intern("x"))).unwrap();
        assert!(matches!(
            truthiness(&h, h.nil()),
            Err(SprigError::InvalidCondition(_))
        ));
        assert!(truthiness(&h, sym).is_err());
    }

    #[test]
    fn list_to_vec_proper_and_dotted() {
        let mut h = heap();
        let a = h.alloc(Object::Int(1)).unwrap();
        let b = h.alloc(Object::Int(2)).unwrap();
        let nil = h.nil();
        let tail = h.alloc(Object::Pair { first: b, rest: nil }).unwrap();
        let list = h.alloc(Object::Pair { first: a, rest: tail }).unwrap();
        assert_eq!(list_to_vec(&h, list), Some(vec![a, b]));
        assert_eq!(list_to_vec(&h, nil), Some(vec![]));

        let dotted = h.alloc(Object::Pair { first: a, rest: b }).unwrap();
        assert_eq!(list_to_vec(&h, dotted), None);
    }
}

//! Native builtin procedures.
//!
//! Each module registers its builtins into an environment through the
//! descriptor contract: name, required-argument count, rest-allowed flag,
//! and the function itself. The evaluator enforces the count contract
//! before any of these bodies run; the bodies only check types.

mod arithmetic;
mod comparison;
mod io;
mod list;

use std::rc::Rc;

use sprig_core::{env, intern, Heap, NativeDef, ObjId, Object, SprigError};

/// Install the full builtin set into `env` (normally the root environment).
pub fn register_stdlib(heap: &mut Heap, env: ObjId) -> Result<(), SprigError> {
    arithmetic::register(heap, env)?;
    comparison::register(heap, env)?;
    list::register(heap, env)?;
    io::register(heap, env)?;
    Ok(())
}

/// Register one native procedure under `name`.
pub fn register_native(
    heap: &mut Heap,
    env: ObjId,
    name: &str,
    required: usize,
    rest: bool,
    f: impl Fn(&mut Heap, &[ObjId]) -> Result<ObjId, SprigError> + 'static,
) -> Result<(), SprigError> {
    let def = NativeDef::new(name, required, rest, f);
    let id = heap.alloc(Object::Native(Rc::new(def)))?;
    env::define(heap, env, intern(name), id)
}

pub(crate) fn expect_int(heap: &Heap, id: ObjId) -> Result<i64, SprigError> {
    match heap.get(id) {
        Object::Int(n) => Ok(*n),
        other => Err(SprigError::type_error("integer", other.type_name())),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Call a registered native directly, bypassing the evaluator.
    pub fn call(heap: &mut Heap, env: ObjId, name: &str, args: &[ObjId]) -> Result<ObjId, SprigError> {
        let id = env::lookup(heap, env, intern(name)).expect("native not registered");
        let def = match heap.get(id) {
            Object::Native(def) => Rc::clone(def),
            other => panic!("expected native, found {}", other.type_name()),
        };
        (def.func)(heap, args)
    }

    pub fn fixture() -> (Heap, ObjId) {
        let mut heap = Heap::new(4096);
        let root = env::extend(&mut heap, None).unwrap();
        register_stdlib(&mut heap, root).unwrap();
        (heap, root)
    }
}

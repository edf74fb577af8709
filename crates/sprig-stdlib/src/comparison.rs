use sprig_core::{truthiness, Heap, ObjId, SprigError};

use crate::{expect_int, register_native};

/// Chain-compare every adjacent argument pair with `op`.
fn chain(
    heap: &mut Heap,
    args: &[ObjId],
    op: impl Fn(i64, i64) -> bool,
) -> Result<ObjId, SprigError> {
    let mut prev = expect_int(heap, args[0])?;
    for arg in &args[1..] {
        let next = expect_int(heap, *arg)?;
        if !op(prev, next) {
            return heap.alloc_bool(false);
        }
        prev = next;
    }
    heap.alloc_bool(true)
}

pub fn register(heap: &mut Heap, env: ObjId) -> Result<(), SprigError> {
    register_native(heap, env, "=", 1, true, |heap, args| {
        chain(heap, args, |a, b| a == b)
    })?;
    register_native(heap, env, "<", 2, true, |heap, args| {
        chain(heap, args, |a, b| a < b)
    })?;
    register_native(heap, env, ">", 2, true, |heap, args| {
        chain(heap, args, |a, b| a > b)
    })?;
    register_native(heap, env, "<=", 2, true, |heap, args| {
        chain(heap, args, |a, b| a <= b)
    })?;
    register_native(heap, env, ">=", 2, true, |heap, args| {
        chain(heap, args, |a, b| a >= b)
    })?;

    // Built on the same boolean coercion if/cond use.
    register_native(heap, env, "not", 1, false, |heap, args| {
        let b = truthiness(heap, args[0])?;
        heap.alloc_bool(!b)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testing::{call, fixture};
    use sprig_core::Object;

    fn is_true(h: &sprig_core::Heap, id: sprig_core::ObjId) -> bool {
        matches!(h.get(id), Object::Bool(true))
    }

    #[test]
    fn equality_chains() {
        let (mut h, env) = fixture();
        let a = h.alloc_int(1).unwrap();
        let b = h.alloc_int(1).unwrap();
        let c = h.alloc_int(2).unwrap();
        let eq = call(&mut h, env, "=", &[a, b]).unwrap();
        assert!(is_true(&h, eq));
        let ne = call(&mut h, env, "=", &[a, b, c]).unwrap();
        assert!(matches!(h.get(ne), Object::Bool(false)));
    }

    #[test]
    fn ordering() {
        let (mut h, env) = fixture();
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        let three = h.alloc_int(3).unwrap();
        let lt = call(&mut h, env, "<", &[one, two, three]).unwrap();
        assert!(is_true(&h, lt));
        let gt = call(&mut h, env, ">", &[one, two]).unwrap();
        assert!(matches!(h.get(gt), Object::Bool(false)));
        let le = call(&mut h, env, "<=", &[one, one, two]).unwrap();
        assert!(is_true(&h, le));
        let ge = call(&mut h, env, ">=", &[three, three, one]).unwrap();
        assert!(is_true(&h, ge));
    }

    #[test]
    fn not_uses_boolean_coercion() {
        let (mut h, env) = fixture();
        let zero = h.alloc_int(0).unwrap();
        let t = h.alloc_bool(true).unwrap();
        let nt = call(&mut h, env, "not", &[zero]).unwrap();
        assert!(is_true(&h, nt));
        let f = call(&mut h, env, "not", &[t]).unwrap();
        assert!(matches!(h.get(f), Object::Bool(false)));
        // Nil does not coerce.
        let nil = h.nil();
        assert!(call(&mut h, env, "not", &[nil]).is_err());
    }
}

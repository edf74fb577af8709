use sprig_core::{Heap, ObjId, Object, SprigError};

use crate::register_native;

fn expect_pair(heap: &Heap, id: ObjId) -> Result<(ObjId, ObjId), SprigError> {
    match heap.get(id) {
        Object::Pair { first, rest } => Ok((*first, *rest)),
        other => Err(SprigError::type_error("pair", other.type_name())),
    }
}

pub fn register(heap: &mut Heap, env: ObjId) -> Result<(), SprigError> {
    register_native(heap, env, "cons", 2, false, |heap, args| {
        heap.alloc_pair(args[0], args[1])
    })?;

    register_native(heap, env, "car", 1, false, |heap, args| {
        expect_pair(heap, args[0]).map(|(first, _)| first)
    })?;

    register_native(heap, env, "cdr", 1, false, |heap, args| {
        expect_pair(heap, args[0]).map(|(_, rest)| rest)
    })?;

    register_native(heap, env, "pair?", 1, false, |heap, args| {
        let is_pair = matches!(heap.get(args[0]), Object::Pair { .. });
        heap.alloc_bool(is_pair)
    })?;

    register_native(heap, env, "null?", 1, false, |heap, args| {
        let is_nil = heap.is_nil(args[0]);
        heap.alloc_bool(is_nil)
    })?;

    register_native(heap, env, "list", 0, true, |heap, args| {
        // Bracketed: each partial chain is rooted so the next cons cannot
        // reclaim it mid-build.
        let base = heap.root_depth();
        let result = build_list(heap, args);
        heap.truncate_roots(base);
        result
    })?;

    Ok(())
}

fn build_list(heap: &mut Heap, args: &[ObjId]) -> Result<ObjId, SprigError> {
    let mut list = heap.nil();
    for arg in args.iter().rev() {
        list = heap.alloc_pair(*arg, list)?;
        heap.push_root(list);
    }
    Ok(list)
}

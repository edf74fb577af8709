//! The chained lexical environment.
//!
//! Environments are heap objects: the collector traces a frame's bindings
//! and the parent link, so a scope lives exactly as long as the closures
//! and call frames that can still reach it. Frames only grow; nothing is
//! ever unbound.

use crate::error::SprigError;
use crate::heap::{Heap, ObjId};
use crate::value::{resolve, Object, Spur};

/// Create a new environment whose frame is empty and whose parent is the
/// given scope (None for the root environment).
pub fn extend(heap: &mut Heap, parent: Option<ObjId>) -> Result<ObjId, SprigError> {
    heap.alloc(Object::Env {
        frame: Vec::new(),
        parent,
    })
}

fn frame_of(heap: &Heap, env: ObjId) -> (&[(Spur, ObjId)], Option<ObjId>) {
    match heap.get(env) {
        Object::Env { frame, parent } => (frame, *parent),
        other => panic!("expected environment, found {}", other.type_name()),
    }
}

/// Walk the chain from the innermost frame outward; first match wins.
pub fn lookup(heap: &Heap, env: ObjId, name: Spur) -> Option<ObjId> {
    let mut current = Some(env);
    while let Some(scope) = current {
        let (frame, parent) = frame_of(heap, scope);
        if let Some((_, value)) = frame.iter().find(|(n, _)| *n == name) {
            return Some(*value);
        }
        current = parent;
    }
    None
}

/// Insert into the innermost frame only. Fails if this exact frame already
/// binds the name; outer bindings are shadowed, not touched.
pub fn define(heap: &mut Heap, env: ObjId, name: Spur, value: ObjId) -> Result<(), SprigError> {
    match heap.get_mut(env) {
        Object::Env { frame, .. } => {
            if frame.iter().any(|(n, _)| *n == name) {
                return Err(SprigError::Redefined(resolve(name)));
            }
            frame.push((name, value));
            Ok(())
        }
        other => panic!("expected environment, found {}", other.type_name()),
    }
}

/// Mutate the nearest enclosing frame that already binds the name. Never
/// creates a binding; unbound anywhere is an error.
pub fn assign(heap: &mut Heap, env: ObjId, name: Spur, value: ObjId) -> Result<(), SprigError> {
    let mut current = Some(env);
    while let Some(scope) = current {
        let parent = match heap.get_mut(scope) {
            Object::Env { frame, parent } => {
                if let Some(slot) = frame.iter_mut().find(|(n, _)| *n == name) {
                    slot.1 = value;
                    return Ok(());
                }
                *parent
            }
            other => panic!("expected environment, found {}", other.type_name()),
        };
        current = parent;
    }
    Err(SprigError::Unbound(resolve(name)))
}

/// Reset the frame to exactly the given formal-to-actual bindings. This is
/// the self-tail-call frame rewrite: the environment object keeps its
/// identity while its bindings are replaced in place.
pub fn rebind(heap: &mut Heap, env: ObjId, names: &[Spur], values: &[ObjId]) {
    debug_assert_eq!(names.len(), values.len());
    match heap.get_mut(env) {
        Object::Env { frame, .. } => {
            frame.clear();
            frame.extend(names.iter().copied().zip(values.iter().copied()));
        }
        other => panic!("expected environment, found {}", other.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::intern;

    fn setup() -> (Heap, ObjId) {
        let mut heap = Heap::new(256);
        let root = extend(&mut heap, None).unwrap();
        (heap, root)
    }

    #[test]
    fn define_then_lookup() {
        let (mut h, root) = setup();
        let x = intern("x");
        let one = h.alloc_int(1).unwrap();
        define(&mut h, root, x, one).unwrap();
        assert_eq!(lookup(&h, root, x), Some(one));
        assert_eq!(lookup(&h, root, intern("y")), None);
    }

    #[test]
    fn redefinition_in_same_frame_fails() {
        let (mut h, root) = setup();
        let x = intern("x");
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        define(&mut h, root, x, one).unwrap();
        assert!(matches!(
            define(&mut h, root, x, two),
            Err(SprigError::Redefined(name)) if name == "x"
        ));
        // The original binding is untouched.
        assert_eq!(lookup(&h, root, x), Some(one));
    }

    #[test]
    fn inner_define_shadows_without_touching_outer() {
        let (mut h, root) = setup();
        let x = intern("x");
        let outer = h.alloc_int(1).unwrap();
        let inner_val = h.alloc_int(2).unwrap();
        define(&mut h, root, x, outer).unwrap();

        let inner = extend(&mut h, Some(root)).unwrap();
        define(&mut h, inner, x, inner_val).unwrap();

        assert_eq!(lookup(&h, inner, x), Some(inner_val));
        assert_eq!(lookup(&h, root, x), Some(outer));
    }

    #[test]
    fn lookup_walks_to_outer_frames() {
        let (mut h, root) = setup();
        let x = intern("x");
        let val = h.alloc_int(9).unwrap();
        define(&mut h, root, x, val).unwrap();
        let mid = extend(&mut h, Some(root)).unwrap();
        let inner = extend(&mut h, Some(mid)).unwrap();
        assert_eq!(lookup(&h, inner, x), Some(val));
    }

    #[test]
    fn assign_mutates_nearest_binding_frame() {
        let (mut h, root) = setup();
        let x = intern("x");
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        define(&mut h, root, x, one).unwrap();
        let inner = extend(&mut h, Some(root)).unwrap();

        assign(&mut h, inner, x, two).unwrap();
        // Mutated the outer frame, did not create an inner binding.
        assert_eq!(lookup(&h, root, x), Some(two));
        let (frame, _) = frame_of(&h, inner);
        assert!(frame.is_empty());
    }

    #[test]
    fn assign_unbound_fails() {
        let (mut h, root) = setup();
        let one = h.alloc_int(1).unwrap();
        assert!(matches!(
            assign(&mut h, root, intern("ghost"), one),
            Err(SprigError::Unbound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn rebind_replaces_frame_in_place() {
        let (mut h, root) = setup();
        let env = extend(&mut h, Some(root)).unwrap();
        let x = intern("x");
        let y = intern("y");
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        define(&mut h, env, x, one).unwrap();
        define(&mut h, env, y, two).unwrap();

        let ten = h.alloc_int(10).unwrap();
        rebind(&mut h, env, &[x], &[ten]);
        assert_eq!(lookup(&h, env, x), Some(ten));
        // The old extra binding is gone: the frame holds exactly the
        // formals it was rebound with.
        assert_eq!(lookup(&h, env, y), None);
    }
}

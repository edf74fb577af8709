//! Human-readable forms for heap values.
//!
//! `print` is the read-compatible form (strings quoted, `#`-literals for
//! nil and booleans); `display` is the raw form the `display` builtin uses.
//! `display_truncated` bounds the output length for error messages.

use crate::heap::{Heap, ObjId};
use crate::value::{with_resolved, Object};

/// Read-compatible rendering: what the REPL echoes back.
pub fn print(heap: &Heap, id: ObjId) -> String {
    let mut out = String::new();
    write_obj(heap, id, &mut out, true);
    out
}

/// Raw rendering: strings without their quotes.
pub fn display(heap: &Heap, id: ObjId) -> String {
    let mut out = String::new();
    write_obj(heap, id, &mut out, false);
    out
}

/// Bounded rendering for diagnostics; long output is cut at a char
/// boundary and marked with an ellipsis.
pub fn display_truncated(heap: &Heap, id: ObjId, max: usize) -> String {
    let full = print(heap, id);
    if full.chars().count() <= max {
        return full;
    }
    let mut out: String = full.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn write_obj(heap: &Heap, id: ObjId, out: &mut String, quoted: bool) {
    match heap.get(id) {
        Object::Nil => out.push_str("#nil"),
        Object::Int(n) => out.push_str(&n.to_string()),
        Object::Bool(true) => out.push_str("#true"),
        Object::Bool(false) => out.push_str("#false"),
        Object::Str(s) => {
            if quoted {
                out.push('"');
                for ch in s.chars() {
                    match ch {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        other => out.push(other),
                    }
                }
                out.push('"');
            } else {
                out.push_str(s);
            }
        }
        Object::Symbol(name) => with_resolved(*name, |s| out.push_str(s)),
        Object::Pair { first, rest } => {
            // The list walk owns both delimiters: elements are separated by
            // single spaces, a non-nil non-pair tail prints dotted.
            out.push('(');
            write_obj(heap, *first, out, quoted);
            let mut tail = *rest;
            loop {
                match heap.get(tail) {
                    Object::Nil => break,
                    Object::Pair { first, rest } => {
                        out.push(' ');
                        write_obj(heap, *first, out, quoted);
                        tail = *rest;
                    }
                    _ => {
                        out.push_str(" . ");
                        write_obj(heap, tail, out, quoted);
                        break;
                    }
                }
            }
            out.push(')');
        }
        Object::Sequence(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_obj(heap, *item, out, quoted);
            }
            out.push(')');
        }
        Object::Procedure { name, .. } => match name {
            Some(name) => with_resolved(*name, |s| {
                out.push_str("#<procedure ");
                out.push_str(s);
                out.push('>');
            }),
            None => out.push_str("#<procedure>"),
        },
        Object::Native(def) => {
            out.push_str("#<native ");
            out.push_str(&def.name);
            out.push('>');
        }
        Object::Env { .. } => out.push_str("#<environment>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::intern;

    fn heap() -> Heap {
        Heap::new(256)
    }

    #[test]
    fn atoms() {
        let mut h = heap();
        let n = h.alloc_int(-42).unwrap();
        let t = h.alloc_bool(true).unwrap();
        let f = h.alloc_bool(false).unwrap();
        let sym = h.alloc(Object::Symbol(intern("car"))).unwrap();
        assert_eq!(print(&h, n), "-42");
        assert_eq!(print(&h, t), "#true");
        assert_eq!(print(&h, f), "#false");
        assert_eq!(print(&h, h.nil()), "#nil");
        assert_eq!(print(&h, sym), "car");
    }

    #[test]
    fn strings_quoted_and_raw() {
        let mut h = heap();
        let s = h.alloc_str("he said \"hi\"\n").unwrap();
        assert_eq!(print(&h, s), "\"he said \\\"hi\\\"\\n\"");
        assert_eq!(display(&h, s), "he said \"hi\"\n");
    }

    #[test]
    fn proper_list() {
        let mut h = heap();
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        let three = h.alloc_int(3).unwrap();
        let nil = h.nil();
        let l3 = h.alloc_pair(three, nil).unwrap();
        let l2 = h.alloc_pair(two, l3).unwrap();
        let l1 = h.alloc_pair(one, l2).unwrap();
        assert_eq!(print(&h, l1), "(1 2 3)");
    }

    #[test]
    fn dotted_tail() {
        let mut h = heap();
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        let pair = h.alloc_pair(one, two).unwrap();
        assert_eq!(print(&h, pair), "(1 . 2)");
    }

    #[test]
    fn nested_lists() {
        let mut h = heap();
        let one = h.alloc_int(1).unwrap();
        let two = h.alloc_int(2).unwrap();
        let nil = h.nil();
        let inner = h.alloc_pair(two, nil).unwrap();
        let inner_list = h.alloc_pair(one, inner).unwrap();
        let outer = h.alloc_pair(inner_list, nil).unwrap();
        assert_eq!(print(&h, outer), "((1 2))");
    }

    #[test]
    fn truncation_bounds_output() {
        let mut h = heap();
        let s = h.alloc_str("a".repeat(100)).unwrap();
        let short = display_truncated(&h, s, 10);
        assert_eq!(short.chars().count(), 10);
        assert!(short.ends_with('…'));
        let n = h.alloc_int(5).unwrap();
        assert_eq!(display_truncated(&h, n, 10), "5");
    }
}

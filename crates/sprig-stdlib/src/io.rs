use sprig_core::{printer, Heap, ObjId, SprigError};

use crate::register_native;

pub fn register(heap: &mut Heap, env: ObjId) -> Result<(), SprigError> {
    register_native(heap, env, "display", 1, true, |heap, args| {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(printer::display(heap, *arg));
        }
        print!("{}", parts.join(" "));
        Ok(heap.nil())
    })?;

    register_native(heap, env, "newline", 0, false, |heap, _args| {
        println!();
        Ok(heap.nil())
    })?;

    Ok(())
}

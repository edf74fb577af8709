use sprig_core::{Heap, ObjId, SprigError};

use crate::{expect_int, register_native};

pub fn register(heap: &mut Heap, env: ObjId) -> Result<(), SprigError> {
    register_native(heap, env, "+", 1, true, |heap, args| {
        let mut sum: i64 = 0;
        for arg in args {
            sum = sum.wrapping_add(expect_int(heap, *arg)?);
        }
        heap.alloc_int(sum)
    })?;

    register_native(heap, env, "-", 1, true, |heap, args| {
        let first = expect_int(heap, args[0])?;
        if args.len() == 1 {
            return heap.alloc_int(first.wrapping_neg());
        }
        let mut result = first;
        for arg in &args[1..] {
            result = result.wrapping_sub(expect_int(heap, *arg)?);
        }
        heap.alloc_int(result)
    })?;

    register_native(heap, env, "*", 1, true, |heap, args| {
        let mut product: i64 = 1;
        for arg in args {
            product = product.wrapping_mul(expect_int(heap, *arg)?);
        }
        heap.alloc_int(product)
    })?;

    Ok(())
}

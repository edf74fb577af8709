use crate::error::SprigError;
use crate::value::Object;

/// Generation-checked handle into the heap arena.
///
/// The index addresses a slot; the generation is bumped every time a slot is
/// reclaimed, so a handle that survived its object can never silently read a
/// recycled slot. Dereferencing a stale handle is an internal invariant
/// violation and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId {
    index: u32,
    gen: u32,
}

struct Slot {
    gen: u32,
    entry: Entry,
}

enum Entry {
    Occupied { marked: bool, object: Object },
    Free,
}

/// The bounded object heap and its mark-sweep collector.
///
/// All runtime values live here. The tracked set is the arena itself; the
/// explicit LIFO root stack holds values that are only reachable from the
/// native call stack of an in-progress evaluation. Collection runs only
/// between `collect_enable`/`collect_disable`, the bracket the interpreter
/// wraps around one outer evaluation: opportunistically once live objects
/// exceed two thirds of capacity, forcibly when an allocation would
/// otherwise exceed the hard ceiling.
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    capacity: usize,
    roots: Vec<ObjId>,
    collecting: bool,
    nil: ObjId,
}

impl Heap {
    /// Create a heap with a hard ceiling of `capacity` live objects.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 8, "heap capacity too small");
        let mut heap = Heap {
            slots: Vec::with_capacity(capacity.min(1024)),
            free: Vec::new(),
            live: 0,
            capacity,
            roots: Vec::new(),
            collecting: false,
            nil: ObjId { index: 0, gen: 0 },
        };
        // The nil singleton occupies slot 0 and stays rooted for the life
        // of the heap.
        heap.nil = heap.alloc_raw(Object::Nil);
        heap.push_root(heap.nil);
        heap
    }

    /// The `#nil` singleton.
    pub fn nil(&self) -> ObjId {
        self.nil
    }

    pub fn is_nil(&self, id: ObjId) -> bool {
        matches!(self.get(id), Object::Nil)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Allocate a new tracked object. Runs the triggering policy first, so
    /// the returned handle is never reclaimed by the collection its own
    /// allocation provoked.
    pub fn alloc(&mut self, object: Object) -> Result<ObjId, SprigError> {
        if self.live >= self.capacity {
            // The allocation would exceed the hard ceiling: forced cycle.
            // Outside the collection bracket nothing can be reclaimed (the
            // caller's graph is not rooted yet), so report exhaustion.
            if self.collecting {
                self.collect();
            }
            if self.live >= self.capacity {
                return Err(SprigError::HeapExhausted {
                    capacity: self.capacity,
                });
            }
        } else if self.collecting && self.live * 3 > self.capacity * 2 {
            self.collect();
        }
        Ok(self.alloc_raw(object))
    }

    fn alloc_raw(&mut self, object: Object) -> ObjId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(matches!(slot.entry, Entry::Free), "corrupt free list");
                slot.entry = Entry::Occupied {
                    marked: false,
                    object,
                };
                ObjId {
                    index,
                    gen: slot.gen,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    gen: 0,
                    entry: Entry::Occupied {
                        marked: false,
                        object,
                    },
                });
                ObjId { index, gen: 0 }
            }
        }
    }

    pub fn alloc_int(&mut self, n: i64) -> Result<ObjId, SprigError> {
        self.alloc(Object::Int(n))
    }

    pub fn alloc_bool(&mut self, b: bool) -> Result<ObjId, SprigError> {
        self.alloc(Object::Bool(b))
    }

    pub fn alloc_str(&mut self, s: impl Into<String>) -> Result<ObjId, SprigError> {
        self.alloc(Object::Str(s.into()))
    }

    pub fn alloc_pair(&mut self, first: ObjId, rest: ObjId) -> Result<ObjId, SprigError> {
        self.alloc(Object::Pair { first, rest })
    }

    pub fn get(&self, id: ObjId) -> &Object {
        let slot = self
            .slots
            .get(id.index as usize)
            .unwrap_or_else(|| panic!("heap handle out of bounds: {id:?}"));
        if slot.gen != id.gen {
            panic!("stale heap handle: {id:?} (slot generation {})", slot.gen);
        }
        match &slot.entry {
            Entry::Occupied { object, .. } => object,
            Entry::Free => panic!("heap handle to freed slot: {id:?}"),
        }
    }

    pub fn get_mut(&mut self, id: ObjId) -> &mut Object {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .unwrap_or_else(|| panic!("heap handle out of bounds: {id:?}"));
        if slot.gen != id.gen {
            panic!("stale heap handle: {id:?} (slot generation {})", slot.gen);
        }
        match &mut slot.entry {
            Entry::Occupied { object, .. } => object,
            Entry::Free => panic!("heap handle to freed slot: {id:?}"),
        }
    }

    // === Root stack ===
    //
    // Pushes and pops must stay symmetric on every exit path, error unwinds
    // included; the evaluator brackets each allocation-prone region with
    // root_depth/truncate_roots so `?` cannot leak roots.

    pub fn push_root(&mut self, id: ObjId) {
        self.roots.push(id);
    }

    pub fn pop_root(&mut self) -> ObjId {
        self.roots.pop().expect("root stack underflow")
    }

    pub fn root_depth(&self) -> usize {
        self.roots.len()
    }

    pub fn truncate_roots(&mut self, depth: usize) {
        debug_assert!(depth <= self.roots.len(), "root stack underflow");
        self.roots.truncate(depth);
    }

    // === Collection ===

    /// Open the collection bracket around one outer evaluation. Also runs
    /// an opportunistic cycle if the heap is already past the threshold.
    pub fn collect_enable(&mut self) {
        self.collecting = true;
        self.collect_if_pressed();
    }

    /// Close the collection bracket, sweeping pressure built up by the
    /// evaluation before suppressing further cycles.
    pub fn collect_disable(&mut self) {
        self.collect_if_pressed();
        self.collecting = false;
    }

    fn collect_if_pressed(&mut self) {
        if self.collecting && self.live * 3 > self.capacity * 2 {
            self.collect();
        }
    }

    /// One full mark-sweep cycle. Returns the number of objects reclaimed.
    pub fn collect(&mut self) -> usize {
        let before = self.live;

        // Mark phase: flood from the root stack. The worklist makes marking
        // iterative; the marked flag short-circuits shared and cyclic
        // references.
        let mut worklist: Vec<ObjId> = self.roots.clone();
        while let Some(id) = worklist.pop() {
            let slot = &mut self.slots[id.index as usize];
            if slot.gen != id.gen {
                panic!("stale handle reached during mark: {id:?}");
            }
            if let Entry::Occupied { marked, object } = &mut slot.entry {
                if *marked {
                    continue;
                }
                *marked = true;
                object.trace(&mut |child| worklist.push(child));
            }
        }

        // Sweep phase: reclaim the unmarked, clear marks on survivors in
        // the same pass. Dropping the object out of its slot releases any
        // variant-owned buffers; bumping the generation invalidates every
        // outstanding handle to the slot.
        let mut freed = 0;
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            let reclaim = match &mut slot.entry {
                Entry::Occupied { marked, .. } if *marked => {
                    *marked = false;
                    false
                }
                Entry::Occupied { .. } => true,
                Entry::Free => false,
            };
            if reclaim {
                slot.entry = Entry::Free;
                slot.gen = slot.gen.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;

        log::debug!(
            "gc: {} live before, {} freed, {} live after (capacity {})",
            before,
            freed,
            self.live,
            self.capacity
        );
        freed
    }
}

// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Event queue for the sweep.
//
// Two phases:
//   Before `init`, inserts append to a key array. `init` sorts an index
//   array over those keys once, in descending order, so the minimum is
//   always at the end and extraction is a pop.
//   After `init`, inserts (vertices created by intersections) go into a
//   binary min-heap. `extract_min` takes the smaller of the two minima.
// Either kind of entry can be deleted through its handle.

/// Identifies an entry for `delete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PqHandle {
    /// Slot in the pre-init key array.
    Sorted(u32),
    /// Handle in the post-init heap.
    Heap(u32),
}

#[derive(Clone, Copy)]
struct HandleElem<K> {
    key: K,
    /// Position in `nodes` while live; next free handle while on the free list.
    node: u32,
    live: bool,
}

/// Binary min-heap with stable handles (1-based; 0 means "none").
struct Heap<K> {
    nodes: Vec<u32>,
    handles: Vec<Option<HandleElem<K>>>,
    size: usize,
    free_list: u32,
    initialized: bool,
    leq: fn(&K, &K) -> bool,
}

impl<K: Copy> Heap<K> {
    fn new(capacity: usize, leq: fn(&K, &K) -> bool) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(0);
        let mut handles = Vec::with_capacity(capacity + 1);
        handles.push(None);
        Heap {
            nodes,
            handles,
            size: 0,
            free_list: 0,
            initialized: false,
            leq,
        }
    }

    #[inline]
    fn elem(&self, handle: u32) -> &HandleElem<K> {
        match &self.handles[handle as usize] {
            Some(elem) => elem,
            None => panic!("heap handle {} was never issued", handle),
        }
    }

    #[inline]
    fn elem_mut(&mut self, handle: u32) -> &mut HandleElem<K> {
        match &mut self.handles[handle as usize] {
            Some(elem) => elem,
            None => panic!("heap handle {} was never issued", handle),
        }
    }

    #[inline]
    fn leq_nodes(&self, a: usize, b: usize) -> bool {
        (self.leq)(&self.elem(self.nodes[a]).key, &self.elem(self.nodes[b]).key)
    }

    fn place(&mut self, pos: usize, handle: u32) {
        self.nodes[pos] = handle;
        self.elem_mut(handle).node = pos as u32;
    }

    fn float_down(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let mut child = curr << 1;
            if child > self.size {
                break;
            }
            if child < self.size && self.leq_nodes(child + 1, child) {
                child += 1;
            }
            let h_child = self.nodes[child];
            if (self.leq)(&self.elem(h_curr).key, &self.elem(h_child).key) {
                break;
            }
            self.place(curr, h_child);
            curr = child;
        }
        self.place(curr, h_curr);
    }

    fn float_up(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let parent = curr >> 1;
            if parent == 0 {
                break;
            }
            let h_parent = self.nodes[parent];
            if (self.leq)(&self.elem(h_parent).key, &self.elem(h_curr).key) {
                break;
            }
            self.place(curr, h_parent);
            curr = parent;
        }
        self.place(curr, h_curr);
    }

    fn init(&mut self) {
        for i in (1..=self.size).rev() {
            self.float_down(i);
        }
        self.initialized = true;
    }

    fn insert(&mut self, key: K) -> u32 {
        self.size += 1;
        let curr = self.size;
        if self.nodes.len() <= curr {
            self.nodes.push(0);
        }

        let handle = if self.free_list == 0 {
            self.handles.push(None);
            (self.handles.len() - 1) as u32
        } else {
            let h = self.free_list;
            self.free_list = self.elem(h).node;
            h
        };

        self.handles[handle as usize] = Some(HandleElem {
            key,
            node: curr as u32,
            live: true,
        });
        self.nodes[curr] = handle;

        if self.initialized {
            self.float_up(curr);
        }
        handle
    }

    fn release(&mut self, handle: u32) {
        let free = self.free_list;
        let elem = self.elem_mut(handle);
        elem.live = false;
        elem.node = free;
        self.free_list = handle;
    }

    fn minimum(&self) -> Option<K> {
        if self.size == 0 {
            None
        } else {
            Some(self.elem(self.nodes[1]).key)
        }
    }

    fn extract_min(&mut self) -> Option<K> {
        if self.size == 0 {
            return None;
        }
        let h_min = self.nodes[1];
        let min_key = self.elem(h_min).key;

        let last = self.nodes[self.size];
        self.place(1, last);
        self.release(h_min);
        self.size -= 1;
        if self.size > 0 {
            self.float_down(1);
        }
        Some(min_key)
    }

    fn delete(&mut self, h_curr: u32) {
        debug_assert!(self.elem(h_curr).live);
        let curr = self.elem(h_curr).node as usize;
        let last = self.nodes[self.size];
        self.place(curr, last);
        self.size -= 1;

        if curr <= self.size {
            if curr <= 1 || self.leq_nodes(curr >> 1, curr) {
                self.float_down(curr);
            } else {
                self.float_up(curr);
            }
        }
        self.release(h_curr);
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.size == 0
    }
}

const SORT_SEED: i32 = 2016473283;
const SORT_MULTIPLIER: i32 = 1539415821;
/// Partitions at most this much larger than one element are insertion-sorted.
const SORT_CUTOFF: isize = 10;

/// Pivot generator for the quicksort; the seed stays non-negative.
#[inline]
fn next_seed(seed: i32) -> i32 {
    seed.wrapping_mul(SORT_MULTIPLIER).wrapping_add(1).wrapping_abs()
}

/// The combined priority queue (sort-array + heap).
pub struct PriorityQ<K> {
    heap: Heap<K>,
    /// Pre-init keys; `None` once deleted.
    keys: Vec<Option<K>>,
    /// Indices into `keys`, sorted descending by `init`.
    order: Vec<u32>,
    /// Number of entries of `order` still in play.
    size: usize,
    initialized: bool,
    leq: fn(&K, &K) -> bool,
}

impl<K: Copy> PriorityQ<K> {
    pub fn new(capacity: usize, leq: fn(&K, &K) -> bool) -> Self {
        PriorityQ {
            heap: Heap::new(capacity, leq),
            keys: Vec::with_capacity(capacity),
            order: Vec::new(),
            size: 0,
            initialized: false,
            leq,
        }
    }

    /// Sort the pre-init keys. Must run once, after the bulk inserts and
    /// before any extraction.
    pub fn init(&mut self) {
        self.order = (0..self.keys.len() as u32)
            .filter(|&i| self.keys[i as usize].is_some())
            .collect();
        self.size = self.order.len();
        self.sort_order();
        self.initialized = true;
        self.heap.init();
    }

    fn key_at(&self, order_pos: usize) -> K {
        match self.keys[self.order[order_pos] as usize] {
            Some(key) => key,
            None => panic!("sorted slot {} has no key", self.order[order_pos]),
        }
    }

    /// Randomized quicksort with an explicit stack into descending order.
    fn sort_order(&mut self) {
        let leq = self.leq;
        // keys[order[a]] > piv and keys[order[a]] < piv respectively.
        let gt = |q: &Self, a: isize, piv: &K| !leq(&q.key_at(a as usize), piv);
        let lt = |q: &Self, a: isize, piv: &K| !leq(piv, &q.key_at(a as usize));

        let mut stack: Vec<(isize, isize)> = Vec::with_capacity(50);
        let mut seed = SORT_SEED;
        stack.push((0, self.size as isize - 1));

        while let Some((mut p, mut r)) = stack.pop() {
            while r > p + SORT_CUTOFF {
                seed = next_seed(seed);
                let span = (r - p + 1) as u32;
                let pick = p + (seed.unsigned_abs() % span) as isize;
                self.order.swap(pick as usize, p as usize);
                let piv = self.key_at(p as usize);

                let mut i = p - 1;
                let mut j = r + 1;
                loop {
                    loop {
                        i += 1;
                        if !gt(self, i, &piv) {
                            break;
                        }
                    }
                    loop {
                        j -= 1;
                        if !lt(self, j, &piv) {
                            break;
                        }
                    }
                    self.order.swap(i as usize, j as usize);
                    if i >= j {
                        break;
                    }
                }
                // Undo the last swap.
                self.order.swap(i as usize, j as usize);

                // Push the larger side, keep partitioning the smaller one.
                if i - p < r - j {
                    stack.push((j + 1, r));
                    r = i - 1;
                } else {
                    stack.push((p, i - 1));
                    p = j + 1;
                }
            }

            let mut i = p + 1;
            while i <= r {
                let piv_idx = self.order[i as usize];
                let piv = self.key_at(i as usize);
                let mut j = i;
                while j > p && lt(self, j - 1, &piv) {
                    self.order[j as usize] = self.order[j as usize - 1];
                    j -= 1;
                }
                self.order[j as usize] = piv_idx;
                i += 1;
            }
        }
    }

    /// Insert a key and return its handle. Before `init` the key joins the
    /// bulk sort; afterwards it goes into the heap.
    pub fn insert(&mut self, key: K) -> PqHandle {
        if self.initialized {
            return PqHandle::Heap(self.heap.insert(key));
        }
        let curr = self.keys.len() as u32;
        self.keys.push(Some(key));
        PqHandle::Sorted(curr)
    }

    fn sorted_min(&self) -> Option<K> {
        if self.size == 0 {
            None
        } else {
            self.keys[self.order[self.size - 1] as usize]
        }
    }

    /// Drop dead slots from the end of the sorted order.
    fn trim_sorted(&mut self) {
        while self.size > 0 && self.keys[self.order[self.size - 1] as usize].is_none() {
            self.size -= 1;
        }
    }

    pub fn extract_min(&mut self) -> Option<K> {
        debug_assert!(self.initialized, "extract_min before init");
        let sort_min = match self.sorted_min() {
            Some(k) => k,
            None => return self.heap.extract_min(),
        };
        if let Some(heap_min) = self.heap.minimum() {
            if (self.leq)(&heap_min, &sort_min) {
                return self.heap.extract_min();
            }
        }
        self.size -= 1;
        self.trim_sorted();
        Some(sort_min)
    }

    pub fn minimum(&self) -> Option<K> {
        debug_assert!(self.initialized, "minimum before init");
        let sort_min = match self.sorted_min() {
            Some(k) => k,
            None => return self.heap.minimum(),
        };
        match self.heap.minimum() {
            Some(heap_min) if (self.leq)(&heap_min, &sort_min) => Some(heap_min),
            _ => Some(sort_min),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0 && self.heap.is_empty()
    }

    /// Remove the entry behind `handle`. Sorted slots are only marked dead;
    /// they are skipped when they reach the end of the order.
    pub fn delete(&mut self, handle: PqHandle) {
        match handle {
            PqHandle::Heap(h) => self.heap.delete(h),
            PqHandle::Sorted(curr) => {
                debug_assert!(self.keys[curr as usize].is_some());
                self.keys[curr as usize] = None;
                self.trim_sorted();
            }
        }
    }
}

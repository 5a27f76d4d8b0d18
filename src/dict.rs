// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Sorted doubly-linked list holding the edges that cross the sweep line.
//
// The ordering of two keys depends on where the sweep currently is, so the
// list never compares keys itself: `insert_before` and `search` take a
// predicate that answers "does this stored key sort at or before the new
// one". The predicate is free to borrow the mesh and region arena.

/// Index into Dict::nodes
pub type NodeIdx = u32;

/// Index of the head sentinel node.
pub const DICT_HEAD: NodeIdx = 0;

#[derive(Clone, Debug)]
struct DictNode<K> {
    key: Option<K>,
    next: NodeIdx,
    prev: NodeIdx,
}

pub struct Dict<K> {
    nodes: Vec<DictNode<K>>,
    free_list: Vec<NodeIdx>,
}

impl<K: Copy> Dict<K> {
    pub fn new() -> Self {
        Dict {
            nodes: vec![DictNode {
                key: None,
                next: DICT_HEAD,
                prev: DICT_HEAD,
            }],
            free_list: Vec::new(),
        }
    }

    /// Insert at the back, walking backwards from the head to the sorted
    /// position.
    pub fn insert<F>(&mut self, key: K, leq: F) -> NodeIdx
    where
        F: FnMut(K) -> bool,
    {
        self.insert_before(DICT_HEAD, key, leq)
    }

    /// Insert `key` before `node`, walking backwards while the stored key
    /// does not satisfy `leq(stored)` (i.e. stored <= key).
    pub fn insert_before<F>(&mut self, mut node: NodeIdx, key: K, mut leq: F) -> NodeIdx
    where
        F: FnMut(K) -> bool,
    {
        loop {
            node = self.nodes[node as usize].prev;
            match self.nodes[node as usize].key {
                None => break,
                Some(stored) if leq(stored) => break,
                Some(_) => {}
            }
        }

        let next = self.nodes[node as usize].next;
        let fresh = DictNode {
            key: Some(key),
            next,
            prev: node,
        };
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = fresh;
                idx
            }
            None => {
                self.nodes.push(fresh);
                (self.nodes.len() - 1) as NodeIdx
            }
        };
        self.nodes[node as usize].next = idx;
        self.nodes[next as usize].prev = idx;
        idx
    }

    pub fn delete(&mut self, node: NodeIdx) {
        debug_assert!(node != DICT_HEAD);
        let DictNode { next, prev, .. } = self.nodes[node as usize];
        self.nodes[next as usize].prev = prev;
        self.nodes[prev as usize].next = next;
        let dead = &mut self.nodes[node as usize];
        dead.key = None;
        dead.next = DICT_HEAD;
        dead.prev = DICT_HEAD;
        self.free_list.push(node);
    }

    /// First node whose key satisfies `geq(stored)` (i.e. key <= stored),
    /// or the head when none does.
    pub fn search<F>(&self, mut geq: F) -> NodeIdx
    where
        F: FnMut(K) -> bool,
    {
        let mut node = DICT_HEAD;
        loop {
            node = self.nodes[node as usize].next;
            match self.nodes[node as usize].key {
                None => return node,
                Some(stored) if geq(stored) => return node,
                Some(_) => {}
            }
        }
    }

    /// Key of `node`; `None` for the head.
    #[inline]
    pub fn key(&self, node: NodeIdx) -> Option<K> {
        self.nodes[node as usize].key
    }

    #[inline]
    pub fn min(&self) -> NodeIdx {
        self.nodes[DICT_HEAD as usize].next
    }

    #[inline]
    pub fn succ(&self, node: NodeIdx) -> NodeIdx {
        self.nodes[node as usize].next
    }

    #[inline]
    pub fn pred(&self, node: NodeIdx) -> NodeIdx {
        self.nodes[node as usize].prev
    }
}

impl<K: Copy> Default for Dict<K> {
    fn default() -> Self {
        Self::new()
    }
}

use super::lib::random_level;
use super::{RangeSpec, SKIP_LIST_MAX_LEVEL};
use bytes::Bytes;
use std::marker::PhantomData;
use std::ptr::NonNull;

pub struct Node {
    elem: Bytes,
    score: f64,
    backward: Option<NonNull<Node>>,
    level: Vec<Level>,
}

impl Node {
    fn new(elem: Bytes, score: f64, level: usize) -> Self {
        Self {
            elem,
            score,
            backward: None,
            level: vec![Level::default(); level],
        }
    }

    pub fn elem(&self) -> &Bytes {
        &self.elem
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// True when this node sorts strictly before `(score, elem)`.
    #[inline(always)]
    fn precedes(&self, score: f64, elem: &[u8]) -> bool {
        self.score < score || (self.score == score && self.elem[..] < *elem)
    }
}

#[derive(Clone, Copy, Default)]
struct Level {
    forward: Option<NonNull<Node>>,
    /// number of level-0 hops covered by `forward`
    span: usize,
}

/// Ordered index of `(score, member)` pairs with per-level spans, so rank
/// lookups and rank addressing are O(log n).
pub struct SkipList {
    /// header node, carries no element
    head: NonNull<Node>,
    /// last node, `None` when empty
    tail: Option<NonNull<Node>>,
    /// number of nodes in skip_list
    length: usize,
    /// level of node with max level
    level: usize,
}

// Nodes are owned exclusively by the list and only reachable through it.
unsafe impl Send for SkipList {}
unsafe impl Sync for SkipList {}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipList {
    pub fn new() -> Self {
        let head = Node::new(Bytes::new(), 0f64, SKIP_LIST_MAX_LEVEL);
        Self {
            head: Self::alloc(head),
            tail: None,
            length: 0,
            level: 1,
        }
    }

    fn alloc(node: Node) -> NonNull<Node> {
        // Box::into_raw never returns null
        unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(node))) }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Inserts a new node. The caller guarantees `elem` is not already
    /// present and `score` is not NaN.
    pub fn insert(&mut self, score: f64, elem: Bytes) {
        debug_assert!(!score.is_nan());
        let mut update = [self.head; SKIP_LIST_MAX_LEVEL];
        let mut rank = [0usize; SKIP_LIST_MAX_LEVEL];
        let mut x = self.head;

        unsafe {
            for i in (0..self.level).rev() {
                // store rank that is crossed to reach the insert position
                rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
                while let Some(next) = x.as_ref().level[i].forward {
                    if !next.as_ref().precedes(score, &elem) {
                        break;
                    }
                    rank[i] += x.as_ref().level[i].span;
                    x = next;
                }
                update[i] = x;
            }

            let level = random_level();
            if level > self.level {
                for i in self.level..level {
                    rank[i] = 0;
                    update[i] = self.head;
                    (&mut (*self.head.as_ptr()).level)[i].span = self.length;
                }
                self.level = level;
            }

            let node = Self::alloc(Node::new(elem, score, level));
            for i in 0..level {
                let prev = &mut (&mut (*update[i].as_ptr()).level)[i];
                let cur = &mut (&mut (*node.as_ptr()).level)[i];
                cur.forward = prev.forward;
                cur.span = prev.span - (rank[0] - rank[i]);
                prev.forward = Some(node);
                prev.span = (rank[0] - rank[i]) + 1;
            }
            // untouched levels now span one more node
            for i in level..self.level {
                (&mut (*update[i].as_ptr()).level)[i].span += 1;
            }

            (*node.as_ptr()).backward = if update[0] == self.head {
                None
            } else {
                Some(update[0])
            };
            match (&(*node.as_ptr()).level)[0].forward {
                Some(next) => (*next.as_ptr()).backward = Some(node),
                None => self.tail = Some(node),
            }
        }
        self.length += 1;
    }

    /// Rightmost node on each level that sorts strictly before `(score, elem)`.
    fn find_update(&self, score: f64, elem: &[u8]) -> [NonNull<Node>; SKIP_LIST_MAX_LEVEL] {
        let mut update = [self.head; SKIP_LIST_MAX_LEVEL];
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    if !next.as_ref().precedes(score, elem) {
                        break;
                    }
                    x = next;
                }
                update[i] = x;
            }
        }
        update
    }

    /// Unlinks `x`; `update` must be the predecessor path of `x`. The node
    /// memory is left to the caller.
    fn delete_node(&mut self, x: NonNull<Node>, update: &[NonNull<Node>; SKIP_LIST_MAX_LEVEL]) {
        unsafe {
            for i in 0..self.level {
                let prev = &mut (&mut (*update[i].as_ptr()).level)[i];
                if prev.forward == Some(x) {
                    prev.span += x.as_ref().level[i].span;
                    prev.span -= 1;
                    prev.forward = x.as_ref().level[i].forward;
                } else {
                    prev.span -= 1;
                }
            }
            match x.as_ref().level[0].forward {
                Some(next) => (*next.as_ptr()).backward = x.as_ref().backward,
                None => self.tail = x.as_ref().backward,
            }
            while self.level > 1 && self.head.as_ref().level[self.level - 1].forward.is_none() {
                self.level -= 1;
            }
        }
        self.length -= 1;
    }

    fn free(node: NonNull<Node>) -> Bytes {
        let node = unsafe { Box::from_raw(node.as_ptr()) };
        node.elem
    }

    /// Removes the node matching both score and element.
    pub fn delete(&mut self, score: f64, elem: &[u8]) -> bool {
        let update = self.find_update(score, elem);
        unsafe {
            if let Some(x) = update[0].as_ref().level[0].forward {
                if x.as_ref().score == score && x.as_ref().elem[..] == *elem {
                    self.delete_node(x, &update);
                    Self::free(x);
                    return true;
                }
            }
        }
        false
    }

    /// Moves an existing element from `cur_score` to `new_score`. Returns
    /// false when the element is not found at `cur_score`.
    pub fn update_score(&mut self, cur_score: f64, elem: &[u8], new_score: f64) -> bool {
        debug_assert!(!new_score.is_nan());
        let update = self.find_update(cur_score, elem);
        unsafe {
            let x = match update[0].as_ref().level[0].forward {
                Some(x) if x.as_ref().score == cur_score && x.as_ref().elem[..] == *elem => x,
                _ => return false,
            };

            // still in order with both neighbours: update in place
            let after_prev = match x.as_ref().backward {
                None => true,
                Some(prev) => prev.as_ref().precedes(new_score, elem),
            };
            let before_next = match x.as_ref().level[0].forward {
                None => true,
                Some(next) => {
                    let next = next.as_ref();
                    new_score < next.score || (new_score == next.score && *elem < next.elem[..])
                }
            };
            if after_prev && before_next {
                (*x.as_ptr()).score = new_score;
                return true;
            }

            self.delete_node(x, &update);
            let elem = Self::free(x);
            self.insert(new_score, elem);
        }
        true
    }

    /// 0-based rank of the element with the given score.
    pub fn get_rank(&self, score: f64, elem: &[u8]) -> Option<usize> {
        let mut rank = 0;
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    let n = next.as_ref();
                    if n.score < score || (n.score == score && n.elem[..] <= *elem) {
                        rank += x.as_ref().level[i].span;
                        x = next;
                    } else {
                        break;
                    }
                }
                if x != self.head && x.as_ref().elem[..] == *elem {
                    return Some(rank - 1);
                }
            }
        }
        None
    }

    /// Node at the 0-based `rank`.
    pub fn get_elem_by_rank(&self, rank: usize) -> Option<&Node> {
        let target = rank + 1;
        let mut traversed = 0;
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    if traversed + x.as_ref().level[i].span > target {
                        break;
                    }
                    traversed += x.as_ref().level[i].span;
                    x = next;
                }
                if traversed == target {
                    return Some(&*x.as_ptr());
                }
            }
        }
        None
    }

    pub fn first(&self) -> Option<&Node> {
        unsafe { self.head.as_ref().level[0].forward.map(|n| &*n.as_ptr()) }
    }

    pub fn last(&self) -> Option<&Node> {
        unsafe { self.tail.map(|n| &*n.as_ptr()) }
    }

    /// Whether any node could fall inside `range`.
    pub fn is_in_range(&self, range: &RangeSpec) -> bool {
        if range.is_empty() {
            return false;
        }
        match (self.last(), self.first()) {
            (Some(last), Some(first)) => {
                range.value_gte_min(last.score) && range.value_lte_max(first.score)
            }
            _ => false,
        }
    }

    /// Lowest-ranked node inside `range`.
    pub fn first_in_range(&self, range: &RangeSpec) -> Option<&Node> {
        if !self.is_in_range(range) {
            return None;
        }
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    if range.value_gte_min(next.as_ref().score) {
                        break;
                    }
                    x = next;
                }
            }
            let node = &*x.as_ref().level[0].forward?.as_ptr();
            range.value_lte_max(node.score).then_some(node)
        }
    }

    /// Highest-ranked node inside `range`.
    pub fn last_in_range(&self, range: &RangeSpec) -> Option<&Node> {
        if !self.is_in_range(range) {
            return None;
        }
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    if !range.value_lte_max(next.as_ref().score) {
                        break;
                    }
                    x = next;
                }
            }
            if x == self.head {
                return None;
            }
            let node = &*x.as_ptr();
            range.value_gte_min(node.score).then_some(node)
        }
    }

    /// Removes every node whose score is inside `range`, returning the
    /// removed elements in rank order.
    pub fn delete_range_by_score(&mut self, range: &RangeSpec) -> Vec<Bytes> {
        let mut removed = vec![];
        if !self.is_in_range(range) {
            return removed;
        }
        let mut update = [self.head; SKIP_LIST_MAX_LEVEL];
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    if range.value_gte_min(next.as_ref().score) {
                        break;
                    }
                    x = next;
                }
                update[i] = x;
            }

            let mut cur = x.as_ref().level[0].forward;
            while let Some(node) = cur {
                if !range.value_lte_max(node.as_ref().score) {
                    break;
                }
                cur = node.as_ref().level[0].forward;
                self.delete_node(node, &update);
                removed.push(Self::free(node));
            }
        }
        removed
    }

    /// Removes the nodes with 0-based rank in `[start, end]`, returning the
    /// removed elements in rank order.
    pub fn delete_range_by_rank(&mut self, start: usize, end: usize) -> Vec<Bytes> {
        let mut removed = vec![];
        let mut update = [self.head; SKIP_LIST_MAX_LEVEL];
        let mut traversed = 0;
        let mut x = self.head;
        unsafe {
            for i in (0..self.level).rev() {
                while let Some(next) = x.as_ref().level[i].forward {
                    if traversed + x.as_ref().level[i].span > start {
                        break;
                    }
                    traversed += x.as_ref().level[i].span;
                    x = next;
                }
                update[i] = x;
            }

            let mut cur = x.as_ref().level[0].forward;
            while let Some(node) = cur {
                if traversed > end {
                    break;
                }
                cur = node.as_ref().level[0].forward;
                self.delete_node(node, &update);
                removed.push(Self::free(node));
                traversed += 1;
            }
        }
        removed
    }

    /// Ascending iteration from the first node.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cur: unsafe { self.head.as_ref().level[0].forward },
            reverse: false,
            _marker: PhantomData,
        }
    }

    /// Iteration starting at `node` (which must belong to this list).
    pub fn iter_from<'a>(&'a self, node: &'a Node, reverse: bool) -> Iter<'a> {
        Iter {
            cur: Some(NonNull::from(node)),
            reverse,
            _marker: PhantomData,
        }
    }
}

impl Clone for SkipList {
    fn clone(&self) -> Self {
        let mut list = SkipList::new();
        for node in self.iter() {
            list.insert(node.score, node.elem.clone());
        }
        list
    }
}

impl Drop for SkipList {
    fn drop(&mut self) {
        unsafe {
            let mut node = self.head.as_ref().level[0].forward;
            while let Some(cur) = node {
                node = cur.as_ref().level[0].forward;
                drop(Box::from_raw(cur.as_ptr()));
            }
            drop(Box::from_raw(self.head.as_ptr()));
        }
    }
}

pub struct Iter<'a> {
    cur: Option<NonNull<Node>>,
    reverse: bool,
    _marker: PhantomData<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { &*self.cur?.as_ptr() };
        self.cur = if self.reverse {
            node.backward
        } else {
            node.level[0].forward
        };
        Some(node)
    }
}

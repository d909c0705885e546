//! A classical B-Tree multimap from [`Value`] to an ordered set of row ids.
//!
//! Every secondary index and every unique/primary-key constraint probe
//! goes through this structure. Minimum degree is fixed at `t = 3`:
//! every non-root node holds between `t-1` and `2t-1` entries, and
//! splitting/merging happen on the way down so a single pass suffices
//! for both insertion and deletion (the textbook CLRS presentation).

use crate::value::Value;

/// Row identifier: monotonically increasing, allocated by the owning table.
pub type RowId = u64;

const MIN_DEGREE: usize = 3;
const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;
const MIN_KEYS: usize = MIN_DEGREE - 1;

#[derive(Debug)]
struct Entry {
    key: Value,
    rows: Vec<RowId>,
}

#[derive(Debug)]
struct Node {
    entries: Vec<Entry>,
    /// Empty for leaves; otherwise always `entries.len() + 1`.
    children: Vec<Box<Node>>,
}

impl Node {
    const fn leaf() -> Self {
        Self {
            entries: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An ordered multimap from [`Value`] to a set of [`RowId`]s.
#[derive(Debug)]
pub struct BTreeIndex {
    root: Box<Node>,
}

impl Default for BTreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl BTreeIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Box::new(Node::leaf()),
        }
    }

    /// Inserts `rowid` under `key`. A no-op if `rowid` is already present
    /// for that key.
    pub fn insert(&mut self, key: Value, rowid: RowId) {
        if let Some(rows) = Self::find_rows_mut(&mut self.root, &key) {
            if let Err(pos) = rows.binary_search(&rowid) {
                rows.insert(pos, rowid);
            }
            return;
        }

        if self.root.entries.len() == MAX_KEYS {
            let old_root = std::mem::replace(&mut self.root, Box::new(Node::leaf()));
            self.root.children.push(old_root);
            Self::split_child(&mut self.root, 0);
        }
        Self::insert_nonfull(&mut self.root, key, rowid);
    }

    /// Removes `rowid` from `key`'s row set. If the set becomes empty the
    /// key is removed from the tree entirely. A no-op if the pair isn't
    /// present.
    pub fn remove(&mut self, key: &Value, rowid: RowId) {
        let now_empty = if let Some(rows) = Self::find_rows_mut(&mut self.root, key) {
            if let Ok(pos) = rows.binary_search(&rowid) {
                rows.remove(pos);
            }
            rows.is_empty()
        } else {
            false
        };

        if now_empty {
            Self::delete_key(&mut self.root, key);
            if self.root.entries.is_empty() && !self.root.is_leaf() {
                let only_child = self.root.children.remove(0);
                self.root = only_child;
            }
        }
    }

    /// Returns the row ids stored under `key`, in ascending order, or an
    /// empty slice if the key isn't present.
    #[must_use]
    pub fn find_equal(&self, key: &Value) -> &[RowId] {
        Self::find_rows(&self.root, key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any row is indexed under `key`.
    #[must_use]
    pub fn contains(&self, key: &Value) -> bool {
        !self.find_equal(key).is_empty()
    }

    /// Returns every row id whose key falls within `[lo, hi]` (bounds
    /// optional, inclusivity controlled per side), in ascending key
    /// order and, within a key, ascending row-id order.
    #[must_use]
    pub fn find_range(
        &self,
        lo: Option<&Value>,
        hi: Option<&Value>,
        lo_inclusive: bool,
        hi_inclusive: bool,
    ) -> Vec<RowId> {
        let mut out = Vec::new();
        Self::collect_range(&self.root, lo, hi, lo_inclusive, hi_inclusive, &mut out);
        out
    }

    fn in_range(key: &Value, lo: Option<&Value>, hi: Option<&Value>, lo_inc: bool, hi_inc: bool) -> bool {
        if let Some(lo) = lo {
            if lo_inc {
                if key < lo {
                    return false;
                }
            } else if key <= lo {
                return false;
            }
        }
        if let Some(hi) = hi {
            if hi_inc {
                if key > hi {
                    return false;
                }
            } else if key >= hi {
                return false;
            }
        }
        true
    }

    fn collect_range(
        node: &Node,
        lo: Option<&Value>,
        hi: Option<&Value>,
        lo_inc: bool,
        hi_inc: bool,
        out: &mut Vec<RowId>,
    ) {
        for (i, entry) in node.entries.iter().enumerate() {
            if !node.is_leaf() {
                Self::collect_range(&node.children[i], lo, hi, lo_inc, hi_inc, out);
            }
            if Self::in_range(&entry.key, lo, hi, lo_inc, hi_inc) {
                out.extend(entry.rows.iter().copied());
            }
        }
        if !node.is_leaf() {
            Self::collect_range(&node.children[node.entries.len()], lo, hi, lo_inc, hi_inc, out);
        }
    }

    fn find_rows<'a>(node: &'a Node, key: &Value) -> Option<&'a Vec<RowId>> {
        match node.entries.binary_search_by(|e| e.key.cmp(key)) {
            Ok(idx) => Some(&node.entries[idx].rows),
            Err(idx) => {
                if node.is_leaf() {
                    None
                } else {
                    Self::find_rows(&node.children[idx], key)
                }
            }
        }
    }

    fn find_rows_mut<'a>(node: &'a mut Node, key: &Value) -> Option<&'a mut Vec<RowId>> {
        match node.entries.binary_search_by(|e| e.key.cmp(key)) {
            Ok(idx) => Some(&mut node.entries[idx].rows),
            Err(idx) => {
                if node.is_leaf() {
                    None
                } else {
                    Self::find_rows_mut(&mut node.children[idx], key)
                }
            }
        }
    }

    fn split_child(parent: &mut Node, i: usize) {
        let mid = MIN_DEGREE - 1;
        let (median, right_entries, right_children) = {
            let child = &mut parent.children[i];
            let right_entries = child.entries.split_off(mid + 1);
            let median = child.entries.pop().expect("full child has a median entry");
            let right_children = if child.is_leaf() {
                Vec::new()
            } else {
                child.children.split_off(mid + 1)
            };
            (median, right_entries, right_children)
        };

        let right_node = Node {
            entries: right_entries,
            children: right_children,
        };
        parent.entries.insert(i, median);
        parent.children.insert(i + 1, Box::new(right_node));
    }

    fn insert_nonfull(node: &mut Node, key: Value, rowid: RowId) {
        let idx = node
            .entries
            .binary_search_by(|e| e.key.cmp(&key))
            .unwrap_or_else(|i| i);

        if node.is_leaf() {
            node.entries.insert(
                idx,
                Entry {
                    key,
                    rows: vec![rowid],
                },
            );
            return;
        }

        if node.children[idx].entries.len() == MAX_KEYS {
            Self::split_child(node, idx);
            if key > node.entries[idx].key {
                Self::insert_nonfull(&mut node.children[idx + 1], key, rowid);
                return;
            }
        }
        Self::insert_nonfull(&mut node.children[idx], key, rowid);
    }

    fn delete_key(node: &mut Node, key: &Value) {
        match node.entries.binary_search_by(|e| e.key.cmp(key)) {
            Ok(idx) => {
                if node.is_leaf() {
                    node.entries.remove(idx);
                } else {
                    Self::delete_internal(node, idx);
                }
            }
            Err(idx) => {
                if node.is_leaf() {
                    return;
                }
                let idx = Self::ensure_child_has_min_keys(node, idx);
                Self::delete_key(&mut node.children[idx], key);
            }
        }
    }

    fn delete_internal(node: &mut Node, idx: usize) {
        if node.children[idx].entries.len() >= MIN_DEGREE {
            let pred = Self::remove_max(&mut node.children[idx]);
            node.entries[idx] = pred;
        } else if node.children[idx + 1].entries.len() >= MIN_DEGREE {
            let succ = Self::remove_min(&mut node.children[idx + 1]);
            node.entries[idx] = succ;
        } else {
            // Neither child can spare a key: merge them around the
            // entry being deleted, then delete it from the merged node
            // (it now sits at index MIN_KEYS, the former median).
            Self::merge_children(node, idx);
            let target = node.children[idx].entries[MIN_KEYS].key.clone();
            Self::delete_key(&mut node.children[idx], &target);
        }
    }

    fn remove_max(node: &mut Node) -> Entry {
        if node.is_leaf() {
            return node.entries.pop().expect("non-empty node");
        }
        let last = node.children.len() - 1;
        let last = Self::ensure_child_has_min_keys(node, last);
        Self::remove_max(&mut node.children[last])
    }

    fn remove_min(node: &mut Node) -> Entry {
        if node.is_leaf() {
            return node.entries.remove(0);
        }
        let idx = Self::ensure_child_has_min_keys(node, 0);
        Self::remove_min(&mut node.children[idx])
    }

    /// Ensures `node.children[idx]` holds at least `MIN_DEGREE` keys
    /// before the caller descends into it, borrowing from a sibling or
    /// merging as needed. Returns the (possibly shifted) index to
    /// descend into.
    fn ensure_child_has_min_keys(node: &mut Node, idx: usize) -> usize {
        if node.children[idx].entries.len() >= MIN_DEGREE {
            return idx;
        }

        let has_left = idx > 0 && node.children[idx - 1].entries.len() >= MIN_DEGREE;
        let has_right =
            idx + 1 < node.children.len() && node.children[idx + 1].entries.len() >= MIN_DEGREE;

        if has_left {
            Self::borrow_from_left(node, idx);
            idx
        } else if has_right {
            Self::borrow_from_right(node, idx);
            idx
        } else if idx > 0 {
            Self::merge_children(node, idx - 1);
            idx - 1
        } else {
            Self::merge_children(node, idx);
            idx
        }
    }

    fn borrow_from_left(node: &mut Node, idx: usize) {
        let (left_part, right_part) = node.children.split_at_mut(idx);
        let left_sibling = left_part.last_mut().expect("left sibling exists");
        let child = &mut right_part[0];

        let moved_entry = left_sibling.entries.pop().expect("left sibling has spare keys");
        let separator = std::mem::replace(&mut node.entries[idx - 1], moved_entry);
        child.entries.insert(0, separator);

        if !left_sibling.is_leaf() {
            let moved_child = left_sibling.children.pop().expect("internal sibling has children");
            child.children.insert(0, moved_child);
        }
    }

    fn borrow_from_right(node: &mut Node, idx: usize) {
        let (left_part, right_part) = node.children.split_at_mut(idx + 1);
        let child = &mut left_part[idx];
        let right_sibling = &mut right_part[0];

        let moved_entry = right_sibling.entries.remove(0);
        let separator = std::mem::replace(&mut node.entries[idx], moved_entry);
        child.entries.push(separator);

        if !right_sibling.is_leaf() {
            let moved_child = right_sibling.children.remove(0);
            child.children.push(moved_child);
        }
    }

    fn merge_children(node: &mut Node, idx: usize) {
        let right = *node.children.remove(idx + 1);
        let median = node.entries.remove(idx);
        let left = &mut node.children[idx];
        left.entries.push(median);
        left.entries.extend(right.entries);
        left.children.extend(right.children);
    }
}

//! Single-owner list; neither `Send` nor `Sync`. Sharing it across threads
//! needs an external lock around the whole structure.

use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use crate::error::{RangeBound, Result, SlistError};

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

// Nodes are allocated with Box::into_raw and only ever touched through raw
// pointers, so walking the chain never invalidates `tail` or a cached node.
struct Node<T> {
    value: T,
    next: *mut Node<T>,
}

enum Current<T> {
    // Still linked into the chain.
    Linked(*mut Node<T>),
    // Popped or removed; owned here until the next locate-style call.
    Detached(T),
}

pub struct LinkedList<T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    current: Option<Current<T>>,
    size: usize,
    comparator: Option<Comparator<T>>,
    last_error: Option<SlistError>,
    debug: bool,
    range_start: usize,
    range_end: usize,
    marker: PhantomData<Box<Node<T>>>,
}

impl<T> LinkedList<T> {
    pub fn new() -> Self {
        LinkedList {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            current: None,
            size: 0,
            comparator: None,
            last_error: None,
            debug: false,
            range_start: 0,
            range_end: 0,
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn error(&self) -> Option<&SlistError> {
        self.last_error.as_ref()
    }

    /// Takes the last error out of the slot, turning it into a `Result`.
    pub fn status(&mut self) -> Result<()> {
        match self.last_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn set_comparator<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        self.comparator = Some(Box::new(f));
        self
    }

    pub fn has_comparator(&self) -> bool {
        self.comparator.is_some()
    }

    pub fn comparator(&self) -> Option<&dyn Fn(&T, &T) -> Ordering> {
        self.comparator.as_deref()
    }

    pub fn debug(&mut self, on: bool) -> &mut Self {
        self.debug = on;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn range(&self) -> (usize, usize) {
        (self.range_start, self.range_end)
    }

    pub fn add(&mut self, value: T) -> &mut Self {
        self.last_error = None;
        let new_node = Box::into_raw(Box::new(Node {
            value,
            next: ptr::null_mut(),
        }));

        if self.tail.is_null() {
            self.head = new_node;
        } else {
            // SAFETY: a non-null tail is the last live node of this list.
            unsafe {
                (*self.tail).next = new_node;
            }
        }

        self.tail = new_node;
        self.size += 1;
        self.reset_range();
        log::trace!("[add] len {}", self.size);
        self
    }

    /// Inserts `value` after the node at `index`.
    ///
    /// An empty list only accepts index 0. On a non-empty list an index with no
    /// node is a silent no-op: nothing changes and no error is recorded.
    pub fn insert(&mut self, value: T, index: usize) -> &mut Self {
        self.last_error = None;

        if self.head.is_null() {
            if index == 0 {
                return self.add(value);
            }
            self.size = 0;
            self.reset_range();
            return self.fail("insert", SlistError::IndexOutOfRange { index, len: 0 });
        }

        let node = self.node_at(index);
        if node.is_null() {
            log::trace!("[insert] no node at {}, nothing inserted", index);
            return self;
        }

        // SAFETY: node is a live node of this list; the new node is freshly allocated.
        unsafe {
            let new_node = Box::into_raw(Box::new(Node {
                value,
                next: (*node).next,
            }));
            (*node).next = new_node;
            if (*new_node).next.is_null() {
                self.tail = new_node;
            }
        }
        self.size += 1;
        self.reset_range();
        log::trace!("[insert] after {}, len {}", index, self.size);
        self
    }

    /// Deletes the node after the one at `index`, i.e. element `index + 1`.
    ///
    /// `index == len()` passes the bounds check and finds nothing to delete, as
    /// does the last index. Both are silent no-ops.
    pub fn delete(&mut self, index: usize) -> &mut Self {
        self.last_error = None;

        if index > self.size {
            let len = self.size;
            return self.fail("delete", SlistError::IndexOutOfRange { index, len });
        }
        if self.head.is_null() {
            return self.fail("delete", SlistError::EmptyList { op: "delete" });
        }

        let node = self.node_at(index);
        if node.is_null() {
            return self;
        }
        // SAFETY: node is live; its successor is either null or live.
        let removed = unsafe { (*node).next };
        if removed.is_null() {
            return self;
        }

        // SAFETY: both nodes are live and removed follows node.
        unsafe {
            (*node).next = (*removed).next;
            if (*node).next.is_null() {
                self.tail = node;
            }
        }
        if matches!(self.current, Some(Current::Linked(raw)) if raw == removed) {
            self.current = None;
        }
        // SAFETY: removed came from Box::into_raw and is no longer reachable.
        unsafe { drop(Box::from_raw(removed)) };

        self.size -= 1;
        self.reset_range();
        log::trace!("[delete] after {}, len {}", index, self.size);
        self
    }

    /// Caches the node at `index` as the current element.
    ///
    /// Only `index > len()` is an error. `index == len()` clears the current
    /// element without recording one.
    pub fn locate(&mut self, index: usize) -> &mut Self {
        self.last_error = None;
        self.current = None;

        if index > self.size {
            let len = self.size;
            return self.fail("locate", SlistError::IndexOutOfRange { index, len });
        }

        let node = self.node_at(index);
        if !node.is_null() {
            self.current = Some(Current::Linked(node));
        }
        self
    }

    pub fn data(&mut self) -> Option<&T> {
        self.last_error = None;

        if self.current.is_none() {
            self.fail("data", SlistError::NoCurrentElement);
            return None;
        }

        match &self.current {
            // SAFETY: a linked current node is still in the chain. `delete` and
            // `clear` drop the cache before they free the node it points to.
            Some(Current::Linked(raw)) => unsafe { Some(&(**raw).value) },
            Some(Current::Detached(value)) => Some(value),
            None => None,
        }
    }

    pub fn remove(&mut self) -> &mut Self {
        self.last_error = None;

        if self.head.is_null() {
            self.size = 0;
            return self.fail("remove", SlistError::EmptyList { op: "remove" });
        }

        let old_tail = if self.size == 1 {
            let only = self.head;
            self.head = ptr::null_mut();
            self.tail = ptr::null_mut();
            only
        } else {
            let new_tail = self.node_at(self.size - 2);
            if new_tail.is_null() {
                return self;
            }
            // SAFETY: new_tail is the live node before the tail.
            let old_tail = unsafe { mem::replace(&mut (*new_tail).next, ptr::null_mut()) };
            self.tail = new_tail;
            old_tail
        };
        if old_tail.is_null() {
            return self;
        }

        // SAFETY: old_tail came from Box::into_raw and has been unlinked.
        let node = unsafe { Box::from_raw(old_tail) };
        self.size -= 1;
        self.reset_range();
        self.current = Some(Current::Detached(node.value));
        log::trace!("[remove] len {}", self.size);
        self
    }

    pub fn pop(&mut self) -> &mut Self {
        self.last_error = None;

        match self.take_head() {
            Some(value) => {
                self.current = Some(Current::Detached(value));
                log::trace!("[pop] len {}", self.size);
                self
            }
            None => {
                self.size = 0;
                self.fail("pop", SlistError::EmptyList { op: "pop" })
            }
        }
    }

    /// Accepts `start` only in `0..=len() - 2`, otherwise falls back to 0.
    pub fn set_range_start(&mut self, start: usize) -> &mut Self {
        self.last_error = None;

        if self.size >= 2 && start <= self.size - 2 {
            self.range_start = start;
            self
        } else {
            self.range_start = 0;
            self.fail("set_range_start", SlistError::RangeOutOfBounds(RangeBound::Start))
        }
    }

    /// Accepts `end` in `1..=len() - 1` that is also past the range start.
    ///
    /// Out of bounds falls back to the last index; a misordered end leaves the
    /// previous end in place.
    pub fn set_range_end(&mut self, end: usize) -> &mut Self {
        self.last_error = None;

        if end >= 1 && end < self.size {
            if end > self.range_start {
                self.range_end = end;
                self
            } else {
                let start = self.range_start;
                self.fail("set_range_end", SlistError::RangeOrderViolation { start, end })
            }
        } else {
            self.range_end = self.size.saturating_sub(1);
            self.fail("set_range_end", SlistError::RangeOutOfBounds(RangeBound::End))
        }
    }

    pub fn front(&self) -> Option<&T> {
        // SAFETY: a non-null head is live for as long as &self is borrowed.
        unsafe { self.head.as_ref().map(|node| &node.value) }
    }

    pub fn back(&self) -> Option<&T> {
        // SAFETY: a non-null tail is the last live node of the chain owned by this
        // list, and the borrow of &self keeps it alive for the returned reference.
        unsafe { self.tail.as_ref().map(|node| &node.value) }
    }

    pub fn size_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.size * mem::size_of::<Node<T>>()
    }

    pub fn clear(&mut self) -> &mut Self {
        self.last_error = None;
        self.current = None;

        let mut cursor = self.head;
        while !cursor.is_null() {
            // SAFETY: every linked node came from Box::into_raw and is freed once.
            let node = unsafe { Box::from_raw(cursor) };
            cursor = node.next;
        }

        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
        self.size = 0;
        self.reset_range();
        self
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: the head is null or live while &self is borrowed.
            current: unsafe { self.head.as_ref() },
        }
    }

    fn node_at(&self, index: usize) -> *mut Node<T> {
        let mut cursor = self.head;
        for _ in 0..index {
            if cursor.is_null() {
                break;
            }
            // SAFETY: non-null links always point to live nodes of this list.
            cursor = unsafe { (*cursor).next };
        }
        cursor
    }

    fn take_head(&mut self) -> Option<T> {
        if self.head.is_null() {
            return None;
        }
        // SAFETY: the head came from Box::into_raw and is unlinked right here.
        let node = unsafe { Box::from_raw(self.head) };
        let Node { value, next } = *node;
        self.head = next;
        if self.head.is_null() {
            self.tail = ptr::null_mut();
        }
        self.size -= 1;
        self.reset_range();
        Some(value)
    }

    fn reset_range(&mut self) {
        self.range_start = 0;
        self.range_end = self.size.saturating_sub(1);
    }

    fn fail(&mut self, op: &str, err: SlistError) -> &mut Self {
        log::debug!("[{}] {}", op, err);
        self.last_error = Some(err);
        self
    }
}

impl<T: fmt::Display> LinkedList<T> {
    /// Writes the list to `sink`, limited to the current range. Leaves the
    /// error slot alone unless the sink fails.
    pub fn print<W: Write>(&mut self, mut sink: W) -> &mut Self {
        if let Err(err) = self.write_to(&mut sink) {
            return self.fail("print", err.into());
        }
        self
    }

    fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        writeln!(sink, "Slist @: {:p} Len: {}", self, self.size)?;
        if self.debug {
            writeln!(sink, "  Range start: {} end: {}", self.range_start, self.range_end)?;
            let compare = if self.comparator.is_some() { "set" } else { "none" };
            writeln!(sink, "  Compare func: {}", compare)?;
            match &self.last_error {
                Some(err) => writeln!(sink, "  Last error: {}", err)?,
                None => writeln!(sink, "  Last error: none")?,
            }
        }
        if self.range_start != 0 || self.range_end + 1 < self.size {
            writeln!(sink, "  Nodes in range {}:{} ...", self.range_start, self.range_end)?;
        } else {
            writeln!(sink, "  Nodes ...")?;
        }

        let mut walked = 0;
        let mut cursor = self.head as *const Node<T>;
        while !cursor.is_null() {
            // SAFETY: non-null links always point to live nodes of this list.
            let node = unsafe { &*cursor };
            if walked >= self.range_start && walked <= self.range_end {
                if self.debug {
                    writeln!(sink, "    {:06},{:p}: {}", walked, cursor, node.value)?;
                    writeln!(sink, "      next:{:p}", node.next)?;
                } else {
                    writeln!(sink, "    {:06}: {}", walked, node.value)?;
                }
            }
            walked += 1;
            cursor = node.next;
        }
        writeln!(sink, "{} nodes listed", walked)
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LinkedList<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone> Clone for LinkedList<T> {
    fn clone(&self) -> Self {
        let mut new_list: LinkedList<T> = self.iter().cloned().collect();
        new_list.debug = self.debug;
        new_list
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for LinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = LinkedList::new();
        list.extend(iter);
        list
    }
}

pub struct Iter<'a, T> {
    current: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.map(|node| {
            // SAFETY: the list is borrowed for 'a, so every linked node outlives it.
            self.current = unsafe { node.next.as_ref() };
            &node.value
        })
    }
}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct IntoIter<T> {
    list: LinkedList<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.list.take_head()
    }
}

impl<T> IntoIterator for LinkedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}


// proptest is far too slow under miri
#[cfg(all(not(miri), test))]
mod proptests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::*;

    #[derive(Clone, Debug)]
    enum Op {
        Add(u8),
        Insert(u8, usize),
        Delete(usize),
        Pop,
        Remove,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<u8>().prop_map(Op::Add),
            2 => (any::<u8>(), 0..8usize).prop_map(|(v, i)| Op::Insert(v, i)),
            1 => (0..8usize).prop_map(Op::Delete),
            1 => Just(Op::Pop),
            1 => Just(Op::Remove),
        ]
    }

    fn apply(list: &mut LinkedList<u8>, model: &mut VecDeque<u8>, op: &Op) -> bool {
        match *op {
            Op::Add(v) => {
                list.add(v);
                model.push_back(v);
                assert!(list.error().is_none());
                true
            }
            Op::Insert(v, index) => {
                list.insert(v, index);
                if model.is_empty() {
                    if index == 0 {
                        model.push_back(v);
                        return true;
                    }
                    assert!(matches!(
                        list.error(),
                        Some(SlistError::IndexOutOfRange { len: 0, .. })
                    ));
                    return false;
                }
                assert!(list.error().is_none());
                if index < model.len() {
                    model.insert(index + 1, v);
                    return true;
                }
                false
            }
            Op::Delete(index) => {
                list.delete(index);
                if index > model.len() {
                    assert!(matches!(list.error(), Some(SlistError::IndexOutOfRange { .. })));
                    return false;
                }
                if model.is_empty() {
                    assert!(matches!(list.error(), Some(SlistError::EmptyList { .. })));
                    return false;
                }
                assert!(list.error().is_none());
                if index + 1 < model.len() {
                    model.remove(index + 1);
                    return true;
                }
                false
            }
            // An empty pop or remove leaves any earlier current element in place.
            Op::Pop => {
                list.pop();
                match model.pop_front() {
                    Some(expected) => {
                        assert_eq!(list.data(), Some(&expected));
                        true
                    }
                    None => {
                        assert!(matches!(list.error(), Some(SlistError::EmptyList { .. })));
                        false
                    }
                }
            }
            Op::Remove => {
                list.remove();
                match model.pop_back() {
                    Some(expected) => {
                        assert_eq!(list.data(), Some(&expected));
                        true
                    }
                    None => {
                        assert!(matches!(list.error(), Some(SlistError::EmptyList { .. })));
                        false
                    }
                }
            }
        }
    }

    proptest! {
        #[test]
        fn adds_preserve_order(items in prop::collection::vec(any::<i32>(), 0..64)) {
            let list: LinkedList<i32> = items.iter().copied().collect();
            prop_assert_eq!(list.len(), items.len());
            prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), items);
        }

        #[test]
        fn matches_deque_model(ops in prop::collection::vec(op(), 0..96)) {
            let mut list = LinkedList::new();
            let mut model = VecDeque::new();
            for op in &ops {
                let changed = apply(&mut list, &mut model, op);
                prop_assert_eq!(list.len(), model.len());
                prop_assert_eq!(list.front(), model.front());
                prop_assert_eq!(list.back(), model.back());
                prop_assert_eq!(list.iter().count(), model.len());
                if changed {
                    prop_assert_eq!(list.range(), (0, model.len().saturating_sub(1)));
                }
            }
            prop_assert!(list.iter().copied().eq(model.iter().copied()));
        }
    }
}

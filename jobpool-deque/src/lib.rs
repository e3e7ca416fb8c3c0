// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! Generic double-ended queue backed by a growable ring buffer.
//!
//! Callers use it to stage work on their side before handing items to a
//! `jobpool::WorkerPool`. It has no synchronisation of its own.
//!
//! Popping or peeking an empty deque is a contract violation and panics. Use
//! the `try_*` variants when emptiness is an expected condition.

use std::fmt;

pub struct Deque<T> {
    buf: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> Deque<T> {
    /// Creates an empty deque. No allocation happens until the first push.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Creates an empty deque with room for `cap` elements before it grows.
    pub fn with_capacity(cap: usize) -> Self {
        let mut buf = Vec::with_capacity(cap);
        buf.resize_with(cap, || None);
        Self {
            buf,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Number of elements stored in the deque.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots in the ring buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Appends `value` to the tail.
    pub fn push_back(&mut self, value: T) {
        if self.count == self.buf.len() {
            self.grow();
        }
        self.buf[self.tail] = Some(value);
        self.tail = self.next(self.tail);
        self.count += 1;
    }

    /// Prepends `value` to the head.
    pub fn push_front(&mut self, value: T) {
        if self.count == self.buf.len() {
            self.grow();
        }
        self.head = self.prev(self.head);
        self.buf[self.head] = Some(value);
        self.count += 1;
    }

    /// Removes and returns the element at the head.
    ///
    /// # Panics
    ///
    /// Panics if the deque is empty.
    pub fn pop_front(&mut self) -> T {
        self.try_pop_front()
            .unwrap_or_else(|| panic!("pop_front called on empty deque"))
    }

    /// Removes and returns the element at the tail.
    ///
    /// # Panics
    ///
    /// Panics if the deque is empty.
    pub fn pop_back(&mut self) -> T {
        self.try_pop_back()
            .unwrap_or_else(|| panic!("pop_back called on empty deque"))
    }

    pub fn try_pop_front(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let value = self.buf[self.head].take();
        self.head = self.next(self.head);
        self.count -= 1;
        value
    }

    pub fn try_pop_back(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        self.tail = self.prev(self.tail);
        let value = self.buf[self.tail].take();
        self.count -= 1;
        value
    }

    /// Returns the element at the head without removing it.
    ///
    /// # Panics
    ///
    /// Panics if the deque is empty.
    pub fn front(&self) -> &T {
        if self.count == 0 {
            panic!("front called on empty deque");
        }
        self.slot(self.head)
    }

    /// Returns the element at the tail without removing it.
    ///
    /// # Panics
    ///
    /// Panics if the deque is empty.
    pub fn back(&self) -> &T {
        if self.count == 0 {
            panic!("back called on empty deque");
        }
        self.slot(self.prev(self.tail))
    }

    /// Drops all elements. The ring buffer keeps its allocation.
    pub fn clear(&mut self) {
        if self.count == 0 {
            return;
        }
        for i in 0..self.count {
            let idx = (self.head + i) % self.buf.len();
            self.buf[idx] = None;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Iterates from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            deque: self,
            offset: 0,
        }
    }

    fn slot(&self, idx: usize) -> &T {
        // occupied slots between head and tail always hold a value
        match &self.buf[idx] {
            Some(value) => value,
            None => unreachable!("occupied deque slot {idx} is empty"),
        }
    }

    fn next(&self, idx: usize) -> usize {
        if idx + 1 == self.buf.len() {
            0
        } else {
            idx + 1
        }
    }

    fn prev(&self, idx: usize) -> usize {
        if idx == 0 {
            self.buf.len() - 1
        } else {
            idx - 1
        }
    }

    fn grow(&mut self) {
        let new_cap = if self.buf.is_empty() {
            1
        } else {
            self.buf.len() * 2
        };
        let mut new_buf = Vec::with_capacity(new_cap);
        for i in 0..self.count {
            let idx = (self.head + i) % self.buf.len();
            new_buf.push(self.buf[idx].take());
        }
        new_buf.resize_with(new_cap, || None);
        self.buf = new_buf;
        self.head = 0;
        self.tail = self.count % new_cap;
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Deque::new();
        deque.extend(iter);
        deque
    }
}

pub struct Iter<'a, T> {
    deque: &'a Deque<T>,
    offset: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset == self.deque.count {
            return None;
        }
        let idx = (self.deque.head + self.offset) % self.deque.buf.len();
        self.offset += 1;
        Some(self.deque.slot(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.deque.count - self.offset;
        (remaining, Some(remaining))
    }
}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_front_back() {
        let mut d = Deque::new();
        for i in 0..5 {
            d.push_back(i);
        }
        assert_eq!(d.len(), 5);
        assert_eq!(*d.front(), 0);
        assert_eq!(*d.back(), 4);
        for i in 0..5 {
            assert_eq!(d.pop_front(), i);
        }
        assert!(d.is_empty());
    }

    #[test]
    fn wrap_and_grow() {
        let mut d = Deque::new();
        for i in 0..3 {
            d.push_back(i);
        }
        for i in 0..2 {
            assert_eq!(d.pop_front(), i);
        }
        for i in 3..10 {
            d.push_back(i);
        }
        assert_eq!(*d.front(), 2);
        assert_eq!(*d.back(), 9);
        for i in 2..10 {
            assert_eq!(d.pop_front(), i);
        }
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn clear_keeps_the_deque_usable() {
        let mut d: Deque<i32> = (0..4).collect();
        let cap = d.capacity();
        d.clear();
        assert_eq!(d.len(), 0);
        assert_eq!(d.capacity(), cap);
        d.push_back(10);
        assert_eq!(*d.front(), 10);
        assert_eq!(*d.back(), 10);
    }

    #[test]
    fn push_front_and_pop_back_across_the_wrap() {
        let mut d = Deque::with_capacity(4);
        d.push_back(2);
        d.push_back(3);
        d.push_front(1);
        d.push_front(0);
        assert_eq!(d.capacity(), 4);
        assert_eq!(d.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        // forces a grow while head sits at the end of the buffer
        d.push_front(-1);
        assert_eq!(d.capacity(), 8);
        assert_eq!(d.iter().copied().collect::<Vec<_>>(), vec![-1, 0, 1, 2, 3]);

        assert_eq!(d.pop_back(), 3);
        assert_eq!(d.pop_back(), 2);
        assert_eq!(d.pop_front(), -1);
        assert_eq!(d.try_pop_back(), Some(1));
        assert_eq!(d.try_pop_front(), Some(0));
        assert_eq!(d.try_pop_front(), None);
        assert_eq!(d.try_pop_back(), None);
    }

    #[test]
    fn clear_drops_owned_values() {
        use std::rc::Rc;

        let tracked = Rc::new(());
        let mut d = Deque::new();
        for _ in 0..3 {
            d.push_back(tracked.clone());
        }
        assert_eq!(Rc::strong_count(&tracked), 4);
        d.clear();
        assert_eq!(Rc::strong_count(&tracked), 1);
    }

    #[test]
    #[should_panic(expected = "pop_front called on empty deque")]
    fn pop_front_on_empty_panics() {
        let mut d: Deque<u8> = Deque::new();
        d.pop_front();
    }

    #[test]
    #[should_panic(expected = "back called on empty deque")]
    fn back_on_empty_panics() {
        let d: Deque<u8> = Deque::with_capacity(2);
        d.back();
    }
}

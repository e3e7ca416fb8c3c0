// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! Reusable byte buffers ("partitions") for job payloads.
//!
//! A [`Partition`] is taken from a [`PartitionPool`] and goes back to it when
//! released with [`Partition::reset`] or dropped. Handing a partition to a job
//! moves ownership into the job, so payload storage is recycled without a
//! per-job allocation.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

struct Cache {
    size: usize,
    idle: Mutex<Vec<Vec<u8>>>,
}

impl Cache {
    fn put(&self, mut buf: Vec<u8>) {
        buf.clear();
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buf);
    }
}

/// Cache of byte buffers pre-grown to a fixed capacity. Clones share the cache.
#[derive(Clone)]
pub struct PartitionPool {
    cache: Arc<Cache>,
}

impl PartitionPool {
    /// Creates a pool whose partitions start with at least `size` bytes of capacity.
    pub fn new(size: usize) -> Self {
        Self {
            cache: Arc::new(Cache {
                size,
                idle: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.cache.size
    }

    /// Number of released buffers waiting to be reused.
    pub fn idle(&self) -> usize {
        self.cache
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Takes an empty partition, reusing a cached buffer when one is available.
    pub fn acquire(&self) -> Partition {
        let cached = self
            .cache
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let mut buf = match cached {
            Some(buf) => buf,
            None => {
                trace!("allocating partition of {} bytes", self.cache.size);
                Vec::with_capacity(self.cache.size)
            }
        };
        buf.clear();
        if buf.capacity() < self.cache.size {
            buf.reserve(self.cache.size);
        }
        Partition {
            buf,
            pos: 0,
            cache: self.cache.clone(),
        }
    }
}

impl fmt::Debug for PartitionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionPool")
            .field("size", &self.size())
            .field("idle", &self.idle())
            .finish()
    }
}

/// Growable byte buffer borrowed from a [`PartitionPool`].
///
/// Reads consume from the front. `len`, `unread` and `write_at` all refer to
/// the unread portion.
pub struct Partition {
    buf: Vec<u8>,
    pos: usize,
    cache: Arc<Cache>,
}

impl Partition {
    /// Unread bytes.
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn unread(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Overwrites unread bytes starting at `off`. The partition never grows
    /// through this call; a write past the end fails with `WriteZero`.
    pub fn write_at(&mut self, data: &[u8], off: u64) -> io::Result<usize> {
        let len = self.len();
        let Ok(off) = usize::try_from(off) else {
            return Err(short_write());
        };
        if off > len || data.len() > len - off {
            return Err(short_write());
        }
        let start = self.pos + off;
        self.buf[start..start + data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    /// Empties the partition while keeping it.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Releases the partition back to its pool.
    pub fn reset(self) {
        drop(self);
    }
}

fn short_write() -> io::Error {
    io::Error::new(io::ErrorKind::WriteZero, "short write")
}

impl Read for Partition {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.is_empty() {
            self.clear();
            return Ok(0);
        }
        let n = self.len().min(out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for Partition {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Partition {
    fn drop(&mut self) {
        self.cache.put(std::mem::take(&mut self.buf));
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkerPool;
    use std::sync::mpsc;

    #[test]
    fn acquire_write_read() {
        let pool = PartitionPool::new(64);
        let mut part = pool.acquire();
        assert!(part.capacity() >= 64);
        assert!(part.is_empty());

        part.write_all(b"hello world").unwrap();
        assert_eq!(part.len(), 11);

        let mut head = [0u8; 5];
        part.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"hello");
        assert_eq!(part.unread(), b" world");

        let mut rest = Vec::new();
        part.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b" world");
        assert!(part.is_empty());
    }

    #[test]
    fn write_at_overwrites_within_bounds() {
        let pool = PartitionPool::new(0);
        let mut part = pool.acquire();
        part.write_all(b"abcdef").unwrap();

        assert_eq!(part.write_at(b"XY", 2).unwrap(), 2);
        assert_eq!(part.unread(), b"abXYef");
        assert_eq!(part.write_at(b"", 6).unwrap(), 0);

        let err = part.write_at(b"Z", 7).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        let err = part.write_at(b"long", 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(part.unread(), b"abXYef");
    }

    #[test]
    fn write_at_is_relative_to_unread_bytes() {
        let pool = PartitionPool::new(0);
        let mut part = pool.acquire();
        part.write_all(b"0123456789").unwrap();
        let mut skip = [0u8; 4];
        part.read_exact(&mut skip).unwrap();

        part.write_at(b"ab", 0).unwrap();
        assert_eq!(part.unread(), b"ab6789");
    }

    #[test]
    fn released_buffers_are_reused() {
        let pool = PartitionPool::new(128);
        let mut part = pool.acquire();
        part.write_all(&[7u8; 300]).unwrap();
        let grown = part.capacity();
        part.reset();
        assert_eq!(pool.idle(), 1);

        let again = pool.acquire();
        assert_eq!(pool.idle(), 0);
        assert!(again.is_empty());
        assert_eq!(again.capacity(), grown);

        drop(again);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn unread_leaves_partition_intact() {
        let pool = PartitionPool::new(16);
        let mut part = pool.acquire();
        part.write_all(b"payload").unwrap();

        assert_eq!(part.unread(), b"payload");
        assert_eq!(part.unread(), b"payload");
        assert_eq!(part.len(), 7);

        let mut out = String::new();
        part.read_to_string(&mut out).unwrap();
        assert_eq!(out, "payload");
        part.reset();
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn partitions_travel_into_jobs() {
        let buffers = PartitionPool::new(32);
        let workers = WorkerPool::new(2);
        let (tx, rx) = mpsc::channel();

        // all buffers are out before any job can release one
        let parts: Vec<Partition> = (0..4u8)
            .map(|i| {
                let mut part = buffers.acquire();
                part.write_all(&[i; 8]).unwrap();
                part
            })
            .collect();
        assert_eq!(buffers.idle(), 0);

        for part in parts {
            let tx = tx.clone();
            workers
                .submit(move || {
                    let sum: u32 = part.unread().iter().map(|b| u32::from(*b)).sum();
                    tx.send(sum).unwrap();
                    part.reset();
                })
                .unwrap();
        }
        drop(tx);
        workers.stop_and_wait();

        let mut sums: Vec<u32> = rx.iter().collect();
        sums.sort_unstable();
        assert_eq!(sums, vec![0, 8, 16, 24]);
        assert_eq!(buffers.idle(), 4);
    }

    #[test]
    fn jobs_recycle_released_buffers() {
        let buffers = PartitionPool::new(32);
        let workers = WorkerPool::new(2);

        for i in 0..16u8 {
            let mut part = buffers.acquire();
            part.write_all(&[i; 4]).unwrap();
            workers.submit(move || part.reset()).unwrap();
        }
        workers.stop_and_wait();

        let idle = buffers.idle();
        assert!((1..=16).contains(&idle), "idle = {idle}");
    }
}

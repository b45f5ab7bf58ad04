//! Pooled block allocator for node-record lists.
//!
//! Irregular cells are a small minority of any realistic grid, but every one
//! of them needs a heap-allocated record list. The [`Arena`] amortizes that
//! cost by shelving freed blocks keyed by their size class and handing them
//! back out on the next allocation of the same class, instead of round-trips
//! through the system allocator.
//!
//! The arena deliberately audits ownership: every outstanding block is
//! tracked, and freeing a block twice panics rather than silently corrupting
//! a shelf. Instrumentation (current/peak bytes) is compiled in only under
//! the `arena-stats` feature and never changes allocation behavior.

use std::alloc::{self, Layout, handle_alloc_error};
use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// A pooled allocator keyed by block size class.
///
/// Thread safety: all state sits behind a single mutex. This is not a
/// contention point — allocation happens only while the geometry pass
/// installs irregular cells.
pub struct Arena {
    inner: Mutex<Shelves>,
}

struct Shelves {
    /// Freed blocks by (size, align), ready for reuse. LIFO within a class.
    free: HashMap<(usize, usize), Vec<usize>>,
    /// Addresses of every block currently handed out. Catches double frees.
    live: HashSet<usize>,
    #[cfg(feature = "arena-stats")]
    bytes_in_use: usize,
    #[cfg(feature = "arena-stats")]
    peak_bytes: usize,
}

impl Arena {
    pub fn new() -> Self {
        Arena {
            inner: Mutex::new(Shelves {
                free: HashMap::new(),
                live: HashSet::new(),
                #[cfg(feature = "arena-stats")]
                bytes_in_use: 0,
                #[cfg(feature = "arena-stats")]
                peak_bytes: 0,
            }),
        }
    }

    /// Hand out a block for `layout`, reusing a shelved block of the same
    /// size class when one exists.
    ///
    /// Fails only on true host allocation failure, via
    /// [`std::alloc::handle_alloc_error`].
    ///
    /// # Panics
    /// Panics if `layout` has zero size.
    pub fn alloc(&self, layout: Layout) -> NonNull<u8> {
        assert!(layout.size() > 0, "arena cannot allocate zero-size blocks");
        let mut shelves = self.inner.lock();
        let addr = match shelves
            .free
            .get_mut(&(layout.size(), layout.align()))
            .and_then(Vec::pop)
        {
            Some(addr) => addr,
            None => {
                // Cold path: carve a fresh block from the system allocator.
                let ptr = unsafe { alloc::alloc(layout) };
                if ptr.is_null() {
                    handle_alloc_error(layout);
                }
                log::trace!(
                    "arena: new {}-byte block (align {})",
                    layout.size(),
                    layout.align()
                );
                ptr as usize
            }
        };
        let fresh = shelves.live.insert(addr);
        debug_assert!(fresh, "arena shelf handed out a live block");
        #[cfg(feature = "arena-stats")]
        {
            shelves.bytes_in_use += layout.size();
            shelves.peak_bytes = shelves.peak_bytes.max(shelves.bytes_in_use);
        }
        // Non-null: came from a successful alloc or a previously valid block.
        unsafe { NonNull::new_unchecked(addr as *mut u8) }
    }

    /// Return a block to its shelf.
    ///
    /// # Safety
    /// `ptr` must have come from [`Arena::alloc`] on this arena with the same
    /// `layout`, and its contents must already be dropped.
    ///
    /// # Panics
    /// Panics if the block is not currently live (a double free).
    pub unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        let addr = ptr.as_ptr() as usize;
        let mut shelves = self.inner.lock();
        assert!(
            shelves.live.remove(&addr),
            "arena: double free of {}-byte block at {addr:#x}",
            layout.size()
        );
        shelves
            .free
            .entry((layout.size(), layout.align()))
            .or_default()
            .push(addr);
        #[cfg(feature = "arena-stats")]
        {
            shelves.bytes_in_use -= layout.size();
        }
    }

    /// Bytes currently handed out (excludes shelved blocks).
    #[cfg(feature = "arena-stats")]
    pub fn bytes_in_use(&self) -> usize {
        self.inner.lock().bytes_in_use
    }

    /// High-water mark of [`Arena::bytes_in_use`].
    #[cfg(feature = "arena-stats")]
    pub fn peak_bytes(&self) -> usize {
        self.inner.lock().peak_bytes
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let shelves = self.inner.get_mut();
        for (&(size, align), blocks) in &shelves.free {
            // Shelved blocks hold no values; raw deallocation is enough.
            let layout = Layout::from_size_align(size, align).expect("shelf key was a valid layout");
            for &addr in blocks {
                unsafe { alloc::dealloc(addr as *mut u8, layout) };
            }
        }
        // Live blocks at this point are a caller leak; their memory is
        // intentionally left to the OS rather than freed under the caller.
    }
}

/// Process-wide arena backing every graph node's record list.
pub fn node_arena() -> &'static Arena {
    static NODE_ARENA: Lazy<Arena> = Lazy::new(Arena::new);
    &NODE_ARENA
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(n: usize) -> Layout {
        Layout::from_size_align(n, 8).unwrap()
    }

    #[test]
    fn freed_block_is_reused() {
        let arena = Arena::new();
        let a = arena.alloc(layout(64));
        unsafe { arena.free(a, layout(64)) };
        let b = arena.alloc(layout(64));
        assert_eq!(a, b);
        unsafe { arena.free(b, layout(64)) };
    }

    #[test]
    fn distinct_size_classes_do_not_mix() {
        let arena = Arena::new();
        let a = arena.alloc(layout(32));
        unsafe { arena.free(a, layout(32)) };
        let b = arena.alloc(layout(64));
        assert_ne!(a, b);
        unsafe { arena.free(b, layout(64)) };
    }

    #[test]
    fn double_free_panics() {
        let arena = Arena::new();
        let a = arena.alloc(layout(16));
        unsafe { arena.free(a, layout(16)) };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
            arena.free(a, layout(16))
        }));
        assert!(result.is_err());
    }

    #[test]
    fn concurrent_alloc_free() {
        use std::sync::Arc;
        let arena = Arc::new(Arena::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let arena = Arc::clone(&arena);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let p = arena.alloc(layout(48));
                        unsafe { arena.free(p, layout(48)) };
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[cfg(feature = "arena-stats")]
    #[test]
    fn stats_track_in_use_and_peak() {
        let arena = Arena::new();
        let a = arena.alloc(layout(128));
        let b = arena.alloc(layout(64));
        assert_eq!(arena.bytes_in_use(), 192);
        assert_eq!(arena.peak_bytes(), 192);
        unsafe { arena.free(a, layout(128)) };
        assert_eq!(arena.bytes_in_use(), 64);
        assert_eq!(arena.peak_bytes(), 192);
        unsafe { arena.free(b, layout(64)) };
        assert_eq!(arena.bytes_in_use(), 0);
        assert_eq!(arena.peak_bytes(), 192);
    }
}

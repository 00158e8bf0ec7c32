// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::trace;

use crate::errors::Result;

/// The number of entries a [`FrameCache`] reserves on its first insertion.
const INITIAL_CAPACITY: usize = 32;

/// Shared borrows of the three planes of a cached frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramePlanes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
}

struct CachedFrame {
    frame: u64,
    planes: [Vec<u8>; 3],
}

impl CachedFrame {
    fn len(&self) -> usize {
        self.planes.iter().map(Vec::len).sum()
    }
}

/// Copy `src` into `dst`, reusing the allocation of `dst` where possible.
fn replace_plane(dst: &mut Vec<u8>, src: &[u8]) -> Result<()> {
    dst.clear();
    dst.try_reserve_exact(src.len())?;
    dst.extend_from_slice(src);
    Ok(())
}

/// `FrameCache` is a byte-budgeted store of decoded planar video frames keyed by frame number.
///
/// Entries are kept in insertion order, and the oldest entries are evicted first once the bytes
/// held exceed the budget. The newest entry is never evicted, so a single frame larger than the
/// budget is still cached. Lookups scan the entries linearly.
pub struct FrameCache {
    frames: Vec<CachedFrame>,
    budget: usize,
    usage: usize,
}

impl FrameCache {
    /// Instantiate an empty `FrameCache` that holds at most `budget` bytes of planes.
    pub fn new(budget: usize) -> Self {
        FrameCache { frames: Vec::new(), budget, usage: 0 }
    }

    fn position(&self, frame: u64) -> Option<usize> {
        self.frames.iter().position(|entry| entry.frame == frame)
    }

    /// Store a copy of the planes of `frame`.
    ///
    /// If `frame` is already cached its planes are replaced and it becomes the newest entry. The
    /// oldest entries are then evicted until the budget is met. On an allocation failure the
    /// cache is left as it was.
    pub fn put(&mut self, frame: u64, y: &[u8], u: &[u8], v: &[u8]) -> Result<()> {
        if let Some(pos) = self.position(frame) {
            let mut planes = [Vec::new(), Vec::new(), Vec::new()];

            for (plane, src) in planes.iter_mut().zip([y, u, v]) {
                replace_plane(plane, src)?;
            }

            let mut entry = self.frames.remove(pos);

            self.usage -= entry.len();
            entry.planes = planes;
            self.usage += entry.len();

            self.frames.push(entry);
        }
        else {
            if self.frames.len() == self.frames.capacity() {
                let grow = self.frames.capacity().max(INITIAL_CAPACITY);
                self.frames.try_reserve_exact(grow)?;
            }

            let mut entry = CachedFrame { frame, planes: [Vec::new(), Vec::new(), Vec::new()] };

            for (plane, src) in entry.planes.iter_mut().zip([y, u, v]) {
                replace_plane(plane, src)?;
            }

            self.usage += entry.len();
            self.frames.push(entry);
        }

        self.evict();

        Ok(())
    }

    fn evict(&mut self) {
        while self.usage > self.budget && self.frames.len() > 1 {
            let entry = self.frames.remove(0);

            trace!("frame cache: evicted frame {} ({} bytes)", entry.frame, entry.len());

            self.usage -= entry.len();
        }
    }

    /// Get the planes of `frame` if it is cached.
    pub fn get(&self, frame: u64) -> Option<FramePlanes<'_>> {
        self.frames.iter().find(|entry| entry.frame == frame).map(|entry| FramePlanes {
            y: &entry.planes[0],
            u: &entry.planes[1],
            v: &entry.planes[2],
        })
    }

    /// Returns true if `frame` is cached.
    pub fn has(&self, frame: u64) -> bool {
        self.position(frame).is_some()
    }

    /// Set the budget in bytes. The budget is enforced on the next `put`.
    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// The total size in bytes of all cached planes.
    pub fn current_usage(&self) -> usize {
        self.usage
    }

    /// The number of cached frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every cached frame.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.usage = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::FrameCache;

    fn put_sized(cache: &mut FrameCache, frame: u64, len: usize) {
        let byte = frame as u8;
        let y = vec![byte; len / 2];
        let u = vec![byte; len / 4];
        let v = vec![byte; len - len / 2 - len / 4];
        cache.put(frame, &y, &u, &v).unwrap();
    }

    #[test]
    fn verify_put_then_get() {
        let mut cache = FrameCache::new(1 << 20);

        cache.put(7, &[1, 2, 3], &[4], &[5, 6]).unwrap();

        let planes = cache.get(7).unwrap();
        assert_eq!(planes.y, &[1, 2, 3]);
        assert_eq!(planes.u, &[4]);
        assert_eq!(planes.v, &[5, 6]);

        assert!(cache.get(8).is_none());
        assert_eq!(cache.current_usage(), 6);
    }

    #[test]
    fn verify_eviction_keeps_newest() {
        let mut cache = FrameCache::new(3 * 100);

        for frame in 0..10 {
            put_sized(&mut cache, frame, 100);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.current_usage(), 300);

        for frame in 0..7 {
            assert!(!cache.has(frame));
        }
        for frame in 7..10 {
            assert!(cache.has(frame));
        }
    }

    #[test]
    fn verify_budget_enforced_on_next_put() {
        let mut cache = FrameCache::new(1000);

        put_sized(&mut cache, 0, 100);
        put_sized(&mut cache, 1, 100);

        cache.set_budget(150);
        assert_eq!(cache.current_usage(), 200);

        put_sized(&mut cache, 2, 100);

        assert!(!cache.has(0));
        assert!(!cache.has(1));
        assert!(cache.has(2));
        assert_eq!(cache.current_usage(), 100);
    }

    #[test]
    fn verify_oversized_frame_is_kept() {
        let mut cache = FrameCache::new(10);

        put_sized(&mut cache, 0, 100);
        assert!(cache.has(0));

        put_sized(&mut cache, 1, 100);
        assert!(!cache.has(0));
        assert!(cache.has(1));
        assert_eq!(cache.current_usage(), 100);
    }

    #[test]
    fn verify_reput_refreshes_recency() {
        let mut cache = FrameCache::new(200);

        put_sized(&mut cache, 0, 100);
        put_sized(&mut cache, 1, 100);

        cache.put(0, &[9; 50], &[9; 25], &[9; 25]).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_usage(), 200);

        put_sized(&mut cache, 2, 100);

        assert!(cache.has(0));
        assert!(!cache.has(1));
        assert!(cache.has(2));
        assert_eq!(cache.get(0).unwrap().y, &[9; 50][..]);
    }

    #[test]
    fn verify_growth_past_initial_capacity() {
        let mut cache = FrameCache::new(usize::MAX);

        for frame in 0..100 {
            put_sized(&mut cache, frame, 4);
        }

        assert_eq!(cache.len(), 100);
        assert_eq!(cache.current_usage(), 400);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.current_usage(), 0);
    }
}

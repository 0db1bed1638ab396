//! Shared-memory buffer pooling.
//!
//! A pool maps a client-supplied file descriptor and hands out buffer
//! descriptors that are plain views (offset/width/height/stride/format) into
//! the mapping. Validation of a view against the mapping happens at copy
//! time, not at creation time. Destroy is deferred while buffers are
//! outstanding.

use std::fs::File;
use std::os::fd::OwnedFd;

use memmap2::{Mmap, MmapOptions};

use crate::core::objects::ObjectId;
use crate::prelude::*;
use crate::util::logging;
use crate::wlog;

/// Buffer pixel formats the server accepts (argb8888 / xrgb8888 wire values).
pub const FORMAT_ARGB8888: u32 = 0;
pub const FORMAT_XRGB8888: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    /// Mapping released; all operations no-op.
    Destroyed,
    /// Mapping live.
    Mapped,
    /// Destroy requested while buffers were outstanding; unmap happens when
    /// the last buffer is removed.
    DestroyPending,
}

/// A view into the pool mapping. Never validated at creation.
#[derive(Debug, Clone, Copy)]
pub struct BufferRecord {
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub format: u32,
}

#[derive(Debug)]
pub struct ShmPool {
    pub pool_id: ObjectId,
    pub state: MapState,
    pub buffers: HashMap<ObjectId, BufferRecord>,
    file: Option<File>,
    mapping: Option<Mmap>,
}

impl ShmPool {
    /// Map `size` bytes of `fd`. A mapping failure leaves the pool in
    /// `Destroyed` state; later buffer creation and copies fail safely.
    pub fn new(pool_id: ObjectId, fd: OwnedFd, size: i32) -> Self {
        let file = File::from(fd);
        let mut pool = Self {
            pool_id,
            state: MapState::Destroyed,
            buffers: HashMap::new(),
            file: None,
            mapping: None,
        };

        if size <= 0 {
            wlog!(logging::SHM, "pool {}: non-positive size {}", pool_id, size);
            return pool;
        }
        match map(&file, size as usize) {
            Ok(mapping) => {
                pool.state = MapState::Mapped;
                pool.mapping = Some(mapping);
                pool.file = Some(file);
            }
            Err(e) => {
                wlog!(logging::SHM, "pool {}: mmap failed: {}", pool_id, e);
            }
        }
        pool
    }

    pub fn create_buffer(&mut self, buffer_id: ObjectId, record: BufferRecord) {
        self.buffers.insert(buffer_id, record);
    }

    /// Client asked to destroy the pool. Unmaps immediately when no buffers
    /// are outstanding, otherwise defers until the last buffer goes.
    pub fn request_destroy(&mut self) {
        match self.state {
            MapState::Destroyed | MapState::DestroyPending => {}
            MapState::Mapped => {
                if self.buffers.is_empty() {
                    self.release();
                } else {
                    self.state = MapState::DestroyPending;
                }
            }
        }
    }

    /// Remove one buffer descriptor, completing a deferred destroy when it
    /// was the last one. Returns false if the buffer was unknown.
    pub fn remove_buffer(&mut self, buffer_id: ObjectId) -> bool {
        if self.buffers.remove(&buffer_id).is_none() {
            wlog!(
                logging::SHM,
                "pool {}: destroying unknown buffer {}",
                self.pool_id,
                buffer_id
            );
            return false;
        }
        if self.state == MapState::DestroyPending && self.buffers.is_empty() {
            self.release();
        }
        true
    }

    /// Re-map at a new size. On failure the pool degrades to `Destroyed`;
    /// commits against its buffers must then no-op rather than fault.
    pub fn resize(&mut self, size: i32) {
        match self.state {
            MapState::Destroyed => {}
            MapState::Mapped | MapState::DestroyPending => {
                let Some(file) = self.file.as_ref() else {
                    return;
                };
                if size <= 0 {
                    wlog!(logging::SHM, "pool {}: resize to {} refused", self.pool_id, size);
                    return;
                }
                match map(file, size as usize) {
                    Ok(mapping) => self.mapping = Some(mapping),
                    Err(e) => {
                        wlog!(logging::SHM, "pool {}: remap failed: {}", self.pool_id, e);
                        self.release();
                    }
                }
            }
        }
    }

    /// The mapped bytes, when the mapping is live.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self.state {
            MapState::Destroyed => None,
            MapState::Mapped | MapState::DestroyPending => self.mapping.as_deref(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.state == MapState::Destroyed && self.mapping.is_none()
    }

    fn release(&mut self) {
        self.mapping = None;
        self.file = None;
        self.state = MapState::Destroyed;
    }
}

fn map(file: &File, len: usize) -> std::io::Result<Mmap> {
    // The mapping is read-only; the server only ever copies out of it.
    unsafe { MmapOptions::new().len(len).map(file) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testfd::memfd_of_len;

    fn record() -> BufferRecord {
        BufferRecord {
            offset: 0,
            width: 4,
            height: 4,
            stride: 16,
            format: FORMAT_ARGB8888,
        }
    }

    #[test]
    fn maps_and_exposes_bytes() {
        let fd = memfd_of_len(4096);
        let pool = ShmPool::new(ObjectId::new(1), fd, 4096);
        assert_eq!(pool.state, MapState::Mapped);
        assert_eq!(pool.bytes().unwrap().len(), 4096);
    }

    #[test]
    fn deferred_destroy_waits_for_last_buffer() {
        let fd = memfd_of_len(4096);
        let mut pool = ShmPool::new(ObjectId::new(1), fd, 4096);
        pool.create_buffer(ObjectId::new(10), record());
        pool.create_buffer(ObjectId::new(11), record());

        pool.request_destroy();
        assert_eq!(pool.state, MapState::DestroyPending);
        assert!(pool.bytes().is_some(), "mapping must survive destroy request");

        assert!(pool.remove_buffer(ObjectId::new(10)));
        assert_eq!(pool.state, MapState::DestroyPending);
        assert!(!pool.is_released());

        assert!(pool.remove_buffer(ObjectId::new(11)));
        assert!(pool.is_released());
        assert!(pool.bytes().is_none());
    }

    #[test]
    fn immediate_destroy_without_buffers() {
        let fd = memfd_of_len(4096);
        let mut pool = ShmPool::new(ObjectId::new(1), fd, 4096);
        pool.request_destroy();
        assert!(pool.is_released());
    }

    #[test]
    fn resize_keeps_pool_usable() {
        let fd = memfd_of_len(8192);
        let mut pool = ShmPool::new(ObjectId::new(1), fd, 4096);
        pool.resize(8192);
        assert_eq!(pool.state, MapState::Mapped);
        assert_eq!(pool.bytes().unwrap().len(), 8192);
    }

    #[test]
    fn unknown_buffer_destroy_is_tolerated() {
        let fd = memfd_of_len(4096);
        let mut pool = ShmPool::new(ObjectId::new(1), fd, 4096);
        assert!(!pool.remove_buffer(ObjectId::new(99)));
        assert_eq!(pool.state, MapState::Mapped);
    }
}

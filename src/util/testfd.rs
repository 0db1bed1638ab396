//! Test helper: anonymous memory-backed file descriptors.

use std::fs::File;
use std::io::Write;
use std::os::fd::OwnedFd;

use rustix::fs::{memfd_create, MemfdFlags};

/// A memfd truncated to `len` zero bytes.
pub fn memfd_of_len(len: u64) -> OwnedFd {
    let fd = memfd_create("termwl-test", MemfdFlags::CLOEXEC).expect("memfd_create");
    let file = File::from(fd);
    file.set_len(len).expect("set_len");
    file.into()
}

/// A memfd holding exactly `bytes`.
pub fn memfd_with_bytes(bytes: &[u8]) -> OwnedFd {
    let fd = memfd_create("termwl-test", MemfdFlags::CLOEXEC).expect("memfd_create");
    let mut file = File::from(fd);
    file.write_all(bytes).expect("write");
    file.into()
}

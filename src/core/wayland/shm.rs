//! wl_shm, wl_shm_pool, wl_buffer: shared-memory plumbing.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::core::shm::{BufferRecord, ShmPool};
use crate::core::state::ClientState;
use crate::core::wire::{ArgReader, Message};
use crate::util::logging::SHM;
use crate::wlog;

const SHM_CREATE_POOL: u16 = 0;
const SHM_RELEASE: u16 = 1;

const POOL_CREATE_BUFFER: u16 = 0;
const POOL_DESTROY: u16 = 1;
const POOL_RESIZE: u16 = 2;

const BUFFER_DESTROY: u16 = 0;

/// wl_shm.error.invalid_fd
const ERR_INVALID_FD: u32 = 2;

pub fn handle_shm(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        SHM_CREATE_POOL => {
            let id = args.new_id();
            let size = args.i32();
            // The descriptor rides out of band; its absence is the
            // client's violation, reported, never waited for.
            let Some(fd) = state.claim_fd() else {
                state.send_error(msg.object_id, ERR_INVALID_FD, "create_pool without an fd");
                return;
            };
            wlog!(SHM, "create pool {} of {} bytes", id, size);
            state.add_object(id, ProtocolObject::ShmPool);
            state.pools.insert(id, ShmPool::new(id, fd, size));
        }
        SHM_RELEASE => {
            state.destroy_object(msg.object_id);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Shm),
    }
}

pub fn handle_pool(state: &mut ClientState, msg: &Message) {
    let pool_id = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        POOL_CREATE_BUFFER => {
            let id = args.new_id();
            let record = BufferRecord {
                offset: args.i32(),
                width: args.i32(),
                height: args.i32(),
                stride: args.i32(),
                format: args.u32(),
            };
            state.add_object(id, ProtocolObject::Buffer { pool: pool_id });
            if let Some(pool) = state.pools.get_mut(&pool_id) {
                pool.create_buffer(id, record);
            }
        }
        POOL_DESTROY => {
            let released = match state.pools.get_mut(&pool_id) {
                Some(pool) => {
                    pool.request_destroy();
                    pool.is_released()
                }
                None => false,
            };
            if released {
                state.pools.remove(&pool_id);
            }
            state.destroy_object(pool_id);
        }
        POOL_RESIZE => {
            let size = args.i32();
            if let Some(pool) = state.pools.get_mut(&pool_id) {
                pool.resize(size);
            }
        }
        _ => super::unhandled(state, msg, &ProtocolObject::ShmPool),
    }
}

pub fn handle_buffer(state: &mut ClientState, msg: &Message, pool_id: ObjectId) {
    match msg.opcode {
        BUFFER_DESTROY => {
            let released = match state.pools.get_mut(&pool_id) {
                Some(pool) => {
                    pool.remove_buffer(msg.object_id);
                    pool.is_released()
                }
                None => false,
            };
            if released {
                state.pools.remove(&pool_id);
            }
            state.destroy_object(msg.object_id);
        }
        _ => super::unhandled(state, msg, &ProtocolObject::Buffer { pool: pool_id }),
    }
}

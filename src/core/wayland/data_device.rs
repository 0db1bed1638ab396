//! wl_data_device_manager, wl_data_device, wl_data_source.
//!
//! Selection and drag bookkeeping only: mime types and actions are
//! recorded so probing clients behave, but no transfer plumbing exists.

use crate::core::objects::ProtocolObject;
use crate::core::state::{ClientState, DataSourceRecord};
use crate::core::wire::{ArgReader, Message};
use crate::util::logging::SEAT;
use crate::wlog;

const MGR_CREATE_DATA_SOURCE: u16 = 0;
const MGR_GET_DATA_DEVICE: u16 = 1;

const SOURCE_OFFER: u16 = 0;
const SOURCE_DESTROY: u16 = 1;
const SOURCE_SET_ACTIONS: u16 = 2;

const DEVICE_START_DRAG: u16 = 0;
const DEVICE_SET_SELECTION: u16 = 1;
const DEVICE_RELEASE: u16 = 2;

pub fn handle_manager(state: &mut ClientState, msg: &Message) {
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        MGR_CREATE_DATA_SOURCE => {
            let id = args.new_id();
            state.add_object(id, ProtocolObject::DataSource);
            state.data_sources.insert(id, DataSourceRecord::default());
        }
        MGR_GET_DATA_DEVICE => {
            let id = args.new_id();
            let seat = args.new_id();
            state.add_object(id, ProtocolObject::DataDevice { seat });
        }
        _ => super::unhandled(state, msg, &ProtocolObject::DataDeviceManager),
    }
}

pub fn handle_source(state: &mut ClientState, msg: &Message) {
    let id = msg.object_id;
    let mut args = ArgReader::new(&msg.data);
    match msg.opcode {
        SOURCE_OFFER => {
            let mime = args.string();
            if let Some(source) = state.data_sources.get_mut(&id) {
                source.mime_types.push(mime);
            }
        }
        SOURCE_DESTROY => {
            state.data_sources.remove(&id);
            state.destroy_object(id);
        }
        SOURCE_SET_ACTIONS => {
            let actions = args.u32();
            if let Some(source) = state.data_sources.get_mut(&id) {
                source.actions = actions;
            }
        }
        _ => super::unhandled(state, msg, &ProtocolObject::DataSource),
    }
}

pub fn handle_device(state: &mut ClientState, msg: &Message) {
    match msg.opcode {
        DEVICE_START_DRAG => {
            wlog!(SEAT, "drag from device {} ignored", msg.object_id);
        }
        DEVICE_SET_SELECTION => {
            let mut args = ArgReader::new(&msg.data);
            let source = args.object();
            wlog!(
                SEAT,
                "selection on device {} from source {:?}",
                msg.object_id,
                source
            );
        }
        DEVICE_RELEASE => state.destroy_object(msg.object_id),
        _ => {
            let object = state
                .get_object(msg.object_id)
                .unwrap_or(ProtocolObject::DataDeviceManager);
            super::unhandled(state, msg, &object);
        }
    }
}

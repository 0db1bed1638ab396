//! Global capability advertisement and per-connection bind bookkeeping.
//!
//! Globals are process-wide: a fixed numeric name, an interface string, and
//! a maximum supported version, advertised once per registry. Binds are
//! connection-scoped and live only as long as the bound object.

use crate::core::objects::{ObjectId, ProtocolObject};
use crate::prelude::*;

/// Fixed numeric identifiers for advertised globals. Chosen high so they
/// never collide with live client-allocated object ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(pub u32);

pub const GLOBAL_DISPLAY: GlobalId = GlobalId(1);
pub const GLOBAL_COMPOSITOR: GlobalId = GlobalId(0x0ff0_0000);
pub const GLOBAL_SUBCOMPOSITOR: GlobalId = GlobalId(0x0ff0_0001);
pub const GLOBAL_OUTPUT: GlobalId = GlobalId(0x0ff0_0002);
pub const GLOBAL_SEAT: GlobalId = GlobalId(0x0ff0_0003);
pub const GLOBAL_SHM: GlobalId = GlobalId(0x0ff0_0004);
pub const GLOBAL_WM_BASE: GlobalId = GlobalId(0x0ff0_0005);
pub const GLOBAL_DATA_DEVICE_MANAGER: GlobalId = GlobalId(0x0ff0_0006);
pub const GLOBAL_KEYBOARD: GlobalId = GlobalId(0x0ff0_0007);
pub const GLOBAL_POINTER: GlobalId = GlobalId(0x0ff0_0008);
pub const GLOBAL_KEYBOARD_GRAB_MANAGER: GlobalId = GlobalId(0x0ff0_0009);
pub const GLOBAL_XWAYLAND_SHELL: GlobalId = GlobalId(0x0ff0_0011);
pub const GLOBAL_TOUCH: GlobalId = GlobalId(0x0ff0_0013);
pub const GLOBAL_DECORATION_MANAGER: GlobalId = GlobalId(0x0ff0_0014);

/// One advertised global capability.
#[derive(Debug, Clone, Copy)]
pub struct AdvertisedGlobal {
    pub name: &'static str,
    pub id: GlobalId,
    pub version: u32,
}

/// The advertised set, emitted in this order for every registry a client
/// requests. Keyboard/pointer/touch/data-device entries are bind-table-only
/// broadcast sets, not advertised.
pub const ADVERTISED_GLOBALS: &[AdvertisedGlobal] = &[
    AdvertisedGlobal {
        name: "wl_compositor",
        id: GLOBAL_COMPOSITOR,
        version: 6,
    },
    // Some programs crash when wl_subcompositor is not advertised.
    AdvertisedGlobal {
        name: "wl_subcompositor",
        id: GLOBAL_SUBCOMPOSITOR,
        version: 1,
    },
    AdvertisedGlobal {
        name: "wl_output",
        id: GLOBAL_OUTPUT,
        version: 5,
    },
    AdvertisedGlobal {
        name: "wl_seat",
        id: GLOBAL_SEAT,
        version: 10,
    },
    AdvertisedGlobal {
        name: "wl_shm",
        id: GLOBAL_SHM,
        version: 2,
    },
    AdvertisedGlobal {
        name: "xdg_wm_base",
        id: GLOBAL_WM_BASE,
        version: 6,
    },
    AdvertisedGlobal {
        name: "wl_data_device_manager",
        id: GLOBAL_DATA_DEVICE_MANAGER,
        version: 3,
    },
    AdvertisedGlobal {
        name: "zxdg_decoration_manager_v1",
        id: GLOBAL_DECORATION_MANAGER,
        version: 1,
    },
    AdvertisedGlobal {
        name: "zwp_xwayland_keyboard_grab_manager_v1",
        id: GLOBAL_KEYBOARD_GRAB_MANAGER,
        version: 1,
    },
    AdvertisedGlobal {
        name: "xwayland_shell_v1",
        id: GLOBAL_XWAYLAND_SHELL,
        version: 1,
    },
];

/// Object kind represented by a given global id, used by registry lookups so
/// requests addressed to a global id resolve without a per-connection entry.
pub fn object_for_global(id: GlobalId) -> Option<ProtocolObject> {
    match id {
        GLOBAL_DISPLAY => Some(ProtocolObject::Display),
        GLOBAL_COMPOSITOR => Some(ProtocolObject::Compositor),
        GLOBAL_SUBCOMPOSITOR => Some(ProtocolObject::Subcompositor),
        GLOBAL_OUTPUT => Some(ProtocolObject::Output),
        GLOBAL_SEAT => Some(ProtocolObject::Seat),
        GLOBAL_SHM => Some(ProtocolObject::Shm),
        GLOBAL_WM_BASE => Some(ProtocolObject::WmBase),
        GLOBAL_DATA_DEVICE_MANAGER => Some(ProtocolObject::DataDeviceManager),
        GLOBAL_KEYBOARD_GRAB_MANAGER => Some(ProtocolObject::KeyboardGrabManager),
        GLOBAL_XWAYLAND_SHELL => Some(ProtocolObject::XwaylandShell),
        GLOBAL_DECORATION_MANAGER => Some(ProtocolObject::DecorationManager),
        _ => None,
    }
}

/// Per-connection record of which client object ids are bound to each
/// global capability, and at what negotiated version.
#[derive(Debug, Default)]
pub struct GlobalBinds {
    binds: HashMap<GlobalId, HashMap<ObjectId, u32>>,
}

impl GlobalBinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, global: GlobalId, object: ObjectId, version: u32) {
        self.binds.entry(global).or_default().insert(object, version);
    }

    pub fn unbind(&mut self, global: GlobalId, object: ObjectId) {
        if let Some(set) = self.binds.get_mut(&global) {
            set.remove(&object);
        }
    }

    /// Iterate (object id, version) pairs bound to `global`.
    pub fn bound(&self, global: GlobalId) -> impl Iterator<Item = (ObjectId, u32)> + '_ {
        self.binds
            .get(&global)
            .into_iter()
            .flat_map(|set| set.iter().map(|(id, v)| (*id, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_unbind_round_trip() {
        let mut binds = GlobalBinds::new();
        binds.bind(GLOBAL_POINTER, ObjectId::new(4), 7);
        binds.bind(GLOBAL_POINTER, ObjectId::new(5), 8);

        let mut bound: Vec<_> = binds.bound(GLOBAL_POINTER).collect();
        bound.sort();
        assert_eq!(bound, vec![(ObjectId::new(4), 7), (ObjectId::new(5), 8)]);

        binds.unbind(GLOBAL_POINTER, ObjectId::new(4));
        let bound: Vec<_> = binds.bound(GLOBAL_POINTER).collect();
        assert_eq!(bound, vec![(ObjectId::new(5), 8)]);
    }

    #[test]
    fn unknown_global_has_no_binds() {
        let binds = GlobalBinds::new();
        assert_eq!(binds.bound(GLOBAL_SEAT).count(), 0);
    }

    #[test]
    fn advertised_globals_resolve_to_objects() {
        for g in ADVERTISED_GLOBALS {
            assert!(
                object_for_global(g.id).is_some(),
                "{} must resolve",
                g.name
            );
        }
    }
}

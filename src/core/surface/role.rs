//! Surface roles.
//!
//! A surface holds at most one role. The role *type* is chosen first (e.g.
//! by a get_toplevel-style request); the role *data* object may come and go
//! independently. A surface whose role has no data is role-pending: the
//! type sticks, but the surface behaves as inert until a new data object is
//! created for it.

use crate::core::objects::ObjectId;
use crate::util::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorData {
    pub hotspot: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Cursor,
    Subsurface,
    Toplevel,
    Popup,
    Xwayland,
}

impl RoleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RoleKind::Cursor => "cursor",
            RoleKind::Subsurface => "subsurface",
            RoleKind::Toplevel => "toplevel",
            RoleKind::Popup => "popup",
            RoleKind::Xwayland => "xwayland",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    Cursor { data: Option<CursorData> },
    Subsurface { data: Option<ObjectId> },
    Toplevel { data: Option<ObjectId> },
    Popup { data: Option<ObjectId> },
    Xwayland { data: Option<ObjectId> },
}

impl SurfaceRole {
    pub fn kind(&self) -> RoleKind {
        match self {
            SurfaceRole::Cursor { .. } => RoleKind::Cursor,
            SurfaceRole::Subsurface { .. } => RoleKind::Subsurface,
            SurfaceRole::Toplevel { .. } => RoleKind::Toplevel,
            SurfaceRole::Popup { .. } => RoleKind::Popup,
            SurfaceRole::Xwayland { .. } => RoleKind::Xwayland,
        }
    }

    pub fn has_data(&self) -> bool {
        match self {
            SurfaceRole::Cursor { data } => data.is_some(),
            SurfaceRole::Subsurface { data }
            | SurfaceRole::Toplevel { data }
            | SurfaceRole::Popup { data }
            | SurfaceRole::Xwayland { data } => data.is_some(),
        }
    }

    pub fn clear_data(&mut self) {
        match self {
            SurfaceRole::Cursor { data } => *data = None,
            SurfaceRole::Subsurface { data }
            | SurfaceRole::Toplevel { data }
            | SurfaceRole::Popup { data }
            | SurfaceRole::Xwayland { data } => *data = None,
        }
    }

    /// The role-data object id, for roles whose data is an object.
    pub fn data_object(&self) -> Option<ObjectId> {
        match self {
            SurfaceRole::Cursor { .. } => None,
            SurfaceRole::Subsurface { data }
            | SurfaceRole::Toplevel { data }
            | SurfaceRole::Popup { data }
            | SurfaceRole::Xwayland { data } => *data,
        }
    }
}

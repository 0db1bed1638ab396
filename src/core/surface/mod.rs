pub mod commit;
pub mod damage;
pub mod role;
pub mod surface;

pub use commit::{fold_pending, CommitOutcome};
pub use damage::DamageRegion;
pub use role::{CursorData, RoleKind, SurfaceRole};
pub use surface::{
    ChildPosition, PendingState, Position, Surface, Texture, ZOrderDirection, ZOrderOp,
};

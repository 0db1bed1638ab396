//! Common imports and types used throughout termwl.

pub use std::collections::{HashMap, HashSet, VecDeque};
pub use std::sync::{Arc, RwLock};

pub type Result<T> = std::result::Result<T, crate::core::errors::CoreError>;

pub mod scene;

pub use scene::{SceneSnapshot, SceneSurface, SharedScene};

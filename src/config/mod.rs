//! Configuration: XDG-style path resolution and persisted user settings

pub mod paths;
pub mod settings;

pub use paths::CirclePaths;
pub use settings::Settings;

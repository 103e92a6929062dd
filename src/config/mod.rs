//! Configuration: API endpoint, execution timing and metadata caching.

mod settings;

pub use settings::{
    expand_env_vars, ApiSettings, ExecutionSettings, MetadataSettings, Settings, SettingsError,
};

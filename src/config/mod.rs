//! Configuration: types, default locations, XML loading and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor,
    CONFIG_ENV,
};
pub use types::{Config, LogLevel};
pub use xml::{create_template_config, load_config_from_xml_path, load_or_init, LoadResult};

pub const SQLCMD_DEFAULT: &str = "sqlcmd";
pub const LOGIN_TIMEOUT_DEFAULT: u32 = 15;
/// sqlcmd rejects `-l` values outside 1..=65534.
pub const LOGIN_TIMEOUT_MAX: u32 = 65534;

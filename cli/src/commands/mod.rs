pub mod account;
pub mod files;
pub mod helpers;
pub mod share;

/// Global context passed to all commands
pub struct Context {
    pub json_output: bool,
    pub server_override: Option<String>,
    pub data_dir_override: Option<String>,
}

//! Default value functions for serde.

pub(crate) fn default_name() -> String {
    "zapbot".to_string()
}
pub(crate) fn default_data_dir() -> String {
    ".".to_string()
}
pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
pub(crate) fn default_max_message_length() -> usize {
    4000
}
pub(crate) fn default_rate_limit_window_secs() -> u64 {
    60
}
pub(crate) fn default_rate_limit_max() -> u32 {
    5
}
pub(crate) fn default_stats_dir() -> String {
    "./data".to_string()
}
pub(crate) fn default_flush_every() -> u64 {
    10
}
pub(crate) fn default_save_interval_secs() -> u64 {
    300
}
pub(crate) fn default_context_size() -> usize {
    crate::context::DEFAULT_CONTEXT_SIZE
}
pub(crate) fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}
pub(crate) fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
pub(crate) fn default_temperature() -> f32 {
    0.7
}
pub(crate) fn default_graph_api_version() -> String {
    "v18.0".to_string()
}
pub(crate) fn default_api_host() -> String {
    "0.0.0.0".to_string()
}
pub(crate) fn default_api_port() -> u16 {
    8080
}

//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Tessera Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[bridge]
# transport = "tcp"              # tcp | uds
# renderer_path = "/usr/local/bin/tessera-renderer"
# handshake_timeout_ms = 10000   # 100-120000
# keepalive_interval_secs = 10   # 1-300
# keepalive_timeout_secs = 30    # 2-600, must exceed the interval
# max_message_bytes = 104857600
# call_timeout_secs = 30         # 1-600

[launcher]
# title = "Tessera"
# width = 540
# height = 960
# fixed_size = false
# portrait_columns = 4           # 1-12
# landscape_columns = 6          # 1-12
# rows_per_page = 5              # 1-20

[logging]
# level = "info"                 # trace | debug | info | warn | error
"##
    .to_string()
}

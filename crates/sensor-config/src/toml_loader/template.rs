//! Default TOML config template with inline documentation comments.

/// Default TOML config content with comments.
pub fn default_config_toml() -> &'static str {
    r##"# sensor-relay configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# PORT, INFLUXDB_URL, INFLUXDB_TOKEN, INFLUXDB_ORG and INFLUXDB_BUCKET
# from the environment (or a .env file) take precedence over this file.

[server]
# bind = "0.0.0.0"
# port = 3001
# static_dir = "public"

[influxdb]
# url = "https://us-east-1-1.aws.cloud2.influxdata.com"
# token = ""
# org = ""
# bucket = "sensor_data"
# measurement = "wifi_status"
# field = "random"
# query_timeout_secs = 30     # 1-600

[relay]
# queue_capacity = 256        # 1-65536
# max_connections = 0         # 0 = unlimited
# write_timeout_secs = 10     # 1-300

[logging]
# level = "info"              # trace, debug, info, warn, error
"##
}

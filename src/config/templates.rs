//! Starter files written by the `targets` and `config` commands.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Example targets file. Entries are used in round-robin order.
pub const TARGETS_TEMPLATE: &str = r#"{
  "targets": [
    "https://localhost:8700",
    "https://localhost:8701",
    "https://localhost:8702",
    "https://localhost:8703"
  ]
}
"#;

/// Example configuration file listing every section with its default.
pub const CONFIG_TEMPLATE: &str = r#"# rotary-proxy configuration

# Backend base URLs. Leave empty to read `targets_file` instead.
targets = []
targets_file = "targets.json"

[listener]
bind_address = "0.0.0.0:7500"

[listener.tls]
mode = "off"
# mode = "on"
# cert_path = "./server.pem"
# key_path = "./server-key.pem"

[upstream]
# "insecure" accepts any certificate presented by a target.
# Use "verify" wherever targets carry trusted certificates.
tls = "insecure"
max_redirects = 10
connect_timeout_secs = 10

[timeouts]
request_secs = 60

[rate_limit]
enabled = false
requests_per_second = 50000
burst_size = 50000

[security]
cors_enabled = false

[observability]
log_level = "info"
log_format = "full"
tracing = "off"
metrics_enabled = false
metrics_address = "0.0.0.0:9090"

[logging.output]
mode = "stdout"
# mode = "file"
# path = "rotary-proxy.log"
# truncate_interval_mins = 2

[lifecycle]
shutdown_grace_secs = 30
"#;

/// Write `contents` to `path`. An existing file is only replaced when `force` is set.
pub fn write_template(path: &Path, contents: &str, force: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    tracing::info!(path = %path.display(), "Template written");
    Ok(())
}

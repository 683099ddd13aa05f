//! Listening address for a service: `--host`/`--port` flags with `HOST`/`PORT` env fallback.

use clap::Args;

pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Args, Clone, Debug, Default)]
pub struct ServerArgs {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Port to listen on. Each service has its own default.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

impl ServerArgs {
    pub fn host_port(&self, default_port: u16) -> (String, u16) {
        let host = if self.host.is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            self.host.clone()
        };
        (host, self.port.unwrap_or(default_port))
    }
}

/// Server-wide limits and defaults, mirroring the C++ reference's
/// `ServerConfig` (`library/http/http_server_config.h`) — same fields,
/// same defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub max_header_bytes: usize,
    pub max_header_lines: usize,
    pub max_start_line: usize,
    pub max_body_bytes: u64,
    pub read_block: usize,
    pub default_keep_alive_http11: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_header_bytes: 64 * 1024,
            max_header_lines: 200,
            max_start_line: 4096,
            max_body_bytes: 16 * 1024 * 1024,
            read_block: 4096,
            default_keep_alive_http11: true,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder { config: Config::default() }
    }
}

/// Fluent builder mirroring the original's `ServerConfigBuilder`.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn max_header_bytes(mut self, value: usize) -> Self {
        self.config.max_header_bytes = value;
        self
    }

    pub fn max_header_lines(mut self, value: usize) -> Self {
        self.config.max_header_lines = value;
        self
    }

    pub fn max_start_line(mut self, value: usize) -> Self {
        self.config.max_start_line = value;
        self
    }

    pub fn max_body_bytes(mut self, value: u64) -> Self {
        self.config.max_body_bytes = value;
        self
    }

    pub fn read_block(mut self, value: usize) -> Self {
        self.config.read_block = value;
        self
    }

    pub fn default_keep_alive_http11(mut self, value: bool) -> Self {
        self.config.default_keep_alive_http11 = value;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

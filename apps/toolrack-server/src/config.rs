use std::net::{IpAddr, SocketAddr};

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub tools_base: String,
    pub widgets_base: String,
    pub observability: bool,
    pub timeline_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new("127.0.0.1".parse().expect("loopback addr"), 8091),
            tools_base: "/v1/tools".into(),
            widgets_base: "/v1/widgets".into(),
            observability: true,
            timeline_capacity: toolrack_widgets::timeline::DEFAULT_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        if let Ok(bind) = std::env::var("TOOLRACK_BIND") {
            let ip: IpAddr = bind
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid TOOLRACK_BIND address: {bind}"))?;
            cfg.addr.set_ip(ip);
        }
        if let Ok(port) = std::env::var("TOOLRACK_PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid TOOLRACK_PORT: {port}"))?;
            cfg.addr.set_port(port);
        }
        if let Ok(base) = std::env::var("TOOLRACK_TOOLS_BASE") {
            cfg.tools_base = normalize_base(&base);
        }
        if let Ok(base) = std::env::var("TOOLRACK_WIDGETS_BASE") {
            cfg.widgets_base = normalize_base(&base);
        }
        if std::env::var("TOOLRACK_OBSERVABILITY").ok().as_deref() == Some("0") {
            cfg.observability = false;
        }
        if let Ok(capacity) = std::env::var("TOOLRACK_TIMELINE_CAPACITY") {
            cfg.timeline_capacity = capacity
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid TOOLRACK_TIMELINE_CAPACITY: {capacity}"))?;
        }
        Ok(cfg)
    }
}

fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.tools_base, "/v1/tools");
        assert_eq!(cfg.widgets_base, "/v1/widgets");
        assert!(cfg.observability);
        assert_eq!(cfg.timeline_capacity, 1000);
    }

    #[test]
    fn base_paths_are_normalized() {
        assert_eq!(normalize_base("v1/tools/"), "/v1/tools");
        assert_eq!(normalize_base("/api/"), "/api");
    }
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9000);
pub const DEFAULT_ROUTE: &str = "/hooks/github-push";
pub const HEALTH_ROUTE: &str = "/health";
pub const DEFAULT_CONFIG_FILE: &str = "hooks.json";

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Body of every accepted delivery.
pub const ACK_BODY: &str = "Pong";
pub const DEPLOY_FAILED_BODY: &str = "Deployment failed";

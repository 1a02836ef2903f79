pub(crate) const DEFAULT_USER_AGENT: &str = concat!("trafficgen/", env!("CARGO_PKG_VERSION"));

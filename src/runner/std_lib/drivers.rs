//! Storage drivers known to the host.

lazy_static! {
    static ref AVAILABLE_DRIVERS: Vec<&'static str> = vec!["mysql", "pgsql", "sqlite"];
}

/// Names of the storage drivers this process can use, in a fixed order.
pub fn available_drivers() -> Vec<&'static str> {
    AVAILABLE_DRIVERS.clone()
}

pub fn is_driver_available(name: &str) -> bool {
    AVAILABLE_DRIVERS
        .iter()
        .any(|driver| driver.eq_ignore_ascii_case(name))
}

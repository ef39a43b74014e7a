//! Port enumeration against the host system.

use std::collections::HashSet;

use crate::hardware::utils::{discover_available_ports, print_available_ports};

#[test]
#[ignore] // Requires hardware
fn test_port_discovery() {
    let ports = discover_available_ports();

    if ports.is_empty() {
        println!("⚠️  No ports found - skipping test");
        return;
    }

    print_available_ports();
    for port in &ports {
        assert!(!port.port.is_empty());
        assert!(!port.description.is_empty());
        assert!(
            port.hardware_id == "n/a" || port.hardware_id.starts_with("USB VID:PID="),
            "unexpected hardware id '{}'",
            port.hardware_id
        );
    }
}

#[test]
#[ignore] // Requires hardware
fn test_port_names_are_unique() {
    let ports = discover_available_ports();
    let names: HashSet<_> = ports.iter().map(|p| p.port.as_str()).collect();
    assert_eq!(names.len(), ports.len());
}

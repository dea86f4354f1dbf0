//! Port enumeration and auto-detection

/// List the system's serial device paths
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            log::warn!("Port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

/// Pick the most likely device port: prefer CDC-ACM and USB adapters, fall
/// back to the first enumerated port.
pub fn detect_port() -> Option<String> {
    let ports = available_ports();
    pick_port(&ports)
}

fn pick_port(ports: &[String]) -> Option<String> {
    ports
        .iter()
        .find(|p| p.contains("ACM") || p.contains("USB"))
        .or_else(|| ports.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_acm_and_usb_paths() {
        let ports = vec![
            "/dev/ttyS0".to_string(),
            "/dev/ttyUSB1".to_string(),
            "/dev/ttyACM0".to_string(),
        ];
        assert_eq!(pick_port(&ports).as_deref(), Some("/dev/ttyUSB1"));
    }

    #[test]
    fn falls_back_to_first_port() {
        let ports = vec!["/dev/ttyS0".to_string(), "/dev/ttyS1".to_string()];
        assert_eq!(pick_port(&ports).as_deref(), Some("/dev/ttyS0"));
        assert_eq!(pick_port(&[]), None);
    }
}

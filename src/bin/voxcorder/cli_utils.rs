use anyhow::Result;
use voxcorder::audio::{InputDevice, Recorder};

fn parse_test_devices(raw: &str) -> Vec<InputDevice> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .enumerate()
        .map(|(index, name)| InputDevice {
            index,
            name: name.to_string(),
        })
        .collect()
}

pub(crate) fn format_device_line(device: &InputDevice) -> String {
    format!("Dev#:  {} {}", device.index, device.name)
}

pub(crate) fn list_input_devices() -> Result<()> {
    // Support VOXCORDER_TEST_DEVICES for testing
    let devices = if let Ok(raw) = std::env::var("VOXCORDER_TEST_DEVICES") {
        parse_test_devices(&raw)
    } else {
        Recorder::list_devices().unwrap_or_else(|err| {
            eprintln!("Failed to list audio input devices: {err}");
            Vec::new()
        })
    };

    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Device Information:");
        for device in &devices {
            println!("{}", format_device_line(device));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devices_are_numbered_in_order() {
        let devices = parse_test_devices(" default , ,USB Mic,");
        assert_eq!(
            devices,
            vec![
                InputDevice {
                    index: 0,
                    name: "default".to_string()
                },
                InputDevice {
                    index: 1,
                    name: "USB Mic".to_string()
                },
            ]
        );
        assert!(parse_test_devices("  ").is_empty());
    }

    #[test]
    fn device_line_matches_listing_format() {
        let device = InputDevice {
            index: 2,
            name: "pulse".to_string(),
        };
        assert_eq!(format_device_line(&device), "Dev#:  2 pulse");
    }
}

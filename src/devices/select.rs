//! Device picking heuristics and input argument resolution.

use crate::devices::DeviceDescriptor;

/// Known virtual/loopback device names, checked for exact matches first.
/// Ordered by preference; vendors ship spacing variants of the same product.
pub const VIRTUAL_DEVICE_CANDIDATES: &[&str] = &[
    "CABLE Output (VB-Audio Virtual Cable)",
    "CABLE Output(VB-Audio Virtual Cable)",
    "VoiceMeeter Output (VB-Audio VoiceMeeter VAIO)",
    "VoiceMeeter Aux Output (VB-Audio VoiceMeeter AUX VAIO)",
    "VoiceMeeter VAIO3 Output (VB-Audio VoiceMeeter VAIO3)",
    "VoiceMeeter AUX VAIO Output (VB-Audio VoiceMeeter AUX VAIO)",
];

/// Vendor substrings that survive localization and renaming.
pub const VIRTUAL_DEVICE_KEYWORDS: &[&str] = &["vb-audio", "virtual cable", "voicemeeter"];

/// Picks a virtual/loopback device from the catalog.
///
/// Three phases, first hit wins: exact display-name match against the known
/// candidates, keyword match in the display name, keyword match in the
/// alternate name. Product names vary by vendor localization and spacing,
/// while the keyword substrings stay stable.
pub fn pick_virtual_audio(devices: &[DeviceDescriptor]) -> Option<&DeviceDescriptor> {
    for candidate in VIRTUAL_DEVICE_CANDIDATES {
        if let Some(device) = devices
            .iter()
            .find(|d| d.display_name.eq_ignore_ascii_case(candidate))
        {
            return Some(device);
        }
    }
    for device in devices {
        let name = device.display_name.to_lowercase();
        if VIRTUAL_DEVICE_KEYWORDS.iter().any(|k| name.contains(k)) {
            return Some(device);
        }
    }
    for device in devices {
        let alt = device.alternate_name.to_lowercase();
        if VIRTUAL_DEVICE_KEYWORDS.iter().any(|k| alt.contains(k)) {
            return Some(device);
        }
    }
    None
}

/// Builds the capture input argument for a device, preferring the stable
/// moniker over the locale-dependent display name. Returns `None` only when
/// both fields are empty.
pub fn device_input_arg(device: &DeviceDescriptor) -> Option<String> {
    let alt = device.alternate_name.trim();
    if !alt.is_empty() {
        return Some(format!("audio={alt}"));
    }
    let display = device.display_name.trim();
    if !display.is_empty() {
        return Some(format!("audio={display}"));
    }
    None
}

/// Finds a device by free-text target: exact display-name match, then
/// display-name substring, then exact or substring match on the alternate
/// name.
pub fn find_by_name<'a>(
    devices: &'a [DeviceDescriptor],
    target: &str,
) -> Option<&'a DeviceDescriptor> {
    let target = target.trim().to_lowercase();
    if target.is_empty() {
        return None;
    }
    if let Some(device) = devices
        .iter()
        .find(|d| d.display_name.to_lowercase() == target)
    {
        return Some(device);
    }
    if let Some(device) = devices
        .iter()
        .find(|d| d.display_name.to_lowercase().contains(&target))
    {
        return Some(device);
    }
    devices.iter().find(|d| {
        let alt = d.alternate_name.to_lowercase();
        alt == target || alt.contains(&target)
    })
}

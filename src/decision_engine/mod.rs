//! DecisionEngine - Status/Action Decision
//!
//! Pure mapping from a larva count to the device-facing status and action.
//! No I/O, no state.

use serde::{Deserialize, Serialize};

/// Device safety status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    Safe,
    Danger,
}

impl DeviceStatus {
    /// Wire string seen by the dashboard and the device
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Safe => "SAFE",
            DeviceStatus::Danger => "DANGER",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action the sensor device should take next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceAction {
    Sleep,
    Activate,
}

impl DeviceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceAction::Sleep => "SLEEP",
            DeviceAction::Activate => "ACTIVATE",
        }
    }
}

impl std::fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single job's decision outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub status: DeviceStatus,
    pub action: DeviceAction,
}

/// Any detected larva means danger
pub fn determine_status(total_larvae: u32) -> DeviceStatus {
    if total_larvae > 0 {
        DeviceStatus::Danger
    } else {
        DeviceStatus::Safe
    }
}

/// Danger activates the device, safe puts it back to sleep
pub fn determine_action(status: DeviceStatus) -> DeviceAction {
    match status {
        DeviceStatus::Danger => DeviceAction::Activate,
        DeviceStatus::Safe => DeviceAction::Sleep,
    }
}

/// Derive the full decision for a larva count
pub fn decide(total_larvae: u32) -> Decision {
    let status = determine_status(total_larvae);
    Decision {
        status,
        action: determine_action(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_danger_iff_larvae_present() {
        assert_eq!(determine_status(0), DeviceStatus::Safe);
        assert_eq!(determine_status(1), DeviceStatus::Danger);
        assert_eq!(determine_status(42), DeviceStatus::Danger);
    }

    #[test]
    fn action_follows_status() {
        assert_eq!(determine_action(DeviceStatus::Danger), DeviceAction::Activate);
        assert_eq!(determine_action(DeviceStatus::Safe), DeviceAction::Sleep);
    }

    #[test]
    fn decide_is_deterministic() {
        assert_eq!(decide(3), decide(3));
        let decision = decide(3);
        assert_eq!(decision.status, DeviceStatus::Danger);
        assert_eq!(decision.action, DeviceAction::Activate);
    }

    #[test]
    fn wire_strings() {
        assert_eq!(DeviceStatus::Danger.to_string(), "DANGER");
        assert_eq!(DeviceStatus::Safe.to_string(), "SAFE");
        assert_eq!(DeviceAction::Activate.to_string(), "ACTIVATE");
        assert_eq!(DeviceAction::Sleep.to_string(), "SLEEP");
    }
}

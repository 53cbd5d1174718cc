//! [`CommandGate`] – rejects commands the device cannot perform.
//!
//! Every [`Command`] maps to one or more [`RequiredFeature`]s.  The gate
//! checks them against the device's [`CapabilityProfile`] before the encoder
//! produces a single write, so an unsupported command is always surfaced as
//! [`RoboVacError::UnsupportedCommand`] and never silently dropped.
//!
//! | Command | Required features |
//! |---|---|
//! | `Locate` | `LOCATE` |
//! | `ReturnToBase` | `RETURN_HOME` |
//! | `Start` | `START` |
//! | `Pause` | `PAUSE` |
//! | `Stop` | `STOP` |
//! | `CleanSpot` | `CLEAN_SPOT` |
//! | `SetFanSpeed` | `FAN_SPEED` |
//! | `SendNamed` | `SEND_COMMAND` plus the named command's feature |

use robovac_types::{
    CapabilityProfile, Command, NamedCommand, RequiredFeature, RoboVacError, RoboVacFeature,
    VacuumFeature,
};

/// Extended feature a named command depends on, if any.
pub fn named_feature(named: NamedCommand) -> Option<RoboVacFeature> {
    match named {
        NamedCommand::EdgeClean => Some(RoboVacFeature::Edge),
        NamedCommand::SmallRoomClean => Some(RoboVacFeature::SmallRoom),
        NamedCommand::AutoClean => None,
        NamedCommand::AutoReturn => Some(RoboVacFeature::AutoReturn),
        NamedCommand::DoNotDisturb => Some(RoboVacFeature::DoNotDisturb),
        NamedCommand::BoostIq => Some(RoboVacFeature::BoostIq),
        NamedCommand::RoomClean => Some(RoboVacFeature::Room),
    }
}

/// Features `command` needs.
///
/// # Errors
///
/// [`RoboVacError::UnsupportedCommand`] for a `SendNamed` with an unknown
/// name.
pub fn required_features(command: &Command) -> Result<Vec<RequiredFeature>, RoboVacError> {
    let surface = |feature| vec![RequiredFeature::Surface(feature)];
    Ok(match command {
        Command::Locate => surface(VacuumFeature::Locate),
        Command::ReturnToBase => surface(VacuumFeature::ReturnHome),
        Command::Start => surface(VacuumFeature::Start),
        Command::Pause => surface(VacuumFeature::Pause),
        Command::Stop => surface(VacuumFeature::Stop),
        Command::CleanSpot => surface(VacuumFeature::CleanSpot),
        Command::SetFanSpeed(_) => surface(VacuumFeature::FanSpeed),
        Command::SendNamed { name, .. } => {
            let named: NamedCommand = name.parse()?;
            let mut required = surface(VacuumFeature::SendCommand);
            if let Some(feature) = named_feature(named) {
                required.push(RequiredFeature::Extended(feature));
            }
            required
        }
    })
}

/// Checks commands against one device's profile.
///
/// # Example
///
/// ```
/// use robovac_kernel::{CommandGate, resolve};
/// use robovac_types::Command;
///
/// let c_series = resolve(&"T2118".into());
/// let gate = CommandGate::new(&c_series);
///
/// assert!(gate.check(&Command::Start).is_ok());
/// assert!(gate.check(&Command::send("roomClean", Default::default())).is_err());
/// ```
pub struct CommandGate<'a> {
    profile: &'a CapabilityProfile,
}

impl<'a> CommandGate<'a> {
    pub fn new(profile: &'a CapabilityProfile) -> Self {
        Self { profile }
    }

    /// Return `Ok(())` when every feature `command` needs is in the profile.
    pub fn check(&self, command: &Command) -> Result<(), RoboVacError> {
        for required in required_features(command)? {
            if !self.profile.supports(required) {
                return Err(RoboVacError::UnsupportedCommand {
                    command: command.name().to_string(),
                    reason: format!("device profile lacks {required}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability_resolver::resolve;
    use serde_json::Value;

    fn send(name: &str) -> Command {
        Command::send(name, Value::Null)
    }

    #[test]
    fn unknown_model_rejects_everything() {
        let profile = resolve(&"Z0000".into());
        let gate = CommandGate::new(&profile);
        for cmd in [
            Command::Locate,
            Command::ReturnToBase,
            Command::Start,
            Command::Pause,
            Command::Stop,
            Command::CleanSpot,
            Command::SetFanSpeed("Standard".into()),
            send("autoClean"),
        ] {
            assert!(
                matches!(gate.check(&cmd), Err(RoboVacError::UnsupportedCommand { .. })),
                "{cmd:?} should be rejected"
            );
        }
    }

    #[test]
    fn c_series_accepts_edge_but_not_dnd() {
        let profile = resolve(&"T2103".into());
        let gate = CommandGate::new(&profile);
        assert!(gate.check(&send("edgeClean")).is_ok());
        assert!(gate.check(&send("smallRoomClean")).is_ok());
        assert!(gate.check(&send("autoClean")).is_ok());
        assert!(gate.check(&send("doNotDisturb")).is_err());
        assert!(gate.check(&send("boostIQ")).is_err());
    }

    #[test]
    fn x_series_accepts_room_clean_and_boost() {
        let profile = resolve(&"T2262".into());
        let gate = CommandGate::new(&profile);
        assert!(gate.check(&send("roomClean")).is_ok());
        assert!(gate.check(&send("boostIQ")).is_ok());
        assert!(gate.check(&send("edgeClean")).is_err());
    }

    #[test]
    fn unknown_named_command_is_unsupported() {
        let profile = resolve(&"T2262".into());
        let err = CommandGate::new(&profile).check(&send("dance")).unwrap_err();
        assert!(err.to_string().contains("dance"));
    }

    #[test]
    fn send_named_needs_send_command_surface() {
        let required = required_features(&send("autoReturn")).unwrap();
        assert_eq!(
            required,
            vec![
                RequiredFeature::Surface(VacuumFeature::SendCommand),
                RequiredFeature::Extended(RoboVacFeature::AutoReturn),
            ]
        );
    }
}

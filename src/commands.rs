//! Inbound command parsing.
//!
//! Commands arrive on two channels that share one target:
//!
//! | Topic | Channel |
//! |-------|---------|
//! | `cmnd/{NAME}/light` | [`CommandChannel::Device`] |
//! | `cmnd/group/lights` | [`CommandChannel::Group`] |
//!
//! Payloads are matched in priority order:
//!
//! 1. first byte `'1'` → on
//! 2. `"on"` (any case) → on
//! 3. first byte `'0'` → off
//! 4. `"off"` (any case) → off
//! 5. `"toggle"` (any case) → invert desired state
//!
//! Anything else is accepted and ignored. Word matches compare the whole
//! token, which ends at the first NUL byte or the end of the payload.
//!
//! # Example
//!
//! ```rust
//! use relay_switch::commands::{parse_payload, RelayCommand};
//! use relay_switch::RelayState;
//!
//! assert_eq!(parse_payload(b"1x"), Some(RelayCommand::Set(RelayState::On)));
//! assert_eq!(parse_payload(b"OFF"), Some(RelayCommand::Set(RelayState::Off)));
//! assert_eq!(parse_payload(b"Toggle"), Some(RelayCommand::Toggle));
//! assert_eq!(parse_payload(b"foo"), None);
//! ```

use log::debug;

use crate::config::{LongString, Topics};
use crate::state::DesiredState;
use crate::traits::{MqttMessage, RelayState};

/// Which recognised channel delivered a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandChannel {
    /// Device-specific topic.
    Device,
    /// Group broadcast topic.
    Group,
}

/// A parsed relay command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayCommand {
    /// Request an explicit state.
    Set(RelayState),
    /// Invert the current desired state.
    Toggle,
}

/// Parse a command payload.
///
/// Returns `None` for payloads that carry no recognised command.
pub fn parse_payload(payload: &[u8]) -> Option<RelayCommand> {
    let token = match payload.iter().position(|&b| b == 0) {
        Some(end) => &payload[..end],
        None => payload,
    };
    let first = token.first().copied();

    if first == Some(b'1') || token.eq_ignore_ascii_case(b"on") {
        Some(RelayCommand::Set(RelayState::On))
    } else if first == Some(b'0') || token.eq_ignore_ascii_case(b"off") {
        Some(RelayCommand::Set(RelayState::Off))
    } else if token.eq_ignore_ascii_case(b"toggle") {
        Some(RelayCommand::Toggle)
    } else {
        None
    }
}

/// A command that was applied to the desired state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
    /// Channel the command arrived on.
    pub channel: CommandChannel,
    /// The parsed command.
    pub command: RelayCommand,
    /// Desired state after applying the command.
    pub desired: RelayState,
}

/// Maps messages on the recognised command topics to desired-state changes.
#[derive(Clone, Debug)]
pub struct CommandParser {
    device_topic: LongString,
    group_topic: LongString,
}

impl CommandParser {
    /// Create a parser for the command topics in `topics`.
    pub fn new(topics: &Topics) -> Self {
        Self {
            device_topic: topics.command.clone(),
            group_topic: topics.group.clone(),
        }
    }

    /// Create a parser for a device name.
    pub fn for_device(name: &str) -> Self {
        Self::new(&Topics::for_device(name))
    }

    /// Identify the channel of a topic, if it is a recognised one.
    pub fn channel(&self, topic: &str) -> Option<CommandChannel> {
        if topic == self.device_topic.as_str() {
            Some(CommandChannel::Device)
        } else if topic == self.group_topic.as_str() {
            Some(CommandChannel::Group)
        } else {
            None
        }
    }

    /// Parse a message without applying it.
    pub fn parse(&self, topic: &str, payload: &[u8]) -> Option<(CommandChannel, RelayCommand)> {
        let channel = self.channel(topic)?;
        let command = parse_payload(payload)?;
        Some((channel, command))
    }

    /// Parse a message and apply it to `desired`.
    ///
    /// Returns `None` when the message was ignored (unknown topic or
    /// unrecognised payload).
    pub fn dispatch(&self, message: &MqttMessage, desired: &DesiredState) -> Option<Dispatch> {
        let Some((channel, command)) = self.parse(&message.topic, &message.payload) else {
            debug!(
                "ignoring message on {} ({} bytes)",
                message.topic,
                message.payload.len()
            );
            return None;
        };

        let state = desired.apply(command);
        debug!("{:?} command {:?} -> desired {}", channel, command, state);
        Some(Dispatch {
            channel,
            command,
            desired: state,
        })
    }

    /// Device-specific command topic.
    pub fn device_topic(&self) -> &str {
        self.device_topic.as_str()
    }

    /// Group broadcast command topic.
    pub fn group_topic(&self) -> &str {
        self.group_topic.as_str()
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::for_device(crate::config::DeviceConfig::default().name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Payload parsing
    // ========================================================================

    #[test]
    fn numeric_payloads() {
        assert_eq!(parse_payload(b"1"), Some(RelayCommand::Set(RelayState::On)));
        assert_eq!(parse_payload(b"0"), Some(RelayCommand::Set(RelayState::Off)));
    }

    #[test]
    fn first_byte_decides_numeric() {
        assert_eq!(parse_payload(b"1x"), Some(RelayCommand::Set(RelayState::On)));
        assert_eq!(parse_payload(b"100"), Some(RelayCommand::Set(RelayState::On)));
        assert_eq!(parse_payload(b"0ff"), Some(RelayCommand::Set(RelayState::Off)));
        assert_eq!(parse_payload(b"01"), Some(RelayCommand::Set(RelayState::Off)));
    }

    #[test]
    fn words_are_case_insensitive() {
        for on in [&b"on"[..], b"ON", b"On", b"oN"] {
            assert_eq!(parse_payload(on), Some(RelayCommand::Set(RelayState::On)));
        }
        for off in [&b"off"[..], b"OFF", b"Off"] {
            assert_eq!(parse_payload(off), Some(RelayCommand::Set(RelayState::Off)));
        }
        for toggle in [&b"toggle"[..], b"TOGGLE", b"ToGgLe"] {
            assert_eq!(parse_payload(toggle), Some(RelayCommand::Toggle));
        }
    }

    #[test]
    fn words_must_match_whole_token() {
        assert_eq!(parse_payload(b"only"), None);
        assert_eq!(parse_payload(b"offline"), None);
        assert_eq!(parse_payload(b"toggled"), None);
        assert_eq!(parse_payload(b" on"), None);
    }

    #[test]
    fn token_ends_at_nul() {
        assert_eq!(parse_payload(b"on\0junk"), Some(RelayCommand::Set(RelayState::On)));
        assert_eq!(parse_payload(b"toggle\0"), Some(RelayCommand::Toggle));
        assert_eq!(parse_payload(b"\0on"), None);
    }

    #[test]
    fn unrecognised_payloads() {
        assert_eq!(parse_payload(b""), None);
        assert_eq!(parse_payload(b"foo"), None);
        assert_eq!(parse_payload(b"2"), None);
        assert_eq!(parse_payload(&[0xff, 0x00]), None);
    }

    // ========================================================================
    // Channel scoping
    // ========================================================================

    #[test]
    fn recognised_channels() {
        let parser = CommandParser::for_device("lswitch0");
        assert_eq!(
            parser.channel("cmnd/lswitch0/light"),
            Some(CommandChannel::Device)
        );
        assert_eq!(
            parser.channel("cmnd/group/lights"),
            Some(CommandChannel::Group)
        );
    }

    #[test]
    fn other_topics_are_not_channels() {
        let parser = CommandParser::for_device("lswitch0");
        assert_eq!(parser.channel("cmnd/lswitch1/light"), None);
        assert_eq!(parser.channel("status/lswitch0/light"), None);
        assert_eq!(parser.channel("cmnd/group/light"), None);
        assert_eq!(parser.channel(""), None);
    }

    #[test]
    fn parse_requires_channel_and_payload() {
        let parser = CommandParser::default();
        assert_eq!(
            parser.parse("cmnd/group/lights", b"off"),
            Some((CommandChannel::Group, RelayCommand::Set(RelayState::Off)))
        );
        assert_eq!(parser.parse("cmnd/other/light", b"on"), None);
        assert_eq!(parser.parse("cmnd/lswitch0/light", b"dim"), None);
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    #[test]
    fn dispatch_applies_to_desired() {
        let parser = CommandParser::default();
        let desired = DesiredState::default();

        let msg = MqttMessage::new("cmnd/lswitch0/light", b"ON".to_vec());
        let dispatch = parser.dispatch(&msg, &desired).unwrap();
        assert_eq!(dispatch.channel, CommandChannel::Device);
        assert_eq!(dispatch.desired, RelayState::On);
        assert_eq!(desired.get(), RelayState::On);
    }

    #[test]
    fn dispatch_toggle_inverts_desired() {
        let parser = CommandParser::default();
        let desired = DesiredState::new(RelayState::On);

        let msg = MqttMessage::new("cmnd/group/lights", b"toggle".to_vec());
        let dispatch = parser.dispatch(&msg, &desired).unwrap();
        assert_eq!(dispatch.command, RelayCommand::Toggle);
        assert_eq!(desired.get(), RelayState::Off);
    }

    #[test]
    fn dispatch_ignores_unknown_topic() {
        let parser = CommandParser::default();
        let desired = DesiredState::default();

        let msg = MqttMessage::new("cmnd/kitchen/light", b"1".to_vec());
        assert!(parser.dispatch(&msg, &desired).is_none());
        assert_eq!(desired.get(), RelayState::Off);
    }

    #[test]
    fn dispatch_ignores_unknown_payload() {
        let parser = CommandParser::default();
        let desired = DesiredState::new(RelayState::On);

        let msg = MqttMessage::new("cmnd/lswitch0/light", b"foo".to_vec());
        assert!(parser.dispatch(&msg, &desired).is_none());
        assert_eq!(desired.get(), RelayState::On);
    }
}

//! ProXR relay-board client.
//!
//! Every command travels as one framed request and, unless the command is
//! write-only, one sized response. The boards take strict turns: a second
//! command must not be transmitted until the previous response (or its
//! timeout) has resolved, and this client enforces that by construction,
//! holding `&mut self` for the full exchange.

use log::trace;
use serde::Serialize;

use crate::constants::{API_CMD, BANK_COUNT, FRAME_OVERHEAD, RELAYS_PER_BANK, TIMER_COUNT};
use crate::error::{ProtocolError, ResponseError, Result};
use crate::frame::{decode_frame, encode_frame};
use crate::transport::Transport;

/// Feature flags reported by the board's device-identification command.
///
/// The first payload byte carries the common capability bits; the raw five
/// identification bytes are retained for callers that need the extended
/// (port-2, bus, notification) bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceFeatures {
    /// ProXR relay command set
    pub proxr_controller: bool,
    /// AD8 analog-to-digital command set
    pub ad8: bool,
    /// Input contact closure scanning
    pub contact_closure_scan: bool,
    /// Programmable potentiometer
    pub programmable_potentiometer: bool,
    /// Analog-to-digital converter
    pub adc: bool,
    /// Scratchpad memory
    pub scratchpad_memory: bool,
    /// AVA security protocols
    pub ava_security: bool,
    /// Current monitoring
    pub current_monitoring: bool,
    /// Raw identification bytes as received
    pub raw: [u8; 5],
}

impl DeviceFeatures {
    fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < 5 {
            return Err(ProtocolError::Parse(format!(
                "device feature reply too short: {} bytes",
                payload.len()
            )));
        }
        let byte1 = payload[0];
        let mut raw = [0u8; 5];
        raw.copy_from_slice(&payload[..5]);
        Ok(DeviceFeatures {
            proxr_controller: byte1 & 0x01 != 0,
            ad8: byte1 & 0x02 != 0,
            contact_closure_scan: byte1 & 0x04 != 0,
            programmable_potentiometer: byte1 & 0x08 != 0,
            adc: byte1 & 0x10 != 0,
            scratchpad_memory: byte1 & 0x20 != 0,
            ava_security: byte1 & 0x40 != 0,
            current_monitoring: byte1 & 0x80 != 0,
            raw,
        })
    }
}

/// State of a board timer as returned by [`RelayBoard::get_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerState {
    /// Remaining hours
    pub hours: u8,
    /// Remaining minutes
    pub minutes: u8,
    /// Remaining seconds
    pub seconds: u8,
    /// Relay the timer controls
    pub relay: u8,
}

/// Client for a ProXR relay board over any [`Transport`].
pub struct RelayBoard<T: Transport> {
    transport: T,
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(ProtocolError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn relay_words(relay: u16) -> (u8, u8) {
    ((relay & 0xFF) as u8, (relay >> 8) as u8)
}

impl<T: Transport> RelayBoard<T> {
    /// Wrap an open transport.
    pub fn new(transport: T) -> Self {
        RelayBoard { transport }
    }

    /// Consume the client, returning the underlying transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Frame `command`, transmit it, and validate the sized response.
    ///
    /// `expected_payload_len` is a property of the command, since responses
    /// do not describe their own length in general. Zero marks a write-only
    /// command: nothing is read and an empty payload returns immediately.
    /// A short read within the transport timeout surfaces as
    /// [`ResponseError::Timeout`], distinct from the malformed-frame errors,
    /// so callers can choose between retrying and aborting; this client
    /// itself never retries.
    pub fn send_command(&mut self, command: &[u8], expected_payload_len: usize) -> Result<Vec<u8>> {
        let frame = encode_frame(command);
        trace!("relay tx {:02X?}", frame);
        self.transport.send(&frame)?;
        if expected_payload_len == 0 {
            return Ok(Vec::new());
        }
        let raw = self.transport.receive(expected_payload_len + FRAME_OVERHEAD)?;
        trace!("relay rx {:02X?}", raw);
        if raw.len() < expected_payload_len + FRAME_OVERHEAD {
            return Err(ResponseError::Timeout.into());
        }
        Ok(decode_frame(&raw)?)
    }

    fn ack_command(&mut self, command: &[u8]) -> Result<u8> {
        let payload = self.send_command(command, 1)?;
        payload.first().copied().ok_or_else(|| {
            ProtocolError::Parse("expected one acknowledgement byte".to_string())
        })
    }

    // --- commands addressing the currently selected bank ---

    /// Turn off one relay (0-7) in the selected bank.
    pub fn turn_off_relay_in_bank(&mut self, relay: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        self.ack_command(&[API_CMD, relay])
    }

    /// Turn on one relay (0-7) in the selected bank.
    pub fn turn_on_relay_in_bank(&mut self, relay: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        self.ack_command(&[API_CMD, 8 + relay])
    }

    /// Query one relay (0-7) in the selected bank; 1 is energized.
    pub fn get_relay_status_in_bank(&mut self, relay: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        self.ack_command(&[API_CMD, 16 + relay])
    }

    /// Query the selected bank as one status bitmask byte.
    pub fn get_all_relay_status_in_bank(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 24])
    }

    /// Turn off every relay in the selected bank.
    pub fn turn_off_all_relays_in_bank(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 29])
    }

    /// Turn on every relay in the selected bank.
    pub fn turn_on_all_relays_in_bank(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 30])
    }

    /// Invert every relay in the selected bank.
    pub fn invert_all_relays_in_bank(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 31])
    }

    /// Reverse the relay pattern of the selected bank.
    pub fn reverse_all_relays_in_bank(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 32])
    }

    /// Hold the board in configuration mode for a number of seconds.
    pub fn set_configuration_mode(&mut self, duration: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 33, 140, 86, duration])
    }

    /// Set the selected bank to a status bitmask.
    pub fn set_all_relays_in_bank(&mut self, status: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 40, status])
    }

    // --- automatic refresh and reporting ---

    /// Relay changes take effect immediately.
    pub fn enable_automatic_relay_refresh(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 25])
    }

    /// Relay changes are deferred until [`Self::refresh`].
    pub fn disable_automatic_relay_refresh(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 26])
    }

    /// Board confirms every command with an acknowledgement byte.
    pub fn enable_reporting_mode(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 27])
    }

    /// Board stops confirming commands.
    pub fn disable_reporting_mode(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 28])
    }

    /// Persist the automatic refresh setting.
    pub fn store_automatic_refresh_setting(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 35])
    }

    /// Query the stored automatic refresh setting.
    pub fn get_automatic_refresh_setting(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 36])
    }

    /// Apply deferred relay changes.
    pub fn refresh(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 37])
    }

    // --- bank selection ---

    /// Direct subsequent bank-relative commands at every bank.
    pub fn select_all_banks(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 49, 0])
    }

    /// Direct subsequent bank-relative commands at one bank (1-4).
    pub fn select_bank(&mut self, bank: u8) -> Result<u8> {
        check_range("bank", bank as i64, 1, BANK_COUNT as i64)?;
        self.ack_command(&[API_CMD, 49, bank])
    }

    /// Query which bank is selected.
    pub fn get_selected_bank(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 34])
    }

    // --- globally addressed relays ---

    /// Turn on a relay by global index, leaving others untouched.
    pub fn turn_on_relay(&mut self, relay: u16) -> Result<u8> {
        let (lsb, msb) = relay_words(relay);
        self.ack_command(&[API_CMD, 48, lsb, msb])
    }

    /// Turn off a relay by global index.
    pub fn turn_off_relay(&mut self, relay: u16) -> Result<u8> {
        let (lsb, msb) = relay_words(relay);
        self.ack_command(&[API_CMD, 47, lsb, msb])
    }

    /// Turn on a relay by global index, turning every other relay off.
    pub fn turn_on_relay_only(&mut self, relay: u16) -> Result<u8> {
        let (lsb, msb) = relay_words(relay);
        self.ack_command(&[API_CMD, 46, lsb, msb])
    }

    /// Toggle a relay by index.
    pub fn toggle_relay(&mut self, relay: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 47, relay, 0, 1])
    }

    /// Query a relay by global index; 1 is energized.
    pub fn get_relay_status(&mut self, relay: u16) -> Result<u8> {
        let (lsb, msb) = relay_words(relay);
        self.ack_command(&[API_CMD, 44, lsb, msb])
    }

    // --- whole-board and per-bank operations ---

    /// Turn off one relay (0-7) in a specific bank, or all banks with 0.
    pub fn turn_off_relay_by_bank(&mut self, relay: u8, bank: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        self.ack_command(&[API_CMD, 100 + relay, bank])
    }

    /// Turn on one relay (0-7) in a specific bank, or all banks with 0.
    pub fn turn_on_relay_by_bank(&mut self, relay: u8, bank: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        self.ack_command(&[API_CMD, 108 + relay, bank])
    }

    /// Turn off `group_size` consecutive relays starting at `relay` in a bank.
    pub fn turn_off_relay_group(&mut self, relay: u8, bank: u8, group_size: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        check_range("group_size", group_size as i64, 1, 255)?;
        // the off opcode carries the group size zero-based on the wire
        self.ack_command(&[API_CMD, 100 + relay, bank, group_size - 1])
    }

    /// Turn on `group_size` consecutive relays starting at `relay` in a bank.
    pub fn turn_on_relay_group(&mut self, relay: u8, bank: u8, group_size: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        check_range("group_size", group_size as i64, 1, 255)?;
        self.ack_command(&[API_CMD, 108 + relay, bank, group_size])
    }

    /// Query one relay (0-7) in a specific bank.
    pub fn get_relay_status_by_bank(&mut self, relay: u8, bank: u8) -> Result<u8> {
        check_range("relay", relay as i64, 0, RELAYS_PER_BANK as i64 - 1)?;
        self.ack_command(&[API_CMD, 116 + relay, bank])
    }

    /// Query every bank; one status bitmask byte per bank, 32 banks.
    pub fn get_all_relay_status(&mut self) -> Result<Vec<u8>> {
        self.send_command(&[API_CMD, 124, 0], 32)
    }

    /// Query one bank's status bitmask byte.
    pub fn get_all_relay_status_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 124, bank])
    }

    /// Turn off every relay on the board.
    pub fn turn_off_all_relays(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 129, 0])
    }

    /// Turn off every relay in one bank.
    pub fn turn_off_all_relays_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 129, bank])
    }

    /// Turn on every relay on the board.
    pub fn turn_on_all_relays(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 130, 0])
    }

    /// Turn on every relay in one bank.
    pub fn turn_on_all_relays_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 130, bank])
    }

    /// Invert every relay on the board.
    pub fn invert_all_relays(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 131, 0])
    }

    /// Invert every relay in one bank.
    pub fn invert_all_relays_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 131, bank])
    }

    /// Reverse the relay pattern of every bank.
    pub fn reverse_all_relays(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 132, 0])
    }

    /// Reverse the relay pattern of one bank.
    pub fn reverse_all_relays_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 132, bank])
    }

    /// Set every bank to a status bitmask.
    pub fn set_all_relays(&mut self, status: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 140, status, 0])
    }

    /// Set one bank to a status bitmask.
    pub fn set_all_relays_by_bank(&mut self, status: u8, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 140, status, bank])
    }

    /// Persist one bank's current pattern as its power-on default.
    pub fn store_relay_defaults_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 142, bank])
    }

    /// Query one bank's power-on default pattern.
    pub fn get_relay_defaults_by_bank(&mut self, bank: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 143, bank])
    }

    // --- flashers ---

    /// Set the flash rate for every flasher; 0 stops flashing.
    pub fn set_all_flasher_speed(&mut self, speed: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 45, 0, speed])
    }

    /// Set the flash rate for one flasher.
    pub fn set_flasher_speed(&mut self, flasher: u8, speed: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 45, flasher, speed])
    }

    /// Start one flasher at the slowest rate.
    pub fn turn_on_relay_flasher(&mut self, flasher: u8) -> Result<u8> {
        self.set_flasher_speed(flasher, 1)
    }

    /// Stop one flasher.
    pub fn turn_off_relay_flasher(&mut self, flasher: u8) -> Result<u8> {
        self.set_flasher_speed(flasher, 0)
    }

    // --- timers ---

    /// Energize a relay for a duration using timer 0-15.
    pub fn turn_on_duration_timer(
        &mut self,
        timer: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
        relay: u8,
    ) -> Result<u8> {
        check_range("timer", timer as i64, 0, TIMER_COUNT as i64 - 1)?;
        self.ack_command(&[API_CMD, 50, 50 + timer, hours, minutes, seconds, relay])
    }

    /// Pulse a relay once using timer 0-15.
    pub fn turn_on_pulse_timer(
        &mut self,
        timer: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
        relay: u8,
    ) -> Result<u8> {
        check_range("timer", timer as i64, 0, TIMER_COUNT as i64 - 1)?;
        self.ack_command(&[API_CMD, 50, 70 + timer, hours, minutes, seconds, relay])
    }

    /// Query the remaining time and target relay of a timer.
    pub fn get_timer(&mut self, timer: u8) -> Result<TimerState> {
        check_range("timer", timer as i64, 0, TIMER_COUNT as i64 - 1)?;
        let payload = self.send_command(&[API_CMD, 50, 130, timer], 4)?;
        if payload.len() != 4 {
            return Err(ProtocolError::Parse(format!(
                "expected 4 timer bytes, got {}",
                payload.len()
            )));
        }
        Ok(TimerState {
            hours: payload[0],
            minutes: payload[1],
            seconds: payload[2],
            relay: payload[3],
        })
    }

    /// Pause or resume a timer.
    pub fn toggle_timer(&mut self, timer: u8) -> Result<u8> {
        check_range("timer", timer as i64, 0, TIMER_COUNT as i64 - 1)?;
        self.ack_command(&[API_CMD, 50, 131, timer])
    }

    /// Set a timer's calibration byte.
    pub fn set_timer_calibration(&mut self, timer: u8, calibration: u8) -> Result<u8> {
        check_range("timer", timer as i64, 0, TIMER_COUNT as i64 - 1)?;
        self.ack_command(&[API_CMD, 50, 132, timer, calibration])
    }

    /// Query a timer's calibration bytes.
    pub fn get_timer_calibration(&mut self, timer: u8) -> Result<Vec<u8>> {
        check_range("timer", timer as i64, 0, TIMER_COUNT as i64 - 1)?;
        self.send_command(&[API_CMD, 50, 133, timer], 2)
    }

    // --- board management ---

    /// Verify two-way communication; the board answers a status byte.
    pub fn test_two_way_communication(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 33])
    }

    /// Switch on the board's calibration outputs.
    pub fn turn_on_calibrators(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 50, 134])
    }

    /// Switch off the board's calibration outputs.
    pub fn turn_off_calibrators(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 50, 135])
    }

    /// Reboot the board's processor.
    pub fn reset(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 50, 144])
    }

    /// Query the four test-cycle counter bytes.
    pub fn get_testcycle_value(&mut self) -> Result<Vec<u8>> {
        self.send_command(&[API_CMD, 50, 145], 4)
    }

    /// Set the test-cycle counter.
    pub fn set_testcycle_value(&mut self, value: u8) -> Result<u8> {
        self.ack_command(&[API_CMD, 50, 146, value])
    }

    /// Drop and re-establish the board's network connection.
    pub fn reconnect(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 50, 147])
    }

    /// Query the five device-description bytes.
    pub fn get_device_description(&mut self) -> Result<Vec<u8>> {
        self.send_command(&[API_CMD, 246], 5)
    }

    /// Query the board's device address.
    pub fn get_device_address(&mut self) -> Result<u8> {
        self.ack_command(&[API_CMD, 247])
    }

    /// Query and decode the board's capability bits.
    pub fn get_device_features(&mut self) -> Result<DeviceFeatures> {
        let payload = self.send_command(&[API_CMD, 53, 243, 4], 8)?;
        DeviceFeatures::from_payload(&payload)
    }

    // --- contact closure inputs ---

    /// Read one bank of contact-closure inputs as a bitmask.
    pub fn read_contact_closure_by_bank(&mut self, bank: u8) -> Result<u8> {
        check_range("bank", bank as i64, 1, BANK_COUNT as i64)?;
        self.ack_command(&[API_CMD, 175, bank - 1])
    }

    /// Read a range of contact-closure banks, one bitmask byte each.
    pub fn read_contact_closure_by_bank_range(
        &mut self,
        start_bank: u8,
        count: u8,
    ) -> Result<Vec<u8>> {
        self.send_command(&[API_CMD, 175, start_bank, count], count as usize + 1)
    }

    // --- device-addressing commands (write-only, no response on the wire) ---

    /// Make every board on the bus listen to commands.
    pub fn enable_all_devices(&mut self) -> Result<()> {
        self.send_command(&[API_CMD, 248], 0).map(|_| ())
    }

    /// Make every board on the bus ignore commands.
    pub fn disable_all_devices(&mut self) -> Result<()> {
        self.send_command(&[API_CMD, 249], 0).map(|_| ())
    }

    /// Make one addressed board listen to commands.
    pub fn enable_device(&mut self, device: u8) -> Result<()> {
        self.send_command(&[API_CMD, 250, device], 0).map(|_| ())
    }

    /// Make one addressed board ignore commands.
    pub fn disable_device(&mut self, device: u8) -> Result<()> {
        self.send_command(&[API_CMD, 251, device], 0).map(|_| ())
    }

    /// Make exactly one addressed board listen, disabling the rest.
    pub fn enable_device_only(&mut self, device: u8) -> Result<()> {
        self.send_command(&[API_CMD, 252, device], 0).map(|_| ())
    }

    /// Make exactly one addressed board ignore commands, enabling the rest.
    pub fn disable_device_only(&mut self, device: u8) -> Result<()> {
        self.send_command(&[API_CMD, 253, device], 0).map(|_| ())
    }

    /// Persist a new device address to the board.
    pub fn store_device_number(&mut self, device: u8) -> Result<()> {
        self.send_command(&[API_CMD, 255, device], 0).map(|_| ())
    }
}

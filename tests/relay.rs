//! Relay-board client behavior against a scripted transport.

use std::collections::VecDeque;

use bench_protocol::frame::encode_frame;
use bench_protocol::{ProtocolError, RelayBoard, ResponseError, Result, Transport};

/// Transport that replays scripted inbound bytes and records outbound frames.
struct MockTransport {
    script: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    receive_calls: usize,
}

impl MockTransport {
    fn new(script: Vec<Vec<u8>>) -> Self {
        MockTransport {
            script: script.into(),
            sent: Vec::new(),
            receive_calls: 0,
        }
    }
}

impl Transport for MockTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        self.receive_calls += 1;
        let mut bytes = self.script.pop_front().unwrap_or_default();
        bytes.truncate(max_len);
        Ok(bytes)
    }
}

#[test]
fn set_all_relays_by_bank_emits_the_documented_frame() {
    let ack = encode_frame(&[85]);
    let mut board = RelayBoard::new(MockTransport::new(vec![ack]));
    let echoed = board.set_all_relays_by_bank(85, 1).unwrap();
    assert_eq!(echoed, 85);
    let transport = board.into_transport();
    assert_eq!(transport.sent, vec![vec![0xAA, 4, 254, 140, 85, 1, 142]]);
}

#[test]
fn one_byte_ack_decodes_to_its_payload() {
    // 0xAA + 1 + 85 = 256, so the checksum byte is 0
    let mut board = RelayBoard::new(MockTransport::new(vec![vec![0xAA, 1, 85, 0]]));
    assert_eq!(board.test_two_way_communication().unwrap(), 85);
}

#[test]
fn corrupted_responses_are_never_trusted() {
    let good = encode_frame(&[85]);
    for i in 0..good.len() {
        let mut corrupted = good.clone();
        corrupted[i] ^= 0x10;
        let mut board = RelayBoard::new(MockTransport::new(vec![corrupted]));
        assert!(
            board.get_all_relay_status_in_bank().is_err(),
            "corruption at byte {i} was accepted"
        );
    }
}

#[test]
fn write_only_commands_never_read() {
    let mut board = RelayBoard::new(MockTransport::new(vec![]));
    board.enable_all_devices().unwrap();
    board.disable_device(2).unwrap();
    board.store_device_number(7).unwrap();
    let transport = board.into_transport();
    assert_eq!(transport.receive_calls, 0);
    assert_eq!(transport.sent.len(), 3);
    assert_eq!(transport.sent[0], encode_frame(&[254, 248]));
}

#[test]
fn short_reads_surface_as_timeouts() {
    // only two of the four expected bytes arrive
    let mut board = RelayBoard::new(MockTransport::new(vec![vec![0xAA, 1]]));
    match board.get_selected_bank() {
        Err(ProtocolError::Response(ResponseError::Timeout)) => {}
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn empty_reads_surface_as_timeouts() {
    let mut board = RelayBoard::new(MockTransport::new(vec![]));
    assert!(matches!(
        board.refresh(),
        Err(ProtocolError::Response(ResponseError::Timeout))
    ));
}

#[test]
fn out_of_range_arguments_send_nothing() {
    let mut board = RelayBoard::new(MockTransport::new(vec![]));
    assert!(matches!(
        board.select_bank(7),
        Err(ProtocolError::OutOfRange { name: "bank", .. })
    ));
    assert!(matches!(
        board.turn_on_relay_in_bank(8),
        Err(ProtocolError::OutOfRange { name: "relay", .. })
    ));
    assert!(matches!(
        board.get_timer(16),
        Err(ProtocolError::OutOfRange { name: "timer", .. })
    ));
    assert!(board.into_transport().sent.is_empty());
}

#[test]
fn multi_byte_payloads_come_back_whole() {
    let status: Vec<u8> = (0..32).collect();
    let mut board = RelayBoard::new(MockTransport::new(vec![encode_frame(&status)]));
    assert_eq!(board.get_all_relay_status().unwrap(), status);
}

#[test]
fn timer_state_decodes_four_fields() {
    let mut board = RelayBoard::new(MockTransport::new(vec![encode_frame(&[1, 30, 15, 6])]));
    let state = board.get_timer(3).unwrap();
    assert_eq!(state.hours, 1);
    assert_eq!(state.minutes, 30);
    assert_eq!(state.seconds, 15);
    assert_eq!(state.relay, 6);
}

#[test]
fn device_features_decode_from_the_first_identification_byte() {
    let ident = [0b1001_0011u8, 0, 0, 0, 0, 0, 0, 0];
    let mut board = RelayBoard::new(MockTransport::new(vec![encode_frame(&ident)]));
    let features = board.get_device_features().unwrap();
    assert!(features.proxr_controller);
    assert!(features.ad8);
    assert!(!features.contact_closure_scan);
    assert!(features.adc);
    assert!(features.current_monitoring);
    assert_eq!(features.raw, [0b1001_0011, 0, 0, 0, 0]);
}

#[test]
fn relay_group_sizes_are_offset_only_on_the_off_opcode() {
    let script = vec![encode_frame(&[1]), encode_frame(&[1])];
    let mut board = RelayBoard::new(MockTransport::new(script));
    board.turn_off_relay_group(2, 3, 4).unwrap();
    board.turn_on_relay_group(2, 3, 4).unwrap();
    let sent = board.into_transport().sent;
    assert_eq!(sent[0], encode_frame(&[254, 102, 3, 3]));
    assert_eq!(sent[1], encode_frame(&[254, 110, 3, 4]));
}

#[test]
fn empty_relay_groups_send_nothing() {
    let mut board = RelayBoard::new(MockTransport::new(vec![]));
    assert!(matches!(
        board.turn_off_relay_group(0, 1, 0),
        Err(ProtocolError::OutOfRange { name: "group_size", .. })
    ));
    assert!(board.into_transport().sent.is_empty());
}

#[test]
fn per_bank_invert_and_reverse_carry_the_bank_byte() {
    let script = vec![encode_frame(&[1]), encode_frame(&[1])];
    let mut board = RelayBoard::new(MockTransport::new(script));
    board.invert_all_relays_by_bank(2).unwrap();
    board.reverse_all_relays_by_bank(3).unwrap();
    let sent = board.into_transport().sent;
    assert_eq!(sent[0], encode_frame(&[254, 131, 2]));
    assert_eq!(sent[1], encode_frame(&[254, 132, 3]));
}

#[test]
fn maintenance_commands_emit_their_documented_frames() {
    let script = vec![
        encode_frame(&[1]),
        encode_frame(&[1]),
        encode_frame(&[1]),
        encode_frame(&[9, 8, 7, 6]),
        encode_frame(&[1]),
    ];
    let mut board = RelayBoard::new(MockTransport::new(script));
    board.set_configuration_mode(30).unwrap();
    board.turn_on_calibrators().unwrap();
    board.turn_off_calibrators().unwrap();
    assert_eq!(board.get_testcycle_value().unwrap(), vec![9, 8, 7, 6]);
    board.set_testcycle_value(5).unwrap();
    let sent = board.into_transport().sent;
    assert_eq!(sent[0], encode_frame(&[254, 33, 140, 86, 30]));
    assert_eq!(sent[1], encode_frame(&[254, 50, 134]));
    assert_eq!(sent[2], encode_frame(&[254, 50, 135]));
    assert_eq!(sent[3], encode_frame(&[254, 50, 145]));
    assert_eq!(sent[4], encode_frame(&[254, 50, 146, 5]));
}

#[test]
fn bank_relative_command_opcodes_offset_by_relay() {
    let script = vec![encode_frame(&[1]), encode_frame(&[1]), encode_frame(&[1])];
    let mut board = RelayBoard::new(MockTransport::new(script));
    board.turn_off_relay_by_bank(5, 2).unwrap();
    board.turn_on_relay_by_bank(5, 2).unwrap();
    board.get_relay_status_by_bank(5, 2).unwrap();
    let sent = board.into_transport().sent;
    assert_eq!(sent[0], encode_frame(&[254, 105, 2]));
    assert_eq!(sent[1], encode_frame(&[254, 113, 2]));
    assert_eq!(sent[2], encode_frame(&[254, 121, 2]));
}

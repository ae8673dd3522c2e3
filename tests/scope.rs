//! Oscilloscope retrieval paths against a scripted instrument link.

use std::collections::{HashMap, VecDeque};

use bench_protocol::block::encode_block;
use bench_protocol::{Channel, Oscilloscope, Result, ScpiLink};

/// Link that answers queries from a table and records every write. Raw
/// replies queue per command, so a repeated query can see different data.
struct MockLink {
    replies: HashMap<&'static str, String>,
    raw_replies: HashMap<&'static str, VecDeque<Vec<u8>>>,
    writes: Vec<String>,
}

impl MockLink {
    fn new() -> Self {
        MockLink {
            replies: HashMap::new(),
            raw_replies: HashMap::new(),
            writes: Vec::new(),
        }
    }

    fn reply(mut self, command: &'static str, reply: &str) -> Self {
        self.replies.insert(command, reply.to_string());
        self
    }

    fn raw_reply(mut self, command: &'static str, reply: Vec<u8>) -> Self {
        self.raw_replies.entry(command).or_default().push_back(reply);
        self
    }
}

impl ScpiLink for MockLink {
    fn write(&mut self, command: &str) -> Result<()> {
        self.writes.push(command.to_string());
        Ok(())
    }

    fn ask(&mut self, command: &str) -> Result<String> {
        Ok(self
            .replies
            .get(command)
            .unwrap_or_else(|| panic!("unscripted query {command:?}"))
            .clone())
    }

    fn ask_raw(&mut self, command: &str, max_len: usize) -> Result<Vec<u8>> {
        let mut bytes = self
            .raw_replies
            .get_mut(command)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| panic!("unscripted raw query {command:?}"));
        bytes.truncate(max_len);
        Ok(bytes)
    }
}

#[test]
fn screenshot_returns_exactly_the_block_payload() {
    let png = b"\x89PNG\r\n\x1a\nfake image body".to_vec();
    let mut reply = encode_block(&png);
    reply.push(b'\n');
    let link = MockLink::new().raw_reply(":DISPlay:DATA? ON,OFF,PNG", reply);
    let mut scope = Oscilloscope::new(link);
    assert_eq!(scope.take_screenshot().unwrap(), png);
}

#[test]
fn truncated_screenshot_is_an_error() {
    let block = encode_block(&[0u8; 64]);
    let link = MockLink::new().raw_reply(":DISPlay:DATA? ON,OFF,PNG", block[..40].to_vec());
    let mut scope = Oscilloscope::new(link);
    assert!(scope.take_screenshot().is_err());
}

#[test]
fn waveform_capture_runs_the_full_retrieval_sequence() {
    let raw_samples = [0u8, 64, 128, 255];
    let link = MockLink::new()
        .reply(":WAVeform:PREamble?", "0,0,4,1,1e-06,-2e-06,0,0.04,0,0")
        .reply(":TIMebase:MAIN:SCALe?", "0.001")
        .reply(":TIMebase:MAIN:OFFSet?", "0")
        .raw_reply(":WAVeform:DATA?", encode_block(&raw_samples));
    let mut scope = Oscilloscope::new(link);
    let (x_axis, values) = scope.get_waveform_samples(Channel::Analog(2)).unwrap();

    assert_eq!(values.len(), 4);
    for (value, raw) in values.iter().zip(raw_samples) {
        assert!((value - raw as f64 * 0.04).abs() < 1e-12);
    }
    // indices -2..2 at 0.001 / 10 per step
    let expected_x = [-2e-4, -1e-4, 0.0, 1e-4];
    for (x, expected) in x_axis.iter().zip(expected_x) {
        assert!((x - expected).abs() < 1e-12);
    }
}

#[test]
fn waveform_setup_commands_are_written_in_order() {
    let link = MockLink::new()
        .reply(":WAVeform:PREamble?", "0,0,1,1,1e-06,0,0,0.04,0,0")
        .reply(":TIMebase:MAIN:SCALe?", "0.001")
        .reply(":TIMebase:MAIN:OFFSet?", "0")
        .raw_reply(":WAVeform:DATA?", encode_block(&[128]));
    let mut scope = Oscilloscope::new(link);
    scope.get_waveform_samples(Channel::Analog(1)).unwrap();
    let writes = scope.into_link().writes;
    assert_eq!(
        writes,
        vec![
            ":WAVeform:SOURce CHAN1",
            ":WAVeform:FORMat BYTE",
            ":WAVeform:STARt 1",
            ":WAVeform:STOP 1200",
        ]
    );
}

#[test]
fn point_count_mismatch_rejects_the_capture() {
    let link = MockLink::new()
        .reply(":WAVeform:PREamble?", "0,0,1200,1,1e-06,0,0,0.04,0,0")
        .reply(":TIMebase:MAIN:SCALe?", "0.001")
        .reply(":TIMebase:MAIN:OFFSet?", "0")
        .raw_reply(":WAVeform:DATA?", encode_block(&[0u8; 100]));
    let mut scope = Oscilloscope::new(link);
    assert!(scope.get_waveform_samples(Channel::Analog(1)).is_err());
}

#[test]
fn memory_capture_stitches_batches_and_brackets_the_acquisition() {
    let first = vec![100u8; 250_000];
    let second = vec![200u8; 250_000];
    let link = MockLink::new()
        .reply(":WAVeform:PREamble?", "0,2,500000,1,2e-09,-0.0005,0,0.04,0,0")
        .raw_reply(":WAVeform:DATA?", encode_block(&first))
        .raw_reply(":WAVeform:DATA?", encode_block(&second));
    let mut scope = Oscilloscope::new(link);
    let (x_axis, values) = scope.get_memory_samples(Channel::Analog(1)).unwrap();

    assert_eq!(values.len(), 500_000);
    assert!((values[0] - 4.0).abs() < 1e-12);
    assert!((values[250_000] - 8.0).abs() < 1e-12);
    assert_eq!(x_axis.len(), 500_000);
    assert!((x_axis[0] + 0.0005).abs() < 1e-15);
    assert!((x_axis[1] - x_axis[0] - 2e-9).abs() < 1e-15);

    let writes = scope.into_link().writes;
    assert_eq!(
        writes,
        vec![
            ":WAVeform:SOURce CHAN1",
            ":WAVeform:MODE RAW",
            ":WAVeform:FORMat BYTE",
            ":STOP",
            ":WAVeform:STARt 1",
            ":WAVeform:STOP 250000",
            ":WAVeform:STARt 250001",
            ":WAVeform:STOP 500000",
            ":RUN",
        ]
    );
}

#[test]
fn memory_capture_rereads_a_batch_that_arrives_short() {
    let samples = [0u8, 64, 128, 255];
    let link = MockLink::new()
        .reply(":WAVeform:PREamble?", "0,2,4,1,1e-06,0,0,0.04,0,0")
        .raw_reply(":WAVeform:DATA?", encode_block(&samples[..2]))
        .raw_reply(":WAVeform:DATA?", encode_block(&samples));
    let mut scope = Oscilloscope::new(link);
    let (_, values) = scope.get_memory_samples(Channel::Analog(1)).unwrap();
    assert_eq!(values.len(), 4);
    assert!((values[3] - 255.0 * 0.04).abs() < 1e-12);
}

#[test]
fn memory_capture_gives_up_after_repeated_short_batches() {
    let mut link = MockLink::new().reply(":WAVeform:PREamble?", "0,2,4,1,1e-06,0,0,0.04,0,0");
    for _ in 0..5 {
        link = link.raw_reply(":WAVeform:DATA?", encode_block(&[1u8, 2]));
    }
    let mut scope = Oscilloscope::new(link);
    assert!(scope.get_memory_samples(Channel::Analog(1)).is_err());
}

#[test]
fn quantized_setters_write_legal_values_only() {
    let link = MockLink::new().reply(":CHAN1:PROBe?", "10");
    let mut scope = Oscilloscope::new(link);
    scope.set_timebase_scale(3.3e-6).unwrap();
    scope.set_averages(100).unwrap();
    scope.set_probe_ratio(9.0, Channel::Analog(1)).unwrap();
    scope.set_channel_scale(7.0, Channel::Analog(1)).unwrap();
    let writes = scope.into_link().writes;
    assert_eq!(writes[0], ":TIMebase:MAIN:SCALe 0.000002");
    assert_eq!(writes[1], ":ACQuire:AVERages 128");
    assert_eq!(writes[2], ":CHAN1:PROBe 10");
    assert_eq!(writes[3], ":CHAN1:SCALe 10");
}

#[test]
fn invalid_channel_is_rejected_before_any_io() {
    let mut scope = Oscilloscope::new(MockLink::new());
    assert!(scope.get_waveform_samples(Channel::Analog(9)).is_err());
}

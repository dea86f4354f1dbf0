//! bloco-sim - In-memory simulated Bloco devices
//!
//! Simulators for the block programmer and the reader board, speaking the
//! real wire protocol behind the [`bloco_serial::Transport`] trait. They
//! back the integration tests and let every CLI command run without
//! hardware (`--port sim:block` / `--port sim:board`).

pub mod firmware;
pub mod transport;

pub use firmware::{BlockSim, BoardSim, Firmware};
pub use transport::{EventLog, SimEvent, SimTransport};

#[cfg(test)]
mod tests {
    use super::*;
    use bloco_core::{types, ChannelCache};
    use bloco_proto::{Command, Response, SendBlockSpec, SendSpec, WriteSpec};
    use bloco_serial::{Session, State};
    use std::sync::Arc;
    use std::time::Duration;

    fn block_session(sim: BlockSim) -> Session {
        let session = Session::new();
        session.attach(Box::new(SimTransport::new(sim))).unwrap();
        session
    }

    #[test]
    fn read_block_updates_the_cache() {
        let mut sim = BlockSim::new();
        sim.preload(3, 0x10, "Go");
        let session = block_session(sim);
        let mut cache = ChannelCache::new();

        let resp = session.exchange(&Command::read_block(3)).unwrap();
        let Response::ReadData(data) = resp else {
            panic!("wrong variant: {resp:?}");
        };
        cache.update(3, data.descriptor()).unwrap();

        let desc = cache.get(3).unwrap();
        assert_eq!(desc.type_id, 0x10);
        assert_eq!(types::by_id(desc.type_id).unwrap().name, "FORWARD");
        assert_eq!(desc.name, "Go");
        assert!(desc.checksum_valid);
    }

    #[test]
    fn write_then_follow_up_read_populates_the_cache() {
        let session = block_session(BlockSim::new());
        let mut cache = ChannelCache::new();

        let write = Command::WriteBlock(WriteSpec {
            channel: 0,
            type_id: 1,
            subtype: 0,
            param1: 0,
            param2: 0,
            name: "Start".into(),
        });
        let resp = session.exchange(&write).unwrap();
        let Response::WriteOk(ok) = resp else {
            panic!("wrong variant: {resp:?}");
        };
        assert!(!ok.serial.is_empty());

        let resp = session.exchange(&Command::read_block(0)).unwrap();
        let Response::ReadData(data) = resp else {
            panic!("wrong variant: {resp:?}");
        };
        cache.update(0, data.descriptor()).unwrap();
        assert_eq!(cache.get(0).unwrap().type_id, 1);
        assert_eq!(cache.get(0).unwrap().name, "Start");
    }

    #[test]
    fn erase_clears_and_follow_up_read_sees_blank() {
        let mut sim = BlockSim::new();
        sim.preload(2, 0x30, "Beep");
        let session = block_session(sim);
        let mut cache = ChannelCache::new();

        let resp = session.exchange(&Command::erase_block(2)).unwrap();
        assert!(matches!(resp, Response::EraseOk(_)));
        cache.clear(2).unwrap();
        assert!(cache.get(2).is_none());

        let resp = session.exchange(&Command::read_block(2)).unwrap();
        let Response::ReadData(data) = resp else {
            panic!("wrong variant: {resp:?}");
        };
        assert_eq!(data.type_id, 0xFF);
    }

    #[test]
    fn scan_returns_the_ordered_sequence_and_stops_at_the_terminal() {
        let board = BoardSim::with_blocks(&[(0, 0x01, "Begin"), (1, 0x10, "Go")]);
        let transport = SimTransport::new(board)
            .with_trailing(&["{\"response\":\"SCAN_END\"}", "I (99) board: idle"]);
        let events = transport.events();
        let session = Session::new();
        session.attach(Box::new(transport)).unwrap();

        let responses = session.exchange_multi(&Command::ScanChannels).unwrap();
        // SCAN_START + 8x BLOCK_DATA + SCAN_END, in channel order
        assert_eq!(responses.len(), 10);
        assert!(matches!(responses[0], Response::ScanStart(_)));
        for (i, resp) in responses[1..9].iter().enumerate() {
            let Response::BlockData(data) = resp else {
                panic!("wrong variant at {i}: {resp:?}");
            };
            assert_eq!(data.channel as usize, i);
            assert_eq!(data.present, i < 2);
        }
        assert!(responses[9].is_terminal());

        // The trailing lines after SCAN_END were never read
        let reads = events
            .snapshot()
            .iter()
            .filter(|e| **e == SimEvent::LineRead)
            .count();
        assert_eq!(reads, 10);
    }

    #[test]
    fn silence_yields_none_and_leaves_the_session_connected() {
        let session = Session::new();
        session
            .attach(Box::new(SimTransport::new(BlockSim::new()).silent()))
            .unwrap();

        assert!(session.exchange(&Command::read_block(0)).is_none());
        assert!(session.exchange_multi(&Command::ScanChannels).is_none());
        // A failed exchange does not change lifecycle state
        assert_eq!(session.state(), State::Connected);
    }

    #[test]
    fn log_noise_is_filtered_out() {
        let mut sim = BlockSim::new();
        sim.preload(1, 0x20, "Loop");
        let transport = SimTransport::new(sim).with_noise(&[
            "ets Jul 29 2019 12:21:46",
            "I (312) programmer: read channel 1",
            "{not json at all",
        ]);
        let session = Session::new();
        session.attach(Box::new(transport)).unwrap();

        let resp = session.exchange(&Command::read_block(1)).unwrap();
        let Response::ReadData(data) = resp else {
            panic!("wrong variant: {resp:?}");
        };
        assert_eq!(data.type_id, 0x20);
    }

    #[test]
    fn concurrent_workers_never_interleave_exchanges() {
        let mut sim = BlockSim::new();
        sim.preload(0, 0x01, "Begin");
        let transport = SimTransport::new(sim).with_latency(Duration::from_millis(30));
        let events = transport.events();
        let session = Arc::new(Session::new());
        session.attach(Box::new(transport)).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let session = Arc::clone(&session);
                bloco_serial::spawn(move || session.exchange(&Command::read_block(0)).is_some())
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.take(), Some(true));
        }

        // Each exchange must fully drain its response before the next
        // command reaches the device: Command and LineRead alternate.
        let log = events.snapshot();
        assert_eq!(log.len(), 8, "unexpected event log: {log:?}");
        for pair in log.chunks(2) {
            assert!(matches!(pair[0], SimEvent::Command(_)), "log: {log:?}");
            assert_eq!(pair[1], SimEvent::LineRead, "log: {log:?}");
        }
    }

    #[test]
    fn batch_program_returns_one_response_per_block() {
        let session = block_session(BlockSim::new());
        let batch = Command::BatchProgram(bloco_proto::BatchSpec {
            blocks: vec![
                WriteSpec {
                    channel: 0,
                    type_id: 0x01,
                    subtype: 0,
                    param1: 0,
                    param2: 0,
                    name: "Begin".into(),
                },
                WriteSpec {
                    channel: 0,
                    type_id: 0x02,
                    subtype: 0,
                    param1: 0,
                    param2: 0,
                    name: "End".into(),
                },
            ],
        });
        let responses = session.exchange_multi(&batch).unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses
            .iter()
            .all(|r| matches!(r, Response::WriteOk(_))));
    }

    #[test]
    fn board_ignores_programmer_commands_so_the_host_sees_silence() {
        let session = Session::new();
        session
            .attach(Box::new(SimTransport::new(BoardSim::new())))
            .unwrap();
        assert!(session.exchange(&Command::read_block(0)).is_none());
    }

    #[test]
    fn send_blocks_round_trip() {
        let session = Session::new();
        session
            .attach(Box::new(SimTransport::new(BoardSim::new())))
            .unwrap();
        let cmd = Command::SendBlocks(SendSpec {
            blocks: vec![
                SendBlockSpec {
                    type_id: 0x01,
                    name: "Begin".into(),
                },
                SendBlockSpec {
                    type_id: 0x10,
                    name: "Go".into(),
                },
                SendBlockSpec {
                    type_id: 0x02,
                    name: "End".into(),
                },
            ],
        });
        let responses = session.exchange_multi(&cmd).unwrap();
        assert_eq!(responses.len(), 1);
        let Response::SendOk(ok) = &responses[0] else {
            panic!("wrong variant: {responses:?}");
        };
        assert_eq!(ok.blocks_sent, Some(3));
    }

    #[test]
    fn disconnect_invalidates_but_keeps_last_known_state() {
        let mut sim = BlockSim::new();
        sim.preload(4, 0x41, "Red");
        let session = block_session(sim);
        let mut cache = ChannelCache::new();

        let resp = session.exchange(&Command::read_block(4)).unwrap();
        let Response::ReadData(data) = resp else {
            panic!("wrong variant: {resp:?}");
        };
        cache.update(4, data.descriptor()).unwrap();

        session.disconnect();
        cache.invalidate_all();

        assert_eq!(session.state(), State::Disconnected);
        assert!(session.exchange(&Command::read_block(4)).is_none());
        assert!(cache.is_stale(4));
        assert_eq!(cache.get(4).unwrap().type_id, 0x41);
    }
}

//! Transcript replay.
//!
//! A transcript is JSON lines. Each line is an inbound frame
//! `{"topic": .., "body": ..}`, a local submit `{"submit": [row, col]}`, or a
//! clock advance `{"advanceMs": n}`. Time is virtual, so ack timeouts expire
//! deterministically.

use crate::client::GameClient;
use crate::driver::InboundFrame;
use crate::transport::Transport;
use serde::Deserialize;
use std::io::BufRead;
use std::time::Duration;
use strictly_gomoku::Coord;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TranscriptEntry {
    /// Frame delivered on a topic.
    Frame(InboundFrame),
    /// Local move attempt.
    Submit {
        /// `[row, col]`.
        submit: [usize; 2],
    },
    /// Moves the virtual clock forward.
    Advance {
        /// Milliseconds to advance.
        #[serde(rename = "advanceMs")]
        advance_ms: u64,
    },
}

/// Counters collected during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_getters::Getters)]
pub struct ReplayReport {
    /// Frames reconciled.
    applied: usize,
    /// Frames or lines dropped.
    dropped: usize,
    /// Local moves sent.
    submitted: usize,
    /// Local moves refused.
    rejected: usize,
    /// In-flight moves that timed out.
    expired: usize,
}

/// Feeds a transcript through `client`.
///
/// Bad lines are logged and counted, never fatal; only reading can fail.
#[instrument(skip_all)]
pub fn replay<T: Transport, R: BufRead>(
    client: &GameClient<T>,
    reader: R,
) -> std::io::Result<ReplayReport> {
    let mut report = ReplayReport::default();
    let mut now = Instant::now();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry: TranscriptEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(line = index + 1, error = %err, "Unreadable transcript line");
                report.dropped += 1;
                continue;
            }
        };
        match entry {
            TranscriptEntry::Frame(frame) => match client.handle_frame(&frame.topic, &frame.body) {
                Ok(()) => report.applied += 1,
                Err(_) => report.dropped += 1,
            },
            TranscriptEntry::Submit { submit: [row, col] } => {
                match client.submit_at(Coord::new(row, col), now) {
                    Ok(mv) => {
                        debug!(mv = %mv, "Replayed submit");
                        report.submitted += 1;
                    }
                    Err(err) => {
                        debug!(error = %err, "Replayed submit refused");
                        report.rejected += 1;
                    }
                }
            }
            TranscriptEntry::Advance { advance_ms } => {
                now += Duration::from_millis(advance_ms);
                if client.expire_at(now).is_some() {
                    report.expired += 1;
                }
            }
        }
    }
    Ok(report)
}

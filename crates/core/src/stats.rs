//! Reception statistics and the packet acceptance policy.
//!
//! The acceptance policy: a packet is forwarded only if its
//! sequence number is strictly greater than the last accepted one. Late
//! packets are dropped, never resequenced. A jump of more than one counts
//! as a single loss event regardless of the gap size.
//!
//! Sequence-number wraparound is not handled: after 65535 the next
//! packet (0) compares as stale and is discarded.

use std::time::{Duration, Instant};

/// Verdict of the acceptance policy for one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Forward to the renderer. `loss` is set when the sequence number
    /// broke +1 continuity with the previously accepted packet.
    Accepted { loss: bool },
    /// Duplicate or older than the last accepted packet.
    Stale,
}

/// Running statistics for one PLAY period.
#[derive(Debug, Clone)]
pub struct ReceptionStats {
    last_accepted: Option<u16>,
    highest_sequence_seen: u16,
    lost_count: u64,
    stale_count: u64,
    total_bytes: u64,
    elapsed: Duration,
    clock_start: Instant,
}

impl ReceptionStats {
    pub fn new(now: Instant) -> Self {
        Self {
            last_accepted: None,
            highest_sequence_seen: 0,
            lost_count: 0,
            stale_count: 0,
            total_bytes: 0,
            elapsed: Duration::ZERO,
            clock_start: now,
        }
    }

    /// Zero every counter and restart the play clock.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Account for one decoded datagram of `len` bytes.
    pub fn record_datagram(&mut self, sequence: u16, len: usize, now: Instant) {
        self.highest_sequence_seen = self.highest_sequence_seen.max(sequence);
        self.total_bytes += len as u64;
        self.elapsed = now.saturating_duration_since(self.clock_start);
    }

    /// Apply the acceptance policy and loss accounting to `sequence`.
    pub fn accept(&mut self, sequence: u16) -> Acceptance {
        match self.last_accepted {
            Some(last) if sequence <= last => {
                self.stale_count += 1;
                Acceptance::Stale
            }
            Some(last) => {
                let loss = sequence != last + 1;
                if loss {
                    self.lost_count += 1;
                }
                self.last_accepted = Some(sequence);
                Acceptance::Accepted { loss }
            }
            None => {
                self.last_accepted = Some(sequence);
                Acceptance::Accepted { loss: false }
            }
        }
    }

    /// Sequence number of the last accepted frame (0 before any).
    pub fn frame_number(&self) -> u16 {
        self.last_accepted.unwrap_or(0)
    }

    pub fn highest_sequence_seen(&self) -> u16 {
        self.highest_sequence_seen
    }

    /// Loss events: accepted packets that broke +1 continuity.
    pub fn lost_count(&self) -> u64 {
        self.lost_count
    }

    /// Packets discarded as duplicate or stale.
    pub fn stale_count(&self) -> u64 {
        self.stale_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Time from the last PLAY to the most recent datagram.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `lost_count / highest_sequence_seen`, 0 before any packet.
    pub fn loss_rate(&self) -> f64 {
        if self.highest_sequence_seen == 0 {
            return 0.0;
        }
        self.lost_count as f64 / self.highest_sequence_seen as f64
    }

    /// Bytes per second over the elapsed play time, 0 when no time elapsed.
    pub fn data_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_bytes as f64 / secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(stats: &mut ReceptionStats, seqs: &[u16]) -> Vec<u16> {
        let now = Instant::now();
        seqs.iter()
            .copied()
            .filter(|&seq| {
                stats.record_datagram(seq, 100, now);
                matches!(stats.accept(seq), Acceptance::Accepted { .. })
            })
            .collect()
    }

    #[test]
    fn gap_counts_as_single_loss() {
        let mut stats = ReceptionStats::new(Instant::now());
        let accepted = feed(&mut stats, &[1, 2, 5, 6]);

        assert_eq!(accepted, vec![1, 2, 5, 6]);
        assert_eq!(stats.lost_count(), 1);
        assert_eq!(stats.highest_sequence_seen(), 6);
        assert!((stats.loss_rate() - 1.0 / 6.0).abs() < f64::EPSILON);
        assert_eq!(stats.frame_number(), 6);
    }

    #[test]
    fn duplicate_is_discarded_once() {
        let mut stats = ReceptionStats::new(Instant::now());
        assert_eq!(stats.accept(4), Acceptance::Accepted { loss: false });
        assert_eq!(stats.accept(4), Acceptance::Stale);
        assert_eq!(stats.lost_count(), 0);
        assert_eq!(stats.stale_count(), 1);
    }

    #[test]
    fn late_packet_is_lost_not_resequenced() {
        let mut stats = ReceptionStats::new(Instant::now());
        let accepted = feed(&mut stats, &[10, 12, 11]);

        assert_eq!(accepted, vec![10, 12]);
        assert_eq!(stats.lost_count(), 1);
        assert_eq!(stats.highest_sequence_seen(), 12);
        assert_eq!(stats.total_bytes(), 300);
    }

    #[test]
    fn first_packet_is_never_a_loss() {
        let mut stats = ReceptionStats::new(Instant::now());
        assert_eq!(stats.accept(500), Acceptance::Accepted { loss: false });
        assert_eq!(stats.lost_count(), 0);
    }

    #[test]
    fn wraparound_is_treated_as_stale() {
        let mut stats = ReceptionStats::new(Instant::now());
        stats.accept(u16::MAX);
        assert_eq!(stats.accept(0), Acceptance::Stale);
    }

    #[test]
    fn data_rate() {
        let start = Instant::now();
        let mut stats = ReceptionStats::new(start);
        stats.record_datagram(1, 1000, start);
        assert_eq!(stats.total_bytes(), 1000);
        assert_eq!(stats.data_rate(), 0.0);

        stats.record_datagram(1, 0, start + Duration::from_secs(2));
        assert_eq!(stats.elapsed(), Duration::from_secs(2));
        assert_eq!(stats.data_rate(), 500.0);
    }

    #[test]
    fn loss_rate_is_zero_without_packets() {
        let stats = ReceptionStats::new(Instant::now());
        assert_eq!(stats.loss_rate(), 0.0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let start = Instant::now();
        let mut stats = ReceptionStats::new(start);
        feed(&mut stats, &[1, 3]);
        stats.reset(start + Duration::from_secs(1));

        assert_eq!(stats.lost_count(), 0);
        assert_eq!(stats.total_bytes(), 0);
        assert_eq!(stats.highest_sequence_seen(), 0);
        assert_eq!(stats.frame_number(), 0);
        assert_eq!(stats.elapsed(), Duration::ZERO);
        assert_eq!(stats.accept(1), Acceptance::Accepted { loss: false });
    }
}

use std::fmt;
use std::time::Duration;

use crate::codec::Direction;
use crate::error::{Error, Result};
use crate::timing::TimingLedger;

/// Throughput and size metrics for one transcoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub direction: Direction,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Sum of codec call durations from the ledger.
    pub elapsed: Duration,
    /// Bits of useful work per microsecond (equivalently Mbit/s). Useful work
    /// is the input side when compressing and the output side when
    /// decompressing.
    pub throughput_mbit: f64,
    /// `1 - output/input`; compression only.
    pub space_savings: Option<f64>,
    /// `input/output`; compression only.
    pub compression_ratio: Option<f64>,
}

impl StatsReport {
    /// Derive the report from the ledger and the byte counters.
    ///
    /// The ledger must hold at least one sample and a non-zero total. Callers
    /// that processed no data (zero-length input) skip the report instead.
    pub fn from_ledger(
        ledger: &TimingLedger,
        input_bytes: u64,
        output_bytes: u64,
        direction: Direction,
    ) -> Result<Self> {
        if ledger.is_empty() {
            return Err(Error::EmptyLedger);
        }
        let elapsed = ledger.total_elapsed();
        if elapsed.is_zero() {
            return Err(Error::ZeroElapsed);
        }
        let micros = elapsed.as_secs_f64() * 1_000_000.0;

        let effective = match direction {
            Direction::Compress => input_bytes,
            Direction::Decompress => output_bytes,
        };
        let throughput_mbit = (effective as f64 * 8.0) / micros;

        let (space_savings, compression_ratio) = match direction {
            Direction::Compress => (
                Some(1.0 - output_bytes as f64 / input_bytes as f64),
                Some(input_bytes as f64 / output_bytes as f64),
            ),
            Direction::Decompress => (None, None),
        };

        Ok(Self {
            direction,
            input_bytes,
            output_bytes,
            elapsed,
            throughput_mbit,
            space_savings,
            compression_ratio,
        })
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  time taken    : {:>9.3} ms",
            self.elapsed.as_secs_f64() * 1000.0
        )?;
        write!(f, "  throughput    : {:>9.3} Mbit/s", self.throughput_mbit)?;
        if let Some(savings) = self.space_savings {
            write!(f, "\n  space savings : {:>9.3} %", savings * 100.0)?;
        }
        if let Some(ratio) = self.compression_ratio {
            write!(f, "\n  ratio         : {:.3} : 1", ratio)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn two_call_ledger() -> TimingLedger {
        let t0 = Instant::now();
        let mut ledger = TimingLedger::new();
        ledger.record(t0, t0 + Duration::from_millis(100));
        ledger.record(t0 + Duration::from_millis(100), t0 + Duration::from_millis(300));
        ledger
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn compression_metrics() {
        let report =
            StatsReport::from_ledger(&two_call_ledger(), 1000, 400, Direction::Compress).unwrap();
        assert_eq!(report.elapsed, Duration::from_millis(300));
        assert!(close(report.throughput_mbit, (1000.0 * 8.0) / 300_000.0));
        assert!(close(report.compression_ratio.unwrap(), 2.5));
        assert!(close(report.space_savings.unwrap(), 0.6));
    }

    #[test]
    fn decompression_uses_output_side_and_omits_ratio() {
        let report =
            StatsReport::from_ledger(&two_call_ledger(), 400, 1000, Direction::Decompress)
                .unwrap();
        assert!(close(report.throughput_mbit, (1000.0 * 8.0) / 300_000.0));
        assert_eq!(report.space_savings, None);
        assert_eq!(report.compression_ratio, None);

        let text = report.to_string();
        assert!(text.contains("throughput"));
        assert!(!text.contains("ratio"));
    }

    #[test]
    fn empty_ledger_is_rejected() {
        let err = StatsReport::from_ledger(&TimingLedger::new(), 10, 10, Direction::Compress)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyLedger));
    }

    #[test]
    fn zero_length_samples_are_rejected() {
        let t0 = Instant::now();
        let mut ledger = TimingLedger::new();
        ledger.record(t0, t0);
        ledger.record(t0, t0);
        let err = StatsReport::from_ledger(&ledger, 10, 10, Direction::Decompress).unwrap_err();
        assert!(matches!(err, Error::ZeroElapsed));
    }

    #[test]
    fn display_renders_compression_lines() {
        let report =
            StatsReport::from_ledger(&two_call_ledger(), 1000, 400, Direction::Compress).unwrap();
        let text = report.to_string();
        assert!(text.contains("300.000 ms"), "{text}");
        assert!(text.contains("60.000 %"), "{text}");
        assert!(text.contains("2.500 : 1"), "{text}");
    }
}

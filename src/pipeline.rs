//! Packet to record pipeline
//!
//! [`Pipeline`] owns all per-run state: decoder, parser scratch buffer, field registry and
//! emitter. Packets are processed one at a time, in delivery order.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::capture::{CapturedPacket, PacketSource, SourceEvent};
use crate::emitter::RecordEmitter;
use crate::errors::Error;
use crate::format::{name_eq, FieldRegistry};
use crate::layers::http::{Direction, HttpParser};
use crate::packet::PacketDecoder;
use crate::rate::{HostStats, RateReport};

/// Outcome of processing one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Emitted,
    /// Not an HTTP request or response we can log, no record written.
    Dropped,
    /// A record was written and the parse count limit is reached.
    LimitReached,
}

pub struct Pipeline<W: Write> {
    decoder: PacketDecoder,
    parser: HttpParser,
    registry: FieldRegistry,
    emitter: RecordEmitter<W>,
    host_stats: Option<HostStats>,
    parse_count: Option<u64>,
    parsed: u64,
}

impl<W: Write> Pipeline<W> {
    pub fn new(decoder: PacketDecoder, registry: FieldRegistry, emitter: RecordEmitter<W>) -> Self {
        Self {
            decoder,
            parser: HttpParser::new(),
            registry,
            emitter,
            host_stats: None,
            parse_count: None,
            parsed: 0,
        }
    }

    /// Stop after `count` records. Zero means no limit.
    pub fn with_parse_count(mut self, count: u64) -> Self {
        self.parse_count = if count == 0 { None } else { Some(count) };
        self
    }

    pub fn with_host_stats(mut self, stats: HostStats) -> Self {
        self.host_stats = Some(stats);
        self
    }

    /// Number of records written so far.
    pub fn parsed(&self) -> u64 {
        self.parsed
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Decode, parse and emit one packet.
    ///
    /// Malformed or non-HTTP packets are dropped without touching the output. Only errors of
    /// the output sink are returned.
    pub fn process(&mut self, packet: &CapturedPacket<'_>) -> Result<Verdict, Error> {
        match self.extract(packet) {
            Ok(()) => {}
            Err(e) if e.is_packet_error() => {
                log::trace!("dropped packet: {}", e);
                return Ok(Verdict::Dropped);
            }
            Err(e) => return Err(e),
        }

        self.emitter.emit(&mut self.registry)?;
        self.parsed += 1;

        match self.parse_count {
            Some(limit) if self.parsed >= limit => Ok(Verdict::LimitReached),
            _ => Ok(Verdict::Emitted),
        }
    }

    // Fills the registry. Nothing is assigned unless the start line parsed, so a dropped
    // packet leaves the registry empty.
    fn extract(&mut self, packet: &CapturedPacket<'_>) -> Result<(), Error> {
        let decoded = self.decoder.decode(packet)?;
        let message = self.parser.parse(decoded.payload)?;
        let registry = &mut self.registry;

        for (name, value) in message.start_line().fields() {
            registry.assign(name, value);
        }
        let direction = message.direction();
        registry.assign("Direction", direction.marker());

        let mut host = None;
        for (name, value) in message.headers() {
            if name_eq(name, "Host") {
                host = Some(value);
            }
            registry.assign(name, value);
        }

        registry.assign("Source-IP", &decoded.src_addr.to_string());
        registry.assign("Dest-IP", &decoded.dst_addr.to_string());
        if let Some(ts) = decoded.timestamp.to_local_string() {
            registry.assign("Timestamp", &ts);
        }

        if let (Some(stats), Some(host), Direction::Request) =
            (self.host_stats.as_mut(), host, direction)
        {
            if let Some(report) = stats.update(host, decoded.timestamp.secs) {
                log_rate_report(&report);
            }
        }

        Ok(())
    }

    /// Process packets from `source` until it runs dry, the parse count is reached or `stop`
    /// is set. `stop` is checked between packets only. Returns the number of records written.
    pub fn run<S>(&mut self, source: &mut S, stop: &AtomicBool) -> Result<u64, Error>
    where
        S: PacketSource + ?Sized,
    {
        let result = self.drive(source, stop);
        // Pending rate report and buffered records are not lost on a source error.
        let finished = self.finish();

        result?;
        finished?;

        Ok(self.parsed)
    }

    fn drive<S>(&mut self, source: &mut S, stop: &AtomicBool) -> Result<(), Error>
    where
        S: PacketSource + ?Sized,
    {
        loop {
            if stop.load(Ordering::Relaxed) {
                log::info!("shutdown requested, stopping capture");
                return Ok(());
            }

            match source.next_packet()? {
                SourceEvent::Packet(packet) => {
                    if self.process(&packet)? == Verdict::LimitReached {
                        log::info!("parse count of {} reached", self.parsed);
                        return Ok(());
                    }
                }
                SourceEvent::Timeout => continue,
                SourceEvent::Eof => {
                    log::debug!("end of capture");
                    return Ok(());
                }
            }
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        if let Some(report) = self.host_stats.as_mut().and_then(HostStats::finish) {
            log_rate_report(&report);
        }
        self.emitter.flush()
    }

    pub fn into_emitter(self) -> RecordEmitter<W> {
        self.emitter
    }
}

fn log_rate_report(report: &RateReport) {
    log::info!(
        "request rates for {} second window starting at {}",
        report.interval,
        report.window_start
    );
    for host in &report.hosts {
        log::info!(
            "  {}: {:.2} rps ({} requests)",
            host.host,
            host.rate,
            host.requests
        );
    }
}

use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use log::{debug, info};

use super::PrintEvent;
use crate::{
    core::{parse::decode_table, sysctl},
    events::{Protocol, SocketEvent},
    helpers::signals::Running,
};

/// Granularity of the interval sleep, so termination signals are honored
/// without waiting out the full interval.
const SLEEP_CHUNK: Duration = Duration::from_millis(200);

/// Write one protocol batch in the wire format: one record per entry
/// terminated by a tab, then a lone newline closing the batch.
pub(crate) fn write_batch<W: Write>(w: &mut W, events: &[SocketEvent]) -> io::Result<()> {
    for event in events {
        write!(w, "{event}\t")?;
    }
    w.write_all(b"\n")
}

/// Main sampler object: runs the query -> walk -> decode -> format
/// pipeline for both protocols on each tick, then sleeps until the next
/// one.
pub(crate) struct Sampler {
    interval: Duration,
    run: Running,
    /// Wire output (the named pipe).
    sink: Box<dyn Write>,
    /// Optional per-record echo printers (e.g. stdout).
    printers: Vec<PrintEvent>,
}

impl Sampler {
    pub(crate) fn new(
        interval: Duration,
        run: Running,
        sink: Box<dyn Write>,
        printers: Vec<PrintEvent>,
    ) -> Self {
        Self {
            interval,
            run,
            sink,
            printers,
        }
    }

    /// Sample until a termination signal is received. Any query or sink
    /// failure is fatal: a silently-incomplete snapshot would mislead
    /// consumers more than an outage.
    pub(crate) fn run(&mut self) -> Result<()> {
        let mut ticks = 0u64;

        while self.run.running() {
            self.tick()?;
            ticks += 1;
            self.sleep();
        }

        info!("{ticks} snapshot(s) emitted");
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        for protocol in [Protocol::Udp, Protocol::Tcp] {
            let buf = sysctl::query(protocol)
                .with_context(|| format!("{protocol} table query failed"))?;
            let events = decode_table(&buf, protocol);
            debug!("{protocol}: {} socket(s)", events.len());

            write_batch(&mut self.sink, &events).context("could not write snapshot batch")?;
            for event in &events {
                self.printers
                    .iter_mut()
                    .try_for_each(|p| p.process_one(event))?;
            }
        }

        self.sink.flush().context("could not flush the output sink")?;
        self.printers.iter_mut().try_for_each(|p| p.flush())
    }

    fn sleep(&self) {
        let mut left = self.interval;
        while !left.is_zero() && self.run.running() {
            let chunk = left.min(SLEEP_CHUNK);
            thread::sleep(chunk);
            left = left.saturating_sub(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Endpoint, TcpState};

    #[test]
    fn batch_format() {
        let events = vec![
            SocketEvent {
                protocol: Protocol::Tcp,
                local: Endpoint::new(Some([192, 168, 0, 1].into()), 80),
                remote: Endpoint::new(Some([192, 168, 0, 2].into()), 51234),
                state: Some(TcpState(4)),
            },
            SocketEvent {
                protocol: Protocol::Tcp,
                local: Endpoint::new(Some([0, 0, 0, 0].into()), 22),
                remote: Endpoint::new(Some([0, 0, 0, 0].into()), 0),
                state: Some(TcpState(1)),
            },
        ];

        let mut out = Vec::new();
        write_batch(&mut out, &events).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "TCP,192.168.0.1:80,192.168.0.2:51234,ESTABLISHED\tTCP,0.0.0.0:22,0.0.0.0:0,LISTEN\t\n"
        );
    }

    #[test]
    fn empty_batch_format() {
        // An empty table still terminates its batch with a lone newline.
        let mut out = Vec::new();
        write_batch(&mut out, &[]).unwrap();
        assert_eq!(out, b"\n");
    }
}

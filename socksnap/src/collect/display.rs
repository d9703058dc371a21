use std::io::Write;

use anyhow::Result;

use crate::events::SocketEvent;

/// Select the format to follow when echoing records with `PrintEvent`.
pub(crate) enum PrintEventFormat {
    /// One record per line, using the same field layout as the wire
    /// format.
    Text,
    /// One JSON object per line.
    Json,
}

/// Handles records individually and writes them to a `Write`.
pub(crate) struct PrintEvent {
    writer: Box<dyn Write>,
    format: PrintEventFormat,
}

impl PrintEvent {
    pub(crate) fn new(writer: Box<dyn Write>, format: PrintEventFormat) -> Self {
        Self { writer, format }
    }

    /// Process records one by one (format & print).
    pub(crate) fn process_one(&mut self, event: &SocketEvent) -> Result<()> {
        match self.format {
            PrintEventFormat::Text => writeln!(self.writer, "{event}")?,
            PrintEventFormat::Json => {
                let mut line = serde_json::to_vec(event)?;
                line.push(b'\n');
                self.writer.write_all(&line)?;
            }
        }

        Ok(())
    }

    /// Flush the underlying writer.
    pub(crate) fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io, rc::Rc};

    use super::*;
    use crate::events::{Endpoint, Protocol, TcpState};

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn event() -> SocketEvent {
        SocketEvent {
            protocol: Protocol::Tcp,
            local: Endpoint::new(Some([192, 168, 0, 1].into()), 80),
            remote: Endpoint::new(Some([192, 168, 0, 2].into()), 51234),
            state: Some(TcpState(1)),
        }
    }

    #[test]
    fn print_text() {
        let out = Shared::default();
        let mut printer = PrintEvent::new(Box::new(out.clone()), PrintEventFormat::Text);

        printer.process_one(&event()).unwrap();
        assert_eq!(
            String::from_utf8(out.0.borrow().clone()).unwrap(),
            "TCP,192.168.0.1:80,192.168.0.2:51234,LISTEN\n"
        );
    }

    #[test]
    fn print_json() {
        let out = Shared::default();
        let mut printer = PrintEvent::new(Box::new(out.clone()), PrintEventFormat::Json);

        printer.process_one(&event()).unwrap();
        assert_eq!(
            String::from_utf8(out.0.borrow().clone()).unwrap(),
            r#"{"protocol":"tcp","local":"192.168.0.1:80","remote":"192.168.0.2:51234","state":"LISTEN"}"#
                .to_owned()
                + "\n"
        );
    }
}

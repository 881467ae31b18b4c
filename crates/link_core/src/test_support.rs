//! Transporte e sampler em memória para os testes do crate.

use crate::sampler::SystemSampler;
use crate::transport::{OpenOptions, PortHandle, SerialTransport, TransportError};
use crate::types::{PortDescriptor, Sample};
use chrono::NaiveTime;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Espera uma condição ficar verdadeira, com limite de tempo.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

// ──────────────────────────────────────────────
// Sampler
// ──────────────────────────────────────────────

pub struct FixedSampler {
    sample: Sample,
    calls: AtomicUsize,
}

impl FixedSampler {
    /// Amostra do exemplo de referência do protocolo.
    pub fn reference() -> Self {
        Self {
            sample: Sample {
                timestamp: NaiveTime::from_hms_opt(14, 5, 9).unwrap(),
                cpu_percent: 23.5,
                mem_used_gib: 6.12,
                mem_total_gib: 15.89,
                process_count: 287,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SystemSampler for FixedSampler {
    fn sample(&self) -> Sample {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sample.clone()
    }
}

// ──────────────────────────────────────────────
// Porta
// ──────────────────────────────────────────────

/// Estado compartilhado de uma "porta" em memória.
#[derive(Default)]
pub struct MockLine {
    writes: Mutex<Vec<(Instant, String)>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
    open: AtomicBool,
    write_after_close: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockLine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_handle(self: &Arc<Self>) -> Box<dyn PortHandle> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Box::new(MockHandle {
            line: Arc::clone(self),
            buf: Vec::new(),
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn lines(&self) -> Vec<String> {
        self.writes.lock().unwrap().iter().map(|(_, l)| l.clone()).collect()
    }

    pub fn first_write_at(&self) -> Option<Instant> {
        self.writes.lock().unwrap().first().map(|(at, _)| *at)
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn wrote_after_close(&self) -> bool {
        self.write_after_close.load(Ordering::SeqCst)
    }
}

struct MockHandle {
    line: Arc<MockLine>,
    buf: Vec<u8>,
}

impl Write for MockHandle {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.line.is_open() {
            self.line.write_after_close.store(true, Ordering::SeqCst);
        }
        if self.line.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        self.line.writes.lock().unwrap().push((Instant::now(), line));
        Ok(())
    }
}

impl PortHandle for MockHandle {
    fn close(self: Box<Self>) -> Result<(), TransportError> {
        self.line.closes.fetch_add(1, Ordering::SeqCst);
        self.line.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Transporte
// ──────────────────────────────────────────────

pub struct MockTransport {
    pub line: Arc<MockLine>,
    ports: Mutex<Vec<PortDescriptor>>,
    refuse_open: AtomicBool,
    fail_enumeration: AtomicBool,
    last_options: Mutex<Option<OpenOptions>>,
}

impl MockTransport {
    pub fn new(ports: Vec<PortDescriptor>) -> Self {
        Self {
            line: MockLine::new(),
            ports: Mutex::new(ports),
            refuse_open: AtomicBool::new(false),
            fail_enumeration: AtomicBool::new(false),
            last_options: Mutex::new(None),
        }
    }

    pub fn with_uno() -> Self {
        Self::new(vec![uno(), PortDescriptor::new("Bluetooth (COM7)", "COM7")])
    }

    pub fn set_ports(&self, ports: Vec<PortDescriptor>) {
        *self.ports.lock().unwrap() = ports;
    }

    pub fn refuse_open(&self, refuse: bool) {
        self.refuse_open.store(refuse, Ordering::SeqCst);
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    pub fn last_options(&self) -> Option<OpenOptions> {
        *self.last_options.lock().unwrap()
    }
}

pub fn uno() -> PortDescriptor {
    PortDescriptor::new("Arduino Uno (COM3)", "COM3")
}

impl SerialTransport for MockTransport {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, TransportError> {
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(TransportError::Enumerate("udev indisponível".into()));
        }
        Ok(self.ports.lock().unwrap().clone())
    }

    fn open(
        &self,
        address: &str,
        options: &OpenOptions,
    ) -> Result<Box<dyn PortHandle>, TransportError> {
        *self.last_options.lock().unwrap() = Some(*options);
        if self.refuse_open.load(Ordering::SeqCst) {
            return Err(TransportError::Open {
                address: address.to_string(),
                reason: "access denied".into(),
            });
        }
        Ok(self.line.open_handle())
    }
}

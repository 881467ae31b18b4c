//! Thread de publicação: amostra → linha → porta, uma vez por intervalo.
//!
//! Cada sessão tem exatamente uma thread. Ela é dona exclusiva do
//! [`PortHandle`] enquanto roda e o devolve no `join`, de modo que o
//! controller só fecha a porta depois que nenhuma escrita está em curso.

use crate::protocol::encode_line;
use crate::sampler::SystemSampler;
use crate::transport::PortHandle;
use crate::types::LinkEvent;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Cadência do loop.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    /// Espera antes da primeira amostra
    pub settle: Duration,
    /// Espera entre ciclos
    pub interval: Duration,
}

/// Handle da thread de publicação, mantido pela sessão.
pub struct PublisherHandle {
    stop_tx: Sender<()>,
    running: Arc<AtomicBool>,
    join: JoinHandle<Option<Box<dyn PortHandle>>>,
}

impl PublisherHandle {
    /// `false` depois que o loop terminou por conta própria (falha de escrita).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Sinaliza parada e aguarda a thread terminar.
    ///
    /// Retorna a porta se ela ainda estiver aberta; `None` quando o loop
    /// já a fechou após uma falha de escrita.
    pub fn stop(self) -> Option<Box<dyn PortHandle>> {
        // Derrubar o sender acorda o recv_timeout imediatamente
        drop(self.stop_tx);
        match self.join.join() {
            Ok(port) => port,
            Err(_) => {
                error!("Thread de publicação terminou em pânico");
                None
            }
        }
    }
}

/// Falha ao criar a thread. A porta volta intacta para quem chamou fechar.
pub struct SpawnError {
    pub source: std::io::Error,
    pub port: Box<dyn PortHandle>,
}

impl std::fmt::Debug for SpawnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnError")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Inicia a thread de publicação para uma sessão.
pub fn spawn_publisher<S: SystemSampler>(
    port: Box<dyn PortHandle>,
    sampler: Arc<S>,
    observers: Vec<Sender<LinkEvent>>,
    cadence: Cadence,
) -> Result<PublisherHandle, SpawnError> {
    let builder = std::thread::Builder::new().name("serial-publisher".into());
    spawn_on(builder, port, sampler, observers, cadence)
}

fn spawn_on<S: SystemSampler>(
    builder: std::thread::Builder,
    port: Box<dyn PortHandle>,
    sampler: Arc<S>,
    observers: Vec<Sender<LinkEvent>>,
    cadence: Cadence,
) -> Result<PublisherHandle, SpawnError> {
    let (stop_tx, stop_rx) = bounded::<()>(1);
    // A porta só é entregue depois que a thread existe
    let (port_tx, port_rx) = bounded::<Box<dyn PortHandle>>(1);
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let spawned = builder.spawn(move || {
        let Ok(port) = port_rx.recv() else {
            flag.store(false, Ordering::Release);
            return None;
        };
        publish_loop(port, &*sampler, &stop_rx, &flag, &observers, cadence)
    });

    let join = match spawned {
        Ok(join) => join,
        Err(source) => return Err(SpawnError { source, port }),
    };
    if let Err(e) = port_tx.send(port) {
        // Só acontece se a thread morreu antes de receber
        let _ = join.join();
        return Err(SpawnError {
            source: std::io::Error::other("thread de publicação encerrada antes de iniciar"),
            port: e.into_inner(),
        });
    }

    Ok(PublisherHandle {
        stop_tx,
        running,
        join,
    })
}

fn publish_loop<S: SystemSampler>(
    mut port: Box<dyn PortHandle>,
    sampler: &S,
    stop_rx: &Receiver<()>,
    running: &AtomicBool,
    observers: &[Sender<LinkEvent>],
    cadence: Cadence,
) -> Option<Box<dyn PortHandle>> {
    info!(
        "Publicação iniciada (espera inicial {:?}, intervalo {:?})",
        cadence.settle, cadence.interval
    );

    let mut delay = cadence.settle;
    let mut cycles: u64 = 0;
    loop {
        if stopped(stop_rx, delay) {
            info!("Publicação encerrada após {cycles} ciclos");
            running.store(false, Ordering::Release);
            return Some(port);
        }
        delay = cadence.interval;

        let line = encode_line(&sampler.sample());
        match port.write_all(line.as_bytes()).and_then(|()| port.flush()) {
            Ok(()) => {
                cycles += 1;
                debug!("→ {line}");
            }
            Err(e) => {
                error!("Falha ao escrever na porta serial: {e}. Encerrando sessão");
                running.store(false, Ordering::Release);
                if let Err(e) = port.close() {
                    warn!("Erro ao fechar porta após falha: {e}");
                }
                for tx in observers {
                    let _ = tx.send(LinkEvent::WriteFailed(e.to_string()));
                }
                return None;
            }
        }
    }
}

/// Espera `delay` ou até o sinal de parada, o que vier primeiro.
fn stopped(stop_rx: &Receiver<()>, delay: Duration) -> bool {
    match stop_rx.recv_timeout(delay) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

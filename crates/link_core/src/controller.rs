//! Máquina de estados da conexão serial.
//!
//! ```text
//!          connect(porta) ok
//!   Idle ─────────────────────▶ Connected
//!    ▲                              │
//!    └──── disconnect() / falha ────┘
//! ```
//!
//! `connect` em `Connected` e `disconnect` em `Idle` são rejeitados com
//! erro. No máximo uma sessão existe por vez.

use crate::config::LinkConfig;
use crate::publisher::{Cadence, PublisherHandle, SpawnError, spawn_publisher};
use crate::sampler::SystemSampler;
use crate::transport::{OpenOptions, PortHandle, SerialTransport, TransportError};
use crate::types::{LinkEvent, LinkState, PortDescriptor};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use tracing::{info, warn};

/// Erros de `connect`.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Já conectado, porta ausente da enumeração atual ou enumeração falhou
    #[error("Porta indisponível: {0}")]
    PortUnavailable(String),

    /// A abertura foi tentada e falhou
    #[error("Falha ao abrir porta: {0}")]
    OpenFailure(#[from] TransportError),
}

/// Erros de `disconnect`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DisconnectError {
    #[error("Nenhuma sessão ativa")]
    NotConnected,
}

struct Session {
    port: PortDescriptor,
    publisher: PublisherHandle,
}

/// Dono da única sessão serial do processo.
pub struct ConnectionController<T: SerialTransport, S: SystemSampler> {
    transport: T,
    sampler: Arc<S>,
    config: LinkConfig,
    session: Option<Session>,
    observers: Vec<Sender<LinkEvent>>,
}

impl<T: SerialTransport, S: SystemSampler> ConnectionController<T, S> {
    pub fn new(transport: T, sampler: S, config: LinkConfig) -> Self {
        Self {
            transport,
            sampler: Arc::new(sampler),
            config,
            session: None,
            observers: Vec::new(),
        }
    }

    /// Registra um observador de eventos de status.
    ///
    /// Uma sessão já em andamento continua notificando apenas os
    /// observadores registrados antes dela começar.
    pub fn subscribe(&mut self) -> Receiver<LinkEvent> {
        let (tx, rx) = unbounded();
        self.observers.push(tx);
        rx
    }

    /// Enumera as portas disponíveis agora. Nada é guardado em cache.
    pub fn list_ports(&self) -> Result<Vec<PortDescriptor>, TransportError> {
        self.transport.list_ports()
    }

    pub fn connect(&mut self, port: &PortDescriptor) -> Result<(), ConnectError> {
        self.reap();

        if let Some(session) = &self.session {
            warn!("Conexão recusada: sessão ativa em {}", session.port);
            return Err(ConnectError::PortUnavailable(format!(
                "já conectado em {}",
                session.port
            )));
        }

        // O descritor precisa vir da enumeração mais recente
        let ports = self.transport.list_ports().map_err(|e| {
            warn!("Enumeração falhou ao conectar em {}: {e}", port.address);
            ConnectError::PortUnavailable(format!("{} não confirmada: {e}", port.address))
        })?;
        let current = ports
            .into_iter()
            .find(|p| p.address == port.address)
            .ok_or_else(|| {
                warn!("Porta {} não está mais disponível", port.address);
                ConnectError::PortUnavailable(format!("{} não encontrada", port.address))
            })?;

        let options = OpenOptions::immediate(self.config.baud_rate);
        let handle = self.transport.open(&current.address, &options)?;

        let cadence = Cadence {
            settle: self.config.settle(),
            interval: self.config.interval(),
        };
        let publisher = match spawn_publisher(
            handle,
            Arc::clone(&self.sampler),
            self.observers.clone(),
            cadence,
        ) {
            Ok(publisher) => publisher,
            Err(SpawnError { source, port }) => {
                close_port(port, &current);
                return Err(TransportError::Io(source).into());
            }
        };

        info!("Conectado: {} ({})", current, current.address);
        self.notify(LinkEvent::Connected(current.clone()));
        self.session = Some(Session {
            port: current,
            publisher,
        });
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), DisconnectError> {
        self.reap();

        let session = self.session.take().ok_or_else(|| {
            warn!("Desconexão recusada: nenhuma sessão ativa");
            DisconnectError::NotConnected
        })?;

        // Join antes de fechar: nenhuma escrita pode estar em curso
        if let Some(handle) = session.publisher.stop() {
            close_port(handle, &session.port);
        }

        info!("Desconectado de {}", session.port);
        self.notify(LinkEvent::Disconnected);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.publisher.is_running())
    }

    pub fn state(&self) -> LinkState {
        if self.is_connected() {
            LinkState::Connected
        } else {
            LinkState::Idle
        }
    }

    /// Porta da sessão ativa, se houver.
    pub fn current_port(&self) -> Option<&PortDescriptor> {
        self.session
            .as_ref()
            .filter(|s| s.publisher.is_running())
            .map(|s| &s.port)
    }

    /// Texto de tooltip: `"Connected: <porta>"` ou `"Disconnected"`.
    pub fn status_label(&self) -> String {
        match self.current_port() {
            Some(port) => LinkEvent::Connected(port.clone()).label(),
            None => LinkEvent::Disconnected.label(),
        }
    }

    /// Descarta a sessão cujo loop terminou sozinho após falha de escrita.
    /// O loop já fechou a porta e avisou os observadores.
    fn reap(&mut self) {
        if self.session.as_ref().is_some_and(|s| !s.publisher.is_running()) {
            if let Some(session) = self.session.take() {
                info!("Sessão em {} encerrada por falha de escrita", session.port);
                // Só o join: o loop devolve None depois de fechar a porta
                let _ = session.publisher.stop();
            }
        }
    }

    fn notify(&self, event: LinkEvent) {
        for tx in &self.observers {
            let _ = tx.send(event.clone());
        }
    }
}

fn close_port(handle: Box<dyn PortHandle>, port: &PortDescriptor) {
    if let Err(e) = handle.close() {
        warn!("Erro ao fechar {}: {e}", port.address);
    }
}

impl<T: SerialTransport, S: SystemSampler> Drop for ConnectionController<T, S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            let _ = self.disconnect();
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

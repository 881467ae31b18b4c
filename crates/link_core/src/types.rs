//! Tipos de dados do link serial.
//!
//! [`Sample`] é um valor transitório: produzido e consumido dentro de um
//! único ciclo do loop de publicação, nunca enfileirado.

use chrono::NaiveTime;
use std::fmt;

// ──────────────────────────────────────────────
// Portas
// ──────────────────────────────────────────────

/// Porta serial descoberta pela enumeração do transporte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortDescriptor {
    /// Nome amigável exibido ao usuário (ex: "Arduino Uno (COM3)")
    pub display_name: String,
    /// Endereço usado para abrir a porta (ex: "/dev/ttyACM0", "COM3")
    pub address: String,
}

impl PortDescriptor {
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

// ──────────────────────────────────────────────
// Amostra
// ──────────────────────────────────────────────

/// Uma leitura pontual das métricas do host.
///
/// Os campos em ponto flutuante já chegam truncados em duas casas
/// (ver [`crate::sampler`]); o encoder não arredonda nada.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Hora local com precisão de segundos
    pub timestamp: NaiveTime,
    /// Carga da CPU (0–100%)
    pub cpu_percent: f64,
    /// Memória usada (GiB)
    pub mem_used_gib: f64,
    /// Memória total (GiB)
    pub mem_total_gib: f64,
    /// Processos vivos no host
    pub process_count: u32,
}

// ──────────────────────────────────────────────
// Estado da conexão
// ──────────────────────────────────────────────

/// Estado observável do [`crate::ConnectionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connected,
}

/// Eventos de status entregues aos observadores do controller.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Sessão aberta na porta indicada
    Connected(PortDescriptor),
    /// Sessão encerrada pelo usuário
    Disconnected,
    /// Sessão encerrada por falha de escrita; carrega o erro original
    WriteFailed(String),
}

impl LinkEvent {
    /// Texto de tooltip correspondente ao evento.
    pub fn label(&self) -> String {
        match self {
            LinkEvent::Connected(port) => format!("Connected: {port}"),
            LinkEvent::Disconnected | LinkEvent::WriteFailed(_) => "Disconnected".into(),
        }
    }
}

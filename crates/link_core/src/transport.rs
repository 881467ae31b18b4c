//! Abstração do transporte serial.
//!
//! O core nunca fala com um driver concreto: a enumeração e a abertura de
//! portas passam por [`SerialTransport`], e a escrita por [`PortHandle`].

use crate::types::PortDescriptor;
use std::io::Write;
use std::time::Duration;

/// Erros do transporte serial.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Falha ao enumerar portas: {0}")]
    Enumerate(String),

    #[error("Falha ao abrir {address}: {reason}")]
    Open { address: String, reason: String },

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),
}

/// Parâmetros de abertura de porta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub baud_rate: u32,
    /// Timeout de leitura/escrita. O controller sempre usa zero para que
    /// uma escrita nunca fique presa esperando o dispositivo.
    pub timeout: Duration,
}

impl OpenOptions {
    pub fn immediate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            timeout: Duration::ZERO,
        }
    }
}

/// Porta aberta. Escrita exclusiva do loop de publicação.
pub trait PortHandle: Write + Send {
    /// Fecha a porta. Consome o handle, então não há fechamento duplo.
    fn close(self: Box<Self>) -> Result<(), TransportError>;
}

/// Colaborador externo que enumera e abre portas seriais.
pub trait SerialTransport: Send + Sync {
    /// Portas disponíveis agora, na ordem devolvida pelo sistema.
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, TransportError>;

    fn open(
        &self,
        address: &str,
        options: &OpenOptions,
    ) -> Result<Box<dyn PortHandle>, TransportError>;
}

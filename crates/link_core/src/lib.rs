//! # Link Core
//!
//! Núcleo do Arduino Link: mantém no máximo uma conexão serial ativa e,
//! enquanto ela existir, envia uma linha de telemetria do host por segundo.
//!
//! ## Módulos
//! - [`controller`] – Máquina de estados `Idle`/`Connected`
//! - [`publisher`] – Thread de publicação por sessão
//! - [`protocol`] – Encode/decode da linha `4;TIME:;...`
//! - [`sampler`] – Trait de amostragem e política de truncamento
//! - [`transport`] – Abstração da porta serial
//! - [`config`] – Configuração opcional via TOML
//! - [`types`] – Portas, amostras, eventos

pub mod config;
pub mod controller;
pub mod protocol;
pub mod publisher;
pub mod sampler;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports convenientes
pub use config::{AppConfig, LinkConfig};
pub use controller::{ConnectError, ConnectionController, DisconnectError};
pub use protocol::{FIELD_COUNT, decode_line, encode_line};
pub use sampler::{RawReading, SystemSampler};
pub use transport::{OpenOptions, PortHandle, SerialTransport, TransportError};
pub use types::{LinkEvent, LinkState, PortDescriptor, Sample};

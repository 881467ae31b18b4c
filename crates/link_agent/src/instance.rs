//! Garante uma única instância por host.
//!
//! Mantém um listener TCP em `127.0.0.1:<porta>` durante toda a vida do
//! processo. Se o bind falhar, outra instância já está rodando.

use std::io;
use std::net::{Ipv4Addr, TcpListener};

/// Porta local usada como trava.
pub const INSTANCE_PORT: u16 = 1258;

/// Trava ativa enquanto viver.
pub struct InstanceGuard {
    listener: TcpListener,
}

impl InstanceGuard {
    pub fn acquire(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))?;
        Ok(Self { listener })
    }

    pub fn port(&self) -> io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }
}

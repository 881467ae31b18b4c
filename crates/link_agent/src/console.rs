//! Console de comandos: a interface mínima de UI sobre o controller.
//!
//! Cada linha do stdin é um comando (`list`, `connect`, `disconnect`,
//! `status`, `help`, `quit`). Os índices de `connect <n>` referem-se à
//! última listagem mostrada.

use link_core::controller::ConnectionController;
use link_core::sampler::SystemSampler;
use link_core::transport::SerialTransport;
use link_core::types::PortDescriptor;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tracing::debug;

const HELP: &str = "\
Comandos:
  list                     Lista as portas disponíveis
  connect <n|endereço>     Conecta na porta n da última listagem ou no endereço
  disconnect               Encerra a sessão
  status                   Mostra o estado atual
  quit                     Sai";

/// Porta escolhida pelo usuário.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Index(usize),
    Address(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Connect(Target),
    Disconnect,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next();

        let command = match (verb, arg) {
            ("list" | "ls", None) => Command::List,
            ("connect" | "c", Some(target)) => Command::Connect(match target.parse::<usize>() {
                Ok(index) => Target::Index(index),
                Err(_) => Target::Address(target.to_string()),
            }),
            ("connect" | "c", None) => return Err("connect exige uma porta".into()),
            ("disconnect" | "d", None) => Command::Disconnect,
            ("status" | "s", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            ("", _) => return Err("comando vazio".into()),
            (_, Some(_)) if matches!(verb, "list" | "disconnect" | "status" | "help" | "quit") => {
                return Err(format!("{verb} não aceita argumentos"));
            }
            _ => return Err(format!("comando desconhecido: {verb}")),
        };

        if words.next().is_some() {
            return Err("argumentos demais".into());
        }
        Ok(command)
    }
}

/// Resolve o alvo contra a última listagem.
///
/// Endereços fora da listagem seguem adiante; o controller reenumera e
/// recusa portas que não existem mais.
pub fn resolve_target(listing: &[PortDescriptor], target: &Target) -> Option<PortDescriptor> {
    match target {
        Target::Index(index) => listing.get(*index).cloned(),
        Target::Address(address) => Some(
            listing
                .iter()
                .find(|p| &p.address == address)
                .cloned()
                .unwrap_or_else(|| PortDescriptor::new(address.clone(), address.clone())),
        ),
    }
}

pub struct Console<T: SerialTransport, S: SystemSampler> {
    controller: ConnectionController<T, S>,
    listing: Vec<PortDescriptor>,
}

impl<T: SerialTransport, S: SystemSampler> Console<T, S> {
    pub fn new(controller: ConnectionController<T, S>) -> Self {
        Self {
            controller,
            listing: Vec::new(),
        }
    }

    /// Lê comandos até `quit` ou fim da entrada. Desconecta ao sair.
    pub fn run<R: BufRead, W: Write>(mut self, input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "{HELP}")?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            debug!("Comando: {line}");

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command, out)?,
                Err(e) => writeln!(out, "Erro: {e}")?,
            }
        }

        if self.controller.is_connected() {
            let _ = self.controller.disconnect();
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<()> {
        match command {
            Command::List => match self.controller.list_ports() {
                Ok(ports) => {
                    if ports.is_empty() {
                        writeln!(out, "Nenhuma porta encontrada")?;
                    }
                    for (i, port) in ports.iter().enumerate() {
                        writeln!(out, "{i:>3}  {port}  [{}]", port.address)?;
                    }
                    self.listing = ports;
                }
                Err(e) => writeln!(out, "Erro: {e}")?,
            },
            Command::Connect(target) => match resolve_target(&self.listing, &target) {
                Some(port) => match self.controller.connect(&port) {
                    Ok(()) => writeln!(out, "Connected: {port}")?,
                    Err(e) => writeln!(out, "Erro: {e}")?,
                },
                None => writeln!(out, "Erro: índice fora da listagem (use `list`)")?,
            },
            Command::Disconnect => match self.controller.disconnect() {
                Ok(()) => writeln!(out, "Disconnected")?,
                Err(e) => writeln!(out, "Erro: {e}")?,
            },
            Command::Status => writeln!(out, "{}", self.controller.status_label())?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }
}

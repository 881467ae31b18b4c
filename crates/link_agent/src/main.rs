//! # Arduino Link
//!
//! Envia telemetria do host (hora, CPU, memória, processos) para um
//! Arduino pela porta serial, uma linha por segundo, enquanto a conexão
//! estiver ativa.
//!
//! ## Uso
//! ```bash
//! arduino-link                      # Console interativo
//! arduino-link --port /dev/ttyACM0  # Conecta ao iniciar
//! arduino-link --list               # Lista portas e sai
//! ```

mod cli;
mod console;
mod instance;
mod monitor;
mod serial;

use cli::{Args, USAGE};
use console::Console;
use crossbeam_channel::Receiver;
use instance::{INSTANCE_PORT, InstanceGuard};
use link_core::config::AppConfig;
use link_core::controller::ConnectionController;
use link_core::protocol::{decode_line, encode_line};
use link_core::sampler::SystemSampler;
use link_core::transport::SerialTransport;
use link_core::types::{LinkEvent, PortDescriptor};
use monitor::HostMonitor;
use serial::SerialPortTransport;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    // ── Carregar config ──
    let mut config = args
        .config
        .as_deref()
        .map(AppConfig::load)
        .unwrap_or_default();
    if let Some(port) = &args.port {
        config.link.port = port.clone();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        return ExitCode::FAILURE;
    }

    if args.list {
        return list_ports(&SerialPortTransport);
    }
    if args.dry_run {
        return dry_run(&HostMonitor::new());
    }

    // ── Instância única ──
    let _guard = match InstanceGuard::acquire(INSTANCE_PORT) {
        Ok(guard) => guard,
        Err(e) => {
            error!("Outra instância já está rodando (127.0.0.1:{INSTANCE_PORT}: {e})");
            return ExitCode::FAILURE;
        }
    };

    let mut controller =
        ConnectionController::new(SerialPortTransport, HostMonitor::new(), config.link.clone());
    info!("Host monitor inicializado");

    spawn_status_printer(controller.subscribe());

    if !config.link.port.is_empty() {
        let address = config.link.port.clone();
        if let Err(e) = controller.connect(&PortDescriptor::new(address.clone(), address)) {
            warn!("Conexão inicial falhou: {e}");
        }
    }

    // ── Loop principal ──
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    match Console::new(controller).run(stdin.lock(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Erro no console: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Imprime mudanças de status (o equivalente ao tooltip da bandeja).
fn spawn_status_printer(events: Receiver<LinkEvent>) {
    let spawned = std::thread::Builder::new()
        .name("status-printer".into())
        .spawn(move || {
            for event in events {
                if let LinkEvent::WriteFailed(reason) = &event {
                    println!("[status] Sessão perdida: {reason}");
                }
                println!("[status] {}", event.label());
            }
        });
    if let Err(e) = spawned {
        warn!("Sem thread de status: {e}");
    }
}

fn list_ports(transport: &impl SerialTransport) -> ExitCode {
    match transport.list_ports() {
        Ok(ports) => {
            if ports.is_empty() {
                println!("Nenhuma porta encontrada");
            }
            for (i, port) in ports.iter().enumerate() {
                println!("{i:>3}  {port}  [{}]", port.address);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Amostra uma vez, mostra a linha e os campos lidos de volta.
fn dry_run(sampler: &impl SystemSampler) -> ExitCode {
    // Espera o intervalo mínimo para a carga de CPU ser significativa
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

    let line = encode_line(&sampler.sample());
    println!("{line}");
    match decode_line(&line) {
        Ok(sample) => {
            println!("  hora:      {}", sample.timestamp);
            println!("  cpu:       {}%", sample.cpu_percent);
            println!(
                "  memória:   {} / {} GiB",
                sample.mem_used_gib, sample.mem_total_gib
            );
            println!("  processos: {}", sample.process_count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Linha gerada não é válida: {e}");
            ExitCode::FAILURE
        }
    }
}

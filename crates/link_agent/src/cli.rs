//! Argumentos de linha de comando.

use std::path::PathBuf;

pub const USAGE: &str = "\
Uso: arduino-link [opções]

  --config <arquivo>   Lê configuração TOML (nada é gravado)
  --port <endereço>    Conecta nessa porta ao iniciar
  --list               Lista as portas seriais e sai
  --dry-run            Mostra uma linha de telemetria e sai
  -h, --help           Mostra esta ajuda";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub port: Option<String>,
    pub list: bool,
    pub dry_run: bool,
    pub help: bool,
}

impl Args {
    /// Interpreta os argumentos, sem o nome do programa.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut parsed = Args::default();
        let mut it = args.into_iter();

        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--config" => {
                    let path = it.next().ok_or("--config exige um caminho")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--port" => {
                    let port = it.next().ok_or("--port exige um endereço")?;
                    parsed.port = Some(port);
                }
                "--list" => parsed.list = true,
                "--dry-run" => parsed.dry_run = true,
                "-h" | "--help" => parsed.help = true,
                _ if arg.starts_with("--config=") => {
                    parsed.config = arg.split_once('=').map(|(_, v)| PathBuf::from(v));
                }
                _ if arg.starts_with("--port=") => {
                    parsed.port = arg.split_once('=').map(|(_, v)| v.to_string());
                }
                other => return Err(format!("Argumento desconhecido: {other}")),
            }
        }

        Ok(parsed)
    }
}

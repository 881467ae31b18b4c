//! Configuração opcional via TOML.
//!
//! Os padrões reproduzem o comportamento do link sem arquivo algum. O
//! arquivo só é lido quando passado explicitamente e nunca é gravado.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const MIN_DELAY_MS: u64 = 10;
const MAX_DELAY_MS: u64 = 60_000;

/// Configuração do link serial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Baud rate da porta (o firmware de referência usa 9600)
    pub baud_rate: u32,
    /// Intervalo entre ciclos em milissegundos
    pub interval_ms: u64,
    /// Espera antes da primeira amostra, para o dispositivo resetar
    pub settle_ms: u64,
    /// Endereço para conectar na inicialização (vazio = nenhum)
    pub port: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            interval_ms: 1000,
            settle_ms: 1000,
            port: String::new(),
        }
    }
}

impl LinkConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub link: LinkConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML, caindo nos padrões em caso de erro.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => {
                    info!("Configuração carregada de {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Erro ao parsear {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                warn!("Erro ao ler {}: {}", path.display(), e);
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let link = &self.link;

        if link.baud_rate == 0 {
            errors.push("Baud rate não pode ser 0".into());
        }
        if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&link.interval_ms) {
            errors.push(format!(
                "Intervalo inválido: {}ms ({MIN_DELAY_MS}–{MAX_DELAY_MS})",
                link.interval_ms
            ));
        }
        if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&link.settle_ms) {
            errors.push(format!(
                "Espera inicial inválida: {}ms ({MIN_DELAY_MS}–{MAX_DELAY_MS})",
                link.settle_ms
            ));
        }

        errors
    }
}

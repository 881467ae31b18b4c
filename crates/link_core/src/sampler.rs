//! Leitura das métricas do host e política de truncamento numérico.
//!
//! O dispositivo compara valores com a precisão exata que o firmware
//! espera, então a ordem das operações abaixo é fixa:
//!
//! - CPU: fração × 100 × 100, truncada para inteiro, ÷ 100.0
//! - Memória: bytes × 100, divisão inteira por 1024³, ÷ 100.0
//!
//! Nada é arredondado; o resultado tem no máximo duas casas decimais.

use crate::types::Sample;
use chrono::NaiveTime;

/// Bytes em 1 GiB (binário).
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Fonte de amostras do host.
///
/// Implementações podem manter estado interno (contadores de CPU), mas
/// cada chamada é uma consulta independente, sem efeitos colaterais
/// visíveis ao controller.
pub trait SystemSampler: Send + Sync + 'static {
    fn sample(&self) -> Sample;
}

/// Leitura bruta do sistema operacional, antes do truncamento.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    /// Carga da CPU em [0, 1]
    pub cpu_load: f64,
    pub mem_total_bytes: u64,
    pub mem_available_bytes: u64,
    pub process_count: u32,
}

impl RawReading {
    /// Aplica a política de truncamento e carimba o horário.
    pub fn into_sample(self, timestamp: NaiveTime) -> Sample {
        let used = self.mem_total_bytes.saturating_sub(self.mem_available_bytes);
        Sample {
            timestamp,
            cpu_percent: cpu_percent(self.cpu_load),
            mem_used_gib: gib_truncated(used),
            mem_total_gib: gib_truncated(self.mem_total_bytes),
            process_count: self.process_count,
        }
    }
}

/// Converte a fração de carga em percentual truncado em duas casas.
pub fn cpu_percent(load: f64) -> f64 {
    (load * 100.0 * 100.0) as i32 as f64 / 100.0
}

/// Converte bytes em GiB truncado em duas casas.
pub fn gib_truncated(bytes: u64) -> f64 {
    (bytes.saturating_mul(100) / GIB) as f64 / 100.0
}

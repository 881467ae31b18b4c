//! Formato de linha enviado ao dispositivo.
//!
//! Uma linha por ciclo, campos separados por `;`, sem newline:
//!
//! ```text
//! 4;TIME:;HH:MM:SS;CPU:;<cpu>%;MEM:;<usado> / <total>;Proc:;<processos>
//! ```
//!
//! - O `4` inicial é a quantidade de pares `chave:;valor` que seguem; o
//!   firmware usa esse número para validar o frame
//! - Números saem sempre com parte decimal (`23.0`, nunca `23`), como o
//!   parser do dispositivo espera

use crate::types::Sample;
use chrono::NaiveTime;

/// Quantidade de pares `chave:;valor` em cada linha.
pub const FIELD_COUNT: usize = 4;

const TIME_FORMAT: &str = "%H:%M:%S";

const KEY_TIME: &str = "TIME:";
const KEY_CPU: &str = "CPU:";
const KEY_MEM: &str = "MEM:";
const KEY_PROC: &str = "Proc:";

/// Erros ao interpretar uma linha de telemetria.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProtocolError {
    #[error("Marcador inválido: {0:?} (esperado {FIELD_COUNT})")]
    WrongMarker(String),

    #[error("Quantidade de campos inválida: {0} (esperado {expected})", expected = 1 + 2 * FIELD_COUNT)]
    FieldCount(usize),

    #[error("Campo ausente: esperado {expected:?}, encontrado {found:?}")]
    MissingField { expected: &'static str, found: String },

    #[error("Valor inválido para {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Codifica uma [`Sample`] na linha de texto do protocolo.
pub fn encode_line(sample: &Sample) -> String {
    format!(
        "{FIELD_COUNT};{KEY_TIME};{};{KEY_CPU};{}%;{KEY_MEM};{} / {};{KEY_PROC};{}",
        sample.timestamp.format(TIME_FORMAT),
        decimal(sample.cpu_percent),
        decimal(sample.mem_used_gib),
        decimal(sample.mem_total_gib),
        sample.process_count,
    )
}

/// Decodifica uma linha recebida de volta em [`Sample`].
///
/// Aceita `\r\n` no final, já que monitores seriais costumam anexar.
pub fn decode_line(line: &str) -> Result<Sample, ProtocolError> {
    let parts: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(';').collect();

    let marker = parts.first().copied().unwrap_or_default();
    if marker.parse::<usize>().ok() != Some(FIELD_COUNT) {
        return Err(ProtocolError::WrongMarker(marker.to_string()));
    }
    if parts.len() != 1 + 2 * FIELD_COUNT {
        return Err(ProtocolError::FieldCount(parts.len()));
    }

    let time = value_of(&parts, 1, KEY_TIME)?;
    let cpu = value_of(&parts, 3, KEY_CPU)?;
    let mem = value_of(&parts, 5, KEY_MEM)?;
    let procs = value_of(&parts, 7, KEY_PROC)?;

    let timestamp = NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map_err(|_| invalid(KEY_TIME, time))?;

    let cpu_percent = cpu
        .strip_suffix('%')
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| invalid(KEY_CPU, cpu))?;

    let (used, total) = mem
        .split_once(" / ")
        .and_then(|(u, t)| Some((u.parse::<f64>().ok()?, t.parse::<f64>().ok()?)))
        .ok_or_else(|| invalid(KEY_MEM, mem))?;

    let process_count = procs.parse::<u32>().map_err(|_| invalid(KEY_PROC, procs))?;

    Ok(Sample {
        timestamp,
        cpu_percent,
        mem_used_gib: used,
        mem_total_gib: total,
        process_count,
    })
}

/// `{:?}` de f64 mantém a parte decimal em valores inteiros (`16.0`),
/// enquanto `{}` imprimiria `16`.
fn decimal(value: f64) -> String {
    format!("{value:?}")
}

fn value_of<'a>(
    parts: &[&'a str],
    key_index: usize,
    key: &'static str,
) -> Result<&'a str, ProtocolError> {
    if parts[key_index] != key {
        return Err(ProtocolError::MissingField {
            expected: key,
            found: parts[key_index].to_string(),
        });
    }
    Ok(parts[key_index + 1])
}

fn invalid(field: &'static str, value: &str) -> ProtocolError {
    ProtocolError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{cpu_percent, gib_truncated};

    fn sample_at(h: u32, m: u32, s: u32) -> Sample {
        Sample {
            timestamp: NaiveTime::from_hms_opt(h, m, s).unwrap(),
            cpu_percent: 23.5,
            mem_used_gib: 6.12,
            mem_total_gib: 15.89,
            process_count: 287,
        }
    }

    #[test]
    fn encodes_reference_line() {
        let line = encode_line(&sample_at(14, 5, 9));
        assert_eq!(line, "4;TIME:;14:05:09;CPU:;23.5%;MEM:;6.12 / 15.89;Proc:;287");
    }

    #[test]
    fn encodes_from_raw_readings() {
        let sample = Sample {
            cpu_percent: cpu_percent(0.235),
            mem_used_gib: gib_truncated(6_571_299_963),
            mem_total_gib: gib_truncated(17_061_757_584),
            ..sample_at(14, 5, 9)
        };
        assert_eq!(
            encode_line(&sample),
            "4;TIME:;14:05:09;CPU:;23.5%;MEM:;6.12 / 15.89;Proc:;287"
        );
    }

    #[test]
    fn whole_numbers_keep_decimal_part() {
        let sample = Sample {
            cpu_percent: 0.0,
            mem_used_gib: 8.0,
            mem_total_gib: 16.0,
            process_count: 0,
            ..sample_at(0, 0, 0)
        };
        assert_eq!(
            encode_line(&sample),
            "4;TIME:;00:00:00;CPU:;0.0%;MEM:;8.0 / 16.0;Proc:;0"
        );
    }

    #[test]
    fn marker_matches_pair_count() {
        let line = encode_line(&sample_at(23, 59, 59));
        let parts: Vec<&str> = line.split(';').collect();
        assert_eq!(parts[0], FIELD_COUNT.to_string());
        assert_eq!((parts.len() - 1) / 2, FIELD_COUNT);
        assert!(!line.ends_with('\n'));
    }

    #[test]
    fn decode_recovers_truncated_values() {
        let original = Sample {
            cpu_percent: cpu_percent(0.1234),
            mem_used_gib: gib_truncated(8_589_934_591),
            mem_total_gib: gib_truncated(17_179_869_184),
            process_count: 412,
            ..sample_at(9, 30, 0)
        };
        let decoded = decode_line(&encode_line(&original)).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.cpu_percent, 12.34);
        assert_eq!(decoded.mem_used_gib, 7.99);
    }

    #[test]
    fn decode_accepts_trailing_newline() {
        let decoded = decode_line("4;TIME:;14:05:09;CPU:;23.5%;MEM:;6.12 / 15.89;Proc:;287\r\n").unwrap();
        assert_eq!(decoded, sample_at(14, 5, 9));
    }

    #[test]
    fn rejects_wrong_marker() {
        assert_eq!(
            decode_line("5;TIME:;14:05:09;CPU:;23.5%;MEM:;6.12 / 15.89;Proc:;287"),
            Err(ProtocolError::WrongMarker("5".into()))
        );
    }

    #[test]
    fn rejects_missing_pairs() {
        assert_eq!(
            decode_line("4;TIME:;14:05:09;CPU:;23.5%"),
            Err(ProtocolError::FieldCount(5))
        );
    }

    #[test]
    fn rejects_swapped_keys() {
        assert!(matches!(
            decode_line("4;CPU:;23.5%;TIME:;14:05:09;MEM:;6.12 / 15.89;Proc:;287"),
            Err(ProtocolError::MissingField { expected: "TIME:", .. })
        ));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            decode_line("4;TIME:;14:05:09;CPU:;23.5;MEM:;6.12 / 15.89;Proc:;287"),
            Err(ProtocolError::InvalidValue { field: "CPU:", .. })
        ));
        assert!(matches!(
            decode_line("4;TIME:;25:05:09;CPU:;23.5%;MEM:;6.12 / 15.89;Proc:;287"),
            Err(ProtocolError::InvalidValue { field: "TIME:", .. })
        ));
        assert!(matches!(
            decode_line("4;TIME:;14:05:09;CPU:;23.5%;MEM:;6.12/15.89;Proc:;287"),
            Err(ProtocolError::InvalidValue { field: "MEM:", .. })
        ));
        assert!(matches!(
            decode_line("4;TIME:;14:05:09;CPU:;23.5%;MEM:;6.12 / 15.89;Proc:;-1"),
            Err(ProtocolError::InvalidValue { field: "Proc:", .. })
        ));
    }
}

// src/common/datetime.rs

// O backend manda datas-hora em formatos variados: "2024-03-01T09:00",
// "2024-03-01T09:00:00", com ou sem fuso. Guardamos sempre o horário de parede
// (NaiveDateTime), que é o que a agenda mostra.
//
// Premissa: o backend grava e devolve os horários no fuso da clínica. Um
// sufixo de fuso ("-03:00", "Z") é descartado sem conversão, e a escrita sai
// sem fuso. Um "Z" vindo de um servidor em UTC apareceria em UTC na agenda.

use chrono::{DateTime, NaiveDateTime};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Horário de parede do texto, ignorando o fuso se houver.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Sempre sem fuso: "2024-03-01T09:00:00".
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(WIRE_FORMAT).to_string()
}

/// `#[serde(with = "lenient")]` para campos `NaiveDateTime`.
pub mod lenient {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_datetime(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw)
            .ok_or_else(|| D::Error::custom(format!("data-hora inválida: {raw}")))
    }
}

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Sentinel the cleaned dataset uses for visits with no municipality on
/// record. Included in every view except the municipality ranking.
pub const NOT_INFORMED: &str = "Não informado";

/// The dashboard covers a single year of visits; the loader drops everything
/// else so the core never has to re-check it.
pub const TARGET_YEAR: i32 = 2023;

/// Canonical week order for time-trend views. Chart axes always run
/// Monday→Sunday regardless of which days the filtered data contains.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// English day names, matching the labels the source frame carried.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Deserialize)]
pub struct RawVisitRow {
    #[serde(rename = "Sexo")]
    pub sex: Option<String>,
    #[serde(rename = "Idade")]
    pub age: Option<String>,
    #[serde(rename = "Especialidade")]
    pub specialty: Option<String>,
    #[serde(rename = "Município")]
    pub municipality: Option<String>,
    #[serde(rename = "Data/Hora_ Consulta Ambulatorial")]
    pub visit: Option<String>,
}

/// One cleaned outpatient visit. `weekday` and `month` are derived from the
/// visit timestamp at load time so aggregations never touch date math.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub sex: Option<String>,
    pub age: i32,
    pub specialty: Option<String>,
    pub municipality: String,
    pub visit: NaiveDateTime,
    pub weekday: Weekday,
    pub month: u32,
}

/// Test-only record builder; weekday and month are derived from the
/// timestamp exactly as the loader does it.
#[cfg(test)]
pub fn sample_visit(
    sex: Option<&str>,
    age: i32,
    specialty: Option<&str>,
    municipality: &str,
    ts: &str,
) -> VisitRecord {
    use chrono::Datelike;
    let visit = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap();
    VisitRecord {
        sex: sex.map(str::to_string),
        age,
        specialty: specialty.map(str::to_string),
        municipality: municipality.to_string(),
        weekday: visit.weekday(),
        month: visit.month(),
        visit,
    }
}

// --- Plain aggregate values (chart-ready, presentation-free) ---

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMean {
    pub category: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: i32,
    pub end: i32,
    pub count: u64,
}

/// Count matrix with explicit axis labels. Every (row, column) combination is
/// present; combinations absent from the data hold 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub cells: Vec<Vec<u64>>,
}

/// Age spread per group: the numbers behind a box plot.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeStatsGroup {
    pub category: String,
    pub count: u64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_visits: usize,
    pub distinct_specialties: usize,
    pub distinct_municipalities: usize,
    pub mean_age: f64,
}

// --- Presentation rows (console tables + CSV export) ---

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CategoryCountRow {
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "Contagem")]
    #[tabled(rename = "Contagem")]
    pub count: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedCountRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "Contagem")]
    #[tabled(rename = "Contagem")]
    pub count: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MeanAgeRow {
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "IdadeMedia")]
    #[tabled(rename = "IdadeMedia")]
    pub mean_age: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeriesPointRow {
    #[serde(rename = "Periodo")]
    #[tabled(rename = "Periodo")]
    pub label: String,
    #[serde(rename = "Atendimentos")]
    #[tabled(rename = "Atendimentos")]
    pub count: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HistogramBinRow {
    #[serde(rename = "FaixaEtaria")]
    #[tabled(rename = "FaixaEtaria")]
    pub age_range: String,
    #[serde(rename = "Contagem")]
    #[tabled(rename = "Contagem")]
    pub count: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AgeStatsRow {
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "Contagem")]
    #[tabled(rename = "Contagem")]
    pub count: u64,
    #[serde(rename = "Min")]
    #[tabled(rename = "Min")]
    pub min: String,
    #[serde(rename = "Q1")]
    #[tabled(rename = "Q1")]
    pub q1: String,
    #[serde(rename = "Mediana")]
    #[tabled(rename = "Mediana")]
    pub median: String,
    #[serde(rename = "Q3")]
    #[tabled(rename = "Q3")]
    pub q3: String,
    #[serde(rename = "Max")]
    #[tabled(rename = "Max")]
    pub max: String,
    #[serde(rename = "Media")]
    #[tabled(rename = "Media")]
    pub mean: String,
}

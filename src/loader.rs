use crate::types::{RawVisitRow, VisitRecord, NOT_INFORMED, TARGET_YEAR};
use crate::util::{parse_datetime_safe, parse_i32_safe, parse_text_safe};
use chrono::Datelike;
use csv::ReaderBuilder;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read visits file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
    pub other_years: usize,
    pub missing_municipality: usize,
}

/// Load and clean the visits CSV from disk.
///
/// The cleaned dataset is the contract the rest of the program relies on:
/// every record has a valid timestamp inside the target year, a non-negative
/// age, and a municipality (the sentinel when the source left it blank).
pub fn load_and_clean(path: &str) -> Result<(Vec<VisitRecord>, LoadReport), LoadError> {
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    clean_from_reader(rdr)
}

fn clean_from_reader<R: Read>(
    mut rdr: csv::Reader<R>,
) -> Result<(Vec<VisitRecord>, LoadReport), LoadError> {
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut other_years = 0usize;
    let mut missing_municipality = 0usize;
    let mut records: Vec<VisitRecord> = Vec::new();

    for result in rdr.deserialize::<RawVisitRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };

        // Timestamp and age are required; a row without them is unusable.
        let visit = match parse_datetime_safe(row.visit.as_deref()) {
            Some(v) => v,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        if visit.year() != TARGET_YEAR {
            other_years += 1;
            continue;
        }
        let age = match parse_i32_safe(row.age.as_deref()) {
            Some(a) if a >= 0 => a,
            _ => {
                parse_errors += 1;
                continue;
            }
        };

        // Sex and specialty stay optional; aggregations keyed on them skip
        // missing values. Municipality gets the sentinel instead, so it can
        // be shown (or excluded) explicitly in the municipality views.
        let sex = parse_text_safe(row.sex.as_deref());
        let specialty = parse_text_safe(row.specialty.as_deref());
        let municipality = match parse_text_safe(row.municipality.as_deref()) {
            Some(m) => m,
            None => {
                missing_municipality += 1;
                NOT_INFORMED.to_string()
            }
        };

        records.push(VisitRecord {
            sex,
            age,
            specialty,
            municipality,
            weekday: visit.weekday(),
            month: visit.month(),
            visit,
        });
    }

    let report = LoadReport {
        total_rows,
        kept_rows: records.len(),
        parse_errors,
        other_years,
        missing_municipality,
    };
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    const HEADER: &str = "Sexo,Idade,Especialidade,Município,Data/Hora_ Consulta Ambulatorial\n";

    fn load_str(body: &str) -> (Vec<VisitRecord>, LoadReport) {
        let csv_text = format!("{HEADER}{body}");
        let rdr = ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        clean_from_reader(rdr).unwrap()
    }

    #[test]
    fn derives_weekday_and_month_from_timestamp() {
        // 2023-03-15 was a Wednesday.
        let (records, report) = load_str("FEMININO,30,CARDIOLOGIA,PORTO ALEGRE,15/03/2023 09:30\n");
        assert_eq!(report.kept_rows, 1);
        assert_eq!(records[0].weekday, Weekday::Wed);
        assert_eq!(records[0].month, 3);
        assert_eq!(records[0].age, 30);
    }

    #[test]
    fn drops_rows_outside_target_year() {
        let (records, report) = load_str(
            "FEMININO,30,CARDIOLOGIA,PORTO ALEGRE,15/03/2022 09:30\n\
             MASCULINO,40,PEDIATRIA,CANOAS,02/01/2023 08:00\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(report.other_years, 1);
        assert_eq!(records[0].municipality, "CANOAS");
    }

    #[test]
    fn bad_age_or_timestamp_counts_as_parse_error() {
        let (records, report) = load_str(
            "FEMININO,abc,CARDIOLOGIA,PORTO ALEGRE,15/03/2023 09:30\n\
             FEMININO,30,CARDIOLOGIA,PORTO ALEGRE,not-a-date\n\
             FEMININO,-4,CARDIOLOGIA,PORTO ALEGRE,15/03/2023 09:30\n",
        );
        assert!(records.is_empty());
        assert_eq!(report.parse_errors, 3);
        assert_eq!(report.total_rows, 3);
    }

    #[test]
    fn blank_municipality_gets_sentinel_and_blank_sex_stays_missing() {
        let (records, report) = load_str(",30,,  ,15/03/2023 09:30\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].municipality, NOT_INFORMED);
        assert_eq!(report.missing_municipality, 1);
        assert!(records[0].sex.is_none());
        assert!(records[0].specialty.is_none());
    }
}

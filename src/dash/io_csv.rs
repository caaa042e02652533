// Primitives for reading CSV files.

use crate::dash::{io_common::RequiredColumns, *};

pub fn read_csv_records(path: String, source: &FileSource) -> DashResult<Vec<ParsedRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(source.delimiter_byte()?)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path: path.clone() })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_records: header: {:?}", header);
    let columns = RequiredColumns::find_columns(&path, &header, source)?;

    let mut res: Vec<ParsedRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path: path.clone() })?;
        let cells: Vec<&str> = line.iter().collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("read_csv_records: skipping empty line {}", lineno);
            continue;
        }
        let pr = columns.parse_row(&path, lineno, &cells)?;
        debug!("read_csv_records: lineno: {:?} record: {:?}", lineno, pr);
        res.push(pr);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(file_path: &str, delimiter: Option<&str>) -> FileSource {
        FileSource {
            provider: "csv".to_string(),
            file_path: file_path.to_string(),
            country_code_column: "Code".to_string(),
            country_name_column: "Czech name".to_string(),
            year_column: "Year".to_string(),
            score_column: "UN eGov index".to_string(),
            excel_worksheet_name: None,
            delimiter: delimiter.map(|s| s.to_string()),
        }
    }

    fn data_path(rel: &str) -> String {
        format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), rel)
    }

    #[test]
    fn reads_un_table() {
        let path = data_path("small_dashboard/un.csv");
        let records = read_csv_records(path.clone(), &source(&path, None)).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].lineno, 2);
        assert_eq!(records[0].country_code, "CZE");
        assert_eq!(records[0].year, 2016);
        assert_eq!(records[0].score, Some(0.6454));
        let svk_2016 = records
            .iter()
            .find(|r| r.country_code == "SVK" && r.year == 2016)
            .unwrap();
        assert_eq!(svk_2016.score, None);
    }

    #[test]
    fn reads_semicolons() {
        let path = data_path("small_dashboard/eu.csv");
        let mut s = source(&path, Some(";"));
        s.score_column = "eGov benchmark".to_string();
        let records = read_csv_records(path.clone(), &s).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.score.is_some()));
    }

    #[test]
    fn missing_file() {
        let path = data_path("small_dashboard/nothing_here.csv");
        let res = read_csv_records(path.clone(), &source(&path, None));
        assert!(matches!(res, Err(DashError::CsvOpen { .. })));
    }
}

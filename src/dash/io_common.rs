use std::path::Path;

use crate::dash::*;

/// The last component of a path, or the path itself when it has none.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The positions of the four required columns in a header row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RequiredColumns {
    pub country_code: usize,
    pub country_name: usize,
    pub year: usize,
    pub score: usize,
}

impl RequiredColumns {
    pub fn find_columns(
        path: &str,
        header: &[String],
        source: &FileSource,
    ) -> DashResult<RequiredColumns> {
        let find = |column: &str| -> DashResult<usize> {
            header
                .iter()
                .position(|h| h.trim() == column)
                .context(MissingColumnSnafu { path, column })
        };
        let res = RequiredColumns {
            country_code: find(&source.country_code_column)?,
            country_name: find(&source.country_name_column)?,
            year: find(&source.year_column)?,
            score: find(&source.score_column)?,
        };
        debug!("find_columns: {}: {:?}", path, res);
        Ok(res)
    }

    pub fn contains(&self, idx: usize) -> bool {
        [self.country_code, self.country_name, self.year, self.score].contains(&idx)
    }

    fn width(&self) -> usize {
        1 + self
            .country_code
            .max(self.country_name)
            .max(self.year)
            .max(self.score)
    }

    pub fn parse_row(&self, path: &str, lineno: usize, cells: &[&str]) -> DashResult<ParsedRecord> {
        if cells.len() < self.width() {
            return LineTooShortSnafu { path, lineno }.fail();
        }
        let country_code = cells[self.country_code].trim();
        if country_code.is_empty() {
            return InvalidCellSnafu {
                path,
                lineno,
                column: "country code",
                content: cells[self.country_code],
            }
            .fail();
        }
        Ok(ParsedRecord {
            lineno,
            country_code: country_code.to_string(),
            country_name: cells[self.country_name].trim().to_string(),
            year: parse_year(path, lineno, cells[self.year])?,
            score: parse_score(path, lineno, cells[self.score])?,
        })
    }
}

/// Years are sometimes exported as floats ("2018.0").
fn parse_year(path: &str, lineno: usize, cell: &str) -> DashResult<u32> {
    let s = cell.trim();
    if let Ok(y) = s.parse::<u32>() {
        return Ok(y);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        _ => InvalidCellSnafu {
            path,
            lineno,
            column: "year",
            content: cell,
        }
        .fail(),
    }
}

/// Empty cells and the usual placeholders are missing scores.
fn parse_score(path: &str, lineno: usize, cell: &str) -> DashResult<Option<f64>> {
    let s = cell.trim();
    if s.is_empty() || s == ".." || s == "-" {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_nan() => Ok(None),
        Ok(f) => Ok(Some(f)),
        Err(_) => InvalidCellSnafu {
            path,
            lineno,
            column: "score",
            content: cell,
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> FileSource {
        FileSource {
            provider: "csv".to_string(),
            file_path: "un.csv".to_string(),
            country_code_column: "Code".to_string(),
            country_name_column: "Czech name".to_string(),
            year_column: "Year".to_string(),
            score_column: "UN eGov index".to_string(),
            excel_worksheet_name: None,
            delimiter: None,
        }
    }

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("data/eGov-t4.csv"), "eGov-t4.csv");
        assert_eq!(simplify_file_name("eur-t2.csv"), "eur-t2.csv");
        assert_eq!(simplify_file_name(".."), "..");
    }

    #[test]
    fn columns_in_any_order() {
        let h = header(&["Year", "Code", "Region", "UN eGov index", "Czech name"]);
        let cols = RequiredColumns::find_columns("un.csv", &h, &source()).unwrap();
        assert_eq!(
            cols,
            RequiredColumns {
                country_code: 1,
                country_name: 4,
                year: 0,
                score: 3
            }
        );
        let r = cols
            .parse_row("un.csv", 2, &["2018", "CZE", "Europe", " 0.7084 ", "Česká republika"])
            .unwrap();
        assert_eq!(r.country_code, "CZE");
        assert_eq!(r.country_name, "Česká republika");
        assert_eq!(r.year, 2018);
        assert_eq!(r.score, Some(0.7084));
    }

    #[test]
    fn missing_column() {
        let h = header(&["Code", "Czech name", "Year"]);
        let res = RequiredColumns::find_columns("un.csv", &h, &source());
        assert!(matches!(
            res,
            Err(DashError::MissingColumn { ref column, .. }) if column == "UN eGov index"
        ));
    }

    #[test]
    fn cells() {
        assert_eq!(parse_year("f", 2, "2018.0").unwrap(), 2018);
        assert!(parse_year("f", 2, "2018.5").is_err());
        assert!(parse_year("f", 2, "").is_err());
        assert_eq!(parse_score("f", 2, "").unwrap(), None);
        assert_eq!(parse_score("f", 2, "..").unwrap(), None);
        assert_eq!(parse_score("f", 2, "NaN").unwrap(), None);
        assert_eq!(parse_score("f", 2, "0").unwrap(), Some(0.0));
        assert!(matches!(
            parse_score("f", 7, "n/a"),
            Err(DashError::InvalidCell { lineno: 7, .. })
        ));
    }

    #[test]
    fn short_line() {
        let h = header(&["Code", "Czech name", "Year", "UN eGov index"]);
        let cols = RequiredColumns::find_columns("un.csv", &h, &source()).unwrap();
        assert!(matches!(
            cols.parse_row("un.csv", 3, &["CZE", "Česká republika", "2018"]),
            Err(DashError::LineTooShort { lineno: 3, .. })
        ));
    }
}

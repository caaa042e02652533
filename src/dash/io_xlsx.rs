// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::dash::{io_common::RequiredColumns, *};

pub fn read_excel_records(path: String, source: &FileSource) -> DashResult<Vec<ParsedRecord>> {
    let mut workbook: Xlsx<_> =
        open_workbook(&path).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange: Range<DataType> = match &source.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                path: path.clone(),
                name: name.clone(),
            })?
            .context(OpeningExcelSnafu { path: path.clone() })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path: path.clone() })?
            .context(OpeningExcelSnafu { path: path.clone() })?,
    };

    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu { path: path.clone() })?
        .iter()
        .map(|c| c.to_string())
        .collect();
    debug!("read_excel_records: header: {:?}", header);
    let columns = RequiredColumns::find_columns(&path, &header, source)?;

    let mut res: Vec<ParsedRecord> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let mut cells: Vec<String> = Vec::with_capacity(row.len());
        for (col, cell) in row.iter().enumerate() {
            if columns.contains(col) {
                cells.push(read_cell(cell, lineno)?);
            } else {
                cells.push(String::new());
            }
        }
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("read_excel_records: skipping empty row {}", lineno);
            continue;
        }
        let cell_refs: Vec<&str> = cells.iter().map(|s| s.as_str()).collect();
        let pr = columns.parse_row(&path, lineno, &cell_refs)?;
        debug!("read_excel_records: lineno: {:?} record: {:?}", lineno, pr);
        res.push(pr);
    }
    Ok(res)
}

fn read_cell(cell: &DataType, lineno: usize) -> DashResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            lineno: lineno as u64,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

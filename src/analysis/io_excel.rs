// Reading of Excel spreadsheets, one ballot per row.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::analysis::io_common::{assemble_group, TabularRow};
use crate::analysis::*;

pub fn read_excel_input(
    path: &str,
    worksheet_name: &Option<String>,
) -> AnalysisResult<(Vec<Participant>, Vec<Ballot>)> {
    let wrange = get_range(path, worksheet_name)?;
    // Line numbers as displayed by the spreadsheet.
    let first_row = wrange.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows: Vec<TabularRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = first_row + idx + 1;
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell_to_name(cell, lineno))
            .collect::<AnalysisResult<Vec<String>>>()?;
        debug!("read_excel_input: lineno: {:?} row: {:?}", lineno, &cells);
        rows.push(TabularRow { lineno, cells });
    }
    assemble_group(&rows)
}

fn cell_to_name(cell: &DataType, lineno: usize) -> AnalysisResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Empty => Ok(String::new()),
        // Numeric labels, like member numbers.
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        x => Err(AnalysisError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", x),
        }),
    }
}

fn get_range(
    path: &str,
    worksheet_name_o: &Option<String>,
) -> AnalysisResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(worksheet_name) = worksheet_name_o {
        workbook
            .worksheet_range(worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_conversion() {
        assert_eq!(
            cell_to_name(&DataType::String(" Anna ".to_string()), 1).unwrap(),
            "Anna"
        );
        assert_eq!(cell_to_name(&DataType::Empty, 1).unwrap(), "");
        assert_eq!(cell_to_name(&DataType::Int(12), 1).unwrap(), "12");
        assert_eq!(cell_to_name(&DataType::Float(7.0), 1).unwrap(), "7");
        assert!(matches!(
            cell_to_name(&DataType::Bool(true), 4),
            Err(AnalysisError::ExcelWrongCellType { lineno: 4, .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let dir = test_dir("io_excel");
        let path = dir.join("missing.xlsx");
        assert!(matches!(
            read_excel_input(path.to_str().unwrap(), &None),
            Err(AnalysisError::OpeningExcel { .. })
        ));
    }
}

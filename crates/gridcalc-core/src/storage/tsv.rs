//! Tab-separated export of values or texts.
//!
//! Output covers the printable area row by row. Columns are separated by a
//! tab and every row ends with a newline, including the last one. Positions
//! without a slot print nothing.

use std::io::Write;

use gridcalc_engine::engine::{FormulaCompiler, Position};

use crate::error::Result;
use crate::sheet::{CellView, Sheet};

fn write_table<C, W>(
    sheet: &Sheet<C>,
    out: &mut W,
    render: impl Fn(&CellView<'_, C::Formula>) -> String,
) -> Result<()>
where
    C: FormulaCompiler,
    W: Write,
{
    let size = sheet.printable_size();
    for row in 0..size.rows {
        for col in 0..size.cols {
            if col > 0 {
                out.write_all(b"\t")?;
            }
            if let Some(cell) = sheet.cell(Position::new(row, col))? {
                out.write_all(render(&cell).as_bytes())?;
            }
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Write the computed value of every cell in the printable area.
pub fn write_values<C: FormulaCompiler, W: Write>(sheet: &Sheet<C>, out: &mut W) -> Result<()> {
    write_table(sheet, out, |cell| cell.value().to_string())
}

/// Write the text of every cell in the printable area.
pub fn write_texts<C: FormulaCompiler, W: Write>(sheet: &Sheet<C>, out: &mut W) -> Result<()> {
    write_table(sheet, out, |cell| cell.text())
}

pub fn values_to_string<C: FormulaCompiler>(sheet: &Sheet<C>) -> Result<String> {
    let mut buf = Vec::new();
    write_values(sheet, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn texts_to_string<C: FormulaCompiler>(sheet: &Sheet<C>) -> Result<String> {
    let mut buf = Vec::new();
    write_texts(sheet, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

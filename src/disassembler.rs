use crate::instruction::Instruction;
use std::io::{self, Write};

const HEADERS: [&str; 5] = ["Pos", "Op", "Ret", "Operand1", "Operand2"];

/// Renders a compiled instruction sequence as a bordered text table
pub struct Disassembler<'a> {
    instructions: &'a [Instruction],
}

impl<'a> Disassembler<'a> {
    pub fn new(instructions: &'a [Instruction]) -> Self {
        Disassembler { instructions }
    }

    fn rows(&self) -> Vec<[String; 5]> {
        self.instructions
            .iter()
            .enumerate()
            .map(|(pos, instruction)| {
                let [op, ret, operand1, operand2] = instruction.columns();
                [pos.to_string(), op, ret, operand1, operand2]
            })
            .collect()
    }

    pub fn write_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let rows = self.rows();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border: String = widths
            .iter()
            .map(|width| format!("+{}", "-".repeat(width + 2)))
            .collect::<String>()
            + "+";

        writeln!(w, "{}", border)?;
        write_row(w, &widths, HEADERS.iter().map(|h| h.to_uppercase()))?;
        writeln!(w, "{}", border)?;
        for row in rows {
            write_row(w, &widths, row.into_iter())?;
        }
        writeln!(w, "{}", border)
    }
}

fn write_row(
    w: &mut dyn Write,
    widths: &[usize; 5],
    cells: impl Iterator<Item = String>,
) -> io::Result<()> {
    for (width, cell) in widths.iter().zip(cells) {
        write!(w, "| {:<width$} ", cell, width = *width)?;
    }
    writeln!(w, "|")
}

#[cfg(test)]
#[path = "disassembler_tests.rs"]
mod tests;

use std::fmt::{self, Debug, Display};

use crate::{Connection, GradientRecord, Sigmoid};

/// Displays connection `i` as `a_{i+1} = sigmoid(W a_i + b)`.
pub struct PrettyPrintParams<'a> {
    i_connection: usize,
    connection: &'a Connection,
}

impl<'a> PrettyPrintParams<'a> {
    pub fn new(i_connection: usize, connection: &'a Connection) -> Self {
        Self {
            i_connection,
            connection,
        }
    }
}

impl Debug for PrettyPrintParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for PrettyPrintParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let i = self.i_connection;
        let head = format!("a_{} = {}(", i + 1, Sigmoid::NAME);
        let c = self.connection;
        write_affine(f, &head, i, c.input_size(), c.weight(), c.bias(), 4)
    }
}

/// Displays the accumulated gradient of connection `i` laid out like its parameters.
pub struct PrettyPrintGradient<'a> {
    i_connection: usize,
    gradient: &'a GradientRecord,
}

impl<'a> PrettyPrintGradient<'a> {
    pub fn new(i_connection: usize, gradient: &'a GradientRecord) -> Self {
        Self {
            i_connection,
            gradient,
        }
    }
}

impl Debug for PrettyPrintGradient<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for PrettyPrintGradient<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let i = self.i_connection;
        let head = format!("d_{} = (", i + 1);
        let g = self.gradient;
        write_affine(f, &head, i, g.input_size(), g.grad_weight(), g.grad_bias(), 8)
    }
}

fn write_element(f: &mut fmt::Formatter, element: f32, precision: usize) -> fmt::Result {
    if element.is_sign_positive() {
        write!(f, " {:.*?}", precision, element)
    } else {
        write!(f, "{:.*?}", precision, element)
    }
}

/// Writes a row-major matrix and a column next to each other, with `head` and the input name on
/// the center line.
fn write_affine(
    f: &mut fmt::Formatter,
    head: &str,
    i_input: usize,
    n_cols: usize,
    matrix: &[f32],
    column: &[f32],
    precision: usize,
) -> fmt::Result {
    let n_rows = column.len();
    let center_line = n_rows / 2;
    let input = format!(" a_{i_input} + ");
    for (i_line, (row, &b)) in matrix.chunks_exact(n_cols).zip(column).enumerate() {
        if i_line == center_line {
            write!(f, "{head}")?;
        } else {
            write!(f, "{:1$}", "", head.chars().count())?;
        }
        write!(f, "[")?;
        let mut iter = row.iter();
        while let Some(&element) = iter.next() {
            write_element(f, element, precision)?;
            if iter.size_hint().0 != 0 {
                write!(f, " ")?;
            }
        }
        write!(f, "]")?;
        if i_line == center_line {
            write!(f, "{input}")?;
        } else {
            write!(f, "{:1$}", "", input.len())?;
        }
        write!(f, "[")?;
        write_element(f, b, precision)?;
        write!(f, "]")?;
        if i_line == center_line {
            write!(f, ")")?;
        }
        if i_line != n_rows - 1 {
            writeln!(f)?;
        }
    }
    Ok(())
}

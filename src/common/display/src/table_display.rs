pub use comfy_table;

const DEFAULT_WIDTH_IF_NO_TTY: u16 = 120;
const DOTS: &str = "…";
const HEAD_ROWS: usize = 5;
const TAIL_ROWS: usize = 5;

/// Renders the element at `idx` for display.
pub trait StrValue {
    fn str_value(&self, idx: usize) -> String;
}

fn maybe_apply_width(table: &mut comfy_table::Table) {
    if table.width().is_none() && !table.is_tty() {
        table.set_width(DEFAULT_WIDTH_IF_NO_TTY);
    }
}

fn new_table() -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    maybe_apply_width(&mut table);
    table
}

fn create_table_cell(value: &str) -> comfy_table::Cell {
    comfy_table::Cell::new(value).add_attribute(comfy_table::Attribute::Bold)
}

fn truncate(value: String, max_width: Option<usize>) -> String {
    match max_width {
        Some(max_width) if value.chars().count() > max_width.saturating_sub(1) => {
            let kept = value
                .chars()
                .take(max_width.saturating_sub(1))
                .collect::<String>();
            format!("{kept}{DOTS}")
        }
        _ => value,
    }
}

pub fn make_schema_vertical_table(
    fields: impl Iterator<Item = (String, String)>,
) -> comfy_table::Table {
    let mut table = new_table();
    table.set_header(vec![create_table_cell("column_name"), create_table_cell("type")]);
    for (name, dtype) in fields {
        table.add_row(vec![name, dtype]);
    }
    table
}

/// Builds a table with one header cell per field. Long inputs show the first and last few rows
/// with an ellipsis row in between.
pub fn make_comfy_table<S: AsRef<str>>(
    fields: &[S],
    columns: Option<&[&dyn StrValue]>,
    num_rows: Option<usize>,
    max_col_width: Option<usize>,
) -> comfy_table::Table {
    let mut table = new_table();
    let header = fields
        .iter()
        .map(|field| create_table_cell(field.as_ref()))
        .collect::<Vec<_>>();

    let (Some(columns), Some(len)) = (columns, num_rows) else {
        table.add_row(header);
        return table;
    };
    table.set_header(header);
    if columns.is_empty() {
        return table;
    }

    let render_row = |i: usize| {
        columns
            .iter()
            .map(|col| truncate(col.str_value(i), max_col_width))
            .collect::<Vec<_>>()
    };

    if len > HEAD_ROWS + TAIL_ROWS {
        for i in 0..HEAD_ROWS {
            table.add_row(render_row(i));
        }
        table.add_row(vec![DOTS; columns.len()]);
        for i in (len - TAIL_ROWS)..len {
            table.add_row(render_row(i));
        }
    } else {
        for i in 0..len {
            table.add_row(render_row(i));
        }
    }
    table
}

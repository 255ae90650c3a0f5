use comfy_table::{Attribute, Cell, Color, Row, Table};
use voxtask_core::models::Category;

pub fn display_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    println!("{}", category_table(categories));
}

pub fn category_table(categories: &[Category]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Icon", "Color", "Tasks", "Owner"]);

    for category in categories {
        let mut row = Row::new();
        row.add_cell(Cell::new(category.id.to_string()));

        let name = Cell::new(&category.name);
        row.add_cell(if category.is_default {
            name.add_attribute(Attribute::Bold)
        } else {
            name
        });

        row.add_cell(Cell::new(category.icon.as_deref().unwrap_or("")));
        row.add_cell(Cell::new(category.color.as_deref().unwrap_or("")));
        row.add_cell(Cell::new(category.task_count));

        let owner = match category.user_id {
            Some(user_id) => Cell::new(user_id.to_string()),
            None => Cell::new("default").fg(Color::DarkGrey),
        };
        row.add_cell(owner);

        table.add_row(row);
    }
    table
}

use super::ui;
use crate::core::category::{Bucket, Categories};
use crate::core::date::DateRange;
use crate::core::get_categorized_transactions;
use crate::core::source::TransactionSource;
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::debug;

/// How much of the categorized trees to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Category totals only.
    Summary,
    /// Totals with every transaction listed under its category.
    Transactions,
}

pub async fn run(
    source: &dyn TransactionSource,
    range: &DateRange,
    detail: Detail,
    json: bool,
) -> Result<()> {
    let spinner = ui::new_spinner(&format!(
        "Fetching transactions {} to {}",
        range.start_date, range.end_date
    ));
    let result = get_categorized_transactions(source, range).await;
    spinner.finish_and_clear();
    let categories = result?;
    debug!(
        categories = categories.tree().category_count(),
        transactions = categories.tree().transaction_count(),
        "Categorized transactions"
    );

    let output = if json {
        render_json(&categories, detail)?
    } else {
        display_categories(&categories, range, detail)
    };
    println!("{output}");
    Ok(())
}

pub fn render_json(categories: &Categories, detail: Detail) -> Result<String> {
    let rendered = match detail {
        Detail::Summary => serde_json::to_string_pretty(&categories.summary()),
        Detail::Transactions => serde_json::to_string_pretty(categories),
    };
    rendered.context("Failed to serialize categories")
}

/// One table per bucket, categories indented by depth.
pub fn display_categories(categories: &Categories, range: &DateRange, detail: Detail) -> String {
    let tree = categories.tree();
    let mut output = format!(
        "Transactions: {}\n",
        ui::style_text(
            &format!("{} to {}", range.start_date, range.end_date),
            ui::StyleType::Title
        )
    );

    for bucket in Bucket::ALL {
        let root = categories.root(bucket);
        let mut table = ui::new_styled_table();
        match detail {
            Detail::Summary => table.set_header(vec![
                ui::header_cell("Category"),
                ui::header_cell("Description"),
                ui::header_cell("Total"),
            ]),
            Detail::Transactions => table.set_header(vec![
                ui::header_cell("Category / Payee"),
                ui::header_cell("Date"),
                ui::header_cell("Notes"),
                ui::header_cell("Amount"),
            ]),
        };

        // The root itself is reported below the table.
        for (depth, id) in tree.walk(root).into_iter().skip(1) {
            let category = tree.category(id);
            let indent = "  ".repeat(depth - 1);
            let name = Cell::new(format!("{indent}{}", category.name()));
            match detail {
                Detail::Summary => {
                    table.add_row(vec![
                        name,
                        ui::subtle_cell(&category.description),
                        ui::total_cell(category.total_amount()),
                    ]);
                }
                Detail::Transactions => {
                    table.add_row(vec![
                        name,
                        Cell::new(""),
                        ui::subtle_cell(&category.description),
                        ui::total_cell(category.total_amount()),
                    ]);
                    for txn_id in category.transactions() {
                        let txn = tree.transaction(*txn_id);
                        table.add_row(vec![
                            Cell::new(format!("{indent}  {}", txn.payee)),
                            Cell::new(txn.date.to_string()),
                            ui::subtle_cell(&txn.description),
                            ui::money_cell(txn.amount),
                        ]);
                    }
                }
            }
        }

        // Transactions filed directly on a root, e.g. after loading a snapshot.
        if detail == Detail::Transactions {
            for txn_id in tree.category(root).transactions() {
                let txn = tree.transaction(*txn_id);
                table.add_row(vec![
                    Cell::new(txn.payee.as_str()),
                    Cell::new(txn.date.to_string()),
                    ui::subtle_cell(&txn.description),
                    ui::money_cell(txn.amount),
                ]);
            }
        }

        output.push_str(&format!(
            "\n{}\n",
            ui::style_text(tree.category(root).name(), ui::StyleType::Title)
        ));
        if table.row_iter().next().is_some() {
            output.push_str(&table.to_string());
            output.push('\n');
        } else {
            output.push_str(&format!(
                "{}\n",
                ui::style_text("No transactions", ui::StyleType::Subtle)
            ));
        }
        output.push_str(&format!(
            "Total {}: {}\n",
            ui::style_text(bucket.name(), ui::StyleType::TotalLabel),
            ui::style_total(tree.category(root).total_amount())
        ));
    }

    output
}

use super::ui;
use crate::core::portfolio::{Portfolio, get_portfolio};
use crate::core::source::PortfolioSource;
use anyhow::{Context, Result};
use comfy_table::Cell;

pub async fn run(source: &dyn PortfolioSource, json: bool) -> Result<()> {
    let spinner = ui::new_spinner("Fetching portfolio");
    let result = get_portfolio(source).await;
    spinner.finish_and_clear();
    let portfolio = result?;

    let output = if json {
        serde_json::to_string_pretty(&portfolio).context("Failed to serialize portfolio")?
    } else {
        display_portfolio(&portfolio)
    };
    println!("{output}");
    Ok(())
}

pub fn display_portfolio(portfolio: &Portfolio) -> String {
    let mut assets = ui::new_styled_table();
    assets.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Ticker"),
        ui::header_cell("Type"),
        ui::header_cell("Description"),
        ui::header_cell("Value"),
    ]);
    for asset in portfolio.assets() {
        assets.add_row(vec![
            Cell::new(asset.position.name.as_str()),
            Cell::new(asset.ticker.as_str()),
            Cell::new(asset.position.kind.as_str()),
            ui::subtle_cell(&asset.position.description),
            ui::money_cell(asset.position.value),
        ]);
    }

    let mut debts = ui::new_styled_table();
    debts.set_header(vec![
        ui::header_cell("Debt"),
        ui::header_cell("Type"),
        ui::header_cell("Description"),
        ui::header_cell("Value"),
    ]);
    for debt in portfolio.debts() {
        debts.add_row(vec![
            Cell::new(debt.position.name.as_str()),
            Cell::new(debt.position.kind.as_str()),
            ui::subtle_cell(&debt.position.description),
            ui::money_cell(debt.position.value),
        ]);
    }

    let mut output = format!("{}\n", ui::style_text("Assets", ui::StyleType::Title));
    output.push_str(&assets.to_string());
    output.push_str(&format!(
        "\nTotal Assets: {}\n\n",
        ui::style_total(portfolio.total_assets())
    ));
    output.push_str(&format!("{}\n", ui::style_text("Debts", ui::StyleType::Title)));
    output.push_str(&debts.to_string());
    output.push_str(&format!(
        "\nTotal Debts: {}\n\n",
        ui::style_total(portfolio.total_debts())
    ));
    output.push_str(&format!(
        "{}: {}",
        ui::style_text("Net Worth", ui::StyleType::TotalLabel),
        ui::style_total(portfolio.net_worth())
    ));
    output
}

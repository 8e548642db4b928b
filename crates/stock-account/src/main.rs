use std::fs;

use anyhow::{Context, bail};

use grni_stock_account::{Scenario, StockAccountSettings};

fn main() -> anyhow::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: grni-replay <scenario.json>");
    };

    let source = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let scenario = Scenario::from_json(&source).with_context(|| format!("parsing {path}"))?;
    let settings = match scenario.settings.clone() {
        Some(settings) => settings,
        None => StockAccountSettings::load().context("loading settings")?,
    };

    grni_observability::init(settings.log_json);
    tracing::info!(%path, purchases = scenario.purchases.len(), "replaying scenario");

    let report = scenario.run(&settings)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

use coinstats_core::Exchange;
use serde_json::Value;

use super::Context;
use crate::cli::LatestArgs;
use crate::error::CliError;

pub async fn run(args: &LatestArgs, context: &Context) -> Result<Value, CliError> {
    let exchange: Exchange = args.exchange.parse()?;
    let currency_code = args.currency_code.trim().to_ascii_uppercase();
    let store = context.open_store()?;

    let latest = tokio::task::spawn_blocking(move || store.latest(exchange.as_str(), &currency_code))
        .await
        .map_err(|error| CliError::Io(std::io::Error::other(error)))??;
    Ok(serde_json::to_value(latest)?)
}

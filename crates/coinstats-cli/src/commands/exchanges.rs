use coinstats_core::Exchange;
use serde_json::Value;

use super::Context;
use crate::cli::ExchangesArgs;
use crate::error::CliError;

pub async fn run(args: &ExchangesArgs, context: &Context) -> Result<Value, CliError> {
    let exchange = args
        .exchange
        .as_deref()
        .map(str::parse::<Exchange>)
        .transpose()?;
    let store = context.open_store()?;

    let values = tokio::task::spawn_blocking(move || match exchange {
        Some(exchange) => store.currency_codes(exchange.as_str()),
        None => store.exchanges(),
    })
    .await
    .map_err(|error| CliError::Io(std::io::Error::other(error)))??;
    Ok(Value::from(values))
}

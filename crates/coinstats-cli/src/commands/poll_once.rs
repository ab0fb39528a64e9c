use std::sync::Arc;

use coinstats_core::{PollScheduler, ReqwestHttpClient};
use serde_json::{json, Value};

use super::Context;
use crate::error::CliError;

pub async fn run(context: &Context) -> Result<Value, CliError> {
    let store = context.open_store()?;
    let scheduler = PollScheduler::with_default_adapters(
        Arc::new(ReqwestHttpClient::new()),
        store.clone(),
        Arc::clone(&context.config),
    );

    let report = scheduler.run_cycle().await;
    let stored_total = tokio::task::spawn_blocking(move || store.count())
        .await
        .map_err(|error| CliError::Io(std::io::Error::other(error)))??;

    let mut output = serde_json::to_value(report)?;
    if let Value::Object(fields) = &mut output {
        fields.insert(String::from("stored_total"), json!(stored_total));
    }
    Ok(output)
}

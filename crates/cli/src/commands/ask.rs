use std::sync::Arc;

use cpg_core::config::{AppConfig, LoadOptions};
use cpg_core::dispatch::{Dispatch, Dispatcher, RequestContext};
use cpg_core::intent::{Intent, IntentName, SlotName, Slots};
use cpg_db::{migrations, SqlQueryExecutor};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::commands::{connect, runtime, CommandResult, StepError};

#[derive(Clone, Debug, Default)]
pub struct AskArgs {
    pub intent: String,
    pub year: Option<String>,
    pub brand: Option<String>,
    pub customer: Option<String>,
}

impl AskArgs {
    fn intent(&self) -> Intent {
        let mut slots = Slots::new();
        slots.set(SlotName::Year, self.year.as_deref());
        slots.set(SlotName::Brand, self.brand.as_deref());
        slots.set(SlotName::Customer, self.customer.as_deref());
        Intent::new(IntentName::parse(Some(&self.intent)), slots)
    }
}

pub fn run(args: AskArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match runtime("ask") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let intent = args.intent();
    let context = RequestContext::new(format!("cli-{}", Uuid::new_v4()), "cli");

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let dispatcher = Dispatcher::new(Arc::new(SqlQueryExecutor::new(pool.clone())))
            .with_query_timeout(config.query.timeout());
        let dispatch = dispatcher.dispatch(&intent, &context).await;
        pool.close().await;
        Ok::<_, StepError>(dispatch)
    });

    let dispatch = match result {
        Ok(dispatch) => dispatch,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("ask", error_class, message, exit_code);
        }
    };

    let data = response_data(&dispatch);

    if let Some(error) = dispatch.errors.iter().find(|error| error.is_degraded()) {
        return CommandResult::failure_with_data("ask", error.kind(), error.to_string(), 4, data);
    }

    CommandResult::success_with_data("ask", dispatch.response.display_text.clone(), data)
}

/// The response JSON with the dispatch errors and the resulting session state.
fn response_data(dispatch: &Dispatch) -> Option<Value> {
    let mut response = serde_json::to_value(&dispatch.response).ok()?;
    if let Some(fields) = response.as_object_mut() {
        fields.insert("errors".to_string(), json!(dispatch.errors));
        fields.insert("sessionState".to_string(), json!(dispatch.state));
    }
    Some(response)
}

#[cfg(test)]
mod tests {
    use cpg_core::intent::{IntentName, SlotName};

    use super::AskArgs;

    #[test]
    fn args_map_to_intent_and_slots() {
        let args = AskArgs {
            intent: "TotalGrossProfit".to_string(),
            brand: Some("CESAR".to_string()),
            year: Some("  ".to_string()),
            ..AskArgs::default()
        };

        let intent = args.intent();

        assert_eq!(intent.name, IntentName::TotalGrossProfit);
        assert_eq!(intent.slots.get(SlotName::Brand), Some("CESAR"));
        assert_eq!(intent.slots.get(SlotName::Year), None);
    }

    #[test]
    fn built_in_names_are_accepted() {
        let args = AskArgs { intent: "AMAZON.HelpIntent".to_string(), ..AskArgs::default() };

        assert_eq!(args.intent().name, IntentName::Help);
    }
}

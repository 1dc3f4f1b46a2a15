use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{DispatchError, ExecError};
use crate::executor::QueryExecutor;
use crate::format;
use crate::intent::{Intent, IntentName, Slots};
use crate::query::{Metric, QueryResult, QuerySpec};
use crate::response::Response;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingIntent,
    SessionEnding,
}

impl SessionState {
    pub fn transition(self, route: &Route) -> SessionState {
        match (self, route) {
            (Self::SessionEnding, _) | (Self::AwaitingIntent, Route::Farewell) => {
                Self::SessionEnding
            }
            (Self::AwaitingIntent, _) => Self::AwaitingIntent,
        }
    }
}

/// What the dispatcher does for an intent.
#[derive(Clone, Copy, Debug)]
pub enum Route {
    Analytical(Metric),
    Canned(fn() -> Response),
    Farewell,
    Reprompt,
}

pub fn route(intent: &IntentName) -> Route {
    match intent {
        IntentName::TotalTradeSpend => Route::Analytical(Metric::TradeSpend),
        IntentName::TotalGrossProfit => Route::Analytical(Metric::GrossProfit),
        IntentName::TotalRoi => Route::Analytical(Metric::Roi),
        IntentName::BestPromotions => Route::Canned(format::best_promotions),
        IntentName::PromotionsPerformance => Route::Canned(format::promotions_performance),
        IntentName::HearMore => Route::Canned(format::hear_more),
        IntentName::Help => Route::Canned(format::help),
        IntentName::DontHearMore | IntentName::Stop | IntentName::Cancel => Route::Farewell,
        IntentName::Unrecognized(_) => Route::Reprompt,
    }
}

/// Identifiers the front end attaches to a request, used for log correlation only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub session_id: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), session_id: session_id.into() }
    }
}

/// Outcome of one dispatched request. `errors` lists what went wrong along the way; the
/// response is always usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub response: Response,
    pub state: SessionState,
    pub errors: Vec<DispatchError>,
}

impl Dispatch {
    fn clean(response: Response, state: SessionState) -> Self {
        Self { response, state, errors: Vec::new() }
    }

    pub fn is_degraded(&self) -> bool {
        self.errors.iter().any(DispatchError::is_degraded)
    }
}

pub struct Dispatcher {
    executor: Arc<dyn QueryExecutor>,
    query_timeout: Duration,
}

impl Dispatcher {
    pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor, query_timeout: Self::DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn launch(&self, context: &RequestContext) -> Dispatch {
        info!(
            event_name = "dispatch.launch",
            correlation_id = %context.request_id,
            session_id = %context.session_id,
            "session launched"
        );
        Dispatch::clean(format::welcome(), SessionState::AwaitingIntent)
    }

    pub fn session_started(&self, context: &RequestContext) {
        info!(
            event_name = "dispatch.session_started",
            correlation_id = %context.request_id,
            session_id = %context.session_id,
            "session started"
        );
    }

    pub fn session_ended(&self, context: &RequestContext) {
        info!(
            event_name = "dispatch.session_ended",
            correlation_id = %context.request_id,
            session_id = %context.session_id,
            "session ended by front end"
        );
    }

    pub async fn dispatch(&self, intent: &Intent, context: &RequestContext) -> Dispatch {
        let route = route(&intent.name);
        let state = SessionState::AwaitingIntent.transition(&route);
        info!(
            event_name = "dispatch.intent_received",
            correlation_id = %context.request_id,
            session_id = %context.session_id,
            intent = %intent.name,
            "intent received"
        );

        match route {
            Route::Analytical(metric) => self.answer(metric, &intent.slots, state, context).await,
            Route::Canned(reply) => Dispatch::clean(reply(), state),
            Route::Farewell => Dispatch::clean(format::farewell(&intent.name), state),
            Route::Reprompt => {
                warn!(
                    event_name = "dispatch.intent_unrecognized",
                    correlation_id = %context.request_id,
                    session_id = %context.session_id,
                    intent = %intent.name,
                    "unrecognized intent, re-prompting"
                );
                Dispatch {
                    response: format::unrecognized(&intent.name),
                    state,
                    errors: vec![DispatchError::InvalidIntent {
                        name: intent.name.as_str().to_string(),
                    }],
                }
            }
        }
    }

    async fn answer(
        &self,
        metric: Metric,
        slots: &Slots,
        state: SessionState,
        context: &RequestContext,
    ) -> Dispatch {
        let (slots, rejected) = slots.sanitized();
        let mut errors = rejected.into_iter().map(DispatchError::from).collect::<Vec<_>>();
        for error in &errors {
            warn!(
                event_name = "dispatch.slot_rejected",
                correlation_id = %context.request_id,
                session_id = %context.session_id,
                error = %error,
                "slot value ignored"
            );
        }

        let spec = QuerySpec::build(metric, &slots);
        debug!(
            event_name = "dispatch.query_built",
            correlation_id = %context.request_id,
            metric = %metric,
            filtered = spec.filter.is_some(),
            "query spec built"
        );

        let response = match self.execute(&spec).await {
            Ok(result) => {
                if !result.found {
                    errors.push(DispatchError::NoData { metric });
                }
                format::format(metric, &slots, &result)
            }
            Err(error) => {
                warn!(
                    event_name = "dispatch.query_failed",
                    correlation_id = %context.request_id,
                    session_id = %context.session_id,
                    metric = %metric,
                    error = %error,
                    "query executor failed, answering with apology"
                );
                errors.push(DispatchError::from(error));
                format::executor_unavailable(metric)
            }
        };

        Dispatch { response, state, errors }
    }

    async fn execute(&self, spec: &QuerySpec) -> Result<QueryResult, ExecError> {
        match tokio::time::timeout(self.query_timeout, self.executor.execute(spec)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ExecError::Timeout {
                after_ms: u64::try_from(self.query_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{route, Dispatcher, RequestContext, SessionState};
    use crate::errors::{DispatchError, ExecError};
    use crate::executor::QueryExecutor;
    use crate::intent::{Intent, IntentName, SlotName, Slots};
    use crate::query::{FilterClause, Metric, QueryResult, QuerySpec, ReportField};

    enum Outcome {
        Value(&'static str),
        Empty,
        Fail,
        Slow(Duration),
    }

    struct ScriptedExecutor {
        outcome: Outcome,
        seen: Mutex<Vec<QuerySpec>>,
    }

    impl ScriptedExecutor {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self { outcome, seen: Mutex::new(Vec::new()) })
        }

        fn seen(&self) -> Vec<QuerySpec> {
            self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl QueryExecutor for ScriptedExecutor {
        async fn execute(&self, spec: &QuerySpec) -> Result<QueryResult, ExecError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(spec.clone());
            }
            match self.outcome {
                Outcome::Value(value) => Ok(QueryResult { scalar: value.to_string(), found: true }),
                Outcome::Empty => Ok(QueryResult::no_data()),
                Outcome::Fail => Err(ExecError::Unavailable("connection refused".to_string())),
                Outcome::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(QueryResult::no_data())
                }
            }
        }
    }

    fn context() -> RequestContext {
        RequestContext::new("req-1", "session-1")
    }

    fn intent(name: &str, slots: Slots) -> Intent {
        Intent::new(IntentName::parse(Some(name)), slots)
    }

    #[tokio::test]
    async fn scenario_a_trade_spend_for_year() {
        let executor = ScriptedExecutor::new(Outcome::Value("203090661"));
        let dispatcher = Dispatcher::new(executor.clone());

        let dispatch = dispatcher
            .dispatch(
                &intent("TotalTradeSpend", Slots::new().with(SlotName::Year, "2016")),
                &context(),
            )
            .await;

        assert_eq!(
            executor.seen(),
            vec![QuerySpec {
                metric: Metric::TradeSpend,
                filter: Some(FilterClause::eq(ReportField::Year, "2016")),
                group_by: Some(ReportField::Year),
            }]
        );
        assert_eq!(
            dispatch.response.display_text,
            "The Total Trade Spend for year 2016 is 203090661"
        );
        assert_eq!(dispatch.state, SessionState::AwaitingIntent);
        assert!(dispatch.errors.is_empty());
    }

    #[tokio::test]
    async fn scenario_b_gross_profit_for_brand() {
        let executor = ScriptedExecutor::new(Outcome::Value("2376586"));
        let dispatcher = Dispatcher::new(executor.clone());

        let dispatch = dispatcher
            .dispatch(
                &intent("TotalGrossProfit", Slots::new().with(SlotName::Brand, "CESAR")),
                &context(),
            )
            .await;

        assert_eq!(
            executor.seen()[0].filter,
            Some(FilterClause::eq(ReportField::Brand, "CESAR"))
        );
        assert!(dispatch.response.display_text.contains("brand CESAR"));
        assert!(dispatch.response.display_text.contains("2376586"));
    }

    #[tokio::test]
    async fn scenario_c_roi_without_customer_is_unfiltered() {
        let executor = ScriptedExecutor::new(Outcome::Value("260.3"));
        let dispatcher = Dispatcher::new(executor.clone());

        let dispatch = dispatcher.dispatch(&intent("TotalROI", Slots::new()), &context()).await;

        assert_eq!(executor.seen(), vec![QuerySpec::ungrouped(Metric::Roi)]);
        assert_eq!(dispatch.response.display_text, "The Total ROI is 260.3");
    }

    #[tokio::test]
    async fn scenario_d_unknown_intent_reprompts() {
        let executor = ScriptedExecutor::new(Outcome::Value("1"));
        let dispatcher = Dispatcher::new(executor.clone());

        let dispatch = dispatcher.dispatch(&intent("UnknownThing", Slots::new()), &context()).await;

        assert!(dispatch.response.spoken_text.contains("UnknownThing"));
        assert!(!dispatch.response.ends_session);
        assert_eq!(dispatch.state, SessionState::AwaitingIntent);
        assert_eq!(
            dispatch.errors,
            vec![DispatchError::InvalidIntent { name: "UnknownThing".to_string() }]
        );
        assert!(executor.seen().is_empty());
    }

    #[tokio::test]
    async fn scenario_e_stop_ends_session() {
        let dispatcher = Dispatcher::new(ScriptedExecutor::new(Outcome::Value("1")));

        let dispatch = dispatcher.dispatch(&intent("Stop", Slots::new()), &context()).await;

        assert!(dispatch.response.ends_session);
        assert_eq!(dispatch.response.display_text, "Bye, hope to see you soon!");
        assert_eq!(dispatch.state, SessionState::SessionEnding);
    }

    #[tokio::test]
    async fn scenario_f_executor_failure_yields_apology() {
        let dispatcher = Dispatcher::new(ScriptedExecutor::new(Outcome::Fail));

        let dispatch = dispatcher
            .dispatch(
                &intent("TotalROI", Slots::new().with(SlotName::Customer, "TARGET")),
                &context(),
            )
            .await;

        assert!(dispatch.response.spoken_text.contains("Sorry"));
        assert!(!dispatch.response.ends_session);
        assert!(dispatch.is_degraded());
        assert_eq!(dispatch.errors[0].kind(), "executor_unavailable");
    }

    #[tokio::test]
    async fn slow_executor_is_cut_off_by_timeout() {
        let dispatcher = Dispatcher::new(ScriptedExecutor::new(Outcome::Slow(
            Duration::from_millis(200),
        )))
        .with_query_timeout(Duration::from_millis(10));

        let dispatch =
            dispatcher.dispatch(&intent("TotalGrossProfit", Slots::new()), &context()).await;

        assert_eq!(
            dispatch.errors,
            vec![DispatchError::ExecutorUnavailable {
                reason: "query did not finish within 10ms".to_string(),
            }]
        );
        assert!(!dispatch.response.ends_session);
    }

    #[tokio::test]
    async fn malformed_year_falls_back_to_unfiltered_query() {
        let executor = ScriptedExecutor::new(Outcome::Value("999"));
        let dispatcher = Dispatcher::new(executor.clone());

        let dispatch = dispatcher
            .dispatch(
                &intent("TotalTradeSpend", Slots::new().with(SlotName::Year, "soon")),
                &context(),
            )
            .await;

        assert_eq!(executor.seen(), vec![QuerySpec::ungrouped(Metric::TradeSpend)]);
        assert_eq!(dispatch.response.display_text, "The Total Trade Spend is 999");
        assert_eq!(dispatch.errors[0].kind(), "malformed_slot");
        assert!(!dispatch.is_degraded());
    }

    #[tokio::test]
    async fn missing_row_is_reported_as_no_data() {
        let dispatcher = Dispatcher::new(ScriptedExecutor::new(Outcome::Empty));

        let dispatch = dispatcher
            .dispatch(
                &intent("TotalGrossProfit", Slots::new().with(SlotName::Brand, "NOPE")),
                &context(),
            )
            .await;

        assert_eq!(dispatch.errors, vec![DispatchError::NoData { metric: Metric::GrossProfit }]);
        assert!(dispatch.response.display_text.ends_with("no data found"));
    }

    #[tokio::test]
    async fn canned_intents_do_not_touch_the_executor() {
        let executor = ScriptedExecutor::new(Outcome::Fail);
        let dispatcher = Dispatcher::new(executor.clone());

        for name in ["BestPromotions", "PromotionsPerformance", "HearMore", "AMAZON.HelpIntent"] {
            let dispatch = dispatcher.dispatch(&intent(name, Slots::new()), &context()).await;
            assert_eq!(dispatch.state, SessionState::AwaitingIntent);
            assert!(dispatch.errors.is_empty());
        }
        assert!(executor.seen().is_empty());
    }

    #[test]
    fn session_ending_is_terminal() {
        let next = SessionState::SessionEnding.transition(&route(&IntentName::Help));
        assert_eq!(next, SessionState::SessionEnding);
    }

    #[test]
    fn launch_greets_and_keeps_session_open() {
        let dispatcher = Dispatcher::new(ScriptedExecutor::new(Outcome::Fail));

        let dispatch = dispatcher.launch(&context());

        assert!(dispatch.response.spoken_text.contains("Welcome to the CPG Analytics"));
        assert!(!dispatch.response.ends_session);
    }
}

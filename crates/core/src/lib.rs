pub mod config;
pub mod dispatch;
pub mod errors;
pub mod executor;
pub mod format;
pub mod intent;
pub mod query;
pub mod response;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use dispatch::{Dispatch, Dispatcher, RequestContext, Route, SessionState};
pub use errors::{DispatchError, ExecError, SlotError};
pub use executor::{InMemoryQueryExecutor, QueryExecutor, ReportRow};
pub use intent::{Intent, IntentName, SlotName, Slots};
pub use query::{FilterClause, FilterOperator, Metric, QueryResult, QuerySpec, ReportField};
pub use response::{Card, Response, Speech, SpeechKind};

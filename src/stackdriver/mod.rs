//! Cloud Logging structured-payload decorator

pub mod classifier;
pub mod decorator;
pub mod schema;
pub mod scope;

pub use classifier::{Classified, Classifier, ErrorRenderer};
pub use decorator::{StackdriverCore, StackdriverSettings};
pub use schema::{
    ContextInfo, ErrorReportingContext, HttpRequestEntry, Location, ReportLocation,
    ServiceContext, SourceLocation,
};
pub use scope::{NotificationDirective, ScopeState};

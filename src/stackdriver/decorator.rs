//! Stackdriver decorator core
//!
//! Wraps any [`LogCore`] and rewrites each entry into the Cloud Logging
//! structured-payload shape before handing it on:
//!
//! - reserved fields (`label#*`, `context`, `slack`, `user`, `stack_trace`)
//!   are consumed and expanded
//! - exactly one `logging.googleapis.com/labels` object is emitted
//! - `sourceLocation`, `serviceContext` and the Error Reporting `context`
//!   are appended to every entry
//!
//! Entries with notification enabled are also queued on the shared
//! [`Notifier`]. Derived cores share the notifier, so `sync` on any of
//! them waits for all notifications in the tree.

use super::classifier::{labels_field, Classified, Classifier, ErrorRenderer};
use super::schema::{
    ErrorReportingContext, Location, ServiceContext, ERROR_CONTEXT_KEY, SERVICE_CONTEXT_KEY,
    SOURCE_LOCATION_KEY,
};
use super::scope::{NotificationDirective, ScopeState};
use crate::core::config::UNKNOWN;
use crate::core::error::Result;
use crate::core::field::Field;
use crate::core::log_core::LogCore;
use crate::core::log_entry::LogEntry;
use crate::core::log_level::LogLevel;
use crate::notify::Notifier;
use std::sync::Arc;

/// Settings fixed for the whole decorator tree
#[derive(Clone, Default)]
pub struct StackdriverSettings {
    pub service: ServiceContext,
    /// Qualifies trace ids as `projects/<id>/traces/<trace>`
    pub project_id: String,
    /// Root notification destination
    pub webhook_url: String,
    pub error_renderer: Option<ErrorRenderer>,
}

impl StackdriverSettings {
    pub fn new(service: ServiceContext) -> Self {
        Self {
            service,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    #[must_use]
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = url.into();
        self
    }

    #[must_use]
    pub fn error_renderer(mut self, renderer: ErrorRenderer) -> Self {
        self.error_renderer = Some(renderer);
        self
    }
}

#[derive(Clone)]
pub struct StackdriverCore {
    inner: Arc<dyn LogCore>,
    notifier: Arc<Notifier>,
    settings: Arc<StackdriverSettings>,
    scope: Arc<ScopeState>,
}

impl StackdriverCore {
    pub fn new(
        inner: Arc<dyn LogCore>,
        notifier: Arc<Notifier>,
        settings: StackdriverSettings,
    ) -> Self {
        let scope = ScopeState::root(settings.webhook_url.clone());
        Self {
            inner,
            notifier,
            settings: Arc::new(settings),
            scope,
        }
    }

    pub fn scope(&self) -> &ScopeState {
        &self.scope
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn inner(&self) -> &Arc<dyn LogCore> {
        &self.inner
    }

    fn classifier(&self) -> Classifier<'_> {
        Classifier::new(&self.scope.destination)
            .with_project_id(&self.settings.project_id)
            .with_error_renderer(self.settings.error_renderer.as_ref())
    }

    /// Final field list: scope fields, call fields, one labels object,
    /// then the location and service metadata.
    fn assemble(&self, call: Classified, location: &Location, user: String) -> Vec<Field> {
        let scope = &self.scope;
        let mut fields = Vec::with_capacity(scope.fields.len() + call.fields.len() + 4);
        fields.extend(scope.fields.iter().cloned());
        fields.extend(call.fields);

        let mut labels = scope.labels.clone();
        labels.extend(call.labels);
        if let Some(labels) = labels_field(&labels) {
            fields.push(labels);
        }

        fields.push(Field::object(SOURCE_LOCATION_KEY, &location.source_location()));
        fields.push(Field::object(SERVICE_CONTEXT_KEY, &self.settings.service));
        fields.push(Field::object(
            ERROR_CONTEXT_KEY,
            &ErrorReportingContext {
                report_location: location.report_location(),
                user,
            },
        ));
        fields
    }
}

impl LogCore for StackdriverCore {
    fn enabled(&self, level: LogLevel) -> bool {
        self.inner.enabled(level)
    }

    fn with(&self, fields: &[Field]) -> Arc<dyn LogCore> {
        let classified = self.classifier().classify(fields, None);
        Arc::new(Self {
            inner: Arc::clone(&self.inner),
            notifier: Arc::clone(&self.notifier),
            settings: Arc::clone(&self.settings),
            scope: self.scope.derive(classified),
        })
    }

    fn write(&self, entry: &LogEntry, fields: &[Field]) -> Result<()> {
        let mut entry = entry.clone();
        if !entry.logger_name.is_empty() && entry.logger_name != UNKNOWN {
            entry.message = format!("{}: {}", entry.logger_name, entry.message);
        }

        let location = Location::from_call_site(entry.call_site.as_ref());
        let call = self.classifier().classify(fields, Some(&entry.message));

        let directive = call.directive.or(self.scope.directive);
        let destination = if call.directive.is_explicit() {
            call.destination.clone()
        } else {
            self.scope.destination.clone()
        };
        let user = if call.user.is_empty() {
            self.scope.user.clone()
        } else {
            call.user.clone()
        };

        let fields = self.assemble(call, &location, user);

        if directive == NotificationDirective::Enabled {
            self.notifier.dispatch(&destination, &entry, fields.clone());
        }

        self.inner.write(&entry, &fields)
    }

    fn sync(&self) -> Result<()> {
        self.notifier.wait_idle();
        self.inner.sync()
    }

    fn name(&self) -> &str {
        "stackdriver"
    }
}

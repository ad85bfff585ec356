//! Reserved-field recognition
//!
//! Splits the fields of one call into the set forwarded to the inner core
//! and the side information the decorator needs: labels, attribution user,
//! and the notification directive.

use super::schema::{
    ContextInfo, CONTEXT_INFO_KEY, GRPC_METHOD_KEY, LABELS_KEY, LABEL_PREFIX, REQUEST_ID_KEY,
    SLACK_KEY, SPAN_ID_KEY, STACK_TRACE_KEY, TRACE_KEY, TRACE_SAMPLED_KEY, USER_KEY,
};
use super::scope::NotificationDirective;
use crate::core::field::{Field, FieldValue, SharedError};
use std::error::Error as StdError;
use std::sync::Arc;

/// Pluggable error renderer.
///
/// Returning `Some(object)` replaces the error field with that object under
/// the same key; `None` leaves the field untouched.
pub type ErrorRenderer =
    Arc<dyn Fn(&(dyn StdError + Send + Sync + 'static)) -> Option<serde_json::Value> + Send + Sync>;

/// Result of classifying one batch of fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// Pass-through and expanded fields, in call order
    pub fields: Vec<Field>,
    /// Label entries with the prefix stripped, in call order
    pub labels: Vec<(String, String)>,
    pub user: String,
    pub directive: NotificationDirective,
    pub destination: String,
}

impl Classified {
    /// Forwarded fields followed by the composite labels object, if any
    pub fn into_forward_fields(self) -> Vec<Field> {
        let mut fields = self.fields;
        if let Some(labels) = labels_field(&self.labels) {
            fields.push(labels);
        }
        fields
    }
}

/// Single composite labels object, or `None` when there are no labels
pub fn labels_field(labels: &[(String, String)]) -> Option<Field> {
    if labels.is_empty() {
        return None;
    }
    let map: serde_json::Map<String, serde_json::Value> = labels
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    Some(Field::new(LABELS_KEY, FieldValue::Object(map.into())))
}

/// What a field means to the classifier. Exactly one applies per field.
enum Marker<'f> {
    Label(&'f str),
    ContextInfo,
    Slack,
    User(&'f str),
    StackTrace(&'f str),
    Error(&'f SharedError),
    Plain,
}

#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    /// Destination used by `slack=true`
    pub default_destination: &'a str,
    /// Cloud project qualifying trace ids
    pub project_id: &'a str,
    pub error_renderer: Option<&'a ErrorRenderer>,
}

impl<'a> Classifier<'a> {
    pub fn new(default_destination: &'a str) -> Self {
        Self {
            default_destination,
            project_id: "",
            error_renderer: None,
        }
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: &'a str) -> Self {
        self.project_id = project_id;
        self
    }

    #[must_use]
    pub fn with_error_renderer(mut self, renderer: Option<&'a ErrorRenderer>) -> Self {
        self.error_renderer = renderer;
        self
    }

    fn marker<'f>(&self, field: &'f Field) -> Marker<'f> {
        if let Some(label) = field.key.strip_prefix(LABEL_PREFIX) {
            return Marker::Label(label);
        }
        match (field.key.as_str(), &field.value) {
            (CONTEXT_INFO_KEY, _) => Marker::ContextInfo,
            (SLACK_KEY, _) => Marker::Slack,
            (USER_KEY, FieldValue::String(user)) => Marker::User(user),
            (STACK_TRACE_KEY, FieldValue::String(stack)) => Marker::StackTrace(stack),
            (_, FieldValue::Error(err)) if self.error_renderer.is_some() => Marker::Error(err),
            _ => Marker::Plain,
        }
    }

    /// Classify `fields` in call order.
    ///
    /// `message` is the entry's message when classifying a write; it is
    /// prepended to stack traces.
    pub fn classify(&self, fields: &[Field], message: Option<&str>) -> Classified {
        let mut out = Classified::default();

        for field in fields {
            match self.marker(field) {
                Marker::Label(key) => {
                    // Non-string labels are malformed and dropped
                    if let FieldValue::String(value) = &field.value {
                        out.labels.push((key.to_string(), value.clone()));
                    }
                }
                Marker::ContextInfo => {
                    if let Some(info) = context_info(&field.value) {
                        self.expand_context(&info, &mut out.fields);
                    }
                }
                Marker::Slack => match &field.value {
                    FieldValue::Bool(true) => {
                        out.directive = NotificationDirective::Enabled;
                        out.destination = self.default_destination.to_string();
                    }
                    FieldValue::Bool(false) => {
                        out.directive = NotificationDirective::Disabled;
                        out.destination.clear();
                    }
                    FieldValue::String(url) => {
                        out.directive = NotificationDirective::Enabled;
                        out.destination = url.clone();
                    }
                    _ => {}
                },
                Marker::User(user) => out.user = user.to_string(),
                Marker::StackTrace(stack) => match message {
                    Some(msg) if !msg.is_empty() => out
                        .fields
                        .push(Field::string(STACK_TRACE_KEY, format!("{}\n{}", msg, stack))),
                    _ => out.fields.push(field.clone()),
                },
                Marker::Error(err) => {
                    let rendered = self
                        .error_renderer
                        .and_then(|render| render(&**err));
                    match rendered {
                        Some(obj) => out
                            .fields
                            .push(Field::new(field.key.clone(), FieldValue::Object(obj))),
                        None => out.fields.push(field.clone()),
                    }
                }
                Marker::Plain => out.fields.push(field.clone()),
            }
        }

        out
    }

    fn expand_context(&self, info: &ContextInfo, fields: &mut Vec<Field>) {
        if info.is_sampled {
            fields.push(Field::bool(TRACE_SAMPLED_KEY, true));
            fields.push(Field::string(TRACE_KEY, info.trace_resource(self.project_id)));
            fields.push(Field::string(SPAN_ID_KEY, info.span_id.clone()));
        }
        if !info.grpc_method.is_empty() {
            fields.push(Field::string(GRPC_METHOD_KEY, info.grpc_method.clone()));
        }
        if !info.request_id.is_empty() {
            fields.push(Field::string(REQUEST_ID_KEY, info.request_id.clone()));
        }
    }
}

fn context_info(value: &FieldValue) -> Option<ContextInfo> {
    match value {
        FieldValue::Reflected(v) | FieldValue::Object(v) if v.is_object() => {
            serde_json::from_value(v.clone()).ok()
        }
        _ => None,
    }
}

//! Scope state inherited by derived loggers

use super::classifier::Classified;
use crate::core::field::Field;
use std::sync::Arc;

/// Tri-state notification decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationDirective {
    /// Nothing said; defer to the enclosing scope
    #[default]
    Default,
    Enabled,
    Disabled,
}

impl NotificationDirective {
    /// `self` if it is explicit, otherwise `inherited`
    pub fn or(self, inherited: NotificationDirective) -> NotificationDirective {
        match self {
            NotificationDirective::Default => inherited,
            explicit => explicit,
        }
    }

    pub fn is_explicit(self) -> bool {
        self != NotificationDirective::Default
    }
}

/// Accumulated state of a derived logger.
///
/// Never mutated after construction: deriving allocates a new state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeState {
    pub fields: Vec<Field>,
    pub labels: Vec<(String, String)>,
    pub user: String,
    pub directive: NotificationDirective,
    pub destination: String,
}

impl ScopeState {
    /// Root scope whose notifications default to `destination`
    pub fn root(destination: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            destination: destination.into(),
            ..Self::default()
        })
    }

    /// Child scope: parent state with the classified child fields merged over it
    pub fn derive(&self, child: Classified) -> Arc<Self> {
        let mut fields = Vec::with_capacity(self.fields.len() + child.fields.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(child.fields);

        let mut labels = Vec::with_capacity(self.labels.len() + child.labels.len());
        labels.extend(self.labels.iter().cloned());
        labels.extend(child.labels);

        let user = if child.user.is_empty() {
            self.user.clone()
        } else {
            child.user
        };

        let (directive, destination) = if child.directive.is_explicit() {
            let destination = if child.destination.is_empty() {
                self.destination.clone()
            } else {
                child.destination
            };
            (child.directive, destination)
        } else {
            (self.directive, self.destination.clone())
        };

        Arc::new(Self {
            fields,
            labels,
            user,
            directive,
            destination,
        })
    }
}

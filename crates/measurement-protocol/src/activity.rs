//! Things an application can track.

use crate::{CustomDimensions, ProtocolResult};
use std::time::Duration;
use url::Url;

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityKind {
    PageView {
        location: Url,
        title: Option<String>,
    },
    /// App view.
    ScreenView {
        screen_name: String,
    },
    Event {
        category: String,
        action: String,
        label: Option<String>,
        value: Option<i64>,
    },
    Social {
        network: String,
        action: String,
        target: Option<String>,
    },
    Timing {
        category: String,
        variable: String,
        duration: Duration,
        label: Option<String>,
    },
    Exception {
        description: Option<String>,
        is_fatal: bool,
    },
    Transaction {
        id: String,
        affiliation: Option<String>,
        revenue: Option<f64>,
        shipping: Option<f64>,
        tax: Option<f64>,
        currency: Option<String>,
    },
    TransactionItem {
        transaction_id: String,
        name: String,
        price: Option<f64>,
        quantity: Option<u32>,
        code: Option<String>,
        variation: Option<String>,
        currency: Option<String>,
    },
}

impl ActivityKind {
    /// Measurement Protocol hit type (`t`).
    pub fn hit_type(&self) -> &'static str {
        match self {
            ActivityKind::PageView { .. } => "pageview",
            ActivityKind::ScreenView { .. } => "screenview",
            ActivityKind::Event { .. } => "event",
            ActivityKind::Social { .. } => "social",
            ActivityKind::Timing { .. } => "timing",
            ActivityKind::Exception { .. } => "exception",
            ActivityKind::Transaction { .. } => "transaction",
            ActivityKind::TransactionItem { .. } => "item",
        }
    }
}

/// A tracked activity with its per-hit options.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub kind: ActivityKind,
    /// Excluded from bounce-rate calculations.
    pub non_interaction: bool,
    /// Per-activity slots; override session-scoped slots with the same index.
    pub custom: CustomDimensions,
}

impl From<ActivityKind> for Activity {
    fn from(kind: ActivityKind) -> Self {
        Self {
            kind,
            non_interaction: false,
            custom: CustomDimensions::new(),
        }
    }
}

impl Activity {
    pub fn page_view(location: Url, title: Option<String>) -> Self {
        ActivityKind::PageView { location, title }.into()
    }

    pub fn screen_view(screen_name: impl Into<String>) -> Self {
        ActivityKind::ScreenView {
            screen_name: screen_name.into(),
        }
        .into()
    }

    pub fn event(
        category: impl Into<String>,
        action: impl Into<String>,
        label: Option<String>,
        value: Option<i64>,
    ) -> Self {
        ActivityKind::Event {
            category: category.into(),
            action: action.into(),
            label,
            value,
        }
        .into()
    }

    pub fn social(
        network: impl Into<String>,
        action: impl Into<String>,
        target: Option<String>,
    ) -> Self {
        ActivityKind::Social {
            network: network.into(),
            action: action.into(),
            target,
        }
        .into()
    }

    pub fn timing(
        category: impl Into<String>,
        variable: impl Into<String>,
        duration: Duration,
        label: Option<String>,
    ) -> Self {
        ActivityKind::Timing {
            category: category.into(),
            variable: variable.into(),
            duration,
            label,
        }
        .into()
    }

    pub fn exception(description: Option<String>, is_fatal: bool) -> Self {
        ActivityKind::Exception {
            description,
            is_fatal,
        }
        .into()
    }

    pub fn non_interactive(mut self) -> Self {
        self.non_interaction = true;
        self
    }

    pub fn with_dimension(mut self, index: u16, value: impl Into<String>) -> ProtocolResult<Self> {
        self.custom.set_dimension(index, value)?;
        Ok(self)
    }

    pub fn with_metric(mut self, index: u16, value: i64) -> ProtocolResult<Self> {
        self.custom.set_metric(index, value)?;
        Ok(self)
    }

    pub fn hit_type(&self) -> &'static str {
        self.kind.hit_type()
    }

    /// Location of a page view, used as the referrer for the next one.
    pub fn page_location(&self) -> Option<&Url> {
        match &self.kind {
            ActivityKind::PageView { location, .. } => Some(location),
            _ => None,
        }
    }
}

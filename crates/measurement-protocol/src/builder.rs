//! Measurement Protocol request URI construction.

use crate::{Activity, ActivityKind, CustomDimensions, Environment, ProtocolError, ProtocolResult};
use measurement_session::{SessionManager, SessionStatus};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use tracing::trace;
use url::Url;

/// Value of the `v` parameter.
pub const PROTOCOL_VERSION: &str = "1";

/// Turns an activity plus current session state into a request URI.
///
/// Building must not change session state; the caller records the hit.
pub trait UriBuilder: Send + Sync {
    fn build(&self, activity: &Activity, session: &SessionManager) -> Url;
}

/// Builds Measurement Protocol v1 hits against a collector endpoint.
pub struct MeasurementUriBuilder {
    endpoint: Url,
    property_id: String,
    app_name: Option<String>,
    app_version: Option<String>,
    anonymize_ip: bool,
    environment: Arc<dyn Environment>,
    session_custom: Mutex<CustomDimensions>,
}

impl MeasurementUriBuilder {
    pub fn new(
        endpoint: Url,
        property_id: impl Into<String>,
        environment: Arc<dyn Environment>,
    ) -> ProtocolResult<Self> {
        if endpoint.cannot_be_a_base() {
            return Err(ProtocolError::UnsupportedEndpoint(endpoint.to_string()));
        }

        Ok(Self {
            endpoint,
            property_id: property_id.into(),
            app_name: None,
            app_version: None,
            anonymize_ip: false,
            environment,
            session_custom: Mutex::new(CustomDimensions::new()),
        })
    }

    pub fn with_app(mut self, name: Option<String>, version: Option<String>) -> Self {
        self.app_name = name.filter(|n| !n.is_empty());
        self.app_version = version.filter(|v| !v.is_empty());
        self
    }

    pub fn with_anonymize_ip(mut self, anonymize_ip: bool) -> Self {
        self.anonymize_ip = anonymize_ip;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Set a dimension sent with every subsequent hit.
    pub fn set_session_dimension(&self, index: u16, value: impl Into<String>) -> ProtocolResult<()> {
        self.session_custom.lock().set_dimension(index, value)
    }

    /// Set a metric sent with every subsequent hit.
    pub fn set_session_metric(&self, index: u16, value: i64) -> ProtocolResult<()> {
        self.session_custom.lock().set_metric(index, value)
    }

    pub fn clear_session_custom(&self) {
        *self.session_custom.lock() = CustomDimensions::new();
    }
}

impl UriBuilder for MeasurementUriBuilder {
    fn build(&self, activity: &Activity, session: &SessionManager) -> Url {
        let mut uri = self.endpoint.clone();
        let custom = self.session_custom.lock().merged_with(&activity.custom);

        {
            let mut query = uri.query_pairs_mut();
            query
                .append_pair("v", PROTOCOL_VERSION)
                .append_pair("tid", &self.property_id)
                .append_pair("cid", &session.visitor().id().to_string())
                .append_pair("t", activity.hit_type());

            match session.session_status() {
                SessionStatus::Starting => {
                    query.append_pair("sc", "start");
                }
                SessionStatus::Ending => {
                    query.append_pair("sc", "end");
                }
                SessionStatus::Active => {}
            }

            if activity.non_interaction {
                query.append_pair("ni", "1");
            }
            if self.anonymize_ip {
                query.append_pair("aip", "1");
            }

            for (key, value) in activity_params(&activity.kind) {
                query.append_pair(key, &value);
            }
            if activity.page_location().is_some() {
                if let Some(referrer) = session.referrer() {
                    query.append_pair("dr", referrer.as_str());
                }
            }

            for (key, value) in environment_params(self.environment.as_ref()) {
                query.append_pair(key, &value);
            }
            if let Some(name) = &self.app_name {
                query.append_pair("an", name);
            }
            if let Some(version) = &self.app_version {
                query.append_pair("av", version);
            }

            for (key, value) in custom.query_pairs() {
                query.append_pair(&key, &value);
            }

            let cache_buster: u32 = rand::thread_rng().gen();
            query.append_pair("z", &cache_buster.to_string());
        }

        trace!(hit_type = activity.hit_type(), uri = %uri, "Built request URI");
        uri
    }
}

fn activity_params(kind: &ActivityKind) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    let mut push = |key: &'static str, value: Option<String>| {
        if let Some(value) = value {
            params.push((key, value));
        }
    };

    match kind {
        ActivityKind::PageView { location, title } => {
            push("dl", Some(location.to_string()));
            push("dt", title.clone());
        }
        ActivityKind::ScreenView { screen_name } => {
            push("cd", Some(screen_name.clone()));
        }
        ActivityKind::Event {
            category,
            action,
            label,
            value,
        } => {
            push("ec", Some(category.clone()));
            push("ea", Some(action.clone()));
            push("el", label.clone());
            push("ev", value.map(|v| v.to_string()));
        }
        ActivityKind::Social {
            network,
            action,
            target,
        } => {
            push("sn", Some(network.clone()));
            push("sa", Some(action.clone()));
            push("st", target.clone());
        }
        ActivityKind::Timing {
            category,
            variable,
            duration,
            label,
        } => {
            push("utc", Some(category.clone()));
            push("utv", Some(variable.clone()));
            push("utt", Some(duration.as_millis().to_string()));
            push("utl", label.clone());
        }
        ActivityKind::Exception {
            description,
            is_fatal,
        } => {
            push("exd", description.clone());
            push("exf", Some(if *is_fatal { "1" } else { "0" }.to_string()));
        }
        ActivityKind::Transaction {
            id,
            affiliation,
            revenue,
            shipping,
            tax,
            currency,
        } => {
            push("ti", Some(id.clone()));
            push("ta", affiliation.clone());
            push("tr", revenue.map(|v| v.to_string()));
            push("ts", shipping.map(|v| v.to_string()));
            push("tt", tax.map(|v| v.to_string()));
            push("cu", currency.clone());
        }
        ActivityKind::TransactionItem {
            transaction_id,
            name,
            price,
            quantity,
            code,
            variation,
            currency,
        } => {
            push("ti", Some(transaction_id.clone()));
            push("in", Some(name.clone()));
            push("ip", price.map(|v| v.to_string()));
            push("iq", quantity.map(|v| v.to_string()));
            push("ic", code.clone());
            push("iv", variation.clone());
            push("cu", currency.clone());
        }
    }

    params
}

fn environment_params(environment: &dyn Environment) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(language) = environment.language() {
        params.push(("ul", language));
    }
    if let Some((width, height)) = environment.screen_resolution() {
        params.push(("sr", format!("{width}x{height}")));
    }
    if let Some((width, height)) = environment.viewport() {
        params.push(("vp", format!("{width}x{height}")));
    }
    if let Some(depth) = environment.color_depth() {
        params.push(("sd", format!("{depth}-bits")));
    }
    if let Some(charset) = environment.character_set() {
        params.push(("de", charset));
    }
    params
}

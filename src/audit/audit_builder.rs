use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::errors::InternalError;
use crate::stores::AuditStore;
use crate::types::internal::audit::{AuditEvent, EventType};
use crate::types::internal::context::RequestContext;

/// Builder for ad-hoc audit events
///
/// Event types without a dedicated `AuditLogger` method go through here.
/// Sensitive values can be added hashed so events stay correlatable without
/// exposing the value.
pub struct AuditBuilder {
    event_type: EventType,
    actor_id: Option<String>,
    ip_address: Option<String>,
    jwt_id: Option<String>,
    data: HashMap<String, serde_json::Value>,
    store: Arc<AuditStore>,
}

impl AuditBuilder {
    pub fn new(store: Arc<AuditStore>, event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            actor_id: None,
            ip_address: None,
            jwt_id: None,
            data: HashMap::new(),
            store,
        }
    }

    /// Populate actor, client address, JWT id and request fields from the context
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.actor_id = Some(ctx.actor_id.clone());
        self.ip_address = Some(ctx.client_key());
        self.jwt_id = ctx.claims.as_ref().map(|claims| claims.jti.clone());

        self.data
            .insert("request_id".to_string(), json!(ctx.request_id.to_string()));
        self.data
            .insert("source".to_string(), json!(ctx.source.to_string()));
        if let Some(username) = ctx.username() {
            self.data.insert("actor_username".to_string(), json!(username));
        }
        if let Some(method) = &ctx.method {
            self.data.insert("method".to_string(), json!(method));
        }
        if let Some(path) = &ctx.path {
            self.data.insert("path".to_string(), json!(path));
        }

        self
    }

    /// Add a field; values that fail to serialize are dropped
    pub fn add_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.data.insert(key.into(), json_value);
        }
        self
    }

    /// Add a field as `sha256:<hex>` of its JSON form
    pub fn add_sensitive(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(&value) {
            let digest = Sha256::digest(json_value.to_string().as_bytes());
            self.data
                .insert(key.into(), json!(format!("sha256:{:x}", digest)));
        }
        self
    }

    pub fn build(self) -> AuditEvent {
        AuditEvent {
            event_type: self.event_type,
            actor_id: self.actor_id,
            ip_address: self.ip_address,
            jwt_id: self.jwt_id,
            data: self.data,
        }
    }

    pub async fn write(self) -> Result<(), InternalError> {
        let store = Arc::clone(&self.store);
        store.write_event(self.build()).await
    }
}

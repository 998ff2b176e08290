//! Test harness: application state over in-memory SQLite with the embedded
//! migrator applied, plus seeding and actor helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use restosehat_api::{
    auth::{Actor, Role},
    config::AppConfig,
    db::{self, DbConfig},
    entities::{branch, inventory, item},
    events::{self, EventSender},
    schema::SchemaCapabilities,
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-with-plenty-of-entropy-0123456789";

pub struct TestApp {
    pub state: AppState,
    pub events: broadcast::Receiver<Value>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            // A single connection keeps every statement on the same
            // in-memory database.
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("test database");
        db::run_migrations(&pool).await.expect("migrations");

        let caps = SchemaCapabilities::detect(&pool)
            .await
            .expect("capability probe");
        assert_eq!(caps, SchemaCapabilities::full());

        let (event_tx, event_rx) = mpsc::channel(64);
        let (fanout_tx, fanout_rx) = broadcast::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx, fanout_tx));

        let config = AppConfig {
            database_url: db_cfg.url.clone(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_expiration: 3600,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            log_level: "warn".to_string(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: 1,
            db_min_connections: 1,
            db_connect_timeout_secs: 5,
            db_idle_timeout_secs: 60,
            db_acquire_timeout_secs: 5,
            event_channel_capacity: 64,
            default_reorder_level: 5,
            request_timeout_secs: 5,
        };

        let state = AppState::build(Arc::new(pool), Arc::new(config), event_sender, caps);

        Self {
            state,
            events: fanout_rx,
            _event_task: event_task,
        }
    }

    pub async fn seed_branch(&self, name: &str) -> branch::Model {
        branch::ActiveModel {
            name: Set(name.to_string()),
            location: Set(format!("{} street", name)),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed branch")
    }

    pub async fn seed_item(&self, id: &str, name: &str) -> item::Model {
        item::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed item")
    }

    pub async fn seed_inventory(
        &self,
        branch_id: i64,
        item_id: &str,
        qty: i32,
        reorder_level: i32,
    ) -> inventory::Model {
        inventory::ActiveModel {
            branch_id: Set(branch_id),
            item_id: Set(item_id.to_string()),
            qty: Set(qty),
            reorder_level: Set(reorder_level),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed inventory")
    }

    /// Waits for the next fanned-out event envelope.
    pub async fn next_event(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    /// Drains events until one with the given wire name arrives.
    pub async fn wait_for_event(&mut self, name: &str) -> Value {
        loop {
            let envelope = self.next_event().await;
            if envelope["event"] == name {
                return envelope;
            }
        }
    }
}

pub fn restaurant(user_id: i64, branch_id: i64) -> Actor {
    Actor {
        user_id,
        role: Role::Restaurant,
        branch_id: Some(branch_id),
    }
}

pub fn kitchen(user_id: i64, branch_id: i64) -> Actor {
    Actor {
        user_id,
        role: Role::Kitchen,
        branch_id: Some(branch_id),
    }
}

pub fn supplier(user_id: i64) -> Actor {
    Actor {
        user_id,
        role: Role::Supplier,
        branch_id: None,
    }
}

pub fn admin(user_id: i64) -> Actor {
    Actor {
        user_id,
        role: Role::Admin,
        branch_id: None,
    }
}

pub fn pimpinan(user_id: i64) -> Actor {
    Actor {
        user_id,
        role: Role::Pimpinan,
        branch_id: None,
    }
}

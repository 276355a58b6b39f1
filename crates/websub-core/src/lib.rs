//! WebSub hub core - subscription store, verification and distribution.
//!
//! This crate holds the protocol engine of the hub: the challenge/response
//! handshake that guards subscription changes, the keyed subscription store,
//! and the fetch-once/fan-out-many distribution of topic updates.
//! Request routing, process bootstrap and logging setup live in
//! `websub-server`.

pub mod config;
pub mod dispatcher;
pub mod distribution;
pub mod error;
pub mod http;
pub mod signature;
pub mod store;
pub mod subscription;
pub mod tasks;
pub mod verification;

pub use config::HubConfig;
pub use dispatcher::{HubDispatcher, HubRequest, HubResponse};
pub use distribution::{DistributionEngine, DistributionReport, DEFAULT_CONTENT_TYPE};
pub use error::{Error, HubError, Result, TransportError};
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient, SharedHttpClient};
pub use store::{
    MemorySubscriptionStore, SharedStore, SledSubscriptionStore, StoreConfig, SubscriptionStore,
};
pub use subscription::{Subscription, SubscriptionKey};
pub use tasks::TaskPool;
pub use verification::{VerificationEngine, VerificationOutcome, VerifyMode};

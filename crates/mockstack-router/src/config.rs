use std::sync::Arc;

use clap::{Parser, ValueEnum};
use mockstack_core::services::{CounterService, EchoService, HelloService};
use mockstack_core::ServiceDescriptor;

use crate::admin::AdminController;
use crate::error::Result;
use crate::router::SessionRouter;
use crate::session::{ResetPolicy, SessionRegistry};

/// Configuration for the mockstack session router.
#[derive(Parser, Debug, Clone)]
#[command(name = "mockstack-router")]
#[command(about = "Session-isolating HTTP router for mock services")]
pub struct Config {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "MOCKSTACK_HOST")]
    pub host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8081", env = "MOCKSTACK_PORT")]
    pub port: u16,

    /// Public base URI that session locations are built from
    /// (defaults to http://localhost:<port>)
    #[arg(long, env = "MOCKSTACK_BASE_URI")]
    pub base_uri: Option<String>,

    /// Path segment the admin API is mounted under
    #[arg(long, default_value = SessionRouter::DEFAULT_ADMIN_PREFIX, env = "MOCKSTACK_ADMIN_PREFIX")]
    pub admin_prefix: String,

    /// Services instantiated into every new session
    #[arg(
        long = "service",
        value_enum,
        value_delimiter = ',',
        default_value = "hello",
        env = "MOCKSTACK_SERVICES"
    )]
    pub services: Vec<BuiltinService>,

    /// Whether a reset keeps session metadata or rebuilds the session
    #[arg(long, value_enum, default_value = "preserve", env = "MOCKSTACK_RESET_POLICY")]
    pub reset_policy: ResetPolicy,

    /// Largest request body accepted, in bytes
    #[arg(long, default_value = "10485760", env = "MOCKSTACK_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,
}

/// Services bundled with the engine that can be enabled from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuiltinService {
    Hello,
    Echo,
    Counter,
}

impl BuiltinService {
    pub fn descriptor(self) -> ServiceDescriptor {
        match self {
            BuiltinService::Hello => ServiceDescriptor::of::<HelloService>(),
            BuiltinService::Echo => ServiceDescriptor::of::<EchoService>(),
            BuiltinService::Counter => ServiceDescriptor::of::<CounterService>(),
        }
    }
}

impl Config {
    pub fn base_uri(&self) -> String {
        self.base_uri
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }

    /// Wire registry, admin API and router together from this configuration.
    pub fn build_router(&self) -> Result<SessionRouter> {
        let registry = Arc::new(SessionRegistry::with_reset_policy(self.reset_policy));
        for service in &self.services {
            registry.register_service(service.descriptor());
        }
        let admin = AdminController::new(Arc::clone(&registry), &self.base_uri());
        SessionRouter::with_admin_prefix(registry, admin, &self.admin_prefix)
    }
}

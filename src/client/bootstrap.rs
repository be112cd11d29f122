//! Client startup and page submission.
//!
//! # Data Flow
//! ```text
//! start
//!     → dependency check (rewriting engine, transport library)
//!     → /config.js → SettingsStore::load → hydrate controls, show settings
//!     → engine.init, transport.connect(worker)
//!     → initial probe (spawned, never blocks startup)
//!
//! Command::Submit
//!     → remove previous frame
//!     → register worker, await readiness
//!     → resolve input, set transport [{wisp: url}]
//!     → create frame, navigate
//! ```
//!
//! # Design Decisions
//! - Browser-only collaborators are traits so the same flow runs headless
//! - Any failure lands in the error panel and forces the settings open

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::client::controls::{Command, Controls};
use crate::client::error::ClientError;
use crate::client::origin::PageOrigin;
use crate::client::probe::{ConnectivityProbe, ConnectivityResult};
use crate::client::schedule::{ProbeRequest, ProbeScheduler, DEFAULT_DEBOUNCE};
use crate::client::search;
use crate::client::settings::{Settings, SettingsStore};
use crate::client::storage::SettingsStorage;

/// Worker script the transport library connects through.
pub const WORKER_PATH: &str = "/baremux/worker.js";

/// Label the test button shows while a probe runs.
pub const TESTING_LABEL: &str = "Testing…";

/// The traffic-rewriting engine.
pub trait RewriteEngine: Send + Sync {
    fn init(&self) -> Result<(), ClientError>;
    fn create_frame(&self) -> Result<Box<dyn ContentFrame>, ClientError>;
}

/// A content frame created by the engine.
pub trait ContentFrame: Send + Sync {
    fn go(&self, url: &str) -> Result<(), ClientError>;
    fn remove(&self);
}

/// The transport library, before it is bound to a worker.
pub trait TransportLibrary: Send + Sync {
    fn connect(&self, worker_path: &str) -> Result<Arc<dyn TransportConnection>, ClientError>;
}

pub trait TransportConnection: Send + Sync {
    fn set_transport(
        &self,
        transport: &str,
        options: Vec<TransportOptions>,
    ) -> BoxFuture<'_, Result<(), ClientError>>;
}

/// Background worker registration. Resolves once the worker is ready.
pub trait WorkerRegistry: Send + Sync {
    fn register(&self) -> BoxFuture<'_, Result<(), ClientError>>;
}

/// Options handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportOptions {
    pub wisp: String,
}

/// External collaborators; the engine and transport may be missing at runtime.
pub struct ExternalDeps {
    pub engine: Option<Arc<dyn RewriteEngine>>,
    pub transport: Option<Arc<dyn TransportLibrary>>,
    pub workers: Arc<dyn WorkerRegistry>,
}

/// What a submission hands to the transport and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRequest {
    pub target: String,
    pub transport: String,
    pub wisp_url: String,
}

impl RoutingRequest {
    pub fn build(settings: &Settings, origin: &PageOrigin, input: &str) -> Self {
        Self {
            target: search::resolve(input, &settings.search_template),
            transport: settings.transport.clone(),
            wisp_url: origin.wisp_url(&settings.wisp_path),
        }
    }
}

pub struct ProxyBootstrap {
    store: SettingsStore,
    probe: ConnectivityProbe,
    controls: Controls,
    engine: Arc<dyn RewriteEngine>,
    connection: Arc<dyn TransportConnection>,
    workers: Arc<dyn WorkerRegistry>,
    frame: Mutex<Option<Box<dyn ContentFrame>>>,
    probes_running: AtomicUsize,
    test_label: Mutex<String>,
}

impl ProxyBootstrap {
    /// Run the startup sequence. The initial probe runs in the background.
    ///
    /// A failure is shown in the error panel, with settings forced open,
    /// before it is returned.
    pub async fn start(
        deps: ExternalDeps,
        controls: Controls,
        storage: Arc<dyn SettingsStorage>,
        probe: ConnectivityProbe,
    ) -> Result<Arc<Self>, ClientError> {
        let (engine, transport) = match (deps.engine, deps.transport) {
            (Some(engine), Some(transport)) => (engine, transport),
            (None, _) => {
                return Err(startup_failed(
                    &controls,
                    ClientError::StartupDependencyMissing("rewriting engine"),
                ))
            }
            (_, None) => {
                return Err(startup_failed(
                    &controls,
                    ClientError::StartupDependencyMissing("transport library"),
                ))
            }
        };

        let runtime = probe.remote().fetch_runtime_config().await;
        let (scheduler, requests) = ProbeScheduler::new(DEFAULT_DEBOUNCE);
        let store = SettingsStore::load(&runtime, storage).with_probe_scheduler(scheduler);

        let settings = store.settings();
        controls.hydrate(&settings);
        controls.hydrate_transports(store.transports(), &settings.transport);
        controls.show_settings();

        let connection = match engine
            .init()
            .and_then(|()| transport.connect(WORKER_PATH))
        {
            Ok(connection) => connection,
            Err(e) => return Err(startup_failed(&controls, e)),
        };

        let bootstrap = Arc::new(Self {
            store,
            probe,
            controls,
            engine,
            connection,
            workers: deps.workers,
            frame: Mutex::new(None),
            probes_running: AtomicUsize::new(0),
            test_label: Mutex::new(String::new()),
        });

        tokio::spawn(listen_for_probes(Arc::downgrade(&bootstrap), requests));

        let initial = Arc::clone(&bootstrap);
        tokio::spawn(async move {
            let path = initial.store.settings().wisp_path;
            initial.run_probe(&path).await;
        });

        tracing::info!(wisp_path = %settings.wisp_path, transport = %settings.transport, "Client started");
        Ok(bootstrap)
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn probe(&self) -> &ConnectivityProbe {
        &self.probe
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Handle one user action.
    pub async fn dispatch(&self, command: Command) -> Result<(), ClientError> {
        tracing::debug!(?command, "Dispatching");
        match command {
            Command::ToggleSettings => {
                self.controls.toggle_settings();
                Ok(())
            }
            Command::TestConnection => {
                self.store.cancel_pending_probe();
                let path = self.store.settings().wisp_path;
                self.run_probe(&path).await;
                Ok(())
            }
            Command::Submit => {
                let input = self.controls.address();
                self.submit(&input).await.map(|_| ())
            }
            change => {
                let Some(key) = change.setting() else {
                    return Ok(());
                };
                let Some(control) = self.controls.setting(key) else {
                    return Ok(());
                };
                let result = self.store.update(key, &control.value());
                self.controls.hydrate(&self.store.settings());
                result.map(|_| ())
            }
        }
    }

    /// Route `input` through the proxy in a fresh content frame.
    pub async fn submit(&self, input: &str) -> Result<RoutingRequest, ClientError> {
        self.remove_frame();

        match self.navigate(input).await {
            Ok(request) => {
                self.controls.clear_error();
                Ok(request)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed");
                self.remove_frame();
                self.controls.show_error(headline(&e), &e.to_string());
                Err(e)
            }
        }
    }

    /// Whether a content frame is currently attached.
    pub fn has_frame(&self) -> bool {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn navigate(&self, input: &str) -> Result<RoutingRequest, ClientError> {
        self.workers.register().await?;

        let settings = self.store.settings();
        if let Some(engine_field) = &self.controls.search_engine {
            engine_field.set_value(&settings.search_template);
        }

        let request = RoutingRequest::build(&settings, self.probe.remote().origin(), input);
        self.connection
            .set_transport(
                &request.transport,
                vec![TransportOptions {
                    wisp: request.wisp_url.clone(),
                }],
            )
            .await?;

        let frame = self.engine.create_frame()?;
        let navigated = frame.go(&request.target);
        *self.frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        navigated?;

        tracing::info!(url = %request.target, wisp_url = %request.wisp_url, "Frame navigated");
        Ok(request)
    }

    fn remove_frame(&self) {
        let previous = self.frame.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(frame) = previous {
            frame.remove();
        }
    }

    /// Probe with the test button disabled; superseded probes render nothing.
    pub async fn run_probe(&self, local_path: &str) -> Option<ConnectivityResult> {
        self.begin_testing();
        self.controls.render_status(&ConnectivityResult::checking());

        let result = self.probe.probe(local_path).await;
        if let Some(result) = &result {
            self.controls.render_status(result);
        }

        self.end_testing();
        result
    }

    fn begin_testing(&self) {
        let Some(button) = &self.controls.connection_test else {
            return;
        };
        if self.probes_running.fetch_add(1, Ordering::SeqCst) == 0 {
            *self.test_label.lock().unwrap_or_else(PoisonError::into_inner) = button.value();
        }
        button.set_enabled(false);
        button.set_value(TESTING_LABEL);
    }

    fn end_testing(&self) {
        let Some(button) = &self.controls.connection_test else {
            return;
        };
        if self.probes_running.fetch_sub(1, Ordering::SeqCst) == 1 {
            let label = self.test_label.lock().unwrap_or_else(PoisonError::into_inner).clone();
            button.set_value(&label);
            button.set_enabled(true);
        }
    }
}

async fn listen_for_probes(
    bootstrap: Weak<ProxyBootstrap>,
    mut requests: mpsc::UnboundedReceiver<ProbeRequest>,
) {
    while let Some(request) = requests.recv().await {
        let Some(bootstrap) = bootstrap.upgrade() else {
            break;
        };
        tokio::spawn(async move {
            bootstrap.run_probe(&request.settings.wisp_path).await;
        });
    }
}

fn startup_failed(controls: &Controls, error: ClientError) -> ClientError {
    tracing::error!(error = %error, "Client failed to start");
    controls.show_error(headline(&error), &error.to_string());
    error
}

fn headline(error: &ClientError) -> &'static str {
    match error {
        ClientError::StartupDependencyMissing(_) | ClientError::Engine(_) => {
            "Failed to start the proxy."
        }
        ClientError::WorkerRegistrationFailed(_) => "Failed to register service worker.",
        ClientError::Transport(_) => "Failed to configure the transport.",
        _ => "Failed to open the page.",
    }
}

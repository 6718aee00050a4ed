use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info};

use super::error::FormError;
use crate::api::AdminApi;
use crate::config::{AdminConfig, ApiRoutes, FrontRoutes};
use crate::form::EditBuffer;
use crate::normalizer::normalize;
use crate::notify::{Navigator, Notifier, Severity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitState {
    /// Submission enabled.
    Ready,
    Submitting,
    /// Saved; the view has been (or is about to be) navigated away.
    Succeeded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update,
}

impl SubmitMode {
    pub fn from_is_update(is_update: bool) -> Self {
        if is_update {
            SubmitMode::Update
        } else {
            SubmitMode::Create
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    Submitted { response: Value, navigated_to: String },
    /// Another submission was in flight; nothing was sent.
    Ignored,
}

/// Drives one form's save button: normalize, send, then navigate to the list view.
///
/// The submit-disable flag is the controller's `SubmitState`. It is reset on every
/// exit path except success, where the view is about to be discarded.
pub struct SubmissionController {
    api: Arc<dyn AdminApi>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    api_routes: ApiRoutes,
    front_routes: FrontRoutes,
    navigation_delay: Duration,
    state: Mutex<SubmitState>,
}

impl SubmissionController {
    pub fn new(
        conf: &AdminConfig,
        api: Arc<dyn AdminApi>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        SubmissionController {
            api,
            notifier,
            navigator,
            api_routes: conf.api_routes.clone(),
            front_routes: conf.front_routes.clone(),
            navigation_delay: conf.navigation_delay,
            state: Mutex::new(SubmitState::Ready),
        }
    }

    pub fn state(&self) -> SubmitState {
        *self.state.lock()
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.state() != SubmitState::Ready
    }

    #[tracing::instrument(level = "info", name = "form_submit", skip(self, buffer), fields(kind = %buffer.kind()))]
    pub async fn submit<B: EditBuffer + Sync>(
        &self,
        buffer: &B,
        mode: SubmitMode,
    ) -> Result<SubmitOutcome, FormError> {
        let guard = match self.begin() {
            Some(guard) => guard,
            None => {
                info!("Submission already in progress, ignoring");
                return Ok(SubmitOutcome::Ignored);
            }
        };

        match self.send(buffer, mode).await {
            Ok(response) => {
                let target = B::list_view(&self.front_routes).to_string();
                info!(target, "Saved, leaving form");
                tokio::time::sleep(self.navigation_delay).await;
                self.navigator.navigate_to(&target);
                guard.finish(SubmitState::Succeeded);

                Ok(SubmitOutcome::Submitted {
                    response,
                    navigated_to: target,
                })
            }
            Err(e) => {
                drop(guard);
                error!(?e, "Submission failed");
                if e.is_validation() {
                    self.notifier.notify(
                        &format!("Invalid {} data", buffer.kind()),
                        Severity::Danger,
                        "Error",
                    );
                }
                Err(e)
            }
        }
    }

    fn begin(&self) -> Option<SubmitGuard<'_>> {
        let mut state = self.state.lock();
        if *state != SubmitState::Ready {
            return None;
        }
        *state = SubmitState::Submitting;
        Some(SubmitGuard {
            state: &self.state,
            armed: true,
        })
    }

    async fn send<B: EditBuffer + Sync>(&self, buffer: &B, mode: SubmitMode) -> Result<Value, FormError> {
        let mut payload = normalize(buffer)?;

        let response = match mode {
            SubmitMode::Create => {
                // The service assigns ids to new records.
                payload.0.remove("id");
                self.api
                    .create(B::collection_route(&self.api_routes), &payload.into_value())
                    .await?
            }
            SubmitMode::Update => {
                let id = buffer.id().ok_or_else(|| {
                    FormError::Validation(format!("cannot update a {} without an id", buffer.kind()))
                })?;
                self.api
                    .update(B::item_route(&self.api_routes), &id, &payload.into_value())
                    .await?
            }
        };

        Ok(response)
    }
}

/// Holds the controller in `Submitting`. Unless finished, dropping it (an error, or
/// the submit future being cancelled) puts the controller back to `Ready`.
struct SubmitGuard<'a> {
    state: &'a Mutex<SubmitState>,
    armed: bool,
}

impl SubmitGuard<'_> {
    fn finish(mut self, state: SubmitState) {
        *self.state.lock() = state;
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.state.lock() = SubmitState::Ready;
        }
    }
}

use crate::dto::addin_dto::LifecycleResponse;
use crate::dto::fleet_dto::ApiResponse;
use crate::models::LifecycleEvent;
use crate::services::RefreshOutcome;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct LifecycleController {
    state: AppState,
}

impl LifecycleController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn handle(&self, event: LifecycleEvent) -> Result<ApiResponse<LifecycleResponse>, AppError> {
        let (state, outcome) = self.state.handle_lifecycle(event).await?;

        let response = LifecycleResponse {
            state,
            reloaded: matches!(outcome, Some(RefreshOutcome::Completed(_))),
            refresh_in_progress: matches!(outcome, Some(RefreshOutcome::AlreadyRunning)),
            summary: match outcome {
                Some(RefreshOutcome::Completed(summary)) => Some(summary),
                _ => None,
            },
        };
        Ok(ApiResponse::success(response))
    }

    pub async fn current(&self) -> LifecycleResponse {
        let snapshot = self.state.fleet.snapshot().await;
        LifecycleResponse {
            state: self.state.lifecycle_state().await,
            reloaded: false,
            refresh_in_progress: self.state.fleet.is_refreshing(),
            summary: snapshot.is_loaded().then(|| snapshot.summary()),
        }
    }
}

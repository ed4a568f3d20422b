use std::sync::Arc;

use crate::{
    error::WeatherError,
    location::LocationSource,
    model::WeatherSnapshot,
    orchestrator::WeatherOrchestrator,
    presenter::Presenter,
};

/// Commands a front-end can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Search(String),
    ToggleUnit,
    UseCurrentLocation,
    ListFavorites,
}

/// Dispatches [`UiCommand`]s to the orchestrator and reports every outcome to
/// a [`Presenter`]. A command that shows the loading state always ends with a
/// snapshot or an error on screen.
#[derive(Debug)]
pub struct WeatherController<P> {
    orchestrator: Arc<WeatherOrchestrator>,
    location: Arc<dyn LocationSource>,
    presenter: P,
}

impl<P: Presenter> WeatherController<P> {
    pub fn new(
        orchestrator: Arc<WeatherOrchestrator>,
        location: Arc<dyn LocationSource>,
        presenter: P,
    ) -> Self {
        Self {
            orchestrator,
            location,
            presenter,
        }
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn orchestrator(&self) -> &WeatherOrchestrator {
        &self.orchestrator
    }

    /// Run the startup policy and render its outcome.
    pub async fn start(&mut self) {
        self.presenter.show_unit(self.orchestrator.active_unit());
        self.presenter.show_loading();
        let result = self.orchestrator.startup(self.location.as_ref()).await;
        self.report(result);
    }

    pub async fn handle(&mut self, command: UiCommand) {
        match command {
            UiCommand::Search(text) => {
                if text.trim().is_empty() {
                    self.report_error(&WeatherError::EmptyInput);
                    return;
                }
                self.presenter.show_loading();
                let result = self.orchestrator.load_by_name(&text).await;
                self.report(result);
            }
            UiCommand::ToggleUnit => {
                let result = self.orchestrator.toggle_unit().await;
                self.presenter.show_unit(self.orchestrator.active_unit());
                match result {
                    Ok(Some(snapshot)) => self.presenter.show_snapshot(&snapshot),
                    Ok(None) => {}
                    Err(e) => self.report_error(&e),
                }
            }
            UiCommand::UseCurrentLocation => {
                self.presenter.show_loading();
                let result = self
                    .orchestrator
                    .load_current_location(self.location.as_ref())
                    .await;
                self.report(result);
            }
            UiCommand::ListFavorites => {
                self.presenter.show_favorites(self.orchestrator.favorites());
            }
        }
    }

    fn report(&mut self, result: Result<WeatherSnapshot, WeatherError>) {
        match result {
            Ok(snapshot) => self.presenter.show_snapshot(&snapshot),
            Err(e) => self.report_error(&e),
        }
    }

    fn report_error(&mut self, error: &WeatherError) {
        if error.is_silent() {
            // The newer run renders its own result; just restore what is current.
            if let Some(current) = self.orchestrator.current_snapshot() {
                self.presenter.show_snapshot(&current);
            }
            return;
        }
        tracing::error!("Weather request failed: {}", error);
        self.presenter.show_error(&error.user_message());
    }
}

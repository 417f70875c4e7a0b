mod config;
mod log_util;
mod question_source;
mod quiz;
mod ui_renderer;
mod view_managers;

use color_eyre::Result;
use config::{AppConfig, ConfigForm};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dotenvy::dotenv;
use log_util::log_debug;
use question_source::{Dataset, QuestionSource};
use quiz::{PhaseKind, QuizError, QuizMachine};
use ratatui::{DefaultTerminal, Frame};
use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
    time::Duration,
};
use tokio::runtime::Runtime;
use ui_renderer::UiRenderer;
use view_managers::{ConfigManager, QuizManager, ResultsManager, SettingsForm, SettingsManager};

pub(crate) const LOADING_FRAMES: [&str; 4] = ["-", "\\", "|", "/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppView {
    Quiz,
    Config,
}

#[derive(Debug)]
enum LoadMessage {
    Loaded(Dataset),
    Failed(String),
}

fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = App::new().run(terminal);
    ratatui::restore();
    result
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub(crate) running: bool,
    /// Current view being displayed.
    pub(crate) view: AppView,
    /// Quiz lifecycle and session state.
    pub(crate) machine: QuizMachine,
    /// Values typed into the settings screen.
    pub(crate) settings_form: SettingsForm,
    /// Highlighted answer option on the question screen.
    pub(crate) selected_option: usize,
    /// Where question datasets are read from.
    pub(crate) source: QuestionSource,
    /// Any error encountered outside of the quiz itself.
    pub(crate) error: Option<String>,
    /// Spinner frame index for the loading indicator.
    pub(crate) loading_frame: usize,
    /// Receives the background dataset load result.
    load_receiver: Option<Receiver<LoadMessage>>,
    /// Holds the editable configuration state when rendering the config view.
    pub(crate) config_form: ConfigForm,
}

impl App {
    /// Construct a new instance of [`App`] from the configuration on disk.
    pub fn new() -> Self {
        let mut aggregated_error: Option<String> = None;
        if let Err(err) = config::initialize() {
            Self::push_error(
                &mut aggregated_error,
                format!("Configuration load failed: {}", err),
            );
        }
        let mut app = Self::from_config(config::current(), QuizMachine::new);
        app.error = aggregated_error;
        log_debug(&format!(
            "App: started with data source {}",
            app.source.location()
        ));
        app
    }

    pub(crate) fn from_config<F>(config: AppConfig, build_machine: F) -> Self
    where
        F: FnOnce(quiz::QuizSettings, quiz::FormatterOptions) -> QuizMachine,
    {
        let machine = build_machine(config.quiz_settings(), config.formatter_options());
        Self {
            running: false,
            view: AppView::Quiz,
            settings_form: SettingsForm::from_settings(machine.settings()),
            machine,
            selected_option: 0,
            source: QuestionSource::from_env(&config.data_source),
            error: None,
            loading_frame: 0,
            load_receiver: None,
            config_form: ConfigForm::from_config(config),
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        let tick_rate = Duration::from_millis(120);
        while self.running {
            self.poll_load_messages();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(tick_rate)?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        UiRenderer::new(self).render(frame);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self, tick_rate: Duration) -> Result<()> {
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(_) => {}
                Event::Resize(_, _) => {}
                _ => {}
            }
            self.poll_load_messages();
        } else {
            self.on_tick();
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.is_loading() {
            self.loading_frame = (self.loading_frame + 1) % LOADING_FRAMES.len();
        }
        self.poll_load_messages();
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.machine.phase().kind() == PhaseKind::Loading
    }

    /// Handles the key events and updates the state of [`App`].
    pub(crate) fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            _ => match self.view {
                AppView::Quiz => match self.machine.phase().kind() {
                    PhaseKind::Settings => SettingsManager::new(self).handle_key(key),
                    PhaseKind::Loading | PhaseKind::Running => QuizManager::new(self).handle_key(key),
                    PhaseKind::Finished => ResultsManager::new(self).handle_key(key),
                },
                AppView::Config => ConfigManager::new(self).handle_key(key),
            },
        }
    }

    /// Ask the machine to start and load the dataset on a background thread.
    pub(crate) fn start_quiz(&mut self) {
        let request = match self.machine.start() {
            Ok(request) => request,
            Err(err) => {
                log_debug(&format!("App: quiz start refused: {}", err));
                return;
            }
        };

        let source = self.source.clone();
        let (sender, receiver) = mpsc::channel();
        self.load_receiver = Some(receiver);
        self.loading_frame = 0;
        self.selected_option = 0;
        log_debug("App: starting background dataset load");

        thread::spawn(move || {
            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = sender.send(LoadMessage::Failed(format!(
                        "Failed to build Tokio runtime: {}",
                        err
                    )));
                    return;
                }
            };

            let result = runtime.block_on(source.fetch_dataset(request.category));
            drop(runtime);

            let message = match result {
                Ok(dataset) => LoadMessage::Loaded(dataset),
                Err(err) => LoadMessage::Failed(format!("{:#}", err)),
            };
            let _ = sender.send(message);
        });
    }

    pub(crate) fn poll_load_messages(&mut self) {
        let Some(receiver) = self.load_receiver.as_ref() else {
            return;
        };
        let message = match receiver.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                LoadMessage::Failed("Background loader disconnected".to_string())
            }
        };
        self.load_receiver = None;

        let result = match message {
            LoadMessage::Loaded(dataset) => Ok(dataset),
            LoadMessage::Failed(message) => {
                log_debug(&format!("App: dataset load failed: {}", message));
                Err(QuizError::SourceFetch(message))
            }
        };
        self.selected_option = 0;
        if let Err(err) = self.machine.complete_loading(result) {
            log_debug(&format!("App: quiz could not start: {}", err));
        }
    }

    /// Leave the quiz and go back to the settings form, dropping any pending load.
    pub(crate) fn exit_quiz(&mut self) {
        self.load_receiver = None;
        self.selected_option = 0;
        self.machine.exit();
        self.settings_form = SettingsForm::from_settings(self.machine.settings());
        self.view = AppView::Quiz;
    }

    pub(crate) fn return_to_quiz(&mut self) {
        if matches!(self.view, AppView::Config) {
            self.config_form = ConfigForm::from_config(config::current());
        }
        self.view = AppView::Quiz;
    }

    /// Pick up saved configuration: data source, transliteration chance and form defaults.
    pub(crate) fn apply_config(&mut self, config: &AppConfig) {
        self.source = QuestionSource::from_env(&config.data_source);
        self.machine
            .set_formatter_options(config.formatter_options());
        if self.machine.phase().kind() == PhaseKind::Settings {
            self.settings_form = SettingsForm::from_settings(config.quiz_settings());
        }
    }

    /// Set running to false to quit the application.
    pub(crate) fn quit(&mut self) {
        self.running = false;
    }

    /// Append a message to an optional error slot.
    pub(crate) fn push_error(slot: &mut Option<String>, message: String) {
        if let Some(existing) = slot {
            existing.push_str(" | ");
            existing.push_str(&message);
        } else {
            *slot = Some(message);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn ctrl_c_quits_from_any_view() {
        let mut app = fixture_app(1);
        app.running = true;
        app.on_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn enter_on_settings_loads_fixture_quiz() {
        let mut app = fixture_app(2);
        app.on_key_event(key(KeyCode::Enter));
        assert!(app.is_loading());
        wait_for_load(&mut app);

        let snapshot = app.machine.snapshot();
        assert_eq!(snapshot.phase, PhaseKind::Running);
        assert_eq!(snapshot.requested_count, 3);
        assert!(snapshot.question.is_some());
    }

    #[test]
    fn missing_dataset_surfaces_fetch_error_in_settings() {
        let mut app = fixture_app(3);
        let mut missing = std::env::temp_dir();
        missing.push(format!(
            "unitquiz-no-data-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        app.source = QuestionSource::new(question_source::SourceLocation::Directory(missing));

        app.start_quiz();
        wait_for_load(&mut app);

        let snapshot = app.machine.snapshot();
        assert_eq!(snapshot.phase, PhaseKind::Settings);
        assert!(matches!(snapshot.error, Some(QuizError::SourceFetch(_))));
    }

    #[test]
    fn exit_while_loading_discards_the_result() {
        let mut app = fixture_app(4);
        app.start_quiz();
        app.exit_quiz();
        app.poll_load_messages();
        assert_eq!(app.machine.phase().kind(), PhaseKind::Settings);
        thread::sleep(Duration::from_millis(50));
        app.poll_load_messages();
        assert_eq!(app.machine.phase().kind(), PhaseKind::Settings);
    }
}

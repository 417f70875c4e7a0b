pub mod config_manager;
pub mod quiz_manager;
pub mod results_manager;
pub mod settings_manager;

pub(crate) use config_manager::ConfigManager;
pub(crate) use quiz_manager::QuizManager;
pub(crate) use results_manager::ResultsManager;
pub(crate) use settings_manager::{SettingsForm, SettingsManager};

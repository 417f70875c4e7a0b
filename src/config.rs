use crate::{
    question_source::Category,
    quiz::{FormatterOptions, QuizSettings, UnitRange},
};
use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{OnceLock, RwLock},
};

/// Globally accessible application configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_unit_range_value")]
    pub default_unit_range: String,
    #[serde(default = "default_question_count_value")]
    pub default_question_count: usize,
    #[serde(default = "default_category_value")]
    pub default_category: Category,
    #[serde(default = "default_transliteration_chance_value")]
    pub transliteration_chance_percent: u8,
    #[serde(default = "default_data_source_value")]
    pub data_source: String,
}

impl AppConfig {
    fn normalize(&mut self) {
        if self.default_unit_range.parse::<UnitRange>().is_err() {
            self.default_unit_range = default_unit_range_value();
        }
        if self.default_question_count == 0 {
            self.default_question_count = DEFAULT_QUESTION_COUNT;
        }
        if self.transliteration_chance_percent > 100 {
            self.transliteration_chance_percent = 100;
        }
        if self.data_source.trim().is_empty() {
            self.data_source = default_data_source_value();
        }
    }

    /// Settings the quiz form starts from.
    pub fn quiz_settings(&self) -> QuizSettings {
        let unit_range = self.default_unit_range.parse().unwrap_or_default();
        QuizSettings {
            category: self.default_category,
            unit_range,
            requested_count: self.default_question_count.max(1),
        }
    }

    pub fn formatter_options(&self) -> FormatterOptions {
        FormatterOptions::from_percent(self.transliteration_chance_percent)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_unit_range: default_unit_range_value(),
            default_question_count: DEFAULT_QUESTION_COUNT,
            default_category: default_category_value(),
            transliteration_chance_percent: DEFAULT_TRANSLITERATION_CHANCE,
            data_source: default_data_source_value(),
        }
    }
}

const DEFAULT_UNIT_RANGE: &str = "1-10";
const DEFAULT_QUESTION_COUNT: usize = 10;
const DEFAULT_TRANSLITERATION_CHANCE: u8 = 20;
const DEFAULT_DATA_SOURCE: &str = "data";
const CONFIG_FILE_PATH: &str = "config/quiz_config.toml";

fn default_unit_range_value() -> String {
    DEFAULT_UNIT_RANGE.to_string()
}
const fn default_question_count_value() -> usize {
    DEFAULT_QUESTION_COUNT
}
const fn default_category_value() -> Category {
    Category::Vocab
}
const fn default_transliteration_chance_value() -> u8 {
    DEFAULT_TRANSLITERATION_CHANCE
}
fn default_data_source_value() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

static APP_CONFIG: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn config_lock() -> &'static RwLock<AppConfig> {
    APP_CONFIG.get_or_init(|| RwLock::new(AppConfig::default()))
}

/// Attempt to load configuration from disk. If loading fails, the in-memory config will be reset to defaults
/// and the error will be returned for the caller to surface if desired.
pub fn initialize() -> Result<()> {
    let lock = config_lock();
    match load_config_from_path(&config_file_path()) {
        Ok(config) => {
            *lock.write().expect("config lock poisoned") = config;
            Ok(())
        }
        Err(err) => {
            *lock.write().expect("config lock poisoned") = AppConfig::default();
            Err(err)
        }
    }
}

/// Retrieve a clone of the current configuration.
pub fn current() -> AppConfig {
    config_lock().read().expect("config lock poisoned").clone()
}

/// Apply the provided mutation to the in-memory configuration and persist the result to disk.
pub fn update<F>(mutator: F) -> Result<AppConfig>
where
    F: FnOnce(&mut AppConfig),
{
    let lock = config_lock();
    let mut config = lock.write().expect("config lock poisoned");
    mutator(&mut config);
    config.normalize();
    save_config_to_path(&config, &config_file_path())?;
    Ok(config.clone())
}

/// Path to the configuration file used for persistence, relative to the working directory.
pub fn config_file_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_PATH)
}

fn load_config_from_path(path: &Path) -> Result<AppConfig> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let mut config: AppConfig = toml::from_str(&contents)
                .wrap_err_with(|| format!("failed to parse configuration at {}", path.display()))?;
            config.normalize();
            Ok(config)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(eyre!(
            "failed to read configuration at {}: {}",
            path.display(),
            err
        )),
    }
}

fn save_config_to_path(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err_with(|| {
            format!(
                "failed to create configuration directory {}",
                parent.display()
            )
        })?;
    }
    let serialized =
        toml::to_string_pretty(config).wrap_err("failed to serialize configuration to TOML")?;
    fs::write(path, serialized)
        .wrap_err_with(|| format!("failed to write configuration to {}", path.display()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigField {
    UnitRange,
    QuestionCount,
    Category,
    TransliterationChance,
    DataSource,
}

/// Editable copy of the configuration shown on the config screen.
#[derive(Debug, Clone)]
pub struct ConfigForm {
    pub(crate) unit_range: String,
    pub(crate) question_count: usize,
    pub(crate) category: Category,
    pub(crate) transliteration_percent: u8,
    pub(crate) data_source: String,
    editing: Option<ConfigField>,
    text_buffer: String,
    field: ConfigField,
    pub(crate) dirty: bool,
    pub(crate) status: Option<String>,
}

impl ConfigForm {
    pub(crate) fn from_config(config: AppConfig) -> Self {
        Self {
            unit_range: config.default_unit_range,
            question_count: config.default_question_count,
            category: config.default_category,
            transliteration_percent: config.transliteration_chance_percent,
            data_source: config.data_source,
            editing: None,
            text_buffer: String::new(),
            field: ConfigField::UnitRange,
            dirty: false,
            status: None,
        }
    }

    pub(crate) fn selected_index(&self) -> usize {
        self.field.index()
    }

    pub(crate) fn select_next(&mut self) {
        self.field = self.field.next();
    }

    pub(crate) fn select_previous(&mut self) {
        self.field = self.field.previous();
    }

    pub(crate) fn adjust_current(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }

        match self.field {
            ConfigField::Category => {
                self.category = self.category.toggle();
                self.mark_dirty();
            }
            ConfigField::QuestionCount => {
                let updated = (self.question_count as isize + delta).max(1) as usize;
                if updated != self.question_count {
                    self.question_count = updated;
                    self.mark_dirty();
                }
            }
            ConfigField::TransliterationChance => {
                let updated = (self.transliteration_percent as isize + delta * 5).clamp(0, 100) as u8;
                if updated != self.transliteration_percent {
                    self.transliteration_percent = updated;
                    self.mark_dirty();
                }
            }
            ConfigField::UnitRange | ConfigField::DataSource => {}
        }
    }

    /// Apply the form to `config`; fails when the unit range text is not a valid selection.
    pub(crate) fn apply_to(&self, config: &mut AppConfig) -> Result<()> {
        let range: UnitRange = self
            .unit_range
            .parse()
            .map_err(|_| eyre!("invalid default unit range '{}'", self.unit_range))?;
        config.default_unit_range = range.to_string();
        config.default_question_count = self.question_count;
        config.default_category = self.category;
        config.transliteration_chance_percent = self.transliteration_percent;
        config.data_source = self.data_source.trim().to_string();
        Ok(())
    }

    pub(crate) fn apply_saved(&mut self, config: AppConfig) {
        *self = Self {
            field: self.field,
            ..Self::from_config(config)
        };
    }

    pub(crate) fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = Some(status.into());
    }

    pub(crate) fn is_text_field_selected(&self) -> bool {
        self.field.is_text()
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub(crate) fn start_editing(&mut self) {
        if !self.field.is_text() {
            return;
        }
        self.editing = Some(self.field);
        self.text_buffer = self.text_value(self.field).to_string();
        self.status = Some(format!(
            "Editing {} (Enter to apply, Esc to cancel)",
            self.field.label()
        ));
    }

    pub(crate) fn cancel_edit(&mut self) {
        if let Some(field) = self.editing.take() {
            self.status = Some(format!("Cancelled {} edit.", field.label()));
        }
        self.text_buffer.clear();
    }

    pub(crate) fn apply_edit(&mut self) {
        let Some(field) = self.editing.take() else {
            return;
        };
        let new_value = self.text_buffer.trim().to_string();
        self.text_buffer.clear();
        if new_value == self.text_value(field) {
            self.status = Some(format!("{} unchanged.", field.label()));
            return;
        }
        match field {
            ConfigField::UnitRange => self.unit_range = new_value,
            ConfigField::DataSource => self.data_source = new_value,
            _ => return,
        }
        self.dirty = true;
        self.status = Some(format!("Updated {}.", field.label()));
    }

    pub(crate) fn backspace(&mut self) {
        self.text_buffer.pop();
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        self.text_buffer.push(ch);
    }

    /// Text to render for `index`, showing the edit buffer for the field being edited.
    pub(crate) fn display_text(&self, index: usize) -> Option<String> {
        let field = ConfigField::from_index(index)?;
        if self.editing == Some(field) {
            return Some(format!("{}_", self.text_buffer));
        }
        match field {
            ConfigField::UnitRange | ConfigField::DataSource => {
                Some(self.text_value(field).to_string())
            }
            ConfigField::QuestionCount => Some(self.question_count.to_string()),
            ConfigField::Category => Some(self.category.label().to_string()),
            ConfigField::TransliterationChance => Some(format!("{}%", self.transliteration_percent)),
        }
    }

    pub(crate) fn field_labels() -> [&'static str; 5] {
        ConfigField::ALL.map(ConfigField::label)
    }

    fn text_value(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::UnitRange => &self.unit_range,
            ConfigField::DataSource => &self.data_source,
            _ => "",
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.status = None;
    }
}

impl ConfigField {
    const ALL: [Self; 5] = [
        Self::UnitRange,
        Self::QuestionCount,
        Self::Category,
        Self::TransliterationChance,
        Self::DataSource,
    ];

    fn index(self) -> usize {
        match self {
            Self::UnitRange => 0,
            Self::QuestionCount => 1,
            Self::Category => 2,
            Self::TransliterationChance => 3,
            Self::DataSource => 4,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn is_text(self) -> bool {
        matches!(self, Self::UnitRange | Self::DataSource)
    }

    fn label(self) -> &'static str {
        match self {
            Self::UnitRange => "Default units",
            Self::QuestionCount => "Default number of questions",
            Self::Category => "Default category",
            Self::TransliterationChance => "Transliteration chance (units 1-10)",
            Self::DataSource => "Question data source",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn temp_config_path(label: &str) -> (PathBuf, PathBuf) {
        let unique = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut dir = std::env::temp_dir();
        dir.push(format!("unitquiz-config-{label}-{unique}"));
        let path = dir.join("config/quiz_config.toml");
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (dir, path) = temp_config_path("missing");
        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!dir.exists());
    }

    #[test]
    fn saved_config_loads_back() {
        let (dir, path) = temp_config_path("roundtrip");
        let config = AppConfig {
            default_unit_range: "3-5".to_string(),
            default_question_count: 7,
            default_category: Category::Grammar,
            transliteration_chance_percent: 35,
            data_source: "https://example.org/quiz".to_string(),
        };
        save_config_to_path(&config, &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("default_category = \"grammar\""));
        assert_eq!(load_config_from_path(&path).unwrap(), config);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn partial_and_out_of_range_values_are_normalized() {
        let (dir, path) = temp_config_path("normalize");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "default_unit_range = \"40-50\"\ndefault_question_count = 0\ntransliteration_chance_percent = 250\n",
        )
        .unwrap();
        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.default_unit_range, "1-10");
        assert_eq!(config.default_question_count, 10);
        assert_eq!(config.transliteration_chance_percent, 100);
        assert_eq!(config.data_source, "data");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let (dir, path) = temp_config_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "default_question_count = \"many\"").unwrap();
        assert!(load_config_from_path(&path).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn quiz_settings_follow_config_defaults() {
        let config = AppConfig {
            default_unit_range: "4".to_string(),
            default_question_count: 12,
            ..AppConfig::default()
        };
        let settings = config.quiz_settings();
        assert_eq!(settings.unit_range, UnitRange::single(4).unwrap());
        assert_eq!(settings.requested_count, 12);
        assert_eq!(settings.category, Category::Vocab);
        assert_eq!(config.formatter_options().transliteration_chance, 0.2);
    }

    #[test]
    fn form_adjusts_numbers_within_bounds_and_toggles_category() {
        let mut form = ConfigForm::from_config(AppConfig::default());
        form.select_next();
        form.adjust_current(-20);
        assert_eq!(form.question_count, 1, "count never drops below one");
        form.select_next();
        form.adjust_current(1);
        assert_eq!(form.category, Category::Grammar);
        form.select_next();
        form.adjust_current(30);
        assert_eq!(form.transliteration_percent, 100);
        assert!(form.dirty);
    }

    #[test]
    fn text_edits_apply_and_cancel() {
        let mut form = ConfigForm::from_config(AppConfig::default());
        assert!(form.is_text_field_selected());
        form.start_editing();
        form.backspace();
        form.backspace();
        form.push_char('5');
        assert_eq!(form.display_text(0).as_deref(), Some("1-5_"));
        form.apply_edit();
        assert_eq!(form.unit_range, "1-5");
        assert!(form.dirty);

        form.select_previous();
        form.start_editing();
        assert!(form.is_editing());
        form.push_char('x');
        form.cancel_edit();
        assert_eq!(form.data_source, "data");
        assert!(!form.is_editing());
    }

    #[test]
    fn invalid_range_in_form_is_not_applied() {
        let mut form = ConfigForm::from_config(AppConfig::default());
        form.unit_range = "0-99".to_string();
        let mut config = AppConfig::default();
        assert!(form.apply_to(&mut config).is_err());
        assert_eq!(config, AppConfig::default());
    }
}

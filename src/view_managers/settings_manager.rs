use super::config_manager::ConfigManager;
use crate::{
    App,
    log_util::log_debug,
    question_source::Category,
    quiz::QuizSettings,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) const SETTINGS_FIELDS: [&str; 4] = ["Units", "Number of questions", "Category", "Start quiz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingsField {
    Units,
    QuestionCount,
    Category,
    Start,
}

impl SettingsField {
    const ALL: [Self; 4] = [Self::Units, Self::QuestionCount, Self::Category, Self::Start];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Units => 0,
            Self::QuestionCount => 1,
            Self::Category => 2,
            Self::Start => 3,
        }
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// What the user has typed on the settings screen. Validation happens in `QuizMachine::configure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SettingsForm {
    pub(crate) unit_input: String,
    pub(crate) question_count: usize,
    pub(crate) category: Category,
    pub(crate) field: SettingsField,
}

impl SettingsForm {
    pub(crate) fn from_settings(settings: QuizSettings) -> Self {
        Self {
            unit_input: settings.unit_range.to_string(),
            question_count: settings.requested_count,
            category: settings.category,
            field: SettingsField::Units,
        }
    }

    pub(crate) fn display_text(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Units if self.field == SettingsField::Units => {
                format!("{}_", self.unit_input)
            }
            SettingsField::Units => self.unit_input.clone(),
            SettingsField::QuestionCount => self.question_count.to_string(),
            SettingsField::Category => self.category.label().to_string(),
            SettingsField::Start => String::new(),
        }
    }

    fn adjust_current(&mut self, delta: isize) {
        match self.field {
            SettingsField::QuestionCount => {
                self.question_count = (self.question_count as isize + delta).max(0) as usize;
            }
            SettingsField::Category => self.category = self.category.toggle(),
            SettingsField::Units | SettingsField::Start => {}
        }
    }
}

pub(crate) struct SettingsManager<'a> {
    app: &'a mut App,
}

impl<'a> SettingsManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        let field = self.app.settings_form.field;
        let form = &mut self.app.settings_form;
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Tab) => form.field = field.next(),
            (KeyModifiers::NONE, KeyCode::Up) | (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                form.field = field.previous()
            }
            (KeyModifiers::NONE, KeyCode::Left) => form.adjust_current(-1),
            (KeyModifiers::NONE, KeyCode::Right) => form.adjust_current(1),
            (KeyModifiers::NONE, KeyCode::Backspace) if field == SettingsField::Units => {
                form.unit_input.pop();
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(ch))
                if field == SettingsField::Units && (ch.is_ascii_digit() || ch == '-' || ch == ' ') =>
            {
                form.unit_input.push(ch);
            }
            (KeyModifiers::NONE, KeyCode::Char(ch))
                if field == SettingsField::QuestionCount && ch.is_ascii_digit() =>
            {
                let digit = ch.to_digit(10).unwrap_or(0) as usize;
                form.question_count = form.question_count.saturating_mul(10).saturating_add(digit);
            }
            (KeyModifiers::NONE, KeyCode::Backspace) if field == SettingsField::QuestionCount => {
                form.question_count /= 10;
            }
            (KeyModifiers::NONE, KeyCode::Char(' ')) if field == SettingsField::Category => {
                form.category = form.category.toggle();
            }
            _ => self.handle_command_key(key),
        }
    }

    /// Letter shortcuts are ignored while the units text field has focus.
    fn handle_command_key(&mut self, key: KeyEvent) {
        let in_text_entry = self.app.settings_form.field == SettingsField::Units;
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => self.app.quit(),
            (KeyModifiers::NONE, KeyCode::Enter) => self.submit(),
            (KeyModifiers::NONE, KeyCode::Char('c') | KeyCode::Char('C')) if !in_text_entry => {
                ConfigManager::new(self.app).show_config()
            }
            (KeyModifiers::NONE, KeyCode::Char('q')) if !in_text_entry => self.app.quit(),
            _ => {}
        }
    }

    /// Hand the form to the machine and, when it validates, start loading.
    fn submit(&mut self) {
        let form = self.app.settings_form.clone();
        match self
            .app
            .machine
            .configure(&form.unit_input, form.question_count, form.category)
        {
            Ok(()) => self.app.start_quiz(),
            Err(err) => log_debug(&format!("App: settings rejected: {}", err)),
        }
    }
}

use crate::{
    App, AppView,
    config::{self, ConfigForm},
    log_util::log_debug,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct ConfigManager<'a> {
    app: &'a mut App,
}

impl<'a> ConfigManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn show_config(&mut self) {
        self.app.config_form = ConfigForm::from_config(config::current());
        self.app
            .config_form
            .set_status("Use ←/→ to adjust values, Enter to edit text, s to save changes.");
        self.app.view = AppView::Config;
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if self.app.config_form.is_editing() {
            self.handle_edit_key(key);
            return;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => {
                self.app.config_form.select_next();
            }
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => {
                self.app.config_form.select_previous();
            }
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-')) => {
                self.app.config_form.adjust_current(-1);
            }
            (
                KeyModifiers::NONE,
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') | KeyCode::Char('='),
            ) => {
                self.app.config_form.adjust_current(1);
            }
            (KeyModifiers::NONE, KeyCode::Enter) if self.app.config_form.is_text_field_selected() => {
                self.app.config_form.start_editing();
            }
            (KeyModifiers::NONE, KeyCode::Char('s')) | (KeyModifiers::NONE, KeyCode::Enter) => {
                self.save_config_changes();
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => self.reset_config_form(),
            (KeyModifiers::NONE, KeyCode::Char('m')) | (_, KeyCode::Esc) => {
                self.app.return_to_quiz()
            }
            (KeyModifiers::NONE, KeyCode::Char('q')) => self.app.quit(),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let form = &mut self.app.config_form;
        match key.code {
            KeyCode::Esc => form.cancel_edit(),
            KeyCode::Enter => form.apply_edit(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.push_char(ch)
            }
            _ => {}
        }
    }

    fn save_config_changes(&mut self) {
        if !self.app.config_form.dirty {
            self.app
                .config_form
                .set_status("No pending changes to save.");
            return;
        }

        let mut staged = config::current();
        if let Err(err) = self.app.config_form.apply_to(&mut staged) {
            self.app.config_form.set_status(format!("Not saved: {}", err));
            log_debug(&format!("App: rejected configuration change: {}", err));
            return;
        }

        match config::update(|config| *config = staged) {
            Ok(updated) => {
                self.app.apply_config(&updated);
                self.app.config_form.apply_saved(updated);
                self.app.config_form.set_status(format!(
                    "Saved configuration to {}",
                    config::config_file_path().display()
                ));
                log_debug("App: configuration saved");
            }
            Err(err) => {
                App::push_error(
                    &mut self.app.error,
                    format!("Failed to save configuration: {}", err),
                );
                self.app
                    .config_form
                    .set_status("Failed to save configuration. Check error panel.");
                log_debug(&format!("App: failed to save configuration: {}", err));
            }
        }
    }

    fn reset_config_form(&mut self) {
        let current = config::current();
        self.app.config_form = ConfigForm::from_config(current);
        self.app
            .config_form
            .set_status("Reverted to saved configuration values.");
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AppView,
        test_support::{fixture_app, key, type_text},
    };
    use crossterm::event::KeyCode;

    fn config_app() -> crate::App {
        let mut app = fixture_app(31);
        app.on_key_event(key(KeyCode::Down));
        app.on_key_event(key(KeyCode::Char('c')));
        assert_eq!(app.view, AppView::Config);
        app
    }

    #[test]
    fn editing_a_text_field_and_cancelling_keeps_the_old_value() {
        let mut app = config_app();
        let before = app.config_form.unit_range.clone();
        app.on_key_event(key(KeyCode::Enter));
        assert!(app.config_form.is_editing());
        type_text(&mut app, "qq");
        app.on_key_event(key(KeyCode::Esc));

        assert!(!app.config_form.is_editing());
        assert_eq!(app.config_form.unit_range, before);
        assert_eq!(app.view, AppView::Config);
    }

    #[test]
    fn applying_an_edit_marks_the_form_dirty() {
        let mut app = config_app();
        app.on_key_event(key(KeyCode::Enter));
        for _ in 0..8 {
            app.on_key_event(key(KeyCode::Backspace));
        }
        type_text(&mut app, "4-6");
        app.on_key_event(key(KeyCode::Enter));

        assert_eq!(app.config_form.unit_range, "4-6");
        assert!(app.config_form.dirty);
        assert_eq!(app.config_form.display_text(0).as_deref(), Some("4-6"));
    }

    #[test]
    fn invalid_unit_range_is_not_saved() {
        let mut app = config_app();
        app.on_key_event(key(KeyCode::Enter));
        for _ in 0..8 {
            app.on_key_event(key(KeyCode::Backspace));
        }
        type_text(&mut app, "40");
        app.on_key_event(key(KeyCode::Enter));
        app.on_key_event(key(KeyCode::Char('s')));

        assert!(app.config_form.dirty);
        let status = app.config_form.status.clone().unwrap_or_default();
        assert!(status.starts_with("Not saved"), "unexpected status: {status}");
    }

    #[test]
    fn arrows_adjust_numeric_fields_and_m_returns() {
        let mut app = config_app();
        app.on_key_event(key(KeyCode::Down));
        let count = app.config_form.question_count;
        app.on_key_event(key(KeyCode::Right));
        assert_eq!(app.config_form.question_count, count + 1);
        assert!(app.config_form.dirty);

        app.on_key_event(key(KeyCode::Char('r')));
        assert!(!app.config_form.dirty);

        app.on_key_event(key(KeyCode::Char('m')));
        assert_eq!(app.view, AppView::Quiz);
    }
}

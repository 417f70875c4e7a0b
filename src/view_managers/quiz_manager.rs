use crate::{App, log_util::log_debug, quiz::PhaseKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct QuizManager<'a> {
    app: &'a mut App,
}

impl<'a> QuizManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => {
                self.app.exit_quiz();
                log_debug("App: left quiz for settings");
                return;
            }
            (KeyModifiers::NONE, KeyCode::Char('q')) => {
                self.app.quit();
                return;
            }
            _ => {}
        }

        if self.app.is_loading() {
            return;
        }

        if self.app.machine.snapshot().answer_locked {
            self.advance();
            return;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.next_option(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.previous_option(),
            (KeyModifiers::NONE, KeyCode::Char(ch @ '1'..='9')) => {
                let index = ch as usize - '1' as usize;
                if index < self.option_count() {
                    self.app.selected_option = index;
                    self.answer(index);
                }
            }
            (KeyModifiers::NONE, KeyCode::Enter) | (KeyModifiers::NONE, KeyCode::Char(' ')) => {
                self.answer(self.app.selected_option)
            }
            _ => {}
        }
    }

    fn option_count(&self) -> usize {
        self.app
            .machine
            .snapshot()
            .question
            .map(|question| question.answer_options.len())
            .unwrap_or(0)
    }

    fn next_option(&mut self) {
        let len = self.option_count();
        if len > 0 {
            self.app.selected_option = (self.app.selected_option + 1) % len;
        }
    }

    fn previous_option(&mut self) {
        let len = self.option_count();
        if len == 0 {
            return;
        }
        if self.app.selected_option == 0 {
            self.app.selected_option = len - 1;
        } else {
            self.app.selected_option -= 1;
        }
    }

    fn answer(&mut self, index: usize) {
        if let Some(correct) = self.app.machine.submit_option(index) {
            log_debug(&format!(
                "App: answered option {} ({})",
                index + 1,
                if correct { "correct" } else { "incorrect" }
            ));
        }
    }

    fn advance(&mut self) {
        if self.app.machine.advance() {
            self.app.selected_option = 0;
            if self.app.machine.phase().kind() == PhaseKind::Finished {
                log_debug("App: quiz finished, showing results");
            }
        }
    }
}

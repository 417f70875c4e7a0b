use crate::{App, log_util::log_debug};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct ResultsManager<'a> {
    app: &'a mut App,
}

impl<'a> ResultsManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('r')) | (KeyModifiers::NONE, KeyCode::Char('R')) => {
                self.repeat_missed()
            }
            (KeyModifiers::NONE, KeyCode::Char('s'))
            | (KeyModifiers::NONE, KeyCode::Enter)
            | (_, KeyCode::Esc) => self.app.exit_quiz(),
            (KeyModifiers::NONE, KeyCode::Char('n')) => self.app.start_quiz(),
            (KeyModifiers::NONE, KeyCode::Char('q')) => self.app.quit(),
            _ => {}
        }
    }

    fn repeat_missed(&mut self) {
        if self.app.machine.repeat_missed() {
            self.app.selected_option = 0;
            log_debug("App: started repeat round");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        App,
        quiz::{PhaseKind, QuizNotice},
        test_support::{fixture_app, key, wait_for_load},
    };
    use crossterm::event::KeyCode;

    fn finish_quiz(app: &mut App, answer_correctly: bool) {
        app.start_quiz();
        wait_for_load(app);
        while app.machine.phase().kind() == PhaseKind::Running {
            let index = {
                let snapshot = app.machine.snapshot();
                let question = snapshot.question.expect("running quiz has a question");
                let correct = question
                    .answer_options
                    .iter()
                    .position(|option| *option == question.correct_answer)
                    .unwrap_or(0);
                if answer_correctly {
                    correct
                } else {
                    question
                        .answer_options
                        .iter()
                        .position(|option| *option != question.correct_answer)
                        .expect("fixture supplies distractors")
                }
            };
            assert!(app.machine.submit_option(index).is_some());
            assert!(app.machine.advance());
        }
    }

    #[test]
    fn r_starts_a_round_of_missed_questions() {
        let mut app = fixture_app(21);
        finish_quiz(&mut app, false);
        assert_eq!(app.machine.snapshot().missed.len(), 3);

        app.on_key_event(key(KeyCode::Char('r')));
        let snapshot = app.machine.snapshot();
        assert_eq!(snapshot.phase, PhaseKind::Running);
        assert!(snapshot.repeat_mode);
        assert_eq!(snapshot.requested_count, 3);
    }

    #[test]
    fn r_with_nothing_missed_shows_a_notice() {
        let mut app = fixture_app(22);
        finish_quiz(&mut app, true);

        app.on_key_event(key(KeyCode::Char('r')));
        let snapshot = app.machine.snapshot();
        assert_eq!(snapshot.phase, PhaseKind::Finished);
        assert_eq!(snapshot.notice, Some(QuizNotice::NothingToRepeat));
    }

    #[test]
    fn s_goes_back_to_settings_and_n_starts_again() {
        let mut app = fixture_app(23);
        finish_quiz(&mut app, true);
        app.on_key_event(key(KeyCode::Char('n')));
        assert!(app.is_loading());
        wait_for_load(&mut app);
        assert_eq!(app.machine.phase().kind(), PhaseKind::Running);

        finish_quiz(&mut app, true);
        app.on_key_event(key(KeyCode::Char('s')));
        assert_eq!(app.machine.phase().kind(), PhaseKind::Settings);
    }
}

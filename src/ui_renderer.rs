use crate::{
    App, AppView, LOADING_FRAMES,
    config::{self, ConfigForm},
    quiz::{AnswerState, PhaseKind, QuizSnapshot},
    view_managers::settings_manager::{SETTINGS_FIELDS, SettingsField},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, List, ListItem, ListState, Paragraph, Wrap},
};
use std::rc::Rc;

pub(crate) struct UiRenderer<'a> {
    app: &'a mut App,
}

impl<'a> UiRenderer<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn render(&mut self, frame: &mut Frame) {
        match self.app.view {
            AppView::Quiz => match self.app.machine.phase().kind() {
                PhaseKind::Settings => self.render_settings(frame),
                PhaseKind::Loading => self.render_loading(frame),
                PhaseKind::Running => self.render_question(frame),
                PhaseKind::Finished => self.render_results(frame),
            },
            AppView::Config => self.render_config(frame),
        }
    }

    fn render_settings(&mut self, frame: &mut Frame) {
        let app = &*self.app;
        let layout = Self::main_layout(frame.area());
        Self::render_header(frame, layout[0], app, "Choose units and a category to start.");

        let form = &app.settings_form;
        let fields = [
            SettingsField::Units,
            SettingsField::QuestionCount,
            SettingsField::Category,
            SettingsField::Start,
        ];
        let items: Vec<ListItem> = fields
            .iter()
            .map(|field| {
                let label = SETTINGS_FIELDS[field.index()];
                match field {
                    SettingsField::Start => ListItem::new(format!("[ {} ]", label)),
                    _ => ListItem::new(format!("{}: {}", label, form.display_text(*field))),
                }
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(form.field.index()));

        frame.render_stateful_widget(
            List::new(items)
                .block(Block::bordered().title(Line::from("Quiz Settings")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            layout[1],
            &mut list_state,
        );

        let snapshot = app.machine.snapshot();
        let mut status_lines = Self::status_prefix(app, &snapshot);
        status_lines.push(
            "↑/↓ choose field. Type units (e.g. 3 or 1-10). ←/→ adjust count or category."
                .to_string(),
        );
        status_lines.push("Enter to start. c to configure defaults. Esc, Ctrl-C, or q to quit.".to_string());
        Self::render_status(frame, layout[2], status_lines);
    }

    fn render_loading(&mut self, frame: &mut Frame) {
        let app = &*self.app;
        let layout = Self::main_layout(frame.area());
        let snapshot = app.machine.snapshot();
        Self::render_header(frame, layout[0], app, "Loading questions…");

        let frame_symbol = LOADING_FRAMES[app.loading_frame % LOADING_FRAMES.len()];
        let body = format!(
            "{} Loading {} questions for units {}…\n\nSource: {}",
            frame_symbol,
            snapshot.settings.category.label(),
            snapshot.settings.unit_range,
            app.source.location()
        );
        frame.render_widget(
            Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Loading"))),
            layout[1],
        );

        let mut status_lines = Self::status_prefix(app, &snapshot);
        status_lines.push("Esc to cancel and return to settings.".to_string());
        Self::render_status(frame, layout[2], status_lines);
    }

    fn render_question(&mut self, frame: &mut Frame) {
        let app = &mut *self.app;
        let layout = Self::main_layout(frame.area());
        let snapshot = app.machine.snapshot();

        let round = if snapshot.repeat_mode {
            "Repeat round"
        } else {
            "Quiz"
        };
        let header = format!(
            "{} • Question {}/{} • Score {}/{}",
            round,
            snapshot.question_number,
            snapshot.requested_count,
            snapshot.score,
            snapshot.answered_count
        );
        Self::render_header(frame, layout[0], app, &header);

        let Some(question) = snapshot.question else {
            frame.render_widget(
                Paragraph::new("No question available.")
                    .block(Block::bordered().title(Line::from("Question"))),
                layout[1],
            );
            return;
        };

        let option_count = question.answer_options.len();
        let selected_option = app.selected_option.min(option_count.saturating_sub(1));
        let mut option_lines = Vec::new();
        for (index, option) in question.answer_options.iter().enumerate() {
            let marker = if snapshot.answer_locked && *option == question.correct_answer {
                "[✓]"
            } else {
                "[ ]"
            };
            let prefix = if index == selected_option { "▶" } else { " " };
            option_lines.push(format!("{} {} {}. {}", prefix, marker, index + 1, option));
        }

        let mut sections = vec![
            format!("Question {}/{}:", snapshot.question_number, snapshot.requested_count),
            question.prompt.clone(),
            format!("Options:\n{}", option_lines.join("\n")),
        ];
        if let Some(frequency) = question.biblical_frequency.filter(|_| question.is_vocabulary) {
            sections.push(format!("Occurs {} times in the Hebrew Bible.", frequency));
        }
        match snapshot.last_answer {
            AnswerState::Correct => sections.push("Correct!".to_string()),
            AnswerState::Incorrect => sections.push(format!(
                "Incorrect. The answer is: {}",
                question.correct_answer
            )),
            AnswerState::Unknown => {}
        }
        if snapshot.answer_locked {
            sections.push("Press any key to continue.".to_string());
        }

        frame.render_widget(
            Paragraph::new(sections.join("\n\n"))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Question"))),
            layout[1],
        );

        let mut status_lines = Self::status_prefix(app, &snapshot);
        if snapshot.is_last_question {
            status_lines.push("Last question.".to_string());
        }
        status_lines.push(answer_hint(option_count));
        Self::render_status(frame, layout[2], status_lines);
        app.selected_option = selected_option;
    }

    fn render_results(&mut self, frame: &mut Frame) {
        let app = &*self.app;
        let layout = Self::main_layout(frame.area());
        let snapshot = app.machine.snapshot();
        Self::render_header(frame, layout[0], app, "Results");

        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(3)])
            .split(layout[1]);

        let title = if snapshot.repeat_mode {
            "Repeat round complete"
        } else {
            "Quiz complete"
        };
        frame.render_widget(
            Paragraph::new(format!(
                "You scored {} out of {}",
                snapshot.score, snapshot.answered_count
            ))
            .bold()
            .centered()
            .block(Block::bordered().title(Line::from(title))),
            body[0],
        );

        let missed_items: Vec<ListItem> = if snapshot.missed.is_empty() {
            vec![ListItem::new("Nothing missed.")]
        } else {
            snapshot
                .missed
                .iter()
                .map(|question| {
                    ListItem::new(format!("{} → {}", question.prompt, question.correct_answer))
                })
                .collect()
        };
        frame.render_widget(
            List::new(missed_items).block(Block::bordered().title(Line::from(format!(
                "Missed ({})",
                snapshot.missed.len()
            )))),
            body[1],
        );

        let mut status_lines = Self::status_prefix(app, &snapshot);
        if snapshot.repeat_available {
            status_lines.push("Press r to repeat the questions you missed.".to_string());
        }
        status_lines.push(
            "Press n for a new quiz with the same settings, s or Enter for settings, q to quit."
                .to_string(),
        );
        Self::render_status(frame, layout[2], status_lines);
    }

    fn render_config(&mut self, frame: &mut Frame) {
        let app = &*self.app;
        let layout = Self::main_layout(frame.area());

        let header_text = format!(
            "Config file: {}\nDefaults used when the settings form opens.",
            config::config_file_path().display()
        );
        frame.render_widget(
            Paragraph::new(header_text)
                .block(Block::bordered().title(Self::title_line()))
                .centered(),
            layout[0],
        );

        let items: Vec<ListItem> = ConfigForm::field_labels()
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let value = app.config_form.display_text(index).unwrap_or_default();
                ListItem::new(format!("{}: {}", label, value))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(app.config_form.selected_index()));

        frame.render_stateful_widget(
            List::new(items)
                .block(Block::bordered().title(Line::from("Defaults")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            layout[1],
            &mut list_state,
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        status_lines.push(
            "↑/↓ or j/k choose field. ←/→ or h/l adjust numbers or toggle the category.".to_string(),
        );
        status_lines.push(
            "Enter edits units or data source. Type to update, Enter to apply, Esc to cancel."
                .to_string(),
        );
        status_lines.push("Press s to save, r to reset, m or Esc to return.".to_string());
        if app.config_form.dirty {
            status_lines.push("Unsaved changes".to_string());
        }
        if let Some(config_status) = &app.config_form.status {
            status_lines.push(config_status.clone());
        }

        Self::render_status(frame, layout[2], status_lines);
    }

    fn main_layout(area: Rect) -> Rc<[Rect]> {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(6),
                Constraint::Length(5),
            ])
            .split(area)
    }

    fn title_line() -> Line<'static> {
        Line::from("Unit Quiz").bold().blue().centered()
    }

    fn render_header(frame: &mut Frame, area: Rect, app: &App, text: &str) {
        let settings = app.machine.settings();
        let header = format!(
            "{}\n{} • units {}",
            text,
            settings.category.label(),
            settings.unit_range
        );
        frame.render_widget(
            Paragraph::new(header)
                .block(Block::bordered().title(Self::title_line()))
                .centered(),
            area,
        );
    }

    /// Error and notice lines shared by every quiz screen.
    fn status_prefix(app: &App, snapshot: &QuizSnapshot<'_>) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(error) = snapshot.error {
            lines.push(format!("Error: {}", error));
        }
        if let Some(error) = &app.error {
            lines.push(format!("Error: {}", error));
        }
        if let Some(notice) = snapshot.notice {
            lines.push(notice.message().to_string());
        }
        lines
    }

    fn render_status(frame: &mut Frame, area: Rect, lines: Vec<String>) {
        frame.render_widget(
            Paragraph::new(lines.join("\n"))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Status"))),
            area,
        );
    }
}

/// Number keys reach at most the ninth option.
fn answer_hint(option_count: usize) -> String {
    let keys = match option_count.min(9) {
        0 => "↑/↓".to_string(),
        1 => "1".to_string(),
        last => format!("1-{}", last),
    };
    format!(
        "Press {} to answer, or ↑/↓ then Enter. Esc returns to settings, q quits.",
        keys
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_hint_follows_the_option_count() {
        assert!(answer_hint(4).starts_with("Press 1-4 to answer"));
        assert!(answer_hint(6).starts_with("Press 1-6 to answer"));
        assert!(answer_hint(2).starts_with("Press 1-2 to answer"));
        assert!(answer_hint(12).starts_with("Press 1-9 to answer"));
        assert!(answer_hint(1).starts_with("Press 1 to answer"));
    }
}

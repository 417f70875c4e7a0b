use super::{
    error::{QuizError, QuizNotice},
    formatter::{FormatterOptions, Question, format_question},
    shuffle::{shuffle, shuffled},
    unit_range::UnitRange,
};
use crate::{
    log_util::log_debug,
    question_source::{Category, Dataset},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::mem;

/// Outcome of the most recent submission for the question on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Unknown,
    Correct,
    Incorrect,
}

impl From<bool> for AnswerState {
    fn from(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }
}

/// Values the settings form hands to `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    pub category: Category,
    pub unit_range: UnitRange,
    pub requested_count: usize,
}

/// What the dataset worker needs in order to load a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub category: Category,
    pub unit_range: UnitRange,
    pub requested_count: usize,
}

/// State of one quiz round, from the first question to the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    category: Category,
    unit_range: UnitRange,
    /// Answers required to finish the round.
    requested_count: usize,
    /// Upper bound on the size of a repeat round built from this session.
    round_cap: usize,
    questions: Vec<Question>,
    current_index: usize,
    score: usize,
    answered_count: usize,
    missed: Vec<Question>,
    repeat_missed: Vec<Question>,
    repeat_backlog: Vec<Question>,
    repeat_mode: bool,
    last_answer: AnswerState,
    answer_locked: bool,
}

impl QuizSession {
    fn new(request: LoadRequest, questions: Vec<Question>) -> Self {
        Self {
            category: request.category,
            unit_range: request.unit_range,
            requested_count: request.requested_count,
            round_cap: request.requested_count,
            questions,
            current_index: 0,
            score: 0,
            answered_count: 0,
            missed: Vec::new(),
            repeat_missed: Vec::new(),
            repeat_backlog: Vec::new(),
            repeat_mode: false,
            last_answer: AnswerState::Unknown,
            answer_locked: false,
        }
    }

    fn repeat_of(previous: &QuizSession, round: Vec<Question>, backlog: Vec<Question>) -> Self {
        Self {
            category: previous.category,
            unit_range: previous.unit_range,
            requested_count: round.len(),
            round_cap: previous.round_cap,
            questions: round,
            current_index: 0,
            score: 0,
            answered_count: 0,
            missed: Vec::new(),
            repeat_missed: Vec::new(),
            repeat_backlog: backlog,
            repeat_mode: true,
            last_answer: AnswerState::Unknown,
            answer_locked: false,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn unit_range(&self) -> UnitRange {
        self.unit_range
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answered_count(&self) -> usize {
        self.answered_count
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    pub fn is_repeat_mode(&self) -> bool {
        self.repeat_mode
    }

    pub fn last_answer(&self) -> AnswerState {
        self.last_answer
    }

    pub fn is_answer_locked(&self) -> bool {
        self.answer_locked
    }

    pub fn repeat_backlog(&self) -> &[Question] {
        &self.repeat_backlog
    }

    /// Questions a repeat round would be built from.
    pub fn missed_questions(&self) -> &[Question] {
        if self.repeat_mode {
            &self.repeat_missed
        } else {
            &self.missed
        }
    }

    /// True on the final answer of the round, once no repeat backlog is waiting behind it.
    pub fn is_last_question(&self) -> bool {
        self.answered_count + 1 == self.requested_count && self.repeat_backlog.is_empty()
    }

    pub fn all_answered(&self) -> bool {
        self.answered_count >= self.requested_count
    }

    fn record_miss(&mut self, question: Question) {
        let list = if self.repeat_mode {
            &mut self.repeat_missed
        } else {
            &mut self.missed
        };
        list.push(question);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    Settings,
    Loading(LoadRequest),
    Running(QuizSession),
    Finished(QuizSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Settings,
    Loading,
    Running,
    Finished,
}

impl QuizPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Settings => PhaseKind::Settings,
            Self::Loading(_) => PhaseKind::Loading,
            Self::Running(_) => PhaseKind::Running,
            Self::Finished(_) => PhaseKind::Finished,
        }
    }

    fn session(&self) -> Option<&QuizSession> {
        match self {
            Self::Running(session) | Self::Finished(session) => Some(session),
            Self::Settings | Self::Loading(_) => None,
        }
    }
}

/// Read-only view of the machine for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot<'a> {
    pub phase: PhaseKind,
    pub settings: QuizSettings,
    pub question: Option<&'a Question>,
    pub question_number: usize,
    pub score: usize,
    pub answered_count: usize,
    pub requested_count: usize,
    pub error: Option<&'a QuizError>,
    pub notice: Option<QuizNotice>,
    pub missed: &'a [Question],
    pub repeat_available: bool,
    pub repeat_mode: bool,
    pub last_answer: AnswerState,
    pub answer_locked: bool,
    pub is_last_question: bool,
}

/// Owns the quiz lifecycle: settings, loading, running, finished and the repeat-missed loop.
#[derive(Debug)]
pub struct QuizMachine<R = StdRng> {
    settings: QuizSettings,
    phase: QuizPhase,
    error: Option<QuizError>,
    notice: Option<QuizNotice>,
    formatter: FormatterOptions,
    rng: R,
}

impl QuizMachine<StdRng> {
    pub fn new(settings: QuizSettings, formatter: FormatterOptions) -> Self {
        Self::with_rng(settings, formatter, StdRng::from_os_rng())
    }
}

impl<R: Rng> QuizMachine<R> {
    pub fn with_rng(settings: QuizSettings, formatter: FormatterOptions, rng: R) -> Self {
        Self {
            settings,
            phase: QuizPhase::Settings,
            error: None,
            notice: None,
            formatter,
            rng,
        }
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    pub fn error(&self) -> Option<&QuizError> {
        self.error.as_ref()
    }

    pub fn notice(&self) -> Option<QuizNotice> {
        self.notice
    }

    pub fn set_formatter_options(&mut self, formatter: FormatterOptions) {
        self.formatter = formatter;
    }

    /// Validate and store the settings form. On failure the stored settings are left as they were.
    pub fn configure(
        &mut self,
        unit_input: &str,
        requested_count: usize,
        category: Category,
    ) -> Result<(), QuizError> {
        let Ok(unit_range) = unit_input.parse::<UnitRange>() else {
            return Err(self.fail(QuizError::InvalidUnitRange(unit_input.trim().to_string())));
        };
        if requested_count == 0 {
            return Err(self.fail(QuizError::InvalidQuestionCount));
        }
        self.settings = QuizSettings {
            category,
            unit_range,
            requested_count,
        };
        self.error = None;
        log_debug(&format!(
            "QuizMachine: configured {} quiz for units {} with {} question(s)",
            category.label(),
            unit_range,
            requested_count
        ));
        Ok(())
    }

    /// Begin loading a quiz with the stored settings. Any current session is discarded.
    pub fn start(&mut self) -> Result<LoadRequest, QuizError> {
        if let Some(err) = self.error.as_ref().filter(|err| err.is_validation()) {
            log_debug(&format!("QuizMachine: start refused: {}", err));
            return Err(err.clone());
        }
        let request = LoadRequest {
            category: self.settings.category,
            unit_range: self.settings.unit_range,
            requested_count: self.settings.requested_count,
        };
        self.error = None;
        self.notice = None;
        self.phase = QuizPhase::Loading(request);
        log_debug(&format!(
            "QuizMachine: loading {} questions for units {}",
            request.category.label(),
            request.unit_range
        ));
        Ok(request)
    }

    /// Finish a load started by `start`. Results arriving in any other phase are dropped.
    pub fn complete_loading(&mut self, result: Result<Dataset, QuizError>) -> Result<(), QuizError> {
        let QuizPhase::Loading(request) = self.phase else {
            log_debug("QuizMachine: discarded dataset that arrived outside of loading");
            return Ok(());
        };
        let dataset = match result {
            Ok(dataset) if dataset.category() == request.category => dataset,
            Ok(dataset) => {
                return Err(self.abort_loading(QuizError::SourceFetch(format!(
                    "expected {} questions but received {}",
                    request.category.label(),
                    dataset.category().label()
                ))));
            }
            Err(err) => return Err(self.abort_loading(err)),
        };

        let questions = self.build_questions(&request, &dataset);
        if questions.is_empty() {
            return Err(self.abort_loading(QuizError::NoQuestionsForRange(request.unit_range)));
        }
        log_debug(&format!(
            "QuizMachine: started quiz with {} question(s) ({} requested)",
            questions.len(),
            request.requested_count
        ));
        self.phase = QuizPhase::Running(QuizSession::new(request, questions));
        Ok(())
    }

    /// `start` followed by `complete_loading` for callers that already hold the dataset.
    pub fn start_with(&mut self, dataset: Dataset) -> Result<(), QuizError> {
        self.start()?;
        self.complete_loading(Ok(dataset))
    }

    fn build_questions(&mut self, request: &LoadRequest, dataset: &Dataset) -> Vec<Question> {
        let mut matching: Vec<_> = dataset
            .entries()
            .into_iter()
            .filter(|entry| {
                entry
                    .unit()
                    .is_some_and(|unit| request.unit_range.contains(unit))
            })
            .collect();
        shuffle(&mut matching, &mut self.rng);
        matching.truncate(request.requested_count);
        matching
            .into_iter()
            .filter_map(|entry| {
                format_question(
                    entry,
                    request.category,
                    dataset,
                    &self.formatter,
                    &mut self.rng,
                )
            })
            .collect()
    }

    /// Answer the question on screen. Returns `None` when no answer is accepted.
    pub fn submit_answer(&mut self, selected: &str) -> Option<bool> {
        let QuizPhase::Running(session) = &mut self.phase else {
            return None;
        };
        if session.answer_locked {
            return None;
        }
        let question = session.current_question()?.clone();
        let correct = question.is_correct(selected);
        session.last_answer = AnswerState::from(correct);
        session.answer_locked = true;
        if correct {
            session.score += 1;
        } else {
            session.record_miss(question);
        }
        session.answered_count += 1;
        log_debug(&format!(
            "QuizMachine: answer {} of {} was {}",
            session.answered_count,
            session.requested_count,
            if correct { "correct" } else { "incorrect" }
        ));
        Some(correct)
    }

    /// Answer with the option at `index` on the current question.
    pub fn submit_option(&mut self, index: usize) -> Option<bool> {
        let selected = match &self.phase {
            QuizPhase::Running(session) => session.current_question()?.answer_options.get(index)?.clone(),
            _ => return None,
        };
        self.submit_answer(&selected)
    }

    /// Move past an answered question. Returns `false` when there was nothing to advance.
    pub fn advance(&mut self) -> bool {
        let QuizPhase::Running(session) = &mut self.phase else {
            return false;
        };
        if !session.answer_locked {
            return false;
        }
        session.last_answer = AnswerState::Unknown;
        session.answer_locked = false;

        if session.all_answered() {
            if session.repeat_mode {
                if let Some(next) = session.repeat_backlog.pop() {
                    session.questions.push(next);
                    session.requested_count += 1;
                    session.current_index = session.questions.len() - 1;
                    log_debug(&format!(
                        "QuizMachine: continued repeat round, {} question(s) left in backlog",
                        session.repeat_backlog.len()
                    ));
                    return true;
                }
            }
            self.finish();
        } else if session.current_index + 1 >= session.questions.len() {
            shuffle(&mut session.questions, &mut self.rng);
            session.current_index = 0;
            log_debug("QuizMachine: recycled question set after reaching the end");
        } else {
            session.current_index += 1;
        }
        true
    }

    fn finish(&mut self) {
        if let QuizPhase::Running(session) = mem::replace(&mut self.phase, QuizPhase::Settings) {
            log_debug(&format!(
                "QuizMachine: finished with {} of {} correct, {} missed",
                session.score,
                session.answered_count,
                session.missed_questions().len()
            ));
            self.phase = QuizPhase::Finished(session);
        }
    }

    /// Start a repeat round from the missed questions of the finished session.
    pub fn repeat_missed(&mut self) -> bool {
        let QuizPhase::Finished(previous) = &self.phase else {
            return false;
        };
        if previous.missed_questions().is_empty() {
            self.notice = Some(QuizNotice::NothingToRepeat);
            log_debug("QuizMachine: nothing to repeat");
            return false;
        }
        let mut round = shuffled(previous.missed_questions(), &mut self.rng);
        let backlog = round.split_off(previous.round_cap.min(round.len()));
        let session = QuizSession::repeat_of(previous, round, backlog);
        log_debug(&format!(
            "QuizMachine: repeating {} missed question(s), {} in backlog",
            session.questions.len(),
            session.repeat_backlog.len()
        ));
        self.notice = None;
        self.phase = QuizPhase::Running(session);
        true
    }

    /// Drop the current session and go back to the settings form.
    pub fn exit(&mut self) {
        self.phase = QuizPhase::Settings;
        self.error = None;
        self.notice = None;
        log_debug("QuizMachine: returned to settings");
    }

    pub fn snapshot(&self) -> QuizSnapshot<'_> {
        let session = self.phase.session();
        let running = matches!(self.phase, QuizPhase::Running(_));
        let missed = session.map(QuizSession::missed_questions).unwrap_or(&[]);
        let answered_count = session.map(QuizSession::answered_count).unwrap_or(0);
        let answer_locked = session.is_some_and(QuizSession::is_answer_locked);
        QuizSnapshot {
            phase: self.phase.kind(),
            settings: self.settings,
            question: session
                .filter(|_| running)
                .and_then(QuizSession::current_question),
            question_number: if answer_locked {
                answered_count
            } else {
                answered_count + 1
            },
            score: session.map(QuizSession::score).unwrap_or(0),
            answered_count,
            requested_count: session
                .map(QuizSession::requested_count)
                .unwrap_or(self.settings.requested_count),
            error: self.error.as_ref(),
            notice: self.notice,
            missed,
            repeat_available: matches!(self.phase, QuizPhase::Finished(_)) && !missed.is_empty(),
            repeat_mode: session.is_some_and(QuizSession::is_repeat_mode),
            last_answer: session
                .map(QuizSession::last_answer)
                .unwrap_or_default(),
            answer_locked,
            is_last_question: running && session.is_some_and(QuizSession::is_last_question),
        }
    }

    fn fail(&mut self, err: QuizError) -> QuizError {
        log_debug(&format!("QuizMachine: {}", err));
        self.error = Some(err.clone());
        err
    }

    fn abort_loading(&mut self, err: QuizError) -> QuizError {
        self.phase = QuizPhase::Settings;
        self.fail(err)
    }
}

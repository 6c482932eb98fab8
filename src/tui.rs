use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::db::Database;
use crate::display::{format_date, format_score, format_timestamp, truncate};
use crate::filter::{FilterSpec, apply_filters};
use crate::matching::{match_score, matched_skills, requirement_counts};
use crate::models::{Job, Priority, Status};
use crate::salary::{SalarySource, resolve_job_salary};
use crate::sort::{SortField, SortSpec, apply_sort};

struct AppState {
    jobs: Vec<Job>,
    view: Vec<Job>,
    filters: FilterSpec,
    sort: SortSpec,
    selected: usize,
    scroll_offset: u16,
    message: Option<String>,
}

impl AppState {
    fn new(jobs: Vec<Job>, filters: FilterSpec, sort: SortSpec) -> Self {
        let mut state = Self {
            jobs,
            view: Vec::new(),
            filters,
            sort,
            selected: 0,
            scroll_offset: 0,
            message: None,
        };
        state.refresh();
        state
    }

    /// Recomputes the visible rows, keeping the selected job selected when it
    /// is still visible.
    fn refresh(&mut self) {
        let selected_id = self.current_job().map(|j| j.id.clone());
        self.view = apply_sort(&apply_filters(&self.jobs, &self.filters), &self.sort);
        self.selected = selected_id
            .and_then(|id| self.view.iter().position(|j| j.id == id))
            .unwrap_or(0)
            .min(self.view.len().saturating_sub(1));
    }

    fn current_job(&self) -> Option<&Job> {
        self.view.get(self.selected)
    }

    fn apply(&mut self, updated: Job) {
        if let Some(job) = self.jobs.iter_mut().find(|j| j.id == updated.id) {
            *job = updated;
        }
        self.refresh();
    }

    fn next(&mut self) {
        if !self.view.is_empty() && self.selected < self.view.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn cycle_status_filter(&mut self) {
        self.filters.status = match self.filters.status {
            None => Some(Status::ALL[0]),
            Some(current) => {
                let idx = Status::ALL.iter().position(|s| *s == current).unwrap_or(0);
                Status::ALL.get(idx + 1).copied()
            }
        };
        self.refresh();
    }

    fn cycle_priority_filter(&mut self) {
        self.filters.priority = match self.filters.priority {
            None => Some(Priority::High),
            Some(Priority::High) => Some(Priority::Medium),
            Some(Priority::Medium) => Some(Priority::Low),
            Some(Priority::Low) => None,
        };
        self.refresh();
    }

    fn cycle_sort_field(&mut self) {
        self.sort.field = Some(match self.sort.field {
            Some(field) => field.next(),
            None => SortField::ALL[0],
        });
        self.refresh();
    }

    fn toggle_direction(&mut self) {
        self.sort.direction = self.sort.direction.toggled();
        self.refresh();
    }

    fn toggle_hide_hidden(&mut self) {
        self.filters.hide_hidden = !self.filters.hide_hidden;
        self.refresh();
    }
}

pub fn run_browse(db: &Database, filters: FilterSpec, sort: SortSpec) -> Result<()> {
    let jobs = db.load_jobs();
    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    let mut state = AppState::new(jobs, filters, sort);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select(if state.view.is_empty() {
            None
        } else {
            Some(state.selected)
        });
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            state.message = None;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('n') => set_status(state, db, Status::New),
                KeyCode::Char('a') => set_status(state, db, Status::Applied),
                KeyCode::Char('i') => set_status(state, db, Status::Interview),
                KeyCode::Char('x') => set_status(state, db, Status::Rejected),
                KeyCode::Char('o') => set_status(state, db, Status::Offer),
                KeyCode::Char('1') => set_priority(state, db, Priority::High),
                KeyCode::Char('2') => set_priority(state, db, Priority::Medium),
                KeyCode::Char('3') => set_priority(state, db, Priority::Low),
                KeyCode::Char('h') => {
                    if let Some(id) = state.current_job().map(|j| j.id.clone()) {
                        persist(state, db.toggle_hidden(&id));
                    }
                }
                KeyCode::Char('H') => state.toggle_hide_hidden(),
                KeyCode::Char('f') => state.cycle_status_filter(),
                KeyCode::Char('p') => state.cycle_priority_filter(),
                KeyCode::Char('s') => state.cycle_sort_field(),
                KeyCode::Char('d') => state.toggle_direction(),
                _ => {}
            }
        }
    }
    Ok(())
}

fn set_status(state: &mut AppState, db: &Database, status: Status) {
    if let Some(id) = state.current_job().map(|j| j.id.clone()) {
        persist(state, db.update_job_status(&id, status));
    }
}

fn set_priority(state: &mut AppState, db: &Database, priority: Priority) {
    if let Some(id) = state.current_job().map(|j| j.id.clone()) {
        persist(state, db.update_job_priority(&id, priority));
    }
}

fn persist(state: &mut AppState, result: Result<Job>) {
    match result {
        Ok(job) => state.apply(job),
        Err(e) => {
            tracing::debug!("Failed to save change: {e:#}");
            state.message = Some(format!("Save failed: {e}"));
        }
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    // Left panel: job table
    let items: Vec<ListItem> = state
        .view
        .iter()
        .map(|job| {
            let hidden = if job.hidden { "~" } else { " " };
            ListItem::new(format!(
                "{}{:<9} {:<6} {:>3}% {} | {}",
                hidden,
                job.status.as_str(),
                job.priority_level.label(),
                format_score(match_score(job)),
                truncate(&job.position, 28),
                truncate(&job.company, 18)
            ))
            .style(status_style(job.status))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title(state)))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job detail
    let detail_widget = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    let footer = match &state.message {
        Some(message) => Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(
            " j/k:move J/K:scroll  n/a/i/x/o:status 1/2/3:priority h:hide  f/p:filter H:show hidden s/d:sort  q:quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, rows[1]);
}

fn list_title(state: &AppState) -> String {
    let status = state.filters.status.map_or("All", Status::as_str);
    let priority = state.filters.priority.map_or("All", Priority::label);
    let sort = state.sort.field.map_or("none", |f| f.as_str());
    format!(
        " Jobs {}/{} | status:{} priority:{}{} | sort:{} {} ",
        state.view.len(),
        state.jobs.len(),
        status,
        priority,
        if state.filters.hide_hidden { "" } else { " +hidden" },
        sort,
        state.sort.direction.as_str()
    )
}

fn status_style(status: Status) -> Style {
    match status {
        Status::New => Style::default().fg(Color::Green),
        Status::Applied => Style::default().fg(Color::Cyan),
        Status::Interview => Style::default().fg(Color::Yellow),
        Status::Rejected => Style::default().fg(Color::Red),
        Status::Offer => Style::default().fg(Color::Magenta),
    }
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn build_detail(state: &AppState) -> Text<'static> {
    let Some(job) = state.current_job() else {
        return Text::raw("No job matches the current filters");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(heading(&job.position));
    lines.push(Line::from(format!("at {}", job.company)));
    if let Some(location) = &job.location {
        lines.push(Line::from(location.clone()));
    }
    lines.push(Line::from(Span::styled(
        format!("Status: {}   Priority: {}", job.status, job.priority_level.label()),
        status_style(job.status),
    )));
    if job.hidden {
        lines.push(Line::from(Span::styled(
            "(hidden)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(format!("Updated: {}", format_timestamp(&job.last_updated))));

    let salary = resolve_job_salary(job);
    lines.push(Line::from(format!("Salary: {} [{}]", salary.value, salary.source.tag())));
    if salary.source == SalarySource::External {
        for line in textwrap::fill(&salary.tooltip, 70).lines() {
            lines.push(Line::from(Span::styled(
                format!("  {}", line),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if let Some(start) = &job.start_date {
        lines.push(Line::from(format!("Start: {}", format_date(start))));
    }
    if let Some(remote) = &job.remote_policy {
        lines.push(Line::from(format!("Remote: {}", remote)));
    }
    if !job.tech_stack.is_empty() {
        lines.push(Line::from(format!("Tech: {}", job.tech_stack_joined())));
    }
    if let Some(url) = &job.url {
        lines.push(Line::from(format!("URL: {}", url)));
    }
    lines.push(Line::from(""));

    // CV match
    if let Some(cv) = &job.cv_match {
        lines.push(heading(&format!("CV match: {}%", format_score(match_score(job)))));
        let counts = requirement_counts(cv.requirements());
        if counts.total > 0 {
            lines.push(Line::from(Span::styled(
                format!(
                    "  Can do well {} ({}%)  Can transfer {} ({}%)  Must learn {} ({}%)",
                    counts.can_do_well,
                    counts.percentages.can_do_well,
                    counts.can_transfer,
                    counts.percentages.can_transfer,
                    counts.must_learn,
                    counts.percentages.must_learn
                ),
                Style::default().fg(Color::Cyan),
            )));
        }
        let skills = matched_skills(job);
        if !skills.is_empty() {
            lines.push(Line::from(format!("  Matched: {}", skills.join(", "))));
        }
        for (name, sub) in cv.sub_scores() {
            if let Some(score) = sub.and_then(|s| s.score.as_ref()) {
                lines.push(Line::from(format!("  {:<13} {}", name, score)));
            }
        }
        lines.push(Line::from(""));
    }

    if let Some(notes) = &job.interview_notes {
        lines.push(heading("Interview notes"));
        for line in textwrap::fill(notes, 70).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    match &job.job_description {
        Some(text) => {
            lines.push(heading("Description"));
            for line in textwrap::fill(text, 70).lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "(No description)",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    Text::from(lines)
}

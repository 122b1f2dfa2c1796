use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::api::{ApiError, ApiService};
use crate::config::AppConfig;
use crate::internal::collection::{CollectionKind, CollectionOutcome, TriggerDecision};
use crate::internal::controller::{FetchApplied, FetchTicket, ListSnapshot, QueryController, load_list};
use crate::internal::detail::DetailView;
use crate::internal::models::{ArticleDetail, ArticleSummary, SchedulerStatus, TodayArticles};
use crate::internal::notification::Notification;
use crate::internal::query::FilterUpdate;
use crate::internal::ui::keybindings::{KeyBindingContext, KeyBindingMap};
use crate::utils::datetime::parse_date_input;
use crate::utils::theme_loader::{TuiTheme, resolve_theme};

use ratatui::Frame;
use ratatui::widgets::ListState;

/// Application view modes.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ViewMode {
    List,
    Detail,
}

/// Input modes for the UI.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum InputMode {
    Normal,
    /// Typing into the keyword draft. Nothing is fetched until Enter.
    Keyword,
    DateFrom,
    DateTo,
}

/// Actions/messages sent through the app action channel.
///
/// Unit variants can be bound to keys in `config.ron`; the rest carry
/// results back from spawned requests and are never deserialized.
#[derive(Debug, Clone, Deserialize)]
pub enum Action {
    Quit,
    NavigateUp,
    NavigateDown,
    Enter,
    Back,
    OpenBrowser,
    ScrollUp,
    ScrollDown,
    Refresh,
    NextPage,
    PrevPage,
    CycleCategory,
    CycleSource,
    EditDateFrom,
    EditDateTo,
    EditKeyword,
    ClearFilters,
    CollectNow,
    CollectHistorical,
    DismissBanner,
    ToggleHelp,
    ClearNotification,
    #[serde(skip)]
    ListLoaded {
        generation: u64,
        result: Result<ListSnapshot, ApiError>,
    },
    #[serde(skip)]
    ArticleLoaded {
        id: u32,
        result: Result<ArticleDetail, ApiError>,
    },
    #[serde(skip)]
    CollectionFinished {
        kind: CollectionKind,
        result: Result<CollectionOutcome, ApiError>,
    },
    #[serde(skip)]
    SchedulerStatusLoaded(Result<SchedulerStatus, ApiError>),
    #[serde(skip)]
    TodayLoaded(Result<TodayArticles, ApiError>),
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub app_version: String,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    /// Text being typed for a date filter.
    pub input_buffer: String,
    pub controller: QueryController,
    pub list_state: ListState,
    pub detail: Option<DetailView>,
    pub api_service: Arc<ApiService>,
    pub theme: TuiTheme,
    pub notification: Option<Notification>,
    pub scheduler_status: Option<SchedulerStatus>,
    pub today_count: Option<usize>,
    pub show_help: bool,
    pub spinner_state: usize,
    pub last_spinner_update: Option<tokio::time::Instant>,
    pub config: AppConfig,
    pub keybindings: KeyBindingMap,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    #[tracing::instrument(skip(config))]
    pub fn new(config: AppConfig) -> Self {
        let api_service = ApiService::new(&config.api, config.logging.enable_performance_metrics);
        Self::with_api(config, api_service)
    }

    pub fn with_api(config: AppConfig, api_service: ApiService) -> Self {
        let start = std::time::Instant::now();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let theme = resolve_theme(&config.ui, config.logging.enable_performance_metrics);

        let mut keybindings =
            crate::internal::ui::keybindings_default::create_default_keybindings();
        if let Some(custom_bindings) = &config.keybindings {
            keybindings.merge_config(custom_bindings);
        }

        tracing::info!(
            base_url = api_service.base_url(),
            elapsed = ?start.elapsed(),
            "App initialized"
        );

        Self {
            running: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            view_mode: ViewMode::List,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            controller: QueryController::new(),
            list_state: ListState::default(),
            detail: None,
            api_service: Arc::new(api_service),
            theme,
            notification: None,
            scheduler_status: None,
            today_count: None,
            show_help: false,
            spinner_state: 0,
            last_spinner_update: None,
            config,
            keybindings,
            action_tx,
            action_rx,
        }
    }

    pub fn notify_info(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::info(message));
    }

    pub fn notify_warning(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::warning(message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    /// An alert waiting for acknowledgement traps input.
    pub fn awaiting_ack(&self) -> bool {
        self.notification.as_ref().is_some_and(|n| n.requires_ack)
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        let ticket = self.controller.mount();
        self.spawn_fetch(ticket);
        self.spawn_startup_info();

        let mut event_interval = tokio::time::interval(std::time::Duration::from_millis(16));

        loop {
            let now = tokio::time::Instant::now();
            match self.last_spinner_update {
                Some(last_update) if now.duration_since(last_update).as_millis() >= 100 => {
                    self.spinner_state = self.spinner_state.wrapping_add(1);
                    self.last_spinner_update = Some(now);
                }
                Some(_) => {}
                None => self.last_spinner_update = Some(now),
            }

            if let Some(notification) = &self.notification
                && notification.should_dismiss()
            {
                self.clear_notification();
            }

            tui.draw(|f| self.ui(f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    if event::poll(std::time::Duration::from_millis(0))?
                        && let Event::Key(key) = event::read()?
                        && key.kind == KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }
            }

            if !self.running {
                break;
            }
        }
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        if self.awaiting_ack() {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q')
            ) {
                self.clear_notification();
            }
            return;
        }

        if self.controller.pending_confirmation().is_some() {
            self.handle_confirmation_input(key);
            return;
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.input_mode {
            InputMode::Keyword => self.handle_keyword_input(key),
            InputMode::DateFrom | InputMode::DateTo => self.handle_date_input(key),
            InputMode::Normal => self.handle_normal_input(key),
        }
    }

    fn handle_confirmation_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(kind) = self.controller.confirm_collection() {
                    self.spawn_collection(kind);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                if let Some(kind) = self.controller.decline_collection() {
                    tracing::info!(%kind, "collection declined");
                }
            }
            _ => {}
        }
    }

    fn handle_keyword_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                let mut draft = self.controller.filters().keyword_draft.clone();
                draft.push(c);
                self.controller.set_keyword_draft(draft);
            }
            KeyCode::Backspace => {
                let mut draft = self.controller.filters().keyword_draft.clone();
                draft.pop();
                self.controller.set_keyword_draft(draft);
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let ticket = self.controller.submit_search();
                self.dispatch(ticket);
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_date_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => self.input_buffer.push(c),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Enter => match parse_date_input(&self.input_buffer) {
                Ok(date) => {
                    let update = match self.input_mode {
                        InputMode::DateFrom => FilterUpdate::DateFrom(date),
                        _ => FilterUpdate::DateTo(date),
                    };
                    self.input_mode = InputMode::Normal;
                    self.input_buffer.clear();
                    let ticket = self.controller.set_filter(update);
                    self.dispatch(ticket);
                }
                Err(msg) => self.notify_warning(msg),
            },
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
            }
            _ => {}
        }
    }

    fn handle_normal_input(&mut self, key: KeyEvent) {
        let context = match self.view_mode {
            ViewMode::List => KeyBindingContext::List,
            ViewMode::Detail => KeyBindingContext::Detail,
        };

        if let Some(action) = self.keybindings.get_action(&key, context) {
            let _ = self.action_tx.send(action);
        }
    }

    #[tracing::instrument(skip(self, action))]
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::NavigateUp => match self.view_mode {
                ViewMode::List => self.select_prev(),
                ViewMode::Detail => self.scroll_detail(false),
            },
            Action::NavigateDown => match self.view_mode {
                ViewMode::List => self.select_next(),
                ViewMode::Detail => self.scroll_detail(true),
            },
            Action::ScrollUp => self.scroll_detail(false),
            Action::ScrollDown => self.scroll_detail(true),
            Action::Enter => {
                if self.view_mode == ViewMode::List
                    && let Some(article) = self.selected_article()
                {
                    let id = article.id;
                    self.open_detail(id);
                }
            }
            Action::Back => {
                if self.view_mode == ViewMode::Detail {
                    self.view_mode = ViewMode::List;
                    self.detail = None;
                }
            }
            Action::OpenBrowser => {
                if let Some(url) = self.current_url() {
                    tracing::info!(%url, "opening in browser");
                    if let Err(e) = open::that(&url) {
                        tracing::error!("Failed to open browser: {}", e);
                        self.notify_error(format!("Could not open browser: {}", e));
                    }
                }
            }
            Action::Refresh => {
                let ticket = self.controller.refresh();
                self.spawn_fetch(ticket);
            }
            Action::NextPage => {
                let ticket = self.controller.next_page();
                self.dispatch(ticket);
            }
            Action::PrevPage => {
                let ticket = self.controller.prev_page();
                self.dispatch(ticket);
            }
            Action::CycleCategory => {
                let next = cycle_option(
                    self.controller.filters().category.as_deref(),
                    &self.controller.snapshot().categories,
                );
                let ticket = self.controller.set_filter(FilterUpdate::Category(next));
                self.dispatch(ticket);
            }
            Action::CycleSource => {
                let next = cycle_option(
                    self.controller.filters().source.as_deref(),
                    &self.controller.snapshot().sources,
                );
                let ticket = self.controller.set_filter(FilterUpdate::Source(next));
                self.dispatch(ticket);
            }
            Action::EditDateFrom => {
                self.input_buffer = self
                    .controller
                    .filters()
                    .date_from
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                self.input_mode = InputMode::DateFrom;
            }
            Action::EditDateTo => {
                self.input_buffer = self
                    .controller
                    .filters()
                    .date_to
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                self.input_mode = InputMode::DateTo;
            }
            Action::EditKeyword => {
                if self.view_mode == ViewMode::List {
                    self.input_mode = InputMode::Keyword;
                }
            }
            Action::ClearFilters => {
                let ticket = self.controller.clear_filters();
                if ticket.is_some() {
                    self.notify_info("Filters cleared");
                }
                self.dispatch(ticket);
            }
            Action::CollectNow => self.request_collection(CollectionKind::Immediate),
            Action::CollectHistorical => self.request_collection(CollectionKind::Historical),
            Action::DismissBanner => self.controller.dismiss_banner(),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::ClearNotification => self.clear_notification(),
            Action::ListLoaded { generation, result } => {
                match self.controller.apply_fetch(generation, result) {
                    FetchApplied::Applied => {
                        let selected = match self.controller.articles().is_empty() {
                            true => None,
                            false => Some(0),
                        };
                        self.list_state.select(selected);
                    }
                    FetchApplied::Clamped(ticket) => {
                        self.list_state.select(None);
                        self.spawn_fetch(ticket);
                    }
                    FetchApplied::Failed | FetchApplied::Stale => {}
                }
            }
            Action::ArticleLoaded { id, result } => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.apply(id, result);
                } else {
                    tracing::debug!(id, "detail closed before article arrived");
                }
            }
            Action::CollectionFinished { kind, result } => {
                let (resolution, ticket) = self.controller.complete_collection(kind, result);
                self.notification = Some(resolution.notification);
                self.dispatch(ticket);
            }
            Action::SchedulerStatusLoaded(result) => match result {
                Ok(status) => self.scheduler_status = Some(status),
                Err(e) => tracing::warn!("Scheduler status unavailable: {}", e),
            },
            Action::TodayLoaded(result) => match result {
                Ok(today) => self.today_count = Some(today.articles.len()),
                Err(e) => tracing::warn!("Today's articles unavailable: {}", e),
            },
        }
    }

    fn request_collection(&mut self, kind: CollectionKind) {
        match self.controller.request_collection(kind) {
            TriggerDecision::Start(kind) => self.spawn_collection(kind),
            TriggerDecision::Confirm { kind, .. } => {
                tracing::debug!(%kind, "awaiting confirmation");
            }
            TriggerDecision::Rejected => {
                if self.controller.collection_state().any_in_flight() {
                    self.notify_warning("A collection is already running");
                }
            }
        }
    }

    fn open_detail(&mut self, id: u32) {
        self.view_mode = ViewMode::Detail;
        self.detail = Some(DetailView::open(id));

        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api.get_article(id).await;
            let _ = tx.send(Action::ArticleLoaded { id, result });
        });
    }

    fn dispatch(&self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = load_list(&api, &ticket.query).await;
            let _ = tx.send(Action::ListLoaded {
                generation: ticket.generation,
                result,
            });
        });
    }

    fn spawn_collection(&self, kind: CollectionKind) {
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = match kind {
                CollectionKind::Immediate => api
                    .trigger_collection()
                    .await
                    .map(CollectionOutcome::Immediate),
                CollectionKind::Historical => api
                    .trigger_historical_collection()
                    .await
                    .map(CollectionOutcome::Historical),
            };
            let _ = tx.send(Action::CollectionFinished { kind, result });
        });
    }

    fn spawn_startup_info(&self) {
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let (status, today) =
                futures::join!(api.scheduler_status(), api.list_today_articles());
            let _ = tx.send(Action::SchedulerStatusLoaded(status));
            let _ = tx.send(Action::TodayLoaded(today));
        });
    }

    pub fn selected_article(&self) -> Option<&ArticleSummary> {
        self.list_state
            .selected()
            .and_then(|i| self.controller.articles().get(i))
    }

    fn current_url(&self) -> Option<String> {
        let url = match self.view_mode {
            ViewMode::List => self.selected_article().map(|a| a.url.clone()),
            ViewMode::Detail => self
                .detail
                .as_ref()
                .and_then(|d| d.article())
                .map(|a| a.summary.url.clone()),
        };
        url.filter(|url| !url.is_empty())
    }

    fn scroll_detail(&mut self, down: bool) {
        if let Some(detail) = self.detail.as_mut() {
            match down {
                true => detail.scroll_down(),
                false => detail.scroll_up(),
            }
        }
    }

    fn select_next(&mut self) {
        let len = self.controller.articles().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        let len = self.controller.articles().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) => len - 1,
            Some(i) => (i - 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn get_spinner_char(&self) -> &'static str {
        const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER_FRAMES[self.spinner_state % SPINNER_FRAMES.len()]
    }

    pub fn loading_description(&self) -> Option<String> {
        let collection = self.controller.collection_state();
        if collection.historical_in_flight {
            return Some(CollectionKind::Historical.busy_label());
        }
        if collection.immediate_in_flight {
            return Some(CollectionKind::Immediate.busy_label());
        }
        if let Some(detail) = &self.detail
            && detail.state == crate::internal::detail::DetailState::Loading
        {
            return Some("Loading article...".to_string());
        }
        self.controller
            .is_loading()
            .then(|| "Loading articles...".to_string())
    }

    pub fn ui(&mut self, f: &mut Frame) {
        super::view::draw(self, f);
    }
}

/// Next value when stepping through `options`: none, each option in order, then none again.
pub fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(value) => options
            .iter()
            .position(|o| o == value)
            .and_then(|i| options.get(i + 1))
            .cloned(),
    }
}

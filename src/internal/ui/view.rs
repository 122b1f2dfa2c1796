use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use super::app::{Action, App, InputMode, ViewMode};
use super::keybindings::KeyBindingContext;
use crate::internal::collection::CollectionKind;
use crate::internal::detail::DetailState;
use crate::internal::models::ArticleSummary;
use crate::internal::notification::NotificationType;
use crate::utils::datetime::format_published;

/// Keywords shown per article in the list.
const MAX_KEYWORDS: usize = 5;

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let start = std::time::Instant::now();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_top_bar(app, f, chunks[0]);

    match app.view_mode {
        ViewMode::List => render_list_screen(app, f, chunks[1]),
        ViewMode::Detail => render_detail(app, f, chunks[1]),
    }

    render_status_bar(app, f, chunks[2]);

    if matches!(app.input_mode, InputMode::DateFrom | InputMode::DateTo) {
        render_date_overlay(app, f);
    }

    if let Some(kind) = app.controller.pending_confirmation() {
        render_confirmation(app, f, kind);
    }

    if app.show_help {
        render_help_overlay(app, f);
    }

    if app.notification.is_some() {
        render_notification(app, f);
    }

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?start.elapsed(), "render.draw");
    }
}

/// Wrap `text` to `width` columns; blank input gives no lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

fn padded_block(app: &App) -> Block<'static> {
    Block::default().padding(Padding::new(
        app.config.ui.padding.horizontal,
        app.config.ui.padding.horizontal,
        app.config.ui.padding.vertical,
        app.config.ui.padding.vertical,
    ))
}

fn bordered(app: &App, title: impl Into<Line<'static>>) -> Block<'static> {
    padded_block(app)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
        .title(title)
        .title_style(Style::default().fg(app.theme.foreground))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4)).max(1);
    let height = height.min(area.height.saturating_sub(2)).max(1);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let scheduler = match &app.scheduler_status {
        Some(status) => {
            let mut text = format!("Scheduler: {}", status.status);
            if let Some(time) = &status.collection_time {
                text.push_str(&format!(" ({})", time));
            }
            text
        }
        None => String::new(),
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Paragraph::new(Line::from(vec![
        Span::styled(
            "Medical News",
            Style::default()
                .fg(app.theme.foreground)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  v{}", app.app_version),
            Style::default().fg(app.theme.muted),
        ),
    ]))
    .block(padded_block(app).style(Style::default().bg(app.theme.background)));

    let right = Paragraph::new(scheduler)
        .alignment(Alignment::Right)
        .block(padded_block(app).style(Style::default().bg(app.theme.background)))
        .style(Style::default().fg(app.theme.muted));

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn render_list_screen(app: &mut App, f: &mut Frame, area: Rect) {
    let view_start = std::time::Instant::now();

    let banner_height = match app.controller.banner() {
        Some(_) => 3,
        None => 0,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(banner) = app.controller.banner() {
        render_banner(app, f, chunks[0], banner);
    }
    render_stats(app, f, chunks[1]);
    render_filter_bar(app, f, chunks[2]);
    render_articles(app, f, chunks[3]);
    render_page_indicator(app, f, chunks[4]);

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?view_start.elapsed(), view = "list", "render.list");
    }
}

fn render_banner(app: &App, f: &mut Frame, area: Rect, banner: &str) {
    let p = Paragraph::new(banner.to_string())
        .style(Style::default().fg(app.theme.error))
        .block(
            padded_block(app)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.error))
                .title(" Error (Esc to dismiss) "),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn collect_label(app: &App, kind: CollectionKind, key: &str) -> Span<'static> {
    let state = app.controller.collection_state();
    match (state.is_running(kind), app.controller.collection_controls_enabled()) {
        (true, _) => Span::styled(
            format!("{} {}", app.get_spinner_char(), kind.busy_label()),
            Style::default()
                .fg(app.theme.confidence)
                .add_modifier(Modifier::BOLD),
        ),
        (false, true) => Span::styled(
            format!("[{}] {}", key, kind.idle_label()),
            Style::default().fg(app.theme.foreground),
        ),
        (false, false) => Span::styled(
            format!("[{}] {}", key, kind.idle_label()),
            Style::default().fg(app.theme.muted),
        ),
    }
}

fn render_stats(app: &App, f: &mut Frame, area: Rect) {
    let stats = &app.controller.snapshot().stats;
    let number = Style::default()
        .fg(app.theme.confidence)
        .add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::raw("Total "),
        Span::styled(stats.total_articles.to_string(), number),
        Span::raw("   Today "),
        Span::styled(stats.today_articles.to_string(), number),
        Span::raw("   Categories "),
        Span::styled(stats.category_total().to_string(), number),
        Span::raw("   "),
    ];
    spans.push(collect_label(app, CollectionKind::Immediate, "C"));
    spans.push(Span::raw("  "));
    spans.push(collect_label(app, CollectionKind::Historical, "H"));

    let p = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(app.theme.foreground))
        .block(bordered(app, " Overview "));
    f.render_widget(p, area);
}

fn render_filter_bar(app: &App, f: &mut Frame, area: Rect) {
    let filters = app.controller.filters();
    let label = Style::default().fg(app.theme.muted);
    let value = Style::default().fg(app.theme.foreground);
    let or_all = |v: Option<&str>| v.unwrap_or("All").to_string();
    let or_dash = |d: Option<jiff::civil::Date>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());

    let mut spans = vec![
        Span::styled("Category ", label),
        Span::styled(or_all(filters.category.as_deref()), value),
        Span::styled("  Source ", label),
        Span::styled(or_all(filters.source.as_deref()), value),
        Span::styled("  From ", label),
        Span::styled(or_dash(filters.date_from), value),
        Span::styled("  To ", label),
        Span::styled(or_dash(filters.date_to), value),
        Span::styled("  Search ", label),
    ];

    let editing = app.input_mode == InputMode::Keyword;
    let draft_style = match editing {
        true => Style::default()
            .fg(app.theme.selection_fg)
            .bg(app.theme.selection_bg),
        false => value,
    };
    let mut draft = filters.keyword_draft.clone();
    if editing {
        draft.push('█');
    }
    spans.push(Span::styled(draft, draft_style));

    let pending = filters.keyword_draft.trim() != filters.keyword_committed.as_deref().unwrap_or("");
    if editing || pending {
        spans.push(Span::styled(
            "  (Enter to search)",
            Style::default()
                .fg(app.theme.muted)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let p = Paragraph::new(Line::from(spans)).block(bordered(app, " Filters "));
    f.render_widget(p, area);
}

fn article_item(app: &App, article: &ArticleSummary, width: usize) -> ListItem<'static> {
    let mut title_spans = Vec::new();
    if let Some(category) = &article.category {
        title_spans.push(Span::styled(
            format!("[{}] ", category),
            Style::default().fg(app.theme.category),
        ));
    }
    if let Some(percent) = article.confidence_percent() {
        title_spans.push(Span::styled(
            format!("{}% ", percent),
            Style::default().fg(app.theme.confidence),
        ));
    }
    title_spans.push(Span::styled(
        article.title.clone(),
        Style::default()
            .fg(app.theme.foreground)
            .add_modifier(Modifier::BOLD),
    ));

    let mut lines = vec![Line::from(title_spans)];

    if let Some(first) = wrap_text(&article.description, width.saturating_sub(4)).first() {
        lines.push(Line::from(Span::styled(
            format!("  {}", first),
            Style::default().fg(app.theme.foreground),
        )));
    }

    let date = article
        .published_at
        .as_deref()
        .map(format_published)
        .unwrap_or_default();
    let meta = match (article.source.is_empty(), date.is_empty()) {
        (false, false) => format!("  {} • {}", article.source, date),
        (false, true) => format!("  {}", article.source),
        (true, false) => format!("  {}", date),
        (true, true) => String::new(),
    };
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(
            meta,
            Style::default().fg(app.theme.muted),
        )));
    }

    if app.config.ui.show_keywords && !article.keywords.is_empty() {
        let tags = article
            .keywords
            .iter()
            .take(MAX_KEYWORDS)
            .map(|k| format!("#{}", k))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::from(Span::styled(
            format!("  {}", tags),
            Style::default().fg(app.theme.keyword),
        )));
    }

    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn render_articles(app: &mut App, f: &mut Frame, area: Rect) {
    let block = bordered(app, " Articles ");

    if app.controller.articles().is_empty() {
        let text = match (app.controller.has_loaded(), app.controller.is_loading()) {
            (false, true) => format!("{} Loading articles...", app.get_spinner_char()),
            _ => "No articles to show".to_string(),
        };
        let p = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let width = block.inner(area).width as usize;
    let shared: &App = app;
    let items: Vec<ListItem> = shared
        .controller
        .articles()
        .iter()
        .map(|article| article_item(shared, article, width))
        .collect();

    let list = List::new(items)
        .block(block)
        .style(Style::default().bg(app.theme.background))
        .highlight_style(
            Style::default()
                .bg(app.theme.selection_bg)
                .fg(app.theme.selection_fg),
        );

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_page_indicator(app: &App, f: &mut Frame, area: Rect) {
    let pagination = app.controller.pagination();
    let prev = match pagination.has_prev() {
        true => "◀ ",
        false => "  ",
    };
    let next = match pagination.has_next() {
        true => " ▶",
        false => "  ",
    };
    let p = Paragraph::new(format!(
        "{}page {} / {}{}",
        prev, pagination.page, pagination.total_pages, next
    ))
    .alignment(Alignment::Center)
    .style(Style::default().fg(app.theme.muted));
    f.render_widget(p, area);
}

fn render_detail(app: &App, f: &mut Frame, area: Rect) {
    let Some(detail) = &app.detail else {
        return;
    };

    let back_hint = Line::from(Span::styled(
        "Press Esc to return to the list",
        Style::default().fg(app.theme.muted),
    ));

    let (title, lines) = match &detail.state {
        DetailState::Loading => (
            " Article ".to_string(),
            vec![Line::from(format!(
                "{} Loading article...",
                app.get_spinner_char()
            ))],
        ),
        DetailState::NotFound => (
            " Not found ".to_string(),
            vec![
                Line::from(Span::styled(
                    format!("Article {} was not found.", detail.article_id),
                    Style::default()
                        .fg(app.theme.error)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                back_hint,
            ],
        ),
        DetailState::Failed(message) => (
            " Error ".to_string(),
            vec![
                Line::from(Span::styled(
                    "Failed to load the article.",
                    Style::default()
                        .fg(app.theme.error)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(message.clone()),
                Line::from(""),
                back_hint,
            ],
        ),
        DetailState::Loaded(article) => {
            let summary = &article.summary;
            let mut meta = Vec::new();
            if let Some(category) = &summary.category {
                meta.push(category.clone());
            }
            if !summary.source.is_empty() {
                meta.push(summary.source.clone());
            }
            if let Some(date) = &summary.published_at {
                meta.push(format_published(date));
            }
            if let Some(author) = article.author.as_deref().filter(|a| !a.is_empty()) {
                meta.push(author.to_string());
            }
            if let Some(percent) = summary.confidence_percent() {
                meta.push(format!("confidence {}%", percent));
            }

            let mut lines = vec![
                Line::from(Span::styled(
                    summary.title.clone(),
                    Style::default()
                        .fg(app.theme.foreground)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )),
                Line::from(Span::styled(
                    meta.join(" • "),
                    Style::default().fg(app.theme.muted),
                )),
                Line::from(Span::styled(
                    summary.url.clone(),
                    Style::default().fg(app.theme.link),
                )),
                Line::from(""),
            ];

            let body = article
                .content
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(summary.description.as_str());
            for paragraph in body.split('\n') {
                lines.push(Line::from(paragraph.to_string()));
            }

            if !summary.keywords.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    summary
                        .keywords
                        .iter()
                        .map(|k| format!("#{}", k))
                        .collect::<Vec<_>>()
                        .join(" "),
                    Style::default().fg(app.theme.keyword),
                )));
            }
            (" Article ".to_string(), lines)
        }
    };

    let p = Paragraph::new(lines)
        .style(
            Style::default()
                .fg(app.theme.foreground)
                .bg(app.theme.background),
        )
        .block(bordered(app, title))
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));
    f.render_widget(p, area);
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let status = match (&app.input_mode, app.loading_description(), &app.view_mode) {
        (InputMode::Keyword, _, _) => "Search: type a keyword | Enter: Search | Esc: Done".to_string(),
        (InputMode::DateFrom | InputMode::DateTo, _, _) => {
            "Date: YYYY-MM-DD, empty clears | Enter: Apply | Esc: Cancel".to_string()
        }
        (_, Some(desc), _) => format!("{} {}", app.get_spinner_char(), desc),
        (_, None, ViewMode::List) => {
            let today = app
                .today_count
                .map(|n| format!(" | Today: {}", n))
                .unwrap_or_default();
            format!(
                "j/k: Nav | Enter: Open | n/p: Page | c/s: Category/Source | f/t: Dates | /: Search | x: Clear | r: Refresh | ?: Help | q: Quit{}",
                today
            )
        }
        (_, None, ViewMode::Detail) => "Esc/q: Back | j/k: Scroll | o: Browser | ?: Help".to_string(),
    };

    let p = Paragraph::new(status)
        .block(padded_block(app).style(Style::default().bg(app.theme.selection_bg)))
        .style(Style::default().fg(app.theme.selection_fg));
    f.render_widget(p, area);
}

fn render_date_overlay(app: &App, f: &mut Frame) {
    let title = match app.input_mode {
        InputMode::DateFrom => " Date from ",
        _ => " Date to ",
    };
    let popup_area = centered_rect(40, 3, f.area());
    let p = Paragraph::new(format!("{}█", app.input_buffer))
        .style(Style::default().fg(app.theme.foreground).bg(app.theme.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.selection_bg))
                .title(title),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(p, popup_area);
}

fn render_confirmation(app: &App, f: &mut Frame, kind: CollectionKind) {
    let prompt = kind.confirmation_prompt().unwrap_or_default();
    let mut lines: Vec<Line> = prompt.lines().map(|l| Line::from(l.trim().to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[y] ", Style::default().fg(app.theme.success)),
        Span::raw("Start   "),
        Span::styled("[n] ", Style::default().fg(app.theme.error)),
        Span::raw("Cancel"),
    ]));

    let popup_area = centered_rect(64, lines.len() as u16 + 2, f.area());
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.foreground).bg(app.theme.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.selection_bg))
                .title(" Confirm "),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, popup_area);
    f.render_widget(p, popup_area);
}

fn render_notification(app: &App, f: &mut Frame) {
    let Some(notification) = &app.notification else {
        return;
    };
    let area = f.area();

    let bg_color = match notification.notification_type {
        NotificationType::Info => Color::Blue,
        NotificationType::Warning => Color::Yellow,
        NotificationType::Error => Color::Red,
    };

    if !notification.requires_ack {
        let width = (notification.message().chars().count() as u16).saturating_add(4);
        let popup_area = centered_rect(width, 3, area);
        let popup = Paragraph::new(notification.message().to_string())
            .style(
                Style::default()
                    .bg(bg_color)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border))
                    .title(notification.title.clone()),
            )
            .alignment(Alignment::Center);
        f.render_widget(Clear, popup_area);
        f.render_widget(popup, popup_area);
        return;
    }

    let width = 60u16.min(area.width.saturating_sub(4)).max(10);
    let mut lines: Vec<Line> = wrap_text(notification.message(), width.saturating_sub(4) as usize)
        .into_iter()
        .map(Line::from)
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Enter to close",
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    let popup_area = centered_rect(width, lines.len() as u16 + 2, area);
    let popup = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.foreground).bg(app.theme.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(bg_color))
                .title(format!(" {} ", notification.title))
                .title_style(Style::default().fg(bg_color).add_modifier(Modifier::BOLD)),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn action_label(action: &Action) -> &'static str {
    match action {
        Action::Quit => "Quit",
        Action::NavigateUp => "Move up",
        Action::NavigateDown => "Move down",
        Action::Enter => "Open article",
        Action::Back => "Back",
        Action::OpenBrowser => "Open in browser",
        Action::ScrollUp => "Scroll up",
        Action::ScrollDown => "Scroll down",
        Action::Refresh => "Refresh",
        Action::NextPage => "Next page",
        Action::PrevPage => "Previous page",
        Action::CycleCategory => "Next category",
        Action::CycleSource => "Next source",
        Action::EditDateFrom => "Set start date",
        Action::EditDateTo => "Set end date",
        Action::EditKeyword => "Edit search keyword",
        Action::ClearFilters => "Clear all filters",
        Action::CollectNow => "Collect now",
        Action::CollectHistorical => "Collect past 7 days",
        Action::DismissBanner => "Dismiss error banner",
        Action::ToggleHelp => "Toggle help",
        Action::ClearNotification => "Dismiss notification",
        _ => "",
    }
}

fn render_help_overlay(app: &App, f: &mut Frame) {
    let popup_area = centered_rect(56, 40, f.area());
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.selection_bg))
        .title(" Keyboard Shortcuts (Esc/q to close) ")
        .title_style(
            Style::default()
                .fg(app.theme.selection_fg)
                .bg(app.theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .padding(Padding::new(
            app.config.ui.padding.horizontal,
            app.config.ui.padding.horizontal,
            app.config.ui.padding.vertical,
            app.config.ui.padding.vertical,
        ))
        .style(Style::default().bg(app.theme.background));

    let heading = Style::default()
        .add_modifier(Modifier::BOLD)
        .fg(app.theme.selection_bg);
    let key_style = Style::default().fg(app.theme.muted);

    let mut lines = Vec::new();
    for (name, context) in [
        ("Global", KeyBindingContext::Global),
        ("Article list", KeyBindingContext::List),
        ("Article detail", KeyBindingContext::Detail),
    ] {
        lines.push(Line::from(Span::styled(name, heading)));
        for (key, action) in app.keybindings.describe(context) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{:<10}", key), key_style),
                Span::raw(action_label(&action)),
            ]));
        }
        lines.push(Line::from(""));
    }

    let p = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.foreground))
        .block(block);
    f.render_widget(p, popup_area);
}

use std::{
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flock_core::{
    history::{interpret, Part},
    models::{Card, CardSet, GameModel},
    rules::{
        available_actions, board_cards, display_order, hand_cards, CardAction, CardContext,
        SetOrdering, HAND_LIMIT,
    },
    sync::{ConnectionState, Inbound, Intent, PendingState, SyncController, TransportEvent},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Hand,
    Board,
}

#[derive(Debug, Clone)]
enum Modal {
    Actions {
        card: Card,
        actions: Vec<CardAction>,
        cursor: usize,
    },
    Recipient {
        card_id: String,
        action: CardAction,
        players: Vec<(usize, String)>,
        cursor: usize,
    },
}

impl Modal {
    fn len(&self) -> usize {
        match self {
            Modal::Actions { actions, .. } => actions.len(),
            Modal::Recipient { players, .. } => players.len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self {
            Modal::Actions { cursor, .. } | Modal::Recipient { cursor, .. } => cursor,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end for a Flock game.
pub struct FlockApp {
    controller: SyncController,
    transport_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    set_ordering: SetOrdering,
    focus: Focus,
    cursor: usize,
    modal: Option<Modal>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl FlockApp {
    pub fn new(controller: SyncController, set_ordering: SetOrdering) -> Self {
        Self {
            controller,
            transport_rx: None,
            set_ordering,
            focus: Focus::Hand,
            cursor: 0,
            modal: None,
            status: "Waiting for the server".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub fn attach_transport(&mut self, receiver: mpsc::UnboundedReceiver<TransportEvent>) {
        self.transport_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut transport_rx = self.transport_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if let Some(rx) = transport_rx.as_mut() {
                let mut transport_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_transport = rx.recv() => {
                        match maybe_transport {
                            Some(event) => self.handle_transport_event(event),
                            None => transport_closed = true,
                        }
                    }
                }
                if transport_closed {
                    warn!("Transport channel closed");
                    self.status = "Connection closed".to_string();
                    transport_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.controller.disconnect().await
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        let snapshot = matches!(event, TransportEvent::Message(Inbound::StateUpdate(_)));
        if let TransportEvent::Error(message) = &event {
            self.status = format!("Server trouble, retrying: {message}");
        }
        self.controller.handle(event);
        if snapshot {
            self.clamp_cursor();
            // The card behind an open menu may have moved or vanished.
            self.modal = None;
            self.status = "Board updated".to_string();
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if let Err(err) = self.handle_key(key) {
                    error!(?err, "Key handling failed");
                    self.status = format!("Error: {err}");
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.controller.dismiss_alert();
            }
            KeyCode::Tab => self.switch_tab(1),
            KeyCode::BackTab => self.switch_tab(-1),
            KeyCode::Char('h') | KeyCode::Left => self.set_focus(Focus::Hand),
            KeyCode::Char('b') | KeyCode::Right => self.set_focus(Focus::Board),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Enter => self.open_actions(),
            KeyCode::Char('d') => self.send_intent(Intent::Draw),
            KeyCode::Char('e') => self.send_intent(Intent::EndTurn),
            KeyCode::Char('R') => self.send_intent(Intent::Restart),
            KeyCode::Char('o') => {
                self.set_ordering = self.set_ordering.toggled();
                self.clamp_cursor();
                self.status = format!("Sets shown in {}", self.set_ordering.label());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(mut modal) = self.modal.take() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('j') | KeyCode::Down => {
                let len = modal.len();
                let cursor = modal.cursor_mut();
                *cursor = (*cursor + 1).min(len.saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let cursor = modal.cursor_mut();
                *cursor = cursor.saturating_sub(1);
            }
            KeyCode::Enter => {
                match modal {
                    Modal::Actions {
                        card,
                        actions,
                        cursor,
                    } => {
                        if let Some(action) = actions.get(cursor) {
                            self.choose_action(&card, action.clone());
                        }
                    }
                    Modal::Recipient {
                        card_id,
                        action,
                        players,
                        cursor,
                    } => {
                        let recipient = players.get(cursor).map(|(player, _)| *player);
                        if let Some(intent) = action.to_intent(&card_id, recipient) {
                            self.send_intent(intent);
                        }
                    }
                }
                return Ok(());
            }
            _ => {}
        }
        self.modal = Some(modal);
        Ok(())
    }

    fn choose_action(&mut self, card: &Card, action: CardAction) {
        if action.needs_recipient() {
            let players: Vec<(usize, String)> = {
                let model = self.controller.model();
                model
                    .players
                    .iter()
                    .cloned()
                    .enumerate()
                    .filter(|(player, _)| Some(*player) != model.player_id)
                    .collect()
            };
            if players.is_empty() {
                self.status = "Nobody to give to".to_string();
                return;
            }
            self.modal = Some(Modal::Recipient {
                card_id: card.id.clone(),
                action,
                players,
                cursor: 0,
            });
            return;
        }
        if let Some(intent) = action.to_intent(&card.id, None) {
            self.send_intent(intent);
        }
    }

    fn send_intent(&mut self, intent: Intent) {
        let description = intent.describe();
        match self.controller.send(intent) {
            Ok(()) => {
                info!(intent = %description, "Intent sent");
                self.status = format!("Sent: {description}");
            }
            Err(err) => {
                error!(?err, intent = %description, "Intent failed");
                self.status = format!("Could not send {description}: {err}");
            }
        }
    }

    fn switch_tab(&mut self, delta: isize) {
        self.controller.cycle_tab(delta);
        self.focus = Focus::Board;
        self.cursor = 0;
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            self.focus = focus;
            self.cursor = 0;
        }
    }

    fn selectable(&self, model: &GameModel) -> Vec<(Card, CardContext)> {
        let cards = match self.focus {
            Focus::Hand => hand_cards(&model.hand),
            Focus::Board => model
                .active_board()
                .map(|board| board_cards(board, self.set_ordering))
                .unwrap_or_default(),
        };
        cards
            .into_iter()
            .map(|(card, context)| (card.clone(), context))
            .collect()
    }

    fn move_cursor(&mut self, delta: isize) {
        let total = {
            let model = self.controller.model();
            self.selectable(&model).len()
        };
        if total == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, total as isize - 1);
        self.cursor = next as usize;
    }

    fn clamp_cursor(&mut self) {
        self.move_cursor(0);
    }

    fn open_actions(&mut self) {
        let model = self.controller.model();
        let cards = self.selectable(&model);
        let Some((card, context)) = cards.get(self.cursor).cloned() else {
            drop(model);
            self.status = "No card selected".to_string();
            return;
        };
        if self.focus == Focus::Board && !model.viewing_own_board() {
            drop(model);
            self.status = "Only your own board can be changed".to_string();
            return;
        }
        let actions = available_actions(&card, context, model.own_board());
        drop(model);

        if actions.is_empty() {
            self.status = format!("Nothing to do with {}", card.display_name());
        } else {
            self.modal = Some(Modal::Actions {
                card,
                actions,
                cursor: 0,
            });
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
                Constraint::Length(8),
                Constraint::Length(4),
            ])
            .split(area);

        let model = self.controller.model();
        self.render_tabs(frame, rows[0], &model);
        self.render_board(frame, rows[1], &model);
        self.render_hand(frame, rows[2], &model);
        self.render_log(frame, rows[3], &model);
        self.render_status(frame, rows[4], &model);

        if let Some(modal) = &self.modal {
            self.render_modal(frame, area, modal, &model);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect, model: &GameModel) {
        let titles: Vec<Line> = model
            .players
            .iter()
            .enumerate()
            .map(|(player, name)| {
                if Some(player) == model.player_id {
                    Line::from(format!("{name} (you)"))
                } else {
                    Line::from(name.clone())
                }
            })
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Players"))
            .select(model.active_player_tab)
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_board(&self, frame: &mut Frame, area: Rect, model: &GameModel) {
        let title = format!(
            "{}'s board · {}",
            model.player_name(model.active_player_tab),
            self.set_ordering.label()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(self.focus_style(Focus::Board));

        let Some(board) = model.active_board() else {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                "No board yet",
                Style::default().fg(self.theme.muted),
            )))
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let mut index = 0;
        let mut lines = Vec::new();
        for set in display_order(&board.sets, self.set_ordering) {
            lines.push(self.set_line(set, &mut index));
        }
        if board.sets.is_empty() {
            lines.push(Line::from(Span::styled(
                "No sets placed",
                Style::default().fg(self.theme.muted),
            )));
        }

        let mut store = vec![Span::styled(
            format!("Store ({} energy): ", board.stored_energy()),
            Style::default().fg(self.theme.accent),
        )];
        for card in &board.store {
            store.push(self.card_span(card, self.is_selected(Focus::Board, index)));
            store.push(Span::raw(" "));
            index += 1;
        }
        lines.push(Line::from(store));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn set_line(&self, set: &CardSet, index: &mut usize) -> Line<'static> {
        let marker = if set.is_complete() { "■ " } else { "□ " };
        let header_style = if set.is_complete() {
            Style::default().fg(self.theme.success)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        let mut spans = vec![Span::styled(
            format!("{marker}{:<10}", set.group_key()),
            header_style,
        )];

        for card in &set.members {
            spans.push(self.card_span(card, self.is_selected(Focus::Board, *index)));
            spans.push(Span::raw(" "));
            *index += 1;
        }

        let active = set.active_charge_index();
        for (position, charge) in set.charges.iter().enumerate() {
            if position > 0 {
                spans.push(Span::styled(" → ", Style::default().fg(self.theme.muted)));
            }
            let style = if Some(position) == active {
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            spans.push(Span::styled(charge.to_string(), style));
        }

        for card in &set.enhancers {
            spans.push(Span::raw(" + "));
            spans.push(self.card_span(card, self.is_selected(Focus::Board, *index)));
            *index += 1;
        }
        Line::from(spans)
    }

    fn render_hand(&self, frame: &mut Frame, area: Rect, model: &GameModel) {
        let mut title = format!("Hand ({}/{HAND_LIMIT})", model.hand.len());
        if model.hand_overfull() {
            title.push_str(" · over the limit, discard");
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(self.focus_style(Focus::Hand));

        let mut spans = Vec::new();
        for (index, card) in model.hand.iter().enumerate() {
            spans.push(self.card_span(card, self.is_selected(Focus::Hand, index)));
            spans.push(Span::raw(" "));
        }
        if spans.is_empty() {
            spans.push(Span::styled("Empty", Style::default().fg(self.theme.muted)));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect, model: &GameModel) {
        let block = Block::default().borders(Borders::ALL).title("History");
        let items: Vec<ListItem> = match interpret(&model.log, &model.players) {
            Ok(lines) => lines
                .into_iter()
                .map(|line| {
                    let mine = Some(line.actor) == model.player_id;
                    let spans: Vec<Span> = line
                        .parts
                        .into_iter()
                        .map(|part| match part {
                            Part::Player(name) => Span::styled(
                                name,
                                Style::default()
                                    .fg(if mine {
                                        self.theme.success
                                    } else {
                                        self.theme.accent
                                    })
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Part::Card(card) => Span::styled(
                                card.to_string(),
                                Style::default().fg(self.theme.warning),
                            ),
                            Part::Text(text) => Span::raw(text),
                        })
                        .collect();
                    ListItem::new(Line::from(spans))
                })
                .collect(),
            Err(err) => {
                vec![ListItem::new(Line::from(Span::styled(
                    format!("History unavailable: {err}"),
                    Style::default().fg(self.theme.danger),
                )))]
            }
        };
        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, model: &GameModel) {
        let state = self.controller.state();
        let state_style = match state {
            ConnectionState::Registered => Style::default().fg(self.theme.success),
            ConnectionState::Disconnected => Style::default().fg(self.theme.danger),
            ConnectionState::Connecting | ConnectionState::Connected => {
                Style::default().fg(self.theme.warning)
            }
        };
        let mut first = vec![
            Span::styled(state.label().to_string(), state_style),
            Span::raw(format!(
                " · playing as {}",
                model.player_name(self.controller.player_index())
            )),
        ];
        match self.controller.pending(Instant::now()) {
            PendingState::Idle => {}
            PendingState::Waiting(intent) => first.push(Span::styled(
                format!(" · waiting on {}", intent.describe()),
                Style::default().fg(self.theme.muted),
            )),
            PendingState::Overdue(intent) => first.push(Span::styled(
                format!(" · no answer to {} yet", intent.describe()),
                Style::default().fg(self.theme.danger),
            )),
        }

        let second = match &model.alert {
            Some(alert) => Line::from(Span::styled(
                format!(
                    "[{}] {} (Esc to dismiss)",
                    alert.received_at.format("%H:%M:%S"),
                    alert.message
                ),
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )),
            None => Line::from(self.status.clone()),
        };

        let block = Block::default().borders(Borders::ALL).title(
            "Status · Tab boards · h/b hand/board · j/k move · Enter act · d draw · e end · o order · q quit",
        );
        let paragraph = Paragraph::new(vec![Line::from(first), second])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_modal(&self, frame: &mut Frame, area: Rect, modal: &Modal, model: &GameModel) {
        let (title, labels, cursor) = match modal {
            Modal::Actions {
                card,
                actions,
                cursor,
            } => (
                card.compact_label(),
                actions
                    .iter()
                    .map(|action| action_label(action, card))
                    .collect::<Vec<_>>(),
                *cursor,
            ),
            Modal::Recipient {
                players, cursor, ..
            } => (
                "Give to".to_string(),
                players
                    .iter()
                    .map(|(player, name)| match model.board(*player) {
                        Some(board) => format!("{name} ({} sets)", board.sets.len()),
                        None => name.clone(),
                    })
                    .collect(),
                *cursor,
            ),
        };

        let width = labels
            .iter()
            .map(|label| label.chars().count())
            .chain(std::iter::once(title.chars().count()))
            .max()
            .unwrap_or(10) as u16
            + 6;
        let height = labels.len() as u16 + 2;
        let modal_area = centered_rect(width, height, area);

        let items: Vec<ListItem> = labels.into_iter().map(ListItem::new).collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(cursor));

        frame.render_widget(Clear, modal_area);
        frame.render_stateful_widget(list, modal_area, &mut state);
    }

    fn is_selected(&self, focus: Focus, index: usize) -> bool {
        self.modal.is_none() && self.focus == focus && self.cursor == index
    }

    fn focus_style(&self, focus: Focus) -> Style {
        if self.focus == focus {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        }
    }

    fn card_span(&self, card: &Card, selected: bool) -> Span<'static> {
        let mut style = card_style(card);
        if selected {
            style = style
                .bg(self.theme.selection_bg)
                .fg(self.theme.selection_fg);
        }
        Span::styled(format!("[{}]", card.compact_label()), style)
    }
}

fn action_label(action: &CardAction, card: &Card) -> String {
    match action {
        CardAction::Flip if !card.alt_charges.is_empty() => {
            let ladder = card
                .alt_charges
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" → ");
            format!("Flip to {} ({ladder})", card.sets.get(1).map_or("other set", String::as_str))
        }
        other => other.label(),
    }
}

fn card_style(card: &Card) -> Style {
    let fg = match card.sets.first().map(String::as_str) {
        Some("red") => Color::Red,
        Some("green") => Color::Green,
        Some("yellow") => Color::Yellow,
        Some("orange") => Color::LightRed,
        Some("blue") | Some("cornflowerblue") => Color::LightBlue,
        Some("purple") => Color::Magenta,
        _ => Color::Reset,
    };
    let style = Style::default().fg(fg);
    if card.light_text.is_some() {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

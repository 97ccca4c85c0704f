// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use taller_app::{
    AppCommand, AppEvent, AppMode, AppState, CLIENTE_NO_ENCONTRADO, Cliente, DirectoryKind,
    DirectoryView, EmptyState, EstadoOt, FormKind, FormModal, FormPayload, OrdenId, OrdenTrabajo,
    OrderCard, OrderField, OrderListView, ShopContext, StatusChangeModal, StatusTab, TabKind,
    VehicleLookup, Vehiculo,
};
use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const VEHICLE_SHORTCUTS: usize = 9;

/// Persistence seam. Every mutation goes through here first; the in-memory
/// context only changes after the runtime accepted the write.
pub trait AppRuntime {
    fn load_context(&mut self) -> Result<ShopContext>;
    fn create_orden(&mut self, orden: &OrdenTrabajo) -> Result<()>;
    fn change_order_status(&mut self, id: &OrdenId, estado: EstadoOt) -> Result<()>;
    fn create_cliente(&mut self, cliente: &Cliente) -> Result<()>;
    fn create_vehiculo(&mut self, vehiculo: &Vehiculo) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Cursors {
    ordenes: usize,
    clientes: usize,
    vehiculos: usize,
}

impl Cursors {
    fn get(&self, tab: TabKind) -> usize {
        match tab {
            TabKind::Dashboard => 0,
            TabKind::Ordenes => self.ordenes,
            TabKind::Clientes => self.clientes,
            TabKind::Vehiculos => self.vehiculos,
        }
    }

    fn get_mut(&mut self, tab: TabKind) -> Option<&mut usize> {
        match tab {
            TabKind::Dashboard => None,
            TabKind::Ordenes => Some(&mut self.ordenes),
            TabKind::Clientes => Some(&mut self.clientes),
            TabKind::Vehiculos => Some(&mut self.vehiculos),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    ctx: ShopContext,
    orders: OrderListView,
    clientes: DirectoryView,
    vehiculos: DirectoryView,
    cursors: Cursors,
    status_modal: Option<StatusChangeModal>,
    form: Option<FormModal>,
    detail: Option<OrdenId>,
    help_visible: bool,
    status_token: u64,
    today: Date,
}

impl ViewData {
    fn new(ctx: ShopContext, today: Date) -> Self {
        Self {
            ctx,
            orders: OrderListView::default(),
            clientes: DirectoryView::new(DirectoryKind::Clientes),
            vehiculos: DirectoryView::new(DirectoryKind::Vehiculos),
            cursors: Cursors::default(),
            status_modal: None,
            form: None,
            detail: None,
            help_visible: false,
            status_token: 0,
            today,
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    let mut view_data = ViewData::new(ShopContext::default(), today());
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = reload_context(runtime, &mut view_data) {
        warn!("initial load failed: {error:#}");
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error:#}")));
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(state, runtime, &mut view_data, &internal_tx, key)
        {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    info!("session closed");
    result
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn dispatch(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::TabChanged(_)))
    {
        view_data.detail = None;
        clamp_cursors(view_data);
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(
        state,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn reload_context<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    let ctx = runtime.load_context()?;
    log_lookup_misses(&ctx);
    view_data.ctx = ctx;
    view_data.detail = None;
    clamp_cursors(view_data);
    Ok(())
}

fn log_lookup_misses(ctx: &ShopContext) {
    for orden in ctx.ordenes() {
        let lookup = VehicleLookup::resolve(ctx.vehiculos(), ctx.clientes(), &orden.vehiculo_id);
        match lookup.vehiculo() {
            None => debug!(
                orden = %orden.id,
                vehiculo = %orden.vehiculo_id,
                "vehicle not found for order"
            ),
            Some(vehiculo) if !lookup.is_complete() => debug!(
                orden = %orden.id,
                cliente = %vehiculo.cliente_id,
                "client not found for order vehicle"
            ),
            Some(_) => {}
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        AppMode::StatusChange => {
            handle_status_modal_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Form(_) => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Search => {
            handle_search_key(state, view_data, internal_tx, key);
            false
        }
        AppMode::Nav if view_data.detail.is_some() => {
            handle_detail_key(state, view_data, internal_tx, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => dispatch(state, view_data, internal_tx, AppCommand::NextTab),
        KeyCode::BackTab => dispatch(state, view_data, internal_tx, AppCommand::PrevTab),
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('/') => dispatch(state, view_data, internal_tx, AppCommand::EnterSearch),
        KeyCode::Char('j') | KeyCode::Down => move_cursor(view_data, state.active_tab, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(view_data, state.active_tab, -1),
        KeyCode::Char(']') => cycle_status_filter(state, view_data, internal_tx, 1),
        KeyCode::Char('[') => cycle_status_filter(state, view_data, internal_tx, -1),
        KeyCode::Char('n') => match form_for_tab(state.active_tab) {
            Some(kind) => open_form(state, view_data, internal_tx, kind),
            None => emit_status(
                state,
                view_data,
                internal_tx,
                "switch to Órdenes, Clientes or Vehículos to add records",
            ),
        },
        KeyCode::Char('s') => {
            if state.active_tab != TabKind::Ordenes {
                return false;
            }
            match selected_order(view_data) {
                Some(orden) => open_status_change(state, view_data, internal_tx, &orden),
                None => emit_status(state, view_data, internal_tx, "no order selected"),
            }
        }
        KeyCode::Enter => {
            if state.active_tab == TabKind::Ordenes
                && let Some(orden) = selected_order(view_data)
            {
                view_data.detail = Some(orden.id);
            }
        }
        KeyCode::Char('r') => match reload_context(runtime, view_data) {
            Ok(()) => emit_status(state, view_data, internal_tx, "reloaded"),
            Err(error) => {
                warn!("reload failed: {error:#}");
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("reload failed: {error:#}"),
                );
            }
        },
        _ => {}
    }
    false
}

fn handle_detail_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => view_data.detail = None,
        KeyCode::Char('s') => {
            let orden = view_data
                .detail
                .take()
                .and_then(|id| view_data.ctx.find_orden(&id).cloned());
            match orden {
                Some(orden) => open_status_change(state, view_data, internal_tx, &orden),
                None => emit_status(state, view_data, internal_tx, "order is gone -- reload"),
            }
        }
        _ => {}
    }
}

fn handle_search_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let tab = state.active_tab;
    match key.code {
        KeyCode::Esc => {
            set_search(view_data, tab, String::new());
            dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
        }
        KeyCode::Enter => dispatch(state, view_data, internal_tx, AppCommand::ExitToNav),
        KeyCode::Backspace => match tab {
            TabKind::Ordenes => {
                view_data.orders.pop_search_char();
            }
            TabKind::Clientes => {
                view_data.clientes.pop_search_char();
            }
            TabKind::Vehiculos => {
                view_data.vehiculos.pop_search_char();
            }
            TabKind::Dashboard => {}
        },
        KeyCode::Char(value) => match tab {
            TabKind::Ordenes => view_data.orders.push_search_char(value),
            TabKind::Clientes => view_data.clientes.push_search_char(value),
            TabKind::Vehiculos => view_data.vehiculos.push_search_char(value),
            TabKind::Dashboard => {}
        },
        _ => {}
    }
    clamp_cursors(view_data);
}

fn set_search(view_data: &mut ViewData, tab: TabKind, search: String) {
    match tab {
        TabKind::Ordenes => view_data.orders.set_search(search),
        TabKind::Clientes => view_data.clientes.set_search(search),
        TabKind::Vehiculos => view_data.vehiculos.set_search(search),
        TabKind::Dashboard => {}
    }
}

fn cycle_status_filter(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    if state.active_tab != TabKind::Ordenes {
        emit_status(
            state,
            view_data,
            internal_tx,
            "status tabs live on Órdenes de Trabajo",
        );
        return;
    }
    let filter = view_data.orders.cycle_filter(delta);
    view_data.cursors.ordenes = 0;
    debug!(filter = filter.label(), "status filter changed");
}

fn visible_len(view_data: &ViewData, tab: TabKind) -> usize {
    match tab {
        TabKind::Dashboard => 0,
        TabKind::Ordenes => view_data.orders.visible(view_data.ctx.ordenes()).len(),
        TabKind::Clientes => view_data.clientes.visible_len(&view_data.ctx),
        TabKind::Vehiculos => view_data.vehiculos.visible_len(&view_data.ctx),
    }
}

fn move_cursor(view_data: &mut ViewData, tab: TabKind, delta: isize) {
    let len = visible_len(view_data, tab);
    let Some(cursor) = view_data.cursors.get_mut(tab) else {
        return;
    };
    if len == 0 {
        *cursor = 0;
        return;
    }
    *cursor = (*cursor as isize + delta).clamp(0, len as isize - 1) as usize;
}

fn clamp_cursors(view_data: &mut ViewData) {
    for tab in [TabKind::Ordenes, TabKind::Clientes, TabKind::Vehiculos] {
        let len = visible_len(view_data, tab);
        if let Some(cursor) = view_data.cursors.get_mut(tab) {
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
    }
}

fn selected_order(view_data: &ViewData) -> Option<OrdenTrabajo> {
    view_data
        .orders
        .visible(view_data.ctx.ordenes())
        .get(view_data.cursors.ordenes)
        .copied()
        .cloned()
}

fn open_status_change(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    orden: &OrdenTrabajo,
) {
    match view_data.orders.open_status_change(orden, &view_data.ctx) {
        Ok(modal) => {
            view_data.status_modal = Some(modal);
            dispatch(state, view_data, internal_tx, AppCommand::OpenStatusChange);
        }
        Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
    }
}

fn handle_status_modal_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => cancel_status_change(state, view_data, internal_tx),
        KeyCode::Enter => confirm_status_change(state, runtime, view_data, internal_tx),
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(modal) = view_data.status_modal.as_mut() {
                modal.move_selection(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(modal) = view_data.status_modal.as_mut() {
                modal.move_selection(-1);
            }
        }
        _ => {}
    }
}

fn cancel_status_change(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Some(modal) = view_data.status_modal.take() {
        modal.cancel();
    }
    view_data.orders.close_status_change();
    dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
}

fn confirm_status_change<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(modal) = view_data.status_modal.take() else {
        dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
        return;
    };

    let outcome = modal.confirm(|id, estado| {
        apply_status_change(runtime, view_data, id, estado)
            .map(|changed| (id.clone(), estado, changed))
    });
    view_data.orders.close_status_change();
    dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);

    let message = match outcome {
        Ok((id, estado, true)) => format!("{id} -> {}", estado.label()),
        Ok((id, estado, false)) => format!("{id} already {}", estado.label()),
        Err(error) => {
            warn!("status change failed: {error:#}");
            format!("status change failed: {error:#}")
        }
    };
    emit_status(state, view_data, internal_tx, message);
}

fn apply_status_change<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    id: &OrdenId,
    estado: EstadoOt,
) -> Result<bool> {
    let current = view_data.ctx.validate_status_change(id, estado)?;
    if current == estado {
        return Ok(false);
    }
    runtime
        .change_order_status(id, estado)
        .with_context(|| format!("save status of {id}"))?;
    Ok(view_data
        .orders
        .status_confirmed(&mut view_data.ctx, id, estado)?)
}

fn form_for_tab(tab: TabKind) -> Option<FormKind> {
    match tab {
        TabKind::Dashboard => None,
        TabKind::Ordenes => Some(FormKind::Orden),
        TabKind::Clientes => Some(FormKind::Cliente),
        TabKind::Vehiculos => Some(FormKind::Vehiculo),
    }
}

fn open_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FormKind,
) {
    if kind == FormKind::Orden {
        view_data.orders.open_create();
    }
    view_data.detail = None;
    view_data.form = Some(FormModal::open(kind, view_data.today));
    dispatch(state, view_data, internal_tx, AppCommand::OpenForm(kind));
}

fn close_form(state: &mut AppState, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.form = None;
    view_data.orders.close_create();
    dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
        return;
    };

    match key.code {
        KeyCode::Esc => close_form(state, view_data, internal_tx),
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx),
        KeyCode::Tab | KeyCode::Down => form.focus(1),
        KeyCode::BackTab | KeyCode::Up => form.focus(-1),
        KeyCode::Left => form.cycle(-1, &view_data.ctx),
        KeyCode::Right => form.cycle(1, &view_data.ctx),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(value) => {
            if form.focused_is_choice(&view_data.ctx) {
                match value {
                    '+' | ' ' => form.cycle(1, &view_data.ctx),
                    '-' => form.cycle(-1, &view_data.ctx),
                    digit @ '1'..='9' => {
                        select_vehicle_shortcut(form, digit, &view_data.ctx);
                    }
                    _ => {}
                }
            } else {
                form.input_char(value);
            }
        }
        _ => {}
    }
}

fn select_vehicle_shortcut(form: &mut FormModal, digit: char, ctx: &ShopContext) -> bool {
    let FormModal::Orden(modal) = form else {
        return false;
    };
    if modal.focused() != OrderField::Vehiculo {
        return false;
    }
    let Some(number) = digit.to_digit(10) else {
        return false;
    };
    modal.select_vehicle(number as usize - 1, ctx.vehiculos())
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let submitted = match view_data.form.as_mut() {
        Some(form) => form.submit(&view_data.ctx, view_data.today, |payload| payload),
        None => return,
    };
    let payload = match submitted {
        Ok(payload) => payload,
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("{error:#}"));
            return;
        }
    };

    let kind = payload.kind();
    match persist_payload(runtime, view_data, payload) {
        Ok(message) => {
            close_form(state, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            warn!("{} failed: {error:#}", kind.label());
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn persist_payload<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    payload: FormPayload,
) -> Result<String> {
    match payload {
        FormPayload::Orden(orden) => {
            runtime
                .create_orden(&orden)
                .with_context(|| format!("save order {}", orden.id))?;
            let id = orden.id.clone();
            view_data.orders.order_created(&mut view_data.ctx, orden);
            if let Some(index) = view_data
                .orders
                .visible(view_data.ctx.ordenes())
                .iter()
                .position(|orden| orden.id == id)
            {
                view_data.cursors.ordenes = index;
            }
            log_lookup_misses(&view_data.ctx);
            Ok(format!("order {id} created"))
        }
        FormPayload::Cliente(cliente) => {
            runtime
                .create_cliente(&cliente)
                .with_context(|| format!("save client {}", cliente.id))?;
            let id = cliente.id.clone();
            view_data.ctx.push_cliente(cliente);
            Ok(format!("client {id} created"))
        }
        FormPayload::Vehiculo(vehiculo) => {
            runtime
                .create_vehiculo(&vehiculo)
                .with_context(|| format!("save vehicle {}", vehiculo.placa))?;
            let placa = vehiculo.placa.clone();
            view_data.ctx.push_vehiculo(vehiculo);
            Ok(format!("vehicle {placa} created"))
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| format!(" {} ", tab.label()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("taller").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.active_tab {
        TabKind::Dashboard => {
            let body = Paragraph::new(render_dashboard_text(&view_data.ctx))
                .block(Block::default().borders(Borders::ALL).title("dashboard"));
            frame.render_widget(body, layout[1]);
        }
        TabKind::Ordenes => render_orders(frame, layout[1], state, view_data),
        TabKind::Clientes | TabKind::Vehiculos => {
            render_directory(frame, layout[1], state, view_data);
        }
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(id) = &view_data.detail {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let text = match view_data.ctx.find_orden(id) {
            Some(orden) => render_detail_text(orden, &view_data.ctx),
            None => format!("order {id} is gone -- press esc and reload"),
        };
        let detail = Paragraph::new(text)
            .block(Block::default().title(id.to_string()).borders(Borders::ALL));
        frame.render_widget(detail, area);
    }

    if let Some(modal) = &view_data.status_modal {
        let area = centered_rect(44, 60, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(render_status_modal_text(modal)).block(
            Block::default()
                .title("cambiar estado")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(body, area);
    }

    if let Some(form) = &view_data.form {
        let area = centered_rect(64, 70, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(render_form_text(form, &view_data.ctx)).block(
            Block::default()
                .title(form.kind().label())
                .borders(Borders::ALL),
        );
        frame.render_widget(body, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_search_line(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    search: &str,
    placeholder: &str,
) {
    let active = state.mode == AppMode::Search;
    let text = if active {
        format!("{search}_")
    } else if search.is_empty() {
        placeholder.to_owned()
    } else {
        search.to_owned()
    };
    let style = if active || !search.is_empty() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let widget = Paragraph::new(text)
        .style(style)
        .block(Block::default().title("/ buscar").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_orders(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(area);

    render_search_line(
        frame,
        chunks[0],
        state,
        view_data.orders.search(),
        "Buscar por número de orden...",
    );

    let status_tabs = view_data.orders.tabs(view_data.ctx.ordenes());
    let selected = status_tabs
        .iter()
        .position(|tab| tab.selected)
        .unwrap_or(0);
    let titles = status_tabs.iter().map(status_tab_title).collect::<Vec<_>>();
    let window = status_tab_window(
        &titles,
        selected,
        usize::from(chunks[1].width.saturating_sub(2)),
    );
    let strip_title = if window.len() == titles.len() {
        "estado [ ]".to_owned()
    } else {
        format!("estado [ ] {}-{}/{}", window.start + 1, window.end, titles.len())
    };
    let tabs = Tabs::new(titles[window.clone()].to_vec())
        .block(Block::default().title(strip_title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected - window.start);
    frame.render_widget(tabs, chunks[1]);

    let cards = view_data.orders.cards(&view_data.ctx);
    if let Some(empty) = view_data.orders.empty_state(cards.len()) {
        let body = Paragraph::new(empty_state_text(empty)).block(
            Block::default()
                .title(TabKind::Ordenes.label())
                .borders(Borders::ALL),
        );
        frame.render_widget(body, chunks[2]);
        return;
    }

    let rows = cards
        .iter()
        .map(|card| {
            let vehicle_style = if card.references_resolved {
                Style::default()
            } else {
                Style::default().fg(Color::Red)
            };
            vec![
                Cell::from(card.id.to_string()),
                Cell::from(card.vehicle_line.clone()).style(vehicle_style),
                Cell::from(card.client_name.clone().unwrap_or_default()).style(vehicle_style),
                Cell::from(card.estado.label())
                    .style(Style::default().fg(estado_color(card.estado))),
                Cell::from(card.ingreso.clone()),
                Cell::from(card.odometro.clone()),
                Cell::from(card.combustible),
                Cell::from(card.entrega_estimada.clone().unwrap_or_default()),
                Cell::from(card.fotos.clone()),
            ]
        })
        .collect::<Vec<_>>();

    render_rows(
        frame,
        chunks[2],
        TabKind::Ordenes.label(),
        &[
            "Orden",
            "Vehículo",
            "Cliente",
            "Estado",
            "Ingreso",
            "Odómetro",
            "Comb.",
            "Entrega",
            "Fotos",
        ],
        vec![
            Constraint::Length(9),
            Constraint::Min(22),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
        rows,
        view_data.cursors.ordenes,
    );
}

fn render_directory(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);
    let tab = state.active_tab;
    let (view, placeholder) = if tab == TabKind::Clientes {
        (&view_data.clientes, "Buscar por nombre, documento o email...")
    } else {
        (&view_data.vehiculos, "Buscar por placa, marca o línea...")
    };
    render_search_line(frame, chunks[0], state, view.search(), placeholder);

    let visible = view.visible_len(&view_data.ctx);
    if let Some(message) = view.empty_message(visible) {
        let body = Paragraph::new(message)
            .block(Block::default().title(tab.label()).borders(Borders::ALL));
        frame.render_widget(body, chunks[1]);
        return;
    }

    if tab == TabKind::Clientes {
        let rows = view
            .cliente_rows(&view_data.ctx)
            .into_iter()
            .map(|row| {
                vec![
                    Cell::from(row.id),
                    Cell::from(row.nombre),
                    Cell::from(row.documento),
                    Cell::from(row.telefono),
                    Cell::from(row.email),
                    Cell::from(row.registro),
                    Cell::from(row.comunicaciones),
                    Cell::from(row.vehiculos.to_string()),
                ]
            })
            .collect();
        render_rows(
            frame,
            chunks[1],
            tab.label(),
            &[
                "ID",
                "Nombre",
                "Documento",
                "Teléfono",
                "Email",
                "Registro",
                "Comunicaciones",
                "Vehículos",
            ],
            vec![
                Constraint::Length(9),
                Constraint::Min(18),
                Constraint::Length(16),
                Constraint::Length(14),
                Constraint::Min(18),
                Constraint::Length(10),
                Constraint::Length(24),
                Constraint::Length(9),
            ],
            rows,
            view_data.cursors.get(tab),
        );
    } else {
        let rows = view
            .vehiculo_rows(&view_data.ctx)
            .into_iter()
            .map(|row| {
                let owner_style = if row.propietario == CLIENTE_NO_ENCONTRADO {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                vec![
                    Cell::from(row.id),
                    Cell::from(row.placa),
                    Cell::from(row.marca),
                    Cell::from(row.linea_modelo),
                    Cell::from(row.anio),
                    Cell::from(row.color),
                    Cell::from(row.propietario).style(owner_style),
                    Cell::from(row.ordenes.to_string()),
                ]
            })
            .collect();
        render_rows(
            frame,
            chunks[1],
            tab.label(),
            &[
                "ID",
                "Placa",
                "Marca",
                "Línea",
                "Año",
                "Color",
                "Propietario",
                "Órdenes",
            ],
            vec![
                Constraint::Length(9),
                Constraint::Length(8),
                Constraint::Min(12),
                Constraint::Min(14),
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Min(18),
                Constraint::Length(8),
            ],
            rows,
            view_data.cursors.get(tab),
        );
    }
}

fn render_rows(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    columns: &[&'static str],
    widths: Vec<Constraint>,
    rows: Vec<Vec<Cell<'static>>>,
    selected: usize,
) {
    let header = Row::new(columns.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let table = Table::new(rows.into_iter().map(Row::new), widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(Block::default().title(title.to_owned()).borders(Borders::ALL));
    // The table scrolls its offset so the selected row stays on screen.
    let mut table_state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn status_tab_title(tab: &StatusTab) -> String {
    format!("{} ({})", tab.filter.label(), tab.count)
}

/// Run of status tabs that fits in `available` columns and always contains
/// `selected`. Leading tabs are dropped first, then trailing ones.
fn status_tab_window(titles: &[String], selected: usize, available: usize) -> Range<usize> {
    if titles.is_empty() {
        return 0..0;
    }
    let selected = selected.min(titles.len() - 1);
    // One column of padding on each side of a title, one divider between titles.
    let strip_width = |range: Range<usize>| {
        let dividers = range.len().saturating_sub(1);
        titles[range]
            .iter()
            .map(|title| title.chars().count() + 2)
            .sum::<usize>()
            + dividers
    };

    let mut start = 0;
    while start < selected && strip_width(start..selected + 1) > available {
        start += 1;
    }
    let mut end = selected + 1;
    while end < titles.len() && strip_width(start..end + 1) <= available {
        end += 1;
    }
    start..end
}

fn estado_color(estado: EstadoOt) -> Color {
    match estado {
        EstadoOt::Recepcion | EstadoOt::Diagnostico => Color::Blue,
        EstadoOt::Cotizado | EstadoOt::Aprobado => Color::Magenta,
        EstadoOt::EnProceso | EstadoOt::Pruebas => Color::Yellow,
        EstadoOt::Listo => Color::Green,
        EstadoOt::Entregado | EstadoOt::Cerrado => Color::DarkGray,
    }
}

fn empty_state_text(empty: EmptyState) -> String {
    let mut lines = vec![empty.title().to_owned(), empty.hint().to_owned()];
    if empty.offers_create() {
        lines.push(String::new());
        lines.push("n  crear primera orden".to_owned());
    }
    lines.join("\n")
}

fn render_dashboard_text(ctx: &ShopContext) -> String {
    let counts = ctx.dashboard_counts();
    let mut lines = vec![
        format!("Órdenes activas: {}", counts.ordenes_activas),
        format!("Listas para entrega: {}", counts.listas_para_entrega),
        format!("Clientes: {}", counts.clientes),
        format!("Vehículos: {}", counts.vehiculos),
        String::new(),
        "Por estado".to_owned(),
    ];
    lines.extend(
        EstadoOt::ALL
            .into_iter()
            .map(|estado| format!("  {:<12} {}", estado.label(), ctx.status_count(estado))),
    );
    lines.join("\n")
}

fn render_detail_text(orden: &OrdenTrabajo, ctx: &ShopContext) -> String {
    let card = OrderCard::build(orden, ctx);
    let mut lines = vec![
        format!("Estado: {}", card.estado.label()),
        format!("Vehículo: {}", card.vehicle_line),
    ];
    if let Some(cliente) = &card.client_name {
        lines.push(format!("Cliente: {cliente}"));
    }
    lines.push(format!("Ingreso: {}", card.ingreso));
    lines.push(format!("Odómetro: {}", card.odometro));
    lines.push(format!("Combustible: {}", card.combustible));
    if let Some(entrega) = &card.entrega_estimada {
        lines.push(format!("Entrega estimada: {entrega}"));
    }
    if let Some(observaciones) = &card.observaciones {
        lines.push(String::new());
        lines.push("Observaciones".to_owned());
        lines.push(format!("  {observaciones}"));
    }
    if !card.fotos.is_empty() {
        lines.push(String::new());
        lines.push(card.fotos.clone());
        lines.extend(orden.fotos_url.iter().map(|url| format!("  {url}")));
    }
    lines.push(String::new());
    lines.push("s cambiar estado | esc cerrar".to_owned());
    lines.join("\n")
}

fn render_status_modal_text(modal: &StatusChangeModal) -> String {
    let mut lines = vec![
        format!("Orden {}", modal.order_id()),
        format!("Estado actual: {}", modal.current().label()),
        String::new(),
    ];
    lines.extend(modal.options().iter().enumerate().map(|(index, estado)| {
        let marker = if index == modal.selected_index() {
            ">"
        } else {
            " "
        };
        format!("{marker} {}", estado.label())
    }));
    lines.push(String::new());
    lines.push("j/k move | enter confirm | esc cancel".to_owned());
    lines.join("\n")
}

fn render_form_text(form: &FormModal, ctx: &ShopContext) -> String {
    let mut lines = form
        .rows(ctx)
        .into_iter()
        .map(|row| {
            let marker = if row.focused { ">" } else { " " };
            let hint = if row.choice { "  [+/-]" } else { "" };
            format!("{marker} {}: {}{hint}", row.label, row.value)
        })
        .collect::<Vec<_>>();

    if let FormModal::Orden(modal) = form
        && modal.focused() == OrderField::Vehiculo
    {
        lines.push(String::new());
        if ctx.vehiculos().is_empty() {
            lines.push("no vehicles yet -- add one on the Vehículos tab".to_owned());
        }
        lines.extend(
            ctx.vehiculos()
                .iter()
                .take(VEHICLE_SHORTCUTS)
                .enumerate()
                .map(|(index, vehiculo)| format!("  {} {}", index + 1, vehiculo.display_line())),
        );
    }

    lines.push(String::new());
    lines.push("tab/shift+tab field | +/- choice | enter save | esc cancel".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "tab / shift+tab   switch section\n\
     j / k             move selection\n\
     / then type       search (enter keeps, esc clears)\n\
     ] / [             next / previous status tab\n\
     n                 new order, client or vehicle\n\
     s                 change status of the selected order\n\
     enter             order detail\n\
     r                 reload from storage\n\
     ?                 toggle help\n\
     q / ctrl+q        quit"
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let mode = mode_label(state.mode);
    let hints = key_hints(state, view_data);
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn key_hints(state: &AppState, view_data: &ViewData) -> &'static str {
    match state.mode {
        AppMode::Search => "type to filter | enter keep | esc clear",
        AppMode::Form(_) => "tab field | enter save | esc cancel",
        AppMode::StatusChange => "j/k move | enter confirm | esc cancel",
        AppMode::Nav if view_data.detail.is_some() => "s status | esc close",
        AppMode::Nav => match state.active_tab {
            TabKind::Dashboard => "tab switch | ? help | q quit",
            TabKind::Ordenes => {
                "j/k move | [ ] estado | / search | n new | s status | enter detail | ? help | q quit"
            }
            TabKind::Clientes | TabKind::Vehiculos => {
                "j/k move | / search | n new | ? help | q quit"
            }
        },
    }
}

fn mode_label(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
        AppMode::Form(_) => "FORM",
        AppMode::StatusChange => "STATUS",
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, empty_state_text, handle_key_event, reload_context,
        render, render_dashboard_text, render_detail_text, render_form_text,
        render_status_modal_text, status_tab_title, status_tab_window, status_text, visible_len,
    };
    use anyhow::{Result, bail};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc::{self, Sender};
    use taller_app::{
        AppMode, AppState, CLIENTE_NO_ENCONTRADO, Cliente, ClienteId, EmptyState, EstadoFilter,
        EstadoOt, FormKind, FormModal, NivelCombustible, OrdenId, OrdenTrabajo, ShopContext,
        TabKind, TipoDocumento, TransitionPolicy, VEHICULO_NO_ENCONTRADO, Vehiculo, VehiculoId,
    };
    use time::{Date, Month};

    #[derive(Debug, Default)]
    struct TestRuntime {
        ctx: ShopContext,
        fail_writes: bool,
        fail_loads: bool,
        ordenes: Vec<OrdenId>,
        status_changes: Vec<(OrdenId, EstadoOt)>,
        clientes: Vec<ClienteId>,
        vehiculos: Vec<VehiculoId>,
    }

    impl TestRuntime {
        fn with_context(ctx: ShopContext) -> Self {
            Self {
                ctx,
                ..Self::default()
            }
        }

        fn check_writable(&self) -> Result<()> {
            if self.fail_writes {
                bail!("disk I/O error");
            }
            Ok(())
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_context(&mut self) -> Result<ShopContext> {
            if self.fail_loads {
                bail!("database is locked");
            }
            Ok(self.ctx.clone())
        }

        fn create_orden(&mut self, orden: &OrdenTrabajo) -> Result<()> {
            self.check_writable()?;
            self.ordenes.push(orden.id.clone());
            Ok(())
        }

        fn change_order_status(&mut self, id: &OrdenId, estado: EstadoOt) -> Result<()> {
            self.check_writable()?;
            self.status_changes.push((id.clone(), estado));
            Ok(())
        }

        fn create_cliente(&mut self, cliente: &Cliente) -> Result<()> {
            self.check_writable()?;
            self.clientes.push(cliente.id.clone());
            Ok(())
        }

        fn create_vehiculo(&mut self, vehiculo: &Vehiculo) -> Result<()> {
            self.check_writable()?;
            self.vehiculos.push(vehiculo.id.clone());
            Ok(())
        }
    }

    fn date(day: u8) -> Date {
        Date::from_calendar_date(2026, Month::January, day).expect("valid date")
    }

    fn cliente() -> Cliente {
        Cliente {
            id: ClienteId::new("CLI-0001"),
            nombre: "Mariana Ospina".to_owned(),
            tipo_doc: TipoDocumento::Cc,
            numero_doc: "1037000111".to_owned(),
            telefono: "312 444 5566".to_owned(),
            email: Some("mariana@example.com".to_owned()),
            direccion: None,
            fecha_registro: date(3),
            consentimiento_comunicaciones: true,
        }
    }

    fn vehiculo(id: &str, cliente_id: &str, placa: &str) -> Vehiculo {
        Vehiculo {
            id: VehiculoId::new(id),
            cliente_id: ClienteId::new(cliente_id),
            marca: "Yamaha".to_owned(),
            linea_modelo: "XTZ 150".to_owned(),
            placa: placa.to_owned(),
            anio: Some(2022),
            color: None,
        }
    }

    fn orden(id: &str, vehiculo_id: &str, estado: EstadoOt) -> OrdenTrabajo {
        OrdenTrabajo {
            id: OrdenId::new(id),
            vehiculo_id: VehiculoId::new(vehiculo_id),
            fecha_ingreso: date(12),
            odometro_ingreso: 15_300,
            nivel_combustible: NivelCombustible::TresCuartos,
            fecha_estimada_entrega: Some(date(14)),
            observaciones: Some("Cambio de pastillas".to_owned()),
            fotos_url: vec!["https://fotos.example/1.jpg".to_owned()],
            estado,
        }
    }

    fn sample_context() -> ShopContext {
        ShopContext::new(
            vec![cliente()],
            vec![
                vehiculo("VEH-0001", "CLI-0001", "AAA11A"),
                vehiculo("VEH-0002", "CLI-0404", "BBB22B"),
            ],
            vec![
                orden("OT-0001", "VEH-0001", EstadoOt::Recepcion),
                orden("OT-0002", "VEH-0002", EstadoOt::Diagnostico),
                orden("OT-0003", "VEH-0404", EstadoOt::Listo),
            ],
        )
    }

    fn internal_tx() -> Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn loaded(runtime: &mut TestRuntime) -> ViewData {
        let mut view_data = ViewData::new(ShopContext::default(), date(15));
        reload_context(runtime, &mut view_data).expect("test runtime loads");
        view_data
    }

    fn press(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        code: KeyCode,
    ) -> bool {
        handle_key_event(
            state,
            runtime,
            view_data,
            &internal_tx(),
            KeyEvent::new(code, KeyModifiers::NONE),
        )
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        text: &str,
    ) {
        for value in text.chars() {
            press(state, runtime, view_data, KeyCode::Char(value));
        }
    }

    fn status_of(view_data: &ViewData, id: &str) -> Option<EstadoOt> {
        view_data
            .ctx
            .find_orden(&OrdenId::new(id))
            .map(|orden| orden.estado)
    }

    fn visible_ids(view_data: &ViewData) -> Vec<String> {
        view_data
            .orders
            .visible(view_data.ctx.ordenes())
            .iter()
            .map(|orden| orden.id.to_string())
            .collect()
    }

    #[test]
    fn tab_key_cycles_tabs() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        let should_quit = press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        assert!(!should_quit);
        assert_eq!(state.active_tab, TabKind::Clientes);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::BackTab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::BackTab);
        assert_eq!(state.active_tab, TabKind::Dashboard);
    }

    #[test]
    fn q_quits_from_nav_but_types_in_search() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        assert!(!press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('q')));
        assert_eq!(view_data.orders.search(), "q");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert!(press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('q')));
    }

    #[test]
    fn ctrl_q_quits_from_an_open_form() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        let should_quit = handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &internal_tx(),
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        );
        assert!(should_quit);
    }

    #[test]
    fn brackets_cycle_status_filter_and_reset_cursor() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        assert_eq!(view_data.cursors.ordenes, 1);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char(']'));
        assert_eq!(
            view_data.orders.filter(),
            EstadoFilter::Solo(EstadoOt::Recepcion)
        );
        assert_eq!(view_data.cursors.ordenes, 0);
        assert_eq!(visible_ids(&view_data), vec!["OT-0001"]);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('['));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('['));
        assert_eq!(
            view_data.orders.filter(),
            EstadoFilter::Solo(EstadoOt::Cerrado)
        );
        assert!(visible_ids(&view_data).is_empty());
        assert_eq!(
            view_data.orders.empty_state(0),
            Some(EmptyState::NoResults)
        );
    }

    #[test]
    fn search_filters_orders_case_insensitively() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        assert_eq!(state.mode, AppMode::Search);
        type_text(&mut state, &mut runtime, &mut view_data, "ot-0002");
        assert_eq!(visible_ids(&view_data), vec!["OT-0002"]);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(view_data.orders.search(), "ot-0002");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(view_data.orders.search(), "");
        assert_eq!(visible_ids(&view_data).len(), 3);
    }

    #[test]
    fn client_search_uses_directory_rules() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        type_text(&mut state, &mut runtime, &mut view_data, "MARI");
        assert_eq!(visible_len(&view_data, TabKind::Clientes), 1);

        type_text(&mut state, &mut runtime, &mut view_data, "zz");
        assert_eq!(visible_len(&view_data, TabKind::Clientes), 0);
        assert_eq!(
            view_data.clientes.empty_message(0),
            Some("No se encontraron clientes")
        );
    }

    #[test]
    fn status_change_persists_then_updates_context() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        assert_eq!(state.mode, AppMode::StatusChange);
        assert!(view_data.orders.is_status_change_open());
        let modal = view_data.status_modal.as_ref().expect("modal open");
        assert_eq!(modal.options()[0], EstadoOt::Diagnostico);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(
            runtime.status_changes,
            vec![(OrdenId::new("OT-0001"), EstadoOt::Cotizado)]
        );
        assert_eq!(status_of(&view_data, "OT-0001"), Some(EstadoOt::Cotizado));
        assert_eq!(status_of(&view_data, "OT-0002"), Some(EstadoOt::Diagnostico));
        assert_eq!(status_of(&view_data, "OT-0003"), Some(EstadoOt::Listo));
        assert_eq!(state.mode, AppMode::Nav);
        assert!(view_data.status_modal.is_none());
        assert!(!view_data.orders.is_status_change_open());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("Cotizado"))
        );
    }

    #[test]
    fn failed_status_write_leaves_context_untouched() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);
        runtime.fail_writes = true;
        let before = view_data.ctx.clone();

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(view_data.ctx, before);
        assert_eq!(state.mode, AppMode::Nav);
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.contains("status change failed"), "got {status}");
        assert!(status.contains("disk I/O error"), "got {status}");
    }

    #[test]
    fn esc_cancels_status_change_without_writing() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);

        assert!(runtime.status_changes.is_empty());
        assert!(view_data.status_modal.is_none());
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(status_of(&view_data, "OT-0001"), Some(EstadoOt::Recepcion));
    }

    #[test]
    fn lifecycle_policy_refuses_modal_for_closed_order() {
        let mut state = AppState::default();
        let ctx = ShopContext::new(
            vec![cliente()],
            vec![vehiculo("VEH-0001", "CLI-0001", "AAA11A")],
            vec![orden("OT-0009", "VEH-0001", EstadoOt::Cerrado)],
        )
        .with_policy(TransitionPolicy::Lifecycle);
        let mut runtime = TestRuntime::with_context(ctx);
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));

        assert_eq!(state.mode, AppMode::Nav);
        assert!(view_data.status_modal.is_none());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("no status change is available"))
        );
    }

    #[test]
    fn lifecycle_modal_offers_only_reachable_statuses() {
        let mut state = AppState::default();
        let mut runtime =
            TestRuntime::with_context(sample_context().with_policy(TransitionPolicy::Lifecycle));
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        let modal = view_data.status_modal.as_ref().expect("modal open");
        assert_eq!(modal.options(), &[EstadoOt::Diagnostico]);
        let text = render_status_modal_text(modal);
        assert!(text.contains("Estado actual: Recepción"));
        assert!(text.contains("> Diagnóstico"));
    }

    #[test]
    fn create_order_form_appends_after_persisting() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.mode, AppMode::Form(FormKind::Orden));
        assert!(view_data.orders.is_create_open());

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('1'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        type_text(&mut state, &mut runtime, &mut view_data, "12.500");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(runtime.ordenes, vec![OrdenId::new("OT-0004")]);
        let ordenes = view_data.ctx.ordenes();
        assert_eq!(ordenes.len(), 4);
        let created = &ordenes[3];
        assert_eq!(created.id.as_str(), "OT-0004");
        assert_eq!(created.vehiculo_id.as_str(), "VEH-0001");
        assert_eq!(created.estado, EstadoOt::Recepcion);
        assert_eq!(created.odometro_ingreso, 12_500);
        assert_eq!(created.fecha_ingreso, date(15));
        assert_eq!(created.nivel_combustible, NivelCombustible::Medio);
        assert_eq!(ordenes[..3], sample_context().ordenes()[..]);
        assert!(view_data.form.is_none());
        assert!(!view_data.orders.is_create_open());
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(view_data.cursors.ordenes, 3);
    }

    #[test]
    fn invalid_order_form_stays_open_with_error() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert!(runtime.ordenes.is_empty());
        assert!(view_data.form.is_some());
        assert_eq!(state.mode, AppMode::Form(FormKind::Orden));
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("choose a vehicle"))
        );
    }

    #[test]
    fn failed_order_write_keeps_form_and_context() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);
        runtime.fail_writes = true;

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('1'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        type_text(&mut state, &mut runtime, &mut view_data, "100");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(view_data.ctx.ordenes().len(), 3);
        assert!(view_data.form.is_some());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("save failed"))
        );
    }

    #[test]
    fn choice_fields_cycle_while_text_fields_take_dashes() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('+'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('+'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('+'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('-'));

        let Some(FormModal::Orden(modal)) = &view_data.form else {
            panic!("order form should be open");
        };
        assert_eq!(
            modal.input().vehiculo_id.as_ref().map(VehiculoId::as_str),
            Some("VEH-0002")
        );
        assert_eq!(modal.input().nivel_combustible, NivelCombustible::TresCuartos);
        assert_eq!(modal.input().fecha_ingreso, "2026-01-15-");
    }

    #[test]
    fn vehicle_shortcuts_are_listed_while_choosing() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        let form = view_data.form.as_ref().expect("form open");
        let text = render_form_text(form, &view_data.ctx);
        assert!(text.contains("  1 Yamaha XTZ 150 - AAA11A"));
        assert!(text.contains("  2 Yamaha XTZ 150 - BBB22B"));
    }

    #[test]
    fn client_form_creates_client() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.mode, AppMode::Form(FormKind::Cliente));

        type_text(&mut state, &mut runtime, &mut view_data, "Ana Ruiz");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        type_text(&mut state, &mut runtime, &mut view_data, "52000111");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        type_text(&mut state, &mut runtime, &mut view_data, "3001112233");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(runtime.clientes, vec![ClienteId::new("CLI-0002")]);
        assert_eq!(view_data.ctx.clientes().len(), 2);
        assert_eq!(view_data.ctx.clientes()[1].nombre, "Ana Ruiz");
        assert_eq!(state.mode, AppMode::Nav);
    }

    #[test]
    fn n_on_dashboard_explains_where_to_add() {
        let mut state = AppState {
            active_tab: TabKind::Dashboard,
            ..AppState::default()
        };
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.mode, AppMode::Nav);
        assert!(view_data.form.is_none());
        assert!(state.status_line.is_some());
    }

    #[test]
    fn enter_opens_detail_and_s_moves_to_status_change() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert_eq!(view_data.detail, Some(OrdenId::new("OT-0001")));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        assert!(view_data.detail.is_none());
        assert_eq!(state.mode, AppMode::StatusChange);
        assert_eq!(
            view_data
                .status_modal
                .as_ref()
                .map(|modal| modal.order_id().as_str()),
            Some("OT-0001")
        );
    }

    #[test]
    fn detail_text_uses_placeholders_for_missing_references() {
        let ctx = sample_context();
        let complete = render_detail_text(&ctx.ordenes()[0], &ctx);
        assert!(complete.contains("Vehículo: Yamaha XTZ 150 - AAA11A"));
        assert!(complete.contains("Cliente: Mariana Ospina"));
        assert!(complete.contains("Odómetro: 15.300 km"));
        assert!(complete.contains("Entrega estimada: 14/01/2026"));
        assert!(complete.contains("1 foto"));
        assert!(complete.contains("https://fotos.example/1.jpg"));

        let orphan_client = render_detail_text(&ctx.ordenes()[1], &ctx);
        assert!(orphan_client.contains("BBB22B"));
        assert!(orphan_client.contains(CLIENTE_NO_ENCONTRADO));

        let missing_vehicle = render_detail_text(&ctx.ordenes()[2], &ctx);
        assert!(missing_vehicle.contains(VEHICULO_NO_ENCONTRADO));
        assert!(!missing_vehicle.contains("Cliente:"));
    }

    #[test]
    fn empty_state_offers_create_only_without_criteria() {
        let no_orders = empty_state_text(EmptyState::NoOrders);
        assert!(no_orders.contains("No hay órdenes registradas"));
        assert!(no_orders.contains("crear primera orden"));

        let no_results = empty_state_text(EmptyState::NoResults);
        assert!(no_results.contains("No se encontraron órdenes"));
        assert!(!no_results.contains("crear primera orden"));
    }

    #[test]
    fn dashboard_text_reports_counts() {
        let text = render_dashboard_text(&sample_context());
        assert!(text.contains("Órdenes activas: 3"));
        assert!(text.contains("Listas para entrega: 1"));
        assert!(text.contains("Clientes: 1"));
        assert!(text.contains("Vehículos: 2"));
        assert!(text.contains("Diagnóstico"));
    }

    #[test]
    fn status_text_shows_mode_and_message() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);

        assert!(status_text(&state, &view_data).starts_with("NAV | "));
        state.status_line = Some("order OT-0004 created".to_owned());
        assert!(status_text(&state, &view_data).contains("order OT-0004 created"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('?'));
        assert!(status_text(&state, &view_data).is_empty());
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert!(!view_data.help_visible);
    }

    #[test]
    fn reload_failure_keeps_current_data() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);
        runtime.fail_loads = true;

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('r'));

        assert_eq!(view_data.ctx.ordenes().len(), 3);
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("database is locked"))
        );
    }

    #[test]
    fn every_tab_and_overlay_renders() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(sample_context());
        let mut view_data = loaded(&mut runtime);
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("test terminal");

        for tab in TabKind::ALL {
            state.active_tab = tab;
            terminal
                .draw(|frame| render(frame, &state, &view_data))
                .expect("draw tab");
        }

        state.active_tab = TabKind::Ordenes;
        terminal
            .draw(|frame| render(frame, &state, &view_data))
            .expect("draw orders");
        let screen = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        assert!(screen.contains("OT-0001"));
        assert!(screen.contains("Todas (3)"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        terminal
            .draw(|frame| render(frame, &state, &view_data))
            .expect("draw status modal");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        terminal
            .draw(|frame| render(frame, &state, &view_data))
            .expect("draw form");
    }

    fn busy_context(count: usize) -> ShopContext {
        let vehiculos = (1..=count)
            .map(|n| {
                vehiculo(
                    &format!("VEH-{n:04}"),
                    "CLI-0001",
                    &format!("MOT{n:02}A"),
                )
            })
            .collect();
        let ordenes = (1..=count)
            .map(|n| {
                orden(
                    &format!("OT-{n:04}"),
                    &format!("VEH-{n:04}"),
                    EstadoOt::ALL[n % EstadoOt::ALL.len()],
                )
            })
            .collect();
        ShopContext::new(vec![cliente()], vehiculos, ordenes)
    }

    fn draw_screen(
        terminal: &mut Terminal<TestBackend>,
        state: &AppState,
        view_data: &ViewData,
    ) -> String {
        terminal
            .draw(|frame| render(frame, state, view_data))
            .expect("draw screen");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn long_tables_keep_selected_row_on_screen() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::with_context(busy_context(30));
        let mut view_data = loaded(&mut runtime);
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).expect("test terminal");

        for _ in 0..29 {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('j'));
        }
        assert_eq!(view_data.cursors.ordenes, 29);
        let screen = draw_screen(&mut terminal, &state, &view_data);
        assert!(screen.contains("OT-0030"), "selected order is off screen");
        assert!(!screen.contains("OT-0001"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        assert_eq!(
            view_data
                .status_modal
                .as_ref()
                .map(|modal| modal.order_id().to_string()),
            Some("OT-0030".to_owned())
        );
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);

        state.active_tab = TabKind::Vehiculos;
        for _ in 0..29 {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('j'));
        }
        assert_eq!(view_data.cursors.vehiculos, 29);
        let screen = draw_screen(&mut terminal, &state, &view_data);
        assert!(screen.contains("MOT30A"), "selected vehicle is off screen");
        assert!(!screen.contains("MOT01A"));
    }

    #[test]
    fn selected_status_tab_renders_on_narrow_terminals() {
        for width in [80, 120] {
            let mut state = AppState::default();
            let mut runtime = TestRuntime::with_context(sample_context());
            let mut view_data = loaded(&mut runtime);
            let mut terminal =
                Terminal::new(TestBackend::new(width, 30)).expect("test terminal");

            for _ in 0..=EstadoOt::ALL.len() {
                let title = view_data
                    .orders
                    .tabs(view_data.ctx.ordenes())
                    .iter()
                    .find(|tab| tab.selected)
                    .map(status_tab_title)
                    .expect("one tab is selected");
                let screen = draw_screen(&mut terminal, &state, &view_data);
                assert!(
                    screen.contains(&title),
                    "{title} not rendered at {width} columns"
                );
                press(&mut state, &mut runtime, &mut view_data, KeyCode::Char(']'));
            }
            assert_eq!(view_data.orders.filter(), EstadoFilter::Todas);
        }
    }

    #[test]
    fn status_tab_window_slides_with_selection() {
        let titles = vec!["abcd".to_owned(); 10];
        assert_eq!(status_tab_window(&titles, 0, 200), 0..10);
        assert_eq!(status_tab_window(&titles, 0, 20), 0..3);
        assert_eq!(status_tab_window(&titles, 5, 20), 3..6);
        assert_eq!(status_tab_window(&titles, 9, 20), 7..10);
        assert_eq!(status_tab_window(&titles, 4, 5), 4..5);
        assert_eq!(status_tab_window(&[], 3, 80), 0..0);
    }
}

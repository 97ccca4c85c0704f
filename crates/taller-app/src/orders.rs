// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::format::{format_date, format_odometer, format_photo_count};
use crate::{
    EstadoOt, OrdenId, OrdenTrabajo, ShopContext, StatusChangeModal, VehicleLookup, WorkflowError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EstadoFilter {
    #[default]
    Todas,
    Solo(EstadoOt),
}

impl EstadoFilter {
    pub const TABS: [Self; 10] = [
        Self::Todas,
        Self::Solo(EstadoOt::Recepcion),
        Self::Solo(EstadoOt::Diagnostico),
        Self::Solo(EstadoOt::Cotizado),
        Self::Solo(EstadoOt::Aprobado),
        Self::Solo(EstadoOt::EnProceso),
        Self::Solo(EstadoOt::Pruebas),
        Self::Solo(EstadoOt::Listo),
        Self::Solo(EstadoOt::Entregado),
        Self::Solo(EstadoOt::Cerrado),
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Todas => "Todas",
            Self::Solo(estado) => estado.label(),
        }
    }

    pub fn matches(self, estado: EstadoOt) -> bool {
        match self {
            Self::Todas => true,
            Self::Solo(selected) => selected == estado,
        }
    }
}

pub fn matches_search(id: &OrdenId, search: &str) -> bool {
    search.is_empty() || id.as_str().to_lowercase().contains(&search.to_lowercase())
}

/// Orders passing both the id search and the status filter, in collection order.
pub fn filter_orders<'a>(
    ordenes: &'a [OrdenTrabajo],
    search: &str,
    filter: EstadoFilter,
) -> Vec<&'a OrdenTrabajo> {
    ordenes
        .iter()
        .filter(|orden| matches_search(&orden.id, search) && filter.matches(orden.estado))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTab {
    pub filter: EstadoFilter,
    pub count: usize,
    pub selected: bool,
}

/// One tab per filter; counts always come from the full collection.
pub fn status_tabs(ordenes: &[OrdenTrabajo], selected: EstadoFilter) -> Vec<StatusTab> {
    EstadoFilter::TABS
        .into_iter()
        .map(|filter| StatusTab {
            filter,
            count: ordenes
                .iter()
                .filter(|orden| filter.matches(orden.estado))
                .count(),
            selected: filter == selected,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoOrders,
    NoResults,
}

impl EmptyState {
    pub const fn title(self) -> &'static str {
        match self {
            Self::NoOrders => "No hay órdenes registradas",
            Self::NoResults => "No se encontraron órdenes",
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            Self::NoOrders => "Comienza creando tu primera orden de trabajo",
            Self::NoResults => "Intenta con otros criterios de búsqueda",
        }
    }

    pub const fn offers_create(self) -> bool {
        matches!(self, Self::NoOrders)
    }
}

/// Display projection of one order with its references resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCard {
    pub id: OrdenId,
    pub vehicle_line: String,
    pub client_name: Option<String>,
    pub estado: EstadoOt,
    pub ingreso: String,
    pub odometro: String,
    pub combustible: &'static str,
    pub entrega_estimada: Option<String>,
    pub observaciones: Option<String>,
    pub fotos: String,
    pub references_resolved: bool,
}

impl OrderCard {
    pub fn build(orden: &OrdenTrabajo, ctx: &ShopContext) -> Self {
        let lookup = VehicleLookup::resolve(ctx.vehiculos(), ctx.clientes(), &orden.vehiculo_id);
        Self {
            id: orden.id.clone(),
            vehicle_line: lookup.vehicle_line(),
            client_name: lookup.client_name().map(str::to_owned),
            estado: orden.estado,
            ingreso: format_date(orden.fecha_ingreso),
            odometro: format_odometer(orden.odometro_ingreso),
            combustible: orden.nivel_combustible.label(),
            entrega_estimada: orden
                .fecha_estimada_entrega
                .map(format_date),
            observaciones: orden
                .observaciones
                .as_deref()
                .filter(|text| !text.trim().is_empty())
                .map(str::to_owned),
            fotos: format_photo_count(orden.fotos_url.len()),
            references_resolved: lookup.is_complete(),
        }
    }
}

/// Session state of the work-order list: search text, status filter, and
/// which modal is open. Lost when the view is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderListView {
    search: String,
    filter: EstadoFilter,
    create_open: bool,
    status_target: Option<OrdenId>,
}

impl OrderListView {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn push_search_char(&mut self, value: char) {
        self.search.push(value);
    }

    pub fn pop_search_char(&mut self) -> Option<char> {
        self.search.pop()
    }

    pub fn filter(&self) -> EstadoFilter {
        self.filter
    }

    pub fn select_filter(&mut self, filter: EstadoFilter) {
        self.filter = filter;
    }

    pub fn cycle_filter(&mut self, delta: isize) -> EstadoFilter {
        let tabs = EstadoFilter::TABS;
        let current = tabs
            .iter()
            .position(|filter| *filter == self.filter)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(tabs.len() as isize) as usize;
        self.filter = tabs[next];
        self.filter
    }

    pub fn visible<'a>(&self, ordenes: &'a [OrdenTrabajo]) -> Vec<&'a OrdenTrabajo> {
        filter_orders(ordenes, &self.search, self.filter)
    }

    pub fn tabs(&self, ordenes: &[OrdenTrabajo]) -> Vec<StatusTab> {
        status_tabs(ordenes, self.filter)
    }

    pub fn cards(&self, ctx: &ShopContext) -> Vec<OrderCard> {
        self.visible(ctx.ordenes())
            .into_iter()
            .map(|orden| OrderCard::build(orden, ctx))
            .collect()
    }

    pub fn has_criteria(&self) -> bool {
        !self.search.is_empty() || self.filter != EstadoFilter::Todas
    }

    pub fn empty_state(&self, visible_len: usize) -> Option<EmptyState> {
        if visible_len > 0 {
            return None;
        }
        Some(if self.has_criteria() {
            EmptyState::NoResults
        } else {
            EmptyState::NoOrders
        })
    }

    pub fn is_create_open(&self) -> bool {
        self.create_open
    }

    pub fn open_create(&mut self) {
        self.status_target = None;
        self.create_open = true;
    }

    pub fn close_create(&mut self) {
        self.create_open = false;
    }

    pub fn status_target(&self) -> Option<&OrdenId> {
        self.status_target.as_ref()
    }

    pub fn is_status_change_open(&self) -> bool {
        self.status_target.is_some()
    }

    /// Opens the status-change modal scoped to `orden`'s current status.
    pub fn open_status_change(
        &mut self,
        orden: &OrdenTrabajo,
        ctx: &ShopContext,
    ) -> Result<StatusChangeModal, WorkflowError> {
        let modal = StatusChangeModal::new(orden.id.clone(), orden.estado, ctx.policy())?;
        self.create_open = false;
        self.status_target = Some(orden.id.clone());
        Ok(modal)
    }

    pub fn close_status_change(&mut self) {
        self.status_target = None;
    }

    /// Create-modal callback: appends `orden` to the context and closes the modal.
    pub fn order_created(&mut self, ctx: &mut ShopContext, orden: OrdenTrabajo) {
        ctx.push_orden(orden);
        self.create_open = false;
    }

    /// Status-modal callback: applies the change and closes the modal.
    pub fn status_confirmed(
        &mut self,
        ctx: &mut ShopContext,
        id: &OrdenId,
        estado: EstadoOt,
    ) -> Result<bool, WorkflowError> {
        let changed = ctx.change_order_status(id, estado)?;
        self.status_target = None;
        Ok(changed)
    }
}

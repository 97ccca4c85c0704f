// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::Date;
use tracing::debug;

use crate::format::consent_label;
use crate::forms::{ClienteFormInput, FormPayload, NewOrderFormInput, VehiculoFormInput};
use crate::lookup::ClientLookup;
use crate::{
    Cliente, EstadoOt, FormKind, NivelCombustible, OrdenId, OrdenTrabajo, ShopContext,
    TipoDocumento, TransitionPolicy, Vehiculo, WorkflowError,
};

/// Picks the next status for one order. Holds no shared state; the caller
/// applies the change from the confirm callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeModal {
    order_id: OrdenId,
    current: EstadoOt,
    options: Vec<EstadoOt>,
    selected: usize,
}

impl StatusChangeModal {
    pub fn new(
        order_id: OrdenId,
        current: EstadoOt,
        policy: TransitionPolicy,
    ) -> Result<Self, WorkflowError> {
        if order_id.is_empty() {
            return Err(WorkflowError::EmptyOrderId);
        }
        let options = policy.targets(current);
        if options.is_empty() {
            return Err(WorkflowError::NoTransitions(current));
        }
        Ok(Self {
            order_id,
            current,
            options,
            selected: 0,
        })
    }

    pub fn order_id(&self) -> &OrdenId {
        &self.order_id
    }

    pub fn current(&self) -> EstadoOt {
        self.current
    }

    pub fn options(&self) -> &[EstadoOt] {
        &self.options
    }

    pub fn selected(&self) -> EstadoOt {
        self.options[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.options.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    /// Selects `estado` if it is offered.
    pub fn select(&mut self, estado: EstadoOt) -> bool {
        match self.options.iter().position(|option| *option == estado) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// Consumes the modal and runs `on_confirm` once with the chosen status.
    pub fn confirm<R>(self, on_confirm: impl FnOnce(&OrdenId, EstadoOt) -> R) -> R {
        let estado = self.selected();
        debug!(orden = %self.order_id, to = estado.label(), "status change confirmed");
        on_confirm(&self.order_id, estado)
    }

    pub fn cancel(self) {
        debug!(orden = %self.order_id, "status change cancelled");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRow {
    pub label: &'static str,
    pub value: String,
    pub focused: bool,
    /// Cycled with +/- rather than typed.
    pub choice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Vehiculo,
    Odometro,
    Combustible,
    FechaIngreso,
    EntregaEstimada,
    Observaciones,
    Fotos,
}

impl OrderField {
    pub const ALL: [Self; 7] = [
        Self::Vehiculo,
        Self::Odometro,
        Self::Combustible,
        Self::FechaIngreso,
        Self::EntregaEstimada,
        Self::Observaciones,
        Self::Fotos,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vehiculo => "Vehículo",
            Self::Odometro => "Odómetro (km)",
            Self::Combustible => "Combustible",
            Self::FechaIngreso => "Fecha de ingreso",
            Self::EntregaEstimada => "Entrega estimada",
            Self::Observaciones => "Observaciones",
            Self::Fotos => "Fotos (URLs, separadas por coma)",
        }
    }

    const fn is_choice(self) -> bool {
        matches!(self, Self::Vehiculo | Self::Combustible)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderModal {
    input: NewOrderFormInput,
    field: usize,
}

impl CreateOrderModal {
    pub fn new(today: Date) -> Self {
        Self {
            input: NewOrderFormInput::blank(today),
            field: 0,
        }
    }

    pub fn input(&self) -> &NewOrderFormInput {
        &self.input
    }

    pub fn focused(&self) -> OrderField {
        OrderField::ALL[self.field]
    }

    pub fn focus(&mut self, delta: isize) {
        self.field = step(self.field, OrderField::ALL.len(), delta);
    }

    pub fn input_char(&mut self, value: char) {
        if let Some(buffer) = self.text_mut() {
            buffer.push(value);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.text_mut() {
            buffer.pop();
        }
    }

    pub fn cycle(&mut self, delta: isize, vehiculos: &[Vehiculo]) {
        match self.focused() {
            OrderField::Vehiculo => {
                let current = self.input.vehiculo_id.as_ref().and_then(|id| {
                    vehiculos.iter().position(|vehiculo| &vehiculo.id == id)
                });
                if let Some(index) = cycle_choice(current, vehiculos.len(), delta) {
                    self.input.vehiculo_id = Some(vehiculos[index].id.clone());
                }
            }
            OrderField::Combustible => {
                let levels = NivelCombustible::ALL;
                let current = levels
                    .iter()
                    .position(|level| *level == self.input.nivel_combustible);
                if let Some(index) = cycle_choice(current, levels.len(), delta) {
                    self.input.nivel_combustible = levels[index];
                }
            }
            _ => {}
        }
    }

    /// Picks the vehicle at 0-based `index`, as listed in `vehiculos`.
    pub fn select_vehicle(&mut self, index: usize, vehiculos: &[Vehiculo]) -> bool {
        match vehiculos.get(index) {
            Some(vehiculo) => {
                self.input.vehiculo_id = Some(vehiculo.id.clone());
                true
            }
            None => false,
        }
    }

    pub fn rows(&self, vehiculos: &[Vehiculo]) -> Vec<FormRow> {
        OrderField::ALL
            .into_iter()
            .enumerate()
            .map(|(index, field)| FormRow {
                label: field.label(),
                value: self.display_value(field, vehiculos),
                focused: index == self.field,
                choice: field.is_choice(),
            })
            .collect()
    }

    /// Validates the fields and hands the new order, numbered after the
    /// context's last one, to `on_submit`. On a validation error the callback
    /// is not run and the modal stays usable.
    pub fn submit<R>(
        &mut self,
        ctx: &ShopContext,
        on_submit: impl FnOnce(OrdenTrabajo) -> R,
    ) -> Result<R> {
        let orden = self
            .input
            .validate(ctx.vehiculos())?
            .into_orden(ctx.next_orden_id());
        Ok(on_submit(orden))
    }

    fn display_value(&self, field: OrderField, vehiculos: &[Vehiculo]) -> String {
        match field {
            OrderField::Vehiculo => match &self.input.vehiculo_id {
                None => "Seleccione un vehículo".to_owned(),
                Some(id) => vehiculos
                    .iter()
                    .find(|vehiculo| &vehiculo.id == id)
                    .map_or_else(|| id.to_string(), Vehiculo::display_line),
            },
            OrderField::Combustible => self.input.nivel_combustible.label().to_owned(),
            OrderField::Odometro => self.input.odometro.clone(),
            OrderField::FechaIngreso => self.input.fecha_ingreso.clone(),
            OrderField::EntregaEstimada => self.input.fecha_estimada_entrega.clone(),
            OrderField::Observaciones => self.input.observaciones.clone(),
            OrderField::Fotos => self.input.fotos.clone(),
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focused() {
            OrderField::Odometro => Some(&mut self.input.odometro),
            OrderField::FechaIngreso => Some(&mut self.input.fecha_ingreso),
            OrderField::EntregaEstimada => Some(&mut self.input.fecha_estimada_entrega),
            OrderField::Observaciones => Some(&mut self.input.observaciones),
            OrderField::Fotos => Some(&mut self.input.fotos),
            OrderField::Vehiculo | OrderField::Combustible => None,
        }
    }
}

const CLIENTE_LABELS: [&str; 7] = [
    "Nombre",
    "Tipo de documento",
    "Número de documento",
    "Teléfono",
    "Email",
    "Dirección",
    "Comunicaciones",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClienteFormModal {
    input: ClienteFormInput,
    field: usize,
}

impl Default for ClienteFormModal {
    fn default() -> Self {
        Self {
            input: ClienteFormInput::blank(),
            field: 0,
        }
    }
}

impl ClienteFormModal {
    pub fn input(&self) -> &ClienteFormInput {
        &self.input
    }

    pub fn focus(&mut self, delta: isize) {
        self.field = step(self.field, CLIENTE_LABELS.len(), delta);
    }

    pub fn input_char(&mut self, value: char) {
        if let Some(buffer) = self.text_mut() {
            buffer.push(value);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.text_mut() {
            buffer.pop();
        }
    }

    pub fn cycle(&mut self, delta: isize) {
        match self.field {
            1 => {
                let kinds = TipoDocumento::ALL;
                let current = kinds.iter().position(|kind| *kind == self.input.tipo_doc);
                if let Some(index) = cycle_choice(current, kinds.len(), delta) {
                    self.input.tipo_doc = kinds[index];
                }
            }
            6 => {
                self.input.consentimiento_comunicaciones =
                    !self.input.consentimiento_comunicaciones;
            }
            _ => {}
        }
    }

    pub fn rows(&self) -> Vec<FormRow> {
        let values = [
            self.input.nombre.clone(),
            self.input.tipo_doc.as_str().to_owned(),
            self.input.numero_doc.clone(),
            self.input.telefono.clone(),
            self.input.email.clone(),
            self.input.direccion.clone(),
            consent_label(self.input.consentimiento_comunicaciones).to_owned(),
        ];
        CLIENTE_LABELS
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(index, (label, value))| FormRow {
                label,
                value,
                focused: index == self.field,
                choice: matches!(index, 1 | 6),
            })
            .collect()
    }

    pub fn submit<R>(
        &mut self,
        ctx: &ShopContext,
        today: Date,
        on_submit: impl FnOnce(Cliente) -> R,
    ) -> Result<R> {
        let cliente = self.input.validate(ctx.next_cliente_id(), today)?;
        Ok(on_submit(cliente))
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.input.nombre),
            2 => Some(&mut self.input.numero_doc),
            3 => Some(&mut self.input.telefono),
            4 => Some(&mut self.input.email),
            5 => Some(&mut self.input.direccion),
            _ => None,
        }
    }
}

const VEHICULO_LABELS: [&str; 6] = ["Cliente", "Marca", "Línea", "Placa", "Año", "Color"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehiculoFormModal {
    input: VehiculoFormInput,
    field: usize,
}

impl Default for VehiculoFormModal {
    fn default() -> Self {
        Self {
            input: VehiculoFormInput::blank(),
            field: 0,
        }
    }
}

impl VehiculoFormModal {
    pub fn input(&self) -> &VehiculoFormInput {
        &self.input
    }

    pub fn focus(&mut self, delta: isize) {
        self.field = step(self.field, VEHICULO_LABELS.len(), delta);
    }

    pub fn input_char(&mut self, value: char) {
        if let Some(buffer) = self.text_mut() {
            buffer.push(value);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.text_mut() {
            buffer.pop();
        }
    }

    pub fn cycle(&mut self, delta: isize, clientes: &[Cliente]) {
        if self.field != 0 {
            return;
        }
        let current = self
            .input
            .cliente_id
            .as_ref()
            .and_then(|id| clientes.iter().position(|cliente| &cliente.id == id));
        if let Some(index) = cycle_choice(current, clientes.len(), delta) {
            self.input.cliente_id = Some(clientes[index].id.clone());
        }
    }

    pub fn rows(&self, clientes: &[Cliente]) -> Vec<FormRow> {
        let owner = match &self.input.cliente_id {
            None => "Seleccione un cliente".to_owned(),
            Some(id) => ClientLookup::resolve(clientes, id)
                .display_name()
                .to_owned(),
        };
        let values = [
            owner,
            self.input.marca.clone(),
            self.input.linea_modelo.clone(),
            self.input.placa.clone(),
            self.input.anio.clone(),
            self.input.color.clone(),
        ];
        VEHICULO_LABELS
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(index, (label, value))| FormRow {
                label,
                value,
                focused: index == self.field,
                choice: index == 0,
            })
            .collect()
    }

    pub fn submit<R>(
        &mut self,
        ctx: &ShopContext,
        on_submit: impl FnOnce(Vehiculo) -> R,
    ) -> Result<R> {
        let vehiculo = self
            .input
            .validate(ctx.next_vehiculo_id(), ctx.clientes())?;
        Ok(on_submit(vehiculo))
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            1 => Some(&mut self.input.marca),
            2 => Some(&mut self.input.linea_modelo),
            3 => Some(&mut self.input.placa),
            4 => Some(&mut self.input.anio),
            5 => Some(&mut self.input.color),
            _ => None,
        }
    }
}

/// Whichever create form is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormModal {
    Orden(CreateOrderModal),
    Cliente(ClienteFormModal),
    Vehiculo(VehiculoFormModal),
}

impl FormModal {
    pub fn open(kind: FormKind, today: Date) -> Self {
        match kind {
            FormKind::Orden => Self::Orden(CreateOrderModal::new(today)),
            FormKind::Cliente => Self::Cliente(ClienteFormModal::default()),
            FormKind::Vehiculo => Self::Vehiculo(VehiculoFormModal::default()),
        }
    }

    pub fn kind(&self) -> FormKind {
        match self {
            Self::Orden(_) => FormKind::Orden,
            Self::Cliente(_) => FormKind::Cliente,
            Self::Vehiculo(_) => FormKind::Vehiculo,
        }
    }

    pub fn focus(&mut self, delta: isize) {
        match self {
            Self::Orden(modal) => modal.focus(delta),
            Self::Cliente(modal) => modal.focus(delta),
            Self::Vehiculo(modal) => modal.focus(delta),
        }
    }

    pub fn input_char(&mut self, value: char) {
        match self {
            Self::Orden(modal) => modal.input_char(value),
            Self::Cliente(modal) => modal.input_char(value),
            Self::Vehiculo(modal) => modal.input_char(value),
        }
    }

    pub fn backspace(&mut self) {
        match self {
            Self::Orden(modal) => modal.backspace(),
            Self::Cliente(modal) => modal.backspace(),
            Self::Vehiculo(modal) => modal.backspace(),
        }
    }

    pub fn cycle(&mut self, delta: isize, ctx: &ShopContext) {
        match self {
            Self::Orden(modal) => modal.cycle(delta, ctx.vehiculos()),
            Self::Cliente(modal) => modal.cycle(delta),
            Self::Vehiculo(modal) => modal.cycle(delta, ctx.clientes()),
        }
    }

    pub fn rows(&self, ctx: &ShopContext) -> Vec<FormRow> {
        match self {
            Self::Orden(modal) => modal.rows(ctx.vehiculos()),
            Self::Cliente(modal) => modal.rows(),
            Self::Vehiculo(modal) => modal.rows(ctx.clientes()),
        }
    }

    pub fn focused_is_choice(&self, ctx: &ShopContext) -> bool {
        self.rows(ctx)
            .into_iter()
            .find(|row| row.focused)
            .is_some_and(|row| row.choice)
    }

    pub fn submit<R>(
        &mut self,
        ctx: &ShopContext,
        today: Date,
        on_submit: impl FnOnce(FormPayload) -> R,
    ) -> Result<R> {
        match self {
            Self::Orden(modal) => {
                modal.submit(ctx, |orden| on_submit(FormPayload::Orden(orden)))
            }
            Self::Cliente(modal) => modal.submit(ctx, today, |cliente| {
                on_submit(FormPayload::Cliente(cliente))
            }),
            Self::Vehiculo(modal) => {
                modal.submit(ctx, |vehiculo| on_submit(FormPayload::Vehiculo(vehiculo)))
            }
        }
    }
}

fn step(current: usize, len: usize, delta: isize) -> usize {
    (current as isize + delta).rem_euclid(len as isize) as usize
}

fn cycle_choice(current: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(index) => step(index, len, delta),
        None if delta < 0 => len - 1,
        None => 0,
    })
}

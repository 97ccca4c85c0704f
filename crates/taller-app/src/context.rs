// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use tracing::{debug, info};

use crate::{
    Cliente, ClienteId, DashboardCounts, EstadoOt, OrdenId, OrdenTrabajo, TransitionPolicy,
    Vehiculo, VehiculoId, WorkflowError,
};

/// Argument to a collection setter: a whole new collection, or a pure
/// function of the previous snapshot.
pub enum CollectionUpdate<T> {
    Replace(Vec<T>),
    Transform(Box<dyn FnOnce(&[T]) -> Vec<T>>),
}

impl<T> CollectionUpdate<T> {
    pub fn transform(f: impl FnOnce(&[T]) -> Vec<T> + 'static) -> Self {
        Self::Transform(Box::new(f))
    }

    fn apply(self, previous: &[T]) -> Vec<T> {
        match self {
            Self::Replace(next) => next,
            Self::Transform(f) => f(previous),
        }
    }
}

impl<T> fmt::Debug for CollectionUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(next) => write!(f, "Replace({} items)", next.len()),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Copy of `previous` with `item` at the end.
pub fn appended<T: Clone>(previous: &[T], item: T) -> Vec<T> {
    let mut next = Vec::with_capacity(previous.len() + 1);
    next.extend_from_slice(previous);
    next.push(item);
    next
}

/// Copy of `previous` where only the order matching `id` carries `estado`.
pub fn with_status(previous: &[OrdenTrabajo], id: &OrdenId, estado: EstadoOt) -> Vec<OrdenTrabajo> {
    previous
        .iter()
        .map(|orden| {
            if &orden.id == id {
                OrdenTrabajo {
                    estado,
                    ..orden.clone()
                }
            } else {
                orden.clone()
            }
        })
        .collect()
}

/// Session-scoped owner of the shop's collections. Views borrow it for
/// reads and mutate it only through the setters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopContext {
    clientes: Vec<Cliente>,
    vehiculos: Vec<Vehiculo>,
    ordenes: Vec<OrdenTrabajo>,
    policy: TransitionPolicy,
}

impl ShopContext {
    pub fn new(
        clientes: Vec<Cliente>,
        vehiculos: Vec<Vehiculo>,
        ordenes: Vec<OrdenTrabajo>,
    ) -> Self {
        Self {
            clientes,
            vehiculos,
            ordenes,
            policy: TransitionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn clientes(&self) -> &[Cliente] {
        &self.clientes
    }

    pub fn vehiculos(&self) -> &[Vehiculo] {
        &self.vehiculos
    }

    pub fn ordenes(&self) -> &[OrdenTrabajo] {
        &self.ordenes
    }

    pub fn set_clientes(&mut self, update: CollectionUpdate<Cliente>) {
        self.clientes = update.apply(&self.clientes);
    }

    pub fn set_vehiculos(&mut self, update: CollectionUpdate<Vehiculo>) {
        self.vehiculos = update.apply(&self.vehiculos);
    }

    pub fn set_ordenes(&mut self, update: CollectionUpdate<OrdenTrabajo>) {
        self.ordenes = update.apply(&self.ordenes);
    }

    pub fn find_orden(&self, id: &OrdenId) -> Option<&OrdenTrabajo> {
        self.ordenes.iter().find(|orden| &orden.id == id)
    }

    pub fn next_orden_id(&self) -> OrdenId {
        OrdenId::next_after(self.ordenes.iter().map(|orden| &orden.id))
    }

    pub fn next_cliente_id(&self) -> ClienteId {
        ClienteId::next_after(self.clientes.iter().map(|cliente| &cliente.id))
    }

    pub fn next_vehiculo_id(&self) -> VehiculoId {
        VehiculoId::next_after(self.vehiculos.iter().map(|vehiculo| &vehiculo.id))
    }

    pub fn push_orden(&mut self, orden: OrdenTrabajo) {
        debug!(orden = %orden.id, vehiculo = %orden.vehiculo_id, "order appended");
        self.set_ordenes(CollectionUpdate::transform(move |previous| {
            appended(previous, orden)
        }));
    }

    pub fn push_cliente(&mut self, cliente: Cliente) {
        debug!(cliente = %cliente.id, "client appended");
        self.set_clientes(CollectionUpdate::transform(move |previous| {
            appended(previous, cliente)
        }));
    }

    pub fn push_vehiculo(&mut self, vehiculo: Vehiculo) {
        debug!(vehiculo = %vehiculo.id, "vehicle appended");
        self.set_vehiculos(CollectionUpdate::transform(move |previous| {
            appended(previous, vehiculo)
        }));
    }

    /// Checks a status change against the active policy without applying it.
    /// Returns the order's current status.
    pub fn validate_status_change(
        &self,
        id: &OrdenId,
        estado: EstadoOt,
    ) -> Result<EstadoOt, WorkflowError> {
        if id.is_empty() {
            return Err(WorkflowError::EmptyOrderId);
        }
        let current = self
            .find_orden(id)
            .ok_or_else(|| WorkflowError::OrderNotFound(id.clone()))?
            .estado;
        self.policy.check(id, current, estado)?;
        Ok(current)
    }

    /// Applies a validated status change. Returns `false` when the order
    /// already had `estado`.
    pub fn change_order_status(
        &mut self,
        id: &OrdenId,
        estado: EstadoOt,
    ) -> Result<bool, WorkflowError> {
        let current = self.validate_status_change(id, estado)?;
        if current == estado {
            return Ok(false);
        }

        let target = id.clone();
        self.set_ordenes(CollectionUpdate::transform(move |previous| {
            with_status(previous, &target, estado)
        }));
        info!(
            orden = %id,
            from = current.label(),
            to = estado.label(),
            "order status changed"
        );
        Ok(true)
    }

    pub fn status_count(&self, estado: EstadoOt) -> usize {
        self.ordenes
            .iter()
            .filter(|orden| orden.estado == estado)
            .count()
    }

    pub fn dashboard_counts(&self) -> DashboardCounts {
        DashboardCounts {
            ordenes_activas: self
                .ordenes
                .iter()
                .filter(|orden| orden.estado.is_active())
                .count(),
            listas_para_entrega: self.status_count(EstadoOt::Listo),
            clientes: self.clientes.len(),
            vehiculos: self.vehiculos.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionUpdate, ShopContext, appended, with_status};
    use crate::{
        EstadoOt, NivelCombustible, OrdenId, OrdenTrabajo, TransitionPolicy, VehiculoId,
        WorkflowError,
    };
    use time::{Date, Month};

    fn orden(id: &str, estado: EstadoOt) -> OrdenTrabajo {
        OrdenTrabajo {
            id: OrdenId::new(id),
            vehiculo_id: VehiculoId::new("VEH-0001"),
            fecha_ingreso: Date::from_calendar_date(2026, Month::February, 2).expect("valid date"),
            odometro_ingreso: 18_200,
            nivel_combustible: NivelCombustible::Medio,
            fecha_estimada_entrega: None,
            observaciones: Some("ruido en la cadena".to_owned()),
            fotos_url: vec!["https://fotos.example/1.jpg".to_owned()],
            estado,
        }
    }

    fn context() -> ShopContext {
        ShopContext::new(
            Vec::new(),
            Vec::new(),
            vec![
                orden("OT-0001", EstadoOt::Recepcion),
                orden("OT-0002", EstadoOt::EnProceso),
                orden("OT-0003", EstadoOt::Listo),
            ],
        )
    }

    #[test]
    fn status_change_touches_only_the_target_status() {
        let mut ctx = context();
        let before = ctx.ordenes().to_vec();

        let changed = ctx
            .change_order_status(&OrdenId::new("OT-0002"), EstadoOt::Pruebas)
            .expect("open policy accepts");
        assert!(changed);

        let after = ctx.ordenes();
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].estado, EstadoOt::Pruebas);
        assert_eq!(
            OrdenTrabajo {
                estado: EstadoOt::EnProceso,
                ..after[1].clone()
            },
            before[1]
        );
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut ctx = context().with_policy(TransitionPolicy::Lifecycle);
        let before = ctx.clone();
        let changed = ctx
            .change_order_status(&OrdenId::new("OT-0003"), EstadoOt::Listo)
            .expect("same status always allowed");
        assert!(!changed);
        assert_eq!(ctx, before);
    }

    #[test]
    fn lifecycle_policy_blocks_invalid_change_without_mutation() {
        let mut ctx = context().with_policy(TransitionPolicy::Lifecycle);
        let before = ctx.clone();
        let error = ctx
            .change_order_status(&OrdenId::new("OT-0001"), EstadoOt::Entregado)
            .expect_err("skip should fail");
        assert!(matches!(error, WorkflowError::TransitionNotAllowed { .. }));
        assert_eq!(ctx, before);
    }

    #[test]
    fn unknown_and_empty_ids_are_reported() {
        let mut ctx = context();
        assert_eq!(
            ctx.change_order_status(&OrdenId::new("OT-9999"), EstadoOt::Listo),
            Err(WorkflowError::OrderNotFound(OrdenId::new("OT-9999")))
        );
        assert_eq!(
            ctx.change_order_status(&OrdenId::new(""), EstadoOt::Listo),
            Err(WorkflowError::EmptyOrderId)
        );
    }

    #[test]
    fn push_orden_appends_at_the_end() {
        let mut ctx = context();
        let before = ctx.ordenes().to_vec();
        let id = ctx.next_orden_id();
        assert_eq!(id.as_str(), "OT-0004");

        ctx.push_orden(orden(id.as_str(), EstadoOt::Recepcion));
        assert_eq!(ctx.ordenes().len(), before.len() + 1);
        assert_eq!(&ctx.ordenes()[..before.len()], before.as_slice());
        assert_eq!(ctx.ordenes()[3].id, id);
    }

    #[test]
    fn setter_accepts_full_replacement() {
        let mut ctx = context();
        ctx.set_ordenes(CollectionUpdate::Replace(vec![orden(
            "OT-0100",
            EstadoOt::Cerrado,
        )]));
        assert_eq!(ctx.ordenes().len(), 1);
        assert_eq!(ctx.next_orden_id().as_str(), "OT-0101");
    }

    #[test]
    fn pure_transforms_leave_input_untouched() {
        let previous = vec![orden("OT-1", EstadoOt::Recepcion)];
        let next = with_status(&previous, &OrdenId::new("OT-1"), EstadoOt::Cotizado);
        assert_eq!(previous[0].estado, EstadoOt::Recepcion);
        assert_eq!(next[0].estado, EstadoOt::Cotizado);

        let grown = appended(&previous, orden("OT-2", EstadoOt::Recepcion));
        assert_eq!(previous.len(), 1);
        assert_eq!(grown.len(), 2);
    }

    #[test]
    fn dashboard_counts_follow_statuses() {
        let counts = context().dashboard_counts();
        assert_eq!(counts.ordenes_activas, 3);
        assert_eq!(counts.listas_para_entrega, 1);
        assert_eq!(counts.clientes, 0);
    }
}

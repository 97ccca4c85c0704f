// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use taller_app::{
    Cliente, EstadoOt, OrdenId, OrdenTrabajo, ShopContext, TransitionPolicy, Vehiculo,
};
use taller_db::Store;
use tracing::debug;

pub struct DbRuntime<'a> {
    store: &'a Store,
    policy: TransitionPolicy,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }
}

impl taller_tui::AppRuntime for DbRuntime<'_> {
    fn load_context(&mut self) -> Result<ShopContext> {
        let ctx = self.store.load_context()?.with_policy(self.policy);
        debug!(
            clientes = ctx.clientes().len(),
            vehiculos = ctx.vehiculos().len(),
            ordenes = ctx.ordenes().len(),
            policy = self.policy.as_str(),
            "context loaded"
        );
        Ok(ctx)
    }

    fn create_orden(&mut self, orden: &OrdenTrabajo) -> Result<()> {
        self.store.create_orden(orden)
    }

    fn change_order_status(&mut self, id: &OrdenId, estado: EstadoOt) -> Result<()> {
        self.store.update_orden_estado(id, estado)
    }

    fn create_cliente(&mut self, cliente: &Cliente) -> Result<()> {
        self.store.create_cliente(cliente)
    }

    fn create_vehiculo(&mut self, vehiculo: &Vehiculo) -> Result<()> {
        self.store.create_vehiculo(vehiculo)
    }
}
